use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use downloads_index::{
    AppState, DEFAULT_BASE_URL,
    catalog::Catalog,
    handler::{Page, PageQuery, nightly_page, pinned_page},
    logging, rewrite, router,
};
use std::{path::PathBuf, sync::Arc};
use tracing::info;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "downloads-index")]
#[command(about = "Download pages listing the newest build of each installer", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the download pages and the files they link to
    Serve {
        #[command(flatten)]
        site: SiteArgs,

        /// Server port
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Print one page to stdout
    Render {
        #[command(flatten)]
        site: SiteArgs,

        /// Nightly version to render; omit for the version listing
        #[arg(long = "ver")]
        ver: Option<String>,

        /// Render the XML feed instead of the HTML table
        #[arg(long)]
        xml: bool,

        /// Render the pinned release page
        #[arg(long, conflicts_with_all = ["ver", "xml"])]
        pinned: bool,
    },
    /// Apply the wiki URL rewrite to each argument
    Rewrite {
        #[arg(required = true)]
        uris: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct SiteArgs {
    /// Document root holding release directories and nightly/
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// TOML catalog replacing the built-in rule tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Public URL of the nightly directory, used in the XML feed
    #[arg(short, long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

impl SiteArgs {
    fn into_state(self) -> Result<AppState> {
        let catalog = match &self.config {
            Some(path) => Catalog::from_file(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?,
            None => Catalog::builtin().context("Built-in catalog is invalid")?,
        };

        let mut base_url = self.base_url;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)
            .with_context(|| format!("Invalid base URL: {}", base_url))?;

        Ok(AppState {
            root: self.root,
            catalog,
            base_url,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { site, port, host } => {
            let state = Arc::new(site.into_state()?);
            info!(
                root = %state.root.display(),
                releases = state.catalog.releases.len(),
                rules = state.catalog.nightly_rules.len(),
                pinned = state.catalog.pinned.as_ref().map(|p| p.version.as_str()),
                "catalog loaded"
            );

            let app = router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("Server listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Command::Render {
            site,
            ver,
            xml,
            pinned,
        } => {
            let state = site.into_state()?;
            let page = if pinned {
                pinned_page(&state).context("No pinned release configured")?
            } else {
                let query = PageQuery {
                    ver,
                    xml: xml.then(|| "1".to_string()),
                };
                nightly_page(&state, &query, Utc::now())
            };
            match page {
                Page::Html(body) | Page::Xml(body) => println!("{}", body),
            }
        }
        Command::Rewrite { uris } => {
            for uri in uris {
                println!("{}", rewrite::rewrite_wiki_uri(&uri));
            }
        }
    }

    Ok(())
}
