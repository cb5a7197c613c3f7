use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use std::{path::PathBuf, sync::Arc};
use tower_http::services::ServeDir;
use url::Url;

pub mod catalog;
pub mod config;
pub mod format_html;
pub mod format_xml;
pub mod handler;
pub mod logging;
pub mod platform;
pub mod resolver;
pub mod rewrite;

use catalog::Catalog;

/// Default public location of the nightly tree, used for feed URLs.
pub const DEFAULT_BASE_URL: &str = "http://downloads.slimdevices.com/nightly/";

/// Everything a request needs; built once at startup and never mutated.
pub struct AppState {
    /// Document root: pinned release directories and `nightly/` live here.
    pub root: PathBuf,
    pub catalog: Catalog,
    /// Public URL of the nightly directory, with a trailing slash.
    pub base_url: Url,
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub fn router(state: Arc<AppState>) -> Router {
    let files = ServeDir::new(&state.root);

    Router::new()
        .route("/", get(handler::pinned))
        .route("/nightly/", get(handler::nightly))
        .route("/nightly/index.php", get(handler::nightly))
        .route("/health", get(health_check))
        .fallback_service(files)
        .with_state(state)
}
