use crate::{
    AppState,
    format_html::{format_nightly_html, format_pinned_html, format_tree_html},
    format_xml::{XML_CACHE_CONTROL, XML_CONTENT_TYPE, format_servers_xml},
    resolver::resolve,
};
use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::{fs, path::Path, sync::Arc};
use tracing::{debug, info};

/// Directory under the document root holding one subdirectory per version.
pub const NIGHTLY_DIR: &str = "nightly";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub ver: Option<String>,
    pub xml: Option<String>,
}

impl PageQuery {
    /// Any value other than empty or `0` asks for the XML feed.
    pub fn wants_xml(&self) -> bool {
        self.xml.as_deref().is_some_and(|v| !v.is_empty() && v != "0")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Html(String),
    Xml(String),
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        match self {
            Page::Html(html) => Html(html).into_response(),
            Page::Xml(xml) => (
                [
                    (header::CONTENT_TYPE, XML_CONTENT_TYPE),
                    (header::CACHE_CONTROL, XML_CACHE_CONTROL),
                ],
                xml,
            )
                .into_response(),
        }
    }
}

/// Builds the nightly page for a query. Unknown or missing versions get
/// the version listing instead.
pub fn nightly_page(state: &AppState, query: &PageQuery, now: DateTime<Utc>) -> Page {
    let nightly_root = state.root.join(NIGHTLY_DIR);

    let Some(release) = query.ver.as_deref().and_then(|v| state.catalog.release(v)) else {
        if let Some(ver) = query.ver.as_deref() {
            debug!(ver, "unrecognized version selector");
        }
        return Page::Html(format_tree_html(&list_versions(&nightly_root)));
    };

    let resolutions = resolve(&nightly_root.join(&release.version), &state.catalog.nightly_rules);
    info!(
        version = %release.version,
        found = resolutions.len(),
        rules = state.catalog.nightly_rules.len(),
        "resolved nightly builds"
    );

    if query.wants_xml() {
        Page::Xml(format_servers_xml(&resolutions, &nightly_root, &state.base_url))
    } else {
        Page::Html(format_nightly_html(
            &resolutions,
            &nightly_root,
            &release.version,
            release.changelog.as_deref(),
            release.gitlog.as_deref(),
            now,
        ))
    }
}

/// Builds the root page, or `None` when no pinned release is configured.
pub fn pinned_page(state: &AppState) -> Option<Page> {
    let pinned = state.catalog.pinned.as_ref()?;
    let resolutions = resolve(&state.root.join(pinned.directory()), &pinned.rules);
    info!(
        version = %pinned.version,
        found = resolutions.len(),
        rules = pinned.rules.len(),
        "resolved pinned release"
    );

    Some(Page::Html(format_pinned_html(
        &resolutions,
        &state.root,
        &pinned.version,
        pinned.changelog.as_deref(),
        pinned.gitlog.as_deref(),
    )))
}

/// Non-hidden subdirectories of `dir`, sorted by name.
pub fn list_versions(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "cannot list versions");
            return Vec::new();
        }
    };

    let mut versions: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    versions.sort();
    versions
}

pub async fn nightly(
    Query(query): Query<PageQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    let page = tokio::task::spawn_blocking(move || nightly_page(&state, &query, Utc::now()))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(page.into_response())
}

pub async fn pinned(State(state): State<Arc<AppState>>) -> Result<Response, (StatusCode, String)> {
    let page = tokio::task::spawn_blocking(move || pinned_page(&state))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match page {
        Some(page) => Ok(page.into_response()),
        None => Err((
            StatusCode::NOT_FOUND,
            "No pinned release configured".to_string(),
        )),
    }
}
