use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use downloads_index::{AppState, DEFAULT_BASE_URL, catalog::Catalog, router};
use filetime::{FileTime, set_file_mtime};
use scraper::{Html, Selector};
use std::{fs, path::Path, sync::Arc};
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

fn touch(root: &Path, rel: &str, mtime: i64) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, vec![0u8; 4096]).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
}

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(root, "nightly/8.1/LogitechMediaServer-8.1.2-1612000000.exe", 1_612_000_000);
    touch(root, "nightly/8.1/LogitechMediaServer-8.1.2-1612345678.exe", 1_612_345_678);
    touch(root, "nightly/8.1/logitechmediaserver_8.1.2~1612345678_amd64.deb", 1_612_345_678);
    touch(root, "nightly/7.7/LogitechMediaServer-7.7.6-1500000000.exe", 1_500_000_000);
    fs::create_dir_all(root.join("nightly/.hidden")).unwrap();
    touch(root, "LogitechMediaServer_v8.3.1/LogitechMediaServer-8.3.1.exe", 1_650_000_000);
    touch(root, "LogitechMediaServer_v8.3.1/logitechmediaserver_8.3.1_arm.deb", 1_650_000_000);
    dir
}

fn app(root: &Path) -> axum::Router {
    router(Arc::new(AppState {
        root: root.to_path_buf(),
        catalog: Catalog::builtin().unwrap(),
        base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
    }))
}

async fn get(root: &Path, uri: &str) -> (StatusCode, header::HeaderMap, String) {
    let response = app(root)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

fn table_rows(html: &str) -> Vec<Vec<String>> {
    let doc = Html::parse_document(html);
    let row = Selector::parse("table tr").unwrap();
    let cell = Selector::parse("td").unwrap();
    doc.select(&row)
        .map(|r| {
            r.select(&cell)
                .map(|c| c.text().collect::<String>().trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect()
}

#[tokio::test]
async fn nightly_table_lists_newest_per_rule() {
    let dir = site();
    let (status, _, body) = get(dir.path(), "/nightly/?ver=8.1").await;
    assert_eq!(status, StatusCode::OK);

    let rows = table_rows(&body);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "Logitech Media Server: Windows Executable Installer");
    assert_eq!(rows[0][1], "LogitechMediaServer-8.1.2-1612345678.exe");
    assert_eq!(rows[0][2], "4.00 KB");
    assert_eq!(rows[1][0], "Logitech Media Server: Debian Installer Package (x86_64)");

    let doc = Html::parse_document(&body);
    let link = Selector::parse("table a").unwrap();
    let href = doc.select(&link).next().unwrap().value().attr("href").unwrap();
    assert_eq!(href, "./8.1/LogitechMediaServer-8.1.2-1612345678.exe");
    // Built years ago, so flagged as stale.
    assert!(body.contains("color:red"));
    assert!(body.contains("Changelog8.html"));
}

#[tokio::test]
async fn index_php_alias_serves_the_same_page() {
    let dir = site();
    let (_, _, a) = get(dir.path(), "/nightly/?ver=7.7").await;
    let (_, _, b) = get(dir.path(), "/nightly/index.php?ver=7.7").await;
    assert_eq!(table_rows(&a), table_rows(&b));
    assert_eq!(table_rows(&a).len(), 1);
}

#[tokio::test]
async fn xml_feed() {
    let dir = site();
    let (status, headers, body) = get(dir.path(), "/nightly/?ver=8.1&xml=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/xml; charset=utf-8");
    assert_eq!(headers[header::CACHE_CONTROL], "max-age=3600");
    assert_eq!(
        body,
        "<servers>\
         <win revision=\"1612345678\" url=\"http://downloads.slimdevices.com/nightly/8.1/LogitechMediaServer-8.1.2-1612345678.exe\" version=\"8.1.2\"/>\
         <debamd64 revision=\"1612345678\" url=\"http://downloads.slimdevices.com/nightly/8.1/logitechmediaserver_8.1.2~1612345678_amd64.deb\" version=\"8.1.2\"/>\
         </servers>"
    );
}

#[tokio::test]
async fn unknown_version_falls_back_to_listing() {
    let dir = site();
    for uri in ["/nightly/", "/nightly/?ver=9.9", "/nightly/?ver=../etc", "/nightly/?ver=9.9&xml=1"] {
        let (status, headers, body) = get(dir.path(), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));

        let doc = Html::parse_document(&body);
        let link = Selector::parse("a[href^='?ver=']").unwrap();
        let versions: Vec<_> = doc.select(&link).map(|a| a.text().collect::<String>()).collect();
        assert_eq!(versions, ["Version 7.7", "Version 8.1"], "{uri}");
    }
}

#[tokio::test]
async fn known_version_without_files_renders_empty_table() {
    let dir = site();
    let (status, _, body) = get(dir.path(), "/nightly/?ver=10.0").await;
    assert_eq!(status, StatusCode::OK);
    assert!(table_rows(&body).is_empty());
    assert!(body.contains("Version 10.0"));
}

#[tokio::test]
async fn pinned_release_page() {
    let dir = site();
    let (status, _, body) = get(dir.path(), "/").await;
    assert_eq!(status, StatusCode::OK);

    let rows = table_rows(&body);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][1], "LogitechMediaServer-8.3.1.exe");
    assert_eq!(rows[1][1], "logitechmediaserver_8.3.1_arm.deb");
    assert!(rows.iter().all(|r| r.len() == 3));
    assert!(body.contains("href=\"./LogitechMediaServer_v8.3.1/LogitechMediaServer-8.3.1.exe\""));
    assert!(body.contains("commits/8.3.1"));
}

#[tokio::test]
async fn pinned_page_missing_when_not_configured() {
    let dir = site();
    let catalog = Catalog::from_toml_str(
        r#"
        [[rule]]
        pattern = '\.exe$'
        label = "Windows"
        "#,
    )
    .unwrap();
    let app = router(Arc::new(AppState {
        root: dir.path().to_path_buf(),
        catalog,
        base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
    }));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn artifacts_are_served() {
    let dir = site();
    let (status, _, body) =
        get(dir.path(), "/nightly/8.1/LogitechMediaServer-8.1.2-1612345678.exe").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.len(), 4096);

    let (status, _, _) = get(dir.path(), "/nightly/8.1/missing.exe").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health() {
    let dir = site();
    let (status, _, body) = get(dir.path(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}
