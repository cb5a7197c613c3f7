use crate::platform::{self, BuildId};
use crate::resolver::Resolution;
use std::path::Path;
use url::Url;

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub const XML_CACHE_CONTROL: &str = "max-age=3600";

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Absolute download URL for a path relative to the published directory.
pub fn download_url(base_url: &Url, relative: &str) -> String {
    match base_url.join(relative) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", base_url, relative),
    }
}

/// One `<servers>` document with an element per resolved artifact.
pub fn format_servers_xml(resolutions: &[Resolution], site_root: &Path, base_url: &Url) -> String {
    let elements = resolutions
        .iter()
        .map(|r| {
            let relative = r.file.relative_to(site_root);
            let build = BuildId::extract(&relative);
            format!(
                "<{} revision=\"{}\" url=\"{}\" version=\"{}\"/>",
                platform::classify(&relative),
                escape_xml(&build.revision),
                escape_xml(&download_url(base_url, &relative)),
                escape_xml(&build.version)
            )
        })
        .collect::<String>();

    format!("<servers>{}</servers>", elements)
}
