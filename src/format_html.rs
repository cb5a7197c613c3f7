use crate::resolver::Resolution;
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

const NIGHTLY_TITLE: &str = "Some Software Beta Downloads";
const PINNED_TITLE: &str = "Logitech Media Server Downloads";

/// Sizes as shown in the download table: never below KB, two decimals,
/// thousands grouped with commas.
pub fn byte_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{} {}", number_format(size), UNITS[unit])
}

fn number_format(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}.{}", grouped, frac_part)
}

/// How long ago a build was published, bucketed for the date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Within the last 24 hours.
    Fresh,
    /// Between 24 and 48 hours old.
    Aging,
    /// Older than 48 hours.
    Stale,
}

impl Freshness {
    pub fn of(modified: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let age = now - modified;
        if age > Duration::hours(48) {
            Freshness::Stale
        } else if age > Duration::hours(24) {
            Freshness::Aging
        } else {
            Freshness::Fresh
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Freshness::Fresh => "black",
            Freshness::Aging => "orange",
            Freshness::Stale => "red",
        }
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page_header(title: &str, version: Option<&str>, changelog: Option<&str>, gitlog: Option<&str>) -> String {
    let heading = match version {
        Some(v) => format!("{} - Version {}", title, escape_html(v)),
        None => title.to_string(),
    };

    let links = match changelog {
        Some(changelog) => format!(
            "<p><a href=\"{}\">Changelog</a>\n<br><a href=\"{}\">Git commit log</a></p>\n",
            escape_html(changelog),
            escape_html(gitlog.unwrap_or_default())
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{heading}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif; text-align: center; }}
        table {{ margin: 0 auto; }}
        td {{ padding: 2px 6px; }}
        a {{ color: #0366d6; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
    </style>
</head>
<body>
<h2>{heading}</h2>
{links}<hr>
"#
    )
}

fn page_footer(href: &str, text: &str) -> String {
    format!(
        "<p><hr><p><a href=\"{}\">{}</a>\n</body>\n</html>\n",
        href, text
    )
}

fn file_cells(resolution: &Resolution, site_root: &Path) -> String {
    let href = format!("./{}", resolution.file.relative_to(site_root));
    format!(
        "<td align=left>{}</td>\n<td align=left><a href=\"{}\">{}</a></td>\n<td align=center>{}</td>\n",
        escape_html(&resolution.label),
        escape_html(&href),
        escape_html(&resolution.file_name()),
        byte_size(resolution.file.size)
    )
}

/// The versioned nightly table, with a freshness-colored date column.
pub fn format_nightly_html(
    resolutions: &[Resolution],
    site_root: &Path,
    version: &str,
    changelog: Option<&str>,
    gitlog: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let rows = resolutions
        .iter()
        .map(|r| {
            let color = Freshness::of(r.file.modified, now).color();
            format!(
                "<tr>\n{}<td><span style=\"color:{}\">{}</span></td>\n</tr>\n",
                file_cells(r, site_root),
                color,
                r.file.modified.format("%B %d %Y %H:%M")
            )
        })
        .collect::<String>();

    format!(
        "{}<table cellpadding=2 cellspacing=2>\n<tr><th>Version</th><th>File</th><th>Size (mb)</th><th>Date</th></tr>\n{}</table>\n{}",
        page_header(NIGHTLY_TITLE, Some(version), changelog, gitlog),
        rows,
        page_footer("index.php", "Other Versions")
    )
}

/// The root page for the pinned release.
pub fn format_pinned_html(
    resolutions: &[Resolution],
    site_root: &Path,
    version: &str,
    changelog: Option<&str>,
    gitlog: Option<&str>,
) -> String {
    let rows = resolutions
        .iter()
        .map(|r| format!("<tr>\n{}</tr>\n", file_cells(r, site_root)))
        .collect::<String>();

    format!(
        "{}<table cellpadding=2 cellspacing=2>\n<tr><th>Version</th><th>File</th><th>Size (mb)</th></tr>\n{}</table>\n{}",
        page_header(PINNED_TITLE, Some(version), changelog, gitlog),
        rows,
        page_footer("nightly/", "Nightly Builds")
    )
}

/// Links to every version directory, shown when no known version was asked for.
pub fn format_tree_html(versions: &[String]) -> String {
    let links = versions
        .iter()
        .map(|v| {
            let v = escape_html(v);
            format!("<a href=\"?ver={}\">Version {}</a><br>\n", v, v)
        })
        .collect::<String>();

    format!(
        "{}{}{}",
        page_header(NIGHTLY_TITLE, None, None, None),
        links,
        page_footer("index.php", "Other Versions")
    )
}
