//! Edge rewrite for legacy wiki URLs.
//!
//! Old MediaWiki links (`/index.php/Page`) point at a static export where
//! every page is an `.html` file and namespace colons became underscores.

/// Namespace segments whose colon was replaced in the static export.
const NAMESPACE_SEGMENTS: &[(&str, &str)] = &[("/User:", "/User_"), ("/User_talk:", "/User_talk_")];

pub fn rewrite_wiki_uri(uri: &str) -> String {
    let mut rewritten = uri.to_string();

    if rewritten.contains("index.php/") && !rewritten.ends_with(".html") {
        rewritten.push_str(".html");
    }

    for (from, to) in NAMESPACE_SEGMENTS {
        rewritten = rewritten.replacen(from, to, 1);
    }

    rewritten
}
