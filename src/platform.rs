//! Platform codes and build identifiers for the XML feed.

use regex::Regex;
use std::sync::OnceLock;

/// Code used when no entry in the platform table matches.
pub const DEFAULT_PLATFORM: &str = "default";

/// Evaluated top to bottom; the first matching pattern names the platform.
const PLATFORM_TABLE: &[(&str, &str)] = &[
    (r"\.exe$", "win"),
    (r"\.msi", "whs"),
    (r"\.pkg", "osx"),
    (r"amd64\.deb", "debamd64"),
    (r"arm\.deb", "debarm"),
    (r"i386\.deb", "debi386"),
    (r"all\.deb", "deb"),
    (r"\.rpm", "rpm"),
    (r"sparc-readynas", "readynas"),
    (r"arm-readynas", "readynasarm"),
    (r"i386-readynas", "readynaspro"),
    (r"arm-linux\.tgz", "tararm"),
    (r"noCPAN", "nocpan"),
    (r"\d+\.tgz", "src"),
];

const BUILD_ID_PATTERN: &str = r"[-_](\d+\.\d+\.\d+).*?(\d{10})";

fn platform_table() -> &'static [(Regex, &'static str)] {
    static TABLE: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        PLATFORM_TABLE
            .iter()
            .map(|(pattern, code)| (Regex::new(pattern).expect("static platform pattern"), *code))
            .collect()
    })
}

fn build_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(BUILD_ID_PATTERN).expect("static build id pattern"))
}

/// Maps an artifact path to its feed element name.
pub fn classify(path: &str) -> &'static str {
    platform_table()
        .iter()
        .find(|(re, _)| re.is_match(path))
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_PLATFORM)
}

/// Dotted version and ten-digit revision embedded in a build file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildId {
    pub version: String,
    pub revision: String,
}

impl BuildId {
    /// Both fields are empty when the path carries no recognizable build id.
    pub fn extract(path: &str) -> Self {
        build_id_regex()
            .captures(path)
            .map(|caps| BuildId {
                version: caps[1].to_string(),
                revision: caps[2].to_string(),
            })
            .unwrap_or_default()
    }
}
