use serde::Deserialize;

/// On-disk catalog description, loaded with `--config`.
///
/// ```toml
/// [[release]]
/// version = "8.1"
/// changelog = "https://example.org/8.1/Changelog8.html"
/// gitlog = "https://example.org/commits/8.1"
///
/// [[rule]]
/// pattern = '.*/LogitechMediaServer-.*-[0-9]+\.exe'
/// label = "Windows Executable Installer"
///
/// [pinned]
/// version = "8.3.1"
/// directory_prefix = "LogitechMediaServer_v"
///
/// [[pinned.rule]]
/// pattern = '.*/LogitechMediaServer-{version}\.exe'
/// label = "Windows Executable Installer"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    #[serde(default, rename = "release")]
    pub releases: Vec<ReleaseEntry>,
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleEntry>,
    pub pinned: Option<PinnedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseEntry {
    pub version: String,
    pub changelog: Option<String>,
    pub gitlog: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleEntry {
    pub pattern: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinnedEntry {
    pub version: String,
    #[serde(default = "default_directory_prefix")]
    pub directory_prefix: String,
    pub changelog: Option<String>,
    pub gitlog: Option<String>,
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleEntry>,
}

fn default_directory_prefix() -> String {
    "LogitechMediaServer_v".to_string()
}
