//! Rule tables and release metadata, compiled once at startup.

use crate::config::{CatalogFile, PinnedEntry, ReleaseEntry, RuleEntry};
use crate::resolver::Rule;
use regex::Regex;
use std::{fs, path::Path};
use thiserror::Error;

/// Placeholder substituted with the (regex-escaped) pinned version.
const VERSION_PLACEHOLDER: &str = "{version}";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid pattern for rule '{label}': {source}")]
    InvalidPattern {
        label: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to read catalog file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("release '{0}' is listed more than once")]
    DuplicateRelease(String),
    #[error("invalid version selector '{0}'")]
    InvalidVersion(String),
}

/// A nightly version selector users may ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    pub changelog: Option<String>,
    pub gitlog: Option<String>,
}

/// The fixed release shown on the root page.
#[derive(Debug, Clone)]
pub struct PinnedRelease {
    pub version: String,
    pub directory_prefix: String,
    pub changelog: Option<String>,
    pub gitlog: Option<String>,
    pub rules: Vec<Rule>,
}

impl PinnedRelease {
    /// Directory (relative to the document root) holding this release.
    pub fn directory(&self) -> String {
        format!("{}{}", self.directory_prefix, self.version)
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub releases: Vec<Release>,
    pub nightly_rules: Vec<Rule>,
    pub pinned: Option<PinnedRelease>,
}

impl Catalog {
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::from_catalog_file(file)
    }

    pub fn from_catalog_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut releases: Vec<Release> = Vec::with_capacity(file.releases.len());
        for entry in file.releases {
            if !is_valid_version(&entry.version) {
                return Err(CatalogError::InvalidVersion(entry.version));
            }
            if releases.iter().any(|r| r.version == entry.version) {
                return Err(CatalogError::DuplicateRelease(entry.version));
            }
            releases.push(Release {
                version: entry.version,
                changelog: entry.changelog,
                gitlog: entry.gitlog,
            });
        }

        let nightly_rules = compile_rules(&file.rules, None)?;
        let pinned = file.pinned.map(compile_pinned).transpose()?;

        Ok(Self {
            releases,
            nightly_rules,
            pinned,
        })
    }

    /// The download tables published on downloads.slimdevices.com.
    pub fn builtin() -> Result<Self, CatalogError> {
        let entries = |table: &[(&str, &str)]| -> Vec<RuleEntry> {
            table
                .iter()
                .map(|(pattern, label)| RuleEntry {
                    pattern: pattern.to_string(),
                    label: label.to_string(),
                })
                .collect()
        };

        Self::from_catalog_file(CatalogFile {
            releases: BUILTIN_RELEASES
                .iter()
                .map(|(version, changelog, gitlog)| ReleaseEntry {
                    version: version.to_string(),
                    changelog: Some(changelog.to_string()),
                    gitlog: Some(gitlog.to_string()),
                })
                .collect(),
            rules: entries(BUILTIN_NIGHTLY_RULES),
            pinned: Some(PinnedEntry {
                version: "8.3.1".to_string(),
                directory_prefix: "LogitechMediaServer_v".to_string(),
                changelog: Some(
                    "http://htmlpreview.github.io/?https://raw.githubusercontent.com/Logitech/slimserver/{version}/Changelog8.html"
                        .to_string(),
                ),
                gitlog: Some("https://github.com/Logitech/slimserver/commits/{version}".to_string()),
                rules: entries(BUILTIN_PINNED_RULES),
            }),
        })
    }

    /// Looks up a version selector; unknown selectors yield `None`.
    pub fn release(&self, selector: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.version == selector)
    }
}

/// Version selectors become path components, so keep them to a single
/// plain directory name.
fn is_valid_version(version: &str) -> bool {
    !version.is_empty()
        && version != "."
        && version != ".."
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn compile_pinned(entry: PinnedEntry) -> Result<PinnedRelease, CatalogError> {
    if !is_valid_version(&entry.version) {
        return Err(CatalogError::InvalidVersion(entry.version));
    }
    let rules = compile_rules(&entry.rules, Some(&entry.version))?;
    let expand = |s: Option<String>| s.map(|s| s.replace(VERSION_PLACEHOLDER, &entry.version));
    Ok(PinnedRelease {
        changelog: expand(entry.changelog),
        gitlog: expand(entry.gitlog),
        directory_prefix: entry.directory_prefix,
        version: entry.version,
        rules,
    })
}

/// Compiles every pattern up front; the first bad one aborts the load.
fn compile_rules(entries: &[RuleEntry], version: Option<&str>) -> Result<Vec<Rule>, CatalogError> {
    entries
        .iter()
        .map(|entry| {
            let pattern = match version {
                Some(v) => entry.pattern.replace(VERSION_PLACEHOLDER, &regex::escape(v)),
                None => entry.pattern.clone(),
            };
            let regex = Regex::new(&pattern).map_err(|source| CatalogError::InvalidPattern {
                label: entry.label.clone(),
                source,
            })?;
            Ok(Rule::new(regex, entry.label.clone()))
        })
        .collect()
}

const BUILTIN_RELEASES: &[(&str, &str, &str)] = &[
    (
        "7.7",
        "http://htmlpreview.github.io/?https://github.com/Logitech/slimserver/blob/public/7.7/Changelog7.html",
        "https://github.com/Logitech/slimserver/commits/public/7.7",
    ),
    (
        "7.9",
        "http://htmlpreview.github.io/?https://github.com/Logitech/slimserver/blob/public/7.9/Changelog7.html",
        "https://github.com/Logitech/slimserver/commits/public/7.9",
    ),
    (
        "8.0",
        "http://htmlpreview.github.io/?https://github.com/Logitech/slimserver/blob/public/8.0/Changelog8.html",
        "https://github.com/Logitech/slimserver/commits/public/8.0",
    ),
    (
        "8.1",
        "http://htmlpreview.github.io/?https://github.com/Logitech/slimserver/blob/public/8.1/Changelog8.html",
        "https://github.com/Logitech/slimserver/commits/public/8.1",
    ),
    (
        "10.0",
        "http://htmlpreview.github.io/?https://github.com/Logitech/slimserver/blob/public/10.0/Changelog10.html",
        "https://github.com/Logitech/slimserver/commits/public/10.0",
    ),
];

const BUILTIN_NIGHTLY_RULES: &[(&str, &str)] = &[
    // LMS
    (r".*/LogitechMediaServer-.*-[0-9]+\.exe", "Logitech Media Server: Windows Executable Installer"),
    (r".*/LogitechMediaServer-.*-[0-9]+-whs.msi", "Logitech Media Server: Windows Home Server Installer"),
    (r".*/LogitechMediaServer-.*-[0-9]+\.pkg", "Logitech Media Server: Mac OSX Installer"),
    (r".*/LogitechMediaServer-.*-[0-9]+\.dmg", "Logitech Media Server: Mac OSX Installer"),
    (r".*/logitechmediaserver-.*-[0-9]+\.tgz", "Logitech Media Server: Unix Tarball (i386, x86_64, i386 FreeBSD, ARM EABI, PowerPC)"),
    (r".*/logitechmediaserver-.*-[0-9]+-FreeBSD\.tgz", "Logitech Media Server: FreeBSD 7.2 Tarball (i386)"),
    (r".*/logitechmediaserver-.*-[0-9]+-arm-linux\.tgz", "Logitech Media Server: ARM Linux Tarball (ARM EABI)"),
    (r".*/logitechmediaserver-.*-[0-9]+-powerpc-linux\.tgz", "Logitech Media Server: PowerPC Linux Tarball (for Perl 5.8-5.14)"),
    (r".*/logitechmediaserver-.*-[0-9]+-noCPAN.tgz", "Logitech Media Server: Unix Tarball - No CPAN Libraries"),
    (r".*/logitechmediaserver.*~[0-9]+_all\.deb", "Logitech Media Server: Debian Installer Package (i386, x86_64, ARM EABI, PowerPC)"),
    (r".*/logitechmediaserver.*~[0-9]+_amd64\.deb", "Logitech Media Server: Debian Installer Package (x86_64)"),
    (r".*/logitechmediaserver.*~[0-9]+_arm\.deb", "Logitech Media Server: Debian Installer Package (ARM)"),
    (r".*/logitechmediaserver.*~[0-9]+_i386\.deb", "Logitech Media Server: Debian Installer Package (i386)"),
    (r".*/logitechmediaserver-.*-[0-9.]+.[0-9]+\.noarch\.rpm", "Logitech Media Server: RedHat (RPM) Installer Package"),
    (r".*/logitechmediaserver.*-[0-9]+-sparc-readynas\.bin", "Logitech Media Server: NETGEAR ReadyNas Installer Package (Sparc)"),
    (r".*/logitechmediaserver.*-[0-9]+-i386-readynas\.bin", "Logitech Media Server: NETGEAR ReadyNas Pro Installer Package (i386) "),
    (r".*/logitechmediaserver.*-[0-9]+-arm-readynas\.bin", "Logitech Media Server: NETGEAR ReadyNas Duo/NV V2 Installer (ARM) "),
    // UE Music Library
    (r".*/UEMusicLibrary-.*-[0-9]+\.exe", "UE Music Library: Windows Executable Installer"),
    (r".*/UEMusicLibrary-.*-[0-9]+\.pkg", "UE Music Library: Mac OSX Installer"),
    (r".*/uemusiclibrary.*-[0-9]+-sparc-readynas\.bin", "UE Music Library: NETGEAR ReadyNas Duo/NV Installer (Sparc) "),
    (r".*/uemusiclibrary.*-[0-9]+-i386-readynas\.bin", "UE Music Library: NETGEAR ReadyNas Pro Installer (i386) "),
    (r".*/uemusiclibrary.*-[0-9]+-arm-readynas\.bin", "UE Music Library: NETGEAR ReadyNas Duo/NV V2 Installer (ARM) "),
    (r".*/uemusiclibrary.*~[0-9]+_all\.deb", "UE Music Library: Debian Installer Package (i386, x86_64, ARM EABI, PowerPC)"),
    (r".*/uemusiclibrary-.*-[0-9.]+.[0-9]+\.noarch\.rpm", "UE Music Library: RedHat (RPM) Installer Package"),
    (r".*/uemusiclibrary-.*-[0-9]+\.tgz", "UE Music Library: Unix Tarball (for Perl 5.8-5.18, Darwin, i386, x86_64, i386 FreeBSD, ARM EABI, PowerPC)"),
    (r".*/uemusiclibrary-.*-[0-9]+-noCPAN.tgz", "UE Music Library: Unix Tarball - No CPAN Libraries"),
    (r".*/uemusiclibrary-.*-[0-9]+-FreeBSD\.tgz", "UE Music Library: FreeBSD 7.2 Tarball (i386)"),
    (r".*/uemusiclibrary-.*-[0-9]+-arm-linux\.tgz", "UE Music Library: ARM Linux Tarball (for Perl 5.8-5.14, ARM EABI)"),
    (r".*/uemusiclibrary-.*-[0-9]+-powerpc-linux\.tgz", "UE Music Library: PowerPC Linux Tarball (for Perl 5.8-5.14)"),
];

const BUILTIN_PINNED_RULES: &[(&str, &str)] = &[
    (r".*/LogitechMediaServer-{version}\.exe", "Logitech Media Server: Windows Executable Installer"),
    (r".*/LogitechMediaServer-{version}-whs.msi", "Logitech Media Server: Windows Home Server Installer"),
    (r".*/LogitechMediaServer-{version}\.pkg", "Logitech Media Server: Mac OSX Installer"),
    (r".*/logitechmediaserver-{version}\.tgz", "Logitech Media Server: Unix Tarball (i386, x86_64, i386 FreeBSD, ARM EABI, PowerPC)"),
    (r".*/logitechmediaserver-{version}-arm-linux\.tgz", "Logitech Media Server: ARM Linux Tarball (ARM EABI)"),
    (r".*/logitechmediaserver-{version}-noCPAN.tgz", "Logitech Media Server: Unix Tarball - No CPAN Libraries"),
    (r".*/logitechmediaserver_{version}_all\.deb", "Logitech Media Server: Debian Installer Package (i386, x86_64, ARM EABI, PowerPC)"),
    (r".*/logitechmediaserver_{version}_amd64\.deb", "Logitech Media Server: Debian Installer Package (x86_64)"),
    (r".*/logitechmediaserver_{version}_arm\.deb", "Logitech Media Server: Debian Installer Package (ARM)"),
    (r".*/logitechmediaserver_{version}_i386\.deb", "Logitech Media Server: Debian Installer Package (i386)"),
    (r".*/logitechmediaserver-{version}-1\.noarch\.rpm", "Logitech Media Server: RedHat (RPM) Installer Package"),
];
