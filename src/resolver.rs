//! Latest-artifact resolution: for every rule, the newest file under a
//! directory tree whose path matches the rule's pattern.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One artifact class to look for.
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Regex,
    pub label: String,
}

impl Rule {
    pub fn new(pattern: Regex, label: impl Into<String>) -> Self {
        Self {
            pattern,
            label: label.into(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.pattern.is_match(&path.to_string_lossy())
    }
}

/// A regular file seen during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl CandidateFile {
    /// Path below `base` with `/` separators, for links and feed URLs.
    /// Falls back to the full path when the file is not under `base`.
    pub fn relative_to(&self, base: &Path) -> String {
        let Ok(rel) = self.path.strip_prefix(base) else {
            return self.path.to_string_lossy().into_owned();
        };
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// The winning file for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Position of the rule in the rule set.
    pub rule_index: usize,
    pub label: String,
    pub file: CandidateFile,
}

impl Resolution {
    /// Last path component, as shown to users.
    pub fn file_name(&self) -> String {
        self.file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Recursively lists the regular files under `root`.
///
/// Entries are visited in file-name order so repeated scans of the same
/// tree produce the same sequence. A missing or unreadable root yields an
/// empty list; unreadable entries below it are skipped.
pub fn scan_files(root: &Path) -> Vec<CandidateFile> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if e.depth() == 0 {
                    debug!(root = %root.display(), error = %e, "scan root not readable");
                } else {
                    warn!(error = %e, "skipping unreadable entry");
                }
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "stat failed");
                continue;
            }
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };

        files.push(CandidateFile {
            path: entry.into_path(),
            size: metadata.len(),
            modified: DateTime::<Utc>::from(modified),
        });
    }

    debug!(root = %root.display(), files = files.len(), "scan complete");
    files
}

/// Picks the newest match for each rule out of an already scanned listing.
///
/// Only a strictly newer file replaces the current best, so among files
/// with equal timestamps the one listed first wins.
pub fn select_latest(files: &[CandidateFile], rules: &[Rule]) -> Vec<Resolution> {
    rules
        .iter()
        .enumerate()
        .filter_map(|(rule_index, rule)| {
            let mut best: Option<&CandidateFile> = None;
            for file in files.iter().filter(|f| rule.matches(&f.path)) {
                if best.is_none_or(|b| file.modified > b.modified) {
                    best = Some(file);
                }
            }
            best.map(|file| Resolution {
                rule_index,
                label: rule.label.clone(),
                file: file.clone(),
            })
        })
        .collect()
}

/// Scans `root` once and resolves every rule against the listing.
pub fn resolve(root: &Path, rules: &[Rule]) -> Vec<Resolution> {
    if rules.is_empty() {
        return Vec::new();
    }
    let files = scan_files(root);
    select_latest(&files, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(path: &str, secs: i64) -> CandidateFile {
        CandidateFile {
            path: PathBuf::from(path),
            size: 1,
            modified: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    fn rule(pattern: &str, label: &str) -> Rule {
        Rule::new(Regex::new(pattern).unwrap(), label)
    }

    #[test]
    fn newest_match_wins() {
        let files = vec![file("./8.1/app-2.0.exe", 200), file("./8.1/app-1.0.exe", 100)];
        let out = select_latest(&files, &[rule(r"app-.*\.exe", "Windows")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].file_name(), "app-2.0.exe");
    }

    #[test]
    fn equal_timestamps_keep_first_listed() {
        let files = vec![file("./a/app-1.exe", 100), file("./b/app-2.exe", 100)];
        let out = select_latest(&files, &[rule(r"app-.*\.exe", "Windows")]);
        assert_eq!(out[0].file.path, PathBuf::from("./a/app-1.exe"));
    }

    #[test]
    fn epoch_timestamp_still_counts_as_match() {
        let files = vec![file("./old.pkg", 0)];
        let out = select_latest(&files, &[rule(r"\.pkg$", "Mac")]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn unmatched_rules_are_omitted_and_order_kept() {
        let files = vec![file("./x.deb", 5), file("./x.exe", 5)];
        let rules = [
            rule(r"\.exe$", "Windows"),
            rule(r"\.dmg$", "Mac"),
            rule(r"\.deb$", "Debian"),
        ];
        let out = select_latest(&files, &rules);
        let labels: Vec<_> = out.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["Windows", "Debian"]);
        assert_eq!(out[1].rule_index, 2);
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let f = file("/srv/nightly/8.1/sub/app.exe", 1);
        assert_eq!(f.relative_to(Path::new("/srv/nightly")), "8.1/sub/app.exe");
        assert_eq!(f.relative_to(Path::new("/elsewhere")), "/srv/nightly/8.1/sub/app.exe");
    }

    #[test]
    fn empty_rules_skip_scan() {
        assert!(resolve(Path::new("/definitely/not/here"), &[]).is_empty());
    }

    #[test]
    fn missing_root_is_empty_listing() {
        assert!(scan_files(Path::new("/definitely/not/here")).is_empty());
        let out = resolve(Path::new("/definitely/not/here"), &[rule(".*", "all")]);
        assert!(out.is_empty());
    }
}
