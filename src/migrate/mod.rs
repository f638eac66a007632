//! Legacy schema field removal for staged manifests
//!
//! Staged override files are user-owned, so upstream schema changes have to
//! be applied in place. Each change is a [`ReplacementRule`]; adding a new
//! obsolete-field removal means adding a row to [`LEGACY_FIELD_RULES`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{DeployError, FileCategory, IoOp};

/// Only files with this extension are rewritten
pub const MANIFEST_EXTENSION: &str = "yml";

/// A byte-level find/replace applied to every occurrence
#[derive(Debug, Clone, Copy)]
pub struct ReplacementRule {
    pub description: &'static str,
    pub pattern: &'static [u8],
    pub replacement: &'static [u8],
}

/// Obsolete fields, removed in order. CRLF forms come before LF forms so the
/// LF rule never splits a CRLF pair.
pub const LEGACY_FIELD_RULES: &[ReplacementRule] = &[
    ReplacementRule {
        description: "compose file version (CRLF)",
        pattern: b"\r\nversion: \"3.7\"",
        replacement: b"\r\n",
    },
    ReplacementRule {
        description: "compose file version (LF)",
        pattern: b"\nversion: \"3.7\"",
        replacement: b"\n",
    },
];

/// Result of one migration walk
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Manifest files examined
    pub scanned: usize,
    /// Manifest files rewritten, in walk order
    pub rewritten: Vec<PathBuf>,
}

/// Applies a rule table to every manifest under a root
pub struct SchemaMigrator<'a> {
    rules: &'a [ReplacementRule],
    category: FileCategory,
}

impl Default for SchemaMigrator<'static> {
    fn default() -> Self {
        Self::new(LEGACY_FIELD_RULES)
    }
}

impl<'a> SchemaMigrator<'a> {
    pub fn new(rules: &'a [ReplacementRule]) -> Self {
        Self {
            rules,
            category: FileCategory::Override,
        }
    }

    pub fn with_category(mut self, category: FileCategory) -> Self {
        self.category = category;
        self
    }

    /// Apply the rules to a buffer, returning the rewritten bytes if anything changed
    pub fn apply(&self, contents: &[u8]) -> Option<Vec<u8>> {
        let mut current = contents.to_vec();
        let mut changed = false;
        for rule in self.rules {
            if let Some(next) = replace_all(&current, rule.pattern, rule.replacement) {
                debug!(rule = rule.description, "legacy field matched");
                current = next;
                changed = true;
            }
        }
        (changed && current != contents).then_some(current)
    }

    /// Walk `root` and migrate every manifest file in place.
    ///
    /// A missing root has nothing to migrate. Fails on the first read or
    /// write error; files already migrated stay migrated.
    pub fn migrate(&self, root: &Path) -> Result<MigrationReport, DeployError> {
        let mut report = MigrationReport::default();
        if !root.exists() {
            return Ok(report);
        }

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| DeployError::Walk {
                category: self.category,
                source,
            })?;
            // path metadata follows links, so a linked manifest is migrated in its target
            if !entry.path().is_file() || !is_manifest(entry.path()) {
                continue;
            }

            let path = entry.path();
            report.scanned += 1;

            let contents =
                fs::read(path).map_err(DeployError::io(IoOp::Read, self.category, path))?;
            if let Some(updated) = self.apply(&contents) {
                fs::write(path, updated).map_err(DeployError::io(IoOp::Write, self.category, path))?;
                report.rewritten.push(path.to_path_buf());
            }
        }

        if !report.rewritten.is_empty() {
            info!(
                root = %root.display(),
                count = report.rewritten.len(),
                "removed obsolete fields from staged manifests"
            );
        }
        Ok(report)
    }
}

fn is_manifest(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MANIFEST_EXTENSION)
}

/// Replace every non-overlapping occurrence of `needle`; `None` if there was none
fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Option<Vec<u8>> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }

    let mut out = Vec::with_capacity(haystack.len());
    let mut found = false;
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            out.extend_from_slice(replacement);
            i += needle.len();
            found = true;
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    found.then_some(out)
}
