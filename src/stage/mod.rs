//! Stock file staging
//!
//! Populates a user-writable directory with stock files from a read-only
//! installed tree. Files the user already has are never overwritten: a
//! customization wins until the user deletes it.
//!
//! The walk is a visitor. For every entry the stager asks a policy what to
//! do with the (source, destination) pair; [`copy_if_absent`] is the policy
//! used for real deployments.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DeployError, FileCategory, IoOp};

/// Kind of a source entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// What the stager does with one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    /// Leave the destination alone (for a directory: the whole subtree)
    Skip,
    /// Copy the file bytes to the destination
    Copy,
    /// Descend into a directory
    Recurse,
}

/// Counts for one staging call
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub copied: usize,
    pub skipped: usize,
}

/// Default policy: recurse into directories, copy files missing at the destination
pub fn copy_if_absent(_source: &Path, dest: &Path, kind: EntryKind) -> StageAction {
    match kind {
        EntryKind::Directory => StageAction::Recurse,
        // symlink_metadata so a dangling link still counts as present
        EntryKind::File if fs::symlink_metadata(dest).is_ok() => StageAction::Skip,
        EntryKind::File => StageAction::Copy,
    }
}

/// Policy signature
pub type StagePolicy = fn(&Path, &Path, EntryKind) -> StageAction;

/// Recursive copy-if-absent stager
pub struct DirectoryStager<P = StagePolicy> {
    category: FileCategory,
    policy: P,
}

impl DirectoryStager {
    pub fn new(category: FileCategory) -> Self {
        Self {
            category,
            policy: copy_if_absent,
        }
    }
}

impl<P> DirectoryStager<P>
where
    P: Fn(&Path, &Path, EntryKind) -> StageAction,
{
    /// Replace the staging policy
    pub fn with_policy<Q>(self, policy: Q) -> DirectoryStager<Q>
    where
        Q: Fn(&Path, &Path, EntryKind) -> StageAction,
    {
        DirectoryStager {
            category: self.category,
            policy,
        }
    }

    /// Stage `source` into `dest`.
    ///
    /// Fails on the first error; files copied before it stay in place.
    pub fn stage(&self, source: &Path, dest: &Path) -> Result<StageReport, DeployError> {
        let mut report = StageReport::default();
        self.stage_dir(source, dest, &mut report)?;
        debug!(
            category = %self.category,
            source = %source.display(),
            dest = %dest.display(),
            copied = report.copied,
            skipped = report.skipped,
            "staged stock files"
        );
        Ok(report)
    }

    fn stage_dir(&self, source: &Path, dest: &Path, report: &mut StageReport) -> Result<(), DeployError> {
        fs::create_dir_all(dest).map_err(DeployError::io(IoOp::Create, self.category, dest))?;

        let (dirs, files) = self.list(source)?;

        // Subdirectories first, then the files at this level
        for name in dirs {
            let src = source.join(&name);
            let dst = dest.join(&name);
            match (self.policy)(&src, &dst, EntryKind::Directory) {
                StageAction::Skip => report.skipped += 1,
                StageAction::Copy | StageAction::Recurse => self.stage_dir(&src, &dst, report)?,
            }
        }

        for name in files {
            let src = source.join(&name);
            let dst = dest.join(&name);
            match (self.policy)(&src, &dst, EntryKind::File) {
                StageAction::Copy => {
                    let contents =
                        fs::read(&src).map_err(DeployError::io(IoOp::Read, self.category, &src))?;
                    fs::write(&dst, contents)
                        .map_err(DeployError::io(IoOp::Write, self.category, &dst))?;
                    report.copied += 1;
                }
                StageAction::Skip | StageAction::Recurse => report.skipped += 1,
            }
        }

        Ok(())
    }

    /// Entry names of `source` split into (directories, files), sorted by name
    fn list(&self, source: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>), DeployError> {
        let list_err = || DeployError::io(IoOp::List, self.category, source);

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in fs::read_dir(source).map_err(list_err())? {
            let entry = entry.map_err(list_err())?;
            let name = PathBuf::from(entry.file_name());
            // follows symlinks, so a linked directory is staged as a directory
            if entry.path().is_dir() {
                dirs.push(name);
            } else {
                files.push(name);
            }
        }
        dirs.sort();
        files.sort();
        Ok((dirs, files))
    }
}
