//! Read-only git introspection
//!
//! CI scripts need three facts about the checkout they run in:
//! - the repository's top-level directory
//! - the current branch (none when HEAD is detached)
//! - the URL of a remote
//!
//! The repository is discovered from a start directory by searching parents, the same
//! way `git rev-parse --show-toplevel` does.

use std::path::{Path, PathBuf};

use git2::{ErrorCode, Repository};
use serde::Serialize;

use crate::error::{ModkitError, Result};

/// Default remote consulted by [`remote_url`]
pub const DEFAULT_REMOTE: &str = "origin";

/// Summary printed by `modkit git info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GitInfo {
    pub top_level: PathBuf,
    pub branch: Option<String>,
    pub remote_url: Option<String>,
}

/// Open the repository enclosing `start`
pub fn discover(start: &Path) -> Result<Repository> {
    Repository::discover(start).map_err(|e| match e.code() {
        ErrorCode::NotFound => ModkitError::NotInGitRepository,
        _ => ModkitError::from(e),
    })
}

/// Work-tree root of the repository enclosing `start`
pub fn top_level_directory(start: &Path) -> Result<PathBuf> {
    let repo = discover(start)?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| ModkitError::GitOperationFailed {
            message: "repository is bare and has no working directory".to_string(),
        })?;
    // libgit2 reports the workdir with a trailing separator
    Ok(dunce::simplified(workdir).components().collect())
}

/// Short name of the checked-out branch, `None` when HEAD is detached
///
/// A freshly initialised repository has no commits yet; its branch name is read from
/// the symbolic HEAD.
pub fn current_branch(repo: &Repository) -> Result<Option<String>> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head.shorthand().map(ToString::to_string)),
        Ok(_) => Ok(None),
        Err(e) if e.code() == ErrorCode::UnbornBranch => {
            let head = repo.find_reference("HEAD")?;
            Ok(head
                .symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
                .map(ToString::to_string))
        }
        Err(e) => Err(e.into()),
    }
}

/// URL of `remote`, `None` when no such remote exists
pub fn remote_url(repo: &Repository, remote: &str) -> Result<Option<String>> {
    match repo.find_remote(remote) {
        Ok(r) => Ok(r.url().map(ToString::to_string)),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) if e.class() == git2::ErrorClass::Config => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All three facts at once
pub fn info(start: &Path, remote: &str) -> Result<GitInfo> {
    let repo = discover(start)?;
    Ok(GitInfo {
        top_level: top_level_directory(start)?,
        branch: current_branch(&repo)?,
        remote_url: remote_url(&repo, remote)?,
    })
}
