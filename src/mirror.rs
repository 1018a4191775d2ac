//! # Repository Mirror Management
//!
//! Every repository the tool reads, the platform repository and each pinned
//! sub-project alike, is kept as a local clone ("mirror") in a per-project
//! subdirectory of the storage directory. A mirror is created on first
//! reference to a URL and reused for the remainder of the process lifetime;
//! it is updated in place and never deleted by this tool.
//!
//! Mirrors own a single working tree that is repeatedly reset and
//! re-checked-out. The reset is deliberate and destructive: local
//! modifications and untracked files are discarded before every checkout so
//! historical revisions can be materialized cleanly. Because of this
//! shared-mutable-working-tree model, operations against one mirror must
//! never interleave; the whole tool is single-threaded for that reason.
//!
//! Network access happens only when a mirror is first cloned or when the
//! caller asks for a refresh; otherwise everything operates on whatever
//! history is already mirrored locally.

use std::fs;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{AutotagOption, BranchType, FetchOptions, Oid, Repository};
use log::{debug, info};

use crate::error::{Error, Result};

/// A local, addressable clone of a remote repository.
pub struct Mirror {
    url: String,
    path: PathBuf,
    repo: Repository,
}

/// Ensure a queryable mirror of `url` exists at `path`.
///
/// Clones the repository if no mirror exists yet, otherwise opens the
/// existing one. In both cases the working tree is force-reset to the
/// remote's default branch tip. When `refresh` is true the mirror also
/// fetches all branches, tags, and (for github hosts) pull-request refs,
/// populating retrievable history without merging anything.
///
/// Creation is idempotent: calling this twice with no intervening remote
/// changes yields a mirror at the same tip both times.
pub fn ensure_mirror(path: &Path, url: &str, refresh: bool) -> Result<Mirror> {
    let repo = if path.exists() {
        Repository::open(path)
    } else {
        info!("Cloning {} into {}", url, path.display());
        Repository::clone(url, path)
    }
    .map_err(|e| Error::MirrorUnavailable {
        url: url.to_string(),
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let mirror = Mirror {
        url: url.to_string(),
        path: path.to_path_buf(),
        repo,
    };
    mirror.reset_to_default_branch()?;
    if refresh {
        mirror.fetch()?;
    }
    Ok(mirror)
}

impl Mirror {
    /// The mirror's canonical local path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The source URL this mirror tracks.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Force-reset the working tree and check out an arbitrary revision,
    /// leaving HEAD detached at the resolved commit.
    ///
    /// Local modifications and untracked files are discarded first.
    pub fn checkout(&self, revision: &str) -> Result<()> {
        let commit = self
            .repo
            .revparse_single(revision)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|_| Error::InvalidRevision {
                revision: revision.to_string(),
                mirror: self.path.clone(),
            })?;
        debug!(
            "Checking out {} in {} at {}",
            revision,
            self.path.display(),
            commit.id()
        );
        self.checkout_detached(commit.id())?;
        Ok(())
    }

    /// Fetch updates from the source URL into this mirror.
    ///
    /// The refspecs cover all branches and tags; for github hosts the
    /// pull-request refs are included as well so manifest pins that only
    /// exist on review branches stay resolvable. Nothing is merged into
    /// the default branch.
    pub fn fetch(&self) -> Result<()> {
        let mut refspecs = vec![
            "+refs/heads/*:refs/remotes/origin/*".to_string(),
            "+refs/heads/*:refs/heads/*".to_string(),
            "+refs/tags/*:refs/tags/*".to_string(),
        ];
        if self.url.contains("github.com") {
            refspecs.push("+refs/pull/*:refs/remotes/origin/pr/*".to_string());
        }
        let refspecs: Vec<&str> = refspecs.iter().map(String::as_str).collect();

        debug!("Fetching {} into {}", self.url, self.path.display());
        let mut options = FetchOptions::new();
        options.download_tags(AutotagOption::All);
        self.repo
            .remote_anonymous(&self.url)
            .and_then(|mut remote| remote.fetch(&refspecs, Some(&mut options), None))
            .map_err(|e| Error::MirrorUnavailable {
                url: self.url.clone(),
                path: self.path.clone(),
                message: e.message().to_string(),
            })
    }

    /// Discard any local state and detach HEAD at the default branch tip.
    fn reset_to_default_branch(&self) -> Result<()> {
        let target = self
            .default_branch_target()
            .ok_or_else(|| Error::MirrorUnavailable {
                url: self.url.clone(),
                path: self.path.clone(),
                message: "no default branch found".to_string(),
            })?;
        self.checkout_detached(target)
            .map_err(|e| Error::MirrorUnavailable {
                url: self.url.clone(),
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    /// The commit the remote considers its default branch tip.
    ///
    /// Prefers the origin HEAD symref; falls back through the conventional
    /// branch names and finally whatever HEAD currently points at.
    fn default_branch_target(&self) -> Option<Oid> {
        if let Ok(head) = self.repo.find_reference("refs/remotes/origin/HEAD") {
            if let Ok(resolved) = head.resolve() {
                if let Some(oid) = resolved.target() {
                    return Some(oid);
                }
            }
        }
        for name in ["origin/master", "origin/main"] {
            if let Ok(branch) = self.repo.find_branch(name, BranchType::Remote) {
                if let Some(oid) = branch.get().target() {
                    return Some(oid);
                }
            }
        }
        for name in ["master", "main"] {
            if let Ok(branch) = self.repo.find_branch(name, BranchType::Local) {
                if let Some(oid) = branch.get().target() {
                    return Some(oid);
                }
            }
        }
        self.repo.head().ok().and_then(|h| h.target())
    }

    fn checkout_detached(&self, oid: Oid) -> std::result::Result<(), git2::Error> {
        let object = self.repo.find_object(oid, None)?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force().remove_untracked(true);
        self.repo.checkout_tree(&object, Some(&mut checkout))?;
        self.repo.set_head_detached(oid)
    }
}

/// Expand and create the mirror storage directory.
///
/// Only a single directory level is created; a missing parent fails loudly
/// so the user can decide where their mirrors should live.
pub fn prepare_storage_dir(raw: &str) -> Result<PathBuf> {
    let expanded = expand_home(raw);
    if !expanded.exists() {
        fs::create_dir(&expanded).map_err(|e| Error::StorageDir {
            path: raw.to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(expanded)
}

fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Derive the storage subdirectory name for a repository URL: the last path
/// segment, minus any `.git` suffix.
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let last = last.strip_suffix(".git").unwrap_or(last);
    last.to_string()
}
