//! Shared fixtures for the integration tests.
//!
//! Builds a miniature platform repository with two revisions, a pinned
//! sub-project used as both a role and a package, a role added between the
//! revisions, and a merge-summary commit in the platform history.

// Not every test binary uses every fixture field.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use git2::{Commit, Repository, Signature};
use tempfile::TempDir;

pub struct PlatformFixture {
    _webapp_dir: TempDir,
    _platform_dir: TempDir,
    pub webapp_url: String,
    pub platform_url: String,
    /// First webapp commit, the old pin.
    pub webapp_old: String,
    /// Last webapp commit, the new pin.
    pub webapp_new: String,
    /// Platform revision pinning the old webapp commit.
    pub platform_old: String,
    /// Platform revision pinning the new webapp commit.
    pub platform_new: String,
}

impl PlatformFixture {
    pub fn build() -> Self {
        let webapp_dir = TempDir::new().unwrap();
        let webapp = init_repo(webapp_dir.path());
        let webapp_old = commit_file(&webapp, "app.py", "v1", "Initial import");
        commit_file(&webapp, "app.py", "v2", "Add feature");
        commit_file(&webapp, "app.py", "v3", "Merge branch 'fix'");
        let webapp_new = commit_file(&webapp, "app.py", "v4", "Fix bug");

        let webapp_url = webapp_dir.path().display().to_string();
        let platform_dir = TempDir::new().unwrap();
        let platform = init_repo(platform_dir.path());

        let platform_old = commit_platform(&platform, &webapp_url, &webapp_old, false);
        commit_file(
            &platform,
            "README.rst",
            "platform docs",
            "Merge pull request #7 from fork/docs",
        );
        let platform_new = commit_platform(&platform, &webapp_url, &webapp_new, true);

        Self {
            webapp_url,
            platform_url: platform_dir.path().display().to_string(),
            webapp_old,
            webapp_new,
            platform_old,
            platform_new,
            _webapp_dir: webapp_dir,
            _platform_dir: platform_dir,
        }
    }
}

fn commit_platform(
    platform: &Repository,
    webapp_url: &str,
    webapp_pin: &str,
    with_extra_role: bool,
) -> String {
    let mut roles = format!(
        "- name: webapp\n  src: {webapp_url}\n  version: {webapp_pin}\n"
    );
    if with_extra_role {
        roles.push_str("- name: brandnew\n  src: /nowhere/brandnew\n  version: HEAD\n");
    }
    commit_file(platform, "ansible-role-requirements.yml", &roles, "Update role pins");

    let packages = format!(
        "webapi_git_repo: {webapp_url}\nwebapi_git_install_branch: {webapp_pin}\n"
    );
    commit_file(
        platform,
        "playbooks/defaults/repo_packages/service.yml",
        &packages,
        "Update package pins",
    )
}

fn init_repo(path: &Path) -> Repository {
    let repo = Repository::init(path).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Fixture").unwrap();
        config.set_str("user.email", "fixture@example.com").unwrap();
    }
    repo
}

fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> String {
    let workdir = repo.workdir().unwrap();
    let full = workdir.join(name);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&full, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let signature = Signature::now("Fixture", "fixture@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap()
        .to_string()
}
