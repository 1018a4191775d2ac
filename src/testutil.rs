//! Fixture repositories for unit tests, built programmatically with `git2`.

use std::fs;
use std::path::Path;

use git2::{Commit, Repository, Signature};
use tempfile::TempDir;

pub struct FixtureRepo {
    dir: TempDir,
    pub repo: Repository,
}

impl FixtureRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Fixture").unwrap();
            config.set_str("user.email", "fixture@example.com").unwrap();
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The fixture's path as a clone URL.
    pub fn url(&self) -> String {
        self.dir.path().display().to_string()
    }

    /// Write `content` to `name` (creating parent directories), stage it,
    /// and commit with `message`. Returns the new commit SHA.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> String {
        let full = self.dir.path().join(name);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();

        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let signature = Signature::now("Fixture", "fixture@example.com").unwrap();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap();
        oid.to_string()
    }

    /// Create an annotated tag at HEAD.
    pub fn tag(&self, name: &str) {
        let head = self
            .repo
            .head()
            .unwrap()
            .peel(git2::ObjectType::Commit)
            .unwrap();
        let signature = Signature::now("Fixture", "fixture@example.com").unwrap();
        self.repo.tag(name, &head, &signature, name, false).unwrap();
    }

    pub fn head_sha(&self) -> String {
        self.repo
            .head()
            .unwrap()
            .peel_to_commit()
            .unwrap()
            .id()
            .to_string()
    }
}
