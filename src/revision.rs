//! # Revision Validation and Range Resolution
//!
//! Revision identifiers arrive from two untrusted places: the command line
//! (the two platform revisions) and the pin manifests (the per-project
//! pins). This module validates that identifiers resolve to commits in a
//! given mirror and determines the correct, non-empty commit range between
//! two of them.
//!
//! Range resolution is deliberately forgiving about orientation: users
//! routinely supply old/new in reverse order, and the difference is purely
//! cosmetic. If `old..new` is empty but `new..old` is not, the range is
//! reported as [`RangeOrder::Flipped`] so the caller can swap the endpoints
//! instead of failing. Only when both directions are empty is the range
//! declared invalid.

use chrono::{DateTime, Utc};
use git2::Sort;
use log::debug;

use crate::error::{Error, Result};
use crate::mirror::Mirror;

/// Summary-line prefix that marks a commit as a merge for filtering
/// purposes.
pub const MERGE_PREFIX: &str = "Merge ";

/// One historical commit, read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Full hex identifier.
    pub sha: String,
    /// One-line summary.
    pub summary: String,
    /// Full commit message.
    pub message: String,
    /// Author name.
    pub author: String,
    /// Commit time.
    pub time: DateTime<Utc>,
}

impl CommitRecord {
    /// Abbreviated identifier for display.
    pub fn short_sha(&self) -> &str {
        &self.sha[..8.min(self.sha.len())]
    }
}

/// Outcome of resolving a revision pair into a usable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOrder {
    /// The pair was already ordered: `old..new` is non-empty.
    Ordered,
    /// The pair was supplied in reverse: only `new..old` is non-empty.
    /// The caller decides whether to swap before computing deltas.
    Flipped,
}

/// Check that every identifier resolves to a commit in the mirror.
///
/// Fails on the first identifier that does not, naming it and the mirror's
/// location so the user can decide to refresh.
pub fn validate_revisions(mirror: &Mirror, revisions: &[&str]) -> Result<()> {
    for revision in revisions {
        debug!(
            "Validating {} exists in {}",
            revision,
            mirror.path().display()
        );
        let found = mirror
            .repo()
            .revparse_single(revision)
            .and_then(|obj| obj.peel_to_commit());
        if found.is_err() {
            return Err(Error::InvalidRevision {
                revision: revision.to_string(),
                mirror: mirror.path().to_path_buf(),
            });
        }
    }
    Ok(())
}

/// All commits reachable from `new` but not from `old`, newest first.
///
/// When `hide_merges` is set, commits whose summary starts with the literal
/// prefix `"Merge "` are dropped from the result.
pub fn commits_between(
    mirror: &Mirror,
    old: &str,
    new: &str,
    hide_merges: bool,
) -> Result<Vec<CommitRecord>> {
    let repo = mirror.repo();
    let old_id = repo.revparse_single(old)?.peel_to_commit()?.id();
    let new_id = repo.revparse_single(new)?.peel_to_commit()?.id();

    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    walk.push(new_id)?;
    walk.hide(old_id)?;

    let mut records = Vec::new();
    for id in walk {
        let commit = repo.find_commit(id?)?;
        let summary = commit.summary().unwrap_or("").to_string();
        if hide_merges && summary.starts_with(MERGE_PREFIX) {
            continue;
        }
        records.push(CommitRecord {
            sha: commit.id().to_string(),
            summary,
            message: commit.message().unwrap_or("").to_string(),
            author: commit.author().name().unwrap_or("Unknown").to_string(),
            time: DateTime::from_timestamp(commit.time().seconds(), 0)
                .unwrap_or(DateTime::UNIX_EPOCH),
        });
    }
    Ok(records)
}

/// Determine whether a revision pair forms a usable range, and in which
/// orientation.
///
/// Tries `old..new` first, then the swapped orientation, before declaring
/// the range invalid.
pub fn resolve_range(
    mirror: &Mirror,
    old: &str,
    new: &str,
    hide_merges: bool,
) -> Result<RangeOrder> {
    if !commits_between(mirror, old, new, hide_merges)?.is_empty() {
        return Ok(RangeOrder::Ordered);
    }
    debug!(
        "{}..{} is empty in {}; trying the reverse orientation",
        old,
        new,
        mirror.path().display()
    );
    if !commits_between(mirror, new, old, hide_merges)?.is_empty() {
        return Ok(RangeOrder::Flipped);
    }
    Err(Error::InvalidRange {
        old: old.to_string(),
        new: new.to_string(),
        mirror: mirror.path().to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::ensure_mirror;
    use crate::testutil::FixtureRepo;
    use tempfile::TempDir;

    fn mirror_of(fixture: &FixtureRepo) -> (TempDir, Mirror) {
        let storage = TempDir::new().unwrap();
        let mirror = ensure_mirror(&storage.path().join("repo"), &fixture.url(), false).unwrap();
        (storage, mirror)
    }

    #[test]
    fn test_validate_revisions_ok() {
        let fixture = FixtureRepo::new();
        let sha = fixture.commit_file("a.txt", "a", "First");
        let (_storage, mirror) = mirror_of(&fixture);
        validate_revisions(&mirror, &[&sha, "HEAD"]).unwrap();
    }

    #[test]
    fn test_validate_revisions_reports_offender() {
        let fixture = FixtureRepo::new();
        fixture.commit_file("a.txt", "a", "First");
        let (_storage, mirror) = mirror_of(&fixture);

        let err = validate_revisions(&mirror, &["HEAD", "no-such-rev"]).unwrap_err();
        match err {
            Error::InvalidRevision { revision, .. } => assert_eq!(revision, "no-such-rev"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_commits_between_newest_first() {
        let fixture = FixtureRepo::new();
        let c1 = fixture.commit_file("a.txt", "1", "First");
        let c2 = fixture.commit_file("a.txt", "2", "Second");
        let c3 = fixture.commit_file("a.txt", "3", "Third");
        let (_storage, mirror) = mirror_of(&fixture);

        let commits = commits_between(&mirror, &c1, &c3, true).unwrap();
        let shas: Vec<&str> = commits.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec![c3.as_str(), c2.as_str()]);
        assert_eq!(commits[0].summary, "Third");
        assert_eq!(commits[0].author, "Fixture");
    }

    #[test]
    fn test_merge_prefix_filtering() {
        let fixture = FixtureRepo::new();
        let base = fixture.commit_file("a.txt", "0", "Base");
        fixture.commit_file("a.txt", "1", "Merge branch 'stable' into main");
        fixture.commit_file("a.txt", "2", "Merge remote-tracking branch");
        fixture.commit_file("a.txt", "3", "Merge pull request #42");
        let (_storage, mirror) = mirror_of(&fixture);

        let hidden = commits_between(&mirror, &base, "HEAD", true).unwrap();
        assert!(hidden.is_empty());

        let shown = commits_between(&mirror, &base, "HEAD", false).unwrap();
        assert_eq!(shown.len(), 3);
    }

    #[test]
    fn test_resolve_range_ordered() {
        let fixture = FixtureRepo::new();
        let c1 = fixture.commit_file("a.txt", "1", "First");
        let c2 = fixture.commit_file("a.txt", "2", "Second");
        let (_storage, mirror) = mirror_of(&fixture);

        assert_eq!(
            resolve_range(&mirror, &c1, &c2, true).unwrap(),
            RangeOrder::Ordered
        );
    }

    #[test]
    fn test_resolve_range_flipped_yields_same_commits() {
        let fixture = FixtureRepo::new();
        let c1 = fixture.commit_file("a.txt", "1", "First");
        fixture.commit_file("a.txt", "2", "Second");
        let c3 = fixture.commit_file("a.txt", "3", "Third");
        let (_storage, mirror) = mirror_of(&fixture);

        // Inputs reversed: resolver reports the flip.
        assert_eq!(
            resolve_range(&mirror, &c3, &c1, true).unwrap(),
            RangeOrder::Flipped
        );

        // After the swap the caller gets the same two commits the
        // correctly-ordered call would have produced.
        let swapped = commits_between(&mirror, &c1, &c3, true).unwrap();
        assert_eq!(swapped.len(), 2);
        assert_eq!(swapped[0].sha, c3);
    }

    #[test]
    fn test_resolve_range_invalid_for_identical_revisions() {
        let fixture = FixtureRepo::new();
        let c1 = fixture.commit_file("a.txt", "1", "First");
        let (_storage, mirror) = mirror_of(&fixture);

        let err = resolve_range(&mirror, &c1, &c1, true).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn test_short_sha() {
        let record = CommitRecord {
            sha: "1945ab9c752534e733c38ba0109dc3b741f0a6eb".to_string(),
            summary: "x".to_string(),
            message: "x".to_string(),
            author: "a".to_string(),
            time: DateTime::UNIX_EPOCH,
        };
        assert_eq!(record.short_sha(), "1945ab9c");
    }
}
