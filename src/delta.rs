//! # Delta Aggregation
//!
//! Given the pin tables of two platform revisions, compute what changed in
//! every sub-project: clone or refresh its mirror, validate both pinned
//! revisions, and walk the commit range between them.
//!
//! Projects present only in the new table are skipped; there is no old pin
//! to diff against. Projects whose pin string did not move produce an empty
//! record without touching the commit graph, so a pin at a branch name that
//! both tables share never trips range validation.

use std::path::Path;

use log::{debug, warn};

use crate::error::Result;
use crate::mirror::ensure_mirror;
use crate::pins::PinTable;
use crate::revision::{commits_between, resolve_range, validate_revisions, CommitRecord, RangeOrder};

/// The changes of one sub-project between two platform revisions.
#[derive(Debug, Clone)]
pub struct DeltaRecord {
    pub name: String,
    pub url: String,
    pub old_revision: String,
    pub new_revision: String,
    pub commits: Vec<CommitRecord>,
}

/// Compute a [`DeltaRecord`] for every project pinned in both tables.
///
/// Mirrors live under `storage_root`, one directory per project name.
/// Iteration follows the new table's order so the report reads in manifest
/// order. Merge commits are always hidden from sub-project deltas.
pub fn aggregate(
    storage_root: &Path,
    old_table: &PinTable,
    new_table: &PinTable,
    refresh: bool,
) -> Result<Vec<DeltaRecord>> {
    let mut records = Vec::new();
    for entry in new_table.iter() {
        let Some(previous) = old_table.get(&entry.name) else {
            debug!("Skipping new project {}", entry.name);
            continue;
        };

        let mirror = ensure_mirror(&storage_root.join(&entry.name), &entry.url, refresh)?;
        validate_revisions(&mirror, &[&previous.revision, &entry.revision])?;

        if previous.revision == entry.revision {
            records.push(DeltaRecord {
                name: entry.name.clone(),
                url: entry.url.clone(),
                old_revision: previous.revision.clone(),
                new_revision: entry.revision.clone(),
                commits: Vec::new(),
            });
            continue;
        }

        let (old_revision, new_revision) =
            match resolve_range(&mirror, &previous.revision, &entry.revision, true)? {
                RangeOrder::Ordered => (previous.revision.clone(), entry.revision.clone()),
                RangeOrder::Flipped => {
                    warn!(
                        "Revisions for {} appear reversed, swapping them",
                        entry.name
                    );
                    (entry.revision.clone(), previous.revision.clone())
                }
            };

        let commits = commits_between(&mirror, &old_revision, &new_revision, true)?;
        records.push(DeltaRecord {
            name: entry.name.clone(),
            url: entry.url.clone(),
            old_revision,
            new_revision,
            commits,
        });
    }
    Ok(records)
}
