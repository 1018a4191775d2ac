//! # Pin-Table Extraction
//!
//! The platform repository records, at every revision, which sub-projects it
//! depends on and at which exact revision each one is pinned. This module
//! materializes that information as a [`PinTable`] for an arbitrary
//! historical platform revision.
//!
//! Two manifest shapes exist upstream and both normalize to the same table:
//!
//! - **List form** ([`PinSource::RoleManifest`]): a YAML sequence of records
//!   with `name`, `src`, and an optional `version` defaulting to `HEAD`.
//! - **Keyed form** ([`PinSource::PackageManifests`]): a flat YAML mapping
//!   spread over several files, where every `<project>_git_repo` key names a
//!   project and the sibling `<project>_git_install_branch` key supplies its
//!   pinned revision. Files are merged in sorted filename order with later
//!   keys overriding earlier ones.
//!
//! Extraction checks out the requested revision in the platform mirror
//! first, mutating its working tree; the mirror's force-reset discipline
//! makes that safe to repeat.

use std::fs;
use std::path::PathBuf;

use glob::glob;
use log::{debug, info};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::mirror::Mirror;

/// Pinned revision recorded when a list-form entry omits its `version`.
pub const DEFAULT_REVISION: &str = "HEAD";

const REPO_KEY_SUFFIX: &str = "_git_repo";
const BRANCH_KEY_SUFFIX: &str = "_git_install_branch";

/// One sub-project pin: name, source URL, pinned revision.
///
/// Pin entries are immutable snapshots produced freshly for every platform
/// revision query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEntry {
    pub name: String,
    pub url: String,
    pub revision: String,
}

/// The normalized pin table of one platform revision.
///
/// Ordered by first appearance in the manifests. Names are unique: a
/// duplicate name replaces the earlier entry's data (last writer wins)
/// while keeping its original position, matching the merge semantics of the
/// underlying keyed manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinTable {
    entries: Vec<PinEntry>,
}

impl PinTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any existing entry with the same name.
    pub fn insert(&mut self, entry: PinEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == entry.name) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Look up a pin by project name.
    pub fn get(&self, name: &str) -> Option<&PinEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PinEntry> for PinTable {
    fn from_iter<I: IntoIterator<Item = PinEntry>>(iter: I) -> Self {
        let mut table = PinTable::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// Which manifest shape to read, and where to find it relative to the
/// platform repository root.
#[derive(Debug, Clone)]
pub enum PinSource {
    /// List form: one YAML file containing a sequence of role records.
    RoleManifest(String),
    /// Keyed form: a glob matching the flat-mapping manifest files.
    PackageManifests(String),
}

/// Produce the pin table of the platform at `revision`.
///
/// Checks out `revision` in the platform mirror, reads the designated
/// manifest file(s), and normalizes them regardless of source shape.
pub fn extract_pins(mirror: &Mirror, revision: &str, source: &PinSource) -> Result<PinTable> {
    mirror.checkout(revision)?;
    match source {
        PinSource::RoleManifest(relative) => {
            let path = mirror.path().join(relative);
            info!("Reading role manifest {}", path.display());
            let text = fs::read_to_string(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::MissingConfigFile { path: path.clone() }
                } else {
                    Error::Io(e)
                }
            })?;
            parse_role_manifest(&text).map_err(|message| Error::ConfigParse { path, message })
        }
        PinSource::PackageManifests(pattern) => {
            let full_pattern = format!("{}/{}", mirror.path().display(), pattern);
            let merged = merge_keyed_manifests(&full_pattern)?;
            normalize_keyed(&merged).map_err(|message| Error::ConfigParse {
                path: PathBuf::from(&full_pattern),
                message,
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct RoleEntry {
    name: String,
    src: String,
    #[serde(default = "default_revision")]
    version: String,
}

fn default_revision() -> String {
    DEFAULT_REVISION.to_string()
}

fn parse_role_manifest(text: &str) -> std::result::Result<PinTable, String> {
    let entries: Vec<RoleEntry> = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    Ok(entries
        .into_iter()
        .map(|role| PinEntry {
            name: role.name,
            url: role.src,
            revision: role.version,
        })
        .collect())
}

/// Merge every file matching `pattern` into one mapping, later files'
/// keys overriding earlier files' identically-named keys.
///
/// An empty match yields an empty mapping: keyed manifests are optional at
/// old platform revisions that predate them.
fn merge_keyed_manifests(pattern: &str) -> Result<serde_yaml::Mapping> {
    let mut merged = serde_yaml::Mapping::new();
    let paths = glob(pattern).map_err(|e| Error::ConfigParse {
        path: PathBuf::from(pattern),
        message: e.to_string(),
    })?;
    for entry in paths {
        let path = entry.map_err(|e| Error::Io(e.into_error()))?;
        debug!("Merging package manifest {}", path.display());
        let text = fs::read_to_string(&path)?;
        let document: serde_yaml::Value =
            serde_yaml::from_str(&text).map_err(|e| Error::ConfigParse {
                path: path.clone(),
                message: e.to_string(),
            })?;
        match document {
            serde_yaml::Value::Mapping(mapping) => {
                for (key, value) in mapping {
                    merged.insert(key, value);
                }
            }
            serde_yaml::Value::Null => {}
            _ => {
                return Err(Error::ConfigParse {
                    path,
                    message: "expected a key/value mapping".to_string(),
                })
            }
        }
    }
    Ok(merged)
}

fn normalize_keyed(merged: &serde_yaml::Mapping) -> std::result::Result<PinTable, String> {
    let mut table = PinTable::new();
    for (key, value) in merged {
        let Some(name) = key.as_str().and_then(|k| k.strip_suffix(REPO_KEY_SUFFIX)) else {
            continue;
        };
        let url = value
            .as_str()
            .ok_or_else(|| format!("value of {name}{REPO_KEY_SUFFIX} is not a string"))?;
        let branch_key = serde_yaml::Value::String(format!("{name}{BRANCH_KEY_SUFFIX}"));
        let revision = merged
            .get(&branch_key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| format!("missing or invalid key {name}{BRANCH_KEY_SUFFIX}"))?;
        table.insert(PinEntry {
            name: name.to_string(),
            url: url.to_string(),
            revision: revision.to_string(),
        });
    }
    Ok(table)
}
