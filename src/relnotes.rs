//! # Release-Note Extraction
//!
//! Runs the `reno` release-notes tool inside the platform mirror to collect
//! the notes published between two platform revisions.
//!
//! The revisions are mapped to their nearest tags with `git describe`, the
//! tag list between them is walked newest first, and `reno report` is run
//! once per tagged release plus once for notes added after the newest tag.
//! The concatenated output is then reshaped so its headings nest below the
//! report's own section levels.

use std::process::Command;

use log::{debug, warn};
use regex::{Captures, Regex};

use crate::error::{Error, Result};
use crate::mirror::Mirror;

/// External command that renders release notes from a checked-out tree.
pub const RENO_COMMAND: &str = "reno";

/// Collect release notes published between two platform revisions.
pub fn release_notes(mirror: &Mirror, old: &str, new: &str) -> Result<String> {
    let tags = tag_list(mirror)?;
    let old_tag = nearest_tag(mirror, old)?;
    let new_tag = nearest_tag(mirror, new)?;

    let start = tag_position(&tags, &old_tag)?;
    let end = tag_position(&tags, &new_tag)?;
    // The newest release is excluded here; it is rendered separately below
    // together with any notes committed after it.
    let window: &[String] = if start <= end { &tags[start..end] } else { &[] };

    let mut notes = String::new();
    mirror.checkout(new)?;
    notes.push_str(&reno_report(
        mirror,
        &["report", "--earliest-version", &new_tag],
    )?);

    for version in window.iter().rev() {
        mirror.checkout(version)?;
        let output = reno_report(
            mirror,
            &["report", "--branch", version, "--earliest-version", version],
        )?;
        // reno sometimes emits a neighboring release's notes instead of the
        // requested one; only keep output that names this version.
        if output.contains(version.as_str()) {
            notes.push_str(&output);
        } else {
            debug!("Discarding reno output that does not mention {version}");
        }
    }

    reformat_headings(&notes)
}

/// All tags of the mirror, sorted oldest to newest with pre-releases
/// grouped before the release they belong to.
fn tag_list(mirror: &Mirror) -> Result<Vec<String>> {
    let names = mirror.repo().tag_names(None)?;
    let mut tags: Vec<String> = names.iter().flatten().map(str::to_string).collect();
    tags.sort_by(|a, b| loose_version_cmp(a, b));
    Ok(group_prereleases(&tags))
}

fn tag_position(tags: &[String], tag: &str) -> Result<usize> {
    tags.iter()
        .position(|t| t == tag)
        .ok_or_else(|| Error::ReleaseNotes {
            message: format!("tag {tag} is not in the repository's tag list"),
        })
}

/// Nearest tag cut on or before `revision`, via `git describe`.
fn nearest_tag(mirror: &Mirror, revision: &str) -> Result<String> {
    mirror.checkout(revision)?;
    let mut options = git2::DescribeOptions::new();
    options.describe_tags();
    let described = mirror
        .repo()
        .describe(&options)
        .map_err(|e| Error::ReleaseNotes {
            message: format!("no tag describes revision {revision}: {e}"),
        })?;
    let name = described.format(None)?;
    // Between releases describe yields <tag>-<count>-g<sha>; only the tag
    // part is meaningful here.
    Ok(match name.find('-') {
        Some(index) => name[..index].to_string(),
        None => name,
    })
}

/// Run `reno` in the mirror's working tree and capture its stdout.
///
/// A nonzero exit still yields whatever reno printed; partial output for a
/// release is better than aborting the whole report over one tag.
fn reno_report(mirror: &Mirror, args: &[&str]) -> Result<String> {
    debug!("Running {} {:?} in {}", RENO_COMMAND, args, mirror.path().display());
    let output = Command::new(RENO_COMMAND)
        .args(args)
        .current_dir(mirror.path())
        .output()
        .map_err(|e| Error::ReleaseNotes {
            message: format!("could not run {RENO_COMMAND}: {e}"),
        })?;
    if !output.status.success() {
        warn!(
            "{} exited with {}: {}",
            RENO_COMMAND,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Demote reno's headings to fit under the report's section hierarchy and
/// drop its repeated document title.
fn reformat_headings(text: &str) -> Result<String> {
    let text = text.replace("=============\nRelease Notes\n=============", "");
    let equals = Regex::new("===+")?;
    let text = equals.replace_all(&text, |caps: &Captures| "~".repeat(caps[0].len()));
    let dashes = Regex::new("---+")?;
    let text = dashes.replace_all(&text, |caps: &Captures| "#".repeat(caps[0].len()));
    Ok(text.into_owned())
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Component {
    // Numbers order before text, so 1.0 sorts before 1.0rc1's text part.
    Number(u64),
    Text(String),
}

fn components(version: &str) -> Vec<Component> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut numeric = false;
    for ch in version.chars() {
        if ch == '.' {
            flush(&mut parts, &mut current, numeric);
            continue;
        }
        if !current.is_empty() && ch.is_ascii_digit() != numeric {
            flush(&mut parts, &mut current, numeric);
        }
        numeric = ch.is_ascii_digit();
        current.push(ch);
    }
    flush(&mut parts, &mut current, numeric);
    parts
}

fn flush(parts: &mut Vec<Component>, current: &mut String, numeric: bool) {
    if current.is_empty() {
        return;
    }
    if numeric {
        if let Ok(number) = current.parse() {
            parts.push(Component::Number(number));
        } else {
            parts.push(Component::Text(current.clone()));
        }
    } else {
        parts.push(Component::Text(current.clone()));
    }
    current.clear();
}

/// Version ordering that treats tags as dotted runs of numbers and text,
/// with a version sorting before any of its own pre-release suffixes.
fn loose_version_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    components(a).cmp(&components(b))
}

/// Reorder a sorted tag list so rc and beta tags come before the final
/// release they led up to.
fn group_prereleases(tags: &[String]) -> Vec<String> {
    let mut grouped: Vec<String> = Vec::new();
    for tag in tags {
        if !tag.contains("rc") && !tag.contains('b') {
            for candidate in tags {
                if candidate.contains(tag.as_str())
                    && (candidate.contains("rc") || candidate.contains('b'))
                    && !grouped.contains(candidate)
                {
                    grouped.push(candidate.clone());
                }
            }
        }
        if !grouped.contains(tag) {
            grouped.push(tag.clone());
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::ensure_mirror;
    use crate::testutil::FixtureRepo;
    use std::cmp::Ordering;
    use tempfile::TempDir;

    #[test]
    fn test_loose_version_ordering() {
        assert_eq!(loose_version_cmp("14.0.0", "14.0.1"), Ordering::Less);
        assert_eq!(loose_version_cmp("14.0.9", "14.0.10"), Ordering::Less);
        assert_eq!(loose_version_cmp("14.0.0", "14.0.0rc1"), Ordering::Less);
        assert_eq!(loose_version_cmp("14.0.0rc1", "14.0.0rc2"), Ordering::Less);
        assert_eq!(loose_version_cmp("14.0.0b1", "14.0.0rc1"), Ordering::Less);
        assert_eq!(loose_version_cmp("2.0.0", "14.0.0"), Ordering::Less);
    }

    #[test]
    fn test_group_prereleases_moves_candidates_before_final() {
        let sorted = vec![
            "14.0.0".to_string(),
            "14.0.0b1".to_string(),
            "14.0.0rc1".to_string(),
            "14.0.0rc2".to_string(),
            "14.0.1".to_string(),
        ];
        let grouped = group_prereleases(&sorted);
        assert_eq!(
            grouped,
            vec!["14.0.0b1", "14.0.0rc1", "14.0.0rc2", "14.0.0", "14.0.1"]
        );
    }

    #[test]
    fn test_group_prereleases_keeps_plain_list_intact() {
        let sorted = vec!["1.0.0".to_string(), "1.0.1".to_string()];
        assert_eq!(group_prereleases(&sorted), sorted);
    }

    #[test]
    fn test_reformat_headings() {
        let input = "=============\nRelease Notes\n=============\n\n14.0.1\n======\n\nBug Fixes\n---------\n";
        let output = reformat_headings(input).unwrap();
        assert!(!output.contains("Release Notes\n====="));
        assert!(output.contains("14.0.1\n~~~~~~\n"));
        assert!(output.contains("Bug Fixes\n#########\n"));
    }

    #[test]
    fn test_nearest_tag_truncates_describe_output() {
        let platform = FixtureRepo::new();
        platform.commit_file("a.txt", "1", "First commit");
        platform.tag("14.0.0");
        let later = platform.commit_file("a.txt", "2", "Second commit");

        let storage = TempDir::new().unwrap();
        let mirror =
            ensure_mirror(&storage.path().join("platform"), &platform.url(), false).unwrap();
        assert_eq!(nearest_tag(&mirror, &later).unwrap(), "14.0.0");
    }

    #[test]
    fn test_nearest_tag_without_tags_is_an_error() {
        let platform = FixtureRepo::new();
        let sha = platform.commit_file("a.txt", "1", "First commit");

        let storage = TempDir::new().unwrap();
        let mirror =
            ensure_mirror(&storage.path().join("platform"), &platform.url(), false).unwrap();
        let err = nearest_tag(&mirror, &sha).unwrap_err();
        assert!(matches!(err, Error::ReleaseNotes { .. }));
    }
}
