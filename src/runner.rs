//! # Run Orchestration
//!
//! Drives one full comparison: prepare storage, mirror the platform
//! repository, resolve the requested revisions, render the platform's own
//! changes, then the role and project deltas, and hand the report to the
//! publisher.

use log::{info, warn};

use crate::delta::{aggregate, DeltaRecord};
use crate::error::Result;
use crate::mirror::{ensure_mirror, prepare_storage_dir, repo_name_from_url};
use crate::pins::{extract_pins, PinSource};
use crate::publish::{publish_report, PublishOptions};
use crate::relnotes::release_notes;
use crate::report::{commit_url, render_header, render_repo_changes, section_title, RepoChanges};
use crate::revision::{commits_between, resolve_range, validate_revisions, RangeOrder};

/// Everything one comparison run needs, assembled by the CLI layer.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub old_commit: String,
    pub new_commit: String,
    pub storage_dir: String,
    pub platform_repo_url: String,
    pub role_requirements: String,
    pub package_manifests: String,
    pub refresh: bool,
    pub skip_roles: bool,
    pub skip_projects: bool,
    pub release_notes: bool,
    pub publish: PublishOptions,
}

/// Execute a comparison run and return what should be printed.
pub fn run(options: &RunOptions) -> Result<String> {
    let storage_root = prepare_storage_dir(&options.storage_dir)?;

    let platform_name = repo_name_from_url(&options.platform_repo_url);
    let platform = ensure_mirror(
        &storage_root.join(&platform_name),
        &options.platform_repo_url,
        options.refresh,
    )?;
    validate_revisions(
        &platform,
        &[&options.old_commit, &options.new_commit],
    )?;

    // A reversed revision pair flips the whole comparison, so that the pin
    // tables are diffed in the direction history actually moved.
    let (old_commit, new_commit) =
        match resolve_range(&platform, &options.old_commit, &options.new_commit, true)? {
            RangeOrder::Ordered => (options.old_commit.clone(), options.new_commit.clone()),
            RangeOrder::Flipped => {
                warn!("The given revisions appear reversed, swapping them for the whole run");
                (options.new_commit.clone(), options.old_commit.clone())
            }
        };

    info!("Comparing {platform_name} {old_commit} to {new_commit}");
    let platform_base_url = commit_url(&options.platform_repo_url);
    let platform_commits = commits_between(&platform, &old_commit, &new_commit, true)?;
    let mut report = render_header(&RepoChanges {
        name: &platform_name,
        commits: &platform_commits,
        commit_base_url: &platform_base_url,
        old_revision: &old_commit,
        new_revision: &new_commit,
    });

    if options.release_notes {
        report.push_str(&section_title("Release notes", '-'));
        report.push_str(&release_notes(&platform, &old_commit, &new_commit)?);
    }

    if !options.skip_roles {
        let source = PinSource::RoleManifest(options.role_requirements.clone());
        let old_pins = extract_pins(&platform, &old_commit, &source)?;
        let new_pins = extract_pins(&platform, &new_commit, &source)?;
        let deltas = aggregate(&storage_root, &old_pins, &new_pins, options.refresh)?;
        report.push_str(&section_title("Role changes", '-'));
        report.push_str(&render_deltas(&deltas));
    }

    if !options.skip_projects {
        let source = PinSource::PackageManifests(options.package_manifests.clone());
        let old_pins = extract_pins(&platform, &old_commit, &source)?;
        let new_pins = extract_pins(&platform, &new_commit, &source)?;
        let deltas = aggregate(&storage_root, &old_pins, &new_pins, options.refresh)?;
        report.push_str(&section_title("Project changes", '-'));
        report.push_str(&render_deltas(&deltas));
    }

    publish_report(&report, &options.publish, &old_commit, &new_commit)
}

fn render_deltas(deltas: &[DeltaRecord]) -> String {
    let mut text = String::new();
    for delta in deltas {
        let base_url = commit_url(&delta.url);
        text.push_str(&render_repo_changes(&RepoChanges {
            name: &delta.name,
            commits: &delta.commits,
            commit_base_url: &base_url,
            old_revision: &delta.old_revision,
            new_revision: &delta.new_revision,
        }));
    }
    text
}
