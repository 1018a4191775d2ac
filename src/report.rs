//! # Report Rendering
//!
//! Assembles the reStructuredText report. Every commit line links to the
//! commit on its hosting site, with well-known review-hosted URLs rewritten
//! to their GitHub mirrors so the links actually render a diff.

use url::Url;

use crate::revision::CommitRecord;

/// Everything needed to render one repository's commit section.
pub struct RepoChanges<'a> {
    pub name: &'a str,
    pub commits: &'a [CommitRecord],
    pub commit_base_url: &'a str,
    pub old_revision: &'a str,
    pub new_revision: &'a str,
}

/// Turn a clone URL into a base URL for per-commit links.
///
/// GitHub clone URLs drop their `.git` suffix. OpenStack review-hosted
/// repositories are rewritten to their GitHub mirror, which serves browsable
/// commit pages. Anything unrecognized passes through untouched.
pub fn commit_url(repo_url: &str) -> String {
    let Ok(parsed) = Url::parse(repo_url) else {
        return repo_url.to_string();
    };
    match parsed.host_str() {
        Some("github.com") => repo_url.trim_end_matches(".git").to_string(),
        Some("git.openstack.org") | Some("opendev.org") => {
            let Some(mut segments) = parsed
                .path_segments()
                .map(|s| s.filter(|p| !p.is_empty()).collect::<Vec<_>>())
            else {
                return repo_url.to_string();
            };
            let Some(name) = segments.pop() else {
                return repo_url.to_string();
            };
            let Some(org) = segments.pop() else {
                return repo_url.to_string();
            };
            format!("https://github.com/{}/{}", org, name.trim_end_matches(".git"))
        }
        _ => repo_url.to_string(),
    }
}

fn underline(title: &str, ch: char) -> String {
    ch.to_string().repeat(title.chars().count())
}

/// An RST section title with its underline.
pub fn section_title(title: &str, ch: char) -> String {
    format!("\n{}\n{}\n", title, underline(title, ch))
}

fn commit_list(commits: &[CommitRecord], base_url: &str) -> String {
    let mut text = String::new();
    for commit in commits {
        text.push_str(&format!(
            "*  `{} <{}/commit/{}>`_ {}\n",
            commit.short_sha(),
            base_url,
            commit.sha,
            commit.summary
        ));
    }
    text
}

/// The report's top section: the platform repository's own changes.
pub fn render_header(changes: &RepoChanges) -> String {
    let mut text = section_title(
        &format!("Changes in {} {} to {}", changes.name, changes.old_revision, changes.new_revision),
        '=',
    );
    text.push_str(&format!(
        "\n{} commits were found in `{} <{}>`_.\n\n",
        changes.commits.len(),
        changes.name,
        changes.commit_base_url
    ));
    text.push_str(&commit_list(changes.commits, changes.commit_base_url));
    text
}

/// One sub-project's section within the role or project changes.
pub fn render_repo_changes(changes: &RepoChanges) -> String {
    let mut text = section_title(changes.name, '~');
    text.push_str(&format!(
        "\n{} commits between {} and {}:\n\n",
        changes.commits.len(),
        changes.old_revision,
        changes.new_revision
    ));
    text.push_str(&commit_list(changes.commits, changes.commit_base_url));
    text
}
