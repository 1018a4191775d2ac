//! # Publishing
//!
//! Routes a finished report to its destinations: stdout (the default), a
//! local file, an anonymous GitHub Gist, or nowhere at all.

use std::fs;
use std::path::PathBuf;

use log::info;
use serde_json::json;

use crate::error::{Error, Result};

const GIST_API_URL: &str = "https://api.github.com/gists";

/// Where the report should go. With no sink selected the report itself is
/// returned for printing; every selected sink replaces it with a short
/// confirmation line.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub quiet: bool,
    pub gist: bool,
    pub file: Option<PathBuf>,
}

/// Deliver the report and return what should be printed to the user.
pub fn publish_report(
    report: &str,
    options: &PublishOptions,
    old_revision: &str,
    new_revision: &str,
) -> Result<String> {
    let mut output = String::new();

    if options.gist {
        let url = post_gist(report, old_revision, new_revision)?;
        output.push_str(&format!("\nReport posted to GitHub Gist: {url}"));
    }

    if let Some(path) = &options.file {
        fs::write(path, report)?;
        output.push_str(&format!("\nReport written to file: {}", path.display()));
    }

    if !options.quiet && !options.gist && options.file.is_none() {
        output.push_str(report);
    }

    Ok(output)
}

/// Post the report as a public anonymous gist, returning its browse URL.
fn post_gist(report: &str, old_revision: &str, new_revision: &str) -> Result<String> {
    let filename = format!("pin-diff-{old_revision}-{new_revision}.rst");
    let mut files = serde_json::Map::new();
    files.insert(filename, json!({ "content": report }));
    let payload = json!({
        "description": "Pinned revision changes",
        "public": true,
        "files": files,
    });

    info!("Posting report to {GIST_API_URL}");
    let response: serde_json::Value = ureq::post(GIST_API_URL)
        .send_json(payload)
        .map_err(|e| Error::Network {
            url: GIST_API_URL.to_string(),
            message: e.to_string(),
        })?
        .into_json()
        .map_err(|e| Error::Network {
            url: GIST_API_URL.to_string(),
            message: e.to_string(),
        })?;

    response["html_url"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Network {
            url: GIST_API_URL.to_string(),
            message: "gist response did not contain an html_url".to_string(),
        })
}
