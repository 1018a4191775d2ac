//! # Error Handling
//!
//! Centralized error handling for `pin-differ`, built on `thiserror`. Every
//! failure mode the tool can hit (mirror management, revision lookups,
//! manifest parsing, release-note extraction, publishing) is a variant of
//! the single [`Error`] enum, carrying enough context (URL, path, revision)
//! for the user to act on the message.
//!
//! All library-layer failures propagate to the top-level run function. The
//! CLI shell treats exactly one variant specially: [`Error::StorageDir`] is
//! turned into an actionable message and a distinct exit status instead of a
//! diagnostic dump.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pin-differ operations
#[derive(Error, Debug)]
pub enum Error {
    /// Cloning, fetching, or resetting a repository mirror failed at the
    /// filesystem or network layer. The mirror must not be used afterwards.
    #[error("Mirror unavailable for {url} at {path}: {message}")]
    MirrorUnavailable {
        url: String,
        path: PathBuf,
        message: String,
    },

    /// A named revision does not exist in a mirror.
    #[error(
        "Revision {revision} could not be found in {mirror}. \
         You may need to pass --update to fetch the latest history into \
         the mirrors stored on this computer."
    )]
    InvalidRevision { revision: String, mirror: PathBuf },

    /// Neither orientation of a revision pair yields any commits.
    #[error(
        "The commit range {old}..{new} is invalid for {mirror}. \
         You may need to pass --update to fetch the latest history into \
         the mirrors stored on this computer."
    )]
    InvalidRange {
        old: String,
        new: String,
        mirror: PathBuf,
    },

    /// A pin manifest exists but could not be parsed into a pin table.
    #[error("Manifest parsing error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// A pin manifest is missing at the requested platform revision.
    #[error("Manifest file not found: {path}")]
    MissingConfigFile { path: PathBuf },

    /// The mirror storage directory could not be created.
    #[error("Could not create the storage directory {path}: {message}")]
    StorageDir { path: String, message: String },

    /// The release-note extractor subprocess failed or produced
    /// unusable output.
    #[error("Release notes extraction failed: {message}")]
    ReleaseNotes { message: String },

    /// An error occurred during a network operation.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A regex compilation error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A git plumbing error, wrapped from `git2::Error`.
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
