//! # pin-differ
//!
//! This library compares two revisions of a "platform" repository, one that
//! pins many sub-project repositories to exact commits, and assembles a
//! human-readable changelog covering every sub-project whose pin moved
//! between the two revisions. It backs the `pin-differ` command-line tool
//! but can be driven directly through [`runner::run`].
//!
//! ## Core Concepts
//!
//! - **Mirrors (`mirror`)**: every repository the tool reads is kept as a
//!   local clone under a storage directory. A mirror is created once, then
//!   reset and re-checked-out in place on every subsequent use; it is never
//!   deleted by this tool.
//! - **Revisions (`revision`)**: validation that user- or manifest-supplied
//!   revision identifiers exist, and resolution of the commit range between
//!   two of them, including the orientation flip applied when the two
//!   endpoints were supplied in reverse order.
//! - **Pin tables (`pins`)**: the normalized `name -> (url, revision)` table
//!   extracted from the platform repository's manifests at a historical
//!   revision. Two manifest shapes are understood: a list of role records
//!   and a flat keyed mapping split across several files.
//! - **Deltas (`delta`)**: per sub-project, the ordered commits separating
//!   the old pin from the new pin.
//! - **Reporting (`report`, `relnotes`, `publish`)**: RST rendering of the
//!   platform header and each delta, optional release-note extraction via
//!   the external `reno` tool, and routing of the finished report to
//!   stdout, a file, or a GitHub Gist.
//!
//! ## Execution Flow
//!
//! The top-level entry point is [`runner::run`], which executes these steps:
//!
//! 1.  Prepare the storage directory and the platform mirror.
//! 2.  Validate the two platform revisions and resolve their order,
//!     swapping them for the whole run when they were given reversed.
//! 3.  Render the platform header (and, on request, release notes).
//! 4.  Extract the role and project pin tables at both revisions.
//! 5.  Aggregate per-project deltas, driving one mirror per sub-project.
//! 6.  Publish the assembled report.
//!
//! Everything runs single-threaded and synchronous: each mirror has exactly
//! one working tree that is mutated in place, so operations on a mirror
//! must never interleave. Running two instances of the tool against
//! the same storage directory concurrently is undefined behavior.

pub mod delta;
pub mod error;
pub mod mirror;
pub mod pins;
pub mod publish;
pub mod relnotes;
pub mod report;
pub mod revision;
pub mod runner;

#[cfg(test)]
pub(crate) mod testutil;
