//! CLI argument parsing and run dispatch

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use pin_differ::error::Error;
use pin_differ::publish::PublishOptions;
use pin_differ::runner::{self, RunOptions};

const DEFAULT_PLATFORM_URL: &str = "https://opendev.org/openstack/openstack-ansible";

/// Find changes between two platform revisions, including the commits made
/// to every role and project the platform pins.
#[derive(Parser, Debug)]
#[command(name = "pin-differ")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Git SHA, tag, or branch of the older platform revision
    old_commit: String,

    /// Git SHA, tag, or branch of the newer platform revision
    new_commit: String,

    /// Enable info-level output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug-level output
    #[arg(long)]
    debug: bool,

    /// Directory that holds the cached repository mirrors
    #[arg(short, long, value_name = "PATH", default_value = "~/.pin-differ")]
    directory: String,

    /// Path of the role requirements file, relative to the platform repository
    #[arg(
        short,
        long,
        value_name = "PATH",
        default_value = "ansible-role-requirements.yml"
    )]
    role_requirements: String,

    /// Glob of the project manifest files, relative to the platform repository
    #[arg(
        long,
        value_name = "GLOB",
        default_value = "playbooks/defaults/repo_packages/*.yml"
    )]
    package_manifests: String,

    /// Fetch the latest upstream history into the cached mirrors
    #[arg(short, long)]
    update: bool,

    /// URL of the platform repository to compare
    #[arg(long, value_name = "URL", default_value = DEFAULT_PLATFORM_URL)]
    platform_repo_url: String,

    /// Skip the role change report
    #[arg(long, help_heading = "Limit scope")]
    skip_roles: bool,

    /// Skip the project change report
    #[arg(long, help_heading = "Limit scope")]
    skip_projects: bool,

    /// Include release notes published between the two revisions
    #[arg(long, help_heading = "Release notes")]
    release_notes: bool,

    /// Do not print the report to stdout
    #[arg(long, help_heading = "Output options")]
    quiet: bool,

    /// Post the report to an anonymous GitHub Gist
    #[arg(long, help_heading = "Output options")]
    gist: bool,

    /// Write the report to a file
    #[arg(long, value_name = "FILENAME", help_heading = "Output options")]
    file: Option<PathBuf>,
}

impl Cli {
    /// Execute the comparison run described by the parsed arguments.
    pub fn execute(self) -> Result<()> {
        let level = if self.debug {
            LevelFilter::Debug
        } else if self.verbose {
            LevelFilter::Info
        } else {
            LevelFilter::Error
        };
        env_logger::Builder::new().filter_level(level).init();

        let options = RunOptions {
            old_commit: self.old_commit,
            new_commit: self.new_commit,
            storage_dir: self.directory,
            platform_repo_url: self.platform_repo_url,
            role_requirements: self.role_requirements,
            package_manifests: self.package_manifests,
            refresh: self.update,
            skip_roles: self.skip_roles,
            skip_projects: self.skip_projects,
            release_notes: self.release_notes,
            publish: PublishOptions {
                quiet: self.quiet,
                gist: self.gist,
                file: self.file,
            },
        };

        match runner::run(&options) {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{output}");
                }
                Ok(())
            }
            Err(Error::StorageDir { path, message }) => {
                eprintln!(
                    "ERROR: Couldn't create the storage directory {path} ({message}). \
                     Please create it manually."
                );
                process::exit(2);
            }
            Err(err) => Err(err.into()),
        }
    }
}
