//! Command-line interface implementation for tplview.
//! Provides argument parsing and help text formatting using clap.

use crate::constants::DEFAULT_POLL_INTERVAL_MS;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure for tplview.
#[derive(Parser, Debug)]
#[command(author, version, about = "tplview: live preview for template workspaces", long_about = None)]
pub struct Args {
    /// Workspace root that settings and template directories are resolved against
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub workspace: PathBuf,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List the templates found in the configured directories
    List,

    /// Render a template once and print the result
    Render {
        /// Template name, relative to its directory and without extension
        #[arg(value_name = "NAME")]
        name: String,

        /// JSON file with the template data, or '-' to read it from stdin
        #[arg(short, long, value_name = "FILE")]
        data: Option<String>,
    },

    /// Open a preview session speaking JSON lines on stdin/stdout.
    /// Template and partial directories are watched until stdin is closed.
    Serve {
        /// Directory polling interval in milliseconds
        #[arg(long, value_name = "MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
        poll_interval: u64,
    },

    /// Load the custom helpers file and report what was registered
    ReloadHelpers,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if matches!(
                e.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::MissingSubcommand
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
