//! Error handling for tplview.
//! Defines the error type and result alias used throughout the preview pipeline.

use std::io;
use thiserror::Error;

/// Custom error types for preview operations.
///
/// Scan and registration failures are contained where they happen and only logged;
/// the variants that reach a user are the render and helper-load ones.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// None of the configured template directories exists in the workspace
    #[error("No template directory found (tried: {searched}). Configure 'templateDirectories' in {settings_file}.")]
    ConfigurationMissing { searched: String, settings_file: String },

    /// A render was requested for a name no scanned template carries
    #[error("Template '{name}' not found.")]
    TemplateNotFound { name: String },

    /// Compile or evaluation failure reported by the template engine
    #[error("{0}")]
    RenderError(String),

    /// The custom helpers file could not be loaded or has the wrong shape
    #[error("Failed to load custom helpers: {0}.")]
    HelperLoadError(String),

    /// Represents errors that occur while parsing the settings file
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// A request line from the preview surface could not be understood
    #[error("Protocol error: {0}.")]
    ProtocolError(String),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),
}

impl From<minijinja::Error> for Error {
    /// Keeps the whole cause chain, so nested include and helper failures still
    /// name what went wrong at the bottom.
    fn from(err: minijinja::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Error::RenderError(message)
    }
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(1);
}
