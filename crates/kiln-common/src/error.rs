//! Common error types for Kiln.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`KilnError`].
pub type KilnResult<T> = Result<T, KilnError>;

/// Errors surfaced to the run level by Kiln.
///
/// Per-unit build and push failures are not represented here: they are
/// contained as failed outcomes and never abort a run.
#[derive(Error, Diagnostic, Debug)]
pub enum KilnError {
    /// Image configuration file is missing.
    #[error("Config not found: {path}")]
    #[diagnostic(
        code(kiln::config::not_found),
        help("Each <name>/<tag> directory needs a config.json next to its Dockerfile")
    )]
    ConfigNotFound {
        /// Path that was expected to hold the config.
        path: PathBuf,
    },

    /// Image configuration file exists but cannot be used.
    #[error("Malformed config {path}: {message}")]
    #[diagnostic(
        code(kiln::config::malformed),
        help("config.json must be a JSON object; end_of_life, if set, must be a YYYY-MM-DD date")
    )]
    ConfigMalformed {
        /// Path of the offending config.
        path: PathBuf,
        /// Parse or validation detail.
        message: String,
    },

    /// No successful build to record in the manifest.
    #[error("No successful builds to publish, refusing to write an empty manifest")]
    #[diagnostic(code(kiln::manifest::empty))]
    EmptyManifest,

    /// Failed to write the manifest or copy a config into the site tree.
    #[error("Failed to persist {path}")]
    #[diagnostic(code(kiln::manifest::persist))]
    Persist {
        /// Path being written when the failure occurred.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(kiln::io))]
    Io(#[from] std::io::Error),
}
