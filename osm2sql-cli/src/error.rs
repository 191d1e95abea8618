//! Error types emitted by the osm2sql CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use osm2sql_core::SanitiserConfigError;
use osm2sql_data::{ConvertError, UnknownEncoding};
use thiserror::Error;

/// Exit status for a conversion stopped by Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 1;
/// Exit status for every other failure.
pub const EXIT_FAILURE: i32 = 2;

/// Errors emitted by the osm2sql CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The requested text encoding is not supported.
    #[error(transparent)]
    InvalidEncoding(#[from] UnknownEncoding),
    /// The delimiter cannot be made safe by the sanitiser.
    #[error("invalid delimiter: {0}")]
    InvalidDelimiter(#[from] SanitiserConfigError),
    /// The global logger was already installed.
    #[error("failed to install logger: {0}")]
    Logging(#[from] log::SetLoggerError),
    /// The Ctrl-C handler could not be registered.
    #[error("failed to install interrupt handler: {0}")]
    InterruptHandler(#[from] ctrlc::Error),
    /// The conversion itself failed.
    #[error(transparent)]
    Convert(#[from] Box<ConvertError>),
}

impl From<ConvertError> for CliError {
    fn from(err: ConvertError) -> Self {
        Self::Convert(Box::new(err))
    }
}

impl CliError {
    /// Process exit status for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Convert(err) if err.is_interrupted() => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }
}
