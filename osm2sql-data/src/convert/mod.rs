//! End-to-end conversion: archive in, relational output out.
//!
//! The driver opens the input before the output so a missing archive leaves
//! no empty database or files behind, and it releases the sink whether or not
//! the walk succeeded.
#![forbid(unsafe_code)]

use std::{
    error::Error as StdError,
    io::BufRead,
    time::{Duration, Instant},
};

use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use osm2sql_core::{RecordSink, Sanitiser};
use thiserror::Error;

use crate::{
    delimited::{DelimitedOptions, DelimitedSink, DelimitedSinkError},
    source::{DecompressionSource, SourceError},
    sqlite::{ConsistencyReport, SqliteSink, SqliteSinkError},
    walker::{WalkError, WalkSummary, Walker},
};

/// Errors that abort a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input archive could not be opened.
    #[error(transparent)]
    OpenInput(#[from] SourceError),
    /// The SQLite output could not be opened.
    #[error("failed to open SQLite output")]
    OpenSqlite {
        /// Error reported by the sink.
        #[source]
        source: SqliteSinkError,
    },
    /// The delimited output could not be created.
    #[error("failed to create delimited output")]
    OpenDelimited {
        /// Error reported by the sink.
        #[source]
        source: DelimitedSinkError,
    },
    /// Walking the archive failed.
    #[error("failed to convert {path}")]
    Walk {
        /// Input archive.
        path: Utf8PathBuf,
        /// Underlying walk error.
        #[source]
        source: WalkError,
    },
    /// Releasing the output failed after a successful walk.
    #[error("failed to finalise output")]
    Release {
        /// Error reported by the sink.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ConvertError {
    /// Whether the conversion stopped because it was interrupted.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(
            self,
            Self::Walk {
                source: WalkError::Interrupted { .. },
                ..
            }
        )
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    /// Counters from the walk.
    pub summary: WalkSummary,
    /// Release-time checks, for SQLite output.
    pub consistency: Option<ConsistencyReport>,
    /// Wall-clock duration of the conversion.
    pub elapsed: Duration,
}

impl ConversionReport {
    /// Log the outcome; dropped records are reported as a warning.
    pub fn log(&self, input: &Utf8Path) {
        info!(
            "converted {input} in {:.1}s: {}",
            self.elapsed.as_secs_f64(),
            self.summary
        );
        if self.summary.unknown_elements > 0 {
            info!(
                "skipped {} unknown elements and {} elements nested in them",
                self.summary.unknown_elements, self.summary.skipped_descendants
            );
        }
        if self.summary.dropped > 0 {
            warn!(
                "{} records were rejected by the output and are missing from it",
                self.summary.dropped
            );
        }
    }
}

/// Convert `input` into the SQLite database at `output`.
pub fn convert_to_sqlite<S: Sanitiser>(
    input: &Utf8Path,
    output: &Utf8Path,
    walker: &Walker<S>,
) -> Result<ConversionReport, ConvertError> {
    let started = Instant::now();
    let source = DecompressionSource::open(input)?;
    let mut sink =
        SqliteSink::open(output).map_err(|source| ConvertError::OpenSqlite { source })?;
    let summary = drive(input, source, walker, &mut sink)?;
    Ok(ConversionReport {
        summary,
        consistency: sink.consistency().cloned(),
        elapsed: started.elapsed(),
    })
}

/// Convert `input` into delimited files under `output_dir`.
pub fn convert_to_delimited<S: Sanitiser>(
    input: &Utf8Path,
    output_dir: &Utf8Path,
    options: DelimitedOptions,
    walker: &Walker<S>,
) -> Result<ConversionReport, ConvertError> {
    let started = Instant::now();
    let source = DecompressionSource::open(input)?;
    let mut sink = DelimitedSink::create(output_dir, options)
        .map_err(|source| ConvertError::OpenDelimited { source })?;
    let summary = drive(input, source, walker, &mut sink)?;
    Ok(ConversionReport {
        summary,
        consistency: None,
        elapsed: started.elapsed(),
    })
}

/// Convert `input` into any already-open sink.
///
/// The sink is released before this returns.
pub fn convert<S, K>(
    input: &Utf8Path,
    walker: &Walker<S>,
    sink: &mut K,
) -> Result<WalkSummary, ConvertError>
where
    S: Sanitiser,
    K: RecordSink,
{
    let source = DecompressionSource::open(input)?;
    drive(input, source, walker, sink)
}

fn drive<R, S, K>(
    input: &Utf8Path,
    source: R,
    walker: &Walker<S>,
    sink: &mut K,
) -> Result<WalkSummary, ConvertError>
where
    R: BufRead,
    S: Sanitiser,
    K: RecordSink,
{
    info!("reading {input}");
    let walked = walker.walk(source, sink);
    let released = sink.release();
    match (walked, released) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(source)) => Err(ConvertError::Release {
            source: Box::new(source),
        }),
        (Err(source), released) => {
            if let Err(err) = released {
                warn!("failed to finalise output after an aborted conversion: {err}");
            }
            Err(ConvertError::Walk {
                path: input.to_path_buf(),
                source,
            })
        }
    }
}
