//! Delimited text output for bulk loaders.
//!
//! One file per record kind, one line per record, fields joined by the
//! delimiter. Values are written as they arrive: the sink does no quoting or
//! escaping, so string fields are expected to be sanitised upstream.
#![forbid(unsafe_code)]

mod encoding;

use std::{
    fmt::Write as _,
    fs::File,
    io::{self, BufWriter, Write},
};

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, error, info};
use osm2sql_core::{
    DEFAULT_DELIMITER, Node, RecordKind, RecordSink, Relation, RelationMember, Tag, Way,
    WayNodeRef,
};
use thiserror::Error;

pub use encoding::{TextEncoding, UnknownEncoding};

/// Layout of the delimited files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedOptions {
    /// Field delimiter.
    pub delimiter: char,
    /// Byte encoding of every file.
    pub encoding: TextEncoding,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            encoding: TextEncoding::default(),
        }
    }
}

/// Errors raised by [`DelimitedSink`].
#[derive(Debug, Error)]
pub enum DelimitedSinkError {
    /// The output directory could not be created or opened.
    #[error("failed to open output directory {path:?}")]
    OpenDirectory {
        /// Output directory.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// One of the output files could not be created.
    #[error("failed to create {path:?}")]
    CreateFile {
        /// File that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing a record failed.
    #[error("failed to write a record to {file}")]
    Write {
        /// File being written.
        file: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A record arrived after the sink was released.
    #[error("cannot write to {file}: the delimited output is already released")]
    Released {
        /// File the record was meant for.
        file: &'static str,
    },
    /// Flushing a file on release failed.
    #[error("failed to flush {file}")]
    Flush {
        /// File that failed to flush.
        file: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Record sink writing one delimited file per record kind.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use osm2sql_core::{RecordSink, Way};
/// use osm2sql_data::{DelimitedOptions, DelimitedSink, TextEncoding};
///
/// let options = DelimitedOptions {
///     encoding: TextEncoding::Utf8,
///     ..DelimitedOptions::default()
/// };
/// let mut sink = DelimitedSink::create(Utf8Path::new("out/csv"), options)?;
/// sink.persist_way(&Way { id: 7 })?;
/// sink.release()?;
/// # Ok::<(), osm2sql_data::DelimitedSinkError>(())
/// ```
#[derive(Debug)]
pub struct DelimitedSink {
    dir: Utf8PathBuf,
    options: DelimitedOptions,
    /// Indexed by `RecordKind as usize`; `None` once released.
    writers: Option<Vec<BufWriter<File>>>,
    line: String,
    encoded: Vec<u8>,
}

impl DelimitedSink {
    /// Create the directory if needed and truncate or create all eight files.
    pub fn create(dir: &Utf8Path, options: DelimitedOptions) -> Result<Self, DelimitedSinkError> {
        let handle =
            osm2sql_fs::open_output_dir(dir).map_err(|source| DelimitedSinkError::OpenDirectory {
                path: dir.to_path_buf(),
                source,
            })?;
        let writers = RecordKind::ALL
            .iter()
            .map(|kind| {
                osm2sql_fs::create_file(&handle, kind.file_name())
                    .map(BufWriter::new)
                    .map_err(|source| DelimitedSinkError::CreateFile {
                        path: dir.join(kind.file_name()),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            "writing {} delimited output to {dir} (delimiter {:?})",
            options.encoding, options.delimiter
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            options,
            writers: Some(writers),
            line: String::new(),
            encoded: Vec::new(),
        })
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Layout in use.
    #[must_use]
    pub const fn options(&self) -> DelimitedOptions {
        self.options
    }

    /// Join `fields` into one line and append it to the file for `kind`.
    fn write_line(
        &mut self,
        kind: RecordKind,
        fields: &[&dyn std::fmt::Display],
    ) -> Result<(), DelimitedSinkError> {
        let file = kind.file_name();
        let writer = self
            .writers
            .as_mut()
            .and_then(|writers| writers.get_mut(kind as usize))
            .ok_or(DelimitedSinkError::Released { file })?;

        render_line(&mut self.line, self.options.delimiter, fields).map_err(|err| {
            DelimitedSinkError::Write {
                file,
                source: io::Error::other(err),
            }
        })?;
        self.encoded.clear();
        self.options.encoding.encode_into(&self.line, &mut self.encoded);
        writer
            .write_all(&self.encoded)
            .map_err(|source| DelimitedSinkError::Write { file, source })
    }
}

/// Replace `line` with `fields` joined by `delimiter` and a trailing newline.
fn render_line(
    line: &mut String,
    delimiter: char,
    fields: &[&dyn std::fmt::Display],
) -> std::fmt::Result {
    line.clear();
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            line.push(delimiter);
        }
        write!(line, "{field}")?;
    }
    line.push('\n');
    Ok(())
}

/// Coordinates keep a decimal point even when they are whole numbers.
struct Coordinate(f64);

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl RecordSink for DelimitedSink {
    type Error = DelimitedSinkError;

    fn persist_node(&mut self, node: &Node) -> Result<(), Self::Error> {
        self.write_line(
            RecordKind::Nodes,
            &[&node.id, &Coordinate(node.lon), &Coordinate(node.lat)],
        )
    }

    fn persist_way(&mut self, way: &Way) -> Result<(), Self::Error> {
        self.write_line(RecordKind::Ways, &[&way.id])
    }

    fn persist_relation(&mut self, relation: &Relation) -> Result<(), Self::Error> {
        self.write_line(RecordKind::Relations, &[&relation.id])
    }

    fn persist_node_tag(&mut self, tag: &Tag) -> Result<(), Self::Error> {
        self.write_line(RecordKind::NodeTags, &[&tag.owner, &tag.key, &tag.value])
    }

    fn persist_way_tag(&mut self, tag: &Tag) -> Result<(), Self::Error> {
        self.write_line(RecordKind::WayTags, &[&tag.owner, &tag.key, &tag.value])
    }

    fn persist_relation_tag(&mut self, tag: &Tag) -> Result<(), Self::Error> {
        self.write_line(RecordKind::RelationTags, &[&tag.owner, &tag.key, &tag.value])
    }

    fn persist_way_node(&mut self, node_ref: &WayNodeRef) -> Result<(), Self::Error> {
        self.write_line(
            RecordKind::WayNodes,
            &[&node_ref.way, &node_ref.position, &node_ref.reference],
        )
    }

    fn persist_relation_member(&mut self, member: &RelationMember) -> Result<(), Self::Error> {
        self.write_line(
            RecordKind::RelationMembers,
            &[
                &member.relation,
                &member.position,
                &member.reference,
                &member.role,
                &member.member_type,
            ],
        )
    }

    /// Flush all eight files; every file is flushed even when an earlier one
    /// fails, and the first failure is returned.
    fn release(&mut self) -> Result<(), Self::Error> {
        let Some(writers) = self.writers.take() else {
            return Ok(());
        };
        let mut first_error = None;
        for (kind, mut writer) in RecordKind::ALL.into_iter().zip(writers) {
            if let Err(source) = writer.flush() {
                let file = kind.file_name();
                error!("failed to flush {}: {source}", self.dir.join(file));
                first_error.get_or_insert(DelimitedSinkError::Flush { file, source });
            }
        }
        debug!("closed delimited output in {}", self.dir);
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for DelimitedSink {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            error!("failed to release delimited output {}: {err}", self.dir);
        }
    }
}

#[cfg(test)]
mod tests;
