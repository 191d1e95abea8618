//! Reading OpenStreetMap archives and writing them to relational outputs.
//!
//! Responsibilities:
//! - Decompress bzip2 archives on the fly ([`DecompressionSource`]).
//! - Walk the XML element stream in one pass ([`Walker`]).
//! - Persist records into SQLite ([`SqliteSink`]) or delimited text files
//!   ([`DelimitedSink`]).
//! - Drive a whole conversion ([`convert_to_sqlite`], [`convert_to_delimited`]).
//!
//! Boundaries:
//! - Record types and the sink contract live in `osm2sql-core`.
//! - Command-line parsing and logger setup live in `osm2sql-cli`.
//!
//! Invariants:
//! - Memory use is bounded by the largest top-level element, not the input.
//! - Sinks release their storage exactly once, including on error paths.

pub mod convert;
pub mod delimited;
pub mod source;
pub mod sqlite;
pub mod walker;

pub use convert::{
    ConversionReport, ConvertError, convert, convert_to_delimited, convert_to_sqlite,
};
pub use delimited::{
    DelimitedOptions, DelimitedSink, DelimitedSinkError, TextEncoding, UnknownEncoding,
};
pub use source::{DecompressionSource, SourceError};
pub use sqlite::{ConsistencyReport, SqliteSink, SqliteSinkError};
pub use walker::{AttributeError, EVENT_BUFFER_BYTES, WalkError, WalkSummary, Walker};

#[cfg(test)]
pub(crate) mod test_support;
