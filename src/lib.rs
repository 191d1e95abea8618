//! Facade crate for the osm2sql converter.
//!
//! This crate re-exports the record types and sink contract from
//! `osm2sql-core` together with the streaming walker and the SQLite and
//! delimited-file backends from `osm2sql-data`.
//!
//! ```no_run
//! use camino::Utf8Path;
//! use osm2sql::{DefaultSanitiser, Walker, convert_to_sqlite};
//!
//! let walker = Walker::new(DefaultSanitiser::default());
//! let report = convert_to_sqlite(
//!     Utf8Path::new("extract.osm.bz2"),
//!     Utf8Path::new("extract.db"),
//!     &walker,
//! )?;
//! println!("{}", report.summary);
//! # Ok::<(), osm2sql::ConvertError>(())
//! ```

#![forbid(unsafe_code)]

pub use osm2sql_core::{
    DefaultSanitiser, ElementId, IdentitySanitiser, MemberType, Node, OwnerKind, RecordKind,
    RecordSink, Relation, RelationMember, Sanitiser, SanitiserConfigError, Tag, Way, WayNodeRef,
};

pub use osm2sql_data::{
    ConsistencyReport, ConversionReport, ConvertError, DelimitedOptions, DelimitedSink,
    SqliteSink, TextEncoding, WalkError, WalkSummary, Walker, convert, convert_to_delimited,
    convert_to_sqlite,
};
