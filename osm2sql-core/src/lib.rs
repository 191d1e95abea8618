//! Core record types and contracts for converting OpenStreetMap exports.
//!
//! Responsibilities:
//! - Define the normalised records emitted while walking an element stream.
//! - Define the [`Sanitiser`] used to make tag and role strings
//!   delimiter-safe.
//! - Define the [`RecordSink`] contract implemented by every output backend.
//!
//! Boundaries:
//! - No I/O lives here; parsing and persistence belong to `osm2sql-data`.
//!
//! Invariants:
//! - Records are immutable once constructed and carry no references to the
//!   document they came from.
#![forbid(unsafe_code)]

pub mod record;
pub mod sanitise;
pub mod sink;

pub use record::{
    ElementId, MemberType, Node, OwnerKind, RecordKind, Relation, RelationMember, Tag,
    UnknownMemberType, Way, WayNodeRef,
};
pub use sanitise::{
    DEFAULT_ALTERNATE, DEFAULT_DELIMITER, DEFAULT_SUBSTITUTE, DefaultSanitiser, IdentitySanitiser,
    Sanitiser, SanitiserConfigError,
};
pub use sink::RecordSink;
