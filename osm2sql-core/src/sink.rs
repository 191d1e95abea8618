//! Persistence contract shared by every output backend.
//!
//! A sink acquires its storage when it is constructed and must release it
//! exactly once. Implementations call [`RecordSink::release`] from their
//! `Drop` implementation when it has not run yet, so the release steps (final
//! flushes, consistency checks, commits) also happen when a conversion aborts
//! with an error.

use crate::record::{Node, Relation, RelationMember, Tag, Way, WayNodeRef};

/// Receives normalised records and persists them.
///
/// A failed persist call affects only the record passed in; callers may keep
/// feeding records after an error.
pub trait RecordSink {
    /// Error reported by a single persist call or by the release step.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store a node.
    fn persist_node(&mut self, node: &Node) -> Result<(), Self::Error>;
    /// Store a way.
    fn persist_way(&mut self, way: &Way) -> Result<(), Self::Error>;
    /// Store a relation.
    fn persist_relation(&mut self, relation: &Relation) -> Result<(), Self::Error>;
    /// Store a tag owned by a node.
    fn persist_node_tag(&mut self, tag: &Tag) -> Result<(), Self::Error>;
    /// Store a tag owned by a way.
    fn persist_way_tag(&mut self, tag: &Tag) -> Result<(), Self::Error>;
    /// Store a tag owned by a relation.
    fn persist_relation_tag(&mut self, tag: &Tag) -> Result<(), Self::Error>;
    /// Store one positional node reference of a way.
    fn persist_way_node(&mut self, node_ref: &WayNodeRef) -> Result<(), Self::Error>;
    /// Store one positional member of a relation.
    fn persist_relation_member(&mut self, member: &RelationMember) -> Result<(), Self::Error>;

    /// Flush and close the underlying storage.
    ///
    /// Must be idempotent: only the first call performs work.
    fn release(&mut self) -> Result<(), Self::Error>;
}
