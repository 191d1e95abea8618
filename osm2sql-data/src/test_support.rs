//! Helpers shared by unit tests across the crate.

use std::io::Write;

use bzip2::{Compression, write::BzEncoder};
use osm2sql_core::{
    Node, RecordKind, RecordSink, Relation, RelationMember, Tag, Way, WayNodeRef,
};
use thiserror::Error;

/// Compress `raw` into a single bzip2 stream.
pub fn compress(raw: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).expect("compress in memory");
    encoder.finish().expect("finish bzip2 stream")
}

/// A record captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Node(Node),
    Way(Way),
    Relation(Relation),
    NodeTag(Tag),
    WayTag(Tag),
    RelationTag(Tag),
    WayNode(WayNodeRef),
    Member(RelationMember),
}

#[derive(Debug, Error)]
#[error("rejected {kind} record")]
pub struct Rejected {
    pub kind: RecordKind,
}

/// In-memory sink that keeps every record and can reject chosen kinds.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub records: Vec<Recorded>,
    pub reject: Vec<RecordKind>,
    pub releases: usize,
}

impl RecordingSink {
    pub fn rejecting(kind: RecordKind) -> Self {
        Self {
            reject: vec![kind],
            ..Self::default()
        }
    }

    fn accept(&mut self, kind: RecordKind, record: Recorded) -> Result<(), Rejected> {
        if self.reject.contains(&kind) {
            return Err(Rejected { kind });
        }
        self.records.push(record);
        Ok(())
    }
}

impl RecordSink for RecordingSink {
    type Error = Rejected;

    fn persist_node(&mut self, node: &Node) -> Result<(), Self::Error> {
        self.accept(RecordKind::Nodes, Recorded::Node(*node))
    }

    fn persist_way(&mut self, way: &Way) -> Result<(), Self::Error> {
        self.accept(RecordKind::Ways, Recorded::Way(*way))
    }

    fn persist_relation(&mut self, relation: &Relation) -> Result<(), Self::Error> {
        self.accept(RecordKind::Relations, Recorded::Relation(*relation))
    }

    fn persist_node_tag(&mut self, tag: &Tag) -> Result<(), Self::Error> {
        self.accept(RecordKind::NodeTags, Recorded::NodeTag(tag.clone()))
    }

    fn persist_way_tag(&mut self, tag: &Tag) -> Result<(), Self::Error> {
        self.accept(RecordKind::WayTags, Recorded::WayTag(tag.clone()))
    }

    fn persist_relation_tag(&mut self, tag: &Tag) -> Result<(), Self::Error> {
        self.accept(RecordKind::RelationTags, Recorded::RelationTag(tag.clone()))
    }

    fn persist_way_node(&mut self, node_ref: &WayNodeRef) -> Result<(), Self::Error> {
        self.accept(RecordKind::WayNodes, Recorded::WayNode(*node_ref))
    }

    fn persist_relation_member(&mut self, member: &RelationMember) -> Result<(), Self::Error> {
        self.accept(RecordKind::RelationMembers, Recorded::Member(member.clone()))
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.releases += 1;
        Ok(())
    }
}

/// Wrap element markup in an `<osm>` root.
pub fn document(body: &str) -> String {
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<osm version=\"0.6\">\n{body}\n</osm>\n")
}
