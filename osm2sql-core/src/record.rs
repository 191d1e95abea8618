//! Normalised records produced while walking an OpenStreetMap element stream.
//!
//! Every record is a plain value: it is built by the walker, handed to a
//! [`crate::RecordSink`], and then dropped. Identifiers are kept as signed
//! 64-bit integers because editor exports use negative ids for new objects
//! and SQLite stores `INTEGER` values as `i64`.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Opaque OpenStreetMap element identifier.
pub type ElementId = i64;

/// A point with a location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Node identifier, unique across nodes.
    pub id: ElementId,
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

/// An ordered list of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Way {
    /// Way identifier, unique across ways.
    pub id: ElementId,
}

/// A group of elements with roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    /// Relation identifier, unique across relations.
    pub id: ElementId,
}

/// A key/value pair attached to a node, way or relation.
///
/// The owner kind is not part of the record; it selects which of the three
/// tag collections receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Identifier of the element carrying the tag.
    pub owner: ElementId,
    /// Sanitised key.
    pub key: String,
    /// Sanitised value.
    pub value: String,
}

/// One `nd` reference inside a way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WayNodeRef {
    /// Owning way.
    pub way: ElementId,
    /// 1-based position of the reference within the way.
    pub position: u32,
    /// Referenced node identifier.
    pub reference: ElementId,
}

/// One `member` entry inside a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMember {
    /// Owning relation.
    pub relation: ElementId,
    /// 1-based position of the member within the relation.
    pub position: u32,
    /// Referenced element identifier.
    pub reference: ElementId,
    /// Sanitised member role; may be empty.
    pub role: String,
    /// Kind of the referenced element.
    pub member_type: MemberType,
}

/// Kind of element a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberType {
    /// The member is a node.
    Node,
    /// The member is a way.
    Way,
    /// The member is another relation.
    Relation,
}

impl MemberType {
    /// Name used in OpenStreetMap XML and in every output format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a member `type` attribute is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown member type {found:?} (expected node, way or relation)")]
pub struct UnknownMemberType {
    /// The rejected attribute value.
    pub found: String,
}

impl FromStr for MemberType {
    type Err = UnknownMemberType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "node" => Ok(Self::Node),
            "way" => Ok(Self::Way),
            "relation" => Ok(Self::Relation),
            other => Err(UnknownMemberType {
                found: other.to_owned(),
            }),
        }
    }
}

/// Kind of element that can own tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    /// Tags belong to a node.
    Node,
    /// Tags belong to a way.
    Way,
    /// Tags belong to a relation.
    Relation,
}

impl OwnerKind {
    /// Collection receiving tags owned by this kind of element.
    #[must_use]
    pub const fn tag_kind(self) -> RecordKind {
        match self {
            Self::Node => RecordKind::NodeTags,
            Self::Way => RecordKind::WayTags,
            Self::Relation => RecordKind::RelationTags,
        }
    }

    /// Element name as it appears in the XML stream.
    #[must_use]
    pub const fn element_name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

/// The eight record collections written by every sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    /// `osm_nodes(id, lon, lat)`
    Nodes,
    /// `osm_ways(id)`
    Ways,
    /// `osm_relations(id)`
    Relations,
    /// `osm_nodes_tags(node_id, k, v)`
    NodeTags,
    /// `osm_ways_tags(way_id, k, v)`
    WayTags,
    /// `osm_relations_tags(relation_id, k, v)`
    RelationTags,
    /// `osm_ways_nds(way_id, nr, ref)`
    WayNodes,
    /// `osm_relations_members(relation_id, nr, ref, role, type)`
    RelationMembers,
}

impl RecordKind {
    /// All kinds in output order.
    pub const ALL: [Self; 8] = [
        Self::Nodes,
        Self::Ways,
        Self::Relations,
        Self::NodeTags,
        Self::WayTags,
        Self::RelationTags,
        Self::WayNodes,
        Self::RelationMembers,
    ];

    /// Table name shared by the SQLite schema and the CSV file stems.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Nodes => "osm_nodes",
            Self::Ways => "osm_ways",
            Self::Relations => "osm_relations",
            Self::NodeTags => "osm_nodes_tags",
            Self::WayTags => "osm_ways_tags",
            Self::RelationTags => "osm_relations_tags",
            Self::WayNodes => "osm_ways_nds",
            Self::RelationMembers => "osm_relations_members",
        }
    }

    /// File name used by the delimited-file output.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Nodes => "osm_nodes.csv",
            Self::Ways => "osm_ways.csv",
            Self::Relations => "osm_relations.csv",
            Self::NodeTags => "osm_nodes_tags.csv",
            Self::WayTags => "osm_ways_tags.csv",
            Self::RelationTags => "osm_relations_tags.csv",
            Self::WayNodes => "osm_ways_nds.csv",
            Self::RelationMembers => "osm_relations_members.csv",
        }
    }

    /// Column names in storage order.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Nodes => &["id", "lon", "lat"],
            Self::Ways | Self::Relations => &["id"],
            Self::NodeTags => &["node_id", "k", "v"],
            Self::WayTags => &["way_id", "k", "v"],
            Self::RelationTags => &["relation_id", "k", "v"],
            Self::WayNodes => &["way_id", "nr", "ref"],
            Self::RelationMembers => &["relation_id", "nr", "ref", "role", "type"],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}
