//! The element that subsequent child records attach to.

use std::fmt;

use osm2sql_core::{ElementId, MemberType, OwnerKind, RelationMember, WayNodeRef};

/// Most recently opened node, way or relation.
///
/// The owner survives the closing tag of its element and is replaced only
/// when the next top-level element opens. Way and relation owners carry the
/// position of the last child they handed out, so positions restart at 1 for
/// every new owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Owner {
    /// No owning element has been seen yet.
    #[default]
    None,
    /// A node owns the following tags.
    Node { id: ElementId },
    /// A way owns the following tags and node references.
    Way { id: ElementId, last: u32 },
    /// A relation owns the following tags and members.
    Relation { id: ElementId, last: u32 },
}

/// Why a child element could not be attached to the current owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    /// The current owner is of the wrong kind, or there is none.
    WrongOwner,
    /// The owner already holds `u32::MAX` children.
    PositionOverflow { owner: ElementId },
}

impl Owner {
    /// Kind and identifier of the owner, if any.
    pub const fn current(&self) -> Option<(OwnerKind, ElementId)> {
        match *self {
            Self::None => None,
            Self::Node { id } => Some((OwnerKind::Node, id)),
            Self::Way { id, .. } => Some((OwnerKind::Way, id)),
            Self::Relation { id, .. } => Some((OwnerKind::Relation, id)),
        }
    }

    /// Attach the next `nd` reference to the current way.
    pub fn next_way_node(&mut self, reference: ElementId) -> Result<WayNodeRef, AttachError> {
        let Self::Way { id, last } = self else {
            return Err(AttachError::WrongOwner);
        };
        let position = advance(last, *id)?;
        Ok(WayNodeRef {
            way: *id,
            position,
            reference,
        })
    }

    /// Attach the next `member` to the current relation.
    pub fn next_member(
        &mut self,
        reference: ElementId,
        role: String,
        member_type: MemberType,
    ) -> Result<RelationMember, AttachError> {
        let Self::Relation { id, last } = self else {
            return Err(AttachError::WrongOwner);
        };
        let position = advance(last, *id)?;
        Ok(RelationMember {
            relation: *id,
            position,
            reference,
            role,
            member_type,
        })
    }
}

fn advance(last: &mut u32, owner: ElementId) -> Result<u32, AttachError> {
    *last = last
        .checked_add(1)
        .ok_or(AttachError::PositionOverflow { owner })?;
    Ok(*last)
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.current() {
            Some((kind, id)) => write!(f, "{} {id}", kind.element_name()),
            None => f.write_str("no element"),
        }
    }
}
