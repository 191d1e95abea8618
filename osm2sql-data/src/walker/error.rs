//! Fatal errors raised while walking an element stream.

use std::{io, sync::Arc};

use osm2sql_core::{ElementId, OwnerKind};
use thiserror::Error;

use super::attrs::AttributeError;

/// Errors that abort a walk.
///
/// Byte positions count decompressed bytes consumed by the XML reader.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The stream ended before an `<osm>` element opened.
    #[error("no <osm> root element found")]
    MissingRoot,
    /// The stream ended while the `<osm>` element was still open.
    #[error("stream ended at byte {position} before </osm>")]
    UnclosedRoot { position: usize },
    /// A `tag` appeared before any node, way or relation.
    #[error("<{element}> at byte {position} has no owning node, way or relation")]
    NoOwner {
        element: &'static str,
        position: usize,
    },
    /// An `nd` outside a way or a `member` outside a relation.
    #[error("<{element}> at byte {position} must follow a {expected:?} but follows {found}")]
    MisplacedElement {
        element: &'static str,
        expected: OwnerKind,
        found: String,
        position: usize,
    },
    /// A required attribute is missing or cannot be parsed.
    #[error("<{element}> at byte {position}: invalid `{attribute}` attribute")]
    Attribute {
        element: &'static str,
        attribute: &'static str,
        position: usize,
        #[source]
        source: AttributeError,
    },
    /// A way or relation has more children than positions can count.
    #[error("<{element}> at byte {position}: too many children under element {owner}")]
    PositionOverflow {
        element: &'static str,
        owner: ElementId,
        position: usize,
    },
    /// The XML itself is malformed.
    #[error("malformed XML near byte {position}")]
    Syntax {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
    /// Reading the decompressed stream failed.
    #[error("failed to decompress input near byte {position}")]
    Decompress {
        position: usize,
        #[source]
        source: Arc<io::Error>,
    },
    /// More records were rejected by the sink than allowed.
    #[error("more than {limit} records were rejected by the output")]
    DropLimitExceeded { limit: u64 },
    /// The walk was cancelled through its interrupt flag.
    #[error("interrupted at byte {position}")]
    Interrupted { position: usize },
}

impl WalkError {
    /// Classify a reader failure: I/O errors come from the decoder, the rest
    /// from the XML layer.
    pub(super) fn from_reader(source: quick_xml::Error, position: usize) -> Self {
        match source {
            quick_xml::Error::Io(source) => Self::Decompress { position, source },
            source => Self::Syntax { position, source },
        }
    }

    /// Whether the error describes the document rather than its transport.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingRoot
                | Self::UnclosedRoot { .. }
                | Self::NoOwner { .. }
                | Self::MisplacedElement { .. }
                | Self::Attribute { .. }
                | Self::PositionOverflow { .. }
                | Self::Syntax { .. }
        )
    }
}
