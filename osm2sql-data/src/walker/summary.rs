//! Counters collected during a walk.

use std::fmt;

use osm2sql_core::RecordKind;

/// Outcome of a completed walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    persisted: [u64; RecordKind::ALL.len()],
    /// Records the sink rejected.
    pub dropped: u64,
    /// Unrecognised elements skipped together with their subtrees.
    pub unknown_elements: u64,
    /// Elements nested inside unknown elements, never inspected.
    pub skipped_descendants: u64,
    /// Direct children of `<osm>` that were fully processed.
    pub subtrees: u64,
    /// Largest capacity reached by the event buffer.
    pub peak_buffer_bytes: usize,
}

impl WalkSummary {
    /// Records of `kind` accepted by the sink.
    #[must_use]
    pub const fn persisted(&self, kind: RecordKind) -> u64 {
        self.persisted[kind as usize]
    }

    /// Records accepted by the sink across every kind.
    #[must_use]
    pub fn total_persisted(&self) -> u64 {
        self.persisted.iter().sum()
    }

    pub(super) fn record_persisted(&mut self, kind: RecordKind) {
        self.persisted[kind as usize] += 1;
    }
}

impl fmt::Display for WalkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} ways, {} relations, {} tags, {} way nodes, {} relation members",
            self.persisted(RecordKind::Nodes),
            self.persisted(RecordKind::Ways),
            self.persisted(RecordKind::Relations),
            self.persisted(RecordKind::NodeTags)
                + self.persisted(RecordKind::WayTags)
                + self.persisted(RecordKind::RelationTags),
            self.persisted(RecordKind::WayNodes),
            self.persisted(RecordKind::RelationMembers),
        )?;
        if self.dropped > 0 {
            write!(f, ", {} dropped", self.dropped)?;
        }
        Ok(())
    }
}
