//! Single-pass walk over an OpenStreetMap XML stream.
//!
//! The walker reads pull events from `quick-xml`, reuses one event buffer
//! and forgets every direct child of `<osm>` once it closes, so memory use
//! depends on the largest element rather than on the size of the document.
//! Records are handed to a [`RecordSink`] the moment their element opens.

mod attrs;
mod error;
mod owner;
mod summary;

use std::{
    error::Error as StdError,
    io::BufRead,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use log::{debug, warn};
use osm2sql_core::{Node, OwnerKind, RecordKind, RecordSink, Relation, Sanitiser, Tag, Way};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

pub use attrs::AttributeError;
pub use error::WalkError;
pub use summary::WalkSummary;

use owner::{AttachError, Owner};

/// Initial capacity of the event buffer; the buffer shrinks back to it after
/// every top-level subtree.
pub const EVENT_BUFFER_BYTES: usize = 4 * 1024;

const ROOT: &[u8] = b"osm";

/// Streams elements from a decompressed source into a sink.
///
/// # Examples
/// ```
/// use osm2sql_core::DefaultSanitiser;
/// use osm2sql_data::Walker;
///
/// let walker = Walker::new(DefaultSanitiser::default()).with_drop_limit(10);
/// assert_eq!(walker.drop_limit(), Some(10));
/// ```
#[derive(Debug, Clone)]
pub struct Walker<S> {
    sanitiser: S,
    drop_limit: Option<u64>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<S: Sanitiser> Walker<S> {
    /// Walker applying `sanitiser` to tag keys, tag values and member roles.
    pub const fn new(sanitiser: S) -> Self {
        Self {
            sanitiser,
            drop_limit: None,
            interrupt: None,
        }
    }

    /// Fail once more than `limit` records have been rejected by the sink.
    #[must_use]
    pub fn with_drop_limit(mut self, limit: u64) -> Self {
        self.drop_limit = Some(limit);
        self
    }

    /// Stop with [`WalkError::Interrupted`] once `flag` becomes `true`.
    #[must_use]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Configured drop limit, if any.
    #[must_use]
    pub const fn drop_limit(&self) -> Option<u64> {
        self.drop_limit
    }

    /// Walk `source` to the end of its `<osm>` element.
    ///
    /// Anything before the root element is ignored, as is anything after it
    /// closes. Sink errors are logged and counted; every other failure is
    /// returned.
    pub fn walk<R, K>(&self, source: R, sink: &mut K) -> Result<WalkSummary, WalkError>
    where
        R: BufRead,
        K: RecordSink,
    {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);
        let mut buf = Vec::with_capacity(EVENT_BUFFER_BYTES);
        let mut pass = Pass {
            sanitiser: &self.sanitiser,
            drop_limit: self.drop_limit,
            sink,
            owner: Owner::None,
            summary: WalkSummary::default(),
        };

        if !self.seek_root(&mut reader, &mut buf)? {
            debug!("<osm> root is empty");
            return Ok(pass.finish(buf.capacity()));
        }

        // Depth below the root; 0 means "between top-level elements".
        let mut depth = 0_usize;
        // Depth of the unknown element whose subtree is being skipped.
        let mut skipping: Option<usize> = None;
        // Elements nested in the subtree being skipped.
        let mut skipped = 0_u64;
        loop {
            self.check_interrupt(reader.buffer_position())?;
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(source) => {
                    return Err(WalkError::from_reader(source, reader.buffer_position()));
                }
            };
            let position = reader.buffer_position();
            let mut subtree_closed = false;
            match event {
                Event::Start(element) => {
                    if skipping.is_some() {
                        skipped += 1;
                    } else if pass.open(&element, position)? == Opened::Unknown {
                        skipping = Some(depth);
                    }
                    depth += 1;
                }
                Event::Empty(element) => {
                    if skipping.is_some() {
                        skipped += 1;
                    } else {
                        pass.open(&element, position)?;
                        subtree_closed = depth == 0;
                    }
                }
                Event::End(end) => {
                    let Some(parent) = depth.checked_sub(1) else {
                        break;
                    };
                    depth = parent;
                    if skipping == Some(depth) {
                        skipping = None;
                        debug!(
                            "skipped {skipped} elements nested in <{}> ending at byte {position}",
                            String::from_utf8_lossy(end.name().as_ref())
                        );
                        pass.summary.skipped_descendants += skipped;
                        skipped = 0;
                    }
                    subtree_closed = depth == 0;
                }
                Event::Eof => return Err(WalkError::UnclosedRoot { position }),
                _ => {}
            }
            pass.observe_buffer(buf.capacity());
            buf.clear();
            if subtree_closed {
                pass.summary.subtrees += 1;
                if buf.capacity() > EVENT_BUFFER_BYTES {
                    buf.shrink_to(EVENT_BUFFER_BYTES);
                }
            }
        }
        Ok(pass.finish(buf.capacity()))
    }

    /// Advance to the `<osm>` element. Returns `false` for `<osm/>`.
    fn seek_root<R: BufRead>(
        &self,
        reader: &mut Reader<R>,
        buf: &mut Vec<u8>,
    ) -> Result<bool, WalkError> {
        loop {
            self.check_interrupt(reader.buffer_position())?;
            let event = match reader.read_event_into(buf) {
                Ok(event) => event,
                Err(source) => {
                    return Err(WalkError::from_reader(source, reader.buffer_position()));
                }
            };
            let open = match event {
                Event::Start(element) if element.name().as_ref() == ROOT => Some(true),
                Event::Empty(element) if element.name().as_ref() == ROOT => Some(false),
                Event::Eof => return Err(WalkError::MissingRoot),
                _ => None,
            };
            buf.clear();
            if let Some(open) = open {
                return Ok(open);
            }
        }
    }

    fn check_interrupt(&self, position: usize) -> Result<(), WalkError> {
        match &self.interrupt {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(WalkError::Interrupted { position }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opened {
    Recognised,
    Unknown,
}

/// State of one walk: the sink, the current owner and the counters.
struct Pass<'w, S, K> {
    sanitiser: &'w S,
    drop_limit: Option<u64>,
    sink: &'w mut K,
    owner: Owner,
    summary: WalkSummary,
}

impl<S: Sanitiser, K: RecordSink> Pass<'_, S, K> {
    fn open(&mut self, element: &BytesStart<'_>, position: usize) -> Result<Opened, WalkError> {
        match element.name().as_ref() {
            b"node" => self.open_node(element, position)?,
            b"way" => self.open_way(element, position)?,
            b"relation" => self.open_relation(element, position)?,
            b"tag" => self.open_tag(element, position)?,
            b"nd" => self.open_nd(element, position)?,
            b"member" => self.open_member(element, position)?,
            b"bounds" => {}
            other => {
                warn!(
                    "skipping unknown element <{}> at byte {position}",
                    String::from_utf8_lossy(other)
                );
                self.summary.unknown_elements += 1;
                return Ok(Opened::Unknown);
            }
        }
        Ok(Opened::Recognised)
    }

    fn open_node(&mut self, element: &BytesStart<'_>, position: usize) -> Result<(), WalkError> {
        const NAME: &str = "node";
        let id = attrs::identifier(element, "id").map_err(invalid(NAME, "id", position))?;
        let lon = attrs::number(element, "lon").map_err(invalid(NAME, "lon", position))?;
        let lat = attrs::number(element, "lat").map_err(invalid(NAME, "lat", position))?;
        self.owner = Owner::Node { id };
        let outcome = self.sink.persist_node(&Node { id, lon, lat });
        self.absorb(RecordKind::Nodes, outcome)
    }

    fn open_way(&mut self, element: &BytesStart<'_>, position: usize) -> Result<(), WalkError> {
        let id = attrs::identifier(element, "id").map_err(invalid("way", "id", position))?;
        self.owner = Owner::Way { id, last: 0 };
        let outcome = self.sink.persist_way(&Way { id });
        self.absorb(RecordKind::Ways, outcome)
    }

    fn open_relation(
        &mut self,
        element: &BytesStart<'_>,
        position: usize,
    ) -> Result<(), WalkError> {
        let id = attrs::identifier(element, "id").map_err(invalid("relation", "id", position))?;
        self.owner = Owner::Relation { id, last: 0 };
        let outcome = self.sink.persist_relation(&Relation { id });
        self.absorb(RecordKind::Relations, outcome)
    }

    fn open_tag(&mut self, element: &BytesStart<'_>, position: usize) -> Result<(), WalkError> {
        const NAME: &str = "tag";
        let Some((kind, owner)) = self.owner.current() else {
            return Err(WalkError::NoOwner {
                element: NAME,
                position,
            });
        };
        let key = attrs::text(element, "k").map_err(invalid(NAME, "k", position))?;
        let value = attrs::text(element, "v").map_err(invalid(NAME, "v", position))?;
        let tag = Tag {
            owner,
            key: self.sanitiser.sanitise(&key),
            value: self.sanitiser.sanitise(&value),
        };
        self.route_tag(kind, &tag)
    }

    /// The one place that decides which tag collection a tag belongs to.
    fn route_tag(&mut self, kind: OwnerKind, tag: &Tag) -> Result<(), WalkError> {
        let outcome = match kind {
            OwnerKind::Node => self.sink.persist_node_tag(tag),
            OwnerKind::Way => self.sink.persist_way_tag(tag),
            OwnerKind::Relation => self.sink.persist_relation_tag(tag),
        };
        self.absorb(kind.tag_kind(), outcome)
    }

    fn open_nd(&mut self, element: &BytesStart<'_>, position: usize) -> Result<(), WalkError> {
        const NAME: &str = "nd";
        let reference = attrs::identifier(element, "ref").map_err(invalid(NAME, "ref", position))?;
        let node_ref = self
            .owner
            .next_way_node(reference)
            .map_err(|err| self.misplaced(err, NAME, OwnerKind::Way, position))?;
        let outcome = self.sink.persist_way_node(&node_ref);
        self.absorb(RecordKind::WayNodes, outcome)
    }

    fn open_member(&mut self, element: &BytesStart<'_>, position: usize) -> Result<(), WalkError> {
        const NAME: &str = "member";
        let member_type =
            attrs::member_type(element, "type").map_err(invalid(NAME, "type", position))?;
        let reference = attrs::identifier(element, "ref").map_err(invalid(NAME, "ref", position))?;
        let role = attrs::text(element, "role").map_err(invalid(NAME, "role", position))?;
        let role = self.sanitiser.sanitise(&role);
        let member = self
            .owner
            .next_member(reference, role, member_type)
            .map_err(|err| self.misplaced(err, NAME, OwnerKind::Relation, position))?;
        let outcome = self.sink.persist_relation_member(&member);
        self.absorb(RecordKind::RelationMembers, outcome)
    }

    fn misplaced(
        &self,
        err: AttachError,
        element: &'static str,
        expected: OwnerKind,
        position: usize,
    ) -> WalkError {
        match err {
            AttachError::WrongOwner => WalkError::MisplacedElement {
                element,
                expected,
                found: self.owner.to_string(),
                position,
            },
            AttachError::PositionOverflow { owner } => WalkError::PositionOverflow {
                element,
                owner,
                position,
            },
        }
    }

    /// Count a persisted record, or log and count a rejected one.
    fn absorb<E: StdError + 'static>(
        &mut self,
        kind: RecordKind,
        outcome: Result<(), E>,
    ) -> Result<(), WalkError> {
        let Err(err) = outcome else {
            self.summary.record_persisted(kind);
            return Ok(());
        };
        self.summary.dropped += 1;
        warn!("dropped {kind} record: {}", error_chain(&err));
        match self.drop_limit {
            Some(limit) if self.summary.dropped > limit => {
                Err(WalkError::DropLimitExceeded { limit })
            }
            _ => Ok(()),
        }
    }

    fn observe_buffer(&mut self, capacity: usize) {
        self.summary.peak_buffer_bytes = self.summary.peak_buffer_bytes.max(capacity);
    }

    fn finish(mut self, capacity: usize) -> WalkSummary {
        self.observe_buffer(capacity);
        self.summary
    }
}

fn invalid(
    element: &'static str,
    attribute: &'static str,
    position: usize,
) -> impl FnOnce(AttributeError) -> WalkError {
    move |source| WalkError::Attribute {
        element,
        attribute,
        position,
        source,
    }
}

/// Render an error followed by each of its causes.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(next) = cause {
        message.push_str(": ");
        message.push_str(&next.to_string());
        cause = next.source();
    }
    message
}
