//! SQLite output for the record stream.
//!
//! The sink trades durability for load speed while it is open: no journal,
//! no fsync, and constraint enforcement switched off, with every insert in a
//! single transaction. Releasing the sink commits, re-enables the
//! constraints and runs the consistency checks.
#![forbid(unsafe_code)]

mod consistency;
mod schema;

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, error, info};
use osm2sql_core::{
    Node, RecordKind, RecordSink, Relation, RelationMember, Tag, Way, WayNodeRef,
};
use rusqlite::{Connection, Error as SqliteError, Params};
use thiserror::Error;

pub use consistency::{ConsistencyReport, ForeignKeyViolation, MAX_VIOLATION_SAMPLES};
pub use schema::SCHEMA_VERSION;

/// Errors raised by [`SqliteSink`].
#[derive(Debug, Error)]
pub enum SqliteSinkError {
    /// Failed to create the directory holding the database.
    #[error("failed to create parent directory of {path:?}")]
    CreateDirectory {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Opening the database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Setting a connection pragma failed.
    #[error("failed to set PRAGMA {pragma}")]
    Pragma {
        /// Name of the pragma.
        pragma: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A step of the schema bootstrap failed.
    #[error("failed to bootstrap schema: {step}")]
    Bootstrap {
        /// Bootstrap step that failed.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database was created by an incompatible release.
    #[error("expected schema version {expected} but found {found}")]
    SchemaVersionMismatch {
        /// Version written by this release.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
    /// Beginning the load transaction failed.
    #[error("failed to begin load transaction")]
    Begin {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A single insert failed; the record is lost, the load continues.
    #[error("failed to insert into {table}: `{statement}` with {values}")]
    Insert {
        /// Target table.
        table: &'static str,
        /// Statement that failed.
        statement: &'static str,
        /// Rendered parameter values.
        values: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A record arrived after the sink was released.
    #[error("cannot insert into {table}: the SQLite output is already released")]
    Released {
        /// Target table.
        table: &'static str,
    },
    /// Committing the load transaction failed.
    #[error("failed to commit load transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Running a consistency check failed.
    #[error("failed to run PRAGMA {check}")]
    Consistency {
        /// Pragma being run.
        check: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Closing the connection failed.
    #[error("failed to close SQLite database")]
    Close {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Record sink writing into a SQLite database file.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use osm2sql_core::{Node, RecordSink};
/// use osm2sql_data::SqliteSink;
///
/// let mut sink = SqliteSink::open(Utf8Path::new("out/extract.db"))?;
/// sink.persist_node(&Node { id: 1, lon: 0.5, lat: 51.0 })?;
/// sink.release()?;
/// assert!(sink.consistency().is_some_and(|report| report.is_clean()));
/// # Ok::<(), osm2sql_data::SqliteSinkError>(())
/// ```
#[derive(Debug)]
pub struct SqliteSink {
    path: Utf8PathBuf,
    connection: Option<Connection>,
    report: Option<ConsistencyReport>,
}

impl SqliteSink {
    /// Create or open the database at `path` and start the load transaction.
    pub fn open(path: &Utf8Path) -> Result<Self, SqliteSinkError> {
        osm2sql_fs::ensure_parent_dir(path).map_err(|source| {
            SqliteSinkError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let mut connection =
            Connection::open(path.as_std_path()).map_err(|source| SqliteSinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        // Only takes effect before the first table exists.
        set_pragma(&connection, "encoding", "UTF-8")?;
        schema::bootstrap(&mut connection)?;

        set_pragma(&connection, "synchronous", "OFF")?;
        connection
            .pragma_update_and_check(None, "journal_mode", "OFF", |row| row.get::<_, String>(0))
            .map_err(|source| SqliteSinkError::Pragma {
                pragma: "journal_mode",
                source,
            })?;
        set_pragma(&connection, "foreign_keys", false)?;
        set_pragma(&connection, "ignore_check_constraints", true)?;
        connection
            .execute_batch("BEGIN")
            .map_err(|source| SqliteSinkError::Begin { source })?;

        info!("writing SQLite output to {path}");
        Ok(Self {
            path: path.to_path_buf(),
            connection: Some(connection),
            report: None,
        })
    }

    /// Database location.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Findings of the release-time checks, once the sink is released.
    #[must_use]
    pub const fn consistency(&self) -> Option<&ConsistencyReport> {
        self.report.as_ref()
    }

    fn insert<P: Params>(
        &mut self,
        kind: RecordKind,
        params: P,
        values: impl FnOnce() -> String,
    ) -> Result<(), SqliteSinkError> {
        let table = kind.table();
        let connection = self
            .connection
            .as_ref()
            .ok_or(SqliteSinkError::Released { table })?;
        let statement = schema::insert_statement(kind);
        connection
            .prepare_cached(statement)
            .and_then(|mut prepared| prepared.execute(params))
            .map(|_| ())
            .map_err(|source| SqliteSinkError::Insert {
                table,
                statement,
                values: values(),
                source,
            })
    }

    fn insert_tag(&mut self, kind: RecordKind, tag: &Tag) -> Result<(), SqliteSinkError> {
        self.insert(
            kind,
            (tag.owner, tag.key.as_str(), tag.value.as_str()),
            || format!("({}, {:?}, {:?})", tag.owner, tag.key, tag.value),
        )
    }
}

impl RecordSink for SqliteSink {
    type Error = SqliteSinkError;

    fn persist_node(&mut self, node: &Node) -> Result<(), Self::Error> {
        self.insert(RecordKind::Nodes, (node.id, node.lon, node.lat), || {
            format!("({}, {}, {})", node.id, node.lon, node.lat)
        })
    }

    fn persist_way(&mut self, way: &Way) -> Result<(), Self::Error> {
        self.insert(RecordKind::Ways, (way.id,), || format!("({})", way.id))
    }

    fn persist_relation(&mut self, relation: &Relation) -> Result<(), Self::Error> {
        self.insert(RecordKind::Relations, (relation.id,), || {
            format!("({})", relation.id)
        })
    }

    fn persist_node_tag(&mut self, tag: &Tag) -> Result<(), Self::Error> {
        self.insert_tag(RecordKind::NodeTags, tag)
    }

    fn persist_way_tag(&mut self, tag: &Tag) -> Result<(), Self::Error> {
        self.insert_tag(RecordKind::WayTags, tag)
    }

    fn persist_relation_tag(&mut self, tag: &Tag) -> Result<(), Self::Error> {
        self.insert_tag(RecordKind::RelationTags, tag)
    }

    fn persist_way_node(&mut self, node_ref: &WayNodeRef) -> Result<(), Self::Error> {
        self.insert(
            RecordKind::WayNodes,
            (node_ref.way, node_ref.position, node_ref.reference),
            || {
                format!(
                    "({}, {}, {})",
                    node_ref.way, node_ref.position, node_ref.reference
                )
            },
        )
    }

    fn persist_relation_member(&mut self, member: &RelationMember) -> Result<(), Self::Error> {
        self.insert(
            RecordKind::RelationMembers,
            (
                member.relation,
                member.position,
                member.reference,
                member.role.as_str(),
                member.member_type.as_str(),
            ),
            || {
                format!(
                    "({}, {}, {}, {:?}, {:?})",
                    member.relation,
                    member.position,
                    member.reference,
                    member.role,
                    member.member_type.as_str()
                )
            },
        )
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };
        connection
            .execute_batch("COMMIT")
            .map_err(|source| SqliteSinkError::Commit { source })?;
        // foreign_keys cannot change inside a transaction, so it is restored
        // after the commit.
        set_pragma(&connection, "foreign_keys", true)?;
        set_pragma(&connection, "ignore_check_constraints", false)?;
        let report = ConsistencyReport::collect(&connection)?;
        report.log(self.path.as_str());
        self.report = Some(report);
        connection
            .close()
            .map_err(|(_, source)| SqliteSinkError::Close { source })?;
        debug!("closed SQLite output {}", self.path);
        Ok(())
    }
}

impl Drop for SqliteSink {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            error!("failed to release SQLite output {}: {err}", self.path);
        }
    }
}

fn set_pragma<V: rusqlite::ToSql>(
    connection: &Connection,
    pragma: &'static str,
    value: V,
) -> Result<(), SqliteSinkError> {
    connection
        .pragma_update(None, pragma, value)
        .map_err(|source| SqliteSinkError::Pragma { pragma, source })
}
