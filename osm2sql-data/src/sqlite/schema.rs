//! Database bootstrap and the insert statement for each record kind.

use osm2sql_core::RecordKind;
use rusqlite::{Connection, OptionalExtension, Transaction};

use super::SqliteSinkError;

/// Version recorded in `osm_schema_version` by this release.
pub const SCHEMA_VERSION: i64 = 1;

const BOOTSTRAP: &str = include_str!("bootstrap.sql");

/// Create the tables if needed and check the recorded schema version.
///
/// An existing database with a different version is rejected rather than
/// written into.
pub(super) fn bootstrap(connection: &mut Connection) -> Result<(), SqliteSinkError> {
    let transaction = connection
        .transaction()
        .map_err(|source| SqliteSinkError::Bootstrap {
            step: "begin bootstrap transaction",
            source,
        })?;
    transaction
        .execute_batch(BOOTSTRAP)
        .map_err(|source| SqliteSinkError::Bootstrap {
            step: "apply bootstrap script",
            source,
        })?;
    ensure_schema_version(&transaction)?;
    transaction
        .commit()
        .map_err(|source| SqliteSinkError::Bootstrap {
            step: "commit bootstrap transaction",
            source,
        })
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SqliteSinkError> {
    let existing: Option<i64> = transaction
        .query_row("SELECT version FROM osm_schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|source| SqliteSinkError::Bootstrap {
            step: "read schema version",
            source,
        })?;
    match existing {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SqliteSinkError::SchemaVersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO osm_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| SqliteSinkError::Bootstrap {
                step: "record schema version",
                source,
            }),
    }
}

/// Parameterised insert for `kind`, columns in storage order.
pub(super) const fn insert_statement(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Nodes => "INSERT INTO osm_nodes (id, lon, lat) VALUES (?1, ?2, ?3)",
        RecordKind::Ways => "INSERT INTO osm_ways (id) VALUES (?1)",
        RecordKind::Relations => "INSERT INTO osm_relations (id) VALUES (?1)",
        RecordKind::NodeTags => "INSERT INTO osm_nodes_tags (node_id, k, v) VALUES (?1, ?2, ?3)",
        RecordKind::WayTags => "INSERT INTO osm_ways_tags (way_id, k, v) VALUES (?1, ?2, ?3)",
        RecordKind::RelationTags => {
            "INSERT INTO osm_relations_tags (relation_id, k, v) VALUES (?1, ?2, ?3)"
        }
        RecordKind::WayNodes => "INSERT INTO osm_ways_nds (way_id, nr, ref) VALUES (?1, ?2, ?3)",
        RecordKind::RelationMembers => {
            "INSERT INTO osm_relations_members (relation_id, nr, ref, role, type) \
             VALUES (?1, ?2, ?3, ?4, ?5)"
        }
    }
}
