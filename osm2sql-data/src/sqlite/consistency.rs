//! Post-load integrity and foreign-key checks.

use log::{info, warn};
use rusqlite::Connection;

use super::SqliteSinkError;

/// Foreign-key violations kept verbatim in a report; the rest are counted.
pub const MAX_VIOLATION_SAMPLES: usize = 20;

/// One row reported by `PRAGMA foreign_key_check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyViolation {
    /// Table holding the dangling reference.
    pub table: String,
    /// Row id of the offending row.
    pub rowid: Option<i64>,
    /// Table the reference points to.
    pub parent: String,
}

/// Findings of the checks run when a SQLite output is released.
///
/// Findings are informational: inserts ran with constraint enforcement off,
/// so the report is the only place where dangling owners surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Messages from `PRAGMA integrity_check` other than `ok`.
    pub integrity: Vec<String>,
    /// Total rows reported by `PRAGMA foreign_key_check`.
    pub foreign_key_violations: u64,
    /// The first few of those rows.
    pub samples: Vec<ForeignKeyViolation>,
}

impl ConsistencyReport {
    /// Run both checks against `connection`.
    pub(super) fn collect(connection: &Connection) -> Result<Self, SqliteSinkError> {
        let mut report = Self {
            integrity: integrity_findings(connection)?,
            ..Self::default()
        };
        let check = |source| SqliteSinkError::Consistency {
            check: "foreign_key_check",
            source,
        };
        let mut statement = connection.prepare("PRAGMA foreign_key_check").map_err(check)?;
        let mut rows = statement.query([]).map_err(check)?;
        while let Some(row) = rows.next().map_err(check)? {
            report.foreign_key_violations += 1;
            if report.samples.len() < MAX_VIOLATION_SAMPLES {
                report.samples.push(ForeignKeyViolation {
                    table: row.get(0).map_err(check)?,
                    rowid: row.get(1).map_err(check)?,
                    parent: row.get(2).map_err(check)?,
                });
            }
        }
        Ok(report)
    }

    /// Whether both checks came back empty.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.integrity.is_empty() && self.foreign_key_violations == 0
    }

    /// Log the findings, one warning per message.
    pub fn log(&self, output: &str) {
        if self.is_clean() {
            info!("consistency checks passed for {output}");
            return;
        }
        for message in &self.integrity {
            warn!("integrity check on {output}: {message}");
        }
        if self.foreign_key_violations > 0 {
            warn!(
                "{} foreign key violations in {output}",
                self.foreign_key_violations
            );
        }
        for violation in &self.samples {
            match violation.rowid {
                Some(rowid) => warn!(
                    "{} row {rowid} references a missing {} row",
                    violation.table, violation.parent
                ),
                None => warn!(
                    "{} has a row referencing a missing {} row",
                    violation.table, violation.parent
                ),
            }
        }
    }
}

fn integrity_findings(connection: &Connection) -> Result<Vec<String>, SqliteSinkError> {
    let check = |source| SqliteSinkError::Consistency {
        check: "integrity_check",
        source,
    };
    let mut statement = connection.prepare("PRAGMA integrity_check").map_err(check)?;
    let messages = statement
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(check)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(check)?;
    Ok(messages
        .into_iter()
        .filter(|message| message != "ok")
        .collect())
}
