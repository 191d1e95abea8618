//! Logger installation for the binary.

use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::CliError;

/// Install a stderr logger filtered at `level`.
///
/// Lines read `[timestamp LEVEL] message`.
pub(crate) fn init(level: LevelFilter) -> Result<(), CliError> {
    Builder::new()
        .filter_level(level)
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .try_init()?;
    Ok(())
}
