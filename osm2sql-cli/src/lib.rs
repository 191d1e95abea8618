//! Command-line interface converting OpenStreetMap archives into relational
//! outputs.
//!
//! Every subcommand option can come from a CLI flag, a configuration file or
//! an `OSM2SQL_CMDS_<COMMAND>_<OPTION>` environment variable. Merged values
//! are validated into plain configuration structs before any file is opened.
#![forbid(unsafe_code)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use log::{LevelFilter, info};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use osm2sql_core::{DEFAULT_DELIMITER, DefaultSanitiser, IdentitySanitiser, Sanitiser};
use osm2sql_data::{
    DelimitedOptions, TextEncoding, Walker, convert_to_delimited, convert_to_sqlite,
};
use serde::{Deserialize, Serialize};

mod error;
mod logging;

pub use error::{CliError, EXIT_FAILURE, EXIT_INTERRUPTED};

const ARG_INPUT: &str = "input";
const ARG_OUTPUT: &str = "output";
const ARG_OUTPUT_DIR: &str = "output-dir";
const ENV_SQLITE_INPUT: &str = "OSM2SQL_CMDS_SQLITE_INPUT";
const ENV_SQLITE_OUTPUT: &str = "OSM2SQL_CMDS_SQLITE_OUTPUT";
const ENV_CSV_INPUT: &str = "OSM2SQL_CMDS_CSV_INPUT";
const ENV_CSV_OUTPUT_DIR: &str = "OSM2SQL_CMDS_CSV_OUTPUT_DIR";

/// Run the osm2sql CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    logging::init(cli.loglevel)?;
    let interrupt = install_interrupt_handler()?;
    execute(cli.command, &interrupt)
}

fn install_interrupt_handler() -> Result<Arc<AtomicBool>, CliError> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed))?;
    Ok(flag)
}

fn execute(command: Command, interrupt: &Arc<AtomicBool>) -> Result<(), CliError> {
    match command {
        Command::Sqlite(args) => {
            let config = args.into_config()?;
            run_sqlite(&config, interrupt)
        }
        Command::Csv(args) => {
            let config = args.into_config()?;
            run_csv(&config, interrupt)
        }
    }
}

fn run_sqlite(config: &SqliteConfig, interrupt: &Arc<AtomicBool>) -> Result<(), CliError> {
    info!("converting {} into {}", config.input, config.output);
    let report = if config.conversion.raw_strings {
        let walker = config.conversion.walker(IdentitySanitiser, interrupt);
        convert_to_sqlite(&config.input, &config.output, &walker)?
    } else {
        let walker = config
            .conversion
            .walker(DefaultSanitiser::default(), interrupt);
        convert_to_sqlite(&config.input, &config.output, &walker)?
    };
    report.log(&config.input);
    Ok(())
}

fn run_csv(config: &CsvConfig, interrupt: &Arc<AtomicBool>) -> Result<(), CliError> {
    info!(
        "converting {} into {} ({}, delimiter {:?})",
        config.input, config.output_dir, config.options.encoding, config.options.delimiter
    );
    let report = if config.conversion.raw_strings {
        let walker = config.conversion.walker(IdentitySanitiser, interrupt);
        convert_to_delimited(&config.input, &config.output_dir, config.options, &walker)?
    } else {
        let sanitiser = DefaultSanitiser::with_delimiter(config.options.delimiter)?;
        let walker = config.conversion.walker(sanitiser, interrupt);
        convert_to_delimited(&config.input, &config.output_dir, config.options, &walker)?
    };
    report.log(&config.input);
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "osm2sql",
    about = "Convert bzip2-compressed OpenStreetMap XML into SQLite or delimited files",
    version
)]
struct Cli {
    /// Log level: off, error, warn, info, debug or trace.
    #[arg(
        short = 'v',
        long = "loglevel",
        value_name = "level",
        default_value = "info",
        global = true
    )]
    loglevel: LevelFilter,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load an archive into a SQLite database.
    Sqlite(SqliteArgs),
    /// Write an archive as eight delimited text files.
    Csv(CsvArgs),
}

/// CLI arguments for the `sqlite` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "sqlite",
    long_about = "Convert an .osm.bz2 archive into a SQLite database. Paths \
                 can come from CLI flags, configuration files, or \
                 environment variables.",
    about = "Load an archive into a SQLite database"
)]
#[ortho_config(prefix = "OSM2SQL")]
struct SqliteArgs {
    /// Path to the bzip2-compressed OpenStreetMap XML archive.
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    input: Option<Utf8PathBuf>,
    /// Path of the SQLite database to create.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    output: Option<Utf8PathBuf>,
    /// Store tag keys, values and roles without sanitising them.
    #[arg(long = "raw-strings")]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    raw_strings: bool,
    /// Abort once more than this many records were rejected by the output.
    #[arg(long = "max-dropped", value_name = "count")]
    #[serde(default)]
    max_dropped: Option<u64>,
}

impl SqliteArgs {
    fn into_config(self) -> Result<SqliteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SqliteConfig::try_from(merged)
    }
}

/// CLI arguments for the `csv` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "csv",
    long_about = "Convert an .osm.bz2 archive into one delimited file per \
                 table. Options can come from CLI flags, configuration \
                 files, or environment variables.",
    about = "Write an archive as eight delimited text files"
)]
#[ortho_config(prefix = "OSM2SQL")]
struct CsvArgs {
    /// Path to the bzip2-compressed OpenStreetMap XML archive.
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    input: Option<Utf8PathBuf>,
    /// Directory receiving the delimited files.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "path")]
    #[serde(default)]
    output_dir: Option<Utf8PathBuf>,
    /// Field delimiter (defaults to `;`).
    #[arg(long = "delimiter", value_name = "char")]
    #[serde(default)]
    delimiter: Option<char>,
    /// Byte encoding of the files: utf-16le (default) or utf-8.
    #[arg(long = "encoding", value_name = "name")]
    #[serde(default)]
    encoding: Option<String>,
    /// Store tag keys, values and roles without sanitising them.
    #[arg(long = "raw-strings")]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    raw_strings: bool,
    /// Abort once more than this many records were rejected by the output.
    #[arg(long = "max-dropped", value_name = "count")]
    #[serde(default)]
    max_dropped: Option<u64>,
}

impl CsvArgs {
    fn into_config(self) -> Result<CsvConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CsvConfig::try_from(merged)
    }
}

/// Options shared by every conversion command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ConversionOptions {
    raw_strings: bool,
    max_dropped: Option<u64>,
}

impl ConversionOptions {
    fn walker<S: Sanitiser>(&self, sanitiser: S, interrupt: &Arc<AtomicBool>) -> Walker<S> {
        let walker = Walker::new(sanitiser).with_interrupt(Arc::clone(interrupt));
        match self.max_dropped {
            Some(limit) => walker.with_drop_limit(limit),
            None => walker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SqliteConfig {
    input: Utf8PathBuf,
    output: Utf8PathBuf,
    conversion: ConversionOptions,
}

impl TryFrom<SqliteArgs> for SqliteConfig {
    type Error = CliError;

    fn try_from(args: SqliteArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_SQLITE_INPUT,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_SQLITE_OUTPUT,
        })?;
        Ok(Self {
            input,
            output,
            conversion: ConversionOptions {
                raw_strings: args.raw_strings,
                max_dropped: args.max_dropped,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CsvConfig {
    input: Utf8PathBuf,
    output_dir: Utf8PathBuf,
    options: DelimitedOptions,
    conversion: ConversionOptions,
}

impl TryFrom<CsvArgs> for CsvConfig {
    type Error = CliError;

    fn try_from(args: CsvArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_CSV_INPUT,
        })?;
        let output_dir = args.output_dir.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT_DIR,
            env: ENV_CSV_OUTPUT_DIR,
        })?;
        let encoding = match args.encoding.as_deref() {
            Some(name) => name.parse::<TextEncoding>()?,
            None => TextEncoding::default(),
        };
        let delimiter = args.delimiter.unwrap_or(DEFAULT_DELIMITER);
        // Rejected delimiters would corrupt the files even with raw strings.
        DefaultSanitiser::with_delimiter(delimiter)?;
        Ok(Self {
            input,
            output_dir,
            options: DelimitedOptions {
                delimiter,
                encoding,
            },
            conversion: ConversionOptions {
                raw_strings: args.raw_strings,
                max_dropped: args.max_dropped,
            },
        })
    }
}

#[cfg(test)]
mod tests;
