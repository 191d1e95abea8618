//! Test helpers for composing archives and layered configuration overrides.

use super::*;
use bzip2::{Compression, write::BzEncoder};
use camino::Utf8Path;
use std::{fs, io::Write};
use tempfile::TempDir;

const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="51.5" lon="-0.12"><tag k="name" v="Café, &quot;Central&quot;"/></node>
  <node id="2" lat="51.6" lon="-0.13"/>
  <way id="10"><nd ref="1"/><nd ref="2"/><tag k="highway" v="service"/></way>
</osm>
"#;

#[derive(Debug, Clone, Default)]
pub(super) struct LayerOverrides {
    pub(super) output: Option<Utf8PathBuf>,
    pub(super) output_dir: Option<Utf8PathBuf>,
    pub(super) encoding: Option<String>,
}

/// A compressed sample archive plus scratch output locations.
#[derive(Debug)]
pub(super) struct SampleArchive {
    _dir: TempDir,
    archive: Utf8PathBuf,
    database: Utf8PathBuf,
    config_output_dir: Utf8PathBuf,
}

impl SampleArchive {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        let archive = root.join("sample.osm.bz2");
        let mut encoder = BzEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(SAMPLE.as_bytes())
            .expect("compress sample");
        fs::write(&archive, encoder.finish().expect("finish archive")).expect("write archive");
        Self {
            _dir: dir,
            archive,
            database: root.join("out/sample.db"),
            config_output_dir: root.join("config-csv"),
        }
    }

    pub(super) fn archive(&self) -> &Utf8Path {
        &self.archive
    }

    pub(super) fn database(&self) -> &Utf8Path {
        &self.database
    }

    pub(super) fn config_output_dir(&self) -> &Utf8Path {
        &self.config_output_dir
    }
}

pub(super) fn merge_sqlite_layers(
    mut cli_args: SqliteArgs,
    file_layer: Option<&LayerOverrides>,
    env_layer: Option<&LayerOverrides>,
) -> Result<SqliteConfig, CliError> {
    merge_field(
        &mut cli_args.output,
        extract_field(env_layer, |layer| &layer.output),
        extract_field(file_layer, |layer| &layer.output),
    );
    SqliteConfig::try_from(cli_args)
}

pub(super) fn merge_csv_layers(
    mut cli_args: CsvArgs,
    file_layer: Option<&LayerOverrides>,
    env_layer: Option<&LayerOverrides>,
) -> Result<CsvConfig, CliError> {
    merge_field(
        &mut cli_args.output_dir,
        extract_field(env_layer, |layer| &layer.output_dir),
        extract_field(file_layer, |layer| &layer.output_dir),
    );
    merge_field(
        &mut cli_args.encoding,
        extract_field(env_layer, |layer| &layer.encoding),
        extract_field(file_layer, |layer| &layer.encoding),
    );
    CsvConfig::try_from(cli_args)
}

fn merge_field<T: Clone>(target: &mut Option<T>, env_value: Option<T>, file_value: Option<T>) {
    if target.is_none()
        && let Some(value) = env_value.or(file_value)
    {
        *target = Some(value);
    }
}

fn extract_field<T: Clone>(
    layer: Option<&LayerOverrides>,
    accessor: fn(&LayerOverrides) -> &Option<T>,
) -> Option<T> {
    layer.and_then(|entry| accessor(entry).clone())
}
