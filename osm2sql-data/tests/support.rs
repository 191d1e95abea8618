//! Fixture helpers shared by the integration tests.

use bzip2::{Compression, write::BzEncoder};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fs, io::Write, path::PathBuf};
use tempfile::{Builder, TempPath};

/// Directory containing the XML fixtures.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Read an XML fixture by stem.
pub fn read_fixture(stem: &str) -> String {
    let path = fixtures_dir().join(format!("{stem}.osm"));
    fs::read_to_string(&path).unwrap_or_else(|err| {
        panic!("failed to read fixture {path:?}: {err}");
    })
}

/// Compress `xml` into a temporary `.osm.bz2` archive.
pub fn archive_from_xml(stem: &str, xml: &str) -> TempPath {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(xml.as_bytes())
        .unwrap_or_else(|err| panic!("failed to compress fixture {stem}: {err}"));
    let compressed = encoder
        .finish()
        .unwrap_or_else(|err| panic!("failed to finish archive for {stem}: {err}"));
    let mut tempfile = Builder::new()
        .prefix(stem)
        .suffix(".osm.bz2")
        .tempfile()
        .unwrap_or_else(|err| panic!("failed to create temporary archive for {stem}: {err}"));
    tempfile
        .write_all(&compressed)
        .unwrap_or_else(|err| panic!("failed to write archive for {stem}: {err}"));
    tempfile
        .flush()
        .unwrap_or_else(|err| panic!("failed to flush archive for {stem}: {err}"));
    tempfile.into_temp_path()
}

/// UTF-8 view of a temporary path.
pub fn utf8(path: &TempPath) -> &Utf8Path {
    Utf8Path::from_path(path.as_ref()).unwrap_or_else(|| panic!("non UTF-8 path {path:?}"))
}

/// UTF-8 path of `name` inside `dir`.
pub fn join(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name))
        .unwrap_or_else(|path| panic!("non UTF-8 path {path:?}"))
}
