//! Behavioural tests for converting archives into SQLite.

use osm2sql_core::{DefaultSanitiser, RecordKind};
use osm2sql_data::{ConversionReport, ConvertError, WalkError, Walker, convert_to_sqlite};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use rusqlite::Connection;
use std::{cell::RefCell, fs, path::PathBuf};
use tempfile::{TempDir, TempPath};

mod support;

use support::{archive_from_xml, join, read_fixture, utf8};

type Outcome = Result<ConversionReport, ConvertError>;

#[fixture]
fn archive() -> RefCell<Option<TempPath>> {
    RefCell::new(None)
}

#[fixture]
fn output_dir() -> RefCell<Option<TempDir>> {
    RefCell::new(None)
}

#[fixture]
fn conversion_result() -> RefCell<Option<Outcome>> {
    RefCell::new(None)
}

fn expect_report(result: &RefCell<Option<Outcome>>) -> ConversionReport {
    result
        .borrow()
        .as_ref()
        .expect("conversion was attempted")
        .as_ref()
        .unwrap_or_else(|err| panic!("expected a successful conversion, got {err:?}"))
        .clone()
}

fn open_output(output_dir: &RefCell<Option<TempDir>>) -> Connection {
    let guard = output_dir.borrow();
    let dir = guard.as_ref().expect("output directory prepared");
    Connection::open(join(dir, "extract.db").as_std_path()).expect("open output database")
}

fn use_archive(archive: &RefCell<Option<TempPath>>, stem: &str, xml: &str) {
    *archive.borrow_mut() = Some(archive_from_xml(stem, xml));
}

#[given("the sample archive")]
fn sample_archive(#[from(archive)] archive: &RefCell<Option<TempPath>>) {
    use_archive(archive, "sample", &read_fixture("sample"));
}

#[given("an archive whose first element is a tag")]
fn orphan_tag_archive(#[from(archive)] archive: &RefCell<Option<TempPath>>) {
    let xml = read_fixture("sample").replacen(
        "<bounds",
        "<tag k=\"orphan\" v=\"yes\"/>\n  <bounds",
        1,
    );
    use_archive(archive, "orphan", &xml);
}

#[given("an archive that repeats a node id")]
fn duplicate_node_archive(#[from(archive)] archive: &RefCell<Option<TempPath>>) {
    let xml = read_fixture("sample").replacen(
        "<way id=\"10\">",
        "<node id=\"3\" lat=\"0\" lon=\"0\"/>\n  <way id=\"10\">",
        1,
    );
    use_archive(archive, "duplicate", &xml);
}

#[given("the sample archive with an unknown element inserted")]
fn unknown_element_archive(#[from(archive)] archive: &RefCell<Option<TempPath>>) {
    let xml = read_fixture("sample").replacen(
        "<way id=\"10\">",
        "<changeset id=\"5\"><tag k=\"comment\" v=\"ignored\"/></changeset>\n  <way id=\"10\">",
        1,
    );
    use_archive(archive, "unknown", &xml);
}

#[when("I convert the archive to SQLite")]
fn convert_archive(
    #[from(archive)] archive: &RefCell<Option<TempPath>>,
    #[from(output_dir)] output_dir: &RefCell<Option<TempDir>>,
    #[from(conversion_result)] result: &RefCell<Option<Outcome>>,
) {
    let dir = TempDir::new().expect("create output dir");
    let output = join(&dir, "extract.db");
    let outcome = {
        let guard = archive.borrow();
        let input = guard.as_ref().expect("archive prepared");
        let walker = Walker::new(DefaultSanitiser::default());
        convert_to_sqlite(utf8(input), &output, &walker)
    };
    *output_dir.borrow_mut() = Some(dir);
    *result.borrow_mut() = Some(outcome);
}

#[then("the conversion succeeds")]
fn conversion_succeeds(#[from(conversion_result)] result: &RefCell<Option<Outcome>>) {
    let report = expect_report(result);
    assert!(report.summary.total_persisted() > 0, "expected some records");
}

#[then("the node tag value is stored lower-cased without quotes or commas")]
fn sanitised_value(#[from(output_dir)] output_dir: &RefCell<Option<TempDir>>) {
    let connection = open_output(output_dir);
    let (key, value): (String, String) = connection
        .query_row(
            "SELECT k, v FROM osm_nodes_tags WHERE node_id = 1 ORDER BY rowid LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("read node tag");
    assert_eq!(key, "name");
    assert_eq!(value, "café: central");
}

#[then("a structural error is returned")]
fn structural_error(#[from(conversion_result)] result: &RefCell<Option<Outcome>>) {
    let borrowed = result.borrow();
    match borrowed.as_ref().expect("conversion was attempted") {
        Ok(report) => panic!("expected a structural error, got {report:?}"),
        Err(ConvertError::Walk {
            source: WalkError::NoOwner { element, .. },
            ..
        }) => assert_eq!(*element, "tag"),
        Err(other) => panic!("expected a missing owner error, got {other:?}"),
    }
}

#[then("one record is reported as dropped")]
fn one_dropped(#[from(conversion_result)] result: &RefCell<Option<Outcome>>) {
    assert_eq!(expect_report(result).summary.dropped, 1);
}

#[then("the way after the duplicate is persisted")]
fn way_persisted(#[from(output_dir)] output_dir: &RefCell<Option<TempDir>>) {
    let connection = open_output(output_dir);
    let nds: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM osm_ways_nds WHERE way_id = 10",
            [],
            |row| row.get(0),
        )
        .expect("count way nodes");
    assert_eq!(nds, 3);
}

#[then("the node, way and relation counts match the sample archive")]
fn counts_match(#[from(conversion_result)] result: &RefCell<Option<Outcome>>) {
    let summary = expect_report(result).summary;
    assert_eq!(summary.persisted(RecordKind::Nodes), 3);
    assert_eq!(summary.persisted(RecordKind::Ways), 1);
    assert_eq!(summary.persisted(RecordKind::Relations), 1);
    assert_eq!(summary.persisted(RecordKind::NodeTags), 2);
    assert_eq!(summary.unknown_elements, 1);
}

#[scenario(path = "tests/features/convert_archive.feature", index = 0)]
fn sanitising_tag_values(
    archive: RefCell<Option<TempPath>>,
    output_dir: RefCell<Option<TempDir>>,
    conversion_result: RefCell<Option<Outcome>>,
) {
    let _ = (archive, output_dir, conversion_result);
}

#[scenario(path = "tests/features/convert_archive.feature", index = 1)]
fn rejecting_orphan_tags(
    archive: RefCell<Option<TempPath>>,
    output_dir: RefCell<Option<TempDir>>,
    conversion_result: RefCell<Option<Outcome>>,
) {
    let _ = (archive, output_dir, conversion_result);
}

#[scenario(path = "tests/features/convert_archive.feature", index = 2)]
fn absorbing_duplicates(
    archive: RefCell<Option<TempPath>>,
    output_dir: RefCell<Option<TempDir>>,
    conversion_result: RefCell<Option<Outcome>>,
) {
    let _ = (archive, output_dir, conversion_result);
}

#[scenario(path = "tests/features/convert_archive.feature", index = 3)]
fn ignoring_unknown_elements(
    archive: RefCell<Option<TempPath>>,
    output_dir: RefCell<Option<TempDir>>,
    conversion_result: RefCell<Option<Outcome>>,
) {
    let _ = (archive, output_dir, conversion_result);
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/features/convert_archive.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature:?}: {err}");
    });
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles,
        [
            "sanitising tag values from a real archive",
            "rejecting a tag before any owner",
            "absorbing a duplicated node",
            "ignoring unknown elements",
        ]
    );
}
