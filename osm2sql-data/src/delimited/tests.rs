use super::*;
use osm2sql_core::MemberType;
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

fn out_dir(temp_dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp_dir.path().join("csv")).expect("utf-8 path")
}

fn utf8() -> DelimitedOptions {
    DelimitedOptions {
        encoding: TextEncoding::Utf8,
        ..DelimitedOptions::default()
    }
}

fn read_utf8(dir: &Utf8Path, kind: RecordKind) -> String {
    std::fs::read_to_string(dir.join(kind.file_name())).expect("read output file")
}

#[rstest]
fn creates_all_eight_files(temp_dir: TempDir) {
    let dir = out_dir(&temp_dir);
    let mut sink = DelimitedSink::create(&dir, DelimitedOptions::default()).expect("create sink");
    sink.release().expect("release sink");
    for kind in RecordKind::ALL {
        let path = dir.join(kind.file_name());
        assert!(path.is_file(), "{path} should exist");
        assert_eq!(std::fs::metadata(&path).expect("metadata").len(), 0);
    }
}

#[rstest]
fn writes_one_line_per_record(temp_dir: TempDir) {
    let dir = out_dir(&temp_dir);
    let mut sink = DelimitedSink::create(&dir, utf8()).expect("create sink");
    sink.persist_node(&Node {
        id: 1,
        lon: -0.12,
        lat: 51.0,
    })
    .expect("node");
    sink.persist_node_tag(&Tag {
        owner: 1,
        key: "name".into(),
        value: "café: central".into(),
    })
    .expect("tag");
    sink.persist_way_node(&WayNodeRef {
        way: 10,
        position: 2,
        reference: 1,
    })
    .expect("way node");
    sink.persist_relation_member(&RelationMember {
        relation: 20,
        position: 1,
        reference: 10,
        role: String::new(),
        member_type: MemberType::Way,
    })
    .expect("member");
    sink.release().expect("release sink");

    assert_eq!(read_utf8(&dir, RecordKind::Nodes), "1;-0.12;51.0\n");
    assert_eq!(read_utf8(&dir, RecordKind::NodeTags), "1;name;café: central\n");
    assert_eq!(read_utf8(&dir, RecordKind::WayNodes), "10;2;1\n");
    assert_eq!(read_utf8(&dir, RecordKind::RelationMembers), "20;1;10;;way\n");
    assert_eq!(read_utf8(&dir, RecordKind::Ways), "");
}

#[rstest]
fn default_encoding_is_utf16le_without_bom(temp_dir: TempDir) {
    let dir = out_dir(&temp_dir);
    let mut sink = DelimitedSink::create(&dir, DelimitedOptions::default()).expect("create sink");
    sink.persist_way(&Way { id: 7 }).expect("way");
    sink.release().expect("release sink");

    let bytes = std::fs::read(dir.join(RecordKind::Ways.file_name())).expect("read ways");
    assert_eq!(bytes, vec![b'7', 0, b'\n', 0]);
}

#[rstest]
fn custom_delimiter_joins_fields(temp_dir: TempDir) {
    let dir = out_dir(&temp_dir);
    let options = DelimitedOptions {
        delimiter: '|',
        encoding: TextEncoding::Utf8,
    };
    let mut sink = DelimitedSink::create(&dir, options).expect("create sink");
    sink.persist_way_tag(&Tag {
        owner: 3,
        key: "a;b".into(),
        value: "c".into(),
    })
    .expect("tag");
    sink.release().expect("release sink");
    assert_eq!(read_utf8(&dir, RecordKind::WayTags), "3|a;b|c\n");
}

#[rstest]
fn dropping_the_sink_flushes(temp_dir: TempDir) {
    let dir = out_dir(&temp_dir);
    {
        let mut sink = DelimitedSink::create(&dir, utf8()).expect("create sink");
        sink.persist_relation(&Relation { id: 5 }).expect("relation");
    }
    assert_eq!(read_utf8(&dir, RecordKind::Relations), "5\n");
}

#[rstest]
fn released_sink_rejects_records(temp_dir: TempDir) {
    let dir = out_dir(&temp_dir);
    let mut sink = DelimitedSink::create(&dir, utf8()).expect("create sink");
    sink.release().expect("first release");
    sink.release().expect("second release is a no-op");
    let err = sink.persist_way(&Way { id: 1 }).expect_err("released");
    assert!(matches!(
        err,
        DelimitedSinkError::Released {
            file: "osm_ways.csv"
        }
    ));
}

#[rstest]
fn rejects_a_file_in_place_of_the_directory(temp_dir: TempDir) {
    let dir = out_dir(&temp_dir);
    std::fs::write(&dir, b"not a directory").expect("write blocking file");
    let err = DelimitedSink::create(&dir, utf8()).expect_err("directory is a file");
    assert!(matches!(err, DelimitedSinkError::OpenDirectory { .. }));
}

struct Unprintable;

impl std::fmt::Display for Unprintable {
    fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Err(std::fmt::Error)
    }
}

#[rstest]
fn formatting_failures_are_write_errors(temp_dir: TempDir) {
    let dir = out_dir(&temp_dir);
    let mut sink = DelimitedSink::create(&dir, utf8()).expect("create sink");
    let err = sink
        .write_line(RecordKind::Ways, &[&1_i64, &Unprintable])
        .expect_err("field cannot be rendered");
    assert!(matches!(
        err,
        DelimitedSinkError::Write {
            file: "osm_ways.csv",
            ..
        }
    ));
    sink.persist_way(&Way { id: 2 }).expect("later records still written");
    sink.release().expect("release sink");
    assert_eq!(read_utf8(&dir, RecordKind::Ways), "2\n");
}
