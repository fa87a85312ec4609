#[path = "common/mod.rs"]
mod common;

use common::*;
use reddit_reduce::{ProjectFormat, RecordKind, RedditReduce, COMMENT_FIELDS, SUBMISSION_FIELDS};

/// Projecting raw comments to JSONL keeps exactly the 15 allow-listed fields, in
/// allow-list order, with `null` for fields the input lacks. Extra fields
/// (`gilded`, `stickied`, ...) are dropped.
#[test]
fn comments_jsonl_keeps_allow_list_in_order() {
    let (_tmp, folder) = make_dataset();
    let out = folder.join("sample_comments.jsonl");

    let stats = RedditReduce::new()
        .progress(false)
        .project(RecordKind::Comment, &folder.join("sample_comments"), &out, ProjectFormat::Jsonl)
        .unwrap();
    assert_eq!(stats.records, 6);

    let lines = read_lines(&out);
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with(
        r#"{"author":"alice","subreddit":"programming","link_id":"t3_p1","parent_id":"t3_x","score":3,"#
    ));
    assert!(lines[0].ends_with(r#""edited":false}"#));

    let values = read_jsonl_values(&out);
    for v in &values {
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), COMMENT_FIELDS.len());
        assert!(COMMENT_FIELDS.iter().all(|f| obj.contains_key(*f)));
        assert!(!obj.contains_key("gilded"));
        assert!(obj["author_flair_text"].is_null());
    }
    // dave's comment has no link_id.
    assert_eq!(values[5]["author"], "dave");
    assert!(values[5]["link_id"].is_null());
}

/// Numeric strings (older dumps store `created_utc` as text) are accepted and
/// re-emitted as numbers.
#[test]
fn submissions_jsonl_normalizes_numeric_strings() {
    let (_tmp, folder) = make_dataset();
    let out = folder.join("sample_submissions.jsonl");

    RedditReduce::new()
        .progress(false)
        .project(RecordKind::Submission, &folder.join("sample_submissions"), &out, ProjectFormat::Jsonl)
        .unwrap();

    let values = read_jsonl_values(&out);
    assert_eq!(values.len(), 5);
    assert_eq!(values[0]["created_utc"], 1136073600);
    assert_eq!(values[0]["id"], "p1");
    assert!(values[4]["author"].is_null());
    assert!(values[0]["media"].is_null());
    assert_eq!(values[0].as_object().unwrap().len(), SUBMISSION_FIELDS.len());
    assert!(!values[0].as_object().unwrap().contains_key("archived"));
}

/// TSV projection writes the allow-list as header, `NULL` for absent cells and
/// Python-style booleans.
#[test]
fn comments_tsv_header_and_null_cells() {
    let (_tmp, folder) = make_dataset();
    let out = folder.join("sample_comments.tsv");

    RedditReduce::new()
        .progress(false)
        .project(RecordKind::Comment, &folder.join("sample_comments"), &out, ProjectFormat::Tsv)
        .unwrap();

    let lines = read_lines(&out);
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], COMMENT_FIELDS.join("\t"));
    assert_eq!(
        lines[1],
        "alice\tprogramming\tt3_p1\tt3_x\t3\t3.0\t0.0\t1136074600\tbody of c1\tc1\tNULL\t0\tt5_x\t1136075600.0\tFalse"
    );
    let dave: Vec<&str> = lines[6].split('\t').collect();
    assert_eq!(dave[0], "dave");
    assert_eq!(dave[2], "NULL");
}

/// Cells containing the delimiter are quoted instead of breaking the row.
#[test]
fn tsv_quotes_cells_with_tabs() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("in.jsonl");
    write_lines(&input, &[r#"{"id":"c1","author":"alice","body":"left\tright"}"#.to_string()]);
    let out = tmp.path().join("out.tsv");

    RedditReduce::new()
        .progress(false)
        .project(RecordKind::Comment, &input, &out, ProjectFormat::Tsv)
        .unwrap();

    let lines = read_lines(&out);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("\"left\tright\""));

    let mut rdr = csv::ReaderBuilder::new().delimiter(b'\t').from_path(&out).unwrap();
    let row = rdr.records().next().unwrap().unwrap();
    assert_eq!(row.len(), COMMENT_FIELDS.len());
    assert_eq!(&row[8], "left\tright");
}

/// A malformed line aborts the run with the line number in the error; batches
/// written before it stay in the output.
#[test]
fn malformed_line_aborts_and_keeps_prefix() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("in.jsonl");
    write_lines(
        &input,
        &[
            comment("c1", Some("alice"), Some("t3_p1")),
            comment("c2", Some("bob"), Some("t3_p1")),
            "{not json".to_string(),
            comment("c3", Some("carol"), Some("t3_p2")),
        ],
    );
    let out = tmp.path().join("out.jsonl");

    let err = RedditReduce::new()
        .progress(false)
        .chunk_size(1)
        .project(RecordKind::Comment, &input, &out, ProjectFormat::Jsonl)
        .unwrap_err();
    assert!(format!("{err:#}").contains(":3: malformed comments record"));

    let kept = read_jsonl_values(&out);
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[1]["author"], "bob");
}

/// A field of the wrong type (text score) is a malformed record, not a sentinel.
#[test]
fn wrong_typed_field_is_malformed() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("in.jsonl");
    write_lines(&input, &[r#"{"id":"c1","author":"alice","score":"lots"}"#.to_string()]);

    let res = RedditReduce::new()
        .progress(false)
        .project(RecordKind::Comment, &input, &tmp.path().join("out.jsonl"), ProjectFormat::Jsonl);
    assert!(res.is_err());
}

/// `.zst` inputs are decoded transparently; blank lines are skipped.
#[test]
fn zst_input_is_decoded() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("RC_2006-01.zst");
    write_zst_lines(
        &input,
        &[comment("c1", Some("alice"), Some("t3_p1")), String::new(), comment("c2", Some("bob"), Some("t3_p2"))],
    );
    let out = tmp.path().join("out.jsonl");

    let stats = RedditReduce::new()
        .progress(false)
        .project(RecordKind::Comment, &input, &out, ProjectFormat::Jsonl)
        .unwrap();
    assert_eq!(stats.records, 2);
    let values = read_jsonl_values(&out);
    assert_eq!(values[0]["id"], "c1");
    assert_eq!(values[1]["id"], "c2");
}

#[test]
fn format_parses_from_cli_text() {
    assert_eq!("jsonl".parse::<ProjectFormat>(), Ok(ProjectFormat::Jsonl));
    assert_eq!("TSV".parse::<ProjectFormat>(), Ok(ProjectFormat::Tsv));
    assert!("csv".parse::<ProjectFormat>().is_err());
}
