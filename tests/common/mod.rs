#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write plain JSONL lines to `path`.
pub fn write_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(&mut f, "{}", l).unwrap();
    }
}

/// Write a compressed `.zst` file containing the provided JSONL lines.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Read a JSONL file into a vector of `serde_json::Value` (skips empty lines).
pub fn read_jsonl_values(path: &Path) -> Vec<Value> {
    read_lines(path).iter().map(|s| serde_json::from_str(s).unwrap()).collect()
}

/// Read a text file line-by-line into strings (useful for .jsonl, .tsv).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}

/// A comment line with a handful of fields the projection must drop.
pub fn comment(id: &str, author: Option<&str>, link_id: Option<&str>) -> String {
    let mut v = json!({
        "id": id, "subreddit": "programming", "parent_id": "t3_x", "score": 3,
        "ups": 3, "downs": 0, "created_utc": 1136074600, "body": format!("body of {id}"),
        "controversiality": 0, "subreddit_id": "t5_x", "retrieved_on": 1136075600,
        "edited": false, "gilded": 0, "stickied": false, "distinguished": null
    });
    if let Some(a) = author { v["author"] = json!(a); }
    if let Some(l) = link_id { v["link_id"] = json!(l); }
    v.to_string()
}

/// A submission line with a handful of fields the projection must drop.
pub fn submission(id: &str, author: Option<&str>) -> String {
    let mut v = json!({
        "id": id, "subreddit": "programming", "subreddit_id": "t5_x", "title": format!("title {id}"),
        "selftext": "", "url": "http://example.com/x", "permalink": format!("/r/programming/{id}"),
        "created_utc": "1136073600", "score": 10, "num_comments": 2, "ups": 10, "downs": 0,
        "is_self": false, "domain": "example.com", "over_18": false, "media": null,
        "edited": false, "stickied": false, "archived": false, "is_video": false
    });
    if let Some(a) = author { v["author"] = json!(a); }
    v.to_string()
}

/// Build a dataset folder `<tmp>/sample` holding raw `sample_comments` and
/// `sample_submissions` files:
/// - comments: alice x3 (on p1, p1, p2), carol x1 (on p3), `[deleted]` x1 (on p1),
///   dave x1 without `link_id`
/// - submissions: bob x2 (p1, p2), carol x1 (p3), `[deleted]` x1 (p4), one without author (p5)
///
/// With deleted authors excluded the expected per-user summary is
/// `alice 3 2 0 0`, `bob 0 0 2 2`, `carol 1 1 1 1`.
pub fn make_dataset() -> (TempDir, PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let folder = tmp.path().join("sample");

    let comments = vec![
        comment("c1", Some("alice"), Some("t3_p1")),
        comment("c2", Some("alice"), Some("t3_p1")),
        comment("c3", Some("alice"), Some("t3_p2")),
        comment("c4", Some("carol"), Some("t3_p3")),
        comment("c5", Some("[deleted]"), Some("t3_p1")),
        comment("c6", Some("dave"), None),
    ];
    write_lines(&folder.join("sample_comments"), &comments);

    let submissions = vec![
        submission("p1", Some("bob")),
        submission("p2", Some("bob")),
        submission("p3", Some("carol")),
        submission("p4", Some("[deleted]")),
        submission("p5", None),
    ];
    write_lines(&folder.join("sample_submissions"), &submissions);

    (tmp, folder)
}
