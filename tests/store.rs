#[path = "common/mod.rs"]
mod common;

use common::*;
use reddit_reduce::{
    count_authors, AuthorCounts, AuthorFilter, Comment, RecordKind, RecordStore, RedditReduce, RunOptions, Submission,
};

fn opts() -> RunOptions {
    RunOptions::default().with_progress(false).with_chunk_size(2)
}

/// Loading the same file twice leaves the table unchanged: the second pass reads
/// every record and inserts none.
#[test]
fn loading_twice_is_idempotent() {
    let (_tmp, folder) = make_dataset();
    let db = folder.join("sample_comments.db");
    let input = folder.join("sample_comments");
    let rr = RedditReduce::new().progress(false).chunk_size(2);

    let first = rr.load(RecordKind::Comment, &input, &db).unwrap();
    assert_eq!((first.read, first.inserted), (6, 6));

    let second = rr.load(RecordKind::Comment, &input, &db).unwrap();
    assert_eq!((second.read, second.inserted, second.ignored()), (6, 0, 6));

    let store = RecordStore::open(&db).unwrap();
    assert_eq!(store.row_count(RecordKind::Comment).unwrap(), 6);
    assert_eq!(store.row_count(RecordKind::Submission).unwrap(), 0);
}

/// Among records sharing an id, the first one written wins.
#[test]
fn first_write_wins_on_duplicate_id() {
    let mut store = RecordStore::open_in_memory().unwrap();
    let first = Comment {
        id: Some("c1".into()),
        author: Some("alice".into()),
        link_id: Some("t3_p1".into()),
        ..Default::default()
    };
    let dup = Comment { author: Some("mallory".into()), ..first.clone() };
    assert_eq!(store.insert_batch(&[first, dup]).unwrap(), 1);

    let stats = store.author_stats(RecordKind::Comment, AuthorFilter::KeepAll).unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].author, "alice");
}

/// Absent fields become sentinels: `unknown` for ids/names, -1 for numbers, ""
/// for free text, -1 for absent booleans. An absent author stays NULL.
#[test]
fn absent_fields_become_sentinels() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("s.jsonl");
    write_lines(&input, &[r#"{"title":"hello","is_self":true,"edited":1136075600}"#.to_string()]);
    let db = tmp.path().join("s.db");
    RedditReduce::new().progress(false).load(RecordKind::Submission, &input, &db).unwrap();

    let conn = rusqlite::Connection::open(&db).unwrap();
    let (id, author, media, score, ups, selftext, is_self, over_18, edited): (
        String,
        Option<String>,
        String,
        i64,
        f64,
        String,
        i64,
        i64,
        i64,
    ) = conn
        .query_row(
            "SELECT id, author, media, score, ups, selftext, is_self, over_18, edited FROM posts",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?, r.get(6)?, r.get(7)?, r.get(8)?)),
        )
        .unwrap();
    assert_eq!(id, "unknown");
    assert_eq!(author, None);
    assert_eq!(media, "unknown");
    assert_eq!(score, -1);
    assert_eq!(ups, -1.0);
    assert_eq!(selftext, "");
    assert_eq!(is_self, 1);
    assert_eq!(over_18, -1);
    assert_eq!(edited, 1136075600);
}

/// `edited: false` is stored as 0 in the comment table, `media` objects as compact JSON.
#[test]
fn edited_flag_and_media_encoding() {
    let tmp = tempfile::tempdir().unwrap();
    let db = tmp.path().join("x.db");
    let comments = tmp.path().join("c.jsonl");
    let posts = tmp.path().join("p.jsonl");
    write_lines(&comments, &[comment("c1", Some("alice"), Some("t3_p1"))]);
    write_lines(&posts, &[r#"{"id":"p1","author":"bob","media":{"type":"youtube.com"}}"#.to_string()]);

    let rr = RedditReduce::new().progress(false);
    rr.load(RecordKind::Comment, &comments, &db).unwrap();
    rr.load(RecordKind::Submission, &posts, &db).unwrap();

    let conn = rusqlite::Connection::open(&db).unwrap();
    let edited: i64 = conn.query_row("SELECT edited FROM comments", [], |r| r.get(0)).unwrap();
    let media: String = conn.query_row("SELECT media FROM posts", [], |r| r.get(0)).unwrap();
    assert_eq!(edited, 0);
    assert_eq!(media, r#"{"type":"youtube.com"}"#);
}

/// The SQL aggregation agrees with the in-memory one when deleted authors are
/// excluded: `[deleted]`, the absent author and comments without a post id drop out.
#[test]
fn sql_and_memory_aggregation_agree() {
    let (_tmp, folder) = make_dataset();
    let rr = RedditReduce::new().progress(false);
    let cdb = folder.join("sample_comments.db");
    let pdb = folder.join("sample_submissions.db");
    rr.load(RecordKind::Comment, &folder.join("sample_comments"), &cdb).unwrap();
    rr.load(RecordKind::Submission, &folder.join("sample_submissions"), &pdb).unwrap();

    let cstore = RecordStore::open(&cdb).unwrap();
    let pstore = RecordStore::open(&pdb).unwrap();
    let sql_c = cstore.author_stats(RecordKind::Comment, AuthorFilter::ExcludeDeleted).unwrap();
    let sql_p = pstore.author_stats(RecordKind::Submission, AuthorFilter::ExcludeDeleted).unwrap();

    let mem_c = count_authors::<Comment>(&folder.join("sample_comments"), &opts()).unwrap().rows();
    let mem_p = count_authors::<Submission>(&folder.join("sample_submissions"), &opts()).unwrap().rows();
    assert_eq!(sql_c, mem_c);
    assert_eq!(sql_p, mem_p);
}

/// `KeepAll` groups `[deleted]` as an author; rows without an author are still
/// never grouped.
#[test]
fn keep_all_groups_deleted_but_not_absent() {
    let (_tmp, folder) = make_dataset();
    let pdb = folder.join("sample_submissions.db");
    RedditReduce::new()
        .progress(false)
        .load(RecordKind::Submission, &folder.join("sample_submissions"), &pdb)
        .unwrap();

    let stats = RecordStore::open(&pdb).unwrap().author_stats(RecordKind::Submission, AuthorFilter::KeepAll).unwrap();
    assert_eq!(
        stats,
        vec![AuthorCounts::new("[deleted]", 1, 1), AuthorCounts::new("bob", 2, 2), AuthorCounts::new("carol", 1, 1)]
    );
    let mem = count_authors::<Submission>(
        &folder.join("sample_submissions"),
        &opts().with_author_filter(AuthorFilter::KeepAll),
    )
    .unwrap();
    assert_eq!(stats, mem.rows());
}

/// A user literally named `unknown`, commenting on a post whose id is literally
/// `unknown`, is a real user: both routes count them under either filter.
#[test]
fn user_named_unknown_is_counted() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("c.jsonl");
    write_lines(
        &input,
        &[
            comment("c1", Some("unknown"), Some("t3_p1")),
            comment("c2", Some("unknown"), Some("unknown")),
            comment("c3", None, Some("t3_p1")),
        ],
    );
    let db = tmp.path().join("c.db");
    RedditReduce::new().progress(false).load(RecordKind::Comment, &input, &db).unwrap();
    let store = RecordStore::open(&db).unwrap();

    for filter in [AuthorFilter::ExcludeDeleted, AuthorFilter::KeepAll] {
        let sql = store.author_stats(RecordKind::Comment, filter).unwrap();
        let mem = count_authors::<Comment>(&input, &opts().with_author_filter(filter)).unwrap().rows();
        assert_eq!(sql, vec![AuthorCounts::new("unknown", 2, 2)], "{filter:?}");
        assert_eq!(sql, mem, "{filter:?}");
    }
}

/// A failing batch does not roll back batches committed before it.
#[test]
fn committed_batches_survive_later_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("c.jsonl");
    write_lines(
        &input,
        &[
            comment("c1", Some("alice"), Some("t3_p1")),
            comment("c2", Some("alice"), Some("t3_p1")),
            "[1, 2".to_string(),
        ],
    );
    let db = tmp.path().join("c.db");
    let res = RedditReduce::new().progress(false).chunk_size(1).load(RecordKind::Comment, &input, &db);
    assert!(res.is_err());

    let store = RecordStore::open(&db).unwrap();
    assert_eq!(store.row_count(RecordKind::Comment).unwrap(), 2);
}
