//! Per-author aggregation over batched record streams.
//!
//! Implement `Aggregator` for your aggregation state and drive it with `aggregate_file`.
//! Every batch is ingested into a fresh partial state which is then merged into the
//! run total, so the chosen batch size never changes the result.
//!
//! `AuthorAggregate` is the stock implementation: per author, the number of records
//! and the exact set of distinct secondary keys (`link_id` for comments, `id` for
//! submissions). Partial-count TSV readers/writers live here as well.

use crate::batch::for_each_batch;
use crate::config::{AuthorFilter, RunOptions};
use crate::mem::LowMemoryWatch;
use crate::records::{Comment, Record, Submission};
use crate::util::{create_with_backoff, open_with_backoff};
use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub trait Aggregator<R> {
    fn ingest(&mut self, record: &R);
    fn merge(&mut self, other: Self);

    /// Number of tracked entries, used for memory diagnostics.
    fn tracked(&self) -> usize {
        0
    }
}

/// Grouping key and secondary key of a record.
pub trait Keyed {
    /// When true, records without a secondary key are skipped entirely.
    const SECONDARY_REQUIRED: bool;
    fn author(&self) -> Option<&str>;
    fn secondary_key(&self) -> Option<&str>;
}

impl Keyed for Comment {
    const SECONDARY_REQUIRED: bool = true;
    fn author(&self) -> Option<&str> { self.author.as_deref() }
    fn secondary_key(&self) -> Option<&str> { self.link_id.as_deref() }
}

// `id` is already unique per submission, so its distinct count mirrors the record count.
impl Keyed for Submission {
    const SECONDARY_REQUIRED: bool = false;
    fn author(&self) -> Option<&str> { self.author.as_deref() }
    fn secondary_key(&self) -> Option<&str> { self.id.as_deref() }
}

#[derive(Clone, Debug, Default)]
pub struct AuthorTally {
    pub count: u64,
    pub secondary: AHashSet<String>,
}

/// One output row of a per-author aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCounts {
    pub author: String,
    pub count: u64,
    pub distinct: u64,
}

impl AuthorCounts {
    pub fn new(author: impl Into<String>, count: u64, distinct: u64) -> Self {
        Self { author: author.into(), count, distinct }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AuthorAggregate {
    filter: AuthorFilter,
    tallies: AHashMap<String, AuthorTally>,
    records_seen: u64,
}

impl AuthorAggregate {
    pub fn new(filter: AuthorFilter) -> Self {
        Self { filter, ..Default::default() }
    }

    /// Count one record. Excluded authors (and, when required, records without a
    /// secondary key) still count towards `records_seen` but nothing else.
    pub fn record(&mut self, author: Option<&str>, secondary: Option<&str>, secondary_required: bool) {
        self.records_seen += 1;
        let Some(author) = self.filter.admit(author) else { return };
        if secondary_required && secondary.map_or(true, str::is_empty) {
            return;
        }
        // Lookup by &str first so repeat authors don't allocate.
        if !self.tallies.contains_key(author) {
            self.tallies.insert(author.to_string(), AuthorTally::default());
        }
        if let Some(tally) = self.tallies.get_mut(author) {
            tally.count += 1;
            if let Some(key) = secondary {
                if !tally.secondary.contains(key) {
                    tally.secondary.insert(key.to_string());
                }
            }
        }
    }

    /// Fold another aggregate into this one.
    pub fn absorb(&mut self, other: AuthorAggregate) {
        self.records_seen += other.records_seen;
        for (author, part) in other.tallies {
            let tally = self.tallies.entry(author).or_default();
            tally.count += part.count;
            tally.secondary.extend(part.secondary);
        }
    }

    /// All records parsed, excluded ones included.
    pub fn records_seen(&self) -> u64 {
        self.records_seen
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// `(count, distinct)` for `author`.
    pub fn get(&self, author: &str) -> Option<(u64, u64)> {
        self.tallies.get(author).map(|t| (t.count, t.secondary.len() as u64))
    }

    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.tallies.keys().map(String::as_str)
    }

    /// One row per author, sorted by author for reproducible output.
    pub fn rows(&self) -> Vec<AuthorCounts> {
        let mut rows: Vec<AuthorCounts> = self
            .tallies
            .iter()
            .map(|(a, t)| AuthorCounts::new(a.clone(), t.count, t.secondary.len() as u64))
            .collect();
        rows.sort_unstable_by(|a, b| a.author.cmp(&b.author));
        rows
    }
}

impl<R: Keyed> Aggregator<R> for AuthorAggregate {
    fn ingest(&mut self, record: &R) {
        self.record(record.author(), record.secondary_key(), R::SECONDARY_REQUIRED);
    }
    fn merge(&mut self, other: Self) {
        self.absorb(other);
    }
    fn tracked(&self) -> usize {
        self.tallies.len()
    }
}

/// Drive an aggregator over `path` batch by batch. `make` builds empty states
/// (the run total and one partial per batch).
pub fn aggregate_file<R, A, F>(path: &Path, opts: &RunOptions, make: F) -> Result<A>
where
    R: Record,
    A: Aggregator<R>,
    F: Fn() -> A,
{
    let mut total = make();
    let mut watch = LowMemoryWatch::new(opts.low_memory_fraction);
    for_each_batch::<R, _>(path, opts, |batch| {
        let mut part = make();
        for rec in &batch {
            part.ingest(rec);
        }
        total.merge(part);
        watch.check(total.tracked());
        Ok(())
    })?;
    Ok(total)
}

/// Per-author `(count, distinct secondary)` over one file, honouring `opts.author_filter`.
pub fn count_authors<R: Record + Keyed>(path: &Path, opts: &RunOptions) -> Result<AuthorAggregate> {
    let filter = opts.author_filter;
    let agg = aggregate_file::<R, AuthorAggregate, _>(path, opts, || AuthorAggregate::new(filter))?;
    tracing::info!(
        kind = R::KIND.label(),
        records = agg.records_seen(),
        authors = agg.len(),
        "per-author counts computed"
    );
    Ok(agg)
}

// ----------------------------- Partial-count TSVs ----------------------------------

#[derive(Serialize, Deserialize)]
struct CommentCountRow {
    #[serde(rename = "Author")]
    author: String,
    #[serde(rename = "Comment Count")]
    comments: u64,
    #[serde(rename = "Unique Posts")]
    unique_posts: u64,
}

#[derive(Serialize, Deserialize)]
struct PostCountRow {
    #[serde(rename = "Author")]
    author: String,
    #[serde(rename = "Post Count")]
    posts: u64,
}

fn tsv_writer(path: &Path, write_buf: usize) -> Result<csv::Writer<std::fs::File>> {
    let file = create_with_backoff(path, 16, 50).with_context(|| format!("create {}", path.display()))?;
    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .buffer_capacity(write_buf.max(8 * 1024))
        .from_writer(file))
}

fn tsv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let file = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    Ok(csv::ReaderBuilder::new().delimiter(b'\t').from_reader(file))
}

/// Comment side: `Author  Comment Count  Unique Posts`.
pub fn write_comment_counts(rows: &[AuthorCounts], path: &Path, write_buf: usize) -> Result<()> {
    let mut w = tsv_writer(path, write_buf)?;
    for r in rows {
        w.serialize(CommentCountRow { author: r.author.clone(), comments: r.count, unique_posts: r.distinct })
            .with_context(|| format!("write {}", path.display()))?;
    }
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// Submission side: `Author  Post Count`.
pub fn write_post_counts(rows: &[AuthorCounts], path: &Path, write_buf: usize) -> Result<()> {
    let mut w = tsv_writer(path, write_buf)?;
    for r in rows {
        w.serialize(PostCountRow { author: r.author.clone(), posts: r.count })
            .with_context(|| format!("write {}", path.display()))?;
    }
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

pub fn read_comment_counts(path: &Path) -> Result<Vec<AuthorCounts>> {
    let mut r = tsv_reader(path)?;
    let mut out = Vec::new();
    for (i, row) in r.deserialize::<CommentCountRow>().enumerate() {
        let row = row.with_context(|| format!("{}: bad row {}", path.display(), i + 2))?;
        out.push(AuthorCounts::new(row.author, row.comments, row.unique_posts));
    }
    Ok(out)
}

/// Post counts carry no distinct column; `distinct` mirrors `count`.
pub fn read_post_counts(path: &Path) -> Result<Vec<AuthorCounts>> {
    let mut r = tsv_reader(path)?;
    let mut out = Vec::new();
    for (i, row) in r.deserialize::<PostCountRow>().enumerate() {
        let row = row.with_context(|| format!("{}: bad row {}", path.display(), i + 2))?;
        out.push(AuthorCounts::new(row.author, row.posts, row.posts));
    }
    Ok(out)
}
