//! Summary merging: full outer join of the comment-side and submission-side
//! per-author aggregates, zero-filled, written as the lean or the full user summary.

use crate::aggregate::AuthorCounts;
use crate::progress::ProgressScope;
use crate::util::create_with_backoff;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One merged row per author.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserSummary {
    pub author: String,
    pub comments: u64,
    pub comments_on_unique_posts: u64,
    pub posts: u64,
    pub posts_unique: u64,
}

/// Row order of a written summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryOrder {
    #[default]
    ByAuthor,
    /// `comments_on_unique_posts` descending; ties by author ascending.
    ByUniquePostsDesc,
}

/// Outer join on author; an author missing on one side gets zeros for that side.
/// Result is ordered by author.
pub fn merge_aggregates(comments: &[AuthorCounts], posts: &[AuthorCounts]) -> Vec<UserSummary> {
    let mut joined: BTreeMap<&str, UserSummary> = BTreeMap::new();
    for c in comments {
        let row = joined.entry(c.author.as_str()).or_default();
        row.comments += c.count;
        row.comments_on_unique_posts += c.distinct;
    }
    for p in posts {
        let row = joined.entry(p.author.as_str()).or_default();
        row.posts += p.count;
        row.posts_unique += p.distinct;
    }
    joined
        .into_iter()
        .map(|(author, mut row)| {
            row.author = author.to_string();
            row
        })
        .collect()
}

pub fn sort_summary(rows: &mut [UserSummary], order: SummaryOrder) {
    match order {
        SummaryOrder::ByAuthor => rows.sort_by(|a, b| a.author.cmp(&b.author)),
        SummaryOrder::ByUniquePostsDesc => rows.sort_by(|a, b| {
            b.comments_on_unique_posts
                .cmp(&a.comments_on_unique_posts)
                .then_with(|| a.author.cmp(&b.author))
        }),
    }
}

#[derive(Serialize)]
struct LeanRow<'a> {
    #[serde(rename = "Author")]
    author: &'a str,
    #[serde(rename = "#comments")]
    comments: u64,
    #[serde(rename = "#comments_on_unique_posts")]
    comments_on_unique_posts: u64,
    #[serde(rename = "#posts")]
    posts: u64,
}

#[derive(Serialize)]
struct FullRow<'a> {
    user: &'a str,
    num_comments: u64,
    num_comments_unique_posts: u64,
    num_posts: u64,
    num_posts_unique: u64,
}

fn write_rows<'a, T: Serialize>(
    path: &Path,
    write_buf: usize,
    rows: &'a [UserSummary],
    progress: bool,
    to_row: impl Fn(&'a UserSummary) -> T,
) -> Result<()> {
    let file = create_with_backoff(path, 16, 50).with_context(|| format!("create {}", path.display()))?;
    let mut w = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .buffer_capacity(write_buf.max(8 * 1024))
        .from_writer(file);
    let pb = progress.then(|| ProgressScope::count("Writing user summary", rows.len() as u64));
    for row in rows {
        w.serialize(to_row(row)).with_context(|| format!("write {}", path.display()))?;
        if let Some(pb) = &pb { pb.inc(1); }
    }
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    if let Some(pb) = pb { pb.finish(format!("{} users", rows.len())); }
    tracing::info!(rows = rows.len(), output = %path.display(), "user summary written");
    Ok(())
}

/// `Author  #comments  #comments_on_unique_posts  #posts`
pub fn write_lean_summary(rows: &[UserSummary], path: &Path, write_buf: usize, progress: bool) -> Result<()> {
    write_rows(path, write_buf, rows, progress, |r| LeanRow {
        author: &r.author,
        comments: r.comments,
        comments_on_unique_posts: r.comments_on_unique_posts,
        posts: r.posts,
    })
}

/// `user  num_comments  num_comments_unique_posts  num_posts  num_posts_unique`
pub fn write_full_summary(rows: &[UserSummary], path: &Path, write_buf: usize, progress: bool) -> Result<()> {
    write_rows(path, write_buf, rows, progress, |r| FullRow {
        user: &r.author,
        num_comments: r.comments,
        num_comments_unique_posts: r.comments_on_unique_posts,
        num_posts: r.posts,
        num_posts_unique: r.posts_unique,
    })
}
