use crate::aggregate::{
    count_authors, read_comment_counts, read_post_counts, write_comment_counts, write_post_counts, AuthorAggregate,
};
use crate::batch::BatchStats;
use crate::config::{AuthorFilter, DatasetPaths, RunOptions};
use crate::project::{project_file, ProjectFormat};
use crate::records::{Comment, RecordKind, Submission};
use crate::store::{LoadStats, RecordStore};
use crate::summary::{merge_aggregates, sort_summary, write_full_summary, write_lean_summary, SummaryOrder};
use crate::util::init_tracing_once;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Entry point for every reduction stage. Each stage is a separate, restartable
/// pass over its inputs; stages communicate only through files.
#[derive(Clone, Debug, Default)]
pub struct RedditReduce {
    pub(crate) opts: RunOptions,
}

impl RedditReduce {
    pub fn new() -> Self {
        Self { opts: RunOptions::default() }
    }

    // -------- Builder methods --------
    pub fn chunk_size(mut self, n: usize) -> Self { self.opts = self.opts.with_chunk_size(n); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn author_filter(mut self, filter: AuthorFilter) -> Self { self.opts = self.opts.with_author_filter(filter); self }
    pub fn low_memory_fraction(mut self, frac: f64) -> Self { self.opts = self.opts.with_low_memory_fraction(frac); self }
    pub fn io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self { self.opts = self.opts.with_io_buffers(read_bytes, write_bytes); self }

    pub fn options(&self) -> &RunOptions {
        &self.opts
    }

    // -------- Projection --------

    /// Keep the allow-listed fields of every `kind` record in `input`.
    pub fn project(&self, kind: RecordKind, input: &Path, output: &Path, format: ProjectFormat) -> Result<BatchStats> {
        init_tracing_once();
        match kind {
            RecordKind::Comment => project_file::<Comment>(input, output, format, &self.opts),
            RecordKind::Submission => project_file::<Submission>(input, output, format, &self.opts),
        }
    }

    // -------- In-memory per-author counts --------

    /// Per-author comment count and distinct `link_id` count, written as the
    /// comment-side partial TSV.
    pub fn count_comments(&self, input: &Path, out_tsv: &Path) -> Result<AuthorAggregate> {
        init_tracing_once();
        let agg = count_authors::<Comment>(input, &self.opts)?;
        write_comment_counts(&agg.rows(), out_tsv, self.opts.write_buffer_bytes)?;
        tracing::info!(authors = agg.len(), output = %out_tsv.display(), "comment counts written");
        Ok(agg)
    }

    /// Per-author submission count, written as the submission-side partial TSV.
    pub fn count_submissions(&self, input: &Path, out_tsv: &Path) -> Result<AuthorAggregate> {
        init_tracing_once();
        let agg = count_authors::<Submission>(input, &self.opts)?;
        write_post_counts(&agg.rows(), out_tsv, self.opts.write_buffer_bytes)?;
        tracing::info!(authors = agg.len(), output = %out_tsv.display(), "post counts written");
        Ok(agg)
    }

    // -------- SQLite loading --------

    pub fn load(&self, kind: RecordKind, input: &Path, db: &Path) -> Result<LoadStats> {
        init_tracing_once();
        let mut store = RecordStore::open(db)?;
        match kind {
            RecordKind::Comment => store.load_file::<Comment>(input, &self.opts),
            RecordKind::Submission => store.load_file::<Submission>(input, &self.opts),
        }
    }

    // -------- Summaries --------

    /// Lean summary from the two partial-count TSVs, most unique posts first.
    pub fn summarize_lean(&self, comment_counts: &Path, post_counts: &Path, output: &Path) -> Result<usize> {
        init_tracing_once();
        let comments = read_comment_counts(comment_counts)?;
        let posts = read_post_counts(post_counts)?;
        let mut rows = merge_aggregates(&comments, &posts);
        sort_summary(&mut rows, SummaryOrder::ByUniquePostsDesc);
        write_lean_summary(&rows, output, self.opts.write_buffer_bytes, self.opts.progress)?;
        Ok(rows.len())
    }

    /// Full summary from the comment and submission databases. The output lands in
    /// `paths.dir`, named after the two tables' row counts.
    pub fn summarize_from_db(&self, comments_db: &Path, submissions_db: &Path, paths: &DatasetPaths) -> Result<PathBuf> {
        init_tracing_once();
        for db in [comments_db, submissions_db] {
            anyhow::ensure!(db.exists(), "database {} does not exist", db.display());
        }
        let filter = self.opts.author_filter;

        let cstore = RecordStore::open(comments_db)?;
        let comments_total = cstore.row_count(RecordKind::Comment)?;
        let comments = cstore
            .author_stats(RecordKind::Comment, filter)
            .with_context(|| format!("aggregate comments in {}", comments_db.display()))?;
        drop(cstore);

        let pstore = RecordStore::open(submissions_db)?;
        let posts_total = pstore.row_count(RecordKind::Submission)?;
        let posts = pstore
            .author_stats(RecordKind::Submission, filter)
            .with_context(|| format!("aggregate posts in {}", submissions_db.display()))?;
        drop(pstore);

        let rows = merge_aggregates(&comments, &posts);
        let output = paths.db_summary_tsv(comments_total, posts_total);
        write_full_summary(&rows, &output, self.opts.write_buffer_bytes, self.opts.progress)?;
        Ok(output)
    }

    /// Full summary straight from the two projected JSONL files. The output lands in
    /// `paths.dir`, named after the record and user totals.
    pub fn summarize_from_jsonl(
        &self,
        comments_jsonl: &Path,
        submissions_jsonl: &Path,
        paths: &DatasetPaths,
    ) -> Result<PathBuf> {
        init_tracing_once();
        let comments = count_authors::<Comment>(comments_jsonl, &self.opts)?;
        let posts = count_authors::<Submission>(submissions_jsonl, &self.opts)?;

        let rows = merge_aggregates(&comments.rows(), &posts.rows());
        let output = paths.jsonl_summary_tsv(comments.records_seen(), posts.records_seen(), rows.len());
        write_full_summary(&rows, &output, self.opts.write_buffer_bytes, self.opts.progress)?;
        Ok(output)
    }
}
