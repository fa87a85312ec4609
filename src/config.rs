use crate::records::DELETED_AUTHOR;
use std::path::{Path, PathBuf};

/// Which authors take part in per-author aggregation.
///
/// One switch shared by every aggregation path (in-memory counts, SQL counts and
/// the JSONL summary), so the paths always agree on who is counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthorFilter {
    /// Skip absent/empty authors and `[deleted]`.
    #[default]
    ExcludeDeleted,
    /// Count every present author value as-is, `[deleted]` included.
    KeepAll,
}

impl AuthorFilter {
    /// Returns the author key to aggregate under, or `None` to skip the record.
    pub fn admit<'a>(&self, author: Option<&'a str>) -> Option<&'a str> {
        match self {
            AuthorFilter::ExcludeDeleted => author.filter(|a| !a.is_empty() && *a != DELETED_AUTHOR),
            AuthorFilter::KeepAll => author,
        }
    }
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub chunk_size: usize,            // records resident per batch
    pub progress: bool,               // show progress bar
    pub progress_label: Option<String>,
    pub author_filter: AuthorFilter,
    pub low_memory_fraction: f64,     // warn when available/total RAM drops below this

    // IO tuning
    pub read_buffer_bytes: usize,     // BufReader capacity
    pub write_buffer_bytes: usize,    // BufWriter capacity
}

pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress: true,
            progress_label: None,
            author_filter: AuthorFilter::default(),
            low_memory_fraction: 0.10,
            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl RunOptions {
    pub fn with_chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_author_filter(mut self, filter: AuthorFilter) -> Self {
        self.author_filter = filter;
        self
    }
    pub fn with_low_memory_fraction(mut self, frac: f64) -> Self {
        self.low_memory_fraction = frac.clamp(0.0, 1.0);
        self
    }

    // IO buffers tuning
    pub fn with_io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self {
        self.read_buffer_bytes = read_bytes.max(8 * 1024);
        self.write_buffer_bytes = write_bytes.max(8 * 1024);
        self
    }
}

/// Every input and output location used by the reducers for one dataset.
///
/// `for_folder` fills in the conventional layout (`<dir>/<name>_comments.jsonl`, ...),
/// where `<name>` is the folder's last path component; each field can then be
/// replaced individually.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetPaths {
    pub dir: PathBuf,
    pub raw_comments: PathBuf,
    pub raw_submissions: PathBuf,
    pub comments_jsonl: PathBuf,
    pub submissions_jsonl: PathBuf,
    pub comments_tsv: PathBuf,
    pub submissions_tsv: PathBuf,
    pub comments_db: PathBuf,
    pub submissions_db: PathBuf,
    pub comment_counts_tsv: PathBuf,
    pub post_counts_tsv: PathBuf,
    pub lean_summary_tsv: PathBuf,
}

impl DatasetPaths {
    pub fn for_folder(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let name = dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        let file = |suffix: &str| dir.join(format!("{name}{suffix}"));

        Self {
            raw_comments: file("_comments"),
            raw_submissions: file("_submissions"),
            comments_jsonl: file("_comments.jsonl"),
            submissions_jsonl: file("_submissions.jsonl"),
            comments_tsv: file("_comments.tsv"),
            submissions_tsv: file("_submissions.tsv"),
            comments_db: file("_comments.db"),
            submissions_db: file("_submissions.db"),
            comment_counts_tsv: file("_user_comment_count.tsv"),
            post_counts_tsv: file("_user_post_count.tsv"),
            lean_summary_tsv: file("_user_summary_lean.tsv"),
            dir,
        }
    }

    /// `user_summary_{C}comments_{P}posts.tsv` in the dataset folder.
    pub fn db_summary_tsv(&self, comments_total: u64, posts_total: u64) -> PathBuf {
        self.dir.join(format!("user_summary_{comments_total}comments_{posts_total}posts.tsv"))
    }

    /// `user_summary_{C}comments_{P}posts_{U}users.tsv` in the dataset folder.
    pub fn jsonl_summary_tsv(&self, comments_total: u64, posts_total: u64, users: usize) -> PathBuf {
        self.dir.join(format!(
            "user_summary_{comments_total}comments_{posts_total}posts_{users}users.tsv"
        ))
    }
}
