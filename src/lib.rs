mod config;
mod records;
mod util;
mod mem;
mod progress;

mod ndjson;
mod batch;
mod project;
mod aggregate;
mod store;
mod summary;
mod pipeline;

pub use crate::config::{AuthorFilter, DatasetPaths, RunOptions, DEFAULT_CHUNK_SIZE};
pub use crate::pipeline::RedditReduce;

pub use crate::records::{
    parse_record, Comment, Edited, Record, RecordKind, Submission, COMMENT_FIELDS, DELETED_AUTHOR, MISSING_FLOAT,
    MISSING_INT, SUBMISSION_FIELDS, TSV_NULL, UNKNOWN,
};

// Streaming building blocks, for callers that want their own stages.
pub use crate::batch::{for_each_batch, BatchStats};
pub use crate::project::{project_file, ProjectFormat};
pub use crate::aggregate::{
    aggregate_file, count_authors, read_comment_counts, read_post_counts, write_comment_counts, write_post_counts,
    Aggregator, AuthorAggregate, AuthorCounts, Keyed,
};
pub use crate::store::{LoadStats, Loadable, RecordStore};
pub use crate::summary::{
    merge_aggregates, sort_summary, write_full_summary, write_lean_summary, SummaryOrder, UserSummary,
};

// Expose progress helpers to the binary.
pub use crate::progress::{make_count_progress, make_progress_bar_labeled, ProgressScope};

pub use crate::ndjson::{NdjsonReader, NdjsonWriter};
pub use crate::util::{create_with_backoff, init_tracing_once, open_with_backoff};
