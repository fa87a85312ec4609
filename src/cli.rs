use clap::{Args as ClapArgs, Parser, Subcommand};
use reddit_reduce::{AuthorFilter, ProjectFormat, DEFAULT_CHUNK_SIZE};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "reddit-reduce", version, about = "Reduce Reddit comment/submission dumps to per-user activity summaries")]
pub struct Args {
    /// Records held in memory per batch.
    #[arg(long, alias = "chunk_size", default_value_t = DEFAULT_CHUNK_SIZE, global = true)]
    pub chunk_size: usize,

    #[arg(long, default_value_t = false, global = true)]
    pub no_progress: bool,

    /// Count `[deleted]` and absent authors instead of skipping them.
    #[arg(long, default_value_t = false, global = true)]
    pub keep_deleted: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn author_filter(&self) -> AuthorFilter {
        if self.keep_deleted { AuthorFilter::KeepAll } else { AuthorFilter::ExcludeDeleted }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Project raw comments onto the comment field list.
    FilterComments(FilterArgs),
    /// Project raw submissions onto the submission field list.
    FilterSubmissions(FilterArgs),
    /// Per-author comment counts into `<f>_user_comment_count.tsv`.
    CountComments(StageArgs),
    /// Per-author post counts into `<f>_user_post_count.tsv`.
    CountSubmissions(StageArgs),
    /// Load projected comments into `<f>_comments.db`.
    LoadComments(StageArgs),
    /// Load projected submissions into `<f>_submissions.db`.
    LoadSubmissions(StageArgs),
    /// Lean user summary from the two per-author count files.
    Summary(MergeArgs),
    /// Full user summary from the two SQLite databases.
    SummaryDb(MergeArgs),
    /// Full user summary straight from the two projected JSONL files.
    SummaryJsonl(MergeArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct FilterArgs {
    /// Dataset folder; files are named after its last path component.
    pub folder: PathBuf,

    #[arg(long, default_value = "jsonl")]
    pub format: ProjectFormat,

    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StageArgs {
    pub folder: PathBuf,

    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MergeArgs {
    pub folder: PathBuf,

    #[arg(long)]
    pub comments: Option<PathBuf>,

    #[arg(long)]
    pub submissions: Option<PathBuf>,

    /// Output file for `summary`; output directory for `summary-db` and `summary-jsonl`.
    #[arg(long)]
    pub output: Option<PathBuf>,
}
