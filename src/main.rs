mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command, FilterArgs, MergeArgs, StageArgs};
use reddit_reduce::{DatasetPaths, RecordKind, RedditReduce};
use std::path::{Path, PathBuf};

fn or_default(over: Option<PathBuf>, default: &Path) -> PathBuf {
    over.unwrap_or_else(|| default.to_path_buf())
}

fn main() -> Result<()> {
    let args = Args::parse();
    reddit_reduce::init_tracing_once();

    let reduce = RedditReduce::new()
        .chunk_size(args.chunk_size)
        .progress(!args.no_progress)
        .author_filter(args.author_filter());

    match args.command {
        Command::FilterComments(a) => filter(&reduce, RecordKind::Comment, a)?,
        Command::FilterSubmissions(a) => filter(&reduce, RecordKind::Submission, a)?,

        Command::CountComments(StageArgs { folder, input, output }) => {
            let paths = DatasetPaths::for_folder(&folder);
            let out = or_default(output, &paths.comment_counts_tsv);
            let agg = reduce.count_comments(&or_default(input, &paths.comments_jsonl), &out)?;
            println!("Counted {} authors over {} comments -> {}", agg.len(), agg.records_seen(), out.display());
        }
        Command::CountSubmissions(StageArgs { folder, input, output }) => {
            let paths = DatasetPaths::for_folder(&folder);
            let out = or_default(output, &paths.post_counts_tsv);
            let agg = reduce.count_submissions(&or_default(input, &paths.submissions_jsonl), &out)?;
            println!("Counted {} authors over {} submissions -> {}", agg.len(), agg.records_seen(), out.display());
        }

        Command::LoadComments(a) => load(&reduce, RecordKind::Comment, a)?,
        Command::LoadSubmissions(a) => load(&reduce, RecordKind::Submission, a)?,

        Command::Summary(MergeArgs { folder, comments, submissions, output }) => {
            let paths = DatasetPaths::for_folder(&folder);
            let out = or_default(output, &paths.lean_summary_tsv);
            let users = reduce.summarize_lean(
                &or_default(comments, &paths.comment_counts_tsv),
                &or_default(submissions, &paths.post_counts_tsv),
                &out,
            )?;
            println!("Wrote {users} users -> {}", out.display());
        }
        Command::SummaryDb(MergeArgs { folder, comments, submissions, output }) => {
            let mut paths = DatasetPaths::for_folder(&folder);
            let comments = or_default(comments, &paths.comments_db);
            let submissions = or_default(submissions, &paths.submissions_db);
            if let Some(dir) = output { paths.dir = dir; }
            let out = reduce.summarize_from_db(&comments, &submissions, &paths)?;
            println!("Wrote {}", out.display());
        }
        Command::SummaryJsonl(MergeArgs { folder, comments, submissions, output }) => {
            let mut paths = DatasetPaths::for_folder(&folder);
            let comments = or_default(comments, &paths.comments_jsonl);
            let submissions = or_default(submissions, &paths.submissions_jsonl);
            if let Some(dir) = output { paths.dir = dir; }
            let out = reduce.summarize_from_jsonl(&comments, &submissions, &paths)?;
            println!("Wrote {}", out.display());
        }
    }

    Ok(())
}

fn filter(reduce: &RedditReduce, kind: RecordKind, a: FilterArgs) -> Result<()> {
    let paths = DatasetPaths::for_folder(&a.folder);
    let (raw, jsonl, tsv) = match kind {
        RecordKind::Comment => (&paths.raw_comments, &paths.comments_jsonl, &paths.comments_tsv),
        RecordKind::Submission => (&paths.raw_submissions, &paths.submissions_jsonl, &paths.submissions_tsv),
    };
    let default_out = match a.format {
        reddit_reduce::ProjectFormat::Jsonl => jsonl,
        reddit_reduce::ProjectFormat::Tsv => tsv,
    };
    let out = or_default(a.output, default_out);
    let stats = reduce.project(kind, &or_default(a.input, raw), &out, a.format)?;
    println!("Projected {} {} -> {}", stats.records, kind.label(), out.display());
    Ok(())
}

fn load(reduce: &RedditReduce, kind: RecordKind, a: StageArgs) -> Result<()> {
    let paths = DatasetPaths::for_folder(&a.folder);
    let (input, db) = match kind {
        RecordKind::Comment => (&paths.comments_jsonl, &paths.comments_db),
        RecordKind::Submission => (&paths.submissions_jsonl, &paths.submissions_db),
    };
    let db = or_default(a.output, db);
    let stats = reduce.load(kind, &or_default(a.input, input), &db)?;
    println!(
        "Loaded {} of {} {} into {} ({} duplicates ignored)",
        stats.inserted,
        stats.read,
        kind.label(),
        db.display(),
        stats.ignored()
    );
    Ok(())
}
