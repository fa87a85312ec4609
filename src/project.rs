//! Field projection: stream raw records, keep the per-kind allow-list in fixed order,
//! and write JSONL (`null` for absent fields) or TSV (`NULL` for absent fields).

use crate::batch::{for_each_batch, BatchStats};
use crate::config::RunOptions;
use crate::ndjson::NdjsonWriter;
use crate::records::{Record, TSV_NULL};
use crate::util::create_with_backoff;
use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;

/// Output format of a projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectFormat {
    Jsonl,
    Tsv,
}

impl ProjectFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ProjectFormat::Jsonl => "jsonl",
            ProjectFormat::Tsv => "tsv",
        }
    }
}

impl FromStr for ProjectFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "ndjson" => Ok(ProjectFormat::Jsonl),
            "tsv" => Ok(ProjectFormat::Tsv),
            other => Err(format!("unknown projection format '{other}' (expected jsonl or tsv)")),
        }
    }
}

/// Project every record of `input` into `output`.
///
/// Output is written batch by batch; if a later batch fails to parse, the batches
/// already written are flushed and left in place before the error is returned.
pub fn project_file<R: Record>(
    input: &Path,
    output: &Path,
    format: ProjectFormat,
    opts: &RunOptions,
) -> Result<BatchStats> {
    let stats = match format {
        ProjectFormat::Jsonl => project_jsonl::<R>(input, output, opts)?,
        ProjectFormat::Tsv => project_tsv::<R>(input, output, opts)?,
    };
    tracing::info!(
        kind = R::KIND.label(),
        records = stats.records,
        output = %output.display(),
        "projection written"
    );
    Ok(stats)
}

fn project_jsonl<R: Record>(input: &Path, output: &Path, opts: &RunOptions) -> Result<BatchStats> {
    let mut w = NdjsonWriter::create(output, opts.write_buffer_bytes)?;
    let res = for_each_batch::<R, _>(input, opts, |batch| {
        for rec in &batch {
            w.write_json(rec)?;
        }
        Ok(())
    });
    let flushed = w.finish();
    let stats = res?;
    flushed?;
    Ok(stats)
}

fn project_tsv<R: Record>(input: &Path, output: &Path, opts: &RunOptions) -> Result<BatchStats> {
    let file = create_with_backoff(output, 16, 50).with_context(|| format!("create {}", output.display()))?;
    let mut w = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .buffer_capacity(opts.write_buffer_bytes.max(8 * 1024))
        .from_writer(file);
    w.write_record(R::KIND.fields())
        .with_context(|| format!("write header {}", output.display()))?;

    let res = for_each_batch::<R, _>(input, opts, |batch| {
        for rec in &batch {
            let cells = rec.cells();
            w.write_record(cells.iter().map(|c| c.as_deref().unwrap_or(TSV_NULL)))
                .with_context(|| format!("write {}", output.display()))?;
        }
        Ok(())
    });
    let flushed = w.flush().with_context(|| format!("flush {}", output.display()));
    let stats = res?;
    flushed?;
    Ok(stats)
}
