//! Fixed-size batch streaming of typed records from a JSONL (or `.jsonl.zst`) file.
//!
//! At most `chunk_size` parsed records are resident at a time. A line that does not
//! parse as a record of the requested kind aborts the whole pass; batches already
//! handed to the callback stay handed over (no rollback).

use crate::config::RunOptions;
use crate::ndjson::NdjsonReader;
use crate::progress::ProgressScope;
use crate::records::{parse_record, Record};
use anyhow::{Context, Result};
use std::path::Path;

/// Totals for one batched pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub records: u64,
    pub batches: u64,
}

/// Stream `path` in batches of up to `opts.chunk_size` records of kind `R`,
/// preserving input order. Blank lines are skipped.
pub fn for_each_batch<R, F>(path: &Path, opts: &RunOptions, mut on_batch: F) -> Result<BatchStats>
where
    R: Record,
    F: FnMut(Vec<R>) -> Result<()>,
{
    let chunk = opts.chunk_size.max(1);
    let mut rdr = NdjsonReader::open(path, opts.read_buffer_bytes)?;
    let label = opts.progress_label.clone().unwrap_or_else(|| format!("Reading {}", R::KIND.label()));
    let pb = ProgressScope::for_file(opts.progress, &label, path);

    let mut stats = BatchStats::default();
    let mut batch: Vec<R> = Vec::with_capacity(chunk.min(64 * 1024));
    let mut buf = String::with_capacity(16 * 1024);
    let mut reported = 0u64;

    let mut flush = |batch: &mut Vec<R>, stats: &mut BatchStats| -> Result<()> {
        if batch.is_empty() { return Ok(()); }
        stats.records += batch.len() as u64;
        stats.batches += 1;
        on_batch(std::mem::replace(batch, Vec::with_capacity(chunk.min(64 * 1024))))
    };

    loop {
        let n = rdr
            .read_line(&mut buf)
            .with_context(|| format!("read {} near line {}", path.display(), rdr.line_no() + 1))?;
        if n == 0 { break; }
        if buf.is_empty() { continue; }

        let rec: R = parse_record(&buf).with_context(|| {
            format!("{}:{}: malformed {} record", path.display(), rdr.line_no(), R::KIND.label())
        })?;
        batch.push(rec);

        if batch.len() >= chunk {
            flush(&mut batch, &mut stats)?;
            if let Some(pb) = &pb {
                let cur = rdr.bytes_consumed();
                pb.inc(cur.saturating_sub(reported));
                reported = cur;
            }
        }
    }
    flush(&mut batch, &mut stats)?;

    if let Some(pb) = &pb {
        pb.inc(rdr.bytes_consumed().saturating_sub(reported));
        pb.finish(format!("{} {} in {} batches", stats.records, R::KIND.label(), stats.batches));
    }
    tracing::debug!(path = %path.display(), records = stats.records, batches = stats.batches, "batched pass done");
    Ok(stats)
}
