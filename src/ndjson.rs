use crate::util::{create_with_backoff, open_with_backoff};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use zstd::stream::read::Decoder;

/// A `Read` wrapper that counts on-disk (compressed, for `.zst`) bytes read.
struct CountingReader<R: Read> {
    inner: R,
    counter: Arc<AtomicU64>,
}
impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

fn is_zst(path: &Path) -> bool {
    path.extension().map_or(false, |e| e.eq_ignore_ascii_case("zst"))
}

/// Minimal NDJSON reader with buffering, line numbering and transparent zstd
/// decoding for `*.zst` inputs.
pub struct NdjsonReader {
    rdr: Box<dyn BufRead>,
    consumed: Arc<AtomicU64>,
    line_no: u64,
}

impl NdjsonReader {
    pub fn open(path: &Path, buf_bytes: usize) -> Result<Self> {
        let f = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
        let consumed = Arc::new(AtomicU64::new(0));
        let counted = CountingReader { inner: f, counter: consumed.clone() };
        let cap = buf_bytes.max(8 * 1024);

        let rdr: Box<dyn BufRead> = if is_zst(path) {
            // window_log_max(31) avoids "Frame requires too much memory" on the large dump frames.
            let mut decoder = Decoder::new(counted).with_context(|| format!("zstd decoder for {}", path.display()))?;
            decoder.window_log_max(31)?;
            Box::new(BufReader::with_capacity(cap, decoder))
        } else {
            Box::new(BufReader::with_capacity(cap, counted))
        };
        Ok(Self { rdr, consumed, line_no: 0 })
    }

    /// Read the next line into `buf`. Returns the number of bytes read (0 on EOF).
    /// Strips trailing `\r?\n`. Empty or whitespace-only lines are returned as empty strings.
    pub fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        buf.clear();
        let n = self.rdr.read_line(buf)?;
        if n == 0 { return Ok(0); }
        self.line_no += 1;
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') { buf.pop(); }
        }
        if buf.trim().is_empty() { buf.clear(); }
        Ok(n)
    }

    /// 1-based number of the line most recently returned by `read_line`.
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    /// On-disk bytes pulled from the file so far (compressed bytes for `.zst`).
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed.load(Ordering::Relaxed)
    }
}

/// Minimal NDJSON writer with buffering and robust file creation.
pub struct NdjsonWriter {
    path: PathBuf,
    w: BufWriter<File>,
}

impl NdjsonWriter {
    pub fn create(path: &Path, buf_bytes: usize) -> Result<Self> {
        let f = create_with_backoff(path, 16, 50).with_context(|| format!("create {}", path.display()))?;
        Ok(Self { path: path.to_path_buf(), w: BufWriter::with_capacity(buf_bytes.max(8 * 1024), f) })
    }

    /// Serialize `value` as one compact JSON line.
    pub fn write_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.w, value)
            .with_context(|| format!("write {}", self.path.display()))?;
        self.w.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.w.flush().with_context(|| format!("flush {}", self.path.display()))
    }

    pub fn finish(mut self) -> Result<()> {
        self.flush()
    }
}
