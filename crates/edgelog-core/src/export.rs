//! Export: newline-delimited JSON output.
//!
//! One [`NormalizedEvent`] per line, UTF-8, written in the order events are
//! handed in. [`merge_jsonl`] concatenates several outputs into one.

use crate::types::NormalizedEvent;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Single-writer JSONL sink.
pub struct JsonlWriter<W: Write> {
    out: W,
    written: u64,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn write_event(&mut self, event: &NormalizedEvent) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Number of events written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl JsonlWriter<BufWriter<File>> {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

/// Concatenate JSONL files into `out_path`, in order. Missing inputs and
/// blank lines are skipped. Returns the number of lines written.
pub fn merge_jsonl(out_path: &Path, inputs: &[impl AsRef<Path>]) -> io::Result<u64> {
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(out_path)?);
    let mut n = 0;

    for input in inputs {
        let input = input.as_ref();
        let file = match File::open(input) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %input.display(), "merge input missing, skipped");
                continue;
            }
            Err(e) => return Err(e),
        };
        for line in BufReader::new(file).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
            n += 1;
        }
    }

    out.flush()?;
    Ok(n)
}
