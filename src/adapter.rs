//! Adapter orchestrator: one run from inputs to a JSONL file.
//!
//! ```text
//! explicit paths ─┐
//!                 ├──► open (gzip aware) ──► LineParser ──► EventFactory ──► JsonlWriter
//! discovery ──────┘                                                    └──► DiscoveryReport
//! ```
//!
//! Inputs are processed sequentially, in resolution order, by a single
//! writer. A bad input is noted and skipped; only failing to write the
//! output (or the report) ends the run early.

use edgelog_core::export::JsonlWriter;
use edgelog_core::{CandidateInput, EventFactory, InputSource, LineParser, SourceType};
use edgelog_discovery::{report_path_for, CommandRunner, DiscoveryEngine, DiscoveryReport};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// Where a run's inputs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inputs {
    /// Operator-named files. Discovery is not consulted and no report is
    /// written.
    Explicit(Vec<PathBuf>),
    Discover,
}

#[derive(Debug, Clone)]
pub struct AdapterRequest {
    pub source_type: SourceType,
    pub inputs: Inputs,
    /// Stamped on every event.
    pub asset: String,
    pub output: PathBuf,
}

/// What a finished run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub events: u64,
    /// Events that carry only `raw` (no structured fields).
    pub raw_only: u64,
    pub inputs_read: usize,
    /// Inputs that could not be opened or read to the end.
    pub unreadable: Vec<String>,
    /// Set when discovery ran.
    pub report: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("cannot write output {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write discovery report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// Input opening
// ---------------------------------------------------------------------------

/// Open `path` for line reading, transparently decompressing `.gz` files.
pub fn open_input(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz")) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Strip the line terminator (`\n` or `\r\n`) from a raw line.
fn chomp(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Per-run state threaded through every input.
struct Sink<W: Write> {
    source_type: SourceType,
    factory: EventFactory,
    writer: JsonlWriter<W>,
    raw_only: u64,
}

impl<W: Write> Sink<W> {
    /// Parse and write one line. Blank lines produce no event.
    fn emit(&mut self, parser: &mut dyn LineParser, line: &str) -> io::Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }
        let event = self
            .factory
            .normalize(self.source_type, line, parser.parse(line));
        if event.is_raw_only() {
            self.raw_only += 1;
        }
        self.writer.write_event(&event)
    }
}

/// Why one input stopped early.
enum InputFailure {
    /// Open or read failed; the input is skipped from that point.
    Read(io::Error),
    /// The output sink failed; the run cannot continue.
    Write(io::Error),
}

fn pump<W: Write>(sink: &mut Sink<W>, candidate: &CandidateInput) -> Result<(), InputFailure> {
    let mut parser = sink.source_type.parser();
    match &candidate.source {
        InputSource::Journal { lines, .. } => {
            for line in lines {
                sink.emit(parser.as_mut(), line).map_err(InputFailure::Write)?;
            }
        }
        InputSource::Path(path) => {
            let mut reader = open_input(path).map_err(InputFailure::Read)?;
            let mut buf = Vec::with_capacity(1024);
            loop {
                buf.clear();
                let n = reader.read_until(b'\n', &mut buf).map_err(InputFailure::Read)?;
                if n == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(chomp(&buf));
                sink.emit(parser.as_mut(), &line).map_err(InputFailure::Write)?;
            }
        }
    }
    Ok(())
}

/// Run one adapter: resolve inputs, normalise every line, write JSONL and
/// (when discovery ran) the discovery report next to it.
pub async fn run<R: CommandRunner>(
    req: AdapterRequest,
    engine: &DiscoveryEngine<R>,
) -> Result<RunSummary, AdapterError> {
    let (candidates, mut report): (Vec<CandidateInput>, Option<DiscoveryReport>) = match req.inputs {
        Inputs::Explicit(paths) => (
            paths
                .into_iter()
                .map(|p| CandidateInput::path(p, req.source_type))
                .collect(),
            None,
        ),
        Inputs::Discover => {
            let found = engine.discover(req.source_type).await;
            (found.candidates, Some(found.report))
        }
    };
    tracing::debug!(
        source_type = %req.source_type,
        inputs = candidates.len(),
        discovered = report.is_some(),
        "inputs resolved"
    );

    let output_err = |source| AdapterError::Output {
        path: req.output.clone(),
        source,
    };
    let writer = JsonlWriter::create(&req.output).map_err(output_err)?;
    let mut sink = Sink {
        source_type: req.source_type,
        factory: EventFactory::new(req.asset.clone()),
        writer,
        raw_only: 0,
    };
    let mut summary = RunSummary::default();

    for candidate in &candidates {
        let id = candidate.id();
        tracing::debug!(input = %id, "reading input");
        match pump(&mut sink, candidate) {
            Ok(()) => summary.inputs_read += 1,
            Err(InputFailure::Read(e)) => {
                tracing::warn!(input = %id, error = %e, "input unreadable, skipped");
                if let Some(report) = report.as_mut() {
                    report.record_unreadable(id.clone(), &e);
                }
                summary.unreadable.push(id);
            }
            Err(InputFailure::Write(e)) => return Err(output_err(e)),
        }
    }

    summary.events = sink.writer.written();
    summary.raw_only = sink.raw_only;
    sink.writer.finish().map_err(output_err)?;

    if let Some(report) = report {
        let path = report_path_for(&req.output);
        report.write(&path).map_err(|source| AdapterError::Report {
            path: path.clone(),
            source,
        })?;
        summary.report = Some(path);
    }

    tracing::info!(
        source_type = %req.source_type,
        events = summary.events,
        raw_only = summary.raw_only,
        inputs = summary.inputs_read,
        unreadable = summary.unreadable.len(),
        output = %req.output.display(),
        "run complete"
    );
    Ok(summary)
}
