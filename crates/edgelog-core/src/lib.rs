//! edgelog-core: event model, line parsers and JSONL export.
//!
//! # Architecture
//!
//! ```text
//! raw line ──► parsers::{web, alb, firewall, dns, syslog, app} ──► normalizer ──► export (JSONL)
//! ```
//!
//! Every layer degrades instead of failing: a line no parser understands is
//! still exported as a raw-only [`NormalizedEvent`].

pub mod config;
pub mod export;
pub mod normalizer;
pub mod parsers;
pub mod types;

pub use normalizer::EventFactory;
pub use parsers::{LineParser, ParsedLine};
pub use types::{CandidateInput, EventTime, Fields, InputSource, NormalizedEvent, SourceType, TimeSource};
