//! edgelog: edge event adapters.
//!
//! Normalises web access logs, load-balancer access logs, firewall/flow logs,
//! resolver query logs, syslog and application logs into one JSONL event
//! stream for triage. When the operator does not
//! name inputs, they are discovered on the host.
//!
//! # Architecture
//!
//! ```text
//! edgelog-discovery ──► adapter ──► edgelog-core (parsers, normalizer, export)
//! ```
//!
//! The binary is a thin clap front-end over [`adapter::run`] and
//! [`edgelog_core::export::merge_jsonl`].

pub mod adapter;

pub use adapter::{run, AdapterError, AdapterRequest, Inputs, RunSummary};
pub use edgelog_core::{NormalizedEvent, SourceType};
pub use edgelog_discovery::DiscoveryEngine;
