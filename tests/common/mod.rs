//! Shared test utilities for edgelog integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Nothing here spawns real processes: discovery commands
//! go through [`FakeRunner`].

pub mod assertions;
pub mod builders;
pub mod fake_runner;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fake_runner::*;
pub use fixtures::*;
