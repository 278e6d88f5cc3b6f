//! Per-record entity extraction.
//!
//! Every record goes through two parsing stages: a strict, typed parse
//! against the kind's expected shape, and, on any structural failure, a
//! permissive fallback that reads the same fields directly with defensive
//! defaults. Both stages produce the same intermediate shape, so they are
//! independently testable and converge before kind-specific derivation.

mod extractor;
mod phases;
mod tables;
mod validated;

pub use extractor::*;
pub use tables::*;
