//! Shared DTOs for the pwpatch workspace.
//!
//! # Design constraints
//! - Report types are serialized to disk (`--report`).
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod outcome;
pub mod path;
pub mod report;

/// Schema identifiers.
pub mod schema {
    pub const PWPATCH_REPORT_V1: &str = "pwpatch.report.v1";
}
