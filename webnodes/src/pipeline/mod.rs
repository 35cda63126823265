//! Per-item execution loop and failure policy.

mod failure_tolerance;

pub use failure_tolerance::{
    BatchReport, BatchSummary, FailureMode, FailureRecord, FailureTier, ItemLoop, ItemOutcome,
};
