//! Failure tolerance for the per-item loop.
//!
//! Items run strictly in index order. Failures come in two tiers:
//!
//! - **hard**: returned as `Err` by the item handler. Under
//!   [`FailureMode::FailFast`] they abort the batch; under
//!   [`FailureMode::ContinueOnFailure`] they become an error envelope.
//! - **soft**: already recovered by the handler and reported as
//!   [`ItemOutcome::SoftFailure`]. They never abort, whatever the mode.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::core::ResultEnvelope;
use crate::errors::{BatchError, NodeError};
use crate::observability::NodeSpanAttributes;

/// How to handle hard item failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FailureMode {
    /// Stop the batch on the first hard failure (default).
    #[default]
    FailFast,
    /// Record an error envelope and move on to the next item.
    ContinueOnFailure,
}

impl FailureMode {
    /// Maps the host's continue-on-fail flag.
    #[must_use]
    pub fn from_continue_on_fail(enabled: bool) -> Self {
        if enabled {
            Self::ContinueOnFailure
        } else {
            Self::FailFast
        }
    }
}

/// Severity tier of an item failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureTier {
    /// Subject to the failure mode.
    Hard,
    /// Always recovered inside a success envelope.
    Soft,
}

/// What an item handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// The item completed normally.
    Completed(ResultEnvelope),
    /// The item failed but the handler reported it inside the envelope.
    SoftFailure {
        /// The envelope describing the failure.
        envelope: ResultEnvelope,
        /// The failure message.
        error: String,
    },
}

impl ItemOutcome {
    /// The envelope for this item.
    #[must_use]
    pub fn envelope(&self) -> &ResultEnvelope {
        match self {
            Self::Completed(envelope) | Self::SoftFailure { envelope, .. } => envelope,
        }
    }
}

/// Record of one item failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Index of the failed item.
    pub index: usize,
    /// Error message.
    pub error: String,
    /// Error type name.
    pub error_type: String,
    /// Failure tier.
    pub tier: FailureTier,
}

impl FailureRecord {
    fn hard(index: usize, error: &NodeError) -> Self {
        Self {
            index,
            error: error.to_string(),
            error_type: error.kind().to_string(),
            tier: FailureTier::Hard,
        }
    }

    fn soft(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            error: error.into(),
            error_type: "TransportError".to_string(),
            tier: FailureTier::Soft,
        }
    }
}

/// Summary of a completed batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of input items.
    pub total: usize,
    /// Items that completed without any failure.
    pub succeeded: usize,
    /// Items whose failure was recovered (soft, or hard under continue-on-fail).
    pub recovered: usize,
    /// Every failure, in item order.
    pub failures: Vec<FailureRecord>,
}

impl BatchSummary {
    /// Returns true if any item failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Fraction of items that completed without failure.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.total as f64
    }
}

/// Output of a batch that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// One envelope per input item, in input order.
    pub envelopes: Vec<ResultEnvelope>,
    /// Counts and failure records.
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Discards the summary.
    #[must_use]
    pub fn into_envelopes(self) -> Vec<ResultEnvelope> {
        self.envelopes
    }
}

/// Runs an item handler over a batch in index order.
#[derive(Debug, Clone)]
pub struct ItemLoop {
    node: String,
    mode: FailureMode,
    execution_id: Uuid,
}

impl ItemLoop {
    /// Creates a loop for the named node.
    #[must_use]
    pub fn new(node: impl Into<String>, mode: FailureMode) -> Self {
        Self {
            node: node.into(),
            mode,
            execution_id: Uuid::new_v4(),
        }
    }

    /// The failure mode.
    #[must_use]
    pub fn mode(&self) -> FailureMode {
        self.mode
    }

    /// Identifier attached to every item span of this batch.
    #[must_use]
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// Attributes of the span wrapping item `index`.
    #[must_use]
    pub fn span_attributes(&self, index: usize) -> NodeSpanAttributes {
        NodeSpanAttributes::new(self.node.as_str(), self.execution_id, index)
    }

    /// Runs `handler` for every index in `0..item_count`.
    ///
    /// The handler for item `i + 1` is not started until item `i` has an
    /// outcome.
    pub async fn run<F, Fut>(&self, item_count: usize, mut handler: F) -> Result<BatchReport, BatchError>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<ItemOutcome, NodeError>>,
    {
        let mut envelopes = Vec::with_capacity(item_count);
        let mut summary = BatchSummary {
            total: item_count,
            ..Default::default()
        };

        for index in 0..item_count {
            let attrs = self.span_attributes(index);
            let span = info_span!(
                "node.item",
                node = %attrs.node,
                index = attrs.index,
                execution_id = %attrs.execution_id,
            );

            match handler(index).instrument(span).await {
                Ok(ItemOutcome::Completed(envelope)) => {
                    summary.succeeded += 1;
                    envelopes.push(envelope);
                }
                Ok(ItemOutcome::SoftFailure { envelope, error }) => {
                    warn!(node = %self.node, index, error = %error, "Item failed softly");
                    summary.failures.push(FailureRecord::soft(index, error));
                    summary.recovered += 1;
                    envelopes.push(envelope);
                }
                Err(error) => {
                    summary.failures.push(FailureRecord::hard(index, &error));
                    match self.mode {
                        FailureMode::ContinueOnFailure => {
                            warn!(
                                node = %self.node,
                                index,
                                error_type = error.kind(),
                                error = %error,
                                "Item failed, continuing"
                            );
                            summary.recovered += 1;
                            envelopes.push(ResultEnvelope::failure(index, &error));
                        }
                        FailureMode::FailFast => {
                            warn!(
                                node = %self.node,
                                index,
                                error_type = error.kind(),
                                error = %error,
                                "Item failed, aborting batch"
                            );
                            return Err(BatchError::new(index, error, envelopes));
                        }
                    }
                }
            }
        }

        info!(
            node = %self.node,
            execution_id = %self.execution_id,
            total = summary.total,
            succeeded = summary.succeeded,
            recovered = summary.recovered,
            "Batch finished"
        );

        Ok(BatchReport { envelopes, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationError;

    fn ok_envelope(index: usize) -> ResultEnvelope {
        ResultEnvelope::success(index, "test", &serde_json::json!({"value": index})).unwrap()
    }

    async fn handler(index: usize) -> Result<ItemOutcome, NodeError> {
        match index {
            1 => Err(ValidationError::new("Query parameter is required").into()),
            3 => Ok(ItemOutcome::SoftFailure {
                envelope: ok_envelope(index),
                error: "Network error".to_string(),
            }),
            _ => Ok(ItemOutcome::Completed(ok_envelope(index))),
        }
    }

    #[test]
    fn test_failure_mode_default() {
        assert_eq!(FailureMode::default(), FailureMode::FailFast);
        assert_eq!(
            FailureMode::from_continue_on_fail(true),
            FailureMode::ContinueOnFailure
        );
        assert_eq!(FailureMode::from_continue_on_fail(false), FailureMode::FailFast);
    }

    #[test]
    fn test_continue_on_failure_keeps_pairing() {
        let item_loop = ItemLoop::new("test", FailureMode::ContinueOnFailure);
        let report = tokio_test::block_on(item_loop.run(4, handler)).unwrap();

        let indices: Vec<usize> = report.envelopes.iter().map(ResultEnvelope::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);

        assert!(report.envelopes[0].is_success());
        assert!(!report.envelopes[1].is_success());
        assert_eq!(report.envelopes[1].error(), Some("Query parameter is required"));
        assert!(report.envelopes[2].is_success());
        assert!(report.envelopes[3].is_success());

        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.succeeded, 2);
        assert_eq!(report.summary.recovered, 2);
        assert_eq!(report.summary.failures.len(), 2);
        assert_eq!(report.summary.failures[0].tier, FailureTier::Hard);
        assert_eq!(report.summary.failures[0].error_type, "ValidationError");
        assert_eq!(report.summary.failures[1].tier, FailureTier::Soft);
    }

    #[test]
    fn test_fail_fast_keeps_completed_items() {
        let item_loop = ItemLoop::new("test", FailureMode::FailFast);
        let err = tokio_test::block_on(item_loop.run(4, handler)).unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.message(), "Query parameter is required");
        assert_eq!(err.completed.len(), 1);
        assert_eq!(err.completed[0].index(), 0);
    }

    #[test]
    fn test_soft_failures_never_abort() {
        let item_loop = ItemLoop::new("test", FailureMode::FailFast);
        let report = tokio_test::block_on(item_loop.run(1, |_| async {
            Ok(ItemOutcome::SoftFailure {
                envelope: ok_envelope(0),
                error: "timeout".to_string(),
            })
        }))
        .unwrap();

        assert_eq!(report.envelopes.len(), 1);
        assert!(report.summary.has_failures());
        assert_eq!(report.summary.recovered, 1);
    }

    #[test]
    fn test_items_run_in_order() {
        let mut seen = Vec::new();
        let item_loop = ItemLoop::new("test", FailureMode::FailFast);
        let report = tokio_test::block_on(item_loop.run(3, |index| {
            seen.push(index);
            async move { Ok(ItemOutcome::Completed(ok_envelope(index))) }
        }))
        .unwrap();

        assert_eq!(seen, vec![0, 1, 2]);
        assert!((report.summary.success_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_span_attributes_share_execution_id() {
        let item_loop = ItemLoop::new("serper", FailureMode::FailFast);
        let first = item_loop.span_attributes(0);
        let second = item_loop.span_attributes(1);

        assert_eq!(first.node, "serper");
        assert_eq!(first.execution_id, item_loop.execution_id());
        assert_eq!(first.execution_id, second.execution_id);
        assert_eq!(second.index, 1);
    }

    #[test]
    fn test_empty_batch() {
        let item_loop = ItemLoop::new("test", FailureMode::FailFast);
        let report = tokio_test::block_on(item_loop.run(0, handler)).unwrap();
        assert!(report.envelopes.is_empty());
        assert!((report.summary.success_rate()).abs() < f64::EPSILON);
    }
}
