use motionlab_protocol::AnalysisMode;
use serde::{Deserialize, Serialize};

use crate::TransferError;

/// How a job moves its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferMode {
    /// Contiguous batches, one combined request each, strictly one at a time.
    BatchedSequential,
    /// Contiguous groups of independent calls run concurrently; each group
    /// settles completely before the next one starts.
    BoundedConcurrent,
}

/// Metadata sent alongside every batch request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchMetadata {
    pub analysis: Option<AnalysisMode>,
    pub group: Option<String>,
}

/// Batching and concurrency policy for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub mode: TransferMode,
    /// Items per batch in batched-sequential mode.
    pub batch_size: Option<usize>,
    /// Group size in bounded-concurrent mode. `None` lets the controller
    /// pick one from the network hint.
    pub max_concurrency: Option<usize>,
    pub metadata: BatchMetadata,
    /// Attach the session credential to every call.
    pub authenticated: bool,
}

impl Policy {
    /// Batched-sequential policy with the given batch size.
    pub fn batched(batch_size: usize) -> Self {
        Self {
            mode: TransferMode::BatchedSequential,
            batch_size: Some(batch_size),
            max_concurrency: None,
            metadata: BatchMetadata::default(),
            authenticated: false,
        }
    }

    /// Bounded-concurrent policy with a fixed limit.
    pub fn concurrent(max_concurrency: usize) -> Self {
        Self {
            mode: TransferMode::BoundedConcurrent,
            batch_size: None,
            max_concurrency: Some(max_concurrency),
            metadata: BatchMetadata::default(),
            authenticated: false,
        }
    }

    /// Bounded-concurrent policy whose limit follows the network hint.
    pub fn adaptive() -> Self {
        Self {
            max_concurrency: None,
            ..Self::concurrent(crate::DEFAULT_CONCURRENCY)
        }
    }

    pub fn with_analysis(mut self, analysis: AnalysisMode) -> Self {
        self.metadata.analysis = Some(analysis);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.metadata.group = Some(group.into());
        self
    }

    pub fn with_auth(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    /// Checks the policy before any call is made.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.batch_size == Some(0) {
            return Err(TransferError::InvalidPolicy(
                "batch size must be at least 1".into(),
            ));
        }
        if self.max_concurrency == Some(0) {
            return Err(TransferError::InvalidPolicy(
                "concurrency must be at least 1".into(),
            ));
        }
        if let Some(group) = &self.metadata.group
            && group.trim().is_empty()
        {
            return Err(TransferError::MissingGroup);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batched_policy_defaults() {
        let p = Policy::batched(2)
            .with_analysis(AnalysisMode::Pose3d)
            .with_group("Group1");
        assert_eq!(p.mode, TransferMode::BatchedSequential);
        assert_eq!(p.batch_size, Some(2));
        assert_eq!(p.metadata.group.as_deref(), Some("Group1"));
        assert!(!p.authenticated);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn adaptive_policy_has_no_fixed_limit() {
        let p = Policy::adaptive().with_auth(true);
        assert_eq!(p.mode, TransferMode::BoundedConcurrent);
        assert!(p.max_concurrency.is_none());
        assert!(p.authenticated);
    }

    #[test]
    fn zero_sizes_rejected() {
        assert!(matches!(
            Policy::batched(0).validate(),
            Err(TransferError::InvalidPolicy(_))
        ));
        assert!(matches!(
            Policy::concurrent(0).validate(),
            Err(TransferError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn blank_group_rejected() {
        let p = Policy::batched(1).with_group("  ");
        assert!(matches!(p.validate(), Err(TransferError::MissingGroup)));
    }

    #[test]
    fn mode_serialization() {
        assert_eq!(
            serde_json::to_string(&TransferMode::BoundedConcurrent).unwrap(),
            "\"bounded-concurrent\""
        );
    }
}
