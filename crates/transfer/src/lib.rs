//! Batched, progress-tracked, concurrency-bounded file transfer.
//!
//! The [`TransferController`] drives a list of [`TransferItem`]s through a
//! [`Transport`] either as sequential multi-item batches (uploads) or as
//! bounded groups of concurrent single-item calls (downloads). Individual
//! failures are recorded per item and never stop the job.

mod concurrency;
mod controller;
mod policy;
mod progress;
mod transport;
mod types;
mod validation;

pub use concurrency::{
    ConcurrencyStrategy, NetworkHint, NetworkProbe, StaticProbe, choose_concurrency,
};
pub use controller::{Submission, TransferController, TransferEvent, TransferJob};
pub use policy::{BatchMetadata, Policy, TransferMode};
pub use progress::{ProgressCounter, ProgressSnapshot, percent};
pub use transport::{
    CallContext, CredentialProvider, PayloadSink, StaticCredentials, Transport, TransferFuture,
};
pub use types::{
    FailedItem, ItemReport, ItemStatus, JobOutcome, JobReport, JobState, Payload, Receipt,
    TransferItem,
};
pub use validation::validate_file_name;

/// Default number of items combined into one batch request.
///
/// Kept at one file per request for backends that bound the request body.
pub const DEFAULT_BATCH_SIZE: usize = 1;

/// Concurrency used when no limit is configured and no network hint is known.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("no group selected")]
    MissingGroup,

    #[error("no credential available")]
    MissingCredential,

    #[error("{0}")]
    Transport(String),

    #[error("could not save payload: {0}")]
    Sink(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("transfer task failed: {0}")]
    Join(String),
}
