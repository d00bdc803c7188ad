//! Seams between the controller and its environment.
//!
//! The controller never talks HTTP or touches the filesystem itself: the
//! application supplies a [`Transport`], an optional [`PayloadSink`] and a
//! [`CredentialProvider`]. Keeping these as traits lets tests drive the
//! controller with in-memory fakes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::TransferError;
use crate::policy::BatchMetadata;
use crate::types::{Payload, Receipt, TransferItem};

/// Boxed future returned by the transfer seams.
pub type TransferFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransferError>> + Send + 'a>>;

/// Per-call context prepared by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    /// Bearer credential to attach, when the policy asks for auth.
    pub bearer: Option<String>,
}

/// Moves items to or from the remote service.
pub trait Transport: Send + Sync {
    /// Sends every item of `items` as one combined request.
    fn send_batch<'a>(
        &'a self,
        items: &'a [TransferItem],
        metadata: &'a BatchMetadata,
        ctx: &'a CallContext,
    ) -> TransferFuture<'a, Receipt>;

    /// Fetches the body of a single item.
    fn fetch_one<'a>(
        &'a self,
        item: &'a TransferItem,
        ctx: &'a CallContext,
    ) -> TransferFuture<'a, Payload>;
}

/// Turns a fetched payload into a locally saved file.
pub trait PayloadSink: Send + Sync {
    /// Stores `payload` for `item` and returns where it was written.
    fn save<'a>(&'a self, item: &'a TransferItem, payload: Payload)
    -> TransferFuture<'a, PathBuf>;
}

/// Supplies the current session credential.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Provider holding a fixed token.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub Option<String>);

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }
}

impl CredentialProvider for StaticCredentials {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}
