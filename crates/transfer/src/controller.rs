//! Transfer controller and job handle.
//!
//! A job walks its items in submission order, one batch or group at a
//! time, on a single tokio task. Cancellation is cooperative: it is only
//! observed between batches/groups, and calls already in flight are left
//! to settle.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::concurrency::{ConcurrencyStrategy, NetworkProbe, choose_concurrency};
use crate::policy::{BatchMetadata, Policy, TransferMode};
use crate::progress::{ProgressCounter, ProgressSnapshot};
use crate::transport::{CallContext, CredentialProvider, PayloadSink, Transport};
use crate::types::{ItemReport, ItemStatus, JobOutcome, JobReport, JobState, Receipt, TransferItem};
use crate::{DEFAULT_BATCH_SIZE, TransferError};

/// Notification emitted while a job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// The job started driving its items.
    Started { total: usize },
    /// The settled count changed.
    Progress(ProgressSnapshot),
    /// An item reached its terminal status.
    ItemSettled {
        index: usize,
        name: String,
        error: Option<String>,
    },
    /// The job reached its terminal outcome.
    Finished(JobOutcome),
}

/// Result of [`TransferController::submit`].
#[derive(Debug)]
pub enum Submission {
    Started(TransferJob),
    /// The item list was empty; no job was created.
    NothingToTransfer,
}

impl Submission {
    pub fn into_job(self) -> Option<TransferJob> {
        match self {
            Self::Started(job) => Some(job),
            Self::NothingToTransfer => None,
        }
    }
}

struct JobShared {
    state: AtomicU8,
    progress: ProgressCounter,
}

impl JobShared {
    fn new(total: usize) -> Self {
        Self {
            state: AtomicU8::new(JobState::Idle.as_u8()),
            progress: ProgressCounter::new(total),
        }
    }

    fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: JobState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }
}

/// Handle to one running transfer.
///
/// Dropping the handle does not stop the job; call [`cancel`](Self::cancel)
/// for that.
pub struct TransferJob {
    shared: Arc<JobShared>,
    events_rx: Option<mpsc::UnboundedReceiver<TransferEvent>>,
    cancel: CancellationToken,
    handle: JoinHandle<JobReport>,
}

impl fmt::Debug for TransferJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferJob")
            .field("state", &self.state())
            .field("progress", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl TransferJob {
    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransferEvent>> {
        self.events_rx.take()
    }

    /// Current progress, for polling.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.shared.progress.snapshot()
    }

    pub fn state(&self) -> JobState {
        self.shared.state()
    }

    pub fn total(&self) -> usize {
        self.shared.progress.total()
    }

    /// Requests cancellation. No further batch or group is started.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns a token that cancels this job when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the job to reach its terminal outcome.
    pub async fn wait(self) -> Result<JobReport, TransferError> {
        self.handle
            .await
            .map_err(|e| TransferError::Join(e.to_string()))
    }
}

/// Resolved batching plan for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Batched { batch_size: usize },
    Concurrent { limit: usize },
}

impl Plan {
    fn group_size(&self) -> usize {
        match *self {
            Self::Batched { batch_size } => batch_size,
            Self::Concurrent { limit } => limit,
        }
    }
}

/// Drives transfer jobs through an injected [`Transport`].
#[derive(Clone)]
pub struct TransferController {
    transport: Arc<dyn Transport>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    sink: Option<Arc<dyn PayloadSink>>,
    probe: Option<Arc<dyn NetworkProbe>>,
    strategy: ConcurrencyStrategy,
}

impl TransferController {
    /// Creates a controller with no credentials, sink or network probe.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            credentials: None,
            sink: None,
            probe: None,
            strategy: choose_concurrency,
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets where fetched payloads are stored.
    pub fn with_sink(mut self, sink: Arc<dyn PayloadSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_network_probe(mut self, probe: Arc<dyn NetworkProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_strategy(mut self, strategy: ConcurrencyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Starts a job over `items`.
    ///
    /// Returns [`Submission::NothingToTransfer`] for an empty list. Policy
    /// and credential problems are reported here, before any call is made.
    /// Must be called from within a tokio runtime.
    pub fn submit(
        &self,
        items: Vec<TransferItem>,
        policy: Policy,
    ) -> Result<Submission, TransferError> {
        if items.is_empty() {
            debug!("nothing to transfer");
            return Ok(Submission::NothingToTransfer);
        }
        policy.validate()?;
        if policy.authenticated && self.current_token().is_none() {
            return Err(TransferError::MissingCredential);
        }

        let plan = self.plan(&policy);
        let total = items.len();
        let shared = Arc::new(JobShared::new(total));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let runner = JobRunner {
            items,
            plan,
            metadata: policy.metadata,
            authenticated: policy.authenticated,
            transport: Arc::clone(&self.transport),
            credentials: self.credentials.clone(),
            sink: self.sink.clone(),
            shared: Arc::clone(&shared),
            events: events_tx,
            cancel: cancel.clone(),
        };

        info!(total, plan = ?plan, "transfer job submitted");
        let handle = tokio::spawn(runner.run());

        Ok(Submission::Started(TransferJob {
            shared,
            events_rx: Some(events_rx),
            cancel,
            handle,
        }))
    }

    /// Requests cancellation of `job`.
    pub fn cancel(&self, job: &TransferJob) {
        job.cancel();
    }

    fn current_token(&self) -> Option<String> {
        self.credentials.as_ref().and_then(|c| c.token())
    }

    // The network hint is read once here, so it stays fixed for the job.
    fn plan(&self, policy: &Policy) -> Plan {
        match policy.mode {
            TransferMode::BatchedSequential => Plan::Batched {
                batch_size: policy.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            },
            TransferMode::BoundedConcurrent => {
                let limit = policy.max_concurrency.unwrap_or_else(|| {
                    let hint = self.probe.as_ref().and_then(|p| p.effective_type());
                    let limit = (self.strategy)(hint);
                    debug!(hint = ?hint, limit, "concurrency chosen from network hint");
                    limit
                });
                Plan::Concurrent {
                    limit: limit.max(1),
                }
            }
        }
    }
}

struct JobRunner {
    items: Vec<TransferItem>,
    plan: Plan,
    metadata: BatchMetadata,
    authenticated: bool,
    transport: Arc<dyn Transport>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    sink: Option<Arc<dyn PayloadSink>>,
    shared: Arc<JobShared>,
    events: mpsc::UnboundedSender<TransferEvent>,
    cancel: CancellationToken,
}

impl JobRunner {
    async fn run(self) -> JobReport {
        let total = self.items.len();
        self.shared.set_state(JobState::Running);
        self.emit(TransferEvent::Started { total });
        self.emit(TransferEvent::Progress(self.shared.progress.snapshot()));

        let mut statuses = vec![ItemStatus::NotAttempted; total];
        let step = self.plan.group_size();
        let mut aborted = false;

        for start in (0..total).step_by(step) {
            if self.cancel.is_cancelled() {
                info!(settled = start, total, "transfer cancelled");
                aborted = true;
                break;
            }
            let range = start..(start + step).min(total);
            match self.plan {
                Plan::Batched { .. } => self.run_batch(range, &mut statuses).await,
                Plan::Concurrent { .. } => self.run_group(range, &mut statuses).await,
            }
        }

        self.finish(statuses, aborted)
    }

    /// Sends one combined request. Its result applies to every item in it.
    async fn run_batch(&self, range: Range<usize>, statuses: &mut [ItemStatus]) {
        let batch = &self.items[range.clone()];
        debug!(first = range.start, items = batch.len(), "sending batch");

        let result = match self.call_context() {
            Ok(ctx) => {
                self.transport
                    .send_batch(batch, &self.metadata, &ctx)
                    .await
            }
            Err(e) => Err(e),
        };

        let error = match result {
            Ok(receipt) => {
                for status in &mut statuses[range.clone()] {
                    *status = ItemStatus::Succeeded(receipt.clone());
                }
                None
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(first = range.start, items = batch.len(), error = %reason, "batch failed");
                for status in &mut statuses[range.clone()] {
                    *status = ItemStatus::Failed(reason.clone());
                }
                Some(reason)
            }
        };

        for (index, item) in range.clone().zip(batch) {
            self.emit(TransferEvent::ItemSettled {
                index,
                name: item.display_name().to_string(),
                error: error.clone(),
            });
        }
        let snapshot = self.shared.progress.advance(range.len());
        self.emit(TransferEvent::Progress(snapshot));
    }

    /// Runs one call per item concurrently and waits for all of them.
    async fn run_group(&self, range: Range<usize>, statuses: &mut [ItemStatus]) {
        debug!(first = range.start, items = range.len(), "starting group");

        let calls = range.map(move |index| async move {
            let item = &self.items[index];
            let result = self.transfer_one(item).await;
            if let Err(e) = &result {
                warn!(index, name = item.display_name(), error = %e, "item failed");
            }
            self.emit(TransferEvent::ItemSettled {
                index,
                name: item.display_name().to_string(),
                error: result.as_ref().err().map(ToString::to_string),
            });
            self.emit(TransferEvent::Progress(self.shared.progress.advance(1)));
            (index, result)
        });

        for (index, result) in join_all(calls).await {
            statuses[index] = match result {
                Ok(receipt) => ItemStatus::Succeeded(receipt),
                Err(e) => ItemStatus::Failed(e.to_string()),
            };
        }
    }

    async fn transfer_one(&self, item: &TransferItem) -> Result<Receipt, TransferError> {
        let ctx = self.call_context()?;
        let payload = self.transport.fetch_one(item, &ctx).await?;
        let bytes = payload.len() as u64;
        let saved_to = match &self.sink {
            Some(sink) => Some(sink.save(item, payload).await?),
            None => None,
        };
        Ok(Receipt {
            stored_id: item.remote_id().map(str::to_string),
            saved_to,
            bytes,
        })
    }

    // The token is read at call time so a refreshed session is picked up.
    fn call_context(&self) -> Result<CallContext, TransferError> {
        if !self.authenticated {
            return Ok(CallContext::default());
        }
        let token = self
            .credentials
            .as_ref()
            .and_then(|c| c.token())
            .ok_or(TransferError::MissingCredential)?;
        Ok(CallContext {
            bearer: Some(token),
        })
    }

    fn finish(&self, statuses: Vec<ItemStatus>, aborted: bool) -> JobReport {
        let total = self.items.len();
        let completed = self.shared.progress.snapshot().completed;
        let items: Vec<ItemReport> = statuses
            .into_iter()
            .zip(&self.items)
            .enumerate()
            .map(|(index, (status, item))| ItemReport {
                index,
                name: item.display_name().to_string(),
                status,
            })
            .collect();

        let outcome = if aborted {
            JobOutcome::Aborted {
                completed,
                not_attempted: items
                    .iter()
                    .filter(|i| i.status == ItemStatus::NotAttempted)
                    .map(|i| i.index)
                    .collect(),
            }
        } else {
            JobOutcome::Completed
        };

        let mut report = JobReport {
            total,
            completed,
            items,
            outcome,
        };
        if !aborted {
            let failed = report.failed();
            if !failed.is_empty() {
                report.outcome = JobOutcome::PartiallyFailed { failed };
            }
        }

        self.shared.set_state(report.outcome.state());
        info!(
            total,
            completed,
            succeeded = report.succeeded(),
            state = ?report.outcome.state(),
            "transfer job finished"
        );
        self.emit(TransferEvent::Finished(report.outcome.clone()));
        report
    }

    fn emit(&self, event: TransferEvent) {
        // The receiver may have been dropped; the report still carries everything.
        let _ = self.events.send(event);
    }
}
