use std::fmt::Write as _;
use std::path::PathBuf;

use motionlab_protocol::ContentKind;

/// One unit of work submitted to a transfer job.
///
/// Items are identified by their position in the submitted list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferItem {
    /// A local file to upload.
    Upload { path: PathBuf, name: String },
    /// A remote resource to download.
    Download {
        id: String,
        name: String,
        kind: ContentKind,
    },
}

impl TransferItem {
    /// Creates an upload item named after the file's last path component.
    pub fn upload(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self::Upload { path, name }
    }

    /// Creates a download item.
    pub fn download(id: impl Into<String>, name: impl Into<String>, kind: ContentKind) -> Self {
        Self::Download {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    /// Name shown to the user for this item.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Upload { name, .. } | Self::Download { name, .. } => name,
        }
    }

    /// Content kind for download items.
    pub fn kind(&self) -> Option<ContentKind> {
        match self {
            Self::Download { kind, .. } => Some(*kind),
            Self::Upload { .. } => None,
        }
    }

    /// Remote identifier for download items.
    pub fn remote_id(&self) -> Option<&str> {
        match self {
            Self::Download { id, .. } => Some(id),
            Self::Upload { .. } => None,
        }
    }
}

/// Raw body returned by a single-item fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl Payload {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Metadata recorded for a successfully transferred item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipt {
    /// Identifier assigned or used by the service.
    pub stored_id: Option<String>,
    /// Where the payload was written locally (downloads with a sink).
    pub saved_to: Option<PathBuf>,
    /// Bytes sent or received.
    pub bytes: u64,
}

/// Terminal status of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Succeeded(Receipt),
    Failed(String),
    NotAttempted,
}

/// Lifecycle of a transfer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Completed,
    PartiallyFailed,
    Aborted,
}

impl JobState {
    /// Returns `true` for the three final states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::PartiallyFailed | Self::Aborted)
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Running => 1,
            Self::Completed => 2,
            Self::PartiallyFailed => 3,
            Self::Aborted => 4,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::PartiallyFailed,
            4 => Self::Aborted,
            _ => Self::Idle,
        }
    }
}

/// An item that reached a failed terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// Final classification of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Every item succeeded.
    Completed,
    /// Every item settled and at least one failed.
    PartiallyFailed { failed: Vec<FailedItem> },
    /// Cancelled before every item was attempted.
    Aborted {
        completed: usize,
        not_attempted: Vec<usize>,
    },
}

impl JobOutcome {
    pub fn state(&self) -> JobState {
        match self {
            Self::Completed => JobState::Completed,
            Self::PartiallyFailed { .. } => JobState::PartiallyFailed,
            Self::Aborted { .. } => JobState::Aborted,
        }
    }
}

/// Per-item entry of a [`JobReport`], in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub index: usize,
    pub name: String,
    pub status: ItemStatus,
}

/// Result of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub total: usize,
    pub completed: usize,
    pub items: Vec<ItemReport>,
    pub outcome: JobOutcome,
}

impl JobReport {
    /// Items that failed, in submission order.
    pub fn failed(&self) -> Vec<FailedItem> {
        self.items
            .iter()
            .filter_map(|item| match &item.status {
                ItemStatus::Failed(reason) => Some(FailedItem {
                    index: item.index,
                    name: item.name.clone(),
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Number of items that succeeded.
    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.status, ItemStatus::Succeeded(_)))
            .count()
    }

    /// One-line message for the user.
    pub fn summary(&self) -> String {
        match &self.outcome {
            JobOutcome::Completed => {
                let noun = if self.total == 1 { "item" } else { "items" };
                format!("all {} {noun} transferred", self.total)
            }
            JobOutcome::PartiallyFailed { failed } => {
                let mut msg = format!("{} of {} failed:", failed.len(), self.total);
                for (i, f) in failed.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    let _ = write!(msg, "{sep}{} ({})", f.name, f.reason);
                }
                msg
            }
            JobOutcome::Aborted { completed, .. } => {
                format!("cancelled after {completed} of {}", self.total)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(statuses: Vec<ItemStatus>, outcome: JobOutcome) -> JobReport {
        let total = statuses.len();
        let completed = statuses
            .iter()
            .filter(|s| !matches!(s, ItemStatus::NotAttempted))
            .count();
        JobReport {
            total,
            completed,
            items: statuses
                .into_iter()
                .enumerate()
                .map(|(index, status)| ItemReport {
                    index,
                    name: format!("clip_{index}.mp4"),
                    status,
                })
                .collect(),
            outcome,
        }
    }

    #[test]
    fn upload_item_named_after_file() {
        let item = TransferItem::upload("/videos/run/clip.mp4");
        assert_eq!(item.display_name(), "clip.mp4");
        assert!(item.remote_id().is_none());
    }

    #[test]
    fn download_item_exposes_id() {
        let item = TransferItem::download("f7", "out.json", ContentKind::Json);
        assert_eq!(item.remote_id(), Some("f7"));
        assert_eq!(item.display_name(), "out.json");
        assert_eq!(item.kind(), Some(ContentKind::Json));
        assert!(TransferItem::upload("a.mp4").kind().is_none());
    }

    #[test]
    fn job_state_u8_roundtrip() {
        for state in [
            JobState::Idle,
            JobState::Running,
            JobState::Completed,
            JobState::PartiallyFailed,
            JobState::Aborted,
        ] {
            assert_eq!(JobState::from_u8(state.as_u8()), state);
        }
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Aborted.is_terminal());
    }

    #[test]
    fn summary_all_succeeded() {
        let r = report(
            vec![ItemStatus::Succeeded(Receipt::default()); 3],
            JobOutcome::Completed,
        );
        assert_eq!(r.summary(), "all 3 items transferred");
        assert_eq!(r.succeeded(), 3);
    }

    #[test]
    fn summary_names_failed_items() {
        let statuses = vec![
            ItemStatus::Succeeded(Receipt::default()),
            ItemStatus::Failed("HTTP 500".into()),
            ItemStatus::Failed("timeout".into()),
        ];
        let r = report(statuses, JobOutcome::Completed);
        let failed = r.failed();
        let r = JobReport {
            outcome: JobOutcome::PartiallyFailed { failed },
            ..r
        };
        assert_eq!(
            r.summary(),
            "2 of 3 failed: clip_1.mp4 (HTTP 500), clip_2.mp4 (timeout)"
        );
    }

    #[test]
    fn summary_cancelled() {
        let r = report(
            vec![
                ItemStatus::Succeeded(Receipt::default()),
                ItemStatus::NotAttempted,
                ItemStatus::NotAttempted,
            ],
            JobOutcome::Aborted {
                completed: 1,
                not_attempted: vec![1, 2],
            },
        );
        assert_eq!(r.summary(), "cancelled after 1 of 3");
    }
}
