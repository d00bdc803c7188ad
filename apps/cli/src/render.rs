//! Terminal rendering of transfer progress.

use std::io::{self, Write};

use motionlab_transfer::{JobOutcome, TransferEvent};

/// Exit status for a partially failed job.
pub const EXIT_PARTIAL: u8 = 2;
/// Exit status for a cancelled job.
pub const EXIT_ABORTED: u8 = 3;

/// Writes one line per progress step and per failed item.
pub struct ProgressPrinter<W> {
    out: W,
    verb: &'static str,
    last_percent: Option<u8>,
}

impl<W: Write> ProgressPrinter<W> {
    pub fn new(out: W, verb: &'static str) -> Self {
        Self {
            out,
            verb,
            last_percent: None,
        }
    }

    pub fn handle(&mut self, event: &TransferEvent) -> io::Result<()> {
        match event {
            TransferEvent::Started { total } => {
                let noun = if *total == 1 { "item" } else { "items" };
                writeln!(self.out, "{} {total} {noun}", self.verb)
            }
            TransferEvent::Progress(snapshot) => {
                if self.last_percent == Some(snapshot.percent) {
                    return Ok(());
                }
                self.last_percent = Some(snapshot.percent);
                writeln!(
                    self.out,
                    "[{:>3}%] {}/{}",
                    snapshot.percent, snapshot.completed, snapshot.total
                )
            }
            TransferEvent::ItemSettled {
                name,
                error: Some(error),
                ..
            } => writeln!(self.out, "  failed {name}: {error}"),
            TransferEvent::ItemSettled { .. } | TransferEvent::Finished(_) => Ok(()),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn exit_status(outcome: &JobOutcome) -> u8 {
    match outcome {
        JobOutcome::Completed => 0,
        JobOutcome::PartiallyFailed { .. } => EXIT_PARTIAL,
        JobOutcome::Aborted { .. } => EXIT_ABORTED,
    }
}
