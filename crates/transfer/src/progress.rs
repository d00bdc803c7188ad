use std::sync::atomic::{AtomicUsize, Ordering};

/// Point-in-time view of a job's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

impl ProgressSnapshot {
    fn new(completed: usize, total: usize) -> Self {
        Self {
            completed,
            total,
            percent: percent(completed, total),
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

/// Computes `round(completed / total * 100)` with integer arithmetic.
///
/// Halves round up. While items remain the result is capped at 99, so 100
/// is only ever reported once every item is terminal.
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    if completed >= total {
        return 100;
    }
    let rounded = (completed * 200 + total) / (total * 2);
    rounded.min(99) as u8
}

/// Counts settled items of a job.
///
/// The counter only moves forward and never passes `total`. Updates go
/// through an atomic so concurrent calls may report from any task.
#[derive(Debug)]
pub struct ProgressCounter {
    total: usize,
    completed: AtomicUsize,
}

impl ProgressCounter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
        }
    }

    /// Records `n` more settled items and returns the updated snapshot.
    pub fn advance(&self, n: usize) -> ProgressSnapshot {
        let total = self.total;
        let prev = self
            .completed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                Some((c + n).min(total))
            })
            .unwrap_or(total);
        ProgressSnapshot::new((prev + n).min(total), total)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(self.completed.load(Ordering::Acquire), self.total)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
