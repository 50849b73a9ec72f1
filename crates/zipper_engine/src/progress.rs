use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    /// Share of completed items in `[0, 100]`. An empty run reports 0.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let completed = self.completed.min(self.total);
        (completed as f64 / self.total as f64) * 100.0
    }

    /// Percentage rounded to two decimal places for display.
    pub fn rounded_percentage(&self) -> f64 {
        (self.percentage() * 100.0).round() / 100.0
    }
}

/// Completion counter shared by every fetch of a run.
///
/// Completions are single atomic increments, so outcomes settling in any
/// interleaving are all counted exactly once.
#[derive(Debug, Default)]
pub struct ProgressAccumulator {
    completed: AtomicUsize,
    total: AtomicUsize,
}

impl ProgressAccumulator {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total: AtomicUsize::new(total),
        }
    }

    /// Start a new run over `total` items.
    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    /// Count one settled item and return the updated state.
    ///
    /// Saturates at the total so a stray extra call cannot push the
    /// percentage past 100.
    pub fn record_completion(&self) -> ProgressSnapshot {
        let total = self.total.load(Ordering::SeqCst);
        let previous = self
            .completed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |done| {
                (done < total).then_some(done + 1)
            })
            .unwrap_or(total);
        ProgressSnapshot {
            completed: (previous + 1).min(total),
            total,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
        }
    }

    pub fn current_percentage(&self) -> f64 {
        self.snapshot().percentage()
    }
}
