use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use zipper_logging::zipper_debug;

use crate::fetch::Fetcher;
use crate::{FetchResult, Locator, Ordinal};

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// A contiguous slice of the submitted locators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    /// Zero-based batch number.
    pub index: usize,
    /// Ordinal of the first locator in this batch.
    pub first_ordinal: Ordinal,
    pub locators: &'a [Locator],
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    /// Locators paired with their ordinals in the submitted list.
    pub fn items(&self) -> impl Iterator<Item = (Ordinal, &Locator)> + '_ {
        self.locators
            .iter()
            .enumerate()
            .map(move |(offset, locator)| (self.first_ordinal + offset, locator))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("run cancelled after {completed_batches} batch(es)")]
    Cancelled { completed_batches: usize },
}

/// Runs fetches in fixed-size batches: every fetch of a batch is in flight at
/// once, and the next batch starts only when all of them have settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchScheduler {
    batch_size: usize,
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchScheduler {
    /// A batch size of 0 is treated as 1.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batches<'a>(&self, locators: &'a [Locator]) -> impl Iterator<Item = Batch<'a>> + 'a {
        let batch_size = self.batch_size;
        locators
            .chunks(batch_size)
            .enumerate()
            .map(move |(index, locators)| Batch {
                index,
                first_ordinal: index * batch_size + 1,
                locators,
            })
    }

    pub fn batch_count(&self, len: usize) -> usize {
        len.div_ceil(self.batch_size)
    }

    /// Fetch every locator, handing each outcome to `on_outcome` as soon as
    /// it settles. Outcomes within a batch arrive in completion order; the
    /// ordinal always reflects the submitted position.
    ///
    /// Cancelling `cancel` abandons the in-flight batch and returns
    /// [`ScheduleError::Cancelled`].
    pub async fn run<F>(
        &self,
        locators: &[Locator],
        fetcher: &dyn Fetcher,
        cancel: &CancellationToken,
        mut on_outcome: F,
    ) -> Result<(), ScheduleError>
    where
        F: FnMut(Ordinal, FetchResult),
    {
        let batch_count = self.batch_count(locators.len());
        for batch in self.batches(locators) {
            if cancel.is_cancelled() {
                return Err(ScheduleError::Cancelled {
                    completed_batches: batch.index,
                });
            }
            zipper_debug!(
                "Dispatching batch {}/{} ({} item(s), first ordinal {})",
                batch.index + 1,
                batch_count,
                batch.len(),
                batch.first_ordinal
            );

            let mut in_flight: FuturesUnordered<_> = batch
                .items()
                .map(|(ordinal, locator)| async move { (ordinal, fetcher.fetch(locator).await) })
                .collect();

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        let settled = usize::from(in_flight.is_empty());
                        return Err(ScheduleError::Cancelled {
                            completed_batches: batch.index + settled,
                        });
                    }
                    next = in_flight.next() => match next {
                        Some((ordinal, result)) => on_outcome(ordinal, result),
                        None => break,
                    },
                }
            }
        }
        Ok(())
    }
}
