use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use zipper_logging::{zipper_debug, zipper_info, zipper_warn};

use crate::archive::{ArchiveBuilder, ArchiveError, Compression};
use crate::batch::{BatchScheduler, ScheduleError, DEFAULT_BATCH_SIZE};
use crate::fetch::{ClientBuildError, FetchSettings, Fetcher, ReqwestFetcher};
use crate::progress::{ProgressAccumulator, ProgressSnapshot};
use crate::sink::ProgressSink;
use crate::{EngineEvent, Locator, RunOutcome, RunState, RunSummary};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub batch_size: usize,
    pub compression: Compression,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            compression: Compression::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("a download run is already in progress")]
    AlreadyRunning,
    #[error("download run was cancelled")]
    Cancelled,
    #[error("failed to build archive: {0}")]
    Archive(#[from] ArchiveError),
}

impl From<ScheduleError> for PipelineError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Cancelled { .. } => PipelineError::Cancelled,
        }
    }
}

/// Fetch-and-archive orchestrator.
///
/// Owns the running flag and the progress counter of the current run. One
/// run at a time: `Idle -> Running -> Idle`.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    scheduler: BatchScheduler,
    compression: Compression,
    running: AtomicBool,
    progress: ProgressAccumulator,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &EngineConfig) -> Self {
        Self {
            fetcher,
            scheduler: BatchScheduler::new(config.batch_size),
            compression: config.compression,
            running: AtomicBool::new(false),
            progress: ProgressAccumulator::default(),
        }
    }

    /// Pipeline over a [`ReqwestFetcher`] built from `config.fetch`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ClientBuildError> {
        let fetcher = ReqwestFetcher::new(config.fetch.clone())?;
        Ok(Self::new(Arc::new(fetcher), config))
    }

    pub fn state(&self) -> RunState {
        if self.running.load(Ordering::SeqCst) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    pub fn batch_size(&self) -> usize {
        self.scheduler.batch_size()
    }

    pub async fn run(
        &self,
        locators: Vec<Locator>,
        sink: &dyn ProgressSink,
    ) -> Result<RunOutcome, PipelineError> {
        self.run_with_cancel(locators, sink, &CancellationToken::new())
            .await
    }

    /// Fetch every locator, pack the successes into one archive and return
    /// it with a summary of the run.
    ///
    /// Fetch failures never fail the run; they are reported through
    /// `EngineEvent::ItemFailed` and `RunSummary::failed`.
    pub async fn run_with_cancel(
        &self,
        locators: Vec<Locator>,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, PipelineError> {
        let _guard = RunGuard::acquire(self, sink)?;
        let total = locators.len();
        self.progress.reset(total);
        zipper_info!(
            "Starting run over {} locator(s) in batches of {}",
            total,
            self.scheduler.batch_size()
        );

        let mut builder = ArchiveBuilder::with_compression(self.compression);
        let mut summary = RunSummary {
            total,
            ..RunSummary::default()
        };
        let mut archive_error = None;

        self.scheduler
            .run(&locators, self.fetcher.as_ref(), cancel, |ordinal, result| {
                match result {
                    Ok(payload) => {
                        let content_type = payload.metadata.content_type.clone();
                        match builder.add_entry(ordinal, payload.bytes, content_type.as_deref()) {
                            Ok(name) => {
                                zipper_debug!("Added {} from {}", name, payload.metadata.final_url);
                                summary.succeeded += 1;
                            }
                            Err(err) => {
                                archive_error.get_or_insert(err);
                            }
                        }
                    }
                    Err(error) => {
                        zipper_warn!("Item {} failed: {}", ordinal, error);
                        sink.emit(EngineEvent::ItemFailed {
                            ordinal,
                            error: error.clone(),
                        });
                        summary.failed.push((ordinal, error));
                    }
                }
                let snapshot = self.progress.record_completion();
                sink.emit(EngineEvent::Progress(snapshot));
            })
            .await
            .inspect_err(|_| zipper_warn!("Run cancelled at {:?}", self.progress.snapshot()))?;

        if let Some(err) = archive_error {
            return Err(err.into());
        }

        summary.failed.sort_by_key(|(ordinal, _)| *ordinal);
        let archive = builder.finalize()?;
        zipper_info!(
            "Run finished: {} of {} item(s) archived, {} failed, archive {} bytes",
            summary.succeeded,
            total,
            summary.failed_count(),
            archive.as_bytes().len()
        );

        Ok(RunOutcome { archive, summary })
    }
}

/// Marks the pipeline as running for its lifetime. Dropping it, on any exit
/// path, clears progress and returns the pipeline to idle.
struct RunGuard<'a> {
    pipeline: &'a Pipeline,
    sink: &'a dyn ProgressSink,
}

impl<'a> RunGuard<'a> {
    fn acquire(pipeline: &'a Pipeline, sink: &'a dyn ProgressSink) -> Result<Self, PipelineError> {
        pipeline
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| PipelineError::AlreadyRunning)?;
        sink.emit(EngineEvent::RunStateChanged(RunState::Running));
        Ok(Self { pipeline, sink })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.pipeline.progress.reset(0);
        self.pipeline.running.store(false, Ordering::SeqCst);
        self.sink.emit(EngineEvent::RunStateChanged(RunState::Idle));
    }
}
