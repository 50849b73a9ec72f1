use std::path::PathBuf;

use anyhow::{Context, Result};
use zipper_core::{Effect, Msg};
use zipper_engine::{AtomicFileWriter, Canceller, EngineEvent, EngineHandle, Locator};
use zipper_logging::{zipper_info, zipper_warn};

/// Executes core effects against the engine and the file system.
pub struct EffectRunner {
    engine: EngineHandle,
    writer: AtomicFileWriter,
    saved: Option<PathBuf>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, writer: AtomicFileWriter) -> Self {
        Self {
            engine,
            writer,
            saved: None,
        }
    }

    pub fn canceller(&self) -> Canceller {
        self.engine.canceller()
    }

    pub fn run(&mut self, effects: Vec<Effect>) -> Result<()> {
        for effect in effects {
            match effect {
                Effect::StartDownload { locators } => {
                    zipper_info!("StartDownload count={}", locators.len());
                    let locators = locators.into_iter().map(Locator::from).collect();
                    self.engine
                        .start(locators)
                        .context("failed to hand the download to the engine")?;
                }
                Effect::SaveArchive { file_name, bytes } => {
                    let path = self
                        .writer
                        .write(&file_name, &bytes)
                        .with_context(|| format!("failed to save {file_name}"))?;
                    zipper_info!("Saved {} ({} bytes)", path.display(), bytes.len());
                    self.saved = Some(path);
                }
            }
        }
        Ok(())
    }

    /// Block until the engine reports something the core cares about.
    pub fn next_msg(&self) -> Result<Msg> {
        loop {
            let event = self.engine.recv().context("engine stopped unexpectedly")?;
            if let Some(msg) = map_event(event) {
                return Ok(msg);
            }
        }
    }

    pub fn take_saved(&mut self) -> Option<PathBuf> {
        self.saved.take()
    }
}

/// Translate an engine event into a core message. Run-state changes are
/// tracked by the core itself and produce nothing.
pub fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::RunStateChanged(_) => None,
        EngineEvent::Progress(snapshot) => Some(Msg::DownloadProgress {
            completed: snapshot.completed,
            total: snapshot.total,
        }),
        EngineEvent::ItemFailed { ordinal, error } => Some(Msg::ItemFailed {
            ordinal,
            reason: error.kind.to_string(),
        }),
        EngineEvent::RunCompleted(Ok(outcome)) => {
            let entry_count = outcome.archive.entry_count();
            let failed_count = outcome.summary.failed_count();
            Some(Msg::DownloadFinished {
                archive: outcome.archive.into_bytes(),
                entry_count,
                failed_count,
            })
        }
        EngineEvent::RunCompleted(Err(err)) => {
            zipper_warn!("Run ended without an archive: {}", err);
            Some(Msg::DownloadFailed(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use zipper_core::Msg;
    use zipper_engine::{
        EngineEvent, FailureKind, FetchError, Locator, PipelineError, ProgressSnapshot, RunState,
    };

    use super::map_event;

    #[test]
    fn progress_and_failures_become_messages() {
        assert_eq!(
            map_event(EngineEvent::Progress(ProgressSnapshot {
                completed: 2,
                total: 5
            })),
            Some(Msg::DownloadProgress {
                completed: 2,
                total: 5
            })
        );
        let error = FetchError::new(
            Locator::new("https://img.example/x.png"),
            FailureKind::HttpStatus(404),
            "404 Not Found",
        );
        assert_eq!(
            map_event(EngineEvent::ItemFailed { ordinal: 3, error }),
            Some(Msg::ItemFailed {
                ordinal: 3,
                reason: "http status 404".to_string()
            })
        );
    }

    #[test]
    fn run_state_changes_are_dropped() {
        assert_eq!(
            map_event(EngineEvent::RunStateChanged(RunState::Running)),
            None
        );
    }

    #[test]
    fn failed_run_reports_the_reason() {
        assert_eq!(
            map_event(EngineEvent::RunCompleted(Err(PipelineError::Cancelled))),
            Some(Msg::DownloadFailed("download run was cancelled".to_string()))
        );
    }
}
