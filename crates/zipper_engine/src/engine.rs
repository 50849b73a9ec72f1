use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use zipper_logging::{zipper_error, zipper_info};

use crate::fetch::{ClientBuildError, Fetcher};
use crate::pipeline::{EngineConfig, Pipeline};
use crate::sink::ChannelProgressSink;
use crate::{EngineEvent, Locator};

enum EngineCommand {
    Run {
        locators: Vec<Locator>,
        cancel: CancellationToken,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error(transparent)]
    Client(#[from] ClientBuildError),
    #[error("engine worker has stopped")]
    Disconnected,
}

/// Runs the pipeline on a background thread with a single-threaded runtime.
///
/// Commands are processed one at a time; events for every run come back over
/// one channel, each run ending with `EngineEvent::RunCompleted`.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    cancel: Arc<Mutex<CancellationToken>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_pipeline(Pipeline::from_config(&config)?)
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_pipeline(Pipeline::new(fetcher, &config))
    }

    fn with_pipeline(pipeline: Pipeline) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let cancel = Arc::new(Mutex::new(CancellationToken::new()));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                runtime.block_on(handle_command(&pipeline, command, event_tx.clone()));
            }
            zipper_info!("Engine worker shutting down");
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            cancel,
        })
    }

    /// Queue a run. A `cancel` issued any time after this call reaches it.
    pub fn start(&self, locators: Vec<Locator>) -> Result<(), EngineError> {
        let cancel = run_token(&self.cancel);
        self.cmd_tx
            .send(EngineCommand::Run { locators, cancel })
            .map_err(|_| EngineError::Disconnected)
    }

    /// Abandon the run in progress and any runs queued behind it.
    pub fn cancel(&self) {
        self.canceller().cancel();
    }

    /// A handle that can cancel runs from another thread.
    pub fn canceller(&self) -> Canceller {
        Canceller {
            cancel: self.cancel.clone(),
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn recv(&self) -> Result<EngineEvent, EngineError> {
        self.event_rx.recv().map_err(|_| EngineError::Disconnected)
    }
}

#[derive(Clone)]
pub struct Canceller {
    cancel: Arc<Mutex<CancellationToken>>,
}

impl Canceller {
    pub fn cancel(&self) {
        match self.cancel.lock() {
            Ok(token) => token.cancel(),
            Err(_) => zipper_error!("Cancellation token lock poisoned"),
        }
    }
}

async fn handle_command(
    pipeline: &Pipeline,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Run { locators, cancel } => {
            let sink = ChannelProgressSink::new(event_tx.clone());
            let result = pipeline.run_with_cancel(locators, &sink, &cancel).await;
            let _ = event_tx.send(EngineEvent::RunCompleted(result));
        }
    }
}

/// Token for a run being queued. Runs queued since the last cancel share
/// one token; once it has fired, the next run gets a fresh one.
fn run_token(cancel: &Mutex<CancellationToken>) -> CancellationToken {
    match cancel.lock() {
        Ok(mut guard) => {
            if guard.is_cancelled() {
                *guard = CancellationToken::new();
            }
            guard.clone()
        }
        Err(_) => {
            zipper_error!("Cancellation token lock poisoned");
            CancellationToken::new()
        }
    }
}
