//! Zipper engine: batched fetch pipeline and in-memory archive packaging.
mod archive;
mod batch;
mod engine;
mod fetch;
mod filename;
mod persist;
mod pipeline;
mod progress;
mod sink;
mod types;

pub use archive::{ArchiveBlob, ArchiveBuilder, ArchiveError, Compression};
pub use batch::{Batch, BatchScheduler, ScheduleError, DEFAULT_BATCH_SIZE};
pub use engine::{Canceller, EngineError, EngineHandle};
pub use fetch::{ClientBuildError, FetchSettings, Fetcher, ReqwestFetcher};
pub use filename::{entry_name, extension_for, FALLBACK_EXTENSION};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{EngineConfig, Pipeline, PipelineError};
pub use progress::{ProgressAccumulator, ProgressSnapshot};
pub use sink::{ChannelProgressSink, NullProgressSink, ProgressSink};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchResult, Locator, Ordinal, Payload,
    RunOutcome, RunState, RunSummary,
};
