use std::fmt;

use crate::archive::ArchiveBlob;
use crate::progress::ProgressSnapshot;

/// 1-based position of a locator in the submitted list.
pub type Ordinal = usize;

/// Opaque address of a remote binary resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Locator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Locator {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    RunStateChanged(RunState),
    Progress(ProgressSnapshot),
    ItemFailed { ordinal: Ordinal, error: FetchError },
    /// Final result of a run started through [`crate::EngineHandle`].
    RunCompleted(Result<RunOutcome, crate::PipelineError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

impl Payload {
    pub fn content_type(&self) -> Option<&str> {
        self.metadata.content_type.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

pub type FetchResult = Result<Payload, FetchError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetching {locator} failed: {kind} ({message})")]
pub struct FetchError {
    pub locator: Locator,
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(locator: Locator, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            locator,
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Counts for one finished run. Failed items are kept in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<(Ordinal, FetchError)>,
}

impl RunSummary {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.succeeded == self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub archive: ArchiveBlob,
    pub summary: RunSummary,
}
