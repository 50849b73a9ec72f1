use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use zipper_engine::{EngineConfig, FetchSettings};
use zipper_logging::LogDestination;

/// Fetch a list of image URLs and pack them into images.zip.
#[derive(Debug, Parser)]
#[command(name = "zipper_app")]
#[command(version)]
pub struct Cli {
    /// Text file with one URL per line
    pub input: PathBuf,

    /// Select every URL in the list
    #[arg(long)]
    pub all: bool,

    /// Toggle the given 1-based row numbers (applied after --all)
    #[arg(long = "select", value_name = "N", num_args = 1..)]
    pub select: Vec<usize>,

    /// Print the parsed list and exit
    #[arg(long)]
    pub list: bool,

    /// Number of fetches in flight per batch
    #[arg(long, default_value_t = zipper_engine::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Directory the archive is written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,

    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Largest accepted response body in bytes
    #[arg(long)]
    pub max_bytes: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(value: LogTarget) -> Self {
        match value {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

impl Cli {
    /// Defaults overridden by whichever flags were given.
    pub fn engine_config(&self) -> EngineConfig {
        let defaults = FetchSettings::default();
        let fetch = FetchSettings {
            connect_timeout: self
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            request_timeout: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_bytes: self.max_bytes.unwrap_or(defaults.max_bytes),
            ..defaults
        };
        EngineConfig {
            fetch,
            batch_size: self.batch_size,
            ..EngineConfig::default()
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
