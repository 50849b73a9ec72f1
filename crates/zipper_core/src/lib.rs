//! Zipper core: pure state machine and view-model helpers.
mod effect;
mod ingest;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, ARCHIVE_FILE_NAME};
pub use ingest::{display_name, parse_locators};
pub use msg::Msg;
pub use state::{AppState, DownloadPhase, SelectableItem};
pub use update::update;
pub use view_model::{AppViewModel, ItemRowView, ProgressView};
