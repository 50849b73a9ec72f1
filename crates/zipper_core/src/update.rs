use crate::ingest::parse_locators;
use crate::{AppState, DownloadPhase, Effect, Msg, ARCHIVE_FILE_NAME};

/// Pure update function: applies a message to state and returns any effects.
///
/// While a download runs, the list and its selection are frozen: ingestion
/// and toggles are ignored until the run finishes or fails.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let running = state.phase() == DownloadPhase::Running;
    let effects = match msg {
        Msg::InputLoaded(raw) => {
            if !running {
                state.replace_items(parse_locators(&raw));
            }
            Vec::new()
        }
        Msg::ItemToggled { index } => {
            if !running {
                state.toggle_item(index);
            }
            Vec::new()
        }
        Msg::SelectAllToggled => {
            if !running {
                state.toggle_all();
            }
            Vec::new()
        }
        Msg::DownloadClicked => {
            let locators = state.selected_locators();
            if running || locators.is_empty() {
                return (state, Vec::new());
            }
            state.begin_download(locators.len());
            vec![Effect::StartDownload { locators }]
        }
        Msg::DownloadProgress { completed, total } => {
            state.apply_progress(completed, total);
            Vec::new()
        }
        Msg::ItemFailed { ordinal, reason } => {
            state.record_failure(ordinal, reason);
            Vec::new()
        }
        Msg::DownloadFinished {
            archive,
            entry_count,
            failed_count,
        } => {
            if !running {
                return (state, Vec::new());
            }
            state.finish_download(entry_count, failed_count);
            vec![Effect::SaveArchive {
                file_name: ARCHIVE_FILE_NAME.to_string(),
                bytes: archive,
            }]
        }
        Msg::DownloadFailed(reason) => {
            if running {
                state.fail_download(reason);
            }
            Vec::new()
        }
    };

    (state, effects)
}
