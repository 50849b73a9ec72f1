use pretty_assertions::assert_eq;
use zipper_core::{update, AppState, DownloadPhase, Effect, Msg, ProgressView, ARCHIVE_FILE_NAME};

fn loaded_with_selection(selected: &[usize]) -> AppState {
    let input = "https://img.example/1.png\nhttps://img.example/2.png\nhttps://img.example/3.png\n";
    let (mut state, _) = update(AppState::new(), Msg::InputLoaded(input.to_string()));
    for &index in selected {
        state = update(state, Msg::ItemToggled { index }).0;
    }
    state
}

fn start(state: AppState) -> AppState {
    let (state, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(effects.len(), 1);
    state
}

#[test]
fn download_emits_selected_locators_in_list_order() {
    let state = loaded_with_selection(&[2, 0]);
    let (state, effects) = update(state, Msg::DownloadClicked);

    assert_eq!(
        effects,
        vec![Effect::StartDownload {
            locators: vec![
                "https://img.example/1.png".to_string(),
                "https://img.example/3.png".to_string(),
            ],
        }]
    );
    let view = state.view();
    assert_eq!(view.phase, DownloadPhase::Running);
    assert!(!view.download_enabled);
    assert_eq!(view.progress, Some(ProgressView::new(0, 2)));
}

#[test]
fn download_without_selection_is_noop() {
    let mut state = loaded_with_selection(&[]);
    assert!(state.consume_dirty());

    let (mut next, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.is_empty());
    assert_eq!(next.phase(), DownloadPhase::Idle);
    assert!(!next.consume_dirty());
}

#[test]
fn second_click_while_running_is_ignored() {
    let state = start(loaded_with_selection(&[0]));
    let (state, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), DownloadPhase::Running);
}

#[test]
fn selection_is_frozen_while_running() {
    let state = start(loaded_with_selection(&[0]));
    let before = state.items().to_vec();

    let (state, _) = update(state, Msg::ItemToggled { index: 1 });
    let (state, _) = update(state, Msg::SelectAllToggled);
    let (state, _) = update(state, Msg::InputLoaded("https://new.example/x.png".to_string()));

    assert_eq!(state.items(), before.as_slice());
}

#[test]
fn progress_updates_the_view_and_never_regresses() {
    let state = start(loaded_with_selection(&[0, 1, 2]));

    let (state, _) = update(state, Msg::DownloadProgress { completed: 1, total: 3 });
    assert_eq!(state.view().progress.unwrap().label, "33.33%");

    let (state, _) = update(state, Msg::DownloadProgress { completed: 2, total: 3 });
    let (state, _) = update(state, Msg::DownloadProgress { completed: 1, total: 3 });
    let progress = state.view().progress.unwrap();
    assert_eq!(progress.completed, 2);
    assert_eq!(progress.label, "66.67%");
}

#[test]
fn finished_download_saves_archive_and_returns_to_idle() {
    let state = start(loaded_with_selection(&[0, 1, 2]));
    let (state, _) = update(
        state,
        Msg::ItemFailed {
            ordinal: 2,
            reason: "http status 404".to_string(),
        },
    );
    let (state, _) = update(state, Msg::DownloadProgress { completed: 3, total: 3 });

    let (state, effects) = update(
        state,
        Msg::DownloadFinished {
            archive: vec![b'P', b'K', 5, 6],
            entry_count: 2,
            failed_count: 1,
        },
    );

    assert_eq!(
        effects,
        vec![Effect::SaveArchive {
            file_name: ARCHIVE_FILE_NAME.to_string(),
            bytes: vec![b'P', b'K', 5, 6],
        }]
    );
    assert_eq!(ARCHIVE_FILE_NAME, "images.zip");
    let view = state.view();
    assert_eq!(view.phase, DownloadPhase::Idle);
    assert_eq!(view.progress, None);
    assert_eq!(view.failed_count, 1);
    assert_eq!(state.failures(), [(2, "http status 404".to_string())]);
    assert_eq!(
        view.status.as_deref(),
        Some("Archive ready: 2 file(s), 1 failed")
    );
    assert!(view.download_enabled);
}

#[test]
fn next_run_starts_from_zero_progress() {
    let state = start(loaded_with_selection(&[0, 1]));
    let (state, _) = update(state, Msg::DownloadProgress { completed: 2, total: 2 });
    let (state, _) = update(
        state,
        Msg::DownloadFinished {
            archive: Vec::new(),
            entry_count: 2,
            failed_count: 0,
        },
    );

    let state = start(state);
    assert_eq!(state.view().progress, Some(ProgressView::new(0, 2)));
    assert_eq!(state.view().failed_count, 0);
}

#[test]
fn failed_download_returns_to_idle_without_saving() {
    let state = start(loaded_with_selection(&[1]));
    let (state, effects) = update(state, Msg::DownloadFailed("download run was cancelled".to_string()));

    assert!(effects.is_empty());
    assert_eq!(state.phase(), DownloadPhase::Idle);
    assert_eq!(
        state.view().status.as_deref(),
        Some("Download failed: download run was cancelled")
    );
}

#[test]
fn engine_messages_outside_a_run_are_ignored() {
    let state = loaded_with_selection(&[0]);
    let (state, effects) = update(
        state,
        Msg::DownloadFinished {
            archive: vec![1],
            entry_count: 1,
            failed_count: 0,
        },
    );
    assert!(effects.is_empty());
    let (state, _) = update(state, Msg::DownloadProgress { completed: 1, total: 1 });
    assert_eq!(state.view().progress, None);
}
