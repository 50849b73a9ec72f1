use std::sync::Arc;

use crate::ingest::display_name;
use crate::view_model::{AppViewModel, ItemRowView, ProgressView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableItem {
    pub locator: String,
    pub file_name: String,
    pub selected: bool,
}

impl SelectableItem {
    pub fn new(locator: String) -> Self {
        let file_name = display_name(&locator);
        Self {
            locator,
            file_name,
            selected: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadPhase {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    items: Arc<[SelectableItem]>,
    select_all: bool,
    phase: DownloadPhase,
    completed: usize,
    total: usize,
    failures: Vec<(usize, String)>,
    status: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SelectableItem] {
        &self.items
    }

    pub fn phase(&self) -> DownloadPhase {
        self.phase
    }

    pub fn is_select_all(&self) -> bool {
        self.select_all
    }

    /// Failures reported during the current or last run, by ordinal.
    pub fn failures(&self) -> &[(usize, String)] {
        &self.failures
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|item| item.selected).count()
    }

    /// Selected locators in list order.
    pub fn selected_locators(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(|item| item.locator.clone())
            .collect()
    }

    pub fn view(&self) -> AppViewModel {
        let rows = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| ItemRowView {
                index,
                locator: item.locator.clone(),
                file_name: item.file_name.clone(),
                selected: item.selected,
            })
            .collect();
        let selected_count = self.selected_count();
        let progress = match self.phase {
            DownloadPhase::Running => Some(ProgressView::new(self.completed, self.total)),
            DownloadPhase::Idle => None,
        };
        AppViewModel {
            rows,
            select_all: self.select_all,
            selected_count,
            download_enabled: self.phase == DownloadPhase::Idle && selected_count > 0,
            phase: self.phase,
            progress,
            failed_count: self.failures.len(),
            status: self.status.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn replace_items(&mut self, locators: Vec<String>) {
        self.items = locators.into_iter().map(SelectableItem::new).collect();
        self.select_all = false;
        self.failures.clear();
        self.status = Some(format!("Loaded {} locator(s)", self.items.len()));
        self.mark_dirty();
    }

    /// Flip one row. Builds a fresh sequence; earlier views keep theirs.
    pub(crate) fn toggle_item(&mut self, index: usize) {
        if index >= self.items.len() {
            return;
        }
        let mut items = self.items.to_vec();
        items[index].selected = !items[index].selected;
        self.items = items.into();
        self.mark_dirty();
    }

    pub(crate) fn toggle_all(&mut self) {
        self.select_all = !self.select_all;
        let flag = self.select_all;
        self.items = self
            .items
            .iter()
            .map(|item| SelectableItem {
                selected: flag,
                ..item.clone()
            })
            .collect();
        self.mark_dirty();
    }

    pub(crate) fn begin_download(&mut self, total: usize) {
        self.phase = DownloadPhase::Running;
        self.completed = 0;
        self.total = total;
        self.failures.clear();
        self.status = Some(format!("Downloading {total} item(s)"));
        self.mark_dirty();
    }

    pub(crate) fn apply_progress(&mut self, completed: usize, total: usize) {
        if self.phase != DownloadPhase::Running {
            return;
        }
        let completed = completed.min(total);
        // Progress never moves backwards within a run.
        if total == self.total && completed <= self.completed {
            return;
        }
        self.completed = completed;
        self.total = total;
        self.mark_dirty();
    }

    pub(crate) fn record_failure(&mut self, ordinal: usize, reason: String) {
        if self.phase != DownloadPhase::Running {
            return;
        }
        self.failures.push((ordinal, reason));
        self.mark_dirty();
    }

    pub(crate) fn finish_download(&mut self, entry_count: usize, failed_count: usize) {
        self.reset_run();
        self.status = Some(if failed_count == 0 {
            format!("Archive ready: {entry_count} file(s)")
        } else {
            format!("Archive ready: {entry_count} file(s), {failed_count} failed")
        });
    }

    pub(crate) fn fail_download(&mut self, reason: String) {
        self.reset_run();
        self.status = Some(format!("Download failed: {reason}"));
    }

    fn reset_run(&mut self) {
        self.phase = DownloadPhase::Idle;
        self.completed = 0;
        self.total = 0;
        self.mark_dirty();
    }
}
