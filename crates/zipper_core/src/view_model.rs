use crate::DownloadPhase;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub rows: Vec<ItemRowView>,
    pub select_all: bool,
    pub selected_count: usize,
    pub download_enabled: bool,
    pub phase: DownloadPhase,
    /// Present only while a download runs.
    pub progress: Option<ProgressView>,
    pub failed_count: usize,
    pub status: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRowView {
    pub index: usize,
    pub locator: String,
    pub file_name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub completed: usize,
    pub total: usize,
    /// Percentage with two decimals, e.g. `"33.33%"`.
    pub label: String,
}

impl ProgressView {
    pub fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            completed.min(total) as f64 / total as f64 * 100.0
        };
        Self {
            completed,
            total,
            label: format!("{percent:.2}%"),
        }
    }
}
