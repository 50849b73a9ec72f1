#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Contents of a locator list, one locator per line.
    InputLoaded(String),
    /// Flip the selection of one row (0-based).
    ItemToggled { index: usize },
    SelectAllToggled,
    DownloadClicked,
    /// Engine progress for the active run.
    DownloadProgress { completed: usize, total: usize },
    /// One selected locator could not be fetched. `ordinal` is 1-based.
    ItemFailed { ordinal: usize, reason: String },
    /// Engine finished the run and produced an archive.
    DownloadFinished {
        archive: Vec<u8>,
        entry_count: usize,
        failed_count: usize,
    },
    /// Run aborted without an archive (cancelled or internal error).
    DownloadFailed(String),
}
