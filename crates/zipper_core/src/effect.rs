/// File name the finished archive is saved under.
pub const ARCHIVE_FILE_NAME: &str = "images.zip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch these locators, in this order, into one archive.
    StartDownload { locators: Vec<String> },
    SaveArchive { file_name: String, bytes: Vec<u8> },
}
