use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::filename::entry_name;
use crate::Ordinal;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive already contains an entry for position {ordinal} ({name})")]
    DuplicateEntry { ordinal: Ordinal, name: String },
    #[error("zip error: {0}")]
    Zip(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Zip(err.to_string())
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::Io(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

impl From<Compression> for CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// Finalized archive bytes plus the entry names it contains, in archive order.
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveBlob {
    bytes: Vec<u8>,
    entry_names: Vec<String>,
}

impl ArchiveBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn entry_names(&self) -> &[String] {
        &self.entry_names
    }

    pub fn entry_count(&self) -> usize {
        self.entry_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_names.is_empty()
    }
}

impl std::fmt::Debug for ArchiveBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveBlob")
            .field("len", &self.bytes.len())
            .field("entry_names", &self.entry_names)
            .finish()
    }
}

#[derive(Debug)]
struct PendingEntry {
    name: String,
    bytes: Vec<u8>,
}

/// Collects fetched payloads and packs them into one zip archive.
///
/// Entries are keyed by ordinal, so arrival order never affects names or the
/// layout of the finished archive. `finalize` consumes the builder.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: BTreeMap<Ordinal, PendingEntry>,
    compression: Compression,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(compression: Compression) -> Self {
        Self {
            entries: BTreeMap::new(),
            compression,
        }
    }

    /// Insert one entry and return the generated name.
    pub fn add_entry(
        &mut self,
        ordinal: Ordinal,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, ArchiveError> {
        let name = entry_name(ordinal, content_type);
        if let Some(existing) = self.entries.get(&ordinal) {
            return Err(ArchiveError::DuplicateEntry {
                ordinal,
                name: existing.name.clone(),
            });
        }
        self.entries.insert(
            ordinal,
            PendingEntry {
                name: name.clone(),
                bytes,
            },
        );
        Ok(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize every entry into a zip archive. With no entries this still
    /// yields a valid, empty archive.
    pub fn finalize(self) -> Result<ArchiveBlob, ArchiveError> {
        let options = SimpleFileOptions::default()
            .compression_method(self.compression.into())
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644);

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut entry_names = Vec::with_capacity(self.entries.len());
        for (_, entry) in self.entries {
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(&entry.bytes)?;
            entry_names.push(entry.name);
        }
        let bytes = writer.finish()?.into_inner();

        Ok(ArchiveBlob { bytes, entry_names })
    }
}
