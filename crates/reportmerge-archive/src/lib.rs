//! Zip codec for report archives.
//!
//! A report bundle embeds one zip archive holding `report.json` plus one JSON
//! document per test file. This crate decodes such an archive into ordered
//! [`ArchiveEntry`] values and encodes an ordered entry list back into zip
//! bytes. It does not deduplicate paths; that is the merger's job.

use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Seek, Write};
use thiserror::Error;

/// Upper bound on the buffer reserved up front from an entry's declared
/// size. Larger entries still decode; the buffer grows as data arrives.
const SIZE_HINT_LIMIT: u64 = 1 << 20;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("corrupt archive: {0}")]
    Corrupt(#[source] zip::result::ZipError),
    #[error("corrupt archive entry `{path}`: {source}")]
    CorruptEntry {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write archive: {0}")]
    Write(#[source] zip::result::ZipError),
    #[error("i/o failure while writing archive: {0}")]
    Io(#[from] std::io::Error),
}

/// One named file inside a report archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// UTF-8 view of the content.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.content)
    }
}

/// Compression applied to every written entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

/// Archive writer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub compression: Compression,
    /// Deflate level; `None` uses the zip crate default.
    #[serde(default)]
    pub compression_level: Option<i64>,
}

/// Decode a complete in-memory zip archive, preserving entry order.
pub fn decode_archive(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(ArchiveError::Corrupt)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(ArchiveError::Corrupt)?;
        if file.is_dir() {
            continue;
        }
        let path = file.name().to_string();
        let declared = file.size();
        let mut content = Vec::with_capacity(declared.min(SIZE_HINT_LIMIT) as usize);
        file.read_to_end(&mut content)
            .map_err(|source| ArchiveError::CorruptEntry {
                path: path.clone(),
                source,
            })?;
        if content.len() as u64 != declared {
            return Err(ArchiveError::CorruptEntry {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("header declares {declared} bytes, entry holds {}", content.len()),
                ),
                path,
            });
        }
        entries.push(ArchiveEntry { path, content });
    }

    Ok(entries)
}

/// Write `entries` as a zip archive into `writer`, in the given order.
///
/// Entry timestamps are pinned to the zip epoch so identical entry lists
/// always produce identical bytes.
pub fn encode_archive<'a, W, I>(
    entries: I,
    writer: W,
    config: &ArchiveConfig,
) -> Result<W, ArchiveError>
where
    W: Write + Seek,
    I: IntoIterator<Item = &'a ArchiveEntry>,
{
    let method = match config.compression {
        Compression::Deflated => zip::CompressionMethod::Deflated,
        Compression::Stored => zip::CompressionMethod::Stored,
    };
    let opts: zip::write::FileOptions<()> = zip::write::FileOptions::default()
        .compression_method(method)
        .compression_level(config.compression_level)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);

    let mut zip = zip::ZipWriter::new(writer);
    for entry in entries {
        zip.start_file(entry.path.as_str(), opts)
            .map_err(ArchiveError::Write)?;
        zip.write_all(&entry.content)?;
    }
    zip.finish().map_err(ArchiveError::Write)
}

/// Encode `entries` into an owned byte buffer.
pub fn encode_archive_to_vec<'a, I>(entries: I, config: &ArchiveConfig) -> Result<Vec<u8>, ArchiveError>
where
    I: IntoIterator<Item = &'a ArchiveEntry>,
{
    let cursor = encode_archive(entries, Cursor::new(Vec::new()), config)?;
    Ok(cursor.into_inner())
}
