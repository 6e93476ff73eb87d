//! Append-only archive of reset conversations.
//!
//! Each reset of a non-empty conversation becomes one row of a CSV file with
//! the columns `Timestamp` and `Chat`.  The running program never reads the
//! archive back.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Conversation;
use crate::error::{Error, Result};
use crate::observability::ARCHIVED_ROWS;
use crate::utils::time::{format_timestamp, now};

/// One archived conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// When the conversation was archived, `YYYY-MM-DD HH:MM:SS`.
    #[serde(rename = "Timestamp")]
    pub timestamp: String,

    /// The flattened conversation, `role: content` per line.
    #[serde(rename = "Chat")]
    pub chat: String,
}

impl ArchiveEntry {
    /// Capture a conversation at the current time.
    pub fn capture(conversation: &Conversation) -> Result<Self> {
        Ok(Self {
            timestamp: format_timestamp(now())?,
            chat: conversation.transcript(),
        })
    }
}

/// A destination for archived conversations.
pub trait TranscriptArchive: Send {
    /// Durably append one entry.
    fn append(&mut self, entry: &ArchiveEntry) -> Result<()>;
}

/// A [`TranscriptArchive`] backed by a CSV file.
///
/// The header row is written when the file is created (or found empty);
/// every later append adds a data row only.
#[derive(Debug, Clone)]
pub struct CsvArchive {
    path: PathBuf,
}

impl CsvArchive {
    /// Archive to the file at `path`; it is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                Error::archive(
                    format!("failed to open archive {}: {err}", self.path.display()),
                    Some(Box::new(err)),
                )
            })
    }
}

impl TranscriptArchive for CsvArchive {
    fn append(&mut self, entry: &ArchiveEntry) -> Result<()> {
        let file = self.open()?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush().map_err(|err| {
            Error::archive(
                format!("failed to write archive {}: {err}", self.path.display()),
                Some(Box::new(err)),
            )
        })?;
        ARCHIVED_ROWS.click();
        tracing::info!(path = %self.path.display(), "archived conversation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scratch_path(name: &str) -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "palaver-archive-{}-{n}-{name}.csv",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn read_rows(path: &Path) -> Vec<ArchiveEntry> {
        csv::Reader::from_path(path)
            .unwrap()
            .deserialize()
            .collect::<std::result::Result<Vec<ArchiveEntry>, _>>()
            .unwrap()
    }

    #[test]
    fn header_written_once() {
        let path = scratch_path("header");
        let mut archive = CsvArchive::new(&path);
        for chat in ["user: a", "user: b"] {
            archive
                .append(&ArchiveEntry {
                    timestamp: "2024-01-01 00:00:00".to_string(),
                    chat: chat.to_string(),
                })
                .unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("Timestamp,Chat").count(), 1);
        assert!(contents.starts_with("Timestamp,Chat\n"));
        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].chat, "user: b");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn multiline_chat_survives_quoting() {
        let path = scratch_path("multiline");
        let mut conversation = Conversation::new();
        conversation.append(Message::user("Hello, \"friend\""));
        conversation.append(Message::assistant("Hi there!"));
        let entry = ArchiveEntry::capture(&conversation).unwrap();
        CsvArchive::new(&path).append(&entry).unwrap();
        let rows = read_rows(&path);
        assert_eq!(rows, vec![entry]);
        assert_eq!(rows[0].chat, "user: Hello, \"friend\"\nassistant: Hi there!");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritable_path_is_an_archive_error() {
        let path = std::env::temp_dir()
            .join("palaver-no-such-dir")
            .join("nested")
            .join("archive.csv");
        let err = CsvArchive::new(path)
            .append(&ArchiveEntry {
                timestamp: String::new(),
                chat: String::new(),
            })
            .unwrap_err();
        assert!(err.is_archive());
    }
}
