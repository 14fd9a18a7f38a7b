//! Append-only room logs
//!
//! One file per room, `room_<name>.log`, holding the exact delivered lines.
//! Once the file reaches the rotation threshold it is renamed to
//! `room_<name>.log.1` (replacing any older backup) and a fresh file is
//! started.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Log file name for a room
pub fn log_file_name(room: &str) -> String {
    format!("room_{}.log", room)
}

/// Backup file name for a room
pub fn backup_file_name(room: &str) -> String {
    format!("room_{}.log.1", room)
}

struct LogFile {
    file: File,
    path: PathBuf,
    backup_path: PathBuf,
    size: u64,
}

/// A room's log sink
///
/// Owned by the room's delivery worker; nothing else touches it.
pub struct RoomLog {
    inner: Option<LogFile>,
}

impl RoomLog {
    /// Open (or create) the log for `room` under `dir`
    pub async fn open(dir: &Path, room: &str) -> io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(log_file_name(room));
        let backup_path = dir.join(backup_file_name(room));
        let file = open_append(&path).await?;
        let size = file.metadata().await?.len();

        Ok(Self {
            inner: Some(LogFile {
                file,
                path,
                backup_path,
                size,
            }),
        })
    }

    /// A sink that discards everything
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Current size of the active log in bytes
    pub fn size(&self) -> u64 {
        self.inner.as_ref().map_or(0, |log| log.size)
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.as_ref().map(|log| log.path.as_path())
    }

    /// Append one line followed by a newline
    pub async fn append(&mut self, line: &[u8]) -> io::Result<()> {
        let Some(log) = self.inner.as_mut() else {
            return Ok(());
        };

        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line);
        buf.push(b'\n');

        log.file.write_all(&buf).await?;
        log.file.flush().await?;
        log.size += buf.len() as u64;
        Ok(())
    }

    /// Rotate once the active log has reached `max_bytes`
    ///
    /// Returns true if a rotation happened.
    pub async fn rotate_if_needed(&mut self, max_bytes: u64) -> io::Result<bool> {
        let Some(log) = self.inner.as_mut() else {
            return Ok(false);
        };
        if log.size < max_bytes {
            return Ok(false);
        }

        log.file.flush().await?;
        tokio::fs::rename(&log.path, &log.backup_path).await?;
        log.size = 0;

        let reopened = open_append(&log.path).await;
        self.finish_rotation(reopened)
    }

    /// Swap in the fresh active file after the old one became the backup
    ///
    /// If it could not be opened the sink is closed, so later lines never
    /// land in the backup.
    fn finish_rotation(&mut self, reopened: io::Result<File>) -> io::Result<bool> {
        match reopened {
            Ok(file) => {
                if let Some(log) = self.inner.as_mut() {
                    log.file = file;
                    tracing::debug!(path = %log.path.display(), "Room log rotated");
                }
                Ok(true)
            }
            Err(e) => {
                if let Some(log) = self.inner.take() {
                    tracing::error!(
                        path = %log.path.display(),
                        error = %e,
                        "Failed to reopen room log after rotation, logging disabled"
                    );
                }
                Err(e)
            }
        }
    }
}

async fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RoomLog::open(dir.path(), "general").await.unwrap();

        log.append(b"[alice@general] hi").await.unwrap();
        log.append(b"[SYS] bob joined").await.unwrap();

        let contents = std::fs::read_to_string(dir.path().join("room_general.log")).unwrap();
        assert_eq!(contents, "[alice@general] hi\n[SYS] bob joined\n");
        assert_eq!(log.size(), contents.len() as u64);
    }

    #[tokio::test]
    async fn test_reopen_keeps_existing_size() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut log = RoomLog::open(dir.path(), "general").await.unwrap();
            log.append(b"first").await.unwrap();
        }

        let mut log = RoomLog::open(dir.path(), "general").await.unwrap();
        assert_eq!(log.size(), 6);
        log.append(b"second").await.unwrap();

        let contents = std::fs::read_to_string(dir.path().join("room_general.log")).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_rotation_keeps_one_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RoomLog::open(dir.path(), "general").await.unwrap();

        log.append(b"0123456789").await.unwrap();
        assert!(!log.rotate_if_needed(32).await.unwrap());

        log.append(b"0123456789012345678901").await.unwrap();
        assert!(log.rotate_if_needed(32).await.unwrap());
        assert_eq!(log.size(), 0);

        log.append(b"after").await.unwrap();

        let active = std::fs::read_to_string(dir.path().join("room_general.log")).unwrap();
        let backup = std::fs::read_to_string(dir.path().join("room_general.log.1")).unwrap();
        assert_eq!(active, "after\n");
        assert_eq!(backup, "0123456789\n0123456789012345678901\n");

        // A second rotation overwrites the previous backup
        log.append(b"0123456789012345678901234567890").await.unwrap();
        assert!(log.rotate_if_needed(32).await.unwrap());
        let backup = std::fs::read_to_string(dir.path().join("room_general.log.1")).unwrap();
        assert_eq!(backup, "after\n0123456789012345678901234567890\n");
        assert!(!dir.path().join("room_general.log.2").exists());
    }

    #[tokio::test]
    async fn test_failed_reopen_closes_sink() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RoomLog::open(dir.path(), "general").await.unwrap();
        log.append(b"0123456789").await.unwrap();

        tokio::fs::rename(
            dir.path().join("room_general.log"),
            dir.path().join("room_general.log.1"),
        )
        .await
        .unwrap();
        let failed = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert!(log.finish_rotation(Err(failed)).is_err());

        assert!(!log.is_enabled());
        assert_eq!(log.size(), 0);
        log.append(b"after").await.unwrap();

        let backup = std::fs::read_to_string(dir.path().join("room_general.log.1")).unwrap();
        assert_eq!(backup, "0123456789\n");
    }

    #[tokio::test]
    async fn test_disabled_sink() {
        let mut log = RoomLog::disabled();
        assert!(!log.is_enabled());
        log.append(b"ignored").await.unwrap();
        assert!(!log.rotate_if_needed(0).await.unwrap());
        assert!(log.path().is_none());
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("rooms");

        let log = RoomLog::open(&nested, "general").await.unwrap();
        assert!(nested.join("room_general.log").exists());
        assert_eq!(log.path(), Some(nested.join("room_general.log").as_path()));
    }
}
