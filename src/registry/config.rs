//! Room registry configuration

use std::path::PathBuf;

/// Default log rotation threshold (10 MiB)
pub const DEFAULT_LOG_ROTATE_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for the room registry and the rooms it creates
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Directory holding one log per room (None = no persistence)
    pub log_dir: Option<PathBuf>,

    /// Size at which a room log is rotated to `.1`
    pub log_rotate_bytes: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            log_dir: Some(PathBuf::from("data")),
            log_rotate_bytes: DEFAULT_LOG_ROTATE_BYTES,
        }
    }
}

impl RegistryConfig {
    /// Set the log directory
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Disable room logs entirely
    pub fn without_logs(mut self) -> Self {
        self.log_dir = None;
        self
    }

    /// Set the rotation threshold
    pub fn log_rotate_bytes(mut self, bytes: u64) -> Self {
        self.log_rotate_bytes = bytes;
        self
    }
}
