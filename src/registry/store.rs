//! Room registry implementation
//!
//! The process-wide name → room table. Rooms are created lazily on first
//! JOIN and never removed.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{Error, Result};

use super::config::RegistryConfig;
use super::persistence::RoomLog;
use super::room::Room;

/// Central registry for all rooms
///
/// Thread-safe via `RwLock`: lookups and listings share the read lock,
/// creation takes the write lock.
pub struct RoomRegistry {
    /// Map of room name to room
    rooms: RwLock<BTreeMap<String, Arc<Room>>>,

    /// Configuration
    config: RegistryConfig,
}

impl RoomRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            rooms: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Look up a room without creating it
    pub async fn get(&self, name: &str) -> Option<Arc<Room>> {
        self.rooms.read().await.get(name).cloned()
    }

    /// Return the room called `name`, creating it if needed
    ///
    /// Creation (opening the log and starting the worker) happens under the
    /// write lock, so concurrent callers for the same new name all receive
    /// the same instance.
    pub async fn get_or_create(&self, name: &str) -> Result<Arc<Room>> {
        if let Some(room) = self.get(name).await {
            return Ok(room);
        }

        let mut rooms = self.rooms.write().await;

        // Another caller may have created it while we waited for the lock
        if let Some(room) = rooms.get(name) {
            return Ok(Arc::clone(room));
        }

        let log = match &self.config.log_dir {
            Some(dir) => RoomLog::open(dir, name)
                .await
                .map_err(|source| Error::RoomUnavailable {
                    room: name.to_string(),
                    source,
                })?,
            None => RoomLog::disabled(),
        };

        let room = Room::spawn(name, log, self.config.log_rotate_bytes);
        rooms.insert(name.to_string(), Arc::clone(&room));

        tracing::info!(room = %name, rooms = rooms.len(), "Room created");

        Ok(room)
    }

    /// Snapshot of every room name with its member count, sorted by name
    pub async fn list(&self) -> Vec<(String, usize)> {
        let rooms = self.rooms.read().await;
        rooms
            .iter()
            .map(|(name, room)| (name.clone(), room.member_count()))
            .collect()
    }

    /// Get total number of rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Drain and stop every room worker
    ///
    /// Rooms stay in the table; lines enqueued afterwards are discarded.
    pub async fn shutdown(&self) {
        let rooms: Vec<Arc<Room>> = self.rooms.read().await.values().cloned().collect();

        for room in &rooms {
            room.stop().await;
        }

        tracing::info!(rooms = rooms.len(), "Room workers stopped");
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::room::RoomState;

    fn registry() -> RoomRegistry {
        RoomRegistry::with_config(RegistryConfig::default().without_logs())
    }

    #[tokio::test]
    async fn test_get_unknown_room() {
        let registry = registry();
        assert!(registry.get("general").await.is_none());
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let registry = registry();

        let a = registry.get_or_create("general").await.unwrap();
        let b = registry.get_or_create("general").await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.room_count().await, 1);
        assert!(Arc::ptr_eq(&a, &registry.get("general").await.unwrap()));
    }

    #[tokio::test]
    async fn test_names_are_case_sensitive() {
        let registry = registry();

        let lower = registry.get_or_create("general").await.unwrap();
        let upper = registry.get_or_create("General").await.unwrap();

        assert!(!Arc::ptr_eq(&lower, &upper));
        assert_eq!(registry.room_count().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creation_yields_one_room() {
        let registry = Arc::new(registry());

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.get_or_create("fresh").await.unwrap() })
            })
            .collect();

        let mut rooms = Vec::new();
        for task in tasks {
            rooms.push(task.await.unwrap());
        }

        assert_eq!(registry.room_count().await, 1);
        assert!(rooms.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_list_snapshot() {
        let registry = registry();
        assert!(registry.list().await.is_empty());

        let (tx, _rx) = tokio::sync::mpsc::channel(4);
        let random = registry.get_or_create("random").await.unwrap();
        registry.get_or_create("general").await.unwrap();
        random.add_member(crate::registry::Member::new(1, "alice", tx));

        assert_eq!(
            registry.list().await,
            vec![("general".to_string(), 0), ("random".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_log_open_failure_reports_room_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the log directory should be
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();

        let registry = RoomRegistry::with_config(RegistryConfig::default().log_dir(&blocker));
        let err = registry.get_or_create("general").await.unwrap_err();

        assert!(matches!(err, Error::RoomUnavailable { ref room, .. } if room == "general"));
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_rooms_log_under_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let registry = RoomRegistry::with_config(RegistryConfig::default().log_dir(dir.path()));

        let room = registry.get_or_create("general").await.unwrap();
        room.enqueue("[SYS] hello");
        registry.shutdown().await;

        assert_eq!(room.state(), RoomState::Stopped);
        let contents = std::fs::read_to_string(dir.path().join("room_general.log")).unwrap();
        assert_eq!(contents, "[SYS] hello\n");
    }
}
