//! A chat room and its delivery worker
//!
//! Each room owns a FIFO of pending lines and a membership set behind one
//! short-lived mutex. A dedicated tokio task (the worker) pops one line at a
//! time, snapshots the membership, releases the lock, then logs the line and
//! pushes it to every snapshotted member. No I/O happens under the lock.
//!
//! ```text
//!  enqueue() ──► [ queue: VecDeque<Bytes> ] ──► worker ──► RoomLog
//!                [ members: Vec<Member>  ]        │
//!                                                 └──► member.push() ──► writer task ──► TCP
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::protocol::codec::encode_frame;

use super::member::{Member, PushOutcome};
use super::persistence::RoomLog;

/// Lifecycle of a room's worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Worker running, queue accepting lines
    Active,
    /// Stop requested; remaining lines are still delivered
    Draining,
    /// Worker exited
    Stopped,
}

struct RoomInner {
    queue: VecDeque<Bytes>,
    members: Vec<Member>,
    state: RoomState,
}

enum Job {
    Deliver(Bytes, Vec<Member>),
    Wait,
    Exit,
}

/// A named broadcast channel with ordered delivery
pub struct Room {
    name: String,
    inner: Mutex<RoomInner>,
    wakeup: Notify,
    worker: Mutex<Option<JoinHandle<()>>>,
    delivered: AtomicU64,
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Room {
    /// Create a room and start its worker
    ///
    /// The worker takes ownership of `log`.
    pub fn spawn(name: impl Into<String>, log: RoomLog, rotate_bytes: u64) -> Arc<Self> {
        let room = Arc::new(Self {
            name: name.into(),
            inner: Mutex::new(RoomInner {
                queue: VecDeque::new(),
                members: Vec::new(),
                state: RoomState::Active,
            }),
            wakeup: Notify::new(),
            worker: Mutex::new(None),
            delivered: AtomicU64::new(0),
        });

        let handle = tokio::spawn(Arc::clone(&room).run_worker(log, rotate_bytes));
        *room.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        room
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RoomState {
        self.lock().state
    }

    /// Number of lines the worker has delivered so far
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Number of lines waiting for the worker
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Append a line to the queue and wake the worker
    ///
    /// Never waits on delivery. Lines enqueued after the worker has stopped
    /// are discarded.
    pub fn enqueue(&self, line: impl Into<Bytes>) {
        let line = line.into();
        {
            let mut inner = self.lock();
            if inner.state == RoomState::Stopped {
                tracing::debug!(room = %self.name, "Line dropped, room stopped");
                return;
            }
            inner.queue.push_back(line);
        }
        self.wakeup.notify_one();
    }

    /// Add a member; returns false if the connection was already a member
    pub fn add_member(&self, member: Member) -> bool {
        let mut inner = self.lock();
        if inner.members.iter().any(|m| m.id == member.id) {
            return false;
        }

        tracing::debug!(room = %self.name, member = %member.name, "Member added");
        inner.members.push(member);
        true
    }

    /// Remove a member by connection id; returns false if it was absent
    pub fn remove_member(&self, id: u64) -> bool {
        let mut inner = self.lock();
        let before = inner.members.len();
        inner.members.retain(|m| m.id != id);
        before != inner.members.len()
    }

    /// Snapshot of member names in join order
    pub fn list_members(&self) -> Vec<String> {
        self.lock().members.iter().map(|m| m.name.clone()).collect()
    }

    pub fn member_count(&self) -> usize {
        self.lock().members.len()
    }

    /// Ask the worker to drain its queue and exit, then wait for it
    pub async fn stop(&self) {
        {
            let mut inner = self.lock();
            if inner.state == RoomState::Active {
                inner.state = RoomState::Draining;
            }
        }
        self.wakeup.notify_one();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(room = %self.name, error = %e, "Room worker failed");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, RoomInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_job(&self) -> Job {
        let mut inner = self.lock();
        match inner.queue.pop_front() {
            Some(line) => Job::Deliver(line, inner.members.clone()),
            None if inner.state == RoomState::Draining => {
                inner.state = RoomState::Stopped;
                Job::Exit
            }
            None => Job::Wait,
        }
    }

    async fn run_worker(self: Arc<Self>, mut log: RoomLog, rotate_bytes: u64) {
        tracing::debug!(room = %self.name, "Room worker started");

        loop {
            match self.next_job() {
                Job::Deliver(line, members) => {
                    self.deliver(&line, &members, &mut log).await;
                    if let Err(e) = log.rotate_if_needed(rotate_bytes).await {
                        tracing::warn!(room = %self.name, error = %e, "Room log rotation failed");
                    }
                }
                Job::Wait => self.wakeup.notified().await,
                Job::Exit => break,
            }
        }

        tracing::debug!(
            room = %self.name,
            delivered = self.delivered_count(),
            "Room worker stopped"
        );
    }

    async fn deliver(&self, line: &Bytes, members: &[Member], log: &mut RoomLog) {
        if let Err(e) = log.append(line).await {
            tracing::warn!(room = %self.name, error = %e, "Room log append failed");
        }

        let frame = encode_frame(line);
        for member in members.iter().filter(|m| m.is_open()) {
            match member.push(frame.clone()) {
                PushOutcome::Queued => {}
                PushOutcome::Full => {
                    tracing::warn!(
                        room = %self.name,
                        member = %member.name,
                        "Outbound queue full, line skipped"
                    );
                }
                PushOutcome::Closed => {
                    tracing::trace!(room = %self.name, member = %member.name, "Member gone");
                }
            }
        }

        self.delivered.fetch_add(1, Ordering::Relaxed);
    }
}
