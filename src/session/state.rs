//! Client session state
//!
//! Tracks one connected client from accept to disconnect.

use std::net::SocketAddr;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::registry::Member;

/// Complete client state
///
/// Owned by the connection task. Rooms only ever see a [`Member`] built
/// from it.
#[derive(Debug)]
pub struct ClientState {
    /// Unique connection ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Display name (empty until a JOIN succeeds)
    pub name: String,

    /// Current room (None = not joined)
    pub room: Option<String>,

    /// Connection start time
    pub connected_at: Instant,

    /// Frames received from the client
    pub frames_received: u64,

    /// Outbound frame queue drained by the connection's writer
    outbound: mpsc::Sender<Bytes>,
}

impl ClientState {
    /// Create state for a freshly accepted connection
    pub fn new(id: u64, peer_addr: SocketAddr, outbound: mpsc::Sender<Bytes>) -> Self {
        Self {
            id,
            peer_addr,
            name: String::new(),
            room: None,
            connected_at: Instant::now(),
            frames_received: 0,
            outbound,
        }
    }

    pub fn current_room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Membership entry for the room this client joins
    pub fn member(&self) -> Member {
        Member::new(self.id, self.name.clone(), self.outbound.clone())
    }

    /// Sender for frames addressed to this client
    pub fn outbound(&self) -> &mpsc::Sender<Bytes> {
        &self.outbound
    }

    /// Clear room state, returning the room left
    pub fn leave_room(&mut self) -> Option<String> {
        self.room.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (ClientState, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(4);
        let addr: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        (ClientState::new(7, addr, tx), rx)
    }

    #[test]
    fn test_new_client_has_no_room() {
        let (client, _rx) = client();

        assert_eq!(client.id, 7);
        assert!(client.name.is_empty());
        assert!(client.current_room().is_none());
        assert_eq!(client.frames_received, 0);
    }

    #[test]
    fn test_leave_room() {
        let (mut client, _rx) = client();
        client.room = Some("general".into());

        assert_eq!(client.leave_room().as_deref(), Some("general"));
        assert!(client.leave_room().is_none());
    }

    #[test]
    fn test_member_shares_outbound_queue() {
        let (mut client, mut rx) = client();
        client.name = "alice".into();

        let member = client.member();
        assert_eq!(member.id, 7);
        assert_eq!(member.name, "alice");

        member.push(Bytes::from_static(b"x"));
        assert_eq!(rx.try_recv().unwrap(), Bytes::from_static(b"x"));
    }
}
