//! Administrative commands (`CMD /list`, `CMD /users`, `CMD /leave`)

use crate::error::CommandError;
use crate::protocol::constants::{MAX_REPLY_LEN, SYS_PREFIX};
use crate::protocol::notice;
use crate::protocol::Command;
use crate::registry::RoomRegistry;
use crate::session::ClientState;

/// Run one command for `client`, returning the line to send back
///
/// Errors are recoverable; the caller reports them as `[ERR] <CODE>` and
/// keeps the connection open.
pub async fn handle_command(
    registry: &RoomRegistry,
    client: &mut ClientState,
    command: &Command,
) -> Result<String, CommandError> {
    match command {
        Command::List => Ok(list_rooms(registry).await),
        Command::Users => {
            let room_name = client.current_room().ok_or(CommandError::NotInRoom)?;
            let room = registry
                .get(room_name)
                .await
                .ok_or_else(|| CommandError::RoomNotFound(room_name.to_string()))?;

            let members = room.list_members();
            let head = format!("users in {}: ", room_name);
            let users = if members.is_empty() {
                "<empty>".to_string()
            } else {
                join_within(members, reply_budget(&head))
            };
            Ok(notice::system(format!("{}{}", head, users)))
        }
        Command::Leave => {
            let room_name = client.leave_room().ok_or(CommandError::NotInRoom)?;
            if let Some(room) = registry.get(&room_name).await {
                room.remove_member(client.id);
                room.enqueue(notice::left(&client.name));
            }

            tracing::debug!(session_id = client.id, room = %room_name, "Client left room");
            Ok(notice::ok(format!("left {}", room_name)))
        }
        Command::Unknown(cmd) => Err(CommandError::UnknownCommand(cmd.clone())),
    }
}

async fn list_rooms(registry: &RoomRegistry) -> String {
    let rooms = registry.list().await;
    if rooms.is_empty() {
        return notice::system("rooms: <none>");
    }

    let head = "rooms: ";
    let listing = join_within(
        rooms
            .iter()
            .map(|(name, count)| format!("{}({})", name, count)),
        reply_budget(head),
    );
    notice::system(format!("{}{}", head, listing))
}

const TRUNCATED: &str = ", ...";

/// Bytes left for a listing after the system prefix and `head`
fn reply_budget(head: &str) -> usize {
    MAX_REPLY_LEN.saturating_sub(SYS_PREFIX.len() + head.len())
}

/// Join `items` with `", "`, stopping on an item boundary once `budget`
/// bytes would be exceeded and marking the cut with `", ..."`
fn join_within<I>(items: I, budget: usize) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out = String::new();
    let mut items = items.into_iter().peekable();

    while let Some(item) = items.next() {
        let item = item.as_ref();
        let sep = if out.is_empty() { 0 } else { 2 };
        // Non-final items must leave room for the marker
        let limit = if items.peek().is_some() {
            budget.saturating_sub(TRUNCATED.len())
        } else {
            budget
        };

        if out.len() + sep + item.len() > limit {
            out.push_str(if out.is_empty() { "..." } else { TRUNCATED });
            break;
        }
        if sep > 0 {
            out.push_str(", ");
        }
        out.push_str(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use bytes::Bytes;
    use tokio::sync::mpsc;

    use super::*;
    use crate::protocol::constants::CLIENT_MAX_FRAME_SIZE;
    use crate::registry::RegistryConfig;

    fn registry() -> RoomRegistry {
        RoomRegistry::with_config(RegistryConfig::default().without_logs())
    }

    fn client(id: u64, name: &str) -> (ClientState, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(16);
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let mut client = ClientState::new(id, addr, tx);
        client.name = name.to_string();
        (client, rx)
    }

    async fn join(registry: &RoomRegistry, client: &mut ClientState, room: &str) {
        let r = registry.get_or_create(room).await.unwrap();
        r.add_member(client.member());
        client.room = Some(room.to_string());
    }

    #[tokio::test]
    async fn test_list_without_rooms() {
        let registry = registry();
        let (mut alice, _rx) = client(1, "alice");

        let out = handle_command(&registry, &mut alice, &Command::List).await;
        assert_eq!(out.unwrap(), "[SYS] rooms: <none>");
    }

    #[tokio::test]
    async fn test_list_with_counts() {
        let registry = registry();
        let (mut alice, _rx_a) = client(1, "alice");
        let (mut bob, _rx_b) = client(2, "bob");
        join(&registry, &mut alice, "general").await;
        join(&registry, &mut bob, "general").await;
        registry.get_or_create("random").await.unwrap();

        let out = handle_command(&registry, &mut alice, &Command::List).await;
        assert_eq!(out.unwrap(), "[SYS] rooms: general(2), random(0)");
    }

    #[tokio::test]
    async fn test_users_requires_room() {
        let registry = registry();
        let (mut alice, _rx) = client(1, "alice");

        let out = handle_command(&registry, &mut alice, &Command::Users).await;
        assert_eq!(out, Err(CommandError::NotInRoom));
    }

    #[tokio::test]
    async fn test_users_unknown_room() {
        let registry = registry();
        let (mut alice, _rx) = client(1, "alice");
        alice.room = Some("ghost".into());

        let out = handle_command(&registry, &mut alice, &Command::Users).await;
        assert_eq!(out, Err(CommandError::RoomNotFound("ghost".into())));
    }

    #[tokio::test]
    async fn test_users_lists_members() {
        let registry = registry();
        let (mut alice, _rx_a) = client(1, "alice");
        let (mut bob, _rx_b) = client(2, "bob");
        join(&registry, &mut alice, "general").await;
        join(&registry, &mut bob, "general").await;

        let out = handle_command(&registry, &mut bob, &Command::Users).await;
        assert_eq!(out.unwrap(), "[SYS] users in general: alice, bob");
    }

    #[tokio::test]
    async fn test_leave_then_users() {
        let registry = registry();
        let (mut alice, _rx_a) = client(1, "alice");
        let (mut bob, _rx_b) = client(2, "bob");
        join(&registry, &mut alice, "general").await;
        join(&registry, &mut bob, "general").await;

        let out = handle_command(&registry, &mut alice, &Command::Leave).await;
        assert_eq!(out.unwrap(), "[OK] left general");
        assert!(alice.current_room().is_none());

        let room = registry.get("general").await.unwrap();
        assert_eq!(room.list_members(), vec!["bob"]);

        let out = handle_command(&registry, &mut alice, &Command::Users).await;
        assert_eq!(out, Err(CommandError::NotInRoom));

        let out = handle_command(&registry, &mut alice, &Command::Leave).await;
        assert_eq!(out, Err(CommandError::NotInRoom));
    }

    #[tokio::test]
    async fn test_leave_notifies_remaining_members() {
        let registry = registry();
        let (mut alice, _rx_a) = client(1, "alice");
        let (mut bob, mut rx_b) = client(2, "bob");
        join(&registry, &mut alice, "general").await;
        join(&registry, &mut bob, "general").await;

        handle_command(&registry, &mut alice, &Command::Leave)
            .await
            .unwrap();

        let frame = tokio::time::timeout(std::time::Duration::from_secs(2), rx_b.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&frame[4..], b"[SYS] alice left");
    }

    #[tokio::test]
    async fn test_list_stays_within_client_capacity() {
        let registry = registry();
        let (mut alice, _rx) = client(1, "alice");
        for i in 0..80 {
            let name = format!("{:0>63}", i);
            registry.get_or_create(&name).await.unwrap();
        }

        let out = handle_command(&registry, &mut alice, &Command::List)
            .await
            .unwrap();
        assert!(out.len() < CLIENT_MAX_FRAME_SIZE);
        assert!(out.starts_with("[SYS] rooms: "));
        assert!(out.ends_with("(0), ..."));
        assert!(out.contains(&format!("{:0>63}(0)", 0)));
        assert!(!out.contains(&format!("{:0>63}(0)", 79)));
    }

    #[tokio::test]
    async fn test_users_stays_within_client_capacity() {
        let registry = registry();
        let mut receivers = Vec::new();
        for i in 0..400 {
            let (mut member, rx) = client(i, &format!("user-with-a-long-name-{:04}", i));
            join(&registry, &mut member, "general").await;
            receivers.push(rx);
        }
        let (mut alice, _rx) = client(1000, "alice");
        join(&registry, &mut alice, "general").await;

        let out = handle_command(&registry, &mut alice, &Command::Users)
            .await
            .unwrap();
        assert!(out.len() < CLIENT_MAX_FRAME_SIZE);
        assert!(out.starts_with("[SYS] users in general: user-with-a-long-name-0000, "));
        assert!(out.ends_with(", ..."));
        assert!(!out.contains("alice"));
    }

    #[test]
    fn test_join_within_cuts_on_item_boundary() {
        assert_eq!(join_within(["ab", "cd"], 9), "ab, cd");
        assert_eq!(join_within(["ab", "cd", "ef"], 10), "ab, ...");
        assert_eq!(join_within(["abcdef"], 3), "...");
        assert_eq!(join_within(Vec::<String>::new(), 10), "");
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let registry = registry();
        let (mut alice, _rx) = client(1, "alice");

        let out = handle_command(&registry, &mut alice, &Command::Unknown("/kick".into())).await;
        assert_eq!(out, Err(CommandError::UnknownCommand("/kick".into())));
    }
}
