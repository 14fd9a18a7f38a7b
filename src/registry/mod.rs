//! Room registry
//!
//! The registry owns every room. Each room runs its own delivery worker that
//! fans lines out to the members' outbound queues.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<RoomRegistry>
//!                     ┌─────────────────────────┐
//!                     │ rooms: BTreeMap<Name,   │
//!                     │   Arc<Room> {           │
//!                     │     queue, members,     │
//!                     │     worker task         │
//!                     │   }                     │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Connection]            [Connection]            [Connection]
//!    room.enqueue()          outbound_rx             outbound_rx
//!         │                       ▲                       ▲
//!         └──► worker ──► log ────┴──── member.push() ────┘
//! ```
//!
//! Messages within one room reach every member in enqueue order. Membership
//! is snapshotted per line, so a member joining while a line is being
//! delivered does not get that line.

pub mod config;
pub mod member;
pub mod persistence;
pub mod room;
pub mod store;

pub use config::RegistryConfig;
pub use member::{Member, PushOutcome};
pub use persistence::RoomLog;
pub use room::{Room, RoomState};
pub use store::RoomRegistry;
