//! Network Layer
//!
//! Players, matchmaking, rooms, and the WebSocket server.
//! The engine here is synchronous; only `server` touches sockets.

pub mod engine;
pub mod matchmaking;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

pub use engine::{Command, Delivery, DuelEngine, Outbox, Recipient};
pub use matchmaking::Matchmaker;
pub use protocol::{
    ClientMessage, ServerMessage, RosterEntry, SessionStartInfo, StateUpdate,
    SessionEndInfo, NotificationLevel, ErrorCode,
};
pub use registry::PlayerRegistry;
pub use server::{GameServer, ServerConfig, GameServerError};
pub use session::RoomManager;
