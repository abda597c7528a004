//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are JSON text frames tagged by `type`.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::game::combat::{ActionSummary, PlayerAction};
use crate::game::rewards::Rewards;
use crate::game::state::{PlayerId, PublicPlayerState, RoomId};

/// `winner_name` sent when a duel ends without a winner.
pub const DRAW_NAME: &str = "Draw";

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Register under a display name and enter matchmaking.
    Join {
        /// Display name.
        name: String,
    },

    /// Attack with a weapon.
    UseWeapon {
        /// Catalog weapon id.
        weapon: String,
    },

    /// Cast a skill.
    UseSkill {
        /// Catalog skill id.
        skill: String,
    },

    /// Buy a shop item. `price`, if sent, must equal the catalog price.
    BuyItem {
        /// Catalog item id.
        item: String,
        /// Price the client saw.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        price: Option<u32>,
    },

    /// Consume an inventory item.
    UseItem {
        /// Inventory item id.
        item: String,
    },

    /// Re-enter matchmaking after a duel.
    PlayAgain,

    /// Leave the matchmaking queue. Ignored during a duel.
    Leave,

    /// Ping for latency measurement.
    Ping {
        /// Client clock, echoed back.
        timestamp: u64,
    },
}

impl ClientMessage {
    /// The duel action this message carries, if any.
    pub fn into_action(self) -> Option<PlayerAction> {
        match self {
            ClientMessage::UseWeapon { weapon } => Some(PlayerAction::UseWeapon { weapon }),
            ClientMessage::UseSkill { skill } => Some(PlayerAction::UseSkill { skill }),
            ClientMessage::BuyItem { item, price } => Some(PlayerAction::BuyItem { item, price }),
            ClientMessage::UseItem { item } => Some(PlayerAction::UseItem { item }),
            _ => None,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join acknowledged.
    Joined {
        /// Id assigned to this connection.
        player_id: PlayerId,
        /// Registered display name.
        name: String,
    },

    /// Everyone online.
    Roster {
        /// Registered players in id order.
        players: Vec<RosterEntry>,
    },

    /// A duel started.
    SessionStart(SessionStartInfo),

    /// State after an action.
    State(StateUpdate),

    /// A duel ended.
    SessionEnd(SessionEndInfo),

    /// Message for one player.
    Notification {
        /// Text to show.
        message: String,
        /// Severity.
        level: NotificationLevel,
    },

    /// Pong response.
    Pong {
        /// Timestamp from the ping.
        timestamp: u64,
        /// Server clock in Unix milliseconds.
        server_time: u64,
    },

    /// Error message.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown {
        /// Why the server is going away.
        reason: String,
    },
}

/// One roster line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// In a duel right now.
    pub in_session: bool,
}

/// Duel start snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStartInfo {
    /// Room identifier.
    pub room_id: RoomId,
    /// Both members' public state.
    pub players: BTreeMap<PlayerId, PublicPlayerState>,
    /// Member who acts first.
    pub current_player: PlayerId,
}

/// Snapshot after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Both members' public state.
    pub players: BTreeMap<PlayerId, PublicPlayerState>,
    /// Member to act next.
    pub current_player: PlayerId,
    /// Log line for the action.
    pub last_action_text: String,
    /// Structured summary of the action.
    pub last_action_summary: ActionSummary,
}

/// Duel end result, per recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEndInfo {
    /// Winner, or `None` on a draw.
    pub winner_id: Option<PlayerId>,
    /// Winner's name, or [`DRAW_NAME`].
    pub winner_name: String,
    /// The recipient's own payout.
    pub rewards: Rewards,
}

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Something the player asked for succeeded.
    Success,
}

/// Server error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Frame could not be parsed.
    InvalidInput,
    /// Connection limit reached; the socket closes after this.
    ServerOverloaded,
}

impl ServerMessage {
    /// Build an error message.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError { code, message: message.into() })
    }

    /// Build a notification.
    pub fn notify(level: NotificationLevel, message: impl Into<String>) -> Self {
        ServerMessage::Notification { message: message.into(), level }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
