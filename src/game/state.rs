//! Game State Definitions
//!
//! Players, rooms, and the public snapshot sent to clients.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::rng::DeterministicRng;
use crate::game::effects::{EffectSet, PermanentEffects};

/// Starting and maximum health.
pub const DEFAULT_MAX_HEALTH: u32 = 100;

/// Starting and maximum mana.
pub const DEFAULT_MAX_MANA: u32 = 50;

/// Coins a new player starts with.
pub const DEFAULT_STARTING_COINS: u32 = 100;

// =============================================================================
// IDS
// =============================================================================

/// Unique player identifier.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Generate a fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from a UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Short hex prefix for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.as_bytes()[..4])
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Unique room identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Generate a fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Short hex prefix for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.as_bytes()[..4])
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// A connected participant.
///
/// Health and mana are kept in `[0, max]` by every mutator on this type.
#[derive(Clone, Debug)]
pub struct Player {
    /// Unique player ID
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Current health
    pub health: u32,

    /// Maximum health
    pub max_health: u32,

    /// Current mana
    pub mana: u32,

    /// Maximum mana
    pub max_mana: u32,

    /// Coins (persist across duels)
    pub coins: u32,

    /// Consumable item counts by catalog id
    pub inventory: BTreeMap<String, u32>,

    /// Timed effects (cleared at duel start)
    pub effects: EffectSet,

    /// Permanent shop modifiers (persist across duels)
    pub permanent: PermanentEffects,

    /// Is the player in a duel?
    pub in_session: bool,

    /// Room the player is in, if any
    pub room_id: Option<RoomId>,
}

impl Player {
    /// Create a player with default stats.
    pub fn new(id: PlayerId, name: String) -> Self {
        Self::with_stats(id, name, DEFAULT_MAX_HEALTH, DEFAULT_MAX_MANA, DEFAULT_STARTING_COINS)
    }

    /// Create a player with explicit maximums and starting coins.
    pub fn with_stats(id: PlayerId, name: String, max_health: u32, max_mana: u32, coins: u32) -> Self {
        Self {
            id,
            name,
            health: max_health,
            max_health,
            mana: max_mana,
            max_mana,
            coins,
            inventory: BTreeMap::new(),
            effects: EffectSet::new(),
            permanent: PermanentEffects::default(),
            in_session: false,
            room_id: None,
        }
    }

    /// Is the player still standing?
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Lose health, floored at 0. Returns the amount actually lost.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.health);
        self.health -= lost;
        lost
    }

    /// Gain health, capped at max. Returns the amount actually gained.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let gained = amount.min(self.max_health.saturating_sub(self.health));
        self.health += gained;
        gained
    }

    /// Gain mana, capped at max. Returns the amount actually gained.
    pub fn restore_mana(&mut self, amount: u32) -> u32 {
        let gained = amount.min(self.max_mana.saturating_sub(self.mana));
        self.mana += gained;
        gained
    }

    /// Spend mana if enough is available.
    pub fn spend_mana(&mut self, cost: u32) -> bool {
        if self.mana < cost {
            return false;
        }
        self.mana -= cost;
        true
    }

    /// Spend coins if enough are available.
    pub fn spend_coins(&mut self, price: u32) -> bool {
        if self.coins < price {
            return false;
        }
        self.coins -= price;
        true
    }

    /// Count of an inventory item.
    pub fn item_count(&self, item_id: &str) -> u32 {
        self.inventory.get(item_id).copied().unwrap_or(0)
    }

    /// Restore full health and mana and drop timed effects.
    ///
    /// Coins, inventory, and permanent modifiers are kept.
    pub fn reset_for_duel(&mut self) {
        self.health = self.max_health;
        self.mana = self.max_mana;
        self.effects.clear();
    }

    /// Snapshot of what clients may see.
    pub fn public_state(&self) -> PublicPlayerState {
        PublicPlayerState {
            id: self.id,
            name: self.name.clone(),
            health: self.health,
            max_health: self.max_health,
            mana: self.mana,
            max_mana: self.max_mana,
            coins: self.coins,
            inventory: self.inventory.clone(),
            effects: self.effects.clone(),
        }
    }
}

/// Client-visible player state. Permanent modifiers are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPlayerState {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Current mana.
    pub mana: u32,
    /// Maximum mana.
    pub max_mana: u32,
    /// Coins.
    pub coins: u32,
    /// Item counts by catalog id.
    pub inventory: BTreeMap<String, u32>,
    /// Active timed effects.
    pub effects: EffectSet,
}

// =============================================================================
// ROOM
// =============================================================================

/// Room lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    /// Duel in progress.
    Active,
    /// Win condition met or a member left.
    Ended,
}

/// One two-player duel.
#[derive(Clone, Debug)]
pub struct Room {
    /// Room identifier
    pub id: RoomId,

    /// Members in seat order, fixed at creation
    pub members: [PlayerId; 2],

    /// Whose turn it is
    pub current: PlayerId,

    /// Completed actions
    pub turn_count: u32,

    /// Lifecycle phase
    pub phase: RoomPhase,

    /// Hit rolls for this room
    pub rng: DeterministicRng,
}

impl Room {
    /// Create an active room. The first member acts first.
    pub fn new(id: RoomId, members: [PlayerId; 2], rng_seed: u64) -> Self {
        Self {
            id,
            members,
            current: members[0],
            turn_count: 0,
            phase: RoomPhase::Active,
            rng: DeterministicRng::new(rng_seed),
        }
    }

    /// Is the duel still running?
    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase == RoomPhase::Active
    }

    /// The other member, if `player_id` is a member.
    pub fn opponent_of(&self, player_id: &PlayerId) -> Option<PlayerId> {
        match self.members {
            [a, b] if a == *player_id => Some(b),
            [a, b] if b == *player_id => Some(a),
            _ => None,
        }
    }
}
