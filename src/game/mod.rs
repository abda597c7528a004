//! Game Logic Module
//!
//! Duel rules and resolution. Deterministic given a room's RNG.
//!
//! ## Module Structure
//!
//! - `catalog`: Weapons, skills, shop items
//! - `state`: Players, rooms, public snapshots
//! - `effects`: Timed and permanent status effects, per-action tick
//! - `combat`: Action validation and resolution
//! - `turn`: Win check and turn handover
//! - `rewards`: End-of-duel payouts
//! - `rules`: Tunable constants

pub mod catalog;
pub mod combat;
pub mod effects;
pub mod rewards;
pub mod rules;
pub mod state;
pub mod turn;

// Re-export key types
pub use catalog::{Catalog, CatalogError, ItemEffect, ShopItem, Skill, SkillEffect, Weapon};
pub use combat::{ActionError, ActionOutcome, ActionSummary, CombatResolver, PlayerAction, ViolationKind};
pub use effects::{EffectKind, EffectSet, PermanentEffects, PermanentKind, TimedEffect};
pub use rewards::{RewardCalculator, Rewards};
pub use rules::{ConfigError, DisconnectPolicy, DuelRules, TickCadence};
pub use state::{Player, PlayerId, PublicPlayerState, Room, RoomId, RoomPhase};
pub use turn::{TurnOutcome, TurnScheduler};
