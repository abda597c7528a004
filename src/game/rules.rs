//! Duel Rules
//!
//! Tunable constants for a duel. Defaults reproduce the standard game.

use std::str::FromStr;
use thiserror::Error;

use crate::core::permille::Permille;
use crate::game::state::{DEFAULT_MAX_HEALTH, DEFAULT_MAX_MANA, DEFAULT_STARTING_COINS};

/// How often status effects tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickCadence {
    /// Both members tick after every completed action.
    EveryAction,
    /// Both members tick after every second completed action.
    EveryRound,
}

impl FromStr for TickCadence {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "action" | "every_action" => Ok(TickCadence::EveryAction),
            "round" | "every_round" => Ok(TickCadence::EveryRound),
            _ => Err(()),
        }
    }
}

/// What happens to the remaining member when the other disconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectPolicy {
    /// No winner. The remaining member gets the draw-tier reward.
    Draw,
    /// The remaining member wins.
    Forfeit,
}

impl FromStr for DisconnectPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draw" => Ok(DisconnectPolicy::Draw),
            "forfeit" => Ok(DisconnectPolicy::Forfeit),
            _ => Err(()),
        }
    }
}

/// Malformed configuration value.
#[derive(Debug, Clone, Error)]
#[error("invalid value {value:?} for {var}")]
pub struct ConfigError {
    /// Environment variable name.
    pub var: &'static str,
    /// Offending value.
    pub value: String,
}

/// Rule constants for every duel on this server.
#[derive(Debug, Clone)]
pub struct DuelRules {
    /// Health a new player starts with (also the maximum).
    pub starting_health: u32,
    /// Mana a new player starts with (also the maximum).
    pub starting_mana: u32,
    /// Coins a new player starts with.
    pub starting_coins: u32,
    /// Mana regenerated per tick.
    pub mana_regen: u32,
    /// Coins paid to a non-winner.
    pub base_coins: u32,
    /// XP reported to a non-winner.
    pub base_xp: u32,
    /// Winner's coin multiplier (2000 = 2x).
    pub winner_coin_multiplier: Permille,
    /// Winner's XP multiplier (1500 = 1.5x).
    pub winner_xp_multiplier: Permille,
    /// Effect tick cadence.
    pub tick_cadence: TickCadence,
    /// Disconnect handling.
    pub disconnect_policy: DisconnectPolicy,
    /// Server seed mixed into every room's RNG.
    pub seed: u64,
}

impl Default for DuelRules {
    fn default() -> Self {
        Self {
            starting_health: DEFAULT_MAX_HEALTH,
            starting_mana: DEFAULT_MAX_MANA,
            starting_coins: DEFAULT_STARTING_COINS,
            mana_regen: 5,
            base_coins: 50,
            base_xp: 100,
            winner_coin_multiplier: 2000,
            winner_xp_multiplier: 1500,
            tick_cadence: TickCadence::EveryAction,
            disconnect_policy: DisconnectPolicy::Draw,
            seed: 0,
        }
    }
}

impl DuelRules {
    /// Defaults overridden by environment variables.
    ///
    /// - `DUEL_SEED`: u64 server seed
    /// - `DUEL_TICK_CADENCE`: `action` or `round`
    /// - `DUEL_DISCONNECT_POLICY`: `draw` or `forfeit`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut rules = Self::default();
        if let Some(seed) = env_parse("DUEL_SEED")? {
            rules.seed = seed;
        }
        if let Some(cadence) = env_parse("DUEL_TICK_CADENCE")? {
            rules.tick_cadence = cadence;
        }
        if let Some(policy) = env_parse("DUEL_DISCONNECT_POLICY")? {
            rules.disconnect_policy = policy;
        }
        Ok(rules)
    }
}

/// Read and parse an optional environment variable.
pub(crate) fn env_parse<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError { var, value }),
        Err(_) => Ok(None),
    }
}
