//! Player Registry
//!
//! Every connected participant and their persistent stats.

use std::collections::BTreeMap;

use crate::game::rules::DuelRules;
use crate::game::state::{Player, PlayerId};
use crate::network::protocol::RosterEntry;

/// Connected players, keyed by id.
#[derive(Debug, Clone)]
pub struct PlayerRegistry {
    players: BTreeMap<PlayerId, Player>,
    max_health: u32,
    max_mana: u32,
    starting_coins: u32,
}

impl PlayerRegistry {
    /// Create a registry that hands out the given starting stats.
    pub fn new(rules: &DuelRules) -> Self {
        Self {
            players: BTreeMap::new(),
            max_health: rules.starting_health,
            max_mana: rules.starting_mana,
            starting_coins: rules.starting_coins,
        }
    }

    /// Register a player. An existing id is renamed and keeps its stats.
    pub fn create(&mut self, id: PlayerId, name: String) -> &Player {
        let (max_health, max_mana, coins) = (self.max_health, self.max_mana, self.starting_coins);
        let player = self.players
            .entry(id)
            .or_insert_with(|| Player::with_stats(id, String::new(), max_health, max_mana, coins));
        player.name = name;
        player
    }

    /// Look up a player.
    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Look up a player mutably.
    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// Borrow two distinct players mutably at once.
    pub fn pair_mut(&mut self, a: &PlayerId, b: &PlayerId) -> Option<(&mut Player, &mut Player)> {
        if a == b {
            return None;
        }

        let mut first = None;
        let mut second = None;
        for (id, player) in self.players.iter_mut() {
            if id == a {
                first = Some(player);
            } else if id == b {
                second = Some(player);
            }
        }

        match (first, second) {
            (Some(first), Some(second)) => Some((first, second)),
            _ => None,
        }
    }

    /// Delete a player record.
    ///
    /// Ending the player's room first is the caller's job.
    pub fn remove(&mut self, id: &PlayerId) -> Option<Player> {
        self.players.remove(id)
    }

    /// Is this id registered?
    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    /// Registered player count.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// True if nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Roster of everyone online, in id order.
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.players
            .values()
            .map(|p| RosterEntry {
                id: p.id,
                name: p.name.clone(),
                in_session: p.in_session,
            })
            .collect()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new(&DuelRules::default())
    }
}
