//! Duel Room Management
//!
//! Manages the lifecycle of duel rooms from pairing to completion:
//! creation, snapshots, termination and deletion.

use std::collections::BTreeMap;
use tracing::info;

use crate::core::rng::derive_room_seed;
use crate::game::combat::ActionSummary;
use crate::game::rewards::RewardCalculator;
use crate::game::state::{PlayerId, PublicPlayerState, Room, RoomId};
use crate::network::protocol::{SessionEndInfo, SessionStartInfo, StateUpdate, DRAW_NAME};
use crate::network::registry::PlayerRegistry;

/// Owns every active room.
#[derive(Debug, Clone)]
pub struct RoomManager {
    rooms: BTreeMap<RoomId, Room>,
    server_seed: u64,
}

impl RoomManager {
    /// Create a manager whose rooms derive their RNG from `server_seed`.
    pub fn new(server_seed: u64) -> Self {
        Self {
            rooms: BTreeMap::new(),
            server_seed,
        }
    }

    /// Open a room for two registered players who are not in a duel.
    ///
    /// Both players are reset to full health and mana with no timed
    /// effects. `p1` acts first.
    pub fn create_room(
        &mut self,
        p1: PlayerId,
        p2: PlayerId,
        registry: &mut PlayerRegistry,
    ) -> Option<SessionStartInfo> {
        self.create_room_with_id(RoomId::random(), p1, p2, registry)
    }

    /// [`create_room`](Self::create_room) with a caller-chosen id.
    pub fn create_room_with_id(
        &mut self,
        room_id: RoomId,
        p1: PlayerId,
        p2: PlayerId,
        registry: &mut PlayerRegistry,
    ) -> Option<SessionStartInfo> {
        if self.rooms.contains_key(&room_id) {
            return None;
        }

        let (a, b) = registry.pair_mut(&p1, &p2)?;
        if a.in_session || b.in_session {
            return None;
        }

        for player in [&mut *a, &mut *b] {
            player.reset_for_duel();
            player.in_session = true;
            player.room_id = Some(room_id);
        }

        let seed = derive_room_seed(
            self.server_seed,
            room_id.as_bytes(),
            &[*p1.as_bytes(), *p2.as_bytes()],
        );
        let room = Room::new(room_id, [p1, p2], seed);

        info!(
            "Room {} created: {} vs {}",
            room_id.short(), a.name, b.name,
        );

        let start = SessionStartInfo {
            room_id,
            players: public_states(&room, registry),
            current_player: room.current,
        };
        self.rooms.insert(room_id, room);
        Some(start)
    }

    /// Close a room, credit rewards, and release both members.
    ///
    /// Returns one session-end message per member still registered.
    pub fn end_room(
        &mut self,
        room_id: &RoomId,
        winner: Option<PlayerId>,
        registry: &mut PlayerRegistry,
        rewards: &RewardCalculator,
    ) -> Option<Vec<(PlayerId, SessionEndInfo)>> {
        let room = self.rooms.remove(room_id)?;

        let winner_name = winner
            .and_then(|id| registry.get(&id))
            .map_or_else(|| DRAW_NAME.to_string(), |p| p.name.clone());

        let mut results = Vec::with_capacity(2);
        for member in room.members {
            let Some(player) = registry.get_mut(&member) else {
                continue;
            };
            let payout = rewards.credit(player, winner == Some(member));
            player.in_session = false;
            player.room_id = None;
            results.push((member, SessionEndInfo {
                winner_id: winner,
                winner_name: winner_name.clone(),
                rewards: payout,
            }));
        }

        info!(
            "Room {} ended after {} turns, winner: {}",
            room_id.short(), room.turn_count, winner_name,
        );

        Some(results)
    }

    /// Current state of a room after an action.
    pub fn snapshot(
        &self,
        room_id: &RoomId,
        registry: &PlayerRegistry,
        text: String,
        summary: ActionSummary,
    ) -> Option<StateUpdate> {
        let room = self.rooms.get(room_id)?;
        Some(StateUpdate {
            players: public_states(room, registry),
            current_player: room.current,
            last_action_text: text,
            last_action_summary: summary,
        })
    }

    /// Look up a room.
    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Look up a room mutably.
    pub fn get_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    /// Is this room open?
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Open room count.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// True if no rooms are open.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(0)
    }
}

fn public_states(room: &Room, registry: &PlayerRegistry) -> BTreeMap<PlayerId, PublicPlayerState> {
    room.members
        .iter()
        .filter_map(|id| registry.get(id))
        .map(|p| (p.id, p.public_state()))
        .collect()
}
