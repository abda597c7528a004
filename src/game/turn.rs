//! Turn Scheduling
//!
//! Runs after every successful in-duel action: ticks effects, checks the
//! win condition, and hands the turn over (or not, if the next player is
//! frozen).

use tracing::debug;

use crate::game::effects::{tick, EffectKind};
use crate::game::rules::{DuelRules, TickCadence};
use crate::game::state::{Player, PlayerId, Room, RoomPhase};

/// Result of advancing a room by one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The duel goes on.
    Continue {
        /// Player to act next.
        current: PlayerId,
        /// Player whose turn was skipped by freeze.
        skipped: Option<PlayerId>,
    },
    /// The duel is over. `None` is a draw.
    Ended {
        /// Sole survivor.
        winner: Option<PlayerId>,
    },
}

/// Post-action turn state machine.
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    mana_regen: u32,
    cadence: TickCadence,
}

impl TurnScheduler {
    /// Build from rule constants.
    pub fn from_rules(rules: &DuelRules) -> Self {
        Self {
            mana_regen: rules.mana_regen,
            cadence: rules.tick_cadence,
        }
    }

    /// Whether the action about to complete should tick effects.
    fn ticks_now(&self, room: &Room) -> bool {
        match self.cadence {
            TickCadence::EveryAction => true,
            TickCadence::EveryRound => room.turn_count % 2 == 1,
        }
    }

    /// Advance `room` after the current player acted.
    ///
    /// `actor` is the current player and `other` the opponent. A freeze
    /// skip notice is appended to `log`. On a finished duel the room phase
    /// becomes [`RoomPhase::Ended`] and the turn count is left alone.
    pub fn advance(
        &self,
        room: &mut Room,
        actor: &mut Player,
        other: &mut Player,
        log: &mut String,
    ) -> TurnOutcome {
        if self.ticks_now(room) {
            let a = tick(actor, self.mana_regen);
            let b = tick(other, self.mana_regen);
            if a.poison_damage > 0 || b.poison_damage > 0 {
                debug!(
                    "Room {} poison tick: {} -{}, {} -{}",
                    room.id.short(), actor.name, a.poison_damage, other.name, b.poison_damage,
                );
            }
        }

        let winner = match (actor.is_alive(), other.is_alive()) {
            (true, true) => None,
            (true, false) => Some(Some(actor.id)),
            (false, true) => Some(Some(other.id)),
            (false, false) => Some(None),
        };
        if let Some(winner) = winner {
            room.phase = RoomPhase::Ended;
            return TurnOutcome::Ended { winner };
        }

        let skipped = if other.effects.remove(EffectKind::Freeze).is_some() {
            log.push_str(&format!(" {} is frozen and skips their turn!", other.name));
            Some(other.id)
        } else {
            room.current = other.id;
            None
        };

        room.turn_count += 1;

        TurnOutcome::Continue { current: room.current, skipped }
    }
}

impl Default for TurnScheduler {
    fn default() -> Self {
        Self::from_rules(&DuelRules::default())
    }
}
