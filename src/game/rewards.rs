//! End-of-Duel Rewards

use serde::{Serialize, Deserialize};

use crate::core::permille::apply_permille;
use crate::game::rules::DuelRules;
use crate::game::state::Player;

/// Payout for one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    /// Coins credited to the player record.
    pub coins: u32,
    /// XP, reported only.
    pub xp: u32,
}

/// Computes and credits duel payouts.
#[derive(Debug, Clone)]
pub struct RewardCalculator {
    winner: Rewards,
    other: Rewards,
}

impl RewardCalculator {
    /// Build from rule constants.
    pub fn from_rules(rules: &DuelRules) -> Self {
        Self {
            winner: Rewards {
                coins: apply_permille(rules.base_coins, rules.winner_coin_multiplier),
                xp: apply_permille(rules.base_xp, rules.winner_xp_multiplier),
            },
            other: Rewards {
                coins: rules.base_coins,
                xp: rules.base_xp,
            },
        }
    }

    /// Payout for a winner or for anyone else (loser, or either side of a draw).
    pub fn rewards_for(&self, is_winner: bool) -> Rewards {
        if is_winner { self.winner } else { self.other }
    }

    /// Credit coins to the player and return the payout.
    pub fn credit(&self, player: &mut Player, is_winner: bool) -> Rewards {
        let rewards = self.rewards_for(is_winner);
        player.coins = player.coins.saturating_add(rewards.coins);
        rewards
    }
}

impl Default for RewardCalculator {
    fn default() -> Self {
        Self::from_rules(&DuelRules::default())
    }
}
