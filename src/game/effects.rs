//! Status Effects
//!
//! Timed effects (poison, shield, strength, freeze) live in an [`EffectSet`]
//! keyed by [`EffectKind`], so a player can never hold two effects of the
//! same kind. Permanent modifiers bought in the shop live in
//! [`PermanentEffects`], keyed by [`PermanentKind`].

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::permille::Permille;
use crate::game::state::Player;

// =============================================================================
// TIMED EFFECTS
// =============================================================================

/// Kind of timed status effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Loses `value` health on every tick.
    Poison,
    /// Reduces incoming damage by `value`.
    Shield,
    /// Adds `value` to outgoing damage.
    Strength,
    /// Skips the holder's next turn. `value` is unused.
    Freeze,
}

/// A single timed effect instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEffect {
    /// Effect kind.
    #[serde(rename = "type")]
    pub kind: EffectKind,
    /// Remaining duration in ticks.
    pub duration: u32,
    /// Magnitude (damage per tick, reduction, or bonus).
    pub value: u32,
}

/// Timed effects on one player, at most one per kind.
///
/// Serialized as a list of `{type, duration, value}` objects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TimedEffect>", into = "Vec<TimedEffect>")]
pub struct EffectSet {
    effects: BTreeMap<EffectKind, TimedEffect>,
}

impl EffectSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect, overwriting duration and value if the kind is
    /// already present. Returns the replaced effect.
    pub fn add(&mut self, kind: EffectKind, duration: u32, value: u32) -> Option<TimedEffect> {
        self.effects.insert(kind, TimedEffect { kind, duration, value })
    }

    /// Remove an effect by kind.
    pub fn remove(&mut self, kind: EffectKind) -> Option<TimedEffect> {
        self.effects.remove(&kind)
    }

    /// Check whether an effect of this kind is active.
    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.contains_key(&kind)
    }

    /// Get an effect by kind.
    pub fn get(&self, kind: EffectKind) -> Option<&TimedEffect> {
        self.effects.get(&kind)
    }

    /// Value of an effect, or 0 if absent.
    pub fn value_of(&self, kind: EffectKind) -> u32 {
        self.get(kind).map_or(0, |e| e.value)
    }

    /// Iterate effects in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &TimedEffect> {
        self.effects.values()
    }

    /// Number of active effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// True if no effects are active.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Remove all effects.
    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

impl From<Vec<TimedEffect>> for EffectSet {
    fn from(list: Vec<TimedEffect>) -> Self {
        let mut set = EffectSet::new();
        for effect in list {
            set.add(effect.kind, effect.duration, effect.value);
        }
        set
    }
}

impl From<EffectSet> for Vec<TimedEffect> {
    fn from(set: EffectSet) -> Self {
        set.effects.into_values().collect()
    }
}

// =============================================================================
// PERMANENT EFFECTS
// =============================================================================

/// Kind of permanent modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermanentKind {
    /// Flat reduction of incoming damage.
    DamageReduction,
    /// Permille added to accuracy before the 100% cap.
    AccuracyBoost,
    /// Permille of weapon damage dealt that heals the attacker.
    LifeSteal,
}

/// Permanent modifiers on one player, at most one value per kind.
///
/// Persists across duels and is never sent to clients.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermanentEffects {
    modifiers: BTreeMap<PermanentKind, u32>,
}

impl PermanentEffects {
    /// Set a modifier, returning the previous value.
    pub fn set(&mut self, kind: PermanentKind, value: u32) -> Option<u32> {
        self.modifiers.insert(kind, value)
    }

    /// Get a modifier.
    pub fn get(&self, kind: PermanentKind) -> Option<u32> {
        self.modifiers.get(&kind).copied()
    }

    /// Flat damage reduction (0 if none).
    pub fn damage_reduction(&self) -> u32 {
        self.get(PermanentKind::DamageReduction).unwrap_or(0)
    }

    /// Accuracy boost in permille (0 if none).
    pub fn accuracy_boost(&self) -> Permille {
        self.get(PermanentKind::AccuracyBoost).unwrap_or(0)
    }

    /// Life-steal ratio in permille (0 if none).
    pub fn life_steal(&self) -> Permille {
        self.get(PermanentKind::LifeSteal).unwrap_or(0)
    }

    /// Number of modifiers held.
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// True if no modifiers are held.
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

// =============================================================================
// TICK
// =============================================================================

/// What a single tick did to a player.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Health lost to poison.
    pub poison_damage: u32,
    /// Mana regenerated.
    pub mana_restored: u32,
    /// Effects that expired this tick.
    pub expired: Vec<EffectKind>,
}

/// Advance a player's effects by one tick.
///
/// Poison deals its value and counts down. Effects whose duration has
/// reached zero are dropped. Mana regenerates by `mana_regen`, capped.
///
/// Only poison counts down here. Shield and strength last until the duel
/// ends, and freeze is consumed by the turn scheduler.
pub fn tick(player: &mut Player, mana_regen: u32) -> TickReport {
    let mut report = TickReport::default();

    let mut poison_damage = 0;
    if let Some(poison) = player.effects.effects.get_mut(&EffectKind::Poison) {
        poison_damage = poison.value;
        poison.duration = poison.duration.saturating_sub(1);
    }
    report.poison_damage = player.apply_damage(poison_damage);

    player.effects.effects.retain(|kind, effect| {
        let keep = effect.duration > 0;
        if !keep {
            report.expired.push(*kind);
        }
        keep
    });

    report.mana_restored = player.restore_mana(mana_regen);
    report
}
