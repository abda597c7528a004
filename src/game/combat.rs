//! Combat Resolution
//!
//! Resolves one validated action into state changes on the two duelists,
//! a log line, and an [`ActionSummary`]. Turn ownership is checked by the
//! caller; everything checked here is about the catalog and the actor's
//! resources.
//!
//! Every entry point validates before it mutates. An `Err` means neither
//! player was touched.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::permille::{apply_permille, clamp_permille, Permille};
use crate::core::rng::HitRoll;
use crate::game::catalog::{Catalog, ItemEffect, SkillEffect};
use crate::game::effects::EffectKind;
use crate::game::state::{Player, PlayerId};

/// An action a duelist can submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerAction {
    /// Attack with a weapon.
    UseWeapon {
        /// Weapon id.
        weapon: String,
    },
    /// Cast a skill.
    UseSkill {
        /// Skill id.
        skill: String,
    },
    /// Buy from the shop.
    BuyItem {
        /// Item id.
        item: String,
        /// Price the client expects to pay.
        #[serde(default)]
        price: Option<u32>,
    },
    /// Consume an inventory item.
    UseItem {
        /// Item id.
        item: String,
    },
}

/// Structured result of an action, sent alongside the log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSummary {
    /// Player the action was aimed at.
    pub target: PlayerId,
    /// Damage dealt (0 on a miss).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<u32>,
    /// Health restored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heal: Option<u32>,
}

impl ActionSummary {
    fn target(target: PlayerId) -> Self {
        Self { target, damage: None, heal: None }
    }

    fn damage(target: PlayerId, damage: u32) -> Self {
        Self { target, damage: Some(damage), heal: None }
    }

    fn heal(target: PlayerId, heal: u32) -> Self {
        Self { target, damage: None, heal: Some(heal) }
    }
}

/// Result of a resolved action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Human-readable log line.
    pub log: String,
    /// Structured summary.
    pub summary: ActionSummary,
}

/// Broad class of a rejected action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Unknown player, weapon, skill, or item, or a wrong price.
    InvalidReference,
    /// Not the actor's turn, or no active duel.
    TurnViolation,
    /// Not enough mana, coins, or items.
    ResourceViolation,
}

/// Why an action was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Actor is not registered.
    #[error("unknown player")]
    UnknownPlayer,

    /// Weapon id not in catalog.
    #[error("unknown weapon: {0}")]
    UnknownWeapon(String),

    /// Skill id not in catalog.
    #[error("unknown skill: {0}")]
    UnknownSkill(String),

    /// Item id not in catalog.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// Client price differs from catalog price.
    #[error("price mismatch: offered {offered}, catalog {catalog}")]
    PriceMismatch {
        /// Price the client sent.
        offered: u32,
        /// Catalog price.
        catalog: u32,
    },

    /// Actor is not in a duel.
    #[error("not in a session")]
    NotInSession,

    /// Actor is not the current player.
    #[error("not your turn")]
    NotYourTurn,

    /// Room has already ended.
    #[error("room is not active")]
    RoomInactive,

    /// Not enough mana.
    #[error("insufficient mana: need {needed}, have {available}")]
    InsufficientMana {
        /// Cost.
        needed: u32,
        /// Current mana.
        available: u32,
    },

    /// Not enough coins.
    #[error("insufficient coins: need {needed}, have {available}")]
    InsufficientCoins {
        /// Price.
        needed: u32,
        /// Current coins.
        available: u32,
    },

    /// Inventory holds none of this item.
    #[error("no {0} in inventory")]
    EmptyInventorySlot(String),

    /// Item is permanent and not usable from inventory.
    #[error("{0} cannot be used from inventory")]
    NotConsumable(String),

    /// Permanent modifier already held at this value.
    #[error("already own {0}")]
    AlreadyOwned(String),
}

impl ActionError {
    /// Classify the rejection.
    pub fn kind(&self) -> ViolationKind {
        match self {
            ActionError::UnknownPlayer
            | ActionError::UnknownWeapon(_)
            | ActionError::UnknownSkill(_)
            | ActionError::UnknownItem(_)
            | ActionError::PriceMismatch { .. }
            | ActionError::NotConsumable(_) => ViolationKind::InvalidReference,
            ActionError::NotInSession
            | ActionError::NotYourTurn
            | ActionError::RoomInactive => ViolationKind::TurnViolation,
            ActionError::InsufficientMana { .. }
            | ActionError::InsufficientCoins { .. }
            | ActionError::EmptyInventorySlot(_)
            | ActionError::AlreadyOwned(_) => ViolationKind::ResourceViolation,
        }
    }
}

// =============================================================================
// DAMAGE MATH
// =============================================================================

/// Hit chance after the actor's permanent accuracy boost, capped at 100%.
pub fn effective_accuracy(actor: &Player, base: Permille) -> Permille {
    clamp_permille(base.saturating_add(actor.permanent.accuracy_boost()))
}

/// Base damage plus the actor's strength bonus.
pub fn outgoing_damage(actor: &Player, base: u32) -> u32 {
    base.saturating_add(actor.effects.value_of(EffectKind::Strength))
}

/// Damage after the defender's shield, then permanent reduction.
pub fn mitigate(defender: &Player, damage: u32) -> u32 {
    damage
        .saturating_sub(defender.effects.value_of(EffectKind::Shield))
        .saturating_sub(defender.permanent.damage_reduction())
}

/// Apply a landed hit and return the damage dealt.
fn land_hit(actor: &Player, defender: &mut Player, base: u32) -> u32 {
    let damage = mitigate(defender, outgoing_damage(actor, base));
    defender.apply_damage(damage)
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Resolves actions against a catalog.
pub struct CombatResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> CombatResolver<'a> {
    /// Create a resolver.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Attack the defender with a weapon.
    pub fn use_weapon<R: HitRoll + ?Sized>(
        &self,
        actor: &mut Player,
        defender: &mut Player,
        weapon_id: &str,
        roll: &mut R,
    ) -> Result<ActionOutcome, ActionError> {
        let weapon = self.catalog
            .weapon(weapon_id)
            .ok_or_else(|| ActionError::UnknownWeapon(weapon_id.to_string()))?;

        if !actor.spend_mana(weapon.mana_cost) {
            return Err(ActionError::InsufficientMana {
                needed: weapon.mana_cost,
                available: actor.mana,
            });
        }

        if !roll.roll_hit(effective_accuracy(actor, weapon.accuracy)) {
            return Ok(ActionOutcome {
                log: format!("{} attacks with {} but misses!", actor.name, weapon.name),
                summary: ActionSummary::damage(defender.id, 0),
            });
        }

        let damage = land_hit(actor, defender, weapon.damage);
        let mut log = format!(
            "{} attacks with {} for {} damage!",
            actor.name, weapon.name, damage,
        );

        let drained = apply_permille(damage, actor.permanent.life_steal());
        if drained > 0 {
            let healed = actor.heal(drained);
            if healed > 0 {
                log.push_str(&format!(" {} drains {} HP!", actor.name, healed));
            }
        }

        Ok(ActionOutcome {
            log,
            summary: ActionSummary::damage(defender.id, damage),
        })
    }

    /// Cast a skill. Mana is paid up front, hit or miss.
    pub fn use_skill<R: HitRoll + ?Sized>(
        &self,
        actor: &mut Player,
        defender: &mut Player,
        skill_id: &str,
        roll: &mut R,
    ) -> Result<ActionOutcome, ActionError> {
        let skill = self.catalog
            .skill(skill_id)
            .ok_or_else(|| ActionError::UnknownSkill(skill_id.to_string()))?;

        if !actor.spend_mana(skill.mana_cost) {
            return Err(ActionError::InsufficientMana {
                needed: skill.mana_cost,
                available: actor.mana,
            });
        }

        if skill.effect.rolls_accuracy()
            && !roll.roll_hit(effective_accuracy(actor, skill.accuracy))
        {
            return Ok(ActionOutcome {
                log: format!("{} casts {} but misses!", actor.name, skill.name),
                summary: ActionSummary::damage(defender.id, 0),
            });
        }

        let outcome = match skill.effect {
            SkillEffect::Strike { damage } => {
                let dealt = land_hit(actor, defender, damage);
                ActionOutcome {
                    log: format!("{} casts {} for {} damage!", actor.name, skill.name, dealt),
                    summary: ActionSummary::damage(defender.id, dealt),
                }
            }
            SkillEffect::Poison { damage, duration } => {
                defender.effects.add(EffectKind::Poison, duration, damage);
                ActionOutcome {
                    log: format!(
                        "{} poisons {}! {} damage per turn for {} turns!",
                        actor.name, defender.name, damage, duration,
                    ),
                    summary: ActionSummary::damage(defender.id, damage),
                }
            }
            SkillEffect::Heal { amount } => {
                let healed = actor.heal(amount);
                ActionOutcome {
                    log: format!("{} heals for {} HP!", actor.name, healed),
                    summary: ActionSummary::heal(actor.id, healed),
                }
            }
            SkillEffect::Shield { amount, duration } => {
                actor.effects.add(EffectKind::Shield, duration, amount);
                ActionOutcome {
                    log: format!(
                        "{} casts {}! +{} defense for {} turns!",
                        actor.name, skill.name, amount, duration,
                    ),
                    summary: ActionSummary::target(actor.id),
                }
            }
            SkillEffect::Freeze { duration } => {
                defender.effects.add(EffectKind::Freeze, duration, 0);
                ActionOutcome {
                    log: format!(
                        "{} freezes {}! Skip next turn!",
                        actor.name, defender.name,
                    ),
                    summary: ActionSummary::target(defender.id),
                }
            }
        };

        Ok(outcome)
    }

    /// Buy an item at its catalog price.
    ///
    /// Permanent items set their modifier immediately; consumables go to
    /// the inventory. `offered_price`, when present, must match the catalog.
    pub fn buy_item(
        &self,
        buyer: &mut Player,
        item_id: &str,
        offered_price: Option<u32>,
    ) -> Result<ActionOutcome, ActionError> {
        let item = self.catalog
            .item(item_id)
            .ok_or_else(|| ActionError::UnknownItem(item_id.to_string()))?;

        if let Some(offered) = offered_price {
            if offered != item.price {
                return Err(ActionError::PriceMismatch { offered, catalog: item.price });
            }
        }

        if let ItemEffect::Permanent { modifier, value } = item.effect {
            if buyer.permanent.get(modifier) == Some(value) {
                return Err(ActionError::AlreadyOwned(item_id.to_string()));
            }
        }

        if !buyer.spend_coins(item.price) {
            return Err(ActionError::InsufficientCoins {
                needed: item.price,
                available: buyer.coins,
            });
        }

        match item.effect {
            ItemEffect::Permanent { modifier, value } => {
                buyer.permanent.set(modifier, value);
            }
            _ => {
                *buyer.inventory.entry(item_id.to_string()).or_insert(0) += 1;
            }
        }

        Ok(ActionOutcome {
            log: format!("{} purchased {}!", buyer.name, item.name),
            summary: ActionSummary::target(buyer.id),
        })
    }

    /// Consume one inventory item.
    pub fn use_item(
        &self,
        actor: &mut Player,
        item_id: &str,
    ) -> Result<ActionOutcome, ActionError> {
        let item = self.catalog
            .item(item_id)
            .ok_or_else(|| ActionError::UnknownItem(item_id.to_string()))?;

        if item.is_permanent() {
            return Err(ActionError::NotConsumable(item_id.to_string()));
        }

        match actor.inventory.get_mut(item_id) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return Err(ActionError::EmptyInventorySlot(item_id.to_string())),
        }

        let outcome = match item.effect {
            ItemEffect::Heal { value } => {
                let healed = actor.heal(value);
                ActionOutcome {
                    log: format!("{} uses {}! +{} HP!", actor.name, item.name, healed),
                    summary: ActionSummary::heal(actor.id, healed),
                }
            }
            ItemEffect::Mana { value } => {
                let restored = actor.restore_mana(value);
                ActionOutcome {
                    log: format!("{} uses {}! +{} MP!", actor.name, item.name, restored),
                    summary: ActionSummary::target(actor.id),
                }
            }
            ItemEffect::DamageBoost { value, duration } => {
                actor.effects.add(EffectKind::Strength, duration, value);
                ActionOutcome {
                    log: format!(
                        "{} uses {}! +{} damage for {} turns!",
                        actor.name, item.name, value, duration,
                    ),
                    summary: ActionSummary::target(actor.id),
                }
            }
            ItemEffect::Permanent { .. } => {
                return Err(ActionError::NotConsumable(item_id.to_string()));
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::permille::PERMILLE_ONE;
    use crate::core::rng::DeterministicRng;
    use crate::game::catalog::{Skill, Weapon};
    use crate::game::effects::PermanentKind;

    /// A [`HitRoll`] that always returns the same answer.
    #[derive(Debug, Clone, Copy)]
    struct FixedRoll(bool);

    impl HitRoll for FixedRoll {
        fn roll_hit(&mut self, _accuracy: Permille) -> bool {
            self.0
        }
    }

    fn duelists() -> (Player, Player) {
        (
            Player::new(PlayerId::new([1; 16]), "Alice".to_string()),
            Player::new(PlayerId::new([2; 16]), "Bob".to_string()),
        )
    }

    fn certain_catalog() -> Catalog {
        Catalog::standard().with_weapon("sure_sword", Weapon {
            name: "Sure Sword".to_string(),
            damage: 25,
            accuracy: PERMILLE_ONE,
            mana_cost: 0,
        })
    }

    #[test]
    fn test_weapon_hit_certain_accuracy() {
        let catalog = certain_catalog();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();
        // Real RNG: accuracy 1000 always lands
        let mut rng = DeterministicRng::new(1);

        let outcome = resolver.use_weapon(&mut alice, &mut bob, "sure_sword", &mut rng).unwrap();
        assert_eq!(bob.health, 75);
        assert_eq!(outcome.summary, ActionSummary::damage(bob.id, 25));
        assert_eq!(outcome.log, "Alice attacks with Sure Sword for 25 damage!");
    }

    #[test]
    fn test_weapon_miss_mutates_nothing() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();

        let outcome = resolver.use_weapon(&mut alice, &mut bob, "axe", &mut FixedRoll(false)).unwrap();
        assert_eq!(bob.health, 100);
        assert_eq!(outcome.summary.damage, Some(0));
        assert!(outcome.log.contains("misses"));
    }

    #[test]
    fn test_damage_reduction_permanent() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();
        bob.permanent.set(PermanentKind::DamageReduction, 5);

        resolver.use_weapon(&mut alice, &mut bob, "sword", &mut FixedRoll(true)).unwrap();
        assert_eq!(bob.health, 80);
    }

    #[test]
    fn test_strength_then_shield_then_armor() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();
        alice.effects.add(EffectKind::Strength, 3, 10);
        bob.effects.add(EffectKind::Shield, 3, 15);
        bob.permanent.set(PermanentKind::DamageReduction, 5);

        // 25 + 10 - 15 - 5
        let outcome = resolver.use_weapon(&mut alice, &mut bob, "sword", &mut FixedRoll(true)).unwrap();
        assert_eq!(outcome.summary.damage, Some(15));
        assert_eq!(bob.health, 85);
    }

    #[test]
    fn test_mitigation_floors_at_zero() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();
        bob.effects.add(EffectKind::Shield, 3, 15);
        bob.permanent.set(PermanentKind::DamageReduction, 5);

        let outcome = resolver.use_weapon(&mut alice, &mut bob, "dagger", &mut FixedRoll(true)).unwrap();
        assert_eq!(outcome.summary.damage, Some(0));
        assert_eq!(bob.health, 100);
    }

    #[test]
    fn test_life_steal() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();
        alice.permanent.set(PermanentKind::LifeSteal, 250);
        alice.health = 50;

        let outcome = resolver.use_weapon(&mut alice, &mut bob, "sword", &mut FixedRoll(true)).unwrap();
        // floor(25 * 0.25) = 6
        assert_eq!(alice.health, 56);
        assert!(outcome.log.contains("drains 6 HP"));
    }

    #[test]
    fn test_life_steal_capped_at_max() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();
        alice.permanent.set(PermanentKind::LifeSteal, 250);

        resolver.use_weapon(&mut alice, &mut bob, "axe", &mut FixedRoll(true)).unwrap();
        assert_eq!(alice.health, alice.max_health);
    }

    #[test]
    fn test_accuracy_boost_capped() {
        let (mut alice, _) = duelists();
        alice.permanent.set(PermanentKind::AccuracyBoost, 200);
        assert_eq!(effective_accuracy(&alice, 950), PERMILLE_ONE);
        assert_eq!(effective_accuracy(&alice, 700), 900);
    }

    #[test]
    fn test_unknown_weapon_rejected() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();

        let err = resolver.use_weapon(&mut alice, &mut bob, "trebuchet", &mut FixedRoll(true)).unwrap_err();
        assert_eq!(err.kind(), ViolationKind::InvalidReference);
        assert_eq!(bob.health, 100);
    }

    #[test]
    fn test_skill_insufficient_mana_is_noop() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();
        alice.mana = 10;

        let err = resolver.use_skill(&mut alice, &mut bob, "lightning", &mut FixedRoll(true)).unwrap_err();
        assert_eq!(err, ActionError::InsufficientMana { needed: 25, available: 10 });
        assert_eq!(err.kind(), ViolationKind::ResourceViolation);
        assert_eq!(alice.mana, 10);
        assert_eq!(bob.health, 100);
    }

    #[test]
    fn test_strike_skill_pays_mana_on_miss() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();

        let outcome = resolver.use_skill(&mut alice, &mut bob, "fireball", &mut FixedRoll(false)).unwrap();
        assert_eq!(alice.mana, 35);
        assert_eq!(bob.health, 100);
        assert_eq!(outcome.log, "Alice casts Fireball but misses!");
    }

    #[test]
    fn test_strike_skill_applies_reduction() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();
        bob.permanent.set(PermanentKind::DamageReduction, 5);

        resolver.use_skill(&mut alice, &mut bob, "lightning", &mut FixedRoll(true)).unwrap();
        assert_eq!(bob.health, 65);
        assert_eq!(alice.mana, 25);
    }

    #[test]
    fn test_poison_skill_attaches_effect_without_damage() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();

        resolver.use_skill(&mut alice, &mut bob, "poison", &mut FixedRoll(true)).unwrap();
        assert_eq!(bob.health, 100);
        let poison = bob.effects.get(EffectKind::Poison).unwrap();
        assert_eq!((poison.duration, poison.value), (3, 10));
    }

    #[test]
    fn test_heal_skill_targets_caster_without_roll() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();
        alice.health = 60;

        // A miss-only roller would fail any roll
        let outcome = resolver.use_skill(&mut alice, &mut bob, "heal", &mut FixedRoll(false)).unwrap();
        assert_eq!(alice.health, 85);
        assert_eq!(outcome.summary, ActionSummary::heal(alice.id, 25));
        assert_eq!(bob.health, 100);
    }

    #[test]
    fn test_shield_skill_on_caster() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();

        resolver.use_skill(&mut alice, &mut bob, "shield", &mut FixedRoll(false)).unwrap();
        assert_eq!(alice.effects.value_of(EffectKind::Shield), 15);
        assert!(bob.effects.is_empty());
    }

    #[test]
    fn test_freeze_skill_hit_and_miss() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();

        resolver.use_skill(&mut alice, &mut bob, "freeze", &mut FixedRoll(false)).unwrap();
        assert!(!bob.effects.has(EffectKind::Freeze));

        resolver.use_skill(&mut alice, &mut bob, "freeze", &mut FixedRoll(true)).unwrap();
        assert!(bob.effects.has(EffectKind::Freeze));
        assert_eq!(alice.mana, 50 - 36);
    }

    #[test]
    fn test_custom_skill_branches_by_shape() {
        let catalog = Catalog::standard().with_skill("venom", Skill {
            name: "Venom".to_string(),
            accuracy: PERMILLE_ONE,
            mana_cost: 1,
            effect: SkillEffect::Poison { damage: 4, duration: 2 },
        });
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, mut bob) = duelists();

        resolver.use_skill(&mut alice, &mut bob, "venom", &mut FixedRoll(true)).unwrap();
        assert_eq!(bob.effects.value_of(EffectKind::Poison), 4);
        assert_eq!(bob.health, 100);
    }

    #[test]
    fn test_buy_consumable() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, _) = duelists();

        resolver.buy_item(&mut alice, "health_potion", Some(20)).unwrap();
        resolver.buy_item(&mut alice, "health_potion", None).unwrap();
        assert_eq!(alice.coins, 60);
        assert_eq!(alice.item_count("health_potion"), 2);
    }

    #[test]
    fn test_buy_too_expensive_is_noop() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, _) = duelists();

        let err = resolver.buy_item(&mut alice, "vampire_fang", None).unwrap_err();
        assert_eq!(err, ActionError::InsufficientCoins { needed: 120, available: 100 });
        assert_eq!(alice.coins, 100);
        assert!(alice.inventory.is_empty());
        assert!(alice.permanent.is_empty());
    }

    #[test]
    fn test_buy_price_mismatch_rejected() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, _) = duelists();

        let err = resolver.buy_item(&mut alice, "strength_boost", Some(1)).unwrap_err();
        assert_eq!(err.kind(), ViolationKind::InvalidReference);
        assert_eq!(alice.coins, 100);
    }

    #[test]
    fn test_buy_permanent_sets_modifier_once() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, _) = duelists();
        alice.coins = 200;

        resolver.buy_item(&mut alice, "magic_armor", None).unwrap();
        assert_eq!(alice.permanent.damage_reduction(), 5);
        assert_eq!(alice.coins, 125);
        assert!(alice.inventory.is_empty());

        let err = resolver.buy_item(&mut alice, "magic_armor", None).unwrap_err();
        assert_eq!(err, ActionError::AlreadyOwned("magic_armor".to_string()));
        assert_eq!(alice.coins, 125);
    }

    #[test]
    fn test_use_items() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, _) = duelists();
        alice.inventory.insert("health_potion".to_string(), 1);
        alice.inventory.insert("mana_potion".to_string(), 1);
        alice.inventory.insert("strength_boost".to_string(), 1);
        alice.health = 30;
        alice.mana = 40;

        let outcome = resolver.use_item(&mut alice, "health_potion").unwrap();
        assert_eq!(alice.health, 80);
        assert_eq!(outcome.summary.heal, Some(50));

        resolver.use_item(&mut alice, "mana_potion").unwrap();
        assert_eq!(alice.mana, 50);

        resolver.use_item(&mut alice, "strength_boost").unwrap();
        assert_eq!(alice.effects.value_of(EffectKind::Strength), 10);

        assert_eq!(alice.item_count("health_potion"), 0);
        let err = resolver.use_item(&mut alice, "health_potion").unwrap_err();
        assert_eq!(err.kind(), ViolationKind::ResourceViolation);
    }

    #[test]
    fn test_use_item_not_owned() {
        let catalog = Catalog::standard();
        let resolver = CombatResolver::new(&catalog);
        let (mut alice, _) = duelists();

        assert!(matches!(
            resolver.use_item(&mut alice, "mana_potion"),
            Err(ActionError::EmptyInventorySlot(_))
        ));
        assert!(matches!(
            resolver.use_item(&mut alice, "lucky_charm"),
            Err(ActionError::NotConsumable(_))
        ));
    }

    proptest::proptest! {
        #[test]
        fn prop_mitigation_never_exceeds_outgoing(
            base in 0u32..200,
            strength in 0u32..50,
            shield in 0u32..50,
            armor in 0u32..50,
        ) {
            let (mut alice, mut bob) = duelists();
            alice.effects.add(EffectKind::Strength, 3, strength);
            bob.effects.add(EffectKind::Shield, 3, shield);
            bob.permanent.set(PermanentKind::DamageReduction, armor);

            let out = outgoing_damage(&alice, base);
            let dealt = mitigate(&bob, out);
            proptest::prop_assert_eq!(out, base + strength);
            proptest::prop_assert!(dealt <= out);
            proptest::prop_assert_eq!(dealt, out.saturating_sub(shield + armor));
        }

        #[test]
        fn prop_effective_accuracy_capped(base in 0u32..=1000, boost in 0u32..=1000) {
            let (mut alice, _) = duelists();
            alice.permanent.set(PermanentKind::AccuracyBoost, boost);
            let acc = effective_accuracy(&alice, base);
            proptest::prop_assert!(acc <= PERMILLE_ONE);
            proptest::prop_assert_eq!(acc, (base + boost).min(PERMILLE_ONE));
        }
    }

    #[test]
    fn test_summary_json_omits_empty_fields() {
        let summary = ActionSummary::target(PlayerId::new([1; 16]));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("damage"));
        assert!(!json.contains("heal"));
    }
}
