//! Weapon, Skill, and Shop Catalog
//!
//! Immutable definitions consumed by combat resolution. The standard
//! catalog is built in; a replacement can be loaded from JSON at startup.
//!
//! Skill and item behavior is carried by their shape
//! ([`SkillEffect`], [`ItemEffect`]), never by their id.

use std::collections::BTreeMap;
use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::permille::{Permille, PERMILLE_ONE};
use crate::game::effects::PermanentKind;

/// A weapon definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    /// Display name.
    pub name: String,
    /// Base damage on hit.
    pub damage: u32,
    /// Hit chance in permille.
    pub accuracy: Permille,
    /// Mana spent per use.
    #[serde(default)]
    pub mana_cost: u32,
}

/// What a skill does when cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkillEffect {
    /// Immediate damage to the opponent.
    Strike {
        /// Base damage.
        damage: u32,
    },
    /// Poison on the opponent instead of immediate damage.
    Poison {
        /// Damage per tick.
        damage: u32,
        /// Ticks.
        duration: u32,
    },
    /// Heal the caster.
    Heal {
        /// Health restored.
        amount: u32,
    },
    /// Shield on the caster.
    Shield {
        /// Damage reduction.
        amount: u32,
        /// Duration recorded on the effect.
        duration: u32,
    },
    /// Freeze the opponent's next turn.
    Freeze {
        /// Duration recorded on the effect.
        duration: u32,
    },
}

impl SkillEffect {
    /// Whether casting rolls against accuracy.
    ///
    /// Self-targeted skills always land.
    pub fn rolls_accuracy(&self) -> bool {
        !matches!(self, SkillEffect::Heal { .. } | SkillEffect::Shield { .. })
    }
}

/// A skill definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Display name.
    pub name: String,
    /// Hit chance in permille.
    pub accuracy: Permille,
    /// Mana spent per cast.
    pub mana_cost: u32,
    /// Behavior.
    pub effect: SkillEffect,
}

/// What a shop item does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ItemEffect {
    /// Consumable: restore health.
    Heal {
        /// Health restored.
        value: u32,
    },
    /// Consumable: restore mana.
    Mana {
        /// Mana restored.
        value: u32,
    },
    /// Consumable: grant a strength effect.
    DamageBoost {
        /// Bonus damage.
        value: u32,
        /// Duration recorded on the effect.
        duration: u32,
    },
    /// Bought once, applied immediately, persists across duels.
    Permanent {
        /// Modifier set on purchase.
        modifier: PermanentKind,
        /// Modifier value.
        value: u32,
    },
}

/// A shop item definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    /// Display name.
    pub name: String,
    /// Price in coins.
    pub price: u32,
    /// Behavior.
    #[serde(flatten)]
    pub effect: ItemEffect,
}

impl ShopItem {
    /// True for items applied on purchase rather than stored.
    pub fn is_permanent(&self) -> bool {
        matches!(self.effect, ItemEffect::Permanent { .. })
    }
}

/// Catalog loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    /// File is not a valid catalog.
    #[error("invalid catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// All weapons, skills, and shop items, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    weapons: BTreeMap<String, Weapon>,
    skills: BTreeMap<String, Skill>,
    items: BTreeMap<String, ShopItem>,
}

impl Catalog {
    /// The standard catalog.
    pub fn standard() -> Self {
        let weapons = [
            ("sword", weapon("Iron Sword", 25, 800)),
            ("axe", weapon("Battle Axe", 30, 700)),
            ("bow", weapon("Elven Bow", 20, 900)),
            ("dagger", weapon("Swift Dagger", 15, 950)),
        ];

        let skills = [
            ("fireball", skill("Fireball", 850, 15, SkillEffect::Strike { damage: 35 })),
            ("heal", skill("Heal", PERMILLE_ONE, 20, SkillEffect::Heal { amount: 25 })),
            ("lightning", skill("Lightning", 900, 25, SkillEffect::Strike { damage: 40 })),
            ("shield", skill("Magic Shield", PERMILLE_ONE, 10, SkillEffect::Shield { amount: 15, duration: 3 })),
            ("poison", skill("Poison", 900, 12, SkillEffect::Poison { damage: 10, duration: 3 })),
            ("freeze", skill("Freeze", 800, 18, SkillEffect::Freeze { duration: 1 })),
        ];

        let items = [
            ("health_potion", item("Health Potion", 20, ItemEffect::Heal { value: 50 })),
            ("mana_potion", item("Mana Potion", 15, ItemEffect::Mana { value: 25 })),
            ("strength_boost", item("Strength Boost", 50, ItemEffect::DamageBoost { value: 10, duration: 3 })),
            ("magic_armor", item("Magic Armor", 75, ItemEffect::Permanent {
                modifier: PermanentKind::DamageReduction,
                value: 5,
            })),
            ("lucky_charm", item("Lucky Charm", 100, ItemEffect::Permanent {
                modifier: PermanentKind::AccuracyBoost,
                value: 200,
            })),
            ("vampire_fang", item("Vampire Fang", 120, ItemEffect::Permanent {
                modifier: PermanentKind::LifeSteal,
                value: 250,
            })),
        ];

        Self {
            weapons: weapons.into_iter().map(|(id, w)| (id.to_string(), w)).collect(),
            skills: skills.into_iter().map(|(id, s)| (id.to_string(), s)).collect(),
            items: items.into_iter().map(|(id, i)| (id.to_string(), i)).collect(),
        }
    }

    /// Parse a catalog from JSON.
    pub fn from_json(s: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Look up a weapon.
    pub fn weapon(&self, id: &str) -> Option<&Weapon> {
        self.weapons.get(id)
    }

    /// Look up a skill.
    pub fn skill(&self, id: &str) -> Option<&Skill> {
        self.skills.get(id)
    }

    /// Look up a shop item.
    pub fn item(&self, id: &str) -> Option<&ShopItem> {
        self.items.get(id)
    }

    /// Add or replace a weapon (catalog construction only).
    pub fn with_weapon(mut self, id: &str, weapon: Weapon) -> Self {
        self.weapons.insert(id.to_string(), weapon);
        self
    }

    /// Add or replace a skill (catalog construction only).
    pub fn with_skill(mut self, id: &str, skill: Skill) -> Self {
        self.skills.insert(id.to_string(), skill);
        self
    }

    /// Number of weapons, skills, and items.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.weapons.len(), self.skills.len(), self.items.len())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn weapon(name: &str, damage: u32, accuracy: Permille) -> Weapon {
    Weapon { name: name.to_string(), damage, accuracy, mana_cost: 0 }
}

fn skill(name: &str, accuracy: Permille, mana_cost: u32, effect: SkillEffect) -> Skill {
    Skill { name: name.to_string(), accuracy, mana_cost, effect }
}

fn item(name: &str, price: u32, effect: ItemEffect) -> ShopItem {
    ShopItem { name: name.to_string(), price, effect }
}
