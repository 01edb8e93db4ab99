//! # Definition Tables
//!
//! Serde models for enemies, bosses, attacks, spells, summons, conditions and
//! dungeons, plus the [`Definitions`] registry that indexes them by name.

use crate::{
    number_in_range, ConditionEffect, ConditionStyle, DelveError, DelveResult, DungeonInstance,
    EffectStyle,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stat that is either fixed or drawn from an inclusive range.
///
/// Serialized as a bare number or a two-element `[min, max]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Fixed(f64),
    Range([f64; 2]),
}

impl StatValue {
    /// Resolves the value, drawing an integer from the range when needed.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            StatValue::Fixed(value) => value,
            StatValue::Range([min, max]) => {
                number_in_range(rng, min.round() as i64, max.round() as i64) as f64
            }
        }
    }
}

/// Maximum and per-turn regeneration of an energy or mana pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolDef {
    pub maximum: f64,
    #[serde(default)]
    pub regen: f64,
}

/// An item an enemy may drop on defeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropDef {
    pub item: String,
    pub chance: f64,
}

/// Enemy or boss record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyDef {
    pub name: String,
    #[serde(default)]
    pub being_type: String,
    #[serde(alias = "healthRange")]
    pub health: StatValue,
    #[serde(default)]
    pub sanity: Option<f64>,
    #[serde(alias = "attackPowerRange")]
    pub attack_power: StatValue,
    #[serde(default)]
    pub energy: Option<PoolDef>,
    pub attacks: Vec<String>,
    #[serde(default, alias = "armorValue")]
    pub armor: f64,
    #[serde(default)]
    pub block_chance: f64,
    #[serde(default)]
    pub gold_drop_range: Option<[i64; 2]>,
    #[serde(default)]
    pub drops: Vec<DropDef>,
    /// Summons that accompany this enemy when it appears as a boss
    #[serde(default)]
    pub minions: Vec<String>,
}

/// A named effect with an application chance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectChance {
    pub name: String,
    #[serde(default = "always")]
    pub chance: f64,
}

fn always() -> f64 {
    1.0
}

fn full_hit_chance() -> f64 {
    1.0
}

/// Physical attack record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackDef {
    pub name: String,
    #[serde(default = "full_hit_chance")]
    pub hit_chance: f64,
    #[serde(default)]
    pub energy_cost: f64,
    #[serde(default)]
    pub damage_mult: f64,
    #[serde(default)]
    pub flat_health_damage: f64,
    #[serde(default)]
    pub self_damage: f64,
    #[serde(default)]
    pub sanity_damage: f64,
    /// Legacy single-debuff form, folded into [`AttackDef::debuff_list`]
    #[serde(default)]
    pub secondary_effect: Option<String>,
    #[serde(default)]
    pub secondary_effect_chance: Option<f64>,
    #[serde(default)]
    pub buffs: Vec<EffectChance>,
    #[serde(default)]
    pub debuffs: Vec<EffectChance>,
    #[serde(default)]
    pub summons: Vec<String>,
}

impl AttackDef {
    /// Debuffs including the legacy secondary effect, if any.
    pub fn debuff_list(&self) -> Vec<EffectChance> {
        let mut list = self.debuffs.clone();
        if let Some(name) = &self.secondary_effect {
            list.push(EffectChance {
                name: name.clone(),
                chance: self.secondary_effect_chance.unwrap_or(1.0),
            });
        }
        list
    }
}

/// School of magic a spell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Water,
    Air,
    Earth,
    Blood,
    Summoning,
    Pestilence,
    Bone,
    Holy,
    Vengeance,
    Protection,
}

/// Mastery tiers, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    Novice,
    Apprentice,
    Adept,
    Expert,
    Master,
    Legend,
}

impl MasteryLevel {
    /// Maps accumulated proficiency points to a tier.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::MasteryLevel;
    ///
    /// assert_eq!(MasteryLevel::from_proficiency(0), MasteryLevel::Novice);
    /// assert_eq!(MasteryLevel::from_proficiency(125), MasteryLevel::Adept);
    /// assert_eq!(MasteryLevel::from_proficiency(900), MasteryLevel::Legend);
    /// ```
    pub fn from_proficiency(points: u32) -> Self {
        match points {
            0..=49 => MasteryLevel::Novice,
            50..=124 => MasteryLevel::Apprentice,
            125..=224 => MasteryLevel::Adept,
            225..=349 => MasteryLevel::Expert,
            350..=499 => MasteryLevel::Master,
            _ => MasteryLevel::Legend,
        }
    }
}

/// Spell record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellDef {
    pub name: String,
    pub element: Element,
    #[serde(default)]
    pub proficiency_needed: Option<MasteryLevel>,
    pub mana_cost: f64,
    #[serde(default)]
    pub uses_weapon: Option<String>,
    #[serde(default)]
    pub damage: f64,
    #[serde(default)]
    pub self_damage: f64,
    #[serde(default)]
    pub sanity_damage: f64,
    #[serde(default)]
    pub buffs: Vec<String>,
    #[serde(default)]
    pub debuffs: Vec<EffectChance>,
    #[serde(default)]
    pub summons: Vec<String>,
}

/// Summoned minion record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonDef {
    pub name: String,
    #[serde(default)]
    pub being_type: String,
    pub health: f64,
    pub attack_power: f64,
    pub attacks: Vec<String>,
    pub turns: i32,
    /// Pets persist and never count down
    #[serde(default)]
    pub pet: bool,
}

/// Condition template.
///
/// `effect`, `effect_style` and `effect_amount` are parallel arrays; a
/// missing `effect_style` defaults every entry to flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDef {
    pub name: String,
    pub style: ConditionStyle,
    pub effect: Vec<ConditionEffect>,
    #[serde(default)]
    pub effect_style: Vec<EffectStyle>,
    #[serde(default, alias = "damageAmount")]
    pub effect_amount: Vec<f64>,
    pub turns: i32,
    #[serde(default)]
    pub aura: bool,
    #[serde(default)]
    pub trap_setup_time: Option<u32>,
}

impl ConditionDef {
    /// Checks that the parallel effect arrays line up.
    pub fn check(&self) -> DelveResult<()> {
        let effects = self.effect.len();
        let styles_ok = self.effect_style.is_empty() || self.effect_style.len() == effects;
        if self.effect_amount.len() != effects || !styles_ok {
            return Err(DelveError::InvalidDefinition(format!(
                "condition '{}' has {} effects, {} amounts and {} styles",
                self.name,
                effects,
                self.effect_amount.len(),
                self.effect_style.len()
            )));
        }
        Ok(())
    }

    /// Style of the effect at `index`, defaulting to flat.
    pub fn style_at(&self, index: usize) -> EffectStyle {
        self.effect_style
            .get(index)
            .copied()
            .unwrap_or(EffectStyle::Flat)
    }
}

/// On-disk layout of a content file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    enemies: Vec<EnemyDef>,
    #[serde(default)]
    bosses: Vec<EnemyDef>,
    #[serde(default)]
    attacks: Vec<AttackDef>,
    #[serde(default)]
    spells: Vec<SpellDef>,
    #[serde(default)]
    summons: Vec<SummonDef>,
    #[serde(default)]
    conditions: Vec<ConditionDef>,
    #[serde(default)]
    dungeons: Vec<DungeonInstance>,
}

/// Name-indexed registry of every content table.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    enemies: HashMap<String, EnemyDef>,
    bosses: HashMap<String, EnemyDef>,
    attacks: HashMap<String, AttackDef>,
    spells: HashMap<String, SpellDef>,
    summons: HashMap<String, SummonDef>,
    conditions: HashMap<String, ConditionDef>,
    dungeons: HashMap<String, DungeonInstance>,
}

fn index_by_name<T>(items: Vec<T>, name: impl Fn(&T) -> &str) -> HashMap<String, T> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let key = name(&item).to_string();
        if map.contains_key(&key) {
            log::warn!("Duplicate definition '{}', keeping the later entry", key);
        }
        map.insert(key, item);
    }
    map
}

impl Definitions {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a content file.
    ///
    /// Structural problems (bad JSON, mismatched condition arrays) fail here.
    /// Cross-references between tables are checked lazily at lookup time, or
    /// eagerly with [`Definitions::validate_references`].
    pub fn from_json(json: &str) -> DelveResult<Self> {
        let file: DefinitionFile = serde_json::from_str(json)?;
        for condition in &file.conditions {
            condition.check()?;
        }

        let definitions = Self {
            enemies: index_by_name(file.enemies, |e| &e.name),
            bosses: index_by_name(file.bosses, |e| &e.name),
            attacks: index_by_name(file.attacks, |a| &a.name),
            spells: index_by_name(file.spells, |s| &s.name),
            summons: index_by_name(file.summons, |s| &s.name),
            conditions: index_by_name(file.conditions, |c| &c.name),
            dungeons: index_by_name(file.dungeons, |d| &d.name),
        };

        log::debug!(
            "Loaded definitions: {} enemies, {} bosses, {} attacks, {} spells, {} summons, {} conditions",
            definitions.enemies.len(),
            definitions.bosses.len(),
            definitions.attacks.len(),
            definitions.spells.len(),
            definitions.summons.len(),
            definitions.conditions.len()
        );
        Ok(definitions)
    }

    /// Loads the bundled sample content.
    pub fn sample() -> DelveResult<Self> {
        Self::from_json(crate::SAMPLE_DEFINITIONS)
    }

    pub fn enemy(&self, name: &str) -> DelveResult<&EnemyDef> {
        self.enemies
            .get(name)
            .ok_or_else(|| DelveError::unknown("enemy", name))
    }

    pub fn boss(&self, name: &str) -> DelveResult<&EnemyDef> {
        self.bosses
            .get(name)
            .ok_or_else(|| DelveError::unknown("boss", name))
    }

    pub fn attack(&self, name: &str) -> DelveResult<&AttackDef> {
        self.attacks
            .get(name)
            .ok_or_else(|| DelveError::unknown("attack", name))
    }

    pub fn spell(&self, name: &str) -> DelveResult<&SpellDef> {
        self.spells
            .get(name)
            .ok_or_else(|| DelveError::unknown("spell", name))
    }

    pub fn summon(&self, name: &str) -> DelveResult<&SummonDef> {
        self.summons
            .get(name)
            .ok_or_else(|| DelveError::unknown("summon", name))
    }

    pub fn condition(&self, name: &str) -> DelveResult<&ConditionDef> {
        self.conditions
            .get(name)
            .ok_or_else(|| DelveError::unknown("condition", name))
    }

    /// Returns a fresh copy of a dungeon's level layout.
    pub fn dungeon(&self, name: &str) -> DelveResult<DungeonInstance> {
        self.dungeons
            .get(name)
            .cloned()
            .ok_or_else(|| DelveError::unknown("dungeon", name))
    }

    pub fn insert_enemy(&mut self, def: EnemyDef) {
        self.enemies.insert(def.name.clone(), def);
    }

    pub fn insert_boss(&mut self, def: EnemyDef) {
        self.bosses.insert(def.name.clone(), def);
    }

    pub fn insert_attack(&mut self, def: AttackDef) {
        self.attacks.insert(def.name.clone(), def);
    }

    pub fn insert_spell(&mut self, def: SpellDef) {
        self.spells.insert(def.name.clone(), def);
    }

    pub fn insert_summon(&mut self, def: SummonDef) {
        self.summons.insert(def.name.clone(), def);
    }

    /// Inserts a condition template after checking its effect arrays.
    pub fn insert_condition(&mut self, def: ConditionDef) -> DelveResult<()> {
        def.check()?;
        self.conditions.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn insert_dungeon(&mut self, dungeon: DungeonInstance) {
        self.dungeons.insert(dungeon.name.clone(), dungeon);
    }

    /// Verifies that every name referenced by one table exists in another.
    pub fn validate_references(&self) -> DelveResult<()> {
        let creatures = self.enemies.values().chain(self.bosses.values());
        for creature in creatures {
            for attack in &creature.attacks {
                self.attack(attack)?;
            }
            for minion in &creature.minions {
                self.summon(minion)?;
            }
        }

        for attack in self.attacks.values() {
            for effect in attack.buffs.iter().chain(attack.debuff_list().iter()) {
                if effect.name != LIFESTEAL {
                    self.condition(&effect.name)?;
                }
            }
            for summon in &attack.summons {
                self.summon(summon)?;
            }
        }

        for spell in self.spells.values() {
            for buff in spell.buffs.iter().filter(|b| b.as_str() != CONSUME_BLOOD_ORB) {
                self.condition(buff)?;
            }
            for debuff in spell.debuffs.iter().filter(|d| d.name != LIFESTEAL) {
                self.condition(&debuff.name)?;
            }
            for summon in &spell.summons {
                self.summon(summon)?;
            }
        }

        for summon in self.summons.values() {
            for attack in &summon.attacks {
                self.attack(attack)?;
            }
        }

        for dungeon in self.dungeons.values() {
            for level in &dungeon.levels {
                for enemy in &level.enemies {
                    self.enemy(enemy)?;
                }
                for boss in &level.bosses {
                    self.boss(boss)?;
                }
            }
        }

        Ok(())
    }
}

/// Debuff name that heals the user instead of attaching a condition.
pub const LIFESTEAL: &str = "lifesteal";

/// Buff name that spends a blood orb instead of attaching a condition.
pub const CONSUME_BLOOD_ORB: &str = "consume blood orb";
