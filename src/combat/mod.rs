//! # Combat Module
//!
//! Turn-based combat between the player, enemies and their summoned minions.
//!
//! This module contains:
//! - Shared combatant state ([`CombatStats`]) and the [`Combatant`] capability trait
//! - Conditions (buffs and debuffs) and their aggregate modifiers
//! - Aggro tracking for enemy targeting
//! - Attack and spell resolution with battle-log text
//! - Creature variants and their per-turn behavior
//! - The per-encounter step queue that sequences a round

pub mod actions;
pub mod aggro;
pub mod conditions;
pub mod creatures;
pub mod orchestrator;

pub use actions::*;
pub use aggro::*;
pub use conditions::*;
pub use creatures::*;
pub use orchestrator::*;

use crate::{damage_reduction, to_title_case};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for any combatant.
pub type CombatantId = Uuid;

/// Generates a new unique combatant ID.
pub fn new_combatant_id() -> CombatantId {
    Uuid::new_v4()
}

/// Non-owning reference to another combatant: its id plus a cached display
/// name for log text. Resolved against the live combatants when needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackRef {
    pub id: CombatantId,
    pub name: String,
}

impl BackRef {
    pub fn new(id: CombatantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The three combatant variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatantKind {
    Player,
    Enemy,
    Minion,
}

/// A regenerating resource such as energy or mana.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    pub current: f64,
    pub maximum: f64,
    pub regen: f64,
}

impl ResourcePool {
    /// Creates a full pool.
    pub fn full(maximum: f64, regen: f64) -> Self {
        Self {
            current: maximum,
            maximum,
            regen,
        }
    }

    pub fn can_afford(&self, cost: f64) -> bool {
        self.current >= cost
    }

    /// Spends `cost`, emptying the pool if it cannot cover it.
    pub fn expend(&mut self, cost: f64) {
        if self.current < cost {
            self.current = 0.0;
        } else {
            self.current -= cost;
        }
    }

    /// Adds one turn of regeneration, capped at the maximum.
    pub fn regenerate(&mut self) {
        self.current = (self.current + self.regen).min(self.maximum);
    }
}

/// State every combatant variant carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub id: CombatantId,
    /// Species for creatures, full name for the player
    pub name: String,
    pub health: f64,
    pub max_health: f64,
    pub sanity: Option<f64>,
    pub max_sanity: Option<f64>,
    pub attack_power: f64,
    /// Absent for the player, who spends mana instead
    pub energy: Option<ResourcePool>,
    pub armor: f64,
    pub block_chance: f64,
    pub conditions: Vec<Condition>,
}

impl CombatStats {
    /// Creates stats at full health with no sanity, energy or armor.
    pub fn new(name: impl Into<String>, max_health: f64, attack_power: f64) -> Self {
        Self {
            id: new_combatant_id(),
            name: name.into(),
            health: max_health,
            max_health,
            sanity: None,
            max_sanity: None,
            attack_power,
            energy: None,
            armor: 0.0,
            block_chance: 0.0,
            conditions: Vec::new(),
        }
    }

    pub fn with_sanity(mut self, max_sanity: f64) -> Self {
        self.sanity = Some(max_sanity);
        self.max_sanity = Some(max_sanity);
        self
    }

    pub fn with_energy(mut self, maximum: f64, regen: f64) -> Self {
        self.energy = Some(ResourcePool::full(maximum, regen));
        self
    }

    pub fn with_armor(mut self, armor: f64) -> Self {
        self.armor = armor;
        self
    }

    pub fn with_block_chance(mut self, block_chance: f64) -> Self {
        self.block_chance = block_chance;
        self
    }

    /// Maximum health after condition modifiers.
    pub fn effective_max_health(&self) -> f64 {
        let mods = defense_modifiers(&self.conditions);
        self.max_health * mods.health_multiplier + mods.health_flat
    }

    /// Maximum sanity after condition modifiers.
    pub fn effective_max_sanity(&self) -> Option<f64> {
        let mods = defense_modifiers(&self.conditions);
        self.max_sanity
            .map(|max| max * mods.sanity_multiplier + mods.sanity_flat)
    }

    /// Fraction of incoming damage absorbed, from armor and armor conditions.
    pub fn damage_reduction(&self) -> f64 {
        let mods = defense_modifiers(&self.conditions);
        damage_reduction(self.armor * mods.armor_multiplier + mods.armor_flat)
    }

    pub fn is_stunned(&self) -> bool {
        self.has_effect(ConditionEffect::Stun)
    }

    pub fn has_effect(&self, effect: ConditionEffect) -> bool {
        self.conditions.iter().any(|c| c.has_effect(effect))
    }

    /// Health or sanity at or below zero.
    pub fn is_defeated(&self) -> bool {
        self.health <= 0.0 || self.sanity.map_or(false, |sanity| sanity <= 0.0)
    }

    pub fn damage_sanity(&mut self, amount: f64) {
        if let Some(sanity) = self.sanity.as_mut() {
            *sanity -= amount;
        }
    }

    /// Heals up to the effective maximum, returning the amount restored.
    pub fn restore_health(&mut self, amount: f64) -> f64 {
        let max = self.effective_max_health();
        if amount <= 0.0 || self.health >= max {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + amount).min(max);
        self.health - before
    }

    pub fn add_condition(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Ticks every condition once, applies their damage and drops the ones
    /// that have run out.
    pub fn tick_conditions(&mut self) -> Vec<ConditionTick> {
        let mut undead_threshold = None;
        let ticks: Vec<ConditionTick> = self
            .conditions
            .iter_mut()
            .map(|condition| {
                let tick = condition.tick();
                if let Some(magnitude) = condition.magnitude_of(ConditionEffect::DestroyUndead) {
                    undead_threshold = Some(magnitude);
                }
                tick
            })
            .collect();

        let health_damage: f64 = ticks.iter().map(|t| t.health_damage).sum();
        let sanity_damage: f64 = ticks.iter().map(|t| t.sanity_damage).sum();

        self.health -= health_damage;
        let max_health = self.effective_max_health();
        if health_damage < 0.0 && self.health > max_health {
            self.health = max_health;
        }
        self.damage_sanity(sanity_damage);
        if let (Some(sanity), Some(max)) = (self.sanity, self.effective_max_sanity()) {
            if sanity_damage < 0.0 && sanity > max {
                self.sanity = Some(max);
            }
        }

        if let Some(threshold) = undead_threshold {
            if self.health <= threshold {
                self.health = 0.0;
            }
        }

        let before = self.conditions.len();
        self.conditions.retain(|c| !c.is_expired());
        if self.conditions.len() != before {
            log::debug!(
                "{} lost {} expired condition(s)",
                self.name,
                before - self.conditions.len()
            );
        }

        ticks
    }
}

/// Capabilities shared by the player, enemies and minions.
///
/// Each variant exposes its [`CombatStats`] (health, conditions and the
/// action resources it needs), and the resolution engine dispatches on
/// [`Combatant::kind`] where behavior differs.
pub trait Combatant {
    fn stats(&self) -> &CombatStats;
    fn stats_mut(&mut self) -> &mut CombatStats;
    fn kind(&self) -> CombatantKind;

    fn id(&self) -> CombatantId {
        self.stats().id
    }

    fn is_player(&self) -> bool {
        self.kind() == CombatantKind::Player
    }

    fn back_ref(&self) -> BackRef {
        BackRef::new(self.id(), self.stats().name.clone())
    }

    /// Applies health damage. Creatures record the attacker's threat.
    fn take_damage(&mut self, damage: f64, attacker: Option<CombatantId>) {
        let _ = attacker;
        self.stats_mut().health -= damage;
    }

    /// Collection summoned minions join, if this combatant can summon.
    fn minions_mut(&mut self) -> Option<&mut Vec<Minion>> {
        None
    }

    /// Sentence subject for battle-log text: "You" or "The Goblin".
    fn log_subject(&self) -> String {
        if self.is_player() {
            "You".to_string()
        } else {
            format!("The {}", to_title_case(&self.stats().name))
        }
    }

    /// Sentence object for battle-log text: "you" or "the Goblin".
    fn log_object(&self) -> String {
        if self.is_player() {
            "you".to_string()
        } else {
            format!("the {}", to_title_case(&self.stats().name))
        }
    }

    fn target_candidate(&self) -> TargetCandidate {
        TargetCandidate {
            id: self.id(),
            kind: self.kind(),
        }
    }
}

/// Append-only sink for human-readable battle-log lines, in event order.
pub trait BattleLog {
    fn append(&mut self, line: String);
}

impl BattleLog for Vec<String> {
    fn append(&mut self, line: String) {
        self.push(line);
    }
}

/// Battle log that forwards every line to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogForwarder;

impl BattleLog for LogForwarder {
    fn append(&mut self, line: String) {
        log::info!("{}", line);
    }
}
