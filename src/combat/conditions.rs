//! # Condition Engine
//!
//! Timed buffs and debuffs attached to combatants.
//!
//! A [`Condition`] is a list of effect entries plus a turn counter. Ticking a
//! condition counts it down and reports the damage it deals this turn; the
//! holder applies that damage and drops conditions that have run out (see
//! [`crate::CombatStats::tick_conditions`]). The aggregate helpers in this
//! module fold a combatant's active conditions into attack and defense
//! modifiers for the resolution engine.

use crate::{round_to_quarter, roll_chance, BackRef, ConditionDef, DelveResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a condition helps or hinders its holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionStyle {
    Buff,
    Debuff,
}

/// How an effect's magnitude is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectStyle {
    #[default]
    Flat,
    /// Scaled by the applier's attack damage
    Multiplier,
    /// Scaled by the holder's maximum health or sanity
    Percentage,
}

/// Symbolic effects a condition can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionEffect {
    /// Health damage every tick
    #[serde(alias = "health damage")]
    Damage,
    /// Sanity damage every tick
    #[serde(alias = "sanity damage")]
    Sanity,
    /// Holder skips its action
    Stun,
    /// Holder's action is suppressed on a failed coin flip
    #[serde(alias = "accuracy halved")]
    AccuracyHalved,
    /// Returns part of incoming damage to the attacker
    Revenge,
    /// Holder is destroyed outright on its next turn
    Execute,
    #[serde(alias = "accuracy reduction")]
    AccuracyReduction,
    Strengthen,
    Weaken,
    Blur,
    Thorns,
    Trap,
    #[serde(alias = "armor increase")]
    ArmorIncrease,
    #[serde(alias = "armor decrease")]
    ArmorDecrease,
    #[serde(alias = "healthMax increase")]
    HealthMaxIncrease,
    #[serde(alias = "healthMax decrease")]
    HealthMaxDecrease,
    #[serde(alias = "sanityMax increase")]
    SanityMaxIncrease,
    #[serde(alias = "sanityMax decrease")]
    SanityMaxDecrease,
    Heal,
    #[serde(alias = "sanity heal")]
    SanityHeal,
    #[serde(alias = "destroy undead")]
    DestroyUndead,
}

/// One effect of a condition with its resolved per-tick damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectEntry {
    pub effect: ConditionEffect,
    pub style: EffectStyle,
    pub magnitude: f64,
    /// Negative values heal
    pub health_damage: f64,
    /// Negative values restore sanity
    pub sanity_damage: f64,
}

/// What a single tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionTick {
    pub name: String,
    pub turns_remaining: i32,
    pub effects: Vec<ConditionEffect>,
    pub magnitudes: Vec<f64>,
    pub health_damage: f64,
    pub sanity_damage: f64,
}

/// A timed buff or debuff held by a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: Uuid,
    pub name: String,
    pub style: ConditionStyle,
    pub turns: i32,
    /// Auras never count down
    pub aura: bool,
    /// Turns until a trap arms
    pub trap_setup_time: u32,
    pub placed_by: BackRef,
    pub entries: Vec<EffectEntry>,
}

/// Inputs for scaling a new condition's damage.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionContext {
    /// Damage of the action that applied the condition
    pub primary_damage: f64,
    /// Maximum health of the combatant that will hold the condition
    pub holder_max_health: f64,
    /// Maximum sanity of the holder, if it has sanity
    pub holder_max_sanity: Option<f64>,
    pub applier: BackRef,
}

impl Condition {
    /// Builds a condition from its template without a chance roll.
    pub fn from_definition(def: &ConditionDef, context: &ConditionContext) -> DelveResult<Self> {
        def.check()?;

        let entries = def
            .effect
            .iter()
            .zip(def.effect_amount.iter())
            .enumerate()
            .map(|(index, (&effect, &amount))| {
                let style = def.style_at(index);
                let health_basis = match style {
                    EffectStyle::Flat => 1.0,
                    EffectStyle::Multiplier => context.primary_damage,
                    EffectStyle::Percentage => context.holder_max_health,
                };
                let sanity_basis = match style {
                    EffectStyle::Flat => 1.0,
                    EffectStyle::Multiplier => context.primary_damage,
                    EffectStyle::Percentage => context.holder_max_sanity.unwrap_or(0.0),
                };

                let (health_damage, sanity_damage) = match effect {
                    ConditionEffect::Damage => (amount * health_basis, 0.0),
                    ConditionEffect::Sanity => (0.0, amount * sanity_basis),
                    ConditionEffect::Heal => (-(amount * health_basis), 0.0),
                    ConditionEffect::SanityHeal => (0.0, -(amount * sanity_basis)),
                    _ => (0.0, 0.0),
                };

                EffectEntry {
                    effect,
                    style,
                    magnitude: amount,
                    health_damage,
                    sanity_damage,
                }
            })
            .collect();

        Ok(Self {
            id: Uuid::new_v4(),
            name: def.name.clone(),
            style: def.style,
            turns: def.turns,
            aura: def.aura,
            trap_setup_time: def.trap_setup_time.unwrap_or(0),
            placed_by: context.applier.clone(),
            entries,
        })
    }

    /// Whether any entry carries `effect`.
    pub fn has_effect(&self, effect: ConditionEffect) -> bool {
        self.entries.iter().any(|entry| entry.effect == effect)
    }

    /// Magnitude of the first entry carrying `effect`.
    pub fn magnitude_of(&self, effect: ConditionEffect) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.effect == effect)
            .map(|entry| entry.magnitude)
    }

    pub fn is_expired(&self) -> bool {
        self.turns <= 0
    }

    /// Counts the condition down by one turn and reports this turn's damage.
    ///
    /// Must be called exactly once per holder turn; the holder applies the
    /// returned damage and removes the condition once `turns_remaining`
    /// reaches zero.
    pub fn tick(&mut self) -> ConditionTick {
        if !self.aura {
            self.turns -= 1;
        }
        self.trap_setup_time = self.trap_setup_time.saturating_sub(1);

        let health_damage: f64 = self.entries.iter().map(|e| e.health_damage).sum();
        let sanity_damage: f64 = self.entries.iter().map(|e| e.sanity_damage).sum();

        ConditionTick {
            name: self.name.clone(),
            turns_remaining: self.turns,
            effects: self.entries.iter().map(|e| e.effect).collect(),
            magnitudes: self.entries.iter().map(|e| e.magnitude).collect(),
            health_damage: round_to_quarter(health_damage),
            sanity_damage: round_to_quarter(sanity_damage),
        }
    }
}

/// Rolls `chance` and, on success, instantiates the condition.
///
/// # Examples
///
/// ```
/// use delve::{create_condition, BackRef, ConditionContext, ConditionDef, ConditionEffect,
///             ConditionStyle, EffectStyle};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let poison = ConditionDef {
///     name: "poison".to_string(),
///     style: ConditionStyle::Debuff,
///     effect: vec![ConditionEffect::Damage],
///     effect_style: vec![EffectStyle::Flat],
///     effect_amount: vec![3.0],
///     turns: 2,
///     aura: false,
///     trap_setup_time: None,
/// };
/// let context = ConditionContext {
///     primary_damage: 10.0,
///     holder_max_health: 50.0,
///     holder_max_sanity: None,
///     applier: BackRef::new(uuid::Uuid::new_v4(), "goblin"),
/// };
/// let mut rng = StdRng::seed_from_u64(1);
/// let condition = create_condition(&poison, 1.0, &context, &mut rng).unwrap().unwrap();
/// assert_eq!(condition.entries[0].health_damage, 3.0);
/// ```
pub fn create_condition<R: Rng + ?Sized>(
    def: &ConditionDef,
    chance: f64,
    context: &ConditionContext,
    rng: &mut R,
) -> DelveResult<Option<Condition>> {
    if !roll_chance(rng, chance) {
        log::debug!("Condition '{}' failed its {:.2} chance roll", def.name, chance);
        return Ok(None);
    }
    Condition::from_definition(def, context).map(Some)
}

/// Accuracy and damage adjustments for one attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackModifiers {
    pub hit_multiplier: f64,
    pub damage_multiplier: f64,
    pub damage_flat: f64,
}

impl Default for AttackModifiers {
    fn default() -> Self {
        Self {
            hit_multiplier: 1.0,
            damage_multiplier: 1.0,
            damage_flat: 0.0,
        }
    }
}

/// Folds the attacker's and defender's conditions into attack modifiers.
pub fn attack_modifiers(attacker: &[Condition], defender: &[Condition]) -> AttackModifiers {
    let mut mods = AttackModifiers::default();

    for entry in attacker.iter().flat_map(|c| c.entries.iter()) {
        let magnitude = entry.magnitude;
        let flat = entry.style == EffectStyle::Flat;
        match entry.effect {
            ConditionEffect::AccuracyReduction => mods.hit_multiplier *= 1.0 - magnitude,
            ConditionEffect::Strengthen if flat => mods.damage_flat += magnitude,
            ConditionEffect::Strengthen => mods.damage_multiplier *= 1.0 + magnitude,
            ConditionEffect::Weaken if flat => mods.damage_flat -= magnitude,
            ConditionEffect::Weaken => mods.damage_multiplier *= 1.0 - magnitude,
            _ => {}
        }
    }

    for entry in defender.iter().flat_map(|c| c.entries.iter()) {
        if entry.effect == ConditionEffect::Blur {
            mods.hit_multiplier *= entry.magnitude;
        }
    }

    mods
}

/// Armor and pool-size adjustments from a holder's conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenseModifiers {
    pub armor_multiplier: f64,
    pub armor_flat: f64,
    pub health_multiplier: f64,
    pub health_flat: f64,
    pub sanity_multiplier: f64,
    pub sanity_flat: f64,
}

impl Default for DefenseModifiers {
    fn default() -> Self {
        Self {
            armor_multiplier: 1.0,
            armor_flat: 0.0,
            health_multiplier: 1.0,
            health_flat: 0.0,
            sanity_multiplier: 1.0,
            sanity_flat: 0.0,
        }
    }
}

fn adjust(multiplier: &mut f64, flat: &mut f64, entry: &EffectEntry, sign: f64) {
    match entry.style {
        EffectStyle::Flat => *flat += sign * entry.magnitude,
        EffectStyle::Multiplier | EffectStyle::Percentage => {
            *multiplier *= 1.0 + sign * entry.magnitude
        }
    }
}

/// Folds a holder's conditions into defense modifiers.
pub fn defense_modifiers(conditions: &[Condition]) -> DefenseModifiers {
    let mut mods = DefenseModifiers::default();

    for entry in conditions.iter().flat_map(|c| c.entries.iter()) {
        match entry.effect {
            ConditionEffect::ArmorIncrease => {
                adjust(&mut mods.armor_multiplier, &mut mods.armor_flat, entry, 1.0)
            }
            ConditionEffect::ArmorDecrease => {
                adjust(&mut mods.armor_multiplier, &mut mods.armor_flat, entry, -1.0)
            }
            ConditionEffect::HealthMaxIncrease => {
                adjust(&mut mods.health_multiplier, &mut mods.health_flat, entry, 1.0)
            }
            ConditionEffect::HealthMaxDecrease => {
                adjust(&mut mods.health_multiplier, &mut mods.health_flat, entry, -1.0)
            }
            ConditionEffect::SanityMaxIncrease => {
                adjust(&mut mods.sanity_multiplier, &mut mods.sanity_flat, entry, 1.0)
            }
            ConditionEffect::SanityMaxDecrease => {
                adjust(&mut mods.sanity_multiplier, &mut mods.sanity_flat, entry, -1.0)
            }
            _ => {}
        }
    }

    mods
}

/// Damage a defender's thorns and armed traps deal back to a successful
/// attacker. Traps that fire are spent.
pub fn retaliation_damage(defender: &mut [Condition]) -> f64 {
    let mut damage = 0.0;
    for condition in defender.iter_mut().filter(|c| !c.is_expired()) {
        let armed_trap = condition.has_effect(ConditionEffect::Trap) && condition.trap_setup_time == 0;
        if condition.has_effect(ConditionEffect::Thorns) || armed_trap {
            damage += condition.entries.iter().map(|e| e.magnitude).sum::<f64>();
            if armed_trap {
                condition.turns = 0;
            }
        }
    }
    damage
}
