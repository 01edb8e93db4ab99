//! # Action Resolution
//!
//! Resolves one physical attack or spell cast against one target.
//!
//! Attacks roll to hit and may be blocked; spells always land but are gated by
//! mana, mastery, weapon and blood-orb requirements. Both share the same
//! success pipeline:
//!
//! 1. Target takes quarter-rounded damage after its damage reduction
//! 2. Flat sanity damage to the target, then self-damage to the user
//! 3. Thorns and armed traps on the target strike back at the user
//! 4. Debuffs are rolled onto the target (`lifesteal` heals the user instead)
//! 5. Buffs are rolled onto the user
//! 6. Summons join the user's minions
//!
//! Every resolution carries a deterministic battle-log text built from the
//! outcome.

use crate::config::LIFESTEAL_FRACTION;
use crate::{
    attack_modifiers, create_condition, retaliation_damage, roll_chance, roll_d20,
    round_to_quarter, to_title_case, AttackDef, CombatStats, Combatant, ConditionContext,
    ConditionDef, DelveError, DelveResult, Definitions, EffectChance, Minion, PlayerCharacter,
    SpellDef, SummonDef, CONSUME_BLOOD_ORB, LIFESTEAL,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a combatant's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionResult {
    Success,
    Miss,
    Block,
    Stunned,
    LowEnergy,
    /// No affordable action was available
    Pass,
    /// Destroyed by an execute condition
    Executed,
}

/// Everything an action did, plus its battle-log text.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub result: ActionResult,
    pub log_text: String,
    pub damage: f64,
    pub sanity_damage: f64,
    pub self_damage: f64,
    pub retaliation: f64,
    pub healed: f64,
    pub debuffs: Vec<String>,
    pub buffs: Vec<String>,
    pub summons: Vec<String>,
}

impl Resolution {
    /// A resolution with no effects.
    pub fn new(result: ActionResult, log_text: impl Into<String>) -> Self {
        Self {
            result,
            log_text: log_text.into(),
            damage: 0.0,
            sanity_damage: 0.0,
            self_damage: 0.0,
            retaliation: 0.0,
            healed: 0.0,
            debuffs: Vec::new(),
            buffs: Vec::new(),
            summons: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == ActionResult::Success
    }
}

/// Condition and summon templates an action needs, looked up before any
/// state changes so a missing name leaves every combatant untouched.
struct EffectPlan<'d> {
    /// `None` marks lifesteal
    debuffs: Vec<(Option<&'d ConditionDef>, f64)>,
    buffs: Vec<(&'d ConditionDef, f64)>,
    summons: Vec<&'d SummonDef>,
    consumes_blood_orb: bool,
}

impl<'d> EffectPlan<'d> {
    fn prepare(
        defs: &'d Definitions,
        debuffs: &[EffectChance],
        buffs: &[EffectChance],
        summons: &[String],
    ) -> DelveResult<Self> {
        let mut plan = EffectPlan {
            debuffs: Vec::with_capacity(debuffs.len()),
            buffs: Vec::with_capacity(buffs.len()),
            summons: Vec::with_capacity(summons.len()),
            consumes_blood_orb: false,
        };

        for debuff in debuffs {
            if debuff.name == LIFESTEAL {
                plan.debuffs.push((None, debuff.chance));
            } else {
                plan.debuffs
                    .push((Some(defs.condition(&debuff.name)?), debuff.chance));
            }
        }
        for buff in buffs {
            if buff.name == CONSUME_BLOOD_ORB {
                plan.consumes_blood_orb = true;
            } else {
                plan.buffs.push((defs.condition(&buff.name)?, buff.chance));
            }
        }
        for summon in summons {
            plan.summons.push(defs.summon(summon)?);
        }

        Ok(plan)
    }
}

/// Damage figures for a landed action.
struct Impact {
    /// Damage before the target's reduction, used for lifesteal and scaling
    raw: f64,
    sanity: f64,
    self_damage: f64,
}

fn apply_impact<R: Rng + ?Sized>(
    plan: &EffectPlan<'_>,
    impact: Impact,
    user: &mut dyn Combatant,
    target: &mut dyn Combatant,
    rng: &mut R,
) -> DelveResult<Resolution> {
    let mut resolution = Resolution::new(ActionResult::Success, String::new());

    let final_damage = round_to_quarter(impact.raw * (1.0 - target.stats().damage_reduction()));
    target.take_damage(final_damage, Some(user.id()));
    target.stats_mut().damage_sanity(impact.sanity);
    resolution.damage = final_damage;
    resolution.sanity_damage = impact.sanity;

    if impact.self_damage > 0.0 {
        user.take_damage(impact.self_damage, None);
        resolution.self_damage = impact.self_damage;
    }

    let retaliation = round_to_quarter(retaliation_damage(&mut target.stats_mut().conditions));
    // Spent traps leave with the hit that set them off
    target.stats_mut().conditions.retain(|c| !c.is_expired());
    if retaliation > 0.0 {
        user.take_damage(retaliation, Some(target.id()));
        resolution.retaliation = retaliation;
    }

    for &(def, chance) in &plan.debuffs {
        match def {
            None => {
                if roll_chance(rng, chance) {
                    let heal = round_to_quarter(impact.raw * LIFESTEAL_FRACTION);
                    resolution.healed += user.stats_mut().restore_health(heal);
                }
            }
            Some(def) => {
                let context = holder_context(target.stats(), impact.raw, user);
                if let Some(condition) = create_condition(def, chance, &context, rng)? {
                    resolution.debuffs.push(condition.name.clone());
                    target.stats_mut().add_condition(condition);
                }
            }
        }
    }

    for &(def, chance) in &plan.buffs {
        let context = holder_context(user.stats(), impact.raw, user);
        if let Some(condition) = create_condition(def, chance, &context, rng)? {
            resolution.buffs.push(condition.name.clone());
            user.stats_mut().add_condition(condition);
        }
    }

    let parent = user.back_ref();
    let parent_kind = user.kind();
    for def in &plan.summons {
        match user.minions_mut() {
            Some(minions) => {
                minions.push(Minion::from_summon(def, parent.clone(), parent_kind));
                resolution.summons.push(def.name.clone());
            }
            None => log::warn!("{} cannot hold minions, skipping {}", parent.name, def.name),
        }
    }

    Ok(resolution)
}

fn holder_context(holder: &CombatStats, raw: f64, applier: &dyn Combatant) -> ConditionContext {
    ConditionContext {
        primary_damage: raw,
        holder_max_health: holder.effective_max_health(),
        holder_max_sanity: holder.effective_max_sanity(),
        applier: applier.back_ref(),
    }
}

fn was(combatant: &dyn Combatant) -> &'static str {
    if combatant.is_player() {
        "were"
    } else {
        "was"
    }
}

fn title_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| to_title_case(name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Log line for a user too stunned to act.
pub fn stunned_text(user: &dyn Combatant) -> String {
    format!("{} {} stunned!", user.log_subject(), was(user))
}

/// Log line for a user without the energy to act.
pub fn low_energy_text(user: &dyn Combatant) -> String {
    format!("{} passed (low energy)!", user.log_subject())
}

/// Log line for a missed attack.
pub fn miss_text(user: &dyn Combatant, target: &dyn Combatant) -> String {
    format!(
        "{} missed the attack against {}!",
        user.log_subject(),
        target.log_object()
    )
}

/// Log line for a blocked attack.
pub fn block_text(target: &dyn Combatant) -> String {
    format!("{} blocked the attack!", target.log_subject())
}

/// Multi-line log text for a landed action.
///
/// Bullet lines follow a fixed order and are left out when empty: health
/// damage, sanity damage, debuffs, buffs, summons, self-damage, then the
/// lifesteal and retaliation extras.
pub fn success_text(
    user: &dyn Combatant,
    target: &dyn Combatant,
    action_name: &str,
    resolution: &Resolution,
) -> String {
    let subject = user.log_subject();
    let mut text = format!(
        "{} used {} on {}.\n",
        subject,
        to_title_case(action_name),
        target.log_object()
    );

    if resolution.damage > 0.0 {
        text += &format!("  • It dealt {} health damage.\n", resolution.damage);
    }
    if resolution.sanity_damage > 0.0 {
        text += &format!("  • It caused {} sanity damage.\n", resolution.sanity_damage);
    }
    if !resolution.debuffs.is_empty() {
        text += &format!(
            "  • {} {} afflicted with: {}.\n",
            target.log_subject(),
            was(target),
            title_list(&resolution.debuffs)
        );
    }
    if !resolution.buffs.is_empty() {
        text += &format!("  • {} gained: {}.\n", subject, title_list(&resolution.buffs));
    }
    if !resolution.summons.is_empty() {
        text += &format!("  • {} summoned: {}.\n", subject, title_list(&resolution.summons));
    }
    if resolution.self_damage > 0.0 {
        text += &format!("  • {} took {} self-damage.\n", subject, resolution.self_damage);
    }
    if resolution.healed > 0.0 {
        text += &format!("  • {} drained {} health.\n", subject, resolution.healed);
    }
    if resolution.retaliation > 0.0 {
        text += &format!(
            "  • {} took {} retaliation damage.\n",
            subject, resolution.retaliation
        );
    }

    text.trim().to_string()
}

/// A physical attack, bound to its definition for the duration of one use.
#[derive(Debug, Clone, Copy)]
pub struct Attack<'d> {
    pub definition: &'d AttackDef,
}

impl<'d> Attack<'d> {
    pub fn new(definition: &'d AttackDef) -> Self {
        Self { definition }
    }

    /// Looks up an attack by name.
    pub fn from_definitions(defs: &'d Definitions, name: &str) -> DelveResult<Self> {
        defs.attack(name).map(Self::new)
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn energy_cost(&self) -> f64 {
        self.definition.energy_cost
    }

    /// Damage before condition modifiers and damage reduction.
    pub fn base_damage(&self, user: &CombatStats) -> f64 {
        user.attack_power * self.definition.damage_mult + self.definition.flat_health_damage
    }

    /// Resolves the attack from `user` against `target`.
    ///
    /// A stunned user, or a non-player user short on energy, produces
    /// `Stunned` or `LowEnergy` without spending anything. Otherwise energy
    /// is spent and the to-hit roll decides between `Miss`, `Block` and
    /// `Success`.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        user: &mut dyn Combatant,
        target: &mut dyn Combatant,
        defs: &Definitions,
        rng: &mut R,
    ) -> DelveResult<Resolution> {
        let def = self.definition;
        let plan = EffectPlan::prepare(defs, &def.debuff_list(), &def.buffs, &def.summons)?;

        if user.stats().is_stunned() {
            return Ok(Resolution::new(ActionResult::Stunned, stunned_text(user)));
        }
        if !user.is_player() {
            if let Some(energy) = user.stats().energy {
                if !energy.can_afford(def.energy_cost) {
                    return Ok(Resolution::new(ActionResult::LowEnergy, low_energy_text(user)));
                }
            }
        }
        if let Some(energy) = user.stats_mut().energy.as_mut() {
            energy.expend(def.energy_cost);
        }

        let mods = attack_modifiers(&user.stats().conditions, &target.stats().conditions);
        let hit_chance = def.hit_chance * mods.hit_multiplier;
        let roll = roll_d20(rng);
        let threshold = 20.0 - hit_chance * 20.0;
        log::debug!(
            "{} rolls {} against {:.2} with {}",
            user.stats().name,
            roll,
            threshold,
            def.name
        );
        // A zero chance never lands, even on a natural 20
        if hit_chance <= 0.0 || (roll as f64) < threshold {
            return Ok(Resolution::new(ActionResult::Miss, miss_text(user, target)));
        }

        let block_chance = target.stats().block_chance;
        if block_chance > 0.0 {
            let block_roll = roll_d20(rng);
            if 20.0 - block_chance * 20.0 < block_roll as f64 {
                return Ok(Resolution::new(ActionResult::Block, block_text(target)));
            }
        }

        let raw = (self.base_damage(user.stats()) * mods.damage_multiplier + mods.damage_flat)
            .max(0.0);
        let impact = Impact {
            raw,
            sanity: def.sanity_damage,
            self_damage: def.self_damage,
        };
        let mut resolution = apply_impact(&plan, impact, user, target, rng)?;
        resolution.log_text = success_text(user, target, &def.name, &resolution);
        Ok(resolution)
    }
}

/// Why a spell cannot be cast right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastBlocker {
    Stunned,
    MissingWeapon,
    LowMana,
    LowProficiency,
    LowOrbs,
}

impl fmt::Display for CastBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            CastBlocker::Stunned => "Stunned!",
            CastBlocker::MissingWeapon => "Missing required weapon",
            CastBlocker::LowMana => "Low Mana",
            CastBlocker::LowProficiency => "Low Proficiency",
            CastBlocker::LowOrbs => "Low Orbs",
        };
        f.write_str(reason)
    }
}

/// A player spell, bound to its definition for the duration of one cast.
#[derive(Debug, Clone, Copy)]
pub struct Spell<'d> {
    pub definition: &'d SpellDef,
}

impl<'d> Spell<'d> {
    pub fn new(definition: &'d SpellDef) -> Self {
        Self { definition }
    }

    /// Looks up a spell by name.
    pub fn from_definitions(defs: &'d Definitions, name: &str) -> DelveResult<Self> {
        defs.spell(name).map(Self::new)
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Spell damage plus the caster's magic power; zero for non-damaging spells.
    pub fn base_damage(&self, caster: &PlayerCharacter) -> f64 {
        if self.definition.damage > 0.0 {
            self.definition.damage + caster.magic_power
        } else {
            0.0
        }
    }

    fn consumes_blood_orb(&self) -> bool {
        self.definition
            .buffs
            .iter()
            .any(|buff| buff == CONSUME_BLOOD_ORB)
    }

    /// First requirement the caster fails, if any.
    pub fn can_cast(&self, caster: &PlayerCharacter) -> Result<(), CastBlocker> {
        let def = self.definition;
        if caster.stats.is_stunned() {
            return Err(CastBlocker::Stunned);
        }
        if let Some(weapon) = &def.uses_weapon {
            if caster.main_hand.as_deref() != Some(weapon.as_str()) {
                return Err(CastBlocker::MissingWeapon);
            }
        }
        if !caster.mana.can_afford(def.mana_cost) {
            return Err(CastBlocker::LowMana);
        }
        if let Some(needed) = def.proficiency_needed {
            if caster.mastery_level(def.element) < needed {
                return Err(CastBlocker::LowProficiency);
            }
        }
        if self.consumes_blood_orb() && caster.blood_orbs == 0 {
            return Err(CastBlocker::LowOrbs);
        }
        Ok(())
    }

    /// Casts the spell at `target`.
    ///
    /// A stunned caster produces `Stunned`; any other unmet requirement is
    /// an [`DelveError::InvalidAction`], since callers are expected to gate
    /// casting with [`Spell::can_cast`].
    pub fn cast<R: Rng + ?Sized>(
        &self,
        caster: &mut PlayerCharacter,
        target: &mut dyn Combatant,
        defs: &Definitions,
        rng: &mut R,
    ) -> DelveResult<Resolution> {
        let def = self.definition;
        let buffs: Vec<EffectChance> = def
            .buffs
            .iter()
            .map(|name| EffectChance {
                name: name.clone(),
                chance: 1.0,
            })
            .collect();
        let plan = EffectPlan::prepare(defs, &def.debuffs, &buffs, &def.summons)?;

        match self.can_cast(caster) {
            Ok(()) => {}
            Err(CastBlocker::Stunned) => {
                return Ok(Resolution::new(ActionResult::Stunned, stunned_text(caster)));
            }
            Err(blocker) => {
                return Err(DelveError::InvalidAction(format!(
                    "{} cannot be cast: {}",
                    def.name, blocker
                )));
            }
        }

        caster.mana.expend(def.mana_cost);
        if plan.consumes_blood_orb {
            caster.blood_orbs -= 1;
        }

        let impact = Impact {
            raw: self.base_damage(caster),
            sanity: def.sanity_damage,
            self_damage: def.self_damage,
        };
        let mut resolution = apply_impact(&plan, impact, caster, target, rng)?;
        caster.gain_proficiency(def.element);
        resolution.log_text = success_text(caster, target, &def.name, &resolution);
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        defense_modifiers, Condition, ConditionEffect, ConditionStyle, EffectStyle, Element,
        Enemy, MasteryLevel,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn attack(name: &str, hit_chance: f64, damage_mult: f64) -> AttackDef {
        AttackDef {
            name: name.to_string(),
            hit_chance,
            energy_cost: 0.0,
            damage_mult,
            flat_health_damage: 0.0,
            self_damage: 0.0,
            sanity_damage: 0.0,
            secondary_effect: None,
            secondary_effect_chance: None,
            buffs: vec![],
            debuffs: vec![],
            summons: vec![],
        }
    }

    fn condition_def(name: &str, style: ConditionStyle, effect: ConditionEffect, amount: f64) -> ConditionDef {
        ConditionDef {
            name: name.to_string(),
            style,
            effect: vec![effect],
            effect_style: vec![EffectStyle::Flat],
            effect_amount: vec![amount],
            turns: 3,
            aura: false,
            trap_setup_time: None,
        }
    }

    fn player() -> PlayerCharacter {
        PlayerCharacter::new("Aria", 100.0, 10.0)
    }

    fn goblin() -> Enemy {
        Enemy::new("goblin", 50.0, 6.0)
    }

    #[test]
    fn test_certain_hit_never_misses() {
        let defs = Definitions::new();
        let def = attack("stab", 1.0, 1.0);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let mut user = player();
            let mut target = goblin();
            let resolution = Attack::new(&def)
                .resolve(&mut user, &mut target, &defs, &mut rng)
                .expect("resolves");
            assert_eq!(resolution.result, ActionResult::Success);
        }
    }

    #[test]
    fn test_zero_hit_chance_always_misses() {
        let defs = Definitions::new();
        let def = attack("flail", 0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..200 {
            let mut user = player();
            let mut target = goblin();
            let resolution = Attack::new(&def)
                .resolve(&mut user, &mut target, &defs, &mut rng)
                .expect("resolves");
            assert_eq!(resolution.result, ActionResult::Miss);
            assert_eq!(target.stats.health, 50.0);
            assert_eq!(resolution.log_text, "You missed the attack against the Goblin!");
        }
    }

    #[test]
    fn test_damage_is_quarter_rounded_after_reduction() {
        let defs = Definitions::new();
        let mut def = attack("slash", 1.0, 0.73);
        def.flat_health_damage = 0.0;
        let mut rng = StdRng::seed_from_u64(7);
        let mut user = player();
        let mut target = goblin();

        // 10 * 0.73 = 7.3 raw damage, no armor
        let resolution = Attack::new(&def)
            .resolve(&mut user, &mut target, &defs, &mut rng)
            .expect("resolves");
        assert_eq!(resolution.damage, 7.25);
        assert_eq!(target.stats.health, 42.75);
    }

    #[test]
    fn test_stunned_user_spends_nothing() {
        let mut defs = Definitions::new();
        defs.insert_condition(condition_def(
            "stun",
            ConditionStyle::Debuff,
            ConditionEffect::Stun,
            0.0,
        ))
        .expect("valid condition");
        let mut def = attack("bite", 1.0, 1.0);
        def.energy_cost = 3.0;

        let mut rng = StdRng::seed_from_u64(8);
        let mut user = goblin();
        user.stats.energy = Some(crate::ResourcePool::full(10.0, 1.0));
        let stun = crate::Condition::from_definition(
            defs.condition("stun").expect("stun exists"),
            &ConditionContext {
                primary_damage: 0.0,
                holder_max_health: 50.0,
                holder_max_sanity: None,
                applier: crate::BackRef::new(crate::new_combatant_id(), "Aria"),
            },
        )
        .expect("valid condition");
        user.stats.add_condition(stun);

        let mut target = player();
        let resolution = Attack::new(&def)
            .resolve(&mut user, &mut target, &defs, &mut rng)
            .expect("resolves");
        assert_eq!(resolution.result, ActionResult::Stunned);
        assert_eq!(resolution.log_text, "The Goblin was stunned!");
        assert_eq!(user.stats.energy.map(|e| e.current), Some(10.0));
    }

    #[test]
    fn test_low_energy_enemy_passes() {
        let defs = Definitions::new();
        let mut def = attack("crush", 1.0, 2.0);
        def.energy_cost = 20.0;
        let mut rng = StdRng::seed_from_u64(9);
        let mut user = goblin();
        user.stats.energy = Some(crate::ResourcePool::full(5.0, 1.0));
        let mut target = player();

        let resolution = Attack::new(&def)
            .resolve(&mut user, &mut target, &defs, &mut rng)
            .expect("resolves");
        assert_eq!(resolution.result, ActionResult::LowEnergy);
        assert_eq!(resolution.log_text, "The Goblin passed (low energy)!");
        assert_eq!(user.stats.energy.map(|e| e.current), Some(5.0));
    }

    #[test]
    fn test_full_block_negates_hit() {
        let defs = Definitions::new();
        let def = attack("stab", 1.0, 1.0);
        let mut rng = StdRng::seed_from_u64(10);
        let mut user = player();
        let mut target = goblin();
        target.stats.block_chance = 1.0;

        let resolution = Attack::new(&def)
            .resolve(&mut user, &mut target, &defs, &mut rng)
            .expect("resolves");
        assert_eq!(resolution.result, ActionResult::Block);
        assert_eq!(resolution.log_text, "The Goblin blocked the attack!");
        assert_eq!(target.stats.health, 50.0);
    }

    #[test]
    fn test_success_log_lists_effects_in_order() {
        let mut defs = Definitions::new();
        defs.insert_condition(condition_def(
            "poison",
            ConditionStyle::Debuff,
            ConditionEffect::Damage,
            2.0,
        ))
        .expect("valid condition");
        defs.insert_condition(condition_def(
            "rage",
            ConditionStyle::Buff,
            ConditionEffect::Strengthen,
            1.0,
        ))
        .expect("valid condition");

        let mut def = attack("venom strike", 1.0, 1.0);
        def.sanity_damage = 2.0;
        def.self_damage = 1.0;
        def.debuffs = vec![EffectChance {
            name: "poison".to_string(),
            chance: 1.0,
        }];
        def.buffs = vec![EffectChance {
            name: "rage".to_string(),
            chance: 1.0,
        }];

        let mut rng = StdRng::seed_from_u64(11);
        let mut user = player();
        let mut target = goblin();
        target.stats.sanity = Some(20.0);
        target.stats.max_sanity = Some(20.0);

        let resolution = Attack::new(&def)
            .resolve(&mut user, &mut target, &defs, &mut rng)
            .expect("resolves");

        assert_eq!(
            resolution.log_text,
            "You used Venom Strike on the Goblin.\n\
             \x20 • It dealt 10 health damage.\n\
             \x20 • It caused 2 sanity damage.\n\
             \x20 • The Goblin was afflicted with: Poison.\n\
             \x20 • You gained: Rage.\n\
             \x20 • You took 1 self-damage."
        );
        assert_eq!(target.stats.conditions.len(), 1);
        assert_eq!(user.stats.conditions.len(), 1);
        assert_eq!(user.stats.health, 99.0);
        assert_eq!(target.stats.sanity, Some(18.0));
    }

    #[test]
    fn test_enemy_damage_records_threat() {
        let defs = Definitions::new();
        let def = attack("stab", 1.0, 1.0);
        let mut rng = StdRng::seed_from_u64(12);
        let mut user = player();
        let mut target = goblin();

        Attack::new(&def)
            .resolve(&mut user, &mut target, &defs, &mut rng)
            .expect("resolves");
        assert_eq!(target.aggro.aggro_for(user.stats.id), 10);
    }

    #[test]
    fn test_sprung_trap_is_gone_after_the_hit() {
        let defs = Definitions::new();
        let def = attack("stab", 1.0, 1.0);
        let mut trap = condition_def("bear trap", ConditionStyle::Buff, ConditionEffect::Trap, 4.0);
        trap.effect.push(ConditionEffect::ArmorIncrease);
        trap.effect_style.push(EffectStyle::Flat);
        trap.effect_amount.push(10.0);

        let mut rng = StdRng::seed_from_u64(13);
        let mut user = player();
        let mut target = goblin();
        let context = holder_context(&target.stats, 0.0, &user);
        target
            .stats
            .add_condition(Condition::from_definition(&trap, &context).expect("valid def"));

        let resolution = Attack::new(&def)
            .resolve(&mut user, &mut target, &defs, &mut rng)
            .expect("resolves");
        assert_eq!(resolution.result, ActionResult::Success);
        assert_eq!(resolution.retaliation, 14.0);
        assert!(target.stats.conditions.is_empty());
        assert_eq!(defense_modifiers(&target.stats.conditions).armor_flat, 0.0);
    }

    #[test]
    fn test_lifesteal_heals_half_raw_damage() {
        let defs = Definitions::new();
        let mut def = attack("leech", 1.0, 1.0);
        def.debuffs = vec![EffectChance {
            name: LIFESTEAL.to_string(),
            chance: 1.0,
        }];
        let mut rng = StdRng::seed_from_u64(13);
        let mut user = player();
        user.stats.health = 50.0;
        let mut target = goblin();
        target.stats.armor = 100.0;

        let resolution = Attack::new(&def)
            .resolve(&mut user, &mut target, &defs, &mut rng)
            .expect("resolves");
        assert_eq!(resolution.healed, 5.0);
        assert_eq!(user.stats.health, 55.0);
        assert!(resolution.damage < 10.0);
        assert!(target.stats.conditions.is_empty());
    }

    #[test]
    fn test_missing_condition_fails_before_any_change() {
        let defs = Definitions::new();
        let mut def = attack("hex", 1.0, 1.0);
        def.debuffs = vec![EffectChance {
            name: "curse".to_string(),
            chance: 1.0,
        }];
        let mut rng = StdRng::seed_from_u64(14);
        let mut user = player();
        let mut target = goblin();

        let result = Attack::new(&def).resolve(&mut user, &mut target, &defs, &mut rng);
        assert!(matches!(result, Err(DelveError::UnknownDefinition { .. })));
        assert_eq!(target.stats.health, 50.0);
    }

    #[test]
    fn test_summons_join_user_minions() {
        let mut defs = Definitions::new();
        defs.insert_summon(SummonDef {
            name: "skeleton".to_string(),
            being_type: "undead".to_string(),
            health: 10.0,
            attack_power: 2.0,
            attacks: vec!["stab".to_string()],
            turns: 3,
            pet: false,
        });
        let mut def = attack("raise dead", 1.0, 0.0);
        def.summons = vec!["skeleton".to_string()];

        let mut rng = StdRng::seed_from_u64(15);
        let mut user = goblin();
        let mut target = player();
        let resolution = Attack::new(&def)
            .resolve(&mut user, &mut target, &defs, &mut rng)
            .expect("resolves");

        assert_eq!(user.minions.len(), 1);
        assert_eq!(user.minions[0].parent.id, user.stats.id);
        assert_eq!(
            resolution.log_text,
            "The Goblin used Raise Dead on you.\n  • The Goblin summoned: Skeleton."
        );
    }

    fn firebolt() -> SpellDef {
        SpellDef {
            name: "firebolt".to_string(),
            element: Element::Fire,
            proficiency_needed: Some(MasteryLevel::Apprentice),
            mana_cost: 10.0,
            uses_weapon: None,
            damage: 5.0,
            self_damage: 0.0,
            sanity_damage: 0.0,
            buffs: vec![],
            debuffs: vec![],
            summons: vec![],
        }
    }

    #[test]
    fn test_spell_gates() {
        let def = firebolt();
        let spell = Spell::new(&def);
        let mut caster = player();

        assert_eq!(spell.can_cast(&caster), Err(CastBlocker::LowProficiency));
        caster.proficiencies.insert(Element::Fire, 60);
        assert_eq!(spell.can_cast(&caster), Ok(()));

        caster.mana.current = 5.0;
        assert_eq!(spell.can_cast(&caster), Err(CastBlocker::LowMana));
    }

    #[test]
    fn test_spell_cast_always_lands() {
        let defs = Definitions::new();
        let def = firebolt();
        let mut rng = StdRng::seed_from_u64(16);
        let mut caster = player();
        caster.magic_power = 2.25;
        caster.proficiencies.insert(Element::Fire, 60);
        let mana_before = caster.mana.current;
        let mut target = goblin();

        let resolution = Spell::new(&def)
            .cast(&mut caster, &mut target, &defs, &mut rng)
            .expect("casts");
        assert_eq!(resolution.result, ActionResult::Success);
        assert_eq!(resolution.damage, 7.25);
        assert_eq!(caster.mana.current, mana_before - 10.0);
        assert_eq!(caster.proficiencies.get(&Element::Fire), Some(&61));
        assert!(resolution.log_text.starts_with("You used Firebolt on the Goblin."));
    }

    #[test]
    fn test_blood_orb_spell_spends_orb() {
        let defs = Definitions::new();
        let mut def = firebolt();
        def.proficiency_needed = None;
        def.buffs = vec![CONSUME_BLOOD_ORB.to_string()];
        let mut rng = StdRng::seed_from_u64(17);
        let mut caster = player();
        let mut target = goblin();

        let spell = Spell::new(&def);
        assert_eq!(spell.can_cast(&caster), Err(CastBlocker::LowOrbs));
        assert!(matches!(
            spell.cast(&mut caster, &mut target, &defs, &mut rng),
            Err(DelveError::InvalidAction(_))
        ));

        caster.blood_orbs = 2;
        let resolution = spell
            .cast(&mut caster, &mut target, &defs, &mut rng)
            .expect("casts");
        assert_eq!(caster.blood_orbs, 1);
        assert!(resolution.buffs.is_empty());
    }
}
