//! # Creatures
//!
//! The three combatant variants and their per-turn behavior.
//!
//! Enemy turns follow a fixed priority: an `execute` condition destroys the
//! enemy outright, a stun skips the action (and draws threat toward whoever
//! placed it), an enemy with no affordable attack passes, and otherwise it
//! picks an affordable attack at random against its highest-aggro target.
//! Every turn except an execution ends with a condition tick and energy
//! regeneration.
//!
//! Minions count down a lifespan and are removed from their parent's roster
//! in the same call that spends their last turn.

use crate::config::{EXECUTE_DAMAGE, STUN_THREAT};
use crate::{
    coin_flip, low_energy_text, miss_text, round_to_quarter, stunned_text, to_title_case,
    ActionResult, AggroTable, Attack, AttackDef, BackRef, CombatStats, Combatant, CombatantId,
    CombatantKind, ConditionEffect, ConditionTick, DelveError, DelveResult, Definitions, DropDef,
    Element, MasteryLevel, Resolution, ResourcePool, SummonDef, TargetCandidate,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The human-controlled combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCharacter {
    pub stats: CombatStats,
    pub magic_power: f64,
    pub mana: ResourcePool,
    /// Proficiency points per school of magic
    pub proficiencies: HashMap<Element, u32>,
    pub blood_orbs: u32,
    /// Weapon class currently equipped, checked by weapon-bound spells
    pub main_hand: Option<String>,
    pub minions: Vec<Minion>,
    pub gold: i64,
    pub inventory: Vec<String>,
    pub attacks: Vec<String>,
    pub spells: Vec<String>,
}

impl PlayerCharacter {
    /// Creates a player with 50 sanity and a 100-point mana pool.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Combatant, PlayerCharacter};
    ///
    /// let player = PlayerCharacter::new("Aria", 100.0, 10.0);
    /// assert!(player.is_player());
    /// assert_eq!(player.stats.health, 100.0);
    /// ```
    pub fn new(name: impl Into<String>, max_health: f64, attack_power: f64) -> Self {
        Self {
            stats: CombatStats::new(name, max_health, attack_power).with_sanity(50.0),
            magic_power: 0.0,
            mana: ResourcePool::full(100.0, 5.0),
            proficiencies: HashMap::new(),
            blood_orbs: 0,
            main_hand: None,
            minions: Vec::new(),
            gold: 0,
            inventory: Vec::new(),
            attacks: Vec::new(),
            spells: Vec::new(),
        }
    }

    pub fn mastery_level(&self, element: Element) -> MasteryLevel {
        MasteryLevel::from_proficiency(self.proficiencies.get(&element).copied().unwrap_or(0))
    }

    /// Grants one proficiency point in `element` until legend mastery.
    pub fn gain_proficiency(&mut self, element: Element) {
        if self.mastery_level(element) < MasteryLevel::Legend {
            *self.proficiencies.entry(element).or_insert(0) += 1;
        }
    }

    /// Ticks conditions and regenerates mana.
    pub fn end_turn(&mut self) -> Vec<ConditionTick> {
        let ticks = self.stats.tick_conditions();
        self.mana.regenerate();
        ticks
    }

    /// Candidates an enemy may target: the player first, then its minions.
    pub fn target_candidates(&self) -> Vec<TargetCandidate> {
        std::iter::once(self.target_candidate())
            .chain(self.minions.iter().map(|m| m.target_candidate()))
            .collect()
    }

    /// The player or one of its minions, by id.
    pub fn hostile_target_mut(&mut self, id: CombatantId) -> Option<&mut dyn Combatant> {
        if id == self.stats.id {
            return Some(self as &mut dyn Combatant);
        }
        self.minions
            .iter_mut()
            .find(|m| m.stats.id == id)
            .map(|m| m as &mut dyn Combatant)
    }

    /// Removes dead or expired minions.
    pub fn prune_minions(&mut self) -> Vec<BackRef> {
        prune(&mut self.minions)
    }
}

impl Combatant for PlayerCharacter {
    fn stats(&self) -> &CombatStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CombatStats {
        &mut self.stats
    }

    fn kind(&self) -> CombatantKind {
        CombatantKind::Player
    }

    fn minions_mut(&mut self) -> Option<&mut Vec<Minion>> {
        Some(&mut self.minions)
    }
}

fn prune(minions: &mut Vec<Minion>) -> Vec<BackRef> {
    let mut removed = Vec::new();
    minions.retain(|minion| {
        if minion.is_spent() {
            removed.push(minion.back_ref());
            false
        } else {
            true
        }
    });
    removed
}

/// A temporary summoned combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minion {
    pub stats: CombatStats,
    pub attacks: Vec<String>,
    pub turns_left_alive: i32,
    pub parent: BackRef,
    pub parent_kind: CombatantKind,
    /// Pets never count down
    pub pet: bool,
    pub aggro: AggroTable,
}

impl Minion {
    /// Instantiates a summon for `parent`.
    pub fn from_summon(def: &SummonDef, parent: BackRef, parent_kind: CombatantKind) -> Self {
        Self {
            stats: CombatStats::new(def.name.clone(), def.health, def.attack_power),
            attacks: def.attacks.clone(),
            turns_left_alive: def.turns,
            parent,
            parent_kind,
            pet: def.pet,
            aggro: AggroTable::new(),
        }
    }

    /// Dead, or out of turns and not a pet.
    pub fn is_spent(&self) -> bool {
        self.stats.health <= 0.0 || (!self.pet && self.turns_left_alive <= 0)
    }

    /// Acts against `target` and spends one turn of lifespan.
    ///
    /// A non-pet minion asked to act with no turns left was never cleaned
    /// up, which is reported as [`DelveError::MinionNotRemoved`] without
    /// touching any state. A failed action leaves the lifespan as it was.
    pub fn take_turn<R: Rng + ?Sized>(
        &mut self,
        target: &mut dyn Combatant,
        defs: &Definitions,
        rng: &mut R,
    ) -> DelveResult<Resolution> {
        if !self.pet && self.turns_left_alive <= 0 {
            log::error!("{} acted after its lifespan ended", self.stats.name);
            return Err(DelveError::MinionNotRemoved {
                name: self.stats.name.clone(),
                id: self.stats.id,
            });
        }
        let resolution = self.act(target, defs, rng)?;
        if !self.pet {
            self.turns_left_alive -= 1;
        }
        self.stats.tick_conditions();
        Ok(resolution)
    }

    fn act<R: Rng + ?Sized>(
        &mut self,
        target: &mut dyn Combatant,
        defs: &Definitions,
        rng: &mut R,
    ) -> DelveResult<Resolution> {
        let attacks = affordable_attacks(&self.attacks, self.stats.energy, defs)?;
        if attacks.is_empty() {
            return Ok(Resolution::new(
                ActionResult::Pass,
                format!("{} passed!", self.log_subject()),
            ));
        }
        let choice = attacks[rng.gen_range(0..attacks.len())];
        Attack::new(choice).resolve(self, target, defs, rng)
    }
}

impl Combatant for Minion {
    fn stats(&self) -> &CombatStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CombatStats {
        &mut self.stats
    }

    fn kind(&self) -> CombatantKind {
        CombatantKind::Minion
    }

    fn take_damage(&mut self, damage: f64, attacker: Option<CombatantId>) {
        self.stats.health -= damage;
        if let Some(attacker) = attacker {
            self.aggro.add_aggro(attacker, threat_points(damage));
        }
    }

    fn log_subject(&self) -> String {
        match self.parent_kind {
            CombatantKind::Player => format!("The {}", to_title_case(&self.stats.name)),
            _ => format!(
                "The {}'s {}",
                to_title_case(&self.parent.name),
                to_title_case(&self.stats.name)
            ),
        }
    }

    fn log_object(&self) -> String {
        format!("the {}", to_title_case(&self.stats.name))
    }
}

/// What a minion turn did to the roster.
#[derive(Debug, Clone, PartialEq)]
pub struct MinionTurn {
    pub resolution: Resolution,
    /// Set when the minion was removed from its parent this turn
    pub removed: Option<BackRef>,
}

/// Runs the turn of `minions[index]` and removes it from the roster if that
/// turn spent it.
///
/// # Examples
///
/// ```
/// use delve::{run_minion_turn, BackRef, CombatantKind, Definitions, Enemy, Minion, SummonDef};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let wisp = SummonDef {
///     name: "wisp".to_string(),
///     being_type: String::new(),
///     health: 5.0,
///     attack_power: 1.0,
///     attacks: vec![],
///     turns: 1,
///     pet: false,
/// };
/// let owner = BackRef::new(uuid::Uuid::new_v4(), "Aria");
/// let mut minions = vec![Minion::from_summon(&wisp, owner, CombatantKind::Player)];
/// let mut enemy = Enemy::new("rat", 5.0, 1.0);
/// let mut rng = StdRng::seed_from_u64(1);
///
/// let turn = run_minion_turn(&mut minions, 0, &mut enemy, &Definitions::new(), &mut rng).unwrap();
/// assert!(turn.removed.is_some());
/// assert!(minions.is_empty());
/// ```
pub fn run_minion_turn<R: Rng + ?Sized>(
    minions: &mut Vec<Minion>,
    index: usize,
    target: &mut dyn Combatant,
    defs: &Definitions,
    rng: &mut R,
) -> DelveResult<MinionTurn> {
    let minion = minions
        .get_mut(index)
        .ok_or_else(|| DelveError::InvalidState(format!("no minion at index {}", index)))?;
    let resolution = minion.take_turn(target, defs, rng)?;

    let removed = if minion.is_spent() {
        let minion = minions.remove(index);
        log::debug!("{} left the fight", minion.stats.name);
        Some(minion.back_ref())
    } else {
        None
    };

    Ok(MinionTurn {
        resolution,
        removed,
    })
}

/// An enemy for a single encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub stats: CombatStats,
    pub being_type: String,
    pub attacks: Vec<String>,
    pub minions: Vec<Minion>,
    pub aggro: AggroTable,
    pub is_boss: bool,
    pub gold_range: Option<[i64; 2]>,
    pub drops: Vec<DropDef>,
}

/// Result of an enemy turn.
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyTurn {
    pub resolution: Resolution,
    /// Who the enemy acted against, if it acted
    pub target: Option<CombatantId>,
}

impl Enemy {
    /// Creates an enemy with no attacks, energy, loot or minions.
    pub fn new(species: impl Into<String>, max_health: f64, attack_power: f64) -> Self {
        Self {
            stats: CombatStats::new(species, max_health, attack_power),
            being_type: String::new(),
            attacks: Vec::new(),
            minions: Vec::new(),
            aggro: AggroTable::new(),
            is_boss: false,
            gold_range: None,
            drops: Vec::new(),
        }
    }

    pub fn with_attacks(mut self, attacks: Vec<String>) -> Self {
        self.attacks = attacks;
        self
    }

    /// Ticks conditions and regenerates energy.
    pub fn end_turn(&mut self) -> Vec<ConditionTick> {
        let ticks = self.stats.tick_conditions();
        if let Some(energy) = self.stats.energy.as_mut() {
            energy.regenerate();
        }
        ticks
    }

    /// Highest-aggro target among the player and its minions, defaulting to
    /// the player.
    pub fn choose_target(&self, player: &PlayerCharacter) -> CombatantId {
        self.aggro
            .highest_aggro_target(&player.target_candidates())
            .unwrap_or(player.stats.id)
    }

    /// Removes dead or expired minions.
    pub fn prune_minions(&mut self) -> Vec<BackRef> {
        prune(&mut self.minions)
    }

    /// Takes the enemy's turn against the player's side.
    pub fn take_turn<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        defs: &Definitions,
        rng: &mut R,
    ) -> DelveResult<EnemyTurn> {
        let executioner = self
            .stats
            .conditions
            .iter()
            .find(|c| c.has_effect(ConditionEffect::Execute))
            .map(|c| c.placed_by.clone());
        if let Some(executioner) = executioner {
            self.take_damage(EXECUTE_DAMAGE, Some(executioner.id));
            log::info!("{} was executed by {}", self.stats.name, executioner.name);
            return Ok(EnemyTurn {
                resolution: Resolution::new(
                    ActionResult::Executed,
                    format!("{} was executed!", self.log_subject()),
                ),
                target: None,
            });
        }

        if self.stats.is_stunned() {
            let sources: Vec<CombatantId> = self
                .stats
                .conditions
                .iter()
                .filter(|c| c.has_effect(ConditionEffect::Stun))
                .map(|c| c.placed_by.id)
                .collect();
            for source in sources {
                self.aggro.add_aggro(source, u64::from(STUN_THREAT));
            }
            let resolution = Resolution::new(ActionResult::Stunned, stunned_text(self));
            self.end_turn();
            return Ok(EnemyTurn {
                resolution,
                target: None,
            });
        }

        let attacks = affordable_attacks(&self.attacks, self.stats.energy, defs)?;
        if attacks.is_empty() {
            let resolution = Resolution::new(ActionResult::Pass, low_energy_text(self));
            self.end_turn();
            return Ok(EnemyTurn {
                resolution,
                target: None,
            });
        }

        let target_id = self.choose_target(player);
        let target = player.hostile_target_mut(target_id).ok_or_else(|| {
            DelveError::InvalidState(format!("target {} is not in the fight", target_id))
        })?;

        let resolution = if self.stats.has_effect(ConditionEffect::AccuracyHalved) && !coin_flip(rng)
        {
            Resolution::new(ActionResult::Miss, miss_text(self, target))
        } else {
            let choice = attacks[rng.gen_range(0..attacks.len())];
            Attack::new(choice).resolve(self, target, defs, rng)?
        };

        self.end_turn();
        Ok(EnemyTurn {
            resolution,
            target: Some(target_id),
        })
    }
}

impl Combatant for Enemy {
    fn stats(&self) -> &CombatStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CombatStats {
        &mut self.stats
    }

    fn kind(&self) -> CombatantKind {
        CombatantKind::Enemy
    }

    fn take_damage(&mut self, damage: f64, attacker: Option<CombatantId>) {
        self.stats.health -= damage;
        if let Some(attacker) = attacker {
            self.aggro.add_aggro(attacker, threat_points(damage));
        }
    }

    fn minions_mut(&mut self) -> Option<&mut Vec<Minion>> {
        Some(&mut self.minions)
    }
}

fn threat_points(damage: f64) -> u64 {
    if damage > 0.0 {
        damage.ceil() as u64
    } else {
        0
    }
}

fn affordable_attacks<'d>(
    names: &[String],
    energy: Option<ResourcePool>,
    defs: &'d Definitions,
) -> DelveResult<Vec<&'d AttackDef>> {
    let mut affordable = Vec::with_capacity(names.len());
    for name in names {
        let attack = defs.attack(name)?;
        if energy.map_or(true, |pool| pool.can_afford(attack.energy_cost)) {
            affordable.push(attack);
        }
    }
    Ok(affordable)
}

/// Damage the player's revenge condition returns for `health_lost`.
///
/// Capped at ten times the condition's magnitude.
pub fn revenge_damage(player: &PlayerCharacter, health_lost: f64) -> Option<f64> {
    if health_lost <= 0.0 {
        return None;
    }
    let magnitude = player
        .stats
        .conditions
        .iter()
        .find_map(|c| c.magnitude_of(ConditionEffect::Revenge))?;
    Some(round_to_quarter((health_lost * 5.0).min(magnitude * 10.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Condition, ConditionContext, ConditionDef, ConditionStyle, EffectStyle};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn definitions() -> Definitions {
        let mut defs = Definitions::new();
        defs.insert_attack(AttackDef {
            name: "claw".to_string(),
            hit_chance: 1.0,
            energy_cost: 5.0,
            damage_mult: 1.0,
            flat_health_damage: 0.0,
            self_damage: 0.0,
            sanity_damage: 0.0,
            secondary_effect: None,
            secondary_effect_chance: None,
            buffs: vec![],
            debuffs: vec![],
            summons: vec![],
        });
        defs
    }

    fn summon(turns: i32, pet: bool) -> SummonDef {
        SummonDef {
            name: "skeleton".to_string(),
            being_type: "undead".to_string(),
            health: 10.0,
            attack_power: 3.0,
            attacks: vec!["claw".to_string()],
            turns,
            pet,
        }
    }

    fn condition_on(
        stats: &mut CombatStats,
        effect: ConditionEffect,
        magnitude: f64,
        placer: &BackRef,
    ) {
        let def = ConditionDef {
            name: format!("{:?}", effect).to_lowercase(),
            style: ConditionStyle::Debuff,
            effect: vec![effect],
            effect_style: vec![EffectStyle::Flat],
            effect_amount: vec![magnitude],
            turns: 2,
            aura: false,
            trap_setup_time: None,
        };
        let context = ConditionContext {
            primary_damage: 0.0,
            holder_max_health: stats.max_health,
            holder_max_sanity: stats.max_sanity,
            applier: placer.clone(),
        };
        stats.add_condition(Condition::from_definition(&def, &context).expect("valid def"));
    }

    fn clawing_enemy() -> Enemy {
        let mut enemy = Enemy::new("ghoul", 40.0, 4.0).with_attacks(vec!["claw".to_string()]);
        enemy.stats.energy = Some(ResourcePool::full(10.0, 2.0));
        enemy
    }

    #[test]
    fn test_minion_with_one_turn_is_removed() {
        let defs = definitions();
        let mut rng = StdRng::seed_from_u64(1);
        let mut player = PlayerCharacter::new("Aria", 50.0, 5.0);
        let parent = player.back_ref();
        player
            .minions
            .push(Minion::from_summon(&summon(1, false), parent, CombatantKind::Player));
        let mut enemy = clawing_enemy();

        let turn = run_minion_turn(&mut player.minions, 0, &mut enemy, &defs, &mut rng)
            .expect("minion acts");
        assert_eq!(turn.resolution.result, ActionResult::Success);
        assert!(turn.removed.is_some());
        assert_eq!(player.minions.len(), 0);
        assert_eq!(enemy.stats.health, 37.0);
    }

    #[test]
    fn test_minion_with_no_turns_is_an_error() {
        let defs = definitions();
        let mut rng = StdRng::seed_from_u64(2);
        let owner = BackRef::new(crate::new_combatant_id(), "Aria");
        let mut minion = Minion::from_summon(&summon(1, false), owner, CombatantKind::Player);
        minion.turns_left_alive = 0;
        let mut enemy = clawing_enemy();

        let result = minion.take_turn(&mut enemy, &defs, &mut rng);
        assert!(matches!(result, Err(DelveError::MinionNotRemoved { .. })));
        assert_eq!(minion.turns_left_alive, 0);
        assert_eq!(enemy.stats.health, 40.0);
    }

    #[test]
    fn test_failed_action_keeps_lifespan() {
        let defs = definitions();
        let mut rng = StdRng::seed_from_u64(4);
        let owner = BackRef::new(crate::new_combatant_id(), "Aria");
        let mut minion = Minion::from_summon(&summon(2, false), owner, CombatantKind::Player);
        minion.attacks = vec!["gnaw".to_string()];
        let mut enemy = clawing_enemy();

        let result = minion.take_turn(&mut enemy, &defs, &mut rng);
        assert!(matches!(result, Err(DelveError::UnknownDefinition { .. })));
        assert_eq!(minion.turns_left_alive, 2);
        assert_eq!(enemy.stats.health, 40.0);
    }

    #[test]
    fn test_pets_do_not_count_down() {
        let defs = definitions();
        let mut rng = StdRng::seed_from_u64(3);
        let owner = BackRef::new(crate::new_combatant_id(), "Aria");
        let mut minions = vec![Minion::from_summon(&summon(1, true), owner, CombatantKind::Player)];
        let mut enemy = clawing_enemy();

        for _ in 0..3 {
            let turn = run_minion_turn(&mut minions, 0, &mut enemy, &defs, &mut rng)
                .expect("pet acts");
            assert!(turn.removed.is_none());
        }
        assert_eq!(minions[0].turns_left_alive, 1);

        // Pet records carry no lifespan at all
        minions[0].turns_left_alive = 0;
        let turn = run_minion_turn(&mut minions, 0, &mut enemy, &defs, &mut rng)
            .expect("lifespan-free pet acts");
        assert!(turn.removed.is_none());
    }

    #[test]
    fn test_enemy_minion_log_names_owner() {
        let enemy = clawing_enemy();
        let minion = Minion::from_summon(&summon(2, false), enemy.back_ref(), CombatantKind::Enemy);
        assert_eq!(minion.log_subject(), "The Ghoul's Skeleton");
    }

    #[test]
    fn test_enemy_attacks_player_and_regenerates() {
        let defs = definitions();
        let mut rng = StdRng::seed_from_u64(4);
        let mut player = PlayerCharacter::new("Aria", 50.0, 5.0);
        let mut enemy = clawing_enemy();

        let turn = enemy.take_turn(&mut player, &defs, &mut rng).expect("enemy acts");
        assert_eq!(turn.resolution.result, ActionResult::Success);
        assert_eq!(turn.target, Some(player.stats.id));
        assert_eq!(player.stats.health, 46.0);
        // 10 - 5 spent + 2 regenerated
        assert_eq!(enemy.stats.energy.map(|e| e.current), Some(7.0));
    }

    #[test]
    fn test_enemy_passes_without_energy() {
        let defs = definitions();
        let mut rng = StdRng::seed_from_u64(5);
        let mut player = PlayerCharacter::new("Aria", 50.0, 5.0);
        let mut enemy = clawing_enemy();
        enemy.stats.energy = Some(ResourcePool {
            current: 1.0,
            maximum: 10.0,
            regen: 2.0,
        });

        let turn = enemy.take_turn(&mut player, &defs, &mut rng).expect("enemy acts");
        assert_eq!(turn.resolution.result, ActionResult::Pass);
        assert_eq!(turn.resolution.log_text, "The Ghoul passed (low energy)!");
        assert_eq!(enemy.stats.energy.map(|e| e.current), Some(3.0));
        assert_eq!(player.stats.health, 50.0);
    }

    #[test]
    fn test_stunned_enemy_adds_threat_to_stunner() {
        let defs = definitions();
        let mut rng = StdRng::seed_from_u64(6);
        let mut player = PlayerCharacter::new("Aria", 50.0, 5.0);
        let stunner = player.back_ref();
        let mut enemy = clawing_enemy();
        condition_on(&mut enemy.stats, ConditionEffect::Stun, 0.0, &stunner);

        let turn = enemy.take_turn(&mut player, &defs, &mut rng).expect("enemy acts");
        assert_eq!(turn.resolution.result, ActionResult::Stunned);
        assert_eq!(turn.resolution.log_text, "The Ghoul was stunned!");
        assert_eq!(enemy.aggro.aggro_for(stunner.id), 10);
        assert_eq!(player.stats.health, 50.0);
    }

    #[test]
    fn test_execute_bypasses_stun() {
        let defs = definitions();
        let mut rng = StdRng::seed_from_u64(7);
        let mut player = PlayerCharacter::new("Aria", 50.0, 5.0);
        let placer = player.back_ref();
        let mut enemy = clawing_enemy();
        condition_on(&mut enemy.stats, ConditionEffect::Stun, 0.0, &placer);
        condition_on(&mut enemy.stats, ConditionEffect::Execute, 0.0, &placer);

        let turn = enemy.take_turn(&mut player, &defs, &mut rng).expect("enemy acts");
        assert_eq!(turn.resolution.result, ActionResult::Executed);
        assert_eq!(turn.resolution.log_text, "The Ghoul was executed!");
        assert!(enemy.stats.is_defeated());
        assert!(enemy.aggro.aggro_for(placer.id) >= 9999);
    }

    #[test]
    fn test_accuracy_halved_suppresses_some_attacks() {
        let defs = definitions();
        let mut rng = StdRng::seed_from_u64(8);
        let mut misses = 0;
        let mut hits = 0;
        for _ in 0..100 {
            let mut player = PlayerCharacter::new("Aria", 500.0, 5.0);
            let placer = player.back_ref();
            let mut enemy = clawing_enemy();
            condition_on(&mut enemy.stats, ConditionEffect::AccuracyHalved, 0.0, &placer);
            match enemy.take_turn(&mut player, &defs, &mut rng).expect("enemy acts").resolution.result {
                ActionResult::Miss => misses += 1,
                ActionResult::Success => hits += 1,
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert!(misses > 0 && hits > 0);
    }

    #[test]
    fn test_enemy_targets_highest_aggro_minion() {
        let defs = definitions();
        let mut rng = StdRng::seed_from_u64(9);
        let mut player = PlayerCharacter::new("Aria", 50.0, 5.0);
        let parent = player.back_ref();
        player
            .minions
            .push(Minion::from_summon(&summon(3, false), parent, CombatantKind::Player));
        let minion_id = player.minions[0].stats.id;

        let mut enemy = clawing_enemy();
        enemy.aggro.add_aggro(player.stats.id, 2);
        enemy.aggro.add_aggro(minion_id, 5);

        let turn = enemy.take_turn(&mut player, &defs, &mut rng).expect("enemy acts");
        assert_eq!(turn.target, Some(minion_id));
        assert_eq!(player.minions[0].stats.health, 6.0);
        assert_eq!(player.stats.health, 50.0);
    }

    #[test]
    fn test_revenge_damage_is_capped() {
        let mut player = PlayerCharacter::new("Aria", 50.0, 5.0);
        assert_eq!(revenge_damage(&player, 10.0), None);

        let source = player.back_ref();
        condition_on(&mut player.stats, ConditionEffect::Revenge, 3.0, &source);
        assert_eq!(revenge_damage(&player, 2.0), Some(10.0));
        assert_eq!(revenge_damage(&player, 20.0), Some(30.0));
        assert_eq!(revenge_damage(&player, 0.0), None);
    }

    #[test]
    fn test_proficiency_stops_at_legend() {
        let mut player = PlayerCharacter::new("Aria", 50.0, 5.0);
        player.proficiencies.insert(Element::Bone, 499);
        player.gain_proficiency(Element::Bone);
        assert_eq!(player.mastery_level(Element::Bone), MasteryLevel::Legend);
        player.gain_proficiency(Element::Bone);
        assert_eq!(player.proficiencies.get(&Element::Bone), Some(&500));
    }
}
