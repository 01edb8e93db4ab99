//! # Encounter Orchestrator
//!
//! Sequences a combat round as an explicit queue of steps.
//!
//! A round starts with a player action (`player_attack`, `player_cast`,
//! `player_pass` or a failed `flee`) which runs immediately and queues the
//! remaining steps: player minions, the enemy, then the enemy's minions. The
//! caller drives the rest with [`Encounter::advance`], waiting the returned
//! delay between steps if it wants paced playback. Deaths are checked after
//! every step, and an ended encounter drops whatever is still queued.

use crate::config::{FLEE_THRESHOLD, MINION_STEP_DELAY_MS, STEP_DELAY_MS, TRAINING_DUMMY};
use crate::{
    revenge_damage, roll_d20, roll_loot, run_minion_turn, to_title_case, Attack, BattleLog,
    Combatant, CombatantId, DelveError, DelveResult, Definitions, Enemy, Loot, PlayerCharacter,
    Resolution, Spell,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Where the encounter is in its round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    PlayerActing,
    PlayerMinionsActing,
    EnemyActing,
    EnemyMinionsActing,
    Ended,
}

/// A queued continuation of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    PlayerMinions,
    Enemy,
    EnemyMinions,
}

impl Step {
    fn phase(self) -> Phase {
        match self {
            Step::PlayerMinions => Phase::PlayerMinionsActing,
            Step::Enemy => Phase::EnemyActing,
            Step::EnemyMinions => Phase::EnemyMinionsActing,
        }
    }

    /// Suggested pause after this step for paced playback.
    pub fn delay(self) -> Duration {
        match self {
            Step::Enemy => Duration::from_millis(STEP_DELAY_MS),
            Step::PlayerMinions | Step::EnemyMinions => Duration::from_millis(MINION_STEP_DELAY_MS),
        }
    }
}

/// How an encounter finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterEnd {
    EnemyDefeated,
    PlayerDefeated,
    Fled,
    Abandoned,
}

/// Report for one executed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: Step,
    pub delay: Duration,
    /// Set when this step ended the encounter
    pub outcome: Option<EncounterEnd>,
}

/// One fight between the player's side and a single enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub enemy: Enemy,
    pub boss_fight: bool,
    queue: VecDeque<Step>,
    phase: Phase,
    round: u32,
    outcome: Option<EncounterEnd>,
    loot: Option<Loot>,
}

impl Encounter {
    pub fn new(enemy: Enemy, boss_fight: bool) -> Self {
        Self {
            enemy,
            boss_fight,
            queue: VecDeque::new(),
            phase: Phase::Idle,
            round: 1,
            outcome: None,
            loot: None,
        }
    }

    /// Opening battle-log line.
    pub fn intro_text(&self) -> String {
        let mut text = format!("You have run into a {}", self.enemy.stats.name);
        if !self.enemy.minions.is_empty() {
            let names: Vec<String> = self
                .enemy
                .minions
                .iter()
                .map(|m| to_title_case(&m.stats.name))
                .collect();
            text.push_str(&format!(" guarded by {}", names.join(", ")));
        }
        text
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn outcome(&self) -> Option<EncounterEnd> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Gold and items rolled when the enemy fell.
    pub fn loot(&self) -> Option<&Loot> {
        self.loot.as_ref()
    }

    /// Steps still queued for this round, in execution order.
    pub fn pending(&self) -> impl Iterator<Item = Step> + '_ {
        self.queue.iter().copied()
    }

    /// Attacks the enemy with one of the player's attacks.
    pub fn player_attack<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        attack: &str,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<Resolution> {
        self.ensure_ready()?;
        let attack = Attack::from_definitions(defs, attack)?;
        self.phase = Phase::PlayerActing;
        let resolution = attack.resolve(player, &mut self.enemy, defs, rng)?;
        self.finish_player_step(player, &resolution, rng, log);
        Ok(resolution)
    }

    /// Casts one of the player's spells at the enemy.
    ///
    /// An uncastable spell is an error and leaves the round unstarted.
    pub fn player_cast<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        spell: &str,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<Resolution> {
        self.ensure_ready()?;
        let spell = Spell::from_definitions(defs, spell)?;
        let resolution = spell.cast(player, &mut self.enemy, defs, rng)?;
        self.phase = Phase::PlayerActing;
        self.finish_player_step(player, &resolution, rng, log);
        Ok(resolution)
    }

    /// Skips the player's action.
    pub fn player_pass<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<Resolution> {
        self.ensure_ready()?;
        self.phase = Phase::PlayerActing;
        let resolution = Resolution::new(crate::ActionResult::Pass, "You passed!");
        self.finish_player_step(player, &resolution, rng, log);
        Ok(resolution)
    }

    /// Attempts to escape.
    ///
    /// Succeeds on a d20 above the flee threshold, against a training dummy,
    /// or when the encounter is already over. Success ends the encounter and
    /// dismisses the player's minions; failure spends the player's action
    /// and queues the rest of the round.
    pub fn flee<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<bool> {
        if self.is_over() {
            return Ok(true);
        }
        self.ensure_ready()?;

        let roll = roll_d20(rng);
        if self.enemy.stats.name == TRAINING_DUMMY || roll > FLEE_THRESHOLD {
            player.minions.clear();
            log.append("You fled!".to_string());
            self.end(EncounterEnd::Fled);
            return Ok(true);
        }

        self.phase = Phase::PlayerActing;
        let resolution = Resolution::new(crate::ActionResult::Pass, "You failed to flee!");
        self.finish_player_step(player, &resolution, rng, log);
        Ok(false)
    }

    /// Runs the next queued step.
    ///
    /// Returns `None` once the round is complete or the encounter is over.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<Option<StepReport>> {
        if self.is_over() {
            self.queue.clear();
            return Ok(None);
        }
        let step = match self.queue.pop_front() {
            Some(step) => step,
            None => return Ok(None),
        };

        self.phase = step.phase();
        match step {
            Step::PlayerMinions => self.player_minions_step(player, defs, rng, log)?,
            Step::Enemy => self.enemy_step(player, defs, rng, log)?,
            Step::EnemyMinions => self.enemy_minions_step(player, defs, rng, log)?,
        }

        let outcome = self.check_deaths(player, rng, log);
        if outcome.is_none() && self.queue.is_empty() {
            player.prune_minions();
            self.enemy.prune_minions();
            self.phase = Phase::Idle;
            self.round += 1;
        }

        Ok(Some(StepReport {
            step,
            delay: step.delay(),
            outcome,
        }))
    }

    /// Runs every queued step without pausing.
    pub fn finish_round<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<Vec<StepReport>> {
        let mut reports = Vec::new();
        while let Some(report) = self.advance(player, defs, rng, log)? {
            reports.push(report);
        }
        Ok(reports)
    }

    /// Cancels every pending step, ending the encounter if it was still
    /// running. Returns how many steps were dropped.
    pub fn abandon(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        if !self.is_over() {
            log::info!("Encounter with {} abandoned", self.enemy.stats.name);
            self.end(EncounterEnd::Abandoned);
        }
        dropped
    }

    fn ensure_ready(&self) -> DelveResult<()> {
        if let Some(outcome) = self.outcome {
            return Err(DelveError::InvalidState(format!(
                "encounter already ended: {:?}",
                outcome
            )));
        }
        if !self.queue.is_empty() {
            return Err(DelveError::InvalidState(
                "the current round is still in progress".to_string(),
            ));
        }
        Ok(())
    }

    fn finish_player_step<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        resolution: &Resolution,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) {
        log.append(resolution.log_text.clone());
        player.end_turn();

        if self.check_deaths(player, rng, log).is_none() {
            self.queue
                .extend([Step::PlayerMinions, Step::Enemy, Step::EnemyMinions]);
        }
    }

    fn player_minions_step<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<()> {
        player.prune_minions();
        let mut index = 0;
        while index < player.minions.len() && !self.enemy.stats.is_defeated() {
            let turn = run_minion_turn(&mut player.minions, index, &mut self.enemy, defs, rng)?;
            log.append(format!("(minion) {}", turn.resolution.log_text));
            if turn.removed.is_none() {
                index += 1;
            }
        }
        Ok(())
    }

    fn enemy_step<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<()> {
        if self.enemy.stats.is_defeated() {
            return Ok(());
        }
        let health_before = player.stats.health;
        let turn = self.enemy.take_turn(player, defs, rng)?;
        log.append(turn.resolution.log_text);
        apply_revenge(player, health_before, &mut self.enemy, log);
        Ok(())
    }

    fn enemy_minions_step<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<()> {
        self.enemy.prune_minions();
        let mut index = 0;
        while index < self.enemy.minions.len() && !player.stats.is_defeated() {
            let target_id = self.enemy.minions[index]
                .aggro
                .highest_aggro_target(&player.target_candidates())
                .unwrap_or(player.stats.id);
            let health_before = player.stats.health;
            let target = hostile_target(player, target_id)?;
            let turn = run_minion_turn(&mut self.enemy.minions, index, target, defs, rng)?;
            log.append(turn.resolution.log_text);

            if turn.removed.is_none() {
                apply_revenge(player, health_before, &mut self.enemy.minions[index], log);
                index += 1;
            }
        }
        Ok(())
    }

    fn check_deaths<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerCharacter,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> Option<EncounterEnd> {
        if self.is_over() {
            return self.outcome;
        }

        if self.enemy.stats.is_defeated() {
            log.append(format!(
                "You defeated the {}",
                to_title_case(&self.enemy.stats.name)
            ));
            let loot = roll_loot(&self.enemy, rng);
            player.gold += loot.gold;
            player.inventory.extend(loot.items.iter().cloned());
            self.loot = Some(loot);
            player.minions.retain(|m| m.pet);
            self.end(EncounterEnd::EnemyDefeated);
        } else if player.stats.is_defeated() {
            log.append("You were defeated!".to_string());
            self.end(EncounterEnd::PlayerDefeated);
        }
        self.outcome
    }

    fn end(&mut self, outcome: EncounterEnd) {
        log::info!(
            "Encounter with {} ended after {} round(s): {:?}",
            self.enemy.stats.name,
            self.round,
            outcome
        );
        self.queue.clear();
        self.phase = Phase::Ended;
        self.outcome = Some(outcome);
    }
}

fn hostile_target(player: &mut PlayerCharacter, id: CombatantId) -> DelveResult<&mut dyn Combatant> {
    player
        .hostile_target_mut(id)
        .ok_or_else(|| DelveError::InvalidState(format!("target {} is not in the fight", id)))
}

fn apply_revenge(
    player: &PlayerCharacter,
    health_before: f64,
    attacker: &mut dyn Combatant,
    log: &mut dyn BattleLog,
) {
    if let Some(damage) = revenge_damage(player, health_before - player.stats.health) {
        attacker.take_damage(damage, Some(player.stats.id));
        log.append(format!("You dealt {} revenge damage!", damage));
    }
}
