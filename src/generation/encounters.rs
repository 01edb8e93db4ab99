//! # Encounter Generation
//!
//! Turns enemy and boss records into live combatants, and rolls the loot
//! they leave behind.

use crate::{
    number_in_range, roll_drop, CombatStats, Combatant, CombatantKind, DelveError, DelveResult,
    Definitions, DungeonLevel, Enemy, EnemyDef, Minion,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Gold and items dropped by a defeated enemy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loot {
    pub gold: i64,
    pub items: Vec<String>,
}

/// Instantiates an enemy, rolling any ranged stats.
pub fn enemy_from_definition<R: Rng + ?Sized>(def: &EnemyDef, rng: &mut R) -> Enemy {
    let mut stats = CombatStats::new(def.name.clone(), def.health.roll(rng), def.attack_power.roll(rng))
        .with_armor(def.armor)
        .with_block_chance(def.block_chance);
    if let Some(sanity) = def.sanity {
        stats = stats.with_sanity(sanity);
    }
    if let Some(energy) = def.energy {
        stats = stats.with_energy(energy.maximum, energy.regen);
    }

    Enemy {
        stats,
        being_type: def.being_type.clone(),
        attacks: def.attacks.clone(),
        gold_range: def.gold_drop_range,
        drops: def.drops.clone(),
        ..Enemy::new(def.name.clone(), 0.0, 0.0)
    }
}

/// Instantiates a normal enemy by name.
pub fn spawn_enemy<R: Rng + ?Sized>(
    defs: &Definitions,
    name: &str,
    rng: &mut R,
) -> DelveResult<Enemy> {
    let enemy = enemy_from_definition(defs.enemy(name)?, rng);
    log::debug!(
        "Spawned {} with {} health",
        enemy.stats.name,
        enemy.stats.health
    );
    Ok(enemy)
}

/// Instantiates a boss by name, along with the minions it guards with.
pub fn spawn_boss<R: Rng + ?Sized>(
    defs: &Definitions,
    name: &str,
    rng: &mut R,
) -> DelveResult<Enemy> {
    let def = defs.boss(name)?;
    let mut boss = enemy_from_definition(def, rng);
    boss.is_boss = true;

    let owner = boss.back_ref();
    for minion in &def.minions {
        let summon = defs.summon(minion)?;
        boss.minions
            .push(Minion::from_summon(summon, owner.clone(), CombatantKind::Enemy));
    }
    log::debug!(
        "Spawned boss {} with {} minion(s)",
        boss.stats.name,
        boss.minions.len()
    );
    Ok(boss)
}

/// Spawns the opponent for a tile on `level`: its first boss for the boss
/// room, otherwise a random enemy from the level's pool.
pub fn spawn_for_level<R: Rng + ?Sized>(
    defs: &Definitions,
    level: &DungeonLevel,
    boss_room: bool,
    rng: &mut R,
) -> DelveResult<Enemy> {
    if boss_room {
        let name = level.bosses.first().ok_or_else(|| {
            DelveError::InvalidDefinition(format!("level {} has no boss", level.level))
        })?;
        return spawn_boss(defs, name, rng);
    }

    if level.enemies.is_empty() {
        return Err(DelveError::InvalidDefinition(format!(
            "level {} has no enemies",
            level.level
        )));
    }
    let name = &level.enemies[rng.gen_range(0..level.enemies.len())];
    spawn_enemy(defs, name, rng)
}

/// Rolls gold from the enemy's range and checks each drop independently.
pub fn roll_loot<R: Rng + ?Sized>(enemy: &Enemy, rng: &mut R) -> Loot {
    let gold = enemy
        .gold_range
        .map(|[min, max]| number_in_range(rng, min, max))
        .unwrap_or(0);
    let items = enemy
        .drops
        .iter()
        .filter(|drop| roll_drop(rng, drop.chance))
        .map(|drop| drop.item.clone())
        .collect();

    Loot { gold, items }
}
