//! # Game State Module
//!
//! Run state for a dungeon visit: the current level's tiles, the player's
//! position on them, the active encounter and the game clock.
//!
//! Player actions are forwarded to the active [`Encounter`]; whenever an
//! encounter finishes, its outcome is folded back into the run (tile cleared,
//! boss progression, retreat after fleeing) and a [`Snapshot`] is handed to
//! the persistence hook, if one is installed.

use crate::{
    bounding_box, create_rng, generate_tiles, spawn_for_level, BattleLog, BoundingBox,
    DelveError, DelveResult, Definitions, DungeonInstance, Encounter, EncounterEnd, Enemy,
    PlayerCharacter, Position, Resolution, StepReport, Tile,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Serializable picture of a run, written at dungeon entry and after every
/// encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub player: PlayerCharacter,
    /// The enemy of the active encounter, with its conditions and aggro
    pub enemy: Option<Enemy>,
    pub boss_fight: bool,
    pub dungeon: Option<DungeonInstance>,
    pub depth: u32,
    pub tiles: Vec<Tile>,
    pub tile_size: i32,
    pub current_position: Position,
    pub bounding_box: Option<BoundingBox>,
    pub game_clock: u64,
}

impl Snapshot {
    pub fn to_json(&self) -> DelveResult<String> {
        serde_json::to_string_pretty(self).map_err(DelveError::from)
    }

    pub fn from_json(json: &str) -> DelveResult<Self> {
        serde_json::from_str(json).map_err(DelveError::from)
    }
}

/// Receives snapshots; the engine never reads them back mid-run.
pub trait PersistenceHook {
    fn store(&mut self, snapshot: &Snapshot) -> DelveResult<()>;
}

/// Keeps every snapshot in memory.
impl PersistenceHook for Vec<Snapshot> {
    fn store(&mut self, snapshot: &Snapshot) -> DelveResult<()> {
        self.push(snapshot.clone());
        Ok(())
    }
}

/// Writes each snapshot as pretty JSON to a file, replacing the previous one.
#[derive(Debug, Clone)]
pub struct JsonFileHook {
    path: PathBuf,
}

impl JsonFileHook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the last snapshot written.
    pub fn load(&self) -> DelveResult<Snapshot> {
        Snapshot::from_json(&std::fs::read_to_string(&self.path)?)
    }
}

impl PersistenceHook for JsonFileHook {
    fn store(&mut self, snapshot: &Snapshot) -> DelveResult<()> {
        std::fs::write(&self.path, snapshot.to_json()?)?;
        log::debug!("Snapshot written to {}", self.path.display());
        Ok(())
    }
}

/// What a move did.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Moved onto a cleared tile
    Moved,
    /// Entering the tile started a fight
    EncounterStarted { boss_fight: bool },
}

/// Central run state.
pub struct GameState {
    pub player: PlayerCharacter,
    pub dungeon: Option<DungeonInstance>,
    pub depth: u32,
    pub tiles: Vec<Tile>,
    pub tile_size: i32,
    pub bounding_box: Option<BoundingBox>,
    pub current_position: Position,
    previous_position: Option<Position>,
    pub encounter: Option<Encounter>,
    pub game_clock: u64,
    persistence: Option<Box<dyn PersistenceHook>>,
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("player", &self.player.stats.name)
            .field("dungeon", &self.dungeon.as_ref().map(|d| &d.name))
            .field("depth", &self.depth)
            .field("tiles", &self.tiles.len())
            .field("current_position", &self.current_position)
            .field("in_encounter", &self.encounter.is_some())
            .field("game_clock", &self.game_clock)
            .finish()
    }
}

impl GameState {
    /// Creates a run outside any dungeon.
    pub fn new(player: PlayerCharacter) -> Self {
        Self {
            player,
            dungeon: None,
            depth: 0,
            tiles: Vec::new(),
            tile_size: crate::config::DEFAULT_TILE_SIZE,
            bounding_box: None,
            current_position: Position::origin(),
            previous_position: None,
            encounter: None,
            game_clock: 0,
            persistence: None,
        }
    }

    /// Installs a hook that receives every snapshot.
    pub fn with_persistence(mut self, hook: Box<dyn PersistenceHook>) -> Self {
        self.persistence = Some(hook);
        self
    }

    pub fn in_combat(&self) -> bool {
        self.encounter.is_some()
    }

    pub fn is_boss_fight(&self) -> bool {
        self.encounter.as_ref().map_or(false, |e| e.boss_fight)
    }

    /// The tile under the player, if inside a dungeon.
    pub fn current_tile(&self) -> Option<&Tile> {
        self.tiles
            .iter()
            .find(|t| t.position() == self.current_position)
    }

    /// Enters `depth` of `dungeon`, generating a fresh tile graph.
    pub fn enter_level<R: Rng + ?Sized>(
        &mut self,
        dungeon: DungeonInstance,
        depth: u32,
        rng: &mut R,
    ) -> DelveResult<()> {
        if let Some(mut encounter) = self.encounter.take() {
            encounter.abandon();
        }

        let level = dungeon.level(depth)?;
        if !level.is_open() {
            return Err(DelveError::InvalidAction(format!(
                "{} level {} is locked",
                dungeon.name, depth
            )));
        }

        let config = level.generation_config(rng.gen());
        let tiles = generate_tiles(&config, &mut create_rng(&config))?;
        let start = tiles
            .first()
            .map(Tile::position)
            .ok_or_else(|| DelveError::GenerationFailed("no start tile".to_string()))?;

        log::info!(
            "Entered {} level {} ({} tiles)",
            dungeon.name,
            depth,
            tiles.len()
        );
        self.bounding_box = bounding_box(&tiles, config.tile_size);
        self.tile_size = config.tile_size;
        self.tiles = tiles;
        self.current_position = start;
        self.previous_position = None;
        self.depth = depth;
        self.dungeon = Some(dungeon);

        self.persist()
    }

    /// Leaves the dungeon, abandoning any fight in progress.
    pub fn leave_dungeon(&mut self) -> DelveResult<()> {
        if let Some(mut encounter) = self.encounter.take() {
            encounter.abandon();
        }
        self.player.minions.retain(|m| m.pet);
        self.tiles.clear();
        self.bounding_box = None;
        self.previous_position = None;
        self.persist()
    }

    /// Steps to a cardinally adjacent tile.
    ///
    /// Entering an uncleared tile starts an encounter, a boss fight on the
    /// boss room; the encounter's opening line goes to `log`.
    pub fn move_to<R: Rng + ?Sized>(
        &mut self,
        target: Position,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<MoveOutcome> {
        if self.in_combat() {
            return Err(DelveError::InvalidAction(
                "cannot move during an encounter".to_string(),
            ));
        }
        if !self.current_position.is_cardinal_step(target, self.tile_size) {
            return Err(DelveError::InvalidAction(format!(
                "({}, {}) is not adjacent to ({}, {})",
                target.x, target.y, self.current_position.x, self.current_position.y
            )));
        }
        let tile = *self
            .tiles
            .iter()
            .find(|t| t.position() == target)
            .ok_or_else(|| {
                DelveError::InvalidAction(format!("no room at ({}, {})", target.x, target.y))
            })?;

        self.previous_position = Some(self.current_position);
        self.current_position = target;
        if tile.cleared_room {
            return Ok(MoveOutcome::Moved);
        }

        let dungeon = self
            .dungeon
            .as_ref()
            .ok_or_else(|| DelveError::InvalidState("not inside a dungeon".to_string()))?;
        let level = dungeon.level(self.depth)?;
        let boss_fight = tile.is_boss_room && !level.boss_defeated;
        let enemy = spawn_for_level(defs, level, boss_fight, rng)?;

        let encounter = Encounter::new(enemy, boss_fight);
        log.append(encounter.intro_text());
        log::info!(
            "Encounter started at ({}, {}) against {}",
            target.x,
            target.y,
            encounter.enemy.stats.name
        );
        self.encounter = Some(encounter);
        Ok(MoveOutcome::EncounterStarted { boss_fight })
    }

    fn active_encounter(&mut self) -> DelveResult<&mut Encounter> {
        self.encounter
            .as_mut()
            .ok_or_else(|| DelveError::InvalidAction("no active encounter".to_string()))
    }

    /// Attacks the current enemy.
    pub fn player_attack<R: Rng + ?Sized>(
        &mut self,
        attack: &str,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<Resolution> {
        let encounter = self
            .encounter
            .as_mut()
            .ok_or_else(|| DelveError::InvalidAction("no active encounter".to_string()))?;
        let resolution = encounter.player_attack(&mut self.player, attack, defs, rng, log)?;
        self.resolve_encounter()?;
        Ok(resolution)
    }

    /// Casts a spell at the current enemy.
    pub fn player_cast<R: Rng + ?Sized>(
        &mut self,
        spell: &str,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<Resolution> {
        let encounter = self
            .encounter
            .as_mut()
            .ok_or_else(|| DelveError::InvalidAction("no active encounter".to_string()))?;
        let resolution = encounter.player_cast(&mut self.player, spell, defs, rng, log)?;
        self.resolve_encounter()?;
        Ok(resolution)
    }

    pub fn player_pass<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<Resolution> {
        let encounter = self
            .encounter
            .as_mut()
            .ok_or_else(|| DelveError::InvalidAction("no active encounter".to_string()))?;
        let resolution = encounter.player_pass(&mut self.player, rng, log)?;
        self.resolve_encounter()?;
        Ok(resolution)
    }

    /// Tries to flee; success puts the player back on the tile they came from.
    pub fn flee<R: Rng + ?Sized>(&mut self, rng: &mut R, log: &mut dyn BattleLog) -> DelveResult<bool> {
        let encounter = self
            .encounter
            .as_mut()
            .ok_or_else(|| DelveError::InvalidAction("no active encounter".to_string()))?;
        let fled = encounter.flee(&mut self.player, rng, log)?;
        self.resolve_encounter()?;
        Ok(fled)
    }

    /// Runs the next pending step of the active round.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        defs: &Definitions,
        rng: &mut R,
        log: &mut dyn BattleLog,
    ) -> DelveResult<Option<StepReport>> {
        let encounter = match self.encounter.as_mut() {
            Some(encounter) => encounter,
            None => return Ok(None),
        };
        let report = encounter.advance(&mut self.player, defs, rng, log)?;
        self.resolve_encounter()?;
        Ok(report)
    }

    /// Cancels the active encounter and its pending steps.
    pub fn abandon_encounter(&mut self) -> DelveResult<Option<EncounterEnd>> {
        self.active_encounter()?.abandon();
        self.resolve_encounter()
    }

    /// Folds a finished encounter back into the run.
    ///
    /// Does nothing while the encounter is still going.
    pub fn resolve_encounter(&mut self) -> DelveResult<Option<EncounterEnd>> {
        let outcome = match self.encounter.as_ref().and_then(Encounter::outcome) {
            Some(outcome) => outcome,
            None => return Ok(None),
        };
        let boss_fight = self.is_boss_fight();

        match outcome {
            EncounterEnd::EnemyDefeated => {
                let position = self.current_position;
                if let Some(tile) = self.tiles.iter_mut().find(|t| t.position() == position) {
                    tile.cleared_room = true;
                }
                if boss_fight {
                    if let Some(dungeon) = self.dungeon.as_mut() {
                        dungeon.set_boss_defeated(self.depth)?;
                    }
                }
                self.game_clock += 1;
            }
            EncounterEnd::Fled | EncounterEnd::Abandoned => {
                if let Some(previous) = self.previous_position.take() {
                    self.current_position = previous;
                }
            }
            EncounterEnd::PlayerDefeated => {
                log::info!("{} has fallen", self.player.stats.name);
            }
        }

        self.encounter = None;
        self.persist()?;
        Ok(Some(outcome))
    }

    /// Captures the run for persistence.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            player: self.player.clone(),
            enemy: self.encounter.as_ref().map(|e| e.enemy.clone()),
            boss_fight: self.is_boss_fight(),
            dungeon: self.dungeon.clone(),
            depth: self.depth,
            tiles: self.tiles.clone(),
            tile_size: self.tile_size,
            current_position: self.current_position,
            bounding_box: self.bounding_box,
            game_clock: self.game_clock,
        }
    }

    /// Rebuilds a run from a snapshot. An encounter in progress restarts at
    /// the beginning of a round.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            player: snapshot.player,
            encounter: snapshot
                .enemy
                .map(|enemy| Encounter::new(enemy, snapshot.boss_fight)),
            dungeon: snapshot.dungeon,
            depth: snapshot.depth,
            tiles: snapshot.tiles,
            tile_size: snapshot.tile_size,
            bounding_box: snapshot.bounding_box,
            current_position: snapshot.current_position,
            previous_position: None,
            game_clock: snapshot.game_clock,
            persistence: None,
        }
    }

    /// Serializes the run state to JSON.
    pub fn save_to_json(&self) -> DelveResult<String> {
        self.snapshot().to_json()
    }

    /// Loads run state from JSON.
    pub fn load_from_json(json: &str) -> DelveResult<Self> {
        Snapshot::from_json(json).map(Self::from_snapshot)
    }

    fn persist(&mut self) -> DelveResult<()> {
        if self.persistence.is_none() {
            return Ok(());
        }
        let snapshot = self.snapshot();
        match self.persistence.as_mut() {
            Some(hook) => hook.store(&snapshot),
            None => Ok(()),
        }
    }
}
