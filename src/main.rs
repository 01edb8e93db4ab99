//! # Delve Entry Point
//!
//! Plays a level of one of the bundled dungeons without a front end: the
//! player walks the tile graph room by room and auto-fights every
//! encounter, with the battle log going to the logger.

use clap::Parser;
use delve::{
    DelveError, DelveResult, Definitions, EncounterEnd, GameState, JsonFileHook,
    LogForwarder, MoveOutcome, PlayerCharacter, Position, Spell, Tile,
};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

/// Command line arguments for the delve demo.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Auto-plays a dungeon level with the turn-based combat core")]
#[command(version)]
struct Args {
    /// Random seed for tiles, spawns and dice
    #[arg(short, long)]
    seed: Option<u64>,

    /// Dungeon to enter
    #[arg(long, default_value = "crypt")]
    dungeon: String,

    /// Level of the dungeon to enter
    #[arg(long, default_value_t = 1)]
    depth: u32,

    /// Pause between combat steps the way an interactive front end would
    #[arg(long)]
    paced: bool,

    /// Write a JSON snapshot here whenever the run changes
    #[arg(long)]
    save: Option<PathBuf>,

    /// Give up on a fight after this many rounds
    #[arg(long, default_value_t = 100)]
    max_rounds: u32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> DelveResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("Starting delve v{}", delve::VERSION);

    let defs = Definitions::sample()?;
    defs.validate_references()?;

    let seed = args.seed.unwrap_or(12345);
    let mut rng = StdRng::seed_from_u64(seed);
    info!("Using seed {}", seed);

    let mut player = PlayerCharacter::new("Adventurer", 120.0, 8.0);
    player.attacks = vec!["stab".to_string(), "shield bash".to_string()];
    player.spells = vec!["firebolt".to_string(), "summon skeleton".to_string()];

    let mut game = GameState::new(player);
    if let Some(path) = &args.save {
        info!("Saving snapshots to {}", path.display());
        game = game.with_persistence(Box::new(JsonFileHook::new(path.clone())));
    }

    let dungeon = defs.dungeon(&args.dungeon)?;
    game.enter_level(dungeon, args.depth, &mut rng)?;

    run_level(&mut game, &defs, &mut rng, &args).await?;

    info!(
        "Run over after {} victories: {} gold, {} item(s)",
        game.game_clock,
        game.player.gold,
        game.player.inventory.len()
    );
    Ok(())
}

/// Initializes the logger at the requested level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let level = match log_level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .format_target(false)
            .init();
    }
}

/// Clears rooms until the level is done, the player falls or retreats.
async fn run_level(
    game: &mut GameState,
    defs: &Definitions,
    rng: &mut StdRng,
    args: &Args,
) -> DelveResult<()> {
    let mut log = LogForwarder;

    while let Some(path) =
        path_to_nearest_uncleared(&game.tiles, game.current_position, game.tile_size)
    {
        for step in path {
            let boss_fight = match game.move_to(step, defs, rng, &mut log)? {
                MoveOutcome::Moved => continue,
                MoveOutcome::EncounterStarted { boss_fight } => boss_fight,
            };
            if boss_fight {
                info!("Entered the boss room");
            }
            match fight(game, defs, rng, args, &mut log).await? {
                EncounterEnd::EnemyDefeated => break,
                EncounterEnd::PlayerDefeated => return Ok(()),
                EncounterEnd::Fled | EncounterEnd::Abandoned => {
                    info!("{} retreats from the dungeon", game.player.stats.name);
                    return game.leave_dungeon();
                }
            }
        }
    }

    info!("Every room on level {} is cleared", game.depth);
    Ok(())
}

/// Auto-fights the active encounter to its end.
async fn fight(
    game: &mut GameState,
    defs: &Definitions,
    rng: &mut StdRng,
    args: &Args,
    log: &mut LogForwarder,
) -> DelveResult<EncounterEnd> {
    for round in 0..args.max_rounds {
        if game.player.stats.health < game.player.stats.max_health * 0.2 {
            if game.flee(rng, log)? {
                return Ok(EncounterEnd::Fled);
            }
        } else if let Some(spell) = pick_spell(game, defs) {
            game.player_cast(&spell, defs, rng, log)?;
        } else {
            let attack = game.player.attacks[round as usize % game.player.attacks.len()].clone();
            game.player_attack(&attack, defs, rng, log)?;
        }

        // The player's own step can end the fight
        if !game.in_combat() {
            return Ok(if game.player.stats.is_defeated() {
                EncounterEnd::PlayerDefeated
            } else {
                EncounterEnd::EnemyDefeated
            });
        }

        while let Some(report) = game.advance(defs, rng, log)? {
            if let Some(outcome) = report.outcome {
                return Ok(outcome);
            }
            if args.paced {
                tokio::time::sleep(report.delay).await;
            }
        }
    }

    warn!("Fight ran past {} rounds, abandoning it", args.max_rounds);
    game.abandon_encounter()?
        .ok_or_else(|| DelveError::InvalidState("encounter did not end".to_string()))
}

/// First known spell the player can cast right now.
fn pick_spell(game: &GameState, defs: &Definitions) -> Option<String> {
    game.player
        .spells
        .iter()
        .filter_map(|name| defs.spell(name).ok())
        .find(|def| Spell::new(def).can_cast(&game.player).is_ok())
        .map(|def| def.name.clone())
}

/// Shortest walk over existing tiles to the closest room still holding an
/// enemy, excluding the starting position.
fn path_to_nearest_uncleared(
    tiles: &[Tile],
    from: Position,
    tile_size: i32,
) -> Option<Vec<Position>> {
    let rooms: HashMap<Position, &Tile> = tiles.iter().map(|t| (t.position(), t)).collect();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    came_from.insert(from, from);

    while let Some(current) = queue.pop_front() {
        if current != from && rooms.get(&current).map_or(false, |t| !t.cleared_room) {
            let mut path = vec![current];
            let mut cursor = current;
            while let Some(&prev) = came_from.get(&cursor) {
                if prev == from {
                    break;
                }
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }
        for next in current.cardinal_neighbors(tile_size) {
            if rooms.contains_key(&next) && !came_from.contains_key(&next) {
                came_from.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    None
}
