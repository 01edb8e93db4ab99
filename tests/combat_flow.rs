//! Full encounters driven through the public API, with content loaded from
//! JSON the same way a front end would load it.

use delve::{
    Definitions, DelveResult, Encounter, EncounterEnd, Enemy, Phase, PlayerCharacter, Step,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const CONTENT: &str = r#"{
  "enemies": [
    {
      "name": "rat",
      "beingType": "beast",
      "health": 12,
      "attackPower": 2,
      "attacks": ["nibble"],
      "goldDropRange": [3, 3],
      "drops": [{ "item": "rat tail", "chance": 1.0 }]
    },
    {
      "name": "training dummy",
      "beingType": "construct",
      "health": 500,
      "attackPower": 0,
      "attacks": []
    }
  ],
  "attacks": [
    { "name": "haymaker", "hitChance": 1.0, "energyCost": 0, "damageMult": 3.0 },
    { "name": "poke", "hitChance": 1.0, "energyCost": 0, "damageMult": 0.1 },
    { "name": "nibble", "hitChance": 1.0, "energyCost": 0, "damageMult": 1.0 }
  ],
  "spells": [
    { "name": "call hound", "element": "summoning", "manaCost": 10, "summons": ["hound"] }
  ],
  "summons": [
    { "name": "hound", "health": 20, "attackPower": 1, "attacks": ["poke"], "turns": 3 }
  ]
}"#;

fn setup() -> DelveResult<(Definitions, PlayerCharacter)> {
    let defs = Definitions::from_json(CONTENT)?;
    defs.validate_references()?;
    let mut player = PlayerCharacter::new("Tester", 60.0, 5.0);
    player.attacks = vec!["haymaker".to_string(), "poke".to_string()];
    player.spells = vec!["call hound".to_string()];
    Ok((defs, player))
}

fn spawn(defs: &Definitions, name: &str, rng: &mut StdRng) -> DelveResult<Enemy> {
    delve::spawn_enemy(defs, name, rng)
}

#[test]
fn test_round_runs_in_queue_order() -> DelveResult<()> {
    let (defs, mut player) = setup()?;
    let mut rng = StdRng::seed_from_u64(1);
    let mut encounter = Encounter::new(spawn(&defs, "rat", &mut rng)?, false);
    let mut log: Vec<String> = Vec::new();

    encounter.player_attack(&mut player, "poke", &defs, &mut rng, &mut log)?;
    assert_eq!(
        encounter.pending().collect::<Vec<_>>(),
        vec![Step::PlayerMinions, Step::Enemy, Step::EnemyMinions]
    );

    let mut executed = Vec::new();
    while let Some(report) = encounter.advance(&mut player, &defs, &mut rng, &mut log)? {
        executed.push(report.step);
        assert!(report.outcome.is_none());
    }
    assert_eq!(
        executed,
        vec![Step::PlayerMinions, Step::Enemy, Step::EnemyMinions]
    );
    assert_eq!(encounter.phase(), Phase::Idle);
    assert_eq!(encounter.round(), 2);

    assert!(log[0].starts_with("You used Poke on the Rat."));
    assert!(log.iter().any(|line| line.starts_with("The Rat used Nibble on you.")));
    Ok(())
}

#[test]
fn test_cannot_act_twice_in_one_round() -> DelveResult<()> {
    let (defs, mut player) = setup()?;
    let mut rng = StdRng::seed_from_u64(2);
    let mut encounter = Encounter::new(spawn(&defs, "rat", &mut rng)?, false);
    let mut log: Vec<String> = Vec::new();

    encounter.player_attack(&mut player, "poke", &defs, &mut rng, &mut log)?;
    assert!(encounter
        .player_attack(&mut player, "poke", &defs, &mut rng, &mut log)
        .is_err());

    encounter.finish_round(&mut player, &defs, &mut rng, &mut log)?;
    encounter.player_attack(&mut player, "poke", &defs, &mut rng, &mut log)?;
    Ok(())
}

#[test]
fn test_killing_blow_ends_fight_and_pays_out() -> DelveResult<()> {
    let (defs, mut player) = setup()?;
    let mut rng = StdRng::seed_from_u64(3);
    let mut encounter = Encounter::new(spawn(&defs, "rat", &mut rng)?, false);
    let mut log: Vec<String> = Vec::new();

    encounter.player_attack(&mut player, "haymaker", &defs, &mut rng, &mut log)?;

    assert_eq!(encounter.outcome(), Some(EncounterEnd::EnemyDefeated));
    assert_eq!(encounter.pending().count(), 0);
    assert!(log.iter().any(|line| line == "You defeated the Rat"));

    let loot = encounter.loot().cloned().unwrap_or_default();
    assert_eq!(loot.gold, 3);
    assert_eq!(player.gold, 3);
    assert!(player.inventory.contains(&"rat tail".to_string()));
    assert!(encounter
        .advance(&mut player, &defs, &mut rng, &mut log)?
        .is_none());
    Ok(())
}

#[test]
fn test_summoned_minion_fights_for_the_player() -> DelveResult<()> {
    let (defs, mut player) = setup()?;
    let mut rng = StdRng::seed_from_u64(4);
    let mut encounter = Encounter::new(spawn(&defs, "training dummy", &mut rng)?, false);
    let mut log: Vec<String> = Vec::new();

    encounter.player_cast(&mut player, "call hound", &defs, &mut rng, &mut log)?;
    assert_eq!(player.minions.len(), 1);

    encounter.finish_round(&mut player, &defs, &mut rng, &mut log)?;
    assert!(log.iter().any(|line| line.starts_with("(minion) ")));
    // The dummy passes rather than attacking
    assert_eq!(player.stats.health, player.stats.max_health);
    Ok(())
}

#[test]
fn test_training_dummy_always_lets_you_go() -> DelveResult<()> {
    let (defs, mut player) = setup()?;
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut encounter = Encounter::new(spawn(&defs, "training dummy", &mut rng)?, false);
        let mut log: Vec<String> = Vec::new();

        assert!(encounter.flee(&mut player, &mut rng, &mut log)?);
        assert_eq!(encounter.outcome(), Some(EncounterEnd::Fled));
        assert_eq!(log, vec!["You fled!".to_string()]);
    }
    Ok(())
}

#[test]
fn test_fight_eventually_resolves() -> DelveResult<()> {
    let (defs, mut player) = setup()?;
    let mut rng = StdRng::seed_from_u64(5);
    let mut encounter = Encounter::new(spawn(&defs, "rat", &mut rng)?, false);
    let mut log: Vec<String> = Vec::new();

    for _ in 0..100 {
        if encounter.is_over() {
            break;
        }
        encounter.player_attack(&mut player, "poke", &defs, &mut rng, &mut log)?;
        encounter.finish_round(&mut player, &defs, &mut rng, &mut log)?;
    }

    assert_eq!(encounter.outcome(), Some(EncounterEnd::EnemyDefeated));
    Ok(())
}
