//! Headless Battle Runner
//!
//! Auto-plays one battle with the stock decision rules and prints a summary,
//! for balancing the tuning tables.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use little_soldier::battle::{advance, auto_command, create_battle_state, BattleOutcome};
use little_soldier::campaign::{create_character, Stat};
use little_soldier::content::ContentRegistry;
use little_soldier::core::config::EngineTuning;
use little_soldier::stats::RngRolls;

/// Headless Battle Runner - auto-play a battle and report the result
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Auto-play a battle and output a summary for balancing")]
struct Args {
    /// Battle id (rivoli, favorita)
    #[arg(long, default_value = "rivoli")]
    battle: String,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every log line as the battle runs
    #[arg(long, short = 'v')]
    verbose: bool,

    /// TOML file overriding the default tuning
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Commands before the run is abandoned
    #[arg(long, default_value_t = 500)]
    max_steps: u32,
}

/// JSON output structure
#[derive(Serialize)]
struct BattleResult {
    battle: String,
    outcome: BattleOutcome,
    steps: u32,
    kills: u32,
    player_alive: bool,
    player_health: f64,
    player_morale: f64,
    grace_left: u32,
    line_integrity: f64,
    enemy_strength: f64,
    npc_deaths: Vec<String>,
    seed: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("little_soldier=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rolls = RngRolls::seeded(seed);

    let tuning = match &args.tuning {
        Some(path) => EngineTuning::load(path).unwrap_or_else(|e| {
            eprintln!("Warning: {}", e);
            eprintln!("Using default tuning");
            EngineTuning::default()
        }),
        None => EngineTuning::default(),
    };

    let registry = ContentRegistry::standard();
    for message in registry.validate() {
        eprintln!("Content problem: {}", message);
    }
    let config = match registry.battle(&args.battle) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}. Known battles: {}", e, registry.battle_ids().join(", "));
            std::process::exit(2);
        }
    };
    let npcs = registry
        .campaign("italy")
        .map(|c| c.roster.clone())
        .unwrap_or_default();

    let character = match create_character(
        "Auto",
        &[(Stat::Valor, 5), (Stat::Musketry, 5), (Stat::Elan, 5), (Stat::Constitution, 5)],
    ) {
        Ok(character) => character,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let mut state = create_battle_state(config, &character, &npcs, &tuning);
    if args.verbose {
        eprintln!("=== {} ===", config.name);
        for entry in &state.log {
            eprintln!("  [{}] {:?}: {}", entry.turn, entry.kind, entry.text);
        }
    }

    let mut steps = 0;
    while steps < args.max_steps {
        let Some(command) = auto_command(&state, config, &tuning) else {
            break;
        };
        if args.verbose {
            eprintln!("> {:?}", command);
        }
        match advance(&mut state, config, &tuning, &mut rolls, command) {
            Ok(report) => {
                if args.verbose {
                    for line in &report.narratives {
                        eprintln!("  {}", line);
                    }
                }
            }
            Err(e) => {
                eprintln!("Command rejected: {}", e);
                break;
            }
        }
        steps += 1;
    }

    let result = BattleResult {
        battle: state.battle_id.clone(),
        outcome: state.outcome,
        steps,
        kills: state.kills,
        player_alive: state.player.alive,
        player_health: state.player.health,
        player_morale: state.player.morale,
        grace_left: state.player.grace,
        line_integrity: state.line.line_integrity,
        enemy_strength: state.enemy.strength,
        npc_deaths: state
            .line
            .members()
            .filter(|m| !m.alive)
            .map(|m| m.npc_id.to_string())
            .collect(),
        seed,
    };

    match args.format.as_str() {
        "text" => {
            println!("Battle Result");
            println!("=============");
            println!("Battle: {}", result.battle);
            println!("Outcome: {:?}", result.outcome);
            println!("Steps: {}", result.steps);
            println!("Kills: {}", result.kills);
            println!(
                "Player: {} (health {:.0}, morale {:.0}, grace {})",
                if result.player_alive { "alive" } else { "dead" },
                result.player_health,
                result.player_morale,
                result.grace_left
            );
            println!("Line integrity: {:.0}", result.line_integrity);
            println!("Enemy strength: {:.0}", result.enemy_strength);
            if !result.npc_deaths.is_empty() {
                println!("Fallen: {}", result.npc_deaths.join(", "));
            }
            println!("Seed: {}", result.seed);
        }
        format => {
            if format != "json" {
                eprintln!("Unknown format '{}', defaulting to json", format);
            }
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to serialize result: {}", e),
            }
        }
    }
}
