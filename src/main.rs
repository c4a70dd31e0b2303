//! The Little Soldier - Entry Point
//!
//! Plays the campaign in the terminal. The game is saved after every command
//! to a directory of JSON files; a dead soldier's save is deleted.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use little_soldier::battle::{
    advance, auto_command, available_choices, BattleCommand, BattlePhase, BattleState, ChoiceId, GorgeTarget,
};
use little_soldier::campaign::{
    conclude_battle, create_new_game, end_interlude, get_current_interlude, leave_camp, spend_glory_on_stat,
    start_battle, CampActivity, CampState, CampaignPhase, GameState, Stat,
};
use little_soldier::combat::{available_actions, BodyPart, MeleeAction, PlayerMeleeInput, Stance};
use little_soldier::content::ContentRegistry;
use little_soldier::core::config::EngineTuning;
use little_soldier::core::error::Result;
use little_soldier::persistence::{record_glory, FileStorage, SaveService, Storage};
use little_soldier::stats::{RngRolls, RollSource};

#[derive(Parser, Debug)]
#[command(name = "little-soldier")]
#[command(about = "A line infantryman's war, from Rivoli to La Favorita")]
struct Args {
    /// Directory holding saves, Glory and profiles
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,

    /// Save profile, 1-3
    #[arg(long)]
    profile: Option<u8>,

    /// Random seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// TOML file overriding the default tuning
    #[arg(long)]
    tuning: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("little_soldier=info")),
        )
        .init();

    let args = Args::parse();
    let tuning = match &args.tuning {
        Some(path) => EngineTuning::load(path)?,
        None => EngineTuning::default(),
    };
    let registry = ContentRegistry::standard();
    for message in registry.validate() {
        tracing::warn!(%message, "Content problem");
    }

    let storage = FileStorage::new(&args.save_dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let mut service = SaveService::new(storage);
    service.set_profile(args.profile);
    let mut rolls = RngRolls::seeded(args.seed.unwrap_or_else(rand::random));

    println!("\n=== THE LITTLE SOLDIER ===");
    println!("Banked Glory: {}", service.load_glory());

    let mut game = match service.load_game() {
        Some(game) => {
            println!("Welcome back, {}.", game.player.name);
            game
        }
        None => new_game(&registry)?,
    };

    loop {
        show_status(&game, &registry, &tuning, service.load_glory());
        if game.campaign.phase == CampaignPhase::Complete {
            println!("\nThe campaign in Italy is over. You survived it.");
            service.save_game(&game);
            break;
        }

        let input = prompt()?;
        if input == "quit" || input == "q" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let outcome = handle_command(&mut game, &input, &registry, &tuning, &mut rolls, &mut service);
        if let Err(e) = outcome {
            println!("{}", e);
        }

        service.save_game(&game);
        if !game.player.alive {
            println!("\nYou are dead. Your Glory is all that remains of you.");
            break;
        }
    }

    println!("Glory banked: {}", service.load_glory());
    Ok(())
}

fn prompt() -> Result<String> {
    print!("> ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn new_game(registry: &ContentRegistry) -> Result<GameState> {
    println!("Your name?");
    let name = prompt()?;
    println!("Distribute 20 points, at most 10 per stat (e.g. \"valor 10 musketry 10\"), or press enter:");
    let line = prompt()?;
    let words: Vec<&str> = line.split_whitespace().collect();
    let allocation: Vec<(Stat, u32)> = words
        .chunks(2)
        .filter_map(|pair| match pair {
            [stat, points] => Some((Stat::parse(stat)?, points.parse().ok()?)),
            _ => None,
        })
        .collect();

    let config = registry.campaign("italy")?;
    let name = if name.is_empty() { "Jean" } else { name.as_str() };
    Ok(create_new_game(name, &allocation, config)?)
}

fn handle_command<S: Storage>(
    game: &mut GameState,
    input: &str,
    registry: &ContentRegistry,
    tuning: &EngineTuning,
    rolls: &mut dyn RollSource,
    service: &mut SaveService<S>,
) -> Result<()> {
    let words: Vec<&str> = input.split_whitespace().collect();

    match game.campaign.phase {
        CampaignPhase::Prologue => match words.as_slice() {
            ["start"] | ["s"] => start_battle(game, registry, tuning)?,
            _ => println!("Commands: start"),
        },
        CampaignPhase::Battle => {
            battle_command(game, &words, registry, tuning, rolls)?;
            let over = game.battle_state.as_ref().is_some_and(|b| b.battle_over);
            if over {
                let summary = conclude_battle(game, registry, tuning)?;
                let total = service.add_glory(summary.glory_earned as i64);
                if let Some(profile) = service.profile() {
                    let recorded = record_glory(service.storage_mut(), profile, &game.player.name, summary.glory_earned);
                    if recorded.is_none() {
                        tracing::warn!(profile, glory = summary.glory_earned, "Profile record not updated");
                        println!("(Could not update the profile record.)");
                    }
                }
                println!("\n{:?}. Glory earned: {} (banked {})", summary.outcome, summary.glory_earned, total);
                for id in &summary.npc_deaths {
                    println!("  {} did not come back.", id);
                }
                for id in &summary.replacements {
                    println!("  {} joins the company.", id);
                }
            }
        }
        CampaignPhase::PostBattleCamp | CampaignPhase::PreBattleCamp => match words.as_slice() {
            ["leave"] => {
                let phase = leave_camp(game, registry, tuning)?;
                println!("You break camp. ({:?})", phase);
            }
            ["choose", choice] => {
                for line in game.camp_event_choice(choice, rolls)? {
                    println!("{}", line);
                }
            }
            ["glory", stat] => match Stat::parse(stat) {
                Some(stat) => {
                    let cost = spend_glory_on_stat(&mut game.player, stat, service.load_glory())?;
                    service.add_glory(-(cost as i64));
                    println!("{} is now {}.", stat, game.player.stats.get(stat));
                }
                None => println!("Unknown stat"),
            },
            _ => match parse_activity(&words) {
                Some(activity) => {
                    let report = game.camp_activity(&activity, tuning, rolls)?;
                    for line in report.narratives {
                        println!("{}", line);
                    }
                }
                None => println!(
                    "Commands: drill <musketry|elan|endurance>, socialize <npc>, letter, maintain, bathe, pray, forage, choose <id>, glory <stat>, leave"
                ),
            },
        },
        CampaignPhase::Interlude => match words.as_slice() {
            ["march"] | ["m"] => {
                end_interlude(game, registry, tuning)?;
            }
            _ => println!("Commands: march"),
        },
        CampaignPhase::Complete => {}
    }
    Ok(())
}

fn battle_command(
    game: &mut GameState,
    words: &[&str],
    registry: &ContentRegistry,
    tuning: &EngineTuning,
    rolls: &mut dyn RollSource,
) -> Result<()> {
    let Some(state) = game.battle_state.as_mut() else {
        return Ok(());
    };
    let config = registry.battle(&state.battle_id)?;

    let command = match words {
        ["auto"] => auto_command(state, config, tuning),
        ["flee"] => Some(BattleCommand::Flee),
        ["fire", target] => GorgeTarget::parse(target).map(BattleCommand::GorgeFire),
        ["c", n] | ["choose", n] => {
            let choices = available_choices(state, config)?;
            n.parse::<usize>()
                .ok()
                .and_then(|n| choices.get(n.wrapping_sub(1)))
                .map(|c| BattleCommand::Choose(c.id.clone()))
                .or_else(|| Some(BattleCommand::Choose(ChoiceId::from(*n))))
        }
        [] | ["a"] | ["advance"] => Some(BattleCommand::Advance),
        _ if state.phase == BattlePhase::Melee => parse_melee(words).map(BattleCommand::Melee),
        _ => None,
    };

    let Some(command) = command else {
        println!("Commands: advance, c <n>, fire <column|officer|wagon|mercy>, <stance> <action> [part] [target], flee, auto");
        return Ok(());
    };

    let log_start = state.log.len();
    let result = advance(state, config, tuning, rolls, command);
    for entry in &state.log[log_start..] {
        println!("{}", entry.text);
    }
    result?;
    Ok(())
}

fn parse_melee(words: &[&str]) -> Option<PlayerMeleeInput> {
    let (stance, action, rest) = match words {
        [stance, action, rest @ ..] => (Stance::parse(stance)?, MeleeAction::parse(action)?, rest),
        [action] => (Stance::Balanced, MeleeAction::parse(action)?, &[][..]),
        _ => return None,
    };
    let mut input = PlayerMeleeInput::new(stance, action);
    for word in rest {
        if let Some(part) = BodyPart::parse(word) {
            input = input.at(part);
        } else if let Ok(target) = word.parse::<usize>() {
            input = input.targeting(target.saturating_sub(1));
        }
    }
    if input.action.is_attack() && input.body_part.is_none() {
        input = input.at(BodyPart::Torso);
    }
    Some(input)
}

fn parse_activity(words: &[&str]) -> Option<CampActivity> {
    let activity = match words {
        ["drill", stat] => CampActivity::Drill(Stat::parse(stat)?),
        ["socialize", npc] => CampActivity::Socialize((*npc).into()),
        ["letter"] => CampActivity::WriteLetter,
        ["maintain"] => CampActivity::MaintainEquipment,
        ["bathe"] => CampActivity::Bathe,
        ["pray"] => CampActivity::Pray,
        ["forage"] => CampActivity::Forage,
        _ => return None,
    };
    Some(activity)
}

fn show_status(game: &GameState, registry: &ContentRegistry, tuning: &EngineTuning, glory: u32) {
    println!();
    match game.campaign.phase {
        CampaignPhase::Prologue => {
            println!("January 1797. The Army of Italy waits on the plateau above Rivoli.");
            println!("Type 'start' to take your place in the line.");
        }
        CampaignPhase::Battle => {
            if let Some(state) = &game.battle_state {
                show_battle(state, registry, tuning);
            }
        }
        CampaignPhase::PostBattleCamp | CampaignPhase::PreBattleCamp => {
            if let Some(camp) = &game.camp_state {
                show_camp(game, camp, glory);
            }
        }
        CampaignPhase::Interlude => {
            if let Ok(config) = registry.campaign(&game.campaign.campaign_id) {
                if let Some(interlude) = get_current_interlude(&game.campaign, config) {
                    println!("--- {} ---", interlude.title);
                    for line in &interlude.narrative {
                        println!("{}", line);
                    }
                }
            }
            println!("Type 'march' to go on.");
        }
        CampaignPhase::Complete => {}
    }
}

fn show_battle(state: &BattleState, registry: &ContentRegistry, tuning: &EngineTuning) {
    let player = &state.player;
    println!(
        "[{:?}] Health {:.0}/{:.0} ({:?})  Morale {:.0} ({:?})  Stamina {:.0}  Grace {}",
        state.phase,
        player.health,
        player.max_health,
        player.health_state(),
        player.morale,
        player.morale_threshold(),
        player.stamina,
        player.grace
    );
    println!(
        "Line integrity {:.0}  Enemy at {:.0} paces, strength {:.0}",
        state.line.line_integrity, state.enemy.range, state.enemy.strength
    );

    let Ok(config) = registry.battle(&state.battle_id) else {
        return;
    };
    match state.phase {
        BattlePhase::StoryBeat => {
            if let Ok(choices) = available_choices(state, config) {
                for (i, choice) in choices.iter().enumerate() {
                    let mark = if choice.available { "" } else { " (unavailable)" };
                    println!("  {}. {} - {}{}", i + 1, choice.label, choice.description, mark);
                }
            }
        }
        BattlePhase::Melee => {
            if let Some(melee) = &state.melee_state {
                for &i in &melee.active_enemies {
                    if let Some(enemy) = melee.opponents.get(i).filter(|e| e.alive) {
                        println!("  {}. {} ({:.0} health)", i + 1, enemy.name, enemy.health);
                    }
                }
            }
            let actions: Vec<&str> = available_actions(state, &tuning.melee).iter().map(|a| a.label()).collect();
            println!("Actions: {}", actions.join(", "));
        }
        _ => {}
    }
}

fn show_camp(game: &GameState, camp: &CampState, glory: u32) {
    println!(
        "Camp: {} actions left  Morale {}  Supplies {}  Glory {}",
        camp.actions_remaining, camp.conditions.morale, camp.conditions.supplies, glory
    );
    for npc in game.npcs.iter().filter(|n| n.alive) {
        println!("  {} {} ({}) relationship {}", npc.rank, npc.name, npc.id, npc.relationship);
    }
    if let Some(event) = camp.pending_event {
        println!("--- {} ---", event.title());
        for choice in event.choices() {
            println!("  choose {} - {}", choice.id, choice.label);
        }
    }
}
