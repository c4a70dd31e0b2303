//! Rivoli, 14 January 1797
//!
//! Part 1 holds the plateau and ends in the battery melee, part 2 is the
//! second line, part 3 the gorge where the Austrian column is trapped.

use ahash::AHashMap;

use crate::battle::config::{BattleConfig, BattleKind, BattlePart, FollowUp, GorgeVolley, PartKind, ScriptedVolley};
use crate::battle::state::{BattleOutcome, BattleState, EnemyQuality, EnemyState, LinePost, StoryBeatId};
use crate::battle::story::{BeatContext, BeatOutcome, BeatTransition, Choice, ChoiceId, StoryBeatDef};
use crate::combat::stance::Stance;
use crate::combat::state::AllyPersonality;
use crate::combat::waves::{AllyTemplate, MeleeEncounter, OpponentTemplate, WaveCondition, WaveEvent, WaveKind};
use crate::core::error::BattleError;
use crate::core::types::{MoraleChange, MoraleSource};
use crate::stats::rolls::{roll_valor, Difficulty};

pub const BATTLE_ID: &str = "rivoli";

pub const TAKE_COMMAND: &str = "take_command";
pub const HELP_SERGEANT: &str = "help_sergeant";
pub const STAY_IN_RANK: &str = "stay_in_rank";
pub const CHARGE_BATTERY: &str = "charge_battery";
pub const HOLD_BACK: &str = "hold_back";
pub const PRESS_ON: &str = "press_on";
pub const CATCH_BREATH: &str = "catch_breath";
pub const TAKE_THE_HEIGHTS: &str = "take_the_heights";
pub const HANG_BACK: &str = "hang_back";
pub const HELP_THE_WOUNDED: &str = "help_the_wounded";
pub const REJOIN_THE_RANKS: &str = "rejoin_the_ranks";

fn volley(range: f64, enemy_loss: f64, return_fire: f64, text: [&str; 3], follow_up: FollowUp) -> ScriptedVolley {
    ScriptedVolley {
        range,
        present: text[0].to_string(),
        fire: text[1].to_string(),
        endure: text[2].to_string(),
        enemy_loss,
        return_fire,
        artillery: false,
        follow_up,
    }
}

fn gorge_volley(range: f64, enemy_loss: f64, return_fire: f64, narrative: &str, follow_up: FollowUp) -> GorgeVolley {
    GorgeVolley {
        range,
        narrative: narrative.to_string(),
        enemy_loss,
        return_fire,
        follow_up,
    }
}

fn plateau_part() -> BattlePart {
    let mut opening = volley(
        120.0,
        6.0,
        0.30,
        [
            "White-coated battalions climb onto the plateau through the frost, drums rolling.",
            "The company fires. A grey bank of smoke rolls out over the snow.",
            "The Austrian reply crackles along their front. Somewhere behind you a gun answers.",
        ],
        FollowUp::NextVolley,
    );
    opening.artillery = true;

    BattlePart {
        number: 1,
        title: "Part I: The Plateau".into(),
        intro: "Dawn on the plateau of Rivoli. The 14th of the Line forms on the frozen ground as the Austrian columns come on.".into(),
        enemy: EnemyState::new(120.0, EnemyQuality::Line).with_artillery(),
        kind: PartKind::Scripted(vec![
            opening,
            volley(
                90.0,
                8.0,
                0.40,
                [
                    "They are close enough now to make out the brass plates on their shakos.",
                    "Your volley staggers the front rank. Men fold into the snow.",
                    "Balls thud into the line. The sergeant's voice rises above it, then stops.",
                ],
                FollowUp::StoryBeat(StoryBeatId::WoundedSergeant),
            ),
            volley(
                60.0,
                10.0,
                0.50,
                [
                    "Sixty paces. You can see their faces through the smoke.",
                    "The whole line fires as one. The white line sways.",
                    "Their return volley tears through the company like a scythe.",
                ],
                FollowUp::NextVolley,
            ),
            volley(
                35.0,
                12.0,
                0.60,
                [
                    "They are almost on you. An Austrian officer waves his sword and the drums beat the charge.",
                    "Point blank. The volley blows holes in their front rank.",
                    "They come through the smoke with the bayonet.",
                ],
                FollowUp::Melee {
                    encounter: "plateau".into(),
                    stage: 1,
                },
            ),
        ]),
    }
}

fn second_line_part() -> BattlePart {
    BattlePart {
        number: 2,
        title: "Part II: The Second Line".into(),
        intro: "Masséna's men take over the plateau. Your battalion re-forms to meet the next column pushing up from the river.".into(),
        enemy: EnemyState::new(100.0, EnemyQuality::Veteran),
        kind: PartKind::Scripted(vec![
            volley(
                100.0,
                7.0,
                0.35,
                [
                    "Fresh Austrian infantry, steadier than the last, come on in good order.",
                    "The company fires. The veterans barely flinch.",
                    "Their volley is disciplined and low.",
                ],
                FollowUp::NextVolley,
            ),
            volley(
                70.0,
                9.0,
                0.45,
                [
                    "They halt at seventy paces and dress their ranks as if on parade.",
                    "Your volley finds them at last. Gaps open in the white line.",
                    "They answer. The man behind you coughs and goes quiet.",
                ],
                FollowUp::NextVolley,
            ),
            volley(
                45.0,
                14.0,
                0.50,
                [
                    "Word runs down the line: Joubert's men have turned their flank.",
                    "One more volley and the white line breaks, streaming back towards the gorge.",
                    "A last ragged reply, and then they are running.",
                ],
                FollowUp::StoryBeat(StoryBeatId::Gorge),
            ),
        ]),
    }
}

fn gorge_part() -> BattlePart {
    BattlePart {
        number: 3,
        title: "Part III: The Gorge".into(),
        intro: "Below you, an Austrian column is packed into the gorge road with a wagon train, unable to go forward or back.".into(),
        enemy: EnemyState::new(60.0, EnemyQuality::Conscript),
        kind: PartKind::Gorge(vec![
            gorge_volley(
                60.0,
                14.0,
                0.20,
                "From the heights the whole gorge lies open beneath your muskets.",
                FollowUp::NextVolley,
            ),
            gorge_volley(
                50.0,
                16.0,
                0.15,
                "The column surges and jams. An officer on a grey horse tries to turn them.",
                FollowUp::NextVolley,
            ),
            gorge_volley(
                40.0,
                18.0,
                0.10,
                "Men claw at the rock walls. The ammunition wagon sits stranded in the press.",
                FollowUp::NextVolley,
            ),
            gorge_volley(
                30.0,
                20.0,
                0.05,
                "There is hardly any fight left in them. Still the order comes to fire.",
                FollowUp::StoryBeat(StoryBeatId::Aftermath),
            ),
        ]),
    }
}

fn austrian() -> OpponentTemplate {
    OpponentTemplate::new("Austrian fusilier", 60.0, 60.0, 35, 40)
}

fn encounters() -> AHashMap<String, MeleeEncounter> {
    let plateau = MeleeEncounter {
        key: "plateau".into(),
        intro: "The lines meet. There is no more drill, only the bayonet.".into(),
        opponents: vec![austrian(), austrian(), austrian()],
        allies: vec![
            AllyTemplate::from_post(LinePost::Left, 45, AllyPersonality::Aggressive),
            AllyTemplate::from_post(LinePost::Right, 30, AllyPersonality::Cautious),
        ],
        max_active_enemies: 2,
        max_exchanges: 10,
        waves: vec![WaveEvent {
            at_round: 4,
            kind: WaveKind::EnemiesArrive(vec![
                OpponentTemplate::new("Austrian grenadier", 80.0, 70.0, 45, 55).with_stance(Stance::Aggressive)
            ]),
            condition: None,
            narrative: "A tall grenadier in a bearskin shoulders through the press towards you.".into(),
        }],
        next_beat: StoryBeatId::Battery,
    };

    let battery = MeleeEncounter {
        key: "battery".into(),
        intro: "You reach the guns. The gunners meet you with rammers and short swords.".into(),
        opponents: vec![
            OpponentTemplate::new("Austrian gunner", 45.0, 50.0, 25, 45),
            OpponentTemplate::new("Austrian gunner", 45.0, 50.0, 25, 45),
            OpponentTemplate::new("Battery sergeant", 65.0, 60.0, 40, 50).with_stance(Stance::Defensive),
        ],
        allies: vec![AllyTemplate::from_post(LinePost::Left, 45, AllyPersonality::Aggressive)],
        max_active_enemies: 2,
        max_exchanges: 8,
        waves: vec![WaveEvent {
            at_round: 3,
            kind: WaveKind::AllyJoins(AllyTemplate::from_post(LinePost::Right, 30, AllyPersonality::Cautious)),
            condition: Some(WaveCondition::PostAlive(LinePost::Right)),
            narrative: "Your right-hand man scrambles over the trail of a gun and falls in at your side.".into(),
        }],
        next_beat: StoryBeatId::Massena,
    };

    let mut map = AHashMap::new();
    map.insert(plateau.key.clone(), plateau);
    map.insert(battery.key.clone(), battery);
    map
}

fn nco_name(state: &BattleState) -> String {
    state
        .line
        .nco
        .as_ref()
        .map(|m| m.name.clone())
        .unwrap_or_else(|| "The sergeant".to_string())
}

// === WOUNDED SERGEANT ===

fn wounded_sergeant_narrative(state: &BattleState) -> String {
    format!(
        "{} is down, clutching his side in the snow. The file wavers without his voice.",
        nco_name(state)
    )
}

fn wounded_sergeant_choices(_state: &BattleState) -> Vec<Choice> {
    vec![
        Choice::new(TAKE_COMMAND, "Take up his cry", "Dress the line yourself. It takes nerve."),
        Choice::new(HELP_SERGEANT, "Drag him back", "Get him to the surgeons behind the line."),
        Choice::new(STAY_IN_RANK, "Stay in the rank", "Your place is in the line."),
    ]
}

fn resolve_wounded_sergeant(
    state: &mut BattleState,
    ctx: &mut BeatContext<'_>,
    choice: &ChoiceId,
) -> Result<BeatOutcome, BattleError> {
    let name = nco_name(state);
    let outcome = BeatOutcome::new(BeatTransition::ResumeLine);

    match choice.as_str() {
        TAKE_COMMAND => {
            if let Some(nco) = state.line.nco.as_mut() {
                nco.wounded = true;
            }
            let check = roll_valor(state.player.stats.valor, Difficulty::Standard, ctx.rolls);
            if check.success {
                state.line.nco_present = true;
                state.player.change_officer_rep(5);
                state.player.change_soldier_rep(3);
                Ok(outcome
                    .line("\"Serrez les rangs!\" Your voice cracks, but the file closes up around you.")
                    .morale(MoraleChange::new(6, "Took command", MoraleSource::Action)))
            } else {
                state.line.nco_present = false;
                state.player.change_soldier_rep(-2);
                Ok(outcome
                    .line("You shout, but nobody listens to a fusilier. The file stays ragged.")
                    .morale(MoraleChange::new(-4, "Failed to steady the line", MoraleSource::Action)))
            }
        }
        HELP_SERGEANT => {
            if let Some(nco) = state.line.nco.as_mut() {
                nco.wounded = true;
                nco.relationship = (nco.relationship + 10).min(100);
            }
            state.line.nco_present = false;
            state.player.change_soldier_rep(4);
            Ok(outcome
                .line(format!("You haul {} back to the surgeons and run back to your place.", name))
                .morale(MoraleChange::new(2, "Saved the sergeant", MoraleSource::Action))
                .stamina(-10.0))
        }
        STAY_IN_RANK => {
            if let Some(nco) = state.line.nco.as_mut() {
                nco.alive = false;
            }
            state.line.nco_present = false;
            state.player.change_officer_rep(2);
            Ok(outcome
                .line(format!("You keep your eyes front. When you look again, {} is still.", name))
                .morale(MoraleChange::new(-5, "The sergeant is dead", MoraleSource::Event)))
        }
        other => Err(BattleError::UnknownChoice(other.to_string())),
    }
}

// === BATTERY ===

fn battery_narrative(_state: &BattleState) -> String {
    "The Austrians fall back across the plateau, leaving a battery of guns exposed fifty paces away. \
     The captain points his sword at them."
        .to_string()
}

fn battery_choices(_state: &BattleState) -> Vec<Choice> {
    vec![
        Choice::new(CHARGE_BATTERY, "Charge the battery", "Go for the guns before they can be limbered."),
        Choice::new(HOLD_BACK, "Hold back", "Let someone else be first among the guns."),
    ]
}

fn resolve_battery(
    state: &mut BattleState,
    _ctx: &mut BeatContext<'_>,
    choice: &ChoiceId,
) -> Result<BeatOutcome, BattleError> {
    match choice.as_str() {
        CHARGE_BATTERY => {
            if let Some(ext) = state.ext.rivoli_mut() {
                ext.battery_charged = true;
            }
            state.enemy.range = 0.0;
            Ok(BeatOutcome::new(BeatTransition::Melee {
                encounter: "battery".into(),
                stage: 2,
            })
            .line("You go forward with a yell, and the men around you go with you.")
            .morale(MoraleChange::new(5, "Charging the guns", MoraleSource::Action)))
        }
        HOLD_BACK => {
            state.player.change_soldier_rep(-5);
            Ok(BeatOutcome::new(BeatTransition::Beat(StoryBeatId::Massena))
                .line("You hang back while braver men take the guns. Nobody says anything. They do not need to.")
                .morale(MoraleChange::new(-3, "Held back from the charge", MoraleSource::Action)))
        }
        other => Err(BattleError::UnknownChoice(other.to_string())),
    }
}

// === MASSENA ===

fn massena_narrative(state: &BattleState) -> String {
    let charged = state.ext.rivoli().map(|e| e.battery_charged).unwrap_or(false);
    if charged {
        "Masséna himself rides past the captured guns and lifts his hat to the company.".to_string()
    } else {
        "Masséna's division comes up at the run and takes over the plateau.".to_string()
    }
}

fn massena_choices(_state: &BattleState) -> Vec<Choice> {
    vec![
        Choice::new(PRESS_ON, "Press on", "Fall in with the battalion as it moves to the second line."),
        Choice::new(CATCH_BREATH, "Catch your breath", "Take a moment among the guns before moving on."),
    ]
}

fn resolve_massena(
    state: &mut BattleState,
    _ctx: &mut BeatContext<'_>,
    choice: &ChoiceId,
) -> Result<BeatOutcome, BattleError> {
    let outcome = BeatOutcome::new(BeatTransition::BeginPart(2));
    match choice.as_str() {
        PRESS_ON => {
            if state.ext.rivoli().map(|e| e.battery_charged).unwrap_or(false) {
                state.player.change_napoleon_rep(3);
            }
            Ok(outcome
                .line("You shoulder your musket and follow the eagle.")
                .morale(MoraleChange::new(3, "Pressing on", MoraleSource::Action)))
        }
        CATCH_BREATH => Ok(outcome
            .line("You sit on a gun trail and drink. For a minute the world is quiet.")
            .stamina(15.0)
            .health(5.0)),
        other => Err(BattleError::UnknownChoice(other.to_string())),
    }
}

// === GORGE ===

fn gorge_narrative(_state: &BattleState) -> String {
    "The broken Austrians pour down into the gorge of the Adige. From the heights above, \
     the company could fire into them at will."
        .to_string()
}

fn gorge_choices(_state: &BattleState) -> Vec<Choice> {
    vec![
        Choice::new(TAKE_THE_HEIGHTS, "Take the heights", "Lead your file to the lip of the gorge."),
        Choice::new(HANG_BACK, "Follow the others", "Go where you are sent, and no further."),
    ]
}

fn resolve_gorge(
    state: &mut BattleState,
    _ctx: &mut BeatContext<'_>,
    choice: &ChoiceId,
) -> Result<BeatOutcome, BattleError> {
    let outcome = BeatOutcome::new(BeatTransition::BeginPart(3));
    match choice.as_str() {
        TAKE_THE_HEIGHTS => {
            state.player.change_officer_rep(2);
            Ok(outcome
                .line("You are first to the edge. Below, the road is a river of white coats.")
                .morale(MoraleChange::new(2, "Took the heights", MoraleSource::Action)))
        }
        HANG_BACK => {
            state.player.change_soldier_rep(-2);
            Ok(outcome.line("You arrive with the rest and find a place among the rocks."))
        }
        other => Err(BattleError::UnknownChoice(other.to_string())),
    }
}

// === AFTERMATH ===

fn aftermath_narrative(state: &BattleState) -> String {
    let mut text = String::from("The gorge falls silent.");
    if let Some(ext) = state.ext.rivoli() {
        if ext.wagon_detonated {
            text.push_str(" Smoke still rises from where the wagon was.");
        }
        if ext.officer_shot {
            text.push_str(" Somewhere below lies the officer on the grey horse.");
        }
        if ext.gorge_mercy_count > 0 {
            text.push_str(" You remember each time you fired high, and you are not sorry.");
        }
    }
    text
}

fn aftermath_choices(state: &BattleState) -> Vec<Choice> {
    let mercy = state.ext.rivoli().map(|e| e.gorge_mercy_count).unwrap_or(0);
    vec![
        Choice::new(
            HELP_THE_WOUNDED,
            "Go down among the wounded",
            "Only someone who held their fire could face them.",
        )
        .available_if(mercy > 0),
        Choice::new(REJOIN_THE_RANKS, "Rejoin the ranks", "Form up with the battalion for the roll call."),
    ]
}

fn resolve_aftermath(
    state: &mut BattleState,
    _ctx: &mut BeatContext<'_>,
    choice: &ChoiceId,
) -> Result<BeatOutcome, BattleError> {
    let outcome = BeatOutcome::new(BeatTransition::EndBattle(BattleOutcome::Victory));
    match choice.as_str() {
        HELP_THE_WOUNDED => {
            state.player.change_soldier_rep(5);
            Ok(outcome
                .line("You climb down and give your water to a boy in a white coat. He cannot be more than sixteen.")
                .morale(MoraleChange::new(5, "Mercy in the gorge", MoraleSource::Recovery)))
        }
        REJOIN_THE_RANKS => {
            state.player.change_officer_rep(2);
            Ok(outcome.line("The roll is called. Too many names go unanswered. Rivoli is won."))
        }
        other => Err(BattleError::UnknownChoice(other.to_string())),
    }
}

fn story_beats() -> AHashMap<StoryBeatId, StoryBeatDef> {
    let defs = [
        StoryBeatDef {
            id: StoryBeatId::WoundedSergeant,
            title: "The Wounded Sergeant",
            narrative: wounded_sergeant_narrative,
            choices: wounded_sergeant_choices,
            resolve: resolve_wounded_sergeant,
            next_beats: &[],
            encounters: &[],
        },
        StoryBeatDef {
            id: StoryBeatId::Battery,
            title: "The Battery",
            narrative: battery_narrative,
            choices: battery_choices,
            resolve: resolve_battery,
            next_beats: &[StoryBeatId::Massena],
            encounters: &["battery"],
        },
        StoryBeatDef {
            id: StoryBeatId::Massena,
            title: "Masséna Arrives",
            narrative: massena_narrative,
            choices: massena_choices,
            resolve: resolve_massena,
            next_beats: &[],
            encounters: &[],
        },
        StoryBeatDef {
            id: StoryBeatId::Gorge,
            title: "The Gorge",
            narrative: gorge_narrative,
            choices: gorge_choices,
            resolve: resolve_gorge,
            next_beats: &[],
            encounters: &[],
        },
        StoryBeatDef {
            id: StoryBeatId::Aftermath,
            title: "Aftermath",
            narrative: aftermath_narrative,
            choices: aftermath_choices,
            resolve: resolve_aftermath,
            next_beats: &[],
            encounters: &[],
        },
    ];
    defs.into_iter().map(|def| (def.id, def)).collect()
}

pub fn rivoli() -> BattleConfig {
    BattleConfig {
        id: BATTLE_ID.into(),
        name: "Rivoli".into(),
        kind: BattleKind::Rivoli,
        intro: vec![
            "January 1797. Bonaparte's Army of Italy waits on the heights above the Adige.".into(),
            "Alvinczi's Austrians are coming over the mountains in six columns.".into(),
        ],
        parts: vec![plateau_part(), second_line_part(), gorge_part()],
        encounters: encounters(),
        story_beats: story_beats(),
    }
}
