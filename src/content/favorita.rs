//! La Favorita, 16 January 1797

use ahash::AHashMap;

use crate::battle::config::{BattleConfig, BattleKind, BattlePart, FollowUp, PartKind, ScriptedVolley};
use crate::battle::state::{BattleExt, BattleOutcome, BattleState, EnemyQuality, EnemyState, LinePost, StoryBeatId};
use crate::battle::story::{BeatContext, BeatOutcome, BeatTransition, Choice, ChoiceId, StoryBeatDef};
use crate::combat::state::AllyPersonality;
use crate::combat::waves::{AllyTemplate, MeleeEncounter, OpponentTemplate};
use crate::core::error::BattleError;
use crate::core::types::{MoraleChange, MoraleSource};
use crate::stats::rolls::{roll_valor, Difficulty};

pub const BATTLE_ID: &str = "favorita";

pub const HOLD_THE_CAUSEWAY: &str = "hold_the_causeway";
pub const COUNTER_CHARGE: &str = "counter_charge";
pub const MARCH_ON: &str = "march_on";

fn volleys() -> Vec<ScriptedVolley> {
    let table = [
        (
            100.0,
            8.0,
            0.35,
            "Provera's relief column comes up the road from the north, colours uncased.",
            "The demi-brigade fires from behind the dykes.",
            "Their reply skims the top of the bank.",
        ),
        (
            70.0,
            10.0,
            0.45,
            "The garrison of Mantua sallies from the fortress behind you. You are caught between them.",
            "You fire to the front while the rear rank turns about.",
            "Balls come from two directions now.",
        ),
        (
            50.0,
            12.0,
            0.50,
            "The Austrians mass at the head of the causeway for a rush.",
            "A volley into the head of the column piles the dead on the stones.",
            "They are still coming.",
        ),
    ];
    let last = table.len() - 1;
    table
        .iter()
        .enumerate()
        .map(|(i, (range, loss, fire_back, present, fire, endure))| ScriptedVolley {
            range: *range,
            present: present.to_string(),
            fire: fire.to_string(),
            endure: endure.to_string(),
            enemy_loss: *loss,
            return_fire: *fire_back,
            artillery: false,
            follow_up: if i == last {
                FollowUp::StoryBeat(StoryBeatId::Causeway)
            } else {
                FollowUp::NextVolley
            },
        })
        .collect()
}

fn encounters() -> AHashMap<String, MeleeEncounter> {
    let causeway = MeleeEncounter {
        key: "causeway".into(),
        intro: "You go down the bank onto the causeway and into them.".into(),
        opponents: vec![
            OpponentTemplate::new("Austrian fusilier", 60.0, 55.0, 35, 40),
            OpponentTemplate::new("Austrian fusilier", 60.0, 55.0, 35, 40),
            OpponentTemplate::new("Hungarian grenadier", 75.0, 65.0, 45, 50),
        ],
        allies: vec![AllyTemplate::from_post(LinePost::Left, 45, AllyPersonality::Steady)],
        max_active_enemies: 2,
        max_exchanges: 8,
        waves: Vec::new(),
        next_beat: StoryBeatId::FavoritaAftermath,
    };
    let mut map = AHashMap::new();
    map.insert(causeway.key.clone(), causeway);
    map
}

fn causeway_narrative(_state: &BattleState) -> String {
    "The Austrian column reaches the causeway. If they cross, Mantua is relieved.".to_string()
}

fn causeway_choices(_state: &BattleState) -> Vec<Choice> {
    vec![
        Choice::new(HOLD_THE_CAUSEWAY, "Hold the causeway", "Stand on the bank and keep firing."),
        Choice::new(COUNTER_CHARGE, "Counter-charge", "Meet them on the stones with the bayonet."),
    ]
}

fn resolve_causeway(
    state: &mut BattleState,
    ctx: &mut BeatContext<'_>,
    choice: &ChoiceId,
) -> Result<BeatOutcome, BattleError> {
    match choice.as_str() {
        HOLD_THE_CAUSEWAY => {
            let check = roll_valor(state.player.stats.valor, Difficulty::Standard, ctx.rolls);
            let outcome = BeatOutcome::new(BeatTransition::Beat(StoryBeatId::FavoritaAftermath));
            if check.success {
                if let Some(ext) = state.ext.favorita_mut() {
                    ext.causeway_held = true;
                }
                state.player.change_officer_rep(3);
                Ok(outcome
                    .line("You load and fire until your shoulder is black with bruises. The column never reaches the bank.")
                    .morale(MoraleChange::new(5, "Held the causeway", MoraleSource::Action)))
            } else {
                Ok(outcome
                    .line("The rush reaches the bank before it falters. A bayonet opens your arm before they are thrown back.")
                    .morale(MoraleChange::new(-6, "The line nearly broke", MoraleSource::Event))
                    .health(-10.0))
            }
        }
        COUNTER_CHARGE => {
            if let Some(ext) = state.ext.favorita_mut() {
                ext.counter_charged = true;
            }
            Ok(BeatOutcome::new(BeatTransition::Melee {
                encounter: "causeway".into(),
                stage: 1,
            })
            .line("\"En avant!\" You are over the bank before you have thought about it.")
            .morale(MoraleChange::new(4, "Counter-charging", MoraleSource::Action)))
        }
        other => Err(BattleError::UnknownChoice(other.to_string())),
    }
}

fn aftermath_narrative(state: &BattleState) -> String {
    let held = matches!(&state.ext, BattleExt::Favorita(ext) if ext.causeway_held || ext.counter_charged);
    if held {
        "Provera surrenders with his whole column. Mantua's last hope is gone.".to_string()
    } else {
        "The Austrians are beaten, though not by much. Provera surrenders at dusk.".to_string()
    }
}

fn aftermath_choices(_state: &BattleState) -> Vec<Choice> {
    vec![Choice::new(MARCH_ON, "March on", "The campaign in Italy is over. Mantua will fall.")]
}

fn resolve_aftermath(
    _state: &mut BattleState,
    _ctx: &mut BeatContext<'_>,
    choice: &ChoiceId,
) -> Result<BeatOutcome, BattleError> {
    match choice.as_str() {
        MARCH_ON => Ok(BeatOutcome::new(BeatTransition::EndBattle(BattleOutcome::Victory))
            .line("You fall in with what is left of the company and march south.")),
        other => Err(BattleError::UnknownChoice(other.to_string())),
    }
}

pub fn favorita() -> BattleConfig {
    let beats = [
        StoryBeatDef {
            id: StoryBeatId::Causeway,
            title: "The Causeway",
            narrative: causeway_narrative,
            choices: causeway_choices,
            resolve: resolve_causeway,
            next_beats: &[StoryBeatId::FavoritaAftermath],
            encounters: &["causeway"],
        },
        StoryBeatDef {
            id: StoryBeatId::FavoritaAftermath,
            title: "Surrender at La Favorita",
            narrative: aftermath_narrative,
            choices: aftermath_choices,
            resolve: resolve_aftermath,
            next_beats: &[],
            encounters: &[],
        },
    ];

    BattleConfig {
        id: BATTLE_ID.into(),
        name: "La Favorita".into(),
        kind: BattleKind::Favorita,
        intro: vec!["Two days after Rivoli, the half-brigade has marched through the night to Mantua.".into()],
        parts: vec![BattlePart {
            number: 1,
            title: "La Favorita".into(),
            intro: "Dawn by the lakes outside Mantua. The company lines the dykes above the causeway.".into(),
            enemy: EnemyState::new(100.0, EnemyQuality::Line),
            kind: PartKind::Scripted(volleys()),
        }],
        encounters: encounters(),
        story_beats: beats.into_iter().map(|def| (def.id, def)).collect(),
    }
}
