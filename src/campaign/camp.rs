//! Camp between battles
//!
//! A camp has a fixed number of actions. Each activity spends one and may
//! raise a stat, mend equipment or warm a friendship. After an activity a
//! forced event (once per camp) or a random event may interrupt; it must be
//! resolved before the next activity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::campaign::character::{clamp_reputation, PlayerCharacter, Stat, STAT_CAP};
use crate::campaign::npc::Npc;
use crate::core::config::CampTuning;
use crate::core::error::CampaignError;
use crate::core::types::{LogEntry, LogKind, NpcId};
use crate::stats::rolls::{roll_stat, Difficulty, RollGrade, RollSource};

pub const CONDITION_MAX: i32 = 100;

/// Uniform condition gained from a maintenance session
pub const UNIFORM_MAINTAIN_GAIN: u32 = 10;

/// Stats that drill can train
pub const DRILLABLE_STATS: [Stat; 3] = [Stat::Musketry, Stat::Elan, Stat::Endurance];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampKind {
    PostBattle,
    PreBattle,
}

/// Mood of the bivouac, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampConditions {
    pub morale: i32,
    pub supplies: i32,
    pub hygiene: i32,
}

impl CampConditions {
    pub fn for_kind(kind: CampKind) -> Self {
        match kind {
            CampKind::PostBattle => Self {
                morale: 40,
                supplies: 50,
                hygiene: 30,
            },
            CampKind::PreBattle => Self {
                morale: 60,
                supplies: 60,
                hygiene: 50,
            },
        }
    }

    pub fn change_morale(&mut self, delta: i32) {
        self.morale = (self.morale + delta).clamp(0, CONDITION_MAX);
    }

    pub fn change_supplies(&mut self, delta: i32) {
        self.supplies = (self.supplies + delta).clamp(0, CONDITION_MAX);
    }

    pub fn change_hygiene(&mut self, delta: i32) {
        self.hygiene = (self.hygiene + delta).clamp(0, CONDITION_MAX);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "activity", content = "target", rename_all = "camelCase")]
pub enum CampActivity {
    Drill(Stat),
    Socialize(NpcId),
    WriteLetter,
    MaintainEquipment,
    Bathe,
    Pray,
    Forage,
}

impl fmt::Display for CampActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampActivity::Drill(stat) => write!(f, "drill {}", stat),
            CampActivity::Socialize(npc) => write!(f, "socialize with {}", npc),
            CampActivity::WriteLetter => f.write_str("write a letter"),
            CampActivity::MaintainEquipment => f.write_str("maintain equipment"),
            CampActivity::Bathe => f.write_str("bathe"),
            CampActivity::Pray => f.write_str("pray"),
            CampActivity::Forage => f.write_str("forage"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampEventId {
    BuryTheDead,
    SergeantsInspection,
    CardGame,
    StormNight,
    Deserter,
}

/// Events that may interrupt any camp, at most once each
pub const RANDOM_EVENTS: [CampEventId; 3] = [
    CampEventId::CardGame,
    CampEventId::StormNight,
    CampEventId::Deserter,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampChoice {
    pub id: &'static str,
    pub label: &'static str,
}

impl CampEventId {
    pub fn title(&self) -> &'static str {
        match self {
            CampEventId::BuryTheDead => "Burying the Dead",
            CampEventId::SergeantsInspection => "The Sergeant's Inspection",
            CampEventId::CardGame => "A Game of Cards",
            CampEventId::StormNight => "A Night of Storm",
            CampEventId::Deserter => "The Deserter",
        }
    }

    pub fn narrative(&self) -> &'static str {
        match self {
            CampEventId::BuryTheDead => {
                "A burial party is called for. The ground is frozen and the dead are men you knew."
            }
            CampEventId::SergeantsInspection => {
                "The sergeant walks the line before dawn, looking at every lock and every flint."
            }
            CampEventId::CardGame => {
                "Round a fire, the grenadiers are playing cards for rations. They wave you over."
            }
            CampEventId::StormNight => "Sleet comes down the valley at night and puts out half the fires.",
            CampEventId::Deserter => {
                "On watch you see a man from the next company slipping away towards the river."
            }
        }
    }

    pub fn choices(&self) -> &'static [CampChoice] {
        match self {
            CampEventId::BuryTheDead => &[
                CampChoice { id: "say_words", label: "Say a few words over them" },
                CampChoice { id: "dig_in_silence", label: "Dig in silence" },
            ],
            CampEventId::SergeantsInspection => &[
                CampChoice { id: "present_arms", label: "Present your musket" },
                CampChoice { id: "report_sick", label: "Report sick" },
            ],
            CampEventId::CardGame => &[
                CampChoice { id: "play", label: "Sit in" },
                CampChoice { id: "decline", label: "Go back to your blanket" },
            ],
            CampEventId::StormNight => &[
                CampChoice { id: "share_shelter", label: "Share your shelter" },
                CampChoice { id: "keep_dry", label: "Keep your own powder dry" },
            ],
            CampEventId::Deserter => &[
                CampChoice { id: "report", label: "Raise the alarm" },
                CampChoice { id: "look_away", label: "Look the other way" },
            ],
        }
    }

    /// Event forced once in a camp of this kind
    pub fn forced_for(kind: CampKind) -> Self {
        match kind {
            CampKind::PostBattle => CampEventId::BuryTheDead,
            CampKind::PreBattle => CampEventId::SergeantsInspection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampState {
    pub kind: CampKind,
    pub actions_total: u32,
    pub actions_remaining: u32,
    pub conditions: CampConditions,
    pub log: Vec<LogEntry>,
    pub pending_event: Option<CampEventId>,
    pub completed_activities: Vec<CampActivity>,
    pub triggered_events: Vec<CampEventId>,
    /// Activities left before the player may bathe again
    pub bathe_cooldown: u32,
    pub prayed_this_camp: bool,
}

impl CampState {
    fn actions_used(&self) -> u32 {
        self.actions_total.saturating_sub(self.actions_remaining)
    }

    fn log(&mut self, kind: LogKind, text: impl Into<String>) {
        let turn = self.actions_used();
        self.log.push(LogEntry::new(turn, kind, text));
    }

    pub fn is_finished(&self) -> bool {
        self.actions_remaining == 0 && self.pending_event.is_none()
    }

    /// Whether `activity` can be performed right now
    pub fn can_perform(&self, activity: &CampActivity, npcs: &[Npc]) -> bool {
        match activity {
            CampActivity::Drill(stat) => DRILLABLE_STATS.contains(stat),
            CampActivity::Socialize(id) => npcs.iter().any(|n| &n.id == id && n.alive),
            CampActivity::Bathe => self.bathe_cooldown == 0,
            CampActivity::Pray => !self.prayed_this_camp,
            CampActivity::WriteLetter | CampActivity::MaintainEquipment | CampActivity::Forage => true,
        }
    }
}

pub fn create_camp_state(kind: CampKind, tuning: &CampTuning) -> CampState {
    CampState {
        kind,
        actions_total: tuning.actions_per_camp,
        actions_remaining: tuning.actions_per_camp,
        conditions: CampConditions::for_kind(kind),
        log: Vec::new(),
        pending_event: None,
        completed_activities: Vec::new(),
        triggered_events: Vec::new(),
        bathe_cooldown: 0,
        prayed_this_camp: false,
    }
}

/// Result of one activity
#[derive(Debug, Clone, Default)]
pub struct ActivityReport {
    pub narratives: Vec<String>,
    /// Event that interrupted the camp, now pending
    pub event: Option<CampEventId>,
}

/// Spend one camp action on an activity
pub fn perform_activity(
    camp: &mut CampState,
    player: &mut PlayerCharacter,
    npcs: &mut [Npc],
    activity: &CampActivity,
    tuning: &CampTuning,
    rolls: &mut dyn RollSource,
) -> Result<ActivityReport, CampaignError> {
    if camp.pending_event.is_some() {
        return Err(CampaignError::EventPending);
    }
    if camp.actions_remaining == 0 {
        return Err(CampaignError::NoActionsRemaining);
    }
    if !camp.can_perform(activity, npcs) {
        return Err(CampaignError::ActivityUnavailable(activity.to_string()));
    }

    camp.actions_remaining -= 1;
    if *activity != CampActivity::Bathe {
        camp.bathe_cooldown = camp.bathe_cooldown.saturating_sub(1);
    }

    let mut narratives = Vec::new();
    match activity {
        CampActivity::Drill(stat) => {
            let check = roll_stat(player.stats.get(*stat), Difficulty::Standard, rolls);
            if check.success && player.stats.get(*stat) < STAT_CAP {
                let value = player.stats.raise(*stat, 1);
                narratives.push(format!("Hours of drill pay off. Your {} rises to {}.", stat, value));
            } else {
                narratives.push("You drill until your arms ache, but nothing new sticks.".to_string());
            }
        }
        CampActivity::Socialize(id) => {
            let check = roll_stat(player.stats.charisma, Difficulty::Standard, rolls);
            let gain = if check.success {
                tuning.socialize_gain * 2
            } else {
                tuning.socialize_gain
            };
            if let Some(npc) = npcs.iter_mut().find(|n| &n.id == id) {
                npc.adjust_relationship(gain);
                narratives.push(format!("You share a pipe with {}. ({:+} relationship)", npc.name, gain));
            }
            camp.conditions.change_morale(3);
        }
        CampActivity::WriteLetter => {
            camp.conditions.change_morale(8);
            narratives.push("You write home by the light of the fire. It steadies you.".to_string());
        }
        CampActivity::MaintainEquipment => {
            let equipment = &mut player.equipment;
            equipment.musket_condition = (equipment.musket_condition + tuning.maintain_gain).min(100);
            equipment.uniform_condition = (equipment.uniform_condition + UNIFORM_MAINTAIN_GAIN).min(100);
            narratives.push(format!(
                "You clean the lock and replace the flint. Musket condition {}.",
                equipment.musket_condition
            ));
        }
        CampActivity::Bathe => {
            camp.conditions.change_hygiene(CONDITION_MAX);
            camp.conditions.change_morale(5);
            camp.bathe_cooldown = tuning.bathe_cooldown;
            narratives.push("The stream is bitterly cold, but you come out of it a new man.".to_string());
        }
        CampActivity::Pray => {
            camp.prayed_this_camp = true;
            camp.conditions.change_morale(4);
            let check = roll_stat(player.stats.valor, Difficulty::Hard, rolls);
            if check.grade == RollGrade::GreatSuccess && player.gain_grace() {
                narratives.push("Kneeling in the snow, you feel something answer. (+1 Grace)".to_string());
            } else {
                narratives.push("You pray for yourself and for the men beside you.".to_string());
            }
        }
        CampActivity::Forage => {
            let check = roll_stat(player.stats.awareness, Difficulty::Standard, rolls);
            if check.success {
                camp.conditions.change_supplies(20);
                narratives.push("You come back from a farmhouse with bread and a ham.".to_string());
            } else {
                player.officer_rep = clamp_reputation(player.officer_rep - 3);
                narratives.push("A provost sees you coming back empty-handed from the farms. (-3 officer rep)".to_string());
            }
        }
    }

    camp.completed_activities.push(activity.clone());
    for text in &narratives {
        camp.log(LogKind::Action, text.clone());
    }
    tracing::debug!(activity = %activity, remaining = camp.actions_remaining, "Camp activity");

    let event = roll_camp_event(camp, tuning, rolls);
    if let Some(id) = event {
        camp.pending_event = Some(id);
        camp.triggered_events.push(id);
        camp.log(LogKind::Event, id.narrative());
        narratives.push(id.narrative().to_string());
        tracing::info!(event = ?id, "Camp event");
    }

    Ok(ActivityReport { narratives, event })
}

/// Forced event once half the camp is spent, else a random one
fn roll_camp_event(camp: &CampState, tuning: &CampTuning, rolls: &mut dyn RollSource) -> Option<CampEventId> {
    let forced = CampEventId::forced_for(camp.kind);
    if !camp.triggered_events.contains(&forced) && camp.actions_used() * 2 >= camp.actions_total {
        return Some(forced);
    }

    if rolls.chance() >= tuning.random_event_chance {
        return None;
    }
    let candidates: Vec<CampEventId> = RANDOM_EVENTS
        .iter()
        .copied()
        .filter(|e| !camp.triggered_events.contains(e))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let index = rolls.between(0, candidates.len() as i32 - 1) as usize;
    candidates.get(index).copied()
}

/// Resolve the pending camp event with one of its choices
pub fn resolve_camp_event(
    camp: &mut CampState,
    player: &mut PlayerCharacter,
    npcs: &mut [Npc],
    choice: &str,
    rolls: &mut dyn RollSource,
) -> Result<Vec<String>, CampaignError> {
    let event = camp.pending_event.ok_or(CampaignError::NoPendingEvent)?;
    if !event.choices().iter().any(|c| c.id == choice) {
        return Err(CampaignError::ActivityUnavailable(choice.to_string()));
    }

    let mut narratives = Vec::new();
    let mut soldier = 0;
    let mut officer = 0;
    match (event, choice) {
        (CampEventId::BuryTheDead, "say_words") => {
            soldier += 3;
            camp.conditions.change_morale(5);
            narratives.push("The men take their caps off while you speak. Nobody mocks you.".to_string());
        }
        (CampEventId::BuryTheDead, _) => {
            camp.conditions.change_morale(-2);
            narratives.push("You dig until the hole is deep enough, and then you fill it in.".to_string());
        }
        (CampEventId::SergeantsInspection, "present_arms") => {
            if player.equipment.musket_condition >= 60 {
                officer += 5;
                narratives.push("The sergeant grunts and moves on. From him, that is praise.".to_string());
            } else {
                officer -= 5;
                narratives.push("\"Rust, fusilier. Rust will kill you before the Austrians do.\"".to_string());
            }
        }
        (CampEventId::SergeantsInspection, _) => {
            officer -= 3;
            narratives.push("The surgeon finds nothing wrong with you. The sergeant remembers.".to_string());
        }
        (CampEventId::CardGame, "play") => {
            let check = roll_stat(player.stats.intelligence, Difficulty::Standard, rolls);
            if check.success {
                soldier += 2;
                camp.conditions.change_supplies(10);
                narratives.push("You win a sausage and the grudging respect of the grenadiers.".to_string());
            } else {
                camp.conditions.change_supplies(-10);
                narratives.push("You lose two days of biscuit before you learn their tricks.".to_string());
            }
        }
        (CampEventId::CardGame, _) => {
            narratives.push("You sleep instead. Someone has to.".to_string());
        }
        (CampEventId::StormNight, "share_shelter") => {
            let check = roll_stat(player.stats.endurance, Difficulty::Standard, rolls);
            soldier += 4;
            if check.success {
                narratives.push("Three of you under one blanket. You all live to see the morning.".to_string());
            } else {
                camp.conditions.change_morale(-5);
                narratives.push("You give your blanket away and shiver until dawn.".to_string());
            }
            for npc in npcs.iter_mut().filter(|n| n.alive) {
                npc.adjust_relationship(2);
            }
        }
        (CampEventId::StormNight, _) => {
            soldier -= 2;
            camp.conditions.change_morale(-2);
            narratives.push("Your powder stays dry. Your comrades notice whose did not.".to_string());
        }
        (CampEventId::Deserter, "report") => {
            officer += 5;
            soldier -= 5;
            narratives.push("The man is brought back in irons. The company does not look at you.".to_string());
        }
        (CampEventId::Deserter, _) => {
            soldier += 3;
            narratives.push("By morning he is gone. You say nothing.".to_string());
        }
    }

    player.soldier_rep = clamp_reputation(player.soldier_rep + soldier);
    player.officer_rep = clamp_reputation(player.officer_rep + officer);
    camp.pending_event = None;
    for text in &narratives {
        camp.log(LogKind::Result, text.clone());
    }
    tracing::debug!(event = ?event, choice, soldier, officer, "Camp event resolved");
    Ok(narratives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::npc::NpcRole;
    use crate::stats::rolls::ScriptedRolls;

    fn setup(kind: CampKind) -> (CampState, PlayerCharacter, Vec<Npc>, CampTuning) {
        let tuning = CampTuning::default();
        let camp = create_camp_state(kind, &tuning);
        let player = PlayerCharacter::new("Jean");
        let npcs = vec![Npc::new("pierre", "Pierre", NpcRole::Neighbour, "Fusilier", 50)];
        (camp, player, npcs, tuning)
    }

    #[test]
    fn test_activity_spends_an_action() {
        let (mut camp, mut player, mut npcs, tuning) = setup(CampKind::PreBattle);
        let mut rolls = ScriptedRolls::new().with_d100s(&[10]);

        let report = perform_activity(
            &mut camp,
            &mut player,
            &mut npcs,
            &CampActivity::Drill(Stat::Musketry),
            &tuning,
            &mut rolls,
        )
        .unwrap();

        assert_eq!(camp.actions_remaining, tuning.actions_per_camp - 1);
        assert_eq!(player.stats.musketry, 31);
        assert!(report.event.is_none());
        assert_eq!(camp.completed_activities.len(), 1);
    }

    #[test]
    fn test_drill_rejects_untrainable_stat() {
        let (mut camp, mut player, mut npcs, tuning) = setup(CampKind::PreBattle);
        let mut rolls = ScriptedRolls::new();
        let result = perform_activity(
            &mut camp,
            &mut player,
            &mut npcs,
            &CampActivity::Drill(Stat::Charisma),
            &tuning,
            &mut rolls,
        );
        assert!(matches!(result, Err(CampaignError::ActivityUnavailable(_))));
        assert_eq!(camp.actions_remaining, tuning.actions_per_camp);
    }

    #[test]
    fn test_bathe_cooldown_and_single_prayer() {
        let (mut camp, mut player, mut npcs, tuning) = setup(CampKind::PreBattle);
        let mut rolls = ScriptedRolls::new();

        perform_activity(&mut camp, &mut player, &mut npcs, &CampActivity::Bathe, &tuning, &mut rolls).unwrap();
        assert_eq!(camp.bathe_cooldown, tuning.bathe_cooldown);
        assert!(!camp.can_perform(&CampActivity::Bathe, &npcs));

        perform_activity(&mut camp, &mut player, &mut npcs, &CampActivity::Pray, &tuning, &mut rolls).unwrap();
        assert!(camp.prayed_this_camp);
        assert_eq!(camp.bathe_cooldown, tuning.bathe_cooldown - 1);
        assert!(!camp.can_perform(&CampActivity::Pray, &npcs));
    }

    #[test]
    fn test_forced_event_fires_once_at_halfway() {
        let (mut camp, mut player, mut npcs, tuning) = setup(CampKind::PostBattle);
        let mut rolls = ScriptedRolls::new();

        for _ in 0..2 {
            let report =
                perform_activity(&mut camp, &mut player, &mut npcs, &CampActivity::WriteLetter, &tuning, &mut rolls)
                    .unwrap();
            assert!(report.event.is_none());
        }
        let report =
            perform_activity(&mut camp, &mut player, &mut npcs, &CampActivity::WriteLetter, &tuning, &mut rolls)
                .unwrap();
        assert_eq!(report.event, Some(CampEventId::BuryTheDead));

        let blocked = perform_activity(&mut camp, &mut player, &mut npcs, &CampActivity::Forage, &tuning, &mut rolls);
        assert_eq!(blocked.unwrap_err(), CampaignError::EventPending);

        resolve_camp_event(&mut camp, &mut player, &mut npcs, "say_words", &mut rolls).unwrap();
        assert_eq!(player.soldier_rep, 53);
        assert!(camp.pending_event.is_none());

        let report =
            perform_activity(&mut camp, &mut player, &mut npcs, &CampActivity::WriteLetter, &tuning, &mut rolls)
                .unwrap();
        assert!(report.event.is_none());
        assert_eq!(camp.triggered_events, vec![CampEventId::BuryTheDead]);
    }

    #[test]
    fn test_random_event_drawn_when_chance_hits() {
        let (mut camp, mut player, mut npcs, tuning) = setup(CampKind::PreBattle);
        let mut rolls = ScriptedRolls::new().with_chances(&[0.05]).with_ranges(&[2]);

        let report =
            perform_activity(&mut camp, &mut player, &mut npcs, &CampActivity::WriteLetter, &tuning, &mut rolls)
                .unwrap();
        assert_eq!(report.event, Some(CampEventId::Deserter));

        let err = resolve_camp_event(&mut camp, &mut player, &mut npcs, "desert_too", &mut rolls);
        assert!(matches!(err, Err(CampaignError::ActivityUnavailable(_))));

        resolve_camp_event(&mut camp, &mut player, &mut npcs, "report", &mut rolls).unwrap();
        assert_eq!(player.officer_rep, 55);
        assert_eq!(player.soldier_rep, 45);
    }

    #[test]
    fn test_no_actions_left() {
        let (mut camp, mut player, mut npcs, tuning) = setup(CampKind::PreBattle);
        camp.actions_remaining = 0;
        let mut rolls = ScriptedRolls::new();
        let result = perform_activity(&mut camp, &mut player, &mut npcs, &CampActivity::Forage, &tuning, &mut rolls);
        assert_eq!(result.unwrap_err(), CampaignError::NoActionsRemaining);
        assert!(camp.is_finished());
    }

    #[test]
    fn test_resolve_without_event() {
        let (mut camp, mut player, mut npcs, _) = setup(CampKind::PreBattle);
        let mut rolls = ScriptedRolls::new();
        let result = resolve_camp_event(&mut camp, &mut player, &mut npcs, "say_words", &mut rolls);
        assert_eq!(result.unwrap_err(), CampaignError::NoPendingEvent);
    }
}
