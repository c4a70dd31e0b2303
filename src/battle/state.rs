//! Canonical battle state
//!
//! One `BattleState` per battle. The engines mutate it through `&mut`; every
//! pool mutation goes through a clamping helper so no value is ever observed
//! outside its range.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::battle::gorge::GorgeTarget;
use crate::campaign::character::{clamp_reputation, BaseStats, PlayerCharacter};
use crate::campaign::npc::{Npc, NpcRole};
use crate::combat::state::MeleeState;
use crate::core::types::{LogEntry, LogKind, MoraleChange, NpcId, Turn};
use crate::stats::rolls::RollResult;
use crate::stats::thresholds::{
    get_fatigue_tier, get_health_state, get_morale_threshold, health_pool_size,
    stamina_pool_size, FatigueTier, HealthState, MoraleThreshold,
};

pub const MAX_MORALE: f64 = 100.0;
pub const MAX_LINE_INTEGRITY: f64 = 100.0;
pub const MAX_ENEMY_STRENGTH: f64 = 100.0;

/// Share of each pool restored when Grace saves the player
pub const GRACE_RESTORE_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Intro,
    Line,
    StoryBeat,
    Melee,
    Complete,
}

impl fmt::Display for BattlePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BattleOutcome {
    #[default]
    Pending,
    Victory,
    Defeat,
    Rout,
}

/// Step of the volley drill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DrillStep {
    #[default]
    Present,
    Fire,
    Endure,
    Load,
}

/// Narrative decision points, keyed per battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoryBeatId {
    WoundedSergeant,
    Battery,
    Massena,
    Gorge,
    Aftermath,
    Causeway,
    FavoritaAftermath,
}

/// The player's in-battle stat block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattlePlayer {
    pub name: String,
    pub health: f64,
    pub max_health: f64,
    pub morale: f64,
    pub max_morale: f64,
    pub stamina: f64,
    pub max_stamina: f64,
    /// Accumulated fatigue; 0 is fresh, `max_fatigue` is spent
    pub fatigue: f64,
    pub max_fatigue: f64,
    pub stats: BaseStats,
    pub soldier_rep: i32,
    pub officer_rep: i32,
    pub napoleon_rep: i32,
    pub grace: u32,
    pub alive: bool,
    pub musket_loaded: bool,
    pub canteen_uses: u32,
    pub arm_injured: bool,
    pub leg_injured: bool,
}

impl BattlePlayer {
    pub fn from_character(character: &PlayerCharacter, canteen_uses: u32) -> Self {
        let max_health = health_pool_size(character.stats.constitution);
        let max_stamina = stamina_pool_size(character.stats.endurance);
        Self {
            name: character.name.clone(),
            health: max_health,
            max_health,
            morale: MAX_MORALE,
            max_morale: MAX_MORALE,
            stamina: max_stamina,
            max_stamina,
            fatigue: 0.0,
            max_fatigue: max_stamina,
            stats: character.stats,
            soldier_rep: character.soldier_rep,
            officer_rep: character.officer_rep,
            napoleon_rep: character.napoleon_rep,
            grace: character.grace,
            alive: character.alive,
            musket_loaded: true,
            canteen_uses,
            arm_injured: false,
            leg_injured: false,
        }
    }

    pub fn change_health(&mut self, delta: f64) {
        self.health = (self.health + delta).clamp(0.0, self.max_health);
    }

    pub fn change_morale(&mut self, delta: f64) {
        self.morale = (self.morale + delta).clamp(0.0, self.max_morale);
    }

    pub fn change_stamina(&mut self, delta: f64) {
        self.stamina = (self.stamina + delta).clamp(0.0, self.max_stamina);
    }

    pub fn change_fatigue(&mut self, delta: f64) {
        self.fatigue = (self.fatigue + delta).clamp(0.0, self.max_fatigue);
    }

    pub fn change_soldier_rep(&mut self, delta: i32) {
        self.soldier_rep = clamp_reputation(self.soldier_rep + delta);
    }

    pub fn change_officer_rep(&mut self, delta: i32) {
        self.officer_rep = clamp_reputation(self.officer_rep + delta);
    }

    pub fn change_napoleon_rep(&mut self, delta: i32) {
        self.napoleon_rep = clamp_reputation(self.napoleon_rep + delta);
    }

    pub fn is_down(&self) -> bool {
        self.health <= 0.0
    }

    pub fn morale_threshold(&self) -> MoraleThreshold {
        get_morale_threshold(self.morale, self.max_morale)
    }

    pub fn health_state(&self) -> HealthState {
        get_health_state(self.health, self.max_health)
    }

    pub fn fatigue_tier(&self) -> FatigueTier {
        get_fatigue_tier(self.fatigue, self.max_fatigue)
    }

    /// Restore health, morale and stamina to half their pools
    pub fn restore_to_half(&mut self) {
        self.health = (self.max_health * GRACE_RESTORE_RATIO).round();
        self.morale = (self.max_morale * GRACE_RESTORE_RATIO).round();
        self.stamina = (self.max_stamina * GRACE_RESTORE_RATIO).round();
    }
}

/// A named soldier in the player's immediate line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMember {
    pub npc_id: NpcId,
    pub name: String,
    pub rank: String,
    pub alive: bool,
    pub wounded: bool,
    pub morale: f64,
    pub max_morale: f64,
    pub valor: u32,
    pub relationship: i32,
}

impl LineMember {
    pub fn from_npc(npc: &Npc) -> Self {
        Self {
            npc_id: npc.id.clone(),
            name: npc.name.clone(),
            rank: npc.rank.clone(),
            alive: npc.alive,
            wounded: npc.wounded,
            morale: npc.morale,
            max_morale: npc.max_morale,
            valor: npc.valor,
            relationship: npc.relationship,
        }
    }

    /// Standing and able to fight
    pub fn in_line(&self) -> bool {
        self.alive && !self.wounded
    }

    pub fn change_morale(&mut self, delta: f64) {
        self.morale = (self.morale + delta).clamp(0.0, self.max_morale);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineState {
    pub left: Option<LineMember>,
    pub right: Option<LineMember>,
    pub nco: Option<LineMember>,
    pub officer: Option<LineMember>,
    pub line_integrity: f64,
    pub line_morale: f64,
    pub nco_present: bool,
    pub casualties_this_turn: u32,
}

/// The two neighbour posts flanking the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinePost {
    Left,
    Right,
}

impl LineState {
    /// Map the roster into the line: the first two living neighbours flank
    /// the player, the first living NCO and officer take their posts
    pub fn from_roster(npcs: &[Npc]) -> Self {
        let mut neighbours = npcs
            .iter()
            .filter(|n| n.alive && n.role == NpcRole::Neighbour)
            .map(LineMember::from_npc);
        let left = neighbours.next();
        let right = neighbours.next();
        let first = |role: NpcRole| {
            npcs.iter()
                .find(|n| n.alive && n.role == role)
                .map(LineMember::from_npc)
        };
        let nco = first(NpcRole::Nco);
        let officer = first(NpcRole::Officer);

        Self {
            left,
            right,
            nco_present: nco.as_ref().map(|n| n.in_line()).unwrap_or(false),
            nco,
            officer,
            line_integrity: MAX_LINE_INTEGRITY,
            line_morale: MAX_MORALE,
            casualties_this_turn: 0,
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &LineMember> {
        [&self.left, &self.right, &self.nco, &self.officer]
            .into_iter()
            .flatten()
    }

    pub fn members_mut(&mut self) -> impl Iterator<Item = &mut LineMember> {
        [
            &mut self.left,
            &mut self.right,
            &mut self.nco,
            &mut self.officer,
        ]
        .into_iter()
        .flatten()
    }

    /// Whoever stands at a neighbour post, alive or not
    pub fn at_post(&self, post: LinePost) -> Option<&LineMember> {
        match post {
            LinePost::Left => self.left.as_ref(),
            LinePost::Right => self.right.as_ref(),
        }
    }

    pub fn member(&self, npc_id: &NpcId) -> Option<&LineMember> {
        self.members().find(|m| &m.npc_id == npc_id)
    }

    pub fn member_mut(&mut self, npc_id: &NpcId) -> Option<&mut LineMember> {
        self.members_mut().find(|m| &m.npc_id == npc_id)
    }

    /// Integrity only ever drops through this helper
    pub fn lose_integrity(&mut self, amount: f64) -> f64 {
        let before = self.line_integrity;
        self.line_integrity = (self.line_integrity - amount.max(0.0)).clamp(0.0, MAX_LINE_INTEGRITY);
        self.line_integrity - before
    }

    pub fn change_line_morale(&mut self, delta: f64) {
        self.line_morale = (self.line_morale + delta).clamp(0.0, MAX_MORALE);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyQuality {
    Conscript,
    Line,
    Veteran,
}

impl EnemyQuality {
    /// Multiplier on strength lost to French fire
    pub fn fragility(&self) -> f64 {
        match self {
            EnemyQuality::Conscript => 1.2,
            EnemyQuality::Line => 1.0,
            EnemyQuality::Veteran => 0.8,
        }
    }

    /// Multiplier on return-fire intensity
    pub fn accuracy(&self) -> f64 {
        match self {
            EnemyQuality::Conscript => 0.8,
            EnemyQuality::Line => 1.0,
            EnemyQuality::Veteran => 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyState {
    /// Distance in paces
    pub range: f64,
    pub strength: f64,
    pub quality: EnemyQuality,
    pub morale: f64,
    pub line_integrity: f64,
    pub artillery: bool,
    pub cavalry_threat: bool,
}

impl EnemyState {
    pub fn new(range: f64, quality: EnemyQuality) -> Self {
        Self {
            range,
            strength: MAX_ENEMY_STRENGTH,
            quality,
            morale: MAX_MORALE,
            line_integrity: MAX_LINE_INTEGRITY,
            artillery: false,
            cavalry_threat: false,
        }
    }

    pub fn with_artillery(mut self) -> Self {
        self.artillery = true;
        self
    }

    pub fn with_cavalry_threat(mut self) -> Self {
        self.cavalry_threat = true;
        self
    }

    /// Strength and integrity only ever drop through these helpers
    pub fn lose_strength(&mut self, amount: f64) -> f64 {
        let before = self.strength;
        self.strength = (self.strength - amount.max(0.0)).clamp(0.0, MAX_ENEMY_STRENGTH);
        before - self.strength
    }

    pub fn lose_integrity(&mut self, amount: f64) {
        self.line_integrity =
            (self.line_integrity - amount.max(0.0)).clamp(0.0, MAX_LINE_INTEGRITY);
    }

    pub fn change_morale(&mut self, delta: f64) {
        self.morale = (self.morale + delta).clamp(0.0, MAX_MORALE);
    }
}

/// Rivoli-specific progress
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RivoliExt {
    pub battle_part: u8,
    pub battery_charged: bool,
    pub melee_stage: u8,
    pub wagon_damage: f64,
    pub wagon_detonated: bool,
    pub gorge_mercy_count: u32,
    pub gorge_target: Option<GorgeTarget>,
    pub officer_shot: bool,
}

/// La Favorita-specific progress
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritaExt {
    pub melee_stage: u8,
    pub causeway_held: bool,
    pub counter_charged: bool,
}

/// Per-battle extension data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "battle", rename_all = "camelCase")]
pub enum BattleExt {
    Rivoli(RivoliExt),
    Favorita(FavoritaExt),
}

impl BattleExt {
    pub fn battle_part(&self) -> u8 {
        match self {
            BattleExt::Rivoli(ext) => ext.battle_part,
            BattleExt::Favorita(_) => 1,
        }
    }

    pub fn set_battle_part(&mut self, part: u8) {
        if let BattleExt::Rivoli(ext) = self {
            ext.battle_part = part;
        }
    }

    pub fn melee_stage(&self) -> u8 {
        match self {
            BattleExt::Rivoli(ext) => ext.melee_stage,
            BattleExt::Favorita(ext) => ext.melee_stage,
        }
    }

    pub fn set_melee_stage(&mut self, stage: u8) {
        match self {
            BattleExt::Rivoli(ext) => ext.melee_stage = stage,
            BattleExt::Favorita(ext) => ext.melee_stage = stage,
        }
    }

    pub fn rivoli(&self) -> Option<&RivoliExt> {
        match self {
            BattleExt::Rivoli(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn rivoli_mut(&mut self) -> Option<&mut RivoliExt> {
        match self {
            BattleExt::Rivoli(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn favorita_mut(&mut self) -> Option<&mut FavoritaExt> {
        match self {
            BattleExt::Favorita(ext) => Some(ext),
            _ => None,
        }
    }
}

/// Complete battle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleState {
    pub battle_id: String,
    pub phase: BattlePhase,
    pub turn: Turn,
    pub drill_step: DrillStep,
    /// Index of the next volley in the current part's table
    pub volley_index: usize,
    pub player: BattlePlayer,
    pub line: LineState,
    pub enemy: EnemyState,
    pub log: Vec<LogEntry>,
    pub pending_morale_changes: Vec<MoraleChange>,
    pub melee_state: Option<MeleeState>,
    pub ext: BattleExt,
    /// Story beat awaiting a choice
    pub charge_encounter: Option<StoryBeatId>,
    pub last_load_result: Option<RollResult>,
    pub kills: u32,
    pub battle_over: bool,
    pub outcome: BattleOutcome,
}

impl BattleState {
    pub fn log(&mut self, kind: LogKind, text: impl Into<String>) {
        self.log.push(LogEntry::new(self.turn, kind, text));
    }

    /// Apply a morale change to the player and keep it for display
    pub fn apply_morale_change(&mut self, change: MoraleChange) {
        self.player.change_morale(change.amount as f64);
        self.pending_morale_changes.push(change);
    }

    pub fn set_phase(&mut self, phase: BattlePhase) {
        if self.phase != phase {
            tracing::debug!(battle = %self.battle_id, from = %self.phase, to = %phase, "Phase transition");
            self.phase = phase;
        }
    }

    /// End the battle; `battle_over` always comes with a decided outcome
    pub fn finish_battle(&mut self, outcome: BattleOutcome) {
        let outcome = if outcome == BattleOutcome::Pending {
            BattleOutcome::Defeat
        } else {
            outcome
        };
        self.battle_over = true;
        self.outcome = outcome;
        self.charge_encounter = None;
        self.melee_state = None;
        self.set_phase(BattlePhase::Complete);
        tracing::info!(battle = %self.battle_id, outcome = ?outcome, kills = self.kills, "Battle finished");
    }

    pub fn is_over(&self) -> bool {
        self.battle_over
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Npc> {
        vec![
            Npc::new("pierre", "Pierre", NpcRole::Neighbour, "Fusilier", 45),
            Npc::new("jb", "Jean-Baptiste", NpcRole::Neighbour, "Fusilier", 35),
            Npc::new("duval", "Duval", NpcRole::Nco, "Sergent", 55),
            Npc::new("leclerc", "Leclerc", NpcRole::Officer, "Capitaine", 60),
        ]
    }

    #[test]
    fn test_player_pools_clamp_immediately() {
        let character = PlayerCharacter::new("Jean");
        let mut player = BattlePlayer::from_character(&character, 3);
        assert_eq!(player.max_health, 75.0);

        player.change_health(-500.0);
        assert_eq!(player.health, 0.0);
        assert!(player.is_down());

        player.change_morale(50.0);
        assert_eq!(player.morale, MAX_MORALE);

        player.change_fatigue(-10.0);
        assert_eq!(player.fatigue, 0.0);

        player.change_soldier_rep(80);
        assert_eq!(player.soldier_rep, 100);
    }

    #[test]
    fn test_restore_to_half() {
        let character = PlayerCharacter::new("Jean");
        let mut player = BattlePlayer::from_character(&character, 3);
        player.change_health(-75.0);
        player.restore_to_half();
        assert_eq!(player.health, 38.0);
        assert_eq!(player.morale, 50.0);
    }

    #[test]
    fn test_line_from_roster() {
        let line = LineState::from_roster(&roster());
        assert_eq!(line.left.as_ref().unwrap().npc_id, NpcId::from("pierre"));
        assert_eq!(line.right.as_ref().unwrap().npc_id, NpcId::from("jb"));
        assert!(line.nco_present);
        assert_eq!(line.members().count(), 4);
    }

    #[test]
    fn test_line_skips_dead_npcs() {
        let mut npcs = roster();
        npcs[0].alive = false;
        npcs[2].alive = false;
        let line = LineState::from_roster(&npcs);
        assert_eq!(line.left.as_ref().unwrap().npc_id, NpcId::from("jb"));
        assert!(line.right.is_none());
        assert!(!line.nco_present);
    }

    #[test]
    fn test_integrity_never_rises() {
        let mut line = LineState::from_roster(&roster());
        let change = line.lose_integrity(-20.0);
        assert_eq!(change, 0.0);
        assert_eq!(line.line_integrity, 100.0);
        let change = line.lose_integrity(150.0);
        assert_eq!(change, -100.0);
        assert_eq!(line.line_integrity, 0.0);
    }

    #[test]
    fn test_ext_accessors() {
        let mut ext = BattleExt::Rivoli(RivoliExt {
            battle_part: 1,
            ..Default::default()
        });
        ext.set_melee_stage(2);
        assert_eq!(ext.battle_part(), 1);
        assert_eq!(ext.melee_stage(), 2);

        let fav = BattleExt::Favorita(FavoritaExt::default());
        assert_eq!(fav.battle_part(), 1);
        assert!(fav.rivoli().is_none());
    }
}
