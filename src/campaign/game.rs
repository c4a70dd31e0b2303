//! Whole-game state and the campaign-level commands that move it along
//!
//! `GameState` is what gets saved. The commands here enforce the campaign
//! phase; the pure transitions in `campaign::state` do not.

use serde::{Deserialize, Serialize};

use crate::battle::execution::create_battle_state;
use crate::battle::state::{BattleOutcome, BattleState};
use crate::campaign::camp::{
    create_camp_state, perform_activity, resolve_camp_event, ActivityReport, CampActivity, CampKind, CampState,
};
use crate::campaign::character::{create_character, PlayerCharacter, Stat};
use crate::campaign::npc::{replace_dead_npcs, Npc};
use crate::campaign::state::{
    advance_to_interlude, advance_to_post_battle, advance_to_pre_battle_camp, begin_battle, create_campaign_state,
    CampaignConfig, CampaignPhase, CampaignState,
};
use crate::content::ContentRegistry;
use crate::core::config::EngineTuning;
use crate::core::error::CampaignError;
use crate::core::types::NpcId;
use crate::stats::rolls::RollSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub player: PlayerCharacter,
    pub npcs: Vec<Npc>,
    pub campaign: CampaignState,
    #[serde(default)]
    pub battle_state: Option<BattleState>,
    #[serde(default)]
    pub camp_state: Option<CampState>,
}

impl GameState {
    fn expect_phase(&self, expected: &'static str, ok: bool) -> Result<(), CampaignError> {
        if ok {
            Ok(())
        } else {
            Err(CampaignError::WrongPhase {
                expected,
                actual: self.campaign.phase,
            })
        }
    }

    /// Spend a camp action
    pub fn camp_activity(
        &mut self,
        activity: &CampActivity,
        tuning: &EngineTuning,
        rolls: &mut dyn RollSource,
    ) -> Result<ActivityReport, CampaignError> {
        let camp = self.camp_state.as_mut().ok_or(CampaignError::NoCamp)?;
        perform_activity(camp, &mut self.player, &mut self.npcs, activity, &tuning.camp, rolls)
    }

    /// Answer the pending camp event
    pub fn camp_event_choice(&mut self, choice: &str, rolls: &mut dyn RollSource) -> Result<Vec<String>, CampaignError> {
        let camp = self.camp_state.as_mut().ok_or(CampaignError::NoCamp)?;
        resolve_camp_event(camp, &mut self.player, &mut self.npcs, choice, rolls)
    }
}

/// Start a new run: fresh character, the campaign roster, the prologue
pub fn create_new_game(
    name: &str,
    allocation: &[(Stat, u32)],
    config: &CampaignConfig,
) -> Result<GameState, CampaignError> {
    let player = create_character(name, allocation)?;
    tracing::info!(player = %player.name, campaign = %config.id, "New game");
    Ok(GameState {
        player,
        npcs: config.roster.clone(),
        campaign: create_campaign_state(config),
        battle_state: None,
        camp_state: None,
    })
}

/// March from the prologue or the pre-battle camp into the current battle
pub fn start_battle(
    game: &mut GameState,
    registry: &ContentRegistry,
    tuning: &EngineTuning,
) -> Result<(), CampaignError> {
    let phase = game.campaign.phase;
    game.expect_phase(
        "Prologue or PreBattleCamp",
        matches!(phase, CampaignPhase::Prologue | CampaignPhase::PreBattleCamp),
    )?;
    if !game.player.alive {
        return Err(CampaignError::PlayerDead);
    }
    if game.camp_state.as_ref().is_some_and(|c| c.pending_event.is_some()) {
        return Err(CampaignError::EventPending);
    }

    let config = registry.campaign(&game.campaign.campaign_id)?;
    let campaign = begin_battle(&game.campaign, config);
    let battle = registry.battle(&campaign.current_battle)?;

    game.battle_state = Some(create_battle_state(battle, &game.player, &game.npcs, tuning));
    game.camp_state = None;
    game.campaign = campaign;
    Ok(())
}

/// What a finished battle meant for the campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleSummary {
    pub battle_id: String,
    pub outcome: BattleOutcome,
    /// One Glory per kill
    pub glory_earned: u32,
    pub npc_deaths: Vec<NpcId>,
    pub replacements: Vec<NpcId>,
    pub player_alive: bool,
    pub campaign_complete: bool,
}

/// Fold a finished battle back into the campaign
///
/// Reputation and Grace return to the character, line casualties to the
/// roster. The dead are replaced from the pool by role. A surviving player
/// moves on to the post-battle camp, or to the end of the campaign.
pub fn conclude_battle(
    game: &mut GameState,
    registry: &ContentRegistry,
    tuning: &EngineTuning,
) -> Result<BattleSummary, CampaignError> {
    game.expect_phase("Battle", game.campaign.phase == CampaignPhase::Battle)?;
    let battle = game.battle_state.as_ref().ok_or(CampaignError::NoBattle)?;
    if !battle.battle_over {
        return Err(CampaignError::BattleNotOver);
    }
    let config = registry.campaign(&game.campaign.campaign_id)?;

    let player = &mut game.player;
    player.soldier_rep = battle.player.soldier_rep;
    player.officer_rep = battle.player.officer_rep;
    player.napoleon_rep = battle.player.napoleon_rep;
    player.grace = battle.player.grace;
    player.alive = battle.player.alive;

    let mut deaths: Vec<NpcId> = Vec::new();
    for member in battle.line.members() {
        if let Some(npc) = game.npcs.iter_mut().find(|n| n.id == member.npc_id) {
            if npc.alive && !member.alive {
                deaths.push(npc.id.clone());
            }
            npc.alive = member.alive;
            npc.wounded = member.wounded;
            npc.morale = member.morale;
            npc.relationship = member.relationship;
        }
    }

    let (npcs, replacements) =
        replace_dead_npcs(&game.npcs, &deaths, &config.replacement_pool, &game.campaign.replacements_used);
    game.npcs = npcs;
    game.campaign.npc_deaths.extend(deaths.iter().cloned());
    game.campaign.replacements_used.extend(replacements.iter().cloned());

    let battle_id = battle.battle_id.clone();
    let (outcome, kills) = (battle.outcome, battle.kills);
    game.battle_state = None;

    if game.player.alive {
        game.campaign = advance_to_post_battle(&game.campaign, config);
        if game.campaign.phase == CampaignPhase::PostBattleCamp {
            game.camp_state = Some(create_camp_state(CampKind::PostBattle, &tuning.camp));
        }
    }

    tracing::info!(
        battle = %battle_id,
        outcome = ?outcome,
        glory = kills,
        deaths = deaths.len(),
        replacements = replacements.len(),
        "Battle concluded"
    );

    Ok(BattleSummary {
        battle_id,
        outcome,
        glory_earned: kills,
        npc_deaths: deaths,
        replacements,
        player_alive: game.player.alive,
        campaign_complete: game.campaign.phase == CampaignPhase::Complete,
    })
}

/// Break camp: after a battle march into the interlude, before one march to
/// the field
pub fn leave_camp(
    game: &mut GameState,
    registry: &ContentRegistry,
    tuning: &EngineTuning,
) -> Result<CampaignPhase, CampaignError> {
    let camp = game.camp_state.as_ref().ok_or(CampaignError::NoCamp)?;
    if camp.pending_event.is_some() {
        return Err(CampaignError::EventPending);
    }

    match game.campaign.phase {
        CampaignPhase::PostBattleCamp => {
            let config = registry.campaign(&game.campaign.campaign_id)?;
            game.campaign = advance_to_interlude(&game.campaign, config);
            game.camp_state = None;
        }
        CampaignPhase::PreBattleCamp => start_battle(game, registry, tuning)?,
        actual => {
            return Err(CampaignError::WrongPhase {
                expected: "PostBattleCamp or PreBattleCamp",
                actual,
            })
        }
    }
    Ok(game.campaign.phase)
}

/// Finish the march; the wounded are back on their feet by the next camp
pub fn end_interlude(
    game: &mut GameState,
    registry: &ContentRegistry,
    tuning: &EngineTuning,
) -> Result<CampaignPhase, CampaignError> {
    game.expect_phase("Interlude", game.campaign.phase == CampaignPhase::Interlude)?;
    let config = registry.campaign(&game.campaign.campaign_id)?;
    game.campaign = advance_to_pre_battle_camp(&game.campaign, config);
    for npc in game.npcs.iter_mut().filter(|n| n.alive) {
        npc.wounded = false;
        npc.morale = npc.max_morale;
    }
    if game.campaign.phase == CampaignPhase::PreBattleCamp {
        game.camp_state = Some(create_camp_state(CampKind::PreBattle, &tuning.camp));
    }
    Ok(game.campaign.phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::rolls::ScriptedRolls;

    fn new_game(registry: &ContentRegistry) -> GameState {
        create_new_game("Jean", &[(Stat::Valor, 10)], registry.campaign("italy").unwrap()).unwrap()
    }

    #[test]
    fn test_new_game_starts_in_prologue() {
        let registry = ContentRegistry::standard();
        let game = new_game(&registry);
        assert_eq!(game.campaign.phase, CampaignPhase::Prologue);
        assert_eq!(game.player.stats.valor, 40);
        assert_eq!(game.npcs.len(), 4);
        assert!(game.battle_state.is_none());
    }

    #[test]
    fn test_start_battle_builds_state() {
        let registry = ContentRegistry::standard();
        let tuning = EngineTuning::default();
        let mut game = new_game(&registry);

        start_battle(&mut game, &registry, &tuning).unwrap();
        assert_eq!(game.campaign.phase, CampaignPhase::Battle);
        assert_eq!(game.battle_state.as_ref().unwrap().battle_id, "rivoli");

        let err = start_battle(&mut game, &registry, &tuning).unwrap_err();
        assert!(matches!(err, CampaignError::WrongPhase { .. }));
    }

    #[test]
    fn test_conclude_requires_finished_battle() {
        let registry = ContentRegistry::standard();
        let tuning = EngineTuning::default();
        let mut game = new_game(&registry);
        start_battle(&mut game, &registry, &tuning).unwrap();

        assert_eq!(
            conclude_battle(&mut game, &registry, &tuning).unwrap_err(),
            CampaignError::BattleNotOver
        );
    }

    #[test]
    fn test_conclude_writes_back_and_opens_camp() {
        let registry = ContentRegistry::standard();
        let tuning = EngineTuning::default();
        let mut game = new_game(&registry);
        start_battle(&mut game, &registry, &tuning).unwrap();

        let battle = game.battle_state.as_mut().unwrap();
        battle.kills = 3;
        battle.player.change_soldier_rep(10);
        battle.line.right.as_mut().unwrap().alive = false;
        battle.finish_battle(BattleOutcome::Victory);

        let summary = conclude_battle(&mut game, &registry, &tuning).unwrap();
        assert_eq!(summary.glory_earned, 3);
        assert_eq!(summary.npc_deaths, vec![NpcId::from("jean_baptiste")]);
        assert_eq!(summary.replacements, vec![NpcId::from("rep_matthieu")]);
        assert_eq!(game.player.soldier_rep, 60);
        assert_eq!(game.campaign.phase, CampaignPhase::PostBattleCamp);
        assert!(game.camp_state.is_some());
        assert!(game.battle_state.is_none());
        assert_eq!(game.npcs[1].id, NpcId::from("rep_matthieu"));
    }

    #[test]
    fn test_camp_to_interlude_to_camp() {
        let registry = ContentRegistry::standard();
        let tuning = EngineTuning::default();
        let mut game = new_game(&registry);
        start_battle(&mut game, &registry, &tuning).unwrap();
        game.battle_state.as_mut().unwrap().finish_battle(BattleOutcome::Victory);
        conclude_battle(&mut game, &registry, &tuning).unwrap();

        let mut rolls = ScriptedRolls::new();
        game.camp_activity(&CampActivity::WriteLetter, &tuning, &mut rolls).unwrap();

        assert_eq!(leave_camp(&mut game, &registry, &tuning).unwrap(), CampaignPhase::Interlude);
        assert!(game.camp_state.is_none());
        assert_eq!(end_interlude(&mut game, &registry, &tuning).unwrap(), CampaignPhase::PreBattleCamp);
        assert!(game.camp_state.is_some());

        assert_eq!(leave_camp(&mut game, &registry, &tuning).unwrap(), CampaignPhase::Battle);
        assert_eq!(game.battle_state.as_ref().unwrap().battle_id, "favorita");
    }
}
