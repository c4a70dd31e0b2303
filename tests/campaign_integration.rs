//! Campaign integration tests: roster upkeep, camps and the battle sequence

use little_soldier::battle::{advance, auto_command, BattleOutcome};
use little_soldier::campaign::*;
use little_soldier::content::ContentRegistry;
use little_soldier::core::config::EngineTuning;
use little_soldier::core::error::CampaignError;
use little_soldier::core::types::NpcId;
use little_soldier::stats::{RngRolls, RollSource, ScriptedRolls};
use proptest::prelude::*;

fn ids(npcs: &[Npc]) -> Vec<&str> {
    npcs.iter().map(|n| n.id.as_str()).collect()
}

#[test]
fn test_dead_neighbours_replaced_by_role() {
    let registry = ContentRegistry::standard();
    let italy = registry.campaign("italy").unwrap();

    let deaths = [NpcId::from("pierre"), NpcId::from("jean_baptiste")];
    let (roster, used) = replace_dead_npcs(&italy.roster, &deaths, &italy.replacement_pool, &[]);

    assert_eq!(
        ids(&roster),
        vec!["rep_matthieu", "rep_etienne", "sergeant_duval", "captain_leclerc"]
    );
    assert_eq!(used, vec![NpcId::from("rep_matthieu"), NpcId::from("rep_etienne")]);
    assert!(roster.iter().all(|n| n.alive));
}

#[test]
fn test_dead_officer_without_replacement_removed() {
    let registry = ContentRegistry::standard();
    let italy = registry.campaign("italy").unwrap();

    let deaths = [NpcId::from("captain_leclerc")];
    let (roster, used) = replace_dead_npcs(&italy.roster, &deaths, &italy.replacement_pool, &[]);

    assert_eq!(roster.len(), 3);
    assert!(roster.iter().all(|n| n.role != NpcRole::Officer));
    assert!(used.is_empty());
}

#[test]
fn test_pool_exhausts_across_battles() {
    let registry = ContentRegistry::standard();
    let italy = registry.campaign("italy").unwrap();

    let (roster, first) = replace_dead_npcs(
        &italy.roster,
        &[NpcId::from("pierre")],
        &italy.replacement_pool,
        &[],
    );
    let (roster, second) = replace_dead_npcs(&roster, &[NpcId::from("rep_matthieu")], &italy.replacement_pool, &first);
    assert_eq!(second, vec![NpcId::from("rep_etienne")]);

    let mut used = first.clone();
    used.extend(second);
    let (roster, third) = replace_dead_npcs(&roster, &[NpcId::from("rep_etienne")], &italy.replacement_pool, &used);
    assert!(third.is_empty());
    assert_eq!(ids(&roster), vec!["jean_baptiste", "sergeant_duval", "captain_leclerc"]);
}

/// Spend every camp action, answering events with their first choice
fn run_camp(game: &mut GameState, tuning: &EngineTuning, rolls: &mut dyn RollSource) {
    for _ in 0..50 {
        let camp = game.camp_state.as_ref().unwrap();
        if let Some(event) = camp.pending_event {
            let choice = event.choices()[0].id;
            let lines = game.camp_event_choice(choice, rolls).unwrap();
            assert!(!lines.is_empty());
        } else if camp.actions_remaining > 0 {
            game.camp_activity(&CampActivity::WriteLetter, tuning, rolls).unwrap();
        } else {
            break;
        }
    }
    assert!(game.camp_state.as_ref().unwrap().is_finished());
}

fn win_current_battle(game: &mut GameState, kills: u32) {
    let battle = game.battle_state.as_mut().unwrap();
    battle.kills = kills;
    battle.finish_battle(BattleOutcome::Victory);
}

#[test]
fn test_full_campaign() {
    let registry = ContentRegistry::standard();
    let tuning = EngineTuning::default();
    let mut rolls = ScriptedRolls::new();
    let mut game = create_new_game("Jean", &[(Stat::Valor, 5)], registry.campaign("italy").unwrap()).unwrap();

    assert_eq!(game.campaign.current_battle, "rivoli");
    assert_eq!(game.campaign.next_battle.as_deref(), Some("favorita"));

    start_battle(&mut game, &registry, &tuning).unwrap();
    win_current_battle(&mut game, 4);
    let summary = conclude_battle(&mut game, &registry, &tuning).unwrap();
    assert_eq!(summary.battle_id, "rivoli");
    assert_eq!(summary.glory_earned, 4);
    assert!(!summary.campaign_complete);
    assert_eq!(game.campaign.phase, CampaignPhase::PostBattleCamp);
    assert_eq!(game.camp_state.as_ref().unwrap().kind, CampKind::PostBattle);

    run_camp(&mut game, &tuning, &mut rolls);
    let camp = game.camp_state.as_ref().unwrap();
    assert!(camp.triggered_events.contains(&CampEventId::BuryTheDead));

    assert_eq!(leave_camp(&mut game, &registry, &tuning).unwrap(), CampaignPhase::Interlude);
    let italy = registry.campaign("italy").unwrap();
    let interlude = get_current_interlude(&game.campaign, italy).unwrap();
    assert_eq!(interlude.key, "rivoli-favorita");
    assert_eq!(game.campaign.days_in_campaign, 3);

    assert_eq!(end_interlude(&mut game, &registry, &tuning).unwrap(), CampaignPhase::PreBattleCamp);
    assert_eq!(game.campaign.current_battle, "favorita");
    assert!(is_last_battle(&game.campaign, italy));
    run_camp(&mut game, &tuning, &mut rolls);
    assert!(game
        .camp_state
        .as_ref()
        .unwrap()
        .triggered_events
        .contains(&CampEventId::SergeantsInspection));

    assert_eq!(leave_camp(&mut game, &registry, &tuning).unwrap(), CampaignPhase::Battle);
    assert_eq!(game.battle_state.as_ref().unwrap().battle_id, "favorita");
    win_current_battle(&mut game, 2);
    let summary = conclude_battle(&mut game, &registry, &tuning).unwrap();

    assert!(summary.campaign_complete);
    assert_eq!(game.campaign.phase, CampaignPhase::Complete);
    assert_eq!(game.campaign.battles_completed, 2);
    assert_eq!(game.campaign.days_in_campaign, 4);
    assert!(game.camp_state.is_none());
    assert!(game.battle_state.is_none());

    let err = start_battle(&mut game, &registry, &tuning).unwrap_err();
    assert!(matches!(err, CampaignError::WrongPhase { .. }));
}

#[test]
fn test_pending_event_blocks_leaving() {
    let registry = ContentRegistry::standard();
    let tuning = EngineTuning::default();
    let mut rolls = ScriptedRolls::new();
    let mut game = create_new_game("Jean", &[], registry.campaign("italy").unwrap()).unwrap();
    start_battle(&mut game, &registry, &tuning).unwrap();
    win_current_battle(&mut game, 0);
    conclude_battle(&mut game, &registry, &tuning).unwrap();

    for _ in 0..3 {
        game.camp_activity(&CampActivity::WriteLetter, &tuning, &mut rolls).unwrap();
    }
    assert_eq!(
        game.camp_state.as_ref().unwrap().pending_event,
        Some(CampEventId::BuryTheDead)
    );
    assert_eq!(
        leave_camp(&mut game, &registry, &tuning).unwrap_err(),
        CampaignError::EventPending
    );
    assert_eq!(
        game.camp_activity(&CampActivity::WriteLetter, &tuning, &mut rolls).unwrap_err(),
        CampaignError::EventPending
    );

    game.camp_event_choice("say_words", &mut rolls).unwrap();
    assert_eq!(game.player.soldier_rep, 53);
    assert_eq!(leave_camp(&mut game, &registry, &tuning).unwrap(), CampaignPhase::Interlude);
}

#[test]
fn test_back_to_back_battles_march_through_an_empty_interlude() {
    let mut registry = ContentRegistry::standard();
    let mut config = registry.campaign("italy").unwrap().clone();
    config.id = "forced_march".into();
    config.sequence = vec![CampaignEntry::battle("rivoli"), CampaignEntry::battle("favorita")];
    registry.register_campaign(config);
    let config = registry.campaign("forced_march").unwrap();
    let tuning = EngineTuning::default();
    let mut rolls = ScriptedRolls::new();
    let mut game = create_new_game("Jean", &[], config).unwrap();

    start_battle(&mut game, &registry, &tuning).unwrap();
    win_current_battle(&mut game, 1);
    conclude_battle(&mut game, &registry, &tuning).unwrap();
    run_camp(&mut game, &tuning, &mut rolls);

    assert_eq!(leave_camp(&mut game, &registry, &tuning).unwrap(), CampaignPhase::Interlude);
    assert!(get_current_interlude(&game.campaign, config).is_none());
    assert_eq!(game.campaign.days_in_campaign, 1);
    assert_eq!(end_interlude(&mut game, &registry, &tuning).unwrap(), CampaignPhase::PreBattleCamp);
    assert_eq!(game.campaign.current_battle, "favorita");
}

#[test]
fn test_player_death_ends_the_run() {
    let registry = ContentRegistry::standard();
    let tuning = EngineTuning::default();
    let mut game = create_new_game("Jean", &[], registry.campaign("italy").unwrap()).unwrap();
    start_battle(&mut game, &registry, &tuning).unwrap();

    let battle = game.battle_state.as_mut().unwrap();
    battle.player.alive = false;
    battle.finish_battle(BattleOutcome::Defeat);
    let summary = conclude_battle(&mut game, &registry, &tuning).unwrap();

    assert!(!summary.player_alive);
    assert!(!game.player.alive);
    assert_eq!(game.campaign.phase, CampaignPhase::Battle);
    assert!(game.camp_state.is_none());
    assert_eq!(
        start_battle(&mut game, &registry, &tuning).unwrap_err(),
        CampaignError::WrongPhase {
            expected: "Prologue or PreBattleCamp",
            actual: CampaignPhase::Battle,
        }
    );
}

#[test]
fn test_auto_played_campaign_stays_consistent() {
    let registry = ContentRegistry::standard();
    let tuning = EngineTuning::default();

    for seed in 0..5 {
        let mut rolls = RngRolls::seeded(seed);
        let mut game = create_new_game("Jean", &[(Stat::Constitution, 5)], registry.campaign("italy").unwrap()).unwrap();
        start_battle(&mut game, &registry, &tuning).unwrap();

        for _ in 0..2 {
            let battle_id = game.campaign.current_battle.clone();
            let config = registry.battle(&battle_id).unwrap();
            let battle = game.battle_state.as_mut().unwrap();
            while let Some(command) = auto_command(battle, config, &tuning) {
                advance(battle, config, &tuning, &mut rolls, command).unwrap();
            }
            let summary = conclude_battle(&mut game, &registry, &tuning).unwrap();

            assert_eq!(summary.battle_id, battle_id);
            assert!(game.npcs.iter().all(|n| !summary.npc_deaths.contains(&n.id)));
            assert!(game.npcs.len() <= 4);
            if !summary.player_alive || summary.campaign_complete {
                break;
            }

            run_camp(&mut game, &tuning, &mut rolls);
            leave_camp(&mut game, &registry, &tuning).unwrap();
            end_interlude(&mut game, &registry, &tuning).unwrap();
            run_camp(&mut game, &tuning, &mut rolls);
            leave_camp(&mut game, &registry, &tuning).unwrap();
            assert!(game.npcs.iter().all(|n| n.alive && !n.wounded));
        }
    }
}

proptest! {
    #[test]
    fn prop_replacement_is_deterministic(mask in 0u8..16) {
        let registry = ContentRegistry::standard();
        let italy = registry.campaign("italy").unwrap();
        let deaths: Vec<NpcId> = italy
            .roster
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, n)| n.id.clone())
            .collect();

        let first = replace_dead_npcs(&italy.roster, &deaths, &italy.replacement_pool, &[]);
        let second = replace_dead_npcs(&italy.roster, &deaths, &italy.replacement_pool, &[]);
        prop_assert_eq!(&first, &second);

        let (roster, used) = first;
        prop_assert_eq!(roster.len(), italy.roster.len() - deaths.len() + used.len());
        prop_assert!(roster.iter().all(|n| !deaths.contains(&n.id)));
        for (i, id) in used.iter().enumerate() {
            prop_assert!(!used[i + 1..].contains(id));
        }
        // survivors keep their order
        let survivors: Vec<&NpcId> = italy.roster.iter().map(|n| &n.id).filter(|id| !deaths.contains(id)).collect();
        let kept: Vec<&NpcId> = roster.iter().map(|n| &n.id).filter(|id| !used.contains(id)).collect();
        prop_assert_eq!(survivors, kept);
    }
}
