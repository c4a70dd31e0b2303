//! Persistence integration tests: saves, migration, Glory and profiles

use little_soldier::battle::BattleOutcome;
use little_soldier::campaign::*;
use little_soldier::content::ContentRegistry;
use little_soldier::core::config::EngineTuning;
use little_soldier::persistence::*;
use proptest::prelude::*;
use serde_json::{json, Value};

fn new_game() -> GameState {
    let registry = ContentRegistry::standard();
    create_new_game("Jean", &[(Stat::Musketry, 5)], registry.campaign("italy").unwrap()).unwrap()
}

/// A 0.3.0 envelope for a game that has reached La Favorita
fn legacy_save(game: &GameState) -> String {
    let mut state = serde_json::to_value(game).unwrap();
    let campaign = state["campaign"].as_object_mut().unwrap();
    campaign.remove("campaignId");
    campaign.remove("sequenceIndex");
    campaign.remove("npcDeaths");
    campaign.remove("replacementsUsed");
    campaign.insert("battleIndex".into(), json!(1));
    campaign.insert("currentBattle".into(), json!("Favorita"));
    campaign.insert("phase".into(), json!("PreBattleCamp"));

    json!({"version": "0.3.0", "gameState": state, "timestamp": 0}).to_string()
}

#[test]
fn test_legacy_save_migrated_and_rewritten() {
    let game = new_game();
    let mut storage = MemoryStorage::new();
    storage.set(SAVE_KEY, &legacy_save(&game)).unwrap();
    let mut service = SaveService::new(storage);

    let loaded = service.load_game().unwrap();
    assert_eq!(loaded.campaign.campaign_id, "italy");
    assert_eq!(loaded.campaign.sequence_index, 2);
    assert_eq!(loaded.campaign.current_battle, "favorita");
    assert_eq!(loaded.campaign.phase, CampaignPhase::PreBattleCamp);
    assert!(loaded.campaign.npc_deaths.is_empty());
    assert_eq!(loaded.player, game.player);

    let raw = service.storage().get(SAVE_KEY).unwrap().unwrap();
    let envelope: SaveEnvelope = serde_json::from_str(&raw).unwrap();
    assert_eq!(envelope.version, SAVE_VERSION);
    assert!(envelope.game_state["campaign"].get("battleIndex").is_none());
    assert!(envelope.timestamp > 0);

    // the migrated save is the one that loads from now on
    assert_eq!(service.load_game().unwrap(), loaded);
}

#[test]
fn test_migrated_campaign_is_playable() {
    let registry = ContentRegistry::standard();
    let tuning = EngineTuning::default();
    let mut storage = MemoryStorage::new();
    storage.set(SAVE_KEY, &legacy_save(&new_game())).unwrap();
    let mut service = SaveService::new(storage);
    let mut game = service.load_game().unwrap();

    game.camp_state = Some(create_camp_state(CampKind::PreBattle, &tuning.camp));
    assert_eq!(leave_camp(&mut game, &registry, &tuning).unwrap(), CampaignPhase::Battle);
    assert_eq!(game.battle_state.as_ref().unwrap().battle_id, "favorita");
}

#[test]
fn test_incompatible_versions_ignored() {
    let mut storage = MemoryStorage::new();
    let envelope = json!({"version": "0.2.0", "gameState": serde_json::to_value(new_game()).unwrap(), "timestamp": 0});
    storage.set(SAVE_KEY, &envelope.to_string()).unwrap();
    let mut service = SaveService::new(storage);

    assert!(service.load_game().is_none());
    // left in place, not overwritten
    assert!(service.has_save());
}

#[test]
fn test_permadeath_deletes_save() {
    let registry = ContentRegistry::standard();
    let tuning = EngineTuning::default();
    let mut service = SaveService::new(MemoryStorage::new());
    let mut game = new_game();
    start_battle(&mut game, &registry, &tuning).unwrap();
    assert!(service.save_game(&game));
    assert!(service.has_save());

    let battle = game.battle_state.as_mut().unwrap();
    battle.player.alive = false;
    battle.finish_battle(BattleOutcome::Defeat);
    conclude_battle(&mut game, &registry, &tuning).unwrap();

    assert!(!service.save_game(&game));
    assert!(!service.has_save());
    assert!(service.load_game().is_none());
}

#[test]
fn test_death_mid_battle_deletes_save() {
    let registry = ContentRegistry::standard();
    let tuning = EngineTuning::default();
    let mut service = SaveService::new(MemoryStorage::new());
    let mut game = new_game();
    start_battle(&mut game, &registry, &tuning).unwrap();
    assert!(service.save_game(&game));

    game.battle_state.as_mut().unwrap().player.alive = false;
    assert!(game.player.alive);
    assert!(!service.save_game(&game));
    assert!(!service.has_save());
    assert!(service.load_game().is_none());
}

#[test]
fn test_stored_mid_battle_death_is_purged_on_load() {
    let registry = ContentRegistry::standard();
    let tuning = EngineTuning::default();
    let mut game = new_game();
    start_battle(&mut game, &registry, &tuning).unwrap();
    game.battle_state.as_mut().unwrap().player.alive = false;
    let envelope = SaveEnvelope {
        version: SAVE_VERSION.to_string(),
        game_state: serde_json::to_value(&game).unwrap(),
        timestamp: 1,
    };
    let mut storage = MemoryStorage::new();
    storage.set(SAVE_KEY, &serde_json::to_string(&envelope).unwrap()).unwrap();
    let mut service = SaveService::new(storage);

    assert!(service.load_game().is_none());
    assert!(!service.has_save());
}

#[test]
fn test_dead_player_in_storage_is_purged_on_load() {
    let mut game = new_game();
    game.player.alive = false;
    let envelope = SaveEnvelope {
        version: SAVE_VERSION.to_string(),
        game_state: serde_json::to_value(&game).unwrap(),
        timestamp: 1,
    };
    let mut storage = MemoryStorage::new();
    storage.set(SAVE_KEY, &serde_json::to_string(&envelope).unwrap()).unwrap();
    let mut service = SaveService::new(storage);

    assert!(service.load_game().is_none());
    assert!(!service.has_save());
}

#[test]
fn test_battle_in_progress_survives_a_save() {
    let registry = ContentRegistry::standard();
    let tuning = EngineTuning::default();
    let mut service = SaveService::new(MemoryStorage::new());
    let mut game = new_game();
    start_battle(&mut game, &registry, &tuning).unwrap();

    assert!(service.save_game(&game));
    let loaded = service.load_game().unwrap();
    let (saved, restored) = (game.battle_state.as_ref().unwrap(), loaded.battle_state.as_ref().unwrap());
    assert_eq!(restored.battle_id, saved.battle_id);
    assert_eq!(restored.phase, saved.phase);
    assert_eq!(restored.log.len(), saved.log.len());
    assert_eq!(restored.line.member(&"pierre".into()).map(|m| m.alive), Some(true));
    assert_eq!(loaded.campaign.phase, CampaignPhase::Battle);
}

#[test]
fn test_profiles_are_namespaced() {
    let mut service = SaveService::new(MemoryStorage::new());
    let game = new_game();

    service.set_profile(Some(2));
    assert!(service.save_game(&game));
    service.add_glory(7);
    assert!(service.storage().contains(&namespaced_key(SAVE_KEY, Some(2))));
    assert!(!service.storage().contains(SAVE_KEY));

    service.set_profile(Some(1));
    assert!(!service.has_save());
    assert_eq!(service.load_glory(), 0);

    service.set_profile(Some(4));
    assert_eq!(service.profile(), None);
    assert!(!service.has_save());

    assert_eq!(service.with_profile(Some(2), |s| s.load_glory()), 7);
}

#[test]
fn test_glory_and_profile_records() {
    let mut service = SaveService::new(MemoryStorage::new());
    service.set_profile(Some(3));

    assert_eq!(service.add_glory(5), 5);
    assert_eq!(service.add_glory(-2), 3);
    assert_eq!(service.add_glory(-10), 0);

    record_glory(service.storage_mut(), 3, "Jean", 5).unwrap();
    let profiles = load_profiles(service.storage());
    assert_eq!(profiles.len(), MAX_PROFILES as usize);
    assert_eq!(profiles[2].lifetime_glory, 5);
    assert!(profiles[0].is_empty());
}

#[test]
fn test_file_storage_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let game = new_game();
    {
        let mut service = SaveService::new(FileStorage::new(dir.path()).unwrap());
        service.set_profile(Some(1));
        assert!(service.save_game(&game));
        assert_eq!(service.save_glory(12.4), 12);
    }

    let mut service = SaveService::new(FileStorage::new(dir.path()).unwrap());
    service.set_profile(Some(1));
    assert_eq!(service.load_game().unwrap(), game);
    assert_eq!(service.load_glory(), 12);

    service.delete_save();
    assert!(!service.has_save());
    assert!(service.storage().get("bad key!").is_err());
}

#[test]
fn test_failing_storage_never_panics() {
    let mut service = SaveService::new(MemoryStorage::failing());
    assert!(!service.save_game(&new_game()));
    assert!(service.load_game().is_none());
    assert_eq!(service.add_glory(3), 3);
    assert_eq!(service.load_glory(), 0);
    assert_eq!(load_profiles(service.storage()).len(), 3);
}

proptest! {
    #[test]
    fn prop_glory_is_never_negative(deltas in prop::collection::vec(-50i64..50, 0..20)) {
        let mut service = SaveService::new(MemoryStorage::new());
        let mut expected: i64 = 0;
        for delta in deltas {
            expected = (expected + delta).max(0);
            let total = service.add_glory(delta);
            prop_assert_eq!(total as i64, expected);
            prop_assert_eq!(service.load_glory(), total);
        }
    }

    #[test]
    fn prop_migration_is_idempotent(battle_index in 0u64..3, name in "[A-Z][a-z]{0,8}") {
        let mut state = json!({
            "campaign": {"battleIndex": battle_index, "currentBattle": name}
        });
        migrate_v030_to_v040(&mut state);
        let once = state.clone();
        migrate_v030_to_v040(&mut state);
        prop_assert_eq!(&state, &once);
        prop_assert_eq!(&state["campaign"]["currentBattle"], &Value::from(name.to_lowercase()));
    }
}
