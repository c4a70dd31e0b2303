//! The Italian campaign: Rivoli, the march to Mantua, La Favorita

use ahash::AHashMap;

use crate::campaign::npc::{Npc, NpcRole};
use crate::campaign::state::{interlude_key, CampaignConfig, CampaignEntry, InterludeDef};
use crate::content::{favorita, rivoli};

pub const CAMPAIGN_ID: &str = "italy";

fn roster() -> Vec<Npc> {
    vec![
        Npc::new("pierre", "Pierre", NpcRole::Neighbour, "Fusilier", 55).with_relationship(20),
        Npc::new("jean_baptiste", "Jean-Baptiste", NpcRole::Neighbour, "Fusilier", 30).with_relationship(10),
        Npc::new("sergeant_duval", "Sergeant Duval", NpcRole::Nco, "Sergent", 65),
        Npc::new("captain_leclerc", "Captain Leclerc", NpcRole::Officer, "Capitaine", 70),
    ]
}

fn replacement_pool() -> Vec<Npc> {
    vec![
        Npc::new("rep_matthieu", "Matthieu", NpcRole::Neighbour, "Fusilier", 40),
        Npc::new("rep_etienne", "Étienne", NpcRole::Neighbour, "Fusilier", 35),
        Npc::new("rep_sergeant_roux", "Sergeant Roux", NpcRole::Nco, "Sergent", 55),
    ]
}

fn interludes() -> AHashMap<String, InterludeDef> {
    let key = interlude_key(rivoli::BATTLE_ID, favorita::BATTLE_ID);
    let march = InterludeDef {
        key: key.clone(),
        title: "The March to Mantua".into(),
        narrative: vec![
            "There is no rest after Rivoli. The half-brigade is on the road before the dead are buried.".into(),
            "You march all night and all the next day, thirty leagues in the snow and mud, to reach Mantua before Provera.".into(),
        ],
        days: 2,
    };
    let mut map = AHashMap::new();
    map.insert(key, march);
    map
}

pub fn italy() -> CampaignConfig {
    CampaignConfig {
        id: CAMPAIGN_ID.into(),
        name: "The Army of Italy, 1797".into(),
        sequence: vec![
            CampaignEntry::battle(rivoli::BATTLE_ID),
            CampaignEntry::interlude(rivoli::BATTLE_ID, favorita::BATTLE_ID),
            CampaignEntry::battle(favorita::BATTLE_ID),
        ],
        interludes: interludes(),
        roster: roster(),
        replacement_pool: replacement_pool(),
    }
}
