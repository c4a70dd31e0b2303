use thiserror::Error;

use crate::battle::state::BattlePhase;
use crate::campaign::state::CampaignPhase;

/// Registry lookups that reference content which was never registered.
///
/// These are programmer errors: content is validated at startup with
/// `validate_battle_config` and `validate_campaign`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown battle: {0}")]
    UnknownBattle(String),

    #[error("Unknown campaign: {0}")]
    UnknownCampaign(String),

    #[error("Unknown melee encounter: {0}")]
    UnknownEncounter(String),

    #[error("Unknown story beat: {0:?}")]
    UnknownStoryBeat(crate::battle::state::StoryBeatId),

    #[error("Battle {battle} has no part {part}")]
    UnknownBattlePart { battle: String, part: u8 },

    #[error("Invalid tuning: {0}")]
    InvalidTuning(String),
}

/// Commands rejected by the battle engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BattleError {
    #[error("Battle is already over")]
    BattleOver,

    #[error("Command requires phase {expected:?}, battle is in {actual:?}")]
    WrongPhase {
        expected: BattlePhase,
        actual: BattlePhase,
    },

    #[error("Volley {index} does not exist in part {part}")]
    VolleyOutOfRange { part: u8, index: usize },

    #[error("Part {0} is not fought with scripted volleys")]
    NotScriptedPart(u8),

    #[error("Part {0} is not a gorge part")]
    NotGorgePart(u8),

    #[error("No story beat is pending")]
    NoPendingBeat,

    #[error("Unknown choice: {0}")]
    UnknownChoice(String),

    #[error("Choice not available: {0}")]
    ChoiceUnavailable(String),

    #[error("Melee state missing while in melee phase")]
    NoMeleeState,

    #[error("Action not available: {0}")]
    ActionUnavailable(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Commands rejected by the campaign and camp engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CampaignError {
    #[error("Command requires campaign phase {expected}, campaign is in {actual:?}")]
    WrongPhase {
        expected: &'static str,
        actual: CampaignPhase,
    },

    #[error("No camp in progress")]
    NoCamp,

    #[error("No battle in progress")]
    NoBattle,

    #[error("Battle is not over yet")]
    BattleNotOver,

    #[error("The player is dead")]
    PlayerDead,

    #[error("A camp event must be resolved first")]
    EventPending,

    #[error("No camp event is pending")]
    NoPendingEvent,

    #[error("No camp actions remaining")]
    NoActionsRemaining,

    #[error("Activity not available: {0}")]
    ActivityUnavailable(String),

    #[error("Invalid stat allocation: {0}")]
    InvalidAllocation(String),

    #[error("Not enough glory: need {needed}, have {available}")]
    NotEnoughGlory { needed: u32, available: u32 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error(transparent)]
    Campaign(#[from] CampaignError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
