//! Service-wide error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("unknown game: {0}")]
    UnknownGame(String),

    #[error("unknown backup: {0}")]
    UnknownBackup(String),

    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("unknown power: {0}")]
    UnknownPower(String),

    #[error("unknown variant: {0}")]
    UnknownVariant(String),

    #[error("invalid phase string: {0}")]
    InvalidPhase(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("already registered: {0}")]
    AlreadyRegistered(String),

    #[error("power {0} is already controlled")]
    PowerTaken(String),

    #[error("game {0} has already started")]
    AlreadyStarted(String),

    #[error("game {0} has not started")]
    NotStarted(String),

    #[error("game {0} is paused")]
    Paused(String),

    #[error("game {0} is finished")]
    Finished(String),

    #[error("press is not allowed: {0}")]
    PressBlocked(String),

    #[error("master authorization required")]
    NotMaster,

    #[error("unsupported setting: {0}")]
    UnsupportedSetting(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, JudgeError>;
