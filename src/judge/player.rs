//! Registered players and the seats they control.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::map::power::Power;

pub type PlayerId = u32;

/// Per-player notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub notifications: bool,
    pub deadline_reminders: bool,
    pub order_confirmation: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            notifications: true,
            deadline_reminders: true,
            order_confirmation: true,
        }
    }
}

/// A registered account in the player directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    /// Primary address; all delivery goes here.
    pub email: String,
    /// Linked alternate addresses that resolve to this account.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl PlayerRecord {
    pub fn matches_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(email))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Active,
    CivilDisorder,
    Abandoned,
    Eliminated,
    Resigned,
}

impl SeatStatus {
    pub fn name(self) -> &'static str {
        match self {
            SeatStatus::Active => "ACTIVE",
            SeatStatus::CivilDisorder => "CIVIL_DISORDER",
            SeatStatus::Abandoned => "ABANDONED",
            SeatStatus::Eliminated => "ELIMINATED",
            SeatStatus::Resigned => "RESIGNED",
        }
    }

    /// Seats still in the game for vote counting.
    pub fn in_play(self) -> bool {
        !matches!(self, SeatStatus::Eliminated | SeatStatus::Resigned)
    }
}

/// A declared away window; orders are not expected inside it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Absence {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

/// One power slot in a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub power: Power,
    /// Controlling player, None while the power is unowned.
    pub player: Option<PlayerId>,
    pub status: SeatStatus,
    pub units: u32,
    pub centers: u32,
    /// Deliberate hold on processing (`SET WAIT`).
    #[serde(default)]
    pub wait: bool,
    #[serde(default)]
    pub absence: Option<Absence>,
    /// Powers this seat refuses press from (`NO PRESS FROM <power>`).
    #[serde(default)]
    pub press_blocked: Vec<Power>,
    /// Blanket press opt-out (`NO PRESS`).
    #[serde(default)]
    pub press_muted: bool,
}

impl Seat {
    pub fn unowned(power: Power) -> Seat {
        Seat {
            power,
            player: None,
            status: SeatStatus::Active,
            units: 0,
            centers: 0,
            wait: false,
            absence: None,
            press_blocked: Vec::new(),
            press_muted: false,
        }
    }

    pub fn is_owned(&self) -> bool {
        self.player.is_some()
    }

    pub fn accepts_press_from(&self, from: Power) -> bool {
        !self.press_muted && !self.press_blocked.contains(&from)
    }

    pub fn block_press_from(&mut self, from: Power) {
        if !self.press_blocked.contains(&from) {
            self.press_blocked.push(from);
        }
    }

    pub fn unblock_press_from(&mut self, from: Power) {
        self.press_blocked.retain(|p| *p != from);
    }
}
