//! The turn calendar: compact phase strings like `S1901M` and their
//! fixed succession. Which phases actually occur in a given turn (e.g. a
//! retreat phase with no dislodgements) is the adjudicator's call.

use serde::{Deserialize, Serialize};

use crate::judge::error::JudgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Fall,
    Winter,
}

impl Season {
    pub fn letter(self) -> char {
        match self {
            Season::Spring => 'S',
            Season::Fall => 'F',
            Season::Winter => 'W',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }

    fn from_letter(c: char) -> Option<Season> {
        match c.to_ascii_uppercase() {
            'S' => Some(Season::Spring),
            'F' => Some(Season::Fall),
            'W' => Some(Season::Winter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Movement,
    Retreat,
    Build,
}

impl PhaseKind {
    pub fn letter(self) -> char {
        match self {
            PhaseKind::Movement => 'M',
            PhaseKind::Retreat => 'R',
            PhaseKind::Build => 'B',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PhaseKind::Movement => "Movement",
            PhaseKind::Retreat => "Retreat",
            PhaseKind::Build => "Build",
        }
    }

    fn from_letter(c: char) -> Option<PhaseKind> {
        match c.to_ascii_uppercase() {
            'M' => Some(PhaseKind::Movement),
            'R' => Some(PhaseKind::Retreat),
            'B' => Some(PhaseKind::Build),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phase {
    pub season: Season,
    pub year: u16,
    pub kind: PhaseKind,
}

impl Phase {
    pub fn new(season: Season, year: u16, kind: PhaseKind) -> Phase {
        Phase { season, year, kind }
    }

    /// Spring 1901 Movement, where every standard game opens.
    pub fn start() -> Phase {
        Phase::new(Season::Spring, 1901, PhaseKind::Movement)
    }

    /// Parse a compact phase string, e.g. `F1901M`.
    pub fn parse(s: &str) -> Result<Phase, JudgeError> {
        let s = s.trim();
        let bad = || JudgeError::InvalidPhase(s.to_string());
        if s.len() != 6 || !s.is_ascii() {
            return Err(bad());
        }
        let mut chars = s.chars();
        let season = Season::from_letter(chars.next().ok_or_else(bad)?).ok_or_else(bad)?;
        let year: u16 = s[1..5].parse().map_err(|_| bad())?;
        let kind = PhaseKind::from_letter(chars.nth(4).ok_or_else(bad)?).ok_or_else(bad)?;
        // The calendar never pairs Winter with anything but builds, nor
        // Spring/Fall with builds.
        match (season, kind) {
            (Season::Winter, PhaseKind::Build) => {}
            (Season::Winter, _) | (_, PhaseKind::Build) => return Err(bad()),
            _ => {}
        }
        Ok(Phase::new(season, year, kind))
    }

    /// The phase that follows this one on the calendar:
    /// `S M -> S R -> F M -> F R -> W B -> next year S M`.
    pub fn next(self) -> Phase {
        match (self.season, self.kind) {
            (Season::Spring, PhaseKind::Movement) => {
                Phase::new(Season::Spring, self.year, PhaseKind::Retreat)
            }
            (Season::Spring, _) => Phase::new(Season::Fall, self.year, PhaseKind::Movement),
            (Season::Fall, PhaseKind::Movement) => {
                Phase::new(Season::Fall, self.year, PhaseKind::Retreat)
            }
            (Season::Fall, _) => Phase::new(Season::Winter, self.year, PhaseKind::Build),
            (Season::Winter, _) => {
                Phase::new(Season::Spring, self.year + 1, PhaseKind::Movement)
            }
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{:04}{}",
            self.season.letter(),
            self.year,
            self.kind.letter()
        )
    }
}

/// Season long name for an optional phase, `Unknown` when unset or garbled.
/// Mirrors what state reports show for a game that has not begun.
pub fn season_name(phase: Option<&Phase>) -> &'static str {
    phase.map(|p| p.season.name()).unwrap_or("Unknown")
}

/// Year for an optional phase; 1901 when the game has not begun.
pub fn year_or_default(phase: Option<&Phase>) -> u16 {
    phase.map(|p| p.year).unwrap_or(1901)
}
