//! The playable powers and game variants.

use serde::{Deserialize, Serialize};

use crate::judge::error::JudgeError;

/// The seven great powers of the standard map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Power {
    England,
    France,
    Germany,
    Italy,
    Austria,
    Turkey,
    Russia,
}

pub const POWERS: [Power; 7] = [
    Power::England,
    Power::France,
    Power::Germany,
    Power::Italy,
    Power::Austria,
    Power::Turkey,
    Power::Russia,
];

impl Power {
    pub fn name(self) -> &'static str {
        match self {
            Power::England => "England",
            Power::France => "France",
            Power::Germany => "Germany",
            Power::Italy => "Italy",
            Power::Austria => "Austria",
            Power::Turkey => "Turkey",
            Power::Russia => "Russia",
        }
    }

    pub fn parse(token: &str) -> Result<Power, JudgeError> {
        let token = token.trim();
        POWERS
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(token))
            .ok_or_else(|| JudgeError::UnknownPower(token.to_string()))
    }

    /// Units on the board at game start.
    pub fn start_units(self) -> u32 {
        match self {
            Power::Russia => 4,
            _ => 3,
        }
    }

    /// Home supply centers held at game start.
    pub fn start_centers(self) -> u32 {
        self.start_units()
    }
}

impl std::fmt::Display for Power {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Recognized rule variants.
///
/// Variant-specific maps and rosters are adjudicator territory; the service
/// records the variant and seats the standard roster for both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Standard,
    Machiavelli,
}

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Machiavelli => "machiavelli",
        }
    }

    pub fn parse(token: &str) -> Result<Variant, JudgeError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Variant::Standard),
            "machiavelli" => Ok(Variant::Machiavelli),
            other => Err(JudgeError::UnknownVariant(other.to_string())),
        }
    }

    pub fn powers(self) -> &'static [Power] {
        &POWERS
    }

    /// First phase of a freshly started game.
    pub fn start_phase(self) -> crate::judge::phase::Phase {
        crate::judge::phase::Phase::start()
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_parsing_is_case_insensitive() {
        assert_eq!(Power::parse("england").unwrap(), Power::England);
        assert_eq!(Power::parse("FRANCE").unwrap(), Power::France);
        assert_eq!(Power::parse(" Russia ").unwrap(), Power::Russia);
        assert!(Power::parse("Atlantis").is_err());
    }

    #[test]
    fn start_forces() {
        assert_eq!(Power::Russia.start_units(), 4);
        assert_eq!(Power::England.start_units(), 3);
        let total: u32 = POWERS.iter().map(|p| p.start_centers()).sum();
        assert_eq!(total, 22);
    }

    #[test]
    fn variant_parsing() {
        assert_eq!(Variant::parse("Standard").unwrap(), Variant::Standard);
        assert_eq!(Variant::parse("machiavelli").unwrap(), Variant::Machiavelli);
        assert!(Variant::parse("chaos").is_err());
        assert_eq!(Variant::Standard.powers().len(), 7);
    }
}
