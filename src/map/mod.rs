//! Standard-map reference data: provinces, abbreviations, named coasts.
//!
//! This is lookup data only — adjacency and movement legality live in the
//! external adjudicator, not here.

pub mod power;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::map::power::Power;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    /// Landlocked: armies only.
    Land,
    /// Open sea: fleets only.
    Sea,
    /// Coastal land: armies and fleets.
    Coastal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coast {
    North,
    South,
    East,
}

impl Coast {
    pub fn parse(token: &str) -> Option<Coast> {
        match token.to_ascii_uppercase().as_str() {
            "NC" => Some(Coast::North),
            "SC" => Some(Coast::South),
            "EC" => Some(Coast::East),
            _ => None,
        }
    }

    pub fn abbrev(self) -> &'static str {
        match self {
            Coast::North => "NC",
            Coast::South => "SC",
            Coast::East => "EC",
        }
    }
}

/// One space on the board.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Province {
    pub abbrev: &'static str,
    pub name: &'static str,
    pub terrain: Terrain,
    pub supply_center: bool,
    /// Home power for home supply centers.
    pub home: Option<Power>,
    /// Named coasts, for the few split-coast provinces.
    pub coasts: &'static [Coast],
}

use Coast::{East as EC, North as NC, South as SC};
use Terrain::{Coastal, Land, Sea};

const NO_COASTS: &[Coast] = &[];

macro_rules! prov {
    ($ab:literal, $name:literal, $terrain:expr) => {
        Province {
            abbrev: $ab,
            name: $name,
            terrain: $terrain,
            supply_center: false,
            home: None,
            coasts: NO_COASTS,
        }
    };
    ($ab:literal, $name:literal, $terrain:expr, sc) => {
        Province {
            abbrev: $ab,
            name: $name,
            terrain: $terrain,
            supply_center: true,
            home: None,
            coasts: NO_COASTS,
        }
    };
    ($ab:literal, $name:literal, $terrain:expr, sc, $home:expr) => {
        Province {
            abbrev: $ab,
            name: $name,
            terrain: $terrain,
            supply_center: true,
            home: Some($home),
            coasts: NO_COASTS,
        }
    };
}

/// The 75 spaces of the standard map: 56 land/coastal, 19 sea.
pub static PROVINCES: &[Province] = &[
    // --- Sea spaces ---
    prov!("ADR", "Adriatic Sea", Sea),
    prov!("AEG", "Aegean Sea", Sea),
    prov!("BAL", "Baltic Sea", Sea),
    prov!("BAR", "Barents Sea", Sea),
    prov!("BLA", "Black Sea", Sea),
    prov!("BOT", "Gulf of Bothnia", Sea),
    prov!("EAS", "Eastern Mediterranean", Sea),
    prov!("ENG", "English Channel", Sea),
    prov!("GOL", "Gulf of Lyon", Sea),
    prov!("HEL", "Helgoland Bight", Sea),
    prov!("ION", "Ionian Sea", Sea),
    prov!("IRI", "Irish Sea", Sea),
    prov!("MAO", "Mid-Atlantic Ocean", Sea),
    prov!("NAO", "North Atlantic Ocean", Sea),
    prov!("NTH", "North Sea", Sea),
    prov!("NWG", "Norwegian Sea", Sea),
    prov!("SKA", "Skagerrak", Sea),
    prov!("TYS", "Tyrrhenian Sea", Sea),
    prov!("WES", "Western Mediterranean", Sea),
    // --- England ---
    prov!("LON", "London", Coastal, sc, Power::England),
    prov!("EDI", "Edinburgh", Coastal, sc, Power::England),
    prov!("LVP", "Liverpool", Coastal, sc, Power::England),
    prov!("YOR", "Yorkshire", Coastal),
    prov!("WAL", "Wales", Coastal),
    prov!("CLY", "Clyde", Coastal),
    // --- France ---
    prov!("PAR", "Paris", Land, sc, Power::France),
    prov!("BRE", "Brest", Coastal, sc, Power::France),
    prov!("MAR", "Marseilles", Coastal, sc, Power::France),
    prov!("BUR", "Burgundy", Land),
    prov!("GAS", "Gascony", Coastal),
    prov!("PIC", "Picardy", Coastal),
    // --- Germany ---
    prov!("BER", "Berlin", Coastal, sc, Power::Germany),
    prov!("KIE", "Kiel", Coastal, sc, Power::Germany),
    prov!("MUN", "Munich", Land, sc, Power::Germany),
    prov!("RUH", "Ruhr", Land),
    prov!("PRU", "Prussia", Coastal),
    prov!("SIL", "Silesia", Land),
    // --- Italy ---
    prov!("ROM", "Rome", Coastal, sc, Power::Italy),
    prov!("NAP", "Naples", Coastal, sc, Power::Italy),
    prov!("VEN", "Venice", Coastal, sc, Power::Italy),
    prov!("TUS", "Tuscany", Coastal),
    prov!("PIE", "Piedmont", Coastal),
    prov!("APU", "Apulia", Coastal),
    // --- Austria ---
    prov!("VIE", "Vienna", Land, sc, Power::Austria),
    prov!("BUD", "Budapest", Land, sc, Power::Austria),
    prov!("TRI", "Trieste", Coastal, sc, Power::Austria),
    prov!("TYR", "Tyrolia", Land),
    prov!("BOH", "Bohemia", Land),
    prov!("GAL", "Galicia", Land),
    // --- Turkey ---
    prov!("CON", "Constantinople", Coastal, sc, Power::Turkey),
    prov!("ANK", "Ankara", Coastal, sc, Power::Turkey),
    prov!("SMY", "Smyrna", Coastal, sc, Power::Turkey),
    prov!("ARM", "Armenia", Coastal),
    prov!("SYR", "Syria", Coastal),
    // --- Russia ---
    prov!("MOS", "Moscow", Land, sc, Power::Russia),
    prov!("WAR", "Warsaw", Land, sc, Power::Russia),
    prov!("SEV", "Sevastopol", Coastal, sc, Power::Russia),
    Province {
        abbrev: "STP",
        name: "St Petersburg",
        terrain: Coastal,
        supply_center: true,
        home: Some(Power::Russia),
        coasts: &[NC, SC],
    },
    prov!("UKR", "Ukraine", Land),
    prov!("LVN", "Livonia", Coastal),
    prov!("FIN", "Finland", Coastal),
    // --- Neutral supply centers ---
    prov!("NWY", "Norway", Coastal, sc),
    prov!("SWE", "Sweden", Coastal, sc),
    prov!("DEN", "Denmark", Coastal, sc),
    prov!("HOL", "Holland", Coastal, sc),
    prov!("BEL", "Belgium", Coastal, sc),
    Province {
        abbrev: "SPA",
        name: "Spain",
        terrain: Coastal,
        supply_center: true,
        home: None,
        coasts: &[NC, SC],
    },
    prov!("POR", "Portugal", Coastal, sc),
    prov!("TUN", "Tunis", Coastal, sc),
    prov!("SER", "Serbia", Land, sc),
    prov!("RUM", "Rumania", Coastal, sc),
    Province {
        abbrev: "BUL",
        name: "Bulgaria",
        terrain: Coastal,
        supply_center: true,
        home: None,
        coasts: &[EC, SC],
    },
    prov!("GRE", "Greece", Coastal, sc),
    // --- Neutral non-centers ---
    prov!("ALB", "Albania", Coastal),
    prov!("NAF", "North Africa", Coastal),
];

static BY_KEY: Lazy<HashMap<String, &'static Province>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for p in PROVINCES {
        index.insert(p.abbrev.to_ascii_lowercase(), p);
        index.insert(p.name.to_ascii_lowercase(), p);
    }
    index
});

/// A province reference as written in an order, e.g. `STP/SC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub province: &'static Province,
    pub coast: Option<Coast>,
}

impl Location {
    pub fn abbrev(&self) -> String {
        match self.coast {
            Some(c) => format!("{}/{}", self.province.abbrev, c.abbrev()),
            None => self.province.abbrev.to_string(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.abbrev())
    }
}

/// Resolve a province token, case-insensitive, by abbreviation or full name.
/// Accepts a coast qualifier (`STP/SC`) only on provinces that declare it.
pub fn resolve(token: &str) -> Option<Location> {
    let token = token.trim();
    let (base, coast_token) = match token.split_once('/') {
        Some((base, coast)) => (base, Some(coast)),
        None => (token, None),
    };
    let province = *BY_KEY.get(base.trim().to_ascii_lowercase().as_str())?;
    let coast = match coast_token {
        Some(c) => {
            let coast = Coast::parse(c.trim())?;
            if !province.coasts.contains(&coast) {
                return None;
            }
            Some(coast)
        }
        None => None,
    };
    Some(Location { province, coast })
}

/// Total supply centers on the map (34 on the standard map).
pub fn supply_center_count() -> usize {
    PROVINCES.iter().filter(|p| p.supply_center).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_totals() {
        assert_eq!(PROVINCES.len(), 75);
        assert_eq!(supply_center_count(), 34);
        let home_centers = PROVINCES.iter().filter(|p| p.home.is_some()).count();
        assert_eq!(home_centers, 22);
    }

    #[test]
    fn resolve_by_abbrev_and_name() {
        let lon = resolve("LON").unwrap();
        assert_eq!(lon.province.name, "London");
        assert!(lon.coast.is_none());

        let paris = resolve("paris").unwrap();
        assert_eq!(paris.province.abbrev, "PAR");
        assert_eq!(paris.province.terrain, Terrain::Land);
    }

    #[test]
    fn resolve_coast_qualifiers() {
        let stp = resolve("STP/SC").unwrap();
        assert_eq!(stp.province.abbrev, "STP");
        assert_eq!(stp.coast, Some(Coast::South));
        assert_eq!(stp.abbrev(), "STP/SC");

        let bul = resolve("bul/ec").unwrap();
        assert_eq!(bul.coast, Some(Coast::East));

        // LON has no named coasts.
        assert!(resolve("LON/NC").is_none());
        // SPA has no east coast.
        assert!(resolve("SPA/EC").is_none());
    }

    #[test]
    fn unknown_provinces_rejected() {
        assert!(resolve("MOON").is_none());
        assert!(resolve("").is_none());
        assert!(resolve("NOWHERE").is_none());
    }
}
