//! Order syntax: the njudge order grammar, checked against the map table.
//!
//! Validation here is purely syntactic plus static map facts (known
//! provinces, terrain compatibility, builds on supply centers). Whether an
//! order is *legal* on the current board is the adjudicator's problem.

use serde::{Deserialize, Serialize};

use crate::judge::error::JudgeError;
use crate::map::{self, Location, Terrain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Army,
    Fleet,
}

impl UnitType {
    fn parse(token: &str) -> Option<UnitType> {
        match token {
            "A" | "ARMY" => Some(UnitType::Army),
            "F" | "FLEET" => Some(UnitType::Fleet),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            UnitType::Army => 'A',
            UnitType::Fleet => 'F',
        }
    }
}

/// A unit named in an order: type plus position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitRef {
    pub unit: UnitType,
    pub at: Location,
}

impl std::fmt::Display for UnitRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.unit.letter(), self.at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    Hold {
        unit: UnitRef,
    },
    Move {
        unit: UnitRef,
        to: Location,
        /// Explicit land route after `VIA`, empty for `VIA [CONVOY]`.
        route: Vec<Location>,
        convoyed: bool,
    },
    SupportHold {
        unit: UnitRef,
        target: UnitRef,
    },
    SupportMove {
        unit: UnitRef,
        target: UnitRef,
        to: Location,
    },
    Convoy {
        unit: UnitRef,
        target: UnitRef,
        to: Location,
    },
    Retreat {
        unit: UnitRef,
        to: Location,
    },
    Disband {
        unit: UnitRef,
    },
    Build {
        unit: UnitType,
        at: Location,
    },
    Remove {
        unit: UnitRef,
    },
    Waive,
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Hold { unit } => write!(f, "{unit} H"),
            Order::Move {
                unit,
                to,
                route,
                convoyed,
            } => {
                write!(f, "{unit} - {to}")?;
                if !route.is_empty() {
                    write!(f, " VIA")?;
                    for hop in route {
                        write!(f, " {hop}")?;
                    }
                } else if *convoyed {
                    write!(f, " VIA CONVOY")?;
                }
                Ok(())
            }
            Order::SupportHold { unit, target } => write!(f, "{unit} S {target}"),
            Order::SupportMove { unit, target, to } => {
                write!(f, "{unit} S {target} - {to}")
            }
            Order::Convoy { unit, target, to } => write!(f, "{unit} C {target} - {to}"),
            Order::Retreat { unit, to } => write!(f, "{unit} R {to}"),
            Order::Disband { unit } => write!(f, "{unit} D"),
            Order::Build { unit, at } => write!(f, "B {} {at}", unit.letter()),
            Order::Remove { unit } => write!(f, "R {unit}"),
            Order::Waive => write!(f, "WAIVE"),
        }
    }
}

/// One submitted line. `;` sequences orders that apply in succession,
/// `|` gives fallback alternatives within a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedOrder {
    pub steps: Vec<Vec<Order>>,
}

impl SubmittedOrder {
    /// The unconditional head order.
    pub fn primary(&self) -> &Order {
        &self.steps[0][0]
    }

    pub fn is_conditional(&self) -> bool {
        self.steps.len() > 1 || self.steps.iter().any(|alts| alts.len() > 1)
    }
}

impl std::fmt::Display for SubmittedOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let steps: Vec<String> = self
            .steps
            .iter()
            .map(|alts| {
                alts.iter()
                    .map(|o| o.to_string())
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect();
        f.write_str(&steps.join(" ; "))
    }
}

// --- Tokenizer ---

fn tokenize(text: &str) -> Vec<String> {
    text.to_ascii_uppercase()
        .replace("->", "-")
        .replace('-', " - ")
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

// --- Static map checks ---

fn check_position(unit: UnitType, loc: Location, what: &str) -> Result<(), JudgeError> {
    match (unit, loc.province.terrain) {
        (UnitType::Fleet, Terrain::Land) => Err(JudgeError::InvalidOrder(format!(
            "fleet {what} {} is landlocked",
            loc.province.abbrev
        ))),
        (UnitType::Army, Terrain::Sea) => Err(JudgeError::InvalidOrder(format!(
            "army {what} {} is open sea",
            loc.province.abbrev
        ))),
        _ => {
            if unit == UnitType::Army && loc.coast.is_some() {
                return Err(JudgeError::InvalidOrder(format!(
                    "armies take no coast qualifier at {}",
                    loc.province.abbrev
                )));
            }
            Ok(())
        }
    }
}

// --- Parser ---

struct Tokens<'a> {
    toks: &'a [String],
    pos: usize,
    line: &'a str,
}

impl<'a> Tokens<'a> {
    fn peek(&self) -> Option<&str> {
        self.toks.get(self.pos).map(|s| s.as_str())
    }

    fn bump(&mut self) -> Option<&'a str> {
        let t = self.toks.get(self.pos).map(|s| s.as_str());
        self.pos += 1;
        t
    }

    fn done(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn err(&self, what: &str) -> JudgeError {
        JudgeError::InvalidOrder(format!("{what} in {:?}", self.line.trim()))
    }

    fn location(&mut self, what: &str) -> Result<Location, JudgeError> {
        match self.bump() {
            Some("-") | None => Err(self.err(&format!("missing {what}"))),
            Some(tok) => {
                map::resolve(tok).ok_or_else(|| self.err(&format!("unknown province {tok:?}")))
            }
        }
    }

    fn dash(&mut self) -> Result<(), JudgeError> {
        match self.bump() {
            Some("-") | Some("TO") => Ok(()),
            _ => Err(self.err("expected -")),
        }
    }

    fn unit_ref(&mut self, what: &str) -> Result<UnitRef, JudgeError> {
        let unit = self
            .bump()
            .and_then(UnitType::parse)
            .ok_or_else(|| self.err(&format!("expected unit type for {what}")))?;
        let at = self.location(&format!("{what} origin"))?;
        check_position(unit, at, "position")?;
        Ok(UnitRef { unit, at })
    }
}

fn parse_simple(line: &str) -> Result<Order, JudgeError> {
    let toks = tokenize(line);
    let mut t = Tokens {
        toks: &toks,
        pos: 0,
        line,
    };
    let bad_unit = |t: &Tokens, tok: &str| t.err(&format!("unknown unit type {tok:?}"));

    let order = match t.bump() {
        None => return Err(t.err("empty order")),
        Some("WAIVE") => Order::Waive,
        Some("B") | Some("BUILD") => {
            let unit = t
                .bump()
                .and_then(UnitType::parse)
                .ok_or_else(|| t.err("expected unit type after build"))?;
            let at = t.location("build site")?;
            parse_build(&t, unit, at)?
        }
        // `R F BRE` removes a unit in the build phase; a leading unit type
        // means a retreat is spelled `A PAR R BUR` instead.
        Some("R") | Some("REMOVE") if t.peek().and_then(UnitType::parse).is_some() => {
            let unit = t.unit_ref("removal")?;
            Order::Remove { unit }
        }
        Some(tok) => {
            let unit_type =
                UnitType::parse(tok).ok_or_else(|| bad_unit(&t, tok))?;
            let at = t.location("origin")?;
            check_position(unit_type, at, "position")?;
            let unit = UnitRef {
                unit: unit_type,
                at,
            };
            match t.bump() {
                // Bare `F LON` is the short build form.
                None => parse_build(&t, unit_type, at)?,
                Some("H") | Some("HOLD") | Some("HOLDS") => Order::Hold { unit },
                Some("-") => {
                    let to = t.location("destination")?;
                    check_position(unit_type, to, "destination")?;
                    let (route, convoyed) = parse_via(&mut t)?;
                    Order::Move {
                        unit,
                        to,
                        route,
                        convoyed,
                    }
                }
                Some("S") | Some("SUPPORT") | Some("SUPPORTS") => {
                    let target = t.unit_ref("supported unit")?;
                    if t.done() {
                        Order::SupportHold { unit, target }
                    } else {
                        t.dash()?;
                        let to = t.location("supported destination")?;
                        check_position(target.unit, to, "destination")?;
                        Order::SupportMove { unit, target, to }
                    }
                }
                Some("C") | Some("CONVOY") | Some("CONVOYS") => {
                    if unit_type != UnitType::Fleet {
                        return Err(t.err("only fleets convoy"));
                    }
                    let target = t.unit_ref("convoyed unit")?;
                    t.dash()?;
                    let to = t.location("convoy destination")?;
                    check_position(target.unit, to, "destination")?;
                    Order::Convoy { unit, target, to }
                }
                Some("R") | Some("RETREAT") | Some("RETREATS") => {
                    let to = t.location("retreat destination")?;
                    check_position(unit_type, to, "destination")?;
                    Order::Retreat { unit, to }
                }
                Some("D") | Some("DISBAND") => Order::Disband { unit },
                Some(other) => {
                    return Err(t.err(&format!("unknown directive {other:?}")))
                }
            }
        }
    };

    if !t.done() {
        return Err(t.err("trailing tokens"));
    }
    Ok(order)
}

fn parse_build(t: &Tokens, unit: UnitType, at: Location) -> Result<Order, JudgeError> {
    if !at.province.supply_center {
        return Err(t.err(&format!(
            "build site {} is not a supply center",
            at.province.abbrev
        )));
    }
    check_position(unit, at, "build site")?;
    Ok(Order::Build { unit, at })
}

/// Optional `VIA` tail on a move: `VIA CONVOY`, bare `VIA`, or an explicit
/// province route (`A VIE - GAL VIA MUN BOH SIL`).
fn parse_via(t: &mut Tokens) -> Result<(Vec<Location>, bool), JudgeError> {
    if t.done() {
        return Ok((Vec::new(), false));
    }
    match t.bump() {
        Some("VIA") => {}
        _ => return Err(t.err("expected VIA or end of order")),
    }
    if t.done() {
        return Ok((Vec::new(), true));
    }
    if t.peek() == Some("CONVOY") {
        t.bump();
        if !t.done() {
            return Err(t.err("trailing tokens after VIA CONVOY"));
        }
        return Ok((Vec::new(), true));
    }
    let mut route = Vec::new();
    while !t.done() {
        route.push(t.location("route province")?);
    }
    Ok((route, false))
}

/// Parse a full order line, including `;`/`|` conditional structure.
pub fn parse_line(line: &str) -> Result<SubmittedOrder, JudgeError> {
    let mut steps = Vec::new();
    for step in line.split(';') {
        let mut alternatives = Vec::new();
        for alt in step.split('|') {
            alternatives.push(parse_simple(alt)?);
        }
        steps.push(alternatives);
    }
    Ok(SubmittedOrder { steps })
}

/// True when the line parses. The RPC-level yes/no check.
pub fn validate(line: &str) -> bool {
    parse_line(line).is_ok()
}

/// Per-line outcome of parsing an order block.
#[derive(Debug)]
pub struct ParsedLine {
    pub text: String,
    pub result: Result<SubmittedOrder, JudgeError>,
}

/// Parse a newline-separated order block, skipping blanks and `#` comments.
pub fn parse_block(text: &str) -> Vec<ParsedLine> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| ParsedLine {
            text: l.to_string(),
            result: parse_line(l),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(line: &str) -> SubmittedOrder {
        parse_line(line).unwrap_or_else(|e| panic!("{line:?} should parse: {e}"))
    }

    #[test]
    fn movement_orders() {
        assert!(matches!(*ok("F LON - NTH").primary(), Order::Move { .. }));
        assert!(matches!(*ok("A PAR-BUR").primary(), Order::Move { .. }));
        assert!(matches!(*ok("F NWG H").primary(), Order::Hold { .. }));
        assert!(matches!(
            *ok("F BRE S A PAR - BUR").primary(),
            Order::SupportMove { .. }
        ));
        assert!(matches!(
            *ok("F NWG S F NTH").primary(),
            Order::SupportHold { .. }
        ));
        assert!(matches!(
            *ok("F NTH C A LON - BEL").primary(),
            Order::Convoy { .. }
        ));
    }

    #[test]
    fn via_forms() {
        match ok("A VIE - GAL VIA MUN BOH SIL").primary() {
            Order::Move { route, convoyed, .. } => {
                assert_eq!(route.len(), 3);
                assert!(!convoyed);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
        match ok("A LON - NWY VIA").primary() {
            Order::Move { convoyed, .. } => assert!(convoyed),
            other => panic!("unexpected parse: {other:?}"),
        }
        match ok("a lon-nwy VIA convoy").primary() {
            Order::Move { convoyed, .. } => assert!(convoyed),
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn retreat_and_build_orders() {
        assert!(matches!(*ok("A PAR R BUR").primary(), Order::Retreat { .. }));
        assert!(matches!(*ok("A PAR D").primary(), Order::Disband { .. }));
        assert!(matches!(*ok("B F LON").primary(), Order::Build { .. }));
        assert!(matches!(*ok("F STP/NC").primary(), Order::Build { .. }));
        assert!(matches!(*ok("A PAR").primary(), Order::Build { .. }));
        assert!(matches!(*ok("R F BRE").primary(), Order::Remove { .. }));
        assert!(matches!(*ok("WAIVE").primary(), Order::Waive));
    }

    #[test]
    fn case_insensitive() {
        for line in ["f lon-nth", "A Par-Bur", "F Nth C a Lon-nwy"] {
            assert!(validate(line), "{line:?} should validate");
        }
    }

    #[test]
    fn conditional_chains() {
        let chain = ok("F LON-NTH ; F NWG-NTH | F LON-ENG");
        assert!(chain.is_conditional());
        assert_eq!(chain.steps.len(), 2);
        assert_eq!(chain.steps[1].len(), 2);

        let deep = ok("A PAR-BUR ; A BUR-RUH ; A RUH-KIE ; A KIE-BER");
        assert_eq!(deep.steps.len(), 4);
        assert!(!ok("A PAR - BUR").is_conditional());
    }

    #[test]
    fn syntax_errors() {
        let invalid = [
            "X LON - NTH",   // unknown unit type
            "F - NTH",       // missing origin
            "F LON -",       // missing destination
            "F LON ZZZ NTH", // unknown directive
            "F LON-MOON",    // unknown province
            "F NOWHERE",     // unknown build site
            "A",             // missing location
            "NONSENSE",      // not an order
            "A SIL",         // build off a supply center
        ];
        for line in invalid {
            assert!(!validate(line), "{line:?} should be rejected");
        }
    }

    #[test]
    fn terrain_mismatches() {
        // Fleets stay off landlocked provinces, armies out of open sea.
        assert!(!validate("F BRE - PAR"));
        assert!(!validate("F PAR - BRE"));
        assert!(!validate("A LON - NTH"));
        assert!(!validate("A STP/SC - BOT"));
    }

    #[test]
    fn block_parsing_reports_each_line() {
        let block = "F LON-NTH\n\n# winter plans\nA LVP-YOR\nX EDI-NWG";
        let lines = parse_block(block);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].result.is_ok());
        assert!(lines[1].result.is_ok());
        assert!(lines[2].result.is_err());
    }

    #[test]
    fn canonical_display() {
        assert_eq!(ok("f lon - nth").to_string(), "F LON - NTH");
        assert_eq!(
            ok("F BRE s A PAR-BUR").to_string(),
            "F BRE S A PAR - BUR"
        );
        assert_eq!(ok("a lon-nwy via convoy").to_string(), "A LON - NWY VIA CONVOY");
        assert_eq!(ok("b f stp/nc").to_string(), "B F STP/NC");
    }
}
