//! One game: seats, configuration, phase bookkeeping, votes, and the
//! orders collected for the current turn.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::judge::error::JudgeError;
use crate::judge::orders::{self, ParsedLine};
use crate::judge::phase::Phase;
use crate::judge::player::{PlayerId, Seat, SeatStatus};
use crate::map::power::{Power, Variant};

/// Press visibility. Modes are mutually exclusive: setting one clears the
/// others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressRules {
    None,
    #[default]
    White,
    Grey,
}

impl PressRules {
    pub fn name(self) -> &'static str {
        match self {
            PressRules::None => "none",
            PressRules::White => "white",
            PressRules::Grey => "grey",
        }
    }

    pub fn parse(token: &str) -> Result<PressRules, JudgeError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(PressRules::None),
            "white" => Ok(PressRules::White),
            "grey" | "gray" => Ok(PressRules::Grey),
            other => Err(JudgeError::UnsupportedSetting(format!("press {other:?}"))),
        }
    }
}

/// Entry requirements carried on the game record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AccessRequirements {
    /// Dedication fraction, stored as an integer percentage.
    pub dedication_pct: i32,
    pub ontime_rating: f64,
    pub resistance_rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Accepting registrations; the board is not set up yet.
    Forming,
    Active,
    Paused,
    Finished,
}

impl GameStatus {
    pub fn name(self) -> &'static str {
        match self {
            GameStatus::Forming => "forming",
            GameStatus::Active => "active",
            GameStatus::Paused => "paused",
            GameStatus::Finished => "finished",
        }
    }
}

/// Game master credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Master {
    pub email: String,
    pub password: Option<String>,
}

/// Outcome of an order submission.
#[derive(Debug)]
pub struct OrdersOutcome {
    /// True only when every line parsed; nothing is stored otherwise.
    pub accepted: bool,
    pub lines: Vec<ParsedLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub description: String,
    pub variant: Variant,
    pub status: GameStatus,
    /// None until the game begins.
    pub phase: Option<Phase>,
    pub press: PressRules,
    /// Draw-includes-all-survivors.
    pub dias: bool,
    pub access: AccessRequirements,
    pub deadline: Option<DateTime<Utc>>,
    pub grace: Option<DateTime<Utc>>,
    pub deadline_hours: u32,
    pub grace_hours: u32,
    pub seats: Vec<Seat>,
    pub master: Option<Master>,
    pub moderated: bool,
    pub created: DateTime<Utc>,
    pub started: Option<DateTime<Utc>>,
    /// How the game ended, for finished games.
    pub outcome: Option<String>,
    pub draw_votes: BTreeMap<Power, bool>,
    /// Voter -> beneficiary.
    pub concede_votes: BTreeMap<Power, Power>,
    /// Canonicalized order text per power for the current phase.
    pub orders: BTreeMap<Power, Vec<String>>,
    /// `(phase, power, order)` lines of every processed turn, oldest first.
    pub history: Vec<String>,
}

impl Game {
    pub fn new(id: String, name: String, description: String, variant: Variant) -> Game {
        Game {
            id,
            name,
            description,
            variant,
            status: GameStatus::Forming,
            phase: None,
            press: PressRules::default(),
            dias: true,
            access: AccessRequirements::default(),
            deadline: None,
            grace: None,
            deadline_hours: 0,
            grace_hours: 0,
            seats: variant.powers().iter().map(|p| Seat::unowned(*p)).collect(),
            master: None,
            moderated: false,
            created: Utc::now(),
            started: None,
            outcome: None,
            draw_votes: BTreeMap::new(),
            concede_votes: BTreeMap::new(),
            orders: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    // --- Seat access ---

    pub fn seat(&self, power: Power) -> Option<&Seat> {
        self.seats.iter().find(|s| s.power == power)
    }

    pub fn seat_mut(&mut self, power: Power) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.power == power)
    }

    pub fn seat_of_player(&self, player: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player == Some(player))
    }

    pub fn seat_of_player_mut(&mut self, player: PlayerId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.player == Some(player))
    }

    pub fn open_seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| !s.is_owned())
    }

    /// Claim a power for a player. The power must be unowned and the player
    /// not already seated.
    pub fn claim_seat(&mut self, power: Power, player: PlayerId) -> Result<(), JudgeError> {
        if self.seat_of_player(player).is_some() {
            return Err(JudgeError::AlreadyRegistered(format!(
                "player {player} in game {}",
                self.id
            )));
        }
        let seat = self
            .seat_mut(power)
            .ok_or_else(|| JudgeError::UnknownPower(power.name().to_string()))?;
        if seat.is_owned() {
            return Err(JudgeError::PowerTaken(power.name().to_string()));
        }
        seat.player = Some(player);
        seat.status = SeatStatus::Active;
        Ok(())
    }

    /// Remove a player from their seat; the power reverts to unowned.
    pub fn vacate_seat(&mut self, power: Power) -> Option<PlayerId> {
        let new_status = if self.status == GameStatus::Forming {
            SeatStatus::Active
        } else {
            SeatStatus::Abandoned
        };
        let seat = self.seat_mut(power)?;
        let player = seat.player.take();
        seat.status = new_status;
        player
    }

    // --- Configuration ---

    pub fn set_variant(&mut self, variant: Variant) -> Result<(), JudgeError> {
        if self.status != GameStatus::Forming {
            return Err(JudgeError::AlreadyStarted(self.id.clone()));
        }
        self.variant = variant;
        Ok(())
    }

    pub fn set_press(&mut self, press: PressRules) {
        self.press = press;
    }

    pub fn set_victory(&mut self, dias: bool) {
        self.dias = dias;
    }

    pub fn set_access(&mut self, dedication: f64, ontime: f64, resistance: f64) {
        self.access = AccessRequirements {
            dedication_pct: (dedication * 100.0) as i32,
            ontime_rating: ontime,
            resistance_rating: resistance,
        };
    }

    /// Deadline is `now + deadline_hours`; grace runs from the deadline.
    pub fn set_deadlines(&mut self, deadline_hours: u32, grace_hours: u32) {
        let now = Utc::now();
        self.deadline_hours = deadline_hours;
        self.grace_hours = grace_hours;
        let deadline = now + Duration::hours(i64::from(deadline_hours));
        self.deadline = Some(deadline);
        self.grace = Some(deadline + Duration::hours(i64::from(grace_hours)));
    }

    // --- Lifecycle ---

    /// Set up the board and open Spring 1901. Requires every power seated
    /// unless `force` (the master's FORCE BEGIN).
    pub fn begin(&mut self, force: bool) -> Result<(), JudgeError> {
        match self.status {
            GameStatus::Forming => {}
            _ => return Err(JudgeError::AlreadyStarted(self.id.clone())),
        }
        if !force && self.seats.iter().any(|s| !s.is_owned()) {
            let open: Vec<&str> = self
                .open_seats()
                .map(|s| s.power.name())
                .collect();
            return Err(JudgeError::UnsupportedSetting(format!(
                "cannot begin {}: unowned powers {}",
                self.id,
                open.join(", ")
            )));
        }
        for seat in &mut self.seats {
            seat.units = seat.power.start_units();
            seat.centers = seat.power.start_centers();
            if !seat.is_owned() {
                seat.status = SeatStatus::CivilDisorder;
            }
        }
        self.phase = Some(self.variant.start_phase());
        self.status = GameStatus::Active;
        self.started = Some(Utc::now());
        if self.deadline.is_none() && self.deadline_hours > 0 {
            self.set_deadlines(self.deadline_hours, self.grace_hours);
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), JudgeError> {
        match self.status {
            GameStatus::Active => {
                self.status = GameStatus::Paused;
                Ok(())
            }
            GameStatus::Paused => Ok(()),
            GameStatus::Forming => Err(JudgeError::NotStarted(self.id.clone())),
            GameStatus::Finished => Err(JudgeError::Finished(self.id.clone())),
        }
    }

    pub fn resume(&mut self) -> Result<(), JudgeError> {
        match self.status {
            GameStatus::Paused => {
                self.status = GameStatus::Active;
                Ok(())
            }
            GameStatus::Active => Ok(()),
            GameStatus::Forming => Err(JudgeError::NotStarted(self.id.clone())),
            GameStatus::Finished => Err(JudgeError::Finished(self.id.clone())),
        }
    }

    pub fn finish(&mut self, outcome: String) {
        self.status = GameStatus::Finished;
        self.outcome = Some(outcome);
        self.orders.clear();
        self.deadline = None;
        self.grace = None;
    }

    fn require_running(&self) -> Result<(), JudgeError> {
        match self.status {
            GameStatus::Active => Ok(()),
            GameStatus::Forming => Err(JudgeError::NotStarted(self.id.clone())),
            GameStatus::Paused => Err(JudgeError::Paused(self.id.clone())),
            GameStatus::Finished => Err(JudgeError::Finished(self.id.clone())),
        }
    }

    // --- Orders ---

    /// Parse and record an order block for a power. The whole block is
    /// accepted or rejected; a new accepted block replaces the previous one.
    pub fn submit_orders(&mut self, power: Power, text: &str) -> Result<OrdersOutcome, JudgeError> {
        self.require_running()?;
        if self.seat(power).is_none() {
            return Err(JudgeError::UnknownPower(power.name().to_string()));
        }
        let lines = orders::parse_block(text);
        let accepted = !lines.is_empty() && lines.iter().all(|l| l.result.is_ok());
        if accepted {
            let canonical = lines
                .iter()
                .map(|l| l.result.as_ref().expect("checked above").to_string())
                .collect();
            self.orders.insert(power, canonical);
        }
        Ok(OrdersOutcome { accepted, lines })
    }

    /// Drop one standing order by its unit origin (`NO F LON`).
    pub fn retract_order(&mut self, power: Power, origin: &str) -> bool {
        let needle = origin.trim().to_ascii_uppercase();
        if let Some(list) = self.orders.get_mut(&power) {
            let before = list.len();
            list.retain(|o| !o.starts_with(&needle));
            return list.len() != before;
        }
        false
    }

    /// True when every owned, in-play seat has orders in and nobody is
    /// holding the turn with a wait flag.
    pub fn ready_to_process(&self) -> bool {
        self.status == GameStatus::Active
            && self.seats.iter().filter(|s| s.is_owned() && s.status.in_play()).all(|s| {
                !s.wait && self.orders.contains_key(&s.power)
            })
            && self.seats.iter().any(|s| s.is_owned())
    }

    // --- Conclusion votes ---

    pub fn vote_draw(&mut self, power: Power, yes: bool) -> Result<(), JudgeError> {
        self.require_running()?;
        self.draw_votes.insert(power, yes);
        Ok(())
    }

    /// With DIAS every in-play seat must agree; otherwise a majority of
    /// in-play seats carries.
    pub fn draw_carried(&self) -> bool {
        let in_play: Vec<Power> = self
            .seats
            .iter()
            .filter(|s| s.is_owned() && s.status.in_play())
            .map(|s| s.power)
            .collect();
        if in_play.is_empty() {
            return false;
        }
        let yes = in_play
            .iter()
            .filter(|p| self.draw_votes.get(p) == Some(&true))
            .count();
        if self.dias {
            yes == in_play.len()
        } else {
            yes * 2 > in_play.len()
        }
    }

    pub fn set_concede(&mut self, voter: Power, beneficiary: Power) -> Result<(), JudgeError> {
        self.require_running()?;
        self.concede_votes.insert(voter, beneficiary);
        Ok(())
    }

    pub fn unset_concede(&mut self, voter: Power) {
        self.concede_votes.remove(&voter);
    }

    /// Everyone in play except the beneficiary must concede to the same
    /// power.
    pub fn concession_carried(&self) -> Option<Power> {
        let mut beneficiary = None;
        for vote in self.concede_votes.values() {
            match beneficiary {
                None => beneficiary = Some(*vote),
                Some(b) if b != *vote => return None,
                _ => {}
            }
        }
        let beneficiary = beneficiary?;
        let all_in = self
            .seats
            .iter()
            .filter(|s| s.is_owned() && s.status.in_play() && s.power != beneficiary)
            .all(|s| self.concede_votes.get(&s.power) == Some(&beneficiary));
        all_in.then_some(beneficiary)
    }

    /// Player count shown in listings: owned seats.
    pub fn player_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_owned()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game::new(
            "abcd1234".into(),
            "Test Game".into(),
            "A test".into(),
            Variant::Standard,
        )
    }

    fn seat_everyone(g: &mut Game) {
        for (i, power) in Variant::Standard.powers().iter().enumerate() {
            g.claim_seat(*power, i as PlayerId + 1).unwrap();
        }
    }

    #[test]
    fn seats_start_unowned() {
        let g = game();
        assert_eq!(g.seats.len(), 7);
        assert!(g.seats.iter().all(|s| !s.is_owned()));
        assert_eq!(g.player_count(), 0);
        assert!(g.phase.is_none());
    }

    #[test]
    fn claim_rejects_double_registration() {
        let mut g = game();
        g.claim_seat(Power::England, 1).unwrap();
        assert!(matches!(
            g.claim_seat(Power::England, 2),
            Err(JudgeError::PowerTaken(_))
        ));
        assert!(matches!(
            g.claim_seat(Power::France, 1),
            Err(JudgeError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn begin_seeds_board() {
        let mut g = game();
        assert!(g.begin(false).is_err());

        seat_everyone(&mut g);
        g.begin(false).unwrap();
        assert_eq!(g.status, GameStatus::Active);
        assert_eq!(g.phase.unwrap().to_string(), "S1901M");
        let total_units: u32 = g.seats.iter().map(|s| s.units).sum();
        assert_eq!(total_units, 22);
        assert_eq!(g.seat(Power::Russia).unwrap().centers, 4);
        assert!(g.begin(false).is_err());
    }

    #[test]
    fn force_begin_marks_unowned_civil_disorder() {
        let mut g = game();
        g.claim_seat(Power::England, 1).unwrap();
        g.begin(true).unwrap();
        assert_eq!(
            g.seat(Power::France).unwrap().status,
            SeatStatus::CivilDisorder
        );
        assert_eq!(g.seat(Power::England).unwrap().status, SeatStatus::Active);
    }

    #[test]
    fn orders_accepted_wholesale() {
        let mut g = game();
        seat_everyone(&mut g);
        g.begin(false).unwrap();

        let good = g
            .submit_orders(Power::England, "F LON-NTH\nA LVP-YOR\nF EDI-NWG")
            .unwrap();
        assert!(good.accepted);
        assert_eq!(g.orders.get(&Power::England).unwrap().len(), 3);

        let bad = g
            .submit_orders(Power::England, "F LON-NTH\nX LVP-YOR")
            .unwrap();
        assert!(!bad.accepted);
        // Previous block stays in place.
        assert_eq!(g.orders.get(&Power::England).unwrap().len(), 3);
    }

    #[test]
    fn orders_require_running_game() {
        let mut g = game();
        assert!(matches!(
            g.submit_orders(Power::England, "F LON-NTH"),
            Err(JudgeError::NotStarted(_))
        ));
        seat_everyone(&mut g);
        g.begin(false).unwrap();
        g.pause().unwrap();
        assert!(matches!(
            g.submit_orders(Power::England, "F LON-NTH"),
            Err(JudgeError::Paused(_))
        ));
        g.resume().unwrap();
        assert!(g.submit_orders(Power::England, "F LON-NTH").is_ok());
    }

    #[test]
    fn retraction_drops_matching_order() {
        let mut g = game();
        seat_everyone(&mut g);
        g.begin(false).unwrap();
        g.submit_orders(Power::England, "F LON-NTH\nA LVP-YOR").unwrap();
        assert!(g.retract_order(Power::England, "F LON"));
        assert_eq!(g.orders.get(&Power::England).unwrap().len(), 1);
        assert!(!g.retract_order(Power::England, "F LON"));
    }

    #[test]
    fn readiness_waits_for_all_orders_and_wait_flags() {
        let mut g = game();
        seat_everyone(&mut g);
        g.begin(false).unwrap();
        assert!(!g.ready_to_process());
        for power in Variant::Standard.powers() {
            g.submit_orders(*power, "WAIVE").unwrap();
        }
        assert!(g.ready_to_process());
        g.seat_mut(Power::Italy).unwrap().wait = true;
        assert!(!g.ready_to_process());
    }

    #[test]
    fn dias_draw_needs_everyone() {
        let mut g = game();
        seat_everyone(&mut g);
        g.begin(false).unwrap();
        g.vote_draw(Power::England, true).unwrap();
        g.vote_draw(Power::France, true).unwrap();
        assert!(!g.draw_carried());
        for power in Variant::Standard.powers() {
            g.vote_draw(*power, true).unwrap();
        }
        assert!(g.draw_carried());
        // A retracted vote breaks unanimity.
        g.vote_draw(Power::Germany, false).unwrap();
        assert!(!g.draw_carried());
    }

    #[test]
    fn concession_requires_common_beneficiary() {
        let mut g = game();
        seat_everyone(&mut g);
        g.begin(false).unwrap();
        for power in Variant::Standard.powers() {
            if *power != Power::Italy {
                g.set_concede(*power, Power::Italy).unwrap();
            }
        }
        assert_eq!(g.concession_carried(), Some(Power::Italy));
        g.set_concede(Power::France, Power::Germany).unwrap();
        assert!(g.concession_carried().is_none());
    }

    #[test]
    fn deadline_grace_ordering() {
        let mut g = game();
        g.set_deadlines(24, 12);
        let deadline = g.deadline.unwrap();
        let grace = g.grace.unwrap();
        assert!(grace > deadline);
        assert_eq!((grace - deadline).num_hours(), 12);
    }
}
