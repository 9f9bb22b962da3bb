//! The judge's working state: every game, the player directory, backups,
//! and the outbound mailbox, behind process-wide locks.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::JudgeConfig;
use crate::judge::adjudicator::{self, Adjudicator, PhaseReport, StandingAdjudicator};
use crate::judge::error::JudgeError;
use crate::judge::game::{Game, GameStatus, OrdersOutcome, PressRules};
use crate::judge::mailer::{Email, Mailbox};
use crate::judge::phase;
use crate::judge::player::{PlayerId, PlayerRecord, Preferences};
use crate::judge::press::{self, PressDelivery, PressTarget};
use crate::map::power::{Power, Variant};

const GAME_ID_LEN: usize = 8;

/// Registered accounts and per-game observers.
#[derive(Debug, Default)]
struct Directory {
    players: HashMap<PlayerId, PlayerRecord>,
    next_id: PlayerId,
    observers: HashMap<String, Vec<String>>,
}

impl Directory {
    fn by_email(&self, email: &str) -> Option<&PlayerRecord> {
        self.players.values().find(|p| p.matches_email(email))
    }

    fn get_or_create(&mut self, name: &str, email: &str) -> PlayerId {
        if let Some(record) = self.by_email(email) {
            return record.id;
        }
        self.next_id += 1;
        let id = self.next_id;
        self.players.insert(
            id,
            PlayerRecord {
                id,
                name: name.to_string(),
                email: email.to_string(),
                aliases: Vec::new(),
                preferences: Preferences::default(),
            },
        );
        id
    }

    fn email_of(&self, id: PlayerId) -> Option<String> {
        self.players.get(&id).map(|p| p.email.clone())
    }
}

/// One row of the LIST output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: String,
    pub name: String,
    pub phase: String,
    pub players: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatDetails {
    pub power: String,
    pub status: String,
    pub player: String,
    pub units: u32,
    pub centers: u32,
}

/// Full game record for GetGameDetails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDetails {
    pub id: String,
    pub name: String,
    pub description: String,
    pub variant: String,
    pub phase: String,
    pub press: String,
    pub deadline: String,
    pub grace_time: String,
    pub victory_conditions: String,
    pub start_time: String,
    pub players: u32,
    pub year: u16,
    pub started: bool,
    pub player_list: Vec<SeatDetails>,
}

/// The phase/seat snapshot for GetGameState.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: String,
    pub season: String,
    pub year: u16,
    pub players: Vec<SeatDetails>,
}

/// The judge service core. All state lives here; lock order is
/// games -> directory -> backups -> mailbox.
pub struct Judge {
    config: JudgeConfig,
    games: RwLock<HashMap<String, Game>>,
    directory: RwLock<Directory>,
    /// Serialized snapshots keyed by backup id.
    backups: RwLock<HashMap<String, serde_json::Value>>,
    mailbox: Mutex<Mailbox>,
    adjudicator: Box<dyn Adjudicator>,
}

impl Judge {
    pub fn new(config: JudgeConfig) -> Judge {
        Judge::with_adjudicator(config, Box::new(StandingAdjudicator))
    }

    pub fn with_adjudicator(config: JudgeConfig, adjudicator: Box<dyn Adjudicator>) -> Judge {
        let mailbox = Mailbox::new(config.from_addr.clone());
        Judge {
            config,
            games: RwLock::new(HashMap::new()),
            directory: RwLock::new(Directory::default()),
            backups: RwLock::new(HashMap::new()),
            mailbox: Mutex::new(mailbox),
            adjudicator,
        }
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    fn fresh_id(taken: &HashMap<String, Game>) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let id: String = (0..GAME_ID_LEN)
                .map(|_| {
                    let chars = b"abcdefghijklmnopqrstuvwxyz0123456789";
                    chars[rng.gen_range(0..chars.len())] as char
                })
                .collect();
            if !taken.contains_key(&id) {
                return id;
            }
        }
    }

    // --- Game lifecycle ---

    /// Create a game seeded with the service defaults and return its id.
    pub fn create_game(
        &self,
        name: &str,
        description: &str,
        variant: Option<&str>,
    ) -> Result<String, JudgeError> {
        let variant = match variant {
            Some(v) if !v.trim().is_empty() => Variant::parse(v)?,
            _ => Variant::default(),
        };
        let mut games = self.games.write().expect("games lock");
        let id = Self::fresh_id(&games);
        let mut game = Game::new(id.clone(), name.to_string(), description.to_string(), variant);
        game.press = self.config.press;
        game.dias = self.config.dias;
        game.deadline_hours = self.config.deadline_hours;
        game.grace_hours = self.config.grace_hours;
        games.insert(id.clone(), game);
        tracing::info!(game = %id, name, %variant, "created game");
        Ok(id)
    }

    pub fn list_games(&self) -> Vec<GameSummary> {
        let games = self.games.read().expect("games lock");
        let mut list: Vec<GameSummary> = games
            .values()
            .map(|g| GameSummary {
                id: g.id.clone(),
                name: g.name.clone(),
                phase: g.phase.map(|p| p.to_string()).unwrap_or_default(),
                players: g.player_count() as u32,
            })
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub fn remove_game(&self, id: &str) -> Result<(), JudgeError> {
        let mut games = self.games.write().expect("games lock");
        games
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| JudgeError::UnknownGame(id.to_string()))
    }

    /// Read-scoped access to one game.
    pub fn with_game<R>(
        &self,
        id: &str,
        f: impl FnOnce(&Game) -> R,
    ) -> Result<R, JudgeError> {
        let games = self.games.read().expect("games lock");
        let game = games
            .get(id)
            .ok_or_else(|| JudgeError::UnknownGame(id.to_string()))?;
        Ok(f(game))
    }

    /// Write-scoped access to one game.
    pub fn with_game_mut<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Game) -> Result<R, JudgeError>,
    ) -> Result<R, JudgeError> {
        let mut games = self.games.write().expect("games lock");
        let game = games
            .get_mut(id)
            .ok_or_else(|| JudgeError::UnknownGame(id.to_string()))?;
        f(game)
    }

    pub fn begin_game(&self, id: &str, force: bool) -> Result<(), JudgeError> {
        self.with_game_mut(id, |g| g.begin(force))?;
        tracing::info!(game = %id, force, "game began");
        Ok(())
    }

    // --- Details and state snapshots ---

    pub fn game_details(&self, id: &str) -> Result<GameDetails, JudgeError> {
        let games = self.games.read().expect("games lock");
        let game = games
            .get(id)
            .ok_or_else(|| JudgeError::UnknownGame(id.to_string()))?;
        let directory = self.directory.read().expect("directory lock");

        let player_list = game
            .seats
            .iter()
            .map(|seat| SeatDetails {
                power: seat.power.name().to_string(),
                status: seat.status.name().to_string(),
                player: seat
                    .player
                    .and_then(|id| directory.players.get(&id))
                    .map(|p| p.email.clone())
                    .unwrap_or_default(),
                units: seat.units,
                centers: seat.centers,
            })
            .collect();

        let rfc3339 = |t: Option<chrono::DateTime<chrono::Utc>>| {
            t.map(|t| t.to_rfc3339()).unwrap_or_default()
        };

        Ok(GameDetails {
            id: game.id.clone(),
            name: game.name.clone(),
            description: game.description.clone(),
            variant: game.variant.name().to_string(),
            phase: game.phase.map(|p| p.to_string()).unwrap_or_default(),
            press: game.press.name().to_string(),
            deadline: rfc3339(game.deadline),
            grace_time: rfc3339(game.grace),
            victory_conditions: if game.dias { "DIAS" } else { "NO DIAS" }.to_string(),
            start_time: rfc3339(game.started),
            players: game.seats.len() as u32,
            year: phase::year_or_default(game.phase.as_ref()),
            started: game.status != GameStatus::Forming,
            player_list,
        })
    }

    pub fn game_state(&self, id: &str) -> Result<GameState, JudgeError> {
        self.with_game(id, |game| GameState {
            phase: game.phase.map(|p| p.to_string()).unwrap_or_default(),
            season: phase::season_name(game.phase.as_ref()).to_string(),
            year: phase::year_or_default(game.phase.as_ref()),
            players: game
                .seats
                .iter()
                .map(|seat| SeatDetails {
                    power: if seat.is_owned() || game.status != GameStatus::Forming {
                        seat.power.name().to_string()
                    } else {
                        "Unowned".to_string()
                    },
                    status: seat.status.name().to_string(),
                    player: String::new(),
                    units: seat.units,
                    centers: seat.centers,
                })
                .collect(),
        })
    }

    /// Apply a settings map; only a fixed key set is honored.
    pub fn modify_settings(
        &self,
        id: &str,
        settings: &HashMap<String, String>,
    ) -> Result<(), JudgeError> {
        self.with_game_mut(id, |game| {
            for (key, value) in settings {
                match key.as_str() {
                    "name" => game.name = value.clone(),
                    "description" => game.description = value.clone(),
                    "press" => game.set_press(PressRules::parse(value)?),
                    "variant" => game.set_variant(Variant::parse(value)?)?,
                    "dias" => game.set_victory(value.parse().map_err(|_| {
                        JudgeError::UnsupportedSetting(format!("dias = {value:?}"))
                    })?),
                    "deadline_hours" | "turn_time_limit" => {
                        let hours: u32 = value.parse().map_err(|_| {
                            JudgeError::UnsupportedSetting(format!("{key} = {value:?}"))
                        })?;
                        game.set_deadlines(hours, game.grace_hours);
                    }
                    "grace_hours" => {
                        let hours: u32 = value.parse().map_err(|_| {
                            JudgeError::UnsupportedSetting(format!("{key} = {value:?}"))
                        })?;
                        game.set_deadlines(game.deadline_hours, hours);
                    }
                    other => {
                        return Err(JudgeError::UnsupportedSetting(other.to_string()));
                    }
                }
            }
            Ok(())
        })
    }

    pub fn set_master(
        &self,
        id: &str,
        email: &str,
        password: Option<String>,
    ) -> Result<(), JudgeError> {
        self.with_game_mut(id, |game| {
            game.master = Some(crate::judge::game::Master {
                email: email.to_string(),
                password,
            });
            Ok(())
        })
    }

    // --- Players ---

    /// Register (or look up) an account by email and seat it on a power.
    pub fn register_player(
        &self,
        name: &str,
        email: &str,
        power: Power,
        game_id: &str,
    ) -> Result<PlayerId, JudgeError> {
        let mut games = self.games.write().expect("games lock");
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| JudgeError::UnknownGame(game_id.to_string()))?;
        let mut directory = self.directory.write().expect("directory lock");
        if let Some(existing) = directory.by_email(email) {
            if game.seat_of_player(existing.id).is_some() {
                return Err(JudgeError::AlreadyRegistered(email.to_string()));
            }
        }
        let player = directory.get_or_create(name, email);
        game.claim_seat(power, player)?;
        tracing::info!(game = %game_id, power = %power, player, "registered player");
        Ok(player)
    }

    pub fn link_email(&self, new_email: &str, existing_email: &str) -> Result<(), JudgeError> {
        let mut directory = self.directory.write().expect("directory lock");
        let id = directory
            .by_email(existing_email)
            .map(|p| p.id)
            .ok_or_else(|| JudgeError::UnknownPlayer(existing_email.to_string()))?;
        let record = directory.players.get_mut(&id).expect("record exists");
        if !record.matches_email(new_email) {
            record.aliases.push(new_email.to_string());
        }
        Ok(())
    }

    pub fn set_preferences(
        &self,
        player: PlayerId,
        preferences: Preferences,
    ) -> Result<(), JudgeError> {
        let mut directory = self.directory.write().expect("directory lock");
        let record = directory
            .players
            .get_mut(&player)
            .ok_or_else(|| JudgeError::UnknownPlayer(player.to_string()))?;
        record.preferences = preferences;
        Ok(())
    }

    pub fn find_player(&self, email: &str) -> Option<PlayerRecord> {
        self.directory
            .read()
            .expect("directory lock")
            .by_email(email)
            .cloned()
    }

    /// Game ids where this address is the master.
    pub fn games_mastered_by(&self, email: &str) -> Vec<String> {
        let games = self.games.read().expect("games lock");
        let mut ids: Vec<String> = games
            .values()
            .filter(|g| {
                g.master
                    .as_ref()
                    .is_some_and(|m| m.email.eq_ignore_ascii_case(email))
            })
            .map(|g| g.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Game ids where this address holds a seat.
    pub fn games_of(&self, email: &str) -> Vec<String> {
        let Some(player) = self.find_player(email) else {
            return Vec::new();
        };
        let games = self.games.read().expect("games lock");
        let mut ids: Vec<String> = games
            .values()
            .filter(|g| g.seat_of_player(player.id).is_some())
            .map(|g| g.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn player_status(&self, game_id: &str, player: PlayerId) -> Result<SeatDetails, JudgeError> {
        self.with_game(game_id, |game| {
            game.seat_of_player(player).map(|seat| SeatDetails {
                power: seat.power.name().to_string(),
                status: seat.status.name().to_string(),
                player: String::new(),
                units: seat.units,
                centers: seat.centers,
            })
        })?
        .ok_or_else(|| JudgeError::UnknownPlayer(player.to_string()))
    }

    /// Seat a power for an address, creating the account if needed and
    /// bumping any current occupant (the master's ASSIGN).
    pub fn assign_power(
        &self,
        game_id: &str,
        power: Power,
        email: &str,
    ) -> Result<PlayerId, JudgeError> {
        let mut games = self.games.write().expect("games lock");
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| JudgeError::UnknownGame(game_id.to_string()))?;
        let mut directory = self.directory.write().expect("directory lock");
        let player = directory.get_or_create(email, email);
        if game.seat(power).map(|s| s.is_owned()) == Some(true) {
            game.vacate_seat(power);
        }
        game.claim_seat(power, player)?;
        Ok(player)
    }

    pub fn eject_power(&self, game_id: &str, power: Power) -> Result<(), JudgeError> {
        self.with_game_mut(game_id, |game| {
            game.vacate_seat(power)
                .map(|_| ())
                .ok_or_else(|| JudgeError::UnknownPower(power.name().to_string()))
        })
    }

    pub fn add_observer(&self, game_id: &str, email: &str) -> Result<(), JudgeError> {
        // Validate the game exists first.
        self.with_game(game_id, |_| ())?;
        let mut directory = self.directory.write().expect("directory lock");
        let observers = directory.observers.entry(game_id.to_string()).or_default();
        if !observers.iter().any(|o| o.eq_ignore_ascii_case(email)) {
            observers.push(email.to_string());
        }
        Ok(())
    }

    // --- Orders ---

    pub fn submit_orders_as_power(
        &self,
        game_id: &str,
        power: Power,
        text: &str,
    ) -> Result<OrdersOutcome, JudgeError> {
        let outcome = self.with_game_mut(game_id, |game| game.submit_orders(power, text))?;
        if outcome.accepted {
            self.maybe_auto_process(game_id)?;
        }
        Ok(outcome)
    }

    pub fn submit_orders_as_player(
        &self,
        game_id: &str,
        player: PlayerId,
        text: &str,
    ) -> Result<OrdersOutcome, JudgeError> {
        let power = self.with_game(game_id, |game| {
            game.seat_of_player(player).map(|s| s.power)
        })?
        .ok_or_else(|| JudgeError::UnknownPlayer(player.to_string()))?;
        self.submit_orders_as_power(game_id, power, text)
    }

    fn maybe_auto_process(&self, game_id: &str) -> Result<(), JudgeError> {
        if !self.config.auto_process {
            return Ok(());
        }
        let ready = self.with_game(game_id, |g| g.ready_to_process())?;
        if ready {
            self.process_game(game_id)?;
        }
        Ok(())
    }

    /// Run the configured adjudicator over the game's collected orders.
    pub fn process_game(&self, game_id: &str) -> Result<PhaseReport, JudgeError> {
        let mut games = self.games.write().expect("games lock");
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| JudgeError::UnknownGame(game_id.to_string()))?;
        let directory = self.directory.read().expect("directory lock");
        let mut mailbox = self.mailbox.lock().expect("mailbox lock");
        adjudicator::process_turn(
            game,
            self.adjudicator.as_ref(),
            |id| directory.email_of(id),
            &mut mailbox,
        )
    }

    // --- Press ---

    pub fn send_press_as_power(
        &self,
        game_id: &str,
        from: Power,
        target: &PressTarget,
        message: &str,
    ) -> Result<PressDelivery, JudgeError> {
        let games = self.games.read().expect("games lock");
        let game = games
            .get(game_id)
            .ok_or_else(|| JudgeError::UnknownGame(game_id.to_string()))?;
        let directory = self.directory.read().expect("directory lock");
        let mut mailbox = self.mailbox.lock().expect("mailbox lock");
        press::send_press(
            game,
            from,
            target,
            message,
            |id| directory.email_of(id),
            &mut mailbox,
        )
    }

    pub fn send_press_as_player(
        &self,
        game_id: &str,
        player: PlayerId,
        target: &PressTarget,
        message: &str,
    ) -> Result<PressDelivery, JudgeError> {
        let from = self.with_game(game_id, |game| {
            game.seat_of_player(player).map(|s| s.power)
        })?
        .ok_or_else(|| JudgeError::UnknownPlayer(player.to_string()))?;
        self.send_press_as_power(game_id, from, target, message)
    }

    // --- Conclusion ---

    /// Record a draw vote. Returns true if the vote concluded the game.
    pub fn vote_draw(&self, game_id: &str, power: Power, yes: bool) -> Result<bool, JudgeError> {
        let concluded = self.with_game_mut(game_id, |game| {
            game.vote_draw(power, yes)?;
            if game.draw_carried() {
                game.finish("draw".to_string());
                Ok(true)
            } else {
                Ok(false)
            }
        })?;
        if concluded {
            self.broadcast(
                game_id,
                &format!("DRAW {game_id}"),
                "The game has ended in a draw by agreement of all surviving powers.",
            )?;
            tracing::info!(game = %game_id, "game concluded in a draw");
        }
        Ok(concluded)
    }

    /// Record a concession vote. Returns the winner if it carried.
    pub fn vote_concede(
        &self,
        game_id: &str,
        voter: Power,
        beneficiary: Power,
    ) -> Result<Option<Power>, JudgeError> {
        let winner = self.with_game_mut(game_id, |game| {
            game.set_concede(voter, beneficiary)?;
            if let Some(winner) = game.concession_carried() {
                game.finish(format!("conceded to {winner}"));
                Ok(Some(winner))
            } else {
                Ok(None)
            }
        })?;
        if let Some(winner) = winner {
            self.broadcast(
                game_id,
                &format!("CONCEDE {game_id}"),
                &format!("All surviving powers have conceded the game to {winner}."),
            )?;
        }
        Ok(winner)
    }

    // --- Backups ---

    pub fn backup_game(&self, game_id: &str) -> Result<String, JudgeError> {
        let games = self.games.read().expect("games lock");
        let game = games
            .get(game_id)
            .ok_or_else(|| JudgeError::UnknownGame(game_id.to_string()))?;
        let snapshot = serde_json::to_value(game)
            .map_err(|e| JudgeError::Snapshot(format!("encoding {game_id}: {e}")))?;
        let mut backups = self.backups.write().expect("backups lock");
        let backup_id = format!("{}-{}", game_id, backups.len() + 1);
        backups.insert(backup_id.clone(), snapshot);
        tracing::info!(game = %game_id, backup = %backup_id, "backed up game");
        Ok(backup_id)
    }

    /// Restore a snapshot over the live game; returns the game id.
    pub fn restore_game(&self, backup_id: &str) -> Result<String, JudgeError> {
        let backups = self.backups.read().expect("backups lock");
        let snapshot = backups
            .get(backup_id)
            .ok_or_else(|| JudgeError::UnknownBackup(backup_id.to_string()))?
            .clone();
        drop(backups);
        let game: Game = serde_json::from_value(snapshot)
            .map_err(|e| JudgeError::Snapshot(format!("decoding {backup_id}: {e}")))?;
        let id = game.id.clone();
        let mut games = self.games.write().expect("games lock");
        games.insert(id.clone(), game);
        tracing::info!(game = %id, backup = %backup_id, "restored game");
        Ok(id)
    }

    // --- Mail ---

    /// Queue a judge-originated email.
    pub fn post(&self, to: &str, subject: &str, body: &str) {
        self.mailbox
            .lock()
            .expect("mailbox lock")
            .push(to, subject, body);
    }

    /// Email every seated player and observer of a game.
    pub fn broadcast(&self, game_id: &str, subject: &str, body: &str) -> Result<usize, JudgeError> {
        let games = self.games.read().expect("games lock");
        let game = games
            .get(game_id)
            .ok_or_else(|| JudgeError::UnknownGame(game_id.to_string()))?;
        let directory = self.directory.read().expect("directory lock");
        let mut recipients: Vec<String> = game
            .seats
            .iter()
            .filter_map(|s| s.player)
            .filter_map(|id| directory.email_of(id))
            .collect();
        if let Some(observers) = directory.observers.get(game_id) {
            recipients.extend(observers.iter().cloned());
        }
        let mut mailbox = self.mailbox.lock().expect("mailbox lock");
        for to in &recipients {
            mailbox.push(to.clone(), subject, body);
        }
        Ok(recipients.len())
    }

    /// Drain the outbound queue.
    pub fn fetch_outbound(&self) -> Vec<Email> {
        self.mailbox.lock().expect("mailbox lock").drain()
    }

    pub fn watch_outbound(&self) -> mpsc::Receiver<Email> {
        self.mailbox.lock().expect("mailbox lock").watch()
    }
}
