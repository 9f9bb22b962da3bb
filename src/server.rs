//! gRPC server implementation for JudgeService.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};

use crate::judge::commands;
use crate::judge::error::JudgeError;
use crate::judge::orders;
use crate::judge::player::Preferences;
use crate::judge::press::PressTarget;
use crate::judge::registry::{self, Judge};
use crate::map::power::{Power, Variant};

pub mod proto {
    tonic::include_proto!("dip.judge.v1");
}

use proto::judge_service_server::JudgeService;
use proto::*;

/// The gRPC service implementation.
pub struct JudgeServer {
    judge: Arc<Judge>,
}

impl JudgeServer {
    pub fn new(judge: Judge) -> Self {
        Self {
            judge: Arc::new(judge),
        }
    }

    pub fn judge(&self) -> Arc<Judge> {
        Arc::clone(&self.judge)
    }
}

// --- Conversion helpers: core types <-> protobuf ---

fn status_of(err: JudgeError) -> Status {
    match &err {
        JudgeError::UnknownGame(_)
        | JudgeError::UnknownBackup(_)
        | JudgeError::UnknownPlayer(_) => Status::not_found(err.to_string()),
        JudgeError::UnknownPower(_)
        | JudgeError::UnknownVariant(_)
        | JudgeError::InvalidPhase(_)
        | JudgeError::InvalidOrder(_)
        | JudgeError::UnsupportedSetting(_) => Status::invalid_argument(err.to_string()),
        JudgeError::AlreadyRegistered(_) | JudgeError::PowerTaken(_) => {
            Status::already_exists(err.to_string())
        }
        JudgeError::AlreadyStarted(_)
        | JudgeError::NotStarted(_)
        | JudgeError::Paused(_)
        | JudgeError::Finished(_) => Status::failed_precondition(err.to_string()),
        JudgeError::PressBlocked(_) | JudgeError::NotMaster => {
            Status::permission_denied(err.to_string())
        }
        JudgeError::Snapshot(_) | JudgeError::Config(_) => Status::internal(err.to_string()),
    }
}

fn seat_to_proto(seat: &registry::SeatDetails) -> SeatDetails {
    SeatDetails {
        power: seat.power.clone(),
        status: seat.status.clone(),
        player: seat.player.clone(),
        units: seat.units,
        centers: seat.centers,
    }
}

fn details_to_proto(d: registry::GameDetails) -> GameDetails {
    GameDetails {
        game_id: d.id,
        name: d.name,
        description: d.description,
        variant: d.variant,
        phase: d.phase,
        press: d.press,
        deadline: d.deadline,
        grace_time: d.grace_time,
        victory_conditions: d.victory_conditions,
        start_time: d.start_time,
        players: d.players,
        year: u32::from(d.year),
        started: d.started,
        player_list: d.player_list.iter().map(seat_to_proto).collect(),
    }
}

fn email_to_proto(email: crate::judge::mailer::Email) -> Email {
    Email {
        to: email.to,
        r#from: email.from,
        subject: email.subject,
        body: email.body,
    }
}

fn parse_power(name: &str) -> Result<Power, Status> {
    Power::parse(name).map_err(status_of)
}

fn press_target(recipients: &[String]) -> Result<PressTarget, Status> {
    if recipients.len() == 1 && recipients[0].eq_ignore_ascii_case("all") {
        return Ok(PressTarget::All);
    }
    let mut powers = Vec::new();
    for name in recipients {
        powers.push(parse_power(name)?);
    }
    match powers.len() {
        0 => Err(Status::invalid_argument("at least one recipient is required")),
        1 => Ok(PressTarget::Power(powers[0])),
        _ => Ok(PressTarget::Powers(powers)),
    }
}

const ACK: Ack = Ack { ok: true };

#[tonic::async_trait]
impl JudgeService for JudgeServer {
    // --- Game administration ---

    async fn create_game(
        &self,
        request: Request<CreateGameRequest>,
    ) -> Result<Response<CreateGameResponse>, Status> {
        let req = request.into_inner();
        if req.name.trim().is_empty() {
            return Err(Status::invalid_argument("game name is required"));
        }
        let variant = (!req.variant.is_empty()).then_some(req.variant.as_str());
        let game_id = self
            .judge
            .create_game(&req.name, &req.description, variant)
            .map_err(status_of)?;
        Ok(Response::new(CreateGameResponse { game_id }))
    }

    async fn list_games(
        &self,
        _request: Request<ListGamesRequest>,
    ) -> Result<Response<ListGamesResponse>, Status> {
        let games = self
            .judge
            .list_games()
            .into_iter()
            .map(|g| GameSummary {
                game_id: g.id,
                name: g.name,
                phase: g.phase,
                players: g.players,
            })
            .collect();
        Ok(Response::new(ListGamesResponse { games }))
    }

    async fn get_game_details(
        &self,
        request: Request<GetGameDetailsRequest>,
    ) -> Result<Response<GameDetails>, Status> {
        let req = request.into_inner();
        let details = self.judge.game_details(&req.game_id).map_err(status_of)?;
        Ok(Response::new(details_to_proto(details)))
    }

    async fn get_game_state(
        &self,
        request: Request<GetGameStateRequest>,
    ) -> Result<Response<GameState>, Status> {
        let req = request.into_inner();
        let state = self.judge.game_state(&req.game_id).map_err(status_of)?;
        Ok(Response::new(GameState {
            phase: state.phase,
            season: state.season,
            year: u32::from(state.year),
            players: state.players.iter().map(seat_to_proto).collect(),
        }))
    }

    async fn modify_game_settings(
        &self,
        request: Request<ModifyGameSettingsRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        self.judge
            .modify_settings(&req.game_id, &req.settings)
            .map_err(status_of)?;
        Ok(Response::new(ACK))
    }

    async fn set_master(
        &self,
        request: Request<SetMasterRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        let password = (!req.password.is_empty()).then_some(req.password);
        self.judge
            .set_master(&req.game_id, &req.email, password)
            .map_err(status_of)?;
        Ok(Response::new(ACK))
    }

    async fn begin_game(
        &self,
        request: Request<BeginGameRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        self.judge
            .begin_game(&req.game_id, req.force)
            .map_err(status_of)?;
        Ok(Response::new(ACK))
    }

    async fn backup_game(
        &self,
        request: Request<BackupGameRequest>,
    ) -> Result<Response<BackupGameResponse>, Status> {
        let req = request.into_inner();
        let backup_id = self.judge.backup_game(&req.game_id).map_err(status_of)?;
        Ok(Response::new(BackupGameResponse { backup_id }))
    }

    async fn restore_game(
        &self,
        request: Request<RestoreGameRequest>,
    ) -> Result<Response<RestoreGameResponse>, Status> {
        let req = request.into_inner();
        let game_id = self.judge.restore_game(&req.backup_id).map_err(status_of)?;
        Ok(Response::new(RestoreGameResponse { game_id }))
    }

    // --- Game configuration ---

    async fn set_variant(
        &self,
        request: Request<SetVariantRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        let variant = Variant::parse(&req.variant).map_err(status_of)?;
        self.judge
            .with_game_mut(&req.game_id, |g| g.set_variant(variant))
            .map_err(status_of)?;
        Ok(Response::new(ACK))
    }

    async fn set_press_rules(
        &self,
        request: Request<SetPressRulesRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        let press = crate::judge::game::PressRules::parse(&req.press).map_err(status_of)?;
        self.judge
            .with_game_mut(&req.game_id, |g| {
                g.set_press(press);
                Ok(())
            })
            .map_err(status_of)?;
        Ok(Response::new(ACK))
    }

    async fn set_deadlines(
        &self,
        request: Request<SetDeadlinesRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        self.judge
            .with_game_mut(&req.game_id, |g| {
                g.set_deadlines(req.deadline_hours, req.grace_hours);
                Ok(())
            })
            .map_err(status_of)?;
        Ok(Response::new(ACK))
    }

    async fn set_victory_conditions(
        &self,
        request: Request<SetVictoryConditionsRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        self.judge
            .with_game_mut(&req.game_id, |g| {
                g.set_victory(req.dias);
                Ok(())
            })
            .map_err(status_of)?;
        Ok(Response::new(ACK))
    }

    async fn set_game_access(
        &self,
        request: Request<SetGameAccessRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        self.judge
            .with_game_mut(&req.game_id, |g| {
                g.set_access(req.dedication, req.ontime_rating, req.resistance_rating);
                Ok(())
            })
            .map_err(status_of)?;
        Ok(Response::new(ACK))
    }

    // --- Players ---

    async fn register_player(
        &self,
        request: Request<RegisterPlayerRequest>,
    ) -> Result<Response<RegisterPlayerResponse>, Status> {
        let req = request.into_inner();
        if req.name.is_empty() || req.email.is_empty() {
            return Err(Status::invalid_argument(
                "name and email are required for registration",
            ));
        }
        let power = parse_power(&req.power)?;
        let player_id = self
            .judge
            .register_player(&req.name, &req.email, power, &req.game_id)
            .map_err(status_of)?;
        Ok(Response::new(RegisterPlayerResponse { player_id }))
    }

    async fn link_player_email(
        &self,
        request: Request<LinkPlayerEmailRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        self.judge
            .link_email(&req.new_email, &req.existing_email)
            .map_err(status_of)?;
        Ok(Response::new(ACK))
    }

    async fn set_player_preferences(
        &self,
        request: Request<SetPlayerPreferencesRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        self.judge
            .set_preferences(
                req.player_id,
                Preferences {
                    notifications: req.notifications,
                    deadline_reminders: req.deadline_reminders,
                    order_confirmation: req.order_confirmation,
                },
            )
            .map_err(status_of)?;
        Ok(Response::new(ACK))
    }

    async fn get_player_status(
        &self,
        request: Request<GetPlayerStatusRequest>,
    ) -> Result<Response<PlayerStatus>, Status> {
        let req = request.into_inner();
        let seat = self
            .judge
            .player_status(&req.game_id, req.player_id)
            .map_err(status_of)?;
        Ok(Response::new(PlayerStatus {
            power: seat.power,
            status: seat.status,
            units: seat.units,
            centers: seat.centers,
        }))
    }

    // --- Play ---

    async fn validate_order(
        &self,
        request: Request<ValidateOrderRequest>,
    ) -> Result<Response<ValidateOrderResponse>, Status> {
        let req = request.into_inner();
        match orders::parse_line(&req.order) {
            Ok(_) => Ok(Response::new(ValidateOrderResponse {
                valid: true,
                error: String::new(),
            })),
            Err(e) => Ok(Response::new(ValidateOrderResponse {
                valid: false,
                error: e.to_string(),
            })),
        }
    }

    async fn submit_orders(
        &self,
        request: Request<SubmitOrdersRequest>,
    ) -> Result<Response<SubmitOrdersResponse>, Status> {
        let req = request.into_inner();
        let outcome = self
            .judge
            .submit_orders_as_player(&req.game_id, req.player_id, &req.orders)
            .map_err(status_of)?;
        let lines = outcome
            .lines
            .iter()
            .map(|line| OrderLineResult {
                text: line.text.clone(),
                ok: line.result.is_ok(),
                error: line
                    .result
                    .as_ref()
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_default(),
            })
            .collect();
        Ok(Response::new(SubmitOrdersResponse {
            accepted: outcome.accepted,
            lines,
        }))
    }

    async fn send_press(
        &self,
        request: Request<SendPressRequest>,
    ) -> Result<Response<SendPressResponse>, Status> {
        let req = request.into_inner();
        let target = press_target(&req.recipients)?;
        let delivery = self
            .judge
            .send_press_as_player(&req.game_id, req.player_id, &target, &req.message)
            .map_err(status_of)?;
        Ok(Response::new(SendPressResponse {
            delivered: delivery.succeeded(),
            refused: delivery
                .refused
                .iter()
                .map(|p| p.name().to_string())
                .collect(),
        }))
    }

    async fn vote_draw(
        &self,
        request: Request<VoteDrawRequest>,
    ) -> Result<Response<VoteDrawResponse>, Status> {
        let req = request.into_inner();
        let power = self
            .judge
            .player_status(&req.game_id, req.player_id)
            .map_err(status_of)
            .and_then(|seat| parse_power(&seat.power))?;
        let concluded = self
            .judge
            .vote_draw(&req.game_id, power, req.vote)
            .map_err(status_of)?;
        Ok(Response::new(VoteDrawResponse { concluded }))
    }

    async fn process_turn(
        &self,
        request: Request<ProcessTurnRequest>,
    ) -> Result<Response<ProcessTurnResponse>, Status> {
        let req = request.into_inner();
        let report = self.judge.process_game(&req.game_id).map_err(status_of)?;
        Ok(Response::new(ProcessTurnResponse {
            phase: report.phase.to_string(),
            next_phase: report.next_phase.to_string(),
            summary: report.summary,
        }))
    }

    // --- Mail ---

    async fn submit_email(
        &self,
        request: Request<SubmitEmailRequest>,
    ) -> Result<Response<SubmitEmailResponse>, Status> {
        let req = request.into_inner();
        if req.from_email.is_empty() {
            return Err(Status::invalid_argument("from_email is required"));
        }
        let handled =
            commands::inbound_email(&self.judge, &req.subject, &req.body, &req.from_email);
        Ok(Response::new(SubmitEmailResponse { handled }))
    }

    async fn fetch_outbound(
        &self,
        _request: Request<FetchOutboundRequest>,
    ) -> Result<Response<FetchOutboundResponse>, Status> {
        let emails = self
            .judge
            .fetch_outbound()
            .into_iter()
            .map(email_to_proto)
            .collect();
        Ok(Response::new(FetchOutboundResponse { emails }))
    }

    // --- WatchOutbound (server streaming) ---
    type WatchOutboundStream = ReceiverStream<Result<Email, Status>>;

    async fn watch_outbound(
        &self,
        _request: Request<WatchOutboundRequest>,
    ) -> Result<Response<Self::WatchOutboundStream>, Status> {
        let mut source = self.judge.watch_outbound();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            while let Some(email) = source.recv().await {
                if tx.send(Ok(email_to_proto(email))).await.is_err() {
                    break;
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
