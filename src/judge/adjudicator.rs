//! The seam to the rules engine. Everything that knows how Diplomacy
//! movement actually resolves lives behind [`Adjudicator`]; this crate only
//! ships a standing resolver that files the orders and turns the calendar.

use crate::judge::error::JudgeError;
use crate::judge::game::{Game, GameStatus};
use crate::judge::mailer::Mailbox;
use crate::judge::phase::Phase;
use crate::judge::player::PlayerId;
use crate::map::power::Power;

/// What became of one submitted order.
#[derive(Debug, Clone)]
pub struct OrderDisposition {
    pub power: Power,
    pub order: String,
    pub succeeded: bool,
    pub note: Option<String>,
}

/// The outcome of processing one phase.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    /// The phase that was processed.
    pub phase: Phase,
    pub next_phase: Phase,
    pub dispositions: Vec<OrderDisposition>,
    /// Human-readable results, mailed to every player.
    pub summary: String,
}

/// Resolves the orders collected for the current phase. Implementations may
/// wrap a full rules engine; the judge only requires a report back.
pub trait Adjudicator: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, game: &Game) -> Result<PhaseReport, JudgeError>;
}

/// Built-in resolver: every order stands as written, nothing is dislodged,
/// and the calendar advances one phase. A placeholder with honest paperwork.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandingAdjudicator;

impl Adjudicator for StandingAdjudicator {
    fn name(&self) -> &'static str {
        "standing"
    }

    fn resolve(&self, game: &Game) -> Result<PhaseReport, JudgeError> {
        let phase = match (game.status, game.phase) {
            (GameStatus::Active, Some(phase)) => phase,
            (GameStatus::Paused, _) => return Err(JudgeError::Paused(game.id.clone())),
            (GameStatus::Finished, _) => return Err(JudgeError::Finished(game.id.clone())),
            _ => return Err(JudgeError::NotStarted(game.id.clone())),
        };

        let mut dispositions = Vec::new();
        let mut lines = vec![format!("Results for {} phase {phase}", game.id)];
        for seat in game.seats.iter().filter(|s| s.is_owned()) {
            match game.orders.get(&seat.power) {
                Some(orders) => {
                    for order in orders {
                        lines.push(format!("{}: {order} (succeeds)", seat.power));
                        dispositions.push(OrderDisposition {
                            power: seat.power,
                            order: order.clone(),
                            succeeded: true,
                            note: None,
                        });
                    }
                }
                None => {
                    lines.push(format!("{}: no orders received, units hold", seat.power));
                    dispositions.push(OrderDisposition {
                        power: seat.power,
                        order: "HOLD".into(),
                        succeeded: true,
                        note: Some("defaulted".into()),
                    });
                }
            }
        }

        Ok(PhaseReport {
            phase,
            next_phase: phase.next(),
            dispositions,
            summary: lines.join("\n"),
        })
    }
}

/// Run the adjudicator over a game and apply the report: archive the turn,
/// advance the phase, reset per-turn state, and mail results to every
/// player.
pub fn process_turn<F>(
    game: &mut Game,
    adjudicator: &dyn Adjudicator,
    lookup_email: F,
    mailbox: &mut Mailbox,
) -> Result<PhaseReport, JudgeError>
where
    F: Fn(PlayerId) -> Option<String>,
{
    let report = adjudicator.resolve(game)?;

    for d in &report.dispositions {
        game.history.push(format!("{} {}: {}", report.phase, d.power, d.order));
    }
    game.orders.clear();
    game.phase = Some(report.next_phase);
    if game.deadline_hours > 0 {
        game.set_deadlines(game.deadline_hours, game.grace_hours);
    }
    for seat in &mut game.seats {
        seat.wait = false;
    }

    let subject = format!("RESULTS {} {}", game.id, report.phase);
    let recipients: Vec<String> = game
        .seats
        .iter()
        .filter_map(|s| s.player)
        .filter_map(&lookup_email)
        .collect();
    for to in recipients {
        mailbox.push(to, subject.clone(), report.summary.clone());
    }

    tracing::info!(
        game = %game.id,
        phase = %report.phase,
        next = %report.next_phase,
        adjudicator = adjudicator.name(),
        "processed turn"
    );
    Ok(report)
}
