//! The email command processor: njudge's command vocabulary over the
//! registry. Every handled command queues at least one reply email.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::judge::player::{Absence, PlayerRecord};
use crate::judge::press::PressTarget;
use crate::judge::registry::Judge;
use crate::judge::reports;
use crate::map::power::Power;

/// A reply queued back to the sender.
type Reply = (String, String);

struct Ctx<'a> {
    judge: &'a Judge,
    from: &'a str,
}

impl Ctx<'_> {
    fn player(&self) -> Option<PlayerRecord> {
        self.judge.find_player(self.from)
    }

    /// Pick the game a command applies to: the explicit argument, else the
    /// sender's sole seat, else the sender's sole mastered game.
    fn resolve_game(&self, explicit: Option<&str>) -> Result<String, Reply> {
        if let Some(id) = explicit {
            let id = id.trim();
            return match self.judge.with_game(id, |_| ()) {
                Ok(()) => Ok(id.to_string()),
                Err(_) => Err((
                    "ERROR unknown game".into(),
                    format!("There is no game named {id:?}."),
                )),
            };
        }
        let seated = self.judge.games_of(self.from);
        if seated.len() == 1 {
            return Ok(seated.into_iter().next().expect("len checked"));
        }
        let mastered = self.judge.games_mastered_by(self.from);
        if mastered.len() == 1 {
            return Ok(mastered.into_iter().next().expect("len checked"));
        }
        Err((
            "ERROR ambiguous game".into(),
            "Please name the game this command applies to.".into(),
        ))
    }

    fn seat_power(&self, game: &str) -> Result<Power, Reply> {
        let player = self.player().ok_or_else(|| {
            (
                "ERROR not registered".into(),
                format!("{} is not a registered address.", self.from),
            )
        })?;
        self.judge
            .with_game(game, |g| g.seat_of_player(player.id).map(|s| s.power))
            .ok()
            .flatten()
            .ok_or_else(|| {
                (
                    "ERROR no seat".into(),
                    format!("{} holds no power in game {game}.", self.from),
                )
            })
    }

    fn require_master(&self, game: &str, cmd: &str) -> Result<(), Reply> {
        let is_master = self
            .judge
            .with_game(game, |g| {
                g.master
                    .as_ref()
                    .is_some_and(|m| m.email.eq_ignore_ascii_case(self.from))
            })
            .unwrap_or(false);
        if is_master {
            Ok(())
        } else {
            Err((
                format!("{cmd} refused"),
                format!("Only the master of game {game} may issue {cmd}."),
            ))
        }
    }
}

fn err_reply(cmd: &str, detail: impl std::fmt::Display) -> Reply {
    (format!("{cmd} failed"), detail.to_string())
}

/// Process free-form command text from `from`. Returns true when the text
/// was recognized; the outcome itself is reported by reply email.
pub fn process_text(judge: &Judge, text: &str, from: &str) -> bool {
    let text = text.trim();
    let mut lines = text.lines();
    let Some(first) = lines.next().map(str::trim).filter(|l| !l.is_empty()) else {
        return false;
    };
    let body: Vec<&str> = lines.collect();
    let words: Vec<&str> = first.split_whitespace().collect();
    let keyword = words[0].to_ascii_uppercase();
    let ctx = Ctx { judge, from };

    let reply = match keyword.as_str() {
        "JOIN" => join(&ctx, &words),
        "OBSERVE" => observe(&ctx, &words),
        "REMOVE" => remove(&ctx, &words),
        "LIST" => Some(("LIST".into(), reports::list_report(judge))),
        "STATUS" => info(&ctx, "STATUS", words.get(1).copied(), reports::status_report),
        "RESULTS" => info(&ctx, "RESULTS", words.get(1).copied(), reports::results_report),
        "SUMMARY" => info(&ctx, "SUMMARY", words.get(1).copied(), reports::summary_report),
        "CENTERS" => info(&ctx, "CENTERS", words.get(1).copied(), reports::centers_report),
        "MOVES" => info(&ctx, "MOVES", words.get(1).copied(), reports::moves_report),
        "HISTORY" => info(&ctx, "HISTORY", words.get(1).copied(), reports::history_report),
        "MAP" => Some(("MAP".into(), reports::map_report())),
        "ORDERS" => orders_block(&ctx, &words, &body),
        "PRESS" => press_send(&ctx, first, &body),
        "NO" | "YES" => yes_no(&ctx, &keyword, &words),
        "SET" => set_command(&ctx, &words),
        "UNSET" => unset_command(&ctx, &words),
        "WAIT" if words.get(1).map(|w| w.eq_ignore_ascii_case("ALL")) == Some(true) => {
            Some(wait_all(&ctx))
        }
        "DRAW" if words.get(1).map(|w| w.eq_ignore_ascii_case("PROPOSED")) == Some(true) => {
            Some(draw_proposed(&ctx))
        }
        "BECOME" => become_command(&ctx, &words),
        "ASSIGN" => Some(assign(&ctx, &words)),
        "EJECT" => Some(eject(&ctx, &words)),
        "FORCE" if words.get(1).map(|w| w.eq_ignore_ascii_case("BEGIN")) == Some(true) => {
            Some(force_begin(&ctx, words.get(2).copied()))
        }
        "PROCESS" => Some(process_now(&ctx)),
        "PAUSE" => Some(pause_resume(&ctx, "PAUSE")),
        "RESUME" => Some(pause_resume(&ctx, "RESUME")),
        "BROADCAST" => Some(broadcast(&ctx, first)),
        _ => None,
    };

    match reply {
        Some((subject, body)) => {
            judge.post(from, &subject, &body);
            true
        }
        None => {
            tracing::debug!(from, first, "unrecognized command text");
            false
        }
    }
}

/// Process a piece of inbound email. Commands may arrive on the subject
/// line, in the body, or split across both.
pub fn inbound_email(judge: &Judge, subject: &str, body: &str, from: &str) -> bool {
    let combined = format!("{subject}\n{body}");
    if process_text(judge, &combined, from) {
        return true;
    }
    process_text(judge, body, from)
}

// --- Enrollment ---

fn join(ctx: &Ctx, words: &[&str]) -> Option<Reply> {
    let game = match ctx.resolve_game(words.get(1).copied()) {
        Ok(g) => g,
        Err(e) => return Some(e),
    };
    let power = match words.get(2) {
        Some(p) => match Power::parse(p) {
            Ok(p) => Some(p),
            Err(e) => return Some(err_reply("JOIN", e)),
        },
        None => ctx
            .judge
            .with_game(&game, |g| g.open_seats().next().map(|s| s.power))
            .ok()
            .flatten(),
    };
    let Some(power) = power else {
        return Some(err_reply("JOIN", format!("game {game} has no open seats")));
    };
    let name = ctx.from.split('@').next().unwrap_or(ctx.from).to_string();
    match ctx.judge.register_player(&name, ctx.from, power, &game) {
        Ok(_) => Some((
            format!("JOIN {game}"),
            format!("You have joined game {game} as {power}."),
        )),
        Err(e) => Some(err_reply("JOIN", e)),
    }
}

fn observe(ctx: &Ctx, words: &[&str]) -> Option<Reply> {
    let game = match ctx.resolve_game(words.get(1).copied()) {
        Ok(g) => g,
        Err(e) => return Some(e),
    };
    match ctx.judge.add_observer(&game, ctx.from) {
        Ok(()) => Some((
            format!("OBSERVE {game}"),
            format!("You are now observing game {game}."),
        )),
        Err(e) => Some(err_reply("OBSERVE", e)),
    }
}

fn remove(ctx: &Ctx, words: &[&str]) -> Option<Reply> {
    let game = match ctx.resolve_game(words.get(1).copied()) {
        Ok(g) => g,
        Err(e) => return Some(e),
    };
    let power = match ctx.seat_power(&game) {
        Ok(p) => p,
        Err(e) => return Some(e),
    };
    match ctx.judge.eject_power(&game, power) {
        Ok(()) => Some((
            format!("REMOVE {game}"),
            format!("You have been removed from game {game}; {power} is open."),
        )),
        Err(e) => Some(err_reply("REMOVE", e)),
    }
}

// --- Info ---

fn info(
    ctx: &Ctx,
    cmd: &str,
    arg: Option<&str>,
    build: impl Fn(&Judge, &str) -> Result<String, crate::judge::error::JudgeError>,
) -> Option<Reply> {
    let game = match ctx.resolve_game(arg) {
        Ok(g) => g,
        Err(e) => return Some(e),
    };
    match build(ctx.judge, &game) {
        Ok(report) => Some((format!("{cmd} {game}"), report)),
        Err(e) => Some(err_reply(cmd, e)),
    }
}

// --- Orders ---

fn orders_block(ctx: &Ctx, words: &[&str], body: &[&str]) -> Option<Reply> {
    let game = match ctx.resolve_game(words.get(1).copied()) {
        Ok(g) => g,
        Err(e) => return Some(e),
    };
    let power = match ctx.seat_power(&game) {
        Ok(p) => p,
        Err(e) => return Some(e),
    };
    let block: Vec<&str> = body
        .iter()
        .map(|l| l.trim())
        .take_while(|l| {
            !l.eq_ignore_ascii_case("END") && !l.eq_ignore_ascii_case("ENDORDERS")
        })
        .collect();
    let text = block.join("\n");
    match ctx.judge.submit_orders_as_power(&game, power, &text) {
        Ok(outcome) => {
            let mut lines = vec![if outcome.accepted {
                format!("Orders accepted for {power} in game {game}:")
            } else {
                format!("Orders REJECTED for {power} in game {game}:")
            }];
            for line in &outcome.lines {
                match &line.result {
                    Ok(order) => lines.push(format!("  ok: {order}")),
                    Err(e) => lines.push(format!("  invalid: {e}")),
                }
            }
            if outcome.lines.is_empty() {
                lines.push("  (no order lines found)".into());
            }
            Some((format!("ORDERS {game}"), lines.join("\n")))
        }
        Err(e) => Some(err_reply("ORDERS", e)),
    }
}

// --- Press ---

fn press_send(ctx: &Ctx, first: &str, body: &[&str]) -> Option<Reply> {
    // Forms: `PRESS TO ALL`, `PRESS FROM ENGLAND TO FRANCE, GERMANY`.
    // The FROM clause is advisory; delivery is always attributed to the
    // sender's actual seat.
    let upper = first.to_ascii_uppercase();
    let to_at = upper.find(" TO ")?;
    let target = match PressTarget::parse(&first[to_at + 4..]) {
        Ok(t) => t,
        Err(e) => return Some(err_reply("PRESS", e)),
    };
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return Some(e),
    };
    let from = match ctx.seat_power(&game) {
        Ok(p) => p,
        Err(e) => return Some(e),
    };
    let message = body.join("\n");
    match ctx.judge.send_press_as_power(&game, from, &target, &message) {
        Ok(delivery) if delivery.succeeded() => Some((
            format!("PRESS {game}"),
            format!("Press delivered to {} recipient(s).", delivery.delivered),
        )),
        Ok(delivery) => Some((
            format!("PRESS {game}"),
            format!(
                "Press was not delivered; {} recipient(s) refuse press from you.",
                delivery.refused.len()
            ),
        )),
        Err(e) => Some(err_reply("PRESS", e)),
    }
}

// --- YES / NO family ---

fn yes_no(ctx: &Ctx, keyword: &str, words: &[&str]) -> Option<Reply> {
    let yes = keyword == "YES";
    match words.get(1).map(|w| w.to_ascii_uppercase()).as_deref() {
        Some("PRESS") => Some(press_control(ctx, yes, words)),
        Some("DRAW") => Some(draw_vote(ctx, yes)),
        // `NO F LON` retracts a standing order.
        Some(_) if !yes => Some(retract(ctx, words)),
        _ => None,
    }
}

fn press_control(ctx: &Ctx, allow: bool, words: &[&str]) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    let power = match ctx.seat_power(&game) {
        Ok(p) => p,
        Err(e) => return e,
    };
    // `... PRESS FROM <power>` targets one sender; bare `... PRESS` is the
    // blanket setting.
    let from_power = match (
        words.get(2).map(|w| w.to_ascii_uppercase()).as_deref(),
        words.get(3),
    ) {
        (Some("FROM"), Some(p)) => match Power::parse(p) {
            Ok(p) => Some(p),
            Err(e) => return err_reply("PRESS", e),
        },
        _ => None,
    };
    let result = ctx.judge.with_game_mut(&game, |g| {
        let seat = g
            .seat_mut(power)
            .ok_or_else(|| crate::judge::error::JudgeError::UnknownPower(power.name().into()))?;
        match (allow, from_power) {
            (false, Some(p)) => seat.block_press_from(p),
            (true, Some(p)) => seat.unblock_press_from(p),
            (false, None) => seat.press_muted = true,
            (true, None) => seat.press_muted = false,
        }
        Ok(())
    });
    match result {
        Ok(()) => {
            let what = match from_power {
                Some(p) => format!("press from {p}"),
                None => "all press".to_string(),
            };
            let verb = if allow { "accepting" } else { "refusing" };
            (
                format!("PRESS {game}"),
                format!("{power} is now {verb} {what}."),
            )
        }
        Err(e) => err_reply("PRESS", e),
    }
}

fn draw_vote(ctx: &Ctx, yes: bool) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    let power = match ctx.seat_power(&game) {
        Ok(p) => p,
        Err(e) => return e,
    };
    match ctx.judge.vote_draw(&game, power, yes) {
        Ok(concluded) => {
            let vote = if yes { "for" } else { "against" };
            let mut body = format!("Your vote {vote} a draw in game {game} is recorded.");
            if concluded {
                body.push_str(" The draw has carried; the game is over.");
            }
            (format!("DRAW {game}"), body)
        }
        Err(e) => err_reply("DRAW", e),
    }
}

/// The master puts a draw to the table; everyone is asked to vote.
fn draw_proposed(ctx: &Ctx) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    if let Err(e) = ctx.require_master(&game, "DRAW") {
        return e;
    }
    match ctx.judge.broadcast(
        &game,
        &format!("DRAW {game}"),
        "A draw has been proposed. Vote with SET DRAW YES or SET DRAW NO.",
    ) {
        Ok(count) => (
            format!("DRAW {game}"),
            format!("Draw proposal sent to {count} recipient(s)."),
        ),
        Err(e) => err_reply("DRAW", e),
    }
}

fn retract(ctx: &Ctx, words: &[&str]) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    let power = match ctx.seat_power(&game) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let origin = words[1..].join(" ");
    let retracted = ctx
        .judge
        .with_game_mut(&game, |g| Ok(g.retract_order(power, &origin)))
        .unwrap_or(false);
    if retracted {
        (
            format!("ORDERS {game}"),
            format!("Order for {origin} retracted."),
        )
    } else {
        err_reply("ORDERS", format!("no standing order for {origin}"))
    }
}

// --- SET / UNSET ---

fn set_command(ctx: &Ctx, words: &[&str]) -> Option<Reply> {
    match words.get(1).map(|w| w.to_ascii_uppercase()).as_deref() {
        Some("DRAW") => match words.get(2).map(|w| w.to_ascii_uppercase()).as_deref() {
            Some("YES") => Some(draw_vote(ctx, true)),
            Some("NO") => Some(draw_vote(ctx, false)),
            _ => Some(err_reply("DRAW", "expected SET DRAW YES or SET DRAW NO")),
        },
        Some("CONCEDE") => Some(concede(ctx, words.get(2).copied(), true)),
        Some("WAIT") => Some(set_wait(ctx, true)),
        Some("ABSENCE") => Some(set_absence(ctx, words.get(2).copied(), words.get(3).copied())),
        Some("DEADLINE") => Some(master_hours(ctx, "DEADLINE", words.get(2).copied())),
        Some("GRACE") => Some(master_hours(ctx, "GRACE", words.get(2).copied())),
        Some("MODERATE") => Some(set_moderated(ctx, true)),
        Some("UNMODERATE") => Some(set_moderated(ctx, false)),
        _ => None,
    }
}

fn unset_command(ctx: &Ctx, words: &[&str]) -> Option<Reply> {
    match words.get(1).map(|w| w.to_ascii_uppercase()).as_deref() {
        Some("CONCEDE") => Some(concede(ctx, words.get(2).copied(), false)),
        Some("WAIT") => Some(set_wait(ctx, false)),
        Some("ABSENCE") => Some(unset_absence(ctx)),
        _ => None,
    }
}

fn concede(ctx: &Ctx, beneficiary: Option<&str>, set: bool) -> Reply {
    let Some(beneficiary) = beneficiary else {
        return err_reply("CONCEDE", "name the power to concede to");
    };
    let beneficiary = match Power::parse(beneficiary) {
        Ok(p) => p,
        Err(e) => return err_reply("CONCEDE", e),
    };
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    let voter = match ctx.seat_power(&game) {
        Ok(p) => p,
        Err(e) => return e,
    };
    if set {
        match ctx.judge.vote_concede(&game, voter, beneficiary) {
            Ok(Some(winner)) => (
                format!("CONCEDE {game}"),
                format!("CONCEDE to {winner} has carried; the game is over."),
            ),
            Ok(None) => (
                format!("CONCEDE {game}"),
                format!("Your CONCEDE vote to {beneficiary} is recorded."),
            ),
            Err(e) => err_reply("CONCEDE", e),
        }
    } else {
        match ctx
            .judge
            .with_game_mut(&game, |g| {
                g.unset_concede(voter);
                Ok(())
            }) {
            Ok(()) => (
                format!("CONCEDE {game}"),
                format!("Your CONCEDE vote to {beneficiary} is withdrawn."),
            ),
            Err(e) => err_reply("CONCEDE", e),
        }
    }
}

fn set_wait(ctx: &Ctx, wait: bool) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    let power = match ctx.seat_power(&game) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let result = ctx.judge.with_game_mut(&game, |g| {
        if let Some(seat) = g.seat_mut(power) {
            seat.wait = wait;
        }
        Ok(())
    });
    match result {
        Ok(()) => (
            format!("WAIT {game}"),
            if wait {
                format!("{power} will wait; the turn will not process early.")
            } else {
                format!("Wait flag cleared for {power}.")
            },
        ),
        Err(e) => err_reply("WAIT", e),
    }
}

fn wait_all(ctx: &Ctx) -> Reply {
    let games = ctx.judge.games_of(ctx.from);
    if games.is_empty() {
        return err_reply("WAIT", format!("{} holds no seats", ctx.from));
    }
    let mut set = 0;
    for game in &games {
        if let Ok(power) = ctx.seat_power(game) {
            let _ = ctx.judge.with_game_mut(game, |g| {
                if let Some(seat) = g.seat_mut(power) {
                    seat.wait = true;
                    set += 1;
                }
                Ok(())
            });
        }
    }
    (
        "WAIT ALL".into(),
        format!("Wait flag set in {set} game(s)."),
    )
}

fn set_absence(ctx: &Ctx, from: Option<&str>, until: Option<&str>) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    let power = match ctx.seat_power(&game) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let parse_day = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt))
    };
    let (start, end, described) = match (from, until) {
        (Some(f), Some(u)) => match (parse_day(f), parse_day(u)) {
            (Some(start), Some(end)) if end >= start => {
                (start, end, format!("from {f} until {u}"))
            }
            _ => return err_reply("ABSENCE", "dates must be YYYY-MM-DD, start before end"),
        },
        // Undated absence: a week from now.
        _ => {
            let start = Utc::now();
            (start, start + chrono::Duration::days(7), "for one week".to_string())
        }
    };
    let result = ctx.judge.with_game_mut(&game, |g| {
        if let Some(seat) = g.seat_mut(power) {
            seat.absence = Some(Absence { from: start, until: end });
        }
        Ok(())
    });
    match result {
        Ok(()) => (
            format!("ABSENCE {game}"),
            format!("Absence recorded for {power} {described}."),
        ),
        Err(e) => err_reply("ABSENCE", e),
    }
}

fn unset_absence(ctx: &Ctx) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    let power = match ctx.seat_power(&game) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let result = ctx.judge.with_game_mut(&game, |g| {
        if let Some(seat) = g.seat_mut(power) {
            seat.absence = None;
        }
        Ok(())
    });
    match result {
        Ok(()) => (
            format!("ABSENCE {game}"),
            format!("Absence cleared for {power}."),
        ),
        Err(e) => err_reply("ABSENCE", e),
    }
}

fn master_hours(ctx: &Ctx, what: &str, hours: Option<&str>) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    if let Err(e) = ctx.require_master(&game, what) {
        return e;
    }
    let Some(hours) = hours.and_then(|h| h.parse::<u32>().ok()) else {
        return err_reply(what, "expected a number of hours");
    };
    let result = ctx.judge.with_game_mut(&game, |g| {
        match what {
            "DEADLINE" => g.set_deadlines(hours, g.grace_hours),
            _ => g.set_deadlines(g.deadline_hours, hours),
        }
        Ok(())
    });
    match result {
        Ok(()) => (
            format!("{what} {game}"),
            format!("{what} for game {game} set to {hours} hour(s)."),
        ),
        Err(e) => err_reply(what, e),
    }
}

fn set_moderated(ctx: &Ctx, moderated: bool) -> Reply {
    let cmd = if moderated { "MODERATE" } else { "UNMODERATE" };
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    if let Err(e) = ctx.require_master(&game, cmd) {
        return e;
    }
    let _ = ctx.judge.with_game_mut(&game, |g| {
        g.moderated = moderated;
        Ok(())
    });
    (
        format!("{cmd} {game}"),
        format!(
            "Game {game} is now {}.",
            if moderated { "moderated" } else { "unmoderated" }
        ),
    )
}

// --- Master commands ---

fn become_command(ctx: &Ctx, words: &[&str]) -> Option<Reply> {
    match words.get(1) {
        Some(w) if w.eq_ignore_ascii_case("MASTER") => {
            Some(become_master(ctx, words.get(2).copied(), words.get(3).copied()))
        }
        Some(p) => {
            let power = match Power::parse(p) {
                Ok(p) => p,
                Err(e) => return Some(err_reply("BECOME", e)),
            };
            let game = match ctx.resolve_game(None) {
                Ok(g) => g,
                Err(e) => return Some(e),
            };
            if let Err(e) = ctx.require_master(&game, "BECOME") {
                return Some(e);
            }
            match ctx.judge.assign_power(&game, power, ctx.from) {
                Ok(_) => Some((
                    format!("BECOME {game}"),
                    format!("You now control {power} in game {game}."),
                )),
                Err(e) => Some(err_reply("BECOME", e)),
            }
        }
        None => None,
    }
}

fn become_master(ctx: &Ctx, password: Option<&str>, game_arg: Option<&str>) -> Reply {
    let Some(password) = password else {
        return err_reply("MASTER", "a password is required");
    };
    let game = match ctx.resolve_game(game_arg) {
        Ok(g) => g,
        Err(e) => return e,
    };
    let authorized = ctx
        .judge
        .config()
        .master_password
        .as_deref()
        .is_some_and(|p| p == password)
        || ctx
            .judge
            .with_game(&game, |g| {
                g.master
                    .as_ref()
                    .and_then(|m| m.password.as_deref())
                    .is_some_and(|p| p == password)
            })
            .unwrap_or(false);
    if !authorized {
        return err_reply("MASTER", "password not accepted");
    }
    match ctx
        .judge
        .set_master(&game, ctx.from, Some(password.to_string()))
    {
        Ok(()) => (
            format!("MASTER {game}"),
            format!("You are now the master of game {game}."),
        ),
        Err(e) => err_reply("MASTER", e),
    }
}

fn assign(ctx: &Ctx, words: &[&str]) -> Reply {
    let (Some(power), Some(email)) = (words.get(1), words.get(2)) else {
        return err_reply("ASSIGN", "usage: ASSIGN <power> <email>");
    };
    let power = match Power::parse(power) {
        Ok(p) => p,
        Err(e) => return err_reply("ASSIGN", e),
    };
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    if let Err(e) = ctx.require_master(&game, "ASSIGN") {
        return e;
    }
    match ctx.judge.assign_power(&game, power, email) {
        Ok(_) => {
            ctx.judge.post(
                email,
                &format!("ASSIGN {game}"),
                &format!("You have been assigned {power} in game {game}."),
            );
            (
                format!("ASSIGN {game}"),
                format!("{power} in game {game} assigned to {email}."),
            )
        }
        Err(e) => err_reply("ASSIGN", e),
    }
}

fn eject(ctx: &Ctx, words: &[&str]) -> Reply {
    let Some(power) = words.get(1) else {
        return err_reply("EJECT", "usage: EJECT <power>");
    };
    let power = match Power::parse(power) {
        Ok(p) => p,
        Err(e) => return err_reply("EJECT", e),
    };
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    if let Err(e) = ctx.require_master(&game, "EJECT") {
        return e;
    }
    match ctx.judge.eject_power(&game, power) {
        Ok(()) => (
            format!("EJECT {game}"),
            format!("The player of {power} has been ejected from game {game}."),
        ),
        Err(e) => err_reply("EJECT", e),
    }
}

fn force_begin(ctx: &Ctx, game_arg: Option<&str>) -> Reply {
    let game = match ctx.resolve_game(game_arg) {
        Ok(g) => g,
        Err(e) => return e,
    };
    if let Err(e) = ctx.require_master(&game, "BEGIN") {
        return e;
    }
    match ctx.judge.begin_game(&game, true) {
        Ok(()) => {
            let _ = ctx.judge.broadcast(
                &game,
                &format!("BEGIN {game}"),
                &format!("Game {game} has begun. Spring 1901 orders are due."),
            );
            (
                format!("BEGIN {game}"),
                format!("Game {game} has been forced to begin."),
            )
        }
        Err(e) => err_reply("BEGIN", e),
    }
}

fn process_now(ctx: &Ctx) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    if let Err(e) = ctx.require_master(&game, "PROCESS") {
        return e;
    }
    match ctx.judge.process_game(&game) {
        Ok(report) => (
            format!("PROCESS {game}"),
            format!(
                "Phase {} processed; the game is now in {}.",
                report.phase, report.next_phase
            ),
        ),
        Err(e) => err_reply("PROCESS", e),
    }
}

fn pause_resume(ctx: &Ctx, cmd: &str) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    if let Err(e) = ctx.require_master(&game, cmd) {
        return e;
    }
    let result = ctx.judge.with_game_mut(&game, |g| {
        if cmd == "PAUSE" {
            g.pause()
        } else {
            g.resume()
        }
    });
    match result {
        Ok(()) => (
            format!("{cmd} {game}"),
            format!(
                "Game {game} is {}.",
                if cmd == "PAUSE" { "paused" } else { "running again" }
            ),
        ),
        Err(e) => err_reply(cmd, e),
    }
}

fn broadcast(ctx: &Ctx, first: &str) -> Reply {
    let game = match ctx.resolve_game(None) {
        Ok(g) => g,
        Err(e) => return e,
    };
    if let Err(e) = ctx.require_master(&game, "BROADCAST") {
        return e;
    }
    let message = first
        .split_once(' ')
        .map(|(_, rest)| rest.trim())
        .unwrap_or_default();
    if message.is_empty() {
        return err_reply("BROADCAST", "nothing to broadcast");
    }
    match ctx
        .judge
        .broadcast(&game, &format!("BROADCAST {game}"), message)
    {
        Ok(count) => (
            format!("BROADCAST {game}"),
            format!("Broadcast sent to {count} recipient(s)."),
        ),
        Err(e) => err_reply("BROADCAST", e),
    }
}
