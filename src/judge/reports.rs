//! Plain-text reports mailed back for the info commands.

use crate::judge::error::JudgeError;
use crate::judge::registry::Judge;
use crate::map;

/// LIST: every game the judge is running.
pub fn list_report(judge: &Judge) -> String {
    let games = judge.list_games();
    if games.is_empty() {
        return "No games are currently running.".to_string();
    }
    let mut lines = vec![format!("{} game(s):", games.len())];
    for g in games {
        let phase = if g.phase.is_empty() { "forming" } else { &g.phase };
        lines.push(format!("  {}  {}  {}  {} player(s)", g.id, g.name, phase, g.players));
    }
    lines.join("\n")
}

/// STATUS: one game's configuration and seats.
pub fn status_report(judge: &Judge, game_id: &str) -> Result<String, JudgeError> {
    let details = judge.game_details(game_id)?;
    let mut lines = vec![
        format!("Status of {} ({})", details.name, details.id),
        format!("variant: {}  press: {}  victory: {}", details.variant, details.press, details.victory_conditions),
        format!(
            "phase: {}  year: {}",
            if details.phase.is_empty() { "not started" } else { &details.phase },
            details.year
        ),
    ];
    if !details.deadline.is_empty() {
        lines.push(format!("deadline: {}  grace: {}", details.deadline, details.grace_time));
    }
    for seat in &details.player_list {
        let player = if seat.player.is_empty() { "(unowned)" } else { &seat.player };
        lines.push(format!(
            "  {:<8} {:<15} {} units {} centers {}",
            seat.power, seat.status, seat.units, seat.centers, player
        ));
    }
    Ok(lines.join("\n"))
}

/// SUMMARY: the one-paragraph version of STATUS.
pub fn summary_report(judge: &Judge, game_id: &str) -> Result<String, JudgeError> {
    let details = judge.game_details(game_id)?;
    Ok(format!(
        "{} ({}): {} game, {} of {} powers seated, {}",
        details.name,
        details.id,
        details.variant,
        details.player_list.iter().filter(|s| !s.player.is_empty()).count(),
        details.players,
        if details.started {
            format!("phase {}", details.phase)
        } else {
            "forming".to_string()
        },
    ))
}

/// CENTERS: the supply-center chart.
pub fn centers_report(judge: &Judge, game_id: &str) -> Result<String, JudgeError> {
    let details = judge.game_details(game_id)?;
    let mut lines = vec![format!(
        "Supply centers in {} ({} on the board):",
        details.id,
        map::supply_center_count()
    )];
    let mut owned = 0;
    for seat in &details.player_list {
        owned += seat.centers;
        lines.push(format!("  {:<8} {:>2} centers, {:>2} units", seat.power, seat.centers, seat.units));
    }
    lines.push(format!(
        "  {:<8} {:>2} centers",
        "Neutral",
        map::supply_center_count() as u32 - owned.min(map::supply_center_count() as u32)
    ));
    Ok(lines.join("\n"))
}

/// MOVES: who has orders in for the current phase. Order contents stay
/// sealed until the turn processes.
pub fn moves_report(judge: &Judge, game_id: &str) -> Result<String, JudgeError> {
    judge.with_game(game_id, |game| {
        let phase = match game.phase {
            Some(p) => p.to_string(),
            None => return format!("Game {} has not started.", game.id),
        };
        let mut lines = vec![format!("Orders received for {} phase {phase}:", game.id)];
        for seat in game.seats.iter().filter(|s| s.is_owned()) {
            let state = match game.orders.get(&seat.power) {
                Some(orders) => format!("{} order(s) in", orders.len()),
                None => "waiting".to_string(),
            };
            let wait = if seat.wait { " (wait flag set)" } else { "" };
            lines.push(format!("  {:<8} {state}{wait}", seat.power.name()));
        }
        lines.join("\n")
    })
}

/// HISTORY: every processed order, oldest first.
pub fn history_report(judge: &Judge, game_id: &str) -> Result<String, JudgeError> {
    judge.with_game(game_id, |game| {
        if game.history.is_empty() {
            format!("No turns have been processed in {}.", game.id)
        } else {
            let mut lines = vec![format!("History of {}:", game.id)];
            lines.extend(game.history.iter().cloned());
            lines.join("\n")
        }
    })
}

/// RESULTS: the most recently processed phase, reconstructed from history.
pub fn results_report(judge: &Judge, game_id: &str) -> Result<String, JudgeError> {
    judge.with_game(game_id, |game| {
        let Some(last) = game.history.last() else {
            return format!("No results yet for {}.", game.id);
        };
        // History lines open with the phase string.
        let last_phase = last.split_whitespace().next().unwrap_or_default();
        let mut lines = vec![format!("Results for {} phase {last_phase}:", game.id)];
        lines.extend(
            game.history
                .iter()
                .filter(|l| l.starts_with(last_phase))
                .cloned(),
        );
        lines.join("\n")
    })
}

/// MAP: the province table.
pub fn map_report() -> String {
    let mut lines = vec![format!(
        "Standard map: {} provinces, {} supply centers.",
        map::PROVINCES.len(),
        map::supply_center_count()
    )];
    for p in map::PROVINCES {
        let terrain = match p.terrain {
            map::Terrain::Land => "land",
            map::Terrain::Sea => "sea",
            map::Terrain::Coastal => "coastal",
        };
        let mut tags = vec![terrain.to_string()];
        if p.supply_center {
            tags.push("SC".to_string());
        }
        if let Some(home) = p.home {
            tags.push(format!("home of {home}"));
        }
        if !p.coasts.is_empty() {
            let coasts: Vec<&str> = p.coasts.iter().map(|c| c.abbrev()).collect();
            tags.push(format!("coasts {}", coasts.join("/")));
        }
        lines.push(format!("  {:<4} {:<22} {}", p.abbrev, p.name, tags.join(", ")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JudgeConfig;
    use crate::map::power::{Power, Variant};

    fn judge_with_game() -> (Judge, String) {
        let mut config = JudgeConfig::default();
        config.auto_process = false;
        let judge = Judge::new(config);
        let id = judge.create_game("Report Test", "", None).unwrap();
        for power in Variant::Standard.powers() {
            judge
                .register_player(
                    power.name(),
                    &format!("{}@example.com", power.name().to_lowercase()),
                    *power,
                    &id,
                )
                .unwrap();
        }
        (judge, id)
    }

    #[test]
    fn list_covers_all_games() {
        let (judge, id) = judge_with_game();
        judge.create_game("Second Game", "", None).unwrap();
        let report = list_report(&judge);
        assert!(report.contains(&id));
        assert!(report.contains("Second Game"));
        assert!(report.contains("forming"));
    }

    #[test]
    fn status_and_summary_track_lifecycle() {
        let (judge, id) = judge_with_game();
        let report = status_report(&judge, &id).unwrap();
        assert!(report.contains("not started"));
        assert!(report.contains("England"));

        judge.begin_game(&id, false).unwrap();
        let report = status_report(&judge, &id).unwrap();
        assert!(report.contains("S1901M"));
        let summary = summary_report(&judge, &id).unwrap();
        assert!(summary.contains("7 of 7 powers"));
        assert!(summary.contains("phase S1901M"));
    }

    #[test]
    fn centers_chart_accounts_for_neutrals() {
        let (judge, id) = judge_with_game();
        judge.begin_game(&id, false).unwrap();
        let report = centers_report(&judge, &id).unwrap();
        // 34 minus the 22 seeded home centers.
        assert!(report.contains("Neutral"));
        assert!(report.contains("12"));
        assert!(report.contains("Russia"));
    }

    #[test]
    fn moves_conceal_contents() {
        let (judge, id) = judge_with_game();
        judge.begin_game(&id, false).unwrap();
        judge
            .submit_orders_as_power(&id, Power::England, "F LON-NTH\nA LVP-YOR")
            .unwrap();
        let report = moves_report(&judge, &id).unwrap();
        assert!(report.contains("England"));
        assert!(report.contains("2 order(s) in"));
        assert!(report.contains("waiting"));
        assert!(!report.contains("LON"));
    }

    #[test]
    fn history_and_results_follow_processing() {
        let (judge, id) = judge_with_game();
        judge.begin_game(&id, false).unwrap();
        assert!(history_report(&judge, &id).unwrap().contains("No turns"));

        judge
            .submit_orders_as_power(&id, Power::England, "F LON-NTH")
            .unwrap();
        judge.process_game(&id).unwrap();
        let history = history_report(&judge, &id).unwrap();
        assert!(history.contains("S1901M England: F LON - NTH"));
        let results = results_report(&judge, &id).unwrap();
        assert!(results.contains("phase S1901M"));
    }

    #[test]
    fn map_report_lists_split_coasts() {
        let report = map_report();
        assert!(report.contains("75 provinces"));
        assert!(report.contains("St Petersburg"));
        assert!(report.contains("coasts NC/SC"));
    }
}
