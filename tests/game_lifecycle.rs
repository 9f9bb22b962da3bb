//! End-to-end exercise of the registry API: create and configure a game,
//! seat seven players, play through a full game year, and conclude.
//!
//! Run with:
//!     cargo test --test game_lifecycle

use std::collections::HashMap;

use dip_judge_engine::config::JudgeConfig;
use dip_judge_engine::judge::game::PressRules;
use dip_judge_engine::judge::player::PlayerId;
use dip_judge_engine::judge::press::PressTarget;
use dip_judge_engine::judge::registry::Judge;
use dip_judge_engine::map::power::{Power, Variant, POWERS};

fn new_judge() -> Judge {
    let mut config = JudgeConfig::default();
    config.auto_process = false;
    config.press = PressRules::Grey;
    Judge::new(config)
}

fn email_of(power: Power) -> String {
    format!("{}@example.com", power.name().to_lowercase())
}

fn register_all(judge: &Judge, game: &str) -> HashMap<Power, PlayerId> {
    let mut ids = HashMap::new();
    for power in POWERS {
        let id = judge
            .register_player(&format!("{power} Player"), &email_of(power), power, game)
            .expect("registration should succeed");
        ids.insert(power, id);
    }
    ids
}

#[test]
fn full_configuration_then_play() {
    let judge = new_judge();
    let game = judge
        .create_game("Lifecycle Test", "an end-to-end game", Some("standard"))
        .unwrap();

    // Configure the way a director would.
    judge
        .with_game_mut(&game, |g| {
            g.set_variant(Variant::Standard)?;
            g.set_press(PressRules::Grey);
            g.set_deadlines(24, 12);
            g.set_victory(true);
            g.set_access(1.0, 1.0, 2.0);
            Ok(())
        })
        .unwrap();

    let details = judge.game_details(&game).unwrap();
    assert_eq!(details.press, "grey");
    assert_eq!(details.victory_conditions, "DIAS");
    assert!(!details.deadline.is_empty());
    assert!(!details.started);

    // Seat everyone and check their standing.
    let ids = register_all(&judge, &game);
    assert_eq!(ids.len(), 7);
    let status = judge.player_status(&game, ids[&Power::England]).unwrap();
    assert_eq!(status.power, "England");
    assert_eq!(status.status, "ACTIVE");
    assert_eq!(status.units, 0);

    judge.begin_game(&game, false).unwrap();
    let state = judge.game_state(&game).unwrap();
    assert_eq!(state.phase, "S1901M");
    assert_eq!(state.season, "Spring");
    assert_eq!(state.year, 1901);
    let russia = state
        .players
        .iter()
        .find(|p| p.power == "Russia")
        .expect("Russia is seated");
    assert_eq!(russia.units, 4);
    assert_eq!(russia.centers, 4);
}

#[test]
fn press_respects_game_rules() {
    let judge = new_judge();
    let game = judge.create_game("Press Game", "", None).unwrap();
    let ids = register_all(&judge, &game);

    let delivery = judge
        .send_press_as_player(
            &game,
            ids[&Power::England],
            &PressTarget::Power(Power::France),
            "Hello France, would you like to ally against Germany?",
        )
        .unwrap();
    assert!(delivery.succeeded());
    let emails = judge.fetch_outbound();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, email_of(Power::France));
    assert!(emails[0].body.contains("ally against Germany"));

    // Broadcast reaches the other six.
    let delivery = judge
        .send_press_as_player(
            &game,
            ids[&Power::England],
            &PressTarget::All,
            "I propose a Western Triple Alliance!",
        )
        .unwrap();
    assert_eq!(delivery.delivered, 6);
    let emails = judge.fetch_outbound();
    assert_eq!(emails.len(), 6);
    assert!(emails.iter().all(|e| e.body.contains("Western Triple Alliance")));

    // A no-press game blocks everything.
    judge
        .with_game_mut(&game, |g| {
            g.set_press(PressRules::None);
            Ok(())
        })
        .unwrap();
    let blocked = judge.send_press_as_player(
        &game,
        ids[&Power::England],
        &PressTarget::Power(Power::France),
        "This should be blocked",
    );
    assert!(blocked.is_err());
    assert!(judge.fetch_outbound().is_empty());
}

#[test]
fn orders_through_a_full_game_year() {
    let judge = new_judge();
    let game = judge.create_game("Calendar Game", "", None).unwrap();
    let ids = register_all(&judge, &game);
    judge.begin_game(&game, false).unwrap();
    judge.fetch_outbound();

    // Spring movement, with real opening orders for England.
    let outcome = judge
        .submit_orders_as_player(
            &game,
            ids[&Power::England],
            "F LON-NTH\nA LVP-YOR\nF EDI-NWG",
        )
        .unwrap();
    assert!(outcome.accepted);

    // A garbled block is rejected wholesale.
    let outcome = judge
        .submit_orders_as_player(&game, ids[&Power::France], "F BRE-MAO\nX PAR-BUR")
        .unwrap();
    assert!(!outcome.accepted);

    // March the calendar through the year: S-M, S-R, F-M, F-R, W-B.
    let expected = ["S1901R", "F1901M", "F1901R", "W1901B", "S1902M"];
    for want in expected {
        judge.process_game(&game).unwrap();
        assert_eq!(judge.game_state(&game).unwrap().phase, want);
    }
    let year_of_results = judge
        .fetch_outbound()
        .iter()
        .filter(|e| e.subject.contains("RESULTS"))
        .count();
    // Five processed phases, seven players each.
    assert_eq!(year_of_results, 35);
}

#[test]
fn backup_restore_rewinds_a_turn() {
    let judge = new_judge();
    let game = judge.create_game("Rewind Game", "", None).unwrap();
    let ids = register_all(&judge, &game);
    judge.begin_game(&game, false).unwrap();

    let backup = judge.backup_game(&game).unwrap();
    judge
        .submit_orders_as_player(&game, ids[&Power::France], "A PAR-BUR")
        .unwrap();
    judge.process_game(&game).unwrap();
    assert_eq!(judge.game_state(&game).unwrap().phase, "S1901R");

    let restored = judge.restore_game(&backup).unwrap();
    assert_eq!(restored, game);
    let state = judge.game_state(&game).unwrap();
    assert_eq!(state.phase, "S1901M");
    assert_eq!(state.year, 1901);
    judge
        .with_game(&game, |g| assert!(g.history.is_empty()))
        .unwrap();
}

#[test]
fn dias_draw_ends_the_game() {
    let judge = new_judge();
    let game = judge.create_game("Draw Game", "", None).unwrap();
    let ids = register_all(&judge, &game);
    judge.begin_game(&game, false).unwrap();
    judge.fetch_outbound();

    // Six of seven agree: not a draw yet.
    for power in POWERS.iter().take(6) {
        let concluded = judge.vote_draw(&game, *power, true).unwrap();
        assert!(!concluded);
    }
    // Orders are still being accepted.
    assert!(judge
        .submit_orders_as_player(&game, ids[&Power::England], "F LON-NTH")
        .is_ok());

    let concluded = judge.vote_draw(&game, Power::Russia, true).unwrap();
    assert!(concluded);
    let emails = judge.fetch_outbound();
    assert_eq!(emails.len(), 7);
    assert!(emails.iter().all(|e| e.subject.contains("DRAW")));

    // A finished game refuses further orders.
    assert!(judge
        .submit_orders_as_player(&game, ids[&Power::England], "F LON-NTH")
        .is_err());
}

#[test]
fn linked_addresses_share_one_account() {
    let judge = new_judge();
    let game = judge.create_game("Alias Game", "", None).unwrap();
    let id = judge
        .register_player("Test Player", "test@example.com", Power::England, &game)
        .unwrap();
    judge
        .link_email("new-email@example.com", "test@example.com")
        .unwrap();
    let record = judge.find_player("new-email@example.com").unwrap();
    assert_eq!(record.id, id);

    // The alias cannot take a second seat in the same game.
    let dup = judge.register_player("Someone", "new-email@example.com", Power::France, &game);
    assert!(dup.is_err());
}
