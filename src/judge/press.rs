//! Press routing: who may talk to whom, and what the recipient sees.

use crate::judge::error::JudgeError;
use crate::judge::game::{Game, PressRules};
use crate::judge::mailer::Mailbox;
use crate::judge::player::PlayerId;
use crate::map::power::Power;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressTarget {
    Power(Power),
    Powers(Vec<Power>),
    /// Broadcast to every other occupied seat.
    All,
}

impl PressTarget {
    /// Parse a recipient list: `ALL`, one power, or `FRANCE, GERMANY`.
    pub fn parse(text: &str) -> Result<PressTarget, JudgeError> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("all") {
            return Ok(PressTarget::All);
        }
        let mut powers = Vec::new();
        for part in text.split(',') {
            powers.push(Power::parse(part)?);
        }
        match powers.len() {
            0 => Err(JudgeError::PressBlocked("empty recipient list".into())),
            1 => Ok(PressTarget::Power(powers[0])),
            _ => Ok(PressTarget::Powers(powers)),
        }
    }
}

#[derive(Debug)]
pub struct PressDelivery {
    pub delivered: usize,
    /// Recipients whose block settings swallowed the message.
    pub refused: Vec<Power>,
}

impl PressDelivery {
    pub fn succeeded(&self) -> bool {
        self.delivered > 0
    }
}

/// Route a press message, enforcing the game's press mode and each
/// recipient's block list. Delivered press becomes outbound email.
pub fn send_press<F>(
    game: &Game,
    from: Power,
    target: &PressTarget,
    message: &str,
    lookup_email: F,
    mailbox: &mut Mailbox,
) -> Result<PressDelivery, JudgeError>
where
    F: Fn(PlayerId) -> Option<String>,
{
    if game.press == PressRules::None {
        return Err(JudgeError::PressBlocked(format!(
            "game {} is no-press",
            game.id
        )));
    }
    let sender = game
        .seat(from)
        .ok_or_else(|| JudgeError::UnknownPower(from.name().to_string()))?;
    if !sender.is_owned() {
        return Err(JudgeError::PressBlocked(format!(
            "{} has no player",
            from.name()
        )));
    }

    let recipients: Vec<Power> = match target {
        PressTarget::Power(p) => vec![*p],
        PressTarget::Powers(ps) => ps.clone(),
        PressTarget::All => game
            .seats
            .iter()
            .filter(|s| s.is_owned() && s.power != from)
            .map(|s| s.power)
            .collect(),
    };

    let attribution = match game.press {
        PressRules::Grey => "an anonymous power".to_string(),
        _ => from.name().to_string(),
    };
    let subject = format!("PRESS {}", game.id);
    let body = format!("Press from {attribution}:\n{message}");

    let mut delivered = 0;
    let mut refused = Vec::new();
    for power in recipients {
        let seat = game
            .seat(power)
            .ok_or_else(|| JudgeError::UnknownPower(power.name().to_string()))?;
        if !seat.accepts_press_from(from) {
            refused.push(power);
            continue;
        }
        let Some(player) = seat.player else {
            refused.push(power);
            continue;
        };
        let Some(email) = lookup_email(player) else {
            refused.push(power);
            continue;
        };
        mailbox.push(email, subject.clone(), body.clone());
        delivered += 1;
    }

    Ok(PressDelivery { delivered, refused })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::player::PlayerId;
    use crate::map::power::Variant;
    use std::collections::HashMap;

    fn setup() -> (Game, HashMap<PlayerId, String>, Mailbox) {
        let mut game = Game::new(
            "abcd1234".into(),
            "Press Test".into(),
            String::new(),
            Variant::Standard,
        );
        let mut emails = HashMap::new();
        for (i, power) in Variant::Standard.powers().iter().enumerate() {
            let id = i as PlayerId + 1;
            game.claim_seat(*power, id).unwrap();
            emails.insert(id, format!("{}@example.com", power.name().to_lowercase()));
        }
        game.set_press(PressRules::Grey);
        (game, emails, Mailbox::new("judge@example.com"))
    }

    #[test]
    fn direct_press_reaches_recipient() {
        let (game, emails, mut mailbox) = setup();
        let delivery = send_press(
            &game,
            Power::England,
            &PressTarget::Power(Power::France),
            "would you like to ally against Germany?",
            |id| emails.get(&id).cloned(),
            &mut mailbox,
        )
        .unwrap();
        assert!(delivery.succeeded());

        let sent = mailbox.drain();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "france@example.com");
        assert!(sent[0].body.contains("ally against Germany"));
        // Grey press hides the sender.
        assert!(!sent[0].body.contains("England"));
    }

    #[test]
    fn white_press_is_attributed() {
        let (mut game, emails, mut mailbox) = setup();
        game.set_press(PressRules::White);
        send_press(
            &game,
            Power::England,
            &PressTarget::Power(Power::France),
            "hello",
            |id| emails.get(&id).cloned(),
            &mut mailbox,
        )
        .unwrap();
        let sent = mailbox.drain();
        assert!(sent[0].body.contains("England"));
    }

    #[test]
    fn broadcast_excludes_sender() {
        let (game, emails, mut mailbox) = setup();
        let delivery = send_press(
            &game,
            Power::England,
            &PressTarget::All,
            "I propose a Western Triple Alliance!",
            |id| emails.get(&id).cloned(),
            &mut mailbox,
        )
        .unwrap();
        assert_eq!(delivery.delivered, 6);
        let sent = mailbox.drain();
        assert_eq!(sent.len(), 6);
        assert!(sent.iter().all(|e| e.to != "england@example.com"));
        assert!(sent.iter().all(|e| e.body.contains("Western Triple Alliance")));
    }

    #[test]
    fn no_press_games_block_everything() {
        let (mut game, emails, mut mailbox) = setup();
        game.set_press(PressRules::None);
        let result = send_press(
            &game,
            Power::England,
            &PressTarget::Power(Power::France),
            "This should be blocked",
            |id| emails.get(&id).cloned(),
            &mut mailbox,
        );
        assert!(matches!(result, Err(JudgeError::PressBlocked(_))));
        assert_eq!(mailbox.pending(), 0);
    }

    #[test]
    fn recipient_blocks_are_honored() {
        let (mut game, emails, mut mailbox) = setup();
        game.seat_mut(Power::England)
            .unwrap()
            .block_press_from(Power::France);
        let delivery = send_press(
            &game,
            Power::France,
            &PressTarget::Power(Power::England),
            "blocked",
            |id| emails.get(&id).cloned(),
            &mut mailbox,
        )
        .unwrap();
        assert!(!delivery.succeeded());
        assert_eq!(delivery.refused, vec![Power::England]);
        assert_eq!(mailbox.pending(), 0);

        // Lifting the block restores delivery.
        game.seat_mut(Power::England)
            .unwrap()
            .unblock_press_from(Power::France);
        let delivery = send_press(
            &game,
            Power::France,
            &PressTarget::Power(Power::England),
            "This message should go through",
            |id| emails.get(&id).cloned(),
            &mut mailbox,
        )
        .unwrap();
        assert!(delivery.succeeded());
    }

    #[test]
    fn multi_target_parse() {
        assert_eq!(PressTarget::parse("ALL").unwrap(), PressTarget::All);
        assert_eq!(
            PressTarget::parse("France").unwrap(),
            PressTarget::Power(Power::France)
        );
        assert_eq!(
            PressTarget::parse("FRANCE, GERMANY").unwrap(),
            PressTarget::Powers(vec![Power::France, Power::Germany])
        );
        assert!(PressTarget::parse("FRANCE, ATLANTIS").is_err());
    }
}
