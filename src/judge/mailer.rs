//! Outbound notification queue. The judge never talks SMTP itself; the
//! host drains this queue (or subscribes) and does the delivery.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug)]
pub struct Mailbox {
    from_addr: String,
    queue: Vec<Email>,
    watchers: Vec<mpsc::Sender<Email>>,
}

impl Mailbox {
    pub fn new(from_addr: impl Into<String>) -> Mailbox {
        Mailbox {
            from_addr: from_addr.into(),
            queue: Vec::new(),
            watchers: Vec::new(),
        }
    }

    pub fn from_addr(&self) -> &str {
        &self.from_addr
    }

    /// Queue a message from the judge itself.
    pub fn push(&mut self, to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) {
        let email = Email {
            to: to.into(),
            from: self.from_addr.clone(),
            subject: subject.into(),
            body: body.into(),
        };
        self.deliver(email);
    }

    /// Queue a message with an explicit from address (attributed press).
    pub fn push_from(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) {
        let email = Email {
            to: to.into(),
            from: from.into(),
            subject: subject.into(),
            body: body.into(),
        };
        self.deliver(email);
    }

    fn deliver(&mut self, email: Email) {
        // Slow or closed subscribers just miss messages; the queue is the
        // source of truth.
        self.watchers.retain(|w| match w.try_send(email.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        self.queue.push(email);
    }

    /// Take everything queued; reading empties the queue.
    pub fn drain(&mut self) -> Vec<Email> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Subscribe to future deliveries.
    pub fn watch(&mut self) -> mpsc::Receiver<Email> {
        let (tx, rx) = mpsc::channel(64);
        self.watchers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_queue() {
        let mut mailbox = Mailbox::new("judge@example.com");
        mailbox.push("a@example.com", "STATUS foo", "body");
        mailbox.push("b@example.com", "LIST", "body");
        assert_eq!(mailbox.pending(), 2);

        let emails = mailbox.drain();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].from, "judge@example.com");
        assert_eq!(mailbox.pending(), 0);
        assert!(mailbox.drain().is_empty());
    }

    #[test]
    fn watchers_see_new_mail() {
        let mut mailbox = Mailbox::new("judge@example.com");
        let mut rx = mailbox.watch();
        mailbox.push("a@example.com", "PRESS", "hello");

        let email = rx.try_recv().unwrap();
        assert_eq!(email.to, "a@example.com");
        // The queue still holds it for the drain path.
        assert_eq!(mailbox.pending(), 1);

        drop(rx);
        mailbox.push("b@example.com", "PRESS", "again");
        assert_eq!(mailbox.pending(), 2);
    }
}
