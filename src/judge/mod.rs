//! The judge core: game sessions, the player directory, order intake,
//! press, outbound mail, and the email command processor.

pub mod adjudicator;
pub mod commands;
pub mod error;
pub mod game;
pub mod mailer;
pub mod orders;
pub mod phase;
pub mod player;
pub mod press;
pub mod registry;
pub mod reports;
