//! Game-management front end for a Diplomacy judge: an in-memory registry
//! of games, players, press, and notifications, exposed over gRPC. Order
//! adjudication proper is pluggable and external.

pub mod config;
pub mod judge;
pub mod map;
pub mod server;
