//! Ephemeral group chat relay.
//!
//! One process keeps chat history, presence, typing state, screen-share and
//! call signaling, and a shared whiteboard snapshot in memory, and fans every
//! change out to connected WebSocket clients.

pub mod config;
pub mod error;
pub mod history;
pub mod messages;
pub mod relay;
pub mod roster;
pub mod routes;
pub mod server;
