//! The server loop: one incoming message at a time, fully resolved before
//! the next is looked at.

mod server;

pub use server::{BotServer, ServerStats};
