//! # Blackoutbot - a menu-driven narrative adventure bot
//!
//! Blackoutbot is a turn-based adventure game served over a chat transport.
//! The power is out in the player's neighborhood; they wander between seven
//! locations, scavenge and trade parts, talk their way past NPCs, and try to
//! bring the lights back on. Every player action arrives as the literal text
//! of a button the bot previously offered, and every reply carries the next
//! menu of valid buttons.
//!
//! ## Features
//!
//! - **Exact-match turn engine**: no free-text parsing; the engine resolves a
//!   pressed button against the current game state in a fixed priority order.
//! - **Data-driven content**: all user-visible text lives in a JSON message
//!   catalog that can be edited without recompiling and is hot-reloaded when
//!   the file changes.
//! - **Persistent worlds**: per-player state and the append-only leaderboard
//!   are stored in an embedded sled database.
//! - **Deterministic dice**: every random outcome flows through an injectable
//!   roller, so gameplay is reproducible under test.
//! - **Transport-agnostic core**: the game never touches sockets or markup;
//!   a console transport ships for local play.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blackoutbot::bot::BotServer;
//! use blackoutbot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let (server, handles) = BotServer::new(config)?;
//!     blackoutbot::transport::console::spawn(handles);
//!     server.run().await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - The adventure core: locations, NPCs, economy, turn engine
//! - [`bot`] - The per-message server loop
//! - [`catalog`] - Message catalog loading, lookup and hot reload
//! - [`storage`] - Player state and leaderboard persistence
//! - [`config`] - Configuration management and validation
//! - [`transport`] - Chat transport contract and the console transport

pub mod bot;
pub mod catalog;
pub mod config;
pub mod game;
pub mod logutil;
pub mod storage;
pub mod transport;
