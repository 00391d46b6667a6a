//! The bot server: owns the store, the catalog cache and the dice, and
//! drains the incoming channel strictly one message at a time.
//!
//! Gameplay failures never reach this layer; what does arrive here is a
//! configuration or persistence problem, which gets logged and answered with
//! the generic apology so the player is never left hanging.

use anyhow::{Context, Result};
use log::{error, info};
use tokio::sync::mpsc;

use crate::catalog::CatalogCache;
use crate::config::Config;
use crate::game::dice::{DiceRoller, StdDice};
use crate::game::session::SessionController;
use crate::logutil::escape_log;
use crate::storage::GameStore;
use crate::transport::{IncomingMessage, OutgoingTurn, TransportHandles};

/// Shown to the player when message handling fails and even the catalog
/// cannot be consulted for the apology text.
const FALLBACK_APOLOGY: &str = "Something went wrong. Please try again.";

/// Counters for the `status`-style log line on shutdown.
#[derive(Debug, Default, Clone)]
pub struct ServerStats {
    pub messages: u64,
    pub failures: u64,
}

pub struct BotServer {
    config: Config,
    store: GameStore,
    catalog: CatalogCache,
    dice: Box<dyn DiceRoller>,
    incoming: mpsc::UnboundedReceiver<IncomingMessage>,
    outgoing: mpsc::UnboundedSender<OutgoingTurn>,
    stats: ServerStats,
}

impl BotServer {
    /// Build the server and the channel ends a transport plugs into.
    pub fn new(config: Config) -> Result<(Self, TransportHandles)> {
        let store = GameStore::open(&config.storage.data_dir)
            .with_context(|| format!("opening store at {}", config.storage.data_dir))?;

        let catalog = match &config.content.catalog_path {
            Some(path) => CatalogCache::from_path(path.clone())
                .with_context(|| format!("loading catalog from {}", path))?,
            None => CatalogCache::builtin().context("parsing built-in catalog")?,
        };

        let dice: Box<dyn DiceRoller> = match config.game.dice_seed {
            Some(seed) => {
                info!("dice seeded with {}; games will be reproducible", seed);
                Box::new(StdDice::seeded(seed))
            }
            None => Box::new(StdDice::from_entropy()),
        };

        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();

        let server = Self {
            config,
            store,
            catalog,
            dice,
            incoming: incoming_rx,
            outgoing: outgoing_tx,
            stats: ServerStats::default(),
        };
        let handles = TransportHandles {
            incoming: incoming_tx,
            outgoing: outgoing_rx,
        };
        Ok((server, handles))
    }

    /// Run until every transport has dropped its sender.
    pub async fn run(mut self) -> Result<()> {
        info!("{} is listening", self.config.bot.name);
        while let Some(message) = self.incoming.recv().await {
            self.handle_message(message);
        }
        info!(
            "shutting down: {} messages handled, {} failures",
            self.stats.messages, self.stats.failures
        );
        Ok(())
    }

    /// Fully resolve one message. Never returns an error: failures turn into
    /// a logged line plus an apology reply.
    fn handle_message(&mut self, message: IncomingMessage) {
        self.stats.messages += 1;
        info!(
            "{}: {}",
            escape_log(&message.player_id),
            escape_log(&message.text)
        );

        let catalog = self.catalog.current();
        let mut controller = SessionController::new(
            &self.store,
            catalog,
            self.dice.as_mut(),
            self.config.game.starting_money,
            self.config.game.debug_commands,
        );

        let replies = match controller.handle_message(
            &message.player_id,
            &message.text,
            &message.profile_names,
        ) {
            Ok(replies) => replies,
            Err(err) => {
                self.stats.failures += 1;
                error!(
                    "failed to handle message from {}: {:#}",
                    escape_log(&message.player_id),
                    err
                );
                let apology = self
                    .catalog
                    .current()
                    .global("apology")
                    .map(str::to_string)
                    .unwrap_or_else(|_| FALLBACK_APOLOGY.to_string());
                vec![crate::game::engine::TurnOutput {
                    text: apology,
                    menu: Vec::new(),
                }]
            }
        };

        for reply in replies {
            // A send failure just means the transport went away; the loop
            // will notice when the incoming side closes too.
            let _ = self.outgoing.send(OutgoingTurn {
                chat: message.chat.clone(),
                text: reply.text,
                menu: reply.menu,
            });
        }
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChatRef;

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.storage.data_dir = dir.to_string_lossy().to_string();
        config.game.dice_seed = Some(7);
        config
    }

    #[tokio::test]
    async fn server_answers_first_contact_with_intro() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (server, mut handles) = BotServer::new(test_config(dir.path())).expect("server");
        let task = tokio::spawn(server.run());

        handles
            .incoming
            .send(IncomingMessage {
                chat: ChatRef("c1".into()),
                player_id: "p1".into(),
                profile_names: vec!["Ada".into()],
                text: "hello".into(),
            })
            .expect("send");
        let reply = handles.outgoing.recv().await.expect("reply");
        assert_eq!(reply.chat, ChatRef("c1".into()));
        assert!(!reply.text.is_empty());
        assert!(!reply.menu.is_empty(), "intro offers a menu");

        drop(handles.incoming);
        task.await.expect("join").expect("run");
    }

    #[tokio::test]
    async fn server_survives_a_bad_catalog_key() {
        // A catalog missing game keys still validates nothing at this layer;
        // the session fails per message and the player gets the apology.
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog_path = dir.path().join("broken.json");
        std::fs::write(&catalog_path, r#"{"apology": "sorry!"}"#).expect("write");
        let mut config = test_config(dir.path());
        config.content.catalog_path = Some(catalog_path.to_string_lossy().to_string());

        let (server, mut handles) = BotServer::new(config).expect("server");
        let task = tokio::spawn(server.run());

        handles
            .incoming
            .send(IncomingMessage {
                chat: ChatRef("c1".into()),
                player_id: "p1".into(),
                profile_names: Vec::new(),
                text: "hello".into(),
            })
            .expect("send");
        let reply = handles.outgoing.recv().await.expect("reply");
        assert_eq!(reply.text, "sorry!");

        drop(handles.incoming);
        task.await.expect("join").expect("run");
    }
}
