//! Shared fixtures for the integration tests: a throwaway store, the
//! built-in catalog, and helpers for driving a session one button at a time.

use blackoutbot::catalog::{fill, Catalog};
use blackoutbot::game::dice::DiceRoller;
use blackoutbot::game::engine::TurnOutput;
use blackoutbot::game::session::SessionController;
use blackoutbot::game::types::PlayerState;
use blackoutbot::storage::GameStore;
use tempfile::TempDir;

pub const PLAYER: &str = "p1";

pub struct GameFixture {
    _dir: TempDir,
    pub store: GameStore,
    pub catalog: Catalog,
}

#[allow(dead_code)] // Not every test file uses every helper.
impl GameFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStore::open(dir.path()).expect("store");
        let catalog = Catalog::builtin().expect("builtin catalog");
        Self {
            _dir: dir,
            store,
            catalog,
        }
    }

    /// Push one message through a fresh session controller, debug commands
    /// enabled.
    pub fn send(&self, dice: &mut dyn DiceRoller, text: &str) -> Vec<TurnOutput> {
        let mut controller = SessionController::new(&self.store, &self.catalog, dice, 100, true);
        controller
            .handle_message(PLAYER, text, &["Ada".to_string()])
            .expect("handle message")
    }

    /// Run first contact, the intro button and the name capture.
    pub fn onboard(&self, dice: &mut dyn DiceRoller) {
        self.send(dice, "hello");
        self.send(dice, "So what now?");
        self.send(dice, "Ada");
    }

    pub fn player(&self) -> PlayerState {
        self.store
            .load_player(PLAYER)
            .expect("load player")
            .expect("player present")
    }

    // --- button label shortcuts ------------------------------------------

    pub fn global(&self, key: &str) -> String {
        self.catalog.global(key).expect("global key").to_string()
    }

    pub fn loc(&self, location: &str, key: &str) -> String {
        self.catalog
            .location_text(location, key)
            .expect("location key")
            .to_string()
    }

    pub fn npc(&self, npc: &str, key: &str) -> String {
        self.catalog.npc_text(npc, key).expect("npc key").to_string()
    }

    pub fn talk(&self, npc: &str) -> String {
        let name = self.catalog.npc_text(npc, "name").expect("npc name");
        fill(self.catalog.global("talk").expect("talk"), &[name])
    }

    pub fn take(&self, object: &str) -> String {
        let name = self.catalog.object_name(object).expect("object name");
        fill(self.catalog.global("take").expect("take"), &[name])
    }

    pub fn go(&self, destination: &str) -> String {
        self.catalog
            .go_to_label(destination)
            .expect("go_to key")
            .to_string()
    }

    pub fn nothing(&self) -> String {
        self.global("nothing")
    }
}

/// Collapse a turn's replies into one string for containment asserts.
#[allow(dead_code)]
pub fn reply_text(replies: &[TurnOutput]) -> String {
    replies
        .iter()
        .map(|reply| reply.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
