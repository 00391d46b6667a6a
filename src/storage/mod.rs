//! Sled-backed persistence for player state and the leaderboard.
//!
//! Two trees: `players` holds one record per player id, `scores` is the
//! append-only leaderboard keyed by write timestamp. Payloads are JSON, so
//! records written by older builds load cleanly and unknown legacy fields
//! are ignored; a `schema_version` check catches genuinely incompatible
//! records.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sled::IVec;
use thiserror::Error;

use crate::game::types::{PlayerState, ScoreRecord, PLAYER_SCHEMA_VERSION, SCORE_SCHEMA_VERSION};

const TREE_PLAYERS: &str = "players";
const TREE_SCORES: &str = "scores";

/// Errors crossing the persistence boundary. All of them abort the current
/// message; the game never sees partial state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around JSON serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}

fn next_timestamp_nanos() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1000)
}

/// Helper builder so tests can easily create throwaway stores.
pub struct GameStoreBuilder {
    path: PathBuf,
}

impl GameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<GameStore, StoreError> {
        GameStore::open(self.path)
    }
}

/// Sled-backed store for everything the bot remembers between messages.
pub struct GameStore {
    _db: sled::Db,
    players: sled::Tree,
    scores: sled::Tree,
}

impl GameStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let players = db.open_tree(TREE_PLAYERS)?;
        let scores = db.open_tree(TREE_SCORES)?;
        Ok(Self {
            _db: db,
            players,
            scores,
        })
    }

    fn player_key(player_id: &str) -> Vec<u8> {
        format!("players:{}", player_id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, StoreError> {
        Ok(serde_json::from_slice::<T>(&bytes)?)
    }

    /// Fetch a player record; `None` for a player never seen before.
    pub fn load_player(&self, player_id: &str) -> Result<Option<PlayerState>, StoreError> {
        let Some(bytes) = self.players.get(Self::player_key(player_id))? else {
            return Ok(None);
        };
        let record: PlayerState = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(Some(record))
    }

    /// Insert or update a player record. This is the turn's single save
    /// point; in-memory mutation either all lands here or none of it does.
    pub fn save_player(&self, player: &mut PlayerState) -> Result<(), StoreError> {
        player.schema_version = PLAYER_SCHEMA_VERSION;
        player.touch();
        let key = Self::player_key(&player.player_id);
        let bytes = Self::serialize(player)?;
        self.players.insert(key, bytes)?;
        self.players.flush()?;
        Ok(())
    }

    /// List all stored player ids.
    pub fn list_player_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        for entry in self.players.scan_prefix(b"players:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(id) = text.strip_prefix("players:") {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    /// Append one leaderboard entry. Rows are never edited afterwards.
    pub fn append_score(&self, mut score: ScoreRecord) -> Result<(), StoreError> {
        score.schema_version = SCORE_SCHEMA_VERSION;
        let key = format!("scores:{:020}", next_timestamp_nanos()).into_bytes();
        let bytes = Self::serialize(&score)?;
        self.scores.insert(key, bytes)?;
        self.scores.flush()?;
        Ok(())
    }

    /// The best `n` scores, highest first. Ties keep insertion order.
    pub fn top_scores(&self, n: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        let mut scores = Vec::new();
        for entry in self.scores.scan_prefix(b"scores:") {
            let (_, bytes) = entry?;
            scores.push(Self::deserialize::<ScoreRecord>(bytes)?);
        }
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores.truncate(n);
        Ok(scores)
    }
}
