//! Per-message dispatch around the turn engine: onboarding, administrative
//! commands, win detection and the single end-of-message save.
//!
//! The controller owns nothing between messages; it loads the player, runs
//! everything in memory, and persists through one `save_player` call so a
//! storage failure can never leave half a turn behind.

use anyhow::{Context, Result};
use log::info;

use crate::catalog::{fill, Catalog};
use crate::game::dice::DiceRoller;
use crate::game::engine::{TurnEngine, TurnOutput};
use crate::game::types::{Item, LocationKey, PlayerState, ScoreRecord};
use crate::storage::GameStore;

/// How many leaderboard rows `/highscores` shows.
const LEADERBOARD_SIZE: usize = 10;

/// Longest accepted player name; the rest is cut off silently.
const MAX_NAME_CHARS: usize = 64;

/// One message's worth of game dispatch. Construct per message; all durable
/// state lives in the store.
pub struct SessionController<'a> {
    store: &'a GameStore,
    catalog: &'a Catalog,
    dice: &'a mut dyn DiceRoller,
    starting_money: i64,
    debug_commands: bool,
}

impl<'a> SessionController<'a> {
    pub fn new(
        store: &'a GameStore,
        catalog: &'a Catalog,
        dice: &'a mut dyn DiceRoller,
        starting_money: i64,
        debug_commands: bool,
    ) -> Self {
        Self {
            store,
            catalog,
            dice,
            starting_money,
            debug_commands,
        }
    }

    /// Route one incoming message. `name_suggestions` are profile names the
    /// transport knows for this sender, offered as buttons during naming.
    pub fn handle_message(
        &mut self,
        player_id: &str,
        text: &str,
        name_suggestions: &[String],
    ) -> Result<Vec<TurnOutput>> {
        let text = text.trim();

        let Some(mut player) = self
            .store
            .load_player(player_id)
            .context("loading player state")?
        else {
            let mut player = PlayerState::new(player_id, self.starting_money);
            self.store
                .save_player(&mut player)
                .context("saving new player")?;
            info!("new player {}", player_id);
            return Ok(vec![self.intro_reply()?]);
        };

        // Administrative commands run ahead of all game logic.
        if text == "/help" {
            return Ok(vec![self.plain_reply(self.catalog.global("help")?)]);
        }
        if text == "/highscores" {
            return Ok(vec![self.leaderboard_reply()?]);
        }
        if text == "/start" {
            player.reset(self.starting_money);
            self.store
                .save_player(&mut player)
                .context("saving reset player")?;
            info!("player {} restarted", player_id);
            return Ok(vec![self.intro_reply()?]);
        }
        if self.debug_commands {
            if let Some(reply) = self.debug_command(&mut player, text)? {
                self.store
                    .save_player(&mut player)
                    .context("saving after debug command")?;
                return Ok(vec![reply]);
            }
        }

        // A finished game ignores everything but the commands above.
        if player.won {
            return Ok(Vec::new());
        }

        let mut replies = if player.in_intro {
            self.leave_intro(&mut player, name_suggestions)?
        } else if player.name.is_none() {
            self.capture_name(&mut player, text, name_suggestions)?
        } else {
            let engine = TurnEngine::new(self.catalog);
            vec![engine.resolve(&mut player, text, self.dice)?]
        };

        self.store
            .save_player(&mut player)
            .context("saving player state")?;

        // The win check runs after the save so a retried message can never
        // record the score twice.
        if player.won {
            let name = player.name.as_deref().unwrap_or_default();
            let score = ScoreRecord::new(name, player.turn, player.money);
            info!(
                "player {} won in {} turns with {} money ({} points)",
                player_id, score.turns, score.money, score.score
            );
            self.store
                .append_score(score.clone())
                .context("recording score")?;
            replies.push(self.plain_reply(&fill(
                self.catalog.global("you_won")?,
                &[
                    &score.turns.to_string(),
                    &score.money.to_string(),
                    &score.score.to_string(),
                ],
            )));
            replies.push(self.leaderboard_reply()?);
        }
        Ok(replies)
    }

    fn plain_reply(&self, text: &str) -> TurnOutput {
        TurnOutput {
            text: text.to_string(),
            menu: Vec::new(),
        }
    }

    fn intro_reply(&self) -> Result<TurnOutput> {
        Ok(TurnOutput {
            text: self.catalog.global("intro")?.to_string(),
            menu: self.catalog.text_list("intro_menu")?,
        })
    }

    fn leave_intro(
        &mut self,
        player: &mut PlayerState,
        name_suggestions: &[String],
    ) -> Result<Vec<TurnOutput>> {
        player.in_intro = false;
        if player.name.is_none() {
            return Ok(vec![TurnOutput {
                text: self.catalog.global("ask_name")?.to_string(),
                menu: name_suggestions.to_vec(),
            }]);
        }
        self.enter_home(player)
    }

    fn capture_name(
        &mut self,
        player: &mut PlayerState,
        text: &str,
        name_suggestions: &[String],
    ) -> Result<Vec<TurnOutput>> {
        if text.is_empty() {
            return Ok(vec![TurnOutput {
                text: self.catalog.global("ask_name")?.to_string(),
                menu: name_suggestions.to_vec(),
            }]);
        }
        let name: String = text.chars().take(MAX_NAME_CHARS).collect();
        info!("player {} is now called {}", player.player_id, crate::logutil::escape_log(&name));
        player.name = Some(name);
        self.enter_home(player)
    }

    /// First location entry: the story beat plus the home description.
    fn enter_home(&mut self, player: &mut PlayerState) -> Result<Vec<TurnOutput>> {
        player.current_location = LocationKey::Home;
        let engine = TurnEngine::new(self.catalog);
        let story = self.catalog.global("story")?;
        Ok(vec![engine.arrival(player, Some(story))?])
    }

    fn leaderboard_reply(&self) -> Result<TurnOutput> {
        let scores = self
            .store
            .top_scores(LEADERBOARD_SIZE)
            .context("reading leaderboard")?;
        if scores.is_empty() {
            return Ok(self.plain_reply(self.catalog.global("no_scores")?));
        }
        let row_template = self.catalog.global("highscore_row")?;
        let rows: Vec<String> = scores
            .iter()
            .enumerate()
            .map(|(rank, score)| {
                fill(
                    row_template,
                    &[
                        &(rank + 1).to_string(),
                        &score.name,
                        &score.turns.to_string(),
                        &score.money.to_string(),
                        &score.score.to_string(),
                    ],
                )
            })
            .collect();
        Ok(self.plain_reply(&fill(
            self.catalog.global("highscores_header")?,
            &[&rows.join("\n")],
        )))
    }

    /// Development cheats, enabled per config. Returns `None` when the text
    /// is not a debug command at all.
    fn debug_command(
        &mut self,
        player: &mut PlayerState,
        text: &str,
    ) -> Result<Option<TurnOutput>> {
        if let Some(key) = text.strip_prefix("/give ") {
            let Some(item) = Item::from_key(key.trim()) else {
                return Ok(Some(self.plain_reply(self.catalog.global("unknown_object")?)));
            };
            player.inventory.push(item);
            let name = self.catalog.object_name(item.key())?;
            return Ok(Some(
                self.plain_reply(&fill(self.catalog.global("gave_object")?, &[name])),
            ));
        }
        if let Some(key) = text.strip_prefix("/drop ") {
            let Some(item) = Item::from_key(key.trim()) else {
                return Ok(Some(self.plain_reply(self.catalog.global("unknown_object")?)));
            };
            player.remove_first(item);
            let name = self.catalog.object_name(item.key())?;
            return Ok(Some(
                self.plain_reply(&fill(self.catalog.global("dropped_object")?, &[name])),
            ));
        }
        if text == "/money" {
            player.money += 100;
            return Ok(Some(
                self.plain_reply(self.catalog.global("granted_money")?),
            ));
        }
        Ok(None)
    }
}
