//! The turn engine: one button press in, one narrative beat and the next
//! menu out.
//!
//! Priority order for an incoming button, strictly:
//!
//! 1. An open conversation gets the text first. If the reply closes the
//!    conversation, the same text is re-evaluated against the location
//!    opportunistically: a match composes with the closing line, no match
//!    ends the turn quietly (never with the invalid-action line).
//! 2. The inventory button.
//! 3. A "talk to X" button for someone present (an immediately-closing
//!    greeting falls through like rule 1).
//! 4. A "take X" button for an object lying here.
//! 5. The location's own actions and exits; nothing matching means the
//!    generic invalid-action narrative and no state change.
//!
//! The turn counter increments once at the top, covering mid-conversation
//! turns that return early.

use log::debug;

use crate::catalog::{fill, Catalog, CatalogError};
use crate::game::dice::DiceRoller;
use crate::game::locations::Location;
use crate::game::npcs::Npc;
use crate::game::types::{NpcKey, PlayerState};

/// The reply for one resolved turn: narrative text plus the next menu.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutput {
    pub text: String,
    pub menu: Vec<String>,
}

/// What one pass over the current location produced.
enum Pass {
    /// A conversation opened and is waiting on a phrase.
    Conversation { spoken: String, menu: Vec<String> },
    /// Something matched; the narrative may be empty (plain movement).
    Resolved(String),
    /// Nothing at the location matched the text.
    NoMatch,
}

/// Stateless resolver bound to a catalog; all game state lives in the
/// [`PlayerState`] passed through.
pub struct TurnEngine<'c> {
    catalog: &'c Catalog,
}

impl<'c> TurnEngine<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    fn load_location(&self, player: &PlayerState) -> Location<'c> {
        let key = player.current_location;
        Location::load(key, self.catalog, player.locations.get(&key).cloned())
    }

    fn load_npc(&self, key: NpcKey, player: &PlayerState) -> Npc<'c> {
        Npc::load(key, self.catalog, player.npcs.get(&key).cloned())
    }

    fn talk_label(&self, key: NpcKey) -> Result<String, CatalogError> {
        let name = self.catalog.npc_text(key.as_str(), "name")?;
        Ok(fill(self.catalog.global("talk")?, &[name]))
    }

    /// Resolve one turn. The player's state is mutated in place; persisting
    /// it afterwards is the caller's concern.
    pub fn resolve(
        &self,
        player: &mut PlayerState,
        text: &str,
        dice: &mut dyn DiceRoller,
    ) -> Result<TurnOutput, CatalogError> {
        player.turn += 1;

        // Rule 1: an open conversation sees the text first.
        let mut closing_line: Option<String> = None;
        if let Some(npc_key) = player.current_npc {
            let mut npc = self.load_npc(npc_key, player);
            let (line, phrases) = npc.respond(text, player)?;
            let spoken = format!("{}: {}", npc.name()?, line);
            player.npcs.insert(npc_key, npc.state);
            match phrases {
                Some(menu) => return Ok(TurnOutput { text: spoken, menu }),
                None => {
                    player.current_npc = None;
                    closing_line = Some(spoken);
                }
            }
        }
        let strict = closing_line.is_none();

        let narrative = match self.location_pass(player, text, dice)? {
            Pass::Conversation { spoken, menu } => {
                let text = join_beats(&[closing_line.as_deref(), Some(spoken.as_str())]);
                return Ok(TurnOutput { text, menu });
            }
            Pass::Resolved(narrative) => Some(narrative),
            Pass::NoMatch => {
                if strict {
                    debug!(
                        "player {} pressed an unknown button on turn {}",
                        player.player_id, player.turn
                    );
                    Some(self.catalog.global("wrong_action")?.to_string())
                } else {
                    None
                }
            }
        };

        self.compose(player, &[closing_line.as_deref(), narrative.as_deref()])
    }

    /// Rules 2-5 against the current location. Mutated location sub-state is
    /// written back before returning; a travel action updates
    /// `current_location`.
    fn location_pass(
        &self,
        player: &mut PlayerState,
        text: &str,
        dice: &mut dyn DiceRoller,
    ) -> Result<Pass, CatalogError> {
        let mut location = self.load_location(player);

        // Rule 2: the inventory button.
        if text == self.catalog.global("show_inventory")? {
            player.locations.insert(location.key(), location.state);
            return Ok(Pass::Resolved(self.inventory_summary(player)?));
        }

        // Rule 3: talk buttons for whoever is present.
        for npc_key in location.npcs_present(player) {
            if text != self.talk_label(npc_key)? {
                continue;
            }
            let mut npc = self.load_npc(npc_key, player);
            let (line, phrases) = npc.greeting(player, dice)?;
            let spoken = format!("{}: {}", npc.name()?, line);
            player.npcs.insert(npc_key, npc.state);
            player.locations.insert(location.key(), location.state);
            return match phrases {
                Some(menu) => {
                    player.current_npc = Some(npc_key);
                    Ok(Pass::Conversation { spoken, menu })
                }
                // A greeting with nothing behind it closes on the spot; the
                // spoken line becomes the turn's narrative.
                None => Ok(Pass::Resolved(spoken)),
            };
        }

        // Rule 4: take buttons for objects lying here.
        let take_template = self.catalog.global("take")?;
        let mut taken = None;
        for (index, &object) in location.state.objects().iter().enumerate() {
            let name = self.catalog.object_name(object.key())?;
            if text == fill(take_template, &[name]) {
                taken = Some((index, object));
                break;
            }
        }
        if let Some((index, object)) = taken {
            location.state.objects_mut().remove(index);
            player.inventory.push(object);
            let name = self.catalog.object_name(object.key())?;
            let narrative = fill(self.catalog.global("took")?, &[name]);
            player.locations.insert(location.key(), location.state);
            return Ok(Pass::Resolved(narrative));
        }

        // Rule 5: the location's own actions and exits.
        let outcome = location.resolve_action(text, player, dice)?;
        player.locations.insert(location.key(), location.state);
        match outcome {
            Some(outcome) => {
                if let Some(destination) = outcome.next_location {
                    player.current_location = destination;
                }
                Ok(Pass::Resolved(outcome.narrative))
            }
            None => Ok(Pass::NoMatch),
        }
    }

    /// Final response assembly: narrative beats, the (possibly new) location
    /// description, and the full button menu.
    fn compose(
        &self,
        player: &mut PlayerState,
        beats: &[Option<&str>],
    ) -> Result<TurnOutput, CatalogError> {
        let location = self.load_location(player);
        let description = location.description(player)?;
        let mut menu = location.available_actions(player)?;
        for npc_key in location.npcs_present(player) {
            menu.push(self.talk_label(npc_key)?);
        }
        // First visits seed sub-state during composition; keep it.
        player.locations.insert(location.key(), location.state);

        let mut parts: Vec<Option<&str>> = beats.to_vec();
        parts.push(Some(description.as_str()));
        Ok(TurnOutput {
            text: join_beats(&parts),
            menu,
        })
    }

    /// The player's arrival reply for a location entered outside a normal
    /// turn (game start), optionally prefixed with a story beat.
    pub fn arrival(
        &self,
        player: &mut PlayerState,
        prefix: Option<&str>,
    ) -> Result<TurnOutput, CatalogError> {
        self.compose(player, &[prefix])
    }

    /// Rule 2's narrative: every held object with its description, then the
    /// cash count.
    fn inventory_summary(&self, player: &PlayerState) -> Result<String, CatalogError> {
        if player.inventory.is_empty() {
            return Ok(fill(
                self.catalog.global("inventory_money")?,
                &[&player.money.to_string()],
            ));
        }
        let mut lines = Vec::with_capacity(player.inventory.len() + 1);
        for &object in &player.inventory {
            lines.push(format!(
                "{}: {}",
                self.catalog.object_name(object.key())?,
                self.catalog.object_description(object.key())?
            ));
        }
        lines.push(format!(
            "{}: {}",
            self.catalog.global("money")?,
            player.money
        ));
        Ok(fill(self.catalog.global("inventory")?, &[&lines.join("\n")]))
    }
}

/// Join narrative beats with single spaces, skipping empty ones.
fn join_beats(parts: &[Option<&str>]) -> String {
    let mut out = String::new();
    for part in parts.iter().flatten() {
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(part);
    }
    out
}
