//! The six people of the game, each a stateful dialogue tree.
//!
//! An NPC answers `greeting` and `respond` with a spoken line plus the next
//! set of valid phrases; `None` for the phrase set means the conversation is
//! over. Callers only ever send back text the NPC itself offered; if the
//! text matches nothing anyway (a stale menu after a debug command, say),
//! the NPC asks for a repeat and re-offers the same phrases.

use log::debug;

use crate::catalog::{fill, Catalog, CatalogError};
use crate::game::dice::DiceRoller;
use crate::game::market::{
    baseline_price, buy_price, roll_stock, sell_price, MARKET_BASELINE, STOCK_REFRESH_TURNS,
};
use crate::game::types::{
    ClerkState, Item, MarketMode, MarketState, MechanicState, NpcKey, NpcState, PlayerState,
};

/// A spoken line plus the next phrase menu; `None` ends the conversation.
pub type NpcTurn = (String, Option<Vec<String>>);

/// Parts the mechanic needs on the bench, list included.
const GENERATOR_PARTS: [Item; 5] = [
    Item::GeneratorPlans,
    Item::Magnet,
    Item::Valve,
    Item::Piston,
    Item::Kettle,
];

/// The mechanic's labor fee.
const GENERATOR_FEE: i64 = 50;

/// One NPC, bound to the catalog and carrying its mutable sub-state.
pub struct Npc<'c> {
    key: NpcKey,
    catalog: &'c Catalog,
    pub state: NpcState,
}

impl<'c> Npc<'c> {
    /// Bind an NPC, seeding default sub-state on the first encounter.
    pub fn load(key: NpcKey, catalog: &'c Catalog, state: Option<NpcState>) -> Self {
        let state = state.unwrap_or_else(|| Self::initial_state(key));
        Self {
            key,
            catalog,
            state,
        }
    }

    fn initial_state(key: NpcKey) -> NpcState {
        match key {
            NpcKey::Merchant => NpcState::Market(MarketState::default()),
            NpcKey::Clerk => NpcState::Clerk(ClerkState::default()),
            NpcKey::Mechanic => NpcState::Mechanic(MechanicState::default()),
            NpcKey::Electrician | NpcKey::Doctor | NpcKey::Henry => NpcState::Plain {},
        }
    }

    pub fn key(&self) -> NpcKey {
        self.key
    }

    /// Display name, from the catalog.
    pub fn name(&self) -> Result<&'c str, CatalogError> {
        self.catalog.npc_text(self.key.as_str(), "name")
    }

    fn msg(&self, key: &str) -> Result<&'c str, CatalogError> {
        self.catalog.npc_text(self.key.as_str(), key)
    }

    fn nothing_label(&self) -> Result<String, CatalogError> {
        Ok(self.catalog.global("nothing")?.to_string())
    }

    fn confused(&self, phrases: Option<Vec<String>>) -> Result<NpcTurn, CatalogError> {
        Ok((self.catalog.global("npc_confused")?.to_string(), phrases))
    }

    /// Opening line and first phrase set. An immediate `None` means the NPC
    /// has nothing to discuss right now.
    pub fn greeting(
        &mut self,
        player: &mut PlayerState,
        dice: &mut dyn DiceRoller,
    ) -> Result<NpcTurn, CatalogError> {
        match self.key {
            NpcKey::Electrician => Ok((
                self.msg("greeting")?.to_string(),
                self.electrician_phrases(player)?,
            )),
            NpcKey::Clerk => Ok((
                self.msg("greeting")?.to_string(),
                Some(self.clerk_phrases()?),
            )),
            NpcKey::Doctor => Ok((
                self.msg("greeting")?.to_string(),
                Some(self.doctor_phrases(player)?),
            )),
            NpcKey::Mechanic => Ok((
                self.msg("greeting")?.to_string(),
                Some(self.mechanic_phrases(player)?),
            )),
            NpcKey::Henry => {
                let name = player.name.as_deref().unwrap_or_default();
                Ok((
                    fill(self.msg("greeting")?, &[name]),
                    Some(self.henry_phrases()?),
                ))
            }
            NpcKey::Merchant => self.merchant_greeting(player, dice),
        }
    }

    /// Resolve one phrase the player chose from the offered set.
    pub fn respond(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<NpcTurn, CatalogError> {
        match self.key {
            NpcKey::Electrician => self.electrician_respond(text, player),
            NpcKey::Clerk => self.clerk_respond(text, player),
            NpcKey::Doctor => self.doctor_respond(text, player),
            NpcKey::Mechanic => self.mechanic_respond(text, player),
            NpcKey::Henry => self.henry_respond(text, player),
            NpcKey::Merchant => self.merchant_respond(text, player),
        }
    }

    // --- electrician ---------------------------------------------------

    /// Nothing to offer until the paperwork exists; the greeting then closes
    /// immediately and the electrician keeps sleeping.
    fn electrician_phrases(
        &self,
        player: &PlayerState,
    ) -> Result<Option<Vec<String>>, CatalogError> {
        if !player.filled_power_request {
            return Ok(None);
        }
        Ok(Some(vec![
            self.msg("check_blackout")?.to_string(),
            self.nothing_label()?,
        ]))
    }

    fn electrician_respond(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<NpcTurn, CatalogError> {
        if text == self.msg("check_blackout")? {
            if !player.has_item(Item::Moonshine) {
                return Ok((
                    self.msg("check_requirements")?.to_string(),
                    self.electrician_phrases(player)?,
                ));
            }
            player.remove_first(Item::Moonshine);
            player.electrician_dispatched = true;
            debug!("player {} bribed the electrician", player.player_id);
            return Ok((self.msg("will_check")?.to_string(), None));
        }
        if text == self.catalog.global("nothing")? {
            return Ok((self.msg("mumble")?.to_string(), None));
        }
        let phrases = self.electrician_phrases(player)?;
        self.confused(phrases)
    }

    // --- clerk ----------------------------------------------------------

    fn clerk_phrases(&self) -> Result<Vec<String>, CatalogError> {
        let NpcState::Clerk(ref clerk) = self.state else {
            return Ok(Vec::new());
        };
        let mut phrases = vec![self.msg("ask_reason")?.to_string()];
        if clerk.asked {
            phrases.push(self.msg("file_request")?.to_string());
        }
        phrases.push(self.nothing_label()?);
        Ok(phrases)
    }

    fn clerk_respond(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<NpcTurn, CatalogError> {
        if text == self.msg("ask_reason")? {
            if let NpcState::Clerk(ref mut clerk) = self.state {
                clerk.asked = true;
            }
            return Ok((self.msg("no_info")?.to_string(), Some(self.clerk_phrases()?)));
        }
        if text == self.msg("file_request")? {
            if !player.has_item(Item::Receipts) {
                return Ok((
                    self.msg("need_receipts")?.to_string(),
                    Some(self.clerk_phrases()?),
                ));
            }
            player.remove_first(Item::Receipts);
            player.filled_power_request = true;
            if let NpcState::Clerk(ref mut clerk) = self.state {
                clerk.request_accepted = true;
            }
            debug!("player {} filed the power request", player.player_id);
            return Ok((
                self.msg("request_accepted")?.to_string(),
                Some(self.clerk_phrases()?),
            ));
        }
        if text == self.catalog.global("nothing")? {
            return Ok((self.msg("go_out")?.to_string(), None));
        }
        let phrases = Some(self.clerk_phrases()?);
        self.confused(phrases)
    }

    // --- doctor ---------------------------------------------------------

    fn doctor_phrases(&self, player: &PlayerState) -> Result<Vec<String>, CatalogError> {
        let mut phrases = vec![self.msg("ask_about_light")?.to_string()];
        if player.burned {
            phrases.push(self.msg("heal_me")?.to_string());
        }
        phrases.push(self.nothing_label()?);
        Ok(phrases)
    }

    fn doctor_respond(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<NpcTurn, CatalogError> {
        if text == self.msg("ask_about_light")? {
            player.knows_about_generator = true;
            return Ok((
                self.msg("backup_generator")?.to_string(),
                Some(self.doctor_phrases(player)?),
            ));
        }
        if player.burned && text == self.msg("heal_me")? {
            player.burned = false;
            return Ok((
                self.msg("healed")?.to_string(),
                Some(self.doctor_phrases(player)?),
            ));
        }
        if text == self.catalog.global("nothing")? {
            return Ok((self.msg("be_careful")?.to_string(), None));
        }
        let phrases = Some(self.doctor_phrases(player)?);
        self.confused(phrases)
    }

    // --- mechanic --------------------------------------------------------

    fn generator_affordable(player: &PlayerState) -> bool {
        player.has_all(&GENERATOR_PARTS) && player.money >= GENERATOR_FEE
    }

    fn mechanic_phrases(&self, player: &PlayerState) -> Result<Vec<String>, CatalogError> {
        let built = matches!(
            self.state,
            NpcState::Mechanic(MechanicState {
                generator_built: true
            })
        );
        let mut phrases = Vec::new();
        if player.knows_about_generator && !built {
            phrases.push(self.msg("can_you_build")?.to_string());
            if Self::generator_affordable(player) {
                phrases.push(self.msg("build_generator")?.to_string());
            }
        }
        phrases.push(self.nothing_label()?);
        Ok(phrases)
    }

    fn mechanic_respond(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<NpcTurn, CatalogError> {
        let built = matches!(
            self.state,
            NpcState::Mechanic(MechanicState {
                generator_built: true
            })
        );
        if player.knows_about_generator && !built {
            if text == self.msg("can_you_build")? {
                if !player.has_item(Item::GeneratorPlans) {
                    player.inventory.push(Item::GeneratorPlans);
                }
                return Ok((
                    self.msg("generator_info")?.to_string(),
                    Some(self.mechanic_phrases(player)?),
                ));
            }
            if text == self.msg("build_generator")? && Self::generator_affordable(player) {
                for part in GENERATOR_PARTS {
                    player.remove_first(part);
                }
                player.money -= GENERATOR_FEE;
                player.inventory.push(Item::Generator);
                if let NpcState::Mechanic(ref mut mechanic) = self.state {
                    mechanic.generator_built = true;
                }
                debug!("player {} had the generator built", player.player_id);
                return Ok((
                    self.msg("generator_built")?.to_string(),
                    Some(self.mechanic_phrases(player)?),
                ));
            }
        }
        if text == self.catalog.global("nothing")? {
            return Ok((self.msg("bye")?.to_string(), None));
        }
        let phrases = Some(self.mechanic_phrases(player)?);
        self.confused(phrases)
    }

    // --- henry -----------------------------------------------------------

    fn henry_phrases(&self) -> Result<Vec<String>, CatalogError> {
        Ok(vec![
            self.msg("ask_about_still")?.to_string(),
            self.nothing_label()?,
        ])
    }

    fn henry_respond(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<NpcTurn, CatalogError> {
        if text == self.msg("ask_about_still")? {
            if !player.has_item(Item::StillPlans) {
                player.inventory.push(Item::StillPlans);
            }
            return Ok((
                self.msg("still_info")?.to_string(),
                Some(self.henry_phrases()?),
            ));
        }
        if text == self.catalog.global("nothing")? {
            return Ok((self.msg("bye")?.to_string(), None));
        }
        let phrases = Some(self.henry_phrases()?);
        self.confused(phrases)
    }

    // --- merchant --------------------------------------------------------

    fn merchant_greeting(
        &mut self,
        player: &mut PlayerState,
        dice: &mut dyn DiceRoller,
    ) -> Result<NpcTurn, CatalogError> {
        if let NpcState::Market(ref mut market) = self.state {
            let stale = market
                .stock_turn
                .map_or(true, |turn| turn + STOCK_REFRESH_TURNS < player.turn);
            if market.stock.is_none() || stale {
                market.stock = Some(roll_stock(dice));
                market.stock_turn = Some(player.turn);
                debug!(
                    "merchant stock rerolled for player {} on turn {}",
                    player.player_id, player.turn
                );
            }
        }
        Ok((
            self.msg("greeting")?.to_string(),
            Some(self.merchant_phrases(player)?),
        ))
    }

    fn merchant_phrases(&self, player: &PlayerState) -> Result<Vec<String>, CatalogError> {
        let NpcState::Market(ref market) = self.state else {
            return Ok(Vec::new());
        };
        let stock = market.stock.clone().unwrap_or_default();
        let mut phrases = Vec::new();
        match market.mode {
            MarketMode::Buying => {
                let template = self.msg("buy_offer")?;
                for &(item, base) in MARKET_BASELINE {
                    let Some(&roll) = stock.get(&item) else {
                        continue;
                    };
                    if let Some(price) = sell_price(base, roll) {
                        let name = self.catalog.object_name(item.key())?;
                        phrases.push(fill(template, &[name, &price.to_string()]));
                    }
                }
            }
            MarketMode::Selling => {
                let template = self.msg("sell_offer")?;
                for &item in &player.inventory {
                    let Some(base) = baseline_price(item) else {
                        continue;
                    };
                    let Some(&roll) = stock.get(&item) else {
                        continue;
                    };
                    if let Some(price) = buy_price(base, roll) {
                        let name = self.catalog.object_name(item.key())?;
                        phrases.push(fill(template, &[name, &price.to_string()]));
                    }
                }
            }
            MarketMode::Browse => {
                phrases.push(self.msg("wanna_buy")?.to_string());
                phrases.push(self.msg("wanna_sell")?.to_string());
            }
        }
        phrases.push(self.nothing_label()?);
        Ok(phrases)
    }

    fn merchant_respond(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<NpcTurn, CatalogError> {
        let mode = match self.state {
            NpcState::Market(ref market) => market.mode,
            _ => MarketMode::Browse,
        };
        match mode {
            MarketMode::Buying => self.merchant_buying(text, player),
            MarketMode::Selling => self.merchant_selling(text, player),
            MarketMode::Browse => self.merchant_browse(text, player),
        }
    }

    fn merchant_browse(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<NpcTurn, CatalogError> {
        if text == self.msg("wanna_buy")? {
            if let NpcState::Market(ref mut market) = self.state {
                market.mode = MarketMode::Buying;
            }
            return Ok((
                self.msg("what_now")?.to_string(),
                Some(self.merchant_phrases(player)?),
            ));
        }
        if text == self.msg("wanna_sell")? {
            if let NpcState::Market(ref mut market) = self.state {
                market.mode = MarketMode::Selling;
            }
            return Ok((
                self.msg("what_now")?.to_string(),
                Some(self.merchant_phrases(player)?),
            ));
        }
        if text == self.catalog.global("nothing")? {
            // Dropping the table forces a fresh roll at the next greeting.
            if let NpcState::Market(ref mut market) = self.state {
                market.stock = None;
            }
            return Ok((self.msg("come_again")?.to_string(), None));
        }
        let phrases = Some(self.merchant_phrases(player)?);
        self.confused(phrases)
    }

    fn merchant_buying(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<NpcTurn, CatalogError> {
        if text == self.catalog.global("nothing")? {
            if let NpcState::Market(ref mut market) = self.state {
                market.mode = MarketMode::Browse;
            }
            return Ok((
                self.msg("something_else")?.to_string(),
                Some(self.merchant_phrases(player)?),
            ));
        }

        let stock = match self.state {
            NpcState::Market(ref market) => market.stock.clone().unwrap_or_default(),
            _ => Default::default(),
        };
        let template = self.msg("buy_offer")?;
        for &(item, base) in MARKET_BASELINE {
            let Some(&roll) = stock.get(&item) else {
                continue;
            };
            let Some(price) = sell_price(base, roll) else {
                continue;
            };
            let name = self.catalog.object_name(item.key())?;
            if text != fill(template, &[name, &price.to_string()]) {
                continue;
            }
            if player.money < price {
                let reply = fill(
                    self.msg("not_enough_money")?,
                    &[name, &price.to_string()],
                );
                return Ok((reply, Some(self.merchant_phrases(player)?)));
            }
            player.money -= price;
            player.inventory.push(item);
            if let NpcState::Market(ref mut market) = self.state {
                if let Some(stock) = market.stock.as_mut() {
                    *stock.entry(item).or_insert(roll) -= 1;
                }
                market.stock_turn = Some(player.turn);
            }
            debug!(
                "player {} bought a {} for {}",
                player.player_id,
                item.key(),
                price
            );
            let reply = fill(self.msg("bought")?, &[name, &price.to_string()]);
            return Ok((reply, Some(self.merchant_phrases(player)?)));
        }
        let phrases = Some(self.merchant_phrases(player)?);
        self.confused(phrases)
    }

    fn merchant_selling(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<NpcTurn, CatalogError> {
        if text == self.catalog.global("nothing")? {
            if let NpcState::Market(ref mut market) = self.state {
                market.mode = MarketMode::Browse;
            }
            return Ok((
                self.msg("something_else")?.to_string(),
                Some(self.merchant_phrases(player)?),
            ));
        }

        let stock = match self.state {
            NpcState::Market(ref market) => market.stock.clone().unwrap_or_default(),
            _ => Default::default(),
        };
        let template = self.msg("sell_offer")?;
        let held: Vec<Item> = player.inventory.clone();
        for item in held {
            let Some(base) = baseline_price(item) else {
                continue;
            };
            let Some(&roll) = stock.get(&item) else {
                continue;
            };
            let Some(price) = buy_price(base, roll) else {
                continue;
            };
            let name = self.catalog.object_name(item.key())?;
            if text != fill(template, &[name, &price.to_string()]) {
                continue;
            }
            player.remove_first(item);
            player.money += price;
            if let NpcState::Market(ref mut market) = self.state {
                if let Some(stock) = market.stock.as_mut() {
                    *stock.entry(item).or_insert(roll) += 1;
                }
                market.stock_turn = Some(player.turn);
            }
            debug!(
                "player {} sold a {} for {}",
                player.player_id,
                item.key(),
                price
            );
            let reply = fill(self.msg("sold")?, &[name, &price.to_string()]);
            return Ok((reply, Some(self.merchant_phrases(player)?)));
        }
        let phrases = Some(self.merchant_phrases(player)?);
        self.confused(phrases)
    }
}
