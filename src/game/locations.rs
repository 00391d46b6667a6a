//! The seven places of the game world.
//!
//! A [`Location`] is loaded fresh for every turn from the player's persisted
//! sub-state (seeded from the variant's defaults on first visit), answers
//! questions about itself, and resolves place-specific button presses. The
//! engine owns the generic buttons (inventory, take, talk); a location only
//! handles its own actions and the exits.

use log::debug;

use crate::catalog::{fill, Catalog, CatalogError};
use crate::game::dice::DiceRoller;
use crate::game::market::{self, SCAVENGE_COOLDOWN_TURNS};
use crate::game::types::{
    HomeState, Item, JunkyardState, LocationKey, LocationState, NpcKey, PlainLocationState,
    PlayerState,
};

/// The result of a matched location action: an optional transition plus the
/// narrative line (empty for plain movement).
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub next_location: Option<LocationKey>,
    pub narrative: String,
}

impl ActionOutcome {
    fn stay(narrative: impl Into<String>) -> Self {
        Self {
            next_location: None,
            narrative: narrative.into(),
        }
    }

    fn travel(destination: LocationKey) -> Self {
        Self {
            next_location: Some(destination),
            narrative: String::new(),
        }
    }
}

/// Everything the still needs besides itself.
const BREW_INGREDIENTS: [Item; 3] = [Item::Sugar, Item::Yeast, Item::Bottle];
/// Parts consumed when assembling the still.
const STILL_PARTS: [Item; 3] = [Item::Pipes, Item::Kettle, Item::Pot];

/// One location, bound to the catalog and carrying its mutable sub-state.
pub struct Location<'c> {
    key: LocationKey,
    catalog: &'c Catalog,
    pub state: LocationState,
}

impl<'c> Location<'c> {
    /// Bind a location, seeding default sub-state on the first visit.
    pub fn load(key: LocationKey, catalog: &'c Catalog, state: Option<LocationState>) -> Self {
        let state = state.unwrap_or_else(|| Self::initial_state(key));
        Self {
            key,
            catalog,
            state,
        }
    }

    fn initial_state(key: LocationKey) -> LocationState {
        match key {
            LocationKey::Home => LocationState::Home(HomeState::default()),
            LocationKey::Junkyard => LocationState::Junkyard(JunkyardState::default()),
            _ => LocationState::Plain(PlainLocationState::default()),
        }
    }

    pub fn key(&self) -> LocationKey {
        self.key
    }

    fn msg(&self, key: &str) -> Result<&'c str, CatalogError> {
        self.catalog.location_text(self.key.as_str(), key)
    }

    /// Static exit list per variant.
    pub fn exits(&self) -> &'static [LocationKey] {
        match self.key {
            LocationKey::Home => &[LocationKey::Street],
            LocationKey::Street => &[
                LocationKey::Home,
                LocationKey::PowerCompany,
                LocationKey::Hospital,
                LocationKey::Garage,
                LocationKey::Shop,
                LocationKey::Junkyard,
            ],
            LocationKey::PowerCompany
            | LocationKey::Hospital
            | LocationKey::Garage
            | LocationKey::Shop
            | LocationKey::Junkyard => &[LocationKey::Street],
        }
    }

    /// Who is around to talk to. May depend on quest flags.
    pub fn npcs_present(&self, player: &PlayerState) -> Vec<NpcKey> {
        match self.key {
            LocationKey::Street => vec![NpcKey::Henry],
            LocationKey::PowerCompany => {
                let mut present = vec![NpcKey::Clerk];
                if !player.electrician_dispatched {
                    present.push(NpcKey::Electrician);
                }
                present
            }
            LocationKey::Hospital => vec![NpcKey::Doctor],
            LocationKey::Garage => vec![NpcKey::Mechanic],
            LocationKey::Shop => vec![NpcKey::Merchant],
            LocationKey::Home | LocationKey::Junkyard => Vec::new(),
        }
    }

    /// Compose the description from the base line and state-dependent
    /// clauses. Pure: identical state and player always read the same.
    pub fn description(&self, player: &PlayerState) -> Result<String, CatalogError> {
        let mut text = self.msg("description")?.to_string();
        match (&self.state, self.key) {
            (LocationState::Home(home), _) => {
                if home.generator_installed {
                    if home.gas_on {
                        text.push(' ');
                        text.push_str(self.msg("generator_running")?);
                        text.push(' ');
                        text.push_str(self.msg("light")?);
                    } else {
                        text.push(' ');
                        text.push_str(self.msg("generator_stopped")?);
                        text.push(' ');
                        text.push_str(self.msg("no_light")?);
                    }
                } else {
                    text.push(' ');
                    text.push_str(self.msg("no_light")?);
                }
                if home.objects.contains(&Item::Kettle) {
                    text.push(' ');
                    text.push_str(self.msg("kettle_on_gas")?);
                }
                text.push(' ');
                text.push_str(self.msg(if home.gas_on { "gas_on" } else { "gas_off" })?);
            }
            (_, LocationKey::PowerCompany) => {
                if !player.electrician_dispatched {
                    text.push(' ');
                    text.push_str(self.msg("electrician_asleep")?);
                }
            }
            _ => {}
        }
        Ok(text)
    }

    /// The full button list for this location, in menu order: inventory,
    /// take buttons, variant actions, exits. Talk buttons are appended by
    /// the engine.
    pub fn available_actions(&self, player: &PlayerState) -> Result<Vec<String>, CatalogError> {
        let mut buttons = Vec::new();
        buttons.push(self.catalog.global("show_inventory")?.to_string());

        let take_template = self.catalog.global("take")?;
        for &object in self.state.objects() {
            let name = self.catalog.object_name(object.key())?;
            buttons.push(fill(take_template, &[name]));
        }

        match &self.state {
            LocationState::Home(home) => {
                buttons.push(
                    self.msg(if home.gas_on {
                        "turn_off_gas"
                    } else {
                        "turn_on_gas"
                    })?
                    .to_string(),
                );
                if player.has_all(&STILL_PARTS) {
                    buttons.push(self.msg("build_still")?.to_string());
                }
                if !home.generator_installed && player.has_item(Item::Generator) {
                    buttons.push(self.msg("install_generator")?.to_string());
                }
                if !home.still_installed && player.has_item(Item::Still) {
                    buttons.push(self.msg("install_still")?.to_string());
                }
                if Self::can_brew(home, player) {
                    buttons.push(self.msg("brew_moonshine")?.to_string());
                }
                buttons.push(self.msg("look_at_window")?.to_string());
                buttons.push(self.msg("inspect_table")?.to_string());
            }
            LocationState::Junkyard(_) => {
                buttons.push(self.msg("try_scavenge")?.to_string());
            }
            LocationState::Plain(_) => {}
        }

        for &exit in self.exits() {
            buttons.push(self.catalog.go_to_label(exit.as_str())?.to_string());
        }
        Ok(buttons)
    }

    fn can_brew(home: &HomeState, player: &PlayerState) -> bool {
        home.still_installed && home.gas_on && player.has_all(&BREW_INGREDIENTS)
    }

    /// Exact-match dispatch of a button against this location's own actions
    /// and exits. `Ok(None)` means the text matched nothing here; the engine
    /// decides what to tell the player.
    pub fn resolve_action(
        &mut self,
        text: &str,
        player: &mut PlayerState,
        dice: &mut dyn DiceRoller,
    ) -> Result<Option<ActionOutcome>, CatalogError> {
        if let Some(outcome) = self.resolve_variant_action(text, player, dice)? {
            return Ok(Some(outcome));
        }
        for &exit in self.exits() {
            if text == self.catalog.go_to_label(exit.as_str())? {
                return Ok(Some(ActionOutcome::travel(exit)));
            }
        }
        Ok(None)
    }

    fn resolve_variant_action(
        &mut self,
        text: &str,
        player: &mut PlayerState,
        dice: &mut dyn DiceRoller,
    ) -> Result<Option<ActionOutcome>, CatalogError> {
        match self.key {
            LocationKey::Home => self.resolve_home_action(text, player),
            LocationKey::Junkyard => self.resolve_junkyard_action(text, player, dice),
            _ => Ok(None),
        }
    }

    fn resolve_home_action(
        &mut self,
        text: &str,
        player: &mut PlayerState,
    ) -> Result<Option<ActionOutcome>, CatalogError> {
        let LocationState::Home(ref mut home) = self.state else {
            return Ok(None);
        };

        if home.gas_on && text == self.catalog.location_text("home", "turn_off_gas")? {
            home.gas_on = false;
            return Ok(Some(ActionOutcome::stay(
                self.catalog.location_text("home", "gas_turned_off")?,
            )));
        }
        if !home.gas_on && text == self.catalog.location_text("home", "turn_on_gas")? {
            home.gas_on = true;
            if home.generator_installed {
                debug!("player {} lit the generator: game won", player.player_id);
                player.won = true;
            }
            return Ok(Some(ActionOutcome::stay(
                self.catalog.location_text("home", "gas_turned_on")?,
            )));
        }
        if text == self.catalog.location_text("home", "look_at_window")? {
            return Ok(Some(ActionOutcome::stay(
                self.catalog.location_text("home", "at_street")?,
            )));
        }
        if text == self.catalog.location_text("home", "inspect_table")? {
            if home.table_inspected {
                return Ok(Some(ActionOutcome::stay(
                    self.catalog.location_text("home", "nothing_on_table")?,
                )));
            }
            home.table_inspected = true;
            player.inventory.push(Item::Receipts);
            return Ok(Some(ActionOutcome::stay(
                self.catalog.location_text("home", "found_receipts")?,
            )));
        }
        if !home.generator_installed
            && player.has_item(Item::Generator)
            && text == self.catalog.location_text("home", "install_generator")?
        {
            return Ok(Some(Self::install_over_burner(
                self.catalog,
                home,
                player,
                Item::Generator,
                "generator_installed",
            )?));
        }
        if player.has_all(&STILL_PARTS)
            && text == self.catalog.location_text("home", "build_still")?
        {
            player.remove_first(Item::StillPlans);
            for part in STILL_PARTS {
                player.remove_first(part);
            }
            player.inventory.push(Item::Still);
            return Ok(Some(ActionOutcome::stay(
                self.catalog.location_text("home", "still_built")?,
            )));
        }
        if !home.still_installed
            && player.has_item(Item::Still)
            && text == self.catalog.location_text("home", "install_still")?
        {
            return Ok(Some(Self::install_over_burner(
                self.catalog,
                home,
                player,
                Item::Still,
                "still_installed",
            )?));
        }
        if text == self.catalog.location_text("home", "brew_moonshine")?
            && Self::can_brew(home, player)
        {
            for ingredient in BREW_INGREDIENTS {
                player.remove_first(ingredient);
            }
            player.inventory.push(Item::Moonshine);
            return Ok(Some(ActionOutcome::stay(
                self.catalog.location_text("home", "brewed")?,
            )));
        }
        Ok(None)
    }

    /// Shared burn logic for putting a machine over the stove. Installing
    /// with the gas lit burns the player once; while burned, installs stay
    /// blocked with a distinct message. Nothing is consumed on a failure.
    fn install_over_burner(
        catalog: &Catalog,
        home: &mut HomeState,
        player: &mut PlayerState,
        machine: Item,
        done_key: &str,
    ) -> Result<ActionOutcome, CatalogError> {
        let machine_name = catalog.object_name(machine.key())?;
        if player.burned {
            return Ok(ActionOutcome::stay(fill(
                catalog.location_text("home", "already_burnt")?,
                &[machine_name],
            )));
        }
        if home.gas_on {
            player.burned = true;
            return Ok(ActionOutcome::stay(fill(
                catalog.location_text("home", "hot_surface")?,
                &[machine_name],
            )));
        }
        match machine {
            Item::Generator => home.generator_installed = true,
            _ => home.still_installed = true,
        }
        player.remove_first(machine);
        Ok(ActionOutcome::stay(
            catalog.location_text("home", done_key)?,
        ))
    }

    fn resolve_junkyard_action(
        &mut self,
        text: &str,
        player: &mut PlayerState,
        dice: &mut dyn DiceRoller,
    ) -> Result<Option<ActionOutcome>, CatalogError> {
        let LocationState::Junkyard(ref mut yard) = self.state else {
            return Ok(None);
        };
        if text != self.catalog.location_text("junkyard", "try_scavenge")? {
            return Ok(None);
        }

        let eligible = yard
            .last_scavenge_turn
            .map_or(true, |last| player.turn.saturating_sub(last) >= SCAVENGE_COOLDOWN_TURNS);
        if !eligible {
            return Ok(Some(ActionOutcome::stay(
                self.catalog.location_text("junkyard", "already_searched")?,
            )));
        }

        yard.last_scavenge_turn = Some(player.turn);
        match market::scavenge(dice) {
            Some(found) => {
                debug!(
                    "player {} scavenged a {} on turn {}",
                    player.player_id,
                    found.key(),
                    player.turn
                );
                player.inventory.push(found);
                let name = self.catalog.object_name(found.key())?;
                Ok(Some(ActionOutcome::stay(fill(
                    self.catalog.location_text("junkyard", "found")?,
                    &[name],
                ))))
            }
            None => Ok(Some(ActionOutcome::stay(
                self.catalog.location_text("junkyard", "nothing_found")?,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::dice::ScriptedDice;

    fn catalog() -> Catalog {
        Catalog::builtin().expect("builtin catalog")
    }

    fn fresh_player() -> PlayerState {
        let mut player = PlayerState::new("p1", 100);
        player.name = Some("Ada".into());
        player.in_intro = false;
        player
    }

    fn no_dice() -> ScriptedDice {
        ScriptedDice::new([])
    }

    #[test]
    fn home_seeds_kettle_and_gas_on() {
        let catalog = catalog();
        let home = Location::load(LocationKey::Home, &catalog, None);
        assert_eq!(home.state.objects(), &[Item::Kettle]);
        match &home.state {
            LocationState::Home(state) => assert!(state.gas_on),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn menu_order_is_inventory_takes_actions_exits() {
        let catalog = catalog();
        let player = fresh_player();
        let home = Location::load(LocationKey::Home, &catalog, None);
        let buttons = home.available_actions(&player).expect("actions");
        assert_eq!(buttons[0], catalog.global("show_inventory").unwrap());
        assert_eq!(
            buttons[1],
            fill(
                catalog.global("take").unwrap(),
                &[catalog.object_name("kettle").unwrap()]
            )
        );
        assert_eq!(
            buttons.last().unwrap(),
            catalog.go_to_label("street").unwrap()
        );
    }

    #[test]
    fn gas_toggle_flips_state_and_button() {
        let catalog = catalog();
        let mut player = fresh_player();
        let mut dice = no_dice();
        let mut home = Location::load(LocationKey::Home, &catalog, None);

        let off_label = catalog.location_text("home", "turn_off_gas").unwrap();
        let outcome = home
            .resolve_action(off_label, &mut player, &mut dice)
            .expect("resolve")
            .expect("matched");
        assert_eq!(
            outcome.narrative,
            catalog.location_text("home", "gas_turned_off").unwrap()
        );
        let buttons = home.available_actions(&player).expect("actions");
        assert!(buttons.contains(&catalog.location_text("home", "turn_on_gas").unwrap().to_string()));
    }

    #[test]
    fn table_inspection_is_idempotent() {
        let catalog = catalog();
        let mut player = fresh_player();
        let mut dice = no_dice();
        let mut home = Location::load(LocationKey::Home, &catalog, None);
        let inspect = catalog
            .location_text("home", "inspect_table")
            .unwrap()
            .to_string();

        let first = home
            .resolve_action(&inspect, &mut player, &mut dice)
            .expect("resolve")
            .expect("matched");
        assert_eq!(
            first.narrative,
            catalog.location_text("home", "found_receipts").unwrap()
        );
        assert_eq!(player.inventory, vec![Item::Receipts]);

        let second = home
            .resolve_action(&inspect, &mut player, &mut dice)
            .expect("resolve")
            .expect("matched");
        assert_eq!(
            second.narrative,
            catalog.location_text("home", "nothing_on_table").unwrap()
        );
        assert_eq!(player.inventory, vec![Item::Receipts]);
    }

    #[test]
    fn installing_generator_on_live_burner_burns_once() {
        let catalog = catalog();
        let mut player = fresh_player();
        player.inventory.push(Item::Generator);
        let mut dice = no_dice();
        let mut home = Location::load(LocationKey::Home, &catalog, None);
        let install = catalog
            .location_text("home", "install_generator")
            .unwrap()
            .to_string();

        let first = home
            .resolve_action(&install, &mut player, &mut dice)
            .expect("resolve")
            .expect("matched");
        assert!(player.burned);
        assert!(player.has_item(Item::Generator), "nothing consumed on a burn");
        assert!(first.narrative.contains("burn"));

        let second = home
            .resolve_action(&install, &mut player, &mut dice)
            .expect("resolve")
            .expect("matched");
        assert_ne!(first.narrative, second.narrative, "distinct message while burned");
        match &home.state {
            LocationState::Home(state) => assert!(!state.generator_installed),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn winning_requires_generator_then_gas() {
        let catalog = catalog();
        let mut player = fresh_player();
        player.inventory.push(Item::Generator);
        let mut dice = no_dice();
        let mut home = Location::load(LocationKey::Home, &catalog, None);

        let off = catalog.location_text("home", "turn_off_gas").unwrap().to_string();
        let on = catalog.location_text("home", "turn_on_gas").unwrap().to_string();
        let install = catalog
            .location_text("home", "install_generator")
            .unwrap()
            .to_string();

        home.resolve_action(&off, &mut player, &mut dice).unwrap();
        home.resolve_action(&install, &mut player, &mut dice).unwrap();
        assert!(!player.won);
        assert!(!player.has_item(Item::Generator), "generator consumed");
        home.resolve_action(&on, &mut player, &mut dice).unwrap();
        assert!(player.won);
    }

    #[test]
    fn brewing_consumes_ingredients_and_needs_gas() {
        let catalog = catalog();
        let mut player = fresh_player();
        player.inventory.extend([Item::Sugar, Item::Yeast, Item::Bottle]);
        let mut dice = no_dice();
        let mut state = HomeState {
            still_installed: true,
            ..HomeState::default()
        };
        state.objects.clear();
        let mut home = Location::load(
            LocationKey::Home,
            &catalog,
            Some(LocationState::Home(state)),
        );
        let brew = catalog
            .location_text("home", "brew_moonshine")
            .unwrap()
            .to_string();

        let outcome = home
            .resolve_action(&brew, &mut player, &mut dice)
            .expect("resolve")
            .expect("matched");
        assert_eq!(
            outcome.narrative,
            catalog.location_text("home", "brewed").unwrap()
        );
        assert_eq!(player.inventory, vec![Item::Moonshine]);
    }

    #[test]
    fn scavenge_rate_limit() {
        let catalog = catalog();
        let mut player = fresh_player();
        player.turn = 20;
        let mut yard = Location::load(LocationKey::Junkyard, &catalog, None);
        let dig = catalog
            .location_text("junkyard", "try_scavenge")
            .unwrap()
            .to_string();

        // First dig: full roll set, scarce budget => empty-handed but spent.
        let mut sums = vec![4u8; market::SCAVENGE_BASELINE.len()];
        sums.push(4);
        let mut dice = ScriptedDice::from_3d6_sums(sums);
        let first = yard
            .resolve_action(&dig, &mut player, &mut dice)
            .expect("resolve")
            .expect("matched");
        assert_eq!(
            first.narrative,
            catalog.location_text("junkyard", "nothing_found").unwrap()
        );

        // Second dig 5 turns later: rate-limited, no dice consumed.
        player.turn = 25;
        let mut dice = ScriptedDice::new([]);
        let second = yard
            .resolve_action(&dig, &mut player, &mut dice)
            .expect("resolve")
            .expect("matched");
        assert_eq!(
            second.narrative,
            catalog.location_text("junkyard", "already_searched").unwrap()
        );

        // Third dig 10 turns after the first: eligible again.
        player.turn = 30;
        let mut sums = vec![4u8; market::SCAVENGE_BASELINE.len()];
        sums.push(4);
        let mut dice = ScriptedDice::from_3d6_sums(sums);
        let third = yard
            .resolve_action(&dig, &mut player, &mut dice)
            .expect("resolve")
            .expect("matched");
        assert_eq!(
            third.narrative,
            catalog.location_text("junkyard", "nothing_found").unwrap()
        );
    }

    #[test]
    fn electrician_leaves_after_dispatch() {
        let catalog = catalog();
        let mut player = fresh_player();
        let office = Location::load(LocationKey::PowerCompany, &catalog, None);
        assert!(office.npcs_present(&player).contains(&NpcKey::Electrician));
        player.electrician_dispatched = true;
        assert!(!office.npcs_present(&player).contains(&NpcKey::Electrician));
    }

    #[test]
    fn unmatched_text_matches_nothing() {
        let catalog = catalog();
        let mut player = fresh_player();
        let mut dice = no_dice();
        let mut street = Location::load(LocationKey::Street, &catalog, None);
        let result = street
            .resolve_action("do a backflip", &mut player, &mut dice)
            .expect("resolve");
        assert!(result.is_none());
    }

    #[test]
    fn exits_resolve_to_travel() {
        let catalog = catalog();
        let mut player = fresh_player();
        let mut dice = no_dice();
        let mut home = Location::load(LocationKey::Home, &catalog, None);
        let go = catalog.go_to_label("street").unwrap().to_string();
        let outcome = home
            .resolve_action(&go, &mut player, &mut dice)
            .expect("resolve")
            .expect("matched");
        assert_eq!(outcome.next_location, Some(LocationKey::Street));
        assert!(outcome.narrative.is_empty());
    }
}
