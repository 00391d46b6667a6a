//! Record types for players, per-variant sub-states, and the leaderboard.
//!
//! Everything here serializes with serde into self-describing JSON payloads.
//! Sub-state structs default every field, so records written by older builds
//! load cleanly and unknown legacy fields are ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const SCORE_SCHEMA_VERSION: u8 = 1;

/// Starting cash for a fresh player when the config does not override it.
pub const DEFAULT_STARTING_MONEY: i64 = 100;

/// Every object that can sit in a bag or on a floor. The snake_case key is
/// the stable identifier used in the catalog and in persisted state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Magnet,
    CopperWire,
    Piston,
    Valve,
    Bottle,
    Pipes,
    Kettle,
    Pot,
    Sugar,
    Yeast,
    Moonshine,
    Receipts,
    GeneratorPlans,
    StillPlans,
    Generator,
    Still,
}

impl Item {
    pub const ALL: [Item; 16] = [
        Item::Magnet,
        Item::CopperWire,
        Item::Piston,
        Item::Valve,
        Item::Bottle,
        Item::Pipes,
        Item::Kettle,
        Item::Pot,
        Item::Sugar,
        Item::Yeast,
        Item::Moonshine,
        Item::Receipts,
        Item::GeneratorPlans,
        Item::StillPlans,
        Item::Generator,
        Item::Still,
    ];

    /// Stable catalog/persistence key.
    pub fn key(self) -> &'static str {
        match self {
            Item::Magnet => "magnet",
            Item::CopperWire => "copper_wire",
            Item::Piston => "piston",
            Item::Valve => "valve",
            Item::Bottle => "bottle",
            Item::Pipes => "pipes",
            Item::Kettle => "kettle",
            Item::Pot => "pot",
            Item::Sugar => "sugar",
            Item::Yeast => "yeast",
            Item::Moonshine => "moonshine",
            Item::Receipts => "receipts",
            Item::GeneratorPlans => "generator_plans",
            Item::StillPlans => "still_plans",
            Item::Generator => "generator",
            Item::Still => "still",
        }
    }

    /// Reverse of [`Item::key`]; used by the debug commands.
    pub fn from_key(key: &str) -> Option<Item> {
        Item::ALL.into_iter().find(|item| item.key() == key)
    }
}

/// The seven places in the world.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LocationKey {
    Home,
    Street,
    PowerCompany,
    Hospital,
    Garage,
    Shop,
    Junkyard,
}

impl LocationKey {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationKey::Home => "home",
            LocationKey::Street => "street",
            LocationKey::PowerCompany => "power_company",
            LocationKey::Hospital => "hospital",
            LocationKey::Garage => "garage",
            LocationKey::Shop => "shop",
            LocationKey::Junkyard => "junkyard",
        }
    }
}

/// The six people worth talking to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NpcKey {
    Electrician,
    Clerk,
    Doctor,
    Mechanic,
    Henry,
    Merchant,
}

impl NpcKey {
    pub fn as_str(self) -> &'static str {
        match self {
            NpcKey::Electrician => "electrician",
            NpcKey::Clerk => "clerk",
            NpcKey::Doctor => "doctor",
            NpcKey::Mechanic => "mechanic",
            NpcKey::Henry => "henry",
            NpcKey::Merchant => "merchant",
        }
    }
}

/// Persisted memory of the player's home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeState {
    #[serde(default = "default_true")]
    pub gas_on: bool,
    #[serde(default)]
    pub table_inspected: bool,
    #[serde(default)]
    pub generator_installed: bool,
    #[serde(default)]
    pub still_installed: bool,
    #[serde(default)]
    pub objects: Vec<Item>,
}

fn default_true() -> bool {
    true
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            gas_on: true,
            table_inspected: false,
            generator_installed: false,
            still_installed: false,
            objects: vec![Item::Kettle],
        }
    }
}

/// Persisted memory of the junkyard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JunkyardState {
    #[serde(default)]
    pub last_scavenge_turn: Option<u64>,
    #[serde(default)]
    pub objects: Vec<Item>,
}

/// Persisted memory of a location with no special mechanics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainLocationState {
    #[serde(default)]
    pub objects: Vec<Item>,
}

/// One location's persisted sub-state, tagged by variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationState {
    Home(HomeState),
    Junkyard(JunkyardState),
    Plain(PlainLocationState),
}

impl LocationState {
    /// Objects currently lying around at the location.
    pub fn objects(&self) -> &[Item] {
        match self {
            LocationState::Home(s) => &s.objects,
            LocationState::Junkyard(s) => &s.objects,
            LocationState::Plain(s) => &s.objects,
        }
    }

    pub fn objects_mut(&mut self) -> &mut Vec<Item> {
        match self {
            LocationState::Home(s) => &mut s.objects,
            LocationState::Junkyard(s) => &mut s.objects,
            LocationState::Plain(s) => &mut s.objects,
        }
    }
}

/// Which of the merchant's menus the conversation is sitting in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketMode {
    #[default]
    Browse,
    Buying,
    Selling,
}

/// The merchant's rolling stock table. A `None` stock forces a fresh roll at
/// the next greeting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    #[serde(default)]
    pub stock: Option<BTreeMap<Item, i64>>,
    #[serde(default)]
    pub stock_turn: Option<u64>,
    #[serde(default)]
    pub mode: MarketMode,
}

/// The administrator's two-step request flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClerkState {
    #[serde(default)]
    pub asked: bool,
    #[serde(default)]
    pub request_accepted: bool,
}

/// The mechanic remembers whether the one-off build already happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MechanicState {
    #[serde(default)]
    pub generator_built: bool,
}

/// One NPC's persisted sub-state, tagged by variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NpcState {
    Market(MarketState),
    Clerk(ClerkState),
    Mechanic(MechanicState),
    Plain {},
}

/// Everything the bot knows about one player, keyed by the transport's
/// stable player identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub player_id: String,
    pub turn: u64,
    pub in_intro: bool,
    pub name: Option<String>,
    pub current_location: LocationKey,
    pub current_npc: Option<NpcKey>,
    pub inventory: Vec<Item>,
    pub money: i64,
    #[serde(default)]
    pub locations: BTreeMap<LocationKey, LocationState>,
    #[serde(default)]
    pub npcs: BTreeMap<NpcKey, NpcState>,
    #[serde(default)]
    pub knows_about_generator: bool,
    #[serde(default)]
    pub filled_power_request: bool,
    #[serde(default)]
    pub electrician_dispatched: bool,
    #[serde(default)]
    pub burned: bool,
    #[serde(default)]
    pub won: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerState {
    pub fn new(player_id: &str, starting_money: i64) -> Self {
        let now = Utc::now();
        Self {
            player_id: player_id.to_string(),
            turn: 0,
            in_intro: true,
            name: None,
            current_location: LocationKey::Home,
            current_npc: None,
            inventory: Vec::new(),
            money: starting_money,
            locations: BTreeMap::new(),
            npcs: BTreeMap::new(),
            knows_about_generator: false,
            filled_power_request: false,
            electrician_dispatched: false,
            burned: false,
            won: false,
            created_at: now,
            updated_at: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    /// Wipe everything back to a fresh game, keeping only the identifier and
    /// the creation timestamp. The name is cleared too; `/start` re-runs the
    /// whole onboarding flow.
    pub fn reset(&mut self, starting_money: i64) {
        let id = std::mem::take(&mut self.player_id);
        let created = self.created_at;
        *self = PlayerState::new(&id, starting_money);
        self.created_at = created;
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn has_item(&self, item: Item) -> bool {
        self.inventory.contains(&item)
    }

    pub fn has_all(&self, items: &[Item]) -> bool {
        items.iter().all(|item| self.inventory.contains(item))
    }

    /// Remove the first matching instance, leaving other copies intact.
    /// Returns whether anything was removed.
    pub fn remove_first(&mut self, item: Item) -> bool {
        match self.inventory.iter().position(|&held| held == item) {
            Some(index) => {
                self.inventory.remove(index);
                true
            }
            None => false,
        }
    }
}

/// One immutable leaderboard entry, written exactly once at the moment of
/// winning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub turns: u64,
    pub money: i64,
    pub score: i64,
    pub recorded_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl ScoreRecord {
    pub fn new(name: &str, turns: u64, money: i64) -> Self {
        Self {
            name: name.to_string(),
            turns,
            money,
            score: Self::score_for(turns, money),
            recorded_at: Utc::now(),
            schema_version: SCORE_SCHEMA_VERSION,
        }
    }

    pub fn score_for(turns: u64, money: i64) -> i64 {
        50 * turns as i64 + money
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_keys_round_trip() {
        for item in Item::ALL {
            assert_eq!(Item::from_key(item.key()), Some(item));
        }
        assert_eq!(Item::from_key("unobtainium"), None);
    }

    #[test]
    fn remove_first_leaves_duplicates() {
        let mut player = PlayerState::new("p1", 100);
        player.inventory = vec![Item::Bottle, Item::Kettle, Item::Bottle];
        assert!(player.remove_first(Item::Bottle));
        assert_eq!(player.inventory, vec![Item::Kettle, Item::Bottle]);
        assert!(!player.remove_first(Item::Magnet));
    }

    #[test]
    fn reset_keeps_identity() {
        let mut player = PlayerState::new("p1", 100);
        player.name = Some("Ada".into());
        player.turn = 40;
        player.won = true;
        player.reset(100);
        assert_eq!(player.player_id, "p1");
        assert_eq!(player.turn, 0);
        assert!(player.in_intro);
        assert_eq!(player.name, None);
        assert!(!player.won);
    }

    #[test]
    fn legacy_payload_with_unknown_fields_loads() {
        let json = r#"{
            "kind": "home",
            "gas_on": false,
            "objects": ["kettle"],
            "mystery_flag": true
        }"#;
        let state: LocationState = serde_json::from_str(json).expect("load");
        match state {
            LocationState::Home(home) => {
                assert!(!home.gas_on);
                assert_eq!(home.objects, vec![Item::Kettle]);
                assert!(!home.table_inspected);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn score_formula() {
        assert_eq!(ScoreRecord::score_for(10, 250), 750);
        let record = ScoreRecord::new("Ada", 10, 250);
        assert_eq!(record.score, 750);
    }
}
