//! The blackout economy: baseline prices, scarcity rolls and the pricing
//! model shared by the merchant's stall and the junkyard's loot table.
//!
//! Each good carries a 3d6 scarcity roll. A high roll means the good is
//! plentiful and cheap; a roll under [`SCARCITY_THRESHOLD`] means the
//! merchant has none to sell and pays over baseline to acquire it.

use std::collections::BTreeMap;

use crate::game::dice::DiceRoller;
use crate::game::types::Item;

/// Rolls below this mean the good is effectively out of stock.
pub const SCARCITY_THRESHOLD: i64 = 7;

/// The merchant re-rolls the whole stock table after this many turns.
pub const STOCK_REFRESH_TURNS: u64 = 50;

/// The junkyard can be searched again after this many turns.
pub const SCAVENGE_COOLDOWN_TURNS: u64 = 10;

/// The budget baseline for a scavenging run.
pub const SCAVENGE_BUDGET_BASE: i64 = 300;

/// Goods the merchant trades, with baseline prices. Order is the order
/// offers appear in the buy menu.
pub const MARKET_BASELINE: &[(Item, i64)] = &[
    (Item::Magnet, 1000),
    (Item::CopperWire, 300),
    (Item::Piston, 750),
    (Item::Valve, 200),
    (Item::Moonshine, 100),
    (Item::Bottle, 20),
    (Item::Sugar, 20),
    (Item::Yeast, 20),
    (Item::Kettle, 100),
    (Item::Pipes, 50),
    (Item::Pot, 100),
];

/// What can turn up under the junkyard's washing machines, with the value
/// baseline used to price each find.
pub const SCAVENGE_BASELINE: &[(Item, i64)] = &[
    (Item::Magnet, 1000),
    (Item::CopperWire, 300),
    (Item::Piston, 750),
    (Item::Valve, 200),
    (Item::Bottle, 5),
    (Item::Pipes, 30),
    (Item::Kettle, 70),
    (Item::Pot, 50),
];

/// Baseline price of a tradeable good; `None` for goods the merchant does
/// not deal in.
pub fn baseline_price(item: Item) -> Option<i64> {
    MARKET_BASELINE
        .iter()
        .find(|(good, _)| *good == item)
        .map(|(_, base)| *base)
}

/// Price the merchant charges the player, `None` when the roll says the
/// shelf is empty. `floor(11 * base / roll)`.
pub fn sell_price(base: i64, roll: i64) -> Option<i64> {
    if roll < SCARCITY_THRESHOLD {
        return None;
    }
    Some(11 * base / roll)
}

/// Price the merchant pays the player. A scarce good fetches 1.2x baseline;
/// otherwise 0.8x of the current sell price.
pub fn buy_price(base: i64, roll: i64) -> Option<i64> {
    if roll < SCARCITY_THRESHOLD {
        return Some(base * 12 / 10);
    }
    sell_price(base, roll).map(|price| price * 8 / 10)
}

/// Roll a fresh stock table: one 3d6 per tradeable good.
pub fn roll_stock(dice: &mut dyn DiceRoller) -> BTreeMap<Item, i64> {
    MARKET_BASELINE
        .iter()
        .map(|&(item, _)| (item, i64::from(dice.roll_3d6())))
        .collect()
}

/// One scavenging run through the junkyard.
///
/// Each candidate gets its own scarcity roll; the ones that turn up at all
/// are priced like a sale, shuffled, and checked against an independently
/// rolled budget. The first find the budget covers is the haul; most runs
/// come home empty-handed.
pub fn scavenge(dice: &mut dyn DiceRoller) -> Option<Item> {
    let mut finds: Vec<(Item, i64)> = Vec::new();
    for &(item, base) in SCAVENGE_BASELINE {
        let roll = i64::from(dice.roll_3d6());
        if let Some(price) = sell_price(base, roll) {
            finds.push((item, price));
        }
    }

    let order = dice.shuffle_indices(finds.len());

    let budget_roll = i64::from(dice.roll_3d6());
    let budget = sell_price(SCAVENGE_BUDGET_BASE, budget_roll)?;

    order
        .into_iter()
        .map(|index| finds[index])
        .find(|&(_, price)| budget >= price)
        .map(|(item, _)| item)
}
