// Market behavior end to end: scripted stock rolls, the pricing fixtures,
// purchase rejection without mutation, and stock drift on trade.

mod common;

use blackoutbot::catalog::fill;
use blackoutbot::game::dice::ScriptedDice;
use blackoutbot::game::market::MARKET_BASELINE;
use blackoutbot::game::types::Item;
use common::{reply_text, GameFixture};

/// Every good rolls the given sum at the next merchant greeting.
fn stock_dice(sum: u8) -> ScriptedDice {
    ScriptedDice::from_3d6_sums(vec![sum; MARKET_BASELINE.len()])
}

fn walk_to_shop(fx: &GameFixture) {
    let mut dice = ScriptedDice::new([]);
    fx.onboard(&mut dice);
    fx.send(&mut dice, &fx.go("street"));
    fx.send(&mut dice, &fx.go("shop"));
}

#[test]
fn plentiful_roll_prices_at_eleven_over_roll() {
    let fx = GameFixture::new();
    walk_to_shop(&fx);

    // Roll 12 everywhere: copper wire (baseline 300) sells for 275.
    let mut dice = stock_dice(12);
    fx.send(&mut dice, &fx.talk("merchant"));
    let replies = fx.send(&mut dice, &fx.npc("merchant", "wanna_buy"));
    let offer = fill(
        &fx.npc("merchant", "buy_offer"),
        &[fx.catalog.object_name("copper_wire").unwrap(), "275"],
    );
    assert!(
        replies[0].menu.contains(&offer),
        "expected {:?} in {:?}",
        offer,
        replies[0].menu
    );
}

#[test]
fn scarce_roll_hides_the_sell_offer_but_overpays_on_buyback() {
    let fx = GameFixture::new();
    walk_to_shop(&fx);
    let mut dice = ScriptedDice::new([]);
    fx.send(&mut dice, "/give copper_wire");

    // Roll 5 everywhere: nothing on the shelves, but the merchant pays
    // floor(300 * 1.2) = 360 for the player's copper wire.
    let mut dice = stock_dice(5);
    fx.send(&mut dice, &fx.talk("merchant"));
    let replies = fx.send(&mut dice, &fx.npc("merchant", "wanna_buy"));
    assert_eq!(
        replies[0].menu,
        vec![fx.nothing()],
        "no sell offers on a scarce roll"
    );

    fx.send(&mut dice, &fx.nothing());
    fx.send(&mut dice, &fx.npc("merchant", "wanna_sell"));
    let offer = fill(
        &fx.npc("merchant", "sell_offer"),
        &[fx.catalog.object_name("copper_wire").unwrap(), "360"],
    );
    let replies = fx.send(&mut dice, &offer);
    assert!(reply_text(&replies).contains("360"));
    let player = fx.player();
    assert_eq!(player.money, 460, "100 starting + 360 sale");
    assert!(!player.has_item(Item::CopperWire));
}

#[test]
fn purchase_without_money_is_rejected_without_mutation() {
    let fx = GameFixture::new();
    walk_to_shop(&fx);

    // Roll 11 everywhere: the magnet costs 1000, far beyond the starting
    // 100.
    let mut dice = stock_dice(11);
    fx.send(&mut dice, &fx.talk("merchant"));
    fx.send(&mut dice, &fx.npc("merchant", "wanna_buy"));
    let before = fx.player();
    let offer = fill(
        &fx.npc("merchant", "buy_offer"),
        &[fx.catalog.object_name("magnet").unwrap(), "1000"],
    );
    let replies = fx.send(&mut dice, &offer);
    let after = fx.player();

    assert!(reply_text(&replies).contains("1000"), "rejection names the price");
    assert_eq!(after.money, before.money, "no money moved");
    assert!(after.money >= 0, "money can never go negative");
    assert!(!after.has_item(Item::Magnet));
    assert_eq!(
        after.npcs, before.npcs,
        "stock untouched by the failed purchase"
    );
}

#[test]
fn buying_drifts_the_stock_roll() {
    let fx = GameFixture::new();
    walk_to_shop(&fx);

    // Roll 11: bottle (baseline 20) sells for exactly 20.
    let mut dice = stock_dice(11);
    fx.send(&mut dice, &fx.talk("merchant"));
    fx.send(&mut dice, &fx.npc("merchant", "wanna_buy"));
    let offer = fill(
        &fx.npc("merchant", "buy_offer"),
        &[fx.catalog.object_name("bottle").unwrap(), "20"],
    );
    let replies = fx.send(&mut dice, &offer);
    let player = fx.player();
    assert_eq!(player.money, 80);
    assert!(player.has_item(Item::Bottle));

    // The bottle's roll dropped to 10, so the menu coming back with the
    // purchase already reprices the next bottle at floor(11*20/10) = 22.
    let next_offer = fill(
        &fx.npc("merchant", "buy_offer"),
        &[fx.catalog.object_name("bottle").unwrap(), "22"],
    );
    assert!(
        replies[0].menu.contains(&next_offer),
        "expected {:?} in {:?}",
        next_offer,
        replies[0].menu
    );
}

#[test]
fn leaving_the_stall_forces_a_fresh_roll_next_visit() {
    let fx = GameFixture::new();
    walk_to_shop(&fx);

    let mut dice = stock_dice(11);
    fx.send(&mut dice, &fx.talk("merchant"));
    let replies = fx.send(&mut dice, &fx.nothing());
    assert!(reply_text(&replies).contains(&fx.npc("merchant", "come_again")));
    let player = fx.player();
    assert_eq!(player.current_npc, None, "conversation over");

    // The next greeting rolls all eleven goods again, even though fewer
    // than fifty turns passed.
    let mut dice = stock_dice(9);
    fx.send(&mut dice, &fx.talk("merchant"));
    assert_eq!(dice.remaining(), 0, "a full stock roll was consumed");
}
