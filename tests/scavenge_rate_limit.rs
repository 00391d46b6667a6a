// Junkyard digging: at most one attempt per ten turns, and the cooldown
// counts turns, not attempts.

mod common;

use blackoutbot::game::dice::ScriptedDice;
use blackoutbot::game::market::SCAVENGE_BASELINE;
use blackoutbot::game::types::{Item, LocationKey, LocationState};
use common::{reply_text, GameFixture};

/// One full dig's dice: a roll per candidate plus the budget roll.
fn dig_dice(candidate_sum: u8, budget_sum: u8) -> ScriptedDice {
    let mut sums = vec![candidate_sum; SCAVENGE_BASELINE.len()];
    sums.push(budget_sum);
    ScriptedDice::from_3d6_sums(sums)
}

fn walk_to_junkyard(fx: &GameFixture) {
    let mut dice = ScriptedDice::new([]);
    fx.onboard(&mut dice);
    fx.send(&mut dice, &fx.go("street"));
    fx.send(&mut dice, &fx.go("junkyard"));
}

#[test]
fn second_attempt_within_ten_turns_is_blocked() {
    let fx = GameFixture::new();
    walk_to_junkyard(&fx);
    let dig = fx.loc("junkyard", "try_scavenge");

    // Candidates all turn up at roll 11; the budget roll of 11 covers 300,
    // and the first affordable candidate in order is the copper wire.
    let mut dice = dig_dice(11, 11);
    let replies = fx.send(&mut dice, &dig);
    assert!(reply_text(&replies)
        .contains(fx.catalog.object_name("copper_wire").unwrap()));
    let player = fx.player();
    assert!(player.has_item(Item::CopperWire));
    let dug_turn = player.turn;

    // Straight away again: blocked, and no dice are consumed.
    let mut dice = ScriptedDice::new([]);
    let replies = fx.send(&mut dice, &dig);
    assert!(reply_text(&replies).contains(&fx.loc("junkyard", "already_searched")));
    assert!(!fx.player().has_item(Item::Magnet));

    // Burn turns until ten have passed since the dig, then dig again.
    let mut dice = ScriptedDice::new([]);
    while fx.player().turn < dug_turn + 9 {
        fx.send(&mut dice, "pace around the junkyard");
    }
    let mut dice = dig_dice(11, 11);
    let replies = fx.send(&mut dice, &dig);
    assert!(
        reply_text(&replies).contains(fx.catalog.object_name("copper_wire").unwrap()),
        "eligible again once ten turns have passed"
    );
}

#[test]
fn empty_handed_digs_still_start_the_cooldown() {
    let fx = GameFixture::new();
    walk_to_junkyard(&fx);
    let dig = fx.loc("junkyard", "try_scavenge");

    // Nothing turns up and the budget roll is scarce anyway.
    let mut dice = dig_dice(4, 4);
    let replies = fx.send(&mut dice, &dig);
    assert!(reply_text(&replies).contains(&fx.loc("junkyard", "nothing_found")));

    let player = fx.player();
    match player.locations.get(&LocationKey::Junkyard) {
        Some(LocationState::Junkyard(yard)) => {
            assert_eq!(yard.last_scavenge_turn, Some(player.turn));
        }
        other => panic!("unexpected junkyard state: {:?}", other),
    }

    let mut dice = ScriptedDice::new([]);
    let replies = fx.send(&mut dice, &dig);
    assert!(reply_text(&replies).contains(&fx.loc("junkyard", "already_searched")));
}
