#![no_main]

use arbitrary::Arbitrary;
use crownfall::game::{Deck, Elixir, ElixirConfig, HAND_SIZE};
use libfuzzer_sys::fuzz_target;

/// One economy operation.
#[derive(Arbitrary, Debug)]
enum Op {
    /// Advance time and regenerate.
    Wait(u16),
    /// Try to spend elixir.
    Spend(u8),
    /// Play the card in a hand slot.
    Play(u8),
}

/// Structured input for economy fuzzing.
#[derive(Arbitrary, Debug)]
struct EconomyInput {
    /// Starting elixir.
    initial: u8,
    /// Elixir capacity.
    capacity: u8,
    /// Milliseconds per point.
    regen_interval_ms: u16,
    /// Deck size.
    deck_size: u8,
    /// Operations to run.
    ops: Vec<Op>,
}

fuzz_target!(|input: EconomyInput| {
    let config = ElixirConfig {
        initial: u32::from(input.initial),
        capacity: u32::from(input.capacity).max(1),
        regen_interval_ms: u64::from(input.regen_interval_ms).max(1),
    };
    let mut elixir = Elixir::new(&config, 0);

    let size = usize::from(input.deck_size).clamp(HAND_SIZE, 32);
    let cards: Vec<String> = (0..size).map(|i| format!("card-{i}")).collect();
    let mut deck = Deck::new(&cards);

    let mut now = 0u64;
    for op in input.ops.iter().take(1000) {
        match *op {
            Op::Wait(dt) => {
                now += u64::from(dt);
                let before = elixir.current();
                let gained = elixir.regenerate(now);
                assert_eq!(elixir.current(), before + gained);
            }
            Op::Spend(amount) => {
                let before = elixir.current();
                match elixir.spend(u32::from(amount)) {
                    Ok(()) => assert_eq!(elixir.current(), before - u32::from(amount)),
                    Err(_) => assert_eq!(elixir.current(), before, "failed spend changed elixir"),
                }
            }
            Op::Play(slot) => {
                let card = deck.hand()[usize::from(slot) % HAND_SIZE].clone();
                let next = deck.next_card().map(str::to_string);
                assert!(deck.play(&card).is_ok());
                assert_eq!(deck.hand().len(), HAND_SIZE);
                if let Some(next) = next {
                    assert!(deck.holds(&next));
                }
            }
        }

        assert!(elixir.current() <= elixir.capacity());
        assert!(elixir.last_regen_at() <= now);
        let progress = elixir.progress(now);
        assert!((0.0..1.0).contains(&progress));
    }

    // Every card is still somewhere
    let held = deck.hand().len() + deck.queue().count();
    assert_eq!(held, size);
});
