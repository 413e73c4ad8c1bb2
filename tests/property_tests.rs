//! Property tests for indicator, signal and sizing invariants.
//!
//! Uses proptest to verify:
//! 1. RSI readiness and bounds for any price path
//! 2. Snapshots are one per bar and recompute identically
//! 3. Band classification never reports both directions
//! 4. Lot sizing stays a whole number of lots within the per-trade budget
//! 5. Selected strikes sit on the strike grid

mod common;

use common::bars_from_closes;
use proptest::prelude::*;
use swingsniper::domain::indicator::rsi::calculate_rsi;
use swingsniper::domain::indicator::{compute_snapshots, IndicatorConfig, Reading};
use swingsniper::domain::position::Side;
use swingsniper::domain::signal::{classify_band_crossing, Approach, Direction, evaluate_signal};
use swingsniper::domain::sizing::{lot_quantity, select_contract, OptionSide};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price_path(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-5.0..5.0_f64, 1..max_len).prop_map(|steps| {
        let mut price = 1000.0;
        steps
            .into_iter()
            .map(|s| {
                price = (price + s).max(1.0);
                price
            })
            .collect()
    })
}

fn arb_approach() -> impl Strategy<Value = Approach> {
    prop_oneof![Just(Approach::DownToLevel), Just(Approach::UpToLevel)]
}

// ── 1. RSI ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded_and_ready_after_period(
        prices in arb_price_path(120),
        period in 2usize..30,
    ) {
        let readings = calculate_rsi(&prices, period);
        prop_assert_eq!(readings.len(), prices.len());

        for (i, reading) in readings.iter().enumerate() {
            if i < period {
                prop_assert_eq!(*reading, Reading::NotReady);
            } else {
                let value = reading.value();
                prop_assert!(value.is_some(), "bar {} should be ready", i);
                let v = value.unwrap_or(f64::NAN);
                prop_assert!((0.0..=100.0).contains(&v), "rsi {} out of range", v);
            }
        }
    }

    #[test]
    fn rsi_without_losses_is_degenerate_hundred(
        steps in prop::collection::vec(0.0..3.0_f64, 25..60),
    ) {
        let mut price = 100.0;
        let prices: Vec<f64> = steps.iter().map(|s| { price += s; price }).collect();
        let readings = calculate_rsi(&prices, 21);
        for reading in &readings[21..] {
            prop_assert_eq!(*reading, Reading::Degenerate(100.0));
        }
    }
}

// ── 2. Snapshots ─────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn snapshots_are_one_per_bar_and_deterministic(prices in arb_price_path(260)) {
        let bars = bars_from_closes(&prices);
        let config = IndicatorConfig::default();
        let first = compute_snapshots(&bars, &config);
        let second = compute_snapshots(&bars, &config);

        prop_assert_eq!(first.len(), bars.len());
        prop_assert_eq!(&first, &second);
    }

    #[test]
    fn signal_direction_matches_full_score(prices in arb_price_path(260)) {
        let bars = bars_from_closes(&prices);
        let snaps = compute_snapshots(&bars, &IndicatorConfig::default());
        if let [.., previous, current] = snaps.as_slice() {
            let signal = evaluate_signal(current, previous);
            if signal.direction != Direction::Neutral {
                prop_assert_eq!(signal.confluence_score, 4);
            }
            prop_assert!(signal.confluence_score <= 4);
        }
    }
}

// ── 3. Band classification ───────────────────────────────────────────

proptest! {
    #[test]
    fn band_signal_is_never_both_directions(
        prev in -10.0..10.0_f64,
        curr in -10.0..10.0_f64,
        level in -10.0..10.0_f64,
        approach in arb_approach(),
    ) {
        let signal = classify_band_crossing(prev, curr, level, approach);
        prop_assert!(!(signal.is_bullish() && signal.is_bearish()));
    }

    #[test]
    fn staying_on_one_side_is_never_bearish_when_above(
        prev in 1.0..10.0_f64,
        curr in 1.0..10.0_f64,
        approach in arb_approach(),
    ) {
        let signal = classify_band_crossing(prev, curr, 0.0, approach);
        prop_assert!(!signal.is_bearish());
    }
}

// ── 4. Sizing ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn quantity_is_whole_lots_within_budget(
        capital in 0.0..1_000_000.0_f64,
        max_trades in 1u32..10,
        premium in 0.5..500.0_f64,
        lot_size in 1u64..200,
    ) {
        let quantity = lot_quantity(capital, max_trades, premium, lot_size);
        prop_assert_eq!(quantity % lot_size, 0);

        let per_trade = capital / max_trades as f64;
        prop_assert!(quantity as f64 * premium <= per_trade + 1e-6);
        // One more lot would not fit.
        prop_assert!((quantity + lot_size) as f64 * premium > per_trade - 1e-6);
    }
}

// ── 5. Contract selection ────────────────────────────────────────────

proptest! {
    #[test]
    fn strikes_sit_on_the_grid(
        price in 100.0..60_000.0_f64,
        steps in 1u32..10,
        long in any::<bool>(),
    ) {
        let increment = 50.0;
        let otm = steps as f64 * increment;
        let side = if long { Side::Long } else { Side::Short };
        let contract = select_contract("NIFTY", price, side, increment, otm);

        prop_assert!((contract.strike / increment - (contract.strike / increment).round()).abs() < 1e-9);
        match side {
            Side::Long => {
                prop_assert_eq!(contract.side, OptionSide::Call);
                prop_assert!(contract.strike > price);
            }
            Side::Short => {
                prop_assert_eq!(contract.side, OptionSide::Put);
                prop_assert!(contract.strike < price);
            }
        }
    }
}
