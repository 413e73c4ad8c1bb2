//! Confluence signal evaluation.
//!
//! A signal is derived from the last two indicator snapshots of an instrument.
//!
//! # Band crossings
//!
//! `classify_band_crossing` compares the previous and current close against a
//! reference level. The approach says which side the price is expected to come
//! from: `DownToLevel` treats the level as support, `UpToLevel` as resistance.
//!
//! # Confluence
//!
//! - Bullish: `close > ma9 > ma20 > ma50 > ma200`, `rsi > rsi_ma26 > rsi_ma14 > rsi_ma9`,
//!   positive PVI, positive LR slope, and a bullish crossing on the CPR or MA band
//! - Bearish: the mirror image
//! - Anything else is Neutral
//!
//! Any operand that is not ready makes its gate false.

use crate::domain::indicator::IndicatorSnapshot;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approach {
    /// Price comes down onto the level, which acts as support.
    DownToLevel,
    /// Price comes up into the level, which acts as resistance.
    UpToLevel,
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Approach::DownToLevel => write!(f, "down_to_cpr"),
            Approach::UpToLevel => write!(f, "up_to_cpr"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandSignal {
    NoSignal,
    TestingSupport,
    TestingResistance,
    BullishContinuation,
    BullishBreakout,
    BearishContinuation,
    BearishBreakdown,
}

impl BandSignal {
    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            BandSignal::BullishContinuation | BandSignal::BullishBreakout
        )
    }

    pub fn is_bearish(&self) -> bool {
        matches!(
            self,
            BandSignal::BearishContinuation | BandSignal::BearishBreakdown
        )
    }
}

impl fmt::Display for BandSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BandSignal::NoSignal => "no_signal",
            BandSignal::TestingSupport => "testing_support",
            BandSignal::TestingResistance => "testing_resistance",
            BandSignal::BullishContinuation => "bullish_continuation",
            BandSignal::BullishBreakout => "bullish_breakout",
            BandSignal::BearishContinuation => "bearish_continuation",
            BandSignal::BearishBreakdown => "bearish_breakdown",
        };
        write!(f, "{}", label)
    }
}

/// Classify how the close moved relative to `level` between two bars.
pub fn classify_band_crossing(prev: f64, curr: f64, level: f64, approach: Approach) -> BandSignal {
    if !prev.is_finite() || !curr.is_finite() || !level.is_finite() {
        return BandSignal::NoSignal;
    }

    let was_above = prev > level;
    let is_above = curr > level;

    match (approach, was_above, is_above) {
        (Approach::DownToLevel, true, true) => BandSignal::TestingSupport,
        (Approach::DownToLevel, true, false) => BandSignal::BearishBreakdown,
        (Approach::DownToLevel, false, true) => BandSignal::BullishContinuation,
        (Approach::DownToLevel, false, false) => BandSignal::NoSignal,
        (Approach::UpToLevel, true, true) => BandSignal::NoSignal,
        (Approach::UpToLevel, true, false) => BandSignal::BearishContinuation,
        (Approach::UpToLevel, false, true) => BandSignal::BullishBreakout,
        (Approach::UpToLevel, false, false) => BandSignal::TestingResistance,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
            Direction::Neutral => write!(f, "neutral"),
        }
    }
}

/// Outcome of evaluating one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub direction: Direction,
    /// Primary gates (MA stack, RSI stack, PVI, slope) that held, 0 to 4.
    pub confluence_score: u8,
    pub rationale: Vec<String>,
    pub cpr_signal: BandSignal,
    pub ma_signal: BandSignal,
}

impl Signal {
    pub fn neutral() -> Self {
        Signal {
            direction: Direction::Neutral,
            confluence_score: 0,
            rationale: Vec::new(),
            cpr_signal: BandSignal::NoSignal,
            ma_signal: BandSignal::NoSignal,
        }
    }
}

/// Crossing of the previous session's central pivot range.
///
/// A previous close above the top tests the top from above, anything else
/// tests the bottom from below.
pub fn cpr_band_signal(current: &IndicatorSnapshot, previous: &IndicatorSnapshot) -> BandSignal {
    let (Some(top), Some(bottom)) = (current.cpr_top.value(), current.cpr_bottom.value()) else {
        return BandSignal::NoSignal;
    };

    if previous.close > top {
        classify_band_crossing(previous.close, current.close, top, Approach::DownToLevel)
    } else {
        classify_band_crossing(previous.close, current.close, bottom, Approach::UpToLevel)
    }
}

/// Crossing of the 20-bar average, treated as support in an uptrend
/// (ma20 above ma50) and as resistance otherwise.
pub fn ma_band_signal(current: &IndicatorSnapshot, previous: &IndicatorSnapshot) -> BandSignal {
    let (Some(ma20), Some(ma50)) = (current.ma20.value(), current.ma50.value()) else {
        return BandSignal::NoSignal;
    };

    let approach = if ma20 > ma50 {
        Approach::DownToLevel
    } else {
        Approach::UpToLevel
    };
    classify_band_crossing(previous.close, current.close, ma20, approach)
}

/// True when every value is present and each is strictly greater than the next.
fn strictly_descending(values: &[Option<f64>]) -> bool {
    values.iter().all(Option::is_some)
        && values.windows(2).all(|w| match (w[0], w[1]) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        })
}

fn strictly_ascending(values: &[Option<f64>]) -> bool {
    values.iter().all(Option::is_some)
        && values.windows(2).all(|w| match (w[0], w[1]) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        })
}

struct Gates {
    ma_stack: bool,
    rsi_stack: bool,
    pvi: bool,
    slope: bool,
    cpr_band: bool,
    ma_band: bool,
}

impl Gates {
    fn score(&self) -> u8 {
        [self.ma_stack, self.rsi_stack, self.pvi, self.slope]
            .iter()
            .filter(|&&g| g)
            .count() as u8
    }

    fn all_hold(&self) -> bool {
        self.ma_stack && self.rsi_stack && self.pvi && self.slope && (self.cpr_band || self.ma_band)
    }

    fn rationale(&self, label: &str, cpr: BandSignal, ma: BandSignal) -> Vec<String> {
        let mut out = Vec::new();
        if self.ma_stack {
            out.push(format!("{} moving-average stack", label));
        }
        if self.rsi_stack {
            out.push(format!("{} RSI stack", label));
        }
        if self.pvi {
            out.push(format!("{} PVI", label));
        }
        if self.slope {
            out.push(format!("{} LR slope", label));
        }
        if self.cpr_band {
            out.push(format!("CPR band {}", cpr));
        }
        if self.ma_band {
            out.push(format!("MA band {}", ma));
        }
        out
    }
}

/// Evaluate the confluence signal for `current`, using `previous` for band crossings.
pub fn evaluate_signal(current: &IndicatorSnapshot, previous: &IndicatorSnapshot) -> Signal {
    let cpr_signal = cpr_band_signal(current, previous);
    let ma_signal = ma_band_signal(current, previous);

    let ma_chain = [
        Some(current.close),
        current.ma9.value(),
        current.ma20.value(),
        current.ma50.value(),
        current.ma200.value(),
    ];
    let rsi_chain = [
        current.rsi.value(),
        current.rsi_ma26.value(),
        current.rsi_ma14.value(),
        current.rsi_ma9.value(),
    ];

    let bullish = Gates {
        ma_stack: strictly_descending(&ma_chain),
        rsi_stack: strictly_descending(&rsi_chain),
        pvi: current.pvi_positive == Some(true),
        slope: current.lr_slope_positive == Some(true),
        cpr_band: cpr_signal.is_bullish(),
        ma_band: ma_signal.is_bullish(),
    };
    let bearish = Gates {
        ma_stack: strictly_ascending(&ma_chain),
        rsi_stack: strictly_ascending(&rsi_chain),
        pvi: current.pvi_positive == Some(false),
        slope: current.lr_slope_positive == Some(false),
        cpr_band: cpr_signal.is_bearish(),
        ma_band: ma_signal.is_bearish(),
    };

    let (direction, gates, label) = if bullish.all_hold() {
        (Direction::Bullish, &bullish, "bullish")
    } else if bearish.all_hold() {
        (Direction::Bearish, &bearish, "bearish")
    } else if bearish.score() > bullish.score() {
        (Direction::Neutral, &bearish, "bearish")
    } else {
        (Direction::Neutral, &bullish, "bullish")
    };

    Signal {
        direction,
        confluence_score: gates.score(),
        rationale: gates.rationale(label, cpr_signal, ma_signal),
        cpr_signal,
        ma_signal,
    }
}


#[cfg(test)]
mod tests {
    use super::test_snapshots::*;
    use super::*;
    use crate::domain::indicator::Reading;

    #[test]
    fn band_crossing_literals() {
        assert_eq!(
            classify_band_crossing(101.0, 89.0, 90.0, Approach::DownToLevel),
            BandSignal::BearishBreakdown
        );
        assert_eq!(
            classify_band_crossing(88.0, 92.0, 90.0, Approach::DownToLevel),
            BandSignal::BullishContinuation
        );
    }

    #[test]
    fn band_crossing_all_quadrants() {
        use Approach::*;
        use BandSignal::*;
        let cases = [
            (95.0, 96.0, DownToLevel, TestingSupport),
            (85.0, 86.0, DownToLevel, NoSignal),
            (95.0, 96.0, UpToLevel, NoSignal),
            (95.0, 85.0, UpToLevel, BearishContinuation),
            (85.0, 95.0, UpToLevel, BullishBreakout),
            (85.0, 86.0, UpToLevel, TestingResistance),
        ];
        for (prev, curr, approach, expected) in cases {
            assert_eq!(
                classify_band_crossing(prev, curr, 90.0, approach),
                expected,
                "{} -> {} {}",
                prev,
                curr,
                approach
            );
        }
    }

    #[test]
    fn staying_on_one_side_carries_no_direction() {
        for approach in [Approach::DownToLevel, Approach::UpToLevel] {
            for (prev, curr) in [(95.0, 96.0), (85.0, 86.0)] {
                let signal = classify_band_crossing(prev, curr, 90.0, approach);
                assert!(
                    !signal.is_bullish() && !signal.is_bearish(),
                    "{} -> {} {} gave {}",
                    prev,
                    curr,
                    approach,
                    signal
                );
            }
        }
    }

    #[test]
    fn close_equal_to_level_counts_as_at_or_below() {
        assert_eq!(
            classify_band_crossing(90.0, 91.0, 90.0, Approach::UpToLevel),
            BandSignal::BullishBreakout
        );
        assert_eq!(
            classify_band_crossing(91.0, 90.0, 90.0, Approach::DownToLevel),
            BandSignal::BearishBreakdown
        );
    }

    #[test]
    fn non_finite_inputs_give_no_signal() {
        assert_eq!(
            classify_band_crossing(f64::NAN, 92.0, 90.0, Approach::DownToLevel),
            BandSignal::NoSignal
        );
        assert_eq!(
            classify_band_crossing(88.0, 92.0, f64::INFINITY, Approach::UpToLevel),
            BandSignal::NoSignal
        );
    }

    #[test]
    fn labels() {
        assert_eq!(Approach::DownToLevel.to_string(), "down_to_cpr");
        assert_eq!(Approach::UpToLevel.to_string(), "up_to_cpr");
        assert_eq!(BandSignal::BearishBreakdown.to_string(), "bearish_breakdown");
        assert_eq!(Direction::Neutral.to_string(), "neutral");
    }

    #[test]
    fn full_bullish_confluence() {
        let current = bullish_snapshot();
        let previous = with_close(&current, 99.0);
        let signal = evaluate_signal(&current, &previous);

        assert_eq!(signal.direction, Direction::Bullish);
        assert_eq!(signal.confluence_score, 4);
        // Previous close 99 is below the CPR top, so the bottom (102) is tested from below.
        assert_eq!(signal.cpr_signal, BandSignal::BullishBreakout);
        // ma20 > ma50, 99 -> 110 across ma20 = 100.
        assert_eq!(signal.ma_signal, BandSignal::BullishContinuation);
        assert_eq!(
            signal.rationale,
            vec![
                "bullish moving-average stack",
                "bullish RSI stack",
                "bullish PVI",
                "bullish LR slope",
                "CPR band bullish_breakout",
                "MA band bullish_continuation",
            ]
        );
    }

    #[test]
    fn full_bearish_confluence() {
        let current = bearish_snapshot();
        let previous = with_close(&current, 101.0);
        let signal = evaluate_signal(&current, &previous);

        assert_eq!(signal.direction, Direction::Bearish);
        assert_eq!(signal.confluence_score, 4);
        assert_eq!(signal.cpr_signal, BandSignal::BearishBreakdown);
        assert_eq!(signal.ma_signal, BandSignal::BearishContinuation);
    }

    #[test]
    fn no_band_crossing_is_neutral() {
        let current = bullish_snapshot();
        // Already above both bands on the previous bar.
        let previous = with_close(&current, 108.0);
        let signal = evaluate_signal(&current, &previous);

        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.confluence_score, 4);
        assert_eq!(signal.cpr_signal, BandSignal::TestingSupport);
        assert_eq!(signal.ma_signal, BandSignal::TestingSupport);
    }

    #[test]
    fn one_band_is_enough() {
        let mut current = bullish_snapshot();
        current.cpr_top = Reading::NotReady;
        current.cpr_bottom = Reading::NotReady;
        let previous = with_close(&current, 99.0);
        let signal = evaluate_signal(&current, &previous);

        assert_eq!(signal.cpr_signal, BandSignal::NoSignal);
        assert_eq!(signal.direction, Direction::Bullish);
    }

    #[test]
    fn not_ready_operand_fails_its_gate() {
        let mut current = bullish_snapshot();
        current.ma200 = Reading::NotReady;
        let previous = with_close(&current, 99.0);
        let signal = evaluate_signal(&current, &previous);

        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.confluence_score, 3);
        assert!(!signal.rationale.iter().any(|r| r.contains("moving-average")));
    }

    #[test]
    fn unknown_pvi_is_neither_bullish_nor_bearish() {
        let mut current = bullish_snapshot();
        current.pvi = Reading::NotReady;
        current.pvi_positive = None;
        let previous = with_close(&current, 99.0);
        assert_eq!(
            evaluate_signal(&current, &previous).direction,
            Direction::Neutral
        );
    }

    #[test]
    fn degenerate_rsi_still_counts() {
        let mut current = bullish_snapshot();
        current.rsi = Reading::Degenerate(100.0);
        let previous = with_close(&current, 99.0);
        assert_eq!(
            evaluate_signal(&current, &previous).direction,
            Direction::Bullish
        );
    }

    #[test]
    fn neutral_score_takes_the_stronger_side() {
        let mut current = bearish_snapshot();
        current.pvi_positive = Some(true);
        current.lr_slope_positive = Some(true);
        let previous = with_close(&current, 101.0);
        let signal = evaluate_signal(&current, &previous);

        // Bearish holds MA and RSI stacks, bullish holds PVI and slope.
        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.confluence_score, 2);
    }

    #[test]
    fn neutral_signal_constructor() {
        let signal = Signal::neutral();
        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.confluence_score, 0);
        assert!(signal.rationale.is_empty());
    }
}
