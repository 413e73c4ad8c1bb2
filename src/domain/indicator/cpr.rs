//! Central Pivot Range from the previous session.
//!
//! For a session with high H, low L and close C:
//! pivot = (H + L + C) / 3, bc = (H + L) / 2, tc = 2 * pivot - bc.
//! The band for every bar of a session comes from the session before it,
//! so bars of the first session in the input have no band.

use crate::domain::bar::Bar;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CprBand {
    pub pivot: f64,
    pub top: f64,
    pub bottom: f64,
}

impl CprBand {
    pub fn from_session(high: f64, low: f64, close: f64) -> Self {
        let pivot = (high + low + close) / 3.0;
        let bc = (high + low) / 2.0;
        let tc = 2.0 * pivot - bc;
        CprBand {
            pivot,
            top: tc.max(bc),
            bottom: tc.min(bc),
        }
    }
}

struct SessionRange {
    date: NaiveDate,
    high: f64,
    low: f64,
    close: f64,
}

pub fn calculate_cpr(bars: &[Bar]) -> Vec<Option<CprBand>> {
    let mut out = Vec::with_capacity(bars.len());
    let mut current: Option<SessionRange> = None;
    let mut previous_band: Option<CprBand> = None;

    for bar in bars {
        let date = bar.session_date();
        match current.as_mut() {
            Some(session) if session.date == date => {
                session.high = session.high.max(bar.high);
                session.low = session.low.min(bar.low);
                session.close = bar.close;
            }
            _ => {
                if let Some(done) = current.take() {
                    previous_band = Some(CprBand::from_session(done.high, done.low, done.close));
                }
                current = Some(SessionRange {
                    date,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                });
            }
        }
        out.push(previous_band);
    }

    out
}
