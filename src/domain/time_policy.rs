//! Friday time-based exit policy.
//!
//! Weekly options lose time value fastest into the weekend, so Friday
//! afternoons carry three thresholds in exchange-local time:
//!
//! - `entry_cutoff`: no new positions at or after this time
//! - `warning_start`: open positions get a countdown until `forced_exit`
//! - `forced_exit`: every open position must be closed
//!
//! Every other weekday is unrestricted. Outside the exchange session
//! (weekends, or before `market_open` / from `market_close` on a weekday)
//! nothing trades at all. The policy depends only on the clock.

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Offset, TimeZone, Utc, Weekday};

#[derive(Debug, Clone, PartialEq)]
pub struct TimePolicy {
    pub entry_cutoff: NaiveTime,
    pub warning_start: NaiveTime,
    pub forced_exit: NaiveTime,
    /// Weekday session bounds, `[market_open, market_close)`.
    pub market_open: NaiveTime,
    pub market_close: NaiveTime,
    /// Exchange offset from UTC.
    pub offset: FixedOffset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryPermission {
    Allowed,
    Blocked { reason: String },
}

impl EntryPermission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, EntryPermission::Allowed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FridayWarning {
    pub minutes_remaining: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimePolicyDecision {
    /// False on weekends and outside the weekday session.
    pub session_open: bool,
    pub entry: EntryPermission,
    pub forced_exit: bool,
    pub warning: Option<FridayWarning>,
}

impl TimePolicyDecision {
    pub fn unrestricted() -> Self {
        TimePolicyDecision {
            session_open: true,
            entry: EntryPermission::Allowed,
            forced_exit: false,
            warning: None,
        }
    }

    pub fn market_closed(reason: String) -> Self {
        TimePolicyDecision {
            session_open: false,
            entry: EntryPermission::Blocked { reason },
            forced_exit: false,
            warning: None,
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

impl Default for TimePolicy {
    /// 14:30 / 14:50 / 15:20 at UTC+05:30, session 09:15 to 15:30.
    fn default() -> Self {
        TimePolicy {
            entry_cutoff: hm(14, 30),
            warning_start: hm(14, 50),
            forced_exit: hm(15, 20),
            market_open: hm(9, 15),
            market_close: hm(15, 30),
            offset: FixedOffset::east_opt(330 * 60).unwrap_or(Utc.fix()),
        }
    }
}

impl TimePolicy {
    pub fn evaluate<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> TimePolicyDecision {
        let local = now.with_timezone(&self.offset);
        let time = local.time();

        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return TimePolicyDecision::market_closed(format!(
                "market closed on {}",
                local.weekday()
            ));
        }
        if time < self.market_open || time >= self.market_close {
            return TimePolicyDecision::market_closed(format!(
                "market closed, session is {} to {}",
                self.market_open.format("%H:%M"),
                self.market_close.format("%H:%M")
            ));
        }
        if local.weekday() != Weekday::Fri {
            return TimePolicyDecision::unrestricted();
        }

        let entry = if time >= self.entry_cutoff {
            EntryPermission::Blocked {
                reason: format!(
                    "Friday entry cutoff {} reached, no new positions before the weekend",
                    self.entry_cutoff.format("%H:%M")
                ),
            }
        } else {
            EntryPermission::Allowed
        };

        let forced_exit = time >= self.forced_exit;

        let warning = if !forced_exit && time >= self.warning_start {
            let seconds = (self.forced_exit - time).num_seconds();
            let minutes_remaining = (seconds + 59) / 60;
            Some(FridayWarning {
                minutes_remaining,
                message: format!(
                    "{} min until Friday forced exit at {}",
                    minutes_remaining,
                    self.forced_exit.format("%H:%M")
                ),
            })
        } else {
            None
        };

        TimePolicyDecision {
            session_open: true,
            entry,
            forced_exit,
            warning,
        }
    }
}
