//! Configuration loading and validation.
//!
//! Reads every section through `ConfigPort`, validates it and builds the
//! typed `EngineConfig`. Any problem is fatal at startup.

use crate::domain::config::{EngineConfig, InstrumentConfig, RiskBudget, SessionConfig};
use crate::domain::error::SniperError;
use crate::domain::indicator::IndicatorConfig;
use crate::domain::time_policy::TimePolicy;
use crate::ports::config_port::ConfigPort;
use chrono::{FixedOffset, NaiveTime};
use std::collections::HashSet;

const MAX_OFFSET_MINUTES: i64 = 14 * 60;

pub fn load_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, SniperError> {
    let indicators = load_indicators(config)?;
    let session = load_session(config, &indicators)?;
    let risk = load_risk(config)?;
    let time_policy = load_time_policy(config, session.offset)?;
    let instruments = load_instruments(config)?;

    Ok(EngineConfig {
        session,
        risk,
        time_policy,
        indicators,
        instruments,
    })
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: Option<f64>,
) -> Result<f64, SniperError> {
    match config.get_string(section, key) {
        None => default.ok_or_else(|| SniperError::missing(section, key)),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| SniperError::invalid(section, key, format!("'{}' is not a number", raw))),
    }
}

fn read_i64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: Option<i64>,
) -> Result<i64, SniperError> {
    match config.get_string(section, key) {
        None => default.ok_or_else(|| SniperError::missing(section, key)),
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
            SniperError::invalid(section, key, format!("'{}' is not an integer", raw))
        }),
    }
}

fn read_window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
    minimum: usize,
) -> Result<usize, SniperError> {
    let value = read_i64(config, section, key, Some(default as i64))?;
    if value < minimum as i64 {
        return Err(SniperError::invalid(
            section,
            key,
            format!("{} must be at least {}", key, minimum),
        ));
    }
    Ok(value as usize)
}

fn read_time(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: NaiveTime,
) -> Result<NaiveTime, SniperError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
            SniperError::invalid(section, key, format!("invalid {} format, expected HH:MM", key))
        }),
    }
}

fn load_indicators(config: &dyn ConfigPort) -> Result<IndicatorConfig, SniperError> {
    let d = IndicatorConfig::default();
    let s = "indicators";
    let indicators = IndicatorConfig {
        ma_fast: read_window(config, s, "ma_fast", d.ma_fast, 1)?,
        ma_short: read_window(config, s, "ma_short", d.ma_short, 1)?,
        ma_mid: read_window(config, s, "ma_mid", d.ma_mid, 1)?,
        ma_long: read_window(config, s, "ma_long", d.ma_long, 1)?,
        ma_trend: read_window(config, s, "ma_trend", d.ma_trend, 1)?,
        rsi_period: read_window(config, s, "rsi_period", d.rsi_period, 2)?,
        rsi_ma_fast: read_window(config, s, "rsi_ma_fast", d.rsi_ma_fast, 1)?,
        rsi_ma_mid: read_window(config, s, "rsi_ma_mid", d.rsi_ma_mid, 1)?,
        rsi_ma_slow: read_window(config, s, "rsi_ma_slow", d.rsi_ma_slow, 1)?,
        lr_window: read_window(config, s, "lr_window", d.lr_window, 2)?,
    };

    let ma_ladder = [
        ("ma_short", indicators.ma_fast, indicators.ma_short),
        ("ma_mid", indicators.ma_short, indicators.ma_mid),
        ("ma_long", indicators.ma_mid, indicators.ma_long),
        ("ma_trend", indicators.ma_long, indicators.ma_trend),
        ("rsi_ma_mid", indicators.rsi_ma_fast, indicators.rsi_ma_mid),
        ("rsi_ma_slow", indicators.rsi_ma_mid, indicators.rsi_ma_slow),
    ];
    for (key, below, value) in ma_ladder {
        if value <= below {
            return Err(SniperError::invalid(
                s,
                key,
                format!("{} ({}) must be longer than the window below it ({})", key, value, below),
            ));
        }
    }

    Ok(indicators)
}

fn load_session(
    config: &dyn ConfigPort,
    indicators: &IndicatorConfig,
) -> Result<SessionConfig, SniperError> {
    let s = "session";

    let offset_minutes = read_i64(config, s, "utc_offset_minutes", Some(330))?;
    if offset_minutes.abs() > MAX_OFFSET_MINUTES {
        return Err(SniperError::invalid(
            s,
            "utc_offset_minutes",
            "utc_offset_minutes must be within +/-14 hours",
        ));
    }
    let offset = FixedOffset::east_opt((offset_minutes * 60) as i32).ok_or_else(|| {
        SniperError::invalid(s, "utc_offset_minutes", "utc_offset_minutes out of range")
    })?;

    let minimum = indicators.warmup_bars() + 1;
    let lookback = read_i64(config, s, "lookback", Some(300_i64.max(minimum as i64)))?;
    if lookback < minimum as i64 {
        return Err(SniperError::invalid(
            s,
            "lookback",
            format!("lookback must cover the indicator warmup of {} bars", minimum),
        ));
    }

    let tick_interval_secs = read_i64(config, s, "tick_interval_secs", Some(1800))?;
    if tick_interval_secs < 1 {
        return Err(SniperError::invalid(
            s,
            "tick_interval_secs",
            "tick_interval_secs must be positive",
        ));
    }

    Ok(SessionConfig {
        offset,
        lookback: lookback as usize,
        tick_interval_secs: tick_interval_secs as u64,
    })
}

fn load_risk(config: &dyn ConfigPort) -> Result<RiskBudget, SniperError> {
    let s = "risk";

    let capital = read_f64(config, s, "capital", None)?;
    if capital <= 0.0 {
        return Err(SniperError::invalid(s, "capital", "capital must be positive"));
    }

    let max_trades = read_i64(config, s, "max_concurrent_trades", Some(3))?;
    if max_trades < 1 || max_trades > u32::MAX as i64 {
        return Err(SniperError::invalid(
            s,
            "max_concurrent_trades",
            "max_concurrent_trades must be at least 1",
        ));
    }

    let stop_fraction = read_f64(config, s, "stop_loss", Some(0.05))?;
    if stop_fraction <= 0.0 || stop_fraction >= 1.0 {
        return Err(SniperError::invalid(
            s,
            "stop_loss",
            "stop_loss must be between 0 and 1",
        ));
    }

    let target_fraction = read_f64(config, s, "profit_target", Some(0.0))?;
    if target_fraction < 0.0 {
        return Err(SniperError::invalid(
            s,
            "profit_target",
            "profit_target must be non-negative",
        ));
    }

    Ok(RiskBudget {
        capital,
        max_concurrent_trades: max_trades as u32,
        stop_fraction,
        target_fraction,
        reversal_exit: config.get_bool(s, "reversal_exit", true),
    })
}

fn load_time_policy(config: &dyn ConfigPort, offset: FixedOffset) -> Result<TimePolicy, SniperError> {
    let d = TimePolicy::default();

    let market_open = read_time(config, "session", "market_open", d.market_open)?;
    let market_close = read_time(config, "session", "market_close", d.market_close)?;
    if market_close <= market_open {
        return Err(SniperError::invalid(
            "session",
            "market_close",
            "market_close must be after market_open",
        ));
    }

    let s = "friday";
    let entry_cutoff = read_time(config, s, "entry_cutoff", d.entry_cutoff)?;
    let warning_start = read_time(config, s, "warning_start", d.warning_start)?;
    let forced_exit = read_time(config, s, "forced_exit", d.forced_exit)?;

    if warning_start < entry_cutoff {
        return Err(SniperError::invalid(
            s,
            "warning_start",
            "warning_start must not be before entry_cutoff",
        ));
    }
    if forced_exit < warning_start {
        return Err(SniperError::invalid(
            s,
            "forced_exit",
            "forced_exit must not be before warning_start",
        ));
    }
    if forced_exit >= market_close {
        return Err(SniperError::invalid(
            s,
            "forced_exit",
            format!(
                "forced_exit must be before market_close ({})",
                market_close.format("%H:%M")
            ),
        ));
    }

    Ok(TimePolicy {
        entry_cutoff,
        warning_start,
        forced_exit,
        market_open,
        market_close,
        offset,
    })
}

fn load_instruments(config: &dyn ConfigPort) -> Result<Vec<InstrumentConfig>, SniperError> {
    let symbols = config.get_list("session", "instruments");
    if symbols.is_empty() {
        return Err(SniperError::missing("session", "instruments"));
    }

    let mut seen = HashSet::new();
    let mut instruments = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if !seen.insert(symbol.to_uppercase()) {
            return Err(SniperError::invalid(
                "session",
                "instruments",
                format!("duplicate instrument {}", symbol),
            ));
        }
        instruments.push(load_instrument(config, symbol)?);
    }
    Ok(instruments)
}

fn load_instrument(config: &dyn ConfigPort, symbol: String) -> Result<InstrumentConfig, SniperError> {
    let section = format!("instrument.{}", symbol);
    let s = section.as_str();

    let lot_size = read_i64(config, s, "lot_size", None)?;
    if lot_size < 1 {
        return Err(SniperError::invalid(s, "lot_size", "lot_size must be at least 1"));
    }

    let strike_increment = read_f64(config, s, "strike_increment", Some(50.0))?;
    if strike_increment <= 0.0 {
        return Err(SniperError::invalid(
            s,
            "strike_increment",
            "strike_increment must be positive",
        ));
    }

    let otm_offset = read_f64(config, s, "otm_offset", Some(200.0))?;
    if otm_offset < 0.0 {
        return Err(SniperError::invalid(
            s,
            "otm_offset",
            "otm_offset must be non-negative",
        ));
    }

    let premium = read_f64(config, s, "premium", Some(50.0))?;
    if premium <= 0.0 {
        return Err(SniperError::invalid(s, "premium", "premium must be positive"));
    }

    Ok(InstrumentConfig {
        symbol,
        lot_size: lot_size as u64,
        strike_increment,
        otm_offset,
        premium,
    })
}
