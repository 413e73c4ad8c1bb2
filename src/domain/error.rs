//! Domain error types.

/// Top-level error type for swingsniper.
#[derive(Debug, thiserror::Error)]
pub enum SniperError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("bar feed failed for {symbol}: {reason}")]
    Feed { symbol: String, reason: String },

    #[error("order submission failed for {symbol}: {reason}")]
    Order { symbol: String, reason: String },

    #[error("notification failed: {reason}")]
    Notification { reason: String },

    #[error("position already open for {symbol}")]
    PositionAlreadyOpen { symbol: String },

    #[error("order journal {path} line {line}: {reason}")]
    Journal {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("unknown symbol {symbol}")]
    UnknownSymbol { symbol: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SniperError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SniperError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        SniperError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl SniperError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            SniperError::Io(_) | SniperError::Csv(_) | SniperError::Journal { .. } => 1,
            SniperError::ConfigParse { .. }
            | SniperError::ConfigMissing { .. }
            | SniperError::ConfigInvalid { .. }
            | SniperError::UnknownSymbol { .. } => 2,
            SniperError::InsufficientData { .. } | SniperError::Feed { .. } => 3,
            SniperError::Order { .. }
            | SniperError::PositionAlreadyOpen { .. }
            | SniperError::Notification { .. } => 4,
        }
    }
}

impl From<&SniperError> for std::process::ExitCode {
    fn from(err: &SniperError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
