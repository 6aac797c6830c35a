//! Domain error types.

/// Top-level error type for rudder.
#[derive(Debug, thiserror::Error)]
pub enum RudderError {
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

    #[error("feed error: {reason}")]
    Feed { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RudderError> for std::process::ExitCode {
    fn from(err: &RudderError) -> Self {
        let code: u8 = match err {
            RudderError::Io(_) => 1,
            RudderError::ConfigParse { .. }
            | RudderError::ConfigMissing { .. }
            | RudderError::ConfigInvalid { .. } => 2,
            RudderError::Feed { .. } | RudderError::NoData { .. } => 3,
        };
        std::process::ExitCode::from(code)
    }
}
