//! Domain error types.

/// Top-level error type for sievetrader.
#[derive(Debug, thiserror::Error)]
pub enum SievetraderError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("screen not found: id {id}")]
    ScreenNotFound { id: i64 },

    #[error("invalid screen {name}: {reason}")]
    ScreenInvalid { name: String, reason: String },

    #[error("screen {name} has no capital pool")]
    MissingCapitalPool { name: String },

    #[error("no candidate data for screen {screen} on {date}")]
    NoCandidates {
        screen: String,
        date: chrono::NaiveDate,
    },

    #[error("notification failed: {reason}")]
    Notify { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SievetraderError> for std::process::ExitCode {
    fn from(err: &SievetraderError) -> Self {
        let code: u8 = match err {
            SievetraderError::Io(_) | SievetraderError::Notify { .. } => 1,
            SievetraderError::ConfigParse { .. }
            | SievetraderError::ConfigMissing { .. }
            | SievetraderError::ConfigInvalid { .. } => 2,
            SievetraderError::Database { .. } | SievetraderError::DatabaseQuery { .. } => 3,
            SievetraderError::ScreenNotFound { .. }
            | SievetraderError::ScreenInvalid { .. }
            | SievetraderError::MissingCapitalPool { .. } => 4,
            SievetraderError::NoCandidates { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
