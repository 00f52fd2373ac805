//! Domain error types.

/// Top-level error type for scoutbt.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("data format error on line {line}: {reason}")]
    DataFormat { line: u64, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScoutError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        ScoutError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ScoutError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&ScoutError> for std::process::ExitCode {
    fn from(err: &ScoutError) -> Self {
        let code: u8 = match err {
            ScoutError::Io(_) => 1,
            ScoutError::ConfigParse { .. } | ScoutError::ConfigInvalid { .. } => 2,
            ScoutError::DataSource { .. } => 3,
            ScoutError::DataFormat { .. } => 4,
            ScoutError::InvalidInput { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
