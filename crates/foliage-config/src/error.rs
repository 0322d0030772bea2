//! Configuration error types.

/// Errors raised while loading, saving, or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// The config file or its directory could not be written.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// The file is not valid RON for [`Config`](crate::Config).
    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Serializing to RON failed.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),

    /// A setting parsed but is out of range.
    #[error("invalid config value `{field}`: {reason}")]
    InvalidValue {
        /// Dotted path of the offending setting, e.g. `view.z_far`.
        field: &'static str,
        /// What the setting must satisfy.
        reason: String,
    },
}
