//! Errors for RON-backed settings: `config.ron` and data-defined biome files.

/// Failure to load, store or accept a planet configuration or biome definition.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read settings file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The file or its directory could not be written.
    #[error("cannot write settings file: {0}")]
    WriteError(#[source] std::io::Error),

    /// The text is not valid RON for the expected structure.
    #[error("malformed RON: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("cannot encode settings as RON: {0}")]
    SerializeError(#[source] ron::Error),

    /// A value is outside its valid domain (e.g. a non-positive planet radius).
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        reason: String,
    },
}
