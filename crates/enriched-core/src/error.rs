//! Error types.

use thiserror::Error;

use crate::styles::StyleKind;

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document is malformed or misses a required key.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// A color string is not `#rgb`, `#rrggbb` or `#rrggbbaa`.
    #[error("invalid color `{0}`")]
    InvalidColor(String),
    /// A metric is negative or not finite.
    #[error("invalid value for `{field}`: {value}")]
    InvalidValue {
        /// Dotted key of the offending field.
        field: String,
        /// The rejected value.
        value: f32,
    },
    /// A link or mention pattern does not compile.
    #[error("invalid regex `{pattern}`: {source}")]
    InvalidRegex {
        /// Pattern source.
        pattern: String,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },
    /// A mention indicator is the empty string.
    #[error("mention indicators must not be empty")]
    EmptyMentionIndicator,
}

/// A command could not be executed.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The range lies outside the document or is reversed.
    #[error("invalid range: {start}..{end}")]
    InvalidRange {
        /// Start offset.
        start: usize,
        /// End offset.
        end: usize,
    },
    /// The style cannot be applied through this command.
    #[error("style `{0}` is not supported by this command")]
    UnsupportedStyle(StyleKind),
    /// A configuration update was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
