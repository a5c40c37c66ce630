//! Error types.

use thiserror::Error;

/// HTML input could not be turned into a document.
#[derive(Debug, Error)]
pub enum HtmlError {
    /// The markup is not well-formed.
    #[error("malformed HTML at byte {position}: {source}")]
    Xml {
        /// Byte offset the reader stopped at.
        position: u64,
        /// Reader error.
        #[source]
        source: quick_xml::Error,
    },
    /// Text, a tag name or an attribute is not valid in the input encoding.
    #[error("undecodable input: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
    /// An attribute value could not be interpreted.
    #[error("invalid `{name}` attribute on <{tag}>: `{value}`")]
    InvalidAttribute {
        /// Element name.
        tag: String,
        /// Attribute name.
        name: String,
        /// Rejected value.
        value: String,
    },
}
