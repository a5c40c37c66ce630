//! Document serialization interface.
//!
//! The engine never formats documents itself. External crates (`enriched-*`) implement
//! [`DocumentCodec`] and hand it to
//! [`EnrichedEditor::value`](crate::EnrichedEditor::value),
//! [`EnrichedEditor::set_value`](crate::EnrichedEditor::set_value) or
//! [`EnrichedEditor::observe_value`](crate::EnrichedEditor::observe_value).

use tracing::error;

use crate::document::Document;

/// Converts a [`Document`] to and from an external representation.
pub trait DocumentCodec {
    /// The error type returned by [`DocumentCodec::decode`].
    type Error: std::error::Error;

    /// Serialize `doc`.
    fn encode(&self, doc: &Document) -> String;

    /// Build a document from `input`.
    ///
    /// Implementations should return an error rather than a partial document when `input` is
    /// malformed; callers decide how to recover.
    fn decode(&self, input: &str) -> Result<Document, Self::Error>;
}

/// Codec storing only the text, without any annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlainTextCodec;

impl DocumentCodec for PlainTextCodec {
    type Error = std::convert::Infallible;

    fn encode(&self, doc: &Document) -> String {
        doc.text()
            .chars()
            .filter(|c| *c != crate::range::ZWS)
            .collect()
    }

    fn decode(&self, input: &str) -> Result<Document, Self::Error> {
        Ok(Document::from_text(input))
    }
}

/// Decode `input`, falling back to an unstyled document holding `input` verbatim.
pub fn decode_or_plain<C: DocumentCodec + ?Sized>(codec: &C, input: &str) -> Document {
    match codec.decode(input) {
        Ok(doc) => doc,
        Err(err) => {
            error!(error = %err, "failed to decode value, loading it as plain text");
            Document::from_text(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug)]
    struct Rejected;

    impl fmt::Display for Rejected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("rejected")
        }
    }

    impl std::error::Error for Rejected {}

    struct Failing;

    impl DocumentCodec for Failing {
        type Error = Rejected;

        fn encode(&self, doc: &Document) -> String {
            doc.text()
        }

        fn decode(&self, _input: &str) -> Result<Document, Self::Error> {
            Err(Rejected)
        }
    }

    #[test]
    fn test_decode_error_falls_back_to_plain_text() {
        let doc = decode_or_plain(&Failing, "<p>broken");
        assert_eq!(doc.text(), "<p>broken");
        assert!(doc.annotations().is_empty());
    }

    #[test]
    fn test_plain_text_codec_drops_markers() {
        let doc = Document::from_text("\u{200B}item");
        assert_eq!(PlainTextCodec.encode(&doc), "item");
    }
}
