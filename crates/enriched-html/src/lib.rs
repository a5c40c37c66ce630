#![warn(missing_docs)]
//! HTML codec for `enriched-core` documents.
//!
//! The format is a small, fixed HTML dialect:
//!
//! - `<p>`, `<h1>`..`<h6>` for paragraphs and `<br>` for empty ones
//! - `<ul>`, `<ol>` and `<ul data-type="checkbox">` holding `<li>` / `<li checked>` items
//! - `<blockquote>` and `<codeblock>` wrapping runs of paragraphs
//! - `<b>`, `<i>`, `<u>`, `<s>`, `<code>`, `<a href>`, `<font color>`, `<img src width height/>`
//!   and `<mention text indicator ...>` inline
//!
//! The whole document is wrapped in `<html>`. Paragraph markers used by the editor are not
//! written; [`from_html`] puts them back.
//!
//! ```
//! use enriched_core::{EditorConfig, EnrichedEditor};
//! use enriched_html::HtmlCodec;
//!
//! let mut editor = EnrichedEditor::new(EditorConfig::default()).unwrap();
//! editor.set_value(&HtmlCodec, "<html>\n<h1>Notes</h1>\n<p><b>bold</b> text</p>\n</html>");
//! assert_eq!(editor.text(), "\u{200B}Notes\nbold text");
//! assert_eq!(
//!     editor.value(&HtmlCodec),
//!     "<html>\n<h1>Notes</h1>\n<p><b>bold</b> text</p>\n</html>"
//! );
//! ```

mod error;
mod parse;
mod serialize;

use enriched_core::{Document, DocumentCodec, decode_or_plain};

pub use error::HtmlError;
pub use parse::from_html;
pub use serialize::to_html;

/// [`DocumentCodec`] reading and writing the HTML dialect described in the crate docs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HtmlCodec;

impl DocumentCodec for HtmlCodec {
    type Error = HtmlError;

    fn encode(&self, doc: &Document) -> String {
        to_html(doc)
    }

    fn decode(&self, input: &str) -> Result<Document, Self::Error> {
        from_html(input)
    }
}

/// Whether `input` looks like a document written by [`to_html`].
pub fn is_html(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.starts_with("<html>") && trimmed.ends_with("</html>")
}

/// Load a host-provided value: HTML when it is wrapped in `<html>`, plain text otherwise.
///
/// HTML that fails to parse is logged and loaded verbatim as plain text.
pub fn parse_text(input: &str) -> Document {
    if is_html(input) {
        decode_or_plain(&HtmlCodec, input)
    } else {
        Document::from_text(input)
    }
}
