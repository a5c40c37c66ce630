#![warn(missing_docs)]
//! Enriched Core - Headless Rich-Text Editing Engine
//!
//! # Overview
//!
//! `enriched-core` keeps a text buffer annotated with overlapping, typed style ranges (bold,
//! headings, lists, links, mentions, ...) and implements the editing rules a WYSIWYG surface
//! needs: toggling styles under a selection, keeping annotations consistent while text is
//! typed or deleted, resolving conflicts between styles, and tracking which styles are active.
//! It does not render anything; a host edit surface reports text and selection changes and
//! draws the annotations it is given.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Commands & Editor Facade (events, txns)    │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Selection Validation & Typing State        │  ← Toolbar State
//! ├─────────────────────────────────────────────┤
//! │  Style Engines (inline/paragraph/list/...)  │  ← Editing Rules
//! ├─────────────────────────────────────────────┤
//! │  Document (Rope + Annotation Store)         │  ← Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use enriched_core::{EditorConfig, EnrichedEditor, StyleKind};
//!
//! let mut editor = EnrichedEditor::new(EditorConfig::default()).unwrap();
//!
//! // Typing "- " at the start of a paragraph turns it into a list item.
//! editor.insert_text("- ");
//! editor.insert_text("milk");
//!
//! assert!(editor.style_state().get(StyleKind::UnorderedList).is_active);
//! assert_eq!(editor.text(), "\u{200B}milk");
//! ```
//!
//! # Module Description
//!
//! - [`styles`] - style kinds and their merge rules
//! - [`annotation`] - annotation store with overlap queries
//! - [`document`] - rope buffer plus annotations
//! - [`editor`] - the [`EnrichedEditor`] facade, events and transactions
//! - [`commands`] - unified command interface
//! - [`codec`] - serialization seam implemented by `enriched-html`
//!
//! # Offsets
//!
//! Every offset is a char (Unicode scalar) offset into the buffer. Paragraphs that carry a
//! paragraph or list style start with a zero-width space (U+200B) so that empty items still
//! have a range to annotate.

pub mod annotation;
pub mod codec;
pub mod commands;
pub mod config;
mod conflicts;
pub mod document;
pub mod editor;
pub mod error;
mod inline;
mod list;
mod paragraph;
mod parametrized;
pub mod range;
pub mod selection;
pub mod styles;
pub mod typing;

pub use annotation::{Annotation, AnnotationId, AnnotationStore, Style};
pub use codec::{DocumentCodec, PlainTextCodec, decode_or_plain};
pub use commands::{
    Command, CommandResult, ConfigCommand, EditCommand, SelectionCommand, StyleCommand,
};
pub use config::{
    DEFAULT_LINK_PATTERN, EditorConfig, HtmlStyle, LinkMatcher, LinkRegexConfig, Rgba,
};
pub use document::{ConsistencyViolation, Document};
pub use editor::{EditorEvent, EditorEventCallback, EnrichedEditor, MentionEvent, TransactionGuard};
pub use error::{CommandError, ConfigError};
pub use parametrized::MentionTracker;
pub use selection::{LinkDetection, MentionDetection, Selection};
pub use styles::{MergingConfig, StyleCategory, StyleKind, UnknownStyle};
pub use typing::{PendingColor, StyleState, StyleStateSnapshot, TypingState};
