//! Editor facade.
//!
//! [`EnrichedEditor`] owns one [`Document`] together with its typing state and selection, and
//! is the single entry point hosts talk to: text and selection changes flow in, toolbar commands
//! are applied, and [`EditorEvent`]s flow out to subscribers.
//!
//! # Operations and transactions
//!
//! Every public operation runs inside a [`TransactionGuard`]. Events produced while a guard is
//! alive are queued and delivered once the outermost guard drops, after ordered lists have been
//! renumbered and the selection revalidated. A guard obtained from
//! [`EnrichedEditor::transaction`] additionally marks the editor as being in a transaction:
//! text-change hooks are skipped and the caret is not snapped off zero-width markers until it
//! is released.
//!
//! # Example
//!
//! ```rust
//! use enriched_core::{EditorConfig, EnrichedEditor, StyleKind};
//!
//! let mut editor = EnrichedEditor::new(EditorConfig::default()).unwrap();
//! editor.replace_text(0, 0, "hello ");
//! editor.toggle_style(StyleKind::Bold);
//! editor.insert_text("world");
//!
//! let bold: Vec<_> = editor.document().annotations().of_kind(StyleKind::Bold).collect();
//! assert_eq!((bold[0].start(), bold[0].end()), (6, 11));
//! ```

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::codec::DocumentCodec;
use crate::config::{EditorConfig, HtmlStyle, LinkMatcher, LinkRegexConfig, Rgba};
use crate::document::{ConsistencyViolation, Document};
use crate::error::ConfigError;
use crate::parametrized::MentionTracker;
use crate::range;
use crate::selection::{LinkDetection, MentionDetection, Selection};
use crate::styles::StyleKind;
use crate::typing::{StyleStateSnapshot, TypingState};

/// Lifecycle of a mention being typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionEvent {
    /// The word under the caret is exactly an indicator.
    Started {
        /// Indicator typed.
        indicator: String,
    },
    /// Text was typed after the indicator.
    Changed {
        /// Indicator typed.
        indicator: String,
        /// Text after the indicator.
        text: String,
    },
    /// The caret left the mention, or it was resolved.
    Ended {
        /// Indicator of the mention that ended.
        indicator: String,
    },
}

/// Notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Buffer or annotations changed.
    DocumentChanged {
        /// Document version after the change.
        version: u64,
    },
    /// Serialized document, when a value codec is attached.
    ValueChanged(String),
    /// The validated selection moved.
    SelectionChanged {
        /// Start offset.
        start: usize,
        /// End offset.
        end: usize,
        /// Selected text.
        text: String,
    },
    /// Active, blocking or conflicting styles changed.
    StyleStateChanged(StyleStateSnapshot),
    /// Uniform color of the selection changed.
    ColorChanged(Option<Rgba>),
    /// The link under the selection changed.
    LinkDetected(LinkDetection),
    /// The mention under the selection changed.
    MentionDetected(MentionDetection),
    /// A typed mention progressed.
    Mention(MentionEvent),
}

/// Subscriber callback type.
pub type EditorEventCallback = Box<dyn FnMut(&EditorEvent) + Send>;

type ValueEncoder = Box<dyn Fn(&Document) -> String + Send>;

/// Last values handed to subscribers, for deduplication.
struct Emitted {
    state: StyleStateSnapshot,
    selection: Selection,
    color: Option<Rgba>,
    version: u64,
    value: Option<String>,
}

/// Rich-text editing engine for one document.
pub struct EnrichedEditor {
    pub(crate) doc: Document,
    pub(crate) typing: TypingState,
    /// Selection the typing state was computed for.
    pub(crate) selection: Selection,
    /// Selection following engine-side mutations.
    pub(crate) caret: Selection,
    pub(crate) style: HtmlStyle,
    pub(crate) link_matcher: LinkMatcher,
    pub(crate) mentions: MentionTracker,
    pub(crate) is_removing_many: bool,
    pub(crate) last_link: (String, String),
    pub(crate) last_mention: (String, String, BTreeMap<String, String>),
    depth: usize,
    transaction_depth: usize,
    pending: Vec<EditorEvent>,
    callbacks: Vec<EditorEventCallback>,
    emitted: Emitted,
    value_encoder: Option<ValueEncoder>,
}

impl EnrichedEditor {
    /// Create an editor with an empty document.
    pub fn new(config: EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let link_matcher = config.link_regex.compile()?;
        let mentions = MentionTracker::new(config.mention_indicators)?;
        let typing = TypingState::default();
        let state = typing.snapshot(&config.html_style);
        let doc = Document::new();
        let version = doc.version();

        Ok(Self {
            doc,
            typing,
            selection: Selection::default(),
            caret: Selection::default(),
            style: config.html_style,
            link_matcher,
            mentions,
            is_removing_many: false,
            last_link: Default::default(),
            last_mention: Default::default(),
            depth: 0,
            transaction_depth: 0,
            pending: Vec::new(),
            callbacks: Vec::new(),
            emitted: Emitted {
                state,
                selection: Selection::default(),
                color: None,
                version,
                value: None,
            },
            value_encoder: None,
        })
    }

    /// The document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access for hosts that edit the buffer themselves.
    ///
    /// Report every such edit through [`on_text_changed`](Self::on_text_changed) and
    /// [`on_selection_changed`](Self::on_selection_changed).
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Full text.
    pub fn text(&self) -> String {
        self.doc.text()
    }

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Pending styles.
    pub fn typing_state(&self) -> &TypingState {
        &self.typing
    }

    /// Toolbar snapshot for the current selection.
    pub fn style_state(&self) -> StyleStateSnapshot {
        self.typing.snapshot(&self.style)
    }

    /// Style configuration.
    pub fn html_style(&self) -> &HtmlStyle {
        &self.style
    }

    /// Document version.
    pub fn version(&self) -> u64 {
        self.doc.version()
    }

    /// Register a callback for [`EditorEvent`]s.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&EditorEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Emit [`EditorEvent::ValueChanged`] with `codec`'s encoding after each mutating operation.
    pub fn observe_value<C>(&mut self, codec: C)
    where
        C: DocumentCodec + Send + 'static,
    {
        self.emitted.value = Some(codec.encode(&self.doc));
        self.value_encoder = Some(Box::new(move |doc| codec.encode(doc)));
    }

    /// Whether a transaction is open.
    pub fn is_in_transaction(&self) -> bool {
        self.transaction_depth > 0
    }

    /// Open a transaction: hooks and caret snapping are suspended until the guard drops.
    pub fn transaction(&mut self) -> TransactionGuard<'_> {
        self.depth += 1;
        self.transaction_depth += 1;
        TransactionGuard {
            editor: self,
            suppress_hooks: true,
        }
    }

    /// Open an operation scope that only batches events.
    pub(crate) fn operation(&mut self) -> TransactionGuard<'_> {
        self.depth += 1;
        TransactionGuard {
            editor: self,
            suppress_hooks: false,
        }
    }

    /// Insert at `at`, moving the caret along.
    pub(crate) fn insert_at(&mut self, at: usize, text: &str) -> usize {
        let at = at.min(self.doc.len());
        let count = self.doc.insert(at, text);
        self.caret.shift_for_insertion(at, count);
        count
    }

    /// Delete `[start, end)`, moving the caret along.
    pub(crate) fn remove_range(&mut self, start: usize, end: usize) -> usize {
        let (start, end) = range::safe_bounds(self.doc.len(), start, end);
        let removed = self.doc.remove(start, end);
        self.caret.shift_for_deletion(start, end);
        removed
    }

    /// Replace `[start, end)` with `text`, moving the caret along.
    pub(crate) fn replace_range(&mut self, start: usize, end: usize, text: &str) -> usize {
        let (start, end) = range::safe_bounds(self.doc.len(), start, end);
        self.remove_range(start, end);
        self.insert_at(start, text)
    }

    /// Delete every zero-width marker in `[start, end)`. Returns how many were removed.
    pub(crate) fn strip_zws(&mut self, start: usize, end: usize) -> usize {
        let positions = range::zws_positions(self.doc.rope(), start, end);
        for pos in positions.iter().rev() {
            self.remove_range(*pos, pos + 1);
        }
        positions.len()
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        self.pending.push(event);
    }

    /// Replace `[start, end)` with `text` as a user edit.
    ///
    /// Runs the text-change hooks, then moves the caret after the inserted text.
    pub fn replace_text(&mut self, start: usize, end: usize, text: &str) -> Selection {
        let mut op = self.operation();
        let previous_len = op.doc.len();
        let (start, end) = range::safe_bounds(previous_len, start, end);
        let inserted = op.doc.replace(start, end, text);
        op.caret = Selection::collapsed(start + inserted);
        op.on_text_changed(start, start + inserted, previous_len);
        drop(op);
        self.caret
    }

    /// Replace the selection with `text`.
    pub fn insert_text(&mut self, text: &str) -> Selection {
        let Selection { start, end } = self.selection;
        self.replace_text(start, end, text)
    }

    /// Delete the selection, or the char before the caret.
    pub fn backspace(&mut self) -> Selection {
        let Selection { start, end } = self.selection;
        if start != end {
            self.replace_text(start, end, "")
        } else if start > 0 {
            self.replace_text(start - 1, start, "")
        } else {
            self.selection
        }
    }

    /// Report a buffer edit that inserted `[edit_start, edit_end)` and left the buffer
    /// `previous_len` chars long before it.
    pub fn on_text_changed(&mut self, edit_start: usize, edit_end: usize, previous_len: usize) {
        let mut op = self.operation();
        let len = op.doc.len();
        let inserted = edit_end.saturating_sub(edit_start);
        let removed = (previous_len + inserted).saturating_sub(len);

        if op.is_in_transaction() {
            return;
        }
        op.is_removing_many = removed > inserted + 1;

        let end_cursor = edit_end.min(len);
        op.inline_after_edit(end_cursor);
        op.apply_typing_color(end_cursor);
        op.paragraph_after_edit(end_cursor, previous_len);
        op.list_after_edit(end_cursor, previous_len);
        op.parametrized_after_edit(edit_start, end_cursor);
    }

    /// Report a selection change.
    pub fn on_selection_changed(&mut self, start: usize, end: usize) -> Selection {
        let mut op = self.operation();
        op.apply_selection(start, end);
        drop(op);
        self.caret
    }

    /// Select using offsets that do not count zero-width markers.
    pub fn set_custom_selection(&mut self, visible_start: usize, visible_end: usize) -> Selection {
        let start = range::visible_to_buffer(self.doc.rope(), visible_start);
        let end = range::visible_to_buffer(self.doc.rope(), visible_end);
        self.on_selection_changed(start, end)
    }

    /// Toggle `kind` for the selection.
    ///
    /// Returns `false` when a blocking style rejects it or `kind` is not toggleable.
    pub fn toggle_style(&mut self, kind: StyleKind) -> bool {
        let mut op = self.operation();
        op.verify_and_toggle(kind, false)
    }

    /// Toggle a checkbox list whose new items start `checked`.
    pub fn toggle_checkbox_list(&mut self, checked: bool) -> bool {
        let mut op = self.operation();
        op.verify_and_toggle(StyleKind::CheckboxList, checked)
    }

    /// Flip the checkbox of the list item whose paragraph contains `at`.
    pub fn toggle_checked(&mut self, at: usize) -> bool {
        let mut op = self.operation();
        op.toggle_checkbox_at(at)
    }

    /// Remove `kind` from `[start, end)`.
    pub fn remove_style(&mut self, kind: StyleKind, start: usize, end: usize) -> bool {
        let mut op = self.operation();
        let (start, end) = range::safe_bounds(op.doc.len(), start, end);
        let removed = op.remove_style_in(kind, start, end);
        if removed {
            op.typing.set(kind, None);
        }
        removed
    }

    /// Paint the selection, or start typing in `color` at a caret.
    pub fn set_color(&mut self, color: Rgba) {
        let mut op = self.operation();
        op.set_color_internal(color);
    }

    /// Remove text color from the selection.
    pub fn remove_color(&mut self) -> bool {
        let mut op = self.operation();
        op.remove_color_internal()
    }

    /// Replace `[start, end)` with `text` and link it to `url`.
    pub fn set_link(&mut self, start: usize, end: usize, text: &str, url: &str) -> bool {
        let mut op = self.operation();
        if !op.verify_style(StyleKind::Link) {
            return false;
        }
        op.set_link_internal(start, end, text, url);
        true
    }

    /// Insert or stamp an image at the selection.
    pub fn set_image(&mut self, src: &str, width: u32, height: u32) -> bool {
        let mut op = self.operation();
        if !op.verify_style(StyleKind::Image) {
            return false;
        }
        op.set_image_internal(src, width, height);
        true
    }

    /// Type `indicator` at the selection, starting a mention.
    pub fn start_mention(&mut self, indicator: &str) -> bool {
        let mut op = self.operation();
        if !op.verify_style(StyleKind::Mention) {
            return false;
        }
        let Selection { start, end } = op.selection;
        op.replace_text(start, end, indicator);
        true
    }

    /// Resolve the mention being typed into `text`.
    pub fn set_mention(
        &mut self,
        indicator: &str,
        text: &str,
        attributes: BTreeMap<String, String>,
    ) -> bool {
        let mut op = self.operation();
        if !op.verify_style(StyleKind::Mention) {
            return false;
        }
        op.set_mention_internal(indicator, text, attributes)
    }

    /// Change link detection.
    pub fn set_link_regex(&mut self, config: &LinkRegexConfig) -> Result<(), ConfigError> {
        self.link_matcher = config.compile()?;
        Ok(())
    }

    /// Change the mention indicators.
    pub fn set_mention_indicators(&mut self, indicators: Vec<String>) -> Result<(), ConfigError> {
        self.mentions.set_indicators(indicators)
    }

    /// Change the style configuration.
    pub fn set_html_style(&mut self, style: HtmlStyle) -> Result<(), ConfigError> {
        style.validate()?;
        let mut op = self.operation();
        op.style = style;
        Ok(())
    }

    /// Report invariant breaches in the document.
    pub fn check_consistency(&self) -> Vec<ConsistencyViolation> {
        self.doc.check_consistency()
    }

    /// Serialize the document with `codec`.
    pub fn value<C: DocumentCodec>(&self, codec: &C) -> String {
        codec.encode(&self.doc)
    }

    /// Replace the document with `input` decoded by `codec`.
    ///
    /// Input the codec rejects is loaded as plain text.
    pub fn set_value<C: DocumentCodec>(&mut self, codec: &C, input: &str) {
        let mut op = self.operation();
        let doc = crate::codec::decode_or_plain(codec, input);
        let len = doc.len();
        op.doc.load(doc);
        op.typing = TypingState::default();
        op.mentions.reset_silently();
        op.caret = Selection::collapsed(len);
        op.validate_styles();
    }

    /// End of the outermost operation.
    fn finish_operation(&mut self) {
        self.renumber_ordered_lists();
        self.sync_selection();
        self.flush_events();
    }

    fn flush_events(&mut self) {
        let mut events = Vec::new();

        let version = self.doc.version();
        if version != self.emitted.version {
            self.emitted.version = version;
            events.push(EditorEvent::DocumentChanged { version });
            if let Some(encode) = &self.value_encoder {
                let value = encode(&self.doc);
                if self.emitted.value.as_deref() != Some(value.as_str()) {
                    self.emitted.value = Some(value.clone());
                    events.push(EditorEvent::ValueChanged(value));
                }
            }
        }

        if self.selection != self.emitted.selection {
            self.emitted.selection = self.selection;
            events.push(EditorEvent::SelectionChanged {
                start: self.selection.start,
                end: self.selection.end,
                text: self.doc.slice(self.selection.start, self.selection.end),
            });
        }

        let state = self.typing.snapshot(&self.style);
        if state != self.emitted.state {
            self.emitted.state = state.clone();
            events.push(EditorEvent::StyleStateChanged(state));
        }

        let color = self.selection_color();
        if color != self.emitted.color {
            self.emitted.color = color;
            events.push(EditorEvent::ColorChanged(color));
        }

        events.append(&mut self.pending);
        if events.is_empty() {
            return;
        }
        debug!(count = events.len(), "dispatching editor events");
        for event in &events {
            for callback in &mut self.callbacks {
                callback(event);
            }
        }
    }
}

/// Scope of an operation or transaction; see the [module documentation](self).
pub struct TransactionGuard<'a> {
    editor: &'a mut EnrichedEditor,
    suppress_hooks: bool,
}

impl Deref for TransactionGuard<'_> {
    type Target = EnrichedEditor;

    fn deref(&self) -> &Self::Target {
        self.editor
    }
}

impl DerefMut for TransactionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.editor
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.suppress_hooks {
            self.editor.transaction_depth -= 1;
        }
        self.editor.depth -= 1;
        if self.editor.depth == 0 {
            self.editor.finish_operation();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;

    fn editor() -> EnrichedEditor {
        EnrichedEditor::new(EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_host_edit_runs_hooks() {
        let mut editor = editor();
        editor.document_mut().insert(0, "- ");
        editor.on_text_changed(0, 2, 0);

        assert_eq!(editor.text(), "\u{200B}");
        assert_eq!(
            editor
                .document()
                .annotations()
                .of_kind(StyleKind::UnorderedList)
                .map(|a| (a.start(), a.end()))
                .collect::<Vec<_>>(),
            vec![(0, 1)]
        );
    }

    #[test]
    fn test_nested_transactions_flush_once() {
        let mut editor = editor();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        editor.subscribe(move |event| {
            if matches!(event, EditorEvent::DocumentChanged { .. }) {
                *sink.lock().unwrap() += 1;
            }
        });

        {
            let mut outer = editor.transaction();
            outer.replace_text(0, 0, "a");
            {
                let mut inner = outer.transaction();
                inner.replace_text(1, 1, "b");
            }
            assert!(outer.is_in_transaction());
            outer.replace_text(2, 2, "c");
        }

        assert!(!editor.is_in_transaction());
        assert_eq!(editor.text(), "abc");
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut editor = editor();
        let version = editor.version();
        assert_eq!(editor.backspace(), Selection::collapsed(0));
        assert_eq!(editor.version(), version);
    }

    #[test]
    fn test_returned_caret_skips_marker() {
        let mut editor = editor();
        editor.replace_text(0, 0, "a\nxy\nb");
        editor.toggle_style(StyleKind::UnorderedList);
        assert_eq!(editor.text(), "a\nxy\n\u{200B}b");

        let caret = editor.replace_text(2, 5, "");
        assert_eq!(editor.text(), "a\n\u{200B}b");
        assert_eq!(caret, Selection::collapsed(3));
        assert_eq!(editor.selection(), caret);

        assert_eq!(editor.on_selection_changed(2, 2), Selection::collapsed(3));
    }
}
