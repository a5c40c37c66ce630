//! Links, images and mentions.
//!
//! These annotations are atomic: an edit inside one re-evaluates the whole word it sits in.
//! Links are detected automatically with the configured [`LinkMatcher`](crate::LinkMatcher) or
//! set explicitly; mentions are tracked while typed and stamped once the host resolves them.

use std::collections::BTreeMap;

use regex::Regex;

use crate::annotation::Style;
use crate::editor::{EditorEvent, EnrichedEditor, MentionEvent};
use crate::error::ConfigError;
use crate::range::{self, OBJECT_REPLACEMENT_STR};
use crate::selection::Selection;
use crate::styles::StyleKind;

/// Build the pattern matching a word made of an indicator followed by word chars.
fn mention_pattern(indicators: &[String]) -> Result<Option<Regex>, ConfigError> {
    if indicators.is_empty() {
        return Ok(None);
    }
    if indicators.iter().any(|indicator| indicator.is_empty()) {
        return Err(ConfigError::EmptyMentionIndicator);
    }

    let alternatives: Vec<String> = indicators.iter().map(|i| regex::escape(i)).collect();
    let pattern = format!(r"^({})(\w*)$", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|source| ConfigError::InvalidRegex { pattern, source })
}

/// State of the mention being typed.
#[derive(Debug, Clone)]
pub struct MentionTracker {
    indicators: Vec<String>,
    pattern: Option<Regex>,
    /// Offset of the indicator of the mention being typed.
    pub(crate) start: Option<usize>,
    previous_text: Option<String>,
    previous_indicator: Option<String>,
}

impl MentionTracker {
    /// Tracker for `indicators`; an empty list disables mentions.
    pub fn new(indicators: Vec<String>) -> Result<Self, ConfigError> {
        let pattern = mention_pattern(&indicators)?;
        Ok(Self {
            indicators,
            pattern,
            start: None,
            previous_text: None,
            previous_indicator: None,
        })
    }

    /// Configured indicators.
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Replace the indicators.
    pub fn set_indicators(&mut self, indicators: Vec<String>) -> Result<(), ConfigError> {
        self.pattern = mention_pattern(&indicators)?;
        self.indicators = indicators;
        Ok(())
    }

    /// Split `word` into indicator and typed text if it is a mention in progress.
    pub fn parse<'a>(&self, word: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.pattern.as_ref()?.captures(word)?;
        let indicator = captures.get(1)?.as_str();
        let text = captures.get(2).map_or("", |m| m.as_str());
        Some((indicator, text))
    }

    fn on_mention(&mut self, indicator: &str, text: &str) -> Option<MentionEvent> {
        self.previous_indicator = Some(indicator.to_string());
        if self.previous_text.as_deref() == Some(text) {
            return None;
        }
        self.previous_text = Some(text.to_string());

        let indicator = indicator.to_string();
        Some(if text.is_empty() {
            MentionEvent::Started { indicator }
        } else {
            MentionEvent::Changed {
                indicator,
                text: text.to_string(),
            }
        })
    }

    /// End the mention being typed, if any.
    pub fn end(&mut self) -> Option<MentionEvent> {
        let indicator = self.previous_indicator.take()?;
        self.previous_text.take()?;
        Some(MentionEvent::Ended { indicator })
    }

    /// End the mention and forget where it started.
    pub fn reset(&mut self) -> Option<MentionEvent> {
        let event = self.end();
        self.previous_text = None;
        self.start = None;
        event
    }

    /// Forget everything without reporting.
    pub fn reset_silently(&mut self) {
        self.start = None;
        self.previous_text = None;
        self.previous_indicator = None;
    }
}

impl EnrichedEditor {
    fn emit_mention(&mut self, event: Option<MentionEvent>) {
        if let Some(event) = event {
            self.emit(EditorEvent::Mention(event));
        }
    }

    fn can_link_be_applied(&self) -> bool {
        let Some(config) = StyleKind::Link.merging_config(&self.style) else {
            return true;
        };
        !config
            .blocking
            .iter()
            .chain(&config.conflicting)
            .any(|kind| self.typing.is_active(*kind))
    }

    /// Re-detect links in every word touching `[start, end]`, dropping the links those words
    /// carried before the edit.
    fn links_after_edit(&mut self, start: usize, end: usize) {
        if self.link_matcher.is_disabled() || !self.can_link_be_applied() {
            return;
        }

        for (word, word_start, word_end) in range::words_in(self.doc.rope(), start, end) {
            for span in self.doc.query(StyleKind::Link, word_start, word_end) {
                self.doc.remove_annotation(span.id());
            }
            if self.link_matcher.matches(&word) {
                self.doc
                    .add_annotation(Style::Link { url: word }, word_start, word_end);
            }
        }
    }

    fn mentions_after_edit(&mut self, word: &str, start: usize, end: usize) {
        if self.mentions.indicators().is_empty() {
            return;
        }

        if start < end {
            for span in self.doc.query(StyleKind::Mention, start, end) {
                self.doc.remove_annotation(span.id());
            }
        }

        let event = match self.mentions.parse(word) {
            Some((indicator, text)) => {
                let (indicator, text) = (indicator.to_string(), text.to_string());
                self.mentions.start = Some(start);
                self.mentions.on_mention(&indicator, &text)
            }
            None => self.mentions.end(),
        };
        self.emit_mention(event);
    }

    /// Re-evaluate links in the words touched by `[edit_start, end_cursor]` and mentions in
    /// the word at `end_cursor`.
    pub(crate) fn parametrized_after_edit(&mut self, edit_start: usize, end_cursor: usize) {
        self.links_after_edit(edit_start.min(end_cursor), end_cursor);
        let Some((word, start, end)) = range::word_at(self.doc.rope(), end_cursor) else {
            return;
        };
        self.mentions_after_edit(&word, start, end);
    }

    /// Replace `[start, end)` with `text` linked to `url`.
    pub(crate) fn set_link_internal(&mut self, start: usize, end: usize, text: &str, url: &str) {
        let (start, end) = range::safe_bounds(self.doc.len(), start, end);
        for span in self.doc.query(StyleKind::Link, start, end) {
            self.doc.remove_annotation(span.id());
        }

        let inserted = self.replace_range(start, end, text);
        self.doc.add_annotation(
            Style::Link {
                url: url.to_string(),
            },
            start,
            start + inserted,
        );
        self.validate_styles();
    }

    /// Stamp an image on the selection, inserting a placeholder at a caret.
    pub(crate) fn set_image_internal(&mut self, src: &str, width: u32, height: u32) {
        let (start, mut end) = self.inline_selection();
        for span in self.doc.query(StyleKind::Image, start, end) {
            self.doc.remove_annotation(span.id());
        }

        if start == end {
            end += self.insert_at(start, OBJECT_REPLACEMENT_STR);
        }
        self.doc.add_annotation(
            Style::Image {
                src: src.to_string(),
                width,
                height,
            },
            start,
            end,
        );
        self.validate_styles();
    }

    /// Replace the mention being typed with `text`, followed by a space.
    pub(crate) fn set_mention_internal(
        &mut self,
        indicator: &str,
        text: &str,
        attributes: BTreeMap<String, String>,
    ) -> bool {
        let (selection_start, selection_end) = self.inline_selection();
        for span in self.doc.query(StyleKind::Mention, selection_start, selection_end) {
            self.doc.remove_annotation(span.id());
        }

        let Some(start) = self.mentions.start else {
            return false;
        };
        if start > selection_end {
            return false;
        }

        {
            let mut tx = self.transaction();
            let inserted = tx.replace_range(start, selection_end, text);
            let span_end = start + inserted;
            tx.doc.add_annotation(
                Style::Mention {
                    indicator: indicator.to_string(),
                    text: text.to_string(),
                    attributes,
                },
                start,
                span_end,
            );
            if tx.doc.char_at(span_end) != Some(' ') {
                tx.insert_at(span_end, " ");
            }
            tx.caret = Selection::collapsed(span_end + 1);
        }

        let event = self.mentions.reset();
        self.emit_mention(event);
        self.validate_styles();
        true
    }

    /// Remove parametrized `kind` annotations in `[start, end)` and the markers there.
    pub(crate) fn remove_parametrized(&mut self, kind: StyleKind, start: usize, end: usize) -> bool {
        let spans = self.doc.query(kind, start, end);
        if spans.is_empty() {
            return false;
        }
        for span in &spans {
            self.doc.remove_annotation(span.id());
        }
        self.strip_zws(start, end);
        true
    }
}
