//! Annotated text buffer.
//!
//! A [`Document`] owns a rope of chars and the [`AnnotationStore`] describing its styling.
//! Every text mutation rebases the annotations in the same call, so offsets stored in
//! annotations always refer to the current buffer.

use ropey::Rope;

use crate::annotation::{Annotation, AnnotationId, AnnotationStore, Style};
use crate::styles::{StyleCategory, StyleKind};

/// A detected breach of the annotation invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyViolation {
    /// More than one annotation of a paragraph or list kind intersects one paragraph.
    DuplicateParagraphStyle {
        /// Offending kind.
        kind: StyleKind,
        /// Paragraph start.
        paragraph_start: usize,
        /// Paragraph end.
        paragraph_end: usize,
    },
    /// Two annotations of the same inline kind overlap.
    OverlappingInlineStyle {
        /// Offending kind.
        kind: StyleKind,
        /// Offset where the second annotation starts.
        at: usize,
    },
}

/// Text buffer plus annotations.
#[derive(Debug, Clone, Default)]
pub struct Document {
    rope: Rope,
    annotations: AnnotationStore,
    version: u64,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unstyled document.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            ..Self::default()
        }
    }

    /// Underlying rope.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Annotation store.
    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    /// Mutation counter, bumped on every text or annotation change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Full text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Char at `index`.
    pub fn char_at(&self, index: usize) -> Option<char> {
        (index < self.len()).then(|| self.rope.char(index))
    }

    /// Text of `[start, end)`, clamped to the buffer.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.len());
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }

    /// Insert `text` at `at` (clamped). Returns the number of chars inserted.
    pub fn insert(&mut self, at: usize, text: &str) -> usize {
        let count = text.chars().count();
        if count == 0 {
            return 0;
        }
        let at = at.min(self.len());
        self.rope.insert(at, text);
        self.annotations.update_for_insertion(at, count);
        self.version += 1;
        count
    }

    /// Delete `[start, end)` (clamped). Returns the number of chars removed.
    pub fn remove(&mut self, start: usize, end: usize) -> usize {
        let end = end.min(self.len());
        let start = start.min(end);
        if start == end {
            return 0;
        }
        self.rope.remove(start..end);
        self.annotations.update_for_deletion(start, end);
        self.version += 1;
        end - start
    }

    /// Replace `[start, end)` with `text`. Returns the number of chars inserted.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> usize {
        let end = end.min(self.len());
        let start = start.min(end);
        self.remove(start, end);
        self.insert(start, text)
    }

    /// Annotate `[start, end)` (clamped). Empty ranges are ignored.
    pub fn add_annotation(&mut self, style: Style, start: usize, end: usize) -> Option<AnnotationId> {
        let end = end.min(self.len());
        let start = start.min(end);
        let id = self.annotations.insert(style, start, end)?;
        self.version += 1;
        Some(id)
    }

    /// Remove an annotation.
    pub fn remove_annotation(&mut self, id: AnnotationId) -> Option<Annotation> {
        let removed = self.annotations.remove(id)?;
        self.version += 1;
        Some(removed)
    }

    /// Replace an annotation's payload.
    pub fn set_annotation_style(&mut self, id: AnnotationId, style: Style) -> bool {
        if self.annotations.get(id).is_some_and(|a| *a.style() == style) {
            return false;
        }
        let changed = self.annotations.set_style(id, style);
        if changed {
            self.version += 1;
        }
        changed
    }

    /// Annotations of `kind` matching `[start, end)`.
    pub fn query(&self, kind: StyleKind, start: usize, end: usize) -> Vec<Annotation> {
        self.annotations.query(kind, start, end)
    }

    /// Build a document from text and `(style, start, end)` triples.
    ///
    /// Ranges are clamped to the text; empty ones are dropped.
    pub fn from_parts(
        text: &str,
        annotations: impl IntoIterator<Item = (Style, usize, usize)>,
    ) -> Self {
        let mut doc = Document::from_text(text);
        for (style, start, end) in annotations {
            doc.add_annotation(style, start, end);
        }
        doc
    }

    /// Take over `other`'s text and annotations, keeping the version increasing.
    pub fn load(&mut self, other: Document) {
        let version = self.version.max(other.version) + 1;
        *self = other;
        self.version = version;
    }

    pub(crate) fn take_ordered_list_touched(&mut self) -> Option<usize> {
        self.annotations.take_ordered_list_touched()
    }

    /// Paragraph ranges (excluding their `\n`) intersecting `[start, end]`.
    pub fn paragraphs(&self, start: usize, end: usize) -> Vec<(usize, usize)> {
        let (mut current, end) = crate::range::paragraph_bounds(&self.rope, start, end);
        let mut result = Vec::new();
        loop {
            let (_, paragraph_end) = crate::range::paragraph_bounds(&self.rope, current, current);
            result.push((current, paragraph_end));
            if paragraph_end >= end {
                break;
            }
            current = paragraph_end + 1;
        }
        result
    }

    /// Report paragraphs with duplicate paragraph-kind annotations and overlapping inline
    /// annotations of one kind.
    pub fn check_consistency(&self) -> Vec<ConsistencyViolation> {
        let mut violations = Vec::new();

        for (paragraph_start, paragraph_end) in self.paragraphs(0, self.len()) {
            for kind in StyleKind::PARAGRAPH.into_iter().chain(StyleKind::LIST) {
                let count = self
                    .annotations
                    .query(kind, paragraph_start, paragraph_end)
                    .len();
                if count > 1 {
                    violations.push(ConsistencyViolation::DuplicateParagraphStyle {
                        kind,
                        paragraph_start,
                        paragraph_end,
                    });
                }
            }
        }

        for kind in StyleKind::ALL
            .into_iter()
            .filter(|k| k.category() == StyleCategory::Inline)
        {
            let mut last_end = None;
            for annotation in self.annotations.of_kind(kind) {
                if last_end.is_some_and(|end| annotation.start() < end) {
                    violations.push(ConsistencyViolation::OverlappingInlineStyle {
                        kind,
                        at: annotation.start(),
                    });
                }
                last_end = Some(last_end.map_or(annotation.end(), |end: usize| {
                    end.max(annotation.end())
                }));
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edits_rebase_annotations() {
        let mut doc = Document::from_text("hello world");
        doc.add_annotation(Style::Bold, 6, 11);
        doc.insert(0, ">> ");
        assert_eq!(doc.text(), ">> hello world");
        let bold = doc.query(StyleKind::Bold, 0, doc.len());
        assert_eq!((bold[0].start(), bold[0].end()), (9, 14));

        doc.replace(9, 14, "there");
        assert_eq!(doc.text(), ">> hello there");
        assert!(doc.query(StyleKind::Bold, 0, doc.len()).is_empty());
    }

    #[test]
    fn test_out_of_range_edits_are_clamped() {
        let mut doc = Document::from_text("abc");
        assert_eq!(doc.remove(2, 99), 1);
        assert_eq!(doc.insert(99, "z"), 1);
        assert_eq!(doc.text(), "abz");
        assert!(doc.add_annotation(Style::Bold, 50, 60).is_none());
        assert_eq!(doc.slice(1, 99), "bz");
        assert_eq!(doc.char_at(3), None);
    }

    #[test]
    fn test_version_bumps_only_on_change() {
        let mut doc = Document::from_text("abc");
        let v = doc.version();
        doc.insert(1, "");
        doc.remove(1, 1);
        assert_eq!(doc.version(), v);
        let id = doc.add_annotation(Style::CheckboxList { checked: false }, 0, 3).unwrap();
        assert!(!doc.set_annotation_style(id, Style::CheckboxList { checked: false }));
        assert!(doc.set_annotation_style(id, Style::CheckboxList { checked: true }));
        assert_eq!(doc.version(), v + 2);
    }

    #[test]
    fn test_paragraphs() {
        let doc = Document::from_text("ab\n\ncd");
        assert_eq!(doc.paragraphs(0, doc.len()), vec![(0, 2), (3, 3), (4, 6)]);
        assert_eq!(doc.paragraphs(1, 1), vec![(0, 2)]);
        assert_eq!(Document::new().paragraphs(0, 0), vec![(0, 0)]);
    }

    #[test]
    fn test_consistency_violations_are_reported() {
        let mut doc = Document::from_text("one\ntwo");
        doc.add_annotation(Style::H1, 0, 2);
        doc.add_annotation(Style::H1, 2, 3);
        doc.add_annotation(Style::Bold, 4, 6);
        doc.add_annotation(Style::Bold, 5, 7);
        let violations = doc.check_consistency();
        assert_eq!(
            violations,
            vec![
                ConsistencyViolation::DuplicateParagraphStyle {
                    kind: StyleKind::H1,
                    paragraph_start: 0,
                    paragraph_end: 3,
                },
                ConsistencyViolation::OverlappingInlineStyle {
                    kind: StyleKind::Bold,
                    at: 5,
                },
            ]
        );
    }
}
