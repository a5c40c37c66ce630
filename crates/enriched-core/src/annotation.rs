//! Annotations and the annotation store.
//!
//! Annotations are kept in a vector sorted by start offset, with a prefix maximum of end offsets
//! so overlap queries can stop scanning early. Offsets are char offsets into the document
//! buffer; ranges are half-open.
//!
//! Queries follow span semantics: a non-empty query `[start, end)` returns annotations that
//! strictly overlap it, while an empty query at `pos` also returns annotations that merely touch
//! `pos` with either edge.

use std::collections::BTreeMap;

use crate::config::Rgba;
use crate::styles::{StyleCategory, StyleKind};

/// Stable identifier of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotationId(u64);

/// A style together with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Style {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Underlined text.
    Underline,
    /// Struck-through text.
    Strikethrough,
    /// Inline code.
    InlineCode,
    /// Text color.
    Color(Rgba),
    /// Heading level 1.
    H1,
    /// Heading level 2.
    H2,
    /// Heading level 3.
    H3,
    /// Heading level 4.
    H4,
    /// Heading level 5.
    H5,
    /// Heading level 6.
    H6,
    /// Block quote.
    BlockQuote,
    /// Code block.
    CodeBlock,
    /// Ordered list item with its 1-based index.
    OrderedList {
        /// Position within the list, starting at 1.
        index: usize,
    },
    /// Unordered list item.
    UnorderedList,
    /// Checkbox list item.
    CheckboxList {
        /// Whether the box is ticked.
        checked: bool,
    },
    /// Hyperlink.
    Link {
        /// Target URL.
        url: String,
    },
    /// Inline image occupying one placeholder char.
    Image {
        /// Image source.
        src: String,
        /// Display width.
        width: u32,
        /// Display height.
        height: u32,
    },
    /// Resolved mention.
    Mention {
        /// Indicator the mention was started with.
        indicator: String,
        /// Display text.
        text: String,
        /// Extra host attributes.
        attributes: BTreeMap<String, String>,
    },
}

impl Style {
    /// Identity of this style.
    pub fn kind(&self) -> StyleKind {
        match self {
            Style::Bold => StyleKind::Bold,
            Style::Italic => StyleKind::Italic,
            Style::Underline => StyleKind::Underline,
            Style::Strikethrough => StyleKind::Strikethrough,
            Style::InlineCode => StyleKind::InlineCode,
            Style::Color(_) => StyleKind::Color,
            Style::H1 => StyleKind::H1,
            Style::H2 => StyleKind::H2,
            Style::H3 => StyleKind::H3,
            Style::H4 => StyleKind::H4,
            Style::H5 => StyleKind::H5,
            Style::H6 => StyleKind::H6,
            Style::BlockQuote => StyleKind::BlockQuote,
            Style::CodeBlock => StyleKind::CodeBlock,
            Style::OrderedList { .. } => StyleKind::OrderedList,
            Style::UnorderedList => StyleKind::UnorderedList,
            Style::CheckboxList { .. } => StyleKind::CheckboxList,
            Style::Link { .. } => StyleKind::Link,
            Style::Image { .. } => StyleKind::Image,
            Style::Mention { .. } => StyleKind::Mention,
        }
    }

    /// The style of a kind that carries no payload, or a default payload for list kinds.
    ///
    /// Returns `None` for color, link, image and mention, which need caller-provided data.
    pub fn plain(kind: StyleKind) -> Option<Style> {
        let style = match kind {
            StyleKind::Bold => Style::Bold,
            StyleKind::Italic => Style::Italic,
            StyleKind::Underline => Style::Underline,
            StyleKind::Strikethrough => Style::Strikethrough,
            StyleKind::InlineCode => Style::InlineCode,
            StyleKind::H1 => Style::H1,
            StyleKind::H2 => Style::H2,
            StyleKind::H3 => Style::H3,
            StyleKind::H4 => Style::H4,
            StyleKind::H5 => Style::H5,
            StyleKind::H6 => Style::H6,
            StyleKind::BlockQuote => Style::BlockQuote,
            StyleKind::CodeBlock => Style::CodeBlock,
            StyleKind::OrderedList => Style::OrderedList { index: 1 },
            StyleKind::UnorderedList => Style::UnorderedList,
            StyleKind::CheckboxList => Style::CheckboxList { checked: false },
            StyleKind::Color | StyleKind::Link | StyleKind::Image | StyleKind::Mention => {
                return None;
            }
        };
        Some(style)
    }
}

/// A style applied to `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    id: AnnotationId,
    style: Style,
    start: usize,
    end: usize,
}

impl Annotation {
    /// Stable identifier.
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Style and payload.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Identity of the style.
    pub fn kind(&self) -> StyleKind {
        self.style.kind()
    }

    /// Inclusive start offset.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of chars covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false for stored annotations.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn matches(&self, start: usize, end: usize) -> bool {
        if start == end {
            self.start <= start && start <= self.end
        } else {
            self.start < end && self.end > start
        }
    }
}

/// Sorted collection of annotations.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    /// Kept sorted by start offset.
    annotations: Vec<Annotation>,
    /// `prefix_max_end[i] = max(annotations[0..=i].end)`
    prefix_max_end: Vec<usize>,
    next_id: u64,
    /// Smallest offset at which an ordered list item appeared or vanished.
    ordered_list_touched: Option<usize>,
}

impl AnnotationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn rebuild_prefix_max_end_from(&mut self, start_idx: usize) {
        self.prefix_max_end.resize(self.annotations.len(), 0);
        let mut max_end = match start_idx {
            0 => 0,
            idx => self.prefix_max_end[idx - 1],
        };
        for (idx, annotation) in self.annotations.iter().enumerate().skip(start_idx) {
            max_end = max_end.max(annotation.end);
            self.prefix_max_end[idx] = max_end;
        }
    }

    fn touch(&mut self, kind: StyleKind, at: usize) {
        if kind == StyleKind::OrderedList {
            self.ordered_list_touched = Some(self.ordered_list_touched.map_or(at, |t| t.min(at)));
        }
    }

    /// Insert an annotation. Empty ranges are ignored.
    pub fn insert(&mut self, style: Style, start: usize, end: usize) -> Option<AnnotationId> {
        if start >= end {
            return None;
        }
        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        self.touch(style.kind(), start);

        let pos = self.annotations.partition_point(|a| a.start <= start);
        self.annotations.insert(
            pos,
            Annotation {
                id,
                style,
                start,
                end,
            },
        );
        self.rebuild_prefix_max_end_from(pos);
        Some(id)
    }

    /// Remove an annotation by id.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let pos = self.annotations.iter().position(|a| a.id == id)?;
        let removed = self.annotations.remove(pos);
        self.touch(removed.kind(), removed.start);
        self.rebuild_prefix_max_end_from(pos);
        Some(removed)
    }

    /// Look up an annotation.
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Replace the payload of an annotation, keeping its range.
    pub fn set_style(&mut self, id: AnnotationId, style: Style) -> bool {
        let Some(pos) = self.annotations.iter().position(|a| a.id == id) else {
            return false;
        };
        let annotation = &mut self.annotations[pos];
        let (old_kind, new_kind, start) = (annotation.kind(), style.kind(), annotation.start);
        annotation.style = style;
        if old_kind != new_kind {
            self.touch(old_kind, start);
            self.touch(new_kind, start);
        }
        true
    }

    /// Annotations of `kind` matching `[start, end)`, ordered by start.
    pub fn query(&self, kind: StyleKind, start: usize, end: usize) -> Vec<Annotation> {
        self.overlapping(start, end)
            .into_iter()
            .filter(|a| a.kind() == kind)
            .cloned()
            .collect()
    }

    /// All annotations matching `[start, end)`, ordered by start.
    pub fn overlapping(&self, start: usize, end: usize) -> Vec<&Annotation> {
        let (start, end) = (start.min(end), start.max(end));
        let search_end = self.annotations.partition_point(|a| a.start <= end);

        let mut result = Vec::new();
        for i in (0..search_end).rev() {
            // Nothing before `i` reaches `start`.
            if self.prefix_max_end[i] < start {
                break;
            }
            let annotation = &self.annotations[i];
            if annotation.matches(start, end) {
                result.push(annotation);
            }
        }
        result.reverse();
        result
    }

    /// Whether any annotation of `kind` matches `[start, end)`.
    pub fn any(&self, kind: StyleKind, start: usize, end: usize) -> bool {
        self.overlapping(start, end)
            .iter()
            .any(|a| a.kind() == kind)
    }

    /// Every annotation, ordered by start.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// Every annotation of `kind`, ordered by start.
    pub fn of_kind(&self, kind: StyleKind) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.kind() == kind)
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Remove every annotation.
    pub fn clear(&mut self) {
        for annotation in std::mem::take(&mut self.annotations) {
            self.touch(annotation.kind(), annotation.start);
        }
        self.prefix_max_end.clear();
    }

    /// Offset from which ordered lists must be renumbered, resetting the marker.
    pub fn take_ordered_list_touched(&mut self) -> Option<usize> {
        self.ordered_list_touched.take()
    }

    /// Shift annotations after `delta` chars were inserted at `pos`.
    ///
    /// An insertion at either edge of an annotation does not grow it.
    pub fn update_for_insertion(&mut self, pos: usize, delta: usize) {
        if delta == 0 {
            return;
        }
        for annotation in &mut self.annotations {
            if annotation.start >= pos {
                annotation.start += delta;
                annotation.end += delta;
            } else if annotation.end > pos {
                annotation.end += delta;
            }
        }
        self.rebuild_prefix_max_end_from(0);
    }

    /// Shift and clip annotations after `[start, end)` was deleted.
    ///
    /// Annotations left empty are dropped, and inline annotations of one style that now touch
    /// at `start` are joined.
    pub fn update_for_deletion(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let delta = end - start;
        let mut pruned = Vec::new();

        for annotation in &mut self.annotations {
            if annotation.end <= start {
                continue;
            } else if annotation.start >= end {
                annotation.start -= delta;
                annotation.end -= delta;
            } else if annotation.start >= start && annotation.end <= end {
                pruned.push(annotation.id);
            } else if annotation.start < start && annotation.end > end {
                annotation.end -= delta;
            } else if annotation.start < start {
                annotation.end = start;
            } else {
                annotation.start = start;
                annotation.end -= delta;
            }
        }

        if !pruned.is_empty() {
            let mut kept = Vec::with_capacity(self.annotations.len());
            for annotation in std::mem::take(&mut self.annotations) {
                if pruned.contains(&annotation.id) {
                    self.touch(annotation.kind(), start);
                } else {
                    kept.push(annotation);
                }
            }
            self.annotations = kept;
        }
        self.join_touching_at(start);
        self.rebuild_prefix_max_end_from(0);
    }

    fn join_touching_at(&mut self, at: usize) {
        let mut idx = 0;
        while idx < self.annotations.len() {
            let right = &self.annotations[idx];
            let left = (right.start == at && right.kind().category() == StyleCategory::Inline)
                .then(|| {
                    self.annotations[..idx]
                        .iter()
                        .position(|a| a.end == at && a.style == right.style)
                })
                .flatten();
            match left {
                Some(left) => {
                    let right = self.annotations.remove(idx);
                    self.annotations[left].end = right.end;
                }
                None => idx += 1,
            }
        }
    }

    /// Clip every annotation to `len`, dropping the ones left empty.
    pub fn clamp(&mut self, len: usize) {
        let mut touched = Vec::new();
        self.annotations.retain_mut(|annotation| {
            annotation.start = annotation.start.min(len);
            annotation.end = annotation.end.min(len);
            if annotation.start == annotation.end {
                touched.push((annotation.kind(), annotation.start));
                false
            } else {
                true
            }
        });
        for (kind, at) in touched {
            self.touch(kind, at);
        }
        self.rebuild_prefix_max_end_from(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(store: &AnnotationStore, kind: StyleKind) -> Vec<(usize, usize)> {
        store.of_kind(kind).map(|a| (a.start(), a.end())).collect()
    }

    #[test]
    fn test_insert_keeps_sorted_and_ignores_empty() {
        let mut store = AnnotationStore::new();
        store.insert(Style::Bold, 10, 20);
        store.insert(Style::Bold, 0, 5);
        assert!(store.insert(Style::Bold, 7, 7).is_none());
        assert_eq!(ranges(&store, StyleKind::Bold), vec![(0, 5), (10, 20)]);
    }

    #[test]
    fn test_query_strict_overlap_for_ranges() {
        let mut store = AnnotationStore::new();
        store.insert(Style::Bold, 0, 5);
        store.insert(Style::Bold, 5, 8);
        let hits = store.query(StyleKind::Bold, 5, 6);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start(), 5);
        assert!(store.query(StyleKind::Italic, 0, 10).is_empty());
    }

    #[test]
    fn test_query_touching_for_points() {
        let mut store = AnnotationStore::new();
        store.insert(Style::Bold, 0, 5);
        store.insert(Style::Bold, 5, 8);
        assert_eq!(store.query(StyleKind::Bold, 5, 5).len(), 2);
        assert_eq!(store.query(StyleKind::Bold, 0, 0).len(), 1);
        assert!(store.query(StyleKind::Bold, 9, 9).is_empty());
    }

    #[test]
    fn test_query_prunes_with_long_annotation_first() {
        let mut store = AnnotationStore::new();
        store.insert(Style::BlockQuote, 0, 100);
        for i in 0..10 {
            store.insert(Style::Bold, i * 3, i * 3 + 1);
        }
        let hits = store.overlapping(50, 51);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind(), StyleKind::BlockQuote);
    }

    #[test]
    fn test_insertion_is_exclusive_at_both_edges() {
        let mut store = AnnotationStore::new();
        store.insert(Style::Bold, 2, 5);
        store.update_for_insertion(5, 3);
        assert_eq!(ranges(&store, StyleKind::Bold), vec![(2, 5)]);
        store.update_for_insertion(2, 1);
        assert_eq!(ranges(&store, StyleKind::Bold), vec![(3, 6)]);
        store.update_for_insertion(4, 2);
        assert_eq!(ranges(&store, StyleKind::Bold), vec![(3, 8)]);
    }

    #[test]
    fn test_deletion_clips_and_prunes() {
        let mut store = AnnotationStore::new();
        store.insert(Style::Bold, 0, 4);
        store.insert(Style::Italic, 5, 6);
        store.insert(Style::Underline, 3, 10);
        store.update_for_deletion(2, 7);
        assert_eq!(ranges(&store, StyleKind::Bold), vec![(0, 2)]);
        assert!(ranges(&store, StyleKind::Italic).is_empty());
        assert_eq!(ranges(&store, StyleKind::Underline), vec![(2, 5)]);
    }

    #[test]
    fn test_deletion_joins_touching_inline_annotations() {
        let mut store = AnnotationStore::new();
        store.insert(Style::Bold, 0, 1);
        store.insert(Style::Bold, 3, 5);
        store.insert(Style::Color(Rgba(0xff0000ff)), 0, 1);
        store.insert(Style::Color(Rgba(0x0000ffff)), 3, 5);
        store.insert(Style::OrderedList { index: 1 }, 0, 1);
        store.insert(Style::OrderedList { index: 1 }, 3, 5);
        store.update_for_deletion(1, 3);

        assert_eq!(ranges(&store, StyleKind::Bold), vec![(0, 3)]);
        assert_eq!(ranges(&store, StyleKind::Color), vec![(0, 1), (1, 3)]);
        assert_eq!(ranges(&store, StyleKind::OrderedList), vec![(0, 1), (1, 3)]);
    }

    #[test]
    fn test_ordered_list_changes_are_tracked() {
        let mut store = AnnotationStore::new();
        store.insert(Style::Bold, 0, 3);
        assert_eq!(store.take_ordered_list_touched(), None);

        let id = store
            .insert(Style::OrderedList { index: 1 }, 6, 9)
            .unwrap();
        store.insert(Style::OrderedList { index: 2 }, 10, 12);
        assert_eq!(store.take_ordered_list_touched(), Some(6));
        assert_eq!(store.take_ordered_list_touched(), None);

        store.set_style(id, Style::OrderedList { index: 5 });
        assert_eq!(store.take_ordered_list_touched(), None);

        store.update_for_deletion(9, 13);
        assert_eq!(store.take_ordered_list_touched(), Some(9));
        store.remove(id);
        assert_eq!(store.take_ordered_list_touched(), Some(6));
    }

    #[test]
    fn test_clamp_drops_out_of_range() {
        let mut store = AnnotationStore::new();
        store.insert(Style::Bold, 0, 4);
        store.insert(Style::Italic, 6, 9);
        store.clamp(5);
        assert_eq!(ranges(&store, StyleKind::Bold), vec![(0, 4)]);
        assert_eq!(store.len(), 1);
    }
}
