//! Inline style engine.
//!
//! Character-level styles never overlap another annotation of the same kind: applying a style
//! next to an existing one absorbs it, and toggling over a partially styled range splits or
//! grows the existing annotations instead of stacking new ones. Text color follows the same
//! rule per color value, with differently colored ranges split before a new color is painted.

use crate::annotation::Style;
use crate::config::Rgba;
use crate::editor::EnrichedEditor;
use crate::range;
use crate::styles::StyleKind;
use crate::typing::PendingColor;

impl EnrichedEditor {
    /// Annotate `[start, end)` with `kind`, absorbing same-kind annotations that touch it.
    pub(crate) fn set_inline_span(&mut self, kind: StyleKind, start: usize, end: usize) {
        let len = self.doc.len();
        let (start, end) = range::safe_bounds(len, start, end);
        if start >= end {
            return;
        }
        let Some(style) = Style::plain(kind) else {
            return;
        };

        let mut minimum = start;
        let mut maximum = end;
        if start > 0 {
            for annotation in self.doc.query(kind, start - 1, start) {
                minimum = minimum.min(annotation.start());
            }
        }
        if end < len {
            for annotation in self.doc.query(kind, end, end + 1) {
                maximum = maximum.max(annotation.end());
            }
        }

        for annotation in self.doc.query(kind, minimum, maximum) {
            self.doc.remove_annotation(annotation.id());
        }
        self.doc.add_annotation(style, minimum, maximum);
    }

    /// Toggle `kind` over a non-empty range.
    fn set_and_merge(&mut self, kind: StyleKind, start: usize, end: usize) {
        let annotations = self.doc.query(kind, start, end);
        if annotations.is_empty() {
            self.set_inline_span(kind, start, end);
            return;
        }

        let mut set_on_finish = false;
        for annotation in annotations {
            // Already absorbed by an earlier iteration.
            if self.doc.remove_annotation(annotation.id()).is_none() {
                continue;
            }
            let (span_start, span_end) = (annotation.start(), annotation.end());

            let remainder = if start == span_start && end == span_end {
                set_on_finish = false;
                None
            } else if start > span_start && end < span_end {
                self.set_inline_span(kind, span_start, start);
                self.set_inline_span(kind, end, span_end);
                None
            } else if start == span_start && end < span_end {
                Some((end, span_end))
            } else if start > span_start && end == span_end {
                Some((span_start, start))
            } else if start > span_start {
                Some((span_start, end))
            } else if start < span_start && end < span_end {
                Some((start, span_end))
            } else {
                set_on_finish = true;
                None
            };

            if let Some((remainder_start, remainder_end)) = remainder
                && !set_on_finish
            {
                self.set_inline_span(kind, remainder_start, remainder_end);
            }
        }

        if set_on_finish {
            self.set_inline_span(kind, start, end);
        }
    }

    /// Toggle an inline kind for the selection.
    ///
    /// A caret only flips the typing state; a range is styled or unstyled in the buffer.
    pub(crate) fn toggle_inline(&mut self, kind: StyleKind) {
        let (start, end) = self.inline_selection();
        if start == end {
            let pending = match self.typing.get(kind) {
                Some(_) => None,
                None => Some(start),
            };
            self.typing.set(kind, pending);
            return;
        }

        self.set_and_merge(kind, start, end);
        self.validate_styles();
    }

    /// Remove every `kind` annotation intersecting `[start, end)`.
    pub(crate) fn remove_inline(&mut self, kind: StyleKind, start: usize, end: usize) -> bool {
        let annotations = self.doc.query(kind, start, end);
        for annotation in &annotations {
            self.doc.remove_annotation(annotation.id());
        }
        !annotations.is_empty()
    }

    /// Extend pending inline styles over freshly typed text ending at `end_cursor`.
    pub(crate) fn inline_after_edit(&mut self, end_cursor: usize) {
        for kind in StyleKind::TOGGLEABLE_INLINE {
            let Some(start) = self.typing.get(kind) else {
                continue;
            };
            if start >= end_cursor {
                continue;
            }

            let mut end = end_cursor;
            for annotation in self.doc.query(kind, start, end) {
                end = end.max(annotation.end());
                self.doc.remove_annotation(annotation.id());
            }
            self.set_inline_span(kind, start, end);
        }
    }

    fn color_ranges(&self, start: usize, end: usize) -> Vec<(usize, usize, Rgba)> {
        self.doc
            .query(StyleKind::Color, start, end)
            .into_iter()
            .filter_map(|a| match a.style() {
                Style::Color(color) => Some((a.start(), a.end(), *color)),
                _ => None,
            })
            .collect()
    }

    /// Drop colors intersecting `[start, end)` and return the parts outside it.
    fn split_colors(&mut self, start: usize, end: usize) -> Vec<(usize, usize, Rgba)> {
        let mut remainders = Vec::new();
        for annotation in self.doc.query(StyleKind::Color, start, end) {
            let Style::Color(color) = *annotation.style() else {
                continue;
            };
            self.doc.remove_annotation(annotation.id());
            if annotation.start() < start {
                remainders.push((annotation.start(), start, color));
            }
            if annotation.end() > end {
                remainders.push((end, annotation.end(), color));
            }
        }
        remainders
    }

    fn merge_adjacent_colors(&mut self) {
        loop {
            let colors: Vec<_> = self
                .doc
                .annotations()
                .of_kind(StyleKind::Color)
                .map(|a| (a.id(), a.start(), a.end(), a.style().clone()))
                .collect();

            let pair = colors.windows(2).find_map(|pair| {
                let (current, next) = (&pair[0], &pair[1]);
                (current.2 == next.1 && current.3 == next.3).then(|| (current.clone(), next.clone()))
            });
            let Some((current, next)) = pair else {
                return;
            };

            self.doc.remove_annotation(current.0);
            self.doc.remove_annotation(next.0);
            self.doc.add_annotation(current.3, current.1, next.2);
        }
    }

    /// Paint `[start, end)` in `color`, keeping other colors outside it.
    fn paint_color(&mut self, start: usize, end: usize, color: Rgba) {
        if start >= end {
            return;
        }
        for (remainder_start, remainder_end, existing) in self.split_colors(start, end) {
            self.doc
                .add_annotation(Style::Color(existing), remainder_start, remainder_end);
        }
        self.doc.add_annotation(Style::Color(color), start, end);
        self.merge_adjacent_colors();
    }

    fn remove_color_range(&mut self, start: usize, end: usize) -> bool {
        let had_color = !self.color_ranges(start, end).is_empty();
        for (remainder_start, remainder_end, color) in self.split_colors(start, end) {
            self.doc
                .add_annotation(Style::Color(color), remainder_start, remainder_end);
        }
        had_color
    }

    fn is_fully_colored_with(&self, start: usize, end: usize, color: Rgba) -> bool {
        let ranges = self.color_ranges(start, end);
        if ranges.is_empty() || ranges.iter().any(|(_, _, c)| *c != color) {
            return false;
        }
        let min_start = ranges.iter().map(|(s, _, _)| *s).min().unwrap_or(start);
        let max_end = ranges.iter().map(|(_, e, _)| *e).max().unwrap_or(end);
        min_start <= start && max_end >= end
    }

    /// Paint the selection, or arm a typing color at a caret.
    ///
    /// Painting a range that already has exactly this color removes it instead.
    pub(crate) fn set_color_internal(&mut self, color: Rgba) {
        let (start, end) = self.inline_selection();
        if start == end {
            let pending = match self.typing.color() {
                Some(pending) if pending.color == color => None,
                _ => Some(PendingColor { start, color }),
            };
            self.typing.set_color(pending);
            return;
        }

        if self.is_fully_colored_with(start, end, color) {
            self.remove_color_range(start, end);
        } else {
            self.paint_color(start, end, color);
        }
        self.typing.set_color(None);
        self.validate_styles();
    }

    /// Remove color from the selection, or disarm the typing color at a caret.
    pub(crate) fn remove_color_internal(&mut self) -> bool {
        let (start, end) = self.inline_selection();
        if start == end {
            let had_pending = self.typing.color().is_some();
            self.typing.set_color(None);
            return had_pending;
        }

        let removed = self.remove_color_range(start, end);
        self.typing.set_color(None);
        self.validate_styles();
        removed
    }

    /// Remove color from `[start, end)`, keeping it outside the range.
    pub(crate) fn remove_color_in(&mut self, start: usize, end: usize) -> bool {
        self.remove_color_range(start, end)
    }

    /// Paint text typed since the pending color's start.
    pub(crate) fn apply_typing_color(&mut self, cursor: usize) {
        let Some(pending) = self.typing.color() else {
            return;
        };
        self.paint_color(pending.start, cursor, pending.color);
        self.typing.set_color(Some(PendingColor {
            start: cursor,
            color: pending.color,
        }));
    }

    /// Uniform color of the selection, if any.
    pub(crate) fn selection_color(&self) -> Option<Rgba> {
        if let Some(pending) = self.typing.color() {
            return Some(pending.color);
        }

        let (start, end) = self.inline_selection();
        let ranges = self.color_ranges(start, end);
        if start == end {
            return ranges
                .into_iter()
                .find(|(s, e, _)| *s < start && start <= *e)
                .map(|(_, _, color)| color);
        }
        match ranges.as_slice() {
            [(s, e, color)] if *s <= start && *e >= end => Some(*color),
            _ => None,
        }
    }
}
