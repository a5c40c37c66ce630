//! Conflict resolution between styles.
//!
//! Before a style is enabled, the [`MergingConfig`](crate::styles::MergingConfig) of its kind is
//! consulted: an active blocking style rejects the request, while conflicting styles are
//! removed from the range the new style will cover.

use tracing::warn;

use crate::editor::EnrichedEditor;
use crate::range;
use crate::styles::{StyleCategory, StyleKind};

impl EnrichedEditor {
    /// Range `kind` applies to for the current caret.
    fn target_range(&self, kind: StyleKind) -> (usize, usize) {
        let (start, end) = range::safe_bounds(self.doc.len(), self.caret.start, self.caret.end);
        match kind.category() {
            StyleCategory::Inline | StyleCategory::Parametrized => (start, end),
            StyleCategory::Paragraph | StyleCategory::List => {
                range::paragraph_bounds(self.doc.rope(), start, end)
            }
        }
    }

    /// Check whether `kind` may be applied, clearing styles that conflict with it.
    ///
    /// Disabling an active style always succeeds.
    pub(crate) fn verify_style(&mut self, kind: StyleKind) -> bool {
        let Some(config) = kind.merging_config(&self.style) else {
            return true;
        };
        if self.typing.is_active(kind) {
            return true;
        }

        if let Some(blocking) = config.blocking.iter().find(|k| self.typing.is_active(**k)) {
            warn!(%kind, blocked_by = %blocking, "style is blocked");
            self.typing.set(kind, None);
            return false;
        }

        if config.conflicting.is_empty() {
            return true;
        }

        {
            let mut tx = self.transaction();
            for other in config.conflicting {
                let (start, end) = tx.target_range(kind);
                if tx.remove_style_in(other, start, end) {
                    tx.typing.set(other, None);
                }
            }
        }
        self.sync_selection();
        true
    }

    /// Verify `kind` and toggle it for the selection.
    pub(crate) fn verify_and_toggle(&mut self, kind: StyleKind, checked: bool) -> bool {
        match kind.category() {
            StyleCategory::Inline if kind != StyleKind::Color => {
                if !self.verify_style(kind) {
                    return false;
                }
                self.toggle_inline(kind);
            }
            StyleCategory::Paragraph => {
                if !self.verify_style(kind) {
                    return false;
                }
                self.toggle_paragraph(kind);
            }
            StyleCategory::List => {
                if !self.verify_style(kind) {
                    return false;
                }
                self.toggle_list(kind, checked);
            }
            _ => {
                warn!(%kind, "style cannot be toggled");
                return false;
            }
        }
        true
    }

    /// Remove `kind` from `[start, end)`, dispatching on its category.
    pub(crate) fn remove_style_in(&mut self, kind: StyleKind, start: usize, end: usize) -> bool {
        match kind.category() {
            StyleCategory::Inline if kind == StyleKind::Color => self.remove_color_in(start, end),
            StyleCategory::Inline => self.remove_inline(kind, start, end),
            StyleCategory::Paragraph => self.remove_paragraph_spans(kind, start, end),
            StyleCategory::List => self.remove_list_spans(kind, start, end),
            StyleCategory::Parametrized => self.remove_parametrized(kind, start, end),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::annotation::Style;
    use crate::config::EditorConfig;
    use crate::editor::EnrichedEditor;
    use crate::styles::StyleKind;

    fn editor(text: &str) -> EnrichedEditor {
        let mut editor = EnrichedEditor::new(EditorConfig::default()).unwrap();
        editor.replace_text(0, 0, text);
        editor
    }

    fn kinds(editor: &EnrichedEditor) -> Vec<StyleKind> {
        editor.document().annotations().iter().map(|a| a.kind()).collect()
    }

    #[test]
    fn test_code_block_blocks_bold() {
        let mut editor = editor("");
        editor.toggle_style(StyleKind::CodeBlock);
        assert!(!editor.toggle_style(StyleKind::Bold));
        assert!(!editor.typing_state().is_active(StyleKind::Bold));
        assert!(editor.style_state().get(StyleKind::Bold).is_blocking);
    }

    #[test]
    fn test_list_replaces_heading() {
        let mut editor = editor("title");
        editor.toggle_style(StyleKind::H3);
        assert_eq!(kinds(&editor), vec![StyleKind::H3]);

        editor.toggle_style(StyleKind::UnorderedList);
        assert_eq!(kinds(&editor), vec![StyleKind::UnorderedList]);
        assert_eq!(editor.text(), "\u{200B}title");
        assert!(editor.check_consistency().is_empty());
    }

    #[test]
    fn test_inline_code_removes_link() {
        let mut editor = editor("visit example.com");
        assert_eq!(kinds(&editor), vec![StyleKind::Link]);
        editor.on_selection_changed(6, 17);
        assert!(editor.toggle_style(StyleKind::InlineCode));
        assert_eq!(kinds(&editor), vec![StyleKind::InlineCode]);
    }

    #[test]
    fn test_parametrized_kinds_are_not_toggleable() {
        let mut editor = editor("abc");
        assert!(!editor.toggle_style(StyleKind::Link));
        assert!(!editor.toggle_style(StyleKind::Color));
    }

    #[test]
    fn test_remove_style_reports_absence() {
        let mut editor = editor("abc");
        assert!(!editor.remove_style(StyleKind::Bold, 0, 3));
        editor.on_selection_changed(0, 3);
        editor.toggle_style(StyleKind::Bold);
        assert!(editor.remove_style(StyleKind::Bold, 0, 3));
        assert!(
            !editor
                .document()
                .annotations()
                .iter()
                .any(|a| *a.style() == Style::Bold)
        );
    }
}
