use enriched_core::{EditorConfig, EnrichedEditor, Style, StyleKind};
use pretty_assertions::assert_eq;

fn editor_with(text: &str) -> EnrichedEditor {
    let mut editor = EnrichedEditor::new(EditorConfig::default()).unwrap();
    editor.replace_text(0, 0, text);
    editor
}

fn ranges(editor: &EnrichedEditor, kind: StyleKind) -> Vec<(usize, usize)> {
    editor
        .document()
        .annotations()
        .of_kind(kind)
        .map(|a| (a.start(), a.end()))
        .collect()
}

#[test]
fn test_bold_typed_at_caret_then_deleted() {
    let mut editor = editor_with("hello world");
    editor.on_selection_changed(5, 5);

    assert!(editor.toggle_style(StyleKind::Bold));
    editor.insert_text("X");
    assert_eq!(editor.text(), "helloX world");
    assert_eq!(ranges(&editor, StyleKind::Bold), vec![(5, 6)]);

    editor.backspace();
    assert_eq!(editor.text(), "hello world");
    assert!(ranges(&editor, StyleKind::Bold).is_empty());
}

#[test]
fn test_deleting_gap_joins_bold_runs() {
    let mut editor = editor_with("abcde");
    editor.on_selection_changed(0, 1);
    editor.toggle_style(StyleKind::Bold);
    editor.on_selection_changed(3, 5);
    editor.toggle_style(StyleKind::Bold);
    assert_eq!(ranges(&editor, StyleKind::Bold), vec![(0, 1), (3, 5)]);

    editor.replace_text(1, 3, "");
    assert_eq!(editor.text(), "ade");
    assert_eq!(ranges(&editor, StyleKind::Bold), vec![(0, 3)]);
    assert!(editor.check_consistency().is_empty());
}

#[test]
fn test_block_quotes_on_adjacent_paragraphs_coalesce() {
    let mut editor = editor_with("first\nsecond");
    editor.on_selection_changed(0, 0);
    editor.toggle_style(StyleKind::BlockQuote);

    assert_eq!(editor.text(), "\u{200B}first\nsecond");

    editor.on_selection_changed(8, 8);
    editor.toggle_style(StyleKind::BlockQuote);

    assert_eq!(editor.text(), "\u{200B}first\n\u{200B}second");
    assert_eq!(ranges(&editor, StyleKind::BlockQuote), vec![(0, 14)]);
    assert!(editor.check_consistency().is_empty());
}

#[test]
fn test_range_toggle_splits_and_merges() {
    let mut editor = editor_with("abcdefgh");
    editor.on_selection_changed(0, 8);
    editor.toggle_style(StyleKind::Italic);

    editor.on_selection_changed(3, 5);
    editor.toggle_style(StyleKind::Italic);
    assert_eq!(ranges(&editor, StyleKind::Italic), vec![(0, 3), (5, 8)]);

    editor.toggle_style(StyleKind::Italic);
    assert_eq!(ranges(&editor, StyleKind::Italic), vec![(0, 8)]);
}

#[test]
fn test_list_typed_with_shortcut_and_continued() {
    let mut editor = editor_with("");
    for chunk in ["1. ", "eggs", "\n", "ham", "\n", "jam"] {
        editor.insert_text(chunk);
    }

    let indices: Vec<_> = editor
        .document()
        .annotations()
        .of_kind(StyleKind::OrderedList)
        .map(|a| a.style().clone())
        .collect();
    assert_eq!(
        indices,
        vec![
            Style::OrderedList { index: 1 },
            Style::OrderedList { index: 2 },
            Style::OrderedList { index: 3 },
        ]
    );
    assert_eq!(editor.text(), "\u{200B}eggs\n\u{200B}ham\n\u{200B}jam");
}

#[test]
fn test_code_block_rejects_inline_styles() {
    let mut editor = editor_with("");
    editor.toggle_style(StyleKind::CodeBlock);
    editor.insert_text("let x = 1;");

    let state = editor.style_state();
    assert!(state.get(StyleKind::CodeBlock).is_active);
    assert!(state.get(StyleKind::Italic).is_blocking);
    assert!(!editor.toggle_style(StyleKind::Italic));
    assert!(ranges(&editor, StyleKind::Italic).is_empty());
}

#[test]
fn test_custom_selection_skips_markers() {
    let mut editor = editor_with("a\nb\nc");
    editor.on_selection_changed(0, 5);
    editor.toggle_style(StyleKind::UnorderedList);
    assert_eq!(editor.text(), "\u{200B}a\n\u{200B}b\n\u{200B}c");

    // Visible offset 2 is the start of "b", right after its marker.
    let selection = editor.set_custom_selection(2, 3);
    assert_eq!((selection.start, selection.end), (4, 5));
}

#[test]
fn test_out_of_range_offsets_are_clamped() {
    let mut editor = editor_with("abc");
    let selection = editor.on_selection_changed(10, 2);
    assert!(selection.end <= 3);
    assert!(!editor.remove_style(StyleKind::Bold, 50, 70));
    editor.replace_text(100, 200, "!");
    assert_eq!(editor.text(), "abc!");
}
