//! Randomized editing sessions.
//!
//! Drives the editor with a seeded mix of typing, deletions, selection changes and style
//! toggles, checking after every step that annotations stay inside the buffer, are never empty,
//! that ordered list indices stay positive and that the document passes its consistency check.
//! After styling steps, no two annotations of one inline style may touch.

use enriched_core::{EditorConfig, EnrichedEditor, Rgba, Style, StyleCategory, StyleKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CHUNKS: [&str; 10] = ["a", "bc", " ", "\n", "- ", "1. ", "@", "x.io", "😀", "word "];

const KINDS: [StyleKind; 12] = [
    StyleKind::Bold,
    StyleKind::Italic,
    StyleKind::Underline,
    StyleKind::Strikethrough,
    StyleKind::InlineCode,
    StyleKind::H1,
    StyleKind::H3,
    StyleKind::BlockQuote,
    StyleKind::CodeBlock,
    StyleKind::OrderedList,
    StyleKind::UnorderedList,
    StyleKind::CheckboxList,
];

fn assert_invariants(editor: &EnrichedEditor, step: usize) {
    let len = editor.document().len();
    let selection = editor.selection();
    assert!(
        selection.start <= selection.end && selection.end <= len,
        "step {step}: selection {selection:?} outside 0..{len}"
    );

    for annotation in editor.document().annotations().iter() {
        assert!(
            annotation.start() < annotation.end() && annotation.end() <= len,
            "step {step}: {:?} at {}..{} outside 0..{len}",
            annotation.style(),
            annotation.start(),
            annotation.end(),
        );
        if let Style::OrderedList { index } = annotation.style() {
            assert!(*index >= 1, "step {step}: ordered index {index}");
        }
    }

    let violations = editor.check_consistency();
    assert!(violations.is_empty(), "step {step}: {violations:?}");
}

fn assert_no_touching_inline_runs(editor: &EnrichedEditor, step: usize) {
    let inline: Vec<_> = editor
        .document()
        .annotations()
        .iter()
        .filter(|a| a.kind().category() == StyleCategory::Inline)
        .collect();
    for left in &inline {
        let touching = inline
            .iter()
            .find(|right| right.start() == left.end() && right.style() == left.style());
        assert!(
            touching.is_none(),
            "step {step}: {:?} at {}..{} touches another run",
            left.style(),
            left.start(),
            left.end(),
        );
    }
}

fn run_session(seed: u64, steps: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut editor = EnrichedEditor::new(EditorConfig::default()).unwrap();

    for step in 0..steps {
        let len = editor.document().len();
        match rng.gen_range(0..10) {
            0..=3 => {
                let chunk = CHUNKS[rng.gen_range(0..CHUNKS.len())];
                editor.insert_text(chunk);
            }
            4 => {
                editor.backspace();
            }
            5 => {
                let start = rng.gen_range(0..=len);
                let end = rng.gen_range(start..=len);
                editor.replace_text(start, end, "");
            }
            6 => {
                let a = rng.gen_range(0..=len);
                let b = rng.gen_range(0..=len);
                editor.on_selection_changed(a, b);
            }
            7 | 8 => {
                let kind = KINDS[rng.gen_range(0..KINDS.len())];
                editor.toggle_style(kind);
                assert_no_touching_inline_runs(&editor, step);
            }
            _ => match rng.gen_range(0..3) {
                0 => {
                    editor.set_color(Rgba::new(rng.r#gen(), rng.r#gen(), rng.r#gen(), 0xff));
                    assert_no_touching_inline_runs(&editor, step);
                }
                1 => {
                    editor.remove_color();
                    assert_no_touching_inline_runs(&editor, step);
                }
                _ => {
                    let at = rng.gen_range(0..=len);
                    editor.toggle_checked(at);
                }
            },
        }
        assert_invariants(&editor, step);
    }
}

#[test]
fn test_random_sessions_keep_documents_consistent() {
    for seed in 0..8 {
        run_session(seed, 300);
    }
}
