use enriched_core::{EditorConfig, EnrichedEditor, Rgba, Style, StyleKind};
use enriched_html::{HtmlCodec, from_html, parse_text, to_html};
use pretty_assertions::assert_eq;

fn editor() -> EnrichedEditor {
    EnrichedEditor::new(EditorConfig::default()).unwrap()
}

fn spans(doc: &enriched_core::Document) -> Vec<(Style, usize, usize)> {
    doc.annotations()
        .iter()
        .map(|a| (a.style().clone(), a.start(), a.end()))
        .collect()
}

fn assert_round_trip(html: &str) {
    let doc = from_html(html).unwrap();
    assert_eq!(to_html(&doc), html);
}

#[test]
fn test_link_round_trip() {
    let html = "<html>\n<p><a href=\"https://x\">click</a></p>\n</html>";
    let doc = from_html(html).unwrap();
    assert_eq!(doc.text(), "click");
    assert_eq!(
        spans(&doc),
        vec![(
            Style::Link {
                url: "https://x".to_string()
            },
            0,
            5
        )]
    );
    assert_eq!(to_html(&doc), html);
}

#[test]
fn test_canonical_documents_round_trip() {
    assert_round_trip("<html>\n<p>plain</p>\n</html>");
    assert_round_trip("<html>\n<p>one</p>\n<br>\n<br>\n<p>two</p>\n</html>");
    assert_round_trip("<html>\n<h3>head</h3>\n<p>a&nbsp;&nbsp; b &lt;tag&gt; &amp; &#233;</p>\n</html>");
    assert_round_trip(
        "<html>\n<ul>\n<li>a</li>\n<li><b>b</b></li>\n</ul>\n<ol>\n<li>one</li>\n<li>two</li>\n</ol>\n</html>",
    );
    assert_round_trip(
        "<html>\n<ul data-type=\"checkbox\">\n<li checked>done</li>\n<li>todo</li>\n</ul>\n</html>",
    );
    assert_round_trip(
        "<html>\n<blockquote>\n<p>quoted</p>\n<p>twice</p>\n</blockquote>\n\
         <codeblock>\n<p>let x = 1;</p>\n</codeblock>\n</html>",
    );
    assert_round_trip(
        "<html>\n<p><u>u</u><s>s</s><code>c</code><font color=\"#336699ff\">blue</font></p>\n</html>",
    );
}

fn char_offset(editor: &EnrichedEditor, needle: &str) -> usize {
    let text = editor.text();
    let byte = text.find(needle).unwrap();
    text[..byte].chars().count()
}

fn select(editor: &mut EnrichedEditor, from: &str, to: &str) {
    let start = char_offset(editor, from);
    let end = char_offset(editor, to) + to.chars().count();
    editor.on_selection_changed(start, end);
}

#[test]
fn test_editor_output_survives_reload() {
    let mut source = editor();
    source.replace_text(0, 0, "Title\nfirst\nsecond\n\nbody styled tail");
    source.on_selection_changed(0, 0);
    source.toggle_style(StyleKind::H1);
    select(&mut source, "first", "second");
    source.toggle_style(StyleKind::UnorderedList);
    select(&mut source, "styled", "styled");
    source.toggle_style(StyleKind::Italic);
    select(&mut source, "tail", "tail");
    source.set_color(Rgba::new(0x11, 0x22, 0x33, 0xff));

    let html = source.value(&HtmlCodec);
    assert_eq!(
        html,
        "<html>\n<h1>Title</h1>\n<ul>\n<li>first</li>\n<li>second</li>\n</ul>\n<br>\n\
         <p>body <i>styled</i> <font color=\"#112233ff\">tail</font></p>\n</html>"
    );

    let mut target = editor();
    target.set_value(&HtmlCodec, &html);
    assert_eq!(target.text(), source.text());
    assert_eq!(spans(target.document()), spans(source.document()));
    assert_eq!(target.value(&HtmlCodec), html);
}

#[test]
fn test_list_shortcut_exports_unordered_list() {
    let mut editor = editor();
    editor.insert_text("- ");
    editor.insert_text("item");
    assert_eq!(
        editor.value(&HtmlCodec),
        "<html>\n<ul>\n<li>item</li>\n</ul>\n</html>"
    );
}

#[test]
fn test_loose_markup_is_normalized() {
    let doc = from_html(
        "<html>\n  <p>\n    Hello\n    <strong>big</strong>   <em>world</em>\n  </p>\n</html>",
    )
    .unwrap();
    assert_eq!(doc.text(), "Hello big world ");
    assert_eq!(
        spans(&doc),
        vec![(Style::Bold, 6, 9), (Style::Italic, 10, 15)]
    );
}

#[test]
fn test_parse_text_falls_back_to_plain() {
    let doc = parse_text("<html><p><font color=\"nope\">x</font></p></html>");
    assert_eq!(doc.text(), "<html><p><font color=\"nope\">x</font></p></html>");
    assert!(doc.annotations().is_empty());

    let doc = parse_text("<html>\n<h1>ok</h1>\n</html>");
    assert_eq!(doc.text(), "\u{200B}ok");
}
