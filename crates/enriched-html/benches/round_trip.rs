use criterion::{Criterion, black_box, criterion_group, criterion_main};
use enriched_core::{Document, Style};
use enriched_html::{from_html, to_html};

fn sample(paragraphs: usize) -> Document {
    let mut text = String::new();
    let mut styles = Vec::new();
    let mut start = 0;
    for i in 0..paragraphs {
        let line = format!("\u{200B}item {i:05} with some bold text");
        let len = line.chars().count();
        text.push_str(&line);
        text.push('\n');
        styles.push((Style::UnorderedList, start, start + len));
        styles.push((Style::Bold, start + len - 9, start + len - 5));
        start += len + 1;
    }
    text.pop();
    Document::from_parts(&text, styles)
}

fn bench_serialize(c: &mut Criterion) {
    let doc = sample(1_000);
    c.bench_function("to_html/1000_items", |b| b.iter(|| black_box(to_html(&doc))));
}

fn bench_parse(c: &mut Criterion) {
    let html = to_html(&sample(1_000));
    c.bench_function("from_html/1000_items", |b| {
        b.iter(|| black_box(from_html(&html).unwrap()))
    });
}

criterion_group!(benches, bench_serialize, bench_parse);
criterion_main!(benches);
