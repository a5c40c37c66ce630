//! Range utilities over the buffer.

use ropey::Rope;

/// Zero-width marker that keeps an otherwise empty paragraph addressable.
pub const ZWS: char = '\u{200B}';

/// [`ZWS`] as a string slice.
pub const ZWS_STR: &str = "\u{200B}";

/// Placeholder char carrying an inline image.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// [`OBJECT_REPLACEMENT`] as a string slice.
pub const OBJECT_REPLACEMENT_STR: &str = "\u{FFFC}";

/// Expand `[start, end]` to the enclosing paragraphs, excluding the trailing `\n`.
pub fn paragraph_bounds(rope: &Rope, start: usize, end: usize) -> (usize, usize) {
    let len = rope.len_chars();
    let mut start = start.min(len);
    let mut end = end.min(len).max(start);

    let mut backward = rope.chars_at(start);
    while let Some(c) = backward.prev() {
        if c == '\n' {
            break;
        }
        start -= 1;
    }

    for c in rope.chars_at(end) {
        if c == '\n' {
            break;
        }
        end += 1;
    }

    (start, end)
}

/// Clamp `[start, end)` to the buffer and order it.
pub fn safe_bounds(len: usize, start: usize, end: usize) -> (usize, usize) {
    let start = start.min(len);
    let end = end.min(len);
    (start.min(end), start.max(end))
}

/// The whitespace-delimited word around `index`, with its range.
pub fn word_at(rope: &Rope, index: usize) -> Option<(String, usize, usize)> {
    let len = rope.len_chars();
    if index > len {
        return None;
    }

    let mut start = index;
    let mut backward = rope.chars_at(index);
    while let Some(c) = backward.prev() {
        if c.is_whitespace() {
            break;
        }
        start -= 1;
    }

    let mut end = index;
    for c in rope.chars_at(index) {
        if c.is_whitespace() {
            break;
        }
        end += 1;
    }

    Some((rope.slice(start..end).to_string(), start, end))
}

/// Every whitespace-delimited word touching `[start, end]`, with its range.
///
/// The range is first widened to the words around both ends.
pub fn words_in(rope: &Rope, start: usize, end: usize) -> Vec<(String, usize, usize)> {
    let (start, end) = safe_bounds(rope.len_chars(), start, end);
    let from = word_at(rope, start).map_or(start, |(_, s, _)| s);
    let to = word_at(rope, end).map_or(end, |(_, _, e)| e);

    let mut words = Vec::new();
    let mut word_start = from;
    let mut word = String::new();
    for (offset, c) in (from..to).zip(rope.slice(from..to).chars()) {
        if c.is_whitespace() {
            if !word.is_empty() {
                words.push((std::mem::take(&mut word), word_start, offset));
            }
            word_start = offset + 1;
        } else {
            word.push(c);
        }
    }
    if !word.is_empty() {
        words.push((word, word_start, to));
    }
    words
}

/// Offsets of every [`ZWS`] in `[start, end)`, ascending.
pub fn zws_positions(rope: &Rope, start: usize, end: usize) -> Vec<usize> {
    let (start, end) = safe_bounds(rope.len_chars(), start, end);
    rope.slice(start..end)
        .chars()
        .enumerate()
        .filter(|(_, c)| *c == ZWS)
        .map(|(i, _)| start + i)
        .collect()
}

/// Map an offset that ignores [`ZWS`] markers onto a buffer offset.
///
/// The result is the buffer position right after `visible` non-marker chars, skipping any
/// markers that immediately follow.
pub fn visible_to_buffer(rope: &Rope, visible: usize) -> usize {
    let mut seen = 0;
    let mut pos = 0;
    for c in rope.chars() {
        if c != ZWS {
            if seen == visible {
                break;
            }
            seen += 1;
        }
        pos += 1;
    }
    pos
}
