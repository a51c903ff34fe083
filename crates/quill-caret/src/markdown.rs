//! Marker-offset location in Markdown prose.

use quill_sigils::SigilPair;

use crate::Caret;

/// Find a safe marker offset in Markdown text.
///
/// Scans forward from the caret to the nearest alphabetic character (or
/// end of text) so the marker never lands inside emphasis delimiters, link
/// syntax, or other punctuation runs. Returns `None` for an empty document
/// or a caret beyond the text.
#[must_use]
pub fn markdown_offset(text: &str, caret: &Caret) -> Option<usize> {
    if text.is_empty() || caret.text_offset > text.len() {
        return None;
    }

    let mut offset = caret.text_offset;
    while !text.is_char_boundary(offset) {
        offset += 1;
    }

    for (index, c) in text[offset..].char_indices() {
        if c.is_alphabetic() {
            return Some(offset + index);
        }
    }

    Some(text.len())
}

/// Find a safe marker offset in Markdown with embedded script spans.
///
/// When the caret falls inside an open script span that begins on or
/// before the caret's line, the marker relocates to the span start so it
/// is spliced ahead of the expression instead of into it. Otherwise the
/// plain Markdown scan applies.
#[must_use]
pub fn scripted_markdown_offset(text: &str, caret: &Caret, scripts: &SigilPair) -> Option<usize> {
    if text.is_empty() || caret.text_offset > text.len() {
        return None;
    }

    let offset = caret.text_offset;

    // Search for script spans from the start of the caret's line.
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);

    if let Some(span_start) = enclosing_span_start(text, line_start, offset, scripts) {
        return Some(span_start);
    }

    markdown_offset(text, caret)
}

/// Start offset of the last script span opening at or before `offset`,
/// provided the caret sits inside the span.
fn enclosing_span_start(
    text: &str,
    line_start: usize,
    offset: usize,
    scripts: &SigilPair,
) -> Option<usize> {
    let began = scripts.began();
    let ended = scripts.ended();

    // Last opening delimiter between the line start and the caret.
    let mut span_start = None;
    let mut search = line_start;
    while let Some(found) = text[search..].find(began) {
        let start = search + found;
        if start >= offset {
            break;
        }
        span_start = Some(start);
        search = start + began.len();
    }

    let start = span_start?;
    let body = start + began.len();

    // Span is open through the caret when the closing delimiter ends at
    // or past the caret (or is missing entirely).
    let span_end = text[body..].find(ended).map_or(text.len(), |i| body + i);

    (offset < span_end + ended.len()).then_some(start)
}
