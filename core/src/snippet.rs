use crate::tokenizer::{strip_markup, term_spans};
use std::collections::HashSet;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetOptions {
    /// Characters kept on each side of the first match.
    pub context: usize,
    /// Wrap matched words in `<em>` tags.
    pub highlight: bool,
}

impl Default for SnippetOptions {
    fn default() -> Self { Self { context: 100, highlight: false } }
}

/// Excerpt of `text` around the first word whose term is in `query_terms`.
/// Falls back to the opening `2 * context` characters when nothing matches.
pub fn snippet(text: &str, query_terms: &HashSet<String>, options: &SnippetOptions) -> String {
    let clean = strip_markup(text).split_whitespace().collect::<Vec<_>>().join(" ");
    let hits: Vec<Range<usize>> = term_spans(&clean)
        .filter(|(term, _)| query_terms.contains(term))
        .map(|(_, range)| range)
        .collect();

    let (start, end) = match hits.first() {
        Some(first) => (
            chars_back(&clean, first.start, options.context),
            chars_forward(&clean, first.end, options.context),
        ),
        None => (0, chars_forward(&clean, 0, options.context * 2)),
    };

    let mut body = String::new();
    if options.highlight {
        let mut cursor = start;
        for hit in hits.iter().filter(|h| h.start >= start && h.end <= end) {
            body.push_str(&clean[cursor..hit.start]);
            body.push_str("<em>");
            body.push_str(&clean[hit.clone()]);
            body.push_str("</em>");
            cursor = hit.end;
        }
        body.push_str(&clean[cursor..end]);
    } else {
        body.push_str(&clean[start..end]);
    }

    let mut out = String::with_capacity(body.len() + 6);
    if start > 0 {
        out.push_str("...");
    }
    out.push_str(body.trim());
    if end < clean.len() {
        out.push_str("...");
    }
    out
}

fn chars_back(s: &str, from: usize, n: usize) -> usize {
    s[..from].char_indices().rev().take(n).last().map(|(i, _)| i).unwrap_or(from)
}

fn chars_forward(s: &str, from: usize, n: usize) -> usize {
    s[from..].char_indices().nth(n).map(|(i, _)| from + i).unwrap_or(s.len())
}
