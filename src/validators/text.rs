//! Text helpers shared by the built-in validators
//!
//! All offsets are byte offsets into the evaluated text and always fall on
//! UTF-8 character boundaries (they come from regex matches or char scans).

use regex::Regex;
use serde::Serialize;

/// A half-open byte range `[start, end)` inside a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Sort spans and merge the ones that overlap or touch
pub fn merge_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort();
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

/// Replace every span with the string produced by `replacement`.
///
/// Overlapping spans are merged first; the replacement closure sees the merged span.
pub fn replace_spans<F>(text: &str, spans: &[Span], mut replacement: F) -> String
where
    F: FnMut(Span) -> String,
{
    let merged = merge_spans(spans.to_vec());
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in merged {
        if span.start > text.len() || span.end > text.len() {
            continue;
        }
        out.push_str(&text[cursor..span.start]);
        out.push_str(&replacement(span));
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Remove spans, each taking one neighbouring space or tab with it.
///
/// The space before a span is preferred; text outside the widened spans is
/// kept byte for byte.
pub fn remove_spans(text: &str, spans: &[Span]) -> String {
    let bytes = text.as_bytes();
    let mut widened = Vec::with_capacity(spans.len());
    let mut cursor = 0;
    for span in merge_spans(spans.to_vec()) {
        if span.start >= span.end || span.end > bytes.len() {
            continue;
        }
        let mut removed = span;
        if span.start > cursor && is_blank(bytes[span.start - 1]) {
            removed.start -= 1;
        } else if span.end < bytes.len() && is_blank(bytes[span.end]) {
            removed.end += 1;
        }
        cursor = removed.end;
        widened.push(removed);
    }
    replace_spans(text, &widened, |_| String::new())
}

fn is_blank(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Split text into sentence spans.
///
/// A sentence ends after `.`, `!` or `?` followed by whitespace, or at a
/// newline. Spans exclude surrounding whitespace; empty sentences are dropped.
pub fn sentence_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        let boundary = match ch {
            '\n' => Some(idx),
            '.' | '!' | '?' => match chars.peek() {
                Some((_, next)) if next.is_whitespace() => Some(idx + ch.len_utf8()),
                None => Some(idx + ch.len_utf8()),
                _ => None,
            },
            _ => None,
        };
        if let Some(end) = boundary {
            push_trimmed(text, start, end, &mut spans);
            start = end;
        }
    }
    push_trimmed(text, start, text.len(), &mut spans);
    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<Span>) {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if !trimmed.is_empty() {
        spans.push(Span::new(start + lead, start + lead + trimmed.len()));
    }
}

/// Lowercased alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "but", "not", "you", "your", "with", "this",
    "that", "from", "has", "have", "had", "its", "it's", "into", "than", "then", "they",
    "them", "their", "there", "what", "when", "which", "who", "will", "would", "can", "could",
    "should", "also", "been", "being", "our", "out", "all", "any", "each", "about", "over",
    "such", "only", "some", "more", "most", "very", "is", "in", "of", "to", "a", "an", "on",
    "at", "by", "as", "be", "or", "it",
];

/// Tokens that carry meaning (stopwords and very short tokens removed)
pub fn content_tokens(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() > 2 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Compile a case-insensitive whole-word matcher for a phrase
pub fn word_regex(phrase: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase.trim())))
}

/// All whole-word occurrences of `phrase` in `text`
pub fn find_phrase(text: &str, phrase: &str) -> Vec<Span> {
    match word_regex(phrase) {
        Ok(re) => re
            .find_iter(text)
            .map(|m| Span::new(m.start(), m.end()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overlapping() {
        let merged = merge_spans(vec![Span::new(5, 8), Span::new(0, 3), Span::new(2, 6)]);
        assert_eq!(merged, vec![Span::new(0, 8)]);
    }

    #[test]
    fn test_replace_spans() {
        let text = "call 555-1234 now";
        let out = replace_spans(text, &[Span::new(5, 13)], |_| "<PHONE>".to_string());
        assert_eq!(out, "call <PHONE> now");
    }

    #[test]
    fn test_remove_spans_takes_one_neighbouring_space() {
        let text = "hello darn world.";
        let out = remove_spans(text, &[Span::new(6, 10)]);
        assert_eq!(out, "hello world.");

        let text = "keep this. drop this.";
        let out = remove_spans(text, &[Span::new(11, 21)]);
        assert_eq!(out, "keep this.");

        let text = "A. B. C.";
        let out = remove_spans(text, &[Span::new(0, 2), Span::new(3, 5)]);
        assert_eq!(out, "C.");
    }

    #[test]
    fn test_remove_spans_keeps_layout_elsewhere() {
        let text = "def f():\n    return  1  # spam\n\tdone";
        let spans = find_phrase(text, "spam");
        assert_eq!(remove_spans(text, &spans), "def f():\n    return  1  #\n\tdone");

        let text = "    spam  rest";
        assert_eq!(remove_spans(text, &find_phrase(text, "spam")), "     rest");
    }

    #[test]
    fn test_sentence_spans() {
        let text = "First one. Second one!  Third\nFourth v1.2 here";
        let spans = sentence_spans(text);
        let sentences: Vec<&str> = spans.iter().map(|s| s.slice(text)).collect();
        assert_eq!(
            sentences,
            vec!["First one.", "Second one!", "Third", "Fourth v1.2 here"]
        );
    }

    #[test]
    fn test_content_tokens_drop_stopwords() {
        let tokens = content_tokens("The Eiffel Tower is in Paris");
        assert_eq!(tokens, vec!["eiffel", "tower", "paris"]);
    }

    #[test]
    fn test_find_phrase_whole_words() {
        let spans = find_phrase("Scunthorpe has a gun; guns too", "gun");
        assert_eq!(spans, vec![Span::new(17, 20)]);
    }
}
