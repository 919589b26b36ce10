//! Protect math spans from the markdown parser.
//!
//! Runs on the raw document text before parsing. Every recognised math span
//! (`\(..\)`, `\[..\]`, `$$..$$`, `$..$`) is rewritten to the canonical
//! `\(..\)` / `\[..\]` form with each ASCII punctuation character
//! backslash-escaped, and bracketed by [`MATH_MARK`]. The parser then
//! unescapes the span back into the literal LaTeX as plain text, so `_` and
//! `*` inside math never become emphasis. The math stage picks the marked
//! spans up again after parsing.
//!
//! Regions the parser treats literally (code spans, fenced and indented
//! code, HTML blocks) are copied through untouched. A `\(` or `\[` without
//! a matching close gets its backslash doubled so the parser keeps it as
//! text; other unmatched delimiters are left as they were.

use super::MATH_MARK;

/// Rewrite math spans in `source` into their parser-safe canonical form.
pub fn preprocess_math(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + source.len() / 8);
    let mut scanner = BlockScanner::default();
    let mut chunk = String::new();

    for line in source.split_inclusive('\n') {
        match scanner.classify(line) {
            LineKind::Prose => chunk.push_str(line),
            LineKind::Literal => {
                rewrite_spans(&chunk, &mut out);
                chunk.clear();
                out.push_str(line);
            }
        }
    }
    rewrite_spans(&chunk, &mut out);

    out
}

// =============================================================================
// Block structure
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum LineKind {
    /// Paragraph-ish text where math may appear
    Prose,
    /// Blank lines, code and raw HTML; never rewritten and ends the current chunk
    Literal,
}

/// Line-level tracking of the block constructs math must not touch.
///
/// This is an approximation of CommonMark block parsing: it only needs to
/// be right about where code and HTML start and stop.
#[derive(Debug)]
struct BlockScanner {
    fence: Option<(u8, usize)>,
    in_html: bool,
    in_indented_code: bool,
    in_list: bool,
    prev_blank: bool,
}

impl Default for BlockScanner {
    fn default() -> Self {
        Self {
            fence: None,
            in_html: false,
            in_indented_code: false,
            in_list: false,
            prev_blank: true,
        }
    }
}

impl BlockScanner {
    fn classify(&mut self, line: &str) -> LineKind {
        let body = &line[quote_prefix_len(line)..];
        let trimmed = body.trim_start_matches([' ', '\t']);

        if let Some((marker, len)) = self.fence {
            if fence_run(trimmed).is_some_and(|(m, n)| m == marker && n >= len)
                && trimmed
                    .trim_start_matches(marker as char)
                    .trim()
                    .is_empty()
            {
                self.fence = None;
            }
            return LineKind::Literal;
        }

        if trimmed.trim().is_empty() {
            self.prev_blank = true;
            self.in_html = false;
            return LineKind::Literal;
        }

        if self.in_html {
            return LineKind::Literal;
        }

        let was_blank = std::mem::replace(&mut self.prev_blank, false);
        if indent_width(body) >= 4 && (self.in_indented_code || (was_blank && !self.in_list)) {
            self.in_indented_code = true;
            return LineKind::Literal;
        }
        self.in_indented_code = false;

        if let Some((marker, _)) = fence_run(trimmed) {
            let info = trimmed.trim_start_matches(marker as char);
            if marker == b'~' || !info.contains('`') {
                self.fence = fence_run(trimmed);
                return LineKind::Literal;
            }
        }

        if was_blank && starts_html_block(trimmed) {
            self.in_html = true;
            return LineKind::Literal;
        }

        if is_list_marker(trimmed) {
            self.in_list = true;
        } else if was_blank && indent_width(body) == 0 {
            self.in_list = false;
        }

        LineKind::Prose
    }
}

/// Length of the leading blockquote prefix (`> > `) of a line.
fn quote_prefix_len(line: &str) -> usize {
    let bytes = line.as_bytes();
    let mut end = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' => i += 1,
            b'>' => {
                i += 1;
                end = i;
                if bytes.get(i) == Some(&b' ') {
                    i += 1;
                    end = i;
                }
            }
            _ => break,
        }
    }
    end
}

fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 4 - (width % 4),
            _ => break,
        }
    }
    width
}

/// A run of three or more backticks or tildes opening the line.
fn fence_run(trimmed: &str) -> Option<(u8, usize)> {
    let marker = *trimmed.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = trimmed.bytes().take_while(|&b| b == marker).count();
    (len >= 3).then_some((marker, len))
}

fn starts_html_block(trimmed: &str) -> bool {
    let mut bytes = trimmed.bytes();
    bytes.next() == Some(b'<')
        && bytes
            .next()
            .is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

fn is_list_marker(trimmed: &str) -> bool {
    let bytes = trimmed.as_bytes();
    match bytes.first() {
        Some(b'-' | b'*' | b'+') => matches!(bytes.get(1), Some(b' ' | b'\t')),
        Some(b) if b.is_ascii_digit() => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            matches!(bytes.get(digits), Some(b'.' | b')'))
                && matches!(bytes.get(digits + 1), Some(b' ' | b'\t'))
        }
        _ => false,
    }
}

// =============================================================================
// Span rewriting
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathKind {
    Inline,
    Display,
}

/// A located math span: `inner` is the LaTeX between the delimiters and
/// `end` the byte offset just past the closing delimiter.
struct Span {
    kind: MathKind,
    inner: (usize, usize),
    end: usize,
}

/// Rewrite the math spans in one chunk of consecutive prose lines.
///
/// Chunks never contain a blank line, so display math cannot cross one.
fn rewrite_spans(text: &str, out: &mut String) {
    let bytes = text.as_bytes();
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let span = match bytes[i] {
            b'`' => {
                let run = run_length(bytes, i, b'`');
                i = closing_backticks(bytes, i + run, run).unwrap_or(i + run);
                continue;
            }
            b'\\' => match bytes.get(i + 1) {
                Some(b'(') => find_delimiter(bytes, i + 2, b"\\)", true).map(|close| Span {
                    kind: MathKind::Inline,
                    inner: (i + 2, close),
                    end: close + 2,
                }),
                Some(b'[') => find_delimiter(bytes, i + 2, b"\\]", false).map(|close| Span {
                    kind: MathKind::Display,
                    inner: (i + 2, close),
                    end: close + 2,
                }),
                _ => None,
            },
            b'$' if bytes.get(i + 1) == Some(&b'$') => find_delimiter(bytes, i + 2, b"$$", false)
                .filter(|&close| close > i + 2)
                .map(|close| Span {
                    kind: MathKind::Display,
                    inner: (i + 2, close),
                    end: close + 2,
                }),
            b'$' => closing_dollar(bytes, i).map(|close| Span {
                kind: MathKind::Inline,
                inner: (i + 1, close),
                end: close + 1,
            }),
            _ => None,
        };

        match span {
            Some(span) => {
                push_prose(&text[copied..i], out);
                write_canonical(span.kind, &text[span.inner.0..span.inner.1], out);
                i = span.end;
                copied = i;
            }
            // Unclosed: `\\(` reads back as the literal `\(`.
            None if bytes[i] == b'\\' && matches!(bytes.get(i + 1), Some(b'(' | b'[')) => {
                push_prose(&text[copied..i], out);
                out.push('\\');
                copied = i;
                i += 2;
            }
            // A backslash always consumes the next byte, so `\\(` and `\$`
            // stay literal.
            None if bytes[i] == b'\\' => i += 2,
            None => i += 1,
        }
    }

    push_prose(&text[copied.min(text.len())..], out);
}

/// Copy prose, dropping any mark characters already in the source.
fn push_prose(text: &str, out: &mut String) {
    if text.contains(MATH_MARK) {
        out.extend(text.chars().filter(|&c| c != MATH_MARK));
    } else {
        out.push_str(text);
    }
}

fn run_length(bytes: &[u8], start: usize, byte: u8) -> usize {
    bytes[start..].iter().take_while(|&&b| b == byte).count()
}

/// Offset just past a backtick run of exactly `len` that closes a code span.
fn closing_backticks(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j] == b'`' {
            let run = run_length(bytes, j, b'`');
            if run == len {
                return Some(j + run);
            }
            j += run;
        } else {
            j += 1;
        }
    }
    None
}

/// Find `delim` at or after `from`, treating backslash pairs as a unit.
fn find_delimiter(bytes: &[u8], from: usize, delim: &[u8], single_line: bool) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j..].starts_with(delim) {
            return Some(j);
        }
        match bytes[j] {
            b'\n' if single_line => return None,
            b'\\' => j += 2,
            _ => j += 1,
        }
    }
    None
}

/// Closing `$` for an inline span opened at `open`.
///
/// The content must be non-empty with no whitespace at either edge, must
/// not cross a newline, and the closing `$` must not be followed by a
/// digit (so `$5 and $10` stays prose).
fn closing_dollar(bytes: &[u8], open: usize) -> Option<usize> {
    let first = *bytes.get(open + 1)?;
    if first.is_ascii_whitespace() || first == b'$' {
        return None;
    }

    let mut j = open + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\n' => return None,
            b'\\' => j += 2,
            b'$' => {
                let edge_ok = !bytes[j - 1].is_ascii_whitespace();
                let digit_follows = bytes.get(j + 1).is_some_and(u8::is_ascii_digit);
                if edge_ok && !digit_follows {
                    return Some(j);
                }
                j += 1;
            }
            _ => j += 1,
        }
    }
    None
}

/// Write `\(inner\)` or `\[inner\]` so that the parser reads it back verbatim.
fn write_canonical(kind: MathKind, inner: &str, out: &mut String) {
    let (open, close) = match kind {
        MathKind::Inline => ("\\\\\\(", "\\\\\\)"),
        MathKind::Display => ("\\\\\\[", "\\\\\\]"),
    };

    out.push(MATH_MARK);
    out.push_str(open);
    let mut lines = inner.split('\n').peekable();
    let mut first = true;
    while let Some(line) = lines.next() {
        let mut line = line;
        if !first {
            out.push('\n');
            let prefix = quote_prefix_len(line);
            out.push_str(&line[..prefix]);
            line = &line[prefix..];
        }
        first = false;

        // Trailing spaces would turn into a hard break.
        if lines.peek().is_some() {
            line = line.trim_end_matches([' ', '\t', '\r']);
        }

        for c in line.chars().filter(|&c| c != MATH_MARK) {
            if c.is_ascii_punctuation() {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out.push_str(close);
    out.push(MATH_MARK);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Event, Options, Parser, Tag};

    /// Parse and collect all text, failing if any emphasis was produced.
    fn parsed_text(markdown: &str) -> String {
        let mut text = String::new();
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_GFM;
        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(Tag::Emphasis | Tag::Strong) => {
                    panic!("unexpected emphasis in {markdown:?}")
                }
                Event::Text(t) => text.extend(t.chars().filter(|&c| c != MATH_MARK)),
                Event::SoftBreak => text.push('\n'),
                _ => {}
            }
        }
        text
    }

    #[test]
    fn test_paren_math_survives_parser() {
        let out = preprocess_math("See \\(a_{1} + b_{2}\\) here.\n");
        assert_eq!(
            out,
            "See \u{E000}\\\\\\(a\\_\\{1\\} \\+ b\\_\\{2\\}\\\\\\)\u{E000} here.\n"
        );
        assert_eq!(parsed_text(&out), "See \\(a_{1} + b_{2}\\) here.");
    }

    #[test]
    fn test_beta_subscript_not_emphasis() {
        let out = preprocess_math("\\(\\beta_1\\) and \\(\\beta_2\\)\n");
        assert_eq!(parsed_text(&out), "\\(\\beta_1\\) and \\(\\beta_2\\)");
    }

    #[test]
    fn test_dollar_forms_are_canonicalised() {
        let out = preprocess_math("Inline $x^*_i$ and display $$y = x*z$$.\n");
        assert_eq!(
            parsed_text(&out),
            "Inline \\(x^*_i\\) and display \\[y = x*z\\]."
        );
    }

    #[test]
    fn test_multiline_display_math() {
        let source = "$$\n\\hat{y}_i = \\beta_0 \n+ \\beta_1 x_i\n$$\n";
        let out = preprocess_math(source);
        assert_eq!(
            parsed_text(&out),
            "\\[\n\\hat{y}_i = \\beta_0\n+ \\beta_1 x_i\n\\]"
        );
    }

    #[test]
    fn test_unmatched_delimiters_pass_through() {
        for source in [
            "costs $5 and $10 today\n",
            "a $ b $ c\n",
            "$$ never closed\n",
        ] {
            assert_eq!(preprocess_math(source), source);
        }
    }

    #[test]
    fn test_unclosed_paren_and_bracket_keep_backslash() {
        let out = preprocess_math("open \\(a_b and \\[c without close\n");
        assert_eq!(out, "open \\\\(a_b and \\\\[c without close\n");
        assert_eq!(parsed_text(&out), "open \\(a_b and \\[c without close");
    }

    #[test]
    fn test_inline_math_does_not_cross_newline() {
        let out = preprocess_math("\\(a\nb\\) and $x\ny$\n");
        assert_eq!(out, "\\\\(a\nb\\) and $x\ny$\n");
    }

    #[test]
    fn test_existing_marks_are_dropped() {
        let out = preprocess_math("a\u{E000}b $x$\n");
        assert_eq!(out.matches(MATH_MARK).count(), 2);
        assert!(out.starts_with("ab "));
    }

    #[test]
    fn test_display_math_does_not_cross_blank_line() {
        let source = "$$a_1\n\nb_2$$\n";
        assert_eq!(preprocess_math(source), source);
    }

    #[test]
    fn test_escaped_delimiters_stay_literal() {
        let source = "a \\$5\\$ and \\\\(x\\\\)\n";
        assert_eq!(preprocess_math(source), source);
    }

    #[test]
    fn test_code_is_untouched() {
        let source = "Use `$x_1$` inline.\n\n```r\nlm(y ~ x, data = d) # $x_i$\n```\n\n    $indented_code$\n\n~~~\n\\(a_b\\)\n~~~\n";
        assert_eq!(preprocess_math(source), source);
    }

    #[test]
    fn test_html_block_is_untouched() {
        let source = "<div class=\"x\">\n$a_b$\n</div>\n\nAfter $a_b$.\n";
        let out = preprocess_math(source);
        assert!(out.starts_with("<div class=\"x\">\n$a_b$\n</div>\n"));
        assert!(out.ends_with("After \u{E000}\\\\\\(a\\_b\\\\\\)\u{E000}.\n"));
    }

    #[test]
    fn test_indented_list_continuation_is_prose() {
        let source = "- item\n\n    continued $a_b$\n";
        let out = preprocess_math(source);
        assert!(out.contains("\\\\\\(a\\_b\\\\\\)"));
    }

    #[test]
    fn test_first_close_wins() {
        let out = preprocess_math("\\(a\\) b\\)\n");
        assert_eq!(parsed_text(&out), "\\(a\\) b)");
    }

    #[test]
    fn test_math_in_blockquote() {
        let source = "> $$\n> a_1\n> $$\n";
        let out = preprocess_math(source);
        assert_eq!(out, "> \u{E000}\\\\\\[\n> a\\_1\n> \\\\\\]\u{E000}\n");
        assert_eq!(parsed_text(&out), "\\[\na_1\n\\]");
    }
}
