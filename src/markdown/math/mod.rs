//! Math support: source protection before parsing and rendering after.
//!
//! [`preprocess_math`] runs on the raw markdown and leaves every math span
//! in the canonical `\(..\)` / `\[..\]` form as literal parser text,
//! bracketed by [`MATH_MARK`]. [`MathStage`] then finds those marked spans
//! in the event stream and replaces them with KaTeX markup. Delimiters
//! without the mark (escaped or unclosed in the source) stay text.

mod preprocess;
mod render;

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

pub use preprocess::preprocess_math;
pub use render::{MathError, render_latex};

use super::stream::{EventStream, StreamEvent};
use super::transform::Transform;
use crate::util::html_escape;

/// Brackets each math span the preprocessor found (a private-use code point).
pub(crate) const MATH_MARK: char = '\u{E000}';

/// Render math markup for one span.
///
/// Failures produce a `math-error` code element carrying the source, so a
/// typo in one formula never hides the surrounding text.
pub fn math_markup(tex: &str, display: bool) -> String {
    let tex = tex.trim();
    let class = if display {
        "math math-display"
    } else {
        "math math-inline"
    };

    match render_latex(tex, display) {
        Ok(html) => format!(
            "<span class=\"{class}\" data-tex=\"{}\">{html}</span>",
            html_escape(tex)
        ),
        Err(e) => {
            tracing::debug!(tex, error = %e, "math render failed");
            format!(
                "<code class=\"math math-error\" title=\"{}\">{}</code>",
                html_escape(&e.to_string()),
                html_escape(tex)
            )
        }
    }
}

/// Replaces marked math spans in text with rendered markup.
///
/// Adjacent text and soft-break events are coalesced first, since the
/// parser splits text around escapes and display math spans lines. Runs
/// without math are re-emitted exactly as they came in. Code blocks and
/// image alt text are left alone.
pub struct MathStage;

impl Transform for MathStage {
    fn name(&self) -> &'static str {
        "math"
    }

    fn apply<'a>(&self, events: EventStream<'a>) -> EventStream<'a> {
        let mut out = Vec::with_capacity(events.len());
        let mut run: Vec<StreamEvent<'a>> = Vec::new();
        let mut literal_depth = 0usize;

        for event in events {
            let is_text = literal_depth == 0
                && matches!(
                    event,
                    StreamEvent::Markdown(Event::Text(_) | Event::SoftBreak)
                );
            if is_text {
                run.push(event);
                continue;
            }

            flush_run(&mut run, &mut out);
            match &event {
                StreamEvent::Markdown(Event::Start(Tag::CodeBlock(_) | Tag::Image { .. })) => {
                    literal_depth += 1
                }
                StreamEvent::Markdown(Event::End(TagEnd::CodeBlock | TagEnd::Image)) => {
                    literal_depth = literal_depth.saturating_sub(1)
                }
                _ => {}
            }
            out.push(event);
        }
        flush_run(&mut run, &mut out);

        out
    }
}

fn flush_run<'a>(run: &mut Vec<StreamEvent<'a>>, out: &mut EventStream<'a>) {
    if run.is_empty() {
        return;
    }

    let mut text = String::new();
    for event in run.iter() {
        match event {
            StreamEvent::Markdown(Event::Text(t)) => text.push_str(t),
            StreamEvent::Markdown(Event::SoftBreak) => text.push('\n'),
            _ => {}
        }
    }

    if !text.contains(MATH_MARK) {
        out.append(run);
        return;
    }
    run.clear();

    let mut copied = 0;
    while let Some(span) = find_span(&text, copied) {
        push_text(&text[copied..span.start], out);
        let markup = math_markup(&text[span.inner.0..span.inner.1], span.display);
        out.push(StreamEvent::Markdown(Event::InlineHtml(CowStr::from(markup))));
        copied = span.end;
    }
    push_text(&text[copied..], out);
}

/// Re-emit plain text, restoring soft breaks. Stray marks are dropped.
fn push_text<'a>(text: &str, out: &mut EventStream<'a>) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push(StreamEvent::Markdown(Event::SoftBreak));
        }
        let line: String = line.chars().filter(|&c| c != MATH_MARK).collect();
        if !line.is_empty() {
            out.push(StreamEvent::Markdown(Event::Text(CowStr::from(line))));
        }
    }
}

struct MathSpan {
    start: usize,
    inner: (usize, usize),
    end: usize,
    display: bool,
}

/// Next marked `\(..\)` or `\[..\]` span at or after `from`.
fn find_span(text: &str, from: usize) -> Option<MathSpan> {
    let mark_len = MATH_MARK.len_utf8();
    let mut search = from;
    while let Some(offset) = text[search..].find(MATH_MARK) {
        let start = search + offset;
        let open_end = start + mark_len;
        search = open_end;

        let rest = &text[open_end..];
        let (close, display) = if rest.starts_with("\\(") {
            ("\\)", false)
        } else if rest.starts_with("\\[") {
            ("\\]", true)
        } else {
            continue;
        };

        let inner_start = open_end + 2;
        let closing = format!("{close}{MATH_MARK}");
        if let Some(len) = text[inner_start..].find(&closing) {
            return Some(MathSpan {
                start,
                inner: (inner_start, inner_start + len),
                end: inner_start + len + closing.len(),
                display,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::stream::{check_balanced, from_parser};
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Options, Parser, html};

    fn render(markdown: &str) -> String {
        let source = preprocess_math(markdown);
        let events = from_parser(Parser::new_ext(&source, Options::ENABLE_TABLES));
        let events = MathStage.apply(events);
        assert_eq!(check_balanced(&events), Ok(()));

        let mut out = String::new();
        html::push_html(
            &mut out,
            events.into_iter().filter_map(|e| match e {
                StreamEvent::Markdown(event) => Some(event),
                _ => None,
            }),
        );
        out
    }

    #[test]
    fn test_inline_math_renders_katex() {
        let html = render("Slope \\(\\beta_1\\) here.\n");
        assert!(html.starts_with(
            "<p>Slope <span class=\"math math-inline\" data-tex=\"\\beta_1\"><span class=\"katex\">"
        ));
        assert!(html.ends_with("</span></span> here.</p>\n"));
        assert!(!html.contains(MATH_MARK));
    }

    #[test]
    fn test_no_emphasis_inside_math() {
        let html = render("Both \\(a_{1}\\) and \\(b_{1}\\) hold, as do $x_i$ and $y_i$.\n");
        assert!(!html.contains("<em>"));
        assert_eq!(html.matches("class=\"math math-inline\"").count(), 4);
        assert!(html.contains("data-tex=\"a_{1}\""));
        assert!(html.contains("data-tex=\"y_i\""));
    }

    #[test]
    fn test_display_math_over_lines() {
        let html = render("$$\ny_{ij} = \\beta_0\n+ e_{ij}\n$$\n");
        assert!(html.contains("<span class=\"math math-display\" data-tex=\"y_{ij} = \\beta_0"));
        assert!(html.contains("katex-display"));
    }

    #[test]
    fn test_render_error_falls_back_to_code() {
        let html = render("Bad \\(\\nosuch{x}\\) math.\n");
        assert!(html.contains("<code class=\"math math-error\""));
        assert!(html.contains(">\\nosuch{x}</code>"));
    }

    #[test]
    fn test_unclosed_delimiter_keeps_backslash() {
        assert_eq!(
            render("open \\(a_b without close\n"),
            "<p>open \\(a_b without close</p>\n"
        );
        assert_eq!(render("open \\[x\n"), "<p>open \\[x</p>\n");
    }

    #[test]
    fn test_escaped_delimiters_are_not_math() {
        assert_eq!(render("a \\\\(x\\\\) b\n"), "<p>a \\(x\\) b</p>\n");
        assert_eq!(render("a \\\\[x\\\\] b\n"), "<p>a \\[x\\] b</p>\n");
    }

    #[test]
    fn test_unmarked_delimiters_in_text_are_ignored() {
        let events = vec![StreamEvent::Markdown(Event::Text(CowStr::from("\\(x\\)")))];
        assert_eq!(MathStage.apply(events.clone()), events);
    }

    #[test]
    fn test_text_without_math_is_untouched() {
        let source = "Plain *text* with\na soft break.\n";
        let events = from_parser(Parser::new(source));
        assert_eq!(MathStage.apply(events.clone()), events);
    }

    #[test]
    fn test_code_blocks_are_skipped() {
        let source = "```\n\\(a\\)\n```\n";
        let events = from_parser(Parser::new(source));
        assert_eq!(MathStage.apply(events.clone()), events);
    }

    #[test]
    fn test_data_tex_is_escaped() {
        let markup = math_markup("a < b", false);
        assert!(markup.starts_with("<span class=\"math math-inline\" data-tex=\"a &lt; b\">"));
    }
}
