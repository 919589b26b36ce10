//! The event stream the transform stages operate on.
//!
//! Stages consume and re-emit a flat sequence of [`StreamEvent`]s: the
//! parser's own events plus container open/close pairs introduced by the
//! stages themselves. Containers are serialized to HTML by the emitter,
//! so stages never need to hand-write markup fragments that could leave a
//! `<div>` dangling.

use pulldown_cmark::{Event, TagEnd};

/// A structural container introduced by a transform stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    /// A styled admonition rewritten from a marked blockquote.
    Callout { class: String, title: String },
    /// Horizontal scroll wrapper around a table.
    TableScroll,
    /// A collapsible section headed by a configured heading.
    Module { title: String, anchor: String },
    /// Wrapper around a highlighted code block.
    CodeBlock { id: String, language: String },
}

impl Container {
    /// Short name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Container::Callout { .. } => "callout",
            Container::TableScroll => "table-scroll",
            Container::Module { .. } => "module",
            Container::CodeBlock { .. } => "code-block",
        }
    }
}

/// One event in the transformed stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent<'a> {
    /// An event produced by the markdown parser (or synthesized in its vocabulary).
    Markdown(Event<'a>),
    /// Opens a container. Must be matched by a `Close` of an equal container.
    Open(Container),
    /// Closes the innermost open container.
    Close(Container),
}

impl<'a> From<Event<'a>> for StreamEvent<'a> {
    fn from(event: Event<'a>) -> Self {
        StreamEvent::Markdown(event)
    }
}

/// An ordered sequence of stream events, owned by whichever stage is running.
pub type EventStream<'a> = Vec<StreamEvent<'a>>;

/// Lift raw parser events into a stream.
pub fn from_parser<'a>(events: impl IntoIterator<Item = Event<'a>>) -> EventStream<'a> {
    events.into_iter().map(StreamEvent::Markdown).collect()
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StreamError {
    #[error("unexpected close of {found} at event {index} (expected {expected})")]
    Mismatched {
        index: usize,
        found: String,
        expected: String,
    },

    #[error("close of {found} at event {index} with nothing open")]
    UnexpectedClose { index: usize, found: String },

    #[error("{count} element(s) left open at end of stream (innermost: {innermost})")]
    Unclosed { count: usize, innermost: String },
}

#[derive(Debug, PartialEq)]
enum Frame {
    Tag(TagEnd),
    Container(Container),
}

impl Frame {
    fn describe(&self) -> String {
        match self {
            Frame::Tag(end) => format!("{end:?}"),
            Frame::Container(container) => container.kind().to_string(),
        }
    }
}

/// Verify that every start has a matching end and that nesting is proper.
///
/// Parser tags and containers share one stack: a container opened inside a
/// list item must close before the item does.
pub fn check_balanced(events: &[StreamEvent<'_>]) -> Result<(), StreamError> {
    let mut stack: Vec<Frame> = Vec::new();

    for (index, event) in events.iter().enumerate() {
        let closing = match event {
            StreamEvent::Markdown(Event::Start(tag)) => {
                stack.push(Frame::Tag(tag.to_end()));
                continue;
            }
            StreamEvent::Open(container) => {
                stack.push(Frame::Container(container.clone()));
                continue;
            }
            StreamEvent::Markdown(Event::End(end)) => Frame::Tag(*end),
            StreamEvent::Close(container) => Frame::Container(container.clone()),
            StreamEvent::Markdown(_) => continue,
        };

        match stack.pop() {
            Some(open) if open == closing => {}
            Some(open) => {
                return Err(StreamError::Mismatched {
                    index,
                    found: closing.describe(),
                    expected: open.describe(),
                });
            }
            None => {
                return Err(StreamError::UnexpectedClose {
                    index,
                    found: closing.describe(),
                });
            }
        }
    }

    match stack.last() {
        None => Ok(()),
        Some(innermost) => Err(StreamError::Unclosed {
            count: stack.len(),
            innermost: innermost.describe(),
        }),
    }
}

/// Index of the end event matching the start (or open) at `open_index`.
///
/// Returns `None` when the region never closes, which stages treat as
/// malformed input to be passed through untouched.
pub fn find_matching_end(events: &[StreamEvent<'_>], open_index: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, event) in events[open_index..].iter().enumerate() {
        match event {
            StreamEvent::Markdown(Event::Start(_)) | StreamEvent::Open(_) => depth += 1,
            StreamEvent::Markdown(Event::End(_)) | StreamEvent::Close(_) => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open_index + offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{CowStr, Options, Parser, Tag};

    fn parse(markdown: &str) -> EventStream<'_> {
        from_parser(Parser::new_ext(markdown, Options::all()))
    }

    #[test]
    fn test_parser_output_is_balanced() {
        let events = parse("# Title\n\n> quote\n\n- a\n- b\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(check_balanced(&events), Ok(()));
    }

    #[test]
    fn test_containers_must_nest_inside_tags() {
        let callout = Container::Callout {
            class: "tip".into(),
            title: "Tip".into(),
        };
        let events = vec![
            StreamEvent::Markdown(Event::Start(Tag::Item)),
            StreamEvent::Open(callout.clone()),
            StreamEvent::Markdown(Event::End(TagEnd::Item)),
            StreamEvent::Close(callout),
        ];
        assert!(matches!(
            check_balanced(&events),
            Err(StreamError::Mismatched { index: 2, .. })
        ));
    }

    #[test]
    fn test_unclosed_container_reported() {
        let events = vec![
            StreamEvent::Open(Container::TableScroll),
            StreamEvent::Markdown(Event::Text(CowStr::Borrowed("x"))),
        ];
        assert_eq!(
            check_balanced(&events),
            Err(StreamError::Unclosed {
                count: 1,
                innermost: "table-scroll".into()
            })
        );
    }

    #[test]
    fn test_stray_close_reported() {
        let events = vec![StreamEvent::Close(Container::TableScroll)];
        assert!(matches!(
            check_balanced(&events),
            Err(StreamError::UnexpectedClose { index: 0, .. })
        ));
    }

    #[test]
    fn test_find_matching_end_skips_nested() {
        let events = parse("> outer\n>\n> > inner\n\nafter\n");
        let end = find_matching_end(&events, 0).unwrap();
        assert!(matches!(
            events[end],
            StreamEvent::Markdown(Event::End(TagEnd::BlockQuote(_)))
        ));
        // Only the trailing paragraph follows the outer quote.
        assert_eq!(events.len() - end - 1, 3);
    }

    #[test]
    fn test_find_matching_end_unclosed() {
        let events = vec![
            StreamEvent::Markdown(Event::Start(Tag::Paragraph)),
            StreamEvent::Markdown(Event::Text(CowStr::Borrowed("x"))),
        ];
        assert_eq!(find_matching_end(&events, 0), None);
    }
}
