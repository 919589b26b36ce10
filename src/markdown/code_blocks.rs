//! Highlight code blocks and wrap them for copy support.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag};

use super::highlight::SyntaxHighlighter;
use super::stream::{Container, EventStream, StreamEvent, find_matching_end};
use super::transform::Transform;

/// Replaces each code block with highlighted HTML inside a
/// [`Container::CodeBlock`] carrying a per-document id.
///
/// Ids count from `code-0` within one `apply` call, so every document starts
/// over.
pub struct CodeBlockStage {
    highlighter: SyntaxHighlighter,
}

impl CodeBlockStage {
    pub fn new(theme: &str) -> Self {
        Self {
            highlighter: SyntaxHighlighter::new(theme),
        }
    }
}

impl Transform for CodeBlockStage {
    fn name(&self) -> &'static str {
        "code-blocks"
    }

    fn apply<'a>(&self, events: EventStream<'a>) -> EventStream<'a> {
        let mut out = Vec::with_capacity(events.len());
        let mut next_id = 0usize;
        let mut i = 0;

        while i < events.len() {
            let StreamEvent::Markdown(Event::Start(Tag::CodeBlock(kind))) = &events[i] else {
                out.push(events[i].clone());
                i += 1;
                continue;
            };
            let Some(end) = find_matching_end(&events, i) else {
                out.push(events[i].clone());
                i += 1;
                continue;
            };

            let language = match kind {
                CodeBlockKind::Fenced(info) => info_language(info),
                CodeBlockKind::Indented => String::new(),
            };
            let code: String = events[i + 1..end]
                .iter()
                .filter_map(|e| match e {
                    StreamEvent::Markdown(Event::Text(text)) => Some(&**text),
                    _ => None,
                })
                .collect();

            let container = Container::CodeBlock {
                id: format!("code-{next_id}"),
                language: language.clone(),
            };
            next_id += 1;

            out.push(StreamEvent::Open(container.clone()));
            out.push(StreamEvent::Markdown(Event::Html(CowStr::from(
                self.highlighter.highlight(&code, &language),
            ))));
            out.push(StreamEvent::Close(container));
            i = end + 1;
        }

        out
    }
}

/// First word of a fence info string: "r", "{r}", "python title=x".
fn info_language(info: &str) -> String {
    info.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c| c == '{' || c == '}')
        .split(',')
        .next()
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::stream::{check_balanced, from_parser};
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Parser, TagEnd};

    fn containers(events: &[StreamEvent<'_>]) -> Vec<Container> {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Open(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_info_language() {
        assert_eq!(info_language("r"), "r");
        assert_eq!(info_language("{r}"), "r");
        assert_eq!(info_language("{r, echo=FALSE}"), "r");
        assert_eq!(info_language("python title=fit.py"), "python");
        assert_eq!(info_language(""), "");
    }

    #[test]
    fn test_ids_are_sequential() {
        let source = "```r\nx <- 1\n```\n\n```\nplain\n```\n\n    indented\n";
        let events = from_parser(Parser::new(source));
        let out = CodeBlockStage::new("dracula").apply(events);

        assert_eq!(check_balanced(&out), Ok(()));
        assert_eq!(
            containers(&out),
            vec![
                Container::CodeBlock {
                    id: "code-0".to_string(),
                    language: "r".to_string()
                },
                Container::CodeBlock {
                    id: "code-1".to_string(),
                    language: String::new()
                },
                Container::CodeBlock {
                    id: "code-2".to_string(),
                    language: String::new()
                },
            ]
        );
    }

    #[test]
    fn test_ids_restart_per_call() {
        let stage = CodeBlockStage::new("dracula");
        let source = "```\na\n```\n";
        let first = stage.apply(from_parser(Parser::new(source)));
        let second = stage.apply(from_parser(Parser::new(source)));
        assert_eq!(containers(&first), containers(&second));
    }

    #[test]
    fn test_code_is_escaped() {
        let events = from_parser(Parser::new("```\na < b\n```\n"));
        let out = CodeBlockStage::new("dracula").apply(events);
        let html = out
            .iter()
            .find_map(|e| match e {
                StreamEvent::Markdown(Event::Html(html)) => Some(html.to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(html, "<pre><code>a &lt; b\n</code></pre>");
    }

    #[test]
    fn test_unterminated_block_passes_through() {
        let events = vec![
            StreamEvent::Markdown(Event::Start(Tag::CodeBlock(CodeBlockKind::Indented))),
            StreamEvent::Markdown(Event::Text("x".into())),
        ];
        let out = CodeBlockStage::new("dracula").apply(events.clone());
        assert_eq!(out, events);
        assert!(!out.contains(&StreamEvent::Markdown(Event::End(TagEnd::CodeBlock))));
    }
}
