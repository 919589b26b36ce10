//! Serialize a transformed stream to HTML.

use pulldown_cmark::{CowStr, Event, html};

use super::stream::{Container, StreamEvent};
use crate::util::html_escape;

/// Render the final stream as an HTML fragment.
///
/// Containers become raw HTML events and the whole sequence goes through
/// the parser's own HTML writer in one pass. Raw HTML from the source is
/// emitted verbatim; content is trusted.
pub fn emit_html(events: Vec<StreamEvent<'_>>) -> String {
    let mut out = String::new();
    html::push_html(
        &mut out,
        events.into_iter().map(|event| match event {
            StreamEvent::Markdown(event) => event,
            StreamEvent::Open(container) => Event::Html(CowStr::from(open_markup(&container))),
            StreamEvent::Close(container) => Event::Html(CowStr::from(close_markup(&container))),
        }),
    );
    out
}

fn open_markup(container: &Container) -> String {
    match container {
        Container::Callout { class, title } => {
            let title = html_escape(title);
            format!(
                "<div class=\"callout callout-{}\" role=\"note\" aria-label=\"{title}\">\
                 <div class=\"callout-title\"><span>{title}</span></div>\
                 <div class=\"callout-body\">\n",
                html_escape(class)
            )
        }
        Container::TableScroll => {
            "<div class=\"table-wrapper\"><div class=\"table-container\">\n".to_string()
        }
        Container::Module { title, anchor } => format!(
            "<details class=\"tutorial-module\" id=\"{}\">\n<summary>{}</summary>\n\
             <div class=\"module-content\">\n",
            html_escape(anchor),
            html_escape(title)
        ),
        Container::CodeBlock { id, language } => format!(
            "<div class=\"code-block-wrapper\" data-code-id=\"{}\" data-language=\"{}\">\n",
            html_escape(id),
            html_escape(language)
        ),
    }
}

fn close_markup(container: &Container) -> &'static str {
    match container {
        Container::Callout { .. } | Container::TableScroll => "</div></div>\n",
        Container::Module { .. } => "</div>\n</details>\n",
        Container::CodeBlock { .. } => "</div>\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::stream::from_parser;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::Parser;

    #[test]
    fn test_plain_markdown() {
        let events = from_parser(Parser::new("# Hi\n\n*there*\n"));
        assert_eq!(emit_html(events), "<h1>Hi</h1>\n<p><em>there</em></p>\n");
    }

    #[test]
    fn test_callout_markup() {
        let callout = Container::Callout {
            class: "tip".to_string(),
            title: "Tip".to_string(),
        };
        let mut events = vec![StreamEvent::Open(callout.clone())];
        events.extend(from_parser(Parser::new("Use REML.\n")));
        events.push(StreamEvent::Close(callout));

        assert_eq!(
            emit_html(events),
            "<div class=\"callout callout-tip\" role=\"note\" aria-label=\"Tip\">\
             <div class=\"callout-title\"><span>Tip</span></div>\
             <div class=\"callout-body\">\n<p>Use REML.</p>\n</div></div>\n"
        );
    }

    #[test]
    fn test_module_markup_escapes_title() {
        let module = Container::Module {
            title: "References & Resources".to_string(),
            anchor: "references-resources".to_string(),
        };
        let html = emit_html(vec![
            StreamEvent::Open(module.clone()),
            StreamEvent::Close(module),
        ]);
        assert_eq!(
            html,
            "<details class=\"tutorial-module\" id=\"references-resources\">\n\
             <summary>References &amp; Resources</summary>\n\
             <div class=\"module-content\">\n</div>\n</details>\n"
        );
    }

    #[test]
    fn test_table_wrapper_markup() {
        let html = emit_html(vec![
            StreamEvent::Open(Container::TableScroll),
            StreamEvent::Close(Container::TableScroll),
        ]);
        assert_eq!(
            html,
            "<div class=\"table-wrapper\"><div class=\"table-container\">\n</div></div>\n"
        );
    }
}
