//! Collapsible modules for configured top-level sections.
//!
//! A top-level heading whose text matches a configured title (say
//! "Worked Example") opens a [`Container::Module`]. Everything after it up
//! to the next heading of the same or a higher level, or the end of the
//! document, goes inside. The heading itself becomes the container's title
//! and is rendered as the `<summary>`.

use pulldown_cmark::{Event, Tag};

use super::headings::slugify;
use super::stream::{Container, EventStream, StreamEvent, find_matching_end};
use super::transform::Transform;

pub struct ModuleStage {
    titles: Vec<String>,
}

impl ModuleStage {
    pub fn new(titles: Vec<String>) -> Self {
        Self { titles }
    }

    fn matches(&self, text: &str) -> bool {
        let text = text.trim().trim_end_matches(':').trim_end();
        self.titles
            .iter()
            .any(|title| title.trim().eq_ignore_ascii_case(text))
    }
}

struct OpenModule {
    level: u8,
    container: Container,
}

impl Transform for ModuleStage {
    fn name(&self) -> &'static str {
        "modules"
    }

    fn apply<'a>(&self, events: EventStream<'a>) -> EventStream<'a> {
        if self.titles.is_empty() {
            return events;
        }

        let mut out = Vec::with_capacity(events.len() + 4);
        let mut open: Option<OpenModule> = None;
        let mut depth = 0usize;
        let mut i = 0;

        while i < events.len() {
            if depth == 0
                && let StreamEvent::Markdown(Event::Start(Tag::Heading { level, id, .. })) =
                    &events[i]
                && let Some(end) = find_matching_end(&events, i)
            {
                let level = *level as u8;
                if open.as_ref().is_some_and(|module| level <= module.level)
                    && let Some(module) = open.take()
                {
                    out.push(StreamEvent::Close(module.container));
                }

                let text = heading_text(&events[i + 1..end]);
                if open.is_none() && self.matches(&text) {
                    let title = text.trim().to_string();
                    let anchor = match id {
                        Some(id) => id.to_string(),
                        None => slugify(&title),
                    };
                    let container = Container::Module { title, anchor };
                    out.push(StreamEvent::Open(container.clone()));
                    open = Some(OpenModule { level, container });
                } else {
                    out.extend_from_slice(&events[i..=end]);
                }
                i = end + 1;
                continue;
            }

            match &events[i] {
                StreamEvent::Markdown(Event::Start(_)) | StreamEvent::Open(_) => depth += 1,
                StreamEvent::Markdown(Event::End(_)) | StreamEvent::Close(_) => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            out.push(events[i].clone());
            i += 1;
        }

        if let Some(module) = open {
            out.push(StreamEvent::Close(module.container));
        }
        out
    }
}

fn heading_text(events: &[StreamEvent<'_>]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Markdown(Event::Text(text) | Event::Code(text)) => Some(&**text),
            _ => None,
        })
        .collect()
}
