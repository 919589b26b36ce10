//! Wrap tables in a horizontally scrollable container.

use std::collections::HashSet;

use pulldown_cmark::{Event, Tag, TagEnd};

use super::stream::{Container, EventStream, StreamEvent};
use super::transform::Transform;

pub struct TableStage;

impl Transform for TableStage {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn apply<'a>(&self, events: EventStream<'a>) -> EventStream<'a> {
        // Pair starts with ends first so an unterminated table is left alone.
        let mut open = Vec::new();
        let mut starts = HashSet::new();
        let mut ends = HashSet::new();
        for (i, event) in events.iter().enumerate() {
            match event {
                StreamEvent::Markdown(Event::Start(Tag::Table(_))) => open.push(i),
                StreamEvent::Markdown(Event::End(TagEnd::Table)) => {
                    if let Some(start) = open.pop() {
                        starts.insert(start);
                        ends.insert(i);
                    }
                }
                _ => {}
            }
        }

        if starts.is_empty() {
            return events;
        }

        let mut out = Vec::with_capacity(events.len() + starts.len() * 2);
        for (i, event) in events.into_iter().enumerate() {
            if starts.contains(&i) {
                out.push(StreamEvent::Open(Container::TableScroll));
            }
            out.push(event);
            if ends.contains(&i) {
                out.push(StreamEvent::Close(Container::TableScroll));
            }
        }
        out
    }
}
