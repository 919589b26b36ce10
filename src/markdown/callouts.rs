//! Callout transformation for blockquotes.
//!
//! Rewrites marked blockquotes into `Callout` containers. Recognised forms:
//!
//! ```markdown
//! > [!TIP]                      GFM alert, detected by the parser
//! > Prefer REML for final models.
//!
//! > [!pitfall]                  marker as the first text
//! > Centering changes the intercept.
//!
//! > **Warning:** Check convergence.
//!
//! [!tip]                        marker paragraph followed by a quote
//! > Use REML for final models.
//! ```
//!
//! Markers are looked up in the configured callout table; anything else is
//! left as an ordinary blockquote.

use pulldown_cmark::{BlockQuoteKind, CowStr, Event, Tag, TagEnd};

use super::stream::{Container, EventStream, StreamEvent, find_matching_end};
use super::transform::Transform;
use crate::config::CalloutDef;

pub struct CalloutStage {
    defs: Vec<CalloutDef>,
}

impl CalloutStage {
    pub fn new(defs: Vec<CalloutDef>) -> Self {
        Self { defs }
    }

    fn lookup(&self, marker: &str) -> Option<Container> {
        self.defs
            .iter()
            .find(|def| def.matches(marker))
            .map(|def| Container::Callout {
                class: def.class(),
                title: def.display_title(),
            })
    }

    fn rewrite<'a>(&self, events: &[StreamEvent<'a>]) -> EventStream<'a> {
        let mut out = Vec::with_capacity(events.len() + 2);
        let mut i = 0;
        while i < events.len() {
            match self.match_at(events, i) {
                Some(found) => {
                    out.push(StreamEvent::Open(found.callout.clone()));
                    out.extend(self.rewrite(&found.body));
                    out.push(StreamEvent::Close(found.callout));
                    i = found.next;
                }
                None => {
                    out.push(events[i].clone());
                    i += 1;
                }
            }
        }
        out
    }

    /// Try to recognise a callout starting at `events[i]`.
    fn match_at<'a>(&self, events: &[StreamEvent<'a>], i: usize) -> Option<CalloutMatch<'a>> {
        match events.get(i)? {
            StreamEvent::Markdown(Event::Start(Tag::BlockQuote(kind))) => {
                let end = find_matching_end(events, i)?;
                let inner = &events[i + 1..end];

                let (callout, body) = match kind {
                    Some(kind) => (self.lookup(alert_marker(*kind))?, inner.to_vec()),
                    None => self
                        .bracket_form(inner)
                        .or_else(|| self.bold_form(inner))?,
                };
                Some(CalloutMatch {
                    callout,
                    body,
                    next: end + 1,
                })
            }
            StreamEvent::Markdown(Event::Start(Tag::Paragraph)) => {
                // `[!tip]` on its own line directly above a blockquote
                let para_end = find_matching_end(events, i)?;
                let marker = paragraph_text(&events[i + 1..para_end])?;
                let marker = bracket_marker(&marker).filter(|(_, rest)| rest.is_empty())?.0;
                let callout = self.lookup(&marker)?;

                let quote = para_end + 1;
                if !matches!(
                    events.get(quote),
                    Some(StreamEvent::Markdown(Event::Start(Tag::BlockQuote(None))))
                ) {
                    return None;
                }
                let quote_end = find_matching_end(events, quote)?;
                Some(CalloutMatch {
                    callout,
                    body: events[quote + 1..quote_end].to_vec(),
                    next: quote_end + 1,
                })
            }
            _ => None,
        }
    }

    /// `> [!type] ...`: the marker is the start of the first paragraph.
    fn bracket_form<'a>(
        &self,
        inner: &[StreamEvent<'a>],
    ) -> Option<(Container, EventStream<'a>)> {
        let para_end = first_paragraph_end(inner)?;

        // The parser may split `[!tip]` over several text events.
        let mut line = String::new();
        let mut consumed = 1;
        while let Some(StreamEvent::Markdown(Event::Text(text))) = inner.get(consumed) {
            if consumed >= para_end {
                break;
            }
            line.push_str(text);
            consumed += 1;
        }

        let (marker, rest) = bracket_marker(&line)?;
        let callout = self.lookup(&marker)?;

        let mut skip = consumed;
        if rest.is_empty()
            && matches!(
                inner.get(skip),
                Some(StreamEvent::Markdown(Event::SoftBreak | Event::HardBreak))
            )
        {
            skip += 1;
        }
        Some((callout, rebuild_body(inner, para_end, rest, skip)))
    }

    /// `> **Type:** text`: a bold label with a colon opens the first paragraph.
    fn bold_form<'a>(&self, inner: &[StreamEvent<'a>]) -> Option<(Container, EventStream<'a>)> {
        let para_end = first_paragraph_end(inner)?;
        let label = match inner.get(1..4)? {
            [
                StreamEvent::Markdown(Event::Start(Tag::Strong)),
                StreamEvent::Markdown(Event::Text(label)),
                StreamEvent::Markdown(Event::End(TagEnd::Strong)),
            ] => label.trim(),
            _ => return None,
        };

        let following = match inner.get(4) {
            Some(StreamEvent::Markdown(Event::Text(text))) if 4 < para_end => Some(&**text),
            _ => None,
        };
        let has_colon =
            label.ends_with(':') || following.is_some_and(|t| t.trim_start().starts_with(':'));
        if !has_colon {
            return None;
        }

        let callout = self.lookup(label.trim_end_matches(':').trim())?;
        let rest = following
            .map(|t| t.trim_start().trim_start_matches(':').trim_start().to_string())
            .unwrap_or_default();
        let skip = if following.is_some() { 5 } else { 4 };
        Some((callout, rebuild_body(inner, para_end, rest, skip)))
    }
}

impl Transform for CalloutStage {
    fn name(&self) -> &'static str {
        "callouts"
    }

    fn apply<'a>(&self, events: EventStream<'a>) -> EventStream<'a> {
        self.rewrite(&events)
    }
}

struct CalloutMatch<'a> {
    callout: Container,
    body: EventStream<'a>,
    next: usize,
}

fn alert_marker(kind: BlockQuoteKind) -> &'static str {
    match kind {
        BlockQuoteKind::Note => "note",
        BlockQuoteKind::Tip => "tip",
        BlockQuoteKind::Important => "important",
        BlockQuoteKind::Warning => "warning",
        BlockQuoteKind::Caution => "caution",
    }
}

/// Split `[!type] rest` into the marker and the remaining text.
fn bracket_marker(text: &str) -> Option<(String, String)> {
    let text = text.trim_start().strip_prefix("[!")?;
    let close = text.find(']')?;
    let marker = text[..close].trim();
    if marker.is_empty() {
        return None;
    }
    Some((marker.to_string(), text[close + 1..].trim_start().to_string()))
}

/// Index (within `inner`) of the end of a leading paragraph.
fn first_paragraph_end(inner: &[StreamEvent<'_>]) -> Option<usize> {
    match inner.first()? {
        StreamEvent::Markdown(Event::Start(Tag::Paragraph)) => find_matching_end(inner, 0),
        _ => None,
    }
}

/// The paragraph's text, if it consists of text events only.
fn paragraph_text(content: &[StreamEvent<'_>]) -> Option<String> {
    let mut text = String::new();
    for event in content {
        match event {
            StreamEvent::Markdown(Event::Text(t)) => text.push_str(t),
            _ => return None,
        }
    }
    Some(text)
}

/// Rebuild a callout body with the marker removed from the first paragraph.
///
/// `rest` is text left over on the marker's line; `skip` is the first event
/// of the original paragraph still to be kept. A paragraph left empty is
/// dropped.
fn rebuild_body<'a>(
    inner: &[StreamEvent<'a>],
    para_end: usize,
    rest: String,
    skip: usize,
) -> EventStream<'a> {
    let mut paragraph = Vec::new();
    if !rest.is_empty() {
        paragraph.push(StreamEvent::Markdown(Event::Text(CowStr::from(rest))));
    }
    paragraph.extend(inner[skip.min(para_end)..para_end].iter().cloned());

    let mut body = Vec::with_capacity(inner.len());
    if !paragraph.is_empty() {
        body.push(StreamEvent::Markdown(Event::Start(Tag::Paragraph)));
        body.extend(paragraph);
        body.push(StreamEvent::Markdown(Event::End(TagEnd::Paragraph)));
    }
    body.extend(inner[para_end + 1..].iter().cloned());
    body
}
