//! Heading collection: the document outline and unique anchors.
//!
//! [`collect_outline`] observes the parsed stream without changing it and
//! records every heading with a unique anchor. [`stamp_anchors`] then writes
//! those anchors onto the heading start events as `id` attributes.

use std::collections::HashSet;

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use serde::Serialize;

use super::math::MATH_MARK;
use super::stream::{EventStream, StreamEvent};

// =============================================================================
// Anchors
// =============================================================================

/// Hands out anchors that are unique within one document.
///
/// Explicit `{#id}` attributes are reserved up front so an earlier
/// generated anchor can never take an id an author wrote by hand. Create
/// one registry per render; it is never shared between documents.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    reserved: HashSet<String>,
    used: HashSet<String>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an id so generated anchors avoid it.
    pub fn reserve(&mut self, id: &str) {
        self.reserved.insert(id.to_string());
    }

    /// Claim an explicit id, falling back to a suffixed one if it is taken.
    pub fn claim(&mut self, id: &str) -> String {
        if self.used.insert(id.to_string()) {
            return id.to_string();
        }
        self.unique(id)
    }

    /// Generate an anchor for heading text: `overview`, `overview-2`, ...
    pub fn assign(&mut self, text: &str) -> String {
        self.unique(&slugify(text))
    }

    fn unique(&mut self, base: &str) -> String {
        let taken = |id: &str, this: &Self| this.used.contains(id) || this.reserved.contains(id);

        let mut id = base.to_string();
        let mut suffix = 2;
        while taken(&id, self) {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }
        self.used.insert(id.clone());
        id
    }
}

/// Convert heading text to an anchor slug.
///
/// Lowercases, turns whitespace, `-` and `_` into single hyphens and drops
/// other punctuation. Text with nothing usable becomes `section`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

// =============================================================================
// Outline
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

/// The headings of one document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Outline {
    entries: Vec<OutlineEntry>,
}

/// An outline entry with its sub-headings, for nested tables of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    pub level: u8,
    pub text: String,
    pub anchor: String,
    pub children: Vec<OutlineNode>,
}

impl Outline {
    pub fn entries(&self) -> &[OutlineEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nest entries under the closest preceding entry of a lower level.
    pub fn tree(&self) -> Vec<OutlineNode> {
        fn attach(node: OutlineNode, stack: &mut [OutlineNode], roots: &mut Vec<OutlineNode>) {
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => roots.push(node),
            }
        }

        let mut roots = Vec::new();
        let mut stack: Vec<OutlineNode> = Vec::new();
        for entry in &self.entries {
            while stack.last().is_some_and(|top| top.level >= entry.level) {
                if let Some(done) = stack.pop() {
                    attach(done, &mut stack, &mut roots);
                }
            }
            stack.push(OutlineNode {
                level: entry.level,
                text: entry.text.clone(),
                anchor: entry.anchor.clone(),
                children: Vec::new(),
            });
        }
        while let Some(done) = stack.pop() {
            attach(done, &mut stack, &mut roots);
        }
        roots
    }
}

/// Record every heading (levels 1-6) with a unique anchor.
///
/// Read-only: the stream is inspected, never modified.
pub fn collect_outline(events: &[StreamEvent<'_>]) -> Outline {
    let mut registry = AnchorRegistry::new();
    for event in events {
        if let StreamEvent::Markdown(Event::Start(Tag::Heading { id: Some(id), .. })) = event {
            registry.reserve(id);
        }
    }

    let mut entries = Vec::new();
    let mut current: Option<(u8, Option<String>, String)> = None;
    for event in events {
        match event {
            StreamEvent::Markdown(Event::Start(Tag::Heading { level, id, .. })) => {
                current = Some((*level as u8, id.as_ref().map(|id| id.to_string()), String::new()));
            }
            StreamEvent::Markdown(Event::Text(text) | Event::Code(text)) => {
                if let Some((_, _, buffer)) = current.as_mut() {
                    buffer.extend(text.chars().filter(|&c| c != MATH_MARK));
                }
            }
            StreamEvent::Markdown(Event::End(TagEnd::Heading(_))) => {
                if let Some((level, id, text)) = current.take() {
                    let text = text.trim().to_string();
                    let anchor = match id {
                        Some(id) => registry.claim(&id),
                        None => registry.assign(&text),
                    };
                    entries.push(OutlineEntry {
                        level,
                        text,
                        anchor,
                    });
                }
            }
            _ => {}
        }
    }

    Outline { entries }
}

/// Write outline anchors onto heading start events as `id` attributes.
///
/// `outline` must come from [`collect_outline`] on the same stream.
pub fn stamp_anchors<'a>(events: EventStream<'a>, outline: &Outline) -> EventStream<'a> {
    let mut anchors = outline.entries.iter().map(|entry| entry.anchor.clone());
    events
        .into_iter()
        .map(|event| match event {
            StreamEvent::Markdown(Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            })) => {
                let id = anchors.next().map(CowStr::from).or(id);
                StreamEvent::Markdown(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }))
            }
            other => other,
        })
        .collect()
}
