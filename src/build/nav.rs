//! Site navigation built from document front matter.
//!
//! Pages that name a `category` are grouped under it; the rest are top-level
//! links. Groups are ordered by name and links within a level by slug, so
//! the navigation never depends on discovery order.

use std::collections::BTreeMap;

use super::document::ContentDocument;
use super::paths::page_url;
use super::render::{NavLink, NavSection};

/// Build the navigation shared by every page.
pub fn build_navigation<'a>(
    docs: impl IntoIterator<Item = &'a ContentDocument>,
    base_path: &str,
) -> Vec<NavSection> {
    let mut docs: Vec<&ContentDocument> = docs.into_iter().collect();
    docs.sort_by(|a, b| a.slug.cmp(&b.slug));

    let mut root_links = Vec::new();
    let mut sections: BTreeMap<String, Vec<NavLink>> = BTreeMap::new();

    for doc in docs {
        let link = NavLink {
            title: doc.title(),
            url: page_url(base_path, &doc.slug),
        };

        match doc
            .front_matter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            Some(category) => sections.entry(category.to_string()).or_default().push(link),
            None => root_links.push(link),
        }
    }

    let mut nav: Vec<NavSection> = root_links.into_iter().map(NavSection::Link).collect();
    nav.extend(
        sections
            .into_iter()
            .map(|(section, items)| NavSection::Section { section, items }),
    );
    nav
}
