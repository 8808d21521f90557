//! DOM Operations Adapter
//!
//! Thin layer over the `dom_query` crate offering the handful of node
//! operations the extractors need: attribute access, visible text,
//! bounded ancestor walks, ordered descendant search and validated
//! selector queries.

pub use dom_query::{Document, NodeRef, Selection};

pub use tendril::StrTendril;

use dom_query::Matcher;

use crate::error::{Error, Result};

/// Elements whose text is never rendered.
const INVISIBLE_TAGS: &[&str] = &["script", "style", "template"];

/// Parse an HTML string into a document.
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

// === Attribute Operations ===

/// Get element ID attribute
#[inline]
#[must_use]
pub fn id(node: &NodeRef) -> Option<StrTendril> {
    node.attr("id")
}

/// Get element class attribute
#[inline]
#[must_use]
pub fn class_name(node: &NodeRef) -> Option<StrTendril> {
    node.attr("class")
}

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(node: &NodeRef, name: &str) -> Option<StrTendril> {
    node.attr(name)
}

/// Whether the class attribute lists every given class.
#[must_use]
pub fn has_all_classes<'c>(node: &NodeRef, mut classes: impl Iterator<Item = &'c str>) -> bool {
    let Some(class_attr) = class_name(node) else {
        return false;
    };
    let present: Vec<&str> = class_attr.split_whitespace().collect();
    classes.all(|c| present.contains(&c))
}

/// Get tag name (lowercase)
#[must_use]
pub fn tag_name(node: &NodeRef) -> Option<String> {
    node.node_name().map(|t| t.to_ascii_lowercase())
}

// === Text Content ===

/// Visible text of a node: every descendant text fragment trimmed and
/// concatenated without separators, skipping script and style content.
#[must_use]
pub fn stripped_text(node: &NodeRef) -> String {
    let mut out = String::new();
    if node.is_text() {
        out.push_str(node.text().trim());
        return out;
    }
    visit_descendants(node, &mut |n| {
        if n.is_element() {
            return tag_name(n).is_some_and(|t| !INVISIBLE_TAGS.contains(&t.as_str()));
        }
        if n.is_text() {
            out.push_str(n.text().trim());
        }
        false
    });
    out
}

// === Tree Navigation ===

/// The nearest `depth` element ancestors, closest first.
///
/// The document node above `<html>` is not an element and is never
/// returned.
#[must_use]
pub fn element_ancestors<'a>(node: &NodeRef<'a>, depth: usize) -> Vec<NodeRef<'a>> {
    let mut out = Vec::with_capacity(depth);
    let mut current = node.parent();
    while let Some(parent) = current {
        if out.len() == depth || !parent.is_element() {
            break;
        }
        out.push(parent);
        current = parent.parent();
    }
    out
}

/// First descendant element, in document order, satisfying `pred`.
#[must_use]
pub fn find_descendant<'a>(
    node: &NodeRef<'a>,
    pred: impl Fn(&NodeRef<'a>) -> bool,
) -> Option<NodeRef<'a>> {
    let mut stack: Vec<NodeRef<'a>> = node.children().into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        if current.is_element() {
            if pred(&current) {
                return Some(current);
            }
            stack.extend(current.children().into_iter().rev());
        }
    }
    None
}

/// First descendant element with the given tag name.
#[must_use]
pub fn first_descendant_by_tag<'a>(node: &NodeRef<'a>, tag: &str) -> Option<NodeRef<'a>> {
    find_descendant(node, |n| {
        n.node_name().is_some_and(|name| name.eq_ignore_ascii_case(tag))
    })
}

/// Pre-order walk below `node`. The callback returns whether to descend
/// into the visited element.
fn visit_descendants<'a>(node: &NodeRef<'a>, visit: &mut impl FnMut(&NodeRef<'a>) -> bool) {
    let mut stack: Vec<NodeRef<'a>> = node.children().into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        if visit(&current) {
            stack.extend(current.children().into_iter().rev());
        }
    }
}

// === Querying ===

/// Query all elements matching a CSS selector, in document order.
///
/// Unlike a plain `select`, an unparsable selector is reported instead of
/// silently matching nothing.
///
/// # Errors
///
/// Returns [`Error::Selection`] when `selector` is not valid CSS.
pub fn query_selector_all<'a>(doc: &'a Document, selector: &str) -> Result<Vec<NodeRef<'a>>> {
    let matcher = Matcher::new(selector).map_err(|_| Error::Selection(selector.to_string()))?;
    Ok(doc.select_matcher(&matcher).nodes().to_vec())
}
