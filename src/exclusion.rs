//! Exclusion matching for candidate containers.
//!
//! A container is noise when it, or one of its nearest
//! [`EXCLUSION_ANCESTOR_DEPTH`] element ancestors, satisfies any configured
//! [`ExclusionRule`].

use crate::config::ExclusionRule;
use crate::dom::{self, NodeRef};
use crate::patterns::EXCLUSION_ANCESTOR_DEPTH;

/// Whether the node or one of its nearest ancestors matches a rule.
///
/// Rules are tried in order at each level, starting at the node itself, and
/// the first match ends the search. No rules means nothing is excluded.
#[must_use]
pub fn is_excluded(node: &NodeRef, rules: &[ExclusionRule]) -> bool {
    matching_rule(node, rules).is_some()
}

/// The first rule that excludes the node, with the level it matched at
/// (0 for the node itself).
#[must_use]
pub fn matching_rule<'r>(node: &NodeRef, rules: &'r [ExclusionRule]) -> Option<(usize, &'r ExclusionRule)> {
    if rules.is_empty() {
        return None;
    }

    std::iter::once(*node)
        .chain(dom::element_ancestors(node, EXCLUSION_ANCESTOR_DEPTH))
        .enumerate()
        .find_map(|(level, candidate)| {
            rules
                .iter()
                .find(|rule| rule_matches(&candidate, rule))
                .map(|rule| (level, rule))
        })
}

/// Whether a single rule matches a single node.
#[must_use]
pub fn rule_matches(node: &NodeRef, rule: &ExclusionRule) -> bool {
    match rule {
        ExclusionRule::Class { classes } => {
            !classes.is_empty() && dom::has_all_classes(node, classes.iter().map(String::as_str))
        }
        ExclusionRule::Id { id } => dom::id(node).is_some_and(|v| &*v == id.as_str()),
        ExclusionRule::Attribute { name, value } => {
            dom::get_attribute(node, name).is_some_and(|v| &*v == value.as_str())
        }
        ExclusionRule::Text { substring } => dom::stripped_text(node).contains(substring.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn node<'a>(doc: &'a Document, selector: &str) -> NodeRef<'a> {
        match dom::query_selector_all(doc, selector) {
            Ok(nodes) if !nodes.is_empty() => nodes[0],
            _ => panic!("no match for {selector}"),
        }
    }

    #[test]
    fn test_class_rule_on_node_and_child() {
        let doc = dom::parse(r#"<div class="ad banner" id="outer"><p id="child">x</p></div>"#);
        let rules = [ExclusionRule::class("ad")];
        assert!(is_excluded(&node(&doc, "#outer"), &rules));
        assert!(is_excluded(&node(&doc, "#child"), &rules));
    }

    #[test]
    fn test_class_rule_requires_all_classes() {
        let doc = dom::parse(r#"<div class="ad" id="d">x</div>"#);
        assert!(!is_excluded(&node(&doc, "#d"), &[ExclusionRule::class("ad banner")]));
        assert!(is_excluded(&node(&doc, "#d"), &[ExclusionRule::class("ad")]));
    }

    #[test]
    fn test_ancestor_depth_limit() {
        // #target sits five levels below .ad, #deeper six
        let doc = dom::parse(
            r#"<div class="ad"><div><div><div><div>
                 <span id="target">x</span>
                 <div><span id="deeper">y</span></div>
               </div></div></div></div></div>"#,
        );
        let rules = [ExclusionRule::class("ad")];
        assert_eq!(
            matching_rule(&node(&doc, "#target"), &rules).map(|(level, _)| level),
            Some(5)
        );
        assert!(!is_excluded(&node(&doc, "#deeper"), &rules));
    }

    #[test]
    fn test_id_rule() {
        let doc = dom::parse(r#"<ul id="sidebar"><li id="item">x</li></ul><ul id="sidebar2"><li id="other">y</li></ul>"#);
        let rules = [ExclusionRule::id("sidebar")];
        assert!(is_excluded(&node(&doc, "#item"), &rules));
        assert!(!is_excluded(&node(&doc, "#other"), &rules));
    }

    #[test]
    fn test_attribute_rule() {
        let doc = dom::parse(
            r#"<li id="a" data-kind="promo">x</li><li id="b" data-kind="promo2">y</li>"#,
        );
        let rules = [ExclusionRule::attribute("data-kind", "promo")];
        assert!(is_excluded(&node(&doc, "#a"), &rules));
        assert!(!is_excluded(&node(&doc, "#b"), &rules));
    }

    #[test]
    fn test_text_rule() {
        let doc = dom::parse(r#"<li id="a"><a href="/x">广告 Buy now</a></li><li id="b">news</li>"#);
        let rules = [ExclusionRule::text("广告")];
        assert!(is_excluded(&node(&doc, "#a"), &rules));
        assert!(!is_excluded(&node(&doc, "#b"), &rules));
    }

    #[test]
    fn test_no_rules_never_excludes() {
        let doc = dom::parse(r#"<div class="ad" id="d">x</div>"#);
        assert!(!is_excluded(&node(&doc, "#d"), &[]));
    }

    #[test]
    fn test_first_matching_rule_reported() {
        let doc = dom::parse(r#"<div class="ad" id="d">x</div>"#);
        let rules = [ExclusionRule::id("nope"), ExclusionRule::class("ad"), ExclusionRule::id("d")];
        assert_eq!(
            matching_rule(&node(&doc, "#d"), &rules),
            Some((0, &rules[1]))
        );
    }
}
