//! Cascade over simple-selector stylesheets.
//!
//! Resolves the declarations that apply to one element from an ordered list of
//! stylesheets. Inherited values are not copied down: the result holds only
//! what rules set on the element itself, which is what gets turned into a
//! class.

use super::properties::PropertySet;
use super::stylesheet::{Rule, Stylesheet};

/// A matched rule with ordering information for the cascade.
struct MatchedRule<'a> {
    rule: &'a Rule,
    specificity: (u8, u8),
    order: usize,
}

/// Compute the cascaded declarations for an element.
///
/// Rules are applied by ascending specificity, then source order across
/// `stylesheets` (later sheets win ties). The element's inline style is not
/// part of the result; callers merge it on top.
pub fn compute_cascade<'a>(
    tag: &str,
    class_name: Option<&str>,
    stylesheets: impl IntoIterator<Item = &'a Stylesheet>,
) -> PropertySet {
    let mut matched: Vec<MatchedRule<'a>> = Vec::new();
    let mut order = 0;

    for sheet in stylesheets {
        for rule in sheet.rules() {
            let classes = class_name.into_iter().flat_map(str::split_whitespace);
            if rule.selector.matches(tag, classes) {
                matched.push(MatchedRule {
                    rule,
                    specificity: rule.selector.specificity(),
                    order,
                });
            }
            order += 1;
        }
    }

    if matched.len() > 1 {
        matched.sort_by(|a, b| {
            a.specificity
                .cmp(&b.specificity)
                .then(a.order.cmp(&b.order))
        });
    }

    let mut result = PropertySet::new();
    for m in &matched {
        result.merge(&m.rule.properties);
    }
    result
}
