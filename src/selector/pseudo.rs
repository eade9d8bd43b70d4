//! Pseudo-class matching algorithms.

use indextree::NodeId;
use regex::Regex;

use super::{SelectorGroup, Specificity, match_attribute};
use crate::dom::{Document, NodeKind};

/// A pseudo-class selector component: structural position, form state, or
/// text content tests.
#[derive(Debug, Clone)]
pub enum PseudoClass {
    /// `:not(group)`
    Not(SelectorGroup),
    /// `:has(group)` - any descendant matches
    Has(SelectorGroup),
    /// `:haschild(group)` - any direct child matches
    HasChild(SelectorGroup),
    /// `:contains(text)` / `:containsOwn(text)` - case-insensitive substring
    /// over subtree text / direct text children
    Contains { value: String, own: bool },
    /// `:matches(re)` / `:matchesOwn(re)` - regex over the same extractions
    Matches { pattern: Regex, own: bool },
    /// The nth-child family. `a == 0` means "exactly position b".
    Nth {
        a: i32,
        b: i32,
        last: bool,
        of_type: bool,
    },
    /// `:only-child` / `:only-of-type`
    OnlyChild { of_type: bool },
    /// `:input` - input, select, textarea or button element
    Input,
    /// `:empty`
    Empty,
    /// `:root`
    Root,
    /// `:link`
    Link,
    /// `:lang(code)`
    Lang(String),
    /// `:enabled`
    Enabled,
    /// `:disabled`
    Disabled,
    /// `:checked`
    Checked,
}

impl PseudoClass {
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        match self {
            PseudoClass::Not(group) => doc.is_element(id) && !group.matches(doc, id),
            PseudoClass::Has(group) => {
                doc.is_element(id) && has_descendant_match(doc, id, group)
            }
            PseudoClass::HasChild(group) => {
                doc.is_element(id) && doc.children(id).any(|c| group.matches(doc, c))
            }
            PseudoClass::Contains { value, own } => {
                let text = if *own {
                    doc.own_text(id)
                } else {
                    doc.text_content(id)
                };
                text.to_lowercase().contains(value)
            }
            PseudoClass::Matches { pattern, own } => {
                let text = if *own {
                    doc.own_text(id)
                } else {
                    doc.text_content(id)
                };
                pattern.is_match(&text)
            }
            PseudoClass::Nth {
                a,
                b,
                last,
                of_type,
            } => {
                if *a == 0 {
                    if *last {
                        simple_nth_last_child_match(doc, id, *b, *of_type)
                    } else {
                        simple_nth_child_match(doc, id, *b, *of_type)
                    }
                } else {
                    nth_child_match(doc, id, *a, *b, *last, *of_type)
                }
            }
            PseudoClass::OnlyChild { of_type } => only_child_match(doc, id, *of_type),
            PseudoClass::Input => matches!(
                doc.tag(id),
                Some("input" | "select" | "textarea" | "button")
            ),
            PseudoClass::Empty => empty_match(doc, id),
            PseudoClass::Root => {
                doc.is_element(id)
                    && doc
                        .parent(id)
                        .is_some_and(|p| matches!(doc.get(p).kind, NodeKind::Document))
            }
            PseudoClass::Link => {
                matches!(doc.tag(id), Some("a" | "area" | "link")) && doc.has_attr(id, "href")
            }
            PseudoClass::Lang(lang) => lang_match(doc, id, lang),
            PseudoClass::Enabled => enabled_match(doc, id),
            PseudoClass::Disabled => disabled_match(doc, id),
            PseudoClass::Checked => checked_match(doc, id),
        }
    }

    pub fn specificity(&self) -> Specificity {
        match self {
            // relational pseudo-classes take the highest specificity among
            // their alternatives
            PseudoClass::Not(group) | PseudoClass::Has(group) | PseudoClass::HasChild(group) => {
                group.max_specificity()
            }
            _ => Specificity::new(0, 1, 0),
        }
    }
}

fn has_descendant_match(doc: &Document, id: NodeId, group: &SelectorGroup) -> bool {
    for c in doc.children(id) {
        if group.matches(doc, c) || (doc.is_element(c) && has_descendant_match(doc, c, group)) {
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Structural position
// ---------------------------------------------------------------------------

/// General `an+b` matching: `i` is the node's 1-based position among
/// qualifying siblings (reversed for the `-last` variants); the node matches
/// iff `i - b` is a non-negative multiple of `a`.
fn nth_child_match(doc: &Document, id: NodeId, a: i32, b: i32, last: bool, of_type: bool) -> bool {
    if !doc.is_element(id) {
        return false;
    }
    let Some(parent) = doc.parent(id) else {
        return false;
    };

    let tag = doc.tag(id);
    let mut i: i32 = -1;
    let mut count: i32 = 0;
    for c in doc.children(parent) {
        if !doc.is_element(c) || (of_type && doc.tag(c) != tag) {
            continue;
        }
        count += 1;
        if c == id {
            i = count;
            if !last {
                break;
            }
        }
    }

    if i == -1 {
        return false;
    }

    if last {
        i = count - i + 1;
    }

    let i = i - b;
    if a == 0 {
        return i == 0;
    }
    i % a == 0 && i / a >= 0
}

/// `:nth-child(b)` with a constant position can stop counting early.
fn simple_nth_child_match(doc: &Document, id: NodeId, b: i32, of_type: bool) -> bool {
    if !doc.is_element(id) {
        return false;
    }
    let Some(parent) = doc.parent(id) else {
        return false;
    };

    let tag = doc.tag(id);
    let mut count = 0;
    for c in doc.children(parent) {
        if !doc.is_element(c) || (of_type && doc.tag(c) != tag) {
            continue;
        }
        count += 1;
        if c == id {
            return count == b;
        }
        if count >= b {
            return false;
        }
    }
    false
}

fn simple_nth_last_child_match(doc: &Document, id: NodeId, b: i32, of_type: bool) -> bool {
    if !doc.is_element(id) {
        return false;
    }
    let Some(parent) = doc.parent(id) else {
        return false;
    };

    let tag = doc.tag(id);
    let mut count = 0;
    let mut cur = doc.last_child(parent);
    while let Some(c) = cur {
        cur = doc.prev_sibling(c);
        if !doc.is_element(c) || (of_type && doc.tag(c) != tag) {
            continue;
        }
        count += 1;
        if c == id {
            return count == b;
        }
        if count >= b {
            return false;
        }
    }
    false
}

fn only_child_match(doc: &Document, id: NodeId, of_type: bool) -> bool {
    if !doc.is_element(id) {
        return false;
    }
    let Some(parent) = doc.parent(id) else {
        return false;
    };

    let tag = doc.tag(id);
    let mut count = 0;
    for c in doc.children(parent) {
        if !doc.is_element(c) || (of_type && doc.tag(c) != tag) {
            continue;
        }
        count += 1;
        if count > 1 {
            return false;
        }
    }
    count == 1
}

/// No element children, and no text child with non-whitespace content.
fn empty_match(doc: &Document, id: NodeId) -> bool {
    if !doc.is_element(id) {
        return false;
    }
    for c in doc.children(id) {
        match &doc.get(c).kind {
            NodeKind::Element(_) => return false,
            NodeKind::Text(t) => {
                if !t.trim().is_empty() {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

/// Walk up the ancestor chain looking for a `lang` attribute equal to the
/// code or prefixed by `code-`. Reaching the root without a match is false.
fn lang_match(doc: &Document, id: NodeId, lang: &str) -> bool {
    let mut cur = Some(id);
    while let Some(n) = cur {
        let own = match_attribute(doc, n, "lang", |val| {
            val == lang || (val.len() > lang.len() && val.starts_with(lang) && val.as_bytes()[lang.len()] == b'-')
        });
        if own {
            return true;
        }
        cur = doc.parent(n);
    }
    false
}

// ---------------------------------------------------------------------------
// Form state
// ---------------------------------------------------------------------------

fn enabled_match(doc: &Document, id: NodeId) -> bool {
    match doc.tag(id) {
        Some("a" | "area" | "link") => doc.has_attr(id, "href"),
        Some("optgroup" | "menuitem" | "fieldset") => !doc.has_attr(id, "disabled"),
        Some("button" | "input" | "select" | "textarea" | "option") => {
            !doc.has_attr(id, "disabled") && !in_disabled_fieldset(doc, id)
        }
        _ => false,
    }
}

fn disabled_match(doc: &Document, id: NodeId) -> bool {
    match doc.tag(id) {
        Some("optgroup" | "menuitem" | "fieldset") => doc.has_attr(id, "disabled"),
        Some("button" | "input" | "select" | "textarea" | "option") => {
            doc.has_attr(id, "disabled") || in_disabled_fieldset(doc, id)
        }
        _ => false,
    }
}

fn has_legend_in_previous_siblings(doc: &Document, id: NodeId) -> bool {
    let mut cur = doc.prev_sibling(id);
    while let Some(s) = cur {
        if doc.tag(s) == Some("legend") {
            return true;
        }
        cur = doc.prev_sibling(s);
    }
    false
}

/// A form control inside a disabled fieldset is disabled, unless it sits in
/// the fieldset's first legend. Applied recursively up nested fieldsets.
fn in_disabled_fieldset(doc: &Document, id: NodeId) -> bool {
    let Some(parent) = doc.parent(id) else {
        return false;
    };
    if doc.tag(parent) == Some("fieldset")
        && doc.has_attr(parent, "disabled")
        && (doc.tag(id) != Some("legend") || has_legend_in_previous_siblings(doc, id))
    {
        return true;
    }
    in_disabled_fieldset(doc, parent)
}

fn checked_match(doc: &Document, id: NodeId) -> bool {
    match doc.tag(id) {
        Some("input" | "menuitem") => {
            doc.has_attr(id, "checked")
                && match_attribute(doc, id, "type", |val| {
                    let t = val.to_ascii_lowercase();
                    t == "checkbox" || t == "radio"
                })
        }
        Some("option") => doc.has_attr(id, "selected"),
        _ => false,
    }
}
