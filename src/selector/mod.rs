//! CSS selector AST, compiler and matching engine.
//!
//! A selector compiles once into a [`Sel`] tree (a closed set of variants,
//! so every `match`/`specificity` dispatch is an exhaustive enum match) and
//! is then reused to test single nodes, enumerate matches under a root, or
//! filter node lists. Matching never mutates the tree.

mod parse;
mod pseudo;
mod specificity;

pub use parse::{
    ParseError, parse, parse_group, parse_group_with_pseudo_elements, parse_with_pseudo_element,
};
pub use pseudo::PseudoClass;
pub use specificity::Specificity;

use indextree::NodeId;
use regex::Regex;

use crate::dom::Document;

/// Structural relationship joining two selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b` - some strict ancestor matches the left side
    Descendant,
    /// `a > b` - the immediate parent matches the left side
    Child,
    /// `a + b` - the nearest preceding element sibling matches the left side
    AdjacentSibling,
    /// `a ~ b` - any preceding sibling matches the left side
    GeneralSibling,
}

/// Attribute comparison operator.
#[derive(Debug, Clone)]
pub enum AttrOp {
    /// `[key]`
    Exists,
    /// `[key=val]`
    Equals,
    /// `[key!=val]` - also matches elements without the attribute
    NotEqual,
    /// `[key~=val]` - whitespace-separated word list contains val
    Includes,
    /// `[key|=val]` - val exactly, or val followed by `-`
    DashMatch,
    /// `[key^=val]`
    Prefix,
    /// `[key$=val]`
    Suffix,
    /// `[key*=val]`
    Substring,
    /// `[key#=re]` - non-standard: value matches the regular expression
    Regex(Regex),
}

/// An attribute selector.
#[derive(Debug, Clone)]
pub struct AttrSelector {
    pub key: String,
    pub val: String,
    pub op: AttrOp,
    /// `i` flag: compare values ASCII-case-insensitively
    pub insensitive: bool,
}

/// A compiled selector.
#[derive(Debug, Clone)]
pub enum Sel {
    /// Type selector, e.g. `div`
    Tag(String),
    /// Class selector, e.g. `.warning`
    Class(String),
    /// ID selector, e.g. `#main`
    Id(String),
    /// Attribute selector, e.g. `[href^="https:"]`
    Attr(AttrSelector),
    /// Syntactically accepted but can never match (e.g. `:hover` in a
    /// static document)
    Never,
    /// Pseudo-class, e.g. `:nth-child(2n+1)`
    Pseudo(PseudoClass),
    /// AND of simple selectors plus an optional trailing pseudo-element.
    /// With zero simple selectors this matches any element node.
    Compound {
        sels: Vec<Sel>,
        pseudo_element: String,
    },
    /// Two selectors joined by a combinator
    Combined {
        first: Box<Sel>,
        combinator: Combinator,
        second: Box<Sel>,
    },
    /// OR of alternative selectors
    Group(SelectorGroup),
}

impl Sel {
    /// Test a single node against this selector.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        match self {
            Sel::Tag(tag) => doc.tag(id) == Some(tag.as_str()),
            Sel::Class(class) => {
                match_attribute(doc, id, "class", |s| match_include(class, s, false))
            }
            Sel::Id(want) => match_attribute(doc, id, "id", |s| s == want),
            Sel::Attr(attr) => attr.matches(doc, id),
            Sel::Never => false,
            Sel::Pseudo(pseudo) => pseudo.matches(doc, id),
            Sel::Compound { sels, .. } => {
                if sels.is_empty() {
                    return doc.is_element(id);
                }
                sels.iter().all(|sel| sel.matches(doc, id))
            }
            Sel::Combined {
                first,
                combinator,
                second,
            } => match combinator {
                Combinator::Descendant => descendant_match(first, second, doc, id),
                Combinator::Child => child_match(first, second, doc, id),
                Combinator::AdjacentSibling => sibling_match(first, second, true, doc, id),
                Combinator::GeneralSibling => sibling_match(first, second, false, doc, id),
            },
            Sel::Group(group) => group.matches(doc, id),
        }
    }

    /// Specificity of this selector.
    pub fn specificity(&self) -> Specificity {
        match self {
            Sel::Tag(_) => Specificity::new(0, 0, 1),
            Sel::Class(_) | Sel::Attr(_) => Specificity::new(0, 1, 0),
            Sel::Id(_) => Specificity::new(1, 0, 0),
            Sel::Never => Specificity::new(0, 0, 0),
            Sel::Pseudo(pseudo) => pseudo.specificity(),
            Sel::Compound {
                sels,
                pseudo_element,
            } => {
                let mut out = Specificity::default();
                for sel in sels {
                    out = out.add(sel.specificity());
                }
                if !pseudo_element.is_empty() {
                    out = out.add(Specificity::new(0, 0, 1));
                }
                out
            }
            Sel::Combined { first, second, .. } => first.specificity().add(second.specificity()),
            Sel::Group(group) => group.max_specificity(),
        }
    }

    /// Pseudo-element carried by this selector, or `""`.
    pub fn pseudo_element(&self) -> &str {
        match self {
            Sel::Compound { pseudo_element, .. } => pseudo_element,
            Sel::Combined { second, .. } => second.pseudo_element(),
            _ => "",
        }
    }
}

/// Ordered list of alternative selectors; matches when any member matches.
#[derive(Debug, Clone, Default)]
pub struct SelectorGroup(pub Vec<Sel>);

impl SelectorGroup {
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.0.iter().any(|sel| sel.matches(doc, id))
    }

    /// The highest specificity among the alternatives.
    pub fn max_specificity(&self) -> Specificity {
        let mut max = Specificity::default();
        for sel in &self.0 {
            let spec = sel.specificity();
            if max.less(spec) {
                max = spec;
            }
        }
        max
    }
}

// ---------------------------------------------------------------------------
// Attribute matching
// ---------------------------------------------------------------------------

pub(crate) fn match_attribute(
    doc: &Document,
    id: NodeId,
    key: &str,
    f: impl Fn(&str) -> bool,
) -> bool {
    match doc.attr(id, key) {
        Some(val) => f(val),
        None => false,
    }
}

fn eq_value(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

/// Whitespace-separated word list `list` contains `val`.
pub(crate) fn match_include(val: &str, list: &str, ignore_case: bool) -> bool {
    list.split([' ', '\t', '\r', '\n', '\x0C'])
        .any(|word| eq_value(word, val, ignore_case))
}

impl AttrSelector {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let key = self.key.as_str();
        let val = self.val.as_str();
        let ci = self.insensitive;
        match &self.op {
            AttrOp::Exists => match_attribute(doc, id, key, |_| true),
            AttrOp::Equals => match_attribute(doc, id, key, |s| eq_value(s, val, ci)),
            AttrOp::NotEqual => {
                // also true when the attribute is absent
                doc.is_element(id) && !match_attribute(doc, id, key, |s| eq_value(s, val, ci))
            }
            AttrOp::Includes => match_attribute(doc, id, key, |s| match_include(val, s, ci)),
            AttrOp::DashMatch => match_attribute(doc, id, key, |s| {
                if eq_value(s, val, ci) {
                    return true;
                }
                match s.split_at_checked(val.len()) {
                    Some((head, rest)) => {
                        eq_value(head, val, ci) && rest.as_bytes().first() == Some(&b'-')
                    }
                    None => false,
                }
            }),
            AttrOp::Prefix => match_attribute(doc, id, key, |s| {
                !s.trim().is_empty()
                    && if ci {
                        s.to_lowercase().starts_with(&val.to_lowercase())
                    } else {
                        s.starts_with(val)
                    }
            }),
            AttrOp::Suffix => match_attribute(doc, id, key, |s| {
                !s.trim().is_empty()
                    && if ci {
                        s.to_lowercase().ends_with(&val.to_lowercase())
                    } else {
                        s.ends_with(val)
                    }
            }),
            AttrOp::Substring => match_attribute(doc, id, key, |s| {
                !s.trim().is_empty()
                    && if ci {
                        s.to_lowercase().contains(&val.to_lowercase())
                    } else {
                        s.contains(val)
                    }
            }),
            AttrOp::Regex(rx) => match_attribute(doc, id, key, |s| rx.is_match(s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Combinator walks
// ---------------------------------------------------------------------------

fn descendant_match(first: &Sel, second: &Sel, doc: &Document, id: NodeId) -> bool {
    if !second.matches(doc, id) {
        return false;
    }
    let mut cur = doc.parent(id);
    while let Some(p) = cur {
        if first.matches(doc, p) {
            return true;
        }
        cur = doc.parent(p);
    }
    false
}

fn child_match(first: &Sel, second: &Sel, doc: &Document, id: NodeId) -> bool {
    second.matches(doc, id)
        && doc
            .parent(id)
            .is_some_and(|parent| first.matches(doc, parent))
}

fn sibling_match(first: &Sel, second: &Sel, adjacent: bool, doc: &Document, id: NodeId) -> bool {
    if !second.matches(doc, id) {
        return false;
    }

    if adjacent {
        // nearest preceding sibling that is not a text or comment node
        let mut cur = doc.prev_sibling(id);
        while let Some(s) = cur {
            use crate::dom::NodeKind;
            if matches!(doc.get(s).kind, NodeKind::Text(_) | NodeKind::Comment(_)) {
                cur = doc.prev_sibling(s);
                continue;
            }
            return first.matches(doc, s);
        }
        return false;
    }

    let mut cur = doc.prev_sibling(id);
    while let Some(s) = cur {
        if first.matches(doc, s) {
            return true;
        }
        cur = doc.prev_sibling(s);
    }
    false
}

// ---------------------------------------------------------------------------
// Matcher surface
// ---------------------------------------------------------------------------

/// A compiled predicate over tree nodes.
///
/// `match_all` walks the subtree rooted at `root` in pre-order depth-first
/// document order, testing `root` itself first. `match_first` has the same
/// observable order and is free to short-circuit; the default implementation
/// does, by walking the same lazy pre-order.
pub trait Matcher {
    /// Test a single node.
    fn matches(&self, doc: &Document, id: NodeId) -> bool;

    /// All matches under (and including) `root`, in document order.
    fn match_all(&self, doc: &Document, root: NodeId) -> Vec<NodeId> {
        root.descendants(&doc.arena)
            .filter(|&id| self.matches(doc, id))
            .collect()
    }

    /// First match under (and including) `root` in pre-order, if any.
    fn match_first(&self, doc: &Document, root: NodeId) -> Option<NodeId> {
        root.descendants(&doc.arena)
            .find(|&id| self.matches(doc, id))
    }

    /// Keep only the nodes satisfying the matcher, preserving input order.
    fn filter(&self, doc: &Document, nodes: &[NodeId]) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|&id| self.matches(doc, id))
            .collect()
    }
}

impl Matcher for Sel {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        Sel::matches(self, doc, id)
    }
}

impl Matcher for SelectorGroup {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        SelectorGroup::matches(self, doc, id)
    }
}

impl<M: Matcher + ?Sized> Matcher for &M {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        (**self).matches(doc, id)
    }

    fn match_all(&self, doc: &Document, root: NodeId) -> Vec<NodeId> {
        (**self).match_all(doc, root)
    }

    fn match_first(&self, doc: &Document, root: NodeId) -> Option<NodeId> {
        (**self).match_first(doc, root)
    }

    fn filter(&self, doc: &Document, nodes: &[NodeId]) -> Vec<NodeId> {
        (**self).filter(doc, nodes)
    }
}

/// A compiled selector group, ready for reuse.
#[derive(Debug, Clone, Default)]
pub struct Selector(SelectorGroup);

impl Selector {
    /// Compile selector text, reporting malformed syntax.
    pub fn compile(selector: &str) -> Result<Selector, ParseError> {
        Ok(Selector(parse_group(selector)?))
    }

    /// Compile selector text; malformed syntax yields a selector that
    /// matches nothing. This is the entry point behind every
    /// selector-string convenience method on [`crate::Selection`], so that
    /// chained pipelines degrade to empty results instead of erroring.
    pub fn compile_lenient(selector: &str) -> Selector {
        Selector(parse_group(selector).unwrap_or_default())
    }

    /// The underlying selector group.
    pub fn group(&self) -> &SelectorGroup {
        &self.0
    }
}

impl Matcher for Selector {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.0.matches(doc, id)
    }
}

/// Adapter narrowing any matcher to at most one match (first-match
/// semantics), so "find the first element" pays for a short-circuit walk
/// rather than a full collection pass.
#[derive(Debug, Clone)]
pub struct Single<M>(pub M);

impl<M: Matcher> Matcher for Single<M> {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.0.matches(doc, id)
    }

    fn match_all(&self, doc: &Document, root: NodeId) -> Vec<NodeId> {
        self.0.match_first(doc, root).into_iter().collect()
    }

    fn match_first(&self, doc: &Document, root: NodeId) -> Option<NodeId> {
        self.0.match_first(doc, root)
    }
}

/// Compile selector text into a single-match matcher (lenient).
pub fn single(selector: &str) -> Single<Selector> {
    Single(Selector::compile_lenient(selector))
}

/// All matching descendants of `root`, excluding `root` itself, in document
/// order. Used when the caller already holds a context node and wants its
/// descendants, never the context node.
pub fn query_all(doc: &Document, root: NodeId, m: impl Matcher) -> Vec<NodeId> {
    root.descendants(&doc.arena)
        .skip(1)
        .filter(|&id| m.matches(doc, id))
        .collect()
}

/// First matching strict descendant of `root` in pre-order, if any.
pub fn query_first(doc: &Document, root: NodeId, m: impl Matcher) -> Option<NodeId> {
    root.descendants(&doc.arena)
        .skip(1)
        .find(|&id| m.matches(doc, id))
}
