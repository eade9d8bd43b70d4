//! Ordered, de-duplicated node sets with a chained-undo stack.
//!
//! A [`Selection`] is a transient view over a [`Document`]'s arena: a plain
//! list of `NodeId`s plus an owned link to the selection it was derived
//! from. Producing operations consume the selection and return a new one
//! whose `prev` link owns the predecessor, so [`Selection::end`] unwinds the
//! chain by value. Operations take the document explicitly; selections never
//! alias the arena.

use std::collections::HashSet;

use indextree::NodeId;
use smallvec::SmallVec;

use crate::dom::Document;
use crate::selector::{Matcher, Selector};

/// Sentinel for [`Selection::slice`] meaning "to the end".
pub const TO_END: isize = isize::MAX;

/// Above this combined size, identity-membership tests switch from a linear
/// scan to a hash set. Purely a performance knob; ordering and membership
/// are identical either way.
pub(crate) const MIN_NODES_FOR_SET: usize = 1000;

/// An ordered set of nodes, deduplicated by node identity, remembering the
/// selection it was derived from.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    nodes: Vec<NodeId>,
    prev: Option<Box<Selection>>,
}

impl Document {
    /// The root selection: a selection holding only the document node.
    pub fn selection(&self) -> Selection {
        Selection::from_node(self.root)
    }

    /// Compile `selector` and collect every matching descendant of the
    /// document root. Malformed selector text yields an empty selection.
    pub fn select(&self, selector: &str) -> Selection {
        self.selection().find(self, selector)
    }
}

impl Selection {
    /// An empty selection with no history.
    pub fn new() -> Selection {
        Selection::default()
    }

    pub fn from_node(node: NodeId) -> Selection {
        Selection {
            nodes: vec![node],
            prev: None,
        }
    }

    pub fn from_nodes(nodes: Vec<NodeId>) -> Selection {
        Selection { nodes, prev: None }
    }

    /// The selected nodes, in order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Derive a new selection whose `prev` owns this one.
    pub(crate) fn push(self, nodes: Vec<NodeId>) -> Selection {
        Selection {
            nodes,
            prev: Some(Box::new(self)),
        }
    }

    // -------------------------------------------------------------------
    // Indexing
    // -------------------------------------------------------------------

    /// The first selected node as a selection.
    pub fn first(self) -> Selection {
        self.eq(0)
    }

    /// The last selected node as a selection.
    pub fn last(self) -> Selection {
        self.eq(-1)
    }

    /// The node at `index` as a selection. Negative indices count from the
    /// end; out of range yields an empty selection, never an error.
    pub fn eq(self, index: isize) -> Selection {
        let mut index = index;
        if index < 0 {
            index += self.nodes.len() as isize;
        }
        if index < 0 || index as usize >= self.nodes.len() {
            return Selection::new();
        }
        self.slice(index, index + 1)
    }

    /// The subrange `[start, end)` as a selection. Negative indices count
    /// from the end; [`TO_END`] means "to the end".
    pub fn slice(self, start: isize, end: isize) -> Selection {
        let len = self.nodes.len() as isize;
        let start = if start < 0 { start + len } else { start };
        let end = if end == TO_END {
            len
        } else if end < 0 {
            end + len
        } else {
            end
        };
        let nodes = self.nodes[start as usize..end as usize].to_vec();
        self.push(nodes)
    }

    /// The node at `index`, if in range. Negative indices count from the
    /// end.
    pub fn get(&self, index: isize) -> Option<NodeId> {
        let index = if index < 0 {
            index + self.nodes.len() as isize
        } else {
            index
        };
        usize::try_from(index)
            .ok()
            .and_then(|i| self.nodes.get(i).copied())
    }

    /// Position of the first selected node among its preceding element
    /// siblings, or -1 for an empty selection.
    pub fn index(&self, doc: &Document) -> isize {
        match self.nodes.first() {
            Some(&first) => {
                let mut count = 0;
                let mut cur = doc.prev_sibling(first);
                while let Some(s) = cur {
                    if doc.is_element(s) {
                        count += 1;
                    }
                    cur = doc.prev_sibling(s);
                }
                count
            }
            None => -1,
        }
    }

    /// Position of the first selected node within the matches of `selector`
    /// over the whole document, or -1.
    pub fn index_selector(&self, doc: &Document, selector: &str) -> isize {
        self.index_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn index_matcher(&self, doc: &Document, m: impl Matcher) -> isize {
        match self.nodes.first() {
            Some(&first) => {
                let all = find_with_matcher(doc, &[doc.root], m);
                index_in_slice(&all, first)
            }
            None => -1,
        }
    }

    /// Position of `node` in this selection, or -1.
    pub fn index_of_node(&self, node: NodeId) -> isize {
        index_in_slice(&self.nodes, node)
    }

    /// Position of the other selection's first node in this selection,
    /// or -1.
    pub fn index_of_selection(&self, sel: &Selection) -> isize {
        match sel.nodes.first() {
            Some(&first) => index_in_slice(&self.nodes, first),
            None => -1,
        }
    }

    // -------------------------------------------------------------------
    // Set building
    // -------------------------------------------------------------------

    /// Union with every document-wide match of `selector`, preserving
    /// first-seen order.
    pub fn add(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        self.add_matcher(doc, m)
    }

    pub fn add_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let found = find_with_matcher(doc, &[doc.root], m);
        self.add_nodes(&found)
    }

    pub fn add_selection(self, sel: &Selection) -> Selection {
        self.add_nodes(&sel.nodes)
    }

    pub fn union(self, sel: &Selection) -> Selection {
        self.add_selection(sel)
    }

    /// Union with the given nodes, deduplicating by identity.
    pub fn add_nodes(self, nodes: &[NodeId]) -> Selection {
        let merged = append_without_duplicates(self.nodes.clone(), nodes.iter().copied());
        self.push(merged)
    }

    /// Union with the selection this one was derived from.
    pub fn add_back(self) -> Selection {
        let prev_nodes: Vec<NodeId> = self
            .prev
            .as_ref()
            .map(|p| p.nodes.clone())
            .unwrap_or_default();
        self.add_nodes(&prev_nodes)
    }

    /// Alias for [`Selection::add_back`], kept for jQuery familiarity.
    pub fn and_self(self) -> Selection {
        self.add_back()
    }

    /// `add_back`, keeping only predecessor nodes matching `selector`.
    pub fn add_back_filtered(self, doc: &Document, selector: &str) -> Selection {
        self.add_back_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn add_back_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let prev_nodes: Vec<NodeId> = self
            .prev
            .as_ref()
            .map(|p| m.filter(doc, &p.nodes))
            .unwrap_or_default();
        self.add_nodes(&prev_nodes)
    }

    /// Pop back to the previous selection in the chain, or an empty
    /// selection if this is the start of the chain.
    pub fn end(self) -> Selection {
        match self.prev {
            Some(prev) => *prev,
            None => Selection::new(),
        }
    }

    // -------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------

    /// Keep nodes matching `selector`.
    pub fn filter(self, doc: &Document, selector: &str) -> Selection {
        self.filter_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn filter_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let kept = m.filter(doc, &self.nodes);
        self.push(kept)
    }

    /// Exclude nodes matching `selector`.
    pub fn not(self, doc: &Document, selector: &str) -> Selection {
        self.not_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn not_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let kept = self
            .nodes
            .iter()
            .copied()
            .filter(|&id| !m.matches(doc, id))
            .collect();
        self.push(kept)
    }

    /// Keep nodes for which the predicate returns true. The predicate
    /// receives the 0-based index and the node.
    pub fn filter_by(self, mut f: impl FnMut(usize, NodeId) -> bool) -> Selection {
        let kept = self
            .nodes
            .iter()
            .copied()
            .enumerate()
            .filter(|&(i, id)| f(i, id))
            .map(|(_, id)| id)
            .collect();
        self.push(kept)
    }

    /// Exclude nodes for which the predicate returns true.
    pub fn not_by(self, mut f: impl FnMut(usize, NodeId) -> bool) -> Selection {
        self.filter_by(|i, id| !f(i, id))
    }

    /// Keep nodes that are members of `nodes`.
    pub fn filter_nodes(self, nodes: &[NodeId]) -> Selection {
        let kept = winnow_nodes(&self.nodes, nodes, true);
        self.push(kept)
    }

    /// Exclude nodes that are members of `nodes`.
    pub fn not_nodes(self, nodes: &[NodeId]) -> Selection {
        let kept = winnow_nodes(&self.nodes, nodes, false);
        self.push(kept)
    }

    /// Keep nodes that are members of the other selection.
    pub fn filter_selection(self, sel: &Selection) -> Selection {
        self.filter_nodes(&sel.nodes)
    }

    /// Exclude nodes that are members of the other selection.
    pub fn not_selection(self, sel: &Selection) -> Selection {
        self.not_nodes(&sel.nodes)
    }

    /// Alias for [`Selection::filter_selection`].
    pub fn intersection(self, sel: &Selection) -> Selection {
        self.filter_selection(sel)
    }

    // -------------------------------------------------------------------
    // Relational existence
    // -------------------------------------------------------------------

    /// Keep nodes containing (as strict descendant) a document-wide match
    /// of `selector`.
    pub fn has(self, doc: &Document, selector: &str) -> Selection {
        let found = doc.select(selector);
        self.has_selection(doc, &found)
    }

    pub fn has_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let found = doc.selection().find_matcher(doc, m);
        self.has_selection(doc, &found)
    }

    /// Keep nodes containing any of the given nodes.
    pub fn has_nodes(self, doc: &Document, nodes: &[NodeId]) -> Selection {
        self.filter_by(|_, id| nodes.iter().any(|&n| doc.node_contains(id, n)))
    }

    pub fn has_selection(self, doc: &Document, sel: &Selection) -> Selection {
        self.has_nodes(doc, &sel.nodes)
    }

    // -------------------------------------------------------------------
    // Membership
    // -------------------------------------------------------------------

    /// True iff any selected node matches `selector`.
    pub fn is(&self, doc: &Document, selector: &str) -> bool {
        self.is_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn is_matcher(&self, doc: &Document, m: impl Matcher) -> bool {
        match self.nodes.as_slice() {
            [] => false,
            [only] => m.matches(doc, *only),
            nodes => !m.filter(doc, nodes).is_empty(),
        }
    }

    /// True iff any selected node satisfies the predicate.
    pub fn is_by(&self, mut f: impl FnMut(usize, NodeId) -> bool) -> bool {
        self.nodes.iter().enumerate().any(|(i, &id)| f(i, id))
    }

    /// True iff any selected node is a member of `nodes`.
    pub fn is_nodes(&self, nodes: &[NodeId]) -> bool {
        !winnow_nodes(&self.nodes, nodes, true).is_empty()
    }

    pub fn is_selection(&self, sel: &Selection) -> bool {
        self.is_nodes(&sel.nodes)
    }

    /// True iff `node` is a strict descendant of any selected node.
    pub fn contains(&self, doc: &Document, node: NodeId) -> bool {
        self.nodes
            .iter()
            .any(|&container| doc.node_contains(container, node))
    }

    /// Render the first selected node and its subtree to HTML.
    pub fn outer_html(&self, doc: &Document) -> String {
        match self.nodes.first() {
            Some(&first) => crate::serialize::outer_html(doc, first),
            None => String::new(),
        }
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter().copied()
    }
}

// ---------------------------------------------------------------------------
// Shared machinery
// ---------------------------------------------------------------------------

pub(crate) fn index_in_slice(slice: &[NodeId], node: NodeId) -> isize {
    slice
        .iter()
        .position(|&n| n == node)
        .map(|i| i as isize)
        .unwrap_or(-1)
}

/// Append `nodes` to `target`, skipping already-present identities. Below
/// [`MIN_NODES_FOR_SET`] this is a linear scan; above it, a hash set.
pub(crate) fn append_without_duplicates(
    mut target: Vec<NodeId>,
    nodes: impl ExactSizeIterator<Item = NodeId>,
) -> Vec<NodeId> {
    if target.len() + nodes.len() < MIN_NODES_FOR_SET {
        for n in nodes {
            if !target.contains(&n) {
                target.push(n);
            }
        }
        return target;
    }

    let mut set: HashSet<NodeId> = target.iter().copied().collect();
    for n in nodes {
        if set.insert(n) {
            target.push(n);
        }
    }
    target
}

/// Membership filter with the same linear/hash switch.
pub(crate) fn winnow_nodes(selected: &[NodeId], nodes: &[NodeId], keep: bool) -> Vec<NodeId> {
    if selected.len() + nodes.len() < MIN_NODES_FOR_SET {
        return selected
            .iter()
            .copied()
            .filter(|&id| nodes.contains(&id) == keep)
            .collect();
    }

    let set: HashSet<NodeId> = nodes.iter().copied().collect();
    selected
        .iter()
        .copied()
        .filter(|id| set.contains(id) == keep)
        .collect()
}

/// Expand each node through `f` and concatenate the results, removing
/// duplicate identities while preserving first-seen order.
pub(crate) fn map_nodes(
    nodes: &[NodeId],
    mut f: impl FnMut(usize, NodeId) -> SmallVec<[NodeId; 4]>,
) -> Vec<NodeId> {
    let mut set: HashSet<NodeId> = HashSet::new();
    let mut result = Vec::new();
    for (i, &n) in nodes.iter().enumerate() {
        for v in f(i, n) {
            if set.insert(v) {
                result.push(v);
            }
        }
    }
    result
}

/// For each context node, collect matches among its descendants in document
/// order; concatenate per-context results and drop cross-context duplicates
/// by identity.
pub(crate) fn find_with_matcher(
    doc: &Document,
    nodes: &[NodeId],
    m: impl Matcher,
) -> Vec<NodeId> {
    map_nodes(nodes, |_, n| {
        let mut out = SmallVec::new();
        for c in doc.children(n) {
            if doc.is_element(c) {
                out.extend(m.match_all(doc, c));
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn doc_with_three() -> (Document, Vec<NodeId>) {
        let doc = parse_document(
            "<html><body><p id='a'></p><p id='b'></p><p id='c'></p></body></html>",
        );
        let nodes = doc.select("p").nodes().to_vec();
        assert_eq!(nodes.len(), 3);
        (doc, nodes)
    }

    #[test]
    fn test_eq_negative_and_out_of_range() {
        let (_, nodes) = doc_with_three();
        let sel = Selection::from_nodes(nodes.clone());
        assert_eq!(sel.clone().eq(-1).nodes(), &[nodes[2]]);
        assert_eq!(sel.clone().eq(5).nodes(), &[] as &[NodeId]);
        assert_eq!(sel.clone().eq(-5).nodes(), &[] as &[NodeId]);
        assert_eq!(sel.eq(1).nodes(), &[nodes[1]]);
    }

    #[test]
    fn test_slice_negative_and_to_end() {
        let (_, nodes) = doc_with_three();
        let sel = Selection::from_nodes(nodes.clone());
        assert_eq!(sel.clone().slice(-2, TO_END).nodes(), &nodes[1..]);
        assert_eq!(sel.slice(0, 2).nodes(), &nodes[..2]);
    }

    #[test]
    fn test_add_is_idempotent() {
        let (doc, nodes) = doc_with_three();
        let once = doc.select("p").add(&doc, "#b");
        let twice = doc.select("p").add(&doc, "#b").add(&doc, "#b");
        assert_eq!(once.nodes(), twice.nodes());
        assert_eq!(once.nodes(), nodes.as_slice());
    }

    #[test]
    fn test_end_unwinds_and_add_back_unions() {
        let (doc, nodes) = doc_with_three();
        let sel = doc.select("p").filter(&doc, "#b");
        assert_eq!(sel.nodes(), &[nodes[1]]);
        let back = sel.end();
        assert_eq!(back.nodes(), nodes.as_slice());

        let sel = doc.select("p").filter(&doc, "#b").add_back();
        // first-seen order: the filtered node first, then the rest
        assert_eq!(sel.nodes(), &[nodes[1], nodes[0], nodes[2]]);
    }

    #[test]
    fn test_end_of_origin_is_empty() {
        let (doc, _) = doc_with_three();
        let sel = doc.select("p").end().end();
        assert!(sel.is_empty());
    }

    #[test]
    fn test_filter_not_partition() {
        let (doc, nodes) = doc_with_three();
        let kept = doc.select("p").filter(&doc, "#b");
        let excluded = doc.select("p").not(&doc, "#b");
        assert_eq!(kept.nodes(), &[nodes[1]]);
        assert_eq!(excluded.nodes(), &[nodes[0], nodes[2]]);
    }

    #[test]
    fn test_malformed_selector_degrades_to_empty() {
        let (doc, _) = doc_with_three();
        assert!(doc.select("p[unclosed").is_empty());
        assert!(doc.select("p").filter(&doc, "[[").is_empty());
        assert!(!doc.select("p").is(&doc, "[["));
    }

    #[test]
    fn test_filter_by_index_predicate() {
        let (_, nodes) = doc_with_three();
        let sel = Selection::from_nodes(nodes.clone()).filter_by(|i, _| i % 2 == 0);
        assert_eq!(sel.nodes(), &[nodes[0], nodes[2]]);
    }

    #[test]
    fn test_is_and_contains() {
        let doc = parse_document("<html><body><div><span>x</span></div></body></html>");
        let div = doc.select("div");
        let span = doc.select("span").nodes()[0];
        assert!(div.is(&doc, "div"));
        assert!(!div.is(&doc, "p"));
        assert!(div.contains(&doc, span));
        // strict: a node does not contain itself
        let spans = doc.select("span");
        assert!(!spans.contains(&doc, span));
    }

    #[test]
    fn test_intersection() {
        let (doc, nodes) = doc_with_three();
        let left = doc.select("p").slice(0, 2);
        let right = doc.select("p").slice(1, TO_END);
        let both = left.intersection(&right);
        assert_eq!(both.nodes(), &[nodes[1]]);
    }

    #[test]
    fn test_index() {
        let (doc, nodes) = doc_with_three();
        let sel = Selection::from_nodes(vec![nodes[2]]);
        assert_eq!(sel.index(&doc), 2);
        assert_eq!(sel.index_selector(&doc, "p"), 2);
        assert_eq!(Selection::new().index(&doc), -1);
    }

    #[test]
    fn test_dedup_switch_equivalence() {
        // same membership results on both sides of the threshold
        let (_, nodes) = doc_with_three();
        let small = winnow_nodes(&nodes, &nodes[..1], true);
        assert_eq!(small, &nodes[..1]);
        let large_target: Vec<NodeId> = nodes
            .iter()
            .copied()
            .cycle()
            .take(MIN_NODES_FOR_SET + 3)
            .collect();
        let kept = winnow_nodes(&large_target, &nodes[..1], true);
        assert!(kept.iter().all(|&n| n == nodes[0]));
    }
}
