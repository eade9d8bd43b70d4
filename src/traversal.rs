//! Selection traversal: descendants, ancestors and siblings, with
//! "until" stopping and filtered variants.

use indextree::NodeId;
use smallvec::SmallVec;

use crate::dom::Document;
use crate::selection::{Selection, find_with_matcher, map_nodes};
use crate::selector::{Matcher, Selector};

/// Which siblings a walk collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SiblingKind {
    PrevUntil,
    PrevAll,
    Prev,
    All,
    Next,
    NextAll,
    NextUntil,
    AllIncludingNonElements,
}

impl Selection {
    // -------------------------------------------------------------------
    // Descendants
    // -------------------------------------------------------------------

    /// Descendants of the selected nodes matching `selector`: all matches
    /// under context node 0 in document order, then context node 1, with
    /// cross-context duplicates removed by identity.
    pub fn find(self, doc: &Document, selector: &str) -> Selection {
        self.find_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn find_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let found = find_with_matcher(doc, self.nodes(), m);
        self.push(found)
    }

    /// Members of the other selection that are strict descendants of any
    /// selected node.
    pub fn find_selection(self, doc: &Document, sel: &Selection) -> Selection {
        let nodes = sel.nodes().to_vec();
        self.find_nodes(doc, &nodes)
    }

    pub fn find_nodes(self, doc: &Document, nodes: &[NodeId]) -> Selection {
        let found = map_nodes(nodes, |_, n| {
            if self.nodes().iter().any(|&c| doc.node_contains(c, n)) {
                SmallVec::from_slice(&[n])
            } else {
                SmallVec::new()
            }
        });
        self.push(found)
    }

    /// Element children of each selected node.
    pub fn children(self, doc: &Document) -> Selection {
        let kids = get_children_nodes(doc, self.nodes(), SiblingKind::All);
        self.push(kids)
    }

    pub fn children_filtered(self, doc: &Document, selector: &str) -> Selection {
        self.children_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn children_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let kids = get_children_nodes(doc, self.nodes(), SiblingKind::All);
        self.filter_and_push(doc, kids, m)
    }

    /// All children of each selected node, non-element nodes included.
    pub fn contents(self, doc: &Document) -> Selection {
        let kids = get_children_nodes(doc, self.nodes(), SiblingKind::AllIncludingNonElements);
        self.push(kids)
    }

    pub fn contents_filtered(self, doc: &Document, selector: &str) -> Selection {
        if selector.is_empty() {
            return self.contents(doc);
        }
        self.children_filtered(doc, selector)
    }

    // -------------------------------------------------------------------
    // Ancestors
    // -------------------------------------------------------------------

    /// The immediate parent of each selected node, elements only.
    pub fn parent(self, doc: &Document) -> Selection {
        let parents = get_parent_nodes(doc, self.nodes());
        self.push(parents)
    }

    pub fn parent_filtered(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        let parents = get_parent_nodes(doc, self.nodes());
        self.filter_and_push(doc, parents, m)
    }

    /// All element ancestors of each selected node, nearest first.
    pub fn parents(self, doc: &Document) -> Selection {
        let ancestors = get_parents_nodes(doc, self.nodes(), None::<&Selector>, None);
        self.push(ancestors)
    }

    pub fn parents_filtered(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        let ancestors = get_parents_nodes(doc, self.nodes(), None::<&Selector>, None);
        self.filter_and_push(doc, ancestors, m)
    }

    /// Ancestors up to, but excluding, the first one matching `selector`.
    pub fn parents_until(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        let ancestors = get_parents_nodes(doc, self.nodes(), Some(&m), None);
        self.push(ancestors)
    }

    pub fn parents_until_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let ancestors = get_parents_nodes(doc, self.nodes(), Some(&m), None);
        self.push(ancestors)
    }

    /// Ancestors up to, but excluding, the first one in the other
    /// selection.
    pub fn parents_until_selection(self, doc: &Document, sel: &Selection) -> Selection {
        let nodes = sel.nodes().to_vec();
        self.parents_until_nodes(doc, &nodes)
    }

    pub fn parents_until_nodes(self, doc: &Document, nodes: &[NodeId]) -> Selection {
        let ancestors = get_parents_nodes(doc, self.nodes(), None::<&Selector>, Some(nodes));
        self.push(ancestors)
    }

    /// For each selected node, the nearest ancestor (self included)
    /// matching `selector`.
    pub fn closest(self, doc: &Document, selector: &str) -> Selection {
        self.closest_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn closest_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let found = map_nodes(self.nodes(), |_, n| {
            let mut cur = Some(n);
            while let Some(c) = cur {
                if m.matches(doc, c) {
                    return SmallVec::from_slice(&[c]);
                }
                cur = doc.parent(c);
            }
            SmallVec::new()
        });
        self.push(found)
    }

    pub fn closest_nodes(self, doc: &Document, nodes: &[NodeId]) -> Selection {
        let found = map_nodes(self.nodes(), |_, n| {
            let mut cur = Some(n);
            while let Some(c) = cur {
                if nodes.contains(&c) {
                    return SmallVec::from_slice(&[c]);
                }
                cur = doc.parent(c);
            }
            SmallVec::new()
        });
        self.push(found)
    }

    pub fn closest_selection(self, doc: &Document, sel: &Selection) -> Selection {
        let nodes = sel.nodes().to_vec();
        self.closest_nodes(doc, &nodes)
    }

    // -------------------------------------------------------------------
    // Siblings
    // -------------------------------------------------------------------

    /// All element siblings of each selected node, excluding the node
    /// itself.
    pub fn siblings(self, doc: &Document) -> Selection {
        let sibs = get_sibling_nodes(doc, self.nodes(), SiblingKind::All, None::<&Selector>, None);
        self.push(sibs)
    }

    pub fn siblings_filtered(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        let sibs = get_sibling_nodes(doc, self.nodes(), SiblingKind::All, None::<&Selector>, None);
        self.filter_and_push(doc, sibs, m)
    }

    /// The nearest following element sibling of each selected node, if any.
    pub fn next(self, doc: &Document) -> Selection {
        let sibs = get_sibling_nodes(doc, self.nodes(), SiblingKind::Next, None::<&Selector>, None);
        self.push(sibs)
    }

    pub fn next_filtered(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        let sibs = get_sibling_nodes(doc, self.nodes(), SiblingKind::Next, None::<&Selector>, None);
        self.filter_and_push(doc, sibs, m)
    }

    /// All following element siblings of each selected node.
    pub fn next_all(self, doc: &Document) -> Selection {
        let sibs =
            get_sibling_nodes(doc, self.nodes(), SiblingKind::NextAll, None::<&Selector>, None);
        self.push(sibs)
    }

    pub fn next_all_filtered(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        let sibs =
            get_sibling_nodes(doc, self.nodes(), SiblingKind::NextAll, None::<&Selector>, None);
        self.filter_and_push(doc, sibs, m)
    }

    /// Following element siblings up to, but excluding, the first one
    /// matching `selector`.
    pub fn next_until(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        let sibs = get_sibling_nodes(doc, self.nodes(), SiblingKind::NextUntil, Some(&m), None);
        self.push(sibs)
    }

    pub fn next_until_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let sibs = get_sibling_nodes(doc, self.nodes(), SiblingKind::NextUntil, Some(&m), None);
        self.push(sibs)
    }

    pub fn next_until_selection(self, doc: &Document, sel: &Selection) -> Selection {
        let nodes = sel.nodes().to_vec();
        self.next_until_nodes(doc, &nodes)
    }

    pub fn next_until_nodes(self, doc: &Document, nodes: &[NodeId]) -> Selection {
        let sibs = get_sibling_nodes(
            doc,
            self.nodes(),
            SiblingKind::NextUntil,
            None::<&Selector>,
            Some(nodes),
        );
        self.push(sibs)
    }

    /// The nearest preceding element sibling of each selected node, if any.
    pub fn prev(self, doc: &Document) -> Selection {
        let sibs = get_sibling_nodes(doc, self.nodes(), SiblingKind::Prev, None::<&Selector>, None);
        self.push(sibs)
    }

    pub fn prev_filtered(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        let sibs = get_sibling_nodes(doc, self.nodes(), SiblingKind::Prev, None::<&Selector>, None);
        self.filter_and_push(doc, sibs, m)
    }

    /// All preceding element siblings of each selected node, nearest
    /// first.
    pub fn prev_all(self, doc: &Document) -> Selection {
        let sibs =
            get_sibling_nodes(doc, self.nodes(), SiblingKind::PrevAll, None::<&Selector>, None);
        self.push(sibs)
    }

    pub fn prev_all_filtered(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        let sibs =
            get_sibling_nodes(doc, self.nodes(), SiblingKind::PrevAll, None::<&Selector>, None);
        self.filter_and_push(doc, sibs, m)
    }

    /// Preceding element siblings up to, but excluding, the first one
    /// matching `selector`.
    pub fn prev_until(self, doc: &Document, selector: &str) -> Selection {
        let m = Selector::compile_lenient(selector);
        let sibs = get_sibling_nodes(doc, self.nodes(), SiblingKind::PrevUntil, Some(&m), None);
        self.push(sibs)
    }

    pub fn prev_until_matcher(self, doc: &Document, m: impl Matcher) -> Selection {
        let sibs = get_sibling_nodes(doc, self.nodes(), SiblingKind::PrevUntil, Some(&m), None);
        self.push(sibs)
    }

    pub fn prev_until_selection(self, doc: &Document, sel: &Selection) -> Selection {
        let nodes = sel.nodes().to_vec();
        self.prev_until_nodes(doc, &nodes)
    }

    pub fn prev_until_nodes(self, doc: &Document, nodes: &[NodeId]) -> Selection {
        let sibs = get_sibling_nodes(
            doc,
            self.nodes(),
            SiblingKind::PrevUntil,
            None::<&Selector>,
            Some(nodes),
        );
        self.push(sibs)
    }

    fn filter_and_push(self, doc: &Document, nodes: Vec<NodeId>, m: impl Matcher) -> Selection {
        let filtered = m.filter(doc, &nodes);
        self.push(filtered)
    }
}

fn get_parent_nodes(doc: &Document, nodes: &[NodeId]) -> Vec<NodeId> {
    map_nodes(nodes, |_, n| match doc.parent(n) {
        Some(p) if doc.is_element(p) => SmallVec::from_slice(&[p]),
        _ => SmallVec::new(),
    })
}

fn get_parents_nodes(
    doc: &Document,
    nodes: &[NodeId],
    stop_matcher: Option<&impl Matcher>,
    stop_nodes: Option<&[NodeId]>,
) -> Vec<NodeId> {
    map_nodes(nodes, |_, n| {
        let mut result = SmallVec::new();
        let mut cur = doc.parent(n);
        while let Some(p) = cur {
            if let Some(m) = stop_matcher {
                if m.matches(doc, p) {
                    break;
                }
            } else if let Some(stops) = stop_nodes
                && !stops.is_empty()
                && stops.contains(&p)
            {
                break;
            }
            if doc.is_element(p) {
                result.push(p);
            }
            cur = doc.parent(p);
        }
        result
    })
}

fn get_children_nodes(doc: &Document, nodes: &[NodeId], kind: SiblingKind) -> Vec<NodeId> {
    map_nodes(nodes, |_, n| {
        collect_siblings(doc, Some(n), kind, None, |_| false)
    })
}

fn get_sibling_nodes(
    doc: &Document,
    nodes: &[NodeId],
    kind: SiblingKind,
    until_matcher: Option<&impl Matcher>,
    until_nodes: Option<&[NodeId]>,
) -> Vec<NodeId> {
    let until = |c: NodeId| -> bool {
        if let Some(m) = until_matcher {
            return m.matches(doc, c);
        }
        if let Some(stops) = until_nodes {
            return !stops.is_empty() && stops.contains(&c);
        }
        false
    };

    map_nodes(nodes, |_, n| {
        collect_siblings(doc, doc.parent(n), kind, Some(n), &until)
    })
}

/// The seven-way sibling walk. `skip_node` is the origin node (excluded from
/// `All` results, the anchor for directional walks); `until` stops the
/// `*Until` kinds before the matching sibling.
fn collect_siblings(
    doc: &Document,
    parent: Option<NodeId>,
    kind: SiblingKind,
    skip_node: Option<NodeId>,
    until: impl Fn(NodeId) -> bool,
) -> SmallVec<[NodeId; 4]> {
    use SiblingKind::*;

    let mut result = SmallVec::new();
    match kind {
        All | AllIncludingNonElements => {
            let Some(parent) = parent else {
                return result;
            };
            for c in doc.children(parent) {
                if Some(c) == skip_node {
                    continue;
                }
                if kind == AllIncludingNonElements || doc.is_element(c) {
                    result.push(c);
                }
            }
        }
        Prev | PrevAll | PrevUntil => {
            let Some(start) = skip_node else {
                return result;
            };
            let mut cur = doc.prev_sibling(start);
            while let Some(c) = cur {
                if doc.is_element(c) {
                    if kind == PrevUntil && until(c) {
                        break;
                    }
                    result.push(c);
                    if kind == Prev {
                        break;
                    }
                }
                cur = doc.prev_sibling(c);
            }
        }
        Next | NextAll | NextUntil => {
            let Some(start) = skip_node else {
                return result;
            };
            let mut cur = doc.next_sibling(start);
            while let Some(c) = cur {
                if doc.is_element(c) {
                    if kind == NextUntil && until(c) {
                        break;
                    }
                    result.push(c);
                    if kind == Next {
                        break;
                    }
                }
                cur = doc.next_sibling(c);
            }
        }
    }
    result
}
