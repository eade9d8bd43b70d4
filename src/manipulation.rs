//! Selection mutation: insertion, removal, replacement, wrapping and
//! cloning.
//!
//! Node-identity rule for every insertion operation: when the same node is
//! inserted at multiple target positions, every target except the
//! structurally-last selected one receives a deep clone; the last target
//! receives the original node, detached from wherever it currently resides.
//! A node therefore has at most one parent at all times.

use std::collections::HashMap;

use indextree::NodeId;

use crate::dom::Document;
use crate::parser::parse_fragment;
use crate::selection::Selection;
use crate::selector::{Matcher, Selector};
use crate::serialize::escape_text;
use crate::tracing_macros::debug;

impl Selection {
    // -------------------------------------------------------------------
    // Removal & cloning
    // -------------------------------------------------------------------

    /// Detach each selected node from its parent. No-op for nodes that are
    /// already parentless; children stay with the detached subtrees.
    pub fn remove(self, doc: &mut Document) -> Selection {
        for &n in self.nodes() {
            doc.remove_child(n);
        }
        self
    }

    /// Remove only the selected nodes matching `selector`.
    pub fn remove_filtered(self, doc: &mut Document, selector: &str) -> Selection {
        self.remove_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn remove_matcher(self, doc: &mut Document, m: impl Matcher) -> Selection {
        self.filter_matcher(doc, m).remove(doc)
    }

    /// Detach all direct children of each selected node, returning them as
    /// a new selection.
    pub fn empty(self, doc: &mut Document) -> Selection {
        let mut removed = Vec::new();
        for &n in &self.nodes().to_vec() {
            while let Some(c) = doc.first_child(n) {
                doc.remove_child(c);
                removed.push(c);
            }
        }
        self.push(removed)
    }

    /// Deep-copy each selected node's subtree. The copies get fresh
    /// identities and are not attached anywhere.
    pub fn clone_nodes(self, doc: &mut Document) -> Selection {
        let copies = self
            .nodes()
            .to_vec()
            .into_iter()
            .map(|n| doc.clone_node(n))
            .collect();
        Selection::from_nodes(copies)
    }

    // -------------------------------------------------------------------
    // Insertion family
    // -------------------------------------------------------------------

    /// Insert the document-wide matches of `selector` after each selected
    /// node.
    pub fn after(self, doc: &mut Document, selector: &str) -> Selection {
        self.after_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn after_matcher(self, doc: &mut Document, m: impl Matcher) -> Selection {
        let ns = m.match_all(doc, doc.root);
        self.after_nodes(doc, &ns)
    }

    pub fn after_selection(self, doc: &mut Document, sel: &Selection) -> Selection {
        let ns = sel.nodes().to_vec();
        self.after_nodes(doc, &ns)
    }

    pub fn after_nodes(self, doc: &mut Document, ns: &[NodeId]) -> Selection {
        self.manipulate_nodes(doc, ns, true, |doc, sn, n| {
            if let Some(parent) = doc.parent(sn) {
                let next = doc.next_sibling(sn);
                doc.insert_before(parent, n, next);
            }
        })
    }

    /// Parse `html` against each target's parent context and insert the
    /// fragment after each selected node.
    pub fn after_html(self, doc: &mut Document, html: &str) -> Selection {
        self.each_node_html(doc, html, true, |doc, node, fresh| {
            if let Some(parent) = doc.parent(node) {
                let next = doc.next_sibling(node);
                for &n in fresh {
                    doc.insert_before(parent, n, next);
                }
            }
        })
    }

    /// Append the document-wide matches of `selector` to each selected
    /// node's children.
    pub fn append(self, doc: &mut Document, selector: &str) -> Selection {
        self.append_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn append_matcher(self, doc: &mut Document, m: impl Matcher) -> Selection {
        let ns = m.match_all(doc, doc.root);
        self.append_nodes(doc, &ns)
    }

    pub fn append_selection(self, doc: &mut Document, sel: &Selection) -> Selection {
        let ns = sel.nodes().to_vec();
        self.append_nodes(doc, &ns)
    }

    pub fn append_nodes(self, doc: &mut Document, ns: &[NodeId]) -> Selection {
        self.manipulate_nodes(doc, ns, false, |doc, sn, n| {
            doc.append_child(sn, n);
        })
    }

    pub fn append_html(self, doc: &mut Document, html: &str) -> Selection {
        self.each_node_html(doc, html, false, |doc, node, fresh| {
            for &n in fresh {
                doc.append_child(node, n);
            }
        })
    }

    /// Insert the document-wide matches of `selector` before each selected
    /// node.
    pub fn before(self, doc: &mut Document, selector: &str) -> Selection {
        self.before_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn before_matcher(self, doc: &mut Document, m: impl Matcher) -> Selection {
        let ns = m.match_all(doc, doc.root);
        self.before_nodes(doc, &ns)
    }

    pub fn before_selection(self, doc: &mut Document, sel: &Selection) -> Selection {
        let ns = sel.nodes().to_vec();
        self.before_nodes(doc, &ns)
    }

    pub fn before_nodes(self, doc: &mut Document, ns: &[NodeId]) -> Selection {
        self.manipulate_nodes(doc, ns, false, |doc, sn, n| {
            if let Some(parent) = doc.parent(sn) {
                doc.insert_before(parent, n, Some(sn));
            }
        })
    }

    pub fn before_html(self, doc: &mut Document, html: &str) -> Selection {
        self.each_node_html(doc, html, true, |doc, node, fresh| {
            if let Some(parent) = doc.parent(node) {
                for &n in fresh {
                    doc.insert_before(parent, n, Some(node));
                }
            }
        })
    }

    /// Prepend the document-wide matches of `selector` to each selected
    /// node's children.
    pub fn prepend(self, doc: &mut Document, selector: &str) -> Selection {
        self.prepend_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn prepend_matcher(self, doc: &mut Document, m: impl Matcher) -> Selection {
        let ns = m.match_all(doc, doc.root);
        self.prepend_nodes(doc, &ns)
    }

    pub fn prepend_selection(self, doc: &mut Document, sel: &Selection) -> Selection {
        let ns = sel.nodes().to_vec();
        self.prepend_nodes(doc, &ns)
    }

    pub fn prepend_nodes(self, doc: &mut Document, ns: &[NodeId]) -> Selection {
        self.manipulate_nodes(doc, ns, true, |doc, sn, n| {
            let first = doc.first_child(sn);
            doc.insert_before(sn, n, first);
        })
    }

    pub fn prepend_html(self, doc: &mut Document, html: &str) -> Selection {
        self.each_node_html(doc, html, false, |doc, node, fresh| {
            let first = doc.first_child(node);
            for &n in fresh {
                doc.insert_before(node, n, first);
            }
        })
    }

    // -------------------------------------------------------------------
    // Replacement
    // -------------------------------------------------------------------

    /// Replace each selected node with the document-wide matches of
    /// `selector`. Equivalent to `after` followed by `remove`.
    pub fn replace_with(self, doc: &mut Document, selector: &str) -> Selection {
        self.replace_with_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn replace_with_matcher(self, doc: &mut Document, m: impl Matcher) -> Selection {
        let ns = m.match_all(doc, doc.root);
        self.replace_with_nodes(doc, &ns)
    }

    pub fn replace_with_selection(self, doc: &mut Document, sel: &Selection) -> Selection {
        let ns = sel.nodes().to_vec();
        self.replace_with_nodes(doc, &ns)
    }

    pub fn replace_with_nodes(self, doc: &mut Document, ns: &[NodeId]) -> Selection {
        self.after_nodes(doc, ns).remove(doc)
    }

    pub fn replace_with_html(self, doc: &mut Document, html: &str) -> Selection {
        self.each_node_html(doc, html, true, |doc, node, fresh| {
            if let Some(parent) = doc.parent(node) {
                let next = doc.next_sibling(node);
                for &n in fresh {
                    doc.insert_before(parent, n, next);
                }
            }
        })
        .remove(doc)
    }

    /// Replace all children of each selected node with the parsed fragment.
    pub fn set_html(self, doc: &mut Document, html: &str) -> Selection {
        for n in self.nodes().to_vec() {
            while let Some(c) = doc.first_child(n) {
                doc.remove_child(c);
            }
        }
        self.each_node_html(doc, html, false, |doc, node, fresh| {
            for &n in fresh {
                doc.append_child(node, n);
            }
        })
    }

    /// Escape `text` and route it through the same replace-all-children
    /// path as [`Selection::set_html`].
    pub fn set_text(self, doc: &mut Document, text: &str) -> Selection {
        self.set_html(doc, &escape_text(text))
    }

    // -------------------------------------------------------------------
    // Wrapping
    // -------------------------------------------------------------------

    /// Wrap each selected node in a clone of the first document-wide match
    /// of `selector`.
    pub fn wrap(self, doc: &mut Document, selector: &str) -> Selection {
        self.wrap_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn wrap_matcher(self, doc: &mut Document, m: impl Matcher) -> Selection {
        let ns = m.match_all(doc, doc.root);
        self.wrap_nodes(doc, &ns)
    }

    pub fn wrap_selection(self, doc: &mut Document, sel: &Selection) -> Selection {
        let ns = sel.nodes().to_vec();
        self.wrap_nodes(doc, &ns)
    }

    pub fn wrap_node(self, doc: &mut Document, n: NodeId) -> Selection {
        self.wrap_nodes(doc, &[n])
    }

    fn wrap_nodes(self, doc: &mut Document, ns: &[NodeId]) -> Selection {
        if let Some(&wrapper) = ns.first() {
            for n in self.nodes().to_vec() {
                wrap_all_node(doc, &[n], wrapper);
            }
        }
        self
    }

    pub fn wrap_html(self, doc: &mut Document, html: &str) -> Selection {
        let mut cache: HashMap<String, Document> = HashMap::new();
        for context in self.nodes().to_vec() {
            let name = match doc.parent(context) {
                Some(p) => doc.node_name(p).to_string(),
                None => String::new(),
            };
            let frag = cache
                .entry(name)
                .or_insert_with_key(|key| parse_fragment(html, key));
            let fresh = doc.import_fragment(frag);
            if let Some(&wrapper) = fresh.first() {
                wrap_all_node(doc, &[context], wrapper);
            }
        }
        self
    }

    /// Wrap the whole selection in a single clone of the first
    /// document-wide match of `selector`, inserted at the first selected
    /// node's original position; all selected nodes move inside the
    /// deepest first-element-child of the wrapper, in original order.
    pub fn wrap_all(self, doc: &mut Document, selector: &str) -> Selection {
        self.wrap_all_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn wrap_all_matcher(self, doc: &mut Document, m: impl Matcher) -> Selection {
        let ns = m.match_all(doc, doc.root);
        self.wrap_all_nodes(doc, &ns)
    }

    pub fn wrap_all_selection(self, doc: &mut Document, sel: &Selection) -> Selection {
        let ns = sel.nodes().to_vec();
        self.wrap_all_nodes(doc, &ns)
    }

    pub fn wrap_all_node(self, doc: &mut Document, n: NodeId) -> Selection {
        let targets = self.nodes().to_vec();
        wrap_all_node(doc, &targets, n);
        self
    }

    fn wrap_all_nodes(self, doc: &mut Document, ns: &[NodeId]) -> Selection {
        match ns.first() {
            Some(&wrapper) => self.wrap_all_node(doc, wrapper),
            None => self,
        }
    }

    pub fn wrap_all_html(self, doc: &mut Document, html: &str) -> Selection {
        if self.is_empty() {
            return self;
        }
        let first = self.nodes()[0];
        let context_tag = match doc.parent(first) {
            Some(_) => doc.node_name(first).to_string(),
            None => String::new(),
        };
        let frag = parse_fragment(html, &context_tag);
        let fresh = doc.import_fragment(&frag);
        self.wrap_all_nodes(doc, &fresh)
    }

    /// Wrap each selected node's existing children in a clone of the first
    /// document-wide match of `selector`; childless nodes get a clone of
    /// the wrapper appended instead.
    pub fn wrap_inner(self, doc: &mut Document, selector: &str) -> Selection {
        self.wrap_inner_matcher(doc, Selector::compile_lenient(selector))
    }

    pub fn wrap_inner_matcher(self, doc: &mut Document, m: impl Matcher) -> Selection {
        let ns = m.match_all(doc, doc.root);
        self.wrap_inner_nodes(doc, &ns)
    }

    pub fn wrap_inner_selection(self, doc: &mut Document, sel: &Selection) -> Selection {
        let ns = sel.nodes().to_vec();
        self.wrap_inner_nodes(doc, &ns)
    }

    pub fn wrap_inner_node(self, doc: &mut Document, n: NodeId) -> Selection {
        self.wrap_inner_nodes(doc, &[n])
    }

    fn wrap_inner_nodes(self, doc: &mut Document, ns: &[NodeId]) -> Selection {
        let Some(&wrapper) = ns.first() else {
            return self;
        };
        for n in self.nodes().to_vec() {
            wrap_inner_single(doc, n, wrapper);
        }
        self
    }

    pub fn wrap_inner_html(self, doc: &mut Document, html: &str) -> Selection {
        let mut cache: HashMap<String, Document> = HashMap::new();
        for context in self.nodes().to_vec() {
            let name = doc.node_name(context).to_string();
            let frag = cache
                .entry(name)
                .or_insert_with_key(|key| parse_fragment(html, key));
            let fresh = doc.import_fragment(frag);
            if let Some(&wrapper) = fresh.first() {
                wrap_inner_single(doc, context, wrapper);
            }
        }
        self
    }

    /// For each parent of the selection, replace the parent with its own
    /// children in place. The `body` container is protected.
    pub fn unwrap(self, doc: &mut Document) -> Selection {
        let parents = self.clone().parent(doc);
        for p in parents.nodes().to_vec() {
            if doc.tag(p) == Some("body") {
                continue;
            }
            let Some(grandparent) = doc.parent(p) else {
                continue;
            };
            let next = doc.next_sibling(p);
            let contents: Vec<NodeId> = doc.children(p).collect();
            for c in contents {
                doc.insert_before(grandparent, c, next);
            }
            doc.remove_child(p);
        }
        self
    }

    // -------------------------------------------------------------------
    // Shared plumbing
    // -------------------------------------------------------------------

    /// Apply `f(target, node)` for every (target, inserted node) pair,
    /// honoring the clone policy: only the structurally-last target
    /// receives the originals, detached first; every other target receives
    /// deep clones.
    fn manipulate_nodes(
        self,
        doc: &mut Document,
        ns: &[NodeId],
        reverse: bool,
        f: impl Fn(&mut Document, NodeId, NodeId),
    ) -> Selection {
        let targets = self.nodes().to_vec();
        let Some((last, init)) = targets.split_last() else {
            return self;
        };

        let mut ns = ns.to_vec();
        if reverse {
            ns.reverse();
        }

        for &sn in init {
            for &n in &ns {
                let copy = doc.clone_node(n);
                f(doc, sn, copy);
            }
        }
        for &n in &ns {
            doc.remove_child(n);
            f(doc, *last, n);
        }

        self
    }

    /// Parse `html` once per distinct context tag and reuse the parsed
    /// fragment for targets sharing that context; each reuse clones the
    /// cached fragment into the document's arena.
    fn each_node_html(
        self,
        doc: &mut Document,
        html: &str,
        is_parent: bool,
        merge: impl Fn(&mut Document, NodeId, &[NodeId]),
    ) -> Selection {
        let mut cache: HashMap<String, Document> = HashMap::new();
        for n in self.nodes().to_vec() {
            let context = if is_parent {
                doc.parent(n)
            } else if doc.is_element(n) {
                Some(n)
            } else {
                None
            };
            let Some(context) = context else {
                continue;
            };

            let name = doc.node_name(context).to_string();
            let frag = cache.entry(name).or_insert_with_key(|key| {
                debug!("parsing fragment for context {key:?}");
                parse_fragment(html, key)
            });
            let fresh = doc.import_fragment(frag);
            merge(doc, n, &fresh);
        }
        self
    }
}

/// Insert a clone of `wrapper` at the first target's position and move all
/// targets inside the clone's deepest first-element-child.
fn wrap_all_node(doc: &mut Document, targets: &[NodeId], wrapper: NodeId) {
    let Some(&first) = targets.first() else {
        return;
    };

    let wrap = doc.clone_node(wrapper);

    if let Some(parent) = doc.parent(first) {
        doc.insert_before(parent, wrap, Some(first));
        doc.remove_child(first);
    }

    let mut inner = wrap;
    while let Some(c) = get_first_child_el(doc, inner) {
        inner = c;
    }

    for &t in targets {
        doc.append_child(inner, t);
    }
}

fn wrap_inner_single(doc: &mut Document, node: NodeId, wrapper: NodeId) {
    let contents: Vec<NodeId> = doc.children(node).collect();
    if contents.is_empty() {
        let copy = doc.clone_node(wrapper);
        doc.append_child(node, copy);
    } else {
        wrap_all_node(doc, &contents, wrapper);
    }
}

fn get_first_child_el(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut c = doc.first_child(id);
    while let Some(n) = c {
        if doc.is_element(n) {
            return Some(n);
        }
        c = doc.next_sibling(n);
    }
    None
}
