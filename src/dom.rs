//! Arena-based HTML DOM.
//!
//! All nodes of a document live in one indextree arena owned by [`Document`];
//! every structural "pointer" (parent, first/last child, prev/next sibling)
//! is a [`NodeId`] index into that arena. Detaching and reinserting a subtree
//! is pure index relinking, and detached subtrees stay allocated for the
//! lifetime of the document, so a stale `NodeId` can never dangle.

use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use tendril::StrTendril;
use url::Url;

/// XML/HTML namespace for elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    /// HTML namespace (default)
    #[default]
    Html,
    /// SVG namespace
    Svg,
    /// MathML namespace
    MathMl,
}

impl Namespace {
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/1999/xhtml" => Namespace::Html,
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html,
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

/// What goes in each arena slot.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub ns: Namespace,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            ns: Namespace::Html,
        }
    }
}

/// Node types.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// DOCTYPE declaration (usually "html")
    Doctype(StrTendril),
    /// Element with tag and attributes
    Element(ElementData),
    /// Text content (StrTendril is refcounted - cheap to clone)
    Text(StrTendril),
    /// HTML comment
    Comment(StrTendril),
}

impl NodeKind {
    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element(_))
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match self {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }
}

/// Element data (tag + attributes).
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name (lowercase for HTML, case-preserved for SVG/MathML)
    pub tag: StrTendril,

    /// Attributes - keys are String, values are StrTendril.
    /// IndexMap preserves insertion order; duplicate keys from the markup
    /// keep their first value.
    pub attrs: IndexMap<String, StrTendril>,
}

impl ElementData {
    pub fn new(tag: impl Into<StrTendril>) -> Self {
        Self {
            tag: tag.into(),
            attrs: IndexMap::new(),
        }
    }
}

/// Document = arena + root node + originating URL.
///
/// `root` is the document node (parent of `<html>`), not the `<html>`
/// element itself. Cloning a `Document` deep-copies the whole arena; all
/// `NodeId`s remain valid against the copy.
#[derive(Debug, Clone)]
pub struct Document {
    /// THE tree - all nodes live here
    pub arena: Arena<NodeData>,

    /// Document node (`NodeKind::Document`)
    pub root: NodeId,

    /// URL the document was loaded from, if the caller provided one
    pub url: Option<Url>,
}

impl Document {
    /// Create an empty document holding only the document node.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData::new(NodeKind::Document));
        Self {
            arena,
            root,
            url: None,
        }
    }

    /// Get immutable reference to node data.
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Get mutable reference to node data.
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].first_child()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].last_child()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].next_sibling()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].previous_sibling()
    }

    /// Iterate children of a node.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.get(id).kind, NodeKind::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.get(id).kind, NodeKind::Text(_))
    }

    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.get(id).kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    /// Tag name if the node is an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|e| e.tag.as_ref())
    }

    /// Attribute value, if the node is an element carrying the attribute.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.as_element(id)?.attrs.get(name).map(|v| v.as_ref())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.as_element(id)
            .is_some_and(|e| e.attrs.contains_key(name))
    }

    /// jQuery-style node name: element tag / doctype name / `#text` /
    /// `#comment` / `#document`.
    pub fn node_name(&self, id: NodeId) -> &str {
        match &self.get(id).kind {
            NodeKind::Document => "#document",
            NodeKind::Doctype(name) => name.as_ref(),
            NodeKind::Element(elem) => elem.tag.as_ref(),
            NodeKind::Text(_) => "#text",
            NodeKind::Comment(_) => "#comment",
        }
    }

    /// The `<html>` element (first element child of the document node).
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root).find(|&id| self.is_element(id))
    }

    /// Get the `<body>` element if present.
    pub fn body(&self) -> Option<NodeId> {
        let html = self.root_element()?;
        self.children(html)
            .find(|&id| self.tag(id) == Some("body"))
    }

    /// Get the `<head>` element if present.
    pub fn head(&self) -> Option<NodeId> {
        let html = self.root_element()?;
        self.children(html)
            .find(|&id| self.tag(id) == Some("head"))
    }

    // -------------------------------------------------------------------
    // Mutation primitives - these keep all structural links consistent and
    // are O(1) index relinking
    // -------------------------------------------------------------------

    /// Create a new detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena
            .new_node(NodeData::new(NodeKind::Element(ElementData::new(tag))))
    }

    /// Create a new detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena
            .new_node(NodeData::new(NodeKind::Text(StrTendril::from(text))))
    }

    /// Set an attribute on an element node. No-op for other node kinds.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(elem) = self.get_mut(id).kind.as_element_mut() {
            elem.attrs.insert(name.to_string(), StrTendril::from(value));
        }
    }

    /// Append `child` as the last child of `parent`, detaching it from its
    /// current position first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        child.detach(&mut self.arena);
        parent.append(child, &mut self.arena);
    }

    /// Insert `new_node` into `parent` immediately before `reference`.
    /// A `None` reference appends at the end, like the DOM's `insertBefore`
    /// with a null reference node.
    pub fn insert_before(&mut self, parent: NodeId, new_node: NodeId, reference: Option<NodeId>) {
        new_node.detach(&mut self.arena);
        match reference {
            Some(next) => next.insert_before(new_node, &mut self.arena),
            None => parent.append(new_node, &mut self.arena),
        }
    }

    /// Detach a node from its parent. No-op if already parentless; the
    /// subtree below the node is preserved.
    pub fn remove_child(&mut self, child: NodeId) {
        child.detach(&mut self.arena);
    }

    /// Deep-copy a subtree. The copy gets fresh identities and is not
    /// attached anywhere.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let data = self.arena[id].get().clone();
        let new_id = self.arena.new_node(data);
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        for child in children {
            let copy = self.clone_node(child);
            new_id.append(copy, &mut self.arena);
        }
        new_id
    }

    /// Deep-copy a subtree out of another document's arena into this one.
    pub fn import_node(&mut self, src: &Document, id: NodeId) -> NodeId {
        let data = src.arena[id].get().clone();
        let new_id = self.arena.new_node(data);
        for child in id.children(&src.arena) {
            let copy = self.import_node(src, child);
            new_id.append(copy, &mut self.arena);
        }
        new_id
    }

    /// Import every top-level node of a parsed fragment, in order.
    pub fn import_fragment(&mut self, src: &Document) -> Vec<NodeId> {
        let tops: Vec<NodeId> = src.children(src.root).collect();
        tops.into_iter().map(|id| self.import_node(src, id)).collect()
    }

    // -------------------------------------------------------------------
    // Text extraction
    // -------------------------------------------------------------------

    /// Concatenated text of the node and all its descendants. Comments
    /// contribute nothing.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_text(id, &mut out);
        out
    }

    fn write_text(&self, id: NodeId, out: &mut String) {
        match &self.get(id).kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element(_) | NodeKind::Document => {
                for child in self.children(id) {
                    self.write_text(child, out);
                }
            }
            NodeKind::Comment(_) | NodeKind::Doctype(_) => {}
        }
    }

    /// Concatenated text of the node's direct text-node children only.
    pub fn own_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            if let NodeKind::Text(t) = &self.get(child).kind {
                out.push_str(t);
            }
        }
        out
    }

    /// True iff `contained` is a strict descendant of `container`.
    pub fn node_contains(&self, container: NodeId, contained: NodeId) -> bool {
        let mut cur = self.parent(contained);
        while let Some(p) = cur {
            if p == container {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let span = doc.create_element("span");
        let text = doc.create_text("hello");
        doc.append_child(doc.root, div);
        doc.append_child(div, span);
        doc.append_child(span, text);
        (doc, div, span, text)
    }

    #[test]
    fn test_structural_links() {
        let (doc, div, span, text) = sample();
        assert_eq!(doc.parent(span), Some(div));
        assert_eq!(doc.first_child(div), Some(span));
        assert_eq!(doc.last_child(span), Some(text));
        assert_eq!(doc.next_sibling(span), None);
    }

    #[test]
    fn test_detach_preserves_subtree() {
        let (mut doc, div, span, text) = sample();
        doc.remove_child(span);
        assert_eq!(doc.parent(span), None);
        assert_eq!(doc.first_child(div), None);
        // children stay with the detached subtree
        assert_eq!(doc.first_child(span), Some(text));
    }

    #[test]
    fn test_insert_before_null_reference_appends() {
        let (mut doc, div, span, _) = sample();
        let p = doc.create_element("p");
        doc.insert_before(div, p, None);
        assert_eq!(doc.last_child(div), Some(p));
        assert_eq!(doc.prev_sibling(p), Some(span));
    }

    #[test]
    fn test_clone_node_fresh_identities() {
        let (mut doc, div, span, _) = sample();
        let copy = doc.clone_node(div);
        assert_ne!(copy, div);
        assert_eq!(doc.parent(copy), None);
        assert_eq!(doc.tag(copy), Some("div"));
        let copied_span = doc.first_child(copy).unwrap();
        assert_ne!(copied_span, span);
        assert_eq!(doc.tag(copied_span), Some("span"));
        assert_eq!(doc.text_content(copy), "hello");
    }

    #[test]
    fn test_text_content_skips_comments() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.append_child(doc.root, div);
        let comment = doc
            .arena
            .new_node(NodeData::new(NodeKind::Comment(StrTendril::from("nope"))));
        doc.append_child(div, comment);
        let t = doc.create_text("yes");
        doc.append_child(div, t);
        assert_eq!(doc.text_content(div), "yes");
        assert_eq!(doc.own_text(div), "yes");
    }

    #[test]
    fn test_node_contains_is_strict() {
        let (doc, div, span, text) = sample();
        assert!(doc.node_contains(div, text));
        assert!(doc.node_contains(div, span));
        assert!(!doc.node_contains(span, span));
        assert!(!doc.node_contains(span, div));
    }
}
