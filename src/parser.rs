//! HTML5 parsing straight into the arena.
//!
//! Implements html5ever's `TreeSink` so the browser-compatible tree
//! construction algorithm (with full error recovery) builds [`Document`]
//! nodes directly - the same representation the selector engine and the
//! mutation engine operate on, no conversion pass.

use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, QualName};
use html5ever::{local_name, namespace_url, ns};
use indextree::{Arena, NodeId};
use std::borrow::Cow;
use std::cell::RefCell;
use tendril::{StrTendril, TendrilSink};

use crate::dom::{Document, ElementData, Namespace, NodeData, NodeKind};

/// Parse a full HTML document.
///
/// html5ever recovers from any malformed markup the way a browser would, so
/// this never fails.
pub fn parse_document(html: &str) -> Document {
    let sink = ArenaSink::new();
    // html5ever creates subtendrils sharing this buffer via refcounting
    let tendril = StrTendril::from(html);
    html5ever::parse_document(sink, Default::default()).one(tendril)
}

/// Parse an HTML fragment relative to a context element.
///
/// Fragment parsing is context-sensitive: the same markup parses differently
/// inside `<table>` than inside `<div>`. The parsed fragment nodes end up as
/// the children of the returned document's root node, in order.
pub fn parse_fragment(html: &str, context_tag: &str) -> Document {
    let sink = ArenaSink::new();
    let tendril = StrTendril::from(html);
    let context_name = QualName::new(None, ns!(html), LocalName::from(context_tag));
    let mut doc =
        html5ever::parse_fragment(sink, Default::default(), context_name, Vec::new()).one(tendril);

    // The tree builder parks fragment content under a synthetic <html>
    // element; re-root it directly under the document node.
    if let Some(wrapper) = doc.first_child(doc.root) {
        let kids: Vec<NodeId> = doc.children(wrapper).collect();
        for kid in kids {
            doc.append_child(doc.root, kid);
        }
        doc.remove_child(wrapper);
    }
    doc
}

/// Owned element name wrapper.
#[derive(Debug, Clone)]
struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// TreeSink implementation building the arena-based DOM.
struct ArenaSink {
    /// Wrapped in RefCell for the interior mutability TreeSink requires
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,
}

impl ArenaSink {
    fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData::new(NodeKind::Document));
        ArenaSink {
            arena: RefCell::new(arena),
            document,
        }
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = Document;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        Document {
            arena: self.arena.into_inner(),
            root: self.document,
            url: None,
        }
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers automatically
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        let node = arena[*target].get();

        if let NodeKind::Element(elem) = &node.kind {
            let local = LocalName::from(elem.tag.as_ref());
            let ns = match node.ns {
                Namespace::Html => ns!(html),
                Namespace::Svg => ns!(svg),
                Namespace::MathMl => ns!(mathml),
            };
            OwnedElemName(QualName {
                prefix: None,
                ns,
                local,
            })
        } else {
            OwnedElemName(QualName {
                prefix: None,
                ns: ns!(html),
                local: local_name!(""),
            })
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let tag = StrTendril::from(name.local.as_ref());
        let ns = Namespace::from_url(name.ns.as_ref());

        let mut elem = ElementData::new(tag);
        // first occurrence of a duplicated attribute wins
        for attr in attrs {
            elem.attrs
                .entry(attr.name.local.to_string())
                .or_insert(attr.value);
        }

        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Element(elem),
            ns,
        })
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.arena
            .borrow_mut()
            .new_node(NodeData::new(NodeKind::Comment(text)))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // processing instructions become empty comments
        self.arena
            .borrow_mut()
            .new_node(NodeData::new(NodeKind::Comment(StrTendril::new())))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // merge with a trailing text node (html5ever behavior)
                let last_child = arena[*parent].last_child();
                if let Some(last_child) = last_child
                    && let NodeKind::Text(existing) = &mut arena[last_child].get_mut().kind
                {
                    existing.push_tendril(&text);
                    return;
                }

                let text_node = arena.new_node(NodeData::new(NodeKind::Text(text)));
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => {
                sibling.insert_before(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                let text_node = arena.new_node(NodeData::new(NodeKind::Text(text)));
                sibling.insert_before(text_node, &mut arena);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        _prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        self.append(element, child);
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut arena = self.arena.borrow_mut();
        let doctype = arena.new_node(NodeData::new(NodeKind::Doctype(name)));
        self.document.append(doctype, &mut arena);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // template contents are kept inline under the element
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Element(elem) = &mut arena[*target].get_mut().kind {
            for attr in attrs {
                elem.attrs
                    .entry(attr.name.local.to_string())
                    .or_insert(attr.value);
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&arena).collect();
        for child in children {
            child.detach(&mut arena);
            new_parent.append(child, &mut arena);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_html() {
        let html = "<html><body><p>Hello</p></body></html>";
        let doc = parse_document(html);

        let root_elem = doc.root_element().expect("should have html element");
        assert_eq!(doc.tag(root_elem), Some("html"));

        let body = doc.body().expect("should have body");
        let p = doc.first_child(body).expect("body should have child");
        assert_eq!(doc.tag(p), Some("p"));
        assert_eq!(doc.text_content(p), "Hello");
    }

    #[test]
    fn test_parse_with_attributes() {
        let html = r#"<html><body><div class="container" id="main">Content</div></body></html>"#;
        let doc = parse_document(html);

        let body = doc.body().unwrap();
        let div = doc.first_child(body).unwrap();
        assert_eq!(doc.attr(div, "class"), Some("container"));
        assert_eq!(doc.attr(div, "id"), Some("main"));
        assert_eq!(doc.attr(div, "missing"), None);
    }

    #[test]
    fn test_parse_doctype_node() {
        let html = "<!DOCTYPE html><html><body></body></html>";
        let doc = parse_document(html);

        let first = doc.first_child(doc.root).unwrap();
        match &doc.get(first).kind {
            NodeKind::Doctype(name) => assert_eq!(name.as_ref(), "html"),
            other => panic!("expected doctype first, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_comment() {
        let html = "<html><body><!-- a comment --></body></html>";
        let doc = parse_document(html);
        let body = doc.body().unwrap();
        let comment = doc.first_child(body).unwrap();
        match &doc.get(comment).kind {
            NodeKind::Comment(text) => assert_eq!(text.as_ref(), " a comment "),
            other => panic!("expected comment, got {other:?}"),
        }
    }

    #[test]
    fn test_error_recovery() {
        // unclosed tags parse the way a browser recovers them
        let doc = parse_document("<div><span>text");
        let body = doc.body().unwrap();
        let div = doc.first_child(body).unwrap();
        assert_eq!(doc.tag(div), Some("div"));
        let span = doc.first_child(div).unwrap();
        assert_eq!(doc.tag(span), Some("span"));
        assert_eq!(doc.text_content(span), "text");
    }

    #[test]
    fn test_fragment_children_under_root() {
        let frag = parse_fragment("<li>a</li><li>b</li>", "ul");
        let tops: Vec<_> = frag.children(frag.root).collect();
        assert_eq!(tops.len(), 2);
        assert_eq!(frag.tag(tops[0]), Some("li"));
        assert_eq!(frag.tag(tops[1]), Some("li"));
    }

    #[test]
    fn test_fragment_parsing_is_context_sensitive() {
        // <tr> survives in a table context and is stripped in a div context
        let in_table = parse_fragment("<tr><td>cell</td></tr>", "tbody");
        let tags: Vec<_> = in_table
            .children(in_table.root)
            .filter_map(|id| in_table.tag(id).map(str::to_string))
            .collect();
        assert_eq!(tags, vec!["tr"]);

        let in_div = parse_fragment("<tr><td>cell</td></tr>", "div");
        let has_tr = in_div
            .children(in_div.root)
            .any(|id| in_div.tag(id) == Some("tr"));
        assert!(!has_tr);
    }
}
