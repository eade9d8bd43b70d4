//! HTML5-correct serialization of arena nodes.
//!
//! Follows HTML5 serialization rules:
//! - Void elements never get end tags
//! - Text content is properly escaped
//! - Attribute values are escaped and double-quoted
//! - Raw text elements (script, style) are not escaped
//! - RCDATA elements (title, textarea) escape only `&` and `<`
//! - Foreign content (SVG/MathML) can use self-closing syntax

use indextree::NodeId;
use std::fmt::{self, Write};

use crate::dom::{Document, ElementData, Namespace, NodeKind};

/// HTML5 void elements - these never have end tags.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Raw text elements - content is not escaped.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// RCDATA elements - only `&` and `<` are escaped.
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

fn is_rcdata_element(tag: &str) -> bool {
    RCDATA_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

/// Serialize exactly one node and its subtree into `out`.
pub fn render<W: Write>(doc: &Document, node: NodeId, out: &mut W) -> fmt::Result {
    Serializer { doc, out }.write_node(node)
}

/// The textual form of one node and its subtree.
pub fn outer_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    render(doc, node, &mut out).expect("writing to a String cannot fail");
    out
}

/// The textual form of a node's children.
pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    let mut ser = Serializer {
        doc,
        out: &mut out,
    };
    for child in doc.children(node) {
        ser.write_node(child).expect("writing to a String cannot fail");
    }
    out
}

/// Escape text for embedding in markup (`&`, `'`, `<`, `>`, `"`).
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            _ => out.push(c),
        }
    }
    out
}

impl Document {
    /// Serialize the whole document, DOCTYPE included.
    pub fn to_html(&self) -> String {
        inner_html(self, self.root)
    }
}

struct Serializer<'a, W: Write> {
    doc: &'a Document,
    out: &'a mut W,
}

impl<W: Write> Serializer<'_, W> {
    fn write_node(&mut self, id: NodeId) -> fmt::Result {
        match &self.doc.get(id).kind {
            NodeKind::Document => {
                for child in self.doc.children(id) {
                    self.write_node(child)?;
                }
                Ok(())
            }
            NodeKind::Doctype(name) => write!(self.out, "<!DOCTYPE {name}>"),
            NodeKind::Element(elem) => self.write_element(id, elem),
            NodeKind::Text(text) => self.write_text_escaped(text),
            NodeKind::Comment(text) => {
                // escape -- to prevent early closing
                let safe = text.replace("--", "- -");
                write!(self.out, "<!--{safe}-->")
            }
        }
    }

    fn write_element(&mut self, id: NodeId, elem: &ElementData) -> fmt::Result {
        let tag = elem.tag.as_ref();
        let is_foreign = self.doc.get(id).ns != Namespace::Html;

        write!(self.out, "<{tag}")?;
        for (name, value) in &elem.attrs {
            write!(self.out, " {name}=\"")?;
            self.write_attr_value_escaped(value)?;
            write!(self.out, "\"")?;
        }

        if is_void_element(tag) {
            return write!(self.out, ">");
        }

        let mut children = self.doc.children(id).peekable();
        if is_foreign && children.peek().is_none() {
            return write!(self.out, "/>");
        }

        write!(self.out, ">")?;

        if is_raw_text_element(tag) {
            for child in children {
                if let NodeKind::Text(text) = &self.doc.get(child).kind {
                    write!(self.out, "{text}")?;
                }
            }
        } else if is_rcdata_element(tag) {
            for child in children {
                if let NodeKind::Text(text) = &self.doc.get(child).kind {
                    self.write_rcdata_escaped(text)?;
                }
            }
        } else {
            for child in children {
                self.write_node(child)?;
            }
        }

        write!(self.out, "</{tag}>")
    }

    fn write_text_escaped(&mut self, text: &str) -> fmt::Result {
        for c in text.chars() {
            match c {
                '&' => write!(self.out, "&amp;")?,
                '<' => write!(self.out, "&lt;")?,
                '>' => write!(self.out, "&gt;")?,
                _ => self.out.write_char(c)?,
            }
        }
        Ok(())
    }

    fn write_rcdata_escaped(&mut self, text: &str) -> fmt::Result {
        for c in text.chars() {
            match c {
                '&' => write!(self.out, "&amp;")?,
                '<' => write!(self.out, "&lt;")?,
                _ => self.out.write_char(c)?,
            }
        }
        Ok(())
    }

    fn write_attr_value_escaped(&mut self, text: &str) -> fmt::Result {
        for c in text.chars() {
            match c {
                '&' => write!(self.out, "&amp;")?,
                '<' => write!(self.out, "&lt;")?,
                '>' => write!(self.out, "&gt;")?,
                '"' => write!(self.out, "&quot;")?,
                _ => self.out.write_char(c)?,
            }
        }
        Ok(())
    }
}
