//! CSS-selector querying and jQuery-style manipulation over an arena-based
//! HTML DOM.
//!
//! quercus provides:
//! - **Arena DOM**: all nodes of a [`Document`] in one indextree arena,
//!   structural links as indices, detach/reinsert as pure relinking
//! - **Parsing**: browser-compatible HTML5 parsing via html5ever with full
//!   error recovery, including context-sensitive fragment parsing
//! - **Selectors**: a CSS3-like grammar (type/class/id/attribute selectors,
//!   combinators, structural and relational pseudo-classes, pseudo-elements,
//!   groups) compiled once into a reusable [`Selector`]
//! - **Selections**: ordered, de-duplicated node sets with traversal, set
//!   algebra, a chained-undo stack and in-place tree mutation
//! - **Serialization**: HTML5-correct output with proper escaping
//!
//! # Example
//!
//! ```rust
//! use quercus::parse_document;
//!
//! let mut doc = parse_document(
//!     "<html><body><ul><li>one</li><li class='x'>two</li></ul></body></html>",
//! );
//!
//! // compile-once selectors, chained traversal
//! let items = doc.select("ul > li");
//! assert_eq!(items.len(), 2);
//! let all = items.not(&doc, ".x").end();
//! assert_eq!(all.len(), 2);
//!
//! // mutation through a selection
//! let list = doc.select("ul");
//! list.append_html(&mut doc, "<li>three</li>");
//! assert_eq!(doc.select("li").len(), 3);
//! ```

mod tracing_macros;

pub mod dom;
mod manipulation;
mod parser;
pub mod selection;
pub mod selector;
pub mod serialize;
mod traversal;

pub use indextree::NodeId;

// Re-export the DOM types at crate root for convenience
pub use dom::{Document, ElementData, Namespace, NodeData, NodeKind};

// Re-export parsing functions
pub use parser::{parse_document, parse_fragment};

// Re-export the selector surface
pub use selector::{
    Combinator, Matcher, ParseError, PseudoClass, Sel, Selector, SelectorGroup, Single,
    Specificity, single,
};

pub use selection::{Selection, TO_END};

// Re-export serialization
pub use serialize::{escape_text, inner_html, outer_html, render};
