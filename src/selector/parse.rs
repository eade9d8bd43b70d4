//! Recursive-descent compiler for selector text.
//!
//! Grammar (informal):
//!
//! ```text
//! selector-group := selector (',' selector)*
//! selector      := compound (combinator compound)*
//! combinator    := ' ' | '>' | '+' | '~'
//! compound      := (type | '*')? (class | id | attr | pseudo-class)* pseudo-element?
//! attr          := '[' ident (op value)? 'i'? ']'
//! op            := '=' | '!=' | '~=' | '|=' | '^=' | '$=' | '*=' | '#='
//! ```
//!
//! The entire input must be consumed; trailing text is an error carrying the
//! byte offset and leftover length. Whitespace includes CSS `/* */` comments.

use regex::Regex;

use super::pseudo::PseudoClass;
use super::{AttrOp, AttrSelector, Combinator, Sel, SelectorGroup};

/// Selector compilation failure. Raised only at the strict entry points;
/// the lenient path ([`super::Selector::compile_lenient`]) converts any of
/// these into a never-matching selector.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    /// The grammar stopped before the end of the input.
    #[error("parsing {text:?}: {remaining} bytes left over at offset {offset}")]
    TrailingInput {
        text: String,
        offset: usize,
        remaining: usize,
    },

    #[error("expected {expected}, found EOF instead")]
    UnexpectedEof { expected: &'static str },

    #[error("expected {expected}, found {found:?} at offset {offset}")]
    Unexpected {
        expected: &'static str,
        found: char,
        offset: usize,
    },

    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },

    #[error("unexpected end of line in string at offset {offset}")]
    UnexpectedLineEnding { offset: usize },

    #[error("invalid An+B argument at offset {offset}")]
    InvalidNth { offset: usize },

    #[error("unmatched parenthesis or bracket in regular expression at offset {offset}")]
    UnmatchedRegexDelimiters { offset: usize },

    #[error("invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("unsupported attribute operator {op:?} at offset {offset}")]
    UnknownOperator { op: String, offset: usize },

    #[error("unknown pseudo-class :{name}")]
    UnknownPseudoClass { name: String },

    #[error("unknown pseudo-element ::{name}")]
    UnknownPseudoElement { name: String },

    #[error("pseudo-element ::{name} found, but pseudo-elements are not accepted here")]
    PseudoElementNotAccepted { name: String },

    #[error("pseudo-element ::{name} must be at the end of a selector")]
    PseudoElementNotLast { name: String },

    #[error("only one pseudo-element is accepted per selector, got ::{first} and ::{second}")]
    DuplicatePseudoElement { first: String, second: String },
}

/// Compile a single selector (no pseudo-elements accepted).
pub fn parse(selector: &str) -> Result<Sel, ParseError> {
    let mut p = Parser::new(selector, false);
    let compiled = p.parse_selector()?;
    p.finish()?;
    Ok(compiled)
}

/// Compile a single selector, accepting a trailing pseudo-element.
pub fn parse_with_pseudo_element(selector: &str) -> Result<Sel, ParseError> {
    let mut p = Parser::new(selector, true);
    let compiled = p.parse_selector()?;
    p.finish()?;
    Ok(compiled)
}

/// Compile a comma-separated selector group (no pseudo-elements accepted).
pub fn parse_group(selector: &str) -> Result<SelectorGroup, ParseError> {
    let mut p = Parser::new(selector, false);
    let compiled = p.parse_selector_group()?;
    p.finish()?;
    Ok(compiled)
}

/// Compile a comma-separated selector group, accepting pseudo-elements.
pub fn parse_group_with_pseudo_elements(selector: &str) -> Result<SelectorGroup, ParseError> {
    let mut p = Parser::new(selector, true);
    let compiled = p.parse_selector_group()?;
    p.finish()?;
    Ok(compiled)
}

fn name_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c > 127
}

fn name_char(c: u8) -> bool {
    name_start(c) || c.is_ascii_digit() || c == b'-'
}

/// Pseudo-element names, both `::`-prefixed and legacy single-colon forms.
fn is_pseudo_element_name(name: &str) -> bool {
    matches!(
        name,
        "after"
            | "backdrop"
            | "before"
            | "cue"
            | "first-letter"
            | "first-line"
            | "grammar-error"
            | "marker"
            | "placeholder"
            | "selection"
            | "spelling-error"
    )
}

/// Outcome of parsing one `:`-prefixed component.
enum PseudoResult {
    Sel(Sel),
    Element(String),
}

struct Parser<'a> {
    s: &'a str,
    i: usize,
    accept_pseudo_elements: bool,
}

impl<'a> Parser<'a> {
    fn new(s: &'a str, accept_pseudo_elements: bool) -> Self {
        Self {
            s,
            i: 0,
            accept_pseudo_elements,
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.s.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.i).copied()
    }

    /// Error with the whole input consumed, or the trailing-input error.
    fn finish(&self) -> Result<(), ParseError> {
        if self.i < self.s.len() {
            return Err(ParseError::TrailingInput {
                text: self.s.to_string(),
                offset: self.i,
                remaining: self.s.len() - self.i,
            });
        }
        Ok(())
    }

    /// Skip whitespace and `/* */` comments. Returns true if anything was
    /// consumed.
    fn skip_whitespace(&mut self) -> bool {
        let b = self.bytes();
        let mut i = self.i;
        while i < b.len() {
            match b[i] {
                b' ' | b'\t' | b'\r' | b'\n' | 0x0C => {
                    i += 1;
                    continue;
                }
                b'/' if self.s[i..].starts_with("/*") => {
                    if let Some(end) = self.s[i + 2..].find("*/") {
                        i += 2 + end + 2;
                        continue;
                    }
                }
                _ => {}
            }
            break;
        }
        if i > self.i {
            self.i = i;
            return true;
        }
        false
    }

    /// A single escape sequence: `\` followed by up to six hex digits (plus
    /// an optional terminating whitespace), or a literal character.
    fn parse_escape(&mut self) -> Result<String, ParseError> {
        let b = self.bytes();
        if self.s.len() < self.i + 2 || b[self.i] != b'\\' {
            return Err(ParseError::InvalidEscape { offset: self.i });
        }
        let start = self.i + 1;
        let c = b[start];
        match c {
            b'\r' | b'\n' | 0x0C => Err(ParseError::InvalidEscape { offset: self.i }),
            _ if c.is_ascii_hexdigit() => {
                let mut i = start;
                while i < start + 6 && i < b.len() && b[i].is_ascii_hexdigit() {
                    i += 1;
                }
                let v = u32::from_str_radix(&self.s[start..i], 16)
                    .map_err(|_| ParseError::InvalidEscape { offset: self.i })?;
                if b.len() > i {
                    match b[i] {
                        b'\r' => {
                            i += 1;
                            if b.len() > i && b[i] == b'\n' {
                                i += 1;
                            }
                        }
                        b' ' | b'\t' | b'\n' | 0x0C => i += 1,
                        _ => {}
                    }
                }
                self.i = i;
                let ch = char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER);
                Ok(ch.to_string())
            }
            _ => {
                let ch = self.s[start..]
                    .chars()
                    .next()
                    .ok_or(ParseError::InvalidEscape { offset: self.i })?;
                self.i = start + ch.len_utf8();
                Ok(ch.to_string())
            }
        }
    }

    /// A run of name characters and escapes.
    fn parse_name(&mut self) -> Result<String, ParseError> {
        let b = self.bytes();
        let mut i = self.i;
        let mut result = String::new();
        loop {
            if i >= b.len() {
                break;
            }
            let c = b[i];
            if name_char(c) {
                let start = i;
                while i < b.len() && name_char(b[i]) {
                    i += 1;
                }
                result.push_str(&self.s[start..i]);
            } else if c == b'\\' {
                self.i = i;
                let val = self.parse_escape()?;
                i = self.i;
                result.push_str(&val);
            } else {
                break;
            }
        }
        if result.is_empty() {
            return match self.bytes().get(i) {
                Some(&c) => Err(ParseError::Unexpected {
                    expected: "name",
                    found: c as char,
                    offset: i,
                }),
                None => Err(ParseError::UnexpectedEof { expected: "name" }),
            };
        }
        self.i = i;
        Ok(result)
    }

    /// A CSS identifier: optional `-` prefixes, then a name starting with a
    /// name-start character or an escape.
    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let mut num_prefix = 0;
        while self.peek() == Some(b'-') {
            self.i += 1;
            num_prefix += 1;
        }
        match self.peek() {
            None => Err(ParseError::UnexpectedEof {
                expected: "identifier",
            }),
            Some(c) if !(name_start(c) || c == b'\\') => Err(ParseError::Unexpected {
                expected: "identifier",
                found: c as char,
                offset: self.i,
            }),
            Some(_) => {
                let name = self.parse_name()?;
                Ok("-".repeat(num_prefix) + &name)
            }
        }
    }

    /// A quoted string with escapes.
    fn parse_string(&mut self) -> Result<String, ParseError> {
        let b = self.bytes();
        let mut i = self.i;
        if b.len() < i + 2 {
            return Err(ParseError::UnexpectedEof { expected: "string" });
        }
        let quote = b[i];
        i += 1;

        let mut result = String::new();
        loop {
            if i >= b.len() {
                return Err(ParseError::UnexpectedEof { expected: "string" });
            }
            match b[i] {
                b'\\' => {
                    if b.len() > i + 1 {
                        match b[i + 1] {
                            b'\r' => {
                                // escaped CRLF line continuation
                                if b.len() > i + 2 && b[i + 2] == b'\n' {
                                    i += 3;
                                } else {
                                    i += 2;
                                }
                                continue;
                            }
                            b'\n' | 0x0C => {
                                i += 2;
                                continue;
                            }
                            _ => {}
                        }
                    }
                    self.i = i;
                    let val = self.parse_escape()?;
                    i = self.i;
                    result.push_str(&val);
                }
                c if c == quote => break,
                b'\r' | b'\n' | 0x0C => {
                    return Err(ParseError::UnexpectedLineEnding { offset: i });
                }
                _ => {
                    let start = i;
                    while i < b.len() {
                        let c = b[i];
                        if c == quote || c == b'\\' || c == b'\r' || c == b'\n' || c == 0x0C {
                            break;
                        }
                        i += 1;
                    }
                    result.push_str(&self.s[start..i]);
                }
            }
        }

        self.i = i + 1;
        Ok(result)
    }

    /// A regular expression argument, delimited by the surrounding
    /// parentheses or brackets.
    fn parse_regex(&mut self) -> Result<Regex, ParseError> {
        let b = self.bytes();
        let mut i = self.i;
        if b.len() < i + 2 {
            return Err(ParseError::UnexpectedEof {
                expected: "regular expression",
            });
        }

        // number of open parens or brackets; done when it goes negative
        let mut depth: i32 = 0;
        while i < b.len() {
            match b[i] {
                b'(' | b'[' => depth += 1,
                b')' | b']' => {
                    depth -= 1;
                    if depth < 0 {
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        if depth != -1 {
            return Err(ParseError::UnmatchedRegexDelimiters { offset: self.i });
        }

        let rx = Regex::new(&self.s[self.i..i])?;
        self.i = i;
        Ok(rx)
    }

    fn parse_integer(&mut self) -> Result<i32, ParseError> {
        let b = self.bytes();
        let start = self.i;
        let mut i = start;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return Err(ParseError::InvalidNth { offset: start });
        }
        let v: i32 = self.s[start..i]
            .parse()
            .map_err(|_| ParseError::InvalidNth { offset: start })?;
        self.i = i;
        Ok(v)
    }

    /// The `An+B` micro-grammar, also accepting bare `odd`/`even`.
    fn parse_nth(&mut self) -> Result<(i32, i32), ParseError> {
        let offset = self.i;
        let Some(c) = self.peek() else {
            return Err(ParseError::UnexpectedEof {
                expected: "nth expression",
            });
        };

        if matches!(c, b'o' | b'O' | b'e' | b'E') {
            let name = self.parse_name()?.to_ascii_lowercase();
            return match name.as_str() {
                "odd" => Ok((2, 1)),
                "even" => Ok((2, 0)),
                _ => Err(ParseError::InvalidNth { offset }),
            };
        }

        let mut negative_a = false;
        match c {
            b'-' => {
                negative_a = true;
                self.i += 1;
            }
            b'+' => self.i += 1,
            _ => {}
        }

        let a: i32;
        match self.peek() {
            None => {
                return Err(ParseError::UnexpectedEof {
                    expected: "nth expression",
                });
            }
            Some(c) if c.is_ascii_digit() => {
                let v = self.parse_integer()?;
                if matches!(self.peek(), Some(b'n' | b'N')) {
                    a = if negative_a { -v } else { v };
                    self.i += 1;
                } else {
                    // a bare integer is the B term
                    return Ok((0, if negative_a { -v } else { v }));
                }
            }
            Some(b'n' | b'N') => {
                a = if negative_a { -1 } else { 1 };
                self.i += 1;
            }
            Some(_) => return Err(ParseError::InvalidNth { offset }),
        }

        self.skip_whitespace();
        match self.peek() {
            Some(b'+') => {
                self.i += 1;
                self.skip_whitespace();
                let b = self.parse_integer()?;
                Ok((a, b))
            }
            Some(b'-') => {
                self.i += 1;
                self.skip_whitespace();
                let b = self.parse_integer()?;
                Ok((a, -b))
            }
            _ => Ok((a, 0)),
        }
    }

    fn consume_parenthesis(&mut self) -> bool {
        if self.peek() == Some(b'(') {
            self.i += 1;
            self.skip_whitespace();
            return true;
        }
        false
    }

    fn consume_closing_parenthesis(&mut self) -> bool {
        let i = self.i;
        self.skip_whitespace();
        if self.peek() == Some(b')') {
            self.i += 1;
            return true;
        }
        self.i = i;
        false
    }

    fn expect_parenthesis(&mut self) -> Result<(), ParseError> {
        if self.consume_parenthesis() {
            return Ok(());
        }
        match self.peek() {
            Some(c) => Err(ParseError::Unexpected {
                expected: "'('",
                found: c as char,
                offset: self.i,
            }),
            None => Err(ParseError::UnexpectedEof { expected: "'('" }),
        }
    }

    fn expect_closing_parenthesis(&mut self) -> Result<(), ParseError> {
        if self.consume_closing_parenthesis() {
            return Ok(());
        }
        match self.peek() {
            Some(c) => Err(ParseError::Unexpected {
                expected: "')'",
                found: c as char,
                offset: self.i,
            }),
            None => Err(ParseError::UnexpectedEof { expected: "')'" }),
        }
    }

    fn parse_type_selector(&mut self) -> Result<Sel, ParseError> {
        let tag = self.parse_identifier()?;
        Ok(Sel::Tag(tag.to_ascii_lowercase()))
    }

    fn parse_id_selector(&mut self) -> Result<Sel, ParseError> {
        self.i += 1; // '#'
        let id = self.parse_name()?;
        Ok(Sel::Id(id))
    }

    fn parse_class_selector(&mut self) -> Result<Sel, ParseError> {
        self.i += 1; // '.'
        let class = self.parse_identifier()?;
        Ok(Sel::Class(class))
    }

    fn parse_attribute_selector(&mut self) -> Result<Sel, ParseError> {
        self.i += 1; // '['
        self.skip_whitespace();
        let key = self.parse_identifier()?.to_ascii_lowercase();
        self.skip_whitespace();

        if self.peek() == Some(b']') {
            self.i += 1;
            return Ok(Sel::Attr(AttrSelector {
                key,
                val: String::new(),
                op: AttrOp::Exists,
                insensitive: false,
            }));
        }

        if self.i + 1 >= self.s.len() {
            return Err(ParseError::UnexpectedEof {
                expected: "attribute selector",
            });
        }

        let b = self.bytes();
        let op_len = if b[self.i] == b'=' {
            1
        } else if b[self.i + 1] == b'=' {
            2
        } else {
            return Err(ParseError::UnknownOperator {
                op: String::from_utf8_lossy(&b[self.i..self.i + 2]).into_owned(),
                offset: self.i,
            });
        };
        let op_str = &self.s[self.i..self.i + op_len];
        let op_offset = self.i;
        self.i += op_len;
        self.skip_whitespace();

        if self.i >= self.s.len() {
            return Err(ParseError::UnexpectedEof {
                expected: "attribute value",
            });
        }

        let mut val = String::new();
        let op = match op_str {
            "#=" => AttrOp::Regex(self.parse_regex()?),
            _ => {
                val = match self.peek() {
                    Some(b'\'') | Some(b'"') => self.parse_string()?,
                    _ => self.parse_identifier()?,
                };
                match op_str {
                    "=" => AttrOp::Equals,
                    "!=" => AttrOp::NotEqual,
                    "~=" => AttrOp::Includes,
                    "|=" => AttrOp::DashMatch,
                    "^=" => AttrOp::Prefix,
                    "$=" => AttrOp::Suffix,
                    "*=" => AttrOp::Substring,
                    _ => {
                        return Err(ParseError::UnknownOperator {
                            op: op_str.to_string(),
                            offset: op_offset,
                        });
                    }
                }
            }
        };

        self.skip_whitespace();
        let mut insensitive = false;
        if matches!(self.peek(), Some(b'i' | b'I')) {
            insensitive = true;
            self.i += 1;
        }
        self.skip_whitespace();

        match self.peek() {
            Some(b']') => {
                self.i += 1;
                Ok(Sel::Attr(AttrSelector {
                    key,
                    val,
                    op,
                    insensitive,
                }))
            }
            Some(c) => Err(ParseError::Unexpected {
                expected: "']'",
                found: c as char,
                offset: self.i,
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "attribute selector",
            }),
        }
    }

    fn parse_pseudoclass_selector(&mut self) -> Result<PseudoResult, ParseError> {
        self.i += 1; // ':'
        let mut must_be_pseudo_element = false;
        if self.peek() == Some(b':') {
            must_be_pseudo_element = true;
            self.i += 1;
        }

        let name = self.parse_identifier()?.to_ascii_lowercase();

        if must_be_pseudo_element {
            if is_pseudo_element_name(&name) {
                return Ok(PseudoResult::Element(name));
            }
            return Err(ParseError::UnknownPseudoElement { name });
        }

        let sel = match name.as_str() {
            "not" | "has" | "haschild" => {
                self.expect_parenthesis()?;
                let group = self.parse_selector_group()?;
                self.expect_closing_parenthesis()?;
                Sel::Pseudo(match name.as_str() {
                    "not" => PseudoClass::Not(group),
                    "has" => PseudoClass::Has(group),
                    _ => PseudoClass::HasChild(group),
                })
            }
            "contains" | "containsown" => {
                self.expect_parenthesis()?;
                let value = match self.peek() {
                    Some(b'\'') | Some(b'"') => self.parse_string()?,
                    Some(_) => self.parse_identifier()?,
                    None => {
                        return Err(ParseError::UnexpectedEof {
                            expected: "text argument",
                        });
                    }
                };
                self.skip_whitespace();
                self.expect_closing_parenthesis()?;
                Sel::Pseudo(PseudoClass::Contains {
                    value: value.to_lowercase(),
                    own: name == "containsown",
                })
            }
            "matches" | "matchesown" => {
                self.expect_parenthesis()?;
                let pattern = self.parse_regex()?;
                self.expect_closing_parenthesis()?;
                Sel::Pseudo(PseudoClass::Matches {
                    pattern,
                    own: name == "matchesown",
                })
            }
            "nth-child" | "nth-last-child" | "nth-of-type" | "nth-last-of-type" => {
                self.expect_parenthesis()?;
                let (a, b) = self.parse_nth()?;
                self.expect_closing_parenthesis()?;
                Sel::Pseudo(PseudoClass::Nth {
                    a,
                    b,
                    last: name == "nth-last-child" || name == "nth-last-of-type",
                    of_type: name == "nth-of-type" || name == "nth-last-of-type",
                })
            }
            "first-child" => Sel::Pseudo(PseudoClass::Nth {
                a: 0,
                b: 1,
                last: false,
                of_type: false,
            }),
            "last-child" => Sel::Pseudo(PseudoClass::Nth {
                a: 0,
                b: 1,
                last: true,
                of_type: false,
            }),
            "first-of-type" => Sel::Pseudo(PseudoClass::Nth {
                a: 0,
                b: 1,
                last: false,
                of_type: true,
            }),
            "last-of-type" => Sel::Pseudo(PseudoClass::Nth {
                a: 0,
                b: 1,
                last: true,
                of_type: true,
            }),
            "only-child" => Sel::Pseudo(PseudoClass::OnlyChild { of_type: false }),
            "only-of-type" => Sel::Pseudo(PseudoClass::OnlyChild { of_type: true }),
            "input" => Sel::Pseudo(PseudoClass::Input),
            "empty" => Sel::Pseudo(PseudoClass::Empty),
            "root" => Sel::Pseudo(PseudoClass::Root),
            "link" => Sel::Pseudo(PseudoClass::Link),
            "lang" => {
                self.expect_parenthesis()?;
                if self.peek().is_none() {
                    return Err(ParseError::UnexpectedEof {
                        expected: "language code",
                    });
                }
                let lang = self.parse_identifier()?;
                self.expect_closing_parenthesis()?;
                Sel::Pseudo(PseudoClass::Lang(lang))
            }
            "enabled" => Sel::Pseudo(PseudoClass::Enabled),
            "disabled" => Sel::Pseudo(PseudoClass::Disabled),
            "checked" => Sel::Pseudo(PseudoClass::Checked),
            _ if is_pseudo_element_name(&name) => {
                // legacy single-colon pseudo-element
                return Ok(PseudoResult::Element(name));
            }
            _ => {
                // Syntactically valid but unsupported pseudo-class names
                // (":visited", ":hover", ...) compile to the never-match
                // selector. A name taking arguments we don't know how to
                // parse is still an error.
                if self.peek() == Some(b'(') {
                    return Err(ParseError::UnknownPseudoClass { name });
                }
                Sel::Never
            }
        };

        Ok(PseudoResult::Sel(sel))
    }

    /// A sequence of simple selectors with an optional trailing
    /// pseudo-element, ANDed into a compound selector.
    fn parse_simple_selector_sequence(&mut self) -> Result<Sel, ParseError> {
        let mut selectors: Vec<Sel> = Vec::new();

        match self.peek() {
            None => {
                return Err(ParseError::UnexpectedEof {
                    expected: "selector",
                });
            }
            Some(b'*') => {
                // universal selector
                self.i += 1;
            }
            Some(b'#') | Some(b'.') | Some(b'[') | Some(b':') => {
                // defer to the main loop
            }
            Some(_) => selectors.push(self.parse_type_selector()?),
        }

        let mut pseudo_element = String::new();
        loop {
            let result = match self.peek() {
                Some(b'#') => PseudoResult::Sel(self.parse_id_selector()?),
                Some(b'.') => PseudoResult::Sel(self.parse_class_selector()?),
                Some(b'[') => PseudoResult::Sel(self.parse_attribute_selector()?),
                Some(b':') => self.parse_pseudoclass_selector()?,
                _ => break,
            };
            match result {
                PseudoResult::Element(name) => {
                    // only one pseudo-element per selector, in last position
                    if !pseudo_element.is_empty() {
                        return Err(ParseError::DuplicatePseudoElement {
                            first: pseudo_element,
                            second: name,
                        });
                    }
                    if !self.accept_pseudo_elements {
                        return Err(ParseError::PseudoElementNotAccepted { name });
                    }
                    pseudo_element = name;
                }
                PseudoResult::Sel(sel) => {
                    if !pseudo_element.is_empty() {
                        return Err(ParseError::PseudoElementNotLast {
                            name: pseudo_element,
                        });
                    }
                    selectors.push(sel);
                }
            }
        }

        if selectors.len() == 1 && pseudo_element.is_empty() {
            return Ok(selectors.pop().expect("len checked"));
        }
        Ok(Sel::Compound {
            sels: selectors,
            pseudo_element,
        })
    }

    fn parse_selector(&mut self) -> Result<Sel, ParseError> {
        self.skip_whitespace();
        let mut result = self.parse_simple_selector_sequence()?;

        loop {
            let mut combinator: Option<Combinator> = None;
            if self.skip_whitespace() {
                combinator = Some(Combinator::Descendant);
            }
            let Some(c) = self.peek() else {
                return Ok(result);
            };
            match c {
                b'>' => {
                    combinator = Some(Combinator::Child);
                    self.i += 1;
                    self.skip_whitespace();
                }
                b'+' => {
                    combinator = Some(Combinator::AdjacentSibling);
                    self.i += 1;
                    self.skip_whitespace();
                }
                b'~' => {
                    combinator = Some(Combinator::GeneralSibling);
                    self.i += 1;
                    self.skip_whitespace();
                }
                b',' | b')' => {
                    // can't begin a selector, but can legally occur after one
                    return Ok(result);
                }
                _ => {}
            }
            let Some(combinator) = combinator else {
                return Ok(result);
            };

            let second = self.parse_simple_selector_sequence()?;
            result = Sel::Combined {
                first: Box::new(result),
                combinator,
                second: Box::new(second),
            };
        }
    }

    fn parse_selector_group(&mut self) -> Result<SelectorGroup, ParseError> {
        let first = self.parse_selector()?;
        let mut group = vec![first];
        while self.peek() == Some(b',') {
            self.i += 1;
            group.push(self.parse_selector()?);
        }
        Ok(SelectorGroup(group))
    }
}
