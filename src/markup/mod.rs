//! Markup fragment produced by an emission.
//!
//! A fragment is an ordered list of nodes: elements (`script`, `link`,
//! `style`) with attributes and optional raw text, and bare text nodes.
//! Rendering to a document is the caller's concern; `Display` gives the
//! plain HTML serialization.

use std::fmt;

use crate::utils::html::{
    escape, escape_attr, guard_raw_text, is_raw_text_element, is_void_element,
};

// ============================================================================
// Element
// ============================================================================

/// An element with ordered attributes and raw text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    /// Text content. Script/style bodies are emitted raw.
    pub text: Option<String>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            text: None,
        }
    }

    /// `<script type="text/javascript">`
    pub fn script() -> Self {
        Self::new("script").attr("type", "text/javascript")
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Value of an attribute, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attrs {
            write!(f, " {}=\"{}\"", name, escape_attr(value))?;
        }
        f.write_str(">")?;
        if is_void_element(self.tag) {
            return Ok(());
        }
        if let Some(text) = &self.text {
            if is_raw_text_element(self.tag) {
                f.write_str(&guard_raw_text(self.tag, text))?;
            } else {
                f.write_str(&escape(text))?;
            }
        }
        write!(f, "</{}>", self.tag)
    }
}

// ============================================================================
// Fragment
// ============================================================================

/// A node of a [`Fragment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(el) => write!(f, "{el}"),
            Self::Text(text) => f.write_str(&escape(text)),
        }
    }
}

/// Ordered sequence of nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) {
        self.nodes.push(Node::Element(element));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.nodes.push(Node::Text(text.into()));
    }

    /// Insert an element before every other node.
    pub fn prepend(&mut self, element: Element) {
        self.nodes.insert(0, Node::Element(element));
    }

    /// Append all nodes of another fragment.
    pub fn extend(&mut self, other: Fragment) {
        self.nodes.extend(other.nodes);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Element nodes only, in order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.nodes.iter().try_for_each(|node| write!(f, "{node}"))
    }
}
