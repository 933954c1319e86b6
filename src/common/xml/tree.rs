//! Owned, mutable XML element tree.
//!
//! Package parts are parsed with `quick-xml` into [`XmlElement`] values that keep
//! qualified names, attribute order and escaped character data exactly as they appear
//! in the source. Regions of a part that an edit never touches therefore serialize back
//! to the same markup, and namespace prefixes declared on the root stay valid.
//!
//! Attribute values and text are stored in their escaped form; the accessors
//! ([`XmlElement::attr`], [`XmlElement::text`]) unescape on the way out and the setters
//! escape on the way in.

use super::escape::{escape_attr, escape_text, unescape_xml};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// Declaration written in front of every serialized part.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct XmlTreeError(pub String);

/// A node inside an element's content.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Character data, escaped.
    Text(String),
    CData(String),
    Comment(String),
}

/// An XML element with its attributes and content.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    attrs: Vec<(String, String)>,
    nodes: Vec<XmlNode>,
}

/// Local part of a qualified name (`p:sldId` -> `sldId`).
#[inline]
pub fn local_name(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

/// Build a qualified name from an optional prefix.
#[inline]
pub fn qualify(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{}:{}", p, local),
        _ => local.to_string(),
    }
}

impl XmlElement {
    /// Create an empty element with the given qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Builder form of [`set_attr`](Self::set_attr).
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`push_child`](Self::push_child).
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push_child(child);
        self
    }

    /// Builder form of [`set_text`](Self::set_text).
    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    /// Parse a complete document and return its root element.
    ///
    /// The XML declaration, processing instructions and anything outside the
    /// root element are dropped.
    pub fn parse(xml: &[u8]) -> Result<Self, XmlTreeError> {
        let mut reader = Reader::from_reader(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => stack.push(Self::from_start(&e)?),
                Ok(Event::Empty(e)) => {
                    let element = Self::from_start(&e)?;
                    Self::attach(&mut stack, &mut root, element)?;
                },
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlTreeError("unexpected end tag".to_string()))?;
                    Self::attach(&mut stack, &mut root, element)?;
                },
                Ok(Event::Text(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_raw_text(&String::from_utf8_lossy(&e));
                    }
                },
                Ok(Event::GeneralRef(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let reference = format!("&{};", String::from_utf8_lossy(&e));
                        parent.push_raw_text(&reference);
                    }
                },
                Ok(Event::CData(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .nodes
                            .push(XmlNode::CData(String::from_utf8_lossy(&e).into_owned()));
                    }
                },
                Ok(Event::Comment(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .nodes
                            .push(XmlNode::Comment(String::from_utf8_lossy(&e).into_owned()));
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(XmlTreeError(format!(
                        "{} at position {}",
                        e,
                        reader.error_position()
                    )));
                },
                _ => {},
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlTreeError(format!("unclosed element <{}>", open.name)));
        }
        root.ok_or_else(|| XmlTreeError("document has no root element".to_string()))
    }

    fn from_start(e: &BytesStart<'_>) -> Result<Self, XmlTreeError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| XmlTreeError(err.to_string()))?;
            attrs.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            ));
        }
        Ok(Self {
            name,
            attrs,
            nodes: Vec::new(),
        })
    }

    fn attach(
        stack: &mut [XmlElement],
        root: &mut Option<XmlElement>,
        element: XmlElement,
    ) -> Result<(), XmlTreeError> {
        match stack.last_mut() {
            Some(parent) => {
                parent.nodes.push(XmlNode::Element(element));
                Ok(())
            },
            None if root.is_none() => {
                *root = Some(element);
                Ok(())
            },
            None => Err(XmlTreeError(format!(
                "second root element <{}>",
                element.name
            ))),
        }
    }

    fn push_raw_text(&mut self, raw: &str) {
        if let Some(XmlNode::Text(last)) = self.nodes.last_mut() {
            last.push_str(raw);
        } else {
            self.nodes.push(XmlNode::Text(raw.to_string()));
        }
    }

    /// Serialize as a standalone document with an XML declaration.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        self.write_into(&mut out);
        out
    }

    /// Serialize this element (without declaration) into `out`.
    pub fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            // Values read from single-quoted attributes may carry a bare quote.
            if value.contains('"') {
                out.push_str(&value.replace('"', "&quot;"));
            } else {
                out.push_str(value);
            }
            out.push('"');
        }
        if self.nodes.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.nodes {
            match node {
                XmlNode::Element(el) => el.write_into(out),
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::CData(data) => {
                    out.push_str("<![CDATA[");
                    out.push_str(data);
                    out.push_str("]]>");
                },
                XmlNode::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                },
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    // ---------------------------------------------------------------------
    // Names and attributes
    // ---------------------------------------------------------------------

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix of this element's name, if any.
    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.name.rsplit_once(':').map(|(prefix, _)| prefix)
    }

    /// Unescaped value of the attribute with the given qualified name.
    pub fn attr(&self, key: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| unescape_xml(v))
    }

    /// Set (or overwrite) an attribute. `value` is escaped.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        let escaped = escape_attr(value);
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = escaped,
            None => self.attrs.push((key.to_string(), escaped)),
        }
    }

    /// Remove an attribute, returning whether it was present.
    pub fn remove_attr(&mut self, key: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(k, _)| k != key);
        self.attrs.len() != before
    }

    /// Iterate attributes as `(qualified name, unescaped value)`.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.attrs.iter().map(|(k, v)| (k.as_str(), unescape_xml(v)))
    }

    /// Prefix bound to `namespace` by an `xmlns:*` declaration on this element.
    pub fn namespace_prefix(&self, namespace: &str) -> Option<&str> {
        self.attrs.iter().find_map(|(k, v)| {
            k.strip_prefix("xmlns:")
                .filter(|_| unescape_xml(v) == namespace)
        })
    }

    // ---------------------------------------------------------------------
    // Children
    // ---------------------------------------------------------------------

    /// All content nodes, including text and comments.
    #[inline]
    pub fn nodes(&self) -> &[XmlNode] {
        &self.nodes
    }

    /// Element children in document order.
    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.nodes.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.nodes.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Element children whose local name is `local`.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children().filter(move |el| el.local_name() == local)
    }

    /// First element child with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.children().find(|el| el.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.children_mut().find(|el| el.local_name() == local)
    }

    /// Follow a chain of local names from this element.
    pub fn find_path(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |el, local| el.child(local))
    }

    pub fn find_path_mut(&mut self, path: &[&str]) -> Option<&mut XmlElement> {
        let mut current = self;
        for local in path {
            current = current.child_mut(local)?;
        }
        Some(current)
    }

    /// Number of element children.
    pub fn child_count(&self) -> usize {
        self.children().count()
    }

    /// Append an element child.
    pub fn push_child(&mut self, child: XmlElement) {
        self.nodes.push(XmlNode::Element(child));
    }

    /// Insert `child` so that it becomes element child number `index`.
    ///
    /// An index past the end appends.
    pub fn insert_child(&mut self, index: usize, child: XmlElement) {
        let position = self.node_position(index).unwrap_or(self.nodes.len());
        self.nodes.insert(position, XmlNode::Element(child));
    }

    /// Remove element child number `index`.
    pub fn remove_child(&mut self, index: usize) -> Option<XmlElement> {
        let position = self.node_position(index)?;
        match self.nodes.remove(position) {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Keep only element children for which `keep` returns true.
    ///
    /// Returns the number of removed elements. Text and comment nodes are kept.
    pub fn retain_children(&mut self, mut keep: impl FnMut(&XmlElement) -> bool) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|node| match node {
            XmlNode::Element(el) => keep(el),
            _ => true,
        });
        before - self.nodes.len()
    }

    /// Remove every child element whose local name is in `locals`, then append
    /// `replacement` (when given).
    ///
    /// This is the primitive behind mutually exclusive child choices such as the
    /// bullet markers of a paragraph's properties. Returns the number removed.
    pub fn replace_children(&mut self, locals: &[&str], replacement: Option<XmlElement>) -> usize {
        let removed = self.retain_children(|el| !locals.contains(&el.local_name()));
        if let Some(el) = replacement {
            self.push_child(el);
        }
        removed
    }

    /// Return the child with local name `local`, creating `qname` when missing.
    ///
    /// A created child is placed after the last existing child whose local name
    /// appears in `after`, or first when none does.
    pub fn get_or_insert_child(&mut self, qname: &str, after: &[&str]) -> &mut XmlElement {
        let local = local_name(qname).to_string();
        let existing = self
            .nodes
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.local_name() == local));

        let position = match existing {
            Some(position) => position,
            None => {
                let position = self
                    .nodes
                    .iter()
                    .rposition(|node| {
                        matches!(node, XmlNode::Element(el) if after.contains(&el.local_name()))
                    })
                    .map_or(0, |p| p + 1);
                self.nodes
                    .insert(position, XmlNode::Element(XmlElement::new(qname)));
                position
            },
        };

        match &mut self.nodes[position] {
            XmlNode::Element(el) => el,
            _ => unreachable!("position always refers to an element node"),
        }
    }

    fn node_position(&self, index: usize) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, XmlNode::Element(_)))
            .nth(index)
            .map(|(position, _)| position)
    }

    /// Pre-order traversal of this element and all descendant elements.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Visit this element and every descendant element, parents first.
    pub fn for_each_descendant_mut(&mut self, f: &mut dyn FnMut(&mut XmlElement)) {
        f(self);
        for child in self.children_mut() {
            child.for_each_descendant_mut(f);
        }
    }

    // ---------------------------------------------------------------------
    // Text
    // ---------------------------------------------------------------------

    /// Unescaped direct character data of this element.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                XmlNode::Text(raw) => out.push_str(&unescape_xml(raw)),
                XmlNode::CData(data) => out.push_str(data),
                _ => {},
            }
        }
        out
    }

    /// Replace all content with a single text node. `text` is escaped.
    pub fn set_text(&mut self, text: &str) {
        self.nodes.clear();
        if !text.is_empty() {
            self.nodes.push(XmlNode::Text(escape_text(text)));
        }
    }
}

/// Iterator returned by [`XmlElement::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(current.children());
        self.stack[start..].reverse();
        Some(current)
    }
}
