//! Generic namespace-aware element tree used as the storage layer of a map document.
//!
//! The tree keeps everything needed for a structural round-trip: element and attribute names
//! (with their namespaces), attribute values, text content and the text that trails each child
//! element. Comments and processing instructions are dropped.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const INDENT: &str = " ";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }

    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local == local
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: QName,
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
    /// Character data before the first child element.
    pub text: Option<String>,
    /// Character data between this element's end tag and the next sibling.
    pub tail: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            text: None,
            tail: None,
            children: Vec::new(),
        }
    }

    /// Looks up an attribute without a namespace (the common case for map documents).
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(None, local))
            .map(|a| a.value.as_str())
    }

    /// First direct child with the given qualified name.
    pub fn child(&self, namespace: Option<&str>, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name.is(namespace, local))
    }

    /// All direct children with the given qualified name, in document order.
    pub fn children_named<'a>(
        &'a self,
        namespace: Option<&'a str>,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children
            .iter()
            .filter(move |c| c.name.is(namespace, local))
    }

    /// Depth-first pre-order walk over this element and all descendants.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            out.push(el);
            stack.extend(el.children.iter().rev());
        }
        out
    }
}

/// Parses well-formed XML into an element tree rooted at the document element.
pub fn parse(bytes: &[u8]) -> Result<Element> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::malformed(format!("document is not valid UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)
        .map_err(|e| Error::malformed(e.to_string()))?;
    Ok(build_element(doc.root_element()))
}

fn qname(namespace: Option<&str>, local: &str) -> QName {
    QName::new(namespace, local)
}

fn take_text(buf: &mut String) -> Option<String> {
    if buf.is_empty() {
        None
    } else {
        Some(std::mem::take(buf))
    }
}

fn build_element(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let mut element = Element::new(qname(tag.namespace(), tag.name()));
    element.attributes = node
        .attributes()
        .map(|a| Attribute {
            name: qname(a.namespace(), a.name()),
            value: a.value().to_string(),
        })
        .collect();

    let mut buf = String::new();
    for child in node.children() {
        if child.is_element() {
            let pending = take_text(&mut buf);
            match element.children.last_mut() {
                Some(prev) => prev.tail = pending,
                None => element.text = pending,
            }
            element.children.push(build_element(child));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                buf.push_str(t);
            }
        }
    }
    let pending = take_text(&mut buf);
    match element.children.last_mut() {
        Some(prev) => prev.tail = pending,
        None => element.text = pending,
    }

    element
}

fn is_blank(s: Option<&str>) -> bool {
    s.is_none_or(|s| s.trim().is_empty())
}

fn escape_text(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
}

/// Prefix assignment for every namespace used in a tree.
///
/// The root element's namespace becomes the default namespace unless some element in the tree
/// has no namespace at all; every other namespace gets a generated `nsN` prefix in first-use
/// order.
struct NamespaceMap {
    default: Option<String>,
    prefixed: Vec<(String, String)>,
}

impl NamespaceMap {
    fn collect(root: &Element) -> Self {
        let all = root.descendants();
        let any_unqualified = all.iter().any(|el| el.name.namespace.is_none());
        let default = if any_unqualified {
            None
        } else {
            root.name.namespace.clone()
        };

        fn register(ns: &str, prefixed: &mut Vec<(String, String)>) {
            if ns == XML_NAMESPACE || prefixed.iter().any(|(uri, _)| uri == ns) {
                return;
            }
            let prefix = format!("ns{}", prefixed.len());
            prefixed.push((ns.to_string(), prefix));
        }

        let mut prefixed: Vec<(String, String)> = Vec::new();
        for el in &all {
            if let Some(ns) = el.name.namespace.as_deref() {
                if default.as_deref() != Some(ns) {
                    register(ns, &mut prefixed);
                }
            }
            for a in &el.attributes {
                // Unprefixed attributes never pick up the default namespace, so a namespaced
                // attribute always needs a real prefix.
                if let Some(ns) = a.name.namespace.as_deref() {
                    register(ns, &mut prefixed);
                }
            }
        }

        Self { default, prefixed }
    }

    fn prefix_of(&self, ns: &str) -> Option<&str> {
        if ns == XML_NAMESPACE {
            return Some("xml");
        }
        self.prefixed
            .iter()
            .find(|(uri, _)| uri == ns)
            .map(|(_, p)| p.as_str())
    }

    fn element_name(&self, name: &QName, out: &mut String) {
        match name.namespace.as_deref() {
            Some(ns) if self.default.as_deref() == Some(ns) => out.push_str(&name.local),
            Some(ns) => {
                if let Some(p) = self.prefix_of(ns) {
                    out.push_str(p);
                    out.push(':');
                }
                out.push_str(&name.local);
            }
            None => out.push_str(&name.local),
        }
    }

    fn attribute_name(&self, name: &QName, out: &mut String) {
        if let Some(p) = name.namespace.as_deref().and_then(|ns| self.prefix_of(ns)) {
            out.push_str(p);
            out.push(':');
        }
        out.push_str(&name.local);
    }
}

/// Serializes an element tree as a UTF-8 XML document.
///
/// Output is a pure function of the tree: a fixed declaration, namespace declarations on the
/// root element, one-space indentation for element-only content. Whitespace-only text between
/// elements is replaced by the indentation; any other text is written verbatim.
pub fn serialize(root: &Element) -> Vec<u8> {
    let ns = NamespaceMap::collect(root);
    let mut out = String::with_capacity(4096);
    out.push_str(XML_DECLARATION);
    write_element(root, &ns, 0, true, &mut out);
    out.push('\n');
    out.into_bytes()
}

fn write_indent(level: usize, out: &mut String) {
    out.push('\n');
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn write_element(el: &Element, ns: &NamespaceMap, level: usize, is_root: bool, out: &mut String) {
    out.push('<');
    ns.element_name(&el.name, out);

    if is_root {
        if let Some(default) = ns.default.as_deref() {
            out.push_str(" xmlns=\"");
            escape_attr(default, out);
            out.push('"');
        }
        for (uri, prefix) in &ns.prefixed {
            let _ = write!(out, " xmlns:{prefix}=\"");
            escape_attr(uri, out);
            out.push('"');
        }
    }

    for a in &el.attributes {
        out.push(' ');
        ns.attribute_name(&a.name, out);
        out.push_str("=\"");
        escape_attr(&a.value, out);
        out.push('"');
    }

    if el.children.is_empty() {
        match el.text.as_deref() {
            Some(text) if !text.is_empty() => {
                out.push('>');
                escape_text(text, out);
            }
            _ => {
                out.push_str(" />");
                return;
            }
        }
    } else {
        out.push('>');
        if is_blank(el.text.as_deref()) {
            write_indent(level + 1, out);
        } else if let Some(text) = el.text.as_deref() {
            escape_text(text, out);
        }

        let last = el.children.len() - 1;
        for (i, child) in el.children.iter().enumerate() {
            write_element(child, ns, level + 1, false, out);
            if is_blank(child.tail.as_deref()) {
                write_indent(if i == last { level } else { level + 1 }, out);
            } else if let Some(tail) = child.tail.as_deref() {
                escape_text(tail, out);
            }
        }
    }

    out.push_str("</");
    ns.element_name(&el.name, out);
    out.push('>');
}

fn trimmed(s: Option<&str>) -> &str {
    s.map(str::trim).unwrap_or("")
}

fn attribute_map(el: &Element) -> BTreeMap<&QName, &str> {
    el.attributes
        .iter()
        .map(|a| (&a.name, a.value.as_str()))
        .collect()
}

fn diff_path(a: &Element, b: &Element, path: &mut Vec<String>) -> Option<String> {
    if a.name != b.name {
        return Some(format!(
            "{}: element name mismatch left={} right={}",
            path.join("/"),
            a.name,
            b.name
        ));
    }

    let (left, right) = (attribute_map(a), attribute_map(b));
    if left != right {
        for (k, v) in &left {
            match right.get(k) {
                None => return Some(format!("{}: missing attr `{k}`", path.join("/"))),
                Some(other) if other != v => {
                    return Some(format!(
                        "{}: attr `{k}` mismatch left=`{v}` right=`{other}`",
                        path.join("/")
                    ));
                }
                _ => {}
            }
        }
        for k in right.keys() {
            if !left.contains_key(k) {
                return Some(format!("{}: extra attr `{k}`", path.join("/")));
            }
        }
    }

    let (ta, tb) = (trimmed(a.text.as_deref()), trimmed(b.text.as_deref()));
    if ta != tb {
        return Some(format!(
            "{}: text mismatch left=`{ta}` right=`{tb}`",
            path.join("/")
        ));
    }
    let (ta, tb) = (trimmed(a.tail.as_deref()), trimmed(b.tail.as_deref()));
    if ta != tb {
        return Some(format!(
            "{}: tail mismatch left=`{ta}` right=`{tb}`",
            path.join("/")
        ));
    }

    if a.children.len() != b.children.len() {
        return Some(format!(
            "{}: child count mismatch left={} right={}",
            path.join("/"),
            a.children.len(),
            b.children.len()
        ));
    }
    for (i, (ca, cb)) in a.children.iter().zip(&b.children).enumerate() {
        path.push(format!("{}[{i}]", ca.name.local));
        if let Some(d) = diff_path(ca, cb, path) {
            return Some(d);
        }
        path.pop();
    }

    None
}

/// Reports the first structural difference between two trees, or `None` if they are
/// structurally equal: same names, same attribute sets, same trimmed text and tails, and the
/// same children in the same order.
pub fn structural_diff(a: &Element, b: &Element) -> Option<String> {
    let mut path = vec![a.name.local.clone()];
    diff_path(a, b, &mut path)
}

pub fn structurally_equal(a: &Element, b: &Element) -> bool {
    structural_diff(a, b).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://example.com/ns";

    #[test]
    fn parse_keeps_text_and_tails() {
        let xml = r#"<a xmlns="http://example.com/ns">lead<b/>middle<c>inner</c>end</a>"#;
        let root = parse(xml.as_bytes()).unwrap();
        assert!(root.name.is(Some(NS), "a"));
        assert_eq!(root.text.as_deref(), Some("lead"));
        assert_eq!(root.children[0].tail.as_deref(), Some("middle"));
        assert_eq!(root.children[1].text.as_deref(), Some("inner"));
        assert_eq!(root.children[1].tail.as_deref(), Some("end"));
    }

    #[test]
    fn parse_rejects_unclosed_tags() {
        let err = parse(b"<a><b></a>").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }

    #[test]
    fn serialize_uses_default_namespace_and_indentation() {
        let xml = r#"<map xmlns="http://example.com/ns" version="9"><colors><color priority="0"/></colors></map>"#;
        let root = parse(xml.as_bytes()).unwrap();
        let out = String::from_utf8(serialize(&root)).unwrap();
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<map xmlns=\"http://example.com/ns\" version=\"9\">\n <colors>\n  <color priority=\"0\" />\n </colors>\n</map>\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn serialize_prefixes_foreign_namespaces() {
        let xml = r#"<a xmlns="http://example.com/ns" xmlns:x="urn:x"><x:b x:k="1" xml:lang="en"/></a>"#;
        let root = parse(xml.as_bytes()).unwrap();
        let out = String::from_utf8(serialize(&root)).unwrap();
        assert!(out.contains(r#"xmlns:ns0="urn:x""#), "{out}");
        assert!(out.contains(r#"<ns0:b ns0:k="1" xml:lang="en" />"#), "{out}");

        let again = parse(out.as_bytes()).unwrap();
        assert_eq!(structural_diff(&root, &again), None);
    }

    #[test]
    fn unqualified_elements_disable_the_default_namespace() {
        let xml = r#"<n:a xmlns:n="http://example.com/ns"><b/></n:a>"#;
        let root = parse(xml.as_bytes()).unwrap();
        let out = String::from_utf8(serialize(&root)).unwrap();
        assert!(out.contains("<ns0:a xmlns:ns0=\"http://example.com/ns\">"), "{out}");
        let again = parse(out.as_bytes()).unwrap();
        assert!(again.children[0].name.is(None, "b"));
    }

    #[test]
    fn special_characters_survive_round_trip() {
        let mut root = Element::new(QName::new(None, "a"));
        root.attributes.push(Attribute {
            name: QName::new(None, "v"),
            value: "x<\"&\n\ty".to_string(),
        });
        root.text = Some("1 < 2 & 3 > 2".to_string());
        let again = parse(&serialize(&root)).unwrap();
        assert_eq!(again.attribute("v"), Some("x<\"&\n\ty"));
        assert_eq!(again.text.as_deref(), Some("1 < 2 & 3 > 2"));
    }

    #[test]
    fn structural_diff_reports_first_mismatch() {
        let a = parse(br#"<r><c k="1"/><c k="2"/></r>"#).unwrap();
        let b = parse(br#"<r><c k="1"/><c k="3"/></r>"#).unwrap();
        let d = structural_diff(&a, &b).unwrap();
        assert!(d.starts_with("r/c[1]: attr `k` mismatch"), "{d}");

        let c = parse(br#"<r><c k="1"/></r>"#).unwrap();
        let d = structural_diff(&a, &c).unwrap();
        assert!(d.contains("child count mismatch"), "{d}");
    }

    #[test]
    fn structural_equality_ignores_attribute_order_and_whitespace() {
        let a = parse(b"<r a=\"1\" b=\"2\">\n  <c> t </c>\n</r>").unwrap();
        let b = parse(b"<r b=\"2\" a=\"1\"><c>t</c></r>").unwrap();
        assert!(structurally_equal(&a, &b));
    }
}
