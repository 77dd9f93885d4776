use super::{LineIndex, Span, XmlError};
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;

/// An attribute of an [`Element`], with its namespace resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Name as written in the source, e.g. `android:scheme`
    pub qualified_name: String,

    /// Name without its prefix, e.g. `scheme`
    pub local_name: String,

    /// Namespace URI bound to the prefix, if the attribute is prefixed
    pub namespace: Option<String>,

    /// Value with XML entities decoded
    pub value: String,

    /// Value exactly as written between the quotes
    pub raw_value: String,

    /// The whole `name="value"` text
    pub span: Span,

    /// The text between the quotes
    pub value_span: Span,
}

/// A parsed XML element with source positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub qualified_name: String,
    pub local_name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,

    /// From `<` of the start tag to `>` of the end tag
    pub span: Span,

    /// The tag name inside the start tag
    pub name_span: Span,

    /// Prefix bindings in scope, innermost first
    namespaces: Vec<(String, String)>,
}

impl Element {
    /// Child elements in document order
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// Child elements with the given local name, ignoring their prefix
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.local_name == local_name)
    }

    /// Look up an attribute by namespace URI and local name
    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| {
            attr.local_name == local_name && attr.namespace.as_deref() == Some(namespace)
        })
    }

    /// Look up an attribute without a namespace
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.is_none() && attr.qualified_name == name)
    }

    /// The prefix bound to `namespace` at this element, if any
    pub fn lookup_prefix(&self, namespace: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|(prefix, uri)| uri == namespace && !prefix.is_empty())
            .map(|(prefix, _)| prefix.as_str())
    }

    /// This element and all of its descendants in document order
    pub fn descendants(&self) -> Vec<&Element> {
        let mut result = vec![self];
        let mut index = 0;
        // Pre-order: splice each element's children right after it
        while index < result.len() {
            let current = result[index];
            let children: Vec<&Element> = current.children.iter().collect();
            let insert_at = index + 1;
            result.splice(insert_at..insert_at, children);
            index += 1;
        }
        result
    }
}

/// A parsed XML document
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Element,
}

/// Offsets of one attribute inside a start tag
struct RawAttribute<'a> {
    name: &'a str,
    name_start: usize,
    value_start: usize,
    value_end: usize,
}

impl Document {
    /// Parse `source` into an element tree
    pub fn parse(source: &str) -> Result<Self, XmlError> {
        let lines = LineIndex::new(source);
        let mut reader = Reader::from_str(source);
        reader.trim_text(false);

        let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
        let mut open: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let start = reader.buffer_position();
            let event = reader.read_event().map_err(|e| XmlError::Malformed {
                line: lines.position(source, reader.buffer_position()).line,
                message: e.to_string(),
            })?;
            let end = reader.buffer_position();

            match event {
                Event::Start(_) => {
                    let element = build_element(source, &lines, start, end, &mut scopes)?;
                    open.push(element);
                }
                Event::Empty(_) => {
                    let element = build_element(source, &lines, start, end, &mut scopes)?;
                    scopes.pop();
                    attach(element, &mut open, &mut root);
                }
                Event::End(_) => {
                    scopes.pop();
                    if let Some(mut element) = open.pop() {
                        element.span.end = lines.position(source, end);
                        attach(element, &mut open, &mut root);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        root.map(|root| Document { root }).ok_or(XmlError::MissingRoot)
    }
}

fn attach(element: Element, open: &mut [Element], root: &mut Option<Element>) {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Build an element from the start tag at `source[start..end]` and push its namespace scope
fn build_element(
    source: &str,
    lines: &LineIndex,
    start: usize,
    end: usize,
    scopes: &mut Vec<Vec<(String, String)>>,
) -> Result<Element, XmlError> {
    let (qualified_name, raw_attributes) = scan_start_tag(source, start, end);

    let declared: Vec<(String, String)> = raw_attributes
        .iter()
        .filter_map(|raw| {
            let value = &source[raw.value_start..raw.value_end];
            if raw.name == "xmlns" {
                Some((String::new(), value.to_string()))
            } else {
                raw.name
                    .strip_prefix("xmlns:")
                    .map(|prefix| (prefix.to_string(), value.to_string()))
            }
        })
        .collect();
    scopes.push(declared);

    let namespaces: Vec<(String, String)> = scopes.iter().rev().flatten().cloned().collect();
    let resolve = |prefix: &str| -> Option<String> {
        namespaces
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    };

    let mut attributes = Vec::with_capacity(raw_attributes.len());
    for raw in &raw_attributes {
        if raw.name == "xmlns" || raw.name.starts_with("xmlns:") {
            continue;
        }
        let raw_value = &source[raw.value_start..raw.value_end];
        let value = unescape(raw_value).map_err(|e| XmlError::InvalidAttribute {
            name: raw.name.to_string(),
            line: lines.position(source, raw.value_start).line,
            message: e.to_string(),
        })?;
        let (namespace, local_name) = match raw.name.split_once(':') {
            Some((prefix, local)) => (resolve(prefix), local.to_string()),
            None => (None, raw.name.to_string()),
        };
        attributes.push(Attribute {
            qualified_name: raw.name.to_string(),
            local_name,
            namespace,
            value: value.into_owned(),
            raw_value: raw_value.to_string(),
            span: Span::new(
                lines.position(source, raw.name_start),
                lines.position(source, raw.value_end + 1),
            ),
            value_span: Span::new(
                lines.position(source, raw.value_start),
                lines.position(source, raw.value_end),
            ),
        });
    }

    let (namespace, local_name) = match qualified_name.split_once(':') {
        Some((prefix, local)) => (resolve(prefix), local.to_string()),
        None => (resolve(""), qualified_name.to_string()),
    };
    let name_start = start + 1;

    Ok(Element {
        qualified_name: qualified_name.to_string(),
        local_name,
        namespace,
        attributes,
        children: Vec::new(),
        span: Span::new(lines.position(source, start), lines.position(source, end)),
        name_span: Span::new(
            lines.position(source, name_start),
            lines.position(source, name_start + qualified_name.len()),
        ),
        namespaces,
    })
}

/// Split a start tag into its name and attribute offsets
fn scan_start_tag(source: &str, start: usize, end: usize) -> (&str, Vec<RawAttribute<'_>>) {
    let bytes = source.as_bytes();
    let is_space = |b: u8| b.is_ascii_whitespace();
    let is_tag_end = |b: u8| b == b'>' || b == b'/';

    let mut i = start + 1;
    while i < end && !is_space(bytes[i]) && !is_tag_end(bytes[i]) {
        i += 1;
    }
    let name = &source[start + 1..i];

    let mut attributes = Vec::new();
    loop {
        while i < end && is_space(bytes[i]) {
            i += 1;
        }
        if i >= end || is_tag_end(bytes[i]) {
            break;
        }
        let name_start = i;
        while i < end && !is_space(bytes[i]) && bytes[i] != b'=' && !is_tag_end(bytes[i]) {
            i += 1;
        }
        let name_end = i;
        while i < end && is_space(bytes[i]) {
            i += 1;
        }
        if i >= end || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < end && is_space(bytes[i]) {
            i += 1;
        }
        if i >= end || (bytes[i] != b'"' && bytes[i] != b'\'') {
            break;
        }
        let quote = bytes[i];
        let value_start = i + 1;
        let mut value_end = value_start;
        while value_end < end && bytes[value_end] != quote {
            value_end += 1;
        }
        attributes.push(RawAttribute {
            name: &source[name_start..name_end],
            name_start,
            value_start,
            value_end,
        });
        i = value_end + 1;
    }

    (name, attributes)
}
