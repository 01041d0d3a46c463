//! XML request bodies.
//!
//! POST and PUT calls take an XML document rooted at `<request>`. [`construct_xml`] builds one
//! from a list of JSON mappings, mirroring their structure:
//!
//! - a scalar becomes an element holding its text, `null` an empty element,
//! - a nested mapping becomes a nested element,
//! - a list becomes one sibling element per item, all named after the key.
//!
//! Element order follows the mapping's insertion order.
//!
//! ```
//! use serde_json::json;
//!
//! let body = cardmarket_client_sdk::xml::construct_xml(&[json!({
//!     "action": "add",
//!     "article": [{ "idArticle": 101, "amount": 2 }]
//! })])?;
//!
//! assert_eq!(
//!     String::from_utf8(body)?,
//!     "<?xml version=\"1.0\" encoding=\"UTF-8\"?><request><action>add</action>\
//!      <article><idArticle>101</idArticle><amount>2</amount></article></request>"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::error::Error as StdError;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Value};

use crate::Result;
use crate::error::{Error, Kind};

/// Name of the root element of every request body.
pub const ROOT: &str = "request";

/// An element of an XML tree. An element holds either text or children.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    #[must_use]
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Returns the first element reached by following `path`, a `/`-separated list of child
    /// names.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .try_fold(self, |element, name| element.child(name))
    }

    /// Returns every direct child named `name`, in document order.
    pub fn children_named<'tree>(
        &'tree self,
        name: &'tree str,
    ) -> impl Iterator<Item = &'tree Element> + 'tree {
        self.children.iter().filter(move |child| child.name == name)
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    fn push(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Serializes the tree as a UTF-8 document with an XML declaration.
    pub fn to_document(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(internal)?;
        write_element(&mut writer, self)?;

        Ok(writer.into_inner())
    }
}

/// Appends one child to `parent` per entry of `mapping`, recursively, and returns the last
/// element created directly under `parent`.
pub fn dict_to_xml<'tree>(
    parent: &'tree mut Element,
    mapping: &Map<String, Value>,
) -> Result<Option<&'tree Element>> {
    let mut last = None;

    for (key, value) in mapping {
        if !is_element_name(key) {
            return Err(Error::validation(format!(
                "{key:?} is not a valid XML element name"
            )));
        }

        match value {
            Value::Array(items) => {
                for item in items {
                    encode_value(parent.push(Element::new(key.as_str())), item)?;
                    last = Some(parent.children.len() - 1);
                }
            }
            scalar_or_mapping => {
                encode_value(parent.push(Element::new(key.as_str())), scalar_or_mapping)?;
                last = Some(parent.children.len() - 1);
            }
        }
    }

    let parent: &'tree Element = parent;
    Ok(last.and_then(|index| parent.children.get(index)))
}

/// Whether `name` matches the XML 1.0 `Name` production, without colons.
fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9'
            | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

fn encode_value(element: &mut Element, value: &Value) -> Result<()> {
    match value {
        Value::Object(mapping) => {
            dict_to_xml(element, mapping)?;
        }
        Value::Null => {}
        Value::String(text) => element.text = Some(text.clone()),
        Value::Array(_) => {
            return Err(Error::validation(format!(
                "list items of <{}> cannot themselves be lists",
                element.name
            )));
        }
        scalar @ (Value::Bool(_) | Value::Number(_)) => element.text = Some(scalar.to_string()),
    }

    Ok(())
}

/// Builds the `<request>` tree for `mappings`. Every entry must be a JSON object.
pub fn build_tree(mappings: &[Value]) -> Result<Element> {
    let mut root = Element::new(ROOT);

    for mapping in mappings {
        let Value::Object(mapping) = mapping else {
            return Err(Error::validation(format!(
                "expected a mapping to encode as XML, got {mapping}"
            )));
        };
        dict_to_xml(&mut root, mapping)?;
    }

    Ok(root)
}

/// Builds and serializes the `<request>` document for `mappings`.
pub fn construct_xml(mappings: &[Value]) -> Result<Vec<u8>> {
    build_tree(mappings)?.to_document()
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let name = element.name.as_str();

    if element.text.is_none() && element.children.is_empty() {
        writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(internal)?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(internal)?;
    if let Some(text) = &element.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(internal)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(internal)?;

    Ok(())
}

fn internal<E: StdError + Send + Sync + 'static>(e: E) -> Error {
    Error::with_source(Kind::Internal, e)
}
