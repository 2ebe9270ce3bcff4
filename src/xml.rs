//! The XML materialization of an NBT document.
//!
//! The mapping is deterministic and lossless:
//!
//! * element local-name = `T` + tag kind (`TInt32`, `TCompound`, …)
//! * compound children and named roots carry a `Name` attribute
//! * lists carry a `ContentType` attribute naming their element kind
//! * arrays hold one child element per entry, named after the primitive
//! * primitive payloads are decimal text; float text round-trips exactly
//! * string payloads are the element's text content
//!
//! [`Element`] stores attributes in a map, so element equality is
//! semantic: attribute order does not participate.

use std::collections::BTreeMap;
use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Error, Result};
use crate::value::{Compound, Value};
use crate::Tag;

const NAME_ATTR: &str = "Name";
const CONTENT_TYPE_ATTR: &str = "ContentType";

/// An XML element: name, attributes, child elements, text content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Element::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder-style child append.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style text setter.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Parse an XML document into an element tree. Whitespace around text
    /// content is trimmed, so pretty-printed output parses back cleanly.
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    stack.push(element_from_start(&e)?);
                }
                Ok(Event::Empty(e)) => {
                    let elem = element_from_start(&e)?;
                    attach(&mut stack, &mut root, elem)?;
                }
                Ok(Event::End(_)) => {
                    if let Some(elem) = stack.pop() {
                        attach(&mut stack, &mut root, elem)?;
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(top) = stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::format(format!("xml text error: {e}")))?;
                        top.text.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {} // declarations, comments, processing instructions
                Err(e) => return Err(Error::format(format!("xml parse error: {e}"))),
            }
        }

        root.ok_or_else(|| Error::format("no root element"))
    }

    /// Serialize the element tree as an indented XML document.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml_writer = quick_xml::Writer::new_with_indent(writer, b' ', 2);
        xml_writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| Error::format(format!("xml write error: {e}")))?;
        write_element(&mut xml_writer, self)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        String::from_utf8(out).map_err(|e| Error::format(format!("xml output not utf-8: {e}")))
    }
}

fn element_from_start(e: &BytesStart) -> Result<Element> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut elem = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::format(format!("xml attribute error: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::format(format!("xml attribute error: {e}")))?
            .into_owned();
        elem.attributes.insert(key, value);
    }
    Ok(elem)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, elem: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(elem);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(elem);
            Ok(())
        }
        None => Err(Error::format("multiple root elements")),
    }
}

fn write_element<W: Write>(writer: &mut quick_xml::Writer<W>, elem: &Element) -> Result<()> {
    let mut start = BytesStart::new(elem.name.as_str());
    for (key, value) in &elem.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if elem.children.is_empty() && elem.text.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| Error::format(format!("xml write error: {e}")))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| Error::format(format!("xml write error: {e}")))?;
    if !elem.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&elem.text)))
            .map_err(|e| Error::format(format!("xml write error: {e}")))?;
    }
    for child in &elem.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(elem.name.as_str())))
        .map_err(|e| Error::format(format!("xml write error: {e}")))?;
    Ok(())
}

fn element_name(tag: Tag) -> &'static str {
    match tag {
        Tag::End => "TEnd",
        Tag::Int8 => "TInt8",
        Tag::Int16 => "TInt16",
        Tag::Int32 => "TInt32",
        Tag::Int64 => "TInt64",
        Tag::Float32 => "TFloat32",
        Tag::Float64 => "TFloat64",
        Tag::Int8Array => "TInt8Array",
        Tag::String => "TString",
        Tag::List => "TList",
        Tag::Compound => "TCompound",
        Tag::Int32Array => "TInt32Array",
        Tag::Int64Array => "TInt64Array",
    }
}

fn parse_kind(element_name: &str) -> Result<Tag> {
    element_name
        .strip_prefix('T')
        .and_then(Tag::from_name)
        .ok_or_else(|| Error::format(format!("unknown tag element {element_name:?}")))
}

/// Map a value to its element, attaching a `Name` attribute when the
/// value is a named entry (or a named root).
pub(crate) fn to_element(value: &Value, name: Option<&str>) -> Element {
    let mut elem = build_element(value);
    if let Some(name) = name {
        elem.attributes.insert(NAME_ATTR.to_owned(), name.to_owned());
    }
    elem
}

fn primitive(tag: Tag, text: String) -> Element {
    Element {
        name: element_name(tag).to_owned(),
        text,
        ..Element::default()
    }
}

fn array_element<T: ToString>(tag: Tag, item_tag: Tag, items: &[T]) -> Element {
    let mut elem = Element::new(element_name(tag));
    elem.children = items
        .iter()
        .map(|v| primitive(item_tag, v.to_string()))
        .collect();
    elem
}

fn build_element(value: &Value) -> Element {
    match value {
        Value::Int8(v) => primitive(Tag::Int8, v.to_string()),
        Value::Int16(v) => primitive(Tag::Int16, v.to_string()),
        Value::Int32(v) => primitive(Tag::Int32, v.to_string()),
        Value::Int64(v) => primitive(Tag::Int64, v.to_string()),
        // Rust's float formatting is shortest-round-trip, which is
        // exactly the IEEE 754-preserving representation required here.
        Value::Float32(v) => primitive(Tag::Float32, v.to_string()),
        Value::Float64(v) => primitive(Tag::Float64, v.to_string()),
        Value::String(s) => primitive(Tag::String, s.clone()),
        Value::Int8Array(v) => array_element(Tag::Int8Array, Tag::Int8, v),
        Value::Int32Array(v) => array_element(Tag::Int32Array, Tag::Int32, v),
        Value::Int64Array(v) => array_element(Tag::Int64Array, Tag::Int64, v),
        Value::List(content, items) => {
            let mut elem = Element::new(element_name(Tag::List));
            elem.attributes.insert(
                CONTENT_TYPE_ATTR.to_owned(),
                element_name(*content).to_owned(),
            );
            elem.children = items.iter().map(build_element).collect();
            elem
        }
        Value::Compound(compound) => {
            let mut elem = Element::new(element_name(Tag::Compound));
            elem.children = compound
                .iter()
                .map(|(name, child)| to_element(child, Some(name)))
                .collect();
            elem
        }
    }
}

/// Map an element back to a value, returning the `Name` attribute (if
/// any) alongside. The inverse of [`to_element`].
pub(crate) fn from_element(elem: &Element) -> Result<(Option<String>, Value)> {
    let name = elem.attributes.get(NAME_ATTR).cloned();
    let value = parse_element(elem)?;
    Ok((name, value))
}

fn parse_number<T: std::str::FromStr>(elem: &Element) -> Result<T> {
    elem.text.trim().parse().map_err(|_| {
        Error::out_of_range(format!(
            "cannot parse {:?} as a {} payload",
            elem.text, elem.name
        ))
    })
}

fn parse_array<T: std::str::FromStr>(elem: &Element, item_tag: Tag) -> Result<Vec<T>> {
    let mut items = Vec::with_capacity(elem.children.len());
    for child in &elem.children {
        if child.name != element_name(item_tag) {
            return Err(Error::format(format!(
                "array element {} holds a {} child",
                elem.name, child.name
            )));
        }
        items.push(parse_number(child)?);
    }
    Ok(items)
}

fn parse_element(elem: &Element) -> Result<Value> {
    let tag = parse_kind(&elem.name)?;
    match tag {
        Tag::End => Err(Error::format("TEnd cannot be materialized as a value")),
        Tag::Int8 => Ok(Value::Int8(parse_number(elem)?)),
        Tag::Int16 => Ok(Value::Int16(parse_number(elem)?)),
        Tag::Int32 => Ok(Value::Int32(parse_number(elem)?)),
        Tag::Int64 => Ok(Value::Int64(parse_number(elem)?)),
        Tag::Float32 => Ok(Value::Float32(parse_number(elem)?)),
        Tag::Float64 => Ok(Value::Float64(parse_number(elem)?)),
        Tag::String => Ok(Value::String(elem.text.clone())),
        Tag::Int8Array => Ok(Value::Int8Array(parse_array(elem, Tag::Int8)?)),
        Tag::Int32Array => Ok(Value::Int32Array(parse_array(elem, Tag::Int32)?)),
        Tag::Int64Array => Ok(Value::Int64Array(parse_array(elem, Tag::Int64)?)),
        Tag::List => {
            let content_name = elem.attributes.get(CONTENT_TYPE_ATTR).ok_or_else(|| {
                Error::format("list element missing ContentType attribute")
            })?;
            let content = parse_kind(content_name)?;
            if content == Tag::End && !elem.children.is_empty() {
                return Err(Error::ListContentMismatch);
            }
            let mut items = Vec::with_capacity(elem.children.len());
            for child in &elem.children {
                if parse_kind(&child.name)? != content {
                    return Err(Error::ListContentMismatch);
                }
                items.push(parse_element(child)?);
            }
            Ok(Value::List(content, items))
        }
        Tag::Compound => {
            let mut compound = Compound::new();
            for child in &elem.children {
                let name = child.attributes.get(NAME_ATTR).ok_or_else(|| {
                    Error::format("compound child missing Name attribute")
                })?;
                if compound.contains(name) {
                    return Err(Error::DuplicateName(name.clone()));
                }
                compound.insert(name.clone(), parse_element(child)?);
            }
            Ok(Value::Compound(compound))
        }
    }
}
