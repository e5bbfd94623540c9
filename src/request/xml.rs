//! XML serialization of payloads.
//!
//! Produces the document shape downstream XML endpoints of this agent have
//! always received:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <post>
//!   <user-name>x</user-name>
//!   <count type="integer">3</count>
//!   <tags type="array">
//!     <tag>a</tag>
//!   </tags>
//! </post>
//! ```

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Value};

use super::RequestError;

type XmlWriter = Writer<Vec<u8>>;

/// Serializes `data` as an XML document with root element `root`.
///
/// # Errors
///
/// Returns [`RequestError::Encoding`] if `data` is not a map or an array.
pub fn to_xml(data: &Value, root: &str) -> Result<String, RequestError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let root = element_name(root);
    match data {
        Value::Object(map) => write_map(&mut writer, &root, map)?,
        Value::Array(items) => write_array(&mut writer, &root, items)?,
        other => {
            return Err(RequestError::Encoding(format!(
                "XML payload must be a map or an array, got {other}"
            )));
        }
    }

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|e| RequestError::Encoding(e.to_string()))?;
    xml.push('\n');
    Ok(xml)
}

fn write(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), RequestError> {
    writer
        .write_event(event)
        .map_err(|e| RequestError::Encoding(e.to_string()))
}

fn element_name(key: &str) -> String {
    key.replace('_', "-")
}

fn singular(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = name.strip_suffix('s').filter(|s| !s.is_empty()) {
        stem.to_string()
    } else {
        name.to_string()
    }
}

fn write_map(writer: &mut XmlWriter, name: &str, map: &Map<String, Value>) -> Result<(), RequestError> {
    if map.is_empty() {
        return write(writer, Event::Empty(BytesStart::new(name)));
    }
    write(writer, Event::Start(BytesStart::new(name)))?;
    for (key, value) in map {
        write_value(writer, &element_name(key), value)?;
    }
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write_array(writer: &mut XmlWriter, name: &str, items: &[Value]) -> Result<(), RequestError> {
    let mut start = BytesStart::new(name);
    start.push_attribute(("type", "array"));
    if items.is_empty() {
        return write(writer, Event::Empty(start));
    }
    write(writer, Event::Start(start))?;
    let child = singular(name);
    for item in items {
        write_value(writer, &child, item)?;
    }
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write_value(writer: &mut XmlWriter, name: &str, value: &Value) -> Result<(), RequestError> {
    match value {
        Value::Object(map) => write_map(writer, name, map),
        Value::Array(items) => write_array(writer, name, items),
        Value::Null => {
            let mut start = BytesStart::new(name);
            start.push_attribute(("nil", "true"));
            write(writer, Event::Empty(start))
        }
        Value::String(text) => write_text(writer, BytesStart::new(name), name, text),
        Value::Bool(b) => {
            let mut start = BytesStart::new(name);
            start.push_attribute(("type", "boolean"));
            write_text(writer, start, name, &b.to_string())
        }
        Value::Number(n) => {
            let kind = if n.is_f64() { "float" } else { "integer" };
            let mut start = BytesStart::new(name);
            start.push_attribute(("type", kind));
            write_text(writer, start, name, &n.to_string())
        }
    }
}

fn write_text(
    writer: &mut XmlWriter,
    start: BytesStart<'_>,
    name: &str,
    text: &str,
) -> Result<(), RequestError> {
    write(writer, Event::Start(start))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}
