//! Serialization of the element tree back to indented UTF-8 text.

use crate::config::DocumentConfig;
use crate::document::element::{XmlDocument, XmlElement, XmlNode};
use crate::error::{CatalogError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serialize a document with an XML declaration and stable two-space indentation.
pub fn write_document(document: &XmlDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', DocumentConfig::INDENT_WIDTH);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_error)?;
    write_element(&mut writer, document.root())?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| CatalogError::Other(format!("Serialized document is not UTF-8: {}", e)))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name());
    for (key, value) in element.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children().is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for child in element.children() {
        match child {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name())))
        .map_err(write_error)?;
    Ok(())
}

fn write_error(err: impl std::fmt::Display) -> CatalogError {
    CatalogError::Other(format!("Failed to serialize document: {}", err))
}
