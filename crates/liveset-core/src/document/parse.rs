//! Markup parsing into the owned element tree.
//!
//! The prolog (declaration, processing instructions, doctype) and comments are
//! dropped; whitespace-only text between elements is trimmed away.

use crate::document::element::{XmlDocument, XmlElement};
use crate::error::{CatalogError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse markup text into an [`XmlDocument`].
///
/// Fails with [`CatalogError::MalformedDocument`] on syntax errors, mismatched
/// or unclosed tags, text outside the root, or more than one root element.
pub fn parse_document(text: &str) -> Result<XmlDocument> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| CatalogError::malformed(e.to_string(), position))?;

        match event {
            Event::Start(start) => stack.push(element_from_start(&start, position)?),
            Event::Empty(start) => {
                let element = element_from_start(&start, position)?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CatalogError::malformed("unexpected closing tag", position))?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| CatalogError::malformed(e.to_string(), position))?;
                push_text(&mut stack, value.into_owned(), position)?;
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                push_text(&mut stack, value, position)?;
            }
            // Prolog and comments carry nothing the catalog needs.
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(CatalogError::malformed(
            format!("unclosed element <{}>", open.name()),
            reader.buffer_position(),
        ));
    }

    root.map(XmlDocument::new)
        .ok_or_else(|| CatalogError::malformed("document has no root element", 0u64))
}

fn element_from_start(start: &BytesStart<'_>, position: impl Copy + TryInto<u64>) -> Result<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());

    for attr in start.attributes() {
        let attr = attr.map_err(|e| CatalogError::malformed(e.to_string(), position))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| CatalogError::malformed(e.to_string(), position))?
            .into_owned();
        element.set_attribute(key, value);
    }

    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    position: impl TryInto<u64>,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_element(element),
        None if root.is_some() => {
            return Err(CatalogError::malformed(
                format!("second root element <{}>", element.name()),
                position,
            ))
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(stack: &mut [XmlElement], text: String, position: impl TryInto<u64>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_text(text),
        None if text.trim().is_empty() => {}
        None => {
            return Err(CatalogError::malformed(
                "text outside the root element",
                position,
            ))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_declaration() {
        let doc = parse_document(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- saved by Live -->
<Ableton MajorVersion="5"><LiveSet /></Ableton>"#,
        )
        .unwrap();
        assert_eq!(doc.root().name(), "Ableton");
        assert_eq!(doc.root().attribute("MajorVersion"), Some("5"));
        assert!(doc.root().child("LiveSet").is_some());
    }

    #[test]
    fn test_parse_unescapes_text_and_attributes() {
        let doc = parse_document(r#"<a name="R&amp;B"><b>Drums &lt;3</b></a>"#).unwrap();
        assert_eq!(doc.root().attribute("name"), Some("R&B"));
        assert_eq!(doc.root().child("b").unwrap().text(), "Drums <3");
    }

    #[test]
    fn test_parse_keeps_sibling_order() {
        let doc = parse_document("<r><x i=\"1\"/><y/><x i=\"2\"/></r>").unwrap();
        let names: Vec<_> = doc.root().child_elements().map(|e| e.name()).collect();
        assert_eq!(names, vec!["x", "y", "x"]);
    }

    #[test]
    fn test_parse_rejects_mismatched_tags() {
        let err = parse_document("<a><b></a></b>").unwrap_err();
        assert!(matches!(err, CatalogError::MalformedDocument { .. }));
    }

    #[test]
    fn test_parse_rejects_unclosed_root() {
        let err = parse_document("<a><b/>").unwrap_err();
        assert!(matches!(err, CatalogError::MalformedDocument { .. }));
    }

    #[test]
    fn test_parse_rejects_second_root_and_empty_input() {
        assert!(parse_document("<a/><b/>").is_err());
        assert!(parse_document("").is_err());
        assert!(parse_document("just text").is_err());
    }
}
