//! Device removal over a decoded project document.
//!
//! Devices are identified by an element carrying `Value="<name>"` (for example
//! `<PlugName Value="Serum"/>`). A match is detached only when it sits inside a
//! `Devices` container, so identically named values elsewhere in the set
//! (track names, clip names) are left alone.

use crate::document::{write_document, XmlDocument, XmlElement, XmlNode};
use crate::error::Result;
use std::collections::HashSet;
use tracing::{debug, info};

/// Attribute that carries the device identifier.
pub const DEVICE_VALUE_ATTRIBUTE: &str = "Value";

/// Local name of the element that owns a chain of devices.
pub const DEVICES_CONTAINER: &str = "Devices";

/// Remove matching devices and serialize the result.
///
/// `document` is not modified; the removal happens on a clone.
pub fn remove_devices(document: &XmlDocument, values: &HashSet<String>) -> Result<String> {
    let (filtered, removed) = filter_devices(document, values);
    info!("Removed {} device element(s)", removed);
    write_document(&filtered)
}

/// Clone `document` without matching devices. Returns the clone and the number
/// of detached elements.
pub fn filter_devices(document: &XmlDocument, values: &HashSet<String>) -> (XmlDocument, usize) {
    let mut filtered = document.clone();
    let mut removed = 0;
    if !values.is_empty() {
        detach_matches(filtered.root_mut(), false, values, &mut removed);
    }
    (filtered, removed)
}

fn is_match(element: &XmlElement, values: &HashSet<String>) -> bool {
    element
        .attribute(DEVICE_VALUE_ATTRIBUTE)
        .map(|value| values.contains(value))
        .unwrap_or(false)
}

/// `in_devices` is true when `element` or one of its ancestors is a devices container.
fn detach_matches(
    element: &mut XmlElement,
    in_devices: bool,
    values: &HashSet<String>,
    removed: &mut usize,
) {
    let in_devices = in_devices || element.local_name() == DEVICES_CONTAINER;

    if in_devices {
        element.children_mut().retain(|node| match node {
            XmlNode::Element(child) if is_match(child, values) => {
                debug!(
                    "Detaching <{} Value={:?}>",
                    child.name(),
                    child.attribute(DEVICE_VALUE_ATTRIBUTE)
                );
                *removed += 1;
                false
            }
            _ => true,
        });
    }

    for node in element.children_mut() {
        if let XmlNode::Element(child) = node {
            detach_matches(child, in_devices, values, removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET: &str = r#"<Ableton>
  <LiveSet>
    <Tracks>
      <MidiTrack>
        <Name><EffectiveName Value="Serum"/></Name>
        <DeviceChain>
          <DeviceChain>
            <Devices>
              <PluginDevice Id="0">
                <PluginDesc><VstPluginInfo><PlugName Value="Serum"/></VstPluginInfo></PluginDesc>
              </PluginDevice>
              <Reverb Id="1"><UserName Value="Hall"/></Reverb>
              <Eq8 Value="Pro-Q 3"/>
            </Devices>
          </DeviceChain>
        </DeviceChain>
      </MidiTrack>
    </Tracks>
  </LiveSet>
</Ableton>"#;

    fn values(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_removes_matches_inside_devices_only() {
        let doc = XmlDocument::parse(SET).unwrap();
        let (filtered, removed) = filter_devices(&doc, &values(&["Serum", "Pro-Q 3"]));

        assert_eq!(removed, 2);
        let root = filtered.root();
        assert!(root
            .descendants()
            .all(|e| e.attribute("Value") != Some("Pro-Q 3")));
        assert!(root
            .descendants()
            .all(|e| e.name() != "PlugName"));
        // The track name lives outside the Devices container.
        let name = root
            .find_path(&["LiveSet", "Tracks", "MidiTrack", "Name", "EffectiveName"])
            .unwrap();
        assert_eq!(name.attribute("Value"), Some("Serum"));
    }

    #[test]
    fn test_original_document_untouched() {
        let doc = XmlDocument::parse(SET).unwrap();
        let before = doc.clone();
        let _ = remove_devices(&doc, &values(&["Serum"])).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_output_is_reparseable_text() {
        let doc = XmlDocument::parse(SET).unwrap();
        let text = remove_devices(&doc, &values(&["Hall"])).unwrap();

        assert!(text.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        let reparsed = XmlDocument::parse(&text).unwrap();
        assert!(reparsed
            .root()
            .descendants()
            .all(|e| e.name() != "UserName"));
        assert!(reparsed.root().descendants().any(|e| e.name() == "Reverb"));
    }

    #[test]
    fn test_empty_value_set_is_identity() {
        let doc = XmlDocument::parse(SET).unwrap();
        let (filtered, removed) = filter_devices(&doc, &HashSet::new());
        assert_eq!(removed, 0);
        assert_eq!(filtered, doc);
    }
}
