//! Generic projection of a document for key-lookup traversal.
//!
//! Every element becomes a [`GenericNode::Mapping`] holding its attributes in
//! their own map and its child elements grouped by tag. Each tag always maps
//! to a [`GenericNode::Sequence`], even for a single occurrence, so a lookup
//! keeps working when a second sibling with the same tag appears. Elements
//! with neither attributes nor child elements project to a
//! [`GenericNode::Scalar`] holding their text.

use crate::document::element::{XmlElement, XmlNode};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Projected node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericNode {
    Mapping(NodeMap),
    Sequence(Vec<GenericNode>),
    Scalar(String),
}

/// Attributes and grouped children of a projected element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeMap {
    attributes: BTreeMap<String, String>,
    /// Each value is a `GenericNode::Sequence`.
    children: BTreeMap<String, GenericNode>,
    text: Option<String>,
}

impl NodeMap {
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Tags of child elements, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// The sequence node holding every occurrence of a child tag.
    pub fn get(&self, tag: &str) -> Option<&GenericNode> {
        self.children.get(tag)
    }

    /// All occurrences of a child tag (empty when absent).
    pub fn all(&self, tag: &str) -> &[GenericNode] {
        self.get(tag)
            .and_then(GenericNode::as_sequence)
            .unwrap_or(&[])
    }

    /// First occurrence of a child tag.
    pub fn first(&self, tag: &str) -> Option<&GenericNode> {
        self.all(tag).first()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl GenericNode {
    /// Project an element and its subtree.
    pub fn from_element(element: &XmlElement) -> Self {
        let text = element.text();

        if element.attributes().is_empty() && !element.has_child_elements() {
            return GenericNode::Scalar(text);
        }

        let mut map = NodeMap {
            attributes: element.attributes().iter().cloned().collect(),
            children: BTreeMap::new(),
            text: (!text.is_empty()).then_some(text),
        };

        let mut grouped: BTreeMap<String, Vec<GenericNode>> = BTreeMap::new();
        for node in element.children() {
            if let XmlNode::Element(child) = node {
                grouped
                    .entry(child.name().to_string())
                    .or_default()
                    .push(GenericNode::from_element(child));
            }
        }
        map.children = grouped
            .into_iter()
            .map(|(tag, items)| (tag, GenericNode::Sequence(items)))
            .collect();

        GenericNode::Mapping(map)
    }

    pub fn as_mapping(&self) -> Option<&NodeMap> {
        match self {
            GenericNode::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[GenericNode]> {
        match self {
            GenericNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            GenericNode::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// First occurrence of a child tag; `None` for non-mapping nodes.
    pub fn first(&self, tag: &str) -> Option<&GenericNode> {
        self.as_mapping().and_then(|map| map.first(tag))
    }

    /// All occurrences of a child tag as a sequence view.
    pub fn all(&self, tag: &str) -> &[GenericNode] {
        self.as_mapping().map(|map| map.all(tag)).unwrap_or(&[])
    }

    /// Attribute value on a mapping node.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.as_mapping().and_then(|map| map.attribute(name))
    }

    /// Follow a chain of tags, taking the first occurrence at each step.
    pub fn lookup(&self, path: &[&str]) -> Option<&GenericNode> {
        path.iter().try_fold(self, |node, tag| node.first(tag))
    }

    /// Text of a scalar, or the direct text of a mapping.
    pub fn text(&self) -> Option<&str> {
        match self {
            GenericNode::Scalar(value) => Some(value),
            GenericNode::Mapping(map) => map.text(),
            GenericNode::Sequence(_) => None,
        }
    }

    /// Render as JSON in the legacy attribute-prefixed shape.
    ///
    /// Attributes become `@name` keys and mixed text becomes `#text`. A tag
    /// that occurs once is rendered as a single value, repeated tags as an
    /// array. The shape is lossy and meant for display only.
    pub fn to_json(&self) -> Value {
        match self {
            GenericNode::Scalar(value) => Value::String(value.clone()),
            GenericNode::Sequence(items) => {
                Value::Array(items.iter().map(GenericNode::to_json).collect())
            }
            GenericNode::Mapping(map) => {
                let mut object = Map::new();
                for (name, value) in &map.attributes {
                    object.insert(format!("@{}", name), Value::String(value.clone()));
                }
                if let Some(text) = &map.text {
                    object.insert("#text".to_string(), Value::String(text.clone()));
                }
                for (tag, node) in &map.children {
                    let value = match node.as_sequence() {
                        Some([single]) => single.to_json(),
                        _ => node.to_json(),
                    };
                    object.insert(tag.clone(), value);
                }
                Value::Object(object)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse::parse_document;
    use serde_json::json;

    fn project(text: &str) -> GenericNode {
        GenericNode::from_element(parse_document(text).unwrap().root())
    }

    #[test]
    fn test_single_child_is_still_a_sequence() {
        let tree = project(r#"<Devices><PluginDevice Id="0"/></Devices>"#);
        let group = tree.as_mapping().unwrap().get("PluginDevice").unwrap();
        assert_eq!(group.as_sequence().map(<[_]>::len), Some(1));

        let tree = project(r#"<Devices><PluginDevice Id="0"/><PluginDevice Id="1"/></Devices>"#);
        let devices = tree.all("PluginDevice");
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].attribute("Id"), Some("1"));
    }

    #[test]
    fn test_attributes_are_not_children() {
        let tree = project(r#"<Root Value="3"><Value Value="4"/></Root>"#);
        assert_eq!(tree.attribute("Value"), Some("3"));
        assert_eq!(tree.first("Value").unwrap().attribute("Value"), Some("4"));
    }

    #[test]
    fn test_lookup_path_and_absence() {
        let tree = project(
            r#"<Ableton><LiveSet><ScaleInformation><Root Value="2"/></ScaleInformation></LiveSet></Ableton>"#,
        );
        let root = tree
            .lookup(&["LiveSet", "ScaleInformation", "Root"])
            .unwrap();
        assert_eq!(root.attribute("Value"), Some("2"));
        assert!(tree.lookup(&["LiveSet", "Tempo"]).is_none());
        assert!(tree.lookup(&["LiveSet", "ScaleInformation", "Root", "Deeper"]).is_none());
    }

    #[test]
    fn test_text_only_element_is_scalar() {
        let tree = project("<Bag><li>Drums|Kick</li><li>Bass|Sub</li></Bag>");
        let values: Vec<_> = tree.all("li").iter().filter_map(GenericNode::as_scalar).collect();
        assert_eq!(values, vec!["Drums|Kick", "Bass|Sub"]);
    }

    #[test]
    fn test_to_json_legacy_shape() {
        let tree = project(r#"<LiveSet><Tempo><Manual Value="120"/></Tempo><Track/><Track/></LiveSet>"#);
        assert_eq!(
            tree.to_json(),
            json!({
                "Tempo": { "Manual": { "@Value": "120" } },
                "Track": ["", ""]
            })
        );
    }
}
