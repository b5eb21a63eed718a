//! Project document container decoding.
//!
//! This module provides:
//! - Gzip decompression with a size bound
//! - Markup parsing into an owned, clonable element tree
//! - The generic tag/attribute projection used for key lookups
//! - Serialization back to indented text and recompression

mod codec;
mod element;
mod parse;
mod tree;
mod write;

pub use codec::{
    decode, decode_file, decode_with_limit, decompress, encode_document, DecodedDocument,
};
pub use element::{Descendants, XmlDocument, XmlElement, XmlNode};
pub use parse::parse_document;
pub use tree::{GenericNode, NodeMap};
pub use write::write_document;

impl XmlDocument {
    /// Parse markup text. See [`parse_document`].
    pub fn parse(text: &str) -> crate::Result<Self> {
        parse_document(text)
    }

    /// Serialize to indented text. See [`write_document`].
    pub fn to_xml_string(&self) -> crate::Result<String> {
        write_document(self)
    }

    /// Generic projection of this document's root.
    pub fn project(&self) -> GenericNode {
        GenericNode::from_element(self.root())
    }
}
