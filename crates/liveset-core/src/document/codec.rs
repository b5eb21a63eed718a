//! Gzip container decoding for project documents.

use crate::config::DocumentConfig;
use crate::document::element::XmlDocument;
use crate::document::parse::parse_document;
use crate::document::tree::GenericNode;
use crate::error::{CatalogError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Both shapes of a decoded project document.
///
/// Positional traversal reads from `document`; key lookups read from `tree`.
#[derive(Debug, Clone)]
pub struct DecodedDocument {
    pub document: XmlDocument,
    pub tree: GenericNode,
}

/// Decode a compressed document with the default size bound.
pub fn decode(blob: &[u8]) -> Result<DecodedDocument> {
    decode_with_limit(blob, DocumentConfig::MAX_DECOMPRESSED_BYTES)
}

/// Decompress, parse and project a document.
pub fn decode_with_limit(blob: &[u8], max_bytes: u64) -> Result<DecodedDocument> {
    let text = decompress(blob, max_bytes)?;
    let document = parse_document(&text)?;
    let tree = GenericNode::from_element(document.root());
    Ok(DecodedDocument { document, tree })
}

/// Read and decode a document file from disk.
pub fn decode_file(path: &Path, max_bytes: u64) -> Result<DecodedDocument> {
    let blob = std::fs::read(path).map_err(|e| CatalogError::io_with_path(e, path))?;
    debug!("Decoding {} ({} bytes)", path.display(), blob.len());
    decode_with_limit(&blob, max_bytes)
}

/// Decompress a single gzip stream into UTF-8 text, reading at most `max_bytes`.
pub fn decompress(blob: &[u8], max_bytes: u64) -> Result<String> {
    if !blob.starts_with(&GZIP_MAGIC) {
        return Err(CatalogError::Decompression {
            message: "missing gzip header".to_string(),
            source: None,
        });
    }

    let mut buf = Vec::new();
    GzDecoder::new(blob)
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|e| CatalogError::Decompression {
            message: e.to_string(),
            source: Some(e),
        })?;

    if buf.len() as u64 > max_bytes {
        return Err(CatalogError::DecompressedTooLarge { limit: max_bytes });
    }

    String::from_utf8(buf).map_err(|e| {
        CatalogError::malformed(
            format!("document is not valid UTF-8: {}", e.utf8_error()),
            e.utf8_error().valid_up_to(),
        )
    })
}

/// Gzip-compress serialized document text.
pub fn encode_document(text: &str) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Ableton MajorVersion="5">
  <LiveSet>
    <ScaleInformation>
      <Root Value="0" />
    </ScaleInformation>
  </LiveSet>
</Ableton>"#;

    #[test]
    fn test_decode_produces_both_shapes() {
        let blob = encode_document(SET).unwrap();
        let decoded = decode(&blob).unwrap();

        assert_eq!(decoded.document.root().name(), "Ableton");
        assert_eq!(
            decoded
                .tree
                .lookup(&["LiveSet", "ScaleInformation", "Root"])
                .and_then(|n| n.attribute("Value")),
            Some("0")
        );
    }

    #[test]
    fn test_decode_rejects_uncompressed_input() {
        let err = decode(SET.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::Decompression { .. }));

        let err = decode(&[]).unwrap_err();
        assert!(matches!(err, CatalogError::Decompression { .. }));
    }

    #[test]
    fn test_decode_rejects_truncated_stream() {
        let blob = encode_document(SET).unwrap();
        let err = decode(&blob[..blob.len() / 2]).unwrap_err();
        assert!(matches!(err, CatalogError::Decompression { .. }));
    }

    #[test]
    fn test_decode_enforces_size_limit() {
        let blob = encode_document(SET).unwrap();
        let err = decode_with_limit(&blob, 16).unwrap_err();
        assert!(matches!(err, CatalogError::DecompressedTooLarge { limit: 16 }));
    }

    #[test]
    fn test_decode_reports_malformed_markup() {
        let blob = encode_document("<Ableton><LiveSet></Ableton>").unwrap();
        let err = decode(&blob).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedDocument { .. }));
    }
}
