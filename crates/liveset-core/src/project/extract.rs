//! Typed metadata extraction from a decoded project document.

use crate::document::{GenericNode, XmlDocument};
use crate::error::Result;
use crate::project::record::ProjectRecord;
use crate::project::scale;
use chrono::{DateTime, Utc};
use std::num::IntErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Tempo chains below the root element, newest layout first.
///
/// Documents saved before Live 12 name the main track `MasterTrack`.
const TEMPO_PATHS: [[&str; 6]; 2] = [
    ["LiveSet", "MainTrack", "DeviceChain", "Mixer", "Tempo", "Manual"],
    ["LiveSet", "MasterTrack", "DeviceChain", "Mixer", "Tempo", "Manual"],
];

const SCALE_PATH: [&str; 2] = ["LiveSet", "ScaleInformation"];

/// Build a record for one project folder.
///
/// Missing or malformed tempo and scale fields fall back to `0` and `""`.
/// The only failure is a scale-type index outside the scale table.
pub fn extract(
    document: &XmlDocument,
    tree: &GenericNode,
    folder: &Path,
    last_modified: DateTime<Utc>,
) -> Result<ProjectRecord> {
    let title = folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.display().to_string());

    let bpm = read_tempo(document).unwrap_or(0.0);
    let scale = read_scale(tree)?.unwrap_or_default();

    debug!(
        "Extracted {}: bpm={} scale={:?}",
        folder.display(),
        bpm,
        scale
    );

    Ok(ProjectRecord {
        title,
        bpm,
        scale,
        project_folder: folder.to_path_buf(),
        last_modified,
    })
}

/// Tempo from the manual-value attribute of the main track's mixer.
///
/// `None` when any element along the chain is absent, or when the value is not
/// a finite, non-negative number.
pub fn read_tempo(document: &XmlDocument) -> Option<f64> {
    let manual = TEMPO_PATHS
        .iter()
        .find_map(|path| document.root().find_path(path))?;
    let raw = manual.attribute("Value")?;

    match raw.trim().parse::<f64>() {
        Ok(bpm) if bpm.is_finite() && bpm >= 0.0 => Some(bpm),
        _ => {
            warn!("Ignoring unusable tempo value {:?}", raw);
            None
        }
    }
}

/// Scale as `"{root} {name}"` from the `ScaleInformation` section.
///
/// `Ok(None)` when the section or either attribute is absent or unparseable.
/// An integer scale-type outside the table is an error.
pub fn read_scale(tree: &GenericNode) -> Result<Option<String>> {
    let Some(info) = tree.lookup(&SCALE_PATH) else {
        return Ok(None);
    };

    let root_raw = info.first("Root").and_then(|n| n.attribute("Value"));
    let name_raw = info.first("Name").and_then(|n| n.attribute("Value"));
    let (Some(root_raw), Some(name_raw)) = (root_raw, name_raw) else {
        return Ok(None);
    };

    let Ok(root) = root_raw.trim().parse::<i64>() else {
        warn!("Ignoring unparseable scale root {:?}", root_raw);
        return Ok(None);
    };

    match name_raw.trim().parse::<i64>() {
        Ok(scale_type) => scale::format_scale(root, scale_type).map(Some),
        // An integer too wide for i64 is still a numeric index, and out of range.
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
            scale::format_scale(root, i64::MAX).map(Some)
        }
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => {
            scale::format_scale(root, i64::MIN).map(Some)
        }
        Err(_) => match scale::scale_by_name(name_raw) {
            Some(name) => Ok(Some(format!("{} {}", scale::root_note(root), name))),
            None => {
                warn!("Ignoring unknown scale name {:?}", name_raw);
                Ok(None)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use chrono::TimeZone;

    fn decoded(body: &str) -> (XmlDocument, GenericNode) {
        let doc = XmlDocument::parse(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Ableton MajorVersion="5">{}</Ableton>"#,
            body
        ))
        .unwrap();
        let tree = doc.project();
        (doc, tree)
    }

    fn tempo_body(track: &str, value: &str) -> String {
        format!(
            r#"<LiveSet><{track}><DeviceChain><Mixer><Tempo><LomId Value="0"/><Manual Value="{value}"/></Tempo></Mixer></DeviceChain></{track}></LiveSet>"#
        )
    }

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_extract_reads_tempo_and_scale() {
        let (doc, tree) = decoded(
            r#"<LiveSet>
                <MainTrack><DeviceChain><Mixer><Tempo><Manual Value="128.5"/></Tempo></Mixer></DeviceChain></MainTrack>
                <ScaleInformation><Root Value="13"/><Name Value="2"/></ScaleInformation>
            </LiveSet>"#,
        );
        let record = extract(&doc, &tree, Path::new("/music/Acid Test Project"), when()).unwrap();

        assert_eq!(record.title, "Acid Test Project");
        assert_eq!(record.bpm, 128.5);
        assert_eq!(record.scale, "C# Dorian");
        assert_eq!(record.last_modified, when());
    }

    #[test]
    fn test_legacy_master_track_tempo() {
        let (doc, _) = decoded(&tempo_body("MasterTrack", "98"));
        assert_eq!(read_tempo(&doc), Some(98.0));
    }

    #[test]
    fn test_missing_or_bad_tempo_defaults_to_zero() {
        for body in [
            "<LiveSet/>".to_string(),
            tempo_body("MainTrack", "fast"),
            tempo_body("MainTrack", "-3"),
            r#"<LiveSet><MainTrack><DeviceChain><Mixer><Tempo/></Mixer></DeviceChain></MainTrack></LiveSet>"#.to_string(),
        ] {
            let (doc, tree) = decoded(&body);
            let record = extract(&doc, &tree, Path::new("/m/p"), when()).unwrap();
            assert_eq!(record.bpm, 0.0, "body: {}", body);
        }
    }

    #[test]
    fn test_missing_scale_parts_leave_scale_empty() {
        for body in [
            "<LiveSet/>",
            r#"<LiveSet><ScaleInformation><Root Value="3"/></ScaleInformation></LiveSet>"#,
            r#"<LiveSet><ScaleInformation><Name Value="1"/></ScaleInformation></LiveSet>"#,
            r#"<LiveSet><ScaleInformation><Root Value="x"/><Name Value="1"/></ScaleInformation></LiveSet>"#,
            r#"<LiveSet><ScaleInformation><Root Value="0"/><Name Value="Bebop"/></ScaleInformation></LiveSet>"#,
        ] {
            let (_, tree) = decoded(body);
            assert_eq!(read_scale(&tree).unwrap(), None, "body: {}", body);
        }
    }

    #[test]
    fn test_textual_scale_name() {
        let (_, tree) = decoded(
            r#"<LiveSet><ScaleInformation><Root Value="9"/><Name Value="Minor"/></ScaleInformation></LiveSet>"#,
        );
        assert_eq!(read_scale(&tree).unwrap().as_deref(), Some("A Minor"));
    }

    #[test]
    fn test_scale_index_overflow_is_fatal() {
        let (doc, tree) = decoded(
            r#"<LiveSet><ScaleInformation><Root Value="0"/><Name Value="99"/></ScaleInformation></LiveSet>"#,
        );
        let err = extract(&doc, &tree, Path::new("/m/p"), when()).unwrap_err();
        assert!(matches!(err, CatalogError::ScaleDecode { index: 99, .. }));
    }

    #[test]
    fn test_scale_index_beyond_integer_range_is_fatal() {
        let (doc, tree) = decoded(
            r#"<LiveSet><ScaleInformation><Root Value="0"/><Name Value="99999999999999999999"/></ScaleInformation></LiveSet>"#,
        );
        let err = extract(&doc, &tree, Path::new("/m/p"), when()).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::ScaleDecode {
                index: i64::MAX,
                table_len: 35
            }
        ));

        let (_, tree) = decoded(
            r#"<LiveSet><ScaleInformation><Root Value="0"/><Name Value="-99999999999999999999"/></ScaleInformation></LiveSet>"#,
        );
        let err = read_scale(&tree).unwrap_err();
        assert!(matches!(err, CatalogError::ScaleDecode { index: i64::MIN, .. }));
    }

    #[test]
    fn test_second_scale_section_does_not_break_lookup() {
        let (_, tree) = decoded(
            r#"<LiveSet>
                <ScaleInformation><Root Value="7"/><Name Value="0"/></ScaleInformation>
                <ScaleInformation><Root Value="0"/><Name Value="1"/></ScaleInformation>
            </LiveSet>"#,
        );
        assert_eq!(read_scale(&tree).unwrap().as_deref(), Some("G Major"));
    }
}
