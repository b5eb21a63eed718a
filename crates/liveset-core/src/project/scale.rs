//! Scale lookup tables.
//!
//! Both tables are fixed and ordered to match the indices Live writes into
//! `ScaleInformation`. An index outside a table is an error, never clamped:
//! it means corrupt data or a table that is older than the document.

use crate::error::{CatalogError, Result};

/// Chromatic note names; index is the root modulo 12.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scale archetype names; index is the scale-type code.
pub const SCALE_NAMES: [&str; 35] = [
    "Major",
    "Minor",
    "Dorian",
    "Mixolydian",
    "Lydian",
    "Phrygian",
    "Locrian",
    "Whole Tone",
    "Half-whole Dim.",
    "Whole-half Dim.",
    "Minor Blues",
    "Minor Pentatonic",
    "Major Pentatonic",
    "Harmonic Minor",
    "Harmonic Major",
    "Dorian #4",
    "Phrygian Dominant",
    "Melodic Minor",
    "Lydian Augmented",
    "Lydian Dominant",
    "Super Locrian",
    "8-Tone Spanish",
    "Bhairav",
    "Hungarian Minor",
    "Hirajoshi",
    "In-Sen",
    "Iwato",
    "Kumoi",
    "Pelog Selisir",
    "Pelog Tembung",
    "Messiaen 3",
    "Messiaen 4",
    "Messiaen 5",
    "Messiaen 6",
    "Messiaen 7",
];

/// Note name for a root index, wrapping every 12 semitones.
pub fn root_note(root: i64) -> &'static str {
    NOTE_NAMES[root.rem_euclid(12) as usize]
}

/// Scale name for an exact scale-type index.
pub fn scale_name(index: i64) -> Result<&'static str> {
    usize::try_from(index)
        .ok()
        .and_then(|i| SCALE_NAMES.get(i).copied())
        .ok_or(CatalogError::ScaleDecode {
            index,
            table_len: SCALE_NAMES.len(),
        })
}

/// Find a scale by its display name, ignoring ASCII case.
pub fn scale_by_name(name: &str) -> Option<&'static str> {
    SCALE_NAMES
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(name.trim()))
}

/// Compose `"{root note} {scale name}"`.
pub fn format_scale(root: i64, scale_type: i64) -> Result<String> {
    Ok(format!("{} {}", root_note(root), scale_name(scale_type)?))
}
