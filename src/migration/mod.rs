//! Migration of older annotation schemas into the canonical shape.
//!
//! Two legacy shapes exist:
//!
//! - **Simple**: object IDs plus free text that may embed `[id]` markers.
//! - **Relational**: a description of the spatial relation between two
//!   objects and their distance in metres.
//!
//! Both migrate into [`MigratedAnnotation`], which resolves every object ID to
//! a human-readable name through the scene's segment-group metadata. The
//! migration functions are pure; [`batch`] applies them to a dataset tree.

pub mod batch;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::model::{Annotation, ObjectId, SegmentAnnotations};

/// Object-ID markers embedded in legacy text, including leading whitespace.
const ID_MARKER_PATTERN: &str = r"\s*\[\d+\]";

static ID_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ID_MARKER_PATTERN).expect("valid regex"));

/// Default unit appended to relational distances.
pub const DEFAULT_DISTANCE_UNIT: &str = "米";

/// Legacy record with free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleRecord {
    #[serde(alias = "object_id", default)]
    pub object_ids: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SimpleRecord {
    /// Text to migrate: `full_text` when present, else `description`.
    pub fn source_text(&self) -> &str {
        self.full_text
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or_default()
    }
}

impl From<&Annotation> for SimpleRecord {
    fn from(annotation: &Annotation) -> Self {
        Self {
            object_ids: annotation.object_ids().to_vec(),
            full_text: Some(annotation.full_text().to_string()),
            description: Some(annotation.description().to_string()),
        }
    }
}

impl From<&MigratedAnnotation> for SimpleRecord {
    fn from(migrated: &MigratedAnnotation) -> Self {
        Self {
            object_ids: migrated.object_id.clone(),
            full_text: None,
            description: Some(migrated.description.clone()),
        }
    }
}

/// Legacy record relating two objects at a distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationalRecord {
    #[serde(default)]
    pub object_ids: Vec<ObjectId>,
    #[serde(default)]
    pub description: String,
    /// Kept as a JSON number so integer distances print without a fraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<Number>,
}

/// Output of migration, as written to `processed_*.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigratedAnnotation {
    pub object_id: Vec<ObjectId>,
    pub object_name: Vec<String>,
    pub description: String,
}

/// Every annotation shape the tool has written over time.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSchema {
    LegacySimple(SimpleRecord),
    LegacyRelational(RelationalRecord),
    Canonical(Annotation),
}

impl RecordSchema {
    /// Migrate into the processed shape.
    ///
    /// Canonical records go through the simple path using their `full_text`.
    pub fn migrate(&self, segments: &SegmentAnnotations, options: &MigrationOptions) -> MigratedAnnotation {
        match self {
            RecordSchema::LegacySimple(record) => migrate_simple(record, segments),
            RecordSchema::LegacyRelational(record) => {
                migrate_relational(record, segments, &options.distance_unit)
            }
            RecordSchema::Canonical(annotation) => {
                migrate_simple(&SimpleRecord::from(annotation), segments)
            }
        }
    }
}

/// Knobs for migration output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Suffix written after relational distances.
    pub distance_unit: String,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            distance_unit: DEFAULT_DISTANCE_UNIT.to_string(),
        }
    }
}

/// Remove `[<digits>]` markers together with the whitespace before them.
pub fn strip_id_markers(text: &str) -> String {
    ID_MARKER.replace_all(text, "").into_owned()
}

/// Migrate a simple legacy record.
///
/// Text containing `#` is already written with object references in prose,
/// so only the markers are stripped. Otherwise, when the stripped text does
/// not end in `.`, `?` or `!` and mentions none of the resolved names, the
/// names are appended as `[a], [b]`.
pub fn migrate_simple(record: &SimpleRecord, segments: &SegmentAnnotations) -> MigratedAnnotation {
    let object_names = segments.object_names(&record.object_ids);
    let source = record.source_text();
    let mut description = strip_id_markers(source);

    if !source.contains('#') && needs_name_suffix(&description, &object_names) {
        let formatted: Vec<String> = object_names.iter().map(|name| format!("[{}]", name)).collect();
        description.push(' ');
        description.push_str(&formatted.join(", "));
    }

    MigratedAnnotation {
        object_id: record.object_ids.clone(),
        object_name: object_names,
        description,
    }
}

fn needs_name_suffix(description: &str, object_names: &[String]) -> bool {
    let Some(last) = description.chars().last() else {
        return false;
    };
    if matches!(last, '.' | '?' | '!') || object_names.is_empty() {
        return false;
    }
    !object_names.iter().any(|name| description.contains(name.as_str()))
}

/// Migrate a relational legacy record.
///
/// - two or more objects: `"{text} {a} {d}{unit}的[{b}]"`
/// - one object: `"{text} {a} {d}{unit}"`
/// - none: `"{text} {d}{unit}"`
pub fn migrate_relational(
    record: &RelationalRecord,
    segments: &SegmentAnnotations,
    unit: &str,
) -> MigratedAnnotation {
    let object_names = segments.object_names(&record.object_ids);
    let distance = format_distance(record.distance_m.as_ref());
    let text = &record.description;

    let description = match object_names.as_slice() {
        [first, second, ..] => format!("{text} {first} {distance}{unit}的[{second}]"),
        [only] => format!("{text} {only} {distance}{unit}"),
        [] => format!("{text} {distance}{unit}"),
    };

    MigratedAnnotation {
        object_id: record.object_ids.clone(),
        object_name: object_names,
        description,
    }
}

/// Round to two decimals and render like a float literal (`1.5`, `2.0`).
///
/// Integers are printed as written (`2`). A missing distance renders as `0`.
pub fn format_distance(distance: Option<&Number>) -> String {
    let Some(distance) = distance else {
        return "0".to_string();
    };
    if distance.is_i64() || distance.is_u64() {
        return distance.to_string();
    }
    let Some(distance) = distance.as_f64() else {
        return distance.to_string();
    };
    let fixed = format!("{:.2}", distance);
    let rounded: f64 = fixed.parse().unwrap_or(distance);
    let text = rounded.to_string();
    if rounded.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}
