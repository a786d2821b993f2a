//! Dataset-wide migration.
//!
//! For each scene folder:
//! - `segments_anno.json` missing → folder skipped with a warning
//! - `<scene>_annotations.json` → `processed_annotations.json`
//! - `<scene>_abs_annotations.json` → `processed_abs_annotations.json`
//! - neither input present → warning, nothing written

use std::path::Path;

use crate::format::{
    BatchReport, FolderOutcome, FormatError, SceneFiles, SceneLayout, for_each_scene, read_json,
    write_json,
};
use crate::migration::{
    MigratedAnnotation, MigrationOptions, RelationalRecord, SimpleRecord, migrate_relational,
    migrate_simple,
};
use crate::model::SegmentAnnotations;

/// Migrate every scene folder under `root`.
pub fn migrate_dataset(root: &Path, options: &MigrationOptions) -> Result<BatchReport, FormatError> {
    for_each_scene(root, |folder| migrate_folder(folder, options))
}

/// Migrate the annotation files of one scene folder.
pub fn migrate_folder(folder: &Path, options: &MigrationOptions) -> Result<FolderOutcome, FormatError> {
    let files = SceneFiles::scan(folder, &SceneLayout::default())?;

    let segments_path = files.segments_path();
    if !segments_path.is_file() {
        return Ok(FolderOutcome::Skipped(format!(
            "{:?} not found",
            segments_path
        )));
    }
    let segments = SegmentAnnotations::load(&segments_path)?;

    let mut written = Vec::new();

    let annotations_path = files.annotations_path();
    let has_annotations = annotations_path.is_file();
    if has_annotations {
        let records: Vec<SimpleRecord> = read_json(&annotations_path)?;
        let migrated: Vec<MigratedAnnotation> = records
            .iter()
            .map(|record| migrate_simple(record, &segments))
            .collect();
        let output = files.processed_annotations_path();
        write_json(&output, &migrated)?;
        log::debug!("Migrated {} records from {:?}", migrated.len(), annotations_path);
        written.push(output);
    }

    let abs_path = files.abs_annotations_path();
    let has_abs = abs_path.is_file();
    if has_abs {
        let records: Vec<RelationalRecord> = read_json(&abs_path)?;
        let migrated: Vec<MigratedAnnotation> = records
            .iter()
            .map(|record| migrate_relational(record, &segments, &options.distance_unit))
            .collect();
        let output = files.processed_abs_annotations_path();
        write_json(&output, &migrated)?;
        log::debug!("Migrated {} records from {:?}", migrated.len(), abs_path);
        written.push(output);
    }

    if !has_annotations && !has_abs {
        log::warn!(
            "Neither {:?} nor {:?} found in {:?}",
            annotations_path.file_name().unwrap_or_default(),
            abs_path.file_name().unwrap_or_default(),
            folder
        );
    }

    Ok(FolderOutcome::Processed(written))
}
