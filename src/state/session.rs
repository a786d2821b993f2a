//! Session controller for one scene folder.
//!
//! The session owns everything the annotation tool mutates: the loaded scene
//! and its instance mask, the annotation list, the current selection, the
//! modified flag and the camera capture state. Every user action is a method
//! returning `Result`; a failed action leaves the session unchanged.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::data::{InstanceMask, MeshReaderRegistry};
use crate::format::{SceneFiles, SceneLayout, read_json, write_json};
use crate::model::camera::{self, window_size_for};
use crate::model::{Annotation, CameraPose, PinholeCameraParameters};
use crate::state::error::SessionError;
use crate::viewer::{SceneViewer, ViewRequest};

/// Answer to "you have unsaved changes" before a scene change or exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Save, then continue
    Save,
    /// Drop the changes and continue
    Discard,
    /// Stay on the current scene
    Cancel,
}

/// Selection-dependent actions that are currently enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionActions {
    pub view: bool,
    pub edit: bool,
    pub delete: bool,
    pub change_camera: bool,
}

/// A scene folder that passed the load checks.
#[derive(Debug)]
pub struct LoadedScene {
    files: SceneFiles,
    mesh: PathBuf,
    mask_path: PathBuf,
    mask: InstanceMask,
}

impl LoadedScene {
    pub fn files(&self) -> &SceneFiles {
        &self.files
    }

    pub fn name(&self) -> &str {
        &self.files.name
    }

    pub fn mesh(&self) -> &Path {
        &self.mesh
    }

    pub fn mask_path(&self) -> &Path {
        &self.mask_path
    }

    pub fn mask(&self) -> &InstanceMask {
        &self.mask
    }
}

/// Annotation session state.
pub struct Session {
    layout: SceneLayout,
    readers: MeshReaderRegistry,
    default_window: (u32, u32),
    scene: Option<LoadedScene>,
    annotations: Vec<Annotation>,
    selected: Option<usize>,
    modified: bool,
    camera_mode: bool,
    active_pose: Option<CameraPose>,
}

impl Session {
    pub fn new(layout: SceneLayout, default_window: (u32, u32)) -> Self {
        Self {
            layout,
            readers: MeshReaderRegistry::new(),
            default_window,
            scene: None,
            annotations: Vec::new(),
            selected: None,
            modified: false,
            camera_mode: false,
            active_pose: None,
        }
    }

    /// Create a session using the scene layout and window size from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.scene.clone(), config.preferences.window_size())
    }

    // =========================================================================
    // Scene lifecycle
    // =========================================================================

    /// Load a scene folder.
    ///
    /// Resolves the mesh and mask, checks the mask length against the mesh
    /// point count and reads `<scene>_annotations.json` if present. On any
    /// failure the previously loaded scene stays in place.
    pub fn load(&mut self, scene_dir: &Path) -> Result<(), SessionError> {
        let files = SceneFiles::scan(scene_dir, &self.layout)?;
        let mesh = files.mesh.clone().ok_or_else(|| SessionError::NoMeshFound {
            dir: scene_dir.to_path_buf(),
        })?;
        let mask_path = files.mask.clone().ok_or_else(|| SessionError::NoMaskFound {
            dir: scene_dir.to_path_buf(),
        })?;

        let mask = InstanceMask::load(&mask_path)?;
        let point_count = self.readers.point_count(&mesh)?;
        mask.check_point_count(point_count)?;

        let annotations_path = files.annotations_path();
        let annotations: Vec<Annotation> = if annotations_path.is_file() {
            read_json(&annotations_path)?
        } else {
            log::debug!("No annotation file at {:?}, starting empty", annotations_path);
            Vec::new()
        };

        log::info!(
            "Loaded scene {}: {} points, {} annotations",
            files.name,
            point_count,
            annotations.len()
        );

        self.scene = Some(LoadedScene {
            files,
            mesh,
            mask_path,
            mask,
        });
        self.annotations = annotations;
        self.selected = None;
        self.modified = false;
        self.active_pose = None;
        Ok(())
    }

    /// Load a new scene after running the unsaved-changes guard.
    ///
    /// Returns `Ok(false)` when the user cancelled.
    pub fn open_scene(
        &mut self,
        scene_dir: &Path,
        decide: impl FnOnce() -> GuardDecision,
    ) -> Result<bool, SessionError> {
        if !self.guard_transition(decide)? {
            return Ok(false);
        }
        self.load(scene_dir)?;
        Ok(true)
    }

    /// Run the unsaved-changes guard before leaving the application.
    pub fn request_exit(&mut self, decide: impl FnOnce() -> GuardDecision) -> Result<bool, SessionError> {
        self.guard_transition(decide)
    }

    /// Ask `decide` what to do with unsaved changes, if there are any.
    ///
    /// Returns whether the transition may proceed. A failed save stops the
    /// transition and reports the error.
    pub fn guard_transition(
        &mut self,
        decide: impl FnOnce() -> GuardDecision,
    ) -> Result<bool, SessionError> {
        if !self.has_unsaved_changes() {
            return Ok(true);
        }
        match decide() {
            GuardDecision::Save => {
                self.save()?;
                Ok(true)
            }
            GuardDecision::Discard => {
                log::info!("Discarding {} unsaved annotations", self.annotations.len());
                Ok(true)
            }
            GuardDecision::Cancel => Ok(false),
        }
    }

    /// Write the annotation list to `<scene>_annotations.json`.
    pub fn save(&mut self) -> Result<PathBuf, SessionError> {
        if self.annotations.is_empty() {
            return Err(SessionError::NothingToSave);
        }
        let scene = self.loaded()?;
        let path = scene.files.annotations_path();
        write_json(&path, &self.annotations)?;
        self.modified = false;
        log::info!("Saved {} annotations to {:?}", self.annotations.len(), path);
        Ok(path)
    }

    pub fn scene(&self) -> Option<&LoadedScene> {
        self.scene.as_ref()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Modified and non-empty: what the transition guard asks about.
    pub fn has_unsaved_changes(&self) -> bool {
        self.modified && !self.annotations.is_empty()
    }

    /// One display line per annotation, numbered from 1.
    pub fn list_labels(&self) -> Vec<String> {
        self.annotations
            .iter()
            .enumerate()
            .map(|(i, annotation)| annotation.list_label(i))
            .collect()
    }

    // =========================================================================
    // Annotation list
    // =========================================================================

    /// Add an annotation for the objects under the picked points.
    ///
    /// Picked indices are mapped through the instance mask. In camera mode
    /// the active pose is attached and its label prefixes `full_text`.
    /// Returns the index of the new record.
    pub fn add_annotation(&mut self, description: &str, picked: &[usize]) -> Result<usize, SessionError> {
        let scene = self.loaded()?;
        if description.trim().is_empty() {
            return Err(SessionError::EmptyDescription);
        }
        let object_ids = scene.mask.object_ids_at(picked);
        if object_ids.is_empty() {
            return Err(SessionError::NoObjectsPicked);
        }

        let camera = if self.camera_mode {
            self.active_pose.as_ref()
        } else {
            None
        };
        let annotation = Annotation::new(description, object_ids, camera)?;
        log::info!(
            "Added annotation {:?} for objects {:?}",
            annotation.full_text(),
            annotation.object_ids()
        );

        self.annotations.push(annotation);
        self.modified = true;
        Ok(self.annotations.len() - 1)
    }

    /// Validate the description, let the user pick points, then add.
    pub fn annotate(
        &mut self,
        viewer: &mut dyn SceneViewer,
        description: &str,
    ) -> Result<usize, SessionError> {
        let scene = self.loaded()?;
        if description.trim().is_empty() {
            return Err(SessionError::EmptyDescription);
        }

        let camera = if self.camera_mode {
            camera::decode(self.active_pose.as_ref())
        } else {
            None
        };
        let request = ViewRequest {
            title: format!("Pick objects: {}", description.trim()),
            mesh: &scene.mesh,
            window_size: self.viewer_window_size(None),
            camera,
            highlight: None,
        };
        let picked = viewer.pick_points(&request);
        log::debug!("Picked {} points", picked.len());

        self.add_annotation(description, &picked)
    }

    /// Replace the description of the record at `index`.
    ///
    /// Returns `Ok(false)` when the trimmed text equals the current
    /// description; the modified flag is left alone in that case.
    pub fn edit(&mut self, index: usize, description: &str) -> Result<bool, SessionError> {
        let len = self.annotations.len();
        let annotation = self
            .annotations
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { index, len })?;

        let changed = annotation.edit(description)?;
        if changed {
            self.modified = true;
            log::info!("Edited annotation {}: {:?}", index, annotation.full_text());
        }
        Ok(changed)
    }

    /// Remove the record at `index` and clear the selection.
    pub fn delete(&mut self, index: usize) -> Result<Annotation, SessionError> {
        self.check_index(index)?;
        let removed = self.annotations.remove(index);
        self.selected = None;
        self.modified = true;
        log::info!("Deleted annotation {}: {:?}", index, removed.full_text());
        Ok(removed)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn select(&mut self, index: usize) -> Result<(), SessionError> {
        self.check_index(index)?;
        self.selected = Some(index);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected.and_then(|index| self.annotations.get(index))
    }

    pub fn selection_actions(&self) -> SelectionActions {
        let has_selection = self.selected_annotation().is_some();
        SelectionActions {
            view: has_selection,
            edit: has_selection,
            delete: has_selection,
            change_camera: has_selection && self.camera_mode,
        }
    }

    pub fn edit_selected(&mut self, description: &str) -> Result<bool, SessionError> {
        let index = self.selected_index()?;
        self.edit(index, description)
    }

    pub fn delete_selected(&mut self) -> Result<Annotation, SessionError> {
        let index = self.selected_index()?;
        self.delete(index)
    }

    // =========================================================================
    // Camera capture
    // =========================================================================

    pub fn camera_mode(&self) -> bool {
        self.camera_mode
    }

    pub fn set_camera_mode(&mut self, enabled: bool) {
        self.camera_mode = enabled;
        log::info!(
            "Camera capture mode {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Flip camera capture mode; returns the new state.
    pub fn toggle_camera_mode(&mut self) -> bool {
        self.set_camera_mode(!self.camera_mode);
        self.camera_mode
    }

    pub fn active_pose(&self) -> Option<&CameraPose> {
        self.active_pose.as_ref()
    }

    /// Set the pose attached to annotations added from now on.
    pub fn set_active_camera(
        &mut self,
        params: &PinholeCameraParameters,
        view_description: &str,
    ) -> Result<(), SessionError> {
        self.require_camera_mode()?;
        let pose = CameraPose::encode(params, view_description.trim());
        log::info!("Active camera view set: {:?}", pose.view_description());
        self.active_pose = Some(pose);
        Ok(())
    }

    /// Replace the pose of the record at `index`.
    ///
    /// The new pose also becomes the active pose. `full_text` keeps its old
    /// view prefix until the record is next edited.
    pub fn set_annotation_camera(
        &mut self,
        index: usize,
        params: &PinholeCameraParameters,
        view_description: &str,
    ) -> Result<(), SessionError> {
        self.require_camera_mode()?;
        self.check_index(index)?;

        let pose = CameraPose::encode(params, view_description.trim());
        self.annotations[index].set_camera_params(Some(pose.clone()));
        self.active_pose = Some(pose);
        self.modified = true;
        log::info!("Camera of annotation {} replaced", index);
        Ok(())
    }

    /// Let the user navigate to a view and name it.
    ///
    /// `describe` receives the current label and returns the new one, or
    /// `None` to cancel. Returns whether a pose was set.
    pub fn capture_active_camera(
        &mut self,
        viewer: &mut dyn SceneViewer,
        describe: impl FnOnce(Option<&str>) -> Option<String>,
    ) -> Result<bool, SessionError> {
        self.require_camera_mode()?;
        let scene = self.loaded()?;

        let request = ViewRequest {
            title: format!("{}: set camera view", scene.name()),
            mesh: &scene.mesh,
            window_size: self.viewer_window_size(None),
            camera: camera::decode(self.active_pose.as_ref()),
            highlight: None,
        };
        let params = viewer.show(&request);

        let Some(label) = describe(self.active_pose.as_ref().and_then(CameraPose::view_label)) else {
            log::debug!("Camera view capture cancelled");
            return Ok(false);
        };
        self.set_active_camera(&params, &label)?;
        Ok(true)
    }

    /// Let the user navigate to a new view for the selected annotation.
    pub fn change_selected_camera(
        &mut self,
        viewer: &mut dyn SceneViewer,
        describe: impl FnOnce(Option<&str>) -> Option<String>,
    ) -> Result<bool, SessionError> {
        self.require_camera_mode()?;
        let index = self.selected_index()?;
        let scene = self.loaded()?;
        let annotation = &self.annotations[index];

        let start = annotation.camera_params().or(self.active_pose.as_ref());
        let request = ViewRequest {
            title: format!("Change camera: {}", annotation.full_text()),
            mesh: &scene.mesh,
            window_size: self.viewer_window_size(Some(annotation)),
            camera: camera::decode(start),
            highlight: Some(scene.mask.highlight(annotation.object_ids())),
        };
        let params = viewer.show(&request);

        let Some(label) = describe(annotation.view_label()) else {
            log::debug!("Camera change cancelled");
            return Ok(false);
        };
        self.set_annotation_camera(index, &params, &label)?;
        Ok(true)
    }

    /// Show the scene from the active pose.
    pub fn view_active_camera(&self, viewer: &mut dyn SceneViewer) -> Result<(), SessionError> {
        self.require_camera_mode()?;
        let scene = self.loaded()?;
        let pose = self.active_pose.as_ref().ok_or(SessionError::NoCameraPose)?;

        let title = match pose.view_label() {
            Some(label) => format!("{}: {}", scene.name(), label),
            None => scene.name().to_string(),
        };
        viewer.show(&ViewRequest {
            title,
            mesh: &scene.mesh,
            window_size: pose.window_size(),
            camera: Some(pose.to_parameters()),
            highlight: None,
        });
        Ok(())
    }

    /// Show the record at `index` with its objects highlighted.
    pub fn view_annotation(&self, viewer: &mut dyn SceneViewer, index: usize) -> Result<(), SessionError> {
        let scene = self.loaded()?;
        self.check_index(index)?;
        let annotation = &self.annotations[index];

        viewer.show(&ViewRequest {
            title: annotation.full_text().to_string(),
            mesh: &scene.mesh,
            window_size: self.viewer_window_size(Some(annotation)),
            camera: camera::decode(annotation.camera_params()),
            highlight: Some(scene.mask.highlight(annotation.object_ids())),
        });
        Ok(())
    }

    pub fn view_selected(&self, viewer: &mut dyn SceneViewer) -> Result<(), SessionError> {
        let index = self.selected_index()?;
        self.view_annotation(viewer, index)
    }

    /// Show the whole scene without highlights.
    pub fn show_scene(&self, viewer: &mut dyn SceneViewer) -> Result<(), SessionError> {
        let scene = self.loaded()?;
        viewer.show(&ViewRequest {
            title: scene.name().to_string(),
            mesh: &scene.mesh,
            window_size: self.viewer_window_size(None),
            camera: None,
            highlight: None,
        });
        Ok(())
    }

    /// Window size for the viewer: the annotation's pose, then the active
    /// pose, then the configured default.
    pub fn viewer_window_size(&self, annotation: Option<&Annotation>) -> (u32, u32) {
        window_size_for(
            &[
                annotation.and_then(Annotation::camera_params),
                self.active_pose.as_ref(),
            ],
            self.default_window,
        )
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn loaded(&self) -> Result<&LoadedScene, SessionError> {
        self.scene.as_ref().ok_or(SessionError::NoSceneLoaded)
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        if index < self.annotations.len() {
            Ok(())
        } else {
            Err(SessionError::IndexOutOfRange {
                index,
                len: self.annotations.len(),
            })
        }
    }

    fn selected_index(&self) -> Result<usize, SessionError> {
        let index = self.selected.ok_or(SessionError::NoSelection)?;
        self.check_index(index)?;
        Ok(index)
    }

    fn require_camera_mode(&self) -> Result<(), SessionError> {
        if self.camera_mode {
            Ok(())
        } else {
            Err(SessionError::CameraModeDisabled)
        }
    }
}
