//! Seam to the interactive 3D viewer.
//!
//! Rendering and point picking belong to an external mesh library. The
//! session only needs two blocking capabilities: show the mesh and report
//! where the camera ended up, and let the user pick points. Both return once
//! the user closes the viewer window.

use std::path::Path;

use ndarray::Array1;

use crate::model::PinholeCameraParameters;

/// What the viewer should display.
#[derive(Debug, Clone)]
pub struct ViewRequest<'a> {
    /// Window title.
    pub title: String,
    /// Mesh file to display.
    pub mesh: &'a Path,
    /// Window size `(width, height)`.
    pub window_size: (u32, u32),
    /// Camera to start from; `None` keeps the viewer's default.
    pub camera: Option<PinholeCameraParameters>,
    /// Points to colour as selected, one flag per mesh vertex.
    pub highlight: Option<Array1<bool>>,
}

/// Blocking viewer operations used by the session.
pub trait SceneViewer {
    /// Show the mesh until the user closes the window; return the final camera.
    fn show(&mut self, request: &ViewRequest<'_>) -> PinholeCameraParameters;

    /// Let the user pick points; return the picked vertex indices.
    fn pick_points(&mut self, request: &ViewRequest<'_>) -> Vec<usize>;
}
