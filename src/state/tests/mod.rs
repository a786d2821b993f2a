//! Unit tests for the session controller.
//!
//! Scenes are built in temporary folders: an ASCII PLY mesh, an
//! `instance.npy` mask and optionally an annotation file. The interactive
//! viewer is replaced by `ScriptedViewer`.


use std::path::{Path, PathBuf};

use ndarray::Array1;

use crate::data::InstanceMask;
use crate::format::SceneLayout;
use crate::model::camera::IDENTITY_EXTRINSIC;
use crate::model::{ObjectId, PinholeCameraParameters, PinholeIntrinsic};
use crate::state::Session;
use crate::viewer::{SceneViewer, ViewRequest};

/// Write a scene folder named `name` under `root` with the given mask.
fn write_scene(root: &Path, name: &str, mask: &[ObjectId]) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir(&dir).unwrap();

    let mut ply = format!(
        "ply\nformat ascii 1.0\nelement vertex {}\nproperty float x\nproperty float y\nproperty float z\nend_header\n",
        mask.len()
    );
    for i in 0..mask.len() {
        ply.push_str(&format!("{} 0 0\n", i));
    }
    std::fs::write(dir.join("mesh_aligned_0.05.ply"), ply).unwrap();

    InstanceMask::from_array(Array1::from(mask.to_vec()))
        .save(&dir.join("instance.npy"))
        .unwrap();
    dir
}

/// Scene with points `[0, 1, 1, 2, 2, 3]`.
fn standard_scene(root: &Path) -> PathBuf {
    write_scene(root, "scene0000_00", &[0, 1, 1, 2, 2, 3])
}

fn new_session() -> Session {
    Session::new(SceneLayout::default(), (1024, 768))
}

fn loaded_session(root: &Path) -> (Session, PathBuf) {
    let dir = standard_scene(root);
    let mut session = new_session();
    session.load(&dir).unwrap();
    (session, dir)
}

fn camera(width: u32, height: u32, tx: f64) -> PinholeCameraParameters {
    let mut extrinsic = IDENTITY_EXTRINSIC;
    extrinsic[0][3] = tx;
    PinholeCameraParameters {
        intrinsic: PinholeIntrinsic::new(
            width,
            height,
            500.0,
            500.0,
            f64::from(width) / 2.0 - 0.5,
            f64::from(height) / 2.0 - 0.5,
        ),
        extrinsic,
    }
}

/// Viewer stand-in returning canned answers and recording what it was shown.
#[derive(Default)]
struct ScriptedViewer {
    picks: Vec<usize>,
    final_camera: Option<PinholeCameraParameters>,
    titles: Vec<String>,
    window_sizes: Vec<(u32, u32)>,
    start_cameras: Vec<Option<PinholeCameraParameters>>,
    highlights: Vec<Option<Array1<bool>>>,
    pick_calls: usize,
}

impl ScriptedViewer {
    fn picking(picks: Vec<usize>) -> Self {
        Self {
            picks,
            ..Self::default()
        }
    }

    fn ending_at(camera: PinholeCameraParameters) -> Self {
        Self {
            final_camera: Some(camera),
            ..Self::default()
        }
    }

    fn record(&mut self, request: &ViewRequest<'_>) {
        self.titles.push(request.title.clone());
        self.window_sizes.push(request.window_size);
        self.start_cameras.push(request.camera);
        self.highlights.push(request.highlight.clone());
    }
}

impl SceneViewer for ScriptedViewer {
    fn show(&mut self, request: &ViewRequest<'_>) -> PinholeCameraParameters {
        self.record(request);
        self.final_camera
            .or(request.camera)
            .unwrap_or_else(|| camera(1024, 768, 0.0))
    }

    fn pick_points(&mut self, request: &ViewRequest<'_>) -> Vec<usize> {
        self.record(request);
        self.pick_calls += 1;
        self.picks.clone()
    }
}
