//! Camera pose codec.
//!
//! The viewer works with [`PinholeCameraParameters`], an intrinsic/extrinsic
//! pair. Annotations persist a [`CameraPose`]: the same data as plain numbers
//! plus derived position/direction/up vectors and a free-text view label.
//!
//! The derived vectors are a cached convenience for downstream consumers.
//! They are always recomputed from the extrinsic matrix, both on encode and
//! when a pose is read back from disk, so a hand-edited file cannot make
//! them disagree with the matrix.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

/// 4×4 world-to-camera transform, row-major.
pub type Extrinsic = [[f64; 4]; 4];

/// Identity extrinsic.
pub const IDENTITY_EXTRINSIC: Extrinsic = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Pinhole intrinsic model as the viewer represents it: image size plus a
/// 3×3 camera matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeIntrinsic {
    width: u32,
    height: u32,
    matrix: [[f64; 3]; 3],
}

impl PinholeIntrinsic {
    /// Build an intrinsic from focal lengths and principal point.
    pub fn new(width: u32, height: u32, fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            width,
            height,
            matrix: [[fx, 0.0, cx], [0.0, fy, cy], [0.0, 0.0, 1.0]],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Focal lengths `(fx, fy)`.
    pub fn focal_length(&self) -> (f64, f64) {
        (self.matrix[0][0], self.matrix[1][1])
    }

    /// Principal point `(cx, cy)`.
    pub fn principal_point(&self) -> (f64, f64) {
        (self.matrix[0][2], self.matrix[1][2])
    }
}

/// Camera parameters exchanged with the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCameraParameters {
    pub intrinsic: PinholeIntrinsic,
    pub extrinsic: Extrinsic,
}

/// Serializable intrinsic fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicParams {
    pub width: u32,
    pub height: u32,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl From<&PinholeIntrinsic> for IntrinsicParams {
    fn from(intrinsic: &PinholeIntrinsic) -> Self {
        let (fx, fy) = intrinsic.focal_length();
        let (cx, cy) = intrinsic.principal_point();
        Self {
            width: intrinsic.width(),
            height: intrinsic.height(),
            fx,
            fy,
            cx,
            cy,
        }
    }
}

impl From<&IntrinsicParams> for PinholeIntrinsic {
    fn from(params: &IntrinsicParams) -> Self {
        PinholeIntrinsic::new(
            params.width,
            params.height,
            params.fx,
            params.fy,
            params.cx,
            params.cy,
        )
    }
}

/// A saved viewpoint, as persisted in `camera_params`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredCameraPose")]
pub struct CameraPose {
    extrinsic: Extrinsic,
    intrinsic: IntrinsicParams,
    position: [f64; 3],
    direction: [f64; 3],
    up: [f64; 3],
    view_description: String,
}

/// On-disk shape; derived vectors are accepted but discarded.
#[derive(Deserialize)]
struct StoredCameraPose {
    extrinsic: Extrinsic,
    intrinsic: IntrinsicParams,
    #[serde(default)]
    view_description: String,
}

impl From<StoredCameraPose> for CameraPose {
    fn from(stored: StoredCameraPose) -> Self {
        CameraPose::from_parts(stored.intrinsic, stored.extrinsic, stored.view_description)
    }
}

impl CameraPose {
    /// Encode viewer parameters and a view label into a persistable pose.
    ///
    /// Intrinsic values are read back through the intrinsic's own accessors,
    /// the extrinsic matrix is copied verbatim.
    pub fn encode(params: &PinholeCameraParameters, view_description: impl Into<String>) -> Self {
        Self::from_parts(
            IntrinsicParams::from(&params.intrinsic),
            params.extrinsic,
            view_description.into(),
        )
    }

    fn from_parts(intrinsic: IntrinsicParams, extrinsic: Extrinsic, view_description: String) -> Self {
        let (position, direction, up) = derive_vectors(&extrinsic);
        Self {
            extrinsic,
            intrinsic,
            position,
            direction,
            up,
            view_description,
        }
    }

    /// Rebuild the viewer parameters this pose was encoded from.
    pub fn to_parameters(&self) -> PinholeCameraParameters {
        PinholeCameraParameters {
            intrinsic: PinholeIntrinsic::from(&self.intrinsic),
            extrinsic: self.extrinsic,
        }
    }

    pub fn extrinsic(&self) -> &Extrinsic {
        &self.extrinsic
    }

    pub fn intrinsic(&self) -> &IntrinsicParams {
        &self.intrinsic
    }

    /// Camera position: negated translation column.
    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    /// Viewing direction: negated third row of the rotation block.
    pub fn direction(&self) -> [f64; 3] {
        self.direction
    }

    /// Up vector: second row of the rotation block.
    pub fn up(&self) -> [f64; 3] {
        self.up
    }

    pub fn view_description(&self) -> &str {
        &self.view_description
    }

    /// View label, or `None` when blank.
    pub fn view_label(&self) -> Option<&str> {
        let label = self.view_description.as_str();
        (!label.is_empty()).then_some(label)
    }

    pub fn set_view_description(&mut self, view_description: impl Into<String>) {
        self.view_description = view_description.into();
    }

    /// Window size `(width, height)` the viewer should open with.
    pub fn window_size(&self) -> (u32, u32) {
        (self.intrinsic.width, self.intrinsic.height)
    }
}

/// Decode an optional stored pose into viewer parameters.
///
/// `None` means "no override": the caller keeps the viewer's current state.
pub fn decode(pose: Option<&CameraPose>) -> Option<PinholeCameraParameters> {
    pose.map(CameraPose::to_parameters)
}

/// Pick a window size: first pose that has one, else the default.
pub fn window_size_for(poses: &[Option<&CameraPose>], default: (u32, u32)) -> (u32, u32) {
    poses
        .iter()
        .flatten()
        .map(|pose| pose.window_size())
        .next()
        .unwrap_or(default)
}

/// Default viewer window size.
pub fn default_window_size() -> (u32, u32) {
    (DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT)
}

fn derive_vectors(e: &Extrinsic) -> ([f64; 3], [f64; 3], [f64; 3]) {
    let position = [-e[0][3], -e[1][3], -e[2][3]];
    let direction = [-e[2][0], -e[2][1], -e[2][2]];
    let up = [e[1][0], e[1][1], e[1][2]];
    (position, direction, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> PinholeCameraParameters {
        PinholeCameraParameters {
            intrinsic: PinholeIntrinsic::new(1024, 768, 886.8, 886.8, 511.5, 383.5),
            extrinsic: [
                [0.1, 0.2, 0.3, 1.5],
                [0.4, 0.5, 0.6, -2.25],
                [0.7, 0.8, 0.9, 3.125],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[test]
    fn test_encode_derives_vectors() {
        let pose = CameraPose::encode(&sample_params(), "top-down");

        assert_eq!(pose.position(), [-1.5, 2.25, -3.125]);
        assert_eq!(pose.direction(), [-0.7, -0.8, -0.9]);
        assert_eq!(pose.up(), [0.4, 0.5, 0.6]);
        assert_eq!(pose.view_description(), "top-down");
        assert_eq!(pose.window_size(), (1024, 768));
    }

    #[test]
    fn test_encode_decode_extrinsic_exact() {
        let matrices = [
            IDENTITY_EXTRINSIC,
            [
                [f64::MIN_POSITIVE, -0.0, 1e-300, 1e300],
                [std::f64::consts::PI, -std::f64::consts::E, 0.1 + 0.2, -7.0],
                [1.0 / 3.0, 2.0 / 3.0, -1.0 / 7.0, 123_456.789],
                [0.0, 0.0, 0.0, 1.0],
            ],
        ];

        for extrinsic in matrices {
            let mut params = sample_params();
            params.extrinsic = extrinsic;
            let pose = CameraPose::encode(&params, "");
            let decoded = decode(Some(&pose)).unwrap();
            for (row, expected) in decoded.extrinsic.iter().zip(extrinsic.iter()) {
                for (a, b) in row.iter().zip(expected.iter()) {
                    assert_eq!(a.to_bits(), b.to_bits());
                }
            }
        }
    }

    #[test]
    fn test_intrinsic_roundtrip() {
        let params = sample_params();
        let decoded = CameraPose::encode(&params, "x").to_parameters();
        assert_eq!(decoded.intrinsic, params.intrinsic);
        assert_eq!(decoded.intrinsic.focal_length(), (886.8, 886.8));
        assert_eq!(decoded.intrinsic.principal_point(), (511.5, 383.5));
    }

    #[test]
    fn test_decode_absent_is_none() {
        assert!(decode(None).is_none());
    }

    #[test]
    fn test_json_field_names() {
        let pose = CameraPose::encode(&sample_params(), "close-up");
        let value = serde_json::to_value(&pose).unwrap();

        assert_eq!(value["intrinsic"]["width"], 1024);
        assert_eq!(value["intrinsic"]["fx"], 886.8);
        assert_eq!(value["extrinsic"][1][3], -2.25);
        assert_eq!(value["position"][0], -1.5);
        assert_eq!(value["up"][2], 0.6);
        assert_eq!(value["view_description"], "close-up");
    }

    #[test]
    fn test_derived_vectors_recomputed_on_load() {
        let pose = CameraPose::encode(&sample_params(), "front");
        let mut value = serde_json::to_value(&pose).unwrap();
        value["position"] = serde_json::json!([9.0, 9.0, 9.0]);
        value["up"] = serde_json::json!([0.0, 0.0, 0.0]);

        let loaded: CameraPose = serde_json::from_value(value).unwrap();
        assert_eq!(loaded, pose);
    }

    #[test]
    fn test_window_size_fallback() {
        let pose = CameraPose::encode(&sample_params(), "");
        assert_eq!(window_size_for(&[None, Some(&pose)], (1, 2)), (1024, 768));
        assert_eq!(window_size_for(&[None, None], (1, 2)), (1, 2));
    }
}
