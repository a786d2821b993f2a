//! Loader for NumPy `.npy` instance masks.
//!
//! Masks written by older preprocessing scripts are `float64` arrays; newer
//! ones are integer arrays. Every element must be a non-negative integral
//! value that fits an object ID.

use std::io::Cursor;
use std::path::Path;

use ndarray::{Array1, ArrayD};
use ndarray_npy::{ReadNpyExt, WriteNpyExt};

use crate::format::FormatError;
use crate::model::ObjectId;

/// Loader for NumPy `.npy` instance masks.
///
/// **Accepted shapes**: `(N,)`, or `(N, 1)` as written by some exporters.
///
/// Supported data types: `f64`, `f32`, `i64`, `i32`, `i16`, `u64`, `u32`, `u16`, `u8`.
pub struct NpyMaskLoader;

impl NpyMaskLoader {
    /// NumPy magic bytes: \x93NUMPY
    const MAGIC: &'static [u8] = &[0x93, b'N', b'U', b'M', b'P', b'Y'];

    /// Check the NumPy magic bytes.
    pub fn can_load(data: &[u8]) -> bool {
        data.len() >= Self::MAGIC.len() && data.starts_with(Self::MAGIC)
    }

    /// Read a mask file from disk.
    pub fn load_file(path: &Path) -> Result<Array1<ObjectId>, FormatError> {
        if !path.is_file() {
            return Err(FormatError::not_found(path));
        }
        let data = std::fs::read(path)?;
        let mask = Self::load(&data)?;
        log::info!("NpyMaskLoader: loaded {} entries from {:?}", mask.len(), path);
        Ok(mask)
    }

    /// Decode mask bytes, trying each supported dtype in turn.
    pub fn load(data: &[u8]) -> Result<Array1<ObjectId>, FormatError> {
        if !Self::can_load(data) {
            return Err(FormatError::invalid_array("missing NumPy magic bytes"));
        }

        // float64 first: legacy preprocessing wrote float masks
        if let Some(result) = Self::try_load::<f64>(data) {
            return result;
        }
        if let Some(result) = Self::try_load::<i64>(data) {
            return result;
        }
        if let Some(result) = Self::try_load::<i32>(data) {
            return result;
        }
        if let Some(result) = Self::try_load::<u32>(data) {
            return result;
        }
        if let Some(result) = Self::try_load::<f32>(data) {
            return result;
        }
        if let Some(result) = Self::try_load::<u64>(data) {
            return result;
        }
        if let Some(result) = Self::try_load::<i16>(data) {
            return result;
        }
        if let Some(result) = Self::try_load::<u16>(data) {
            return result;
        }
        if let Some(result) = Self::try_load::<u8>(data) {
            return result;
        }

        Err(FormatError::invalid_array(
            "Failed to read NumPy array: unsupported dtype or invalid format",
        ))
    }

    /// `None` when the dtype does not match, so the next one can be tried.
    fn try_load<T>(data: &[u8]) -> Option<Result<Array1<ObjectId>, FormatError>>
    where
        T: ToObjectId + Copy,
        ArrayD<T>: ReadNpyExt,
    {
        let array = ArrayD::<T>::read_npy(Cursor::new(data)).ok()?;
        Some(Self::to_mask(array))
    }

    fn to_mask<T: ToObjectId + Copy>(array: ArrayD<T>) -> Result<Array1<ObjectId>, FormatError> {
        let shape = array.shape().to_vec();
        log::debug!("NpyMaskLoader: array shape = {:?}", shape);

        match shape.as_slice() {
            [_] | [_, 1] => {}
            _ => {
                return Err(FormatError::invalid_array(format!(
                    "instance mask must be one-dimensional, got shape {:?}",
                    shape
                )));
            }
        }

        array
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                value.to_object_id().ok_or_else(|| {
                    FormatError::invalid_array(format!("entry {} is not a valid object ID", i))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from)
    }

    /// Encode a mask as `.npy` bytes (`<u4`).
    pub fn to_bytes(mask: &Array1<ObjectId>) -> Result<Vec<u8>, FormatError> {
        let mut bytes = Vec::new();
        mask.write_npy(&mut bytes)?;
        Ok(bytes)
    }
}

/// Conversion of a stored mask element into an object ID.
pub trait ToObjectId {
    fn to_object_id(self) -> Option<ObjectId>;
}

macro_rules! impl_to_object_id_int {
    ($($t:ty),*) => {
        $(
            impl ToObjectId for $t {
                fn to_object_id(self) -> Option<ObjectId> {
                    ObjectId::try_from(self).ok()
                }
            }
        )*
    };
}

impl_to_object_id_int!(i64, i32, i16, u64, u32, u16, u8);

impl ToObjectId for f64 {
    fn to_object_id(self) -> Option<ObjectId> {
        let in_range = self.is_finite() && self >= 0.0 && self <= f64::from(ObjectId::MAX);
        (in_range && self.fract() == 0.0).then_some(self as ObjectId)
    }
}

impl ToObjectId for f32 {
    fn to_object_id(self) -> Option<ObjectId> {
        f64::from(self).to_object_id()
    }
}
