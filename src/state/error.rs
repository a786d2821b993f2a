//! Errors reported back to the user by session actions.
//!
//! Every variant is recoverable: the action is aborted and the session is
//! left as it was before the action.

use std::path::PathBuf;
use thiserror::Error;

use crate::format::FormatError;
use crate::model::AnnotationError;

/// Errors from session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Action needs a loaded scene
    #[error("No scene loaded")]
    NoSceneLoaded,

    /// Scene folder has no mesh file
    #[error("No mesh (.ply) file found in {dir:?}")]
    NoMeshFound {
        /// Scene folder
        dir: PathBuf,
    },

    /// Scene folder has no instance mask
    #[error("No instance mask (.npy) file found in {dir:?}")]
    NoMaskFound {
        /// Scene folder
        dir: PathBuf,
    },

    /// Description is blank after trimming
    #[error("Description must not be empty")]
    EmptyDescription,

    /// Action needs a selected annotation
    #[error("No annotation selected")]
    NoSelection,

    /// Annotation index is not in the list
    #[error("Annotation index {index} out of range (list has {len} entries)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// List length
        len: usize,
    },

    /// Save requested with an empty list
    #[error("No annotations to save")]
    NothingToSave,

    /// Picked points contained no object
    #[error("Picked points contain no object instances")]
    NoObjectsPicked,

    /// Camera action requested while camera mode is off
    #[error("Camera capture mode is disabled")]
    CameraModeDisabled,

    /// No active camera pose has been set
    #[error("No camera view has been set")]
    NoCameraPose,

    /// File or codec failure (including write failures on save)
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl From<AnnotationError> for SessionError {
    fn from(err: AnnotationError) -> Self {
        match err {
            AnnotationError::EmptyDescription => SessionError::EmptyDescription,
        }
    }
}
