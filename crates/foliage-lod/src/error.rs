//! Scene construction error types.

use crate::ModelId;

/// Errors raised while assembling a scene. The per-frame stages never fail.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The base distance `d0` must be strictly positive and finite.
    #[error("invalid LOD base distance {0}: must be positive and finite")]
    InvalidBaseDistance(f32),

    /// The half-distance ratio must lie strictly between 0 and 1.
    #[error("invalid LOD half-distance ratio {0}: must be in (0, 1)")]
    InvalidHalfDistanceRatio(f32),

    /// A host object referenced a model that was never registered.
    #[error("unknown model {0:?}")]
    UnknownModel(ModelId),

    /// A mesh index was out of range for its model.
    #[error("model {model:?} has no foliage mesh {mesh}")]
    UnknownMesh {
        /// The model that was addressed.
        model: ModelId,
        /// The out-of-range mesh index.
        mesh: usize,
    },

    /// A model was registered without any geometry at all.
    #[error("model \"{0}\" has no meshes")]
    EmptyModel(String),
}
