use crate::audio_data::{AudioData, LoadOptions};
use crate::error::Result;
use std::path::Path;

/// Decoder collaborator used by the [`BufferCache`](crate::cache::BufferCache).
///
/// The cache calls `load` at most once per canonical path, so implementations do not
/// need their own memoization. The default implementation is
/// [`DefaultAudioLoader`](super::DefaultAudioLoader), backed by symphonia.
///
/// # Errors
///
/// Implementations should return [`AlSceneError::NotFound`](crate::AlSceneError::NotFound)
/// for missing files and [`AlSceneError::Decode`](crate::AlSceneError::Decode) for data
/// they cannot parse.
pub trait AudioDataLoader: Send + Sync {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<AudioData>;
}
