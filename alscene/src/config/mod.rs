mod scene_desc;
mod sound_config;

pub use scene_desc::SceneDesc;
pub use sound_config::{PlayOptions, SoundConfig, SpatialMode};
