use crate::audio_data::ConvertToMono;

/// Configuration descriptor for a [`SoundScene`](crate::SoundScene) and the software
/// backend it drives.
#[derive(Debug, Clone)]
pub struct SceneDesc {
    /// Mixing rate of the backend. Decoded buffers are resampled to this rate on upload.
    pub sample_rate: u32,
    /// Output channel count (typically 2 for stereo).
    pub channels: u16,
    /// Frames requested from the device per callback.
    pub block_size: usize,
    /// Maximum number of native sources the backend will hand out.
    pub max_sources: usize,
    /// Maximum number of auxiliary effect slots the backend will hand out.
    pub max_effect_slots: usize,
    /// Oneshot pool capacity. Clamped to at least 10.
    pub max_oneshots: usize,
    /// Distance-model parameters given to every new sound.
    pub max_distance: f32,
    pub reference_distance: f32,
    pub rolloff_factor: f32,
    /// Listener distance past which positioned sounds are hard-muted.
    pub mute_distance: f32,
    /// Run a cleanup sweep after this many persistent plays. 0 disables.
    pub cleanup_every: usize,
    /// Channel handling applied when files are decoded into the buffer cache.
    pub convert_to_mono: ConvertToMono,
}

impl Default for SceneDesc {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            block_size: 1024,
            max_sources: 256,
            max_effect_slots: 64,
            max_oneshots: 100,
            max_distance: 15.0,
            reference_distance: 3.0,
            rolloff_factor: 1.0,
            mute_distance: 20.0,
            cleanup_every: 10,
            convert_to_mono: ConvertToMono::Original,
        }
    }
}

impl SceneDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn max_sources(mut self, max: usize) -> Self {
        self.max_sources = max;
        self
    }

    pub fn max_effect_slots(mut self, max: usize) -> Self {
        self.max_effect_slots = max;
        self
    }

    pub fn max_oneshots(mut self, max: usize) -> Self {
        self.max_oneshots = max;
        self
    }

    pub fn distance_model(mut self, max_distance: f32, reference_distance: f32, rolloff: f32) -> Self {
        self.max_distance = max_distance;
        self.reference_distance = reference_distance;
        self.rolloff_factor = rolloff;
        self
    }

    pub fn mute_distance(mut self, distance: f32) -> Self {
        self.mute_distance = distance.max(0.0);
        self
    }

    pub fn cleanup_every(mut self, plays: usize) -> Self {
        self.cleanup_every = plays;
        self
    }

    pub fn convert_to_mono(mut self, convert: ConvertToMono) -> Self {
        self.convert_to_mono = convert;
        self
    }

    /// Per-sound defaults derived from this scene.
    pub fn sound_config(&self) -> crate::config::SoundConfig {
        crate::config::SoundConfig {
            max_distance: self.max_distance,
            reference_distance: self.reference_distance,
            rolloff_factor: self.rolloff_factor,
            mute_distance: self.mute_distance,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let desc = SceneDesc::default();
        assert_eq!(desc.max_oneshots, 100);
        assert_eq!(desc.cleanup_every, 10);
        assert_eq!(desc.max_distance, 15.0);
        assert_eq!(desc.reference_distance, 3.0);
        assert_eq!(desc.mute_distance, 20.0);
    }

    #[test]
    fn test_sound_config_inherits_distance_model() {
        let desc = SceneDesc::new().distance_model(30.0, 2.0, 0.5).mute_distance(40.0);
        let config = desc.sound_config();
        assert_eq!(config.max_distance, 30.0);
        assert_eq!(config.reference_distance, 2.0);
        assert_eq!(config.rolloff_factor, 0.5);
        assert_eq!(config.mute_distance, 40.0);
        assert_eq!(config.volume, 1.0);
    }
}
