use crate::effects::{EffectParams, FilterParams};
use crate::math::Vec3;

/// How a sound is spatialized. Fixed for the lifetime of a [`Sound`](crate::Sound).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SpatialMode {
    /// Listener-relative at the origin with direct channels: no panning or attenuation.
    #[default]
    Direct,
    /// World-space 3D source subject to distance attenuation and distance muting.
    Positioned(Vec3),
}

impl SpatialMode {
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct)
    }

    /// Initial position; always the origin for direct sounds.
    pub fn position(&self) -> Vec3 {
        match self {
            Self::Direct => Vec3::ZERO,
            Self::Positioned(position) => *position,
        }
    }
}

/// Initial parameters of a sound handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundConfig {
    /// Base gain (0.0 = silent, 1.0 = unity).
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
    pub max_distance: f32,
    pub reference_distance: f32,
    pub rolloff_factor: f32,
    pub mute_distance: f32,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            max_distance: 10.0,
            reference_distance: 5.0,
            rolloff_factor: 1.0,
            mute_distance: 20.0,
        }
    }
}

impl SoundConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn mute_distance(mut self, distance: f32) -> Self {
        self.mute_distance = distance.max(0.0);
        self
    }
}

/// Request passed to [`SoundScene::play`](crate::SoundScene::play).
///
/// When `effects` is empty the scene's global effects are auto-applied, one per send
/// slot in registration order. When `filters` is empty the first global filter is
/// applied. Explicit entries replace the auto-apply rule for their category.
#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
    /// Effect `i` goes to auxiliary send `i`. Entries beyond the fourth are skipped.
    pub effects: Vec<EffectParams>,
    /// Applied in order; a source holds one direct filter so the last one wins.
    pub filters: Vec<FilterParams>,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            effects: Vec::new(),
            filters: Vec::new(),
        }
    }
}

impl PlayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a looping, persistent sound.
    pub fn looped() -> Self {
        Self::default().looping(true)
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn effect(mut self, params: EffectParams) -> Self {
        self.effects.push(params);
        self
    }

    pub fn filter(mut self, params: FilterParams) -> Self {
        self.filters.push(params);
        self
    }
}
