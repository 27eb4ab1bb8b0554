//! Effects and direct filters.
//!
//! [`EffectsFacade`] turns typed parameter records into native objects. An [`Effect`]
//! owns one native effect plus the auxiliary slot it is loaded into; a [`Filter`] owns
//! one native filter. Both are cheap to clone and release their native objects when
//! the last clone is dropped, so a global effect shared by several sounds stays alive
//! as long as any of them still routes into it.

mod params;
mod presets;

pub use params::{
    AutowahParams, BandpassParams, ChorusParams, CompressorParams, DistortionParams,
    EchoParams, EffectParams, EqualizerParams, FilterParams, FlangerParams, HighpassParams,
    LowpassParams, ParamValue, PitchShifterParams, ReverbParams,
};
pub use presets::{FilterPreset, ReverbPreset};

use crate::backend::{AudioBackend, EffectId, FilterId, SlotId};
use crate::cleanup::release;
use crate::error::{AlSceneError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Reverb,
    Distortion,
    Echo,
    Chorus,
    Flanger,
    PitchShifter,
    Autowah,
    Compressor,
    Equalizer,
}

impl EffectKind {
    pub const ALL: [EffectKind; 9] = [
        Self::Reverb,
        Self::Distortion,
        Self::Echo,
        Self::Chorus,
        Self::Flanger,
        Self::PitchShifter,
        Self::Autowah,
        Self::Compressor,
        Self::Equalizer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Reverb => "reverb",
            Self::Distortion => "distortion",
            Self::Echo => "echo",
            Self::Chorus => "chorus",
            Self::Flanger => "flanger",
            Self::PitchShifter => "pitch_shifter",
            Self::Autowah => "autowah",
            Self::Compressor => "compressor",
            Self::Equalizer => "equalizer",
        }
    }

    /// Native parameter names this effect type accepts.
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            Self::Reverb => ReverbParams::PARAMETERS,
            Self::Distortion => DistortionParams::PARAMETERS,
            Self::Echo => EchoParams::PARAMETERS,
            Self::Chorus => ChorusParams::PARAMETERS,
            Self::Flanger => FlangerParams::PARAMETERS,
            Self::PitchShifter => PitchShifterParams::PARAMETERS,
            Self::Autowah => AutowahParams::PARAMETERS,
            Self::Compressor => CompressorParams::PARAMETERS,
            Self::Equalizer => EqualizerParams::PARAMETERS,
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = AlSceneError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pitch_shift" => Ok(Self::PitchShifter),
            "auto_wah" => Ok(Self::Autowah),
            _ => Self::ALL
                .into_iter()
                .find(|kind| kind.name() == s)
                .ok_or_else(|| AlSceneError::UnsupportedType(format!("effect type '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
}

impl FilterKind {
    pub const ALL: [FilterKind; 3] = [Self::Lowpass, Self::Highpass, Self::Bandpass];

    pub fn name(self) -> &'static str {
        match self {
            Self::Lowpass => "lowpass",
            Self::Highpass => "highpass",
            Self::Bandpass => "bandpass",
        }
    }

    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            Self::Lowpass => LowpassParams::PARAMETERS,
            Self::Highpass => HighpassParams::PARAMETERS,
            Self::Bandpass => BandpassParams::PARAMETERS,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = AlSceneError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| AlSceneError::UnsupportedType(format!("filter type '{}'", s)))
    }
}

/// One native effect loaded into its own auxiliary slot.
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

struct EffectInner {
    kind: EffectKind,
    effect: EffectId,
    slot: SlotId,
    backend: Arc<dyn AudioBackend>,
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        let backend = &self.backend;
        release("effect slot binding", || {
            backend.set_slot_effect(self.slot, None)
        });
        release("auxiliary slot", || backend.delete_aux_slot(self.slot));
        release("effect", || backend.delete_effect(self.effect));
        log::debug!("Released {} effect {} / {}", self.kind, self.effect, self.slot);
    }
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        self.inner.kind
    }

    pub fn effect_id(&self) -> EffectId {
        self.inner.effect
    }

    /// The auxiliary slot sources send into.
    pub fn slot(&self) -> SlotId {
        self.inner.slot
    }

    pub fn set_parameter(&self, name: &str, value: impl Into<ParamValue>) -> Result<()> {
        self.inner
            .backend
            .set_effect_param(self.inner.effect, name, value.into())?;
        // EFX slots snapshot the effect; reload so the change is heard
        self.inner
            .backend
            .set_slot_effect(self.inner.slot, Some(self.inner.effect))
    }

    pub fn parameter(&self, name: &str) -> Result<ParamValue> {
        self.inner.backend.effect_param(self.inner.effect, name)
    }

    /// Wet-level gain of the auxiliary slot.
    pub fn set_gain(&self, gain: f32) -> Result<()> {
        self.inner.backend.set_slot_gain(self.inner.slot, gain)
    }

    /// True when both handles refer to the same native objects.
    pub fn ptr_eq(&self, other: &Effect) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles to this effect, including sound sends and registries.
    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("kind", &self.inner.kind)
            .field("effect", &self.inner.effect)
            .field("slot", &self.inner.slot)
            .finish()
    }
}

/// One native direct filter.
#[derive(Clone)]
pub struct Filter {
    inner: Arc<FilterInner>,
}

struct FilterInner {
    kind: FilterKind,
    filter: FilterId,
    backend: Arc<dyn AudioBackend>,
}

impl Drop for FilterInner {
    fn drop(&mut self) {
        release("filter", || self.backend.delete_filter(self.filter));
        log::debug!("Released {} filter {}", self.kind, self.filter);
    }
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        self.inner.kind
    }

    pub fn filter_id(&self) -> FilterId {
        self.inner.filter
    }

    /// Takes effect on sources the next time the filter is attached.
    pub fn set_parameter(&self, name: &str, value: impl Into<ParamValue>) -> Result<()> {
        self.inner
            .backend
            .set_filter_param(self.inner.filter, name, value.into())
    }

    pub fn parameter(&self, name: &str) -> Result<ParamValue> {
        self.inner.backend.filter_param(self.inner.filter, name)
    }

    pub fn ptr_eq(&self, other: &Filter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("kind", &self.inner.kind)
            .field("filter", &self.inner.filter)
            .finish()
    }
}

/// Builds native effects and filters for one backend.
///
/// A scene owns one facade and hands clones to every sound it creates.
#[derive(Clone)]
pub struct EffectsFacade {
    backend: Arc<dyn AudioBackend>,
}

impl EffectsFacade {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn AudioBackend> {
        &self.backend
    }

    /// Allocates exactly one native effect and one auxiliary slot, uploads every
    /// parameter and loads the effect into the slot.
    ///
    /// Nothing is leaked on failure: objects allocated before the error are released.
    pub fn build_effect(&self, params: &EffectParams) -> Result<Effect> {
        let kind = params.kind();
        let effect = self.backend.create_effect(kind)?;
        let slot = match self.backend.create_aux_slot() {
            Ok(slot) => slot,
            Err(e) => {
                release("effect", || self.backend.delete_effect(effect));
                return Err(e);
            }
        };

        // from here on dropping `built` releases both objects
        let built = Effect {
            inner: Arc::new(EffectInner {
                kind,
                effect,
                slot,
                backend: self.backend.clone(),
            }),
        };

        for (name, value) in params.values() {
            self.backend.set_effect_param(effect, name, value)?;
        }
        self.backend.set_slot_effect(slot, Some(effect))?;

        log::debug!("Built {} effect {} in {}", kind, effect, slot);
        Ok(built)
    }

    /// Allocates exactly one native filter and uploads every parameter.
    pub fn build_filter(&self, params: &FilterParams) -> Result<Filter> {
        let kind = params.kind();
        let filter = self.backend.create_filter(kind)?;
        let built = Filter {
            inner: Arc::new(FilterInner {
                kind,
                filter,
                backend: self.backend.clone(),
            }),
        };

        for (name, value) in params.values() {
            self.backend.set_filter_param(filter, name, value)?;
        }

        log::debug!("Built {} filter {}", kind, filter);
        Ok(built)
    }

    pub fn build_reverb_preset(&self, preset: ReverbPreset) -> Result<Effect> {
        self.build_effect(&EffectParams::Reverb(preset.params()))
    }

    pub fn build_filter_preset(&self, preset: FilterPreset) -> Result<Filter> {
        self.build_filter(&preset.params())
    }
}
