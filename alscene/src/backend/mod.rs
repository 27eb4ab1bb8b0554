//! Capability surface of the native positional-audio layer.
//!
//! Everything above this module talks to audio hardware only through [`AudioBackend`].
//! The surface mirrors an OpenAL context with the EFX extension: a listener, buffers,
//! sources, and effects/filters/auxiliary slots routed through per-source sends.
//! [`SoftwareBackend`] is the in-process implementation.

pub mod software;

use crate::audio_data::AudioData;
use crate::effects::{EffectKind, FilterKind, ParamValue};
use crate::error::Result;
use crate::math::{Quat, Vec3};
use std::fmt;

pub use software::{SoftwareBackend, SourceInfo};

/// Number of auxiliary sends per source.
pub const MAX_SENDS: usize = 4;

macro_rules! native_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u64);

        impl $name {
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

native_id!(
    /// Native PCM buffer.
    BufferId
);
native_id!(
    /// Native playback source.
    SourceId
);
native_id!(EffectId);
native_id!(FilterId);
native_id!(
    /// Auxiliary effect slot. A source send routes into one of these.
    SlotId
);

/// Playback state as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// Settable source attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceParam {
    Gain(f32),
    Pitch(f32),
    Position(Vec3),
    /// Position is interpreted relative to the listener.
    Relative(bool),
    /// Multichannel buffers bypass virtualization and map straight to output channels.
    DirectChannels(bool),
    Looping(bool),
    MaxDistance(f32),
    ReferenceDistance(f32),
    RolloffFactor(f32),
}

/// The native audio layer.
///
/// Implementations own every native object and are shared between the scene and the
/// output stream, so all methods take `&self`. Transport calls follow OpenAL rules:
/// `play` on a paused source resumes, on a stopped or initial source rewinds and
/// starts, and on a playing source restarts.
pub trait AudioBackend: Send + Sync {
    /// Mixing rate in Hz.
    fn sample_rate(&self) -> u32;

    fn set_listener_position(&self, position: Vec3) -> Result<()>;
    fn set_listener_orientation(&self, rotation: Quat) -> Result<()>;
    fn set_listener_gain(&self, gain: f32) -> Result<()>;

    fn create_buffer(&self) -> Result<BufferId>;
    /// Uploads PCM. The backend converts it to its own rate if needed.
    fn set_buffer_data(&self, buffer: BufferId, data: &AudioData) -> Result<()>;
    /// Sources still bound to the buffer are stopped and unbound.
    fn delete_buffer(&self, buffer: BufferId) -> Result<()>;

    /// Fails with `ResourceExhausted` when no more sources can be allocated.
    fn create_source(&self) -> Result<SourceId>;
    fn delete_source(&self, source: SourceId) -> Result<()>;
    fn bind_buffer(&self, source: SourceId, buffer: Option<BufferId>) -> Result<()>;
    fn play_source(&self, source: SourceId) -> Result<()>;
    fn pause_source(&self, source: SourceId) -> Result<()>;
    fn stop_source(&self, source: SourceId) -> Result<()>;
    fn source_state(&self, source: SourceId) -> Result<SourceState>;
    fn set_source_param(&self, source: SourceId, param: SourceParam) -> Result<()>;
    fn set_source_direct_filter(&self, source: SourceId, filter: Option<FilterId>) -> Result<()>;
    /// Routes auxiliary send `index` (0 to [`MAX_SENDS`] - 1) to `slot`, or clears it.
    fn set_source_send(&self, source: SourceId, index: usize, slot: Option<SlotId>)
    -> Result<()>;

    fn create_effect(&self, kind: EffectKind) -> Result<EffectId>;
    fn set_effect_param(&self, effect: EffectId, name: &str, value: ParamValue) -> Result<()>;
    fn effect_param(&self, effect: EffectId, name: &str) -> Result<ParamValue>;
    fn delete_effect(&self, effect: EffectId) -> Result<()>;

    fn create_filter(&self, kind: FilterKind) -> Result<FilterId>;
    fn set_filter_param(&self, filter: FilterId, name: &str, value: ParamValue) -> Result<()>;
    fn filter_param(&self, filter: FilterId, name: &str) -> Result<ParamValue>;
    fn delete_filter(&self, filter: FilterId) -> Result<()>;

    fn create_aux_slot(&self) -> Result<SlotId>;
    fn set_slot_effect(&self, slot: SlotId, effect: Option<EffectId>) -> Result<()>;
    fn set_slot_gain(&self, slot: SlotId, gain: f32) -> Result<()>;
    fn delete_aux_slot(&self, slot: SlotId) -> Result<()>;
}
