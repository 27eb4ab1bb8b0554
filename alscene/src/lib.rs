//! # alscene
//!
//! Sound lifecycle, effect routing and oneshot pooling over an OpenAL-style positional
//! audio backend.
//!
//! A [`SoundScene`] keeps every sound a game has alive: looping sounds stay tracked
//! until they finish or are destroyed, transient sounds go through a bounded
//! [`OneshotPool`], and named global effects and filters are routed into new sounds
//! automatically. Native objects (sources, buffers, effects, filters, auxiliary slots)
//! are released deterministically when sounds finish, get evicted, or the scene is
//! torn down.
//!
//! ## Quick Start
//!
//! ```no_run
//! use alscene::*;
//! use std::sync::Arc;
//!
//! let desc = SceneDesc::default();
//! let backend = Arc::new(SoftwareBackend::new(desc.sample_rate));
//! let scene = SoundScene::with_backend(desc.clone(), backend.clone());
//!
//! let mut engine = AudioEngine::for_backend(&desc, backend);
//! engine.start()?;
//!
//! // every new sound picks up this reverb on send 0
//! scene.create_global_effect("cave", &ReverbPreset::Cave.params().into())?;
//!
//! scene.play_oneshot("footstep.wav", 0.8, 1.0, None);
//! let wind = scene.play_positioned(
//!     "wind.ogg",
//!     Vec3::new(5.0, 0.0, 0.0),
//!     PlayOptions::looped().volume(0.5),
//! );
//!
//! // once per frame
//! scene.update_listener(Vec3::new(1.0, 0.0, 0.0))?;
//! scene.cleanup();
//!
//! if let Some(wind) = wind {
//!     scene.destroy(&wind);
//! }
//! # Ok::<(), AlSceneError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`SoundScene`]**: registry of persistent sounds, oneshots and global effects
//! - **[`Sound`]**: one playable instance bound to a shared buffer
//! - **[`BufferCache`]**: decodes each file once and shares the native buffer
//! - **[`EffectsFacade`]**: builds native effects and filters from typed parameters
//! - **[`AudioBackend`]**: the native capability surface; [`SoftwareBackend`] is the
//!   in-process implementation
//! - **[`AudioEngine`]**: `cpal` output stream that renders a software backend

pub mod audio_data;
pub mod backend;
pub mod cache;
pub mod cleanup;
pub mod config;
pub mod distance_mute;
pub mod effects;
pub mod engine;
pub mod error;
pub mod listener;
pub mod math;
pub mod pool;
pub mod scene;
pub mod sound;

#[cfg(test)]
mod test_support;

pub use audio_data::{AudioData, AudioDataLoader, ConvertToMono, DefaultAudioLoader, LoadOptions};
pub use backend::{AudioBackend, SoftwareBackend, SourceState};
pub use cache::{BufferCache, BufferHandle};
pub use cleanup::{ReleaseReport, best_effort};
pub use config::{PlayOptions, SceneDesc, SoundConfig, SpatialMode};
pub use distance_mute::{DistanceMute, MuteChange};
pub use effects::{
    Effect, EffectKind, EffectParams, EffectsFacade, Filter, FilterKind, FilterParams,
    FilterPreset, ReverbPreset,
};
pub use engine::{AudioEngine, AudioFillCallback};
pub use error::{AlSceneError, Result};
pub use listener::Listener;
pub use math::{Pose, Quat, Vec3};
pub use pool::{OneshotPool, PoolStats};
pub use scene::{CleanupReport, SceneStats, SoundScene};
pub use sound::{Sound, SoundId, SoundState};
