use crate::backend::{AudioBackend, MAX_SENDS, SourceId, SourceParam, SourceState};
use crate::cache::BufferHandle;
use crate::cleanup::release;
use crate::config::{SoundConfig, SpatialMode};
use crate::distance_mute::{DistanceMute, MuteChange};
use crate::effects::{
    Effect, EffectParams, EffectsFacade, Filter, FilterParams, FilterPreset, ReverbPreset,
};
use crate::error::{AlSceneError, Result};
use crate::listener::Listener;
use crate::math::Vec3;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SOUND_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(u64);

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SoundId({})", self.0)
    }
}

/// Lifecycle state of a [`Sound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundState {
    Playing,
    Paused,
    Stopped,
    /// Terminal. Native resources have been released.
    Destroyed,
}

/// One playable instance: an exclusively owned native source bound to a shared buffer.
///
/// Clones share the same instance. The handle tracks its spatial mode, distance model,
/// up to four effect sends and one direct filter. [`destroy`](Self::destroy) releases the
/// source exactly once; dropping the last clone of a handle that was never destroyed
/// destroys it.
///
/// After destruction every mutating call fails with `InvalidOperation`, except
/// `destroy` itself and the effect/filter removal calls, which are no-ops. Read-only
/// accessors keep returning the last known values.
#[derive(Clone)]
pub struct Sound {
    id: SoundId,
    inner: Arc<Mutex<SoundInner>>,
}

struct SoundInner {
    id: SoundId,
    backend: Arc<dyn AudioBackend>,
    effects: EffectsFacade,
    source: Option<SourceId>,
    buffer: Option<Arc<BufferHandle>>,
    mode: SpatialMode,
    position: Vec3,
    volume: f32,
    pitch: f32,
    looping: bool,
    max_distance: f32,
    reference_distance: f32,
    rolloff_factor: f32,
    sends: [Option<Effect>; MAX_SENDS],
    filter: Option<Filter>,
    mute: DistanceMute,
    listener: Option<Listener>,
}

impl SoundInner {
    fn source(&self) -> Result<SourceId> {
        self.source.ok_or_else(|| {
            AlSceneError::InvalidOperation(format!("{} has been destroyed", self.id))
        })
    }

    fn set(&self, param: SourceParam) -> Result<()> {
        self.backend.set_source_param(self.source()?, param)
    }

    fn effective_volume(&self) -> f32 {
        if self.mute.is_muted() {
            0.0
        } else {
            self.volume
        }
    }

    fn state(&self) -> SoundState {
        let Some(source) = self.source else {
            return SoundState::Destroyed;
        };
        match self.backend.source_state(source) {
            Ok(SourceState::Playing) => SoundState::Playing,
            Ok(SourceState::Paused) => SoundState::Paused,
            Ok(SourceState::Initial | SourceState::Stopped) => SoundState::Stopped,
            Err(e) => {
                log::warn!("{}: cannot query {}: {}", self.id, source, e);
                SoundState::Stopped
            }
        }
    }

    fn upload(&self) -> Result<()> {
        let direct = self.mode.is_direct();
        self.set(SourceParam::Relative(direct))?;
        self.set(SourceParam::DirectChannels(direct))?;
        self.set(SourceParam::Position(self.position))?;
        self.set(SourceParam::Gain(self.effective_volume()))?;
        self.set(SourceParam::Pitch(self.pitch))?;
        self.set(SourceParam::Looping(self.looping))?;
        self.set(SourceParam::MaxDistance(self.max_distance))?;
        self.set(SourceParam::ReferenceDistance(self.reference_distance))?;
        self.set(SourceParam::RolloffFactor(self.rolloff_factor))
    }

    fn play(&mut self) -> Result<bool> {
        let source = self.source()?;
        if self.state() == SoundState::Playing {
            return Ok(false);
        }
        self.set(SourceParam::Looping(self.looping))?;
        self.backend.play_source(source)?;
        log::debug!("{} playing on {} (looping: {})", self.id, source, self.looping);
        Ok(true)
    }

    /// Re-runs distance muting against the attached listener.
    fn check_distance(&mut self) -> Result<()> {
        if self.mode.is_direct() || self.source.is_none() {
            return Ok(());
        }
        let Some(listener) = &self.listener else {
            return Ok(());
        };

        match self
            .mute
            .evaluate(self.position, listener.position(), self.volume)
        {
            MuteChange::Unchanged => Ok(()),
            MuteChange::Muted => {
                log::debug!("{} muted by distance", self.id);
                self.set(SourceParam::Gain(0.0))
            }
            MuteChange::Restored(volume) => {
                log::debug!("{} back in range", self.id);
                self.volume = volume;
                self.set(SourceParam::Gain(volume))
            }
        }
    }

    fn check_slot(slot: usize) -> Result<()> {
        if slot >= MAX_SENDS {
            return Err(AlSceneError::InvalidOperation(format!(
                "send slot {} out of range (0-{})",
                slot,
                MAX_SENDS - 1
            )));
        }
        Ok(())
    }

    fn attach_effect(&mut self, effect: &Effect, slot: usize) -> Result<()> {
        Self::check_slot(slot)?;
        let source = self.source()?;
        self.backend.set_source_send(source, slot, Some(effect.slot()))?;
        // the previous occupant is released here if nothing else holds it
        self.sends[slot] = Some(effect.clone());
        log::debug!("{} send {} -> {:?}", self.id, slot, effect);
        Ok(())
    }

    fn attach_filter(&mut self, filter: &Filter) -> Result<()> {
        let source = self.source()?;
        self.backend
            .set_source_direct_filter(source, Some(filter.filter_id()))?;
        self.filter = Some(filter.clone());
        Ok(())
    }

    fn clear_sends(&mut self) -> Result<()> {
        let Some(source) = self.source else {
            return Ok(());
        };

        let mut failed = 0;
        for index in 0..MAX_SENDS {
            if self.sends[index].is_none() {
                continue;
            }
            // clear the route before the effect can be released
            if !release("effect send", || {
                self.backend.set_source_send(source, index, None)
            }) {
                failed += 1;
            }
            self.sends[index] = None;
        }

        if failed > 0 {
            return Err(AlSceneError::Backend(format!(
                "{}: {} send(s) could not be cleared",
                self.id, failed
            )));
        }
        Ok(())
    }

    fn clear_filter(&mut self) -> Result<()> {
        let Some(source) = self.source else {
            return Ok(());
        };
        if self.filter.is_some() {
            self.backend.set_source_direct_filter(source, None)?;
            self.filter = None;
        }
        Ok(())
    }

    /// Releases the source. Runs every step even when one fails and reports the first
    /// failure.
    fn release(&mut self) -> Result<()> {
        let Some(source) = self.source else {
            return Ok(());
        };

        let mut first_error = None;
        let mut keep = |result: Result<()>| {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        };

        keep(self.clear_sends());
        keep(self.clear_filter());
        keep(self.backend.stop_source(source));
        keep(self.backend.bind_buffer(source, None));
        keep(self.backend.delete_source(source));

        self.source = None;
        self.buffer = None;
        self.listener = None;
        log::debug!("{} destroyed, released {}", self.id, source);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for SoundInner {
    fn drop(&mut self) {
        if self.source.is_some() {
            log::debug!("{} dropped without destroy", self.id);
            if let Err(e) = self.release() {
                log::warn!("{}: release on drop failed: {}", self.id, e);
            }
        }
    }
}

impl Sound {
    /// Allocates a native source, binds it to `buffer` and applies `mode` and `config`.
    ///
    /// Direct sounds are listener-relative at the origin with direct channels enabled.
    /// Positioned sounds are placed in world space.
    ///
    /// # Errors
    ///
    /// `ResourceExhausted` when the backend has no free source.
    pub fn create(
        effects: &EffectsFacade,
        buffer: Arc<BufferHandle>,
        mode: SpatialMode,
        config: &SoundConfig,
    ) -> Result<Sound> {
        let backend = effects.backend().clone();
        let source = backend.create_source()?;
        let id = SoundId(NEXT_SOUND_ID.fetch_add(1, Ordering::Relaxed));

        let buffer_id = buffer.buffer_id();
        log::debug!(
            "Creating {} on {} for {} ({:?})",
            id,
            source,
            buffer.path().display(),
            mode
        );

        // dropping `inner` on an early return releases the source
        let inner = SoundInner {
            id,
            backend,
            effects: effects.clone(),
            source: Some(source),
            buffer: Some(buffer),
            mode,
            position: mode.position(),
            volume: config.volume,
            pitch: config.pitch,
            looping: config.looping,
            max_distance: config.max_distance,
            reference_distance: config.reference_distance,
            rolloff_factor: config.rolloff_factor,
            sends: Default::default(),
            filter: None,
            mute: DistanceMute::new(config.mute_distance),
            listener: None,
        };
        inner.backend.bind_buffer(source, Some(buffer_id))?;
        inner.upload()?;

        Ok(Sound {
            id,
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    pub fn id(&self) -> SoundId {
        self.id
    }

    /// Attaches the listener used for distance muting and evaluates it immediately.
    pub fn attach_listener(&self, listener: Listener) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.source()?;
        inner.listener = Some(listener);
        inner.check_distance()
    }

    pub(crate) fn on_listener_moved(&self) {
        let mut inner = self.inner.lock();
        if let Err(e) = inner.check_distance() {
            log::warn!("{}: distance check failed: {}", inner.id, e);
        }
    }

    /// Starts or resumes playback, looping if the handle's looping flag is set.
    ///
    /// Returns `Ok(false)` without side effects if the sound is already playing.
    pub fn play(&self) -> Result<bool> {
        self.inner.lock().play()
    }

    /// Sets the looping flag, then behaves like [`play`](Self::play).
    pub fn play_looped(&self) -> Result<bool> {
        let mut inner = self.inner.lock();
        inner.set(SourceParam::Looping(true))?;
        inner.looping = true;
        inner.play()
    }

    /// Returns `Ok(false)` unless the sound was playing.
    pub fn pause(&self) -> Result<bool> {
        let inner = self.inner.lock();
        let source = inner.source()?;
        if inner.state() != SoundState::Playing {
            return Ok(false);
        }
        inner.backend.pause_source(source)?;
        log::debug!("{} paused", inner.id);
        Ok(true)
    }

    /// Returns `Ok(false)` unless the sound was playing or paused.
    pub fn stop(&self) -> Result<bool> {
        let inner = self.inner.lock();
        let source = inner.source()?;
        if !matches!(inner.state(), SoundState::Playing | SoundState::Paused) {
            return Ok(false);
        }
        inner.backend.stop_source(source)?;
        log::debug!("{} stopped", inner.id);
        Ok(true)
    }

    /// Releases every native resource this handle owns. Idempotent and infallible;
    /// failures are logged.
    pub fn destroy(&self) {
        if let Err(e) = self.try_destroy() {
            log::warn!("{}: destroy incomplete: {}", self.id, e);
        }
    }

    /// Like [`destroy`](Self::destroy) but reports the first failure. The handle is
    /// destroyed either way.
    pub fn try_destroy(&self) -> Result<()> {
        self.inner.lock().release()
    }

    /// Sets the base volume. While distance-muted the gain stays at zero and the new
    /// volume is what gets restored.
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.source()?;
        inner.volume = volume;
        if inner.mute.is_muted() {
            inner.mute.store_volume(volume);
            Ok(())
        } else {
            inner.set(SourceParam::Gain(volume))
        }
    }

    pub fn set_pitch(&self, pitch: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.set(SourceParam::Pitch(pitch))?;
        inner.pitch = pitch;
        Ok(())
    }

    pub fn set_looping(&self, looping: bool) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.set(SourceParam::Looping(looping))?;
        inner.looping = looping;
        Ok(())
    }

    /// Moves a positioned sound and re-evaluates distance muting.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` for direct sounds and destroyed handles.
    pub fn set_position(&self, position: Vec3) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.source()?;
        if inner.mode.is_direct() {
            return Err(AlSceneError::InvalidOperation(format!(
                "{} is a direct sound and cannot be positioned",
                inner.id
            )));
        }
        inner.set(SourceParam::Position(position))?;
        inner.position = position;
        inner.check_distance()
    }

    pub fn set_max_distance(&self, distance: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.set(SourceParam::MaxDistance(distance))?;
        inner.max_distance = distance;
        Ok(())
    }

    pub fn set_reference_distance(&self, distance: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.set(SourceParam::ReferenceDistance(distance))?;
        inner.reference_distance = distance;
        Ok(())
    }

    pub fn set_rolloff_factor(&self, rolloff: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.set(SourceParam::RolloffFactor(rolloff))?;
        inner.rolloff_factor = rolloff;
        Ok(())
    }

    /// Listener distance past which the sound is hard-muted. Re-evaluates immediately.
    pub fn set_mute_distance(&self, distance: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.source()?;
        inner.mute.set_max_distance(distance);
        inner.check_distance()
    }

    /// Builds a new effect and routes send `slot` (0-3) to it, replacing the previous
    /// occupant of that slot.
    pub fn add_effect(&self, params: &EffectParams, slot: usize) -> Result<Effect> {
        let mut inner = self.inner.lock();
        inner.source()?;
        SoundInner::check_slot(slot)?;
        let effect = inner.effects.build_effect(params)?;
        inner.attach_effect(&effect, slot)?;
        Ok(effect)
    }

    pub fn add_reverb_preset(&self, preset: ReverbPreset, slot: usize) -> Result<Effect> {
        self.add_effect(&EffectParams::Reverb(preset.params()), slot)
    }

    /// Routes send `slot` to an existing, possibly shared, effect.
    pub fn attach_effect(&self, effect: &Effect, slot: usize) -> Result<()> {
        self.inner.lock().attach_effect(effect, slot)
    }

    /// Clears every send routed to `effect`. Returns whether any was.
    pub fn detach_effect(&self, effect: &Effect) -> Result<bool> {
        let mut inner = self.inner.lock();
        let Some(source) = inner.source else {
            return Ok(false);
        };

        let mut detached = false;
        for index in 0..MAX_SENDS {
            if inner.sends[index].as_ref().is_some_and(|e| e.ptr_eq(effect)) {
                inner.backend.set_source_send(source, index, None)?;
                inner.sends[index] = None;
                detached = true;
            }
        }
        Ok(detached)
    }

    /// Builds a new filter and makes it the direct filter, replacing any existing one.
    pub fn add_filter(&self, params: &FilterParams) -> Result<Filter> {
        let mut inner = self.inner.lock();
        inner.source()?;
        let filter = inner.effects.build_filter(params)?;
        inner.attach_filter(&filter)?;
        Ok(filter)
    }

    pub fn add_filter_preset(&self, preset: FilterPreset) -> Result<Filter> {
        self.add_filter(&preset.params())
    }

    pub fn attach_filter(&self, filter: &Filter) -> Result<()> {
        self.inner.lock().attach_filter(filter)
    }

    /// Clears the direct filter if it is `filter`. Returns whether it was.
    pub fn detach_filter(&self, filter: &Filter) -> Result<bool> {
        let mut inner = self.inner.lock();
        if inner.filter.as_ref().is_some_and(|f| f.ptr_eq(filter)) {
            inner.clear_filter()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Clears all four sends. No-op when none is occupied.
    pub fn remove_all_effects(&self) -> Result<()> {
        self.inner.lock().clear_sends()
    }

    /// Clears the direct filter. No-op when none is attached.
    pub fn remove_all_filters(&self) -> Result<()> {
        self.inner.lock().clear_filter()
    }

    /// Number of occupied sends.
    pub fn effect_count(&self) -> usize {
        self.inner.lock().sends.iter().flatten().count()
    }

    pub fn effect_at(&self, slot: usize) -> Option<Effect> {
        self.inner.lock().sends.get(slot).cloned().flatten()
    }

    pub fn has_filter(&self) -> bool {
        self.inner.lock().filter.is_some()
    }

    pub fn filter(&self) -> Option<Filter> {
        self.inner.lock().filter.clone()
    }

    /// Effective gain: zero while distance-muted, otherwise the base volume.
    pub fn volume(&self) -> f32 {
        self.inner.lock().effective_volume()
    }

    /// Base volume, unaffected by distance muting.
    pub fn original_volume(&self) -> f32 {
        self.inner.lock().volume
    }

    pub fn pitch(&self) -> f32 {
        self.inner.lock().pitch
    }

    pub fn position(&self) -> Vec3 {
        self.inner.lock().position
    }

    pub fn is_looping(&self) -> bool {
        self.inner.lock().looping
    }

    pub fn max_distance(&self) -> f32 {
        self.inner.lock().max_distance
    }

    pub fn reference_distance(&self) -> f32 {
        self.inner.lock().reference_distance
    }

    pub fn rolloff_factor(&self) -> f32 {
        self.inner.lock().rolloff_factor
    }

    pub fn mute_distance(&self) -> f32 {
        self.inner.lock().mute.max_distance()
    }

    pub fn is_distance_muted(&self) -> bool {
        self.inner.lock().mute.is_muted()
    }

    /// Distance to the attached listener, if any.
    pub fn distance_to_listener(&self) -> Option<f32> {
        let inner = self.inner.lock();
        inner
            .listener
            .as_ref()
            .map(|listener| listener.distance_to(inner.position))
    }

    pub fn state(&self) -> SoundState {
        self.inner.lock().state()
    }

    pub fn is_playing(&self) -> bool {
        self.state() == SoundState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state() == SoundState::Paused
    }

    /// Neither playing nor paused.
    pub fn is_finished(&self) -> bool {
        !matches!(self.state(), SoundState::Playing | SoundState::Paused)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().source.is_none()
    }

    pub fn mode(&self) -> SpatialMode {
        self.inner.lock().mode
    }

    pub fn is_direct(&self) -> bool {
        self.inner.lock().mode.is_direct()
    }

    pub fn source_id(&self) -> Option<SourceId> {
        self.inner.lock().source
    }

    pub fn buffer(&self) -> Option<Arc<BufferHandle>> {
        self.inner.lock().buffer.clone()
    }

    pub fn ptr_eq(&self, other: &Sound) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Sound {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sound").field("id", &self.id).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use crate::effects::EffectKind;
    use crate::test_support::Rig;

    fn direct(rig: &Rig) -> Sound {
        let buffer = rig.buffer("tone.wav", 480);
        Sound::create(&rig.effects, buffer, SpatialMode::Direct, &SoundConfig::default()).unwrap()
    }

    fn positioned(rig: &Rig, position: Vec3) -> Sound {
        let buffer = rig.buffer("tone.wav", 480);
        Sound::create(
            &rig.effects,
            buffer,
            SpatialMode::Positioned(position),
            &SoundConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_direct_sound_is_relative_at_origin() {
        let rig = Rig::new();
        let sound = direct(&rig);
        let info = rig.backend.source_info(sound.source_id().unwrap()).unwrap();

        assert!(info.relative);
        assert!(info.direct_channels);
        assert_eq!(info.position, Vec3::ZERO);
        assert_eq!(sound.position(), Vec3::ZERO);
        assert!(matches!(
            sound.set_position(Vec3::new(1.0, 0.0, 0.0)),
            Err(AlSceneError::InvalidOperation(_))
        ));
        assert_eq!(sound.position(), Vec3::ZERO);
    }

    #[test]
    fn test_positioned_sound_is_placed() {
        let rig = Rig::new();
        let sound = positioned(&rig, Vec3::new(5.0, 0.0, 0.0));
        let info = rig.backend.source_info(sound.source_id().unwrap()).unwrap();

        assert!(!info.relative);
        assert!(!info.direct_channels);
        assert_eq!(info.position, Vec3::new(5.0, 0.0, 0.0));

        sound.set_position(Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert_eq!(sound.position(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_zero_pitch_rejected() {
        let rig = Rig::new();
        let sound = direct(&rig);
        sound.set_pitch(1.5).unwrap();
        assert!(matches!(sound.set_pitch(0.0), Err(AlSceneError::Backend(_))));
        assert_eq!(sound.pitch(), 1.5);

        let buffer = rig.buffer("tone.wav", 480);
        let config = SoundConfig::default().pitch(0.0);
        assert!(Sound::create(&rig.effects, buffer, SpatialMode::Direct, &config).is_err());
        assert_eq!(rig.backend.source_count(), 1);
    }

    #[test]
    fn test_transport_transitions() {
        let rig = Rig::new();
        let sound = direct(&rig);
        assert_eq!(sound.state(), SoundState::Stopped);

        assert!(!sound.pause().unwrap());
        assert!(!sound.stop().unwrap());

        assert!(sound.play().unwrap());
        assert!(!sound.play().unwrap());
        assert_eq!(sound.state(), SoundState::Playing);

        assert!(sound.pause().unwrap());
        assert!(!sound.pause().unwrap());
        assert_eq!(sound.state(), SoundState::Paused);

        assert!(sound.play().unwrap());
        assert!(sound.pause().unwrap());
        assert!(sound.stop().unwrap());
        assert_eq!(sound.state(), SoundState::Stopped);
    }

    #[test]
    fn test_play_honours_looping_flag() {
        let rig = Rig::new();
        let buffer = rig.buffer("loop.wav", 480);
        let sound = Sound::create(
            &rig.effects,
            buffer,
            SpatialMode::Direct,
            &SoundConfig::default().looping(true),
        )
        .unwrap();

        sound.play().unwrap();
        rig.render_all();
        assert_eq!(sound.state(), SoundState::Playing);

        let once = direct(&rig);
        once.play().unwrap();
        rig.render_all();
        assert_eq!(once.state(), SoundState::Stopped);
        assert!(once.is_finished());

        assert!(once.play_looped().unwrap());
        assert!(once.is_looping());
        let info = rig.backend.source_info(once.source_id().unwrap()).unwrap();
        assert!(info.looping);
    }

    #[test]
    fn test_destroy_is_idempotent_and_terminal() {
        let rig = Rig::new();
        let sound = direct(&rig);
        sound.add_effect(&EffectParams::defaults(EffectKind::Echo), 0).unwrap();
        sound.add_filter(&FilterParams::lowpass(1.0, 0.5)).unwrap();
        sound.play().unwrap();

        sound.destroy();
        sound.destroy();
        assert!(sound.try_destroy().is_ok());

        assert_eq!(sound.state(), SoundState::Destroyed);
        assert_eq!(rig.backend.source_count(), 0);
        assert_eq!(rig.backend.effect_count(), 0);
        assert_eq!(rig.backend.filter_count(), 0);
        // the shared buffer survives
        assert_eq!(rig.backend.buffer_count(), 1);
        assert!(sound.buffer().is_none());

        assert!(matches!(sound.play(), Err(AlSceneError::InvalidOperation(_))));
        assert!(matches!(
            sound.set_volume(0.5),
            Err(AlSceneError::InvalidOperation(_))
        ));
        assert!(matches!(
            sound.add_effect(&EffectParams::defaults(EffectKind::Chorus), 1),
            Err(AlSceneError::InvalidOperation(_))
        ));
        sound.remove_all_effects().unwrap();
        sound.remove_all_filters().unwrap();
    }

    #[test]
    fn test_same_slot_replaces_effect() {
        let rig = Rig::new();
        let sound = direct(&rig);

        sound.add_effect(&EffectParams::defaults(EffectKind::Reverb), 1).unwrap();
        let second = sound
            .add_effect(&EffectParams::defaults(EffectKind::Distortion), 1)
            .unwrap();

        assert_eq!(sound.effect_count(), 1);
        assert_eq!(sound.effect_at(1), Some(second.clone()));
        // the replaced reverb had no other owner
        assert_eq!(rig.backend.effect_count(), 1);
        let info = rig.backend.source_info(sound.source_id().unwrap()).unwrap();
        assert_eq!(info.sends[1], Some(second.slot()));
    }

    #[test]
    fn test_send_slot_out_of_range() {
        let rig = Rig::new();
        let sound = direct(&rig);
        assert!(matches!(
            sound.add_effect(&EffectParams::defaults(EffectKind::Echo), 4),
            Err(AlSceneError::InvalidOperation(_))
        ));
        assert_eq!(rig.backend.effect_count(), 0);
    }

    #[test]
    fn test_shared_effect_attach_and_detach() {
        let rig = Rig::new();
        let a = direct(&rig);
        let b = direct(&rig);
        let shared = rig.effects.build_reverb_preset(ReverbPreset::Cave).unwrap();

        a.attach_effect(&shared, 0).unwrap();
        b.attach_effect(&shared, 2).unwrap();
        assert_eq!(shared.owner_count(), 3);

        assert!(a.detach_effect(&shared).unwrap());
        assert!(!a.detach_effect(&shared).unwrap());
        assert_eq!(a.effect_count(), 0);
        assert_eq!(b.effect_count(), 1);

        drop(shared);
        // b still routes into it
        assert_eq!(rig.backend.effect_count(), 1);
        b.remove_all_effects().unwrap();
        assert_eq!(rig.backend.effect_count(), 0);
    }

    #[test]
    fn test_filter_replaces_and_removes() {
        let rig = Rig::new();
        let sound = direct(&rig);
        sound.remove_all_filters().unwrap();
        sound.remove_all_effects().unwrap();

        sound.add_filter_preset(FilterPreset::Muffled).unwrap();
        let thin = sound.add_filter_preset(FilterPreset::Thin).unwrap();
        assert_eq!(rig.backend.filter_count(), 1);
        assert_eq!(sound.filter(), Some(thin.clone()));

        sound.remove_all_filters().unwrap();
        assert!(!sound.has_filter());
        let info = rig.backend.source_info(sound.source_id().unwrap()).unwrap();
        assert_eq!(info.direct_filter, None);
    }

    #[test]
    fn test_dropping_last_clone_destroys() {
        let rig = Rig::new();
        let sound = direct(&rig);
        let clone = sound.clone();
        drop(sound);
        assert_eq!(rig.backend.source_count(), 1);
        drop(clone);
        assert_eq!(rig.backend.source_count(), 0);
    }

    #[test]
    fn test_distance_mute_restores_exact_volume() {
        let rig = Rig::new();
        let listener = Listener::default();
        let sound = positioned(&rig, Vec3::new(5.0, 0.0, 0.0));
        sound.set_volume(0.73).unwrap();
        sound.set_mute_distance(10.0).unwrap();
        sound.attach_listener(listener.clone()).unwrap();
        assert!(!sound.is_distance_muted());

        listener.set_position(Vec3::new(20.0, 0.0, 0.0));
        sound.on_listener_moved();
        assert!(sound.is_distance_muted());
        assert_eq!(sound.volume(), 0.0);
        assert_eq!(sound.original_volume(), 0.73);
        let source = sound.source_id().unwrap();
        assert_eq!(rig.backend.source_info(source).unwrap().gain, 0.0);

        listener.set_position(Vec3::new(7.0, 0.0, 0.0));
        sound.on_listener_moved();
        assert!(!sound.is_distance_muted());
        assert_eq!(sound.volume(), 0.73);
        assert_eq!(rig.backend.source_info(source).unwrap().gain, 0.73);
        assert_eq!(sound.distance_to_listener(), Some(2.0));
    }

    #[test]
    fn test_volume_change_while_muted() {
        let rig = Rig::new();
        let listener = Listener::default();
        let sound = positioned(&rig, Vec3::new(50.0, 0.0, 0.0));
        sound.attach_listener(listener.clone()).unwrap();
        assert!(sound.is_distance_muted());

        sound.set_volume(0.4).unwrap();
        let source = sound.source_id().unwrap();
        assert_eq!(rig.backend.source_info(source).unwrap().gain, 0.0);

        listener.set_position(Vec3::new(45.0, 0.0, 0.0));
        sound.on_listener_moved();
        assert_eq!(sound.volume(), 0.4);
    }

    #[test]
    fn test_direct_sound_never_muted() {
        let rig = Rig::new();
        let listener = Listener::default();
        let sound = direct(&rig);
        sound.attach_listener(listener.clone()).unwrap();

        listener.set_position(Vec3::new(1000.0, 0.0, 0.0));
        sound.on_listener_moved();
        assert!(!sound.is_distance_muted());
        assert_eq!(sound.volume(), 1.0);
    }

    #[test]
    fn test_create_fails_when_sources_exhausted() {
        let rig = Rig::with_backend(SoftwareBackend::with_limits(48000, 1, 8));
        let _first = direct(&rig);
        let buffer = rig.buffer("tone.wav", 480);
        let result = Sound::create(
            &rig.effects,
            buffer,
            SpatialMode::Direct,
            &SoundConfig::default(),
        );
        assert!(matches!(result, Err(AlSceneError::ResourceExhausted(_))));
    }
}
