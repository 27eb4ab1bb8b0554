use crate::audio_data::{AudioDataLoader, DefaultAudioLoader, LoadOptions};
use crate::backend::{AudioBackend, MAX_SENDS};
use crate::cache::{BufferCache, BufferHandle};
use crate::config::{PlayOptions, SceneDesc, SoundConfig, SpatialMode};
use crate::effects::{
    Effect, EffectKind, EffectParams, EffectsFacade, Filter, FilterKind, FilterParams,
    FilterPreset, ReverbPreset,
};
use crate::error::{AlSceneError, Result};
use crate::listener::Listener;
use crate::math::{Pose, Vec3, orientation_from_angles};
use crate::pool::{OneshotPool, PoolStats};
use crate::sound::Sound;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Result of one [`SoundScene::cleanup`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Persistent sounds destroyed because they had finished.
    pub sounds: usize,
    /// Finished oneshots removed from the pool.
    pub oneshots: usize,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.sounds + self.oneshots
    }
}

/// Snapshot of a [`SoundScene`]'s bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Tracked persistent sounds.
    pub sounds: usize,
    /// Persistent sounds currently playing.
    pub playing_sounds: usize,
    pub oneshots: PoolStats,
    pub global_effects: usize,
    pub global_filters: usize,
    pub cached_buffers: usize,
    /// Calls to `play`/`play_positioned` that produced a sound, looping or not.
    pub play_count: usize,
}

impl SceneStats {
    /// Persistent sounds plus pooled oneshots.
    pub fn total_sounds(&self) -> usize {
        self.sounds + self.oneshots.active
    }
}

struct SceneState {
    sounds: Vec<Sound>,
    pool: OneshotPool,
    global_effects: Vec<(String, Effect)>,
    global_filters: Vec<(String, Filter)>,
    play_count: usize,
    plays_since_cleanup: usize,
    cleanup_every: usize,
}

impl SceneState {
    fn tracked(&self) -> impl Iterator<Item = &Sound> {
        self.sounds.iter().chain(self.pool.iter())
    }

    fn tracks(&self, sound: &Sound) -> bool {
        self.tracked().any(|s| s.ptr_eq(sound))
    }

    fn detach_effect_everywhere(&self, name: &str, effect: &Effect) {
        for sound in self.tracked() {
            if let Err(e) = sound.detach_effect(effect) {
                log::warn!("Failed to detach '{}' from {}: {}", name, sound.id(), e);
            }
        }
    }

    fn detach_filter_everywhere(&self, name: &str, filter: &Filter) {
        for sound in self.tracked() {
            if let Err(e) = sound.detach_filter(filter) {
                log::warn!("Failed to detach '{}' from {}: {}", name, sound.id(), e);
            }
        }
    }

    fn cleanup(&mut self) -> CleanupReport {
        let before = self.sounds.len();
        self.sounds.retain(|sound| {
            if sound.is_finished() {
                sound.destroy();
                false
            } else {
                true
            }
        });

        let report = CleanupReport {
            sounds: before - self.sounds.len(),
            oneshots: self.pool.cleanup_finished_sounds(),
        };
        if report.total() > 0 {
            log::info!(
                "Cleanup destroyed {} sound(s) and {} oneshot(s)",
                report.sounds,
                report.oneshots
            );
        }
        report
    }
}

/// Registry of every sound a game keeps alive, plus the shared state they play against.
///
/// A scene owns:
///
/// - the buffer cache, so each file is decoded once
/// - the effects facade, cloned into every sound it creates
/// - the listener pose, which drives distance muting
/// - persistent (looping) sounds, in play order
/// - the oneshot pool for transient sounds
/// - named global effects and filters, in registration order
///
/// # Playback routing
///
/// [`play`](Self::play) and [`play_positioned`](Self::play_positioned) send non-looping
/// requests to the oneshot pool and keep looping ones as persistent sounds. Sounds that
/// were not given explicit effects get the global ones automatically: global effect `i`
/// on send `i` for the first four, and only the first global filter.
///
/// # Locking
///
/// All bookkeeping sits behind one mutex. Operations take it first, then a sound's own
/// lock, then the listener's; never the other way round.
pub struct SoundScene {
    desc: SceneDesc,
    backend: Arc<dyn AudioBackend>,
    cache: BufferCache,
    effects: EffectsFacade,
    listener: Listener,
    state: Mutex<SceneState>,
}

impl SoundScene {
    /// Creates a scene over `backend`, decoding files with the symphonia-based loader.
    pub fn with_backend(desc: SceneDesc, backend: Arc<dyn AudioBackend>) -> Self {
        Self::with_backend_and_loader(desc, backend, Arc::new(DefaultAudioLoader))
    }

    pub fn with_backend_and_loader(
        desc: SceneDesc,
        backend: Arc<dyn AudioBackend>,
        loader: Arc<dyn AudioDataLoader>,
    ) -> Self {
        let options = LoadOptions::new().convert_to_mono(desc.convert_to_mono);
        let listener = Listener::default();
        if let Err(e) = backend.set_listener_position(listener.position()) {
            log::warn!("Failed to reset listener: {}", e);
        }

        log::info!(
            "Scene created: {} max oneshots, distance model ({}, {}, {}), mute at {}",
            desc.max_oneshots,
            desc.max_distance,
            desc.reference_distance,
            desc.rolloff_factor,
            desc.mute_distance
        );

        Self {
            cache: BufferCache::new(backend.clone(), loader, options),
            effects: EffectsFacade::new(backend.clone()),
            state: Mutex::new(SceneState {
                sounds: Vec::new(),
                pool: OneshotPool::new(desc.max_oneshots),
                global_effects: Vec::new(),
                global_filters: Vec::new(),
                play_count: 0,
                plays_since_cleanup: 0,
                cleanup_every: desc.cleanup_every,
            }),
            listener,
            backend,
            desc,
        }
    }

    pub fn desc(&self) -> &SceneDesc {
        &self.desc
    }

    pub fn backend(&self) -> &Arc<dyn AudioBackend> {
        &self.backend
    }

    pub fn cache(&self) -> &BufferCache {
        &self.cache
    }

    pub fn effects(&self) -> &EffectsFacade {
        &self.effects
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Plays `path` as a direct (listener-relative) sound.
    ///
    /// Returns `None` when the file is missing or cannot be decoded, or when the
    /// backend refuses a source. Looping sounds are returned as persistent handles that
    /// stay tracked until they finish and get cleaned up, or until
    /// [`destroy`](Self::destroy).
    pub fn play(&self, path: impl AsRef<Path>, options: PlayOptions) -> Option<Sound> {
        self.play_with_mode(path.as_ref(), SpatialMode::Direct, options)
    }

    /// Like [`play`](Self::play) but positions the sound in world space.
    pub fn play_positioned(
        &self,
        path: impl AsRef<Path>,
        position: Vec3,
        options: PlayOptions,
    ) -> Option<Sound> {
        self.play_with_mode(path.as_ref(), SpatialMode::Positioned(position), options)
    }

    /// Plays a transient, non-looping sound through the oneshot pool.
    ///
    /// Finished oneshots are cleaned up first. A full pool evicts its oldest fifth
    /// before admitting the new sound. `position` makes it a positioned sound; without
    /// one it is direct.
    pub fn play_oneshot(
        &self,
        path: impl AsRef<Path>,
        volume: f32,
        pitch: f32,
        position: Option<Vec3>,
    ) -> Option<Sound> {
        let mode = position.map_or(SpatialMode::Direct, SpatialMode::Positioned);
        let config = self.sound_config(volume, pitch, false);
        let mut state = self.state.lock();
        self.spawn_oneshot(&mut state, path.as_ref(), mode, &config, &[], &[])
    }

    fn play_with_mode(&self, path: &Path, mode: SpatialMode, options: PlayOptions) -> Option<Sound> {
        let config = self.sound_config(options.volume, options.pitch, options.looping);
        let mut state = self.state.lock();

        if !options.looping {
            let sound = self.spawn_oneshot(
                &mut state,
                path,
                mode,
                &config,
                &options.effects,
                &options.filters,
            )?;
            state.play_count += 1;
            return Some(sound);
        }

        let sound = self.spawn_persistent(&mut state, path, mode, &config, &options)?;
        state.play_count += 1;
        state.plays_since_cleanup += 1;
        if state.cleanup_every > 0 && state.plays_since_cleanup >= state.cleanup_every {
            log::debug!("Auto cleanup after {} plays", state.plays_since_cleanup);
            state.plays_since_cleanup = 0;
            state.cleanup();
        }
        Some(sound)
    }

    fn spawn_persistent(
        &self,
        state: &mut SceneState,
        path: &Path,
        mode: SpatialMode,
        config: &SoundConfig,
        options: &PlayOptions,
    ) -> Option<Sound> {
        let buffer = self.acquire(path)?;
        let sound = self.create_sound(buffer, mode, config)?;
        if let Err(e) = sound.play() {
            log::warn!("Failed to start {}: {}", path.display(), e);
            sound.destroy();
            return None;
        }

        apply_routing(state, &sound, &options.effects, &options.filters);
        state.sounds.push(sound.clone());
        Some(sound)
    }

    fn spawn_oneshot(
        &self,
        state: &mut SceneState,
        path: &Path,
        mode: SpatialMode,
        config: &SoundConfig,
        effects: &[EffectParams],
        filters: &[FilterParams],
    ) -> Option<Sound> {
        // a bad path must not cost live oneshots their slots
        let buffer = self.acquire(path)?;
        state.pool.cleanup_finished_sounds();
        state.pool.make_room();

        let sound = self.create_sound(buffer, mode, config)?;
        if let Err(e) = sound.play() {
            log::warn!("Failed to start oneshot {}: {}", path.display(), e);
            sound.destroy();
            return None;
        }

        apply_routing(state, &sound, effects, filters);
        state.pool.push(sound.clone());
        Some(sound)
    }

    fn acquire(&self, path: &Path) -> Option<Arc<BufferHandle>> {
        match self.cache.acquire(path) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                log::warn!("Cannot play {}: {}", path.display(), e);
                None
            }
        }
    }

    fn create_sound(
        &self,
        buffer: Arc<BufferHandle>,
        mode: SpatialMode,
        config: &SoundConfig,
    ) -> Option<Sound> {
        let path = buffer.path().to_path_buf();
        let sound = match Sound::create(&self.effects, buffer, mode, config) {
            Ok(sound) => sound,
            Err(e) => {
                log::warn!("Cannot create sound for {}: {}", path.display(), e);
                return None;
            }
        };
        if let Err(e) = sound.attach_listener(self.listener.clone()) {
            log::warn!("{}: listener not attached: {}", sound.id(), e);
        }
        Some(sound)
    }

    fn sound_config(&self, volume: f32, pitch: f32, looping: bool) -> SoundConfig {
        self.desc
            .sound_config()
            .volume(volume)
            .pitch(pitch)
            .looping(looping)
    }

    /// Moves the listener and re-evaluates distance muting for every tracked sound.
    pub fn update_listener(&self, position: Vec3) -> Result<()> {
        self.listener.set_position(position);
        self.backend.set_listener_position(position)?;
        self.refresh_distances();
        Ok(())
    }

    /// Orients the listener by heading and pitch, in degrees.
    pub fn set_listener_orientation(&self, horizontal: f32, vertical: f32) -> Result<()> {
        let rotation = orientation_from_angles(horizontal, vertical);
        let mut pose = self.listener.pose();
        pose.rotation = rotation;
        self.listener.set_pose(pose);
        self.backend.set_listener_orientation(rotation)
    }

    pub fn set_listener_pose(&self, pose: Pose) -> Result<()> {
        self.listener.set_pose(pose);
        self.backend.set_listener_position(pose.position)?;
        self.backend.set_listener_orientation(pose.rotation)?;
        self.refresh_distances();
        Ok(())
    }

    fn refresh_distances(&self) {
        let state = self.state.lock();
        for sound in state.tracked() {
            sound.on_listener_moved();
        }
    }

    /// Registers a named effect that new sounds pick up automatically.
    ///
    /// Reusing a name replaces the previous effect: it is first detached from every
    /// sound routing into it, and the new one takes its place in registration order.
    pub fn create_global_effect(&self, name: &str, params: &EffectParams) -> Result<Effect> {
        let effect = self.effects.build_effect(params)?;
        let mut state = self.state.lock();

        match state.global_effects.iter().position(|(n, _)| n == name) {
            Some(index) => {
                let previous = state.global_effects[index].1.clone();
                state.detach_effect_everywhere(name, &previous);
                state.global_effects[index].1 = effect.clone();
                log::info!("Replaced global effect '{}' ({})", name, effect.kind());
            }
            None => {
                state.global_effects.push((name.to_string(), effect.clone()));
                log::info!("Created global effect '{}' ({})", name, effect.kind());
            }
        }
        Ok(effect)
    }

    /// Builds a global effect from a type name, an optional reverb preset and named
    /// parameters.
    ///
    /// # Errors
    ///
    /// `UnsupportedType` for an unknown type name, `NotFound` for an unknown preset and
    /// `Configuration` for parameters the type does not have.
    pub fn create_global_effect_named(
        &self,
        name: &str,
        effect_type: &str,
        preset: Option<&str>,
        params: &[(&str, f32)],
    ) -> Result<Effect> {
        let params = EffectParams::from_named(effect_type, preset, params)?;
        self.create_global_effect(name, &params)
    }

    /// Registers a named filter. Same replacement rule as global effects.
    pub fn create_global_filter(&self, name: &str, params: &FilterParams) -> Result<Filter> {
        let filter = self.effects.build_filter(params)?;
        let mut state = self.state.lock();

        match state.global_filters.iter().position(|(n, _)| n == name) {
            Some(index) => {
                let previous = state.global_filters[index].1.clone();
                state.detach_filter_everywhere(name, &previous);
                state.global_filters[index].1 = filter.clone();
                log::info!("Replaced global filter '{}' ({})", name, filter.kind());
            }
            None => {
                state.global_filters.push((name.to_string(), filter.clone()));
                log::info!("Created global filter '{}' ({})", name, filter.kind());
            }
        }
        Ok(filter)
    }

    pub fn create_global_filter_named(
        &self,
        name: &str,
        filter_type: &str,
        params: &[(&str, f32)],
    ) -> Result<Filter> {
        let params = FilterParams::from_named(filter_type, params)?;
        self.create_global_filter(name, &params)
    }

    pub fn global_effect(&self, name: &str) -> Option<Effect> {
        let state = self.state.lock();
        state
            .global_effects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, effect)| effect.clone())
    }

    pub fn global_filter(&self, name: &str) -> Option<Filter> {
        let state = self.state.lock();
        state
            .global_filters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, filter)| filter.clone())
    }

    /// Names of the global effects, in registration order.
    pub fn global_effect_names(&self) -> Vec<String> {
        let state = self.state.lock();
        state.global_effects.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn global_filter_names(&self) -> Vec<String> {
        let state = self.state.lock();
        state.global_filters.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Routes send `slot` of `sound` to the global effect `name`.
    pub fn apply_global_effect_to_sound(&self, sound: &Sound, name: &str, slot: usize) -> Result<()> {
        let effect = self
            .global_effect(name)
            .ok_or_else(|| AlSceneError::NotFound(format!("global effect '{}'", name)))?;
        sound.attach_effect(&effect, slot)
    }

    pub fn apply_global_filter_to_sound(&self, sound: &Sound, name: &str) -> Result<()> {
        let filter = self
            .global_filter(name)
            .ok_or_else(|| AlSceneError::NotFound(format!("global filter '{}'", name)))?;
        sound.attach_filter(&filter)
    }

    /// Unregisters a global effect and detaches it from every tracked sound. Returns
    /// whether it existed.
    pub fn remove_global_effect(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state.global_effects.iter().position(|(n, _)| n == name) else {
            return false;
        };
        let (name, effect) = state.global_effects.remove(index);
        state.detach_effect_everywhere(&name, &effect);
        log::info!("Removed global effect '{}'", name);
        true
    }

    pub fn remove_global_filter(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state.global_filters.iter().position(|(n, _)| n == name) else {
            return false;
        };
        let (name, filter) = state.global_filters.remove(index);
        state.detach_filter_everywhere(&name, &filter);
        log::info!("Removed global filter '{}'", name);
        true
    }

    /// Strips effects and filters from every persistent sound and forgets all globals.
    pub fn clear_all_effects(&self) {
        let mut state = self.state.lock();
        for sound in &state.sounds {
            if let Err(e) = sound.remove_all_effects() {
                log::warn!("{}: effects not cleared: {}", sound.id(), e);
            }
            if let Err(e) = sound.remove_all_filters() {
                log::warn!("{}: filters not cleared: {}", sound.id(), e);
            }
        }
        state.global_effects.clear();
        state.global_filters.clear();
        log::info!("Cleared all effects");
    }

    /// Registers `room_acoustics_<preset>` if needed and routes send 0 of every playing
    /// persistent sound to it. Returns how many sounds it was applied to.
    pub fn apply_room_acoustics(&self, preset: ReverbPreset) -> Result<usize> {
        let name = format!("room_acoustics_{}", preset.name());
        let effect = match self.global_effect(&name) {
            Some(effect) => effect,
            None => self.create_global_effect(&name, &EffectParams::Reverb(preset.params()))?,
        };

        let state = self.state.lock();
        let applied = state
            .sounds
            .iter()
            .filter(|sound| sound.is_playing())
            .filter(|sound| match sound.attach_effect(&effect, 0) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Skipping '{}' on {}: {}", name, sound.id(), e);
                    false
                }
            })
            .count();
        Ok(applied)
    }

    /// Registers `env_filter_<preset>` if needed and makes it the direct filter of every
    /// playing persistent sound.
    pub fn apply_environmental_filter(&self, preset: FilterPreset) -> Result<usize> {
        let name = format!("env_filter_{}", preset.name());
        let filter = match self.global_filter(&name) {
            Some(filter) => filter,
            None => self.create_global_filter(&name, &preset.params())?,
        };

        let state = self.state.lock();
        let applied = state
            .sounds
            .iter()
            .filter(|sound| sound.is_playing())
            .filter(|sound| match sound.attach_filter(&filter) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Skipping '{}' on {}: {}", name, sound.id(), e);
                    false
                }
            })
            .count();
        Ok(applied)
    }

    /// Moves a tracked sound. Returns `Ok(false)` when the scene does not track it.
    pub fn update_position(&self, sound: &Sound, position: Vec3) -> Result<bool> {
        let state = self.state.lock();
        if !state.tracks(sound) {
            return Ok(false);
        }
        sound.set_position(position)?;
        Ok(true)
    }

    /// Updates volume and/or pitch of a tracked sound.
    pub fn update_attribs(
        &self,
        sound: &Sound,
        volume: Option<f32>,
        pitch: Option<f32>,
    ) -> Result<bool> {
        let state = self.state.lock();
        if !state.tracks(sound) {
            return Ok(false);
        }
        if let Some(volume) = volume {
            sound.set_volume(volume)?;
        }
        if let Some(pitch) = pitch {
            sound.set_pitch(pitch)?;
        }
        Ok(true)
    }

    /// Pauses every playing sound, oneshots included. Returns how many were paused.
    pub fn pause_all(&self) -> usize {
        let state = self.state.lock();
        state
            .tracked()
            .filter(|sound| matches!(sound.pause(), Ok(true)))
            .count()
    }

    /// Resumes every paused sound. Stopped sounds are left alone.
    pub fn resume_all(&self) -> usize {
        let state = self.state.lock();
        state
            .tracked()
            .filter(|sound| sound.is_paused())
            .filter(|sound| matches!(sound.play(), Ok(true)))
            .count()
    }

    /// Stops and destroys every pooled oneshot. Returns how many were released.
    pub fn stop_all_oneshots(&self) -> usize {
        let count = self.state.lock().pool.stop_all();
        if count > 0 {
            log::debug!("Stopped {} oneshot(s)", count);
        }
        count
    }

    /// Stops tracking `sound` and destroys it. Returns whether it was tracked; the sound
    /// is destroyed either way.
    pub fn destroy(&self, sound: &Sound) -> bool {
        let mut state = self.state.lock();
        let before = state.sounds.len();
        state.sounds.retain(|s| !s.ptr_eq(sound));
        let tracked = state.sounds.len() != before || state.pool.remove(sound).is_some();
        drop(state);

        sound.destroy();
        tracked
    }

    /// Persistent sounds currently tracked, in play order.
    pub fn sounds(&self) -> Vec<Sound> {
        self.state.lock().sounds.clone()
    }

    pub fn active_oneshots(&self) -> usize {
        self.state.lock().pool.len()
    }

    /// Destroys every tracked sound that is neither playing nor paused.
    pub fn cleanup(&self) -> CleanupReport {
        self.state.lock().cleanup()
    }

    /// Runs [`cleanup`](Self::cleanup) after every `plays` successful looping `play`
    /// calls, counted from the last automatic cleanup; 0 disables it.
    pub fn cleanup_every(&self, plays: usize) {
        self.state.lock().cleanup_every = plays;
    }

    /// Resizes the oneshot pool, clamped to at least 10, evicting as needed.
    pub fn set_max_oneshots(&self, max_oneshots: usize) {
        self.state.lock().pool.set_max_oneshots(max_oneshots);
    }

    pub fn max_oneshots(&self) -> usize {
        self.state.lock().pool.max_oneshots()
    }

    /// Destroys every persistent sound and every oneshot. Safe to call repeatedly.
    pub fn destroy_all(&self) {
        let mut state = self.state.lock();
        let sounds: Vec<Sound> = state.sounds.drain(..).collect();
        let count = sounds.len();
        for sound in sounds {
            sound.destroy();
        }
        let oneshots = state.pool.stop_all();

        if count + oneshots > 0 {
            log::info!("Destroyed {} sound(s) and {} oneshot(s)", count, oneshots);
        }
    }

    pub fn stats(&self) -> SceneStats {
        let state = self.state.lock();
        SceneStats {
            sounds: state.sounds.len(),
            playing_sounds: state.sounds.iter().filter(|s| s.is_playing()).count(),
            oneshots: state.pool.stats(),
            global_effects: state.global_effects.len(),
            global_filters: state.global_filters.len(),
            cached_buffers: self.cache.len(),
            play_count: state.play_count,
        }
    }

    pub fn available_effects(&self) -> &'static [EffectKind] {
        &EffectKind::ALL
    }

    pub fn available_filters(&self) -> &'static [FilterKind] {
        &FilterKind::ALL
    }

    pub fn reverb_presets(&self) -> &'static [ReverbPreset] {
        &ReverbPreset::ALL
    }

    pub fn filter_presets(&self) -> &'static [FilterPreset] {
        &FilterPreset::ALL
    }
}

impl Drop for SoundScene {
    fn drop(&mut self) {
        self.destroy_all();
        let state = self.state.get_mut();
        state.global_effects.clear();
        state.global_filters.clear();
        self.cache.clear();
    }
}

/// Explicit effects and filters when given, otherwise the global auto-apply rule.
/// Failures are logged and skipped.
fn apply_routing(
    state: &SceneState,
    sound: &Sound,
    effects: &[EffectParams],
    filters: &[FilterParams],
) {
    if effects.is_empty() {
        for (slot, (name, effect)) in state.global_effects.iter().take(MAX_SENDS).enumerate() {
            if let Err(e) = sound.attach_effect(effect, slot) {
                log::warn!("Skipping global effect '{}' on {}: {}", name, sound.id(), e);
            }
        }
    } else {
        for (slot, params) in effects.iter().enumerate() {
            if let Err(e) = sound.add_effect(params, slot) {
                log::warn!("Skipping {} effect on {}: {}", params.kind(), sound.id(), e);
            }
        }
    }

    if filters.is_empty() {
        if let Some((name, filter)) = state.global_filters.first() {
            if let Err(e) = sound.attach_filter(filter) {
                log::warn!("Skipping global filter '{}' on {}: {}", name, sound.id(), e);
            }
        }
    } else {
        for params in filters {
            if let Err(e) = sound.add_filter(params) {
                log::warn!("Skipping {} filter on {}: {}", params.kind(), sound.id(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use crate::sound::SoundState;
    use crate::test_support::write_tone;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        backend: Arc<SoftwareBackend>,
        scene: SoundScene,
    }

    impl Fixture {
        fn new(desc: SceneDesc) -> Self {
            Self::with_backend(desc, SoftwareBackend::new(48000))
        }

        fn with_backend(desc: SceneDesc, backend: SoftwareBackend) -> Self {
            let dir = tempfile::tempdir().unwrap();
            write_tone(&dir.path().join("short.wav"), 480);
            write_tone(&dir.path().join("ambience.wav"), 4800);
            let backend = Arc::new(backend);
            let scene = SoundScene::with_backend(desc, backend.clone());
            Self {
                dir,
                backend,
                scene,
            }
        }

        fn path(&self, name: &str) -> std::path::PathBuf {
            self.dir.path().join(name)
        }

        fn render(&self) {
            let mut out = vec![0.0; 4800 * 2];
            self.backend.render(&mut out, 2);
        }
    }

    #[test]
    fn test_play_routes_by_looping() {
        let fx = Fixture::new(SceneDesc::default());
        let once = fx.scene.play(fx.path("short.wav"), PlayOptions::new()).unwrap();
        let looped = fx
            .scene
            .play(fx.path("ambience.wav"), PlayOptions::looped())
            .unwrap();

        assert_eq!(fx.scene.active_oneshots(), 1);
        assert_eq!(fx.scene.sounds(), vec![looped.clone()]);
        assert!(once.is_playing());
        assert!(looped.is_playing());
        assert!(looped.is_looping());
        assert_eq!(fx.scene.stats().play_count, 2);
    }

    #[test]
    fn test_missing_file_returns_none() {
        let fx = Fixture::new(SceneDesc::default());
        assert!(fx.scene.play(fx.path("nope.wav"), PlayOptions::looped()).is_none());
        assert!(fx.scene.play_oneshot(fx.path("nope.wav"), 1.0, 1.0, None).is_none());
        assert_eq!(fx.backend.source_count(), 0);
        assert_eq!(fx.scene.stats().total_sounds(), 0);
    }

    #[test]
    fn test_missing_file_leaves_full_pool_alone() {
        let fx = Fixture::new(SceneDesc::default().max_oneshots(10));
        let live: Vec<Sound> = (0..10)
            .map(|_| fx.scene.play(fx.path("short.wav"), PlayOptions::new()).unwrap())
            .collect();

        assert!(fx.scene.play(fx.path("typo.wav"), PlayOptions::new()).is_none());
        assert!(fx.scene.play_oneshot(fx.path("typo.wav"), 1.0, 1.0, None).is_none());

        let stats = fx.scene.stats().oneshots;
        assert_eq!(stats.active, 10);
        assert_eq!(stats.evictions, 0);
        assert!(live.iter().all(|s| s.is_playing()));
        assert_eq!(fx.backend.source_count(), 10);
    }

    #[test]
    fn test_scene_distance_defaults_reach_sounds() {
        let fx = Fixture::new(SceneDesc::default());
        let sound = fx
            .scene
            .play_positioned(fx.path("ambience.wav"), Vec3::new(1.0, 0.0, 0.0), PlayOptions::looped())
            .unwrap();

        assert_eq!(sound.max_distance(), 15.0);
        assert_eq!(sound.reference_distance(), 3.0);
        assert_eq!(sound.rolloff_factor(), 1.0);
        assert_eq!(sound.mute_distance(), 20.0);
        let info = fx.backend.source_info(sound.source_id().unwrap()).unwrap();
        assert_eq!(info.max_distance, 15.0);
        assert_eq!(info.position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_globals_auto_apply_in_registration_order() {
        let fx = Fixture::new(SceneDesc::default());
        let names = ["a", "b", "c", "d", "e"];
        let globals: Vec<Effect> = names
            .iter()
            .map(|name| {
                fx.scene
                    .create_global_effect(name, &EffectParams::defaults(EffectKind::Echo))
                    .unwrap()
            })
            .collect();
        let first_filter = fx
            .scene
            .create_global_filter("muffle", &FilterPreset::Muffled.params())
            .unwrap();
        fx.scene
            .create_global_filter("thin", &FilterPreset::Thin.params())
            .unwrap();

        let sound = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        assert_eq!(sound.effect_count(), 4);
        for slot in 0..4 {
            assert_eq!(sound.effect_at(slot), Some(globals[slot].clone()));
        }
        assert_eq!(sound.filter(), Some(first_filter));
        assert_eq!(fx.scene.global_effect_names(), names);
    }

    #[test]
    fn test_explicit_effects_replace_auto_apply() {
        let fx = Fixture::new(SceneDesc::default());
        fx.scene
            .create_global_effect("cave", &ReverbPreset::Cave.params().into())
            .unwrap();

        let options = PlayOptions::looped()
            .effect(EffectParams::defaults(EffectKind::Chorus))
            .effect(EffectParams::defaults(EffectKind::Flanger))
            .filter(FilterParams::highpass(1.0, 0.2));
        let sound = fx.scene.play(fx.path("ambience.wav"), options).unwrap();

        assert_eq!(sound.effect_count(), 2);
        assert_eq!(sound.effect_at(0).unwrap().kind(), EffectKind::Chorus);
        assert_eq!(sound.effect_at(1).unwrap().kind(), EffectKind::Flanger);
        assert_eq!(sound.filter().unwrap().kind(), FilterKind::Highpass);
    }

    #[test]
    fn test_effect_failure_is_skipped() {
        let backend = SoftwareBackend::with_limits(48000, 16, 1);
        let fx = Fixture::with_backend(SceneDesc::default(), backend);
        let options = PlayOptions::looped()
            .effect(EffectParams::defaults(EffectKind::Echo))
            .effect(EffectParams::defaults(EffectKind::Chorus));

        let sound = fx.scene.play(fx.path("ambience.wav"), options).unwrap();
        assert!(sound.is_playing());
        assert_eq!(sound.effect_count(), 1);
        assert_eq!(fx.backend.effect_count(), 1);
    }

    #[test]
    fn test_global_overwrite_detaches_previous() {
        let fx = Fixture::new(SceneDesc::default());
        let old = fx
            .scene
            .create_global_effect("verb", &ReverbPreset::Room.params().into())
            .unwrap();
        let sound = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        assert_eq!(sound.effect_at(0), Some(old.clone()));

        let new = fx
            .scene
            .create_global_effect("verb", &ReverbPreset::Hall.params().into())
            .unwrap();
        assert_eq!(sound.effect_count(), 0);
        assert_eq!(old.owner_count(), 1);
        assert_eq!(fx.scene.global_effect("verb"), Some(new));
        assert_eq!(fx.scene.global_effect_names(), vec!["verb".to_string()]);

        drop(old);
        assert_eq!(fx.backend.effect_count(), 1);
    }

    #[test]
    fn test_apply_unknown_global_is_not_found() {
        let fx = Fixture::new(SceneDesc::default());
        let sound = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        assert!(matches!(
            fx.scene.apply_global_effect_to_sound(&sound, "nope", 0),
            Err(AlSceneError::NotFound(_))
        ));
        assert!(matches!(
            fx.scene.apply_global_filter_to_sound(&sound, "nope"),
            Err(AlSceneError::NotFound(_))
        ));
    }

    #[test]
    fn test_named_global_effect_errors() {
        let fx = Fixture::new(SceneDesc::default());
        assert!(matches!(
            fx.scene.create_global_effect_named("x", "wobble", None, &[]),
            Err(AlSceneError::UnsupportedType(_))
        ));
        assert!(matches!(
            fx.scene.create_global_filter_named("x", "notch", &[]),
            Err(AlSceneError::UnsupportedType(_))
        ));
        let cave = fx
            .scene
            .create_global_effect_named("cave", "reverb", Some("cave"), &[])
            .unwrap();
        assert_eq!(cave.kind(), EffectKind::Reverb);
        assert_eq!(fx.backend.effect_count(), 1);
    }

    #[test]
    fn test_remove_global_detaches() {
        let fx = Fixture::new(SceneDesc::default());
        fx.scene
            .create_global_filter("radio", &FilterPreset::Radio.params())
            .unwrap();
        let sound = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        assert!(sound.has_filter());

        assert!(fx.scene.remove_global_filter("radio"));
        assert!(!fx.scene.remove_global_filter("radio"));
        assert!(!sound.has_filter());
        assert_eq!(fx.backend.filter_count(), 0);
    }

    #[test]
    fn test_room_acoustics_and_environment() {
        let fx = Fixture::new(SceneDesc::default());
        let playing = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        let paused = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        paused.pause().unwrap();

        assert_eq!(fx.scene.apply_room_acoustics(ReverbPreset::Cathedral).unwrap(), 1);
        assert!(fx.scene.global_effect("room_acoustics_cathedral").is_some());
        assert_eq!(playing.effect_count(), 1);
        assert_eq!(paused.effect_count(), 0);

        assert_eq!(fx.scene.apply_environmental_filter(FilterPreset::Underwater).unwrap(), 1);
        assert!(fx.scene.global_filter("env_filter_underwater").is_some());
        assert!(playing.has_filter());

        // applying again reuses the registered instances
        fx.scene.apply_room_acoustics(ReverbPreset::Cathedral).unwrap();
        assert_eq!(fx.backend.effect_count(), 1);
    }

    #[test]
    fn test_clear_all_effects() {
        let fx = Fixture::new(SceneDesc::default());
        fx.scene
            .create_global_effect("cave", &ReverbPreset::Cave.params().into())
            .unwrap();
        let sound = fx
            .scene
            .play(
                fx.path("ambience.wav"),
                PlayOptions::looped().filter(FilterParams::lowpass(0.5, 0.5)),
            )
            .unwrap();
        assert_eq!(sound.effect_count(), 1);

        fx.scene.clear_all_effects();
        assert_eq!(sound.effect_count(), 0);
        assert!(!sound.has_filter());
        assert!(fx.scene.global_effect_names().is_empty());
        assert_eq!(fx.backend.effect_count(), 0);
        assert_eq!(fx.backend.filter_count(), 0);
    }

    #[test]
    fn test_update_position_and_attribs_require_tracking() {
        let fx = Fixture::new(SceneDesc::default());
        let tracked = fx
            .scene
            .play_positioned(fx.path("ambience.wav"), Vec3::ZERO, PlayOptions::looped())
            .unwrap();

        assert!(fx.scene.update_position(&tracked, Vec3::new(2.0, 0.0, 0.0)).unwrap());
        assert_eq!(tracked.position(), Vec3::new(2.0, 0.0, 0.0));
        assert!(fx.scene.update_attribs(&tracked, Some(0.5), Some(1.5)).unwrap());
        assert_eq!(tracked.original_volume(), 0.5);
        assert_eq!(tracked.pitch(), 1.5);

        let buffer = fx.scene.cache().acquire(fx.path("short.wav")).unwrap();
        let stray = Sound::create(
            fx.scene.effects(),
            buffer,
            SpatialMode::Positioned(Vec3::ZERO),
            &SoundConfig::default(),
        )
        .unwrap();
        assert!(!fx.scene.update_position(&stray, Vec3::ONE).unwrap());
        assert!(!fx.scene.update_attribs(&stray, Some(0.1), None).unwrap());
        assert_eq!(stray.position(), Vec3::ZERO);

        let direct = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        assert!(matches!(
            fx.scene.update_position(&direct, Vec3::ONE),
            Err(AlSceneError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_pause_and_resume_all() {
        let fx = Fixture::new(SceneDesc::default());
        let a = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        let b = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        let shot = fx.scene.play_oneshot(fx.path("short.wav"), 1.0, 1.0, None).unwrap();
        b.stop().unwrap();

        assert_eq!(fx.scene.pause_all(), 2);
        assert!(a.is_paused());
        assert!(shot.is_paused());

        assert_eq!(fx.scene.resume_all(), 2);
        assert!(a.is_playing());
        assert_eq!(b.state(), SoundState::Stopped);
    }

    #[test]
    fn test_cleanup_destroys_finished() {
        let fx = Fixture::new(SceneDesc::default());
        let a = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        let b = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        let c = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        b.pause().unwrap();
        c.stop().unwrap();
        fx.scene.play_oneshot(fx.path("short.wav"), 1.0, 1.0, None).unwrap();
        fx.render();

        let report = fx.scene.cleanup();
        assert_eq!(report, CleanupReport { sounds: 1, oneshots: 1 });
        assert!(c.is_destroyed());
        assert_eq!(fx.scene.sounds(), vec![a, b]);
        assert_eq!(fx.backend.source_count(), 2);
    }

    #[test]
    fn test_auto_cleanup_every_n_plays() {
        let fx = Fixture::new(SceneDesc::default().cleanup_every(3));
        let first = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        first.stop().unwrap();
        fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        assert!(!first.is_destroyed());

        fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        assert!(first.is_destroyed());
        assert_eq!(fx.scene.sounds().len(), 2);

        fx.scene.cleanup_every(0);
        let second = fx.scene.sounds()[0].clone();
        second.stop().unwrap();
        for _ in 0..5 {
            fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        }
        assert!(!second.is_destroyed());
    }

    #[test]
    fn test_auto_cleanup_counts_from_last_cleanup() {
        let fx = Fixture::new(SceneDesc::default().cleanup_every(3));
        for _ in 0..4 {
            fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        }
        fx.scene.cleanup_every(5);
        let first = fx.scene.sounds()[0].clone();
        first.stop().unwrap();

        fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        assert!(!first.is_destroyed());

        // non-looping plays go to the pool and do not count
        for _ in 0..5 {
            fx.scene.play(fx.path("short.wav"), PlayOptions::new()).unwrap();
        }
        assert!(!first.is_destroyed());

        for _ in 0..2 {
            fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        }
        assert!(!first.is_destroyed());
        fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        assert!(first.is_destroyed());
        assert_eq!(fx.scene.stats().play_count, 13);
    }

    #[test]
    fn test_stop_all_oneshots_releases_them() {
        let fx = Fixture::new(SceneDesc::default());
        let looped = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        let shots: Vec<Sound> = (0..3)
            .map(|_| fx.scene.play_oneshot(fx.path("short.wav"), 1.0, 1.0, None).unwrap())
            .collect();

        assert_eq!(fx.scene.stop_all_oneshots(), 3);
        assert_eq!(fx.scene.active_oneshots(), 0);
        assert!(shots.iter().all(|s| s.is_destroyed()));
        assert!(looped.is_playing());
        assert_eq!(fx.backend.source_count(), 1);
        assert_eq!(fx.scene.stop_all_oneshots(), 0);
    }

    #[test]
    fn test_destroy_untracks() {
        let fx = Fixture::new(SceneDesc::default());
        let sound = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        let shot = fx.scene.play_oneshot(fx.path("short.wav"), 1.0, 1.0, None).unwrap();

        assert!(fx.scene.destroy(&sound));
        assert!(!fx.scene.destroy(&sound));
        assert!(fx.scene.destroy(&shot));
        assert!(sound.is_destroyed());
        assert_eq!(fx.scene.stats().total_sounds(), 0);
        assert_eq!(fx.backend.source_count(), 0);
    }

    #[test]
    fn test_destroy_all_is_idempotent() {
        let fx = Fixture::new(SceneDesc::default());
        let sound = fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        fx.scene.play_oneshot(fx.path("short.wav"), 1.0, 1.0, None).unwrap();

        fx.scene.destroy_all();
        fx.scene.destroy_all();
        assert!(sound.is_destroyed());
        assert_eq!(fx.backend.source_count(), 0);
        // buffers survive until the cache is cleared
        assert_eq!(fx.backend.buffer_count(), 2);

        // the scene stays usable
        assert!(fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).is_some());
    }

    #[test]
    fn test_drop_releases_everything() {
        let fx = Fixture::new(SceneDesc::default());
        fx.scene
            .create_global_effect("cave", &ReverbPreset::Cave.params().into())
            .unwrap();
        fx.scene.play(fx.path("ambience.wav"), PlayOptions::looped()).unwrap();
        let backend = fx.backend.clone();

        drop(fx);
        assert_eq!(backend.source_count(), 0);
        assert_eq!(backend.effect_count(), 0);
        assert_eq!(backend.slot_count(), 0);
        assert_eq!(backend.buffer_count(), 0);
    }

    #[test]
    fn test_listener_orientation_reaches_backend() {
        let fx = Fixture::new(SceneDesc::default());
        fx.scene.set_listener_orientation(90.0, 0.0).unwrap();
        let forward = fx.scene.listener().pose().forward();
        assert!((forward - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);

        fx.scene
            .set_listener_pose(Pose::from_position(Vec3::new(3.0, 0.0, 0.0)))
            .unwrap();
        assert_eq!(fx.backend.listener_position(), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_lookups() {
        let fx = Fixture::new(SceneDesc::default());
        assert_eq!(fx.scene.available_effects().len(), 9);
        assert_eq!(fx.scene.available_filters().len(), 3);
        assert_eq!(fx.scene.reverb_presets().len(), 11);
        assert_eq!(fx.scene.filter_presets().len(), 6);
    }
}
