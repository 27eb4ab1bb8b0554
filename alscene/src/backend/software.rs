//! In-process implementation of [`AudioBackend`].
//!
//! All native state lives behind one mutex. Control calls lock it; the audio callback
//! only ever `try_lock`s it from [`SoftwareBackend::render`] and renders silence for a
//! block when the lock is contended.
//!
//! The mixer covers the dry path: source gain and pitch, inverse-distance-clamped
//! attenuation, equal-power stereo panning for mono buffers, and the broadband gain of
//! the direct filter. Effect sends are tracked and validated but not rendered.

use crate::audio_data::AudioData;
use crate::backend::{
    AudioBackend, BufferId, EffectId, FilterId, MAX_SENDS, SlotId, SourceId, SourceParam,
    SourceState,
};
use crate::effects::{EffectKind, EffectParams, FilterKind, FilterParams, ParamValue};
use crate::error::{AlSceneError, Result};
use crate::math::{Quat, Vec3};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Snapshot of one source's native attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub state: SourceState,
    pub buffer: Option<BufferId>,
    pub gain: f32,
    pub pitch: f32,
    pub position: Vec3,
    pub relative: bool,
    pub direct_channels: bool,
    pub looping: bool,
    pub max_distance: f32,
    pub reference_distance: f32,
    pub rolloff_factor: f32,
    pub direct_filter: Option<FilterId>,
    pub sends: [Option<SlotId>; MAX_SENDS],
    /// Playback cursor in frames.
    pub cursor: usize,
}

#[derive(Debug, Clone, Copy)]
struct ListenerState {
    position: Vec3,
    rotation: Quat,
    gain: f32,
}

#[derive(Debug)]
struct NativeSource {
    state: SourceState,
    buffer: Option<BufferId>,
    gain: f32,
    pitch: f32,
    position: Vec3,
    relative: bool,
    direct_channels: bool,
    looping: bool,
    max_distance: f32,
    reference_distance: f32,
    rolloff_factor: f32,
    direct_filter: Option<FilterId>,
    sends: [Option<SlotId>; MAX_SENDS],
    cursor: f64,
}

impl Default for NativeSource {
    // OpenAL source defaults
    fn default() -> Self {
        Self {
            state: SourceState::Initial,
            buffer: None,
            gain: 1.0,
            pitch: 1.0,
            position: Vec3::ZERO,
            relative: false,
            direct_channels: false,
            looping: false,
            max_distance: f32::MAX,
            reference_distance: 1.0,
            rolloff_factor: 1.0,
            direct_filter: None,
            sends: [None; MAX_SENDS],
            cursor: 0.0,
        }
    }
}

impl NativeSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            state: self.state,
            buffer: self.buffer,
            gain: self.gain,
            pitch: self.pitch,
            position: self.position,
            relative: self.relative,
            direct_channels: self.direct_channels,
            looping: self.looping,
            max_distance: self.max_distance,
            reference_distance: self.reference_distance,
            rolloff_factor: self.rolloff_factor,
            direct_filter: self.direct_filter,
            sends: self.sends,
            cursor: self.cursor as usize,
        }
    }

    fn halt(&mut self) {
        self.state = SourceState::Stopped;
        self.cursor = 0.0;
    }
}

/// Parameter storage for effects and filters, seeded with the type's defaults.
#[derive(Debug)]
struct NativeParams {
    names: &'static [&'static str],
    values: HashMap<&'static str, ParamValue>,
}

impl NativeParams {
    fn new(names: &'static [&'static str], defaults: Vec<(&'static str, ParamValue)>) -> Self {
        Self {
            names,
            values: defaults.into_iter().collect(),
        }
    }

    fn set(&mut self, owner: &str, name: &str, value: ParamValue) -> Result<()> {
        let key = self
            .names
            .iter()
            .copied()
            .find(|n| *n == name)
            .ok_or_else(|| {
                AlSceneError::Backend(format!("parameter '{}' is not valid for {}", name, owner))
            })?;

        // keep the native type of the parameter
        let stored = match self.values.get(key) {
            Some(ParamValue::Int(_)) => ParamValue::Int(value.as_f32().round() as i32),
            _ => ParamValue::Float(value.as_f32()),
        };
        self.values.insert(key, stored);
        Ok(())
    }

    fn get(&self, owner: &str, name: &str) -> Result<ParamValue> {
        self.values.get(name).copied().ok_or_else(|| {
            AlSceneError::Backend(format!("parameter '{}' is not valid for {}", name, owner))
        })
    }
}

#[derive(Debug)]
struct NativeEffect {
    kind: EffectKind,
    params: NativeParams,
}

#[derive(Debug)]
struct NativeFilter {
    kind: FilterKind,
    params: NativeParams,
}

impl NativeFilter {
    fn gain(&self) -> f32 {
        self.params
            .values
            .get("gain")
            .map_or(1.0, |value| value.as_f32())
    }
}

#[derive(Debug)]
struct NativeSlot {
    effect: Option<EffectId>,
    gain: f32,
}

#[derive(Debug)]
struct BackendState {
    next_id: u64,
    listener: ListenerState,
    buffers: HashMap<BufferId, Option<AudioData>>,
    sources: HashMap<SourceId, NativeSource>,
    effects: HashMap<EffectId, NativeEffect>,
    filters: HashMap<FilterId, NativeFilter>,
    slots: HashMap<SlotId, NativeSlot>,
}

impl BackendState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn source(&mut self, id: SourceId) -> Result<&mut NativeSource> {
        self.sources
            .get_mut(&id)
            .ok_or_else(|| AlSceneError::Backend(format!("invalid {}", id)))
    }
}

/// Software mixer implementing the full backend capability set.
pub struct SoftwareBackend {
    sample_rate: u32,
    max_sources: usize,
    max_slots: usize,
    state: Mutex<BackendState>,
}

impl SoftwareBackend {
    pub const DEFAULT_MAX_SOURCES: usize = 256;
    pub const DEFAULT_MAX_SLOTS: usize = 64;

    pub fn new(sample_rate: u32) -> Self {
        Self::with_limits(
            sample_rate,
            Self::DEFAULT_MAX_SOURCES,
            Self::DEFAULT_MAX_SLOTS,
        )
    }

    pub fn with_limits(sample_rate: u32, max_sources: usize, max_slots: usize) -> Self {
        Self {
            sample_rate,
            max_sources,
            max_slots,
            state: Mutex::new(BackendState {
                next_id: 0,
                listener: ListenerState {
                    position: Vec3::ZERO,
                    rotation: Quat::IDENTITY,
                    gain: 1.0,
                },
                buffers: HashMap::new(),
                sources: HashMap::new(),
                effects: HashMap::new(),
                filters: HashMap::new(),
                slots: HashMap::new(),
            }),
        }
    }

    /// Mixes every playing source into `out` (interleaved, `channels` wide) and
    /// advances their cursors. Returns the number of frames rendered, or 0 when the
    /// state lock was contended and the block was left silent.
    ///
    /// Non-looping sources that reach the end of their buffer become `Stopped`.
    pub fn render(&self, out: &mut [f32], channels: u16) -> usize {
        out.fill(0.0);

        let Some(mut guard) = self.state.try_lock() else {
            return 0;
        };

        let channels = channels.max(1) as usize;
        let frames = out.len() / channels;
        let state = &mut *guard;
        let listener = state.listener;

        for source in state.sources.values_mut() {
            if source.state != SourceState::Playing {
                continue;
            }

            let Some(data) = source
                .buffer
                .and_then(|id| state.buffers.get(&id))
                .and_then(Option::as_ref)
            else {
                source.halt();
                continue;
            };

            let total = data.total_frames();
            if total == 0 {
                source.halt();
                continue;
            }

            let filter_gain = source
                .direct_filter
                .and_then(|id| state.filters.get(&id))
                .map_or(1.0, NativeFilter::gain);
            let mono = data.channels() == 1;
            let (left, right) = if mono {
                let distance_gain = attenuation(source, &listener);
                let (l, r) = pan(source, &listener);
                (l * distance_gain, r * distance_gain)
            } else {
                (1.0, 1.0)
            };
            let gain = source.gain * listener.gain * filter_gain;
            let step = source.pitch as f64;

            for frame in out.chunks_exact_mut(channels).take(frames) {
                if source.cursor >= total as f64 {
                    if source.looping {
                        source.cursor %= total as f64;
                    } else {
                        break;
                    }
                }

                let index = source.cursor as usize;
                let (l, r) = if mono {
                    let s = data.sample(index, 0);
                    (s * left, s * right)
                } else {
                    (data.sample(index, 0), data.sample(index, 1))
                };

                if channels == 1 {
                    frame[0] += (l + r) * 0.5 * gain;
                } else {
                    frame[0] += l * gain;
                    frame[1] += r * gain;
                }

                source.cursor += step;
            }

            if source.cursor >= total as f64 && !source.looping {
                source.halt();
            }
        }

        frames
    }

    pub fn max_sources(&self) -> usize {
        self.max_sources
    }

    pub fn source_info(&self, source: SourceId) -> Option<SourceInfo> {
        self.state.lock().sources.get(&source).map(NativeSource::info)
    }

    pub fn source_count(&self) -> usize {
        self.state.lock().sources.len()
    }

    pub fn buffer_count(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Frames stored in `buffer` at the backend rate.
    pub fn buffer_frames(&self, buffer: BufferId) -> Option<usize> {
        self.state
            .lock()
            .buffers
            .get(&buffer)
            .map(|data| data.as_ref().map_or(0, AudioData::total_frames))
    }

    pub fn effect_count(&self) -> usize {
        self.state.lock().effects.len()
    }

    pub fn filter_count(&self) -> usize {
        self.state.lock().filters.len()
    }

    pub fn slot_count(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn slot_effect(&self, slot: SlotId) -> Option<EffectId> {
        self.state.lock().slots.get(&slot).and_then(|s| s.effect)
    }

    pub fn slot_gain(&self, slot: SlotId) -> Option<f32> {
        self.state.lock().slots.get(&slot).map(|s| s.gain)
    }

    pub fn listener_position(&self) -> Vec3 {
        self.state.lock().listener.position
    }
}

/// Inverse distance clamped model.
fn attenuation(source: &NativeSource, listener: &ListenerState) -> f32 {
    let distance = if source.relative {
        source.position.length()
    } else {
        source.position.distance(listener.position)
    };

    let reference = source.reference_distance;
    if reference <= 0.0 {
        return 1.0;
    }
    let clamped = distance.clamp(reference, source.max_distance.max(reference));
    reference / (reference + source.rolloff_factor * (clamped - reference))
}

/// Equal-power pan from the source direction in listener space.
fn pan(source: &NativeSource, listener: &ListenerState) -> (f32, f32) {
    let local = if source.relative {
        source.position
    } else {
        listener.rotation.inverse() * (source.position - listener.position)
    };

    let length = local.length();
    let pan = if source.direct_channels || length < 1e-6 {
        0.0
    } else {
        (local.x / length).clamp(-1.0, 1.0)
    };
    (((1.0 - pan) * 0.5).sqrt(), ((1.0 + pan) * 0.5).sqrt())
}

impl AudioBackend for SoftwareBackend {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn set_listener_position(&self, position: Vec3) -> Result<()> {
        self.state.lock().listener.position = position;
        Ok(())
    }

    fn set_listener_orientation(&self, rotation: Quat) -> Result<()> {
        self.state.lock().listener.rotation = rotation.normalize();
        Ok(())
    }

    fn set_listener_gain(&self, gain: f32) -> Result<()> {
        self.state.lock().listener.gain = gain.max(0.0);
        Ok(())
    }

    fn create_buffer(&self) -> Result<BufferId> {
        let mut state = self.state.lock();
        let id = BufferId(state.next_id());
        state.buffers.insert(id, None);
        Ok(id)
    }

    fn set_buffer_data(&self, buffer: BufferId, data: &AudioData) -> Result<()> {
        // convert outside the lock; this can take a while for long files
        let data = data.resample(self.sample_rate)?;

        let mut state = self.state.lock();
        let slot = state
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| AlSceneError::Backend(format!("invalid {}", buffer)))?;
        *slot = Some(data);
        Ok(())
    }

    fn delete_buffer(&self, buffer: BufferId) -> Result<()> {
        let mut state = self.state.lock();
        if state.buffers.remove(&buffer).is_none() {
            return Err(AlSceneError::Backend(format!("invalid {}", buffer)));
        }

        for source in state.sources.values_mut() {
            if source.buffer == Some(buffer) {
                source.buffer = None;
                source.halt();
            }
        }
        Ok(())
    }

    fn create_source(&self) -> Result<SourceId> {
        let mut state = self.state.lock();
        if state.sources.len() >= self.max_sources {
            return Err(AlSceneError::ResourceExhausted(format!(
                "all {} sources in use",
                self.max_sources
            )));
        }
        let id = SourceId(state.next_id());
        state.sources.insert(id, NativeSource::default());
        Ok(id)
    }

    fn delete_source(&self, source: SourceId) -> Result<()> {
        self.state
            .lock()
            .sources
            .remove(&source)
            .map(|_| ())
            .ok_or_else(|| AlSceneError::Backend(format!("invalid {}", source)))
    }

    fn bind_buffer(&self, source: SourceId, buffer: Option<BufferId>) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(buffer) = buffer {
            if !state.buffers.contains_key(&buffer) {
                return Err(AlSceneError::Backend(format!("invalid {}", buffer)));
            }
        }
        let native = state.source(source)?;
        native.buffer = buffer;
        native.halt();
        native.state = SourceState::Initial;
        Ok(())
    }

    fn play_source(&self, source: SourceId) -> Result<()> {
        let mut state = self.state.lock();
        let native = state.source(source)?;
        match native.state {
            SourceState::Paused => {}
            _ => native.cursor = 0.0,
        }
        native.state = SourceState::Playing;
        Ok(())
    }

    fn pause_source(&self, source: SourceId) -> Result<()> {
        let mut state = self.state.lock();
        let native = state.source(source)?;
        if native.state == SourceState::Playing {
            native.state = SourceState::Paused;
        }
        Ok(())
    }

    fn stop_source(&self, source: SourceId) -> Result<()> {
        let mut state = self.state.lock();
        let native = state.source(source)?;
        if native.state != SourceState::Initial {
            native.halt();
        }
        Ok(())
    }

    fn source_state(&self, source: SourceId) -> Result<SourceState> {
        let mut state = self.state.lock();
        Ok(state.source(source)?.state)
    }

    fn set_source_param(&self, source: SourceId, param: SourceParam) -> Result<()> {
        if let SourceParam::Pitch(v) = param {
            // a stalled cursor would never reach the end of a non-looping buffer
            if !(v > 0.0 && v.is_finite()) {
                return Err(AlSceneError::Backend(format!("pitch {} must be positive", v)));
            }
        }

        let mut state = self.state.lock();
        let native = state.source(source)?;
        match param {
            SourceParam::Gain(v) => native.gain = v.max(0.0),
            SourceParam::Pitch(v) => native.pitch = v,
            SourceParam::Position(v) => native.position = v,
            SourceParam::Relative(v) => native.relative = v,
            SourceParam::DirectChannels(v) => native.direct_channels = v,
            SourceParam::Looping(v) => native.looping = v,
            SourceParam::MaxDistance(v) => native.max_distance = v.max(0.0),
            SourceParam::ReferenceDistance(v) => native.reference_distance = v.max(0.0),
            SourceParam::RolloffFactor(v) => native.rolloff_factor = v.max(0.0),
        }
        Ok(())
    }

    fn set_source_direct_filter(&self, source: SourceId, filter: Option<FilterId>) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(filter) = filter {
            if !state.filters.contains_key(&filter) {
                return Err(AlSceneError::Backend(format!("invalid {}", filter)));
            }
        }
        state.source(source)?.direct_filter = filter;
        Ok(())
    }

    fn set_source_send(
        &self,
        source: SourceId,
        index: usize,
        slot: Option<SlotId>,
    ) -> Result<()> {
        if index >= MAX_SENDS {
            return Err(AlSceneError::Backend(format!(
                "send index {} out of range (0-{})",
                index,
                MAX_SENDS - 1
            )));
        }

        let mut state = self.state.lock();
        if let Some(slot) = slot {
            if !state.slots.contains_key(&slot) {
                return Err(AlSceneError::Backend(format!("invalid {}", slot)));
            }
        }
        state.source(source)?.sends[index] = slot;
        Ok(())
    }

    fn create_effect(&self, kind: EffectKind) -> Result<EffectId> {
        let mut state = self.state.lock();
        let id = EffectId(state.next_id());
        let params = NativeParams::new(
            kind.parameter_names(),
            EffectParams::defaults(kind).values(),
        );
        state.effects.insert(id, NativeEffect { kind, params });
        Ok(id)
    }

    fn set_effect_param(&self, effect: EffectId, name: &str, value: ParamValue) -> Result<()> {
        let mut state = self.state.lock();
        let native = state
            .effects
            .get_mut(&effect)
            .ok_or_else(|| AlSceneError::Backend(format!("invalid {}", effect)))?;
        native.params.set(native.kind.name(), name, value)
    }

    fn effect_param(&self, effect: EffectId, name: &str) -> Result<ParamValue> {
        let state = self.state.lock();
        let native = state
            .effects
            .get(&effect)
            .ok_or_else(|| AlSceneError::Backend(format!("invalid {}", effect)))?;
        native.params.get(native.kind.name(), name)
    }

    fn delete_effect(&self, effect: EffectId) -> Result<()> {
        let mut state = self.state.lock();
        if state.effects.remove(&effect).is_none() {
            return Err(AlSceneError::Backend(format!("invalid {}", effect)));
        }
        for slot in state.slots.values_mut() {
            if slot.effect == Some(effect) {
                slot.effect = None;
            }
        }
        Ok(())
    }

    fn create_filter(&self, kind: FilterKind) -> Result<FilterId> {
        let mut state = self.state.lock();
        let id = FilterId(state.next_id());
        let params = NativeParams::new(
            kind.parameter_names(),
            FilterParams::defaults(kind).values(),
        );
        state.filters.insert(id, NativeFilter { kind, params });
        Ok(id)
    }

    fn set_filter_param(&self, filter: FilterId, name: &str, value: ParamValue) -> Result<()> {
        let mut state = self.state.lock();
        let native = state
            .filters
            .get_mut(&filter)
            .ok_or_else(|| AlSceneError::Backend(format!("invalid {}", filter)))?;
        native.params.set(native.kind.name(), name, value)
    }

    fn filter_param(&self, filter: FilterId, name: &str) -> Result<ParamValue> {
        let state = self.state.lock();
        let native = state
            .filters
            .get(&filter)
            .ok_or_else(|| AlSceneError::Backend(format!("invalid {}", filter)))?;
        native.params.get(native.kind.name(), name)
    }

    fn delete_filter(&self, filter: FilterId) -> Result<()> {
        let mut state = self.state.lock();
        if state.filters.remove(&filter).is_none() {
            return Err(AlSceneError::Backend(format!("invalid {}", filter)));
        }
        for source in state.sources.values_mut() {
            if source.direct_filter == Some(filter) {
                source.direct_filter = None;
            }
        }
        Ok(())
    }

    fn create_aux_slot(&self) -> Result<SlotId> {
        let mut state = self.state.lock();
        if state.slots.len() >= self.max_slots {
            return Err(AlSceneError::ResourceExhausted(format!(
                "all {} auxiliary slots in use",
                self.max_slots
            )));
        }
        let id = SlotId(state.next_id());
        state.slots.insert(
            id,
            NativeSlot {
                effect: None,
                gain: 1.0,
            },
        );
        Ok(id)
    }

    fn set_slot_effect(&self, slot: SlotId, effect: Option<EffectId>) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(effect) = effect {
            if !state.effects.contains_key(&effect) {
                return Err(AlSceneError::Backend(format!("invalid {}", effect)));
            }
        }
        state
            .slots
            .get_mut(&slot)
            .ok_or_else(|| AlSceneError::Backend(format!("invalid {}", slot)))?
            .effect = effect;
        Ok(())
    }

    fn set_slot_gain(&self, slot: SlotId, gain: f32) -> Result<()> {
        let mut state = self.state.lock();
        state
            .slots
            .get_mut(&slot)
            .ok_or_else(|| AlSceneError::Backend(format!("invalid {}", slot)))?
            .gain = gain.clamp(0.0, 1.0);
        Ok(())
    }

    fn delete_aux_slot(&self, slot: SlotId) -> Result<()> {
        let mut state = self.state.lock();
        if state.slots.remove(&slot).is_none() {
            return Err(AlSceneError::Backend(format!("invalid {}", slot)));
        }
        for source in state.sources.values_mut() {
            for send in source.sends.iter_mut() {
                if *send == Some(slot) {
                    *send = None;
                }
            }
        }
        Ok(())
    }
}
