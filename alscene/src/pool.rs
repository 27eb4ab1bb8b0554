use crate::sound::Sound;
use std::collections::VecDeque;

/// Snapshot of a [`OneshotPool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub active: usize,
    pub playing: usize,
    pub paused: usize,
    pub max_oneshots: usize,
    /// Number of eviction passes since creation.
    pub evictions: usize,
    /// Oneshots admitted since creation.
    pub total_played: usize,
}

/// Bounded, insertion-ordered set of transient sounds.
///
/// The pool only keeps the collection in shape. Creating and starting the sounds it
/// admits is up to the scene.
#[derive(Debug)]
pub struct OneshotPool {
    sounds: VecDeque<Sound>,
    max_oneshots: usize,
    evictions: usize,
    total_played: usize,
}

impl Default for OneshotPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl OneshotPool {
    pub const DEFAULT_CAPACITY: usize = 100;
    pub const MIN_CAPACITY: usize = 10;

    pub fn new(max_oneshots: usize) -> Self {
        Self {
            sounds: VecDeque::new(),
            max_oneshots: max_oneshots.max(Self::MIN_CAPACITY),
            evictions: 0,
            total_played: 0,
        }
    }

    pub fn max_oneshots(&self) -> usize {
        self.max_oneshots
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.sounds.len() >= self.max_oneshots
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sound> {
        self.sounds.iter()
    }

    /// Destroys and drops every sound that is neither playing nor paused. Returns how
    /// many were removed.
    pub fn cleanup_finished_sounds(&mut self) -> usize {
        let before = self.sounds.len();
        self.sounds.retain(|sound| {
            if sound.is_finished() {
                sound.destroy();
                false
            } else {
                true
            }
        });

        let removed = before - self.sounds.len();
        if removed > 0 {
            log::debug!("Removed {} finished oneshot(s)", removed);
        }
        removed
    }

    /// Stops and destroys the oldest `max(1, len / 5)` sounds. Returns how many were
    /// evicted.
    pub fn evict(&mut self) -> usize {
        if self.sounds.is_empty() {
            return 0;
        }

        let count = (self.sounds.len() / 5).max(1);
        for sound in self.sounds.drain(..count) {
            if let Err(e) = sound.stop() {
                log::warn!("Failed to stop evicted {}: {}", sound.id(), e);
            }
            sound.destroy();
        }
        self.evictions += 1;

        log::debug!(
            "Evicted {} oneshot(s), {} remain",
            count,
            self.sounds.len()
        );
        count
    }

    /// Frees room for one more sound: evicts when at capacity.
    pub fn make_room(&mut self) -> usize {
        if self.is_full() { self.evict() } else { 0 }
    }

    pub fn push(&mut self, sound: Sound) {
        self.sounds.push_back(sound);
        self.total_played += 1;
    }

    /// Removes `sound` from the pool without destroying it.
    pub fn remove(&mut self, sound: &Sound) -> Option<Sound> {
        let index = self.sounds.iter().position(|s| s.ptr_eq(sound))?;
        self.sounds.remove(index)
    }

    pub fn contains(&self, sound: &Sound) -> bool {
        self.sounds.iter().any(|s| s.ptr_eq(sound))
    }

    /// Clamps to at least [`MIN_CAPACITY`](Self::MIN_CAPACITY), then evicts until the
    /// pool fits.
    pub fn set_max_oneshots(&mut self, max_oneshots: usize) {
        self.max_oneshots = max_oneshots.max(Self::MIN_CAPACITY);
        while self.sounds.len() > self.max_oneshots {
            self.evict();
        }
    }

    /// Stops and destroys every pooled sound, leaving the pool empty. Returns how many
    /// were released.
    pub fn stop_all(&mut self) -> usize {
        let count = self.sounds.len();
        for sound in self.sounds.drain(..) {
            if let Err(e) = sound.stop() {
                log::debug!("Stopping oneshot {} failed: {}", sound.id(), e);
            }
            sound.destroy();
        }
        count
    }

    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            active: self.sounds.len(),
            max_oneshots: self.max_oneshots,
            evictions: self.evictions,
            total_played: self.total_played,
            ..Default::default()
        };
        for sound in &self.sounds {
            if sound.is_playing() {
                stats.playing += 1;
            } else if sound.is_paused() {
                stats.paused += 1;
            }
        }
        stats
    }
}
