use crate::audio_data::{AudioDataLoader, LoadOptions};
use crate::backend::{AudioBackend, BufferId};
use crate::cleanup::best_effort;
use crate::error::{AlSceneError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A decoded file uploaded to one native buffer.
///
/// Shared by every sound playing the file. Destroying a sound never releases it; only
/// [`BufferCache::clear`] does.
#[derive(Debug)]
pub struct BufferHandle {
    path: PathBuf,
    buffer: BufferId,
    channels: u16,
    sample_rate: u32,
    frames: usize,
}

impl BufferHandle {
    /// Canonical path the buffer was decoded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Rate of the decoded file, before any backend conversion.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }
}

type Slot = Arc<Mutex<Option<Arc<BufferHandle>>>>;

/// Canonical path to shared [`BufferHandle`].
///
/// Each path has its own slot lock, so concurrent `acquire` calls for one file decode it
/// once while different files decode in parallel.
pub struct BufferCache {
    backend: Arc<dyn AudioBackend>,
    loader: Arc<dyn AudioDataLoader>,
    options: LoadOptions,
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

impl BufferCache {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        loader: Arc<dyn AudioDataLoader>,
        options: LoadOptions,
    ) -> Self {
        Self {
            backend,
            loader,
            options,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the shared buffer for `path`, decoding and uploading it on first use.
    ///
    /// # Errors
    ///
    /// `NotFound` if the path does not exist, `Decode` if the loader cannot parse it,
    /// or whatever the backend reports while allocating or filling the buffer.
    pub fn acquire(&self, path: impl AsRef<Path>) -> Result<Arc<BufferHandle>> {
        let path = canonicalize(path.as_ref())?;

        loop {
            let slot = self.slots.lock().entry(path.clone()).or_default().clone();
            let mut entry = slot.lock();
            if let Some(handle) = entry.as_ref() {
                return Ok(handle.clone());
            }

            let handle = match self.upload(&path) {
                Ok(handle) => handle,
                Err(e) => {
                    drop(entry);
                    self.forget_empty(&path, &slot);
                    return Err(e);
                }
            };
            *entry = Some(handle.clone());
            drop(entry);

            if self.holds(&path, &slot) {
                return Ok(handle);
            }

            // cleared while decoding; the slot is no longer reachable from the map
            if let Some(orphan) = slot.lock().take() {
                if let Err(e) = self.backend.delete_buffer(orphan.buffer) {
                    log::warn!("Failed to release {}: {}", orphan.buffer, e);
                }
            }
            log::debug!("Cache cleared during decode of {}, retrying", path.display());
        }
    }

    fn upload(&self, path: &Path) -> Result<Arc<BufferHandle>> {
        let data = self.loader.load(path, &self.options)?;
        let buffer = self.backend.create_buffer()?;
        if let Err(e) = self.backend.set_buffer_data(buffer, &data) {
            if let Err(release_err) = self.backend.delete_buffer(buffer) {
                log::warn!("Failed to release {}: {}", buffer, release_err);
            }
            return Err(e);
        }

        let handle = Arc::new(BufferHandle {
            path: path.to_path_buf(),
            buffer,
            channels: data.channels(),
            sample_rate: data.sample_rate(),
            frames: data.total_frames(),
        });
        log::debug!(
            "Cached {} as {} ({} ch, {} Hz, {} frames)",
            handle.path.display(),
            buffer,
            handle.channels,
            handle.sample_rate,
            handle.frames
        );
        Ok(handle)
    }

    fn holds(&self, path: &Path, slot: &Slot) -> bool {
        self.slots
            .lock()
            .get(path)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// Drops the map entry for a failed load unless another caller is already filling it.
    fn forget_empty(&self, path: &Path, slot: &Slot) {
        let mut slots = self.slots.lock();
        let unused = slots.get(path).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && current.try_lock().is_some_and(|entry| entry.is_none())
        });
        if unused {
            slots.remove(path);
        }
    }

    /// True when `path` has a live buffer.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let Ok(path) = canonicalize(path.as_ref()) else {
            return false;
        };
        let slot = self.slots.lock().get(&path).cloned();
        match slot {
            Some(slot) => slot.lock().is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.lock().values().cloned().collect();
        slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases every cached buffer and returns how many were released.
    ///
    /// This is unconditional. Sounds still bound to a released buffer go silent and stop;
    /// each such buffer is reported with a warning.
    pub fn clear(&self) -> usize {
        let mut slots = self.slots.lock();
        let handles: Vec<Arc<BufferHandle>> = slots
            .drain()
            .filter_map(|(_, slot)| {
                let handle = slot.lock().take();
                handle
            })
            .collect();
        drop(slots);

        let report = best_effort("cached buffer", handles, |handle| {
            // the local binding is the only other owner once the map is drained
            let users = Arc::strong_count(&handle) - 1;
            if users > 0 {
                log::warn!(
                    "Releasing {} for {} while {} sound(s) still reference it",
                    handle.buffer,
                    handle.path.display(),
                    users
                );
            }
            self.backend.delete_buffer(handle.buffer)
        });

        log::info!(
            "Buffer cache cleared: {} released, {} failed",
            report.released,
            report.failed
        );
        report.released
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| match e.kind() {
        ErrorKind::NotFound => AlSceneError::NotFound(path.display().to_string()),
        _ => AlSceneError::Io(e),
    })
}
