use crate::audio_data::{DefaultAudioLoader, LoadOptions};
use crate::backend::SoftwareBackend;
use crate::cache::{BufferCache, BufferHandle};
use crate::effects::EffectsFacade;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Writes a mono 16-bit 48 kHz saw tone.
pub(crate) fn write_tone(path: &Path, frames: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        writer.write_sample(((i % 64) as i16 - 32) * 500).unwrap();
    }
    writer.finalize().unwrap();
}

/// A software backend with a cache and facade over a scratch directory.
pub(crate) struct Rig {
    pub dir: TempDir,
    pub backend: Arc<SoftwareBackend>,
    pub effects: EffectsFacade,
    pub cache: BufferCache,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_backend(SoftwareBackend::new(48000))
    }

    pub fn with_backend(backend: SoftwareBackend) -> Self {
        let backend = Arc::new(backend);
        Self {
            dir: tempfile::tempdir().unwrap(),
            effects: EffectsFacade::new(backend.clone()),
            cache: BufferCache::new(
                backend.clone(),
                Arc::new(DefaultAudioLoader),
                LoadOptions::default(),
            ),
            backend,
        }
    }

    /// Path of a tone file in the scratch directory, written on first use.
    pub fn tone(&self, name: &str, frames: usize) -> PathBuf {
        let path = self.dir.path().join(name);
        if !path.exists() {
            write_tone(&path, frames);
        }
        path
    }

    pub fn buffer(&self, name: &str, frames: usize) -> Arc<BufferHandle> {
        self.cache.acquire(self.tone(name, frames)).unwrap()
    }

    /// Renders a tenth of a second, long enough to finish any short tone.
    pub fn render_all(&self) {
        let mut out = vec![0.0; 4800 * 2];
        assert_eq!(self.backend.render(&mut out, 2), 4800);
    }
}
