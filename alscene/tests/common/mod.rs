use alscene::{SceneDesc, SoftwareBackend, SoundScene};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Mono 16-bit 48 kHz tone.
pub fn write_tone(path: &Path, frames: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let t = i as f32 / 48000.0;
        let sample = (t * 440.0 * std::f32::consts::TAU).sin() * 0.5;
        writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

pub struct Harness {
    pub dir: TempDir,
    pub backend: Arc<SoftwareBackend>,
    pub scene: SoundScene,
}

impl Harness {
    pub fn new(desc: SceneDesc) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let dir = tempfile::tempdir().unwrap();
        write_tone(&dir.path().join("click.wav"), 480);
        write_tone(&dir.path().join("test.wav"), 48000);

        let backend = Arc::new(SoftwareBackend::new(desc.sample_rate));
        let scene = SoundScene::with_backend(desc, backend.clone());
        Self {
            dir,
            backend,
            scene,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Renders `frames` stereo frames through the backend.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * 2];
        assert_eq!(self.backend.render(&mut out, 2), frames);
        out
    }
}
