mod default_loader;
mod load_options;
mod loader;
mod resampler;

use crate::error::Result;
pub use default_loader::DefaultAudioLoader;
pub use load_options::{ConvertToMono, LoadOptions};
pub use loader::AudioDataLoader;
pub use resampler::AudioResampler;
use std::sync::Arc;
use std::time::Duration;

/// Decoded PCM shared by reference.
///
/// Samples are interleaved (`[L0, R0, L1, R1, ...]` for stereo). Cloning is cheap and
/// shares the underlying buffer, which is how the software backend keeps buffer data
/// alive for sources bound to it.
#[derive(Debug, Clone)]
pub struct AudioData {
    inner: Arc<AudioDataInner>,
}

#[derive(Debug)]
struct AudioDataInner {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    total_frames: usize,
}

impl AudioData {
    /// Wraps interleaved samples. A trailing partial frame is dropped.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let total_frames = samples.len() / channels as usize;
        samples.truncate(total_frames * channels as usize);
        Self {
            inner: Arc::new(AudioDataInner {
                samples,
                sample_rate,
                channels,
                total_frames,
            }),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.inner.samples
    }

    pub fn total_frames(&self) -> usize {
        self.inner.total_frames
    }

    pub fn duration(&self) -> Duration {
        if self.inner.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.inner.total_frames as f64 / self.inner.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.samples.len()
    }

    /// Interleaved sample at `frame`/`channel`, or silence past the end.
    #[inline]
    pub(crate) fn sample(&self, frame: usize, channel: usize) -> f32 {
        let channels = self.inner.channels as usize;
        self.inner
            .samples
            .get(frame * channels + channel.min(channels - 1))
            .copied()
            .unwrap_or(0.0)
    }

    /// Averages all channels into one.
    pub fn to_mono(&self) -> Self {
        if self.inner.channels == 1 {
            return self.clone();
        }

        let channels = self.inner.channels as usize;
        let mono: Vec<f32> = self
            .inner
            .samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Self::new(mono, self.inner.sample_rate, 1)
    }

    /// Returns a copy converted to `target_sample_rate` with rubato.
    pub fn resample(&self, target_sample_rate: u32) -> Result<Self> {
        if target_sample_rate == self.inner.sample_rate {
            return Ok(self.clone());
        }

        let resampler = AudioResampler::new(
            self.inner.sample_rate,
            target_sample_rate,
            self.inner.channels,
            Some(1024),
        )?;
        let samples = resampler.resample_interleaved(&self.inner.samples)?;

        Ok(Self::new(samples, target_sample_rate, self.inner.channels))
    }
}
