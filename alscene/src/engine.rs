use crate::backend::SoftwareBackend;
use crate::config::SceneDesc;
use crate::error::{AlSceneError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Fills an interleaved f32 block.
///
/// Receives the block, the stream sample rate and the channel count, and returns the
/// number of frames written. The callback runs on the audio thread and must not block.
pub type AudioFillCallback = dyn Fn(&mut [f32], u32, u16) -> usize + Send + Sync;

/// Output stream on the default device, fed by a fill callback.
pub struct AudioEngine {
    desc: SceneDesc,
    stream: Option<cpal::Stream>,
    is_running: Arc<AtomicBool>,
    frames_processed: Arc<AtomicUsize>,
    fill_callback: Option<Arc<AudioFillCallback>>,
}

impl AudioEngine {
    pub fn new(desc: &SceneDesc) -> Self {
        Self {
            desc: desc.clone(),
            stream: None,
            is_running: Arc::new(AtomicBool::new(false)),
            frames_processed: Arc::new(AtomicUsize::new(0)),
            fill_callback: None,
        }
    }

    /// An engine that renders `backend` into the device.
    pub fn for_backend(desc: &SceneDesc, backend: Arc<SoftwareBackend>) -> Self {
        let mut engine = Self::new(desc);
        engine.set_fill_callback(move |out, _sample_rate, channels| backend.render(out, channels));
        engine
    }

    pub fn set_fill_callback<F>(&mut self, callback: F)
    where
        F: Fn(&mut [f32], u32, u16) -> usize + Send + Sync + 'static,
    {
        self.fill_callback = Some(Arc::new(callback));
    }

    /// Opens the default output device and starts pulling from the fill callback.
    /// No-op when already running.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let fill_callback = self
            .fill_callback
            .clone()
            .ok_or_else(|| AlSceneError::Configuration("no fill callback set".into()))?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AlSceneError::AudioDevice("no default output device".into()))?;

        let config = cpal::StreamConfig {
            channels: self.desc.channels,
            sample_rate: cpal::SampleRate(self.desc.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(self.desc.block_size as u32),
        };

        let default_config = device
            .default_output_config()
            .map_err(|e| AlSceneError::AudioDevice(format!("no default config: {}", e)))?;

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => self.create_stream::<f32>(&device, &config, fill_callback)?,
            cpal::SampleFormat::I16 => self.create_stream::<i16>(&device, &config, fill_callback)?,
            cpal::SampleFormat::U16 => self.create_stream::<u16>(&device, &config, fill_callback)?,
            format => {
                return Err(AlSceneError::AudioDevice(format!(
                    "unsupported sample format {:?}",
                    format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| AlSceneError::AudioDevice(format!("failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        self.is_running.store(true, Ordering::Relaxed);
        log::info!(
            "Output started: {} Hz, {} ch, block {}",
            self.desc.sample_rate,
            self.desc.channels,
            self.desc.block_size
        );
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.is_running.store(false, Ordering::Relaxed);
            drop(stream);
            log::info!("Output stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Frames rendered by the fill callback since creation.
    pub fn frames_processed(&self) -> usize {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn desc(&self) -> &SceneDesc {
        &self.desc
    }

    fn create_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        fill_callback: Arc<AudioFillCallback>,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let is_running = self.is_running.clone();
        let frames_processed = self.frames_processed.clone();
        let sample_rate = self.desc.sample_rate;
        let channels = self.desc.channels;
        let mut scratch: Vec<f32> = Vec::new();

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    if !is_running.load(Ordering::Relaxed) {
                        data.fill(T::from_sample(0.0f32));
                        return;
                    }

                    // grows to the largest block seen, then stays put
                    scratch.resize(data.len(), 0.0);
                    let frames = fill_callback(&mut scratch[..], sample_rate, channels);

                    for (out, sample) in data.iter_mut().zip(&scratch) {
                        *out = T::from_sample(*sample);
                    }
                    frames_processed.fetch_add(frames, Ordering::Relaxed);
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AlSceneError::AudioDevice(format!("failed to build stream: {}", e)))
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_without_callback_fails() {
        let mut engine = AudioEngine::new(&SceneDesc::default());
        assert!(matches!(engine.start(), Err(AlSceneError::Configuration(_))));
        assert!(!engine.is_running());
        assert_eq!(engine.frames_processed(), 0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut engine = AudioEngine::for_backend(
            &SceneDesc::default(),
            Arc::new(SoftwareBackend::new(48000)),
        );
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
        assert_eq!(engine.desc().sample_rate, 48000);
    }
}
