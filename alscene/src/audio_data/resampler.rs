use crate::error::{AlSceneError, Result};
use rubato::{FftFixedIn, Resampler};

/// Offline sample-rate converter used when PCM is uploaded to a backend running at a
/// different rate than the decoded file.
///
/// All channels are processed by a single multi-channel rubato instance so the
/// channels stay sample-aligned.
pub struct AudioResampler {
    source_sample_rate: u32,
    target_sample_rate: u32,
    channels: u16,
    chunk_size: usize,
}

impl AudioResampler {
    pub fn new(
        source_sample_rate: u32,
        target_sample_rate: u32,
        channels: u16,
        chunk_size: Option<usize>,
    ) -> Result<Self> {
        if source_sample_rate == 0 || target_sample_rate == 0 {
            return Err(AlSceneError::Configuration(
                "Sample rates must be greater than 0".to_string(),
            ));
        }

        if channels == 0 {
            return Err(AlSceneError::Configuration(
                "Channel count must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            source_sample_rate,
            target_sample_rate,
            channels,
            chunk_size: chunk_size.unwrap_or(1024).max(1),
        })
    }

    /// Resamples interleaved PCM and returns interleaved PCM at the target rate.
    ///
    /// The output is trimmed to `ceil(frames * ratio)` frames; the zero padding used to
    /// complete the final chunk is not carried into the result.
    pub fn resample_interleaved(&self, interleaved: &[f32]) -> Result<Vec<f32>> {
        if self.source_sample_rate == self.target_sample_rate || interleaved.is_empty() {
            return Ok(interleaved.to_vec());
        }

        let channels = self.channels as usize;
        let frames = interleaved.len() / channels;
        let planar: Vec<Vec<f32>> = (0..channels)
            .map(|ch| {
                interleaved
                    .chunks_exact(channels)
                    .map(|frame| frame[ch])
                    .collect()
            })
            .collect();

        let mut resampler = FftFixedIn::<f32>::new(
            self.source_sample_rate as usize,
            self.target_sample_rate as usize,
            self.chunk_size,
            2,
            channels,
        )
        .map_err(|e| AlSceneError::Backend(format!("Failed to create resampler: {}", e)))?;

        // rubato may round the requested chunk size to suit its FFT length
        let chunk_len = resampler.input_frames_next();
        let mut output: Vec<Vec<f32>> = vec![Vec::new(); channels];
        let mut chunk: Vec<Vec<f32>> = vec![vec![0.0; chunk_len]; channels];
        let mut offset = 0;

        while offset < frames {
            let take = (frames - offset).min(chunk_len);
            for (dst, src) in chunk.iter_mut().zip(&planar) {
                dst[..take].copy_from_slice(&src[offset..offset + take]);
                dst[take..].fill(0.0);
            }

            let processed = resampler
                .process(&chunk, None)
                .map_err(|e| AlSceneError::Backend(format!("Resampling error: {}", e)))?;
            for (dst, src) in output.iter_mut().zip(processed) {
                dst.extend_from_slice(&src);
            }

            offset += take;
        }

        let expected = (frames as f64 * self.resample_ratio()).ceil() as usize;
        let produced = output.first().map_or(0, Vec::len).min(expected);

        let mut result = Vec::with_capacity(produced * channels);
        for frame in 0..produced {
            for channel in &output {
                result.push(channel[frame]);
            }
        }
        Ok(result)
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    pub fn source_sample_rate(&self) -> u32 {
        self.source_sample_rate
    }

    pub fn resample_ratio(&self) -> f64 {
        self.target_sample_rate as f64 / self.source_sample_rate as f64
    }
}
