use crate::{
    audio_data::{AudioData, AudioDataLoader, ConvertToMono, LoadOptions},
    error::{AlSceneError, Result},
};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Symphonia-backed loader for WAV, OGG/Vorbis, MP3 and FLAC files.
///
/// Decodes the default track to interleaved f32 PCM at the file's own sample rate.
/// Resampling to the device rate is left to the backend.
pub struct DefaultAudioLoader;

impl AudioDataLoader for DefaultAudioLoader {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<AudioData> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AlSceneError::NotFound(path.display().to_string()),
            _ => AlSceneError::Io(e),
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                AlSceneError::Decode(format!("{}: unrecognised format: {}", path.display(), e))
            })?;

        let mut format = probed.format;

        let track = format.default_track().ok_or_else(|| {
            AlSceneError::Decode(format!("{}: no default audio track", path.display()))
        })?;
        let track_id = track.id;

        let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
            AlSceneError::Decode(format!("{}: sample rate not found", path.display()))
        })?;

        let channels = track
            .codec_params
            .channels
            .ok_or_else(|| {
                AlSceneError::Decode(format!("{}: channel layout not found", path.display()))
            })?
            .count() as u16;

        let mut decoder = get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                AlSceneError::Decode(format!("{}: no decoder: {}", path.display(), e))
            })?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(Error::ResetRequired) => break,
                Err(e) => {
                    return Err(AlSceneError::Decode(format!(
                        "{}: error reading packet: {}",
                        path.display(),
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::IoError(_)) => break,
                // corrupt packet, skip it
                Err(Error::DecodeError(e)) => {
                    log::warn!("{}: skipping undecodable packet: {}", path.display(), e);
                    continue;
                }
                Err(e) => {
                    return Err(AlSceneError::Decode(format!(
                        "{}: error decoding packet: {}",
                        path.display(),
                        e
                    )));
                }
            };

            let spec = *decoded.spec();
            let mut tmp = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            tmp.copy_interleaved_ref(decoded);
            samples.extend_from_slice(tmp.samples());
        }

        if samples.is_empty() {
            return Err(AlSceneError::Decode(format!(
                "{}: file contains no audio frames",
                path.display()
            )));
        }

        let data = AudioData::new(samples, sample_rate, channels);
        log::debug!(
            "Decoded {}: {} frames, {} ch @ {} Hz",
            path.display(),
            data.total_frames(),
            data.channels(),
            data.sample_rate()
        );

        match options.convert_to_mono {
            ConvertToMono::Original => Ok(data),
            ConvertToMono::ForceMono => Ok(data.to_mono()),
        }
    }
}
