/// Channel handling applied after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvertToMono {
    /// Keep the file's channel layout.
    #[default]
    Original,
    /// Average all channels into one. Positioned sources are only spatialized by
    /// OpenAL-family backends when their buffer is mono.
    ForceMono,
}

/// Options handed to an [`AudioDataLoader`](super::AudioDataLoader).
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub convert_to_mono: ConvertToMono,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn convert_to_mono(mut self, convert: ConvertToMono) -> Self {
        self.convert_to_mono = convert;
        self
    }
}
