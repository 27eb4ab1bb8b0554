use crate::effects::{EffectKind, FilterKind};
use crate::error::{AlSceneError, Result};

/// A native effect/filter parameter value. The backend distinguishes integer and float
/// parameters the way the EFX API does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
}

impl ParamValue {
    pub fn as_f32(self) -> f32 {
        match self {
            Self::Float(v) => v,
            Self::Int(v) => v as f32,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

trait FromNamedValue {
    fn from_named_value(value: f32) -> Self;
}

impl FromNamedValue for f32 {
    fn from_named_value(value: f32) -> Self {
        value
    }
}

impl FromNamedValue for i32 {
    fn from_named_value(value: f32) -> Self {
        value.round() as i32
    }
}

/// Declares a parameter record. Field names double as the native parameter names.
macro_rules! param_record {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $default:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )+
        }

        impl Default for $name {
            fn default() -> Self {
                Self { $( $field: $default, )+ }
            }
        }

        impl $name {
            /// Native parameter names, in upload order.
            pub const PARAMETERS: &'static [&'static str] = &[$( stringify!($field) ),+];

            /// `(name, value)` pairs as uploaded to the backend.
            pub fn values(&self) -> Vec<(&'static str, ParamValue)> {
                vec![$( (stringify!($field), ParamValue::from(self.$field)) ),+]
            }

            fn set_named(&mut self, name: &str, value: f32) -> Result<()> {
                match name {
                    $( stringify!($field) => {
                        self.$field = <$ty as FromNamedValue>::from_named_value(value);
                        Ok(())
                    } )+
                    _ => Err(AlSceneError::Configuration(format!(
                        "unknown parameter '{}' for {}",
                        name,
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

param_record! {
    /// Reverb. Defaults are the `room` preset.
    ReverbParams {
        /// Modal density, 0.0 to 1.0.
        density: f32 = 1.0,
        /// 0.0 to 1.0.
        diffusion: f32 = 1.0,
        /// 0.0 to 1.0.
        gain: f32 = 0.32,
        /// 0.0 to 1.0.
        gainhf: f32 = 0.89,
        /// Seconds, 0.1 to 20.0.
        decay_time: f32 = 1.49,
        /// 0.1 to 2.0.
        decay_hfratio: f32 = 0.54,
        /// 0.0 to 3.16.
        reflections_gain: f32 = 0.05,
        /// Seconds, 0.0 to 0.3.
        reflections_delay: f32 = 0.007,
        /// 0.0 to 10.0.
        late_reverb_gain: f32 = 1.26,
        /// Seconds, 0.0 to 0.1.
        late_reverb_delay: f32 = 0.011,
    }
}

param_record! {
    DistortionParams {
        /// 0.0 to 1.0.
        edge: f32 = 0.2,
        /// 0.01 to 1.0.
        gain: f32 = 0.05,
        /// Hz, 80 to 24000.
        lowpass_cutoff: f32 = 8000.0,
        /// Hz, 80 to 24000.
        eqcenter: f32 = 3600.0,
        /// Hz, 80 to 24000.
        eqbandwidth: f32 = 3600.0,
    }
}

param_record! {
    EchoParams {
        /// Seconds, 0.0 to 0.207.
        delay: f32 = 0.1,
        /// Left/right delay in seconds, 0.0 to 0.404.
        lrdelay: f32 = 0.1,
        /// 0.0 to 0.99.
        damping: f32 = 0.5,
        /// 0.0 to 1.0.
        feedback: f32 = 0.5,
        /// -1.0 to 1.0.
        spread: f32 = -1.0,
    }
}

param_record! {
    ChorusParams {
        /// 0 = sinusoid, 1 = triangle.
        waveform: i32 = 1,
        /// Degrees, -180 to 180.
        phase: i32 = 90,
        /// Hz, 0.0 to 10.0.
        rate: f32 = 1.1,
        depth: f32 = 0.1,
        /// -1.0 to 1.0.
        feedback: f32 = 0.25,
        /// Seconds, 0.0 to 0.016.
        delay: f32 = 0.016,
    }
}

param_record! {
    FlangerParams {
        /// 0 = sinusoid, 1 = triangle.
        waveform: i32 = 1,
        /// Degrees, -180 to 180.
        phase: i32 = 0,
        /// Hz, 0.0 to 10.0.
        rate: f32 = 0.27,
        depth: f32 = 1.0,
        /// -1.0 to 1.0.
        feedback: f32 = -0.5,
        /// Seconds, 0.0 to 0.004.
        delay: f32 = 0.002,
    }
}

param_record! {
    PitchShifterParams {
        /// Semitones, -12 to 12.
        coarse_tune: i32 = 12,
        /// Cents, -50 to 50.
        fine_tune: i32 = 0,
    }
}

param_record! {
    AutowahParams {
        /// Seconds, 0.0001 to 1.0.
        attack_time: f32 = 0.06,
        /// Seconds, 0.0001 to 1.0.
        release_time: f32 = 0.06,
        /// 2.0 to 1000.0.
        resonance: f32 = 1000.0,
        /// 0.00003 to 31622.78.
        peak_gain: f32 = 11.22,
    }
}

param_record! {
    CompressorParams {
        /// 1 = on, 0 = off.
        onoff: i32 = 1,
    }
}

param_record! {
    /// Four-band equalizer. Gains range 0.126 to 7.943.
    EqualizerParams {
        low_gain: f32 = 1.0,
        /// Hz, 50 to 800.
        low_cutoff: f32 = 200.0,
        mid1_gain: f32 = 1.0,
        /// Hz, 200 to 3000.
        mid1_center: f32 = 500.0,
        /// 0.01 to 1.0.
        mid1_width: f32 = 1.0,
        mid2_gain: f32 = 1.0,
        /// Hz, 1000 to 8000.
        mid2_center: f32 = 3000.0,
        /// 0.01 to 1.0.
        mid2_width: f32 = 1.0,
        high_gain: f32 = 1.0,
        /// Hz, 4000 to 16000.
        high_cutoff: f32 = 6000.0,
    }
}

param_record! {
    LowpassParams {
        /// 0.0 to 1.0.
        gain: f32 = 1.0,
        /// 0.0 to 1.0.
        gainhf: f32 = 0.5,
    }
}

param_record! {
    HighpassParams {
        /// 0.0 to 1.0.
        gain: f32 = 1.0,
        /// 0.0 to 1.0.
        gainlf: f32 = 0.5,
    }
}

param_record! {
    BandpassParams {
        /// 0.0 to 1.0.
        gain: f32 = 1.0,
        /// 0.0 to 1.0.
        gainlf: f32 = 0.5,
        /// 0.0 to 1.0.
        gainhf: f32 = 0.5,
    }
}

/// Alternative spellings accepted by `from_named`.
fn canonical_name(name: &str) -> &str {
    match name {
        "lr_delay" => "lrdelay",
        "enabled" => "onoff",
        other => other,
    }
}

/// Typed configuration of one effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectParams {
    Reverb(ReverbParams),
    Distortion(DistortionParams),
    Echo(EchoParams),
    Chorus(ChorusParams),
    Flanger(FlangerParams),
    PitchShifter(PitchShifterParams),
    Autowah(AutowahParams),
    Compressor(CompressorParams),
    Equalizer(EqualizerParams),
}

impl EffectParams {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Reverb(_) => EffectKind::Reverb,
            Self::Distortion(_) => EffectKind::Distortion,
            Self::Echo(_) => EffectKind::Echo,
            Self::Chorus(_) => EffectKind::Chorus,
            Self::Flanger(_) => EffectKind::Flanger,
            Self::PitchShifter(_) => EffectKind::PitchShifter,
            Self::Autowah(_) => EffectKind::Autowah,
            Self::Compressor(_) => EffectKind::Compressor,
            Self::Equalizer(_) => EffectKind::Equalizer,
        }
    }

    /// Default parameters for `kind`.
    pub fn defaults(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Reverb => Self::Reverb(ReverbParams::default()),
            EffectKind::Distortion => Self::Distortion(DistortionParams::default()),
            EffectKind::Echo => Self::Echo(EchoParams::default()),
            EffectKind::Chorus => Self::Chorus(ChorusParams::default()),
            EffectKind::Flanger => Self::Flanger(FlangerParams::default()),
            EffectKind::PitchShifter => Self::PitchShifter(PitchShifterParams::default()),
            EffectKind::Autowah => Self::Autowah(AutowahParams::default()),
            EffectKind::Compressor => Self::Compressor(CompressorParams::default()),
            EffectKind::Equalizer => Self::Equalizer(EqualizerParams::default()),
        }
    }

    pub fn values(&self) -> Vec<(&'static str, ParamValue)> {
        match self {
            Self::Reverb(p) => p.values(),
            Self::Distortion(p) => p.values(),
            Self::Echo(p) => p.values(),
            Self::Chorus(p) => p.values(),
            Self::Flanger(p) => p.values(),
            Self::PitchShifter(p) => p.values(),
            Self::Autowah(p) => p.values(),
            Self::Compressor(p) => p.values(),
            Self::Equalizer(p) => p.values(),
        }
    }

    fn set_named(&mut self, name: &str, value: f32) -> Result<()> {
        let name = canonical_name(name);
        match self {
            Self::Reverb(p) => p.set_named(name, value),
            Self::Distortion(p) => p.set_named(name, value),
            Self::Echo(p) => p.set_named(name, value),
            Self::Chorus(p) => p.set_named(name, value),
            Self::Flanger(p) => p.set_named(name, value),
            Self::PitchShifter(p) => p.set_named(name, value),
            Self::Autowah(p) => p.set_named(name, value),
            Self::Compressor(p) => p.set_named(name, value),
            Self::Equalizer(p) => p.set_named(name, value),
        }
    }

    /// Builds parameters from a type name and named values. Omitted parameters keep
    /// their defaults.
    ///
    /// `preset` is only meaningful for reverb. Explicit values take precedence: when any
    /// are given the preset is ignored entirely.
    ///
    /// # Errors
    ///
    /// `UnsupportedType` for an unknown type name, `NotFound` for an unknown reverb
    /// preset, `Configuration` for an unknown parameter name or a preset on a
    /// non-reverb type.
    pub fn from_named(
        type_name: &str,
        preset: Option<&str>,
        named: &[(&str, f32)],
    ) -> Result<Self> {
        let kind: EffectKind = type_name.parse()?;

        let mut params = match (kind, preset) {
            (EffectKind::Reverb, Some(preset)) if named.is_empty() => {
                Self::Reverb(preset.parse::<crate::effects::ReverbPreset>()?.params())
            }
            (EffectKind::Reverb, _) => Self::defaults(kind),
            (_, Some(preset)) => {
                return Err(AlSceneError::Configuration(format!(
                    "preset '{}' given for {} effect; only reverb takes presets",
                    preset, kind
                )));
            }
            (_, None) => Self::defaults(kind),
        };

        for (name, value) in named {
            params.set_named(name, *value)?;
        }
        Ok(params)
    }
}

impl From<ReverbParams> for EffectParams {
    fn from(params: ReverbParams) -> Self {
        Self::Reverb(params)
    }
}

/// Typed configuration of one direct filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterParams {
    Lowpass(LowpassParams),
    Highpass(HighpassParams),
    Bandpass(BandpassParams),
}

impl FilterParams {
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Lowpass(_) => FilterKind::Lowpass,
            Self::Highpass(_) => FilterKind::Highpass,
            Self::Bandpass(_) => FilterKind::Bandpass,
        }
    }

    pub fn defaults(kind: FilterKind) -> Self {
        match kind {
            FilterKind::Lowpass => Self::Lowpass(LowpassParams::default()),
            FilterKind::Highpass => Self::Highpass(HighpassParams::default()),
            FilterKind::Bandpass => Self::Bandpass(BandpassParams::default()),
        }
    }

    pub fn lowpass(gain: f32, gainhf: f32) -> Self {
        Self::Lowpass(LowpassParams { gain, gainhf })
    }

    pub fn highpass(gain: f32, gainlf: f32) -> Self {
        Self::Highpass(HighpassParams { gain, gainlf })
    }

    pub fn bandpass(gain: f32, gainlf: f32, gainhf: f32) -> Self {
        Self::Bandpass(BandpassParams {
            gain,
            gainlf,
            gainhf,
        })
    }

    /// Broadband gain applied to the dry path.
    pub fn gain(&self) -> f32 {
        match self {
            Self::Lowpass(p) => p.gain,
            Self::Highpass(p) => p.gain,
            Self::Bandpass(p) => p.gain,
        }
    }

    pub fn values(&self) -> Vec<(&'static str, ParamValue)> {
        match self {
            Self::Lowpass(p) => p.values(),
            Self::Highpass(p) => p.values(),
            Self::Bandpass(p) => p.values(),
        }
    }

    /// Builds parameters from a type name and named values. Omitted parameters keep
    /// their defaults.
    pub fn from_named(type_name: &str, named: &[(&str, f32)]) -> Result<Self> {
        let mut params = Self::defaults(type_name.parse()?);
        for (name, value) in named {
            let name = canonical_name(name);
            match &mut params {
                Self::Lowpass(p) => p.set_named(name, *value)?,
                Self::Highpass(p) => p.set_named(name, *value)?,
                Self::Bandpass(p) => p.set_named(name, *value)?,
            }
        }
        Ok(params)
    }
}
