use crate::effects::{FilterParams, ReverbParams};
use crate::error::{AlSceneError, Result};
use std::fmt;
use std::str::FromStr;

/// Named reverb parameter tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReverbPreset {
    Room,
    Hall,
    Cathedral,
    Bathroom,
    Cave,
    Arena,
    SmallRoom,
    MediumRoom,
    LargeHall,
    Auditorium,
    Underwater,
}

impl ReverbPreset {
    pub const ALL: [ReverbPreset; 11] = [
        Self::Room,
        Self::Hall,
        Self::Cathedral,
        Self::Bathroom,
        Self::Cave,
        Self::Arena,
        Self::SmallRoom,
        Self::MediumRoom,
        Self::LargeHall,
        Self::Auditorium,
        Self::Underwater,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Hall => "hall",
            Self::Cathedral => "cathedral",
            Self::Bathroom => "bathroom",
            Self::Cave => "cave",
            Self::Arena => "arena",
            Self::SmallRoom => "small_room",
            Self::MediumRoom => "medium_room",
            Self::LargeHall => "large_hall",
            Self::Auditorium => "auditorium",
            Self::Underwater => "underwater",
        }
    }

    pub fn params(self) -> ReverbParams {
        // density, diffusion, gain, gainhf, decay_time, decay_hfratio,
        // reflections_gain, reflections_delay, late_reverb_gain, late_reverb_delay
        let t = match self {
            Self::Room => [1.0, 1.0, 0.32, 0.89, 1.49, 0.54, 0.05, 0.007, 1.26, 0.011],
            Self::Hall | Self::LargeHall => {
                [1.0, 1.0, 0.32, 0.59, 3.92, 0.70, 0.24, 0.020, 1.26, 0.030]
            }
            Self::Cathedral => [1.0, 1.0, 0.32, 0.62, 5.04, 0.87, 0.20, 0.030, 1.26, 0.090],
            Self::Bathroom => [0.17, 0.65, 0.32, 0.54, 1.51, 1.25, 0.65, 0.025, 1.26, 0.030],
            Self::Cave => [1.0, 1.0, 0.32, 1.0, 2.91, 1.30, 0.50, 0.015, 0.71, 0.022],
            Self::Arena => [1.0, 1.0, 0.32, 0.44, 7.24, 0.33, 0.26, 0.020, 1.01, 0.030],
            Self::SmallRoom => [0.4, 0.83, 0.32, 0.89, 1.49, 0.54, 0.05, 0.007, 1.26, 0.011],
            Self::MediumRoom => [0.6, 1.0, 0.32, 0.89, 2.3, 0.54, 0.1, 0.010, 1.26, 0.015],
            Self::Auditorium => [1.0, 1.0, 0.32, 0.57, 4.32, 0.59, 0.40, 0.020, 0.71, 0.030],
            Self::Underwater => [0.36, 1.0, 0.32, 0.1, 1.49, 0.1, 0.6, 0.007, 1.18, 0.025],
        };

        ReverbParams {
            density: t[0],
            diffusion: t[1],
            gain: t[2],
            gainhf: t[3],
            decay_time: t[4],
            decay_hfratio: t[5],
            reflections_gain: t[6],
            reflections_delay: t[7],
            late_reverb_gain: t[8],
            late_reverb_delay: t[9],
        }
    }
}

impl fmt::Display for ReverbPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReverbPreset {
    type Err = AlSceneError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| AlSceneError::NotFound(format!("reverb preset '{}'", s)))
    }
}

/// Named direct-filter configurations for common environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterPreset {
    Radio,
    Telephone,
    Muffled,
    Thin,
    Underwater,
    Clear,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 6] = [
        Self::Radio,
        Self::Telephone,
        Self::Muffled,
        Self::Thin,
        Self::Underwater,
        Self::Clear,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Radio => "radio",
            Self::Telephone => "telephone",
            Self::Muffled => "muffled",
            Self::Thin => "thin",
            Self::Underwater => "underwater",
            Self::Clear => "clear",
        }
    }

    pub fn params(self) -> FilterParams {
        match self {
            Self::Radio => FilterParams::bandpass(1.0, 0.1, 0.3),
            Self::Telephone => FilterParams::bandpass(1.0, 0.05, 0.1),
            Self::Muffled => FilterParams::lowpass(1.0, 0.2),
            Self::Thin => FilterParams::highpass(1.0, 0.2),
            Self::Underwater => FilterParams::lowpass(0.9, 0.1),
            Self::Clear => FilterParams::lowpass(1.0, 1.0),
        }
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterPreset {
    type Err = AlSceneError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| AlSceneError::NotFound(format!("filter preset '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_preset_is_reverb_default() {
        assert_eq!(ReverbPreset::Room.params(), ReverbParams::default());
    }

    #[test]
    fn test_large_hall_matches_hall() {
        assert_eq!(ReverbPreset::LargeHall.params(), ReverbPreset::Hall.params());
    }

    #[test]
    fn test_preset_names_round_trip() {
        for preset in ReverbPreset::ALL {
            assert_eq!(preset.name().parse::<ReverbPreset>().unwrap(), preset);
        }
        for preset in FilterPreset::ALL {
            assert_eq!(preset.to_string().parse::<FilterPreset>().unwrap(), preset);
        }
    }

    #[test]
    fn test_unknown_preset() {
        assert!(matches!(
            "spaceship".parse::<ReverbPreset>(),
            Err(AlSceneError::NotFound(_))
        ));
        assert!(matches!(
            "walkie_talkie".parse::<FilterPreset>(),
            Err(AlSceneError::NotFound(_))
        ));
    }

    #[test]
    fn test_filter_preset_tables() {
        assert_eq!(
            FilterPreset::Underwater.params(),
            FilterParams::lowpass(0.9, 0.1)
        );
        assert_eq!(
            FilterPreset::Telephone.params(),
            FilterParams::bandpass(1.0, 0.05, 0.1)
        );
    }
}
