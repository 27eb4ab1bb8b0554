use crate::math::Vec3;

/// Outcome of one [`DistanceMute::evaluate`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MuteChange {
    Unchanged,
    /// The sound moved out of range; its gain must drop to zero.
    Muted,
    /// The sound came back into range; its gain must return to this volume.
    Restored(f32),
}

/// Hard cutoff for positioned sounds far from the listener.
///
/// Distance attenuation in the backend never quite reaches zero. Past `max_distance`
/// the sound is silenced outright, and the volume it had is stored so coming back into
/// range restores it exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceMute {
    max_distance: f32,
    muted: bool,
    stored_volume: Option<f32>,
}

impl Default for DistanceMute {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl DistanceMute {
    pub fn new(max_distance: f32) -> Self {
        Self {
            max_distance: max_distance.max(0.0),
            muted: false,
            stored_volume: None,
        }
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    pub fn set_max_distance(&mut self, distance: f32) {
        self.max_distance = distance.max(0.0);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Volume to restore when unmuted, if currently muted.
    pub fn stored_volume(&self) -> Option<f32> {
        self.stored_volume.filter(|_| self.muted)
    }

    /// Replaces the volume that will be restored on unmute. No effect when not muted.
    pub fn store_volume(&mut self, volume: f32) {
        if self.muted {
            self.stored_volume = Some(volume);
        }
    }

    pub fn evaluate(&mut self, position: Vec3, listener: Vec3, current_volume: f32) -> MuteChange {
        let distance = position.distance(listener);

        if distance > self.max_distance {
            if self.muted {
                return MuteChange::Unchanged;
            }
            self.stored_volume = Some(current_volume);
            self.muted = true;
            MuteChange::Muted
        } else if self.muted {
            self.muted = false;
            match self.stored_volume.take() {
                Some(volume) => MuteChange::Restored(volume),
                None => MuteChange::Restored(current_volume),
            }
        } else {
            MuteChange::Unchanged
        }
    }
}
