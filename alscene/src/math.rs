//! Math types for alscene

pub use glam::{Quat, Vec3};

/// Listener or source placement: a position plus a rotation.
///
/// Conventions follow OpenAL: right-handed, `-Z` forward, `+Y` up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Builds a pose from yaw/pitch angles in degrees.
    pub fn from_angles(position: Vec3, horizontal_deg: f32, vertical_deg: f32) -> Self {
        Self {
            position,
            rotation: orientation_from_angles(horizontal_deg, vertical_deg),
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * (-Vec3::Z)
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Yaw about `+Y` then pitch about the local `+X`, both in degrees.
///
/// A horizontal angle of 0 faces `-Z`; 90 faces `-X` (counter-clockwise seen from above).
pub fn orientation_from_angles(horizontal_deg: f32, vertical_deg: f32) -> Quat {
    let yaw = Quat::from_rotation_y(horizontal_deg.to_radians());
    let pitch = Quat::from_rotation_x(vertical_deg.to_radians());
    (yaw * pitch).normalize()
}
