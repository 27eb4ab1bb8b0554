use crate::math::{Pose, Vec3};
use parking_lot::RwLock;
use std::sync::Arc;

/// Last-known listener pose, shared between a scene and the sounds it creates.
///
/// Writes are last-write-wins. Sounds only read it, to evaluate distance muting.
#[derive(Debug, Clone, Default)]
pub struct Listener {
    pose: Arc<RwLock<Pose>>,
}

impl Listener {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose: Arc::new(RwLock::new(pose)),
        }
    }

    pub fn pose(&self) -> Pose {
        *self.pose.read()
    }

    pub fn position(&self) -> Vec3 {
        self.pose.read().position
    }

    pub fn set_pose(&self, pose: Pose) {
        *self.pose.write() = pose;
    }

    pub fn set_position(&self, position: Vec3) {
        self.pose.write().position = position;
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.pose.read().distance_to(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_pose() {
        let listener = Listener::default();
        let shared = listener.clone();

        listener.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(shared.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(shared.distance_to(Vec3::new(1.0, 2.0, 0.0)), 3.0);
    }
}
