//! Click-to-move navigation.
//!
//! The navigator owns the pending destination and the arrival test. Movement
//! itself is deliberately simple: the character is turned toward the
//! destination once, on click, and then translates along its facing every
//! frame until its volume overlaps the destination volume.

use cgmath::{Quaternion, Rad, Rotation3, Vector3};

/// Half extents of the character's (invisible) collider box, 1 x 2 x 1.
pub const CHARACTER_HALF_EXTENTS: Vector3<f32> = Vector3::new(0.5, 1.0, 0.5);
/// Half extents of the destination trigger volume, 0.2 cubed.
pub const TARGET_HALF_EXTENTS: Vector3<f32> = Vector3::new(0.1, 0.1, 0.1);

/// Yaw-only rotation that turns the +z axis from `from` toward `to`,
/// ignoring the height difference.
pub fn face_towards(from: Vector3<f32>, to: Vector3<f32>) -> Quaternion<f32> {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    Quaternion::from_angle_y(Rad(dx.atan2(dz)))
}

/// An axis-aligned box, used for the arrival trigger.
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn centered(center: Vector3<f32>, half_extents: Vector3<f32>) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Outcome of one navigation step.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// No destination pending.
    Idle,
    /// Still under way; the character's new position.
    Moving(Vector3<f32>),
    /// The destination volume was entered this step; final position.
    /// The destination is cleared.
    Arrived(Vector3<f32>),
}

#[derive(Debug)]
pub struct Navigator {
    destination: Option<Vector3<f32>>,
    speed: f32,
}

impl Navigator {
    pub fn new(speed: f32) -> Self {
        Self {
            destination: None,
            speed,
        }
    }

    pub fn destination(&self) -> Option<Vector3<f32>> {
        self.destination
    }

    pub fn is_moving(&self) -> bool {
        self.destination.is_some()
    }

    /// Set (or replace) the destination. A re-click while moving simply
    /// re-targets.
    pub fn set_destination(&mut self, point: Vector3<f32>) {
        self.destination = Some(point);
    }

    /// Advance one step from `position` along `facing`.
    pub fn advance(&mut self, position: Vector3<f32>, facing: Quaternion<f32>, dt: f32) -> Step {
        let Some(destination) = self.destination else {
            return Step::Idle;
        };

        let next = position + facing * (Vector3::unit_z() * self.speed * dt);
        let character = Aabb::centered(next, CHARACTER_HALF_EXTENTS);
        let target = Aabb::centered(destination, TARGET_HALF_EXTENTS);
        if character.intersects(&target) {
            self.destination = None;
            Step::Arrived(next)
        } else {
            Step::Moving(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation};

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn face_towards_turns_plus_z_to_the_target() {
        let rot = face_towards(Vector3::new(0.0, 1.0, 0.0), Vector3::new(5.0, 0.0, 0.0));
        let forward = rot.rotate_vector(Vector3::unit_z());
        assert!((forward.x - 1.0).abs() < 1e-5);
        assert!(forward.z.abs() < 1e-5);
        // height difference never tilts the character
        assert!(forward.y.abs() < 1e-6);
    }

    #[test]
    fn face_towards_straight_ahead_is_identity() {
        let rot = face_towards(Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 0.0, 9.0));
        let forward = rot.rotate_vector(Vector3::unit_z());
        assert!((forward.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn without_destination_the_navigator_idles() {
        let mut nav = Navigator::new(4.0);
        let step = nav.advance(Vector3::new(0.0, 1.0, 0.0), Quaternion::from_angle_y(Deg(0.0)), DT);
        assert_eq!(step, Step::Idle);
    }

    #[test]
    fn walks_to_the_destination_and_arrives() {
        let mut nav = Navigator::new(4.0);
        let mut position = Vector3::new(0.0, 1.0, 0.0);
        let destination = Vector3::new(0.0, 0.0, 5.0);
        let facing = face_towards(position, destination);
        nav.set_destination(destination);

        let mut arrived = false;
        for _ in 0..1000 {
            match nav.advance(position, facing, DT) {
                Step::Moving(next) => position = next,
                Step::Arrived(next) => {
                    position = next;
                    arrived = true;
                    break;
                }
                Step::Idle => break,
            }
        }
        assert!(arrived, "character never reached the destination");
        // inside the combined trigger distance on z, height untouched
        assert!((position.z - 5.0).abs() < 0.7);
        assert!((position.y - 1.0).abs() < 1e-6);
        assert!(!nav.is_moving());
    }

    #[test]
    fn arrival_requires_the_volumes_to_overlap() {
        let character = Aabb::centered(Vector3::new(0.0, 1.0, 0.0), CHARACTER_HALF_EXTENTS);
        let near = Aabb::centered(Vector3::new(0.0, 0.0, 0.55), TARGET_HALF_EXTENTS);
        let far = Aabb::centered(Vector3::new(0.0, 0.0, 0.65), TARGET_HALF_EXTENTS);
        assert!(character.intersects(&near));
        assert!(!character.intersects(&far));
    }

    #[test]
    fn clicking_the_current_position_arrives_immediately() {
        let mut nav = Navigator::new(4.0);
        let position = Vector3::new(2.0, 1.0, 2.0);
        nav.set_destination(Vector3::new(2.0, 0.0, 2.0));
        let step = nav.advance(position, Quaternion::from_angle_y(Deg(0.0)), DT);
        assert!(matches!(step, Step::Arrived(_)));
    }

    #[test]
    fn reclick_retargets_without_stopping() {
        let mut nav = Navigator::new(4.0);
        nav.set_destination(Vector3::new(0.0, 0.0, 10.0));
        let position = Vector3::new(0.0, 1.0, 0.0);
        let facing = face_towards(position, Vector3::new(0.0, 0.0, 10.0));
        assert!(matches!(nav.advance(position, facing, DT), Step::Moving(_)));

        nav.set_destination(Vector3::new(10.0, 0.0, 0.0));
        assert!(nav.is_moving());
        assert_eq!(nav.destination(), Some(Vector3::new(10.0, 0.0, 0.0)));
    }
}
