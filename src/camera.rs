//! Camera pose, orbit input and tween-based choreography.
//!
//! The rig owns the camera transform (position + Euler rotation), its
//! constant home pose, and the scheduled tweens that move it. Two
//! choreographies exist: a quick recenter back to home, and the page fly-in
//! that teleports the camera inside the point field and glides it home,
//! finishing with a small positional jitter so the camera never rests at a
//! perfectly static point.
//!
//! While any choreography is in flight the rig is `busy`: orbit input and
//! new navigation are rejected until the final tween (jitter included)
//! completes.

use std::time::{Duration, Instant};

use glam::{EulerRot, Mat4, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::tween::{Channel, Easing, Timeline, Tween};

const DURATION_QUICK: Duration = Duration::from_millis(300);
const DURATION_LONG: Duration = Duration::from_millis(1500);

/// Radians of orbit per pixel of drag.
const ROTATE_SPEED: f32 = 0.0005;

/// Keeps the orbit away from the poles where the look-at basis degenerates.
const PITCH_LIMIT: f32 = 1.5;

/// Which choreography the active tween sequence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choreography {
    Idle,
    Recenter,
    FlyIn,
    Jitter,
}

/// Camera transform state plus its programmed transitions.
pub struct CameraRig {
    position: Vec3,
    /// Euler angles (XYZ order), identity at home.
    rotation: Vec3,
    base_position: Vec3,
    base_rotation: Vec3,
    busy: bool,
    timeline: Timeline,
    choreography: Choreography,
    rng: SmallRng,
}

impl CameraRig {
    /// Home distance of the camera from the image plane.
    pub const BASE_Z: f32 = 501.0;
    /// Home height of the camera (and of the orbit target).
    pub const BASE_Y: f32 = -50.0;
    /// Fixed look-at target for orbit input.
    pub const TARGET: Vec3 = Vec3::new(0.0, Self::BASE_Y, 0.0);

    const FOV_Y: f32 = 60.0;
    const NEAR: f32 = 1.0;
    const FAR: f32 = 10000.0;

    /// Create the rig at its home pose.
    pub fn new() -> Self {
        let base_position = Vec3::new(0.0, Self::BASE_Y, Self::BASE_Z);
        Self {
            position: base_position,
            rotation: Vec3::ZERO,
            base_position,
            base_rotation: Vec3::ZERO,
            busy: false,
            timeline: Timeline::new(),
            choreography: Choreography::Idle,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Current world position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current rotation as XYZ Euler angles.
    #[inline]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// The constant home position.
    #[inline]
    pub fn base_position(&self) -> Vec3 {
        self.base_position
    }

    /// Whether a programmed transition is in flight. Input and navigation
    /// are rejected while true.
    #[inline]
    pub fn busy(&self) -> bool {
        self.busy
    }

    /// Exact equality with the home position. Used to gate the point-field
    /// simulation: at zero parallax the drift is imperceptible, so the
    /// field is frozen whenever this holds.
    #[inline]
    pub fn is_at_home(&self) -> bool {
        self.position == self.base_position
    }

    /// Place the camera at `position` immediately, without animating.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Animate back to the home pose over the quick duration.
    ///
    /// No-op when the position is already home and (if `reset_rotation`)
    /// the rotation matches too. On completion the position is snapped
    /// exactly to home, cancelling any residual offset left by orbit drag.
    pub fn recenter(&mut self, reset_rotation: bool, now: Instant) {
        if self.position == self.base_position
            && (!reset_rotation || self.rotation == self.base_rotation)
        {
            return;
        }
        if reset_rotation {
            self.rotation = self.base_rotation;
        }
        self.tween_to_home(DURATION_QUICK, Choreography::Recenter, now);
    }

    /// Teleport to `from` and glide back home over the long duration.
    ///
    /// Used on page changes to drop the camera inside the freshly built
    /// point field. Once home is reached, a secondary half-duration tween
    /// shifts the resting point by a small random amount on x and y.
    pub fn fly_from(&mut self, from: Vec3, reset_rotation: bool, now: Instant) {
        if reset_rotation {
            self.rotation = self.base_rotation;
        }
        self.position = from;
        self.tween_to_home(DURATION_LONG, Choreography::FlyIn, now);
    }

    fn tween_to_home(&mut self, duration: Duration, choreography: Choreography, now: Instant) {
        self.busy = true;
        self.timeline.clear();
        self.timeline.push(Tween::new(
            Channel::Position,
            self.position,
            self.base_position,
            now,
            duration,
            Easing::QuadOut,
        ));
        self.timeline.push(Tween::new(
            Channel::Rotation,
            self.rotation,
            self.base_rotation,
            now,
            duration,
            Easing::QuadOut,
        ));
        self.choreography = choreography;
    }

    /// Advance scheduled tweens to `now`, applying their values and
    /// stepping the choreography when its position tween completes.
    pub fn update(&mut self, now: Instant) {
        if self.timeline.is_empty() {
            return;
        }

        let mut position_finished = false;
        for sample in self.timeline.update(now) {
            match sample.channel {
                Channel::Position => {
                    self.position = sample.value;
                    position_finished |= sample.finished;
                }
                Channel::Rotation => {
                    self.rotation = sample.value;
                }
            }
        }

        if position_finished {
            self.on_position_arrived(now);
        }
    }

    fn on_position_arrived(&mut self, now: Instant) {
        match self.choreography {
            Choreography::Recenter => {
                self.position = self.base_position;
                self.busy = false;
                self.choreography = Choreography::Idle;
            }
            Choreography::FlyIn => {
                // Small resting offset on x/y; depth stays exactly home.
                let shift = Vec3::new(
                    (self.rng.gen::<f32>() - 0.5) * 3.0,
                    (self.rng.gen::<f32>() - 0.5) * 3.0,
                    0.0,
                );
                self.timeline.push(Tween::new(
                    Channel::Position,
                    self.position,
                    self.base_position + shift,
                    now,
                    DURATION_LONG / 2,
                    Easing::QuadInOut,
                ));
                self.choreography = Choreography::Jitter;
            }
            Choreography::Jitter => {
                self.busy = false;
                self.choreography = Choreography::Idle;
            }
            Choreography::Idle => {}
        }
    }

    /// Orbit the camera around [`Self::TARGET`] in response to a drag of
    /// `(dx, dy)` pixels. Rotation only, no pan or zoom. Rejected while a
    /// choreography is in flight.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        if self.busy {
            return;
        }

        let offset = self.position - Self::TARGET;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let mut yaw = offset.x.atan2(offset.z);
        let mut pitch = (offset.y / radius).asin();
        yaw -= dx * ROTATE_SPEED;
        pitch = (pitch + dy * ROTATE_SPEED).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        self.position = Self::TARGET
            + radius
                * Vec3::new(
                    pitch.cos() * yaw.sin(),
                    pitch.sin(),
                    pitch.cos() * yaw.cos(),
                );
        self.rotation = look_at_euler(self.position, Self::TARGET);
    }

    /// View matrix for the current pose.
    pub fn view_matrix(&self) -> Mat4 {
        let world = Mat4::from_translation(self.position)
            * Mat4::from_euler(
                EulerRot::XYZ,
                self.rotation.x,
                self.rotation.y,
                self.rotation.z,
            );
        world.inverse()
    }

    /// Perspective projection for the given aspect ratio.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(Self::FOV_Y.to_radians(), aspect, Self::NEAR, Self::FAR)
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new()
    }
}

/// Euler angles (XYZ) of a camera at `eye` looking at `target`.
fn look_at_euler(eye: Vec3, target: Vec3) -> Vec3 {
    let view = Mat4::look_at_rh(eye, target, Vec3::Y);
    let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_starts_at_home() {
        let rig = CameraRig::new();
        assert!(rig.is_at_home());
        assert!(!rig.busy());
        assert_eq!(rig.position(), Vec3::new(0.0, -50.0, 501.0));
        assert_eq!(rig.rotation(), Vec3::ZERO);
    }

    #[test]
    fn test_recenter_at_home_is_noop() {
        let mut rig = CameraRig::new();
        let t0 = Instant::now();
        rig.recenter(true, t0);
        assert!(!rig.busy());
        rig.update(t0 + ms(500));
        assert!(rig.is_at_home());
    }

    #[test]
    fn test_recenter_snaps_exactly_home() {
        let mut rig = CameraRig::new();
        let t0 = Instant::now();
        rig.set_position(Vec3::new(17.0, 3.0, 480.0));
        rig.recenter(false, t0);
        assert!(rig.busy());

        rig.update(t0 + ms(150));
        assert!(rig.busy());
        assert!(!rig.is_at_home());

        rig.update(t0 + ms(300));
        assert!(!rig.busy());
        assert!(rig.is_at_home());
        assert_eq!(rig.position(), rig.base_position());
    }

    #[test]
    fn test_fly_from_busy_through_jitter() {
        let mut rig = CameraRig::new();
        let t0 = Instant::now();
        rig.fly_from(Vec3::ZERO, true, t0);
        assert!(rig.busy());
        assert_eq!(rig.position(), Vec3::ZERO);

        // Main glide: still busy right up to arrival.
        rig.update(t0 + ms(1000));
        assert!(rig.busy());

        // Arrival at home starts the jitter sub-tween; busy persists.
        rig.update(t0 + ms(1500));
        assert!(rig.busy());
        assert_eq!(rig.position(), rig.base_position());

        rig.update(t0 + ms(2000));
        assert!(rig.busy());

        // Jitter done: idle, x/y within the shift range, z exactly home.
        rig.update(t0 + ms(2250));
        assert!(!rig.busy());
        let p = rig.position();
        let home = rig.base_position();
        assert!((p.x - home.x).abs() <= 1.5);
        assert!((p.y - home.y).abs() <= 1.5);
        assert_eq!(p.z, home.z);
    }

    #[test]
    fn test_new_sequence_cancels_previous() {
        let mut rig = CameraRig::new();
        let t0 = Instant::now();
        rig.fly_from(Vec3::ZERO, true, t0);
        rig.update(t0 + ms(200));
        let mid_flight = rig.position();

        // A second fly-in replaces the first entirely.
        rig.fly_from(Vec3::new(0.0, 0.0, 100.0), true, t0 + ms(200));
        assert_eq!(rig.position(), Vec3::new(0.0, 0.0, 100.0));
        assert!(rig.position() != mid_flight);
        assert!(rig.busy());

        rig.update(t0 + ms(200) + ms(1500));
        assert_eq!(rig.position(), rig.base_position());
    }

    #[test]
    fn test_orbit_rejected_while_busy() {
        let mut rig = CameraRig::new();
        let t0 = Instant::now();
        rig.fly_from(Vec3::ZERO, true, t0);
        let before = rig.position();
        rig.orbit(120.0, -40.0);
        assert_eq!(rig.position(), before);
    }

    #[test]
    fn test_orbit_keeps_distance_to_target() {
        let mut rig = CameraRig::new();
        let before = (rig.position() - CameraRig::TARGET).length();
        rig.orbit(250.0, 80.0);
        let after = (rig.position() - CameraRig::TARGET).length();
        assert!((before - after).abs() < 1e-3);
        assert!(!rig.is_at_home());
    }

    #[test]
    fn test_view_matrix_at_home_looks_at_target() {
        let rig = CameraRig::new();
        let view = rig.view_matrix();
        let target_view = view.transform_point3(CameraRig::TARGET);
        // The target sits straight ahead on the view -Z axis.
        assert!(target_view.x.abs() < 1e-4);
        assert!(target_view.y.abs() < 1e-4);
        assert!((target_view.z + CameraRig::BASE_Z).abs() < 1e-3);
    }
}
