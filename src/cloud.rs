//! Point-field geometry and depth-drift simulation.
//!
//! Every visible pixel of a [`PixelField`] becomes one point with a fixed
//! origin on the image plane, a fixed drift direction toward the camera
//! captured at build time, and a mutable current position that advances a
//! little further along that direction each tick. Points that drift past
//! the depth limit snap back to their origin, producing a perpetual flow
//! toward the viewer.
//!
//! The per-point render scale bakes brightness (darker pixels render
//! larger) and depth (the factor cancels against perspective when the
//! camera is at its home distance, so a flat image reads as a flat image).
//!
//! Ticking is only meaningful while the camera is away from its home
//! position; the caller gates it on [`CameraRig::is_at_home`] since the
//! motion is imperceptible at zero parallax.
//!
//! [`CameraRig::is_at_home`]: crate::camera::CameraRig::is_at_home

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;

use crate::pixels::PixelField;

/// World units between neighbouring pixel origins.
pub const PIXEL_SPACING: f32 = 2.8;

/// Depth past which a drifting point resets to its origin, and the upper
/// bound of the random initial spread.
pub const MAX_SPREAD: f32 = 490.0;

/// Divider applied to the per-tick drift step.
pub const SPEED_DIVIDER: f32 = 10.0;

/// Per-instance data uploaded to the renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DotInstance {
    pub position: [f32; 3],
    pub scale: f32,
}

/// One simulated point.
#[derive(Debug, Clone)]
struct PointRecord {
    /// Fixed origin on the image plane. Never changes after build.
    base: Vec3,
    /// Unit vector toward the camera position at build time.
    direction: Vec3,
    /// Advances each tick; snaps back to `base` past the depth limit.
    current: Vec3,
    /// Grayscale value of the source pixel.
    brightness: f32,
}

/// The point field derived from one decoded image.
pub struct PointCloud {
    points: Vec<PointRecord>,
    instances: Vec<DotInstance>,
    camera_base_z: f32,
    dot_size: f32,
}

impl PointCloud {
    /// Dot size scales with the viewport so portraits keep their weight on
    /// large displays.
    pub fn dot_size_for_height(viewport_height: u32) -> f32 {
        3.0 + viewport_height as f32 / 1000.0
    }

    /// Build a point field from the visible samples of `field`.
    ///
    /// `camera_position` is captured into each point's drift direction and
    /// does not re-track later camera motion. The initial depth of every
    /// point is drawn uniformly from `[1, MAX_SPREAD)` along its direction
    /// so the field shows depth immediately instead of starting coplanar.
    pub fn build(
        field: &PixelField,
        camera_position: Vec3,
        camera_base_z: f32,
        dot_size: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let half_w = field.width() as f32 * PIXEL_SPACING / 2.0;
        let half_h = field.height() as f32 * PIXEL_SPACING / 2.0;

        let mut points = Vec::with_capacity(field.visible_pixel_count());
        let mut instances = Vec::with_capacity(field.visible_pixel_count());

        for sample in field.visible() {
            let base = Vec3::new(
                sample.x as f32 * PIXEL_SPACING - half_w,
                -(sample.y as f32) * PIXEL_SPACING + half_h,
                0.0,
            );
            let direction = (camera_position - base).normalize();
            let spread = rng.gen_range(1.0..MAX_SPREAD);
            let current = base + direction * spread;

            instances.push(DotInstance {
                position: current.to_array(),
                scale: dot_scale(sample.brightness, current.z, dot_size, camera_base_z),
            });
            points.push(PointRecord {
                base,
                direction,
                current,
                brightness: sample.brightness,
            });
        }

        log::info!("point field built: {} points", points.len());

        Self {
            points,
            instances,
            camera_base_z,
            dot_size,
        }
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the field holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// GPU-ready instance records, refreshed by [`Self::tick`] and
    /// [`Self::set_dot_size`].
    #[inline]
    pub fn instances(&self) -> &[DotInstance] {
        &self.instances
    }

    /// Fixed origin of point `index`.
    pub fn base_position(&self, index: usize) -> Vec3 {
        self.points[index].base
    }

    /// Current simulated position of point `index`.
    pub fn current_position(&self, index: usize) -> Vec3 {
        self.points[index].current
    }

    /// Advance every point one simulation step.
    ///
    /// Points closer to the camera move faster (amplifying parallax). A
    /// point whose depth already exceeds [`MAX_SPREAD`] snaps back to its
    /// origin exactly instead of advancing, so no point stays past the
    /// limit for more than one tick.
    pub fn tick(&mut self, camera_position: Vec3) {
        let dot_size = self.dot_size;
        let camera_base_z = self.camera_base_z;

        for (point, instance) in self.points.iter_mut().zip(self.instances.iter_mut()) {
            if point.current.z > MAX_SPREAD {
                point.current = point.base;
            } else {
                let speed = 1.0 + camera_position.distance(point.current) * 0.01;
                point.current += point.direction / SPEED_DIVIDER * speed;
            }

            instance.position = point.current.to_array();
            instance.scale = dot_scale(point.brightness, point.current.z, dot_size, camera_base_z);
        }
    }

    /// Recompute every instance scale for a new dot size (viewport resize).
    pub fn set_dot_size(&mut self, dot_size: f32) {
        self.dot_size = dot_size;
        for (point, instance) in self.points.iter().zip(self.instances.iter_mut()) {
            instance.scale = dot_scale(
                point.brightness,
                point.current.z,
                dot_size,
                self.camera_base_z,
            );
        }
    }
}

/// Render scale of a dot: darker pixels larger, scaled down with depth so
/// that perspective enlargement cancels at the camera's home distance.
fn dot_scale(brightness: f32, z: f32, dot_size: f32, camera_base_z: f32) -> f32 {
    (255.0 - brightness) * dot_size / 255.0 * ((camera_base_z - z) * dot_size / camera_base_z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraRig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn home() -> Vec3 {
        Vec3::new(0.0, CameraRig::BASE_Y, CameraRig::BASE_Z)
    }

    /// 2x2 field: three visible pixels, one transparent.
    fn small_field() -> PixelField {
        let data: Vec<u8> = [
            [0u8, 0, 0, 255],
            [100, 100, 100, 255],
            [200, 200, 200, 255],
            [0, 0, 0, 0],
        ]
        .iter()
        .flatten()
        .copied()
        .collect();
        PixelField::from_rgba(&data, 2, 2)
    }

    fn build(field: &PixelField) -> PointCloud {
        let mut rng = SmallRng::seed_from_u64(7);
        PointCloud::build(field, home(), CameraRig::BASE_Z, 3.7, &mut rng)
    }

    #[test]
    fn test_one_point_per_visible_pixel() {
        let field = small_field();
        let cloud = build(&field);
        assert_eq!(cloud.len(), field.visible_pixel_count());
        assert_eq!(cloud.instances().len(), 3);
    }

    #[test]
    fn test_base_positions_centered_on_origin() {
        let field = small_field();
        let cloud = build(&field);

        // 2x2 grid: x in {-2.8, 0}, y in {2.8, 0}, symmetric about the origin.
        assert_eq!(cloud.base_position(0), Vec3::new(-2.8, 2.8, 0.0));
        assert_eq!(cloud.base_position(1), Vec3::new(0.0, 2.8, 0.0));
        assert_eq!(cloud.base_position(2), Vec3::new(-2.8, 0.0, 0.0));
        for i in 0..cloud.len() {
            assert_eq!(cloud.base_position(i).z, 0.0);
        }
    }

    #[test]
    fn test_initial_spread_within_bounds() {
        let field = small_field();
        let cloud = build(&field);
        for i in 0..cloud.len() {
            let offset = (cloud.current_position(i) - cloud.base_position(i)).length();
            assert!(offset >= 1.0 - 1e-4);
            assert!(offset < MAX_SPREAD);
        }
    }

    #[test]
    fn test_tick_increases_depth_monotonically() {
        let field = small_field();
        let mut cloud = build(&field);
        let away = Vec3::new(0.0, 0.0, 100.0);

        let mut previous: Vec<f32> = (0..cloud.len()).map(|i| cloud.current_position(i).z).collect();
        for _ in 0..50 {
            cloud.tick(away);
            for (i, prev) in previous.iter_mut().enumerate() {
                let z = cloud.current_position(i).z;
                if *prev <= MAX_SPREAD {
                    // Drift directions point toward the camera's +z side.
                    assert!(z > *prev);
                }
                *prev = z;
            }
        }
    }

    #[test]
    fn test_point_past_limit_resets_to_exact_base() {
        let field = small_field();
        let mut cloud = build(&field);
        let away = Vec3::new(0.0, 0.0, 0.0);

        let bases: Vec<Vec3> = (0..cloud.len()).map(|i| cloud.base_position(i)).collect();
        let mut reset_seen = vec![false; cloud.len()];

        // Enough ticks for every point to cross the limit at least once.
        for _ in 0..30_000 {
            let before: Vec<f32> = (0..cloud.len()).map(|i| cloud.current_position(i).z).collect();
            cloud.tick(away);
            for i in 0..cloud.len() {
                if before[i] > MAX_SPREAD {
                    // Bit-for-bit snap back, all three axes.
                    assert_eq!(cloud.current_position(i), bases[i]);
                    reset_seen[i] = true;
                }
            }
            if reset_seen.iter().all(|&r| r) {
                break;
            }
        }
        assert!(reset_seen.iter().all(|&r| r), "some point never reset");
    }

    #[test]
    fn test_darker_points_render_larger() {
        let dark = dot_scale(0.0, 0.0, 3.7, CameraRig::BASE_Z);
        let light = dot_scale(200.0, 0.0, 3.7, CameraRig::BASE_Z);
        assert!(dark > light);
        assert!(light > 0.0);
    }

    #[test]
    fn test_scale_shrinks_with_depth() {
        let near_plane = dot_scale(100.0, 0.0, 3.7, CameraRig::BASE_Z);
        let toward_camera = dot_scale(100.0, 400.0, 3.7, CameraRig::BASE_Z);
        assert!(toward_camera < near_plane);
    }

    #[test]
    fn test_set_dot_size_rescales_instances() {
        let field = small_field();
        let mut cloud = build(&field);
        let before: Vec<f32> = cloud.instances().iter().map(|i| i.scale).collect();
        cloud.set_dot_size(PointCloud::dot_size_for_height(2000));
        for (instance, old) in cloud.instances().iter().zip(before) {
            assert!(instance.scale > old);
        }
    }

    #[test]
    fn test_dot_size_tracks_viewport_height() {
        assert_eq!(PointCloud::dot_size_for_height(1000), 4.0);
        assert!(PointCloud::dot_size_for_height(720) < PointCloud::dot_size_for_height(2160));
    }
}
