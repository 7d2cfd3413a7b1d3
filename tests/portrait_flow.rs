//! End-to-end tests of the portrait pipeline, GPU-free: pixel fields,
//! point clouds, camera choreography, page navigation, and the image
//! loader, wired together the way the viewer wires them.

use std::path::Path;
use std::time::{Duration, Instant};

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use dotfield::{CameraRig, ImageLoader, PageSet, PixelField, PointCloud};

// ============================================================
// Fixtures
// ============================================================

/// A 4x4 RGBA gradient, dark at the top, with the last pixel transparent.
fn gradient_rgba() -> Vec<u8> {
    let mut data = Vec::with_capacity(4 * 4 * 4);
    for y in 0..4u8 {
        for x in 0..4u8 {
            let g = y * 70 + x * 5;
            let alpha = if (x, y) == (3, 3) { 0 } else { 255 };
            data.extend_from_slice(&[g, g, g, alpha]);
        }
    }
    data
}

fn home_camera() -> Vec3 {
    Vec3::new(0.0, CameraRig::BASE_Y, CameraRig::BASE_Z)
}

fn build_cloud(field: &PixelField, seed: u64) -> PointCloud {
    let mut rng = SmallRng::seed_from_u64(seed);
    PointCloud::build(field, home_camera(), CameraRig::BASE_Z, 3.5, &mut rng)
}

// ============================================================
// Pixel field -> point cloud
// ============================================================

#[test]
fn test_field_to_cloud_counts_and_scales() {
    let field = PixelField::from_rgba(&gradient_rgba(), 4, 4);
    // One pixel is transparent, the rest of the gradient stays at or below
    // the brightness threshold.
    assert_eq!(field.visible_pixel_count(), 15);

    let cloud = build_cloud(&field, 7);
    assert_eq!(cloud.len(), field.visible_pixel_count());
    for instance in cloud.instances() {
        assert!(instance.scale > 0.0);
    }
}

#[test]
fn test_instances_mirror_simulated_positions() {
    let field = PixelField::from_rgba(&gradient_rgba(), 4, 4);
    let mut cloud = build_cloud(&field, 7);
    cloud.tick(home_camera());

    for i in 0..cloud.len() {
        assert_eq!(cloud.instances()[i].position, cloud.current_position(i).to_array());
    }
}

#[test]
fn test_cloud_is_deterministic_per_seed() {
    let field = PixelField::from_rgba(&gradient_rgba(), 4, 4);
    let a = build_cloud(&field, 42);
    let b = build_cloud(&field, 42);
    for i in 0..a.len() {
        assert_eq!(a.current_position(i), b.current_position(i));
    }
}

// ============================================================
// Drift simulation driven by the camera
// ============================================================

#[test]
fn test_drift_advances_and_wraps() {
    let field = PixelField::from_rgba(&gradient_rgba(), 4, 4);
    let mut cloud = build_cloud(&field, 3);
    let camera = home_camera();

    let before = cloud.current_position(0).z;
    cloud.tick(camera);
    assert!(cloud.current_position(0).z > before);

    // Long enough for every point to cross the spread limit at least once.
    let mut wrapped = false;
    let mut prev = cloud.current_position(0).z;
    for _ in 0..30_000 {
        cloud.tick(camera);
        let z = cloud.current_position(0).z;
        if z < prev {
            // A wrap lands exactly back on the capture plane.
            assert_eq!(cloud.current_position(0), cloud.base_position(0));
            wrapped = true;
            break;
        }
        prev = z;
    }
    assert!(wrapped);
}

// ============================================================
// Camera choreography gating the simulation
// ============================================================

#[test]
fn test_fly_in_reaches_home_then_jitters_off_it() {
    let t0 = Instant::now();
    let mut camera = CameraRig::new();
    camera.set_position(home_camera());
    camera.fly_from(Vec3::ZERO, true, t0);
    assert!(camera.busy());
    assert!(!camera.is_at_home());

    // End of the flight: exactly home, still busy for the jitter move.
    camera.update(t0 + Duration::from_millis(1500));
    assert_eq!(camera.position(), home_camera());
    assert!(camera.busy());

    // After the jitter the camera rests near home but never exactly on it,
    // so the drift simulation keeps running.
    camera.update(t0 + Duration::from_millis(2250));
    assert!(!camera.busy());
    assert!(!camera.is_at_home());
    assert!((camera.position() - home_camera()).length() <= 3.0);
}

#[test]
fn test_recenter_restores_home_and_freezes_field() {
    let t0 = Instant::now();
    let mut camera = CameraRig::new();
    camera.set_position(Vec3::new(80.0, 10.0, 400.0));
    camera.recenter(true, t0);
    assert!(camera.busy());

    camera.update(t0 + Duration::from_millis(300));
    assert!(!camera.busy());
    assert!(camera.is_at_home());
    assert_eq!(camera.position(), home_camera());
}

#[test]
fn test_recenter_from_home_is_a_no_op() {
    let mut camera = CameraRig::new();
    camera.recenter(true, Instant::now());
    assert!(!camera.busy());
}

// ============================================================
// Page navigation feeding the loader
// ============================================================

fn temp_page_image(dir: &Path, label: &str) {
    let data = gradient_rgba();
    let path = dir.join(format!("{}.png", label));
    image::save_buffer(&path, &data, 4, 4, image::ExtendedColorType::Rgba8).unwrap();
}

fn poll_until(loader: &mut ImageLoader) -> (usize, PixelField) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some((page, result)) = loader.poll() {
            return (page, result.unwrap());
        }
        assert!(Instant::now() < deadline, "decode never completed");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_scroll_through_pages_loads_only_the_latest() {
    let dir = std::env::temp_dir().join("dotfield_flow_pages");
    std::fs::create_dir_all(&dir).unwrap();
    temp_page_image(&dir, "0001");
    temp_page_image(&dir, "0002");
    temp_page_image(&dir, "0003");

    let mut pages = PageSet::new(["0001", "0002", "0003"], &dir);
    let mut loader = ImageLoader::new(0);

    // Two quick scroll-downs: request both, only the second may arrive.
    let (first, from_below) = pages.scroll(-1.0).unwrap();
    assert!(from_below);
    loader.request(first, pages.page(first).unwrap().image_path.clone());

    let (second, _) = pages.scroll(-1.0).unwrap();
    loader.request(second, pages.page(second).unwrap().image_path.clone());

    let (page, field) = poll_until(&mut loader);
    assert_eq!(page, second);
    assert_eq!((field.width(), field.height()), (4, 4));
}

#[test]
fn test_scroll_clamps_at_both_ends() {
    let mut pages = PageSet::new(["a", "b"], Path::new("images"));
    assert!(pages.scroll(1.0).is_none()); // already at the first page
    assert_eq!(pages.scroll(-1.0), Some((1, true)));
    assert!(pages.scroll(-1.0).is_none()); // already at the last page
}

#[test]
fn test_loaded_field_builds_a_cloud_at_the_viewer_scale() {
    let dir = std::env::temp_dir().join("dotfield_flow_single");
    std::fs::create_dir_all(&dir).unwrap();
    temp_page_image(&dir, "0001");

    let mut loader = ImageLoader::new(100);
    loader.request(0, dir.join("0001.png"));
    let (_, field) = poll_until(&mut loader);

    let dot_size = PointCloud::dot_size_for_height(720);
    let mut rng = SmallRng::seed_from_u64(1);
    let cloud = PointCloud::build(&field, home_camera(), CameraRig::BASE_Z, dot_size, &mut rng);
    assert_eq!(cloud.len(), field.visible_pixel_count());
}
