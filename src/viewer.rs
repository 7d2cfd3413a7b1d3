//! The viewer: configuration builder and windowed frame loop.
//!
//! Use method chaining to configure, then call `.run()` to open the window.
//! The loop runs once per display refresh until the window closes; each
//! frame polls for finished image decodes, advances the camera tweens,
//! ticks the point field while the camera is away from home, and renders.
//!
//! Input wiring mirrors the portrait UI: vertical scroll paginates
//! (clamped at both ends), left-drag orbits the camera around the
//! portrait, the cursor leaving the window recenters the camera, digit
//! keys jump straight to a page (the slider-marker counterpart), and
//! Escape dismisses the selection overlay. Everything except closing the
//! window is rejected while a camera choreography is in flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::camera::CameraRig;
use crate::cloud::PointCloud;
use crate::error::ViewerError;
use crate::gpu::GpuState;
use crate::loader::ImageLoader;
use crate::pages::{LogPageView, PageSet, PageView};
use crate::time::Time;

/// Default longest side of decoded images, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 100;

/// A particle portrait viewer builder.
pub struct Viewer {
    labels: Vec<String>,
    images_dir: PathBuf,
    max_dimension: u32,
    title: String,
    page_view: Box<dyn PageView>,
}

impl Viewer {
    /// Create a viewer with default settings and no pages.
    pub fn new() -> Self {
        Self {
            labels: Vec::new(),
            images_dir: PathBuf::from("images"),
            max_dimension: DEFAULT_MAX_DIMENSION,
            title: "dotfield".to_string(),
            page_view: Box::new(LogPageView),
        }
    }

    /// Set the ordered page labels. Each label maps to
    /// `<images_dir>/<label>.png`.
    pub fn with_pages<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the directory page images are loaded from.
    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = dir.into();
        self
    }

    /// Set the longest side decoded images are resized to. Zero keeps the
    /// native size.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the page-UI callback implementation.
    pub fn with_page_view(mut self, view: impl PageView + 'static) -> Self {
        self.page_view = Box::new(view);
        self
    }

    /// Open the window and run. Blocks until the window is closed or
    /// startup fails.
    pub fn run(self) -> Result<(), ViewerError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;
        match app.startup_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    camera: CameraRig,
    cloud: Option<PointCloud>,
    pages: PageSet,
    page_view: Box<dyn PageView>,
    loader: ImageLoader,
    time: Time,
    rng: SmallRng,
    title: String,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    /// Set when window or GPU creation fails; reported by [`Viewer::run`]
    /// after the event loop exits.
    startup_error: Option<ViewerError>,
}

impl App {
    fn new(viewer: Viewer) -> Self {
        let pages = PageSet::new(viewer.labels, &viewer.images_dir);
        Self {
            window: None,
            gpu: None,
            camera: CameraRig::new(),
            cloud: None,
            pages,
            page_view: viewer.page_view,
            loader: ImageLoader::new(viewer.max_dimension),
            time: Time::new(),
            rng: SmallRng::from_entropy(),
            title: viewer.title,
            mouse_pressed: false,
            last_mouse_pos: None,
            startup_error: None,
        }
    }

    /// Request the image for the current page.
    fn load_current_page(&mut self) {
        if let Some(page) = self.pages.current_page() {
            let index = page.index;
            let path = page.image_path.clone();
            self.loader.request(index, path);
        }
    }

    /// Scroll navigation: one page per wheel step, gated on the camera.
    fn scroll_pages(&mut self, delta: f32) {
        if self.camera.busy() {
            return;
        }
        if let Some((index, from_below)) = self.pages.scroll(delta) {
            self.page_view.on_select(index, from_below);
            self.load_current_page();
        }
    }

    /// Direct jump navigation (digit keys / slider markers).
    fn jump_to_page(&mut self, index: usize) {
        if self.camera.busy() {
            return;
        }
        if self.pages.select(index).is_some() {
            self.page_view.on_select(index, false);
            self.load_current_page();
        }
    }

    /// Per-frame work: decode completion, choreography, simulation, render.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        self.time.update();

        if self.time.frame() % 30 == 0 {
            if let Some(window) = &self.window {
                window.set_title(&format!("{} | {:.0} fps", self.title, self.time.fps()));
            }
        }

        if let Some((page, result)) = self.loader.poll() {
            match result {
                Ok(field) => {
                    log::info!(
                        "page {} decoded: {}x{}, {} of {} pixels visible",
                        page,
                        field.width(),
                        field.height(),
                        field.visible_pixel_count(),
                        field.pixel_count()
                    );
                    self.rebuild_cloud(&field);
                    self.camera.fly_from(Vec3::ZERO, true, now);
                }
                Err(e) => {
                    // The previous page's field stays up; no retry.
                    log::warn!("image decode failed for page {}: {}", page, e);
                }
            }
        }

        self.camera.update(now);

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        // Frozen while the camera sits exactly at home; it won't move anyway.
        if !self.camera.is_at_home() {
            if let Some(cloud) = &mut self.cloud {
                cloud.tick(self.camera.position());
                gpu.write_instances(cloud.instances());
            }
        }

        let aspect = gpu.config.width as f32 / gpu.config.height as f32;
        let view = self.camera.view_matrix();
        let proj = self.camera.projection(aspect);
        match gpu.render(view, proj) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost) => gpu.resize(winit::dpi::PhysicalSize {
                width: gpu.config.width,
                height: gpu.config.height,
            }),
            Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
            Err(e) => eprintln!("Render error: {:?}", e),
        }
    }

    /// Discard the current point field and build one from `field`, with the
    /// camera parked at its home pose so drift directions are captured
    /// relative to it.
    fn rebuild_cloud(&mut self, field: &crate::pixels::PixelField) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        self.camera
            .set_position(Vec3::new(0.0, CameraRig::BASE_Y, CameraRig::BASE_Z));

        let dot_size = PointCloud::dot_size_for_height(gpu.config.height);
        let cloud = PointCloud::build(
            field,
            self.camera.position(),
            CameraRig::BASE_Z,
            dot_size,
            &mut self.rng,
        );
        gpu.replace_instances(cloud.instances());
        self.cloud = Some(cloud);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                self.startup_error = Some(ViewerError::Window(e));
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match pollster::block_on(GpuState::new(window)) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                log::error!("GPU initialization failed: {}", e);
                self.startup_error = Some(ViewerError::Gpu(e));
                event_loop.exit();
                return;
            }
        }

        self.load_current_page();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
                if let Some(cloud) = &mut self.cloud {
                    cloud.set_dot_size(PointCloud::dot_size_for_height(physical_size.height));
                    if let Some(gpu) = &mut self.gpu {
                        gpu.write_instances(cloud.instances());
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        self.camera.orbit(dx, dy);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_pressed = false;
                self.last_mouse_pos = None;
                if !self.camera.busy() {
                    self.camera.recenter(false, Instant::now());
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.scroll_pages(scroll);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.logical_key.as_ref() {
                    Key::Named(NamedKey::Escape) => {
                        if !self.camera.busy() {
                            self.page_view.on_deselect();
                        }
                    }
                    Key::Character(c) => {
                        // Digit keys jump to a page, 1-based like the slider.
                        if let Ok(n) = c.parse::<usize>() {
                            if n >= 1 {
                                self.jump_to_page(n - 1);
                            }
                        }
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
