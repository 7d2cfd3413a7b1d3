//! dotfield renders an image as an interactive 3D portrait of dots.
//!
//! Pages of images are decoded to a small grayscale grid; every visible
//! pixel becomes a dot placed on a plane, scaled by darkness. When a page
//! loads the camera flies in from the origin towards a home pose, and the
//! dots drift along their capture rays, wrapping back once they pass the
//! spread limit, so the portrait breathes indefinitely.
//!
//! The crate is usable as a library (the simulation modules carry no GPU
//! or windowing state) or through the [`Viewer`] builder, which owns the
//! window, the render loop, and input handling.
//!
//! ```no_run
//! use dotfield::Viewer;
//!
//! fn main() -> Result<(), dotfield::ViewerError> {
//!     Viewer::new()
//!         .with_pages(["0001", "0002", "0003"])
//!         .with_images_dir("images")
//!         .run()
//! }
//! ```

pub mod camera;
pub mod cloud;
pub mod error;
pub mod gpu;
pub mod loader;
pub mod pages;
pub mod pixels;
pub mod time;
pub mod tween;
pub mod viewer;

pub use camera::CameraRig;
pub use cloud::{DotInstance, PointCloud};
pub use error::{DecodeError, GpuError, ViewerError};
pub use loader::ImageLoader;
pub use pages::{Page, PageSet, PageView};
pub use pixels::PixelField;
pub use time::Time;
pub use viewer::Viewer;
