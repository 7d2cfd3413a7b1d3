//! Background image decoding.
//!
//! Decoding happens on a worker thread so the frame loop never blocks on
//! disk or codec work. Completions come back over a channel polled once per
//! frame. Every request carries a generation counter and only the most
//! recently started request is ever delivered; a completion for a
//! superseded request is dropped, so rapid page switches cannot apply a
//! stale image out of order.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::error::DecodeError;
use crate::pixels::PixelField;

struct Completion {
    generation: u64,
    page: usize,
    result: Result<PixelField, DecodeError>,
}

/// Spawns decode jobs and hands back only the latest finished one.
pub struct ImageLoader {
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    generation: u64,
    max_dimension: u32,
}

impl ImageLoader {
    /// Create a loader. `max_dimension` is forwarded to
    /// [`PixelField::decode`] for every request.
    pub fn new(max_dimension: u32) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        Self {
            tx,
            rx,
            generation: 0,
            max_dimension,
        }
    }

    /// Start decoding `path` for `page`, superseding any request still in
    /// flight.
    pub fn request(&mut self, page: usize, path: PathBuf) {
        self.generation += 1;
        let generation = self.generation;
        let max_dimension = self.max_dimension;
        let tx = self.tx.clone();

        log::info!("loading image {} for page {}", path.display(), page);
        thread::spawn(move || {
            let result = PixelField::decode(&path, max_dimension);
            // A closed receiver just means the viewer is shutting down.
            let _ = tx.send(Completion {
                generation,
                page,
                result,
            });
        });
    }

    /// The finished decode for the latest request, if it has completed
    /// since the last poll. Completions of superseded requests are
    /// discarded.
    pub fn poll(&mut self) -> Option<(usize, Result<PixelField, DecodeError>)> {
        let mut latest = None;
        while let Ok(done) = self.rx.try_recv() {
            if done.generation == self.generation {
                latest = Some((done.page, done.result));
            } else {
                log::debug!("discarding stale decode result for page {}", done.page);
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn write_test_png(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let data: Vec<u8> = (0..4 * 4).flat_map(|_| [40u8, 40, 40, 255]).collect();
        image::save_buffer(&path, &data, 4, 4, image::ExtendedColorType::Rgba8).unwrap();
        path
    }

    fn poll_until(loader: &mut ImageLoader) -> (usize, Result<PixelField, DecodeError>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(done) = loader.poll() {
                return done;
            }
            assert!(Instant::now() < deadline, "decode never completed");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_decode_completes() {
        let path = write_test_png("dotfield_loader_single.png");
        let mut loader = ImageLoader::new(0);
        loader.request(0, path);

        let (page, result) = poll_until(&mut loader);
        assert_eq!(page, 0);
        let field = result.unwrap();
        assert_eq!((field.width(), field.height()), (4, 4));
        assert_eq!(field.visible_pixel_count(), 16);
    }

    #[test]
    fn test_missing_file_reports_error() {
        let mut loader = ImageLoader::new(0);
        loader.request(3, PathBuf::from("/nonexistent/nope.png"));

        let (page, result) = poll_until(&mut loader);
        assert_eq!(page, 3);
        assert!(result.is_err());
    }

    #[test]
    fn test_only_latest_request_is_delivered() {
        let path_a = write_test_png("dotfield_loader_a.png");
        let path_b = write_test_png("dotfield_loader_b.png");

        let mut loader = ImageLoader::new(0);
        loader.request(0, path_a);
        loader.request(1, path_b);

        // Whatever order the two decodes finish in, only page 1 may come out.
        let (page, result) = poll_until(&mut loader);
        assert_eq!(page, 1);
        assert!(result.is_ok());

        // Give the stale completion time to arrive, then confirm it is dropped.
        thread::sleep(Duration::from_millis(50));
        assert!(loader.poll().is_none());
    }
}
