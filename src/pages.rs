//! The ordered page list and the external page-UI contract.
//!
//! Pages are fixed at startup; the current index is the only mutable piece
//! of viewer-global state. Navigation is defensive: scrolling past either
//! end and selecting an out-of-range index are no-ops, never errors.

use std::path::{Path, PathBuf};

/// One selectable page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub label: String,
    pub image_path: PathBuf,
}

/// The ordered, immutable page list plus the current selection.
#[derive(Debug, Clone)]
pub struct PageSet {
    pages: Vec<Page>,
    current: usize,
}

impl PageSet {
    /// Build the page list. Each label maps to `<images_dir>/<label>.png`.
    pub fn new<I, S>(labels: I, images_dir: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| {
                let label = label.into();
                let image_path = images_dir.join(format!("{label}.png"));
                Page {
                    index,
                    label,
                    image_path,
                }
            })
            .collect();
        Self { pages, current: 0 }
    }

    /// Number of pages.
    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Index of the current page.
    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    /// The page at `index`, if in range.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// The currently selected page, if any pages exist.
    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current)
    }

    /// Step one page for a scroll of `delta` (positive scrolls up, toward
    /// earlier pages). Returns the new selection and whether the user
    /// arrived from below, or `None` when clamped at either end.
    pub fn scroll(&mut self, delta: f32) -> Option<(usize, bool)> {
        if delta > 0.0 && self.current > 0 {
            self.current -= 1;
            Some((self.current, false))
        } else if delta < 0.0 && self.current + 1 < self.pages.len() {
            self.current += 1;
            Some((self.current, true))
        } else {
            None
        }
    }

    /// Jump directly to `index`. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> Option<&Page> {
        if index >= self.pages.len() {
            return None;
        }
        self.current = index;
        self.pages.get(index)
    }
}

/// Callbacks into the external text/slider UI.
///
/// The viewer invokes these only while the camera is not busy; the
/// implementation is free to drive whatever presentation it likes off
/// them.
pub trait PageView {
    /// A page was selected, either by scroll or by a direct jump.
    /// `arrived_from_below` is true when the user scrolled forward into it.
    fn on_select(&mut self, index: usize, arrived_from_below: bool) {
        let _ = (index, arrived_from_below);
    }

    /// The current selection was dismissed without picking another page.
    fn on_deselect(&mut self) {}
}

/// Default page view: logs selection changes.
#[derive(Debug, Default)]
pub struct LogPageView;

impl PageView for LogPageView {
    fn on_select(&mut self, index: usize, arrived_from_below: bool) {
        log::info!("page {} selected (from_below: {})", index, arrived_from_below);
    }

    fn on_deselect(&mut self) {
        log::info!("page deselected");
    }
}
