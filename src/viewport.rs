//! Document view abstraction the scroll engine drives

use crate::error::ViewportError;
use crate::types::Position;

/// Opaque handle to an element in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Element box relative to the viewport, like `getBoundingClientRect`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

impl ScrollBehavior {
    pub fn from_smooth(smooth: bool) -> Self {
        if smooth {
            ScrollBehavior::Smooth
        } else {
            ScrollBehavior::Instant
        }
    }
}

/// Vertical alignment for `scroll_into_view`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBlock {
    Start,
    Center,
}

/// The live page: scroll position, extents and element lookup
///
/// Browser hosts implement this over `window`/`document`; [`InMemoryPage`]
/// implements it headlessly.
///
/// [`InMemoryPage`]: crate::page::InMemoryPage
pub trait Viewport {
    fn scroll_position(&self) -> Position;

    /// Full document width and height
    fn scroll_size(&self) -> (f64, f64);

    /// Visible viewport width and height
    fn viewport_size(&self) -> (f64, f64);

    fn scroll_by(&mut self, dx: f64, dy: f64, behavior: ScrollBehavior) -> Result<(), ViewportError>;

    fn scroll_to(&mut self, x: f64, y: f64, behavior: ScrollBehavior) -> Result<(), ViewportError>;

    /// First element matching `selector`, in document order
    fn query_selector(&self, selector: &str) -> Result<Option<ElementId>, ViewportError>;

    /// Every element matching `selector`, in document order
    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>, ViewportError>;

    /// Visible text owned by the element
    fn text_content(&self, element: ElementId) -> Option<String>;

    fn bounding_rect(&self, element: ElementId) -> Result<Rect, ViewportError>;

    fn scroll_into_view(
        &mut self,
        element: ElementId,
        block: ScrollBlock,
        behavior: ScrollBehavior,
    ) -> Result<(), ViewportError>;

    /// Largest reachable scroll offsets on each axis
    fn max_scroll(&self) -> Position {
        let (width, height) = self.scroll_size();
        let (view_width, view_height) = self.viewport_size();
        Position::new((width - view_width).max(0.0), (height - view_height).max(0.0))
    }
}
