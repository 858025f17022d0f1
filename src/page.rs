//! Headless in-memory document implementing [`Viewport`]

use crate::error::ViewportError;
use crate::types::Position;
use crate::viewport::{ElementId, Rect, ScrollBehavior, ScrollBlock, Viewport};
use regex::Regex;
use std::sync::OnceLock;

/// An element laid out in document coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct PageElement {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub text: String,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl PageElement {
    pub fn new(tag: &str, top: f64, height: f64) -> Self {
        Self {
            tag: tag.to_lowercase(),
            id: None,
            classes: Vec::new(),
            text: String::new(),
            top,
            left: 0.0,
            width: 0.0,
            height,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

/// Simple selector: optional tag (or `*`), optional `#id`, any `.class`es
#[derive(Debug)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl SimpleSelector {
    fn parse(raw: &str) -> Result<Self, ViewportError> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^(?P<tag>\*|[a-zA-Z][a-zA-Z0-9-]*)?(?:#(?P<id>[\w-]+))?(?P<classes>(?:\.[\w-]+)*)$")
                .expect("Invalid regex pattern")
        });

        let raw = raw.trim();
        let caps = match pattern.captures(raw) {
            Some(caps) if !raw.is_empty() => caps,
            _ => return Err(ViewportError::InvalidSelector(raw.to_string())),
        };

        let tag = caps
            .name("tag")
            .map(|m| m.as_str().to_lowercase())
            .filter(|t| t.as_str() != "*");
        let id = caps.name("id").map(|m| m.as_str().to_string());
        let classes = caps
            .name("classes")
            .map(|m| {
                m.as_str()
                    .split('.')
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { tag, id, classes })
    }

    fn matches(&self, element: &PageElement) -> bool {
        if let Some(tag) = &self.tag {
            if &element.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id.as_ref() != Some(id) {
                return false;
            }
        }
        self.classes.iter().all(|c| element.classes.contains(c))
    }
}

fn parse_selector_list(selector: &str) -> Result<Vec<SimpleSelector>, ViewportError> {
    selector.split(',').map(SimpleSelector::parse).collect()
}

/// A document held entirely in memory
///
/// Scrolling is applied immediately regardless of behavior and clamped to
/// the document extents, the same way a browser clamps `scrollTo`.
#[derive(Debug, Clone)]
pub struct InMemoryPage {
    viewport: (f64, f64),
    document: (f64, f64),
    position: Position,
    elements: Vec<PageElement>,
    scroll_calls: usize,
}

impl InMemoryPage {
    pub fn new(viewport_width: f64, viewport_height: f64, doc_width: f64, doc_height: f64) -> Self {
        Self {
            viewport: (viewport_width, viewport_height),
            document: (doc_width, doc_height),
            position: Position::default(),
            elements: Vec::new(),
            scroll_calls: 0,
        }
    }

    /// Append an element; ids follow insertion (document) order
    pub fn add_element(&mut self, element: PageElement) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() as u64 - 1)
    }

    pub fn with_element(mut self, element: PageElement) -> Self {
        self.add_element(element);
        self
    }

    pub fn set_document_size(&mut self, width: f64, height: f64) {
        self.document = (width, height);
        self.position = self.clamp(self.position.x, self.position.y);
    }

    /// Move the view without counting it as an engine scroll (user input)
    pub fn set_scroll_position(&mut self, x: f64, y: f64) {
        self.position = self.clamp(x, y);
    }

    /// Number of scroll operations applied through the [`Viewport`] trait
    pub fn scroll_calls(&self) -> usize {
        self.scroll_calls
    }

    fn clamp(&self, x: f64, y: f64) -> Position {
        let max = self.max_scroll();
        Position::new(x.clamp(0.0, max.x), y.clamp(0.0, max.y))
    }

    fn element(&self, element: ElementId) -> Result<&PageElement, ViewportError> {
        self.elements
            .get(element.0 as usize)
            .ok_or(ViewportError::Detached(element.0))
    }
}

impl Viewport for InMemoryPage {
    fn scroll_position(&self) -> Position {
        self.position
    }

    fn scroll_size(&self) -> (f64, f64) {
        self.document
    }

    fn viewport_size(&self) -> (f64, f64) {
        self.viewport
    }

    fn scroll_by(&mut self, dx: f64, dy: f64, _behavior: ScrollBehavior) -> Result<(), ViewportError> {
        self.scroll_calls += 1;
        self.position = self.clamp(self.position.x + dx, self.position.y + dy);
        Ok(())
    }

    fn scroll_to(&mut self, x: f64, y: f64, _behavior: ScrollBehavior) -> Result<(), ViewportError> {
        self.scroll_calls += 1;
        self.position = self.clamp(x, y);
        Ok(())
    }

    fn query_selector(&self, selector: &str) -> Result<Option<ElementId>, ViewportError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>, ViewportError> {
        let selectors = parse_selector_list(selector)?;
        Ok(self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| selectors.iter().any(|s| s.matches(el)))
            .map(|(i, _)| ElementId(i as u64))
            .collect())
    }

    fn text_content(&self, element: ElementId) -> Option<String> {
        self.element(element)
            .ok()
            .map(|el| el.text.clone())
            .filter(|t| !t.is_empty())
    }

    fn bounding_rect(&self, element: ElementId) -> Result<Rect, ViewportError> {
        let el = self.element(element)?;
        Ok(Rect::new(
            el.top - self.position.y,
            el.left - self.position.x,
            el.width,
            el.height,
        ))
    }

    fn scroll_into_view(
        &mut self,
        element: ElementId,
        block: ScrollBlock,
        _behavior: ScrollBehavior,
    ) -> Result<(), ViewportError> {
        let el = self.element(element)?;
        let y = match block {
            ScrollBlock::Start => el.top,
            ScrollBlock::Center => el.top - (self.viewport.1 - el.height) / 2.0,
        };
        let x = self.position.x;
        self.scroll_calls += 1;
        self.position = self.clamp(x, y);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> InMemoryPage {
        InMemoryPage::new(800.0, 1000.0, 800.0, 5000.0)
            .with_element(PageElement::new("h1", 0.0, 60.0).with_text("Welcome"))
            .with_element(PageElement::new("section", 1200.0, 800.0).with_id("pricing").with_class("section"))
            .with_element(PageElement::new("h2", 2500.0, 40.0).with_text("Frequently Asked Questions"))
    }

    #[test]
    fn test_scroll_clamps_to_extent() {
        let mut page = sample_page();
        page.scroll_by(0.0, -50.0, ScrollBehavior::Smooth).unwrap();
        assert_eq!(page.scroll_position().y, 0.0);
        page.scroll_to(0.0, 10_000.0, ScrollBehavior::Instant).unwrap();
        assert_eq!(page.scroll_position().y, 4000.0);
        assert_eq!(page.scroll_calls(), 2);
    }

    #[test]
    fn test_selector_lists() {
        let page = sample_page();
        assert_eq!(page.query_selector("#pricing").unwrap(), Some(ElementId(1)));
        assert_eq!(
            page.query_selector_all("h1, h2, .section").unwrap(),
            vec![ElementId(0), ElementId(1), ElementId(2)]
        );
        assert_eq!(page.query_selector_all("*").unwrap().len(), 3);
        assert_eq!(page.query_selector("article").unwrap(), None);
    }

    #[test]
    fn test_invalid_selector() {
        let page = sample_page();
        assert!(matches!(
            page.query_selector("50%"),
            Err(ViewportError::InvalidSelector(_))
        ));
        assert!(page.query_selector("pricing plans").is_err());
    }

    #[test]
    fn test_rect_is_viewport_relative() {
        let mut page = sample_page();
        page.set_scroll_position(0.0, 1000.0);
        let rect = page.bounding_rect(ElementId(1)).unwrap();
        assert_eq!(rect.top, 200.0);
        assert_eq!(rect.bottom(), 1000.0);
    }

    #[test]
    fn test_scroll_into_view_center() {
        let mut page = sample_page();
        page.scroll_into_view(ElementId(2), ScrollBlock::Center, ScrollBehavior::Smooth)
            .unwrap();
        assert_eq!(page.scroll_position().y, 2500.0 - 480.0);
    }
}
