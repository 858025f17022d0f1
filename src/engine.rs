//! Scroll automation engine
//!
//! A single engine instance owns the page's scroll position while it is
//! running. Single-shot and smart scrolls complete inside
//! [`ScrollEngine::execute_scroll_command`]; continuous scrolls return
//! immediately and are advanced by [`ScrollEngine::tick`], which a scheduler
//! (see [`crate::driver`]) or a test calls at [`ScrollEngine::next_deadline`].

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::ViewportError;
use crate::phrases::{PageMetrics, ScrollPhraseParser};
use crate::types::{Direction, Position, ScrollCommand, ScrollMode, ScrollResult};
use crate::viewport::{ElementId, Rect, ScrollBehavior, ScrollBlock, Viewport};
use ahash::AHashSet;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Element groups considered content sections by smart scrolling
const SECTION_SELECTORS: [&str; 3] = [
    "article, .article, .post, .content",
    "h1, h2, h3, h4, h5, h6",
    "section, .section",
];

/// Sub-pixel tolerance when deciding the view sits on an edge
const BOUNDARY_EPSILON: f64 = 1.0;

/// One entry of the scroll position history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub position: Position,
    pub timestamp: Instant,
}

#[derive(Debug, Clone, Copy)]
struct BoundaryCheck {
    due: Instant,
    before: Position,
}

#[derive(Debug, Clone)]
struct AutoScroll {
    direction: Direction,
    step: f64,
    interval: Duration,
    max_steps: u32,
    steps_taken: u32,
    next_step_at: Instant,
    pending_check: Option<BoundaryCheck>,
}

#[derive(Debug, Clone)]
enum EngineState {
    Idle,
    Running(AutoScroll),
}

enum Progress {
    Pending,
    Finished(ScrollResult),
}

pub struct ScrollEngine<V, C = SystemClock> {
    viewport: V,
    clock: C,
    config: EngineConfig,
    phrases: ScrollPhraseParser,
    state: EngineState,
    current_command: Option<ScrollCommand>,
    history: VecDeque<PositionSample>,
    session: u64,
}

impl<V: Viewport> ScrollEngine<V, SystemClock> {
    pub fn new(viewport: V, config: EngineConfig) -> Self {
        Self::with_clock(viewport, SystemClock, config)
    }
}

impl<V: Viewport, C: Clock> ScrollEngine<V, C> {
    pub fn with_clock(viewport: V, clock: C, config: EngineConfig) -> Self {
        info!("scroll engine initialized");
        Self {
            viewport,
            clock,
            history: VecDeque::with_capacity(config.history_capacity),
            config,
            phrases: ScrollPhraseParser::new(),
            state: EngineState::Idle,
            current_command: None,
            session: 0,
        }
    }

    /// Stop any running scroll and hand the viewport back
    pub fn dispose(mut self) -> V {
        self.stop_scrolling();
        debug!("scroll engine disposed");
        self.viewport
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Execute a scroll command, cancelling whatever was running
    ///
    /// Never fails: viewport errors come back as `success: false` with the
    /// engine left idle.
    pub fn execute_scroll_command(&mut self, command: ScrollCommand) -> ScrollResult {
        self.stop_scrolling();
        self.current_command = Some(command.clone());

        let outcome = match command.mode {
            ScrollMode::Single => self.basic_scroll(&command),
            ScrollMode::Continuous => self.start_auto_scroll(&command),
            ScrollMode::Smart => self.smart_scroll(&command),
        };

        match outcome {
            Ok(result) => {
                if !self.is_currently_scrolling() {
                    self.current_command = None;
                }
                result
            }
            Err(err) => {
                warn!(error = %err, mode = ?command.mode, "scroll command failed");
                self.stop_scrolling();
                ScrollResult::failed(format!("Scroll error: {}", err), self.viewport.scroll_position())
            }
        }
    }

    /// Cancel the running scroll, if any. Safe to call repeatedly.
    pub fn stop_scrolling(&mut self) {
        if let EngineState::Running(auto) = &self.state {
            debug!(steps = auto.steps_taken, "auto-scroll stopped");
        }
        self.state = EngineState::Idle;
        self.current_command = None;
    }

    pub fn is_currently_scrolling(&self) -> bool {
        matches!(self.state, EngineState::Running(_))
    }

    pub fn current_scroll_command(&self) -> Option<&ScrollCommand> {
        self.current_command.as_ref()
    }

    /// Identifies the most recent continuous scroll; bumps on every start
    pub fn session(&self) -> u64 {
        self.session
    }

    /// When the next `tick` has work to do, or `None` while idle
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            EngineState::Idle => None,
            EngineState::Running(auto) => Some(
                auto.pending_check
                    .map(|check| check.due)
                    .unwrap_or(auto.next_step_at),
            ),
        }
    }

    /// Advance a running continuous scroll
    ///
    /// Resolves a due boundary check, then performs a due step. A step never
    /// starts while the previous step's check is still pending. Returns the
    /// final result when the scroll finishes on this tick.
    pub fn tick(&mut self) -> Option<ScrollResult> {
        let now = self.clock.now();
        let mut auto = match std::mem::replace(&mut self.state, EngineState::Idle) {
            EngineState::Running(auto) => auto,
            EngineState::Idle => return None,
        };

        match self.advance(&mut auto, now) {
            Ok(Progress::Pending) => {
                self.state = EngineState::Running(auto);
                None
            }
            Ok(Progress::Finished(result)) => {
                self.current_command = None;
                Some(result)
            }
            Err(err) => {
                warn!(error = %err, "auto-scroll step failed");
                self.current_command = None;
                Some(ScrollResult::failed(
                    format!("Scroll error: {}", err),
                    self.viewport.scroll_position(),
                ))
            }
        }
    }

    pub fn scroll_to_percentage(&mut self, percentage: f64, smooth: bool) -> ScrollResult {
        self.stop_scrolling();
        let percentage = percentage.clamp(0.0, 100.0);
        let target = self.viewport.max_scroll().y * percentage / 100.0;
        let x = self.viewport.scroll_position().x;

        match self
            .viewport
            .scroll_to(x, target, ScrollBehavior::from_smooth(smooth))
        {
            Ok(()) => {
                self.record_scroll_event();
                ScrollResult::completed(
                    format!("Scrolled to {}% of page", percentage),
                    self.viewport.scroll_position(),
                )
            }
            Err(err) => ScrollResult::failed(
                format!("Scroll error: {}", err),
                self.viewport.scroll_position(),
            ),
        }
    }

    /// Vertical scroll progress in percent; 0 when nothing overflows
    pub fn scroll_percentage(&self) -> f64 {
        let max = self.viewport.max_scroll().y;
        if max > 0.0 {
            self.viewport.scroll_position().y / max * 100.0
        } else {
            0.0
        }
    }

    /// Translate a voice phrase against the current page state
    pub fn parse_scroll_command(&self, input: &str) -> Option<ScrollCommand> {
        let metrics = PageMetrics {
            percentage: self.scroll_percentage(),
            max_scroll_y: self.viewport.max_scroll().y,
        };
        self.phrases.parse(input, metrics, &self.config)
    }

    /// Append the current position to the history ring buffer
    ///
    /// Hosts call this for scroll events the engine did not cause.
    pub fn record_scroll_event(&mut self) {
        self.history.push_back(PositionSample {
            position: self.viewport.scroll_position(),
            timestamp: self.clock.now(),
        });
        while self.history.len() > self.config.history_capacity {
            self.history.pop_front();
        }
    }

    pub fn scroll_history(&self) -> Vec<PositionSample> {
        self.history.iter().copied().collect()
    }

    fn basic_scroll(&mut self, command: &ScrollCommand) -> Result<ScrollResult, ViewportError> {
        let amount = command.amount.unwrap_or(self.config.default_amount);
        let behavior = ScrollBehavior::from_smooth(command.smooth);
        let x = self.viewport.scroll_position().x;

        let message = match command.direction {
            Direction::Top => {
                self.viewport.scroll_to(x, 0.0, behavior)?;
                "Scrolled to top".to_string()
            }
            Direction::Bottom => {
                let bottom = self.viewport.max_scroll().y;
                self.viewport.scroll_to(x, bottom, behavior)?;
                "Scrolled to bottom".to_string()
            }
            direction => {
                let (dx, dy) = delta(direction, amount);
                self.viewport.scroll_by(dx, dy, behavior)?;
                format!("Scrolled {} by {}px", direction, amount)
            }
        };

        self.record_scroll_event();
        Ok(ScrollResult::completed(message, self.viewport.scroll_position()))
    }

    fn start_auto_scroll(&mut self, command: &ScrollCommand) -> Result<ScrollResult, ViewportError> {
        let direction = match command.direction {
            Direction::Top => Direction::Up,
            Direction::Bottom => Direction::Down,
            other => other,
        };
        let interval = command
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.config.interval())
            .max(Duration::from_millis(1));
        let now = self.clock.now();

        let mut auto = AutoScroll {
            direction,
            step: command.amount.unwrap_or(self.config.step_amount),
            interval,
            max_steps: command.max_steps.unwrap_or(self.config.max_steps).max(1),
            steps_taken: 0,
            next_step_at: now,
            pending_check: None,
        };

        self.session += 1;
        info!(
            direction = %direction,
            interval_ms = interval.as_millis() as u64,
            max_steps = auto.max_steps,
            session = self.session,
            "auto-scroll started"
        );

        // First step runs right away, the rest on the interval
        self.step(&mut auto, now)?;
        self.state = EngineState::Running(auto);

        Ok(ScrollResult::started(
            format!("Started auto-scrolling {}", direction),
            self.viewport.scroll_position(),
        ))
    }

    fn advance(&mut self, auto: &mut AutoScroll, now: Instant) -> Result<Progress, ViewportError> {
        if let Some(check) = auto.pending_check {
            if now < check.due {
                return Ok(Progress::Pending);
            }
            auto.pending_check = None;

            let position = self.viewport.scroll_position();
            if position == check.before && self.at_boundary(auto.direction, position) {
                info!(steps = auto.steps_taken, "auto-scroll reached the end");
                return Ok(Progress::Finished(ScrollResult::completed(
                    format!("Auto-scroll reached the end after {} scrolls.", auto.steps_taken),
                    position,
                )));
            }
            if auto.steps_taken >= auto.max_steps {
                info!(steps = auto.steps_taken, "auto-scroll hit step limit");
                return Ok(Progress::Finished(ScrollResult::completed(
                    format!("Auto-scroll completed. Scrolled {} times.", auto.steps_taken),
                    position,
                )));
            }
        }

        if now >= auto.next_step_at {
            self.step(auto, now)?;
        }
        Ok(Progress::Pending)
    }

    fn step(&mut self, auto: &mut AutoScroll, now: Instant) -> Result<(), ViewportError> {
        let before = self.viewport.scroll_position();
        let (dx, dy) = delta(auto.direction, auto.step);
        self.viewport.scroll_by(dx, dy, ScrollBehavior::Smooth)?;
        self.record_scroll_event();

        auto.steps_taken += 1;
        auto.pending_check = Some(BoundaryCheck {
            due: now + self.config.boundary_check_delay(),
            before,
        });
        auto.next_step_at = now + auto.interval;
        debug!(step = auto.steps_taken, y = before.y, "auto-scroll step");
        Ok(())
    }

    fn at_boundary(&self, direction: Direction, position: Position) -> bool {
        let max = self.viewport.max_scroll();
        match direction {
            Direction::Up | Direction::Top => position.y <= BOUNDARY_EPSILON,
            Direction::Down | Direction::Bottom => position.y >= max.y - BOUNDARY_EPSILON,
            Direction::Left => position.x <= BOUNDARY_EPSILON,
            Direction::Right => position.x >= max.x - BOUNDARY_EPSILON,
        }
    }

    fn smart_scroll(&mut self, command: &ScrollCommand) -> Result<ScrollResult, ViewportError> {
        match command.target.as_deref() {
            Some(target) => self.scroll_to_element(target, command.smooth),
            None => self.intelligent_scroll(command),
        }
    }

    /// Selector lookup first, then a text search in document order
    fn scroll_to_element(&mut self, target: &str, smooth: bool) -> Result<ScrollResult, ViewportError> {
        let by_selector = match self.viewport.query_selector(target) {
            Ok(found) => found,
            // Spoken targets are rarely valid selectors
            Err(ViewportError::InvalidSelector(_)) => None,
            Err(err) => return Err(err),
        };

        let found = match by_selector {
            Some(element) => Some((element, format!("Scrolled to element: {}", target))),
            None => self
                .find_by_text(target)?
                .map(|element| (element, format!("Scrolled to element containing \"{}\"", target))),
        };

        let Some((element, message)) = found else {
            debug!(element = target, "smart scroll target not found");
            return Ok(ScrollResult::failed(
                format!("Element \"{}\" not found", target),
                self.viewport.scroll_position(),
            ));
        };

        self.viewport
            .scroll_into_view(element, ScrollBlock::Center, ScrollBehavior::from_smooth(smooth))?;
        self.record_scroll_event();
        Ok(ScrollResult::completed(message, self.viewport.scroll_position()))
    }

    fn find_by_text(&self, needle: &str) -> Result<Option<ElementId>, ViewportError> {
        let needle = needle.to_lowercase();
        Ok(self.viewport.query_selector_all("*")?.into_iter().find(|&element| {
            self.viewport
                .text_content(element)
                .map(|text| text.to_lowercase().contains(&needle))
                .unwrap_or(false)
        }))
    }

    fn section_candidates(&self) -> Result<Vec<(ElementId, Rect)>, ViewportError> {
        let mut seen = AHashSet::new();
        let mut candidates = Vec::new();
        for selector in SECTION_SELECTORS {
            for element in self.viewport.query_selector_all(selector)? {
                if seen.insert(element) {
                    candidates.push((element, self.viewport.bounding_rect(element)?));
                }
            }
        }
        Ok(candidates)
    }

    /// Jump to the next (or previous) content section, else scroll normally
    fn intelligent_scroll(&mut self, command: &ScrollCommand) -> Result<ScrollResult, ViewportError> {
        let (_, view_height) = self.viewport.viewport_size();
        let candidates = self.section_candidates()?;

        let target = match command.direction {
            Direction::Down => {
                let threshold = view_height * self.config.smart_top_threshold;
                candidates
                    .into_iter()
                    .filter(|(_, rect)| rect.top > threshold)
                    .min_by(|a, b| a.1.top.total_cmp(&b.1.top))
            }
            Direction::Up => {
                let threshold = view_height * self.config.smart_bottom_threshold;
                candidates
                    .into_iter()
                    .filter(|(_, rect)| rect.bottom() < threshold)
                    .max_by(|a, b| a.1.top.total_cmp(&b.1.top))
            }
            _ => None,
        };

        match target {
            Some((element, _)) => {
                self.viewport.scroll_into_view(
                    element,
                    ScrollBlock::Start,
                    ScrollBehavior::from_smooth(command.smooth),
                )?;
                self.record_scroll_event();
                let which = if command.direction == Direction::Up {
                    "previous"
                } else {
                    "next"
                };
                Ok(ScrollResult::completed(
                    format!("Smart scrolled to {} content section", which),
                    self.viewport.scroll_position(),
                ))
            }
            None => {
                debug!(direction = %command.direction, "no content section found, using basic scroll");
                self.basic_scroll(command)
            }
        }
    }
}

fn delta(direction: Direction, amount: f64) -> (f64, f64) {
    match direction {
        Direction::Up | Direction::Top => (0.0, -amount),
        Direction::Down | Direction::Bottom => (0.0, amount),
        Direction::Left => (-amount, 0.0),
        Direction::Right => (amount, 0.0),
    }
}
