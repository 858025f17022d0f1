//! Voice phrase extraction for scroll commands
//!
//! Recognizes auto-scroll, smart-scroll, percentage and plain directional
//! phrases, with optional pixel amounts and speed qualifiers.

use crate::config::EngineConfig;
use crate::types::{Direction, ScrollCommand};
use regex::Regex;

/// Speed qualifier intervals in milliseconds
pub const SLOW_INTERVAL_MS: u64 = 3000;
pub const MEDIUM_INTERVAL_MS: u64 = 1500;
pub const FAST_INTERVAL_MS: u64 = 500;

/// Scroll state of the page at parse time, needed for percentage phrases
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageMetrics {
    pub percentage: f64,
    pub max_scroll_y: f64,
}

/// Turns free text into a [`ScrollCommand`]
pub struct ScrollPhraseParser {
    direction: Regex,
    next_section: Regex,
    percentage: Regex,
    edge: Regex,
    target: Regex,
    number: Regex,
    duration: Regex,
}

impl ScrollPhraseParser {
    pub fn new() -> Self {
        // Compile regex patterns once - these should never fail
        Self {
            direction: Regex::new(r"\b(up|down|left|right|top|beginning|bottom|end)\b")
                .expect("Invalid regex pattern"),
            next_section: Regex::new(r"scroll\s+to\s+(?:the\s+)?next\b").expect("Invalid regex pattern"),
            percentage: Regex::new(r"scroll\s+to\s+(\d+(?:\.\d+)?)\s*(?:%|percent)")
                .expect("Invalid regex pattern"),
            edge: Regex::new(
                r"scroll\s+to\s+(?:the\s+)?(top|bottom|beginning|end)(?:\s+of\s+(?:the\s+)?page)?\s*$",
            )
            .expect("Invalid regex pattern"),
            target: Regex::new(r"scroll\s+to\s+(?:the\s+)?(.+)$").expect("Invalid regex pattern"),
            number: Regex::new(r"\b(\d+)\s*(px|pixels?|ms|milliseconds?|seconds?|%|percent)?")
                .expect("Invalid regex pattern"),
            duration: Regex::new(r"\b(\d+)\s*(ms|milliseconds?|seconds?)\b").expect("Invalid regex pattern"),
        }
    }

    /// Parse a transcript; `None` when no scroll keyword or direction is present
    pub fn parse(&self, input: &str, page: PageMetrics, config: &EngineConfig) -> Option<ScrollCommand> {
        let text = input.trim().to_lowercase();

        if text.contains("auto scroll") || text.contains("autoscroll") || text.contains("keep scrolling") {
            let direction = self.extract_direction(&text).unwrap_or(Direction::Down);
            let interval = self
                .extract_speed(&text)
                .unwrap_or(config.voice_auto_interval_ms);
            return Some(ScrollCommand::continuous(direction, interval, config.max_steps));
        }

        if text.contains("smart scroll") || self.next_section.is_match(&text) {
            let direction = self.extract_direction(&text).unwrap_or(Direction::Down);
            return Some(ScrollCommand::smart(direction, None));
        }

        if let Some(caps) = self.percentage.captures(&text) {
            let target = caps[1].parse::<f64>().unwrap_or(0.0).clamp(0.0, 100.0);
            let direction = if target > page.percentage {
                Direction::Down
            } else {
                Direction::Up
            };
            let amount = (target - page.percentage).abs() / 100.0 * page.max_scroll_y;
            return Some(ScrollCommand::single(direction, Some(amount)));
        }

        if let Some(caps) = self.edge.captures(&text) {
            let direction = Direction::from_word(&caps[1])?;
            return Some(ScrollCommand::single(direction, None));
        }

        if let Some(caps) = self.target.captures(&text) {
            let target = caps[1].trim();
            if !target.is_empty() {
                return Some(ScrollCommand::smart(Direction::Down, Some(target.to_string())));
            }
        }

        let direction = self.extract_direction(&text)?;
        let mut cmd = ScrollCommand::single(
            direction,
            Some(self.extract_amount(&text).unwrap_or(config.default_amount)),
        );
        cmd.interval_ms = Some(self.extract_speed(&text).unwrap_or(config.interval_ms));
        cmd.smooth = !(text.contains("fast") || text.contains("quick"));
        Some(cmd)
    }

    /// Direction by keyword priority, not by position in the phrase
    fn extract_direction(&self, text: &str) -> Option<Direction> {
        let words: Vec<&str> = self
            .direction
            .find_iter(text)
            .map(|m| m.as_str())
            .collect();
        let has = |w: &str| words.contains(&w);

        if has("up") {
            Some(Direction::Up)
        } else if has("down") {
            Some(Direction::Down)
        } else if has("left") {
            Some(Direction::Left)
        } else if has("right") {
            Some(Direction::Right)
        } else if has("top") || has("beginning") {
            Some(Direction::Top)
        } else if has("bottom") || has("end") {
            Some(Direction::Bottom)
        } else {
            None
        }
    }

    /// First number that is not a duration or percentage
    fn extract_amount(&self, text: &str) -> Option<f64> {
        self.number.captures_iter(text).find_map(|caps| {
            let is_pixels = caps
                .get(2)
                .map(|unit| unit.as_str().starts_with('p') && !unit.as_str().starts_with("percent"))
                .unwrap_or(true);
            if is_pixels {
                caps[1].parse::<f64>().ok()
            } else {
                None
            }
        })
    }

    fn extract_speed(&self, text: &str) -> Option<u64> {
        if text.contains("slow") {
            return Some(SLOW_INTERVAL_MS);
        }
        if text.contains("fast") || text.contains("quick") {
            return Some(FAST_INTERVAL_MS);
        }
        if text.contains("medium") {
            return Some(MEDIUM_INTERVAL_MS);
        }

        let caps = self.duration.captures(text)?;
        let value = caps[1].parse::<u64>().ok()?;
        if caps[2].contains("second") && !caps[2].starts_with("milli") {
            Some(value.saturating_mul(1000))
        } else {
            Some(value)
        }
    }
}

impl Default for ScrollPhraseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScrollMode;

    fn parse(input: &str) -> Option<ScrollCommand> {
        ScrollPhraseParser::new().parse(input, PageMetrics::default(), &EngineConfig::default())
    }

    #[test]
    fn test_slow_down_is_single_with_slow_interval() {
        let cmd = parse("scroll slow down").unwrap();
        assert_eq!(cmd.mode, ScrollMode::Single);
        assert_eq!(cmd.direction, Direction::Down);
        assert_eq!(cmd.interval_ms, Some(3000));
        assert_eq!(cmd.amount, Some(300.0));
        assert!(cmd.smooth);
    }

    #[test]
    fn test_auto_scroll_up_uses_voice_default_interval() {
        let cmd = parse("auto scroll up").unwrap();
        assert_eq!(cmd.mode, ScrollMode::Continuous);
        assert_eq!(cmd.direction, Direction::Up);
        assert_eq!(cmd.interval_ms, Some(2000));
        assert_eq!(cmd.max_steps, Some(20));
    }

    #[test]
    fn test_keep_scrolling_defaults_down() {
        let cmd = parse("keep scrolling quickly").unwrap();
        assert_eq!(cmd.mode, ScrollMode::Continuous);
        assert_eq!(cmd.direction, Direction::Down);
        assert_eq!(cmd.interval_ms, Some(500));
    }

    #[test]
    fn test_explicit_duration() {
        let cmd = parse("auto scroll down every 2 seconds").unwrap();
        assert_eq!(cmd.interval_ms, Some(2000));
        let cmd = parse("auto scroll down 750 ms").unwrap();
        assert_eq!(cmd.interval_ms, Some(750));
    }

    #[test]
    fn test_smart_scroll() {
        let cmd = parse("scroll to next section").unwrap();
        assert_eq!(cmd.mode, ScrollMode::Smart);
        assert_eq!(cmd.target, None);
        let cmd = parse("scroll to the next section").unwrap();
        assert_eq!(cmd.mode, ScrollMode::Smart);
        assert_eq!(cmd.target, None);
        let cmd = parse("smart scroll up").unwrap();
        assert_eq!(cmd.direction, Direction::Up);
    }

    #[test]
    fn test_scroll_to_target() {
        let cmd = parse("Scroll to the pricing section").unwrap();
        assert_eq!(cmd.mode, ScrollMode::Smart);
        assert_eq!(cmd.target.as_deref(), Some("pricing section"));
    }

    #[test]
    fn test_scroll_to_edges() {
        let cmd = parse("scroll to top").unwrap();
        assert_eq!(cmd.mode, ScrollMode::Single);
        assert_eq!(cmd.direction, Direction::Top);
        let cmd = parse("scroll to the end of the page").unwrap();
        assert_eq!(cmd.direction, Direction::Bottom);
    }

    #[test]
    fn test_percentage_direction_from_current_position() {
        let parser = ScrollPhraseParser::new();
        let config = EngineConfig::default();
        let page = PageMetrics {
            percentage: 75.0,
            max_scroll_y: 2000.0,
        };
        let cmd = parser.parse("scroll to 25%", page, &config).unwrap();
        assert_eq!(cmd.mode, ScrollMode::Single);
        assert_eq!(cmd.direction, Direction::Up);
        assert_eq!(cmd.amount, Some(1000.0));

        let cmd = parser.parse("scroll to 100 percent", page, &config).unwrap();
        assert_eq!(cmd.direction, Direction::Down);
        assert_eq!(cmd.amount, Some(500.0));
    }

    #[test]
    fn test_amount_and_fast_qualifier() {
        let cmd = parse("scroll down 500 pixels fast").unwrap();
        assert_eq!(cmd.amount, Some(500.0));
        assert_eq!(cmd.interval_ms, Some(500));
        assert!(!cmd.smooth);
    }

    #[test]
    fn test_direction_needs_whole_word() {
        assert!(parse("open the settings menu").is_none());
        assert!(parse("upload a file").is_none());
        assert!(parse("hello there").is_none());
    }
}
