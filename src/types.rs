//! Core data types for parsed commands and scroll operations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed classification of a parsed command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Intent {
    Open,
    Close,
    BrowserAction,
    Scroll,
    Media,
    System,
    Search,
    YoutubeSearch,
    GoogleSearch,
    GeneralQuery,
    Time,
    Weather,
    GenerateImage,
    Greeting,
    Farewell,
    Thanks,
    Help,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Open => "open",
            Intent::Close => "close",
            Intent::BrowserAction => "browserAction",
            Intent::Scroll => "scroll",
            Intent::Media => "media",
            Intent::System => "system",
            Intent::Search => "search",
            Intent::YoutubeSearch => "youtubeSearch",
            Intent::GoogleSearch => "googleSearch",
            Intent::GeneralQuery => "generalQuery",
            Intent::Time => "time",
            Intent::Weather => "weather",
            Intent::GenerateImage => "generateImage",
            Intent::Greeting => "greeting",
            Intent::Farewell => "farewell",
            Intent::Thanks => "thanks",
            Intent::Help => "help",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured parameter; numeric-looking captures become numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Coerce a raw capture, dropping a trailing `%` before the numeric check
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        let numeric = trimmed.trim_end_matches('%').trim();
        match numeric.parse::<f64>() {
            Ok(n) if n.is_finite() => ParamValue::Number(n),
            _ => ParamValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            ParamValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BrowserAction {
    Refresh,
    Back,
    Forward,
    Fullscreen,
    Zoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaAction {
    Play,
    Pause,
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SystemAction {
    Mute,
    Unmute,
    Screenshot,
    Brightness,
}

/// Per-intent payload of a parsed command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "camelCase")]
pub enum CommandKind {
    Open { target: String },
    Close { target: String },
    BrowserAction {
        action: BrowserAction,
        level: Option<ParamValue>,
    },
    Scroll {
        direction: Option<Direction>,
        amount: Option<f64>,
    },
    Media {
        action: MediaAction,
        level: Option<f64>,
    },
    System {
        action: SystemAction,
        level: Option<f64>,
    },
    Search { query: String },
    YoutubeSearch { query: String },
    GoogleSearch { query: String },
    GeneralQuery { query: String },
    Time,
    Weather,
    GenerateImage { prompt: String },
    Greeting,
    Farewell,
    Thanks,
    Help,
}

/// A parsed command with exactly one intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(flatten)]
    pub kind: CommandKind,
    pub confidence: f64,
}

impl Command {
    pub fn new(kind: CommandKind, confidence: f64) -> Self {
        Self { kind, confidence }
    }

    pub fn intent(&self) -> Intent {
        match &self.kind {
            CommandKind::Open { .. } => Intent::Open,
            CommandKind::Close { .. } => Intent::Close,
            CommandKind::BrowserAction { .. } => Intent::BrowserAction,
            CommandKind::Scroll { .. } => Intent::Scroll,
            CommandKind::Media { .. } => Intent::Media,
            CommandKind::System { .. } => Intent::System,
            CommandKind::Search { .. } => Intent::Search,
            CommandKind::YoutubeSearch { .. } => Intent::YoutubeSearch,
            CommandKind::GoogleSearch { .. } => Intent::GoogleSearch,
            CommandKind::GeneralQuery { .. } => Intent::GeneralQuery,
            CommandKind::Time => Intent::Time,
            CommandKind::Weather => Intent::Weather,
            CommandKind::GenerateImage { .. } => Intent::GenerateImage,
            CommandKind::Greeting => Intent::Greeting,
            CommandKind::Farewell => Intent::Farewell,
            CommandKind::Thanks => Intent::Thanks,
            CommandKind::Help => Intent::Help,
        }
    }
}

/// Browser-automation instruction produced by the router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AutomationInstruction {
    Open { target: String },
    Close { target: String },
    BrowserAction {
        action: BrowserAction,
        level: Option<ParamValue>,
    },
    Scroll {
        direction: Direction,
        amount: Option<f64>,
        smooth: bool,
    },
    Media {
        action: MediaAction,
        level: Option<f64>,
    },
    System {
        action: SystemAction,
        level: Option<f64>,
    },
}

impl AutomationInstruction {
    pub fn intent(&self) -> Intent {
        match self {
            AutomationInstruction::Open { .. } => Intent::Open,
            AutomationInstruction::Close { .. } => Intent::Close,
            AutomationInstruction::BrowserAction { .. } => Intent::BrowserAction,
            AutomationInstruction::Scroll { .. } => Intent::Scroll,
            AutomationInstruction::Media { .. } => Intent::Media,
            AutomationInstruction::System { .. } => Intent::System,
        }
    }

    /// Single-shot scroll command for a `Scroll` instruction
    pub fn to_scroll_command(&self) -> Option<ScrollCommand> {
        match self {
            AutomationInstruction::Scroll {
                direction,
                amount,
                smooth,
            } => {
                let mut cmd = ScrollCommand::single(*direction, *amount);
                cmd.smooth = *smooth;
                Some(cmd)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Top,
    Bottom,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Top => "top",
            Direction::Bottom => "bottom",
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            "top" | "beginning" => Some(Direction::Top),
            "bottom" | "end" => Some(Direction::Bottom),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollMode {
    Single,
    Continuous,
    Smart,
}

/// A scroll request understood by the scroll engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollCommand {
    pub mode: ScrollMode,
    pub direction: Direction,
    pub amount: Option<f64>,
    pub interval_ms: Option<u64>,
    pub smooth: bool,
    pub target: Option<String>,
    pub max_steps: Option<u32>,
}

impl ScrollCommand {
    pub fn single(direction: Direction, amount: Option<f64>) -> Self {
        Self {
            mode: ScrollMode::Single,
            direction,
            amount,
            interval_ms: None,
            smooth: true,
            target: None,
            max_steps: None,
        }
    }

    /// Continuous commands always carry an interval and a step cap
    pub fn continuous(direction: Direction, interval_ms: u64, max_steps: u32) -> Self {
        Self {
            mode: ScrollMode::Continuous,
            direction,
            amount: None,
            interval_ms: Some(interval_ms),
            smooth: true,
            target: None,
            max_steps: Some(max_steps),
        }
    }

    pub fn smart(direction: Direction, target: Option<String>) -> Self {
        Self {
            mode: ScrollMode::Smart,
            direction,
            amount: None,
            interval_ms: None,
            smooth: true,
            target,
            max_steps: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Outcome of a scroll engine operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollResult {
    pub success: bool,
    pub message: String,
    pub position: Position,
    pub completed: bool,
}

impl ScrollResult {
    pub fn completed(message: impl Into<String>, position: Position) -> Self {
        Self {
            success: true,
            message: message.into(),
            position,
            completed: true,
        }
    }

    pub fn started(message: impl Into<String>, position: Position) -> Self {
        Self {
            success: true,
            message: message.into(),
            position,
            completed: false,
        }
    }

    pub fn failed(message: impl Into<String>, position: Position) -> Self {
        Self {
            success: false,
            message: message.into(),
            position,
            completed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric_and_text() {
        assert_eq!(ParamValue::coerce("150%"), ParamValue::Number(150.0));
        assert_eq!(ParamValue::coerce(" 42 "), ParamValue::Number(42.0));
        assert_eq!(ParamValue::coerce("in"), ParamValue::Text("in".to_string()));
    }

    #[test]
    fn test_command_serializes_with_intent_tag() {
        let cmd = Command::new(
            CommandKind::GoogleSearch {
                query: "cats".to_string(),
            },
            0.9,
        );
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["intent"], "googleSearch");
        assert_eq!(json["query"], "cats");
        assert_eq!(cmd.intent(), Intent::GoogleSearch);
    }

    #[test]
    fn test_continuous_constructor_sets_bounds() {
        let cmd = ScrollCommand::continuous(Direction::Up, 2000, 20);
        assert_eq!(cmd.interval_ms, Some(2000));
        assert_eq!(cmd.max_steps, Some(20));
    }

    #[test]
    fn test_direction_words() {
        assert_eq!(Direction::from_word("Beginning"), Some(Direction::Top));
        assert_eq!(Direction::from_word("end"), Some(Direction::Bottom));
        assert_eq!(Direction::from_word("sideways"), None);
    }
}
