//! Command parser - ordered pattern table matching of transcripts

use crate::types::{
    BrowserAction, Command, CommandKind, Direction, Intent, MediaAction, ParamValue, SystemAction,
};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Confidence assigned to any table match
pub const MATCHED_CONFIDENCE: f64 = 0.9;
/// Confidence of the general-query fallback
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Builds the typed payload from a successful match and the full input
type Extractor = fn(&Captures<'_>, &str) -> CommandKind;

/// One row of the pattern table
pub struct PatternEntry {
    pub pattern: Regex,
    pub intent: Intent,
    extract: Extractor,
}

impl PatternEntry {
    fn new(pattern: &str, intent: Intent, extract: Extractor) -> Self {
        // Literal patterns - these should never fail
        let pattern = Regex::new(&format!("(?i){}", pattern)).expect("Invalid regex pattern");
        Self {
            pattern,
            intent,
            extract,
        }
    }

    fn apply(&self, text: &str, full_input: &str) -> Option<CommandKind> {
        self.pattern
            .captures(text)
            .map(|caps| (self.extract)(&caps, full_input))
    }
}

fn group(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn number(caps: &Captures<'_>, name: &str) -> Option<f64> {
    group(caps, name).and_then(|s| ParamValue::coerce(&s).as_number())
}

fn scroll(caps: &Captures<'_>, _: &str) -> CommandKind {
    CommandKind::Scroll {
        direction: group(caps, "dir").and_then(|d| Direction::from_word(&d)),
        amount: number(caps, "amount"),
    }
}

fn browser(action: BrowserAction, caps: &Captures<'_>) -> CommandKind {
    CommandKind::BrowserAction {
        action,
        level: group(caps, "level").map(|l| ParamValue::coerce(&l)),
    }
}

/// Ordered table of command patterns
///
/// The first matching entry wins, so specific intents are listed ahead of
/// the generic ones that would also match (Google search before search,
/// help before general questions).
pub struct CommandParser {
    patterns: Vec<PatternEntry>,
}

impl CommandParser {
    pub fn new() -> Self {
        let patterns = vec![
            // Scrolling
            PatternEntry::new(r"^scroll\s+(?P<dir>up|down|left|right|top|bottom)$", Intent::Scroll, scroll),
            PatternEntry::new(
                r"^(?:scroll\s+)?(?P<dir>up|down)\s+(?P<amount>\d+)\s*(?:pixels?|px)?$",
                Intent::Scroll,
                scroll,
            ),
            PatternEntry::new(
                r"^(?:go\s+to\s+)?(?:the\s+)?(?P<dir>top|bottom)\s+of\s+(?:the\s+)?page$",
                Intent::Scroll,
                scroll,
            ),
            PatternEntry::new(r"^scroll\s+to\s+(?:the\s+)?(?P<dir>top|bottom)$", Intent::Scroll, scroll),
            // Browser control
            PatternEntry::new(r"^(?:refresh|reload)(?:\s+(?:page|browser))?$", Intent::BrowserAction, |c, _| {
                browser(BrowserAction::Refresh, c)
            }),
            PatternEntry::new(r"^(?:go\s+)?(?:back|backward)$", Intent::BrowserAction, |c, _| {
                browser(BrowserAction::Back, c)
            }),
            PatternEntry::new(r"^(?:go\s+)?(?:forward|ahead)$", Intent::BrowserAction, |c, _| {
                browser(BrowserAction::Forward, c)
            }),
            PatternEntry::new(r"^(?:enter\s+)?full\s*screen$", Intent::BrowserAction, |c, _| {
                browser(BrowserAction::Fullscreen, c)
            }),
            PatternEntry::new(r"^zoom\s+(?:to\s+)?(?P<level>in|out|\d+%?)$", Intent::BrowserAction, |c, _| {
                browser(BrowserAction::Zoom, c)
            }),
            // Media
            PatternEntry::new(r"^(?:play|start)\s+(?:music|video|media|song)$", Intent::Media, |_, _| {
                CommandKind::Media {
                    action: MediaAction::Play,
                    level: None,
                }
            }),
            PatternEntry::new(r"^(?:pause|stop)\s+(?:music|video|media|song)$", Intent::Media, |_, _| {
                CommandKind::Media {
                    action: MediaAction::Pause,
                    level: None,
                }
            }),
            PatternEntry::new(
                r"^(?:set\s+)?(?:volume|sound)\s+(?:to\s+)?(?P<level>\d+)%?$",
                Intent::Media,
                |c, _| CommandKind::Media {
                    action: MediaAction::Volume,
                    level: number(c, "level"),
                },
            ),
            // System
            PatternEntry::new(r"^(?P<action>mute|unmute)\s+(?:volume|sound|audio)$", Intent::System, |c, _| {
                let action = match group(c, "action").as_deref().map(str::to_lowercase).as_deref() {
                    Some("unmute") => SystemAction::Unmute,
                    _ => SystemAction::Mute,
                };
                CommandKind::System { action, level: None }
            }),
            PatternEntry::new(
                r"^(?:take\s+(?:a\s+)?)?(?:screenshot|screen\s+capture)$",
                Intent::System,
                |_, _| CommandKind::System {
                    action: SystemAction::Screenshot,
                    level: None,
                },
            ),
            PatternEntry::new(
                r"^(?:set\s+)?brightness\s+(?:to\s+)?(?P<level>\d+)%?$",
                Intent::System,
                |c, _| CommandKind::System {
                    action: SystemAction::Brightness,
                    level: number(c, "level"),
                },
            ),
            // Site-specific search
            PatternEntry::new(
                r"^(?:play|search)\s+(?:on\s+)?youtube\s+(?:for\s+)?(?P<query>.+)$",
                Intent::YoutubeSearch,
                |c, _| CommandKind::YoutubeSearch {
                    query: group(c, "query").unwrap_or_default(),
                },
            ),
            PatternEntry::new(r"^(?:search\s+)?google\s+(?:for\s+)?(?P<query>.+)$", Intent::GoogleSearch, |c, _| {
                CommandKind::GoogleSearch {
                    query: group(c, "query").unwrap_or_default(),
                }
            }),
            PatternEntry::new(
                r"^(?:search|find|look\s+for)\s+(?:for\s+)?(?P<query>.+)$",
                Intent::Search,
                |c, _| CommandKind::Search {
                    query: group(c, "query").unwrap_or_default(),
                },
            ),
            // Applications and navigation
            PatternEntry::new(r"^(?:open|launch|start)\s+(?P<target>.+)$", Intent::Open, |c, _| {
                CommandKind::Open {
                    target: group(c, "target").unwrap_or_default(),
                }
            }),
            PatternEntry::new(r"^(?:close|exit|quit)\s+(?P<target>.+)$", Intent::Close, |c, _| {
                CommandKind::Close {
                    target: group(c, "target").unwrap_or_default(),
                }
            }),
            PatternEntry::new(r"^(?:go\s+to|navigate\s+to|visit)\s+(?P<target>.+)$", Intent::Open, |c, _| {
                CommandKind::Open {
                    target: group(c, "target").unwrap_or_default(),
                }
            }),
            // Time and weather
            PatternEntry::new(
                r"^(?:what(?:'s|\s+is)\s+the\s+)?(?:time|current\s+time)(?:\s+now)?$",
                Intent::Time,
                |_, _| CommandKind::Time,
            ),
            PatternEntry::new(
                r"^(?:what(?:'s|\s+is)\s+the\s+)?weather(?:\s+(?:today|now|like))?$",
                Intent::Weather,
                |_, _| CommandKind::Weather,
            ),
            // Image generation
            PatternEntry::new(
                r"^(?:generate|create|make)\s+(?:an?\s+)?image\s+(?:of\s+)?(?P<prompt>.+)$",
                Intent::GenerateImage,
                |c, _| CommandKind::GenerateImage {
                    prompt: group(c, "prompt").unwrap_or_default(),
                },
            ),
            PatternEntry::new(r"^(?:draw|paint|sketch)\s+(?:me\s+)?(?P<prompt>.+)$", Intent::GenerateImage, |c, _| {
                CommandKind::GenerateImage {
                    prompt: group(c, "prompt").unwrap_or_default(),
                }
            }),
            // Conversation
            PatternEntry::new(r"^(?:help|what\s+can\s+you\s+do)$", Intent::Help, |_, _| CommandKind::Help),
            PatternEntry::new(r"^(?:hello|hi|hey)(?:\s+(?:jarvis|there))?$", Intent::Greeting, |_, _| {
                CommandKind::Greeting
            }),
            PatternEntry::new(r"^(?:goodbye|bye|see\s+you|farewell)$", Intent::Farewell, |_, _| {
                CommandKind::Farewell
            }),
            PatternEntry::new(r"^(?:thank\s+you|thanks)(?:\s+jarvis)?$", Intent::Thanks, |_, _| {
                CommandKind::Thanks
            }),
            // General questions keep the whole utterance for the fallback
            PatternEntry::new(r"^(?:what|how|when|where|why|who)\s+.+$", Intent::GeneralQuery, |_, input| {
                CommandKind::GeneralQuery {
                    query: input.to_string(),
                }
            }),
            PatternEntry::new(r"^(?:tell\s+me\s+about|explain|describe)\s+.+$", Intent::GeneralQuery, |_, input| {
                CommandKind::GeneralQuery {
                    query: input.to_string(),
                }
            }),
        ];

        Self { patterns }
    }

    pub fn patterns(&self) -> &[PatternEntry] {
        &self.patterns
    }

    /// Classify a transcript into a command
    ///
    /// Total for any input: when nothing in the table matches, the whole
    /// input becomes a general query with fallback confidence.
    pub fn parse(&self, input: &str) -> Command {
        let clean = input.trim();
        let text = clean.trim_end_matches(|c: char| matches!(c, '?' | '!' | '.')).trim_end();

        for entry in &self.patterns {
            if let Some(kind) = entry.apply(text, clean) {
                tracing::debug!(intent = %entry.intent, input = clean, "command matched");
                return Command::new(kind, MATCHED_CONFIDENCE);
            }
        }

        tracing::debug!(input = clean, "no pattern matched, falling back to general query");
        Command::new(
            CommandKind::GeneralQuery {
                query: clean.to_string(),
            },
            FALLBACK_CONFIDENCE,
        )
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse with a lazily built shared table
pub fn parse_command(input: &str) -> Command {
    static PARSER: OnceLock<CommandParser> = OnceLock::new();
    PARSER.get_or_init(CommandParser::new).parse(input)
}

/// Example utterances for each command family
pub fn command_examples() -> &'static [&'static str] {
    &[
        "Open Chrome",
        "Open YouTube",
        "Close Chrome",
        "Refresh page",
        "Go back",
        "Go forward",
        "Enter fullscreen",
        "Zoom in",
        "Zoom to 150%",
        "Scroll down",
        "Scroll up",
        "Scroll to top",
        "Scroll to bottom",
        "Scroll down 500 pixels",
        "Auto scroll down slowly",
        "Smart scroll",
        "Play music",
        "Pause video",
        "Set volume to 50%",
        "Mute volume",
        "Search for restaurants",
        "Go to GitHub",
        "Search Google for weather",
        "Play on YouTube relaxing music",
        "What's the time?",
        "What's the weather?",
        "Tell me about artificial intelligence",
        "Generate image of a sunset",
        "Draw me a landscape",
        "Hello Jarvis",
        "Thank you",
        "What can you do?",
        "Help",
    ]
}

/// Help text spoken for the `help` intent
pub fn automation_help() -> &'static str {
    "I can help you with various automation tasks. \
Application control: open or close applications and websites, for example \"Open Chrome\" or \"Go to GitHub\". \
Browser control: \"Refresh page\", \"Go back\", \"Enter fullscreen\", \"Zoom to 150%\". \
Scrolling: \"Scroll down\", \"Scroll to top\", \"Scroll up 300 pixels\", \"Auto scroll down\", \
\"Smart scroll\", and say \"stop\" to cancel. \
Media control: \"Play music\", \"Pause video\", \"Set volume to 75%\". \
Search and information: \"Search for news\", \"Search Google for cats\", \"What's the weather?\", \
\"Tell me about AI\". \
Image generation: \"Generate image of a sunset\". \
Just speak naturally, and I'll understand what you want to do!"
}
