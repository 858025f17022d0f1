//! Command router - maps parsed commands onto automation instructions

use crate::types::{AutomationInstruction, Command, CommandKind, Direction};
use url::Url;

const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search";
const YOUTUBE_SEARCH_URL: &str = "https://www.youtube.com/results";

/// Map a command onto a browser-automation instruction
///
/// `None` means the command is conversational: the orchestrator answers it
/// with a canned response or the AI fallback.
pub fn route_command(command: &Command) -> Option<AutomationInstruction> {
    match &command.kind {
        CommandKind::Open { target } => Some(AutomationInstruction::Open {
            target: target.clone(),
        }),
        CommandKind::Close { target } => Some(AutomationInstruction::Close {
            target: target.clone(),
        }),
        CommandKind::BrowserAction { action, level } => Some(AutomationInstruction::BrowserAction {
            action: *action,
            level: level.clone(),
        }),
        CommandKind::Scroll { direction, amount } => Some(AutomationInstruction::Scroll {
            direction: direction.unwrap_or(Direction::Down),
            amount: *amount,
            smooth: true,
        }),
        CommandKind::Media { action, level } => Some(AutomationInstruction::Media {
            action: *action,
            level: *level,
        }),
        CommandKind::System { action, level } => Some(AutomationInstruction::System {
            action: *action,
            level: *level,
        }),
        _ => None,
    }
}

/// Search URL for the search intents, `None` for everything else
pub fn search_url(command: &Command) -> Option<String> {
    let (base, key, query) = match &command.kind {
        CommandKind::GoogleSearch { query } | CommandKind::Search { query } => {
            (GOOGLE_SEARCH_URL, "q", query)
        }
        CommandKind::YoutubeSearch { query } => (YOUTUBE_SEARCH_URL, "search_query", query),
        _ => return None,
    };
    Url::parse_with_params(base, &[(key, query.as_str())])
        .ok()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_command;
    use crate::types::{Intent, MediaAction};

    #[test]
    fn test_scroll_defaults_to_down() {
        let cmd = Command::new(
            CommandKind::Scroll {
                direction: None,
                amount: None,
            },
            0.9,
        );
        assert_eq!(
            route_command(&cmd),
            Some(AutomationInstruction::Scroll {
                direction: Direction::Down,
                amount: None,
                smooth: true
            })
        );
    }

    #[test]
    fn test_automation_intents_route() {
        for (input, intent) in [
            ("open chrome", Intent::Open),
            ("close notepad", Intent::Close),
            ("refresh page", Intent::BrowserAction),
            ("scroll up", Intent::Scroll),
            ("pause video", Intent::Media),
            ("take screenshot", Intent::System),
        ] {
            let instruction = route_command(&parse_command(input)).unwrap();
            assert_eq!(instruction.intent(), intent, "{}", input);
        }
    }

    #[test]
    fn test_conversational_intents_are_not_routed() {
        for input in ["hello", "what's the time", "thanks", "help", "why is the sky blue", "google cats"] {
            assert!(route_command(&parse_command(input)).is_none(), "{}", input);
        }
    }

    #[test]
    fn test_volume_level_passes_through() {
        let instruction = route_command(&parse_command("volume 30")).unwrap();
        assert_eq!(
            instruction,
            AutomationInstruction::Media {
                action: MediaAction::Volume,
                level: Some(30.0)
            }
        );
    }

    #[test]
    fn test_search_urls_are_encoded() {
        let url = search_url(&parse_command("search google for cute cats & dogs")).unwrap();
        assert_eq!(url, "https://www.google.com/search?q=cute+cats+%26+dogs");

        let url = search_url(&parse_command("play on youtube lofi beats")).unwrap();
        assert_eq!(url, "https://www.youtube.com/results?search_query=lofi+beats");

        assert!(search_url(&parse_command("open chrome")).is_none());
    }
}
