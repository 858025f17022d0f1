//! Session orchestrator
//!
//! Takes final transcripts from speech recognition, runs them through the
//! scroll phrase parser, the command parser and the router, and answers
//! through the speech, AI and automation collaborators.

use crate::clock::Clock;
use crate::config::AssistantConfig;
use crate::driver::{lock, shared, spawn_driver, SharedScrollEngine};
use crate::engine::ScrollEngine;
use crate::error::AssistantError;
use crate::parser::{automation_help, CommandParser};
use crate::router::{route_command, search_url};
use crate::types::{AutomationInstruction, CommandKind, Intent, ScrollCommand, ScrollMode, ScrollResult};
use crate::viewport::Viewport;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const WELCOME_MESSAGE: &str = "Hello! I'm JARVIS, your enhanced AI assistant. How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Neutral,
    Excited,
    Calm,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpeakOptions {
    /// Voice persona name, resolved by the speech collaborator
    pub profile: Option<String>,
    pub emotion: Emotion,
}

/// Text-to-speech output; resolves when the utterance ends
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str, options: SpeakOptions) -> Result<(), AssistantError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub content: String,
}

/// Conversational AI used for general queries
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate_response(&self, prompt: &str) -> Result<AiResponse, AssistantError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub message: String,
}

/// Executes non-scroll automation (open, close, media, system, browser)
#[async_trait]
pub trait AutomationExecutor: Send + Sync {
    async fn execute(&self, instruction: &AutomationInstruction) -> Result<ExecutionOutcome, AssistantError>;
}

pub struct Collaborators {
    pub speech: Arc<dyn SpeechOutput>,
    pub generator: Arc<dyn ResponseGenerator>,
    pub executor: Arc<dyn AutomationExecutor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

/// What the assistant answered for one transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    pub intent: Option<Intent>,
    pub scroll: Option<ScrollResult>,
    pub emotion: Emotion,
}

impl Reply {
    fn say(text: impl Into<String>, intent: Intent) -> Self {
        Self {
            text: text.into(),
            intent: Some(intent),
            scroll: None,
            emotion: Emotion::Neutral,
        }
    }

    fn with_emotion(mut self, emotion: Emotion) -> Self {
        self.emotion = emotion;
        self
    }
}

pub struct Assistant<V, C> {
    engine: SharedScrollEngine<V, C>,
    parser: CommandParser,
    stop: StopMatcher,
    collaborators: Collaborators,
    config: AssistantConfig,
    transcript: Vec<Message>,
    scroll_task: Option<JoinHandle<Option<ScrollResult>>>,
}

impl<V, C> Assistant<V, C>
where
    V: Viewport + Send + 'static,
    C: Clock + Clone + 'static,
{
    /// Build the assistant and its scroll engine from `config`
    pub fn new(viewport: V, clock: C, collaborators: Collaborators, config: AssistantConfig) -> Self {
        let engine = shared(ScrollEngine::with_clock(viewport, clock, config.engine.clone()));
        Self {
            engine,
            parser: CommandParser::new(),
            stop: StopMatcher::new(),
            collaborators,
            config,
            transcript: vec![Message {
                role: Role::Assistant,
                content: WELCOME_MESSAGE.to_string(),
                timestamp: Local::now(),
            }],
            scroll_task: None,
        }
    }

    pub fn engine(&self) -> &SharedScrollEngine<V, C> {
        &self.engine
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn export_transcript(&self) -> Result<String, AssistantError> {
        Ok(serde_json::to_string_pretty(&self.transcript)?)
    }

    /// Handle one finalized utterance: record it, answer it, speak the answer
    pub async fn handle_transcript(&mut self, transcript: &str) -> Result<Reply, AssistantError> {
        let text = transcript.trim();
        if text.is_empty() {
            return Err(AssistantError::EmptyTranscript);
        }

        self.push(Role::User, text);
        let reply = self.respond(text).await;
        info!(intent = ?reply.intent, "replying");
        self.push(Role::Assistant, &reply.text);

        let options = SpeakOptions {
            profile: Some(self.config.voice_profile.clone()),
            emotion: reply.emotion,
        };
        if let Err(err) = self.collaborators.speech.speak(&reply.text, options).await {
            warn!(error = %err, "speech output failed");
        }
        Ok(reply)
    }

    /// Wait for the running auto-scroll to finish
    ///
    /// `None` when nothing is running or the scroll was cancelled.
    pub async fn wait_for_scroll(&mut self) -> Option<ScrollResult> {
        let task = self.scroll_task.take()?;
        task.await.ok().flatten()
    }

    /// Stop scrolling and drop the timer task
    pub fn shutdown(&mut self) {
        lock(&self.engine).stop_scrolling();
        if let Some(task) = self.scroll_task.take() {
            task.abort();
        }
    }

    fn push(&mut self, role: Role, content: &str) {
        self.transcript.push(Message {
            role,
            content: content.to_string(),
            timestamp: Local::now(),
        });
    }

    async fn respond(&mut self, text: &str) -> Reply {
        if self.stop.matches(text) {
            return self.stop_scrolling();
        }

        if text.to_lowercase().contains("scroll") {
            let parsed = lock(&self.engine).parse_scroll_command(text);
            if let Some(command) = parsed {
                return self.run_scroll(command);
            }
        }

        let command = self.parser.parse(text);
        if let Some(instruction) = route_command(&command) {
            return match instruction.to_scroll_command() {
                Some(scroll) => self.run_scroll(scroll),
                None => self.execute(&instruction).await,
            };
        }

        let intent = command.intent();
        if let Some(url) = search_url(&command) {
            let mut reply = self.execute(&AutomationInstruction::Open { target: url }).await;
            reply.intent = Some(intent);
            return reply;
        }

        match command.kind {
            CommandKind::Time => Reply::say(
                format!("The current time is {}.", Local::now().format("%-I:%M %p")),
                intent,
            ),
            CommandKind::Weather => Reply::say(
                "I'd be happy to help with weather information, but I need access to a weather service \
                 to provide real-time data. For now, I recommend checking your local forecast.",
                intent,
            ),
            CommandKind::Greeting => {
                Reply::say("Hello! How can I assist you today?", intent).with_emotion(Emotion::Excited)
            }
            CommandKind::Farewell => Reply::say("Goodbye! Have a great day.", intent),
            CommandKind::Thanks => Reply::say("You're welcome!", intent).with_emotion(Emotion::Calm),
            CommandKind::Help => Reply::say(automation_help(), intent),
            CommandKind::GenerateImage { prompt } => Reply::say(
                format!(
                    "I would generate an image of {} for you. This feature requires integration \
                     with an image generation service.",
                    prompt
                ),
                intent,
            ),
            CommandKind::GeneralQuery { query } => self.ask(&query).await,
            _ => self.ask(text).await,
        }
    }

    async fn ask(&self, prompt: &str) -> Reply {
        match self.collaborators.generator.generate_response(prompt).await {
            Ok(response) => Reply::say(response.content, Intent::GeneralQuery),
            Err(err) => {
                warn!(error = %err, "response generation failed");
                Reply::say(
                    "I'm sorry, I couldn't come up with an answer right now. Please try again.",
                    Intent::GeneralQuery,
                )
                .with_emotion(Emotion::Calm)
            }
        }
    }

    async fn execute(&self, instruction: &AutomationInstruction) -> Reply {
        let intent = instruction.intent();
        match self.collaborators.executor.execute(instruction).await {
            Ok(outcome) => {
                let emotion = if outcome.success {
                    Emotion::Neutral
                } else {
                    Emotion::Calm
                };
                Reply::say(outcome.message, intent).with_emotion(emotion)
            }
            Err(err) => {
                warn!(error = %err, ?instruction, "automation failed");
                Reply::say(format!("Sorry, I couldn't do that: {}", err), intent).with_emotion(Emotion::Urgent)
            }
        }
    }

    /// Run a scroll command, retrying a failed smart scroll once as a basic scroll
    fn run_scroll(&mut self, command: ScrollCommand) -> Reply {
        let mut result = lock(&self.engine).execute_scroll_command(command.clone());

        if !result.success && command.mode == ScrollMode::Smart {
            let fallback = ScrollCommand::single(command.direction, None);
            let retry = lock(&self.engine).execute_scroll_command(fallback);
            if retry.success {
                result = ScrollResult {
                    message: format!(
                        "{}. {} instead.",
                        result.message.trim_end_matches('.'),
                        retry.message
                    ),
                    ..retry
                };
            } else {
                result = retry;
            }
        }

        let mut text = result.message.clone();
        let mut emotion = if result.success {
            Emotion::Neutral
        } else {
            Emotion::Calm
        };
        if result.success && !result.completed {
            if let Some(previous) = self.scroll_task.take() {
                previous.abort();
            }
            self.scroll_task = Some(spawn_driver(self.engine.clone()));
            text = format!("{}. Say \"stop\" to cancel.", text);
            emotion = Emotion::Excited;
        }

        Reply {
            text,
            intent: Some(Intent::Scroll),
            scroll: Some(result),
            emotion,
        }
    }

    fn stop_scrolling(&mut self) -> Reply {
        let was_scrolling = {
            let mut engine = lock(&self.engine);
            let running = engine.is_currently_scrolling();
            engine.stop_scrolling();
            running
        };
        if let Some(task) = self.scroll_task.take() {
            task.abort();
        }
        if was_scrolling {
            Reply::say("Stopped scrolling.", Intent::Scroll)
        } else {
            Reply::say("Nothing is scrolling right now.", Intent::Scroll)
        }
    }
}

/// Recognizes requests to cancel scrolling
struct StopMatcher {
    stop: Regex,
    media: Regex,
}

impl StopMatcher {
    fn new() -> Self {
        Self {
            stop: Regex::new(r"(?i)\b(?:stop|cancel|halt)\b").expect("Invalid regex pattern"),
            media: Regex::new(r"(?i)\b(?:music|video|media|song|audio|playback)\b")
                .expect("Invalid regex pattern"),
        }
    }

    /// A stop keyword anywhere in the utterance, unless it names media playback
    fn matches(&self, text: &str) -> bool {
        self.stop.is_match(text) && !self.media.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use crate::page::InMemoryPage;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSpeech {
        spoken: Mutex<Vec<(String, SpeakOptions)>>,
    }

    #[async_trait]
    impl SpeechOutput for RecordingSpeech {
        async fn speak(&self, text: &str, options: SpeakOptions) -> Result<(), AssistantError> {
            self.spoken.lock().unwrap().push((text.to_string(), options));
            Ok(())
        }
    }

    struct FakeGenerator {
        fail: bool,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ResponseGenerator for FakeGenerator {
        async fn generate_response(&self, prompt: &str) -> Result<AiResponse, AssistantError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(AssistantError::collaborator("generator", "offline"));
            }
            Ok(AiResponse {
                content: format!("answer to: {}", prompt),
            })
        }
    }

    #[derive(Default)]
    struct RecordingExecutor {
        offline: bool,
        instructions: Mutex<Vec<AutomationInstruction>>,
    }

    #[async_trait]
    impl AutomationExecutor for RecordingExecutor {
        async fn execute(&self, instruction: &AutomationInstruction) -> Result<ExecutionOutcome, AssistantError> {
            self.instructions.lock().unwrap().push(instruction.clone());
            if self.offline {
                return Err(AssistantError::collaborator("executor", "browser bridge offline"));
            }
            Ok(ExecutionOutcome {
                success: true,
                message: "Done.".to_string(),
            })
        }
    }

    struct Harness {
        assistant: Assistant<InMemoryPage, TokioClock>,
        speech: Arc<RecordingSpeech>,
        generator: Arc<FakeGenerator>,
        executor: Arc<RecordingExecutor>,
    }

    fn harness_with(page: InMemoryPage, generator_fails: bool) -> Harness {
        build_harness(page, generator_fails, false)
    }

    fn build_harness(page: InMemoryPage, generator_fails: bool, executor_offline: bool) -> Harness {
        let speech = Arc::new(RecordingSpeech::default());
        let generator = Arc::new(FakeGenerator {
            fail: generator_fails,
            prompts: Mutex::new(Vec::new()),
        });
        let executor = Arc::new(RecordingExecutor {
            offline: executor_offline,
            ..Default::default()
        });
        let collaborators = Collaborators {
            speech: speech.clone(),
            generator: generator.clone(),
            executor: executor.clone(),
        };
        Harness {
            assistant: Assistant::new(page, TokioClock, collaborators, AssistantConfig::default()),
            speech,
            generator,
            executor,
        }
    }

    fn harness() -> Harness {
        harness_with(InMemoryPage::new(800.0, 1000.0, 800.0, 5000.0), false)
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_transcript_rejected() {
        let mut h = harness();
        let err = h.assistant.handle_transcript("   ").await.unwrap_err();
        assert!(matches!(err, AssistantError::EmptyTranscript));
        assert_eq!(h.assistant.transcript().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_general_query_goes_to_generator_and_is_spoken() {
        let mut h = harness();
        let reply = h.assistant.handle_transcript("Why is the sky blue?").await.unwrap();
        assert_eq!(reply.text, "answer to: Why is the sky blue?");
        assert_eq!(reply.intent, Some(Intent::GeneralQuery));

        let spoken = h.speech.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].1.profile.as_deref(), Some("jarvis"));
        assert_eq!(h.assistant.transcript().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generator_failure_becomes_apology() {
        let mut h = harness_with(InMemoryPage::new(800.0, 1000.0, 800.0, 5000.0), true);
        let reply = h.assistant.handle_transcript("tell me about rust").await.unwrap();
        assert!(reply.text.starts_with("I'm sorry"));
        assert_eq!(h.generator.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_google_search_opens_search_url() {
        let mut h = harness();
        let reply = h.assistant.handle_transcript("search google for cats").await.unwrap();
        assert_eq!(reply.intent, Some(Intent::GoogleSearch));
        let instructions = h.executor.instructions.lock().unwrap();
        assert_eq!(
            instructions[0],
            AutomationInstruction::Open {
                target: "https://www.google.com/search?q=cats".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_goes_to_executor() {
        let mut h = harness();
        h.assistant.handle_transcript("open chrome").await.unwrap();
        assert_eq!(
            h.executor.instructions.lock().unwrap()[0],
            AutomationInstruction::Open {
                target: "chrome".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_routed_scroll_uses_engine() {
        let mut h = harness();
        let reply = h.assistant.handle_transcript("down 200 px").await.unwrap();
        assert_eq!(reply.scroll.unwrap().position.y, 200.0);
        assert!(h.executor.instructions.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_scroll_then_stop() {
        let mut h = harness_with(InMemoryPage::new(800.0, 1000.0, 800.0, 1.0e9), false);
        let reply = h.assistant.handle_transcript("auto scroll down").await.unwrap();
        assert!(reply.text.contains("Say \"stop\" to cancel"));
        assert!(lock(h.assistant.engine()).is_currently_scrolling());

        tokio::time::sleep(std::time::Duration::from_millis(4500)).await;
        let reply = h.assistant.handle_transcript("Stop.").await.unwrap();
        assert_eq!(reply.text, "Stopped scrolling.");
        assert!(!lock(h.assistant.engine()).is_currently_scrolling());
        assert!(h.assistant.wait_for_scroll().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_keyword_anywhere_cancels_scroll() {
        let mut h = harness_with(InMemoryPage::new(800.0, 1000.0, 800.0, 1.0e9), false);
        for phrase in ["please stop scrolling", "stop scrolling now", "stop the scroll", "Cancel that."] {
            h.assistant.handle_transcript("auto scroll down").await.unwrap();
            assert!(lock(h.assistant.engine()).is_currently_scrolling());

            let reply = h.assistant.handle_transcript(phrase).await.unwrap();
            assert_eq!(reply.text, "Stopped scrolling.", "{}", phrase);
            assert_eq!(reply.intent, Some(Intent::Scroll));
            assert!(!lock(h.assistant.engine()).is_currently_scrolling(), "{}", phrase);
        }
        assert!(h.generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_music_goes_to_media_control() {
        let mut h = harness();
        let reply = h.assistant.handle_transcript("stop music").await.unwrap();
        assert_eq!(reply.intent, Some(Intent::Media));
        assert_eq!(
            h.executor.instructions.lock().unwrap()[0],
            AutomationInstruction::Media {
                action: crate::types::MediaAction::Pause,
                level: None
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_executor_error_is_spoken_urgently() {
        let mut h = build_harness(InMemoryPage::new(800.0, 1000.0, 800.0, 5000.0), false, true);
        let reply = h.assistant.handle_transcript("take a screenshot").await.unwrap();
        assert_eq!(reply.emotion, Emotion::Urgent);
        assert!(reply.text.contains("browser bridge offline"));
        assert_eq!(h.speech.spoken.lock().unwrap()[0].1.emotion, Emotion::Urgent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_scroll_completion_is_observable() {
        let mut h = harness_with(InMemoryPage::new(800.0, 1000.0, 800.0, 1250.0), false);
        h.assistant.handle_transcript("keep scrolling").await.unwrap();
        let result = h.assistant.wait_for_scroll().await.unwrap();
        assert!(result.completed);
        assert_eq!(result.position.y, 250.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_smart_scroll_retries_basic_scroll() {
        let mut h = harness();
        let reply = h.assistant.handle_transcript("scroll to the unicorn gallery").await.unwrap();
        let scroll = reply.scroll.unwrap();
        assert!(scroll.success);
        assert_eq!(scroll.position.y, 300.0);
        assert!(reply.text.contains("not found"));
        assert!(reply.text.ends_with("instead."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_canned_responses() {
        let mut h = harness();
        let reply = h.assistant.handle_transcript("what's the time").await.unwrap();
        assert!(reply.text.starts_with("The current time is"));
        let reply = h.assistant.handle_transcript("hello jarvis").await.unwrap();
        assert_eq!(reply.emotion, Emotion::Excited);
        let reply = h.assistant.handle_transcript("help").await.unwrap();
        assert_eq!(reply.text, automation_help());
        let reply = h.assistant.handle_transcript("stop").await.unwrap();
        assert_eq!(reply.text, "Nothing is scrolling right now.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcript_export() {
        let mut h = harness();
        h.assistant.handle_transcript("thanks").await.unwrap();
        let json = h.assistant.export_transcript().unwrap();
        let messages: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["content"], "You're welcome!");
    }
}
