//! JARVIS core - voice command parsing and browser scroll automation
//!
//! Turns speech transcripts into typed commands with an ordered pattern
//! table, routes them onto automation instructions, and runs page scrolling
//! (single, continuous and content-aware) against an abstract [`Viewport`].
//! The [`assistant`] module ties these together behind collaborator traits
//! for speech output, AI responses and automation.

pub mod assistant;
pub mod clock;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod page;
pub mod parser;
pub mod phrases;
pub mod router;
pub mod types;
pub mod viewport;

pub use assistant::{
    AiResponse, Assistant, AutomationExecutor, Collaborators, Emotion, ExecutionOutcome, Message, Reply,
    ResponseGenerator, Role, SpeakOptions, SpeechOutput,
};
pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use config::{AssistantConfig, EngineConfig};
pub use driver::{drive, shared, spawn_driver, SharedScrollEngine};
pub use engine::{PositionSample, ScrollEngine};
pub use error::{AssistantError, ConfigError, ViewportError};
pub use page::{InMemoryPage, PageElement};
pub use parser::{automation_help, command_examples, parse_command, CommandParser, PatternEntry};
pub use phrases::{PageMetrics, ScrollPhraseParser};
pub use router::{route_command, search_url};
pub use types::*;
pub use viewport::{ElementId, Rect, ScrollBehavior, ScrollBlock, Viewport};

// Python bindings
#[cfg(feature = "python")]
pub mod py;

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn jarvis_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use py::*;
    m.add_class::<PyCommandParser>()?;
    m.add_class::<PyScrollPhraseParser>()?;
    m.add_function(wrap_pyfunction!(py_parse_command, m)?)?;
    m.add_function(wrap_pyfunction!(py_automation_help, m)?)?;
    m.add_function(wrap_pyfunction!(py_command_examples, m)?)?;
    Ok(())
}
