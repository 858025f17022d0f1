//! Python bindings for the command parser and scroll phrase parser using PyO3

use crate::config::EngineConfig;
use crate::parser::{automation_help, command_examples, CommandParser};
use crate::phrases::{PageMetrics, ScrollPhraseParser};
use crate::router::{route_command, search_url};
use crate::types::Command;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> PyResult<String> {
    serde_json::to_string(value)
        .map_err(|e| PyErr::new::<PyValueError, _>(format!("Failed to serialize {}: {}", what, e)))
}

fn command_dict<'py>(py: Python<'py>, command: &Command) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("intent", command.intent().as_str())?;
    dict.set_item("confidence", command.confidence)?;
    // Parameters travel as JSON, keyed like the serialized command
    dict.set_item("parameters", to_json(&command.kind, "parameters")?)?;
    Ok(dict)
}

/// Parse a transcript with the shared pattern table (Python function)
#[pyfunction]
pub fn py_parse_command<'py>(py: Python<'py>, input: &str) -> PyResult<Bound<'py, PyDict>> {
    command_dict(py, &crate::parser::parse_command(input))
}

#[pyfunction]
pub fn py_automation_help() -> &'static str {
    automation_help()
}

#[pyfunction]
pub fn py_command_examples() -> Vec<&'static str> {
    command_examples().to_vec()
}

/// Python wrapper for the command parser
#[pyclass]
pub struct PyCommandParser {
    parser: CommandParser,
}

#[pymethods]
impl PyCommandParser {
    #[new]
    fn new() -> Self {
        Self {
            parser: CommandParser::new(),
        }
    }

    /// Classify a transcript into intent, confidence and parameters
    fn parse<'py>(&self, input: &str, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        command_dict(py, &self.parser.parse(input))
    }

    /// Automation instruction as JSON, or None for conversational input
    fn route(&self, input: &str) -> PyResult<Option<String>> {
        route_command(&self.parser.parse(input))
            .map(|instruction| to_json(&instruction, "instruction"))
            .transpose()
    }

    fn search_url(&self, input: &str) -> Option<String> {
        search_url(&self.parser.parse(input))
    }

    /// Number of patterns in the table
    fn len(&self) -> usize {
        self.parser.patterns().len()
    }
}

/// Python wrapper for voice scroll phrases
#[pyclass]
pub struct PyScrollPhraseParser {
    parser: ScrollPhraseParser,
    config: EngineConfig,
}

#[pymethods]
impl PyScrollPhraseParser {
    #[new]
    fn new() -> Self {
        Self {
            parser: ScrollPhraseParser::new(),
            config: EngineConfig::default(),
        }
    }

    /// Scroll command as JSON, or None when the phrase is not a scroll
    #[pyo3(signature = (text, current_percentage = 0.0, max_scroll_y = 0.0))]
    fn parse(&self, text: &str, current_percentage: f64, max_scroll_y: f64) -> PyResult<Option<String>> {
        let metrics = PageMetrics {
            percentage: current_percentage,
            max_scroll_y,
        };
        self.parser
            .parse(text, metrics, &self.config)
            .map(|command| to_json(&command, "scroll command"))
            .transpose()
    }
}
