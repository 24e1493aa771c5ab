//! Parser-contract probe
//!
//! Sends one fixed query plus a question file to the completion service and
//! checks that the model answers with exactly the expected pair of torques.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use control::{parse_torques, CompletionTransport, RemoteOracle};
use log::info;
use mechanics::TwoLinkArm;
use simcore::{JointTorques, QueryVector};

use crate::error::{AppError, Result};

pub const PROBE_QUERY: [f64; 6] = [0.551393, 0.531838, 0.553141, 0.532356, 0.553141, 0.532356];

pub const PROBE_COMMAND: &str = "Find the best matching line for these theta numbers \
in the dataset below. Give me the torques. Give me just the two numbers, nothing else.";

pub const PROBE_SYSTEM: &str = "Extract only the two torque values from the dataset \
that best match the given theta values. Respond with only the two numbers separated by \
a space or tab.";

pub const DEFAULT_QUESTION: &str = "Provide the torques for these values.";

pub const DEFAULT_EXPECTED: &str = "4.55 2.48";

pub fn build_probe_question(content: &str) -> String {
    let query = QueryVector::from_array(PROBE_QUERY);
    format!("{PROBE_COMMAND}\n{}\n\n{content}", query.to_tsv())
}

/// Reads the question file, creating it with the default question if absent.
pub fn read_or_create_question(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text.trim().to_string()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            fs::write(path, DEFAULT_QUESTION).map_err(|err| AppError::io(path, err))?;
            info!("created {} with default content", path.display());
            Ok(DEFAULT_QUESTION.to_string())
        }
        Err(err) => Err(AppError::io(path, err)),
    }
}

/// Collapses every whitespace run to one space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub response: String,
    pub cleaned: String,
    pub expected: String,
    /// What the response parser makes of the raw response
    pub parsed: Option<JointTorques>,
}

impl ProbeReport {
    pub fn new(response: String, expected: impl Into<String>) -> Self {
        Self {
            cleaned: normalize_whitespace(&response),
            parsed: parse_torques(&response),
            expected: expected.into(),
            response,
        }
    }

    pub fn passed(&self) -> bool {
        self.cleaned == self.expected
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            write!(f, "PASS")
        } else {
            write!(f, "FAIL: Expected '{}', got '{}'", self.expected, self.cleaned)
        }
    }
}

/// Runs the probe. Unlike a simulation step, a failed request is an error here.
pub fn run_probe<T: CompletionTransport>(
    oracle: &mut RemoteOracle<T>,
    content: &str,
    expected: &str,
) -> Result<ProbeReport> {
    let response = oracle.complete(&build_probe_question(content))?;
    Ok(ProbeReport::new(response, expected))
}

/// Remote oracle configured with the probe's system instruction.
pub fn probe_oracle<T: CompletionTransport>(transport: T) -> RemoteOracle<T> {
    RemoteOracle::new(TwoLinkArm::default(), transport, "").with_system_instruction(PROBE_SYSTEM)
}
