//! Remote Oracle
//!
//! Asks a streaming text-completion service for the torques. The whole
//! recorded dataset goes into the prompt as context and the model is told to
//! answer with just two numbers. Fragments are concatenated in arrival order
//! and parsed once the stream ends; any failure on the way falls back to
//! gravity torque for that step.

use log::{debug, warn};
use mechanics::TwoLinkArm;
use simcore::{ArmState, JointTorques, QueryVector, TorqueOracle, QUERY_HEADER};

use crate::error::OracleError;
use crate::oracle::{gravity_fallback, OracleStats};
use crate::parser::parse_torques_detailed;

/// Leading instruction of every torque prompt.
pub const PROMPT_INSTRUCTION: &str = "I give a reference line and a data table. \
Find the closest line of theta numbers as key in the table for the reference number. \
Give me the torques. Give me just the two numbers, nothing else.";

/// System message sent alongside every torque prompt.
pub const SYSTEM_INSTRUCTION: &str = "Give me just the two torques, nothing else. \
Do not include thinking between tags in the answer.";

/// Lazy, finite sequence of response fragments. Not restartable.
pub type FragmentStream<'a> = Box<dyn Iterator<Item = Result<String, OracleError>> + 'a>;

/// Capability to turn a prompt into a stream of completion text.
pub trait CompletionTransport {
    fn stream(&mut self, system: &str, prompt: &str) -> Result<FragmentStream<'_>, OracleError>;
}

impl<T: CompletionTransport + ?Sized> CompletionTransport for Box<T> {
    fn stream(&mut self, system: &str, prompt: &str) -> Result<FragmentStream<'_>, OracleError> {
        (**self).stream(system, prompt)
    }
}

/// Progress of one streamed response, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent<'a> {
    Fragment(&'a str),
    Finished,
}

/// Builds the user prompt: instruction, key header, query line, then the
/// dataset text after a blank line.
pub fn build_prompt(query: &QueryVector, context: &str) -> String {
    format!(
        "{PROMPT_INSTRUCTION}\n{QUERY_HEADER}\n{}\n\n{context}",
        query.to_tsv()
    )
}

pub struct RemoteOracle<T: CompletionTransport> {
    arm: TwoLinkArm,
    transport: T,
    context: String,
    system_instruction: String,
    observer: Option<Box<dyn FnMut(StreamEvent<'_>)>>,
    stats: OracleStats,
}

impl<T: CompletionTransport> RemoteOracle<T> {
    /// `context` is the raw dataset text appended to each prompt.
    pub fn new(arm: TwoLinkArm, transport: T, context: impl Into<String>) -> Self {
        Self {
            arm,
            transport,
            context: context.into(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            observer: None,
            stats: OracleStats::default(),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Called with every fragment as it arrives and once when the stream ends.
    pub fn with_observer(mut self, observer: impl FnMut(StreamEvent<'_>) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn stats(&self) -> OracleStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends one prompt and returns the concatenated response text.
    ///
    /// Once the request is under way the observer sees `Finished` exactly
    /// once, even when the stream breaks off.
    pub fn complete(&mut self, prompt: &str) -> Result<String, OracleError> {
        let stream = self.transport.stream(&self.system_instruction, prompt)?;
        let mut text = String::new();
        let mut broken = None;
        for fragment in stream {
            match fragment {
                Ok(fragment) if fragment.is_empty() => {}
                Ok(fragment) => {
                    if let Some(observer) = self.observer.as_mut() {
                        observer(StreamEvent::Fragment(&fragment));
                    }
                    text.push_str(&fragment);
                }
                Err(err) => {
                    broken = Some(err);
                    break;
                }
            }
        }
        if let Some(observer) = self.observer.as_mut() {
            observer(StreamEvent::Finished);
        }
        match broken {
            Some(err) => Err(err),
            None => Ok(text),
        }
    }
}

impl<T: CompletionTransport> TorqueOracle for RemoteOracle<T> {
    fn resolve(&mut self, query: &QueryVector, _state: &ArmState) -> JointTorques {
        let prompt = build_prompt(query, &self.context);

        let text = match self.complete(&prompt) {
            Ok(text) => text,
            Err(err) => {
                warn!("torque request failed ({err}), using gravitational torques");
                self.stats.fallbacks += 1;
                return gravity_fallback(&self.arm, query);
            }
        };

        match parse_torques_detailed(&text) {
            Some(parsed) => {
                debug!("parsed torques via {:?}", parsed.strategy);
                self.stats.answered += 1;
                parsed.torques
            }
            None => {
                warn!("Could not parse torques from response: {text}");
                self.stats.fallbacks += 1;
                gravity_fallback(&self.arm, query)
            }
        }
    }
}
