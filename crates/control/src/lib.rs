//! Torque sources for the two-link arm
//!
//! This crate provides:
//! - A response parser that pulls two torques out of free-form text
//! - A recorded-transition dataset with nearest-neighbor lookup
//! - Torque oracles: remote (text completion), local (dataset), PD and zero

pub mod dataset;
pub mod error;
pub mod oracle;
pub mod parser;
pub mod pd;
pub mod remote;

pub use dataset::{Dataset, DatasetEntry, NearestMatch};
pub use error::{DatasetError, OracleError};
pub use oracle::{LocalOracle, OracleStats, ZeroOracle};
pub use parser::{parse_torques, parse_torques_detailed, ParseStrategy, ParsedTorques};
pub use pd::{PdConfig, PdOracle};
pub use remote::{
    build_prompt, CompletionTransport, FragmentStream, RemoteOracle, StreamEvent,
    PROMPT_INSTRUCTION, SYSTEM_INSTRUCTION,
};
