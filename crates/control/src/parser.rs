//! Response Parser
//!
//! Pulls a pair of torques out of unstructured completion text. Strategies
//! are tried in a fixed priority order and the first one that yields a pair
//! wins:
//!
//! 1. any two standalone numbers, in order of appearance
//! 2. a comma-separated pair
//! 3. a newline-separated pair
//! 4. a tab-separated pair
//!
//! The separator patterns match raw digits wherever they occur, so they
//! recover pairs glued to surrounding text that the first strategy skips.

use std::sync::LazyLock;

use regex::Regex;
use simcore::JointTorques;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+\.?\d*").expect("valid number pattern"));
static COMMA_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+\.?\d*)\s*,\s*(-?\d+\.?\d*)").expect("valid comma pattern")
});
static NEWLINE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+\.?\d*)\s*[\n\r]+\s*(-?\d+\.?\d*)").expect("valid newline pattern")
});
static TAB_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+\.?\d*)\s*\t\s*(-?\d+\.?\d*)").expect("valid tab pattern")
});

/// Extraction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// First two standalone numbers anywhere in the text
    AnyTwoNumbers,
    /// `a, b`
    CommaPair,
    /// `a` and `b` on consecutive lines
    NewlinePair,
    /// `a<TAB>b`
    TabPair,
}

impl ParseStrategy {
    /// Order in which strategies are tried.
    pub const PRIORITY: [ParseStrategy; 4] = [
        ParseStrategy::AnyTwoNumbers,
        ParseStrategy::CommaPair,
        ParseStrategy::NewlinePair,
        ParseStrategy::TabPair,
    ];

    /// Runs this single strategy against `text`.
    pub fn apply(self, text: &str) -> Option<(f64, f64)> {
        match self {
            ParseStrategy::AnyTwoNumbers => {
                let mut numbers = standalone_numbers(text);
                let first = numbers.next()?;
                let second = numbers.next()?;
                Some((first, second))
            }
            ParseStrategy::CommaPair => captured_pair(&COMMA_PAIR, text),
            ParseStrategy::NewlinePair => captured_pair(&NEWLINE_PAIR, text),
            ParseStrategy::TabPair => captured_pair(&TAB_PAIR, text),
        }
    }
}

/// Torques extracted from text, with the strategy that found them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedTorques {
    pub torques: JointTorques,
    pub strategy: ParseStrategy,
}

/// Returns the first torque pair any strategy extracts, or `None` when the
/// text holds no usable pair.
pub fn parse_torques(text: &str) -> Option<JointTorques> {
    parse_torques_detailed(text).map(|parsed| parsed.torques)
}

pub fn parse_torques_detailed(text: &str) -> Option<ParsedTorques> {
    ParseStrategy::PRIORITY.iter().find_map(|&strategy| {
        strategy.apply(text).map(|pair| ParsedTorques {
            torques: JointTorques::from(pair),
            strategy,
        })
    })
}

/// Numbers that do not end an identifier such as `tau1` or `x_2`.
/// A trailing unit (`4.55Nm`) does not disqualify a number.
fn standalone_numbers(text: &str) -> impl Iterator<Item = f64> + '_ {
    NUMBER
        .find_iter(text)
        .filter(move |m| {
            let before = text[..m.start()].chars().next_back();
            !before.is_some_and(|c| c.is_alphanumeric() || c == '_')
        })
        .filter_map(|m| to_f64(m.as_str()))
}

fn captured_pair(pattern: &Regex, text: &str) -> Option<(f64, f64)> {
    let caps = pattern.captures(text)?;
    let first = to_f64(caps.get(1)?.as_str())?;
    let second = to_f64(caps.get(2)?.as_str())?;
    Some((first, second))
}

// "12." is a valid match of the number pattern
fn to_f64(token: &str) -> Option<f64> {
    token.trim_end_matches('.').parse().ok()
}
