//! Tab-separated and JSON trajectory output.

use std::io::{self, Write};

use simcore::{Transition, TRANSITION_HEADER};

use crate::driver::SimulationOutcome;

/// Writes a header line then one row per transition, in step order.
/// The result is loadable as a dataset.
pub fn write_dataset<W: Write>(mut out: W, transitions: &[Transition]) -> io::Result<()> {
    writeln!(out, "{TRANSITION_HEADER}")?;
    for transition in transitions {
        writeln!(out, "{}", transition.to_tsv())?;
    }
    out.flush()
}

pub fn write_json<W: Write>(out: W, outcome: &SimulationOutcome) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(out, outcome)
}

/// Streams rows while a run is in progress. Write failures are kept and
/// reported after the run instead of interrupting it.
pub struct TsvEcho<W: Write> {
    out: W,
    header_written: bool,
    error: Option<io::Error>,
}

impl<W: Write> TsvEcho<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
            error: None,
        }
    }

    pub fn row(&mut self, transition: &Transition) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.write_row(transition) {
            self.error = Some(err);
        }
    }

    fn write_row(&mut self, transition: &Transition) -> io::Result<()> {
        if !self.header_written {
            writeln!(self.out, "{TRANSITION_HEADER}")?;
            self.header_written = true;
        }
        writeln!(self.out, "{}", transition.to_tsv())?;
        self.out.flush()
    }

    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use control::Dataset;
    use simcore::{JointTorques, QueryVector};

    fn transitions() -> Vec<Transition> {
        vec![
            Transition::new(
                QueryVector::new((0.5, 0.5), (0.5, 0.5), (0.497, 0.498)),
                JointTorques::new(-30.1, -12.0),
            ),
            Transition::new(
                QueryVector::new((0.5, 0.5), (0.497, 0.498), (0.491, 0.494)),
                JointTorques::new(-29.7, -11.9),
            ),
        ]
    }

    #[test]
    fn test_dataset_output_loads_back() {
        let mut buffer = Vec::new();
        write_dataset(&mut buffer, &transitions()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with(TRANSITION_HEADER));

        let dataset = Dataset::parse(&text);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.entries()[1].tau1, -29.7);
        assert_eq!(dataset.entries()[1].end_theta2, 0.494);
    }

    #[test]
    fn test_echo_writes_header_once() {
        let mut echo = TsvEcho::new(Vec::new());
        for t in &transitions() {
            echo.row(t);
        }
        let text = String::from_utf8(echo.finish().unwrap()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.matches("Prev_Theta1").count(), 1);
    }

    #[test]
    fn test_json_lists_transitions() {
        use crate::driver::Phase;
        use simcore::ArmState;

        let outcome = SimulationOutcome {
            termination: Phase::Exhausted,
            final_state: ArmState::at_rest(0.491, 0.494),
            transitions: transitions(),
        };
        let mut buffer = Vec::new();
        write_json(&mut buffer, &outcome).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["termination"], "Exhausted");
        assert_eq!(value["transitions"].as_array().unwrap().len(), 2);
        assert_eq!(value["transitions"][0]["tau2"], -12.0);
    }
}
