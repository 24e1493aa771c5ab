use nalgebra::Vector6;
use serde::{Deserialize, Serialize};

// Mechanical State

/// Joint angles (rad) and angular velocities (rad/s) of the two-link arm.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ArmState {
    pub theta1: f64,
    pub theta2: f64,
    pub omega1: f64,
    pub omega2: f64,
}

impl ArmState {
    /// Arm held still at the given angles.
    pub fn at_rest(theta1: f64, theta2: f64) -> Self {
        ArmState {
            theta1,
            theta2,
            omega1: 0.0,
            omega2: 0.0,
        }
    }

    pub fn angles(&self) -> (f64, f64) {
        (self.theta1, self.theta2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointTorques {
    pub tau1: f64,
    pub tau2: f64,
}

impl JointTorques {
    pub const ZERO: JointTorques = JointTorques { tau1: 0.0, tau2: 0.0 };

    pub fn new(tau1: f64, tau2: f64) -> Self {
        JointTorques { tau1, tau2 }
    }
}

impl From<(f64, f64)> for JointTorques {
    fn from((tau1, tau2): (f64, f64)) -> Self {
        JointTorques { tau1, tau2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAccelerations {
    pub alpha1: f64,
    pub alpha2: f64,
}

// Oracle Interface

/// Column names of the six-angle key, in key order.
pub const QUERY_HEADER: &str =
    "Prev_Theta1\tPrev_Theta2\tStart_Theta1\tStart_Theta2\tEnd_Theta1\tEnd_Theta2";

/// Column names of a recorded transition row.
pub const TRANSITION_HEADER: &str = "Prev_Theta1\tPrev_Theta2\tStart_Theta1\tStart_Theta2\t\
End_Theta1\tEnd_Theta2\tTorque1\tTorque2";

/// Six-angle key shared by prompts, dataset rows and nearest-neighbor search.
///
/// The ordering is fixed: previous step's start angles, this step's start
/// angles, then the current angles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryVector {
    pub prev_theta1: f64,
    pub prev_theta2: f64,
    pub start_theta1: f64,
    pub start_theta2: f64,
    pub end_theta1: f64,
    pub end_theta2: f64,
}

impl QueryVector {
    pub fn new(prev: (f64, f64), start: (f64, f64), end: (f64, f64)) -> Self {
        QueryVector {
            prev_theta1: prev.0,
            prev_theta2: prev.1,
            start_theta1: start.0,
            start_theta2: start.1,
            end_theta1: end.0,
            end_theta2: end.1,
        }
    }

    pub fn from_array(values: [f64; 6]) -> Self {
        QueryVector::new(
            (values[0], values[1]),
            (values[2], values[3]),
            (values[4], values[5]),
        )
    }

    pub fn to_vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.prev_theta1,
            self.prev_theta2,
            self.start_theta1,
            self.start_theta2,
            self.end_theta1,
            self.end_theta2,
        )
    }

    /// Euclidean distance in six-angle space.
    pub fn distance(&self, other: &QueryVector) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    pub fn prev_angles(&self) -> (f64, f64) {
        (self.prev_theta1, self.prev_theta2)
    }

    pub fn start_angles(&self) -> (f64, f64) {
        (self.start_theta1, self.start_theta2)
    }

    pub fn end_angles(&self) -> (f64, f64) {
        (self.end_theta1, self.end_theta2)
    }

    /// The angles the arm is at when the query is made.
    pub fn current_angles(&self) -> (f64, f64) {
        self.end_angles()
    }

    /// Tab-separated line with six decimals per angle.
    pub fn to_tsv(&self) -> String {
        format!(
            "{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
            self.prev_theta1,
            self.prev_theta2,
            self.start_theta1,
            self.start_theta2,
            self.end_theta1,
            self.end_theta2
        )
    }
}

/// Record of one completed simulation step. Also the row type of a recorded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transition {
    pub prev_theta1: f64,
    pub prev_theta2: f64,
    pub start_theta1: f64,
    pub start_theta2: f64,
    pub end_theta1: f64,
    pub end_theta2: f64,
    pub tau1: f64,
    pub tau2: f64,
}

impl Transition {
    /// Builds a record from the step's key (with `end_*` already holding the
    /// post-step angles) and the torques applied during the step.
    pub fn new(key: QueryVector, torques: JointTorques) -> Self {
        Transition {
            prev_theta1: key.prev_theta1,
            prev_theta2: key.prev_theta2,
            start_theta1: key.start_theta1,
            start_theta2: key.start_theta2,
            end_theta1: key.end_theta1,
            end_theta2: key.end_theta2,
            tau1: torques.tau1,
            tau2: torques.tau2,
        }
    }

    pub fn key(&self) -> QueryVector {
        QueryVector {
            prev_theta1: self.prev_theta1,
            prev_theta2: self.prev_theta2,
            start_theta1: self.start_theta1,
            start_theta2: self.start_theta2,
            end_theta1: self.end_theta1,
            end_theta2: self.end_theta2,
        }
    }

    pub fn torques(&self) -> JointTorques {
        JointTorques::new(self.tau1, self.tau2)
    }

    /// Dataset row: angles with six decimals, torques with two.
    pub fn to_tsv(&self) -> String {
        format!("{}\t{:.2}\t{:.2}", self.key().to_tsv(), self.tau1, self.tau2)
    }
}

// General

#[derive(Debug, Clone, Copy)]
pub struct SimContext {
    pub dt: f64,
    pub t: f64,
    pub step: usize,
}

impl SimContext {
    pub fn new(dt: f64) -> Self {
        SimContext { dt, t: 0.0, step: 0 }
    }

    /// Moves the clock forward by one step.
    pub fn advance(&mut self) {
        self.step += 1;
        self.t = self.step as f64 * self.dt;
    }
}

/// Source of joint torques for one simulation step.
///
/// Implementations must always return a torque pair; failures degrade to a
/// fallback torque inside the implementation and never reach the caller.
pub trait TorqueOracle {
    /// Resolves the torques to apply for the step described by `query`.
    /// `state` is the full arm state at the start of the step.
    fn resolve(&mut self, query: &QueryVector, state: &ArmState) -> JointTorques;
}

impl<F> TorqueOracle for F
where
    F: FnMut(&QueryVector, &ArmState) -> JointTorques,
{
    fn resolve(&mut self, query: &QueryVector, state: &ArmState) -> JointTorques {
        self(query, state)
    }
}
