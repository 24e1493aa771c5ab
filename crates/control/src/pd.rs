//! PD Oracle
//!
//! Gravity torque plus a per-joint proportional-derivative correction toward
//! the upright pose, scaled by a random factor to imitate actuator noise.
//! Used to record the datasets the other oracles learn from.

use mechanics::TwoLinkArm;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use simcore::{ArmState, JointTorques, QueryVector, TorqueOracle};

/// Configuration for the PD oracle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdConfig {
    /// Proportional gain, joint 1
    pub kp1: f64,
    /// Derivative gain, joint 1
    pub kd1: f64,
    /// Proportional gain, joint 2
    pub kp2: f64,
    /// Derivative gain, joint 2
    pub kd2: f64,
    /// Relative noise amplitude on the correction (0.1 = ±10%), in 0.1% steps
    pub noise: f64,
}

impl Default for PdConfig {
    fn default() -> Self {
        Self {
            kp1: 50.0,
            kd1: 20.0,
            kp2: 50.0,
            kd2: 20.0,
            noise: 0.1,
        }
    }
}

impl PdConfig {
    /// Same noiseless gains on both joints
    pub fn pd(kp: f64, kd: f64) -> Self {
        Self {
            kp1: kp,
            kd1: kd,
            kp2: kp,
            kd2: kd,
            noise: 0.0,
        }
    }

    /// Set noise amplitude
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.max(0.0);
        self
    }

    /// Override the second joint's gains
    pub fn with_joint2(mut self, kp: f64, kd: f64) -> Self {
        self.kp2 = kp;
        self.kd2 = kd;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PdOracle {
    arm: TwoLinkArm,
    config: PdConfig,
    rng: StdRng,
}

impl PdOracle {
    /// Without a seed the noise is drawn from OS entropy.
    pub fn new(arm: TwoLinkArm, config: PdConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { arm, config, rng }
    }

    /// Multiplier in `[1 - noise, 1 + noise]`, quantized to 0.001.
    fn noise_factor(&mut self) -> f64 {
        let span = (self.config.noise * 1000.0).round() as i64;
        if span <= 0 {
            return 1.0;
        }
        1.0 + self.rng.gen_range(-span..=span) as f64 / 1000.0
    }

    /// PD correction alone, noise applied.
    pub fn control_torques(&mut self, state: &ArmState) -> JointTorques {
        let c = self.config;
        let tau1 = (-c.kp1 * state.theta1 - c.kd1 * state.omega1) * self.noise_factor();
        let tau2 = (-c.kp2 * state.theta2 - c.kd2 * state.omega2) * self.noise_factor();
        JointTorques::new(tau1, tau2)
    }
}

impl TorqueOracle for PdOracle {
    fn resolve(&mut self, _query: &QueryVector, state: &ArmState) -> JointTorques {
        let gravity = self.arm.gravitational_torques(state.theta1, state.theta2);
        let control = self.control_torques(state);
        JointTorques::new(gravity.tau1 + control.tau1, gravity.tau2 + control.tau2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn state() -> ArmState {
        ArmState {
            theta1: 0.3,
            theta2: -0.2,
            omega1: 0.5,
            omega2: 1.0,
        }
    }

    #[test]
    fn test_noiseless_pd_law() {
        let arm = TwoLinkArm::default();
        let mut oracle = PdOracle::new(arm.clone(), PdConfig::pd(50.0, 20.0), Some(1));
        let tau = oracle.resolve(&QueryVector::default(), &state());
        let gravity = arm.gravitational_torques(0.3, -0.2);

        assert_relative_eq!(tau.tau1, gravity.tau1 + (-15.0 - 10.0), epsilon = 1e-12);
        assert_relative_eq!(tau.tau2, gravity.tau2 + (10.0 - 20.0), epsilon = 1e-12);
    }

    #[test]
    fn test_noise_stays_within_band() {
        let mut oracle = PdOracle::new(TwoLinkArm::default(), PdConfig::default(), Some(7));
        let clean = PdOracle::new(TwoLinkArm::default(), PdConfig::pd(50.0, 20.0), None)
            .control_torques(&state());
        for _ in 0..500 {
            let noisy = oracle.control_torques(&state());
            let ratio1 = noisy.tau1 / clean.tau1;
            let ratio2 = noisy.tau2 / clean.tau2;
            assert!((0.9 - 1e-12..=1.1 + 1e-12).contains(&ratio1));
            assert!((0.9 - 1e-12..=1.1 + 1e-12).contains(&ratio2));
        }
    }

    #[test]
    fn test_seed_reproduces_noise() {
        let mut a = PdOracle::new(TwoLinkArm::default(), PdConfig::default(), Some(42));
        let mut b = PdOracle::new(TwoLinkArm::default(), PdConfig::default(), Some(42));
        for _ in 0..20 {
            let q = QueryVector::default();
            assert_eq!(a.resolve(&q, &state()), b.resolve(&q, &state()));
        }
    }

    #[test]
    fn test_gains_at_upright_rest_are_zero() {
        let mut oracle = PdOracle::new(TwoLinkArm::default(), PdConfig::default(), Some(3));
        let tau = oracle.resolve(&QueryVector::default(), &ArmState::default());
        assert_eq!(tau.tau1, 0.0);
        assert_eq!(tau.tau2, 0.0);
    }

    #[test]
    fn test_builder() {
        let config = PdConfig::pd(10.0, 1.0).with_joint2(5.0, 0.5).with_noise(-1.0);
        assert_eq!(config.kp1, 10.0);
        assert_eq!(config.kp2, 5.0);
        assert_eq!(config.kd2, 0.5);
        assert_eq!(config.noise, 0.0);
    }
}
