pub mod arm;

pub use arm::{ArmConfig, TwoLinkArm};
