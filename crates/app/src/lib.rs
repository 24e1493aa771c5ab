//! arm-sim application: configuration, the simulation driver, the HTTP
//! transport for the remote oracle and output writers.

pub mod config;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod logging;
pub mod output;
pub mod probe;
pub mod transport;

pub use config::AppConfig;
pub use driver::{DriverConfig, Episode, Phase, Simulation, SimulationOutcome};
pub use error::{AppError, Result};
pub use logging::init_logging;
pub use transport::{ChatCompletionsTransport, TransportConfig};
