pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod rl;

pub use config::{AppConfig, LoggingConfig};
pub use domain::{PricePoint, PriceSeries, SyntheticPriceConfig};
pub use error::{ArbError, Result};
pub use rl::{
    Action, Agent, BatteryEnvironment, EnvironmentConfig, Observation, StepResult,
    TrainableAgent,
};
