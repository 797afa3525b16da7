pub mod config;
pub mod error;
pub mod fog;
pub mod link;
pub mod mode;
pub mod oracle;
pub mod qos;
pub mod range;
pub mod resource;
pub mod simulation;
pub mod task;
pub mod vehicle;

pub use config::Config;
pub use error::{Result, SimError};
pub use mode::AssignMode;
pub use oracle::MobilityOracle;
pub use simulation::{Simulation, TickReport};
