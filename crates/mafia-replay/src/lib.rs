pub mod config;
pub mod logging;
pub mod replay;
pub mod telemetry;
