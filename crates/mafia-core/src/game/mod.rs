pub mod config;
pub mod parser;
pub mod report;
pub mod session;
pub mod voting;
