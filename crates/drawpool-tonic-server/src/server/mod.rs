pub mod config;
pub mod oracle;
pub mod service;
pub mod telemetry;
