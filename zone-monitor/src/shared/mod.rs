/// Shared modules for the zone monitor dashboard
pub mod aggregation;
pub mod config;
pub mod error;
pub mod poller;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod weather;
