//! Infrastructure adapters and runtime bootstrap.

pub mod akismet;
pub mod db;
pub mod error;
pub mod telemetry;
