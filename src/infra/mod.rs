//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod http;
pub mod markdown;
pub mod notion;
pub mod telemetry;
