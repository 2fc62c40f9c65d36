//! ttsbox Core Library
//!
//! Environment-driven runtime configuration, the deployment composition
//! contract, and the engine seam that a text-to-speech backend plugs into.

pub mod compose;
pub mod config;
pub mod engine;
pub mod telemetry;
