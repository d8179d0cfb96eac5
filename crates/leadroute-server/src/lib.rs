//! Lead routing HTTP server library
//!
//! Provides REST API components for testing and reuse.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
