//! HTTP API surfaces

pub mod rest;
