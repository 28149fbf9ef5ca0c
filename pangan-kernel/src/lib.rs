//! PenyelamatPangan kernel: simulated spoilage sensor readings behind an axum API.

pub mod config;
pub mod contracts;
pub mod health;
pub mod http;
pub mod models;
pub mod synth;
