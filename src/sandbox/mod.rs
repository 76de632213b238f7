//! Sandbox module containing all execution-related components.

pub mod config;
pub mod executor;
pub mod interpreter;
pub mod io;
