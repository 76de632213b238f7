//! Sandbox configuration with builder pattern.

use std::path::PathBuf;

use crate::error::{Result, SandboxError};

/// Default location of the RustPython interpreter module.
pub const DEFAULT_INTERPRETER_PATH: &str = "assets/rustpython.wasm";

/// Default number of bytes each capture buffer accepts.
pub const DEFAULT_CAPTURE_CAPACITY: usize = 16 * 1024 * 1024;

/// Configuration for the Python runner.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Where the interpreter's support file (the RustPython wasm) lives.
    pub interpreter_path: PathBuf,
    /// Bytes each of the stdout/stderr capture buffers accepts per execution.
    pub capture_capacity: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter_path: PathBuf::from(DEFAULT_INTERPRETER_PATH),
            capture_capacity: DEFAULT_CAPTURE_CAPACITY,
        }
    }
}

impl SandboxConfig {
    /// Create a new builder for SandboxConfig.
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }

    /// Reject settings the interpreter cannot be brought up with.
    pub fn validate(&self) -> Result<()> {
        if self.interpreter_path.as_os_str().is_empty() {
            return Err(SandboxError::Config(
                "interpreter path must not be empty".to_string(),
            ));
        }
        if self.capture_capacity == 0 {
            return Err(SandboxError::Config(
                "capture capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for creating SandboxConfig instances.
#[derive(Debug, Clone, Default)]
pub struct SandboxConfigBuilder {
    interpreter_path: Option<PathBuf>,
    capture_capacity: Option<usize>,
}

impl SandboxConfigBuilder {
    /// Set the path to the RustPython wasm interpreter.
    pub fn interpreter_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter_path = Some(path.into());
        self
    }

    /// Set how many bytes each capture buffer accepts.
    pub fn capture_capacity(mut self, bytes: usize) -> Self {
        self.capture_capacity = Some(bytes);
        self
    }

    /// Build the SandboxConfig.
    pub fn build(self) -> SandboxConfig {
        let default = SandboxConfig::default();
        SandboxConfig {
            interpreter_path: self.interpreter_path.unwrap_or(default.interpreter_path),
            capture_capacity: self.capture_capacity.unwrap_or(default.capture_capacity),
        }
    }
}
