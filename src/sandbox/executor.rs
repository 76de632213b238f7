//! The lazily initialized runner and its result type.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SandboxError};
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::interpreter::Interpreter;
use crate::sandbox::io::CaptureScope;

/// Outcome of one [`PythonSandbox::execute`] call.
///
/// Serializes to an object with exactly the keys `output`, `error` and
/// `success`. A failed result never carries output; deserializing one that
/// does is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExecutionResult")]
pub struct ExecutionResult {
    output: String,
    error: String,
    success: bool,
}

/// Wire form of [`ExecutionResult`] before its invariant is checked.
#[derive(Deserialize)]
struct RawExecutionResult {
    output: String,
    error: String,
    success: bool,
}

impl TryFrom<RawExecutionResult> for ExecutionResult {
    type Error = String;

    fn try_from(raw: RawExecutionResult) -> std::result::Result<Self, Self::Error> {
        if raw.success {
            Ok(Self::success(raw.output, raw.error))
        } else if raw.output.is_empty() {
            Ok(Self::failure(raw.error))
        } else {
            Err("a failed execution result cannot carry output".to_string())
        }
    }
}

impl ExecutionResult {
    /// A run that completed; `error` holds whatever the guest wrote to stderr.
    pub fn success(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: error.into(),
            success: true,
        }
    }

    /// A run that failed.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            error: error.into(),
            success: false,
        }
    }

    /// Captured stdout, empty on failure.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Captured stderr or the failure description.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Whether the run completed without raising.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The Python exception described by a failed result, if one can be parsed.
    pub fn exception(&self) -> Option<SandboxError> {
        if self.success {
            return None;
        }
        SandboxError::from_python_stderr(&self.error)
    }
}

/// A Python runner that brings its interpreter up on first use.
///
/// The sandbox exclusively owns its interpreter. `init` and `execute` take
/// `&mut self`, so calls on one instance are serialized by construction; wrap
/// the sandbox in a `tokio::sync::Mutex` to share it between tasks.
///
/// There is no deadline: guest code that never finishes keeps its `execute`
/// call pending.
#[derive(Debug)]
pub struct PythonSandbox {
    config: SandboxConfig,
    interpreter: Option<Arc<Interpreter>>,
}

impl PythonSandbox {
    /// Create an uninitialized sandbox. Nothing is loaded until the first
    /// [`init`](Self::init) or [`execute`](Self::execute).
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            interpreter: None,
        }
    }

    /// The configuration this sandbox was created with.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Whether the interpreter has been loaded.
    pub fn is_ready(&self) -> bool {
        self.interpreter.is_some()
    }

    /// Load the interpreter if it is not loaded yet.
    ///
    /// Calls after the first success return immediately. On failure the
    /// sandbox stays uninitialized and a later call retries.
    pub async fn init(&mut self) -> Result<()> {
        self.ready_interpreter().await.map(|_| ())
    }

    async fn ready_interpreter(&mut self) -> Result<Arc<Interpreter>> {
        if let Some(interpreter) = &self.interpreter {
            return Ok(Arc::clone(interpreter));
        }

        debug!(path = %self.config.interpreter_path.display(), "initializing interpreter");
        let config = self.config.clone();
        let interpreter = tokio::task::spawn_blocking(move || Interpreter::load(&config))
            .await
            .map_err(|e| {
                SandboxError::Initialization(anyhow::anyhow!("interpreter load task failed: {e}"))
            })??;

        let interpreter = Arc::new(interpreter);
        self.interpreter = Some(Arc::clone(&interpreter));
        Ok(interpreter)
    }

    /// Run `code` and report what it printed.
    ///
    /// Never fails: initialization errors, guest exceptions and host errors
    /// all come back as a result with `success == false`.
    pub async fn execute(&mut self, code: &str) -> ExecutionResult {
        let interpreter = match self.ready_interpreter().await {
            Ok(interpreter) => interpreter,
            Err(e) => return ExecutionResult::failure(e.to_string()),
        };

        let code = code.to_owned();
        let capacity = self.config.capture_capacity;
        let run = tokio::task::spawn_blocking(move || {
            let capture = CaptureScope::new(capacity);
            let status = interpreter.run(&code, &capture);
            (capture, status)
        })
        .await;

        if let Ok((capture, _)) = &run {
            if let Err(overflow) = capture.check_capacity() {
                warn!(error = %overflow, "discarding truncated capture");
                return ExecutionResult::failure(overflow.to_string());
            }
        }

        match run {
            Ok((capture, Ok(()))) => {
                let streams = capture.collect();
                debug!(
                    stdout = streams.stdout.len(),
                    stderr = streams.stderr.len(),
                    "execution completed"
                );
                ExecutionResult::success(streams.stdout, streams.stderr)
            }
            Ok((capture, Err(failure))) => {
                debug!(error = %failure, "execution failed");
                let error = capture.recover_stderr().unwrap_or_else(|recovery| {
                    debug!(error = %recovery, "falling back to failure message");
                    failure.to_string()
                });
                ExecutionResult::failure(error)
            }
            Err(join_error) => {
                // The capture buffers went down with the task.
                let failure =
                    SandboxError::ExecutionFailed(format!("execution task failed: {join_error}"));
                warn!(error = %failure, "captured output lost");
                ExecutionResult::failure(failure.to_string())
            }
        }
    }
}
