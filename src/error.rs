//! Error types for the Python runner.

use thiserror::Error;

/// Errors that can occur while bringing up or driving the interpreter.
///
/// Only the initialization variants ever reach callers of
/// [`PythonSandbox::init`](crate::PythonSandbox::init). Everything else is folded into a
/// failed [`ExecutionResult`](crate::ExecutionResult) by `execute`.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// The interpreter wasm file was not found.
    #[error("Python interpreter wasm not found at: {0}")]
    InterpreterNotFound(String),

    /// Failed to build the Wasm engine, compile the interpreter or link WASI.
    #[error("failed to initialize interpreter: {0}")]
    Initialization(#[source] anyhow::Error),

    /// I/O error while reading the interpreter.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The evaluation call itself failed (trap, instantiation, host error).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The guest exited with a non-zero status, usually after an uncaught exception.
    #[error("guest exited with status {0}")]
    GuestExit(i32),

    /// Captured output could not be read back after a failed run.
    #[error("failed to recover captured output: {0}")]
    CaptureRecovery(String),

    /// The guest wrote more than a capture buffer accepts.
    #[error("captured output exceeded {0} bytes")]
    CaptureOverflow(usize),

    /// A Python exception parsed out of captured stderr.
    #[error("Python {exception_type}: {message}")]
    PythonException {
        /// The type of Python exception (e.g., "ValueError", "TypeError").
        exception_type: String,
        /// The exception message.
        message: String,
        /// The full Python traceback, if available.
        traceback: Option<String>,
    },
}

impl SandboxError {
    /// Create a Python exception error from stderr output.
    pub fn from_python_stderr(stderr: &str) -> Option<Self> {
        parse_python_exception(stderr)
    }

    /// Whether this error means the interpreter could not be brought up.
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            SandboxError::InterpreterNotFound(_)
                | SandboxError::Initialization(_)
                | SandboxError::Io(_)
                | SandboxError::Config(_)
        )
    }

    /// Check if this error represents a Python exception.
    pub fn is_python_exception(&self) -> bool {
        matches!(self, SandboxError::PythonException { .. })
    }
}

/// Result type alias for runner operations.
pub type Result<T> = std::result::Result<T, SandboxError>;

/// Parse a Python exception from stderr output.
///
/// The last unindented line that names an exception type wins, and a
/// traceback is attached when a `Traceback (most recent call last):` header
/// precedes it.
pub fn parse_python_exception(stderr: &str) -> Option<SandboxError> {
    let lines: Vec<&str> = stderr.lines().collect();

    let mut traceback_start = None;
    let mut exception_line = None;
    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("Traceback (most recent call last):") {
            traceback_start = Some(i);
        } else if !line.starts_with(' ') && looks_like_exception(line) {
            exception_line = Some(i);
        }
    }

    let idx = exception_line?;
    let line = lines[idx];
    let (exception_type, message) = match line.split_once(':') {
        Some((ty, msg)) => (ty.trim().to_string(), msg.trim().to_string()),
        None => (line.trim().to_string(), String::new()),
    };

    let traceback = traceback_start
        .filter(|start| *start < idx)
        .map(|start| lines[start..=idx].join("\n"));

    Some(SandboxError::PythonException {
        exception_type,
        message,
        traceback,
    })
}

/// Check if a line starts with something shaped like a Python exception name.
fn looks_like_exception(line: &str) -> bool {
    const SUFFIXES: [&str; 3] = ["Error", "Exception", "Warning"];
    const STANDALONE: [&str; 4] = [
        "KeyboardInterrupt",
        "SystemExit",
        "StopIteration",
        "GeneratorExit",
    ];

    let name = line.split(':').next().unwrap_or_default().trim_end();
    if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
        return false;
    }
    // Dotted names such as `json.decoder.JSONDecodeError` are fine; spaces are not.
    if name
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
    {
        return false;
    }

    let base = name.rsplit('.').next().unwrap_or(name);
    SUFFIXES.iter().any(|s| base.ends_with(s)) || STANDALONE.contains(&base)
}
