//! # Python Runner
//!
//! Runs Python snippets in an in-process interpreter and hands back what they
//! printed.
//!
//! The interpreter is RustPython compiled to a WASI module and hosted by
//! Wasmtime. A [`PythonSandbox`] loads it the first time it is needed and keeps
//! it for the rest of its life; every execution gets fresh stdout/stderr
//! capture buffers and comes back as an [`ExecutionResult`], whether the code
//! succeeded, raised, or never got to run.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wasm_python_runner::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SandboxConfig::builder()
//!         .interpreter_path("assets/rustpython.wasm")
//!         .build();
//!
//!     let mut sandbox = PythonSandbox::new(config);
//!     sandbox.init().await?;
//!
//!     let result = sandbox.execute("print('Hello, World!')").await;
//!     assert!(result.is_success());
//!     assert_eq!(result.output(), "Hello, World!\n");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Limits
//!
//! Isolation is whatever the Wasm guest provides: no preopened directories,
//! no inherited environment, no sockets. There are no time or memory limits
//! and no way to cancel a running snippet.

pub mod error;
pub mod prelude;
pub mod sandbox;

// Re-export main types at crate root for convenience
pub use error::{Result, SandboxError};
pub use sandbox::config::{SandboxConfig, SandboxConfigBuilder};
pub use sandbox::executor::{ExecutionResult, PythonSandbox};
pub use sandbox::interpreter::Interpreter;
pub use sandbox::io::{CaptureScope, CapturedStreams};
