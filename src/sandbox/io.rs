//! Output capture for a single execution.
//!
//! Each run gets a [`CaptureScope`] holding two fresh in-memory pipes. The
//! pipes are handed to the guest's WASI context as its stdout and stderr, so
//! nothing ambient is ever swapped out. The guest's handles live in the
//! per-execution store; once that store is dropped the capture is over and the
//! scope is the only remaining owner of the text.

use std::fmt;

use wasmtime_wasi::pipe::MemoryOutputPipe;
use wasmtime_wasi::WasiCtxBuilder;

use crate::error::{Result, SandboxError};

/// Text read back from a capture scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedStreams {
    /// Everything the guest wrote to stdout.
    pub stdout: String,
    /// Everything the guest wrote to stderr.
    pub stderr: String,
}

/// A pair of capture buffers standing in for the guest's stdout and stderr.
#[derive(Clone)]
pub struct CaptureScope {
    stdout: MemoryOutputPipe,
    stderr: MemoryOutputPipe,
    capacity: usize,
}

impl CaptureScope {
    /// Create empty buffers that accept up to `capacity` bytes each.
    ///
    /// The pipes get one byte of headroom so that a write past `capacity`
    /// leaves a trace [`check_capacity`](Self::check_capacity) can see.
    pub fn new(capacity: usize) -> Self {
        let pipe_capacity = capacity.saturating_add(1);
        Self {
            stdout: MemoryOutputPipe::new(pipe_capacity),
            stderr: MemoryOutputPipe::new(pipe_capacity),
            capacity,
        }
    }

    /// Fail if either stream was written past the configured capacity.
    ///
    /// Overflowed output is truncated, so it must never be reported as a
    /// complete run.
    pub fn check_capacity(&self) -> Result<()> {
        let written = self.stdout.contents().len().max(self.stderr.contents().len());
        if written > self.capacity {
            return Err(SandboxError::CaptureOverflow(self.capacity));
        }
        Ok(())
    }

    /// Point the guest's output streams at this scope's buffers.
    pub fn redirect(&self, builder: &mut WasiCtxBuilder) {
        builder
            .stdout(self.stdout.clone())
            .stderr(self.stderr.clone());
    }

    /// Read both buffers after a completed run.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; a successful run always
    /// yields its output.
    pub fn collect(&self) -> CapturedStreams {
        CapturedStreams {
            stdout: String::from_utf8_lossy(&self.stdout.contents()).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr.contents()).into_owned(),
        }
    }

    /// Read what reached stderr before a failure.
    ///
    /// Unlike [`collect`](Self::collect) this is strict: undecodable or empty
    /// contents are reported as a [`SandboxError::CaptureRecovery`] so the
    /// caller can fall back to the failure's own message.
    pub fn recover_stderr(&self) -> Result<String> {
        decode_recovered(&self.stderr.contents())
    }
}

impl fmt::Debug for CaptureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureScope")
            .field("stdout_len", &self.stdout.contents().len())
            .field("stderr_len", &self.stderr.contents().len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

fn decode_recovered(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Err(SandboxError::CaptureRecovery(
            "nothing was written to stderr".to_string(),
        ));
    }
    String::from_utf8(bytes.to_vec())
        .map_err(|e| SandboxError::CaptureRecovery(format!("stderr is not UTF-8: {e}")))
}
