//! The embedded interpreter: a RustPython WASI module compiled once and
//! instantiated per execution.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::anyhow;
use tracing::debug;
use wasmtime::{Engine, Linker, Module, Store};
use wasmtime_wasi::preview1::{self, WasiP1Ctx};
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

use crate::error::{Result, SandboxError};
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::io::CaptureScope;

/// A loaded interpreter.
///
/// Holds everything that is expensive to build: the engine, the compiled
/// module and a linker with the WASI preview 1 host functions. Running code
/// only creates a [`Store`], which is cheap and discarded after each run.
pub struct Interpreter {
    engine: Engine,
    module: Module,
    linker: Linker<WasiP1Ctx>,
    path: PathBuf,
}

impl Interpreter {
    /// Read and compile the interpreter named by `config`.
    pub fn load(config: &SandboxConfig) -> Result<Self> {
        config.validate()?;

        let started = Instant::now();
        let path = config.interpreter_path.clone();

        let wasm_bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SandboxError::InterpreterNotFound(path.display().to_string())
            } else {
                SandboxError::Io(e)
            }
        })?;

        let engine = Engine::new(&wasmtime::Config::new())
            .map_err(|e| SandboxError::Initialization(e.context("failed to create engine")))?;

        let module = Module::new(&engine, &wasm_bytes).map_err(|e| {
            SandboxError::Initialization(e.context("failed to compile interpreter module"))
        })?;

        if module.get_export("_start").is_none() {
            return Err(SandboxError::Initialization(anyhow!(
                "{} is not a WASI command: no `_start` export",
                path.display()
            )));
        }

        let mut linker = Linker::new(&engine);
        preview1::add_to_linker_sync(&mut linker, |cx| cx)
            .map_err(|e| SandboxError::Initialization(e.context("failed to link WASI")))?;

        debug!(
            path = %path.display(),
            bytes = wasm_bytes.len(),
            elapsed = ?started.elapsed(),
            "interpreter loaded"
        );

        Ok(Self {
            engine,
            module,
            linker,
            path,
        })
    }

    /// Where this interpreter was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `code` with the guest's stdout and stderr pointed at `capture`.
    ///
    /// Returns `Ok(())` when `_start` returns or the guest exits with status 0.
    /// A non-zero exit becomes [`SandboxError::GuestExit`]; traps and
    /// instantiation errors become [`SandboxError::ExecutionFailed`].
    pub fn run(&self, code: &str, capture: &CaptureScope) -> Result<()> {
        // WASI arguments are C strings; anything after a NUL would never reach the guest.
        if code.contains('\0') {
            return Err(SandboxError::ExecutionFailed(
                "source code cannot contain null bytes".to_string(),
            ));
        }

        let mut builder = WasiCtxBuilder::new();
        builder.args(&["python", "-c", code]);
        capture.redirect(&mut builder);

        // The store owns the guest's ends of the capture pipes and is dropped on return.
        let mut store = Store::new(&self.engine, builder.build_p1());

        let instance = self
            .linker
            .instantiate(&mut store, &self.module)
            .map_err(|e| {
                SandboxError::ExecutionFailed(format!("failed to instantiate interpreter: {e:#}"))
            })?;

        let start = instance
            .get_typed_func::<(), ()>(&mut store, "_start")
            .map_err(|e| {
                SandboxError::ExecutionFailed(format!("failed to get _start function: {e:#}"))
            })?;

        match start.call(&mut store, ()) {
            Ok(()) => Ok(()),
            Err(e) => match e.downcast_ref::<I32Exit>() {
                Some(I32Exit(0)) => Ok(()),
                Some(I32Exit(status)) => Err(SandboxError::GuestExit(*status)),
                None => Err(SandboxError::ExecutionFailed(format!("{e:#}"))),
            },
        }
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("path", &self.path)
            .field("engine", &"<wasmtime::Engine>")
            .finish()
    }
}
