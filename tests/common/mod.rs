//! Small WASI command modules that stand in for the interpreter.
//!
//! Each fixture is generated as WAT text and written into a temporary
//! directory; Wasmtime compiles the text form directly.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::PathBuf;

use tempfile::TempDir;
use wasm_python_runner::SandboxConfig;

/// One thing the fixture's `_start` does, in order.
pub enum Step {
    /// Write bytes to a file descriptor (1 = stdout, 2 = stderr).
    Write(u32, Vec<u8>),
    /// Call `proc_exit` with a status.
    Exit(i32),
    /// Execute `unreachable`.
    Trap,
}

pub fn stdout(text: &str) -> Step {
    Step::Write(1, text.as_bytes().to_vec())
}

pub fn stderr(text: &str) -> Step {
    Step::Write(2, text.as_bytes().to_vec())
}

/// Render a WASI command whose `_start` performs `steps`.
pub fn program(steps: &[Step]) -> String {
    let mut data = String::new();
    let mut body = String::new();
    // Bytes 0..16 hold the iovec and the `nwritten` slot.
    let mut offset = 64usize;

    for step in steps {
        match step {
            Step::Write(fd, bytes) => {
                let escaped: String = bytes.iter().map(|b| format!("\\{b:02x}")).collect();
                writeln!(data, "  (data (i32.const {offset}) \"{escaped}\")").unwrap();
                writeln!(
                    body,
                    "    (i32.store (i32.const 0) (i32.const {offset}))\n    \
                     (i32.store (i32.const 4) (i32.const {len}))\n    \
                     (drop (call $fd_write (i32.const {fd}) (i32.const 0) (i32.const 1) (i32.const 8)))",
                    len = bytes.len()
                )
                .unwrap();
                offset += bytes.len();
            }
            Step::Exit(status) => {
                writeln!(body, "    (call $proc_exit (i32.const {status}))").unwrap();
            }
            Step::Trap => body.push_str("    unreachable\n"),
        }
    }

    format!(
        r#"(module
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "proc_exit"
    (func $proc_exit (param i32)))
  (memory (export "memory") 1)
{data}  (func (export "_start")
{body}  ))
"#
    )
}

/// Writes `argv[2]` (the code passed after `-c`) back to stdout.
pub const ECHO_CODE: &str = r#"(module
  (import "wasi_snapshot_preview1" "args_sizes_get"
    (func $args_sizes_get (param i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "args_get"
    (func $args_get (param i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "_start") (local $p i32) (local $len i32)
    (drop (call $args_sizes_get (i32.const 0) (i32.const 4)))
    (drop (call $args_get (i32.const 64) (i32.const 1024)))
    (local.set $p (i32.load (i32.const 72)))
    (block $done
      (loop $scan
        (br_if $done (i32.eqz (i32.load8_u (i32.add (local.get $p) (local.get $len)))))
        (local.set $len (i32.add (local.get $len) (i32.const 1)))
        (br $scan)))
    (i32.store (i32.const 16) (local.get $p))
    (i32.store (i32.const 20) (local.get $len))
    (drop (call $fd_write (i32.const 1) (i32.const 16) (i32.const 1) (i32.const 24)))))
"#;

/// A temporary directory holding one fixture interpreter.
pub struct Fixture {
    dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    pub fn new(wat: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("interpreter.wat");
        std::fs::write(&path, wat).expect("write fixture");
        Self { dir, path }
    }

    pub fn from_steps(steps: &[Step]) -> Self {
        Self::new(&program(steps))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn config(&self) -> SandboxConfig {
        SandboxConfig::builder()
            .interpreter_path(&self.path)
            .build()
    }

    /// Remove the interpreter file, keeping the directory alive.
    pub fn remove(&self) {
        std::fs::remove_file(&self.path).expect("remove fixture");
    }

    /// Put a (possibly different) interpreter back in place.
    pub fn replace(&self, wat: &str) {
        std::fs::write(&self.path, wat).expect("rewrite fixture");
    }
}
