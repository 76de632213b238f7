//! Run one Python snippet and print the result as JSON.
//!
//! Usage: `wasm-python-runner [--interpreter PATH] [--pretty] [CODE]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wasm_python_runner::prelude::*;

#[derive(Parser, Debug)]
#[clap(name = "wasm-python-runner", version, about = "Run Python code in an embedded interpreter")]
struct Cli {
    /// Python source to execute.
    #[clap(default_value = "print('Hello, World!')")]
    code: String,

    /// Path to the RustPython wasm interpreter.
    #[clap(
        long,
        env = "WASM_PYTHON_INTERPRETER",
        default_value = "assets/rustpython.wasm"
    )]
    interpreter: PathBuf,

    /// Pretty-print the JSON result.
    #[clap(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the JSON result, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wasm_python_runner=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SandboxConfig::builder()
        .interpreter_path(cli.interpreter)
        .build();

    let mut sandbox = PythonSandbox::new(config);
    let result = sandbox.execute(&cli.code).await;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("failed to serialize execution result")?;

    println!("{json}");
    Ok(())
}
