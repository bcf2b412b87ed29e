//! Planner command resolution
//!
//! Resolving which interpreter launches the ephemeral planner is a pure
//! function of configuration plus injected filesystem probes. It runs once
//! at startup; the runner itself never inspects the environment.

use eyre::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::config::ProcessConfig;

/// Interpreters probed on PATH, in preference order
const INTERPRETER_CANDIDATES: &[&str] = &["python3", "python"];

/// Fully resolved planner invocation, minus the per-request arguments
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
    /// Program to execute
    pub program: PathBuf,

    /// Arguments preceding the positional query (`-m <module>`)
    pub base_args: Vec<String>,

    /// Working directory for the child, if configured
    pub workdir: Option<PathBuf>,
}

/// Resolve the planner command from configuration.
///
/// An explicitly configured interpreter wins; otherwise the injected `probe`
/// is asked for each PATH candidate in order. The probe is a parameter so
/// tests (and future platforms) can supply their own lookup.
pub fn resolve_command<F>(cfg: &ProcessConfig, probe: F) -> Result<ResolvedCommand>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let base_args = vec!["-m".to_string(), cfg.module.clone()];

    if let Some(interpreter) = &cfg.interpreter {
        debug!(%interpreter, "resolve_command: using configured interpreter");
        return Ok(ResolvedCommand {
            program: PathBuf::from(interpreter),
            base_args,
            workdir: cfg.workdir.clone(),
        });
    }

    for candidate in INTERPRETER_CANDIDATES {
        if let Some(program) = probe(candidate) {
            debug!(%candidate, ?program, "resolve_command: probe hit");
            return Ok(ResolvedCommand {
                program,
                base_args,
                workdir: cfg.workdir.clone(),
            });
        }
        debug!(%candidate, "resolve_command: probe miss");
    }

    Err(eyre::eyre!(
        "no planner interpreter found (tried {})",
        INTERPRETER_CANDIDATES.join(", ")
    ))
}

/// Look up an executable by scanning the PATH environment variable
pub fn probe_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
