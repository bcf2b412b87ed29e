//! Ephemeral planner process execution

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::{PlannerEnvConfig, ProcessConfig};
use crate::dispatch::TierOutcome;
use crate::planner::PlanRequest;

use super::resolve::ResolvedCommand;

/// Marker appended to the stderr tail when the kill timer fires, so
/// downstream logs distinguish "upstream reported failure" from "we gave up"
pub const KILLED_MARKER: &str = "[killed by dispatcher]";

/// Terminal state of one planner process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    /// The process exited on its own with this code
    Completed(i32),
    /// The kill timer fired before the process exited
    TimedOut { after: Duration },
    /// The process never started
    SpawnFailed(String),
}

/// Everything one invocation produced
#[derive(Debug)]
pub struct RunOutcome {
    pub status: ProcessStatus,

    /// Captured stdout (rolling tail, capped)
    pub stdout: String,

    /// Captured stderr tail, with the kill marker appended on timeout
    pub stderr_tail: String,

    /// Wall-clock time the invocation took
    pub duration: Duration,
}

impl RunOutcome {
    /// Fold this invocation into a tier outcome
    pub fn tier_outcome(&self) -> TierOutcome {
        match &self.status {
            ProcessStatus::Completed(0) => TierOutcome::Success(self.stdout.clone()),
            ProcessStatus::Completed(code) => TierOutcome::SoftFailure(format!("exit {}", code)),
            ProcessStatus::TimedOut { after } => {
                TierOutcome::SoftFailure(format!("timed out after {}ms", after.as_millis()))
            }
            ProcessStatus::SpawnFailed(reason) => TierOutcome::SoftFailure(format!("failed to start: {}", reason)),
        }
    }
}

/// Seam the dispatcher consumes the runner through, so tests can substitute
/// a fake with a live-handle counter.
#[async_trait]
pub trait PlannerRunner: Send + Sync {
    /// Run the planner once for this request, bounded by `hard_timeout`
    async fn run(&self, req: &PlanRequest, hard_timeout: Duration) -> RunOutcome;
}

/// Spawns the ephemeral planner process and supervises it to completion.
///
/// Each invocation owns exactly one child, two incrementally-filled output
/// buffers, and one kill timer; all three are released on every exit path
/// (`kill_on_drop` backs up the explicit kill). Invocations from separate
/// requests share only the spawn semaphore, which caps concurrently live
/// planner processes system-wide.
pub struct ProcessRunner {
    resolved: ResolvedCommand,
    env: PlannerEnvConfig,
    stdout_cap: usize,
    stderr_cap: usize,
    permits: Arc<Semaphore>,
}

impl ProcessRunner {
    /// Create a runner from a resolved command and process configuration
    pub fn new(resolved: ResolvedCommand, env: PlannerEnvConfig, cfg: &ProcessConfig) -> Self {
        debug!(program = ?resolved.program, max_concurrent = cfg.max_concurrent, "ProcessRunner::new: called");
        Self {
            resolved,
            env,
            stdout_cap: cfg.stdout_cap_bytes,
            stderr_cap: cfg.stderr_tail_bytes,
            permits: Arc::new(Semaphore::new(cfg.max_concurrent)),
        }
    }
}

#[async_trait]
impl PlannerRunner for ProcessRunner {
    async fn run(&self, req: &PlanRequest, hard_timeout: Duration) -> RunOutcome {
        debug!(query_len = req.query.len(), ?hard_timeout, "ProcessRunner::run: called");
        let started = Instant::now();

        // Bounded spawning: wait for a slot before the child exists
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                // Only possible if the semaphore were closed, which we never do
                return RunOutcome {
                    status: ProcessStatus::SpawnFailed("spawn limiter closed".to_string()),
                    stdout: String::new(),
                    stderr_tail: String::new(),
                    duration: started.elapsed(),
                };
            }
        };

        let mut cmd = tokio::process::Command::new(&self.resolved.program);
        cmd.args(&self.resolved.base_args)
            .arg(&req.query)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(session_id) = &req.session_id {
            cmd.args(["--session-id", session_id.as_str()]);
        }
        let message_type = req.message_type.to_string();
        cmd.args(["--message-type", message_type.as_str()]);

        // Fixed override set; always wins over the inherited environment
        for (key, value) in self.env.overrides(req.fast_mode) {
            cmd.env(key, value);
        }

        if let Some(workdir) = &self.resolved.workdir {
            cmd.current_dir(workdir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => {
                debug!("run: planner process spawned");
                child
            }
            Err(e) => {
                debug!(error = %e, "run: spawn failed");
                return RunOutcome {
                    status: ProcessStatus::SpawnFailed(e.to_string()),
                    stdout: String::new(),
                    stderr_tail: String::new(),
                    duration: started.elapsed(),
                };
            }
        };

        // Drain both pipes incrementally so a chatty planner cannot grow
        // memory without bound and a full pipe cannot deadlock the child.
        let stdout_pipe = child.stdout.take();
        let stdout_cap = self.stdout_cap;
        let stdout_task = tokio::spawn(async move {
            match stdout_pipe {
                Some(pipe) => drain_tail(pipe, stdout_cap).await,
                None => Vec::new(),
            }
        });

        let stderr_pipe = child.stderr.take();
        let stderr_cap = self.stderr_cap;
        let stderr_task = tokio::spawn(async move {
            match stderr_pipe {
                Some(pipe) => drain_tail(pipe, stderr_cap).await,
                None => Vec::new(),
            }
        });

        let timer = tokio::time::sleep(hard_timeout);
        tokio::pin!(timer);

        let (status, timed_out) = tokio::select! {
            result = child.wait() => {
                match result {
                    Ok(exit) => {
                        let code = exit.code().unwrap_or(-1);
                        debug!(code, "run: planner process exited");
                        (ProcessStatus::Completed(code), false)
                    }
                    Err(e) => {
                        debug!(error = %e, "run: wait failed");
                        (ProcessStatus::SpawnFailed(format!("wait failed: {}", e)), false)
                    }
                }
            }
            _ = &mut timer => {
                debug!(?hard_timeout, "run: kill timer fired");
                // Best-effort termination; the request still gets a response
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "run: failed to kill planner process");
                }
                (ProcessStatus::TimedOut { after: hard_timeout }, true)
            }
        };

        // Pipes close on exit or kill, so the drains normally finish at once.
        // A straggler grandchild can keep them open past the kill, though, so
        // the drains get a grace period rather than holding the request.
        let grace = if timed_out {
            Duration::from_millis(250)
        } else {
            Duration::from_secs(1)
        };
        let stdout_bytes = collect(stdout_task, grace).await;
        let stderr_bytes = collect(stderr_task, grace).await;

        let stdout = String::from_utf8_lossy(&stdout_bytes).to_string();
        let mut stderr_tail = String::from_utf8_lossy(&stderr_bytes).to_string();
        if timed_out {
            if !stderr_tail.is_empty() {
                stderr_tail.push('\n');
            }
            stderr_tail.push_str(KILLED_MARKER);
        }

        debug!(
            ?status,
            stdout_len = stdout.len(),
            stderr_len = stderr_tail.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "run: complete"
        );

        RunOutcome {
            status,
            stdout,
            stderr_tail,
            duration: started.elapsed(),
        }
    }
}

/// Wait for a drain task, giving up (and dropping its buffer) after `grace`
async fn collect(task: tokio::task::JoinHandle<Vec<u8>>, grace: Duration) -> Vec<u8> {
    match tokio::time::timeout(grace, task).await {
        Ok(Ok(buf)) => buf,
        _ => Vec::new(),
    }
}

/// Read a pipe to EOF, keeping at most the last `cap` bytes
async fn drain_tail<R>(mut reader: R, cap: usize) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.len() > cap {
                    let excess = buf.len() - cap;
                    buf.drain(..excess);
                }
            }
            Err(_) => break,
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Runner whose "planner" is a shell script written into a tempdir
    fn script_runner(dir: &std::path::Path, script: &str, cfg: &ProcessConfig) -> ProcessRunner {
        let path = dir.join("planner.sh");
        std::fs::write(&path, script).unwrap();

        let resolved = ResolvedCommand {
            program: PathBuf::from("sh"),
            base_args: vec![path.to_string_lossy().into_owned()],
            workdir: None,
        };
        ProcessRunner::new(resolved, PlannerEnvConfig::default(), cfg)
    }

    #[tokio::test]
    async fn test_run_captures_stdout_on_success() {
        let temp = tempfile::tempdir().unwrap();
        let runner = script_runner(
            temp.path(),
            "echo 'noise'\necho '=== Final Itinerary (Markdown) ==='\necho '# Plan'\n",
            &ProcessConfig::default(),
        );

        let outcome = runner
            .run(&PlanRequest::new("goa, 3 days"), Duration::from_secs(5))
            .await;

        assert_eq!(outcome.status, ProcessStatus::Completed(0));
        assert!(outcome.stdout.contains("# Plan"));
        assert!(matches!(outcome.tier_outcome(), TierOutcome::Success(_)));
    }

    #[tokio::test]
    async fn test_run_nonzero_exit_keeps_stderr_tail() {
        let temp = tempfile::tempdir().unwrap();
        let runner = script_runner(temp.path(), "echo 'boom' >&2\nexit 3\n", &ProcessConfig::default());

        let outcome = runner
            .run(&PlanRequest::new("goa, 3 days"), Duration::from_secs(5))
            .await;

        assert_eq!(outcome.status, ProcessStatus::Completed(3));
        assert!(outcome.stderr_tail.contains("boom"));
        assert!(matches!(outcome.tier_outcome(), TierOutcome::SoftFailure(r) if r == "exit 3"));
    }

    #[tokio::test]
    async fn test_run_timeout_kills_process() {
        let temp = tempfile::tempdir().unwrap();
        let runner = script_runner(temp.path(), "sleep 30\n", &ProcessConfig::default());

        let started = Instant::now();
        let outcome = runner
            .run(&PlanRequest::new("goa, 3 days"), Duration::from_millis(200))
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(
            outcome.status,
            ProcessStatus::TimedOut {
                after: Duration::from_millis(200)
            }
        );
        assert!(outcome.stderr_tail.contains(KILLED_MARKER));
        assert!(matches!(outcome.tier_outcome(), TierOutcome::SoftFailure(r) if r.starts_with("timed out")));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_immediate() {
        let resolved = ResolvedCommand {
            program: PathBuf::from("/nonexistent/planner-interpreter"),
            base_args: vec![],
            workdir: None,
        };
        let runner = ProcessRunner::new(resolved, PlannerEnvConfig::default(), &ProcessConfig::default());

        let outcome = runner
            .run(&PlanRequest::new("goa, 3 days"), Duration::from_secs(5))
            .await;

        assert!(matches!(outcome.status, ProcessStatus::SpawnFailed(_)));
        assert!(matches!(outcome.tier_outcome(), TierOutcome::SoftFailure(r) if r.starts_with("failed to start")));
    }

    #[tokio::test]
    async fn test_env_overrides_reach_child() {
        let temp = tempfile::tempdir().unwrap();
        let runner = script_runner(
            temp.path(),
            "echo \"FAST=$FAST_MODE PROVIDER=$SEARCH_PROVIDER MODE=$PLANNER_MODE\"\n",
            &ProcessConfig::default(),
        );

        let req = PlanRequest::new("goa, 3 days").with_fast_mode(true);
        let outcome = runner.run(&req, Duration::from_secs(5)).await;

        assert!(outcome.stdout.contains("FAST=1"));
        assert!(outcome.stdout.contains("PROVIDER=hybrid"));
        assert!(outcome.stdout.contains("MODE=full"));
    }

    #[tokio::test]
    async fn test_query_and_flags_passed_to_child() {
        let temp = tempfile::tempdir().unwrap();
        let runner = script_runner(temp.path(), "echo \"ARGS:$*\"\n", &ProcessConfig::default());

        let req = PlanRequest::new("Delhi to Jaipur")
            .with_session_id("sess-42")
            .with_message_type(crate::planner::MessageType::Refinement);
        let outcome = runner.run(&req, Duration::from_secs(5)).await;

        assert!(outcome.stdout.contains("Delhi to Jaipur"));
        assert!(outcome.stdout.contains("--session-id sess-42"));
        assert!(outcome.stdout.contains("--message-type refinement"));
    }

    #[tokio::test]
    async fn test_stdout_keeps_tail_when_capped() {
        let temp = tempfile::tempdir().unwrap();
        let cfg = ProcessConfig {
            stdout_cap_bytes: 512,
            ..Default::default()
        };
        let runner = script_runner(
            temp.path(),
            "i=0\nwhile [ $i -lt 500 ]; do echo \"line $i\"; i=$((i+1)); done\necho 'END'\n",
            &cfg,
        );

        let outcome = runner
            .run(&PlanRequest::new("goa, 3 days"), Duration::from_secs(10))
            .await;

        assert!(outcome.stdout.len() <= 512);
        assert!(outcome.stdout.contains("END"));
    }

    #[tokio::test]
    async fn test_spawn_cap_serializes_runs() {
        let temp = tempfile::tempdir().unwrap();
        let cfg = ProcessConfig {
            max_concurrent: 1,
            ..Default::default()
        };
        let runner = std::sync::Arc::new(script_runner(temp.path(), "sleep 1\n", &cfg));

        let started = Instant::now();
        let a = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.run(&PlanRequest::new("trip one"), Duration::from_secs(5)).await })
        };
        let b = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.run(&PlanRequest::new("trip two"), Duration::from_secs(5)).await })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert_eq!(a.status, ProcessStatus::Completed(0));
        assert_eq!(b.status, ProcessStatus::Completed(0));
        // With one permit the second child cannot start until the first exits
        assert!(started.elapsed() >= Duration::from_millis(1800));
    }
}
