//! Planning request dispatcher

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::deadline::Deadline;
use crate::fallback;
use crate::parse::{DelimiterParser, PayloadParser};
use crate::planner::{HttpPlannerClient, PlanRequest, PlannerService};
use crate::process::{PlannerRunner, ProcessRunner, probe_path, resolve_command};

use super::{DispatchError, DispatchResult, SourceTier, TierOutcome};

/// Runtime tuning for the dispatcher, derived from [`Config`]
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Overall wall-clock budget per request
    pub budget: Duration,

    /// Budget slice reserved for later tiers when computing per-tier timeouts
    pub safety_margin: Duration,

    /// Configured per-call service timeout (clipped to remaining budget)
    pub service_timeout: Duration,

    /// Minimum remaining budget to attempt the service tier
    pub service_min_viable: Duration,

    /// Minimum remaining budget to attempt the process tier
    pub process_min_viable: Duration,

    /// Maximum characters of diagnostic kept in the fallback trailer
    pub diagnostic_max_chars: usize,
}

impl DispatcherConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            budget: Duration::from_millis(config.dispatch.budget_ms),
            safety_margin: Duration::from_millis(config.dispatch.safety_margin_ms),
            service_timeout: Duration::from_millis(config.service.request_timeout_ms),
            service_min_viable: Duration::from_millis(config.service.min_viable_ms),
            process_min_viable: Duration::from_millis(config.process.min_viable_ms),
            diagnostic_max_chars: config.dispatch.diagnostic_max_chars,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Orchestrates one plan request through the tiered fallback policy.
///
/// Tiers run strictly sequentially under a shared deadline: planner service,
/// then ephemeral planner process, then synthesized fallback. Soft failures
/// advance the state machine; only a malformed request surfaces as an error.
/// The dispatcher keeps no state between calls, so re-invoking it with the
/// same request after a failure is an independent attempt.
#[derive(Clone)]
pub struct Dispatcher {
    config: DispatcherConfig,
    service: Arc<dyn PlannerService>,
    runner: Arc<dyn PlannerRunner>,
    parser: Arc<dyn PayloadParser>,
}

impl Dispatcher {
    /// Create a dispatcher from explicit collaborators (used by tests and
    /// anyone embedding the library with custom tiers)
    pub fn new(
        config: DispatcherConfig,
        service: Arc<dyn PlannerService>,
        runner: Arc<dyn PlannerRunner>,
        parser: Arc<dyn PayloadParser>,
    ) -> Self {
        debug!(?config, "Dispatcher::new: called");
        Self {
            config,
            service,
            runner,
            parser,
        }
    }

    /// Wire up the production tiers from configuration
    pub fn from_config(config: &Config) -> eyre::Result<Self> {
        debug!(base_url = %config.service.base_url, "Dispatcher::from_config: called");
        let service = HttpPlannerClient::new(&config.service.base_url)
            .map_err(|e| eyre::eyre!("failed to build planner service client: {}", e))?;

        let resolved = resolve_command(&config.process, probe_path)?;
        let runner = ProcessRunner::new(resolved, config.planner_env.clone(), &config.process);

        Ok(Self::new(
            DispatcherConfig::from_config(config),
            Arc::new(service),
            Arc::new(runner),
            Arc::new(DelimiterParser::new()),
        ))
    }

    /// Handle one plan request end to end.
    ///
    /// Always returns within the configured budget plus a small fixed
    /// overhead, whatever the upstream tiers do.
    pub async fn dispatch(&self, req: PlanRequest) -> Result<DispatchResult, DispatchError> {
        let req_id = uuid::Uuid::now_v7();
        let query = req.query.trim().to_string();
        debug!(%req_id, query_len = query.len(), message_type = %req.message_type, "dispatch: called");

        // The single caller-visible error: a request with nothing to plan
        if query.is_empty() {
            debug!(%req_id, "dispatch: missing query");
            return Err(DispatchError::MissingQuery);
        }

        // Trivial queries are owed no planning; answer instantly
        if fallback::is_trivial(&query) {
            info!(%req_id, "dispatch: trivial query, returning help text");
            return Ok(DispatchResult {
                markdown: fallback::HELP_TEXT.to_string(),
                degraded: false,
                source_tier: SourceTier::Fallback,
                diagnostic: None,
            });
        }

        let req = PlanRequest { query: query.clone(), ..req };
        let deadline = Deadline::start(self.config.budget);
        let mut failures: Vec<String> = Vec::new();

        // Tier 1: planner service
        if deadline.allows(self.config.service_min_viable) {
            let timeout = self
                .config
                .service_timeout
                .min(deadline.remaining().saturating_sub(self.config.safety_margin));
            debug!(%req_id, ?timeout, "dispatch: attempting service tier");

            match self.service.call(&req, timeout).await {
                TierOutcome::Success(raw) => {
                    let markdown = self.parser.extract(&raw);
                    if markdown.is_empty() {
                        debug!(%req_id, "dispatch: service payload empty after parsing");
                        failures.push("service: empty response".to_string());
                    } else {
                        info!(%req_id, elapsed_ms = deadline.elapsed().as_millis() as u64, "dispatch: answered by planner service");
                        return Ok(DispatchResult {
                            markdown,
                            degraded: false,
                            source_tier: SourceTier::Service,
                            diagnostic: None,
                        });
                    }
                }
                TierOutcome::SoftFailure(reason) => {
                    warn!(%req_id, %reason, "dispatch: service tier failed");
                    failures.push(format!("service: {}", reason));
                }
                TierOutcome::HardFailure(reason) => {
                    debug!(%req_id, %reason, "dispatch: service tier hard failure");
                    return Err(DispatchError::Rejected(reason));
                }
            }
        } else {
            debug!(%req_id, remaining_ms = deadline.remaining().as_millis() as u64, "dispatch: service tier skipped");
            failures.push("service: skipped (insufficient budget)".to_string());
        }

        // Tier 2: ephemeral planner process
        if deadline.allows(self.config.process_min_viable) {
            let hard_timeout = deadline.remaining().saturating_sub(self.config.safety_margin);
            debug!(%req_id, ?hard_timeout, "dispatch: attempting process tier");

            let run = self.runner.run(&req, hard_timeout).await;
            match run.tier_outcome() {
                TierOutcome::Success(raw) => {
                    let markdown = self.parser.extract(&raw);
                    if markdown.is_empty() {
                        debug!(%req_id, "dispatch: process output empty after parsing");
                        failures.push("process: empty output".to_string());
                    } else {
                        info!(%req_id, elapsed_ms = deadline.elapsed().as_millis() as u64, "dispatch: answered by planner process");
                        return Ok(DispatchResult {
                            markdown,
                            degraded: true,
                            source_tier: SourceTier::Process,
                            diagnostic: Some(failures.join("; ")).filter(|d| !d.is_empty()),
                        });
                    }
                }
                TierOutcome::SoftFailure(reason) => {
                    warn!(%req_id, %reason, "dispatch: process tier failed");
                    let mut entry = format!("process: {}", reason);
                    let stderr = run.stderr_tail.trim();
                    if !stderr.is_empty() {
                        entry.push_str(&format!(" ({})", tail_chars(stderr, 200)));
                    }
                    failures.push(entry);
                }
                TierOutcome::HardFailure(reason) => {
                    debug!(%req_id, %reason, "dispatch: process tier hard failure");
                    return Err(DispatchError::Rejected(reason));
                }
            }
        } else {
            debug!(%req_id, remaining_ms = deadline.remaining().as_millis() as u64, "dispatch: process tier skipped");
            failures.push("process: skipped (insufficient budget)".to_string());
        }

        // Tier 3: synthesized fallback, always succeeds
        let diagnostic = failures.join("; ");
        info!(%req_id, %diagnostic, elapsed_ms = deadline.elapsed().as_millis() as u64, "dispatch: all tiers failed, synthesizing fallback");
        let markdown = fallback::synthesize(&query, &diagnostic, self.config.diagnostic_max_chars);

        Ok(DispatchResult {
            markdown,
            degraded: true,
            source_tier: SourceTier::Fallback,
            diagnostic: Some(diagnostic),
        })
    }
}

/// Last `max` characters of a string, for bounded diagnostic entries
fn tail_chars(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        s.to_string()
    } else {
        s.chars().skip(count - max).collect()
    }
}
