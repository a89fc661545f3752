//! Resource lifecycle polling
//!
//! Waits for a resource to reach a target state:
//!
//! ```text
//! create:  Pending ──► Active
//!             │
//!             └──────► Failed (timeout, provider error)
//!
//! destroy: Pending ──► Terminated
//!             │
//!             └──────► Failed (timeout, provider error)
//! ```
//!
//! Observed states are lower-cased and matched against a case-insensitive
//! regular expression, so a target may be an alternation such as
//! `unavailable|terminated`.

use crate::error::{CloudError, Result};
use crate::model::Server;
use crate::service::Compute;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};

/// State reported for a server that no longer exists
pub const GONE_STATE: &str = "terminated";

/// Reported on timeout when no refresh has completed yet
const UNKNOWN_STATE: &str = "unknown";

/// Transition a caller waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Create,
    Destroy,
}

impl Transition {
    /// State pattern that ends the wait successfully
    pub fn target(&self) -> &'static str {
        match self {
            Transition::Create => "active",
            Transition::Destroy => "unavailable|terminated",
        }
    }
}

/// A resource whose state can be re-read
#[async_trait]
pub trait Observable: Send {
    /// Resource kind used in diagnostics, e.g. "server"
    fn kind(&self) -> &str;

    /// Fetch the current state from the provider
    async fn refresh(&mut self) -> Result<String>;
}

/// Backoff between polls
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay after the first poll
    pub interval: Duration,

    /// Upper bound for a single delay
    pub max_interval: Duration,

    pub multiplier: f64,

    /// States that end the wait with a provider error
    pub failure_pattern: Option<String>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(8),
            multiplier: 2.0,
            failure_pattern: Some("^error$".to_string()),
        }
    }
}

impl PollConfig {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(32) as i32);
        self.interval.mul_f64(factor).min(self.max_interval)
    }
}

/// Poll `resource` until its state matches `target` or `timeout` elapses
///
/// Returns the matching state. Fails with [`CloudError::Timeout`] naming the
/// last observed state, or with [`CloudError::Provider`] when the resource
/// enters a failure state or cannot be refreshed. A refresh still running at
/// the deadline is abandoned.
pub async fn wait_for<O>(
    resource: &mut O,
    target: &str,
    timeout: Duration,
    config: &PollConfig,
) -> Result<String>
where
    O: Observable + ?Sized,
{
    let target_re = state_pattern(target)?;
    let failure_re = config
        .failure_pattern
        .as_deref()
        .map(state_pattern)
        .transpose()?;

    let deadline = Instant::now() + timeout;
    let mut attempt = 0;
    let mut last_state = UNKNOWN_STATE.to_string();

    loop {
        let state = match timeout_at(deadline, resource.refresh()).await {
            Ok(refreshed) => refreshed.map_err(CloudError::into_provider)?.to_lowercase(),
            Err(_) => return Err(timeout_error(resource.kind(), &last_state)),
        };
        tracing::debug!(kind = resource.kind(), state = %state, attempt, "polled state");

        if target_re.is_match(&state) {
            tracing::info!(kind = resource.kind(), state = %state, "reached target state");
            return Ok(state);
        }

        if failure_re.as_ref().is_some_and(|re| re.is_match(&state)) {
            return Err(CloudError::Provider(format!(
                "{} entered state \"{}\", check project for errors",
                resource.kind(),
                state
            )));
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(timeout_error(resource.kind(), &state));
        }

        sleep(config.delay_for_attempt(attempt).min(deadline - now)).await;
        last_state = state;
        attempt += 1;
    }
}

fn state_pattern(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

fn timeout_error(kind: &str, state: &str) -> CloudError {
    CloudError::Timeout(format!(
        "Operation timed out while {} was in state \"{}\", check project for errors",
        kind, state
    ))
}

/// Observes a server through a compute handle
pub struct ServerWatch {
    compute: Compute,
    server_id: String,
    last: Option<Server>,
}

impl ServerWatch {
    pub fn new(compute: Compute, server_id: impl Into<String>) -> Self {
        Self {
            compute,
            server_id: server_id.into(),
            last: None,
        }
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Last server record seen, if the server still existed
    pub fn last(&self) -> Option<&Server> {
        self.last.as_ref()
    }

    /// Wait for the server to finish `transition`
    pub async fn wait(
        &mut self,
        transition: Transition,
        timeout: Duration,
        config: &PollConfig,
    ) -> Result<String> {
        wait_for(self, transition.target(), timeout, config).await
    }
}

#[async_trait]
impl Observable for ServerWatch {
    fn kind(&self) -> &str {
        "server"
    }

    async fn refresh(&mut self) -> Result<String> {
        match self.compute.server(&self.server_id).await? {
            Some(server) => {
                let status = server.status.clone();
                self.last = Some(server);
                Ok(status)
            }
            None => {
                self.last = None;
                Ok(GONE_STATE.to_string())
            }
        }
    }
}
