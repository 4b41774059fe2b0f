//! Availability waiting for restored resources.
//!
//! Split in two: [`next_state`] is the pure transition function deciding what
//! one observation means, and [`wait_for_available`] is the driver that owns
//! polling cadence, the time budget and cancellation.

use crate::aws::RdsError;
use backon::{BackoffBuilder, ConstantBuilder};
use restore_drill_common::StatusPolicy;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Which resource a wait is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum WaitTarget {
    Cluster,
    Instance,
}

impl WaitTarget {
    /// Status interpretation for this kind of resource
    pub fn policy(self) -> StatusPolicy {
        match self {
            WaitTarget::Cluster => StatusPolicy::CLUSTER,
            WaitTarget::Instance => StatusPolicy::INSTANCE,
        }
    }
}

/// What a single poll saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The control plane reported a status string
    Status(String),
    /// The resource is not visible yet
    NotFound,
    /// The describe call failed; nothing was learned
    Unavailable(String),
}

impl Observation {
    /// Interpret a describe result. Not-found is an observation, not an error.
    pub fn from_probe(result: Result<String, RdsError>) -> Self {
        match result {
            Ok(status) => Observation::Status(status),
            Err(e) if e.is_not_found() => Observation::NotFound,
            Err(e) => Observation::Unavailable(e.to_string()),
        }
    }
}

/// Waiter state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitState {
    /// Not observed yet, or not visible to the control plane yet
    Pending,
    /// Observed with a non-terminal status
    InProgress(String),
    /// Reached the success status
    Available,
    /// Reached a status from the known failure set
    TerminalFailure(String),
    /// Time budget exhausted without reaching a terminal status
    TimedOut,
    /// Stopped by the cancellation token
    Cancelled,
}

impl WaitState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WaitState::Pending | WaitState::InProgress(_))
    }
}

/// Decide the next state from one observation.
///
/// A known failure status wins over the deadline; success only counts when
/// observed strictly before it.
pub fn next_state(
    observation: &Observation,
    elapsed: Duration,
    timeout: Duration,
    policy: &StatusPolicy,
) -> WaitState {
    match observation {
        Observation::Status(status) if policy.is_failure(status) => {
            WaitState::TerminalFailure(status.clone())
        }
        _ if elapsed >= timeout => WaitState::TimedOut,
        Observation::Status(status) if policy.is_success(status) => WaitState::Available,
        Observation::Status(status) => WaitState::InProgress(status.clone()),
        Observation::NotFound | Observation::Unavailable(_) => WaitState::Pending,
    }
}

/// Polling configuration
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Fixed delay between polls
    pub poll_interval: Duration,
    /// Maximum total time to wait
    pub timeout: Duration,
}

/// How a wait ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Terminal state reached
    pub state: WaitState,
    /// Number of polls issued
    pub attempts: u32,
    pub elapsed: Duration,
    /// Last status string seen, if any
    pub last_status: Option<String>,
}

impl WaitOutcome {
    pub fn is_available(&self) -> bool {
        self.state == WaitState::Available
    }
}

/// Poll `probe` until the resource reaches a terminal state.
///
/// The first poll is always issued; every later one is preceded by a budget
/// check. Not-found and failed describe calls keep the waiter pending.
///
/// # Example
/// ```ignore
/// let outcome = wait_for_available(
///     &WaitConfig { poll_interval: Duration::from_secs(30), timeout: Duration::from_secs(3600) },
///     Some(&cancel),
///     WaitTarget::Cluster.policy(),
///     "my-cluster",
///     || async { rds.describe_cluster("my-cluster").await.map(|c| c.status) },
/// ).await;
/// ```
pub async fn wait_for_available<F, Fut>(
    config: &WaitConfig,
    cancel: Option<&CancellationToken>,
    policy: StatusPolicy,
    resource_name: &str,
    probe: F,
) -> WaitOutcome
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<String, RdsError>>,
{
    let start = Instant::now();
    let mut delays = ConstantBuilder::default()
        .with_delay(config.poll_interval)
        .with_max_times(usize::MAX)
        .build();

    let mut attempts = 0u32;
    let mut state = WaitState::Pending;
    let mut last_status: Option<String> = None;

    let finish = |state: WaitState, attempts: u32, last_status: Option<String>| WaitOutcome {
        state,
        attempts,
        elapsed: start.elapsed(),
        last_status,
    };

    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            warn!(resource = %resource_name, attempts, "Wait cancelled");
            return finish(WaitState::Cancelled, attempts, last_status);
        }

        if attempts > 0 && start.elapsed() >= config.timeout {
            warn!(
                resource = %resource_name,
                attempts,
                timeout_secs = config.timeout.as_secs(),
                "Timed out waiting for resource"
            );
            return finish(WaitState::TimedOut, attempts, last_status);
        }

        attempts += 1;
        let observation = Observation::from_probe(probe().await);
        match &observation {
            Observation::Status(status) => last_status = Some(status.clone()),
            Observation::NotFound => {
                debug!(resource = %resource_name, attempt = attempts, "Resource not visible yet")
            }
            Observation::Unavailable(error) => {
                warn!(resource = %resource_name, attempt = attempts, error = %error, "Status check failed")
            }
        }

        let next = next_state(&observation, start.elapsed(), config.timeout, &policy);
        if next != state {
            info!(
                resource = %resource_name,
                attempt = attempts,
                elapsed_secs = start.elapsed().as_secs(),
                state = ?next,
                "Resource state changed"
            );
        }
        state = next;

        if state.is_terminal() {
            if state == WaitState::TimedOut {
                warn!(resource = %resource_name, attempts, "Timed out waiting for resource");
            }
            return finish(state, attempts, last_status);
        }

        let delay = delays.next().unwrap_or(config.poll_interval);
        debug!(
            resource = %resource_name,
            attempt = attempts,
            delay_secs = delay.as_secs(),
            "Resource not ready, retrying"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = async {
                match cancel {
                    Some(token) => token.cancelled().await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                warn!(resource = %resource_name, attempts, "Wait cancelled");
                return finish(WaitState::Cancelled, attempts, last_status);
            }
        }
    }
}
