use std::sync::Arc;
use std::time::Duration;

use rolegate_domain::{AccessRequest, ApprovalOutcome, PollStep, RetryState};
use tracing::{info, warn};

use crate::access_ports::ApprovalStatusSource;

/// Delay between pending approval checks.
pub const DEFAULT_APPROVAL_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Final result of one approval wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalDecision {
    /// Either `Approved` or `NotApproved`.
    pub outcome: ApprovalOutcome,
    /// Number of checks issued against the approval source.
    pub checks: u32,
    /// Retry counters when the wait ended.
    pub final_state: RetryState,
}

/// Bounded-retry poller over the external approval source.
#[derive(Clone)]
pub struct ApprovalPoller {
    source: Arc<dyn ApprovalStatusSource>,
    retry_delay: Duration,
}

impl ApprovalPoller {
    /// Creates a poller with the default retry delay.
    #[must_use]
    pub fn new(source: Arc<dyn ApprovalStatusSource>) -> Self {
        Self {
            source,
            retry_delay: DEFAULT_APPROVAL_RETRY_DELAY,
        }
    }

    /// Overrides the delay slept before signaling a retry.
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Performs one approval check for `state`.
    ///
    /// Failed checks count as pending. When the step is a retry the delay has
    /// already elapsed by the time this returns. A state whose final check has
    /// already happened ends without contacting the source.
    pub async fn poll(&self, request: &AccessRequest, state: RetryState) -> PollStep {
        if state.is_spent() {
            return PollStep::Exhausted;
        }

        let approved = match self.source.check_approval(request).await {
            Ok(approved) => approved,
            Err(error) => {
                warn!(
                    request_id = %request.request_id(),
                    error = %error,
                    "approval check failed, treating as pending"
                );
                false
            }
        };

        let step = state.transition(approved);
        if let PollStep::Retry(next) = step {
            info!(
                request_id = %request.request_id(),
                retry = next.current_retry(),
                max_retries = next.max_retries(),
                "approval not yet received, retrying"
            );
            tokio::time::sleep(self.retry_delay).await;
        }

        step
    }

    /// Polls until the request is approved or the retry budget is spent.
    pub async fn await_decision(&self, request: &AccessRequest, max_retries: u32) -> ApprovalDecision {
        let mut state = RetryState::new(max_retries);
        let mut checks = 0_u32;

        loop {
            checks = checks.saturating_add(1);
            match self.poll(request, state).await {
                PollStep::Approved => {
                    return ApprovalDecision {
                        outcome: ApprovalOutcome::Approved,
                        checks,
                        final_state: state,
                    };
                }
                PollStep::Retry(next) => state = next,
                PollStep::Exhausted => {
                    return ApprovalDecision {
                        outcome: ApprovalOutcome::NotApproved,
                        checks,
                        final_state: state.spent(),
                    };
                }
            }
        }
    }
}
