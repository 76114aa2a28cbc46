use serde::{Deserialize, Serialize};

/// Default number of retries before a pending request counts as not approved.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Result of one approval check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOutcome {
    /// An approver granted the request.
    Approved,
    /// No definitive approval yet.
    Pending,
    /// Retry budget exhausted without approval.
    NotApproved,
}

impl ApprovalOutcome {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::NotApproved => "not_approved",
        }
    }
}

/// Retry counters for one approval wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetryState {
    current_retry: u32,
    max_retries: u32,
}

/// Transition produced by feeding one approval check into a [`RetryState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// Approval observed; remaining retries are skipped.
    Approved,
    /// Still pending with budget left; check again from the next state.
    Retry(RetryState),
    /// Still pending and the budget is spent.
    Exhausted,
}

impl PollStep {
    /// Returns the approval outcome this step reports.
    #[must_use]
    pub fn outcome(&self) -> ApprovalOutcome {
        match self {
            Self::Approved => ApprovalOutcome::Approved,
            Self::Retry(_) => ApprovalOutcome::Pending,
            Self::Exhausted => ApprovalOutcome::NotApproved,
        }
    }
}

impl RetryState {
    /// Creates the initial state for a fresh approval wait.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            current_retry: 0,
            max_retries,
        }
    }

    /// Returns retries already consumed.
    #[must_use]
    pub fn current_retry(&self) -> u32 {
        self.current_retry
    }

    /// Returns the configured retry budget.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns whether a pending check in this state would end the wait.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.current_retry >= self.max_retries
    }

    /// Returns whether the final check for this budget has already happened.
    ///
    /// Only reachable when a caller keeps polling after [`PollStep::Exhausted`].
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.current_retry > self.max_retries
    }

    /// Applies one approval check result.
    #[must_use]
    pub fn transition(self, approved: bool) -> PollStep {
        if approved {
            return PollStep::Approved;
        }

        if self.is_exhausted() {
            return PollStep::Exhausted;
        }

        PollStep::Retry(Self {
            current_retry: self.current_retry.saturating_add(1),
            max_retries: self.max_retries,
        })
    }

    /// Returns the state recorded after the terminal check of this budget.
    #[must_use]
    pub fn spent(self) -> Self {
        Self {
            current_retry: self.max_retries.saturating_add(1),
            max_retries: self.max_retries,
        }
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}
