use rolegate_core::{AppError, AppResult, RequestId};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRequestState {
    /// Submission validated, nothing started yet.
    Created,
    /// Approvers are being notified.
    Notifying,
    /// Waiting on the approval source.
    AwaitingApproval,
    /// Approved; credentials are being issued.
    Approving,
    /// Credentials issued.
    Issued,
    /// Not approved within the retry budget.
    Denied,
    /// Execution outlived its infrastructure time limit.
    TimedOut,
    /// Validation, engine, or issuance fault.
    Errored,
}

/// Client-facing terminal classification of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalOutcome {
    /// Credentials issued.
    Issued,
    /// Request not approved.
    Denied,
    /// Request failed.
    Errored,
}

impl TerminalOutcome {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Denied => "denied",
            Self::Errored => "errored",
        }
    }
}

impl AccessRequestState {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Notifying => "notifying",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Approving => "approving",
            Self::Issued => "issued",
            Self::Denied => "denied",
            Self::TimedOut => "timed_out",
            Self::Errored => "errored",
        }
    }

    /// Returns whether the request can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    /// Returns the terminal classification, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<TerminalOutcome> {
        match self {
            Self::Issued => Some(TerminalOutcome::Issued),
            Self::Denied => Some(TerminalOutcome::Denied),
            Self::TimedOut | Self::Errored => Some(TerminalOutcome::Errored),
            Self::Created | Self::Notifying | Self::AwaitingApproval | Self::Approving => None,
        }
    }

    /// Returns whether `next` is a legal successor of this state.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Created, Self::Notifying)
            | (Self::Notifying, Self::AwaitingApproval)
            | (Self::AwaitingApproval, Self::Approving | Self::Denied)
            | (Self::Approving, Self::Issued) => true,
            (current, Self::TimedOut | Self::Errored) => !current.is_terminal(),
            _ => false,
        }
    }
}

/// State tracker for one access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequestLifecycle {
    request_id: RequestId,
    state: AccessRequestState,
}

impl AccessRequestLifecycle {
    /// Starts tracking a freshly created request.
    #[must_use]
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            state: AccessRequestState::Created,
        }
    }

    /// Resumes tracking from a known state.
    #[must_use]
    pub fn resume(request_id: RequestId, state: AccessRequestState) -> Self {
        Self { request_id, state }
    }

    /// Returns the tracked request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> AccessRequestState {
        self.state
    }

    /// Moves to `next`, returning the previous state.
    pub fn advance(&mut self, next: AccessRequestState) -> AppResult<AccessRequestState> {
        if !self.state.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "access request '{}' cannot move from '{}' to '{}'",
                self.request_id,
                self.state.as_str(),
                next.as_str()
            )));
        }

        let previous = self.state;
        self.state = next;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use rolegate_core::RequestId;

    use super::{AccessRequestLifecycle, AccessRequestState, TerminalOutcome};

    #[test]
    fn happy_path_reaches_issued() {
        let mut lifecycle = AccessRequestLifecycle::new(RequestId::new());
        for next in [
            AccessRequestState::Notifying,
            AccessRequestState::AwaitingApproval,
            AccessRequestState::Approving,
            AccessRequestState::Issued,
        ] {
            assert!(lifecycle.advance(next).is_ok());
        }

        assert_eq!(lifecycle.state().outcome(), Some(TerminalOutcome::Issued));
    }

    #[test]
    fn denial_skips_issuance() {
        let mut lifecycle =
            AccessRequestLifecycle::resume(RequestId::new(), AccessRequestState::AwaitingApproval);
        assert!(lifecycle.advance(AccessRequestState::Issued).is_err());
        assert!(lifecycle.advance(AccessRequestState::Denied).is_ok());
        assert_eq!(lifecycle.state().outcome(), Some(TerminalOutcome::Denied));
    }

    #[test]
    fn terminal_states_are_final() {
        let mut lifecycle =
            AccessRequestLifecycle::resume(RequestId::new(), AccessRequestState::Denied);
        assert!(lifecycle.advance(AccessRequestState::Errored).is_err());
        assert!(lifecycle.advance(AccessRequestState::Notifying).is_err());
    }

    #[test]
    fn timed_out_reports_errored_outcome() {
        assert_eq!(
            AccessRequestState::TimedOut.outcome(),
            Some(TerminalOutcome::Errored)
        );
        assert!(AccessRequestState::AwaitingApproval.can_transition_to(AccessRequestState::TimedOut));
        assert_eq!(AccessRequestState::AwaitingApproval.outcome(), None);
    }
}
