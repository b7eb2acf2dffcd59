/// Request state definitions for tracking crawl progress
///
/// A request moves strictly forward: `Pending -> InFlight -> Succeeded | Skipped`.
use std::fmt;

/// Represents the current state of a crawl request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    // ===== Active States =====
    /// Admitted to the frontier and waiting for a lane
    Pending,

    /// Taken by a lane and currently being rendered
    InFlight,

    // ===== Terminal States =====
    /// Rendered, extracted and persisted
    Succeeded,

    /// Gave up on this URL (render failed after retry, or storage failure)
    Skipped,
}

impl RequestState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Skipped)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: RequestState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight)
                | (Self::InFlight, Self::Succeeded)
                | (Self::InFlight, Self::Skipped)
        )
    }

    /// Short lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Succeeded => "succeeded",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome reported by a lane when it finishes a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The page was recorded in the dataset
    Succeeded,

    /// The page was given up on; the reason is logged, never stored
    Skipped { reason: String },
}

impl RequestOutcome {
    /// The terminal state this outcome maps to
    pub fn state(&self) -> RequestState {
        match self {
            Self::Succeeded => RequestState::Succeeded,
            Self::Skipped { .. } => RequestState::Skipped,
        }
    }
}
