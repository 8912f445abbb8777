use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines the stage of the step-doubling cycle
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum SubstepState {
    /// The full sub-step is expected next
    FullStep,

    /// The first half of the sub-step is expected next
    FirstHalfStep,

    /// The second half of the sub-step is expected next
    SecondHalfStep,
}

/// Holds a diagnostic message about the step-size control
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Notice {
    /// The sub-step size fell below the minimum sub-step size
    MinimumStepSizeReached,

    /// The error exceeded the tolerance at the minimum sub-step size; the full step was accepted
    ToleranceIgnoredAtMinimumStep,

    /// A half step did not converge after the full step had converged; the full step was accepted
    HalfStepNotConverged(SubstepState),
}

/// Holds the outcome of reporting a sub-step to a substepper
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum SubstepOutcome {
    /// The result has been stored; the cycle continues with a half step
    Continue,

    /// The cycle has been accepted and the progress has been advanced
    Accepted,

    /// The error is slightly above the tolerance; the first half step becomes the new full step
    Split,

    /// The error is too large (or the sub-step was discarded); the sub-step is repeated with a smaller size
    Repeat,

    /// The full-step result has been accepted without error control
    Forced(Notice),

    /// The sub-step size cannot be reduced any further
    Failed(Notice),
}

impl Notice {
    /// Returns the diagnostic message
    pub fn message(&self) -> &'static str {
        match self {
            Notice::MinimumStepSizeReached => "minimum sub-step size reached",
            Notice::ToleranceIgnoredAtMinimumStep => "error tolerance ignored at the minimum sub-step size",
            Notice::HalfStepNotConverged(SubstepState::SecondHalfStep) => {
                "second half step has not converged after converged full step"
            }
            Notice::HalfStepNotConverged(_) => "first half step has not converged after converged full step",
        }
    }
}

impl SubstepOutcome {
    /// Returns false if the sub-step size cannot be reduced any further
    pub fn success(&self) -> bool {
        !matches!(self, SubstepOutcome::Failed(..))
    }

    /// Returns true if the progress has been advanced
    pub fn advanced(&self) -> bool {
        matches!(self, SubstepOutcome::Accepted | SubstepOutcome::Forced(..))
    }

    /// Returns the diagnostic message, if any
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SubstepOutcome::Forced(notice) | SubstepOutcome::Failed(notice) => Some(*notice),
            _ => None,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Notice, SubstepOutcome, SubstepState};

    #[test]
    fn outcome_queries_work() {
        assert!(SubstepOutcome::Continue.success());
        assert!(!SubstepOutcome::Continue.advanced());
        assert!(SubstepOutcome::Accepted.advanced());
        assert!(SubstepOutcome::Split.success());
        assert!(!SubstepOutcome::Repeat.advanced());
        let forced = SubstepOutcome::Forced(Notice::ToleranceIgnoredAtMinimumStep);
        assert!(forced.success());
        assert!(forced.advanced());
        assert_eq!(forced.notice(), Some(Notice::ToleranceIgnoredAtMinimumStep));
        let failed = SubstepOutcome::Failed(Notice::MinimumStepSizeReached);
        assert!(!failed.success());
        assert!(!failed.advanced());
        assert_eq!(failed.notice(), Some(Notice::MinimumStepSizeReached));
        assert_eq!(SubstepOutcome::Accepted.notice(), None);
    }

    #[test]
    fn display_works() {
        assert_eq!(
            format!("{}", Notice::MinimumStepSizeReached),
            "minimum sub-step size reached"
        );
        assert_eq!(
            format!("{}", Notice::HalfStepNotConverged(SubstepState::FirstHalfStep)),
            "first half step has not converged after converged full step"
        );
        assert_eq!(
            Notice::HalfStepNotConverged(SubstepState::SecondHalfStep).message(),
            "second half step has not converged after converged full step"
        );
    }
}
