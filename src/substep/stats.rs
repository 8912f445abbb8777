use serde::{Deserialize, Serialize};
use std::fmt;

/// Holds statistics about the substepping of one strain increment
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SubstepStats {
    /// Number of full sub-steps requested (including repetitions)
    pub n_cycles: usize,

    /// Number of accepted cycles (elastic, extrapolated, and forced)
    pub n_accepted: usize,

    /// Number of cycles accepted by the elastic shortcut
    pub n_elastic: usize,

    /// Number of cycles rejected because the error exceeded the tolerance
    pub n_rejected: usize,

    /// Number of rejected cycles resolved by splitting
    pub n_split: usize,

    /// Number of rejected cycles resolved by repeating with a smaller step
    pub n_repeated: usize,

    /// Number of sub-steps discarded by the caller (e.g., local solver failure)
    pub n_discarded: usize,

    /// Number of cycles accepted without error control
    pub n_forced: usize,

    /// Number of failures due to the minimum sub-step size
    pub n_failed: usize,

    /// Last computed ratio error/tolerance
    pub last_error_ratio: f64,

    /// Smallest sub-step size that was handed out
    pub h_min_used: f64,
}

impl SubstepStats {
    /// Allocates a new instance
    pub fn new() -> Self {
        SubstepStats {
            h_min_used: f64::INFINITY,
            ..Default::default()
        }
    }

    /// Records a sub-step size that has been handed out
    pub(crate) fn record_size(&mut self, h: f64) {
        if h < self.h_min_used {
            self.h_min_used = h;
        }
    }
}

impl fmt::Display for SubstepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Number of cycles           = {}\n\
             Number of accepted cycles  = {}\n\
             Number of elastic cycles   = {}\n\
             Number of rejected cycles  = {}\n\
             Number of split cycles     = {}\n\
             Number of repeated cycles  = {}\n\
             Number of discarded steps  = {}\n\
             Number of forced cycles    = {}\n\
             Number of failures         = {}\n\
             Last error ratio           = {:.2e}\n\
             Smallest sub-step size     = {:.2e}",
            self.n_cycles,
            self.n_accepted,
            self.n_elastic,
            self.n_rejected,
            self.n_split,
            self.n_repeated,
            self.n_discarded,
            self.n_forced,
            self.n_failed,
            self.last_error_ratio,
            self.h_min_used,
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
