//! Implements the substepping engines for local stress updates

mod adaptive_substepper;
mod outcome;
mod pass_count_substepper;
mod stats;
mod step_size;
pub use crate::substep::adaptive_substepper::*;
pub use crate::substep::outcome::*;
pub use crate::substep::pass_count_substepper::*;
pub use crate::substep::stats::*;
pub use crate::substep::step_size::*;
