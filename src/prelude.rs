//! Makes available common structures needed to integrate strain increments
//!
//! You may write `use substep::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{Matrix6, StateVector, TangentMatrix, Vector6, DEFAULT_OUT_DIR, DEFAULT_TEST_DIR};
pub use crate::base::{MinimumStepPolicy, ScaleClampOrder, SubstepControl, TangentScheme};
pub use crate::material::{integrate_increment, IncrementOutcome, LinearElastic, LocalResponse, LocalSolution};
pub use crate::material::{LocalSolver, PathResults, StrainPath, SubstepInput, VonMises};
pub use crate::substep::{AdaptiveSubstepper, Notice, PassCountSubstepper, SubstepOutcome, SubstepState, SubstepStats};
pub use crate::StrError;
