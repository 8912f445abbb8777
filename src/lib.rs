//! Adaptive substepping with step-doubling error control for local stress updates
//!
//! A strain increment handed to a material point is split into sub-steps. Each sub-step is
//! computed once as a full step and once as two half steps; the difference estimates the local
//! error, which drives the sub-step size. Accepted results are improved by Richardson
//! extrapolation and the consistent tangent is composed across the sub-steps.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod material;
pub mod prelude;
pub mod substep;
