use serde::{Deserialize, Serialize};

/// Defines what happens when the error cannot be reduced because the minimum step size was reached
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum MinimumStepPolicy {
    /// Accepts the full-step result even though the error exceeds the tolerance
    AcceptFullStep,

    /// Reports the failure to the caller (e.g., to request a smaller global increment)
    Fail,
}

/// Defines the order in which the scale factor is saturated after the error estimation
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum ScaleClampOrder {
    /// Clamps to `[0.1, min(max_scale_up, 10)]` first, then enforces `scale · h ≥ h_min`
    ///
    /// The resulting step size never falls below the minimum step size.
    MinimumStepLast,

    /// Applies the lower bound, then `scale · h ≥ h_min`, then the upper bounds
    ///
    /// The upper bounds may win over the minimum step size.
    UpperBoundsLast,
}

/// Defines how the tangent accumulator is composed across sub-steps
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum TangentScheme {
    /// Implicit return mapping
    ///
    /// ```text
    /// T ← dX/dY · (T + h E)
    /// ```
    ///
    /// where `E` is the identity with the elastic tangent in the top-left block
    Implicit,

    /// Semi-explicit return mapping
    ///
    /// ```text
    /// T ← dX/dY · ((I - dY/dXₒₗ) · T + h E')
    /// ```
    ///
    /// where `E'` holds the elastic tangent in the top-left block and zeros elsewhere
    SemiExplicit,
}
