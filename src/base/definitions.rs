use nalgebra::{SMatrix, SVector};

/// Defines the stress (or strain) vector with 6 components
///
/// The bundled models use the Mandel basis:
///
/// ```text
/// σ = {σxx, σyy, σzz, √2 σxy, √2 σyz, √2 σzx}
/// ```
pub type Vector6 = SVector<f64, 6>;

/// Defines a 6×6 matrix such as the elastic modulus or the consistent tangent
pub type Matrix6 = SMatrix<f64, 6, 6>;

/// Defines the N×N algorithmic tangent operator (N ≥ 6)
///
/// The top-left 6×6 block corresponds to stress/strain; extra rows and columns
/// hold auxiliary degrees of freedom of extended formulations.
pub type TangentMatrix<const N: usize> = SMatrix<f64, N, N>;

/// Defines the vector of internal values subject to extrapolation
pub type StateVector<const M: usize> = SVector<f64, M>;
