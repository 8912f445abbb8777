//! Implements local (material point) solvers and the driver integrating strain increments

mod integrator;
mod linear_elastic;
mod local_solver;
mod mandel;
mod strain_path;
mod von_mises;
pub use crate::material::integrator::*;
pub use crate::material::linear_elastic::*;
pub use crate::material::local_solver::*;
pub use crate::material::mandel::*;
pub use crate::material::strain_path::*;
pub use crate::material::von_mises::*;
