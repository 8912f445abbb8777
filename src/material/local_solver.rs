use crate::base::{Matrix6, StateVector, TangentMatrix, Vector6};
use crate::StrError;

/// Holds the input of a local solve over one sub-step
#[derive(Clone, Copy, Debug)]
pub struct SubstepInput<const M: usize> {
    /// Stress at the start of the sub-step (Mandel basis)
    pub stress: Vector6,

    /// Internal values at the start of the sub-step
    pub internal: StateVector<M>,

    /// Strain increment of the sub-step: h Δε
    pub delta_strain: Vector6,

    /// Time at the start of the sub-step
    pub time: f64,

    /// Duration of the sub-step: h Δt
    pub dt: f64,
}

/// Holds the output of a local solve
#[derive(Clone, Copy, Debug)]
pub struct LocalSolution<const N: usize, const M: usize> {
    /// Updated stress (Mandel basis)
    pub stress: Vector6,

    /// Updated internal values
    pub internal: StateVector<M>,

    /// Algorithmic tangent dX/dY
    ///
    /// X holds the updated stress in its first 6 entries and auxiliary unknowns afterwards;
    /// Y holds the elastic trial stress in its first 6 entries.
    pub dxdy: TangentMatrix<N>,

    /// Derivative dY/dXₒₗ of the trial arguments w.r.t. the state at the start of the sub-step
    ///
    /// Only required by the semi-explicit tangent scheme.
    pub dydx_old: TangentMatrix<N>,
}

/// Defines the response of a local solve
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocalResponse {
    /// The sub-step is purely elastic (the algorithmic tangent is not used)
    Elastic,

    /// The sub-step is inelastic; the algorithmic tangent has been computed
    Inelastic,

    /// The local problem could not be solved
    NotConverged {
        /// Recommended fraction of the time step for the next attempt (< 1)
        time_step_fraction: f64,
    },
}

/// Specifies the local (material point) solver called by the substepping driver
///
/// The solver is called repeatedly with smaller increments; all results must be written to
/// the solution (no side effects on the solver itself).
pub trait LocalSolver<const N: usize, const M: usize>: Send {
    /// Returns the 6×6 elastic tangent (Mandel basis)
    fn elastic_tangent(&self) -> Matrix6;

    /// Initializes the internal values for the initial stress state
    fn initialize_internal_values(&self, stress: &Vector6) -> Result<StateVector<M>, StrError>;

    /// Solves the local problem over one sub-step
    fn solve(&mut self, solution: &mut LocalSolution<N, M>, input: &SubstepInput<M>) -> Result<LocalResponse, StrError>;
}

impl<const N: usize, const M: usize> LocalSolution<N, M> {
    /// Allocates a new instance
    pub fn new() -> Self {
        LocalSolution {
            stress: Vector6::zeros(),
            internal: StateVector::<M>::zeros(),
            dxdy: TangentMatrix::<N>::identity(),
            dydx_old: TangentMatrix::<N>::zeros(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
