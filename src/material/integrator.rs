use super::{LocalResponse, LocalSolution, LocalSolver, SubstepInput};
use crate::base::{TangentScheme, Vector6};
use crate::substep::{AdaptiveSubstepper, Notice, SubstepOutcome, SubstepStats};
use crate::StrError;

/// Holds the outcome of integrating one strain increment
#[derive(Clone, Debug, PartialEq)]
pub enum IncrementOutcome {
    /// The whole increment has been consumed; the results are available from the substepper
    Converged {
        /// Statistics of the substepping
        stats: SubstepStats,

        /// Diagnostics issued while accepting sub-steps without error control
        notices: Vec<Notice>,
    },

    /// The increment cannot be integrated; the global time step should be reduced
    ReduceTimeStep {
        /// Recommended fraction of the time step
        time_step_fraction: f64,
    },
}

impl IncrementOutcome {
    /// Returns true if the increment has been integrated
    pub fn converged(&self) -> bool {
        matches!(self, IncrementOutcome::Converged { .. })
    }
}

/// Integrates a strain increment by calling the local solver over adaptive sub-steps
///
/// The substepper must have been initialized with the converged values of the previous
/// increment (see [AdaptiveSubstepper::set_converged_progress]).
///
/// # Input
///
/// * `substepper` -- the substepper holding the state of the increment
/// * `solver` -- the local (material point) solver
/// * `delta_strain` -- the total strain increment Δε (Mandel basis)
/// * `time_old` -- the time at the start of the increment
/// * `dt` -- the time increment Δt
///
/// Errors returned by the local solver are propagated.
pub fn integrate_increment<S, const N: usize, const M: usize>(
    substepper: &mut AdaptiveSubstepper<N, M>,
    solver: &mut S,
    delta_strain: &Vector6,
    time_old: f64,
    dt: f64,
) -> Result<IncrementOutcome, StrError>
where
    S: LocalSolver<N, M> + ?Sized,
{
    let scheme = substepper.control().tangent_scheme;
    let scale_down = substepper.control().scale_down_factor;
    let mut solution = LocalSolution::<N, M>::new();
    let mut notices = Vec::new();
    while !substepper.is_finished() {
        // request
        let h = substepper.next_substep();
        let (stress, internal) = substepper.converged_progress();
        let input = SubstepInput {
            stress: *stress,
            internal: *internal,
            delta_strain: delta_strain * h,
            time: time_old + substepper.substep_start() * dt,
            dt: h * dt,
        };

        // solve and report
        let outcome = match solver.solve(&mut solution, &input)? {
            LocalResponse::Elastic => substepper.finish_elastic_substep(&solution.stress),
            LocalResponse::Inelastic => match scheme {
                TangentScheme::Implicit => {
                    substepper.finish_substep(&solution.stress, &solution.dxdy, &solution.internal)?
                }
                TangentScheme::SemiExplicit => substepper.finish_substep_semi_explicit(
                    &solution.stress,
                    &solution.dxdy,
                    &solution.dydx_old,
                    &solution.internal,
                )?,
            },
            LocalResponse::NotConverged { time_step_fraction } => {
                let outcome = substepper.discard_substep();
                if !outcome.success() {
                    return Ok(IncrementOutcome::ReduceTimeStep { time_step_fraction });
                }
                outcome
            }
        };

        // check
        if !outcome.success() {
            return Ok(IncrementOutcome::ReduceTimeStep {
                time_step_fraction: scale_down,
            });
        }
        if let SubstepOutcome::Forced(notice) = outcome {
            notices.push(notice);
        }
    }
    Ok(IncrementOutcome::Converged {
        stats: *substepper.stats(),
        notices,
    })
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
