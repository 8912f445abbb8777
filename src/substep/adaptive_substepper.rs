use super::{calc_scale_factor, Notice, SubstepOutcome, SubstepState, SubstepStats};
use crate::base::{Matrix6, MinimumStepPolicy, ScaleClampOrder, StateVector, SubstepControl};
use crate::base::{TangentMatrix, TangentScheme, Vector6, N_STRESS, PROGRESS_TOL, SPLIT_ERROR_RATIO};
use crate::StrError;

/// Implements an adaptive substepper with step-doubling error estimation and Richardson extrapolation
///
/// Each sub-step of size `h` is computed once as a full step and once as two half steps
/// covering the same interval. The difference between the two stresses estimates the local
/// error, which drives the acceptance, splitting, or repetition of the sub-step and the size
/// of the next one. Accepted cycles are extrapolated:
///
/// ```text
/// x = 2 x_half - x_full    (stress, internal values, and tangent)
/// ```
///
/// The consistent tangent is accumulated across sub-steps as follows:
///
/// ```text
/// T ← dX/dY · (T + h E)
/// ```
///
/// where `dX/dY` is the algorithmic tangent returned by the local solver and `E` is the N×N
/// identity holding the elastic tangent in its top-left 6×6 block.
///
/// # Usage
///
/// 1. Call [AdaptiveSubstepper::set_converged_progress] with the converged values of the previous increment
/// 2. While not [AdaptiveSubstepper::is_finished]:
///     1. Get `h` from [AdaptiveSubstepper::next_substep]
///     2. Solve the local problem with `h Δε` starting from [AdaptiveSubstepper::converged_progress]
///     3. Report with [AdaptiveSubstepper::finish_substep] or [AdaptiveSubstepper::finish_elastic_substep];
///        if the local solver fails, call [AdaptiveSubstepper::discard_substep]
/// 3. Extract the results with [AdaptiveSubstepper::get_results]
///
/// # Generics
///
/// * `N` -- size of the algorithmic tangent (N ≥ 6)
/// * `M` -- number of internal values subject to extrapolation
pub struct AdaptiveSubstepper<const N: usize, const M: usize> {
    /// Holds the control options
    control: SubstepControl,

    /// Holds the elastic extension E of the tangent accumulator
    elastic_tangent: TangentMatrix<N>,

    /// Holds the consumed fraction of the strain increment
    progress: f64,

    /// Holds the current (full) sub-step size
    h: f64,

    /// Holds the number of consecutive accepted cycles
    passed_substeps: usize,

    /// Holds the stage of the step-doubling cycle
    state: SubstepState,

    /// Accepted stress
    stress: Vector6,

    /// Accepted internal values
    internal: StateVector<M>,

    /// Accepted tangent accumulator
    tangent: TangentMatrix<N>,

    /// Full-step stress (temporary)
    stress_full: Vector6,

    /// Full-step internal values (temporary)
    internal_full: StateVector<M>,

    /// Full-step tangent accumulator (temporary)
    tangent_full: TangentMatrix<N>,

    /// Half-step stress (temporary)
    stress_half: Vector6,

    /// Half-step internal values (temporary)
    internal_half: StateVector<M>,

    /// Half-step tangent accumulator (temporary)
    tangent_half: TangentMatrix<N>,

    /// Holds statistics
    stats: SubstepStats,
}

impl<const N: usize, const M: usize> AdaptiveSubstepper<N, M> {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `control` -- the control options
    /// * `elastic_tangent` -- the 6×6 elastic tangent embedded into the N×N extension E
    pub fn new(control: &SubstepControl, elastic_tangent: &Matrix6) -> Result<Self, StrError> {
        if let Some(msg) = control.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate substepper because control.validate() failed");
        }
        if N < N_STRESS {
            return Err("the tangent dimension N must be ≥ 6");
        }
        let mut ee = match control.tangent_scheme {
            TangentScheme::Implicit => TangentMatrix::<N>::identity(),
            TangentScheme::SemiExplicit => TangentMatrix::<N>::zeros(),
        };
        ee.fixed_view_mut::<6, 6>(0, 0).copy_from(elastic_tangent);
        Ok(AdaptiveSubstepper {
            control: *control,
            elastic_tangent: ee,
            progress: 0.0,
            h: control.initial_step_size,
            passed_substeps: 0,
            state: SubstepState::FullStep,
            stress: Vector6::zeros(),
            internal: StateVector::<M>::zeros(),
            tangent: TangentMatrix::<N>::zeros(),
            stress_full: Vector6::zeros(),
            internal_full: StateVector::<M>::zeros(),
            tangent_full: TangentMatrix::<N>::zeros(),
            stress_half: Vector6::zeros(),
            internal_half: StateVector::<M>::zeros(),
            tangent_half: TangentMatrix::<N>::zeros(),
            stats: SubstepStats::new(),
        })
    }

    /// Sets the accepted state with the converged values of the previous increment
    pub fn set_converged_progress(&mut self, stress: &Vector6, internal: &StateVector<M>) {
        self.stress.copy_from(stress);
        self.internal.copy_from(internal);
    }

    /// Returns true if the whole increment has been consumed
    pub fn is_finished(&self) -> bool {
        1.0 - self.progress <= PROGRESS_TOL && self.state == SubstepState::FullStep
    }

    /// Returns the size of the next sub-step as a fraction of the strain increment
    ///
    /// In the full-step stage, the current size is clipped to the remaining progress.
    /// In the half-step stages, half of the current size is returned.
    pub fn next_substep(&mut self) -> f64 {
        match self.state {
            SubstepState::FullStep => {
                let remaining = 1.0 - self.progress;
                if remaining < self.h {
                    self.h = remaining;
                }
                self.stats.n_cycles += 1;
                self.stats.record_size(self.h);
                self.h
            }
            SubstepState::FirstHalfStep | SubstepState::SecondHalfStep => 0.5 * self.h,
        }
    }

    /// Returns the stress and internal values at the start of the requested sub-step
    ///
    /// These are the accepted values, except in the second half step, which starts from
    /// the result of the first half step.
    pub fn converged_progress(&self) -> (&Vector6, &StateVector<M>) {
        match self.state {
            SubstepState::FullStep | SubstepState::FirstHalfStep => (&self.stress, &self.internal),
            SubstepState::SecondHalfStep => (&self.stress_half, &self.internal_half),
        }
    }

    /// Returns the progress at the start of the requested sub-step
    pub fn substep_start(&self) -> f64 {
        match self.state {
            SubstepState::SecondHalfStep => self.progress + 0.5 * self.h,
            _ => self.progress,
        }
    }

    /// Reports the result of a (non-elastic) local solve
    ///
    /// # Input
    ///
    /// * `stress` -- the stress computed by the local solver
    /// * `dxdy` -- the algorithmic tangent `dX/dY` of the sub-step
    /// * `internal` -- the internal values computed by the local solver
    ///
    /// Returns an error if the tangent scheme is not [TangentScheme::Implicit].
    pub fn finish_substep(
        &mut self,
        stress: &Vector6,
        dxdy: &TangentMatrix<N>,
        internal: &StateVector<M>,
    ) -> Result<SubstepOutcome, StrError> {
        if self.control.tangent_scheme != TangentScheme::Implicit {
            return Err("finish_substep requires the implicit tangent scheme");
        }
        Ok(self.finish(stress, dxdy, None, internal))
    }

    /// Reports the result of a (non-elastic) semi-explicit local solve
    ///
    /// # Input
    ///
    /// * `stress` -- the stress computed by the local solver
    /// * `dxdy` -- the algorithmic tangent `dX/dY` of the sub-step
    /// * `dydx_old` -- the derivative `dY/dXₒₗ` of the residual arguments w.r.t. the state at the start of the sub-step
    /// * `internal` -- the internal values computed by the local solver
    ///
    /// Returns an error if the tangent scheme is not [TangentScheme::SemiExplicit].
    pub fn finish_substep_semi_explicit(
        &mut self,
        stress: &Vector6,
        dxdy: &TangentMatrix<N>,
        dydx_old: &TangentMatrix<N>,
        internal: &StateVector<M>,
    ) -> Result<SubstepOutcome, StrError> {
        if self.control.tangent_scheme != TangentScheme::SemiExplicit {
            return Err("finish_substep_semi_explicit requires the semi-explicit tangent scheme");
        }
        Ok(self.finish(stress, dxdy, Some(dydx_old), internal))
    }

    /// Reports a purely elastic sub-step (no error estimation is needed)
    ///
    /// The internal values remain unchanged.
    pub fn finish_elastic_substep(&mut self, stress: &Vector6) -> SubstepOutcome {
        match self.state {
            SubstepState::FullStep => {
                // the two half steps would be elastic too
                self.tangent += self.elastic_tangent * self.h;
                self.stress.copy_from(stress);
                self.progress += self.h;
                self.passed_substeps += 1;
                self.stats.n_accepted += 1;
                self.stats.n_elastic += 1;
                self.print_cycle(None, &SubstepOutcome::Accepted, true);
                SubstepOutcome::Accepted
            }
            SubstepState::FirstHalfStep => {
                self.tangent_half = self.tangent + self.elastic_tangent * (0.5 * self.h);
                self.stress_half.copy_from(stress);
                self.internal_half.copy_from(&self.internal);
                self.state = SubstepState::SecondHalfStep;
                SubstepOutcome::Continue
            }
            SubstepState::SecondHalfStep => {
                // an elastic second half confirms the full step
                self.accept_full_step_only();
                self.stats.n_elastic += 1;
                self.print_cycle(None, &SubstepOutcome::Accepted, true);
                SubstepOutcome::Accepted
            }
        }
    }

    /// Discards the current sub-step (e.g., because the local solver failed)
    ///
    /// In the full-step stage, the sub-step size is multiplied by the scale-down factor.
    /// In the half-step stages, the already converged full step is accepted instead.
    ///
    /// Returns [SubstepOutcome::Failed] if the new size falls below the minimum; the size is then
    /// set to the minimum.
    pub fn discard_substep(&mut self) -> SubstepOutcome {
        self.passed_substeps = 0;
        self.stats.n_discarded += 1;
        let outcome = match self.state {
            SubstepState::FullStep => self.rescale(self.control.scale_down_factor),
            SubstepState::FirstHalfStep | SubstepState::SecondHalfStep => {
                let notice = Notice::HalfStepNotConverged(self.state);
                self.accept_full_step_only();
                self.stats.n_forced += 1;
                SubstepOutcome::Forced(notice)
            }
        };
        self.print_cycle(None, &outcome, false);
        outcome
    }

    /// Restarts the cycle with the sub-step size multiplied by `factor`
    ///
    /// Returns [SubstepOutcome::Failed] if the new size falls below the minimum; the size is then
    /// set to the minimum.
    pub fn repeat_substep(&mut self, factor: f64) -> SubstepOutcome {
        let outcome = self.rescale(factor);
        self.print_cycle(None, &outcome, false);
        outcome
    }

    /// Extracts the accepted stress, the 6×6 consistent tangent, and the internal values
    pub fn get_results(&self, stress: &mut Vector6, tangent: &mut Matrix6, internal: &mut StateVector<M>) {
        stress.copy_from(&self.stress);
        tangent.copy_from(&self.tangent.fixed_view::<6, 6>(0, 0));
        internal.copy_from(&self.internal);
    }

    /// Returns the top-left 6×6 block of the accepted tangent accumulator
    pub fn current_tangent(&self) -> Matrix6 {
        self.tangent.fixed_view::<6, 6>(0, 0).into_owned()
    }

    /// Returns the accepted N×N tangent accumulator (including auxiliary degrees of freedom)
    pub fn accumulated_tangent(&self) -> &TangentMatrix<N> {
        &self.tangent
    }

    /// Returns an access to the control options
    pub fn control(&self) -> &SubstepControl {
        &self.control
    }

    /// Returns the consumed fraction of the strain increment
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Returns the current (full) sub-step size
    pub fn substep_size(&self) -> f64 {
        self.h
    }

    /// Returns the stage of the step-doubling cycle
    pub fn state(&self) -> SubstepState {
        self.state
    }

    /// Returns the number of full sub-steps requested so far
    pub fn n_substeps(&self) -> usize {
        self.stats.n_cycles
    }

    /// Returns the statistics
    pub fn stats(&self) -> &SubstepStats {
        &self.stats
    }

    /// Composes the tangent accumulator with the result of a sub-step of size `size`
    fn compose(
        &self,
        base: &TangentMatrix<N>,
        size: f64,
        dxdy: &TangentMatrix<N>,
        dydx_old: Option<&TangentMatrix<N>>,
    ) -> TangentMatrix<N> {
        let mut tt = match dydx_old {
            Some(dd) => (TangentMatrix::<N>::identity() - dd) * base,
            None => *base,
        };
        tt += self.elastic_tangent * size;
        dxdy * tt
    }

    /// Handles the result of a local solve according to the stage of the cycle
    fn finish(
        &mut self,
        stress: &Vector6,
        dxdy: &TangentMatrix<N>,
        dydx_old: Option<&TangentMatrix<N>>,
        internal: &StateVector<M>,
    ) -> SubstepOutcome {
        match self.state {
            SubstepState::FullStep => {
                self.stress_full.copy_from(stress);
                self.internal_full.copy_from(internal);
                self.tangent_full = self.compose(&self.tangent, self.h, dxdy, dydx_old);
                self.state = SubstepState::FirstHalfStep;
                SubstepOutcome::Continue
            }
            SubstepState::FirstHalfStep => {
                self.stress_half.copy_from(stress);
                self.internal_half.copy_from(internal);
                self.tangent_half = self.compose(&self.tangent, 0.5 * self.h, dxdy, dydx_old);
                self.state = SubstepState::SecondHalfStep;
                SubstepOutcome::Continue
            }
            SubstepState::SecondHalfStep => {
                self.state = SubstepState::FullStep;

                // error estimation
                let error = (stress - self.stress_full).norm();
                let error_ratio = error / self.control.tolerance;
                let scale = calc_scale_factor(error_ratio, self.h, &self.control);
                self.stats.last_error_ratio = error_ratio;

                let outcome = if !error.is_finite() {
                    // the solver returned non-finite values; retry with a smaller sub-step
                    self.stats.n_rejected += 1;
                    self.rescale(self.control.scale_down_factor)
                } else if error > self.control.tolerance {
                    self.stats.n_rejected += 1;
                    self.passed_substeps = 0;
                    if error_ratio < SPLIT_ERROR_RATIO {
                        self.split()
                    } else {
                        self.repeat_after_error(scale)
                    }
                } else {
                    self.tangent_half = self.compose(&self.tangent_half, 0.5 * self.h, dxdy, dydx_old);
                    self.stress_half.copy_from(stress);
                    self.internal_half.copy_from(internal);

                    // Richardson extrapolation
                    self.tangent = self.tangent_half * 2.0 - self.tangent_full;
                    self.stress = self.stress_half * 2.0 - self.stress_full;
                    self.internal = self.internal_half * 2.0 - self.internal_full;
                    self.progress += self.h;
                    self.passed_substeps += 1;
                    self.stats.n_accepted += 1;

                    // grow only after enough consecutive passes
                    let scale = if scale > 1.0 && self.passed_substeps < self.control.n_passes_to_increase {
                        1.0
                    } else {
                        scale
                    };
                    self.h = self.scaled_size(scale);
                    SubstepOutcome::Accepted
                };
                self.print_cycle(Some(error_ratio), &outcome, false);
                outcome
            }
        }
    }

    /// Reuses the first half step as the new full step and halves the sub-step size
    fn split(&mut self) -> SubstepOutcome {
        if self.h < 2.0 * self.control.min_step_size {
            return self.handle_minimum_step();
        }
        self.tangent_full = self.tangent_half;
        self.stress_full.copy_from(&self.stress_half);
        self.internal_full.copy_from(&self.internal_half);
        self.h *= 0.5;
        self.state = SubstepState::FirstHalfStep;
        self.stats.n_split += 1;
        SubstepOutcome::Split
    }

    /// Discards the temporaries and restarts the cycle with a scaled sub-step size
    fn repeat_after_error(&mut self, scale: f64) -> SubstepOutcome {
        let h_new = self.scaled_size(scale);
        // the sub-step cannot shrink below the minimum (or the clipped remainder)
        if h_new < self.control.min_step_size || h_new >= self.h {
            return self.handle_minimum_step();
        }
        self.h = h_new;
        self.state = SubstepState::FullStep;
        self.stats.n_repeated += 1;
        SubstepOutcome::Repeat
    }

    /// Applies the minimum step policy after an error above the tolerance
    fn handle_minimum_step(&mut self) -> SubstepOutcome {
        match self.control.minimum_step_policy {
            MinimumStepPolicy::AcceptFullStep => {
                self.accept_full_step_only();
                self.stats.n_forced += 1;
                SubstepOutcome::Forced(Notice::ToleranceIgnoredAtMinimumStep)
            }
            MinimumStepPolicy::Fail => {
                self.state = SubstepState::FullStep;
                self.stats.n_failed += 1;
                SubstepOutcome::Failed(Notice::MinimumStepSizeReached)
            }
        }
    }

    /// Accepts the full-step temporaries without extrapolation
    fn accept_full_step_only(&mut self) {
        self.tangent = self.tangent_full;
        self.stress.copy_from(&self.stress_full);
        self.internal.copy_from(&self.internal_full);
        self.progress += self.h;
        self.state = SubstepState::FullStep;
        self.stats.n_accepted += 1;
    }

    /// Resets the cycle and multiplies the sub-step size by `factor`
    fn rescale(&mut self, factor: f64) -> SubstepOutcome {
        self.state = SubstepState::FullStep;
        self.passed_substeps = 0;
        self.h *= factor;
        if self.h < self.control.min_step_size {
            self.h = self.control.min_step_size;
            self.stats.n_failed += 1;
            SubstepOutcome::Failed(Notice::MinimumStepSizeReached)
        } else {
            SubstepOutcome::Repeat
        }
    }

    /// Returns the scaled sub-step size
    ///
    /// With [ScaleClampOrder::MinimumStepLast], the scale factor already guarantees `h ≥ h_min`;
    /// the bound is re-applied to remove round-off.
    fn scaled_size(&self, scale: f64) -> f64 {
        let h_new = self.h * scale;
        match self.control.clamp_order {
            ScaleClampOrder::MinimumStepLast => f64::max(h_new, self.control.min_step_size),
            ScaleClampOrder::UpperBoundsLast => h_new,
        }
    }

    /// Prints one line of the sub-step table
    fn print_cycle(&self, error_ratio: Option<f64>, outcome: &SubstepOutcome, elastic: bool) {
        if !self.control.verbose {
            return;
        }
        let icon = match outcome {
            SubstepOutcome::Continue => return,
            SubstepOutcome::Accepted => {
                if elastic {
                    "🌱"
                } else {
                    "✅"
                }
            }
            SubstepOutcome::Split => "✂️",
            SubstepOutcome::Repeat => "🔁",
            SubstepOutcome::Forced(..) => "⚠️",
            SubstepOutcome::Failed(..) => "😱",
        };
        let ratio = match error_ratio {
            Some(r) => format!("{:>10.2e}", r),
            None => format!("{:>10}", "."),
        };
        println!(
            "{:>6} {:>13.6e} {:>13.6e} {} {}",
            self.stats.n_cycles, self.progress, self.h, ratio, icon
        );
        if let Some(notice) = outcome.notice() {
            println!("{:>6} {}", ".", notice);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
