use super::{Notice, SubstepOutcome, SubstepStats};
use crate::base::{Matrix6, SubstepControl, TangentMatrix, TangentScheme, N_STRESS, PROGRESS_TOL};
use crate::StrError;

/// Implements a substepper with step sizes driven by the number of consecutive successful sub-steps
///
/// No error estimation is performed: the sub-step size is multiplied by `max_scale_up_factor`
/// after `n_passes_to_increase` consecutive successes and by `scale_down_factor` whenever the
/// local solver fails. The consistent tangent is accumulated as follows:
///
/// ```text
/// elastic:        T ← T + h E
/// implicit:       T ← dX/dY · (T + h E)
/// semi-explicit:  T ← dX/dY · ((I - dY/dXₒₗ) T + h E')
/// ```
///
/// The elastic tangent may be replaced between sub-steps (time-variant elasticity).
///
/// Note: the progress is advanced when the sub-step is requested; a failed sub-step must be
/// followed by [PassCountSubstepper::decrease_substep_size].
pub struct PassCountSubstepper<const N: usize> {
    /// Holds the control options
    control: SubstepControl,

    /// Holds the elastic extension E of the tangent accumulator
    elastic_tangent: TangentMatrix<N>,

    /// Holds the consumed fraction of the strain increment (including the requested sub-step)
    progress: f64,

    /// Holds the current sub-step size
    h: f64,

    /// Holds the number of consecutive successful sub-steps
    passed_substeps: usize,

    /// Holds the tangent accumulator
    tangent: TangentMatrix<N>,

    /// Holds statistics
    stats: SubstepStats,
}

impl<const N: usize> PassCountSubstepper<N> {
    /// Allocates a new instance
    pub fn new(control: &SubstepControl, elastic_tangent: &Matrix6) -> Result<Self, StrError> {
        if let Some(msg) = control.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate substepper because control.validate() failed");
        }
        if N < N_STRESS {
            return Err("the tangent dimension N must be ≥ 6");
        }
        let ee = match control.tangent_scheme {
            TangentScheme::Implicit => TangentMatrix::<N>::identity(),
            TangentScheme::SemiExplicit => TangentMatrix::<N>::zeros(),
        };
        let mut substepper = PassCountSubstepper {
            control: *control,
            elastic_tangent: ee,
            progress: 0.0,
            h: control.initial_step_size,
            passed_substeps: 0,
            tangent: TangentMatrix::<N>::zeros(),
            stats: SubstepStats::new(),
        };
        substepper.set_elastic_tangent(elastic_tangent);
        Ok(substepper)
    }

    /// Replaces the elastic tangent used by the next extensions
    pub fn set_elastic_tangent(&mut self, elastic_tangent: &Matrix6) {
        self.elastic_tangent.fixed_view_mut::<6, 6>(0, 0).copy_from(elastic_tangent);
    }

    /// Returns true if the whole increment has been consumed
    pub fn is_finished(&self) -> bool {
        1.0 - self.progress <= PROGRESS_TOL
    }

    /// Returns the size of the next sub-step and advances the progress
    pub fn next_substep(&mut self) -> f64 {
        if self.passed_substeps >= self.control.n_passes_to_increase {
            self.h *= self.control.max_scale_up_factor;
        }
        let remaining = 1.0 - self.progress;
        if remaining < self.h {
            self.h = remaining;
        }
        self.passed_substeps += 1;
        self.progress += self.h;
        self.stats.n_cycles += 1;
        self.stats.record_size(self.h);
        self.h
    }

    /// Returns the progress at the start of the requested sub-step
    pub fn finished_progress(&self) -> f64 {
        self.progress - self.h
    }

    /// Withdraws the requested sub-step and reduces the sub-step size
    ///
    /// Returns [SubstepOutcome::Failed] if the new size falls below the minimum; the size is then
    /// set to the minimum.
    pub fn decrease_substep_size(&mut self) -> SubstepOutcome {
        self.progress -= self.h;
        self.passed_substeps = 0;
        self.stats.n_discarded += 1;
        self.h *= self.control.scale_down_factor;
        if self.h < self.control.min_step_size {
            self.h = self.control.min_step_size;
            self.stats.n_failed += 1;
            SubstepOutcome::Failed(Notice::MinimumStepSizeReached)
        } else {
            SubstepOutcome::Repeat
        }
    }

    /// Extends the tangent with an elastic sub-step
    pub fn finish_elastic_substep(&mut self) {
        self.tangent += self.elastic_tangent * self.h;
        self.stats.n_accepted += 1;
        self.stats.n_elastic += 1;
    }

    /// Extends the tangent with an implicit (inelastic) sub-step
    pub fn finish_substep(&mut self, dxdy: &TangentMatrix<N>) -> Result<(), StrError> {
        if self.control.tangent_scheme != TangentScheme::Implicit {
            return Err("finish_substep requires the implicit tangent scheme");
        }
        self.tangent = dxdy * (self.tangent + self.elastic_tangent * self.h);
        self.stats.n_accepted += 1;
        Ok(())
    }

    /// Extends the tangent with a semi-explicit (inelastic) sub-step
    pub fn finish_substep_semi_explicit(
        &mut self,
        dxdy: &TangentMatrix<N>,
        dydx_old: &TangentMatrix<N>,
    ) -> Result<(), StrError> {
        if self.control.tangent_scheme != TangentScheme::SemiExplicit {
            return Err("finish_substep_semi_explicit requires the semi-explicit tangent scheme");
        }
        let tt = (TangentMatrix::<N>::identity() - dydx_old) * self.tangent + self.elastic_tangent * self.h;
        self.tangent = dxdy * tt;
        self.stats.n_accepted += 1;
        Ok(())
    }

    /// Returns the top-left 6×6 block of the tangent accumulator
    pub fn consistent_tangent(&self) -> Matrix6 {
        self.tangent.fixed_view::<6, 6>(0, 0).into_owned()
    }

    /// Returns the N×N tangent accumulator
    pub fn accumulated_tangent(&self) -> &TangentMatrix<N> {
        &self.tangent
    }

    /// Returns the consumed fraction of the strain increment
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Returns the current sub-step size
    pub fn substep_size(&self) -> f64 {
        self.h
    }

    /// Returns the statistics
    pub fn stats(&self) -> &SubstepStats {
        &self.stats
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::PassCountSubstepper;
    use crate::base::{Matrix6, SubstepControl, TangentMatrix, TangentScheme};
    use crate::substep::{Notice, SubstepOutcome};
    use approx::assert_relative_eq;

    fn elastic_tangent() -> Matrix6 {
        Matrix6::identity() * 2.0
    }

    #[test]
    fn new_captures_errors() {
        let mut control = SubstepControl::new();
        control.scale_down_factor = 1.0;
        assert_eq!(
            PassCountSubstepper::<6>::new(&control, &elastic_tangent()).err(),
            Some("cannot allocate substepper because control.validate() failed")
        );
        let control = SubstepControl::new();
        assert_eq!(
            PassCountSubstepper::<5>::new(&control, &elastic_tangent()).err(),
            Some("the tangent dimension N must be ≥ 6")
        );
    }

    #[test]
    fn substep_sizes_grow_after_enough_passes() {
        let mut control = SubstepControl::new();
        control.initial_step_size = 0.125;
        control.max_scale_up_factor = 2.0;
        control.n_passes_to_increase = 2;
        let mut sub = PassCountSubstepper::<6>::new(&control, &elastic_tangent()).unwrap();
        let mut sizes = Vec::new();
        while !sub.is_finished() {
            let start = sub.progress();
            sizes.push(sub.next_substep());
            assert_eq!(sub.finished_progress(), start);
            sub.finish_elastic_substep();
        }
        // 0.125, 0.125, then 0.25 and 0.5 (clipped)
        assert_eq!(sizes, &[0.125, 0.125, 0.25, 0.5]);
        assert_eq!(sub.progress(), 1.0);
        assert_eq!(sub.stats().n_cycles, 4);
        assert_eq!(sub.stats().n_elastic, 4);
        assert_relative_eq!(sub.consistent_tangent(), elastic_tangent(), epsilon = 1e-15);
    }

    #[test]
    fn decrease_substep_size_works() {
        let mut control = SubstepControl::new();
        control.initial_step_size = 0.5;
        control.min_step_size = 0.2;
        let mut sub = PassCountSubstepper::<6>::new(&control, &elastic_tangent()).unwrap();
        assert_eq!(sub.next_substep(), 0.5);
        assert_eq!(sub.progress(), 0.5);
        assert_eq!(sub.decrease_substep_size(), SubstepOutcome::Repeat);
        assert_eq!(sub.progress(), 0.0);
        assert_eq!(sub.substep_size(), 0.25);

        // no scale-up right after a failure
        assert_eq!(sub.next_substep(), 0.25);
        assert_eq!(
            sub.decrease_substep_size(),
            SubstepOutcome::Failed(Notice::MinimumStepSizeReached)
        );
        assert_eq!(sub.substep_size(), 0.2);
        assert_eq!(sub.progress(), 0.0);
        assert_eq!(sub.stats().n_discarded, 2);
        assert_eq!(sub.stats().n_failed, 1);
    }

    #[test]
    fn implicit_tangent_is_composed_in_order() {
        let mut control = SubstepControl::new();
        control.initial_step_size = 0.5;
        control.n_passes_to_increase = 10;
        let mut sub = PassCountSubstepper::<7>::new(&control, &elastic_tangent()).unwrap();
        let a = 0.5;
        let dxdy = TangentMatrix::<7>::identity() * a;
        assert_eq!(
            sub.finish_substep_semi_explicit(&dxdy, &dxdy).err(),
            Some("finish_substep_semi_explicit requires the semi-explicit tangent scheme")
        );
        while !sub.is_finished() {
            sub.next_substep();
            sub.finish_substep(&dxdy).unwrap();
        }
        // T₁ = a h E;  T₂ = a (T₁ + h E)
        let expected = elastic_tangent() * (a * a * 0.5 + a * 0.5);
        assert_relative_eq!(sub.consistent_tangent(), expected, epsilon = 1e-15);
        assert_relative_eq!(sub.accumulated_tangent()[(6, 6)], a * a * 0.5 + a * 0.5, epsilon = 1e-15);
    }

    #[test]
    fn semi_explicit_tangent_works() {
        let mut control = SubstepControl::new();
        control.initial_step_size = 0.5;
        control.tangent_scheme = TangentScheme::SemiExplicit;
        let mut sub = PassCountSubstepper::<7>::new(&control, &elastic_tangent()).unwrap();
        let ii = TangentMatrix::<7>::identity();
        assert_eq!(
            sub.finish_substep(&ii).err(),
            Some("finish_substep requires the implicit tangent scheme")
        );
        let dydx_old = ii * 0.5;
        while !sub.is_finished() {
            sub.next_substep();
            sub.finish_substep_semi_explicit(&ii, &dydx_old).unwrap();
        }
        // T₁ = h E';  T₂ = (I - dY/dXₒₗ) T₁ + h E'
        assert_relative_eq!(sub.consistent_tangent(), elastic_tangent() * 0.75, epsilon = 1e-15);
        assert_eq!(sub.accumulated_tangent()[(6, 6)], 0.0);
    }

    #[test]
    fn time_variant_elastic_tangent_works() {
        let mut control = SubstepControl::new();
        control.initial_step_size = 0.5;
        control.n_passes_to_increase = 10;
        let mut sub = PassCountSubstepper::<6>::new(&control, &elastic_tangent()).unwrap();
        sub.next_substep();
        sub.finish_elastic_substep();
        sub.set_elastic_tangent(&(elastic_tangent() * 3.0));
        sub.next_substep();
        sub.finish_elastic_substep();
        assert!(sub.is_finished());
        // 0.5 (2 I) + 0.5 (6 I)
        assert_relative_eq!(sub.consistent_tangent(), Matrix6::identity() * 4.0, epsilon = 1e-15);
    }
}
