use crate::base::{ScaleClampOrder, SubstepControl};
use crate::base::{ERROR_RATIO_ZERO, MAX_SCALE_FACTOR, MIN_SCALE_FACTOR, SAFETY_FACTOR};

/// Calculates the factor to scale the sub-step size after the step-doubling error estimation
///
/// ```text
///              ┌ 0.9 √(1 / ratio)   if ratio > 1e-10
/// scale(ratio) ┤
///              └ 1                  otherwise
/// ```
///
/// The result is then saturated to `[0.1, min(max_scale_up, 10)]` and such that `scale · h ≥ h_min`,
/// in the order given by [ScaleClampOrder].
///
/// # Input
///
/// * `error_ratio` -- the ratio error/tolerance
/// * `h` -- the current sub-step size
/// * `control` -- the control options
pub fn calc_scale_factor(error_ratio: f64, h: f64, control: &SubstepControl) -> f64 {
    let mut scale = if error_ratio > ERROR_RATIO_ZERO {
        SAFETY_FACTOR * f64::sqrt(1.0 / error_ratio)
    } else {
        1.0
    };
    let upper = f64::min(control.max_scale_up_factor, MAX_SCALE_FACTOR);
    let h_min = control.min_step_size;
    match control.clamp_order {
        ScaleClampOrder::MinimumStepLast => {
            scale = f64::min(f64::max(scale, MIN_SCALE_FACTOR), upper);
            if scale * h < h_min {
                scale = h_min / h;
            }
        }
        ScaleClampOrder::UpperBoundsLast => {
            if scale < MIN_SCALE_FACTOR {
                scale = MIN_SCALE_FACTOR;
            }
            if scale * h < h_min {
                scale = h_min / h;
            }
            if scale > upper {
                scale = upper;
            }
        }
    }
    scale
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::calc_scale_factor;
    use crate::base::{ScaleClampOrder, SubstepControl};
    use approx::assert_relative_eq;

    #[test]
    fn calc_scale_factor_works() {
        let mut control = SubstepControl::new();
        control.min_step_size = 1e-3;

        // exact sub-step
        assert_eq!(calc_scale_factor(0.0, 0.5, &control), 1.0);
        assert_eq!(calc_scale_factor(1e-11, 0.5, &control), 1.0);

        // optimal factor
        assert_relative_eq!(calc_scale_factor(0.25, 0.5, &control), 1.8, epsilon = 1e-15);
        assert_relative_eq!(calc_scale_factor(4.0, 0.5, &control), 0.45, epsilon = 1e-15);

        // lower bound
        assert_eq!(calc_scale_factor(1e4, 0.5, &control), 0.1);

        // upper bound
        assert_eq!(calc_scale_factor(1e-6, 0.5, &control), 10.0);
        control.max_scale_up_factor = 2.0;
        assert_eq!(calc_scale_factor(1e-6, 0.5, &control), 2.0);
        control.max_scale_up_factor = 20.0;
        assert_eq!(calc_scale_factor(1e-6, 0.5, &control), 10.0);

        // minimum step size
        assert_relative_eq!(calc_scale_factor(1e4, 0.005, &control), 0.2, epsilon = 1e-15);
    }

    #[test]
    fn clamp_order_matters_below_the_upper_bound() {
        let mut control = SubstepControl::new();
        control.min_step_size = 0.05;
        control.max_scale_up_factor = 2.0;
        let h = 0.001; // h_min / h = 50 > upper bound

        control.clamp_order = ScaleClampOrder::MinimumStepLast;
        let scale = calc_scale_factor(1e4, h, &control);
        assert_relative_eq!(scale, 50.0, epsilon = 1e-12);
        assert!(scale * h >= control.min_step_size - 1e-15);

        control.clamp_order = ScaleClampOrder::UpperBoundsLast;
        assert_eq!(calc_scale_factor(1e4, h, &control), 2.0);
    }

    #[test]
    fn clamp_orders_agree_in_regular_cases() {
        let mut control = SubstepControl::new();
        control.min_step_size = 1e-4;
        for ratio in [0.0, 1e-3, 0.5, 1.0, 1.9, 3.0, 1e3] {
            for h in [1.0, 0.5, 0.01] {
                control.clamp_order = ScaleClampOrder::MinimumStepLast;
                let a = calc_scale_factor(ratio, h, &control);
                control.clamp_order = ScaleClampOrder::UpperBoundsLast;
                let b = calc_scale_factor(ratio, h, &control);
                assert_eq!(a, b);
            }
        }
    }
}
