use crate::base::{Matrix6, Vector6};

/// Square root of 2/3
pub const SQRT_2_BY_3: f64 = 0.816496580927726032732428024901963797321982493552223376144;

/// Square root of 3/2
pub const SQRT_3_BY_2: f64 = 1.22474487139158904909864203735294569598297374032833506421;

/// Returns the second-order identity tensor in Mandel basis
pub fn identity2() -> Vector6 {
    Vector6::new(1.0, 1.0, 1.0, 0.0, 0.0, 0.0)
}

/// Returns the fourth-order symmetric-deviatoric projector in Mandel basis
///
/// ```text
/// Psd = Isym - ⅓ I ⊗ I
/// ```
pub fn p_symdev() -> Matrix6 {
    let ii = identity2();
    Matrix6::identity() - ii * ii.transpose() / 3.0
}

/// Returns the outer product a ⊗ b
pub fn dyad(a: &Vector6, b: &Vector6) -> Matrix6 {
    a * b.transpose()
}

/// Returns the deviator s = dev(σ) = σ - σm I
pub fn deviator(sigma: &Vector6) -> Vector6 {
    sigma - identity2() * invariant_sigma_m(sigma)
}

/// Returns the mean pressure invariant σm = ⅓ trace(σ)
pub fn invariant_sigma_m(sigma: &Vector6) -> f64 {
    (sigma[0] + sigma[1] + sigma[2]) / 3.0
}

/// Returns the deviatoric stress (von Mises) invariant σd = ‖s‖ √3/√2
pub fn invariant_sigma_d(sigma: &Vector6) -> f64 {
    deviator(sigma).norm() * SQRT_3_BY_2
}

/// Returns the volumetric strain invariant εv = trace(ε)
pub fn invariant_eps_v(epsilon: &Vector6) -> f64 {
    epsilon[0] + epsilon[1] + epsilon[2]
}

/// Returns the deviatoric strain invariant εd = ‖dev(ε)‖ √2/√3
pub fn invariant_eps_d(epsilon: &Vector6) -> f64 {
    deviator(epsilon).norm() * SQRT_2_BY_3
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Vector6;
    use approx::assert_relative_eq;

    #[test]
    fn constants_are_correct() {
        assert_relative_eq!(SQRT_2_BY_3, f64::sqrt(2.0 / 3.0), epsilon = 1e-15);
        assert_relative_eq!(SQRT_3_BY_2, f64::sqrt(3.0 / 2.0), epsilon = 1e-15);
    }

    #[test]
    fn invariants_work() {
        // uniaxial stress: σd = |σ₀₀|
        let sigma = Vector6::new(-3.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(invariant_sigma_m(&sigma), -1.0, epsilon = 1e-15);
        assert_relative_eq!(invariant_sigma_d(&sigma), 3.0, epsilon = 1e-15);
        assert_relative_eq!(deviator(&sigma), Vector6::new(-2.0, 1.0, 1.0, 0.0, 0.0, 0.0), epsilon = 1e-15);

        // pure shear in Mandel basis: σ₀₁ = τ is stored as √2 τ
        let tau = 2.0;
        let sigma = Vector6::new(0.0, 0.0, 0.0, tau * f64::sqrt(2.0), 0.0, 0.0);
        assert_relative_eq!(invariant_sigma_d(&sigma), tau * f64::sqrt(3.0), epsilon = 1e-14);

        // uniaxial strain: εd = ⅔ |ε₀₀|
        let epsilon = Vector6::new(0.03, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(invariant_eps_v(&epsilon), 0.03, epsilon = 1e-15);
        assert_relative_eq!(invariant_eps_d(&epsilon), 0.02, epsilon = 1e-15);
    }

    #[test]
    fn p_symdev_works() {
        let psd = p_symdev();
        let sigma = Vector6::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_relative_eq!(psd * sigma, deviator(&sigma), epsilon = 1e-14);
        assert_relative_eq!(psd * psd, psd, epsilon = 1e-15);
        let ii = identity2();
        assert_relative_eq!(dyad(&ii, &ii).trace(), 3.0, epsilon = 1e-15);
    }
}
