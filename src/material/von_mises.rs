use super::{deviator, dyad, identity2, invariant_sigma_d, invariant_sigma_m, p_symdev, LinElasticity};
use super::{LocalResponse, LocalSolution, LocalSolver, SubstepInput, SQRT_3_BY_2};
use crate::base::{Matrix6, StateVector, Vector6};
use crate::StrError;

/// Holds the index of z internal variable (size of yield surface)
const Z0: usize = 0;

/// Size of the algorithmic tangent: 6 stress components and z
pub const VON_MISES_N: usize = 7;

/// Number of internal values: z
pub const VON_MISES_M: usize = 1;

/// Implements the von Mises plasticity model with linear isotropic hardening
///
/// The local problem is solved by the closest point projection (radial return):
///
/// ```text
/// σ_trial = σₒₗ + D : Δε
/// f_trial = σd_trial - zₒₗ
/// λ = f_trial / (3G + H)
/// σ = σ_trial - (3G λ / σd_trial) s_trial
/// z = zₒₗ + H λ
/// ```
///
/// The algorithmic tangent is computed w.r.t. `Y = {σ_trial, zₒₗ}` for `X = {σ, z}`. Including z
/// makes the tangent composed over sub-steps exact when the hardening evolves.
pub struct VonMises {
    /// Linear elasticity
    lin_elasticity: LinElasticity,

    /// Shear modulus G
    gg: f64,

    /// Hardening coefficient
    hh: f64,

    /// Initial size of the yield surface
    ///
    /// This value corresponds to the von Mises stress:
    ///
    /// ```text
    /// f = σd - z
    /// ```
    z0: f64,

    /// Allow initial yield surface drift (e.g., for debugging)
    allow_initial_drift: bool,
}

impl VonMises {
    /// Allocates a new instance
    pub fn new(young: f64, poisson: f64, z0: f64, hh: f64) -> Result<Self, StrError> {
        if !(z0 > 0.0) {
            return Err("the initial size of the yield surface must be positive");
        }
        if !(hh >= 0.0) {
            return Err("the hardening coefficient must be non-negative");
        }
        let lin_elasticity = LinElasticity::new(young, poisson)?;
        let (_, gg) = lin_elasticity.get_bulk_shear();
        Ok(VonMises {
            lin_elasticity,
            gg,
            hh,
            z0,
            allow_initial_drift: false,
        })
    }

    /// Allows initial stress states outside the yield surface
    pub fn set_allow_initial_drift(&mut self, flag: bool) -> &mut Self {
        self.allow_initial_drift = flag;
        self
    }

    /// Calculates the yield function f = σd - z
    pub fn yield_function(&self, stress: &Vector6, internal: &StateVector<1>) -> f64 {
        invariant_sigma_d(stress) - internal[Z0]
    }

    /// Calculates the consistent tangent modulus dσ/dε of a single elastoplastic update
    ///
    /// ```text
    /// D_alg = a Psd + b s ⊗ s + K I ⊗ I
    /// ```
    pub fn calc_consistent_modulus(&self, stress: &Vector6, lambda: f64) -> Matrix6 {
        let (kk, _) = self.lin_elasticity.get_bulk_shear();
        let (gg, hh) = (self.gg, self.hh);
        let s = deviator(stress);
        let sigma_d = invariant_sigma_d(stress);
        let sigma_d_trial = sigma_d + lambda * 3.0 * gg;
        let norm_s = s.norm();
        let d = 3.0 * gg + hh;
        let a = 2.0 * gg * (1.0 - lambda * 3.0 * gg / sigma_d_trial);
        let b = 6.0 * gg * gg * (lambda / sigma_d_trial - 1.0 / d) / (norm_s * norm_s);
        let ii = identity2();
        p_symdev() * a + dyad(&s, &s) * b + dyad(&ii, &ii) * kk
    }
}

impl LocalSolver<VON_MISES_N, VON_MISES_M> for VonMises {
    /// Returns the 6×6 elastic tangent
    fn elastic_tangent(&self) -> Matrix6 {
        *self.lin_elasticity.get_modulus()
    }

    /// Initializes the internal values for the initial stress state
    fn initialize_internal_values(&self, stress: &Vector6) -> Result<StateVector<1>, StrError> {
        let internal = StateVector::<1>::new(self.z0);
        if !self.allow_initial_drift && self.yield_function(stress, &internal) > 0.0 {
            return Err("stress is outside the yield surface");
        }
        Ok(internal)
    }

    /// Updates the stress and z by the radial return
    fn solve(
        &mut self,
        solution: &mut LocalSolution<VON_MISES_N, VON_MISES_M>,
        input: &SubstepInput<VON_MISES_M>,
    ) -> Result<LocalResponse, StrError> {
        // trial stress: σ_trial = σₒₗ + D : Δε
        let dd = self.lin_elasticity.get_modulus();
        let sigma_trial = input.stress + dd * input.delta_strain;
        let z_old = input.internal[Z0];

        // elastic update
        let f_trial = invariant_sigma_d(&sigma_trial) - z_old;
        if f_trial <= 0.0 {
            solution.stress = sigma_trial;
            solution.internal = input.internal;
            return Ok(LocalResponse::Elastic);
        }

        // coefficients
        let (gg, hh) = (self.gg, self.hh);
        let sigma_m_trial = invariant_sigma_m(&sigma_trial);
        let sigma_d_trial = invariant_sigma_d(&sigma_trial);
        let d = 3.0 * gg + hh;
        let lambda = f_trial / d;
        let beta = lambda * 3.0 * gg / sigma_d_trial;
        if !lambda.is_finite() || !beta.is_finite() {
            return Ok(LocalResponse::NotConverged {
                time_step_fraction: 0.5,
            });
        }

        // σ_new = m s_trial + σm_trial I
        let s_trial = deviator(&sigma_trial);
        let m = 1.0 - beta;
        solution.stress = s_trial * m + identity2() * sigma_m_trial;
        solution.internal[Z0] = z_old + hh * lambda;

        // unit normal: n = s_trial / ‖s_trial‖
        let n = s_trial / s_trial.norm();

        // dσ/dσ_trial = I - β Psd - 3G (1/d - λ/σd_trial) n ⊗ n
        let c = 3.0 * gg * (1.0 / d - lambda / sigma_d_trial);
        let dsigma_dsigma_trial = Matrix6::identity() - p_symdev() * beta - dyad(&n, &n) * c;

        // dσ/dzₒₗ = 3G / (d σd_trial) s_trial
        let dsigma_dz_old = s_trial * (3.0 * gg / (d * sigma_d_trial));

        // dz/dσ_trial = (H/d) √(3/2) n
        let dz_dsigma_trial = n * (hh * SQRT_3_BY_2 / d);

        // dz/dzₒₗ = 3G/d
        let dz_dz_old = 3.0 * gg / d;

        let dxdy = &mut solution.dxdy;
        dxdy.fixed_view_mut::<6, 6>(0, 0).copy_from(&dsigma_dsigma_trial);
        dxdy.fixed_view_mut::<6, 1>(0, 6).copy_from(&dsigma_dz_old);
        dxdy.fixed_view_mut::<1, 6>(6, 0).copy_from(&dz_dsigma_trial.transpose());
        dxdy[(6, 6)] = dz_dz_old;
        Ok(LocalResponse::Inelastic)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
