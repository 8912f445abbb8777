use super::{identity2, p_symdev, LocalResponse, LocalSolution, LocalSolver, SubstepInput};
use crate::base::{Matrix6, StateVector, Vector6};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Implements isotropic linear elasticity in Mandel basis
///
/// ```text
/// D = 2G Psd + 3K (⅓ I ⊗ I)
/// C = D⁻¹ = Psd / (2G) + (⅓ I ⊗ I) / (3K)
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct LinElasticity {
    /// Young's modulus
    young: f64,

    /// Poisson's coefficient
    poisson: f64,

    /// Holds the modulus D
    dd: Matrix6,
}

impl LinElasticity {
    /// Allocates a new instance
    pub fn new(young: f64, poisson: f64) -> Result<Self, StrError> {
        if !(young > 0.0) {
            return Err("Young's modulus must be positive");
        }
        if !(poisson > -1.0 && poisson < 0.5) {
            return Err("Poisson's coefficient must be in (-1, 0.5)");
        }
        let mut res = LinElasticity {
            young,
            poisson,
            dd: Matrix6::zeros(),
        };
        let (kk, gg) = res.get_bulk_shear();
        let ii = identity2();
        res.dd = p_symdev() * (2.0 * gg) + ii * ii.transpose() * kk;
        Ok(res)
    }

    /// Returns the Young's modulus and Poisson's coefficient
    pub fn get_young_poisson(&self) -> (f64, f64) {
        (self.young, self.poisson)
    }

    /// Returns the bulk (K) and shear (G) moduli
    pub fn get_bulk_shear(&self) -> (f64, f64) {
        let kk = self.young / (3.0 * (1.0 - 2.0 * self.poisson));
        let gg = self.young / (2.0 * (1.0 + self.poisson));
        (kk, gg)
    }

    /// Returns an access to the modulus D
    pub fn get_modulus(&self) -> &Matrix6 {
        &self.dd
    }

    /// Returns the compliance C = D⁻¹
    pub fn calc_compliance(&self) -> Matrix6 {
        let (kk, gg) = self.get_bulk_shear();
        let ii = identity2();
        p_symdev() / (2.0 * gg) + ii * ii.transpose() / (9.0 * kk)
    }
}

/// Implements a linear elastic local solver (every sub-step is elastic)
pub struct LinearElastic {
    pub model: LinElasticity,
}

impl LinearElastic {
    /// Allocates a new instance
    pub fn new(young: f64, poisson: f64) -> Result<Self, StrError> {
        Ok(LinearElastic {
            model: LinElasticity::new(young, poisson)?,
        })
    }
}

impl<const N: usize, const M: usize> LocalSolver<N, M> for LinearElastic {
    /// Returns the 6×6 elastic tangent
    fn elastic_tangent(&self) -> Matrix6 {
        *self.model.get_modulus()
    }

    /// Initializes the internal values (none are modified)
    fn initialize_internal_values(&self, _stress: &Vector6) -> Result<StateVector<M>, StrError> {
        Ok(StateVector::<M>::zeros())
    }

    /// Updates the stress: σ ← σ + D : Δε
    fn solve(&mut self, solution: &mut LocalSolution<N, M>, input: &SubstepInput<M>) -> Result<LocalResponse, StrError> {
        solution.stress = input.stress + self.model.get_modulus() * input.delta_strain;
        solution.internal = input.internal;
        Ok(LocalResponse::Elastic)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{LinElasticity, LinearElastic};
    use crate::base::{Matrix6, StateVector, Vector6};
    use crate::material::{LocalResponse, LocalSolution, LocalSolver, SubstepInput};
    use approx::assert_relative_eq;

    #[test]
    fn new_captures_errors() {
        assert_eq!(LinElasticity::new(0.0, 0.2).err(), Some("Young's modulus must be positive"));
        assert_eq!(
            LinElasticity::new(1000.0, 0.5).err(),
            Some("Poisson's coefficient must be in (-1, 0.5)")
        );
        assert_eq!(
            LinearElastic::new(f64::NAN, 0.2).err(),
            Some("Young's modulus must be positive")
        );
    }

    #[test]
    fn modulus_and_compliance_work() {
        let ela = LinElasticity::new(900.0, 0.25).unwrap();
        let (kk, gg) = ela.get_bulk_shear();
        assert_relative_eq!(kk, 600.0, epsilon = 1e-12);
        assert_relative_eq!(gg, 360.0, epsilon = 1e-12);
        assert_eq!(ela.get_young_poisson(), (900.0, 0.25));

        // components
        let dd = ela.get_modulus();
        let c = 900.0 / ((1.0 + 0.25) * (1.0 - 2.0 * 0.25));
        assert_relative_eq!(dd[(0, 0)], c * (1.0 - 0.25), epsilon = 1e-12);
        assert_relative_eq!(dd[(0, 1)], c * 0.25, epsilon = 1e-12);
        assert_relative_eq!(dd[(3, 3)], 2.0 * gg, epsilon = 1e-12);
        assert_eq!(dd[(0, 3)], 0.0);

        // inverse
        let cc = ela.calc_compliance();
        assert_relative_eq!(dd * cc, Matrix6::identity(), epsilon = 1e-14);
        assert_relative_eq!(cc[(0, 0)], 1.0 / 900.0, epsilon = 1e-15);
        assert_relative_eq!(cc[(0, 1)], -0.25 / 900.0, epsilon = 1e-15);
    }

    #[test]
    fn solve_works() {
        let mut model = LinearElastic::new(900.0, 0.25).unwrap();
        let mut solution = LocalSolution::<6, 1>::new();
        let input = SubstepInput {
            stress: Vector6::new(1.0, 1.0, 1.0, 0.0, 0.0, 0.0),
            internal: StateVector::<1>::new(3.0),
            delta_strain: Vector6::new(0.001, 0.0, 0.0, 0.0, 0.0, 0.0),
            time: 0.0,
            dt: 1.0,
        };
        let response = model.solve(&mut solution, &input).unwrap();
        assert_eq!(response, LocalResponse::Elastic);
        let c = 900.0 / ((1.0 + 0.25) * (1.0 - 2.0 * 0.25));
        assert_relative_eq!(solution.stress[0], 1.0 + c * 0.75 * 0.001, epsilon = 1e-14);
        assert_relative_eq!(solution.stress[1], 1.0 + c * 0.25 * 0.001, epsilon = 1e-14);
        assert_eq!(solution.stress[3], 0.0);
        assert_eq!(solution.internal[0], 3.0);
        let internal = LocalSolver::<6, 1>::initialize_internal_values(&model, &input.stress).unwrap();
        assert_eq!(internal[0], 0.0);
        let dd = LocalSolver::<6, 1>::elastic_tangent(&model);
        assert_eq!(&dd, model.model.get_modulus());
    }
}
