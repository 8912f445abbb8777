use super::{integrate_increment, invariant_eps_d, invariant_eps_v, invariant_sigma_d, invariant_sigma_m};
use super::{IncrementOutcome, LocalSolver};
use crate::base::{Matrix6, StateVector, SubstepControl, Vector6};
use crate::substep::{AdaptiveSubstepper, Notice, SubstepStats};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Holds a strain-driven loading path
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StrainPath {
    /// Strain points (Mandel basis)
    pub strains: Vec<Vector6>,

    /// Time associated with each strain point
    pub times: Vec<f64>,

    /// Holds all Δε
    pub deltas_strain: Vec<Vector6>,

    /// Holds all volumetric strain invariants
    pub eps_v: Vec<f64>,

    /// Holds all deviatoric strain invariants
    pub eps_d: Vec<f64>,
}

/// Holds the results of following a strain path
#[derive(Clone, Debug, Serialize)]
pub struct PathResults<const M: usize> {
    /// Stress at each strain point (Mandel basis)
    pub stresses: Vec<Vector6>,

    /// Internal values at each strain point
    pub internals: Vec<StateVector<M>>,

    /// Consistent tangent of each increment
    pub tangents: Vec<Matrix6>,

    /// Substepping statistics of each increment
    pub stats: Vec<SubstepStats>,

    /// Sub-steps accepted without error control in each increment
    pub notices: Vec<Vec<Notice>>,

    /// Holds all mean pressure invariants
    pub sigma_m: Vec<f64>,

    /// Holds all deviatoric stress invariants
    pub sigma_d: Vec<f64>,
}

impl StrainPath {
    /// Allocates a new (empty) instance
    pub fn new() -> Self {
        StrainPath {
            strains: Vec::new(),
            times: Vec::new(),
            deltas_strain: Vec::new(),
            eps_v: Vec::new(),
            eps_d: Vec::new(),
        }
    }

    /// Generates a uniaxial-strain path: ε₀₀ goes linearly from zero to `eps_max`
    ///
    /// # Input
    ///
    /// * `n_increments` -- number of increments
    /// * `eps_max` -- final strain component ε₀₀
    ///
    /// The time goes from zero to `n_increments`.
    pub fn new_uniaxial_strain(n_increments: usize, eps_max: f64) -> Result<Self, StrError> {
        let mut path = StrainPath::new();
        path.push_strain(Vector6::zeros(), 0.0)?;
        for i in 0..n_increments {
            let m = (i + 1) as f64;
            let eps = m * eps_max / (n_increments as f64);
            path.push_strain(Vector6::new(eps, 0.0, 0.0, 0.0, 0.0, 0.0), m)?;
        }
        Ok(path)
    }

    /// Pushes a new strain point to the path
    ///
    /// # Input
    ///
    /// * `epsilon` -- strain tensor (Mandel basis)
    /// * `time` -- time; must be greater than the previous one
    pub fn push_strain(&mut self, epsilon: Vector6, time: f64) -> Result<&mut Self, StrError> {
        if let Some(last) = self.times.last() {
            if !(time > *last) {
                return Err("the time must increase along the path");
            }
        }
        if let Some(last) = self.strains.last() {
            self.deltas_strain.push(epsilon - last);
        }
        self.eps_v.push(invariant_eps_v(&epsilon));
        self.eps_d.push(invariant_eps_d(&epsilon));
        self.strains.push(epsilon);
        self.times.push(time);
        Ok(self)
    }

    /// Follows the strain path with one substepper per increment
    ///
    /// # Input
    ///
    /// * `control` -- the substepping control options
    /// * `solver` -- the local (material point) solver
    /// * `stress_ini` -- the initial stress (Mandel basis)
    pub fn follow<S, const N: usize, const M: usize>(
        &self,
        control: &SubstepControl,
        solver: &mut S,
        stress_ini: &Vector6,
    ) -> Result<PathResults<M>, StrError>
    where
        S: LocalSolver<N, M> + ?Sized,
    {
        if self.strains.len() < 2 {
            return Err("the path must have at least two strain points");
        }
        let mut stress = *stress_ini;
        let mut internal = solver.initialize_internal_values(&stress)?;
        let mut tangent = Matrix6::zeros();
        let mut results = PathResults::new();
        results.push(&stress, &internal);
        control.print_header();
        for (i, deps) in self.deltas_strain.iter().enumerate() {
            if control.verbose {
                println!("increment {}: t = {:?}", i + 1, self.times[i + 1]);
            }
            let mut substepper = AdaptiveSubstepper::<N, M>::new(control, &solver.elastic_tangent())?;
            substepper.set_converged_progress(&stress, &internal);
            let dt = self.times[i + 1] - self.times[i];
            match integrate_increment(&mut substepper, solver, deps, self.times[i], dt)? {
                IncrementOutcome::Converged { stats, notices } => {
                    substepper.get_results(&mut stress, &mut tangent, &mut internal);
                    results.push(&stress, &internal);
                    results.tangents.push(tangent);
                    results.stats.push(stats);
                    results.notices.push(notices);
                }
                IncrementOutcome::ReduceTimeStep { .. } => {
                    return Err("cannot integrate the strain increment (the time step must be reduced)");
                }
            }
        }
        Ok(results)
    }
}

impl<const M: usize> PathResults<M> {
    /// Allocates a new (empty) instance
    pub fn new() -> Self {
        PathResults {
            stresses: Vec::new(),
            internals: Vec::new(),
            tangents: Vec::new(),
            stats: Vec::new(),
            notices: Vec::new(),
            sigma_m: Vec::new(),
            sigma_d: Vec::new(),
        }
    }

    /// Pushes a new stress point
    fn push(&mut self, stress: &Vector6, internal: &StateVector<M>) {
        self.sigma_m.push(invariant_sigma_m(stress));
        self.sigma_d.push(invariant_sigma_d(stress));
        self.stresses.push(*stress);
        self.internals.push(*internal);
    }

    /// Writes a JSON file with the results
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let file = File::create(&path).map_err(|_| "cannot create file")?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

impl fmt::Display for PathResults<1> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = 15 * 9;
        let thin_line = format!("{:─^1$}", "", width);
        writeln!(f, "{}", thin_line)?;
        for i in 0..6 {
            write!(f, "{:>15}", format!("σ{}", i))?;
        }
        writeln!(f, "{:>15}{:>15}{:>15}", "σm", "σd", "z")?;
        writeln!(f, "{}", thin_line)?;
        for (k, sigma) in self.stresses.iter().enumerate() {
            for v in sigma.iter() {
                write!(f, "{:>15.6e}", v)?;
            }
            writeln!(
                f,
                "{:>15.6e}{:>15.6e}{:>15.6e}",
                self.sigma_m[k], self.sigma_d[k], self.internals[k][0]
            )?;
        }
        write!(f, "{}", thin_line)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{PathResults, StrainPath};
    use crate::base::{StateVector, SubstepControl, Vector6, DEFAULT_TEST_DIR};
    use crate::material::{LinearElastic, LocalSolver, VonMises};
    use crate::substep::Notice;
    use approx::assert_relative_eq;

    #[test]
    fn push_strain_works() {
        let mut path = StrainPath::new();
        path.push_strain(Vector6::zeros(), 0.0)
            .unwrap()
            .push_strain(Vector6::new(0.03, 0.0, 0.0, 0.0, 0.0, 0.0), 1.0)
            .unwrap();
        assert_eq!(path.strains.len(), 2);
        assert_eq!(path.deltas_strain.len(), 1);
        assert_eq!(path.deltas_strain[0][0], 0.03);
        assert_relative_eq!(path.eps_v[1], 0.03, epsilon = 1e-15);
        assert_relative_eq!(path.eps_d[1], 0.02, epsilon = 1e-15);
        assert_eq!(
            path.push_strain(Vector6::zeros(), 1.0).err(),
            Some("the time must increase along the path")
        );
    }

    #[test]
    fn new_uniaxial_strain_works() {
        let path = StrainPath::new_uniaxial_strain(4, 0.01).unwrap();
        assert_eq!(path.strains.len(), 5);
        assert_eq!(path.times, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(path.strains[4][0], 0.01, epsilon = 1e-15);
        for deps in &path.deltas_strain {
            assert_relative_eq!(deps[0], 0.0025, epsilon = 1e-15);
        }
    }

    #[test]
    fn follow_captures_errors() {
        let control = SubstepControl::new();
        let mut solver = LinearElastic::new(1000.0, 0.25).unwrap();
        let path = StrainPath::new();
        assert_eq!(
            path.follow::<_, 6, 0>(&control, &mut solver, &Vector6::zeros()).err(),
            Some("the path must have at least two strain points")
        );
        let mut solver = VonMises::new(1000.0, 0.25, 2.0, 300.0).unwrap();
        let path = StrainPath::new_uniaxial_strain(1, 0.01).unwrap();
        let stress = Vector6::new(5.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(
            path.follow(&control, &mut solver, &stress).err(),
            Some("stress is outside the yield surface")
        );
    }

    #[test]
    fn follow_linear_elastic_works() {
        let control = SubstepControl::new();
        let mut solver = LinearElastic::new(1000.0, 0.25).unwrap();
        let dd = LocalSolver::<6, 0>::elastic_tangent(&solver);
        let path = StrainPath::new_uniaxial_strain(3, 0.003).unwrap();
        let stress_ini = Vector6::new(-1.0, -1.0, -1.0, 0.0, 0.0, 0.0);
        let results = path.follow::<_, 6, 0>(&control, &mut solver, &stress_ini).unwrap();
        assert_eq!(results.stresses.len(), 4);
        assert_eq!(results.tangents.len(), 3);
        for (k, sigma) in results.stresses.iter().enumerate() {
            assert_relative_eq!(sigma, &(stress_ini + dd * path.strains[k]), epsilon = 1e-13);
        }
        for tangent in &results.tangents {
            assert_relative_eq!(tangent, &dd, epsilon = 1e-12);
        }
        for stats in &results.stats {
            assert_eq!(stats.n_cycles, 1);
            assert_eq!(stats.n_elastic, 1);
        }
    }

    #[test]
    fn follow_records_notices() {
        let mut control = SubstepControl::new();
        control.tolerance = 1e-12;
        control.min_step_size = 1.0;
        let mut solver = VonMises::new(1000.0, 0.25, 2.0, 300.0).unwrap();
        let mut path = StrainPath::new_uniaxial_strain(1, 0.004).unwrap();
        path.push_strain(Vector6::new(0.004, 0.0, 0.0, 0.01, 0.0, 0.0), 2.0)
            .unwrap();
        let results: PathResults<1> = path.follow(&control, &mut solver, &Vector6::zeros()).unwrap();
        assert_eq!(results.notices.len(), 2);
        assert_eq!(results.notices[0].len(), 0);
        assert_eq!(results.notices[1], &[Notice::ToleranceIgnoredAtMinimumStep]);
        assert_eq!(results.stats[1].n_forced, 1);
    }

    #[test]
    fn write_json_and_display_work() {
        let control = SubstepControl::new();
        let mut solver = VonMises::new(1000.0, 0.25, 2.0, 300.0).unwrap();
        let path = StrainPath::new_uniaxial_strain(2, 0.004).unwrap();
        let results: PathResults<1> = path.follow(&control, &mut solver, &Vector6::zeros()).unwrap();
        let full_path = format!("{}/strain_path_results.json", DEFAULT_TEST_DIR);
        results.write_json(&full_path).unwrap();
        let contents = std::fs::read_to_string(&full_path).unwrap();
        assert!(contents.contains("\"stresses\""));
        assert!(contents.contains("\"n_cycles\""));
        assert!(contents.contains("\"notices\""));
        let text = format!("{}", results);
        assert_eq!(text.lines().count(), 3 + 3 + 1);
        assert!(text.contains("σd"));
        assert_eq!(results.internals[0], StateVector::<1>::new(2.0));
    }
}
