use super::{MinimumStepPolicy, ScaleClampOrder, TangentScheme};
use super::{CONTROL_MIN_STEP_SIZE, CONTROL_MIN_TOL};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the options to control the substepping of a strain increment
///
/// All step sizes are fractions of the total strain increment; i.e., they are in `(0, 1]`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct SubstepControl {
    /// Initial sub-step size; 0 < h₀ ≤ 1
    pub initial_step_size: f64,

    /// Minimum allowed sub-step size min(h)
    pub min_step_size: f64,

    /// Maximum factor to increase the sub-step size after an accepted cycle
    ///
    /// **Note:** The pass-count substepper uses this value as its (fixed) scale-up factor.
    pub max_scale_up_factor: f64,

    /// Factor to decrease the sub-step size after a discarded sub-step; 0 < f < 1
    pub scale_down_factor: f64,

    /// Tolerance for the local error estimated by step-doubling
    pub tolerance: f64,

    /// Number of consecutive accepted sub-steps required before increasing the sub-step size
    pub n_passes_to_increase: usize,

    /// Policy to handle errors above the tolerance at the minimum sub-step size
    pub minimum_step_policy: MinimumStepPolicy,

    /// Order of the saturations applied to the scale factor
    pub clamp_order: ScaleClampOrder,

    /// Composition of the consistent tangent across sub-steps
    pub tangent_scheme: TangentScheme,

    /// Verbose mode: prints one line per sub-step cycle
    pub verbose: bool,
}

impl SubstepControl {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        SubstepControl {
            initial_step_size: 1.0,
            min_step_size: 1e-5,
            max_scale_up_factor: 10.0,
            scale_down_factor: 0.5,
            tolerance: 1e-4,
            n_passes_to_increase: 1,
            minimum_step_policy: MinimumStepPolicy::AcceptFullStep,
            clamp_order: ScaleClampOrder::MinimumStepLast,
            tangent_scheme: TangentScheme::Implicit,
            verbose: false,
        }
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if !(self.initial_step_size > 0.0 && self.initial_step_size <= 1.0) {
            return Some(format!(
                "initial_step_size = {:?} is incorrect; it must be 0 < h₀ ≤ 1",
                self.initial_step_size
            ));
        }
        if !(self.min_step_size >= CONTROL_MIN_STEP_SIZE) {
            return Some(format!(
                "min_step_size = {:?} is incorrect; it must be ≥ {:e}",
                self.min_step_size, CONTROL_MIN_STEP_SIZE
            ));
        }
        if self.min_step_size > self.initial_step_size {
            return Some(format!(
                "min_step_size = {:?} is incorrect; it must be ≤ initial_step_size = {:?}",
                self.min_step_size, self.initial_step_size
            ));
        }
        if !(self.max_scale_up_factor > 0.0) {
            return Some(format!(
                "max_scale_up_factor = {:?} is incorrect; it must be > 0",
                self.max_scale_up_factor
            ));
        }
        if !(self.scale_down_factor > 0.0 && self.scale_down_factor < 1.0) {
            return Some(format!(
                "scale_down_factor = {:?} is incorrect; it must be 0 < f < 1",
                self.scale_down_factor
            ));
        }
        if !(self.tolerance >= CONTROL_MIN_TOL) {
            return Some(format!(
                "tolerance = {:?} is incorrect; it must be ≥ {:e}",
                self.tolerance, CONTROL_MIN_TOL
            ));
        }
        None // all good
    }

    /// Reads a JSON file containing the control options
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(file);
        let control = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(control)
    }

    /// Writes a JSON file with the control options
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
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }

    /// Prints the header of the table with sub-step data
    #[inline]
    pub fn print_header(&self) {
        if self.verbose {
            println!("Legend:");
            println!("✅ : accepted");
            println!("🌱 : accepted (elastic)");
            println!("✂️  : split");
            println!("🔁 : repeated");
            println!("⚠️  : accepted without error control");
            println!("😱 : failed\n");
            println!(
                "{:>6} {:>13} {:>13} {:>10}  ",
                "cycle", "progress", "h", "error/tol"
            );
        }
    }
}

impl fmt::Display for SubstepControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Substepping control\n")?;
        write!(f, "===================\n")?;
        write!(f, "initial_step_size = {:?}\n", self.initial_step_size)?;
        write!(f, "min_step_size = {:?}\n", self.min_step_size)?;
        write!(f, "max_scale_up_factor = {:?}\n", self.max_scale_up_factor)?;
        write!(f, "scale_down_factor = {:?}\n", self.scale_down_factor)?;
        write!(f, "tolerance = {:?}\n", self.tolerance)?;
        write!(f, "n_passes_to_increase = {:?}\n", self.n_passes_to_increase)?;
        write!(f, "minimum_step_policy = {:?}\n", self.minimum_step_policy)?;
        write!(f, "clamp_order = {:?}\n", self.clamp_order)?;
        write!(f, "tangent_scheme = {:?}\n", self.tangent_scheme)?;
        write!(f, "verbose = {:?}", self.verbose)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
