/// Defines the directory where the result files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/substep/results";

/// Defines the number of stress (and strain) components
pub const N_STRESS: usize = 6;

/// Defines the tolerance on the remaining progress to flag the end of the increment
pub const PROGRESS_TOL: f64 = 2e-16;

/// Defines the error ratio below which a sub-step is considered exact
pub const ERROR_RATIO_ZERO: f64 = 1e-10;

/// Defines the safety coefficient multiplying the optimal scale factor
pub const SAFETY_FACTOR: f64 = 0.9;

/// Defines the smallest scale factor applied after the error estimation
pub const MIN_SCALE_FACTOR: f64 = 0.1;

/// Defines the largest scale factor applied after the error estimation
pub const MAX_SCALE_FACTOR: f64 = 10.0;

/// Defines the error ratio below which a rejected sub-step is split instead of repeated
pub const SPLIT_ERROR_RATIO: f64 = 2.0;

/// Defines the smallest allowed min_step_size (SubstepControl)
pub const CONTROL_MIN_STEP_SIZE: f64 = 1e-14;

/// Defines the smallest allowed tolerance (SubstepControl)
pub const CONTROL_MIN_TOL: f64 = 1e-15;

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/substep/test";
