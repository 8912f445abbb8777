use structopt::StructOpt;
use substep::prelude::*;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "substep_uniaxial",
    about = "Follows a uniaxial-strain path with the von Mises model and adaptive substepping"
)]
struct Options {
    /// JSON file with the substepping control options (defaults are used otherwise)
    #[structopt(long)]
    control: Option<String>,

    /// Young's modulus
    #[structopt(long, default_value = "1500.0")]
    young: f64,

    /// Poisson's coefficient
    #[structopt(long, default_value = "0.25")]
    poisson: f64,

    /// Initial size of the yield surface
    #[structopt(long, default_value = "9.0")]
    z0: f64,

    /// Hardening coefficient
    #[structopt(long, default_value = "800.0")]
    hh: f64,

    /// Final strain component ε₀₀
    #[structopt(long, default_value = "0.02")]
    eps_max: f64,

    /// Number of strain increments
    #[structopt(long, default_value = "5")]
    n_increments: usize,

    /// Output directory (default is DEFAULT_OUT_DIR)
    #[structopt(long)]
    out_dir: Option<String>,

    /// Prints the sub-step table
    #[structopt(short, long)]
    verbose: bool,
}

fn main() -> Result<(), StrError> {
    // parse options
    let options = Options::from_args();

    // control
    let mut control = match &options.control {
        Some(full_path) => SubstepControl::read_json(full_path)?,
        None => SubstepControl::new(),
    };
    if options.verbose {
        control.verbose = true;
    }
    if let Some(msg) = control.validate() {
        println!("ERROR: {}", msg);
        return Err("control.validate() failed");
    }

    // model and path
    let mut model = VonMises::new(options.young, options.poisson, options.z0, options.hh)?;
    let path = StrainPath::new_uniaxial_strain(options.n_increments, options.eps_max)?;

    // run
    let results = path.follow(&control, &mut model, &Vector6::zeros())?;
    println!("{}", results);

    // summary
    let n_cycles: usize = results.stats.iter().map(|s| s.n_cycles).sum();
    let n_rejected: usize = results.stats.iter().map(|s| s.n_rejected).sum();
    println!("number of sub-step cycles = {}", n_cycles);
    println!("number of rejected cycles = {}", n_rejected);

    // write results
    let out_dir = options.out_dir.as_deref().unwrap_or(DEFAULT_OUT_DIR);
    let full_path = format!("{}/substep_uniaxial.json", out_dir);
    results.write_json(&full_path)?;
    let thin_line = format!("{:─^1$}", "", full_path.len());
    println!("\n{}", thin_line);
    println!("results written to:");
    println!("{}", full_path);
    println!("{}\n", thin_line);
    Ok(())
}
