use std::{env, io, path::PathBuf};

use log::info;

use regressor::{Experiment, config::ExperimentConfig, report};

const USAGE: &str = "usage: regressor <config.json> [output_dir]";

fn main() -> io::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let config_path = args
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, USAGE))?;

    let config = ExperimentConfig::load(&config_path)?;
    info!("loaded experiment from {config_path}");

    let experiment = Experiment::new(config);
    let output_dir = experiment.output_dir(args.next().map(PathBuf::from));

    let outcome = experiment.run()?;
    report::write(&output_dir, &outcome)?;

    info!("reports written to {}", output_dir.display());
    Ok(())
}
