use std::env;
use std::error::Error;
use std::process::ExitCode;

use processor::{format_logs, Processor};
use scheduler::{HostDevices, Simulation};

mod config;
mod logger;

use config::Config;

fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    logger::init(config.log_level)?;
    let programs = config::programs(env::args().skip(1))?;

    let devices = HostDevices::new(config.program_dir.clone());
    let mut simulation = Simulation::new(Box::new(devices), config.arena_words);
    simulation.init(programs, config.algorithm, config.quantum);

    let logs = Processor::run(simulation, config.max_ticks)?;
    println!("{}", format_logs(&logs));
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
