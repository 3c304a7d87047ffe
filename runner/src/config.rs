//! Run configuration, read from the environment and the command line.

use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use log::LevelFilter;
use scheduler::{Algorithm, ParseAlgorithmError, Program, DEFAULT_CAPACITY};

const DEFAULT_QUANTUM: usize = 2;
const DEFAULT_PROGRAM_DIR: &str = "programs";

#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    Algorithm(ParseAlgorithmError),
    InvalidNumber {
        variable: &'static str,
        value: String,
    },
    ZeroQuantum,
    InvalidLogLevel(String),
    InvalidProgram {
        argument: String,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Algorithm(err) => write!(f, "ALGORITHM: {err}"),
            Self::InvalidNumber { variable, value } => {
                write!(f, "{variable}: `{value}` is not a valid number")
            }
            Self::ZeroQuantum => write!(f, "QUANTUM: must be at least 1"),
            Self::InvalidLogLevel(value) => write!(f, "LOG_LEVEL: unknown level `{value}`"),
            Self::InvalidProgram { argument, reason } => {
                write!(f, "invalid program `{argument}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Algorithm(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub algorithm: Algorithm,
    pub quantum: NonZeroUsize,
    pub arena_words: usize,
    pub max_ticks: Option<usize>,
    pub program_dir: PathBuf,
    pub log_level: LevelFilter,
}

#[cfg(feature = "fcfs")]
fn default_algorithm() -> Algorithm {
    Algorithm::Fcfs
}

#[cfg(all(feature = "mlfq", not(feature = "fcfs")))]
fn default_algorithm() -> Algorithm {
    Algorithm::Mlfq
}

#[cfg(not(any(feature = "fcfs", feature = "mlfq")))]
fn default_algorithm() -> Algorithm {
    Algorithm::RoundRobin
}

fn number(variable: &'static str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidNumber {
            variable,
            value: value.to_string(),
        })
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|variable| env::var(variable).ok())
    }

    /// Builds the configuration from a variable lookup, falling back to the
    /// defaults for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let algorithm = match lookup("ALGORITHM") {
            Some(value) => value.parse::<Algorithm>().map_err(ConfigError::Algorithm)?,
            None => default_algorithm(),
        };
        let quantum = match lookup("QUANTUM") {
            Some(value) => NonZeroUsize::new(number("QUANTUM", &value)?)
                .ok_or(ConfigError::ZeroQuantum)?,
            None => NonZeroUsize::new(DEFAULT_QUANTUM).ok_or(ConfigError::ZeroQuantum)?,
        };
        let arena_words = match lookup("ARENA_WORDS") {
            Some(value) => number("ARENA_WORDS", &value)?,
            None => DEFAULT_CAPACITY,
        };
        let max_ticks = lookup("MAX_TICKS")
            .map(|value| number("MAX_TICKS", &value))
            .transpose()?;
        let program_dir = lookup("PROGRAM_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM_DIR));
        let log_level = match lookup("LOG_LEVEL") {
            Some(value) => value
                .trim()
                .parse::<LevelFilter>()
                .map_err(|_| ConfigError::InvalidLogLevel(value))?,
            None => LevelFilter::Warn,
        };

        Ok(Config {
            algorithm,
            quantum,
            arena_words,
            max_ticks,
            program_dir,
            log_level,
        })
    }
}

/// Parses a `name[:priority[:arrival]]` program argument.
pub fn parse_program(argument: &str) -> Result<Program, ConfigError> {
    let invalid = |reason: &'static str| ConfigError::InvalidProgram {
        argument: argument.to_string(),
        reason,
    };

    let mut parts = argument.split(':');
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return Err(invalid("missing program name"));
    }
    let priority = match parts.next() {
        Some(priority) => priority
            .parse()
            .map_err(|_| invalid("priority is not an integer"))?,
        None => 0,
    };
    let arrival = match parts.next() {
        Some(arrival) => arrival
            .parse()
            .map_err(|_| invalid("arrival is not a tick number"))?,
        None => 0,
    };
    if parts.next().is_some() {
        return Err(invalid("expected name:priority:arrival"));
    }
    Ok(Program::new(name, priority, arrival))
}

/// The programs shipped in `programs/`, arriving two ticks apart.
pub fn demo_programs() -> Vec<Program> {
    vec![
        Program::new("Program_1.txt", 0, 0),
        Program::new("Program_2.txt", 0, 2),
        Program::new("Program_3.txt", 0, 4),
    ]
}

/// Parses the program arguments, or returns the demo programs when there
/// are none.
pub fn programs<I>(arguments: I) -> Result<Vec<Program>, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let programs = arguments
        .into_iter()
        .map(|argument| parse_program(&argument))
        .collect::<Result<Vec<_>, _>>()?;
    if programs.is_empty() {
        Ok(demo_programs())
    } else {
        Ok(programs)
    }
}
