use std::fmt::{self, Display};
use std::str::FromStr;

use crate::{Kernel, SimError};

/// The PID of a process.
///
/// PIDs are handed out in creation order, starting from 0, and double as
/// the index of the process image in the kernel's image table.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Pid(usize);

impl Pid {
    pub fn new(pid: usize) -> Pid {
        Pid(pid)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl PartialEq<usize> for Pid {
    fn eq(&self, other: &usize) -> bool {
        self.0 == *other
    }
}

impl Display for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The state of a process.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// The image has been built but the process was not queued yet.
    New,

    /// The process is ready to be scheduled.
    Ready,

    /// The process is currently scheduled.
    Running,

    /// The process is blocked on a busy resource.
    Waiting,

    /// The process reached its end of instructions marker.
    Terminated,
}

impl Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessState::New => write!(f, "NEW"),
            ProcessState::Ready => write!(f, "READY"),
            ProcessState::Running => write!(f, "RUNNING"),
            ProcessState::Waiting => write!(f, "WAITING"),
            ProcessState::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// A process descriptor, as supplied by whoever configures the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    /// The name of the instruction source, opened through the devices.
    pub name: String,

    /// The static priority. Lower values are scheduled first.
    pub priority: i32,

    /// The tick at which the process image is created and queued.
    pub arrival: usize,
}

impl Program {
    pub fn new(name: impl Into<String>, priority: i32, arrival: usize) -> Program {
        Program {
            name: name.into(),
            priority,
            arrival,
        }
    }
}

/// The scheduling discipline driving a simulation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// First come first served, ordered by static priority.
    Fcfs,

    /// Round robin with a fixed quantum.
    RoundRobin,

    /// Four level feedback queue, level `L` has a quantum of `2^L` ticks.
    Mlfq,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Fcfs => write!(f, "FCFS"),
            Algorithm::RoundRobin => write!(f, "RR"),
            Algorithm::Mlfq => write!(f, "MLFQ"),
        }
    }
}

/// Returned when an algorithm name is not recognized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseAlgorithmError(pub String);

impl Display for ParseAlgorithmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown scheduling algorithm `{}` (expected fcfs, rr or mlfq)",
            self.0
        )
    }
}

impl std::error::Error for ParseAlgorithmError {}

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fcfs" => Ok(Algorithm::Fcfs),
            "rr" | "round-robin" | "round_robin" => Ok(Algorithm::RoundRobin),
            "mlfq" => Ok(Algorithm::Mlfq),
            _ => Err(ParseAlgorithmError(s.to_string())),
        }
    }
}

/// The trait that any scheduling discipline has to implement.
///
/// A scheduler owns its ready queue(s). The [`Kernel`] owns memory, the
/// resource table and the devices, and is lent to the scheduler for the
/// duration of one tick.
pub trait Scheduler: Send {
    /// Returns the discipline implemented by this scheduler.
    fn algorithm(&self) -> Algorithm;

    /// Performs one tick.
    ///
    /// * `arrivals` - processes created this tick, in creation order. The
    ///                scheduler is responsible for queueing them.
    ///
    /// Returns the PID of the process that terminated during this tick, if any.
    fn tick(&mut self, kernel: &mut Kernel, arrivals: &[Pid]) -> Result<Option<Pid>, SimError>;

    /// Returns the process currently holding the CPU.
    fn running(&self) -> Option<Pid>;

    /// Returns the ready processes in dispatch order.
    fn ready(&self) -> Vec<Pid>;

    /// Returns the contents of every feedback level, highest priority first.
    ///
    /// Disciplines without levels return an empty list.
    fn levels(&self) -> Vec<Vec<Pid>> {
        Vec::new()
    }
}
