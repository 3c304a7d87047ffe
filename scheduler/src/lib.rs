//! A CPU scheduler simulator.
//!
//! Small text programs are loaded into a fixed size word memory as process
//! images and run one instruction per tick under FCFS, round robin or a four
//! level feedback queue. Processes can block on three binary resources
//! through `semWait` / `semSignal`.
//!
//! [`Simulation`] is the entry point: `init`, then `step` or `run`, with a
//! [`Snapshot`] available between ticks.

use std::num::NonZeroUsize;

mod devices;
mod error;
mod image;
mod interpreter;
mod kernel;
mod memory;
mod queue;
mod resources;
mod scheduler;
mod schedulers;
mod simulation;
mod snapshot;

pub use crate::devices::{Devices, HostDevices, MemoryDevices, Output};
pub use crate::error::SimError;
pub use crate::image::{ImageView, ImageViewMut, INSTRUCTIONS_OFFSET, PCB_WORDS, VARIABLE_SLOTS};
pub use crate::interpreter::{
    can_execute, execute_one, gate, waits_on, Execution, Gate, Status, PRINT_RANGE_LIMIT,
};
pub use crate::kernel::Kernel;
pub use crate::memory::{Memory, PcbField, Word, DEFAULT_CAPACITY};
pub use crate::queue::PriorityQueue;
pub use crate::resources::{Resource, ResourceTable};
pub use crate::scheduler::{Algorithm, ParseAlgorithmError, Pid, ProcessState, Program, Scheduler};
pub use crate::schedulers::{level_quantum, Fcfs, Mlfq, RoundRobin, LEVELS};
pub use crate::simulation::Simulation;
pub use crate::snapshot::{ProcessInfo, ResourceInfo, Snapshot};

/// Returns a first come first served scheduler.
pub fn fcfs() -> impl Scheduler {
    Fcfs::new()
}

/// Returns a round robin scheduler.
///
/// * `quantum` - the number of instructions a process runs before it is
///               requeued behind the processes of its priority
pub fn round_robin(quantum: NonZeroUsize) -> impl Scheduler {
    RoundRobin::new(quantum)
}

/// Returns a four level feedback queue scheduler. Level `L` has a quantum of
/// `2^L` ticks.
pub fn mlfq() -> impl Scheduler {
    Mlfq::new()
}

/// Returns the scheduler implementing `algorithm`. `quantum` is only used by
/// round robin.
pub fn new_scheduler(algorithm: Algorithm, quantum: NonZeroUsize) -> Box<dyn Scheduler> {
    match algorithm {
        Algorithm::Fcfs => Box::new(fcfs()),
        Algorithm::RoundRobin => Box::new(round_robin(quantum)),
        Algorithm::Mlfq => Box::new(mlfq()),
    }
}
