use std::fmt::{self, Display};

use crate::resources::Resource;
use crate::{Algorithm, Pid, ProcessState};

/// The PCB of one process, decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub state: ProcessState,
    pub program_counter: usize,
    /// Static priority, or the current level under MLFQ.
    pub priority: i32,
    pub lower_bound: usize,
    pub upper_bound: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceInfo {
    pub resource: Resource,
    pub free: bool,
    /// Blocked processes, in wake up order.
    pub blocked: Vec<Pid>,
}

/// A consistent view of the simulation between two ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// The number of ticks performed so far.
    pub tick: usize,
    pub algorithm: Algorithm,
    /// The number of programs the simulation was initialized with, including
    /// the ones that did not arrive yet.
    pub total: usize,
    pub completed: usize,
    pub running: Option<Pid>,
    /// Created processes, in PID order.
    pub processes: Vec<ProcessInfo>,
    /// Ready processes in dispatch order, without the running one.
    pub ready: Vec<Pid>,
    /// MLFQ level queues, empty for the other disciplines.
    pub levels: Vec<Vec<Pid>>,
    pub resources: Vec<ResourceInfo>,
}

impl Snapshot {
    pub fn process(&self, pid: Pid) -> Option<&ProcessInfo> {
        self.processes.iter().find(|process| process.pid == pid)
    }

    pub fn resource(&self, resource: Resource) -> Option<&ResourceInfo> {
        self.resources.iter().find(|info| info.resource == resource)
    }
}

fn pids(pids: &[Pid]) -> String {
    let pids: Vec<String> = pids.iter().map(Pid::to_string).collect();
    format!("[{}]", pids.join(", "))
}

impl Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} | tick {} | {}/{} completed",
            self.algorithm, self.tick, self.completed, self.total
        )?;
        match self.running {
            Some(pid) => writeln!(f, "Running: {pid}")?,
            None => writeln!(f, "Running: -")?,
        }
        writeln!(f, "Ready: {}", pids(&self.ready))?;
        for (level, queue) in self.levels.iter().enumerate() {
            writeln!(f, "  Level {level}: {}", pids(queue))?;
        }

        writeln!(
            f,
            "{:>4} {:<10} {:>3} {:>9} {:>10}",
            "PID", "STATE", "PC", "PRIORITY", "BOUNDS"
        )?;
        for process in &self.processes {
            writeln!(
                f,
                "{:>4} {:<10} {:>3} {:>9} {:>10}",
                process.pid,
                process.state.to_string(),
                process.program_counter,
                process.priority,
                format!("{}-{}", process.lower_bound, process.upper_bound)
            )?;
        }

        for info in &self.resources {
            let status = if info.free { "free" } else { "busy" };
            writeln!(
                f,
                "{:<11} {status:<5} blocked: {}",
                info.resource.name(),
                pids(&info.blocked)
            )?;
        }
        Ok(())
    }
}
