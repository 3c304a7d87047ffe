use std::num::NonZeroUsize;

use processor::{Log, Processor};
use scheduler::{Algorithm, MemoryDevices, Pid, Program, Simulation};

mod errors;
mod mlfq;
mod simple;

/// Upper bound on the ticks of any scenario.
const MAX_TICKS: usize = 1000;

/// A scenario program: its source text, priority and arrival tick.
type Source<'a> = (&'a str, i32, usize);

/// Builds a simulation over in-memory devices. Program `i` of `sources` is
/// stored as `<test>_<i>.txt` and gets PID `i` if arrivals are ordered.
fn simulation(
    test: &str,
    devices: MemoryDevices,
    sources: &[Source],
    algorithm: Algorithm,
    quantum: usize,
) -> Simulation {
    let mut devices = devices;
    let mut programs = Vec::new();
    for (index, (text, priority, arrival)) in sources.iter().enumerate() {
        let name = format!("{test}_{index}.txt");
        devices = devices.with_file(name.clone(), *text);
        programs.push(Program::new(name, *priority, *arrival));
    }

    let mut simulation = Simulation::new(Box::new(devices), 256);
    simulation.init(programs, algorithm, NonZeroUsize::new(quantum).unwrap());
    simulation
}

fn run(simulation: Simulation) -> Vec<Log> {
    let logs = Processor::run(simulation, Some(MAX_TICKS)).unwrap();
    assert!(
        logs.last().is_some_and(|log| !log.still_running),
        "simulation did not finish within {MAX_TICKS} ticks"
    );
    logs
}

/// Returns, for every tick, the PID of the process that executed an
/// instruction, found by comparing program counters between ticks.
fn trace(logs: &[Log]) -> Vec<Option<usize>> {
    let mut previous: Vec<usize> = Vec::new();
    let mut trace = Vec::new();
    for log in logs {
        let counters: Vec<usize> = log
            .snapshot
            .processes
            .iter()
            .map(|process| process.program_counter)
            .collect();
        let executed = counters
            .iter()
            .enumerate()
            .find(|&(pid, &pc)| pc > previous.get(pid).copied().unwrap_or(0))
            .map(|(pid, _)| pid);
        trace.push(executed);
        previous = counters;
    }
    trace
}

/// Returns the PIDs in the order they terminated.
fn completion_order(logs: &[Log]) -> Vec<usize> {
    let mut order = Vec::new();
    for log in logs {
        for process in &log.snapshot.processes {
            let pid = process.pid.get();
            if process.state == scheduler::ProcessState::Terminated && !order.contains(&pid) {
                order.push(pid);
            }
        }
    }
    order
}

fn pids(pids: &[usize]) -> Vec<Pid> {
    pids.iter().copied().map(Pid::new).collect()
}
