//! A driver for simulations from the [`scheduler`] crate.
//!
//! The [`Processor`] runs the tick loop on a worker thread. The simulation
//! lives behind a single mutex: a tick and a snapshot never interleave.

use std::fmt::{self, Display};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{info, warn};
use scheduler::{SimError, Simulation, Snapshot};

/// Running iteration log
#[derive(Clone, Debug, PartialEq)]
pub struct Log {
    /// The number of the tick this log was taken after, starting from 1.
    pub iteration: usize,

    /// Whether processes remained after the tick.
    pub still_running: bool,

    /// The state of the simulation after the tick.
    pub snapshot: Snapshot,
}

impl Display for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.snapshot)?;
        if !self.still_running {
            writeln!(f, "DONE")?;
        }
        Ok(())
    }
}

/// How the worker loop ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every process terminated.
    Done,

    /// [`Processor::stop`] was called.
    Stopped,

    /// The tick limit was reached first.
    TickLimit,
}

/// The processor simulator.
pub struct Processor {
    simulation: Arc<Mutex<Simulation>>,
    running: Arc<AtomicBool>,
    logs: Arc<Mutex<Vec<Log>>>,
    worker: Option<JoinHandle<Result<Outcome, SimError>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Processor {
    /// Runs an initialized simulation to completion and returns one log per
    /// tick.
    ///
    /// * `max_ticks` - stop after this many ticks, `None` runs until every
    ///                 process terminated
    ///
    /// ## Example
    ///
    /// ```rust
    /// use processor::{format_logs, Processor};
    /// use scheduler::{Algorithm, MemoryDevices, Program, Simulation};
    /// use std::num::NonZeroUsize;
    ///
    /// let devices = MemoryDevices::new().with_file("p.txt", "assign x 5\nprint x");
    /// let mut simulation = Simulation::new(Box::new(devices), 64);
    /// simulation.init(
    ///     vec![Program::new("p.txt", 0, 0)],
    ///     Algorithm::RoundRobin,
    ///     NonZeroUsize::new(2).unwrap(),
    /// );
    ///
    /// let logs = Processor::run(simulation, None).unwrap();
    /// assert_eq!(logs.len(), 2);
    /// println!("{}", format_logs(&logs));
    /// ```
    pub fn run(simulation: Simulation, max_ticks: Option<usize>) -> Result<Vec<Log>, SimError> {
        let mut processor = Processor::spawn(simulation, max_ticks);
        processor.join()?;
        Ok(processor.take_logs())
    }

    /// Starts stepping `simulation` on a worker thread.
    pub fn spawn(simulation: Simulation, max_ticks: Option<usize>) -> Processor {
        let simulation = Arc::new(Mutex::new(simulation));
        let running = Arc::new(AtomicBool::new(true));
        let logs = Arc::new(Mutex::new(Vec::new()));

        let worker = {
            let simulation = simulation.clone();
            let running = running.clone();
            let logs = logs.clone();
            thread::spawn(move || {
                let outcome = work(&simulation, &running, &logs, max_ticks);
                running.store(false, Ordering::Release);
                outcome
            })
        };

        Processor {
            simulation,
            running,
            logs,
            worker: Some(worker),
        }
    }

    /// Returns the state of the simulation between two ticks.
    pub fn snapshot(&self) -> Result<Snapshot, SimError> {
        lock(&self.simulation).snapshot()
    }

    /// Asks the worker to stop before its next tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Waits for the worker to finish.
    ///
    /// A panic on the worker is resumed on the calling thread. Joining twice
    /// returns [`Outcome::Stopped`].
    pub fn join(&mut self) -> Result<Outcome, SimError> {
        match self.worker.take() {
            Some(worker) => match worker.join() {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            },
            None => Ok(Outcome::Stopped),
        }
    }

    /// Removes and returns the logs recorded so far.
    pub fn take_logs(&self) -> Vec<Log> {
        std::mem::take(&mut *lock(&self.logs))
    }
}

impl Drop for Processor {
    fn drop(&mut self) {
        self.stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn work(
    simulation: &Mutex<Simulation>,
    running: &AtomicBool,
    logs: &Mutex<Vec<Log>>,
    max_ticks: Option<usize>,
) -> Result<Outcome, SimError> {
    let mut iteration = 0;
    loop {
        if !running.load(Ordering::Acquire) {
            warn!("simulation stopped after {iteration} ticks");
            return Ok(Outcome::Stopped);
        }
        if max_ticks.is_some_and(|limit| iteration >= limit) {
            warn!("simulation reached the limit of {iteration} ticks");
            return Ok(Outcome::TickLimit);
        }

        let log = {
            let mut simulation = lock(simulation);
            let still_running = simulation.step()?;
            iteration += 1;
            Log {
                iteration,
                still_running,
                snapshot: simulation.snapshot()?,
            }
        };
        let done = !log.still_running;
        lock(logs).push(log);

        if done {
            info!("simulation done after {iteration} ticks");
            return Ok(Outcome::Done);
        }
    }
}

/// Format the [`Processor`]'s logs to a [`String`].
///
/// * `logs` - the logs returned by the [`Processor`].
pub fn format_logs(logs: &[Log]) -> String {
    let mut s = String::new();
    for log in logs {
        // Writing to a String cannot fail.
        let _ = fmt::write(
            &mut s,
            format_args!("===== Iteration: {} =====\n{}\n", log.iteration, log),
        );
    }
    s
}
