use std::num::NonZeroUsize;

use log::{debug, info};

use crate::devices::Devices;
use crate::resources::Resource;
use crate::snapshot::{ResourceInfo, Snapshot};
use crate::{new_scheduler, Algorithm, Kernel, Pid, Program, Scheduler, SimError};

/// A whole simulation run: the kernel, the chosen discipline and the
/// process list.
///
/// ```ignore
/// let mut simulation = Simulation::new(Box::new(HostDevices::default()), DEFAULT_CAPACITY);
/// simulation.init(programs, Algorithm::RoundRobin, NonZeroUsize::new(2).unwrap());
/// while simulation.step()? {
///     println!("{}", simulation.snapshot()?);
/// }
/// ```
pub struct Simulation {
    kernel: Kernel,
    scheduler: Option<Box<dyn Scheduler>>,
    programs: Vec<Program>,
    /// Whether the image of each program was created, indexed like `programs`.
    admitted: Vec<bool>,
    tick: usize,
    completed: usize,
}

impl Simulation {
    pub fn new(devices: Box<dyn Devices>, capacity: usize) -> Simulation {
        Simulation {
            kernel: Kernel::new(capacity, devices),
            scheduler: None,
            programs: Vec::new(),
            admitted: Vec::new(),
            tick: 0,
            completed: 0,
        }
    }

    /// Drops the process list and every piece of run state.
    pub fn reset(&mut self) {
        self.kernel.reset();
        self.scheduler = None;
        self.programs.clear();
        self.admitted.clear();
        self.tick = 0;
        self.completed = 0;
    }

    /// Starts a new run. Images are only created when their arrival tick
    /// comes.
    pub fn init(&mut self, programs: Vec<Program>, algorithm: Algorithm, quantum: NonZeroUsize) {
        self.reset();
        info!(
            "starting {algorithm} with {} programs (quantum {quantum})",
            programs.len()
        );
        self.admitted = vec![false; programs.len()];
        self.programs = programs;
        self.scheduler = Some(new_scheduler(algorithm, quantum));
    }

    pub fn is_initialized(&self) -> bool {
        self.scheduler.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.is_initialized() && self.completed == self.programs.len()
    }

    /// Performs one tick.
    ///
    /// Returns whether processes remain. A finished simulation is left
    /// untouched.
    pub fn step(&mut self) -> Result<bool, SimError> {
        let scheduler = self.scheduler.as_mut().ok_or(SimError::NotInitialized)?;
        if self.completed == self.programs.len() {
            return Ok(false);
        }

        let mut arrivals = Vec::new();
        for (index, program) in self.programs.iter().enumerate() {
            if !self.admitted[index] && program.arrival <= self.tick {
                arrivals.push(self.kernel.create_process(program)?);
                self.admitted[index] = true;
            }
        }

        debug!("tick {}", self.tick);
        if let Some(pid) = scheduler.tick(&mut self.kernel, &arrivals)? {
            self.completed += 1;
            debug!("process {pid} completed ({}/{})", self.completed, self.programs.len());
        }
        self.tick += 1;

        let running = self.completed < self.programs.len();
        if !running {
            info!("all processes completed after {} ticks", self.tick);
        }
        Ok(running)
    }

    /// Steps until every process terminated. Returns the number of ticks.
    pub fn run(&mut self) -> Result<usize, SimError> {
        while self.step()? {}
        Ok(self.tick)
    }

    pub fn snapshot(&self) -> Result<Snapshot, SimError> {
        let scheduler = self.scheduler.as_ref().ok_or(SimError::NotInitialized)?;
        let processes = self
            .kernel
            .pids()
            .map(|pid| self.kernel.process_info(pid))
            .collect::<Result<Vec<_>, _>>()?;
        let resources = Resource::ALL
            .into_iter()
            .map(|resource| ResourceInfo {
                resource,
                free: self.kernel.resources().is_free(resource),
                blocked: self.kernel.resources().blocked(resource),
            })
            .collect();

        Ok(Snapshot {
            tick: self.tick,
            algorithm: scheduler.algorithm(),
            total: self.programs.len(),
            completed: self.completed,
            running: scheduler.running(),
            processes,
            ready: scheduler.ready(),
            levels: scheduler.levels(),
            resources,
        })
    }

    /// Renders the non-empty words of the memory arena.
    pub fn memory_dump(&self) -> String {
        self.kernel.memory().dump()
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn running(&self) -> Option<Pid> {
        self.scheduler.as_ref().and_then(|scheduler| scheduler.running())
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }
}
