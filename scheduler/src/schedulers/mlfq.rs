use log::debug;

use crate::interpreter::{Gate, Status};
use crate::queue::PriorityQueue;
use crate::resources::Resource;
use crate::{Algorithm, Kernel, Pid, ProcessState, Scheduler, SimError};

/// Number of feedback levels.
pub const LEVELS: usize = 4;

/// The quantum of `level`, in ticks.
pub fn level_quantum(level: usize) -> usize {
    1 << level
}

/// Multi level feedback queue.
///
/// Arrivals enter level 0. A process that uses up the quantum of its level
/// moves one level down, stopping at the last one. A process on a lower
/// level is preempted as soon as a higher level has work. The PCB priority
/// of each process mirrors its level.
#[derive(Debug)]
pub struct Mlfq {
    levels: [PriorityQueue<Pid>; LEVELS],
    running: Option<Pid>,
    /// Current level of each process, indexed by PID.
    level: Vec<usize>,
    /// Ticks left in the current quantum, indexed by PID.
    remaining: Vec<usize>,
}

impl Default for Mlfq {
    fn default() -> Self {
        Mlfq::new()
    }
}

impl Mlfq {
    pub fn new() -> Self {
        Mlfq {
            levels: std::array::from_fn(|_| PriorityQueue::new()),
            running: None,
            level: Vec::new(),
            remaining: Vec::new(),
        }
    }

    /// Returns the level `pid` currently belongs to.
    pub fn level_of(&self, pid: Pid) -> Option<usize> {
        self.level.get(pid.get()).copied()
    }

    /// Returns the ticks `pid` has left before being demoted.
    pub fn remaining_of(&self, pid: Pid) -> Option<usize> {
        self.remaining.get(pid.get()).copied()
    }

    // Within a level, entries are keyed 0 so they come out in FIFO order.
    fn enqueue(&mut self, pid: Pid) {
        let level = self.level[pid.get()];
        self.levels[level].push(pid, 0);
    }

    fn admit(&mut self, kernel: &mut Kernel, pid: Pid) -> Result<(), SimError> {
        let index = pid.get();
        if self.level.len() <= index {
            self.level.resize(index + 1, 0);
            self.remaining.resize(index + 1, 0);
        }
        self.level[index] = 0;
        self.remaining[index] = level_quantum(0);
        kernel.set_priority(pid, 0)?;
        self.enqueue(pid);
        Ok(())
    }

    fn wake(&mut self, kernel: &mut Kernel, resource: Resource) -> Result<(), SimError> {
        for pid in kernel.wake(resource)? {
            self.enqueue(pid);
        }
        Ok(())
    }

    fn highest_non_empty(&self) -> Option<usize> {
        self.levels.iter().position(|queue| !queue.is_empty())
    }
}

impl Scheduler for Mlfq {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Mlfq
    }

    fn tick(&mut self, kernel: &mut Kernel, arrivals: &[Pid]) -> Result<Option<Pid>, SimError> {
        for resource in Resource::ALL {
            if kernel.resources().is_free(resource) && kernel.resources().has_blocked(resource) {
                self.wake(kernel, resource)?;
            }
        }

        for &pid in arrivals {
            self.admit(kernel, pid)?;
        }

        if let Some(pid) = self.running {
            let level = self.level[pid.get()];
            if self.highest_non_empty().is_some_and(|highest| highest < level) {
                debug!("process {pid} preempted at level {level}");
                kernel.set_state(pid, ProcessState::Ready)?;
                self.enqueue(pid);
                self.running = None;
            }
        }

        let pid = match self.running {
            Some(pid) => pid,
            None => {
                let Some(level) = self.highest_non_empty() else {
                    return Ok(None);
                };
                let Some(pid) = self.levels[level].pop() else {
                    return Ok(None);
                };
                if self.remaining[pid.get()] == 0 {
                    self.remaining[pid.get()] = level_quantum(level);
                }
                kernel.set_priority(pid, level as i32)?;
                kernel.set_state(pid, ProcessState::Running)?;
                self.running = Some(pid);
                debug!(
                    "dispatched process {pid} from level {level} ({} ticks left)",
                    self.remaining[pid.get()]
                );
                pid
            }
        };

        if let Gate::Blocked(resource) = kernel.gate(pid)? {
            self.running = None;
            kernel.block(pid, resource)?;
            return Ok(None);
        }

        let execution = kernel.execute(pid)?;
        let mut finished = None;
        let mut demoted = false;
        if execution.status == Status::Finished {
            self.running = None;
            kernel.terminate(pid)?;
            finished = Some(pid);
        } else {
            let index = pid.get();
            self.remaining[index] -= 1;
            if self.remaining[index] == 0 {
                let level = (self.level[index] + 1).min(LEVELS - 1);
                debug!("process {pid} demoted to level {level}");
                self.level[index] = level;
                self.remaining[index] = level_quantum(level);
                kernel.set_priority(pid, level as i32)?;
                kernel.set_state(pid, ProcessState::Ready)?;
                self.running = None;
                demoted = true;
            }
        }

        if let Some(resource) = execution.released {
            self.wake(kernel, resource)?;
        }
        if demoted {
            self.enqueue(pid);
        }
        Ok(finished)
    }

    fn running(&self) -> Option<Pid> {
        self.running
    }

    fn ready(&self) -> Vec<Pid> {
        self.levels().into_iter().flatten().collect()
    }

    fn levels(&self) -> Vec<Vec<Pid>> {
        self.levels
            .iter()
            .map(|queue| queue.ordered().into_iter().copied().collect())
            .collect()
    }
}
