use std::num::NonZeroUsize;

use log::debug;

use crate::interpreter::{Gate, Status};
use crate::{Algorithm, Kernel, Pid, Scheduler, SimError};

use super::ReadyQueue;

/// Round robin over a priority ordered ready queue.
///
/// The running process is requeued behind the processes of its priority once
/// it executed `quantum` instructions in a row. The counter restarts on every
/// dispatch.
#[derive(Debug)]
pub struct RoundRobin {
    ready: ReadyQueue,
    quantum: NonZeroUsize,
    used: usize,
}

impl RoundRobin {
    pub fn new(quantum: NonZeroUsize) -> Self {
        RoundRobin {
            ready: ReadyQueue::default(),
            quantum,
            used: 0,
        }
    }
}

impl Scheduler for RoundRobin {
    fn algorithm(&self) -> Algorithm {
        Algorithm::RoundRobin
    }

    fn tick(&mut self, kernel: &mut Kernel, arrivals: &[Pid]) -> Result<Option<Pid>, SimError> {
        self.ready.admit(kernel, arrivals)?;
        let Some((pid, dispatched)) = self.ready.dispatch(kernel)? else {
            return Ok(None);
        };
        if dispatched {
            self.used = 0;
        }

        if let Gate::Blocked(resource) = kernel.gate(pid)? {
            self.ready.pop_running();
            self.used = 0;
            kernel.block(pid, resource)?;
            return Ok(None);
        }

        let execution = kernel.execute(pid)?;
        let mut finished = None;
        if execution.status == Status::Finished {
            self.ready.pop_running();
            self.used = 0;
            kernel.terminate(pid)?;
            finished = Some(pid);
        } else {
            self.used += 1;
        }

        // Pop before waking: a woken process may take the head of the queue.
        let expired = finished.is_none() && self.used >= self.quantum.get();
        if expired {
            debug!("process {pid} used up its quantum");
            self.ready.pop_running();
            self.used = 0;
        }
        if let Some(resource) = execution.released {
            self.ready.wake(kernel, resource)?;
        }
        if expired {
            self.ready.requeue(kernel, pid)?;
        }
        Ok(finished)
    }

    fn running(&self) -> Option<Pid> {
        self.ready.running
    }

    fn ready(&self) -> Vec<Pid> {
        self.ready.waiting()
    }
}
