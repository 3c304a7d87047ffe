use crate::interpreter::{Gate, Status};
use crate::{Algorithm, Kernel, Pid, Scheduler, SimError};

use super::ReadyQueue;

/// First come first served.
///
/// The head of the queue keeps the CPU until it finishes or blocks. A newly
/// admitted process with a lower priority value becomes the head and runs
/// from the next tick on.
#[derive(Debug, Default)]
pub struct Fcfs {
    ready: ReadyQueue,
}

impl Fcfs {
    pub fn new() -> Self {
        Fcfs::default()
    }
}

impl Scheduler for Fcfs {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Fcfs
    }

    fn tick(&mut self, kernel: &mut Kernel, arrivals: &[Pid]) -> Result<Option<Pid>, SimError> {
        self.ready.admit(kernel, arrivals)?;
        let Some((pid, _)) = self.ready.dispatch(kernel)? else {
            return Ok(None);
        };

        if let Gate::Blocked(resource) = kernel.gate(pid)? {
            self.ready.pop_running();
            kernel.block(pid, resource)?;
            return Ok(None);
        }

        let execution = kernel.execute(pid)?;
        let mut finished = None;
        if execution.status == Status::Finished {
            self.ready.pop_running();
            kernel.terminate(pid)?;
            finished = Some(pid);
        }
        if let Some(resource) = execution.released {
            self.ready.wake(kernel, resource)?;
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
