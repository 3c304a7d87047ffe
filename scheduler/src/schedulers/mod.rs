//! The scheduling disciplines, one file each.
//!
//! FCFS and round robin share [`ReadyQueue`]: a single priority queue whose
//! head is the running process. MLFQ keeps its own level queues.

use log::debug;

use crate::queue::PriorityQueue;
use crate::resources::Resource;
use crate::{Kernel, Pid, ProcessState, SimError};

mod fcfs;
pub use fcfs::Fcfs;

mod round_robin;
pub use round_robin::RoundRobin;

mod mlfq;
pub use mlfq::{level_quantum, Mlfq, LEVELS};

/// A flat ready queue keyed by each process' priority.
///
/// The running process stays at the head of the queue until it blocks,
/// finishes or is requeued.
#[derive(Debug, Default)]
struct ReadyQueue {
    queue: PriorityQueue<Pid>,
    running: Option<Pid>,
}

impl ReadyQueue {
    fn push(&mut self, kernel: &Kernel, pid: Pid) -> Result<(), SimError> {
        self.queue.push(pid, kernel.priority(pid)?);
        Ok(())
    }

    fn admit(&mut self, kernel: &Kernel, arrivals: &[Pid]) -> Result<(), SimError> {
        for &pid in arrivals {
            self.push(kernel, pid)?;
        }
        Ok(())
    }

    /// Makes the head of the queue the running process.
    ///
    /// Returns the head and whether it was just dispatched.
    fn dispatch(&mut self, kernel: &mut Kernel) -> Result<Option<(Pid, bool)>, SimError> {
        let Some(&head) = self.queue.peek() else {
            return Ok(None);
        };
        if self.running == Some(head) {
            return Ok(Some((head, false)));
        }

        if let Some(previous) = self.running.take() {
            if kernel.state(previous)? == ProcessState::Running {
                kernel.set_state(previous, ProcessState::Ready)?;
            }
        }
        kernel.set_state(head, ProcessState::Running)?;
        self.running = Some(head);
        debug!("dispatched process {head}");
        Ok(Some((head, true)))
    }

    /// Removes the running process from the queue.
    fn pop_running(&mut self) -> Option<Pid> {
        self.running = None;
        self.queue.pop()
    }

    /// Queues a preempted process behind the processes of its priority.
    fn requeue(&mut self, kernel: &mut Kernel, pid: Pid) -> Result<(), SimError> {
        kernel.set_state(pid, ProcessState::Ready)?;
        self.push(kernel, pid)?;
        debug!("process {pid} requeued");
        Ok(())
    }

    /// Wakes every process blocked on `resource` and queues it again.
    fn wake(&mut self, kernel: &mut Kernel, resource: Resource) -> Result<(), SimError> {
        for pid in kernel.wake(resource)? {
            self.push(kernel, pid)?;
        }
        Ok(())
    }

    fn waiting(&self) -> Vec<Pid> {
        self.queue
            .ordered()
            .into_iter()
            .copied()
            .filter(|&pid| Some(pid) != self.running)
            .collect()
    }
}
