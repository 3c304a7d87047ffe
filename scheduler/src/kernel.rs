use log::{debug, info};

use crate::devices::Devices;
use crate::image::{self, ImageView, ImageViewMut};
use crate::interpreter::{self, Execution, Gate};
use crate::memory::Memory;
use crate::resources::{Resource, ResourceTable};
use crate::snapshot::ProcessInfo;
use crate::{Pid, ProcessState, Program, SimError};

/// Owns everything the schedulers share: the memory arena, the resource
/// table, the devices and the table of process images.
///
/// Schedulers never touch memory directly, they go through the kernel with a
/// PID.
pub struct Kernel {
    memory: Memory,
    resources: ResourceTable,
    devices: Box<dyn Devices>,
    /// Base offset of each image, indexed by PID.
    images: Vec<usize>,
}

impl Kernel {
    pub fn new(capacity: usize, devices: Box<dyn Devices>) -> Kernel {
        Kernel {
            memory: Memory::new(capacity),
            resources: ResourceTable::new(),
            devices,
            images: Vec::new(),
        }
    }

    /// Wipes memory and resources, and restarts PIDs from 0.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.resources.reset();
        self.images.clear();
    }

    /// Builds the image of `program` right after the previous one and marks
    /// the new process as ready.
    pub fn create_process(&mut self, program: &Program) -> Result<Pid, SimError> {
        let base = image::next_base(&self.memory, self.images.last().copied())?;
        image::load_instructions(
            &mut self.memory,
            self.devices.as_mut(),
            &program.name,
            base,
        )?;

        let pid = Pid::new(self.images.len());
        image::init_pcb(&mut self.memory, base, pid, program.priority)?;
        self.images.push(base);
        self.set_state(pid, ProcessState::Ready)?;

        info!(
            "created process {pid} from `{}` at {base} (priority {})",
            program.name, program.priority
        );
        Ok(pid)
    }

    fn base(&self, pid: Pid) -> Result<usize, SimError> {
        self.images
            .get(pid.get())
            .copied()
            .ok_or(SimError::UnknownProcess(pid))
    }

    pub fn image(&self, pid: Pid) -> Result<ImageView<'_>, SimError> {
        Ok(ImageView::new(&self.memory, self.base(pid)?))
    }

    pub fn image_mut(&mut self, pid: Pid) -> Result<ImageViewMut<'_>, SimError> {
        let base = self.base(pid)?;
        Ok(ImageViewMut::new(&mut self.memory, base))
    }

    pub fn state(&self, pid: Pid) -> Result<ProcessState, SimError> {
        self.image(pid)?.state()
    }

    pub fn set_state(&mut self, pid: Pid, state: ProcessState) -> Result<(), SimError> {
        self.image_mut(pid)?.set_state(state)
    }

    pub fn priority(&self, pid: Pid) -> Result<i32, SimError> {
        self.image(pid)?.priority()
    }

    pub fn set_priority(&mut self, pid: Pid, priority: i32) -> Result<(), SimError> {
        self.image_mut(pid)?.set_priority(priority)
    }

    /// Executes the next instruction of `pid`.
    pub fn execute(&mut self, pid: Pid) -> Result<Execution, SimError> {
        let base = self.base(pid)?;
        interpreter::execute_one(
            &mut self.memory,
            &mut self.resources,
            self.devices.as_mut(),
            base,
        )
    }

    pub fn gate(&self, pid: Pid) -> Result<Gate, SimError> {
        interpreter::gate(&self.memory, &self.resources, self.base(pid)?)
    }

    /// Parks `pid` on the blocked queue of `resource`, keyed by its current
    /// priority.
    pub fn block(&mut self, pid: Pid, resource: Resource) -> Result<(), SimError> {
        let priority = self.priority(pid)?;
        self.resources.block(resource, pid, priority);
        self.set_state(pid, ProcessState::Waiting)?;
        debug!("process {pid} blocked on {resource}");
        Ok(())
    }

    /// Empties the blocked queue of `resource` and marks every drained
    /// process as ready. The caller requeues them.
    pub fn wake(&mut self, resource: Resource) -> Result<Vec<Pid>, SimError> {
        let woken = self.resources.drain(resource);
        for &pid in &woken {
            self.set_state(pid, ProcessState::Ready)?;
            debug!("process {pid} woken up by {resource}");
        }
        Ok(woken)
    }

    pub fn terminate(&mut self, pid: Pid) -> Result<(), SimError> {
        self.set_state(pid, ProcessState::Terminated)?;
        info!("process {pid} terminated");
        Ok(())
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Returns every created process, in creation order.
    pub fn pids(&self) -> impl Iterator<Item = Pid> {
        (0..self.images.len()).map(Pid::new)
    }

    pub fn process_info(&self, pid: Pid) -> Result<ProcessInfo, SimError> {
        let image = self.image(pid)?;
        let (lower_bound, upper_bound) = image.bounds()?;
        Ok(ProcessInfo {
            pid,
            state: image.state()?,
            program_counter: image.program_counter()?,
            priority: image.priority()?,
            lower_bound,
            upper_bound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::MemoryDevices;
    use pretty_assertions::assert_eq;

    fn kernel() -> Kernel {
        let devices = MemoryDevices::new()
            .with_file("a.txt", "semWait file\nsemSignal file")
            .with_file("b.txt", "print x");
        Kernel::new(64, Box::new(devices))
    }

    #[test]
    fn processes_are_packed_and_ready() {
        let mut kernel = kernel();
        let a = kernel.create_process(&Program::new("a.txt", 2, 0)).unwrap();
        let b = kernel.create_process(&Program::new("b.txt", 1, 0)).unwrap();

        assert_eq!(a, Pid::new(0));
        assert_eq!(b, Pid::new(1));
        assert_eq!(
            kernel.process_info(a).unwrap(),
            ProcessInfo {
                pid: a,
                state: ProcessState::Ready,
                program_counter: 0,
                priority: 2,
                lower_bound: 0,
                upper_bound: 10,
            }
        );
        assert_eq!(kernel.image(b).unwrap().bounds().unwrap(), (11, 20));
        assert_eq!(kernel.pids().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn block_and_wake() {
        let mut kernel = kernel();
        let a = kernel.create_process(&Program::new("a.txt", 0, 0)).unwrap();
        let b = kernel.create_process(&Program::new("a.txt", 0, 0)).unwrap();

        kernel.execute(a).unwrap();
        assert_eq!(kernel.gate(b).unwrap(), Gate::Blocked(Resource::File));
        kernel.block(b, Resource::File).unwrap();
        assert_eq!(kernel.state(b).unwrap(), ProcessState::Waiting);

        let execution = kernel.execute(a).unwrap();
        assert_eq!(execution.released, Some(Resource::File));
        assert_eq!(kernel.wake(Resource::File).unwrap(), vec![b]);
        assert_eq!(kernel.state(b).unwrap(), ProcessState::Ready);
        assert_eq!(kernel.image(b).unwrap().program_counter().unwrap(), 0);
        assert_eq!(kernel.gate(b).unwrap(), Gate::Open);
    }

    #[test]
    fn reset_restarts_pids() {
        let mut kernel = kernel();
        kernel.create_process(&Program::new("b.txt", 0, 0)).unwrap();
        kernel.reset();
        assert_eq!(kernel.pids().count(), 0);
        assert!(kernel.memory().read(0).unwrap().is_empty());
        let pid = kernel.create_process(&Program::new("b.txt", 0, 0)).unwrap();
        assert_eq!(pid, Pid::new(0));
    }

    #[test]
    fn unknown_process() {
        let kernel = kernel();
        assert!(matches!(
            kernel.state(Pid::new(3)),
            Err(SimError::UnknownProcess(pid)) if pid == Pid::new(3)
        ));
    }
}
