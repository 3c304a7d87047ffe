use std::fmt::{self, Display};

use crate::queue::PriorityQueue;
use crate::Pid;

/// The binary resources processes can wait on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    File,
    UserInput,
    UserOutput,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::File, Resource::UserInput, Resource::UserOutput];

    /// Looks a resource up by the name used in instruction text.
    pub fn from_name(name: &str) -> Option<Resource> {
        match name {
            "file" => Some(Resource::File),
            "userInput" => Some(Resource::UserInput),
            "userOutput" => Some(Resource::UserOutput),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Resource::File => "file",
            Resource::UserInput => "userInput",
            Resource::UserOutput => "userOutput",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Availability flags plus one blocked queue per resource.
#[derive(Debug)]
pub struct ResourceTable {
    free: [bool; 3],
    blocked: [PriorityQueue<Pid>; 3],
}

impl ResourceTable {
    pub fn new() -> ResourceTable {
        ResourceTable {
            free: [true; 3],
            blocked: std::array::from_fn(|_| PriorityQueue::new()),
        }
    }

    pub fn reset(&mut self) {
        self.free = [true; 3];
        for queue in &mut self.blocked {
            queue.clear();
        }
    }

    pub fn is_free(&self, resource: Resource) -> bool {
        self.free[resource.index()]
    }

    pub fn acquire(&mut self, resource: Resource) {
        self.free[resource.index()] = false;
    }

    pub fn release(&mut self, resource: Resource) {
        self.free[resource.index()] = true;
    }

    pub fn block(&mut self, resource: Resource, pid: Pid, priority: i32) {
        self.blocked[resource.index()].push(pid, priority);
    }

    pub fn has_blocked(&self, resource: Resource) -> bool {
        !self.blocked[resource.index()].is_empty()
    }

    /// Empties the blocked queue of `resource`, in queue order.
    pub fn drain(&mut self, resource: Resource) -> Vec<Pid> {
        self.blocked[resource.index()].drain()
    }

    pub fn blocked(&self, resource: Resource) -> Vec<Pid> {
        self.blocked[resource.index()]
            .ordered()
            .into_iter()
            .copied()
            .collect()
    }
}

impl Default for ResourceTable {
    fn default() -> Self {
        ResourceTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_round_trip() {
        for resource in Resource::ALL {
            assert_eq!(Resource::from_name(resource.name()), Some(resource));
        }
        assert_eq!(Resource::from_name("printer"), None);
        assert_eq!(Resource::from_name("File"), None);
    }

    #[test]
    fn resources_start_free() {
        let table = ResourceTable::new();
        assert!(Resource::ALL.iter().all(|&r| table.is_free(r)));
        assert!(Resource::ALL.iter().all(|&r| !table.has_blocked(r)));
    }

    #[test]
    fn acquire_and_release_only_touch_one_resource() {
        let mut table = ResourceTable::new();
        table.acquire(Resource::UserOutput);
        assert!(!table.is_free(Resource::UserOutput));
        assert!(table.is_free(Resource::File));
        table.release(Resource::UserOutput);
        assert!(table.is_free(Resource::UserOutput));
    }

    #[test]
    fn drain_empties_the_queue_in_priority_order() {
        let mut table = ResourceTable::new();
        table.block(Resource::File, Pid::new(2), 1);
        table.block(Resource::File, Pid::new(0), 0);
        table.block(Resource::File, Pid::new(1), 1);
        table.block(Resource::UserInput, Pid::new(3), 0);

        assert_eq!(
            table.blocked(Resource::File),
            vec![Pid::new(0), Pid::new(2), Pid::new(1)]
        );
        assert_eq!(
            table.drain(Resource::File),
            vec![Pid::new(0), Pid::new(2), Pid::new(1)]
        );
        assert!(!table.has_blocked(Resource::File));
        assert!(table.has_blocked(Resource::UserInput));
    }

    #[test]
    fn reset_frees_and_empties_everything() {
        let mut table = ResourceTable::new();
        table.acquire(Resource::File);
        table.block(Resource::File, Pid::new(0), 0);
        table.reset();
        assert!(table.is_free(Resource::File));
        assert!(table.blocked(Resource::File).is_empty());
    }
}
