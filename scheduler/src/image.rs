//! Process image layout.
//!
//! An image is a contiguous run of words starting at its base offset:
//!
//! ```text
//! base + 0..5   PCB: ID, State, Current_priority, Program_counter, Memory_Bounds
//! base + 5..8   variable slots (an empty word is a free slot)
//! base + 8..    instruction lines, then the end of instructions marker
//! ```
//!
//! The end marker's address is the image's upper bound, and the next image
//! starts right after it.

use log::debug;

use crate::devices::Devices;
use crate::memory::{Memory, PcbField, Word};
use crate::{Pid, ProcessState, SimError};

pub const PCB_WORDS: usize = 5;
pub const VARIABLE_SLOTS: usize = 3;
pub const INSTRUCTIONS_OFFSET: usize = PCB_WORDS + VARIABLE_SLOTS;

const ID: usize = 0;
const STATE: usize = 1;
const PRIORITY: usize = 2;
const PROGRAM_COUNTER: usize = 3;
const BOUNDS: usize = 4;

/// Returns the base offset of the image following `previous`, or 0 for the
/// first image.
pub fn next_base(memory: &Memory, previous: Option<usize>) -> Result<usize, SimError> {
    match previous {
        None => Ok(0),
        Some(base) => Ok(ImageView::new(memory, base).bounds()?.1 + 1),
    }
}

/// Copies the non-blank lines of the named program into the instruction
/// region of the image at `base` and appends the end marker.
///
/// Lines are stored verbatim; syntax is only checked when they execute.
/// Returns the number of instructions written.
pub fn load_instructions(
    memory: &mut Memory,
    devices: &mut dyn Devices,
    name: &str,
    base: usize,
) -> Result<usize, SimError> {
    let source = devices
        .open_program(name)
        .map_err(|source| SimError::ProgramOpen {
            name: name.to_string(),
            source,
        })?;
    let lines: Vec<&str> = source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let limit = memory.capacity().saturating_sub(INSTRUCTIONS_OFFSET);
    if lines.len() > limit {
        return Err(SimError::TooManyInstructions {
            program: name.to_string(),
            count: lines.len(),
            limit,
        });
    }

    let required = base + INSTRUCTIONS_OFFSET + lines.len() + 1;
    if required > memory.capacity() {
        return Err(SimError::ArenaOverflow {
            required,
            capacity: memory.capacity(),
        });
    }

    for slot in PCB_WORDS..INSTRUCTIONS_OFFSET {
        memory.write(base + slot, Word::Empty)?;
    }
    let start = base + INSTRUCTIONS_OFFSET;
    for (index, line) in lines.iter().enumerate() {
        memory.write(start + index, Word::Instruction(line.to_string()))?;
    }
    memory.write(start + lines.len(), Word::EndOfInstructions)?;

    debug!(
        "loaded {} instructions of `{name}` at {base}..={}",
        lines.len(),
        start + lines.len()
    );
    Ok(lines.len())
}

/// Writes the PCB of the image at `base`.
///
/// The instructions must already be loaded: the upper bound is found by
/// scanning for the end marker.
pub fn init_pcb(memory: &mut Memory, base: usize, pid: Pid, priority: i32) -> Result<(), SimError> {
    let mut upper = base + INSTRUCTIONS_OFFSET;
    while *memory.read(upper)? != Word::EndOfInstructions {
        upper += 1;
    }

    let fields = [
        PcbField::Id(pid),
        PcbField::State(ProcessState::New),
        PcbField::Priority(priority),
        PcbField::ProgramCounter(0),
        PcbField::Bounds { lower: base, upper },
    ];
    for (offset, field) in fields.into_iter().enumerate() {
        memory.write(base + offset, Word::Pcb(field))?;
    }
    Ok(())
}

/// Read-only typed view over one process image.
#[derive(Clone, Copy)]
pub struct ImageView<'a> {
    memory: &'a Memory,
    base: usize,
}

impl<'a> ImageView<'a> {
    pub fn new(memory: &'a Memory, base: usize) -> ImageView<'a> {
        ImageView { memory, base }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    fn field(&self, offset: usize, expected: &'static str) -> Result<PcbField, SimError> {
        let address = self.base + offset;
        match self.memory.read(address)? {
            Word::Pcb(field) => Ok(*field),
            _ => Err(SimError::CorruptImage { address, expected }),
        }
    }

    fn corrupt(&self, offset: usize, expected: &'static str) -> SimError {
        SimError::CorruptImage {
            address: self.base + offset,
            expected,
        }
    }

    pub fn pid(&self) -> Result<Pid, SimError> {
        match self.field(ID, "ID")? {
            PcbField::Id(pid) => Ok(pid),
            _ => Err(self.corrupt(ID, "ID")),
        }
    }

    pub fn state(&self) -> Result<ProcessState, SimError> {
        match self.field(STATE, "State")? {
            PcbField::State(state) => Ok(state),
            _ => Err(self.corrupt(STATE, "State")),
        }
    }

    pub fn priority(&self) -> Result<i32, SimError> {
        match self.field(PRIORITY, "Current_priority")? {
            PcbField::Priority(priority) => Ok(priority),
            _ => Err(self.corrupt(PRIORITY, "Current_priority")),
        }
    }

    pub fn program_counter(&self) -> Result<usize, SimError> {
        match self.field(PROGRAM_COUNTER, "Program_counter")? {
            PcbField::ProgramCounter(pc) => Ok(pc),
            _ => Err(self.corrupt(PROGRAM_COUNTER, "Program_counter")),
        }
    }

    /// Returns the `(lower, upper)` memory bounds.
    pub fn bounds(&self) -> Result<(usize, usize), SimError> {
        match self.field(BOUNDS, "Memory_Bounds")? {
            PcbField::Bounds { lower, upper } => Ok((lower, upper)),
            _ => Err(self.corrupt(BOUNDS, "Memory_Bounds")),
        }
    }

    /// Returns the instruction word at `pc`, which may be the end marker.
    pub fn instruction(&self, pc: usize) -> Result<&'a Word, SimError> {
        self.memory.read(self.base + INSTRUCTIONS_OFFSET + pc)
    }

    /// Returns the instruction the process is about to execute.
    pub fn current_instruction(&self) -> Result<&'a Word, SimError> {
        self.instruction(self.program_counter()?)
    }

    pub fn variable(&self, name: &str) -> Result<Option<&'a str>, SimError> {
        for slot in PCB_WORDS..INSTRUCTIONS_OFFSET {
            if let Word::Variable { name: bound, value } = self.memory.read(self.base + slot)? {
                if bound == name {
                    return Ok(Some(value.as_str()));
                }
            }
        }
        Ok(None)
    }

    /// Returns the address `name` should be stored at: its current slot when
    /// already bound, otherwise the first free slot.
    pub fn slot_for(&self, name: &str) -> Result<usize, SimError> {
        let mut free = None;
        for slot in PCB_WORDS..INSTRUCTIONS_OFFSET {
            let address = self.base + slot;
            match self.memory.read(address)? {
                Word::Variable { name: bound, .. } if bound == name => return Ok(address),
                Word::Empty if free.is_none() => free = Some(address),
                _ => {}
            }
        }
        match free {
            Some(address) => Ok(address),
            None => Err(SimError::NoFreeVariableSlot {
                pid: self.pid()?,
                variable: name.to_string(),
            }),
        }
    }
}

/// Mutable typed view over one process image.
pub struct ImageViewMut<'a> {
    memory: &'a mut Memory,
    base: usize,
}

impl<'a> ImageViewMut<'a> {
    pub fn new(memory: &'a mut Memory, base: usize) -> ImageViewMut<'a> {
        ImageViewMut { memory, base }
    }

    pub fn view(&self) -> ImageView<'_> {
        ImageView::new(&*self.memory, self.base)
    }

    pub fn set_state(&mut self, state: ProcessState) -> Result<(), SimError> {
        self.view().state()?;
        self.memory
            .write(self.base + STATE, Word::Pcb(PcbField::State(state)))
    }

    pub fn set_priority(&mut self, priority: i32) -> Result<(), SimError> {
        self.view().priority()?;
        self.memory
            .write(self.base + PRIORITY, Word::Pcb(PcbField::Priority(priority)))
    }

    pub fn set_program_counter(&mut self, pc: usize) -> Result<(), SimError> {
        self.view().program_counter()?;
        self.memory.write(
            self.base + PROGRAM_COUNTER,
            Word::Pcb(PcbField::ProgramCounter(pc)),
        )
    }

    /// Binds `name` to `value`, reusing its slot when already bound.
    pub fn bind(&mut self, name: &str, value: String) -> Result<(), SimError> {
        let address = self.view().slot_for(name)?;
        self.memory.write(
            address,
            Word::Variable {
                name: name.to_string(),
                value,
            },
        )
    }
}
