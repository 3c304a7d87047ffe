use std::fmt::{self, Display, Write};

use crate::{Pid, ProcessState, SimError};

/// Arena size used when the caller does not pick one.
pub const DEFAULT_CAPACITY: usize = 256;

/// A field of the process control block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PcbField {
    Id(Pid),
    State(ProcessState),
    /// Static priority, or the current level under MLFQ.
    Priority(i32),
    /// Index into the instruction region.
    ProgramCounter(usize),
    /// Absolute arena indices of the image start and of its end marker.
    Bounds { lower: usize, upper: usize },
}

impl Display for PcbField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PcbField::Id(pid) => write!(f, "ID = {pid}"),
            PcbField::State(state) => write!(f, "State = {state}"),
            PcbField::Priority(priority) => write!(f, "Current_priority = {priority}"),
            PcbField::ProgramCounter(pc) => write!(f, "Program_counter = {pc}"),
            PcbField::Bounds { lower, upper } => {
                write!(f, "Memory_Bounds = ({lower} -> {upper})")
            }
        }
    }
}

/// The atomic storage unit of the arena.
///
/// What a word holds is fixed by its offset inside a process image, see
/// [`crate::image`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Word {
    #[default]
    Empty,
    Pcb(PcbField),
    Variable {
        name: String,
        value: String,
    },
    /// A raw, unparsed instruction line.
    Instruction(String),
    EndOfInstructions,
}

impl Word {
    pub fn is_empty(&self) -> bool {
        matches!(self, Word::Empty)
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Empty => Ok(()),
            Word::Pcb(field) => write!(f, "[PCB] {field}"),
            Word::Variable { name, value } => write!(f, "[Var] {name} = {value}"),
            Word::Instruction(line) => write!(f, "[Instr] {line}"),
            Word::EndOfInstructions => write!(f, "== End of Instructions =="),
        }
    }
}

/// Fixed capacity, word addressed memory shared by all process images.
///
/// Images are never reclaimed during a run; [`Memory::clear`] wipes the
/// whole arena between runs.
#[derive(Debug)]
pub struct Memory {
    words: Vec<Word>,
}

impl Memory {
    pub fn new(capacity: usize) -> Memory {
        Memory {
            words: vec![Word::Empty; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    pub fn read(&self, address: usize) -> Result<&Word, SimError> {
        self.words.get(address).ok_or(SimError::OutOfBounds {
            address,
            capacity: self.capacity(),
        })
    }

    pub fn write(&mut self, address: usize, word: Word) -> Result<(), SimError> {
        let capacity = self.capacity();
        let slot = self
            .words
            .get_mut(address)
            .ok_or(SimError::OutOfBounds { address, capacity })?;
        *slot = word;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.words.fill(Word::Empty);
    }

    /// Renders every non-empty word with its address.
    pub fn dump(&self) -> String {
        let mut s = String::new();
        for (address, word) in self.words.iter().enumerate() {
            if word.is_empty() {
                continue;
            }
            // Writing to a String cannot fail.
            let _ = writeln!(s, "Memory[{address:03}]: {word}");
        }
        s
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_starts_empty() {
        let memory = Memory::new(16);
        assert_eq!(memory.capacity(), 16);
        assert!((0..16).all(|address| memory.read(address).unwrap().is_empty()));
    }

    #[test]
    fn test_memory_write_then_read() {
        let mut memory = Memory::new(16);
        memory
            .write(3, Word::Instruction("print x".to_string()))
            .unwrap();
        assert_eq!(
            memory.read(3).unwrap(),
            &Word::Instruction("print x".to_string())
        );
    }

    #[test]
    fn test_memory_out_of_bounds_read() {
        let memory = Memory::new(16);
        assert!(matches!(
            memory.read(16),
            Err(SimError::OutOfBounds {
                address: 16,
                capacity: 16
            })
        ));
    }

    #[test]
    fn test_memory_out_of_bounds_write() {
        let mut memory = Memory::new(16);
        assert!(memory.write(16, Word::EndOfInstructions).is_err());
    }

    #[test]
    fn test_memory_clear() {
        let mut memory = Memory::new(4);
        memory.write(0, Word::EndOfInstructions).unwrap();
        memory.clear();
        assert!(memory.read(0).unwrap().is_empty());
    }

    #[test]
    fn test_memory_dump_skips_empty_words() {
        let mut memory = Memory::new(8);
        memory
            .write(1, Word::Pcb(PcbField::Bounds { lower: 0, upper: 9 }))
            .unwrap();
        memory
            .write(
                5,
                Word::Variable {
                    name: "x".to_string(),
                    value: "5".to_string(),
                },
            )
            .unwrap();
        memory.write(6, Word::EndOfInstructions).unwrap();

        assert_eq!(
            memory.dump(),
            "Memory[001]: [PCB] Memory_Bounds = (0 -> 9)\n\
             Memory[005]: [Var] x = 5\n\
             Memory[006]: == End of Instructions ==\n"
        );
    }
}
