//! Error types for the simulator.
//!
//! Every error is fatal for the whole run: a malformed program or an
//! undersized arena is a configuration problem, not a transient condition,
//! so nothing is retried. The caller decides whether to stop or to start
//! over from [`Simulation::reset`](crate::Simulation::reset).

use std::fmt;
use std::io;

use crate::Pid;

/// Errors raised while building process images or executing instructions.
#[derive(Debug)]
#[non_exhaustive]
pub enum SimError {
    /// A process image does not fit in the remaining arena.
    ArenaOverflow { required: usize, capacity: usize },
    /// The instruction source has more lines than the instruction region holds.
    TooManyInstructions {
        program: String,
        count: usize,
        limit: usize,
    },
    /// All variable slots of the process are taken.
    NoFreeVariableSlot { pid: Pid, variable: String },
    /// A `printFromTo` range holds more values than a single print may emit.
    RangeTooLong {
        pid: Pid,
        from: i64,
        to: i64,
        limit: u32,
    },

    /// The leading token of an instruction is not a known opcode.
    UnknownInstruction { pid: Pid, line: String },
    /// An instruction is missing one of its required tokens.
    MissingArgument { pid: Pid, instruction: String },
    /// An `assign` source is none of the accepted forms.
    InvalidOperand { pid: Pid, operand: String },
    /// A `printFromTo` bound is neither a variable nor an integer.
    NotAnInteger { pid: Pid, value: String },
    /// A variable name could not be resolved.
    UnresolvedReference { pid: Pid, name: String },
    /// A semaphore instruction names an unknown resource.
    UnknownResource { pid: Pid, name: String },

    /// The instruction source of a program could not be opened.
    ProgramOpen { name: String, source: io::Error },
    /// A data file could not be read or written.
    FileAccess { name: String, source: io::Error },
    /// The interactive input collaborator failed.
    Input(io::Error),

    /// Arena access outside of its capacity.
    OutOfBounds { address: usize, capacity: usize },
    /// A word does not hold what its position in the image requires.
    CorruptImage {
        address: usize,
        expected: &'static str,
    },
    /// No process image exists for this PID.
    UnknownProcess(Pid),
    /// The simulation was stepped before being initialized.
    NotInitialized,
}

impl SimError {
    /// Returns `true` for errors caused by the fixed simulator limits.
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            Self::ArenaOverflow { .. }
                | Self::TooManyInstructions { .. }
                | Self::NoFreeVariableSlot { .. }
                | Self::RangeTooLong { .. }
        )
    }

    /// Returns `true` for errors caused by an invalid program text.
    pub fn is_program_text(&self) -> bool {
        matches!(
            self,
            Self::UnknownInstruction { .. }
                | Self::MissingArgument { .. }
                | Self::InvalidOperand { .. }
                | Self::NotAnInteger { .. }
                | Self::UnresolvedReference { .. }
                | Self::UnknownResource { .. }
        )
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArenaOverflow { required, capacity } => write!(
                f,
                "memory overflow: image needs {required} words, arena holds {capacity}"
            ),
            Self::TooManyInstructions {
                program,
                count,
                limit,
            } => write!(
                f,
                "program `{program}` too large for memory: {count} instructions, limit is {limit}"
            ),
            Self::NoFreeVariableSlot { pid, variable } => write!(
                f,
                "process {pid}: no place in memory for variable `{variable}`"
            ),
            Self::RangeTooLong {
                pid,
                from,
                to,
                limit,
            } => write!(
                f,
                "process {pid}: range {from}..={to} exceeds the limit of {limit} values"
            ),
            Self::UnknownInstruction { pid, line } => {
                write!(f, "process {pid}: unknown instruction `{line}`")
            }
            Self::MissingArgument { pid, instruction } => {
                write!(f, "process {pid}: `{instruction}` is missing an argument")
            }
            Self::InvalidOperand { pid, operand } => {
                write!(f, "process {pid}: cannot assign from `{operand}`")
            }
            Self::NotAnInteger { pid, value } => {
                write!(f, "process {pid}: `{value}` is not an integer")
            }
            Self::UnresolvedReference { pid, name } => write!(
                f,
                "process {pid}: `{name}` is neither a file nor a valid variable"
            ),
            Self::UnknownResource { pid, name } => {
                write!(f, "process {pid}: invalid resource `{name}`")
            }
            Self::ProgramOpen { name, source } => {
                write!(f, "cannot open program `{name}`: {source}")
            }
            Self::FileAccess { name, source } => write!(f, "cannot access file `{name}`: {source}"),
            Self::Input(err) => write!(f, "failed to read input: {err}"),
            Self::OutOfBounds { address, capacity } => write!(
                f,
                "out of bounds memory access at {address} (capacity {capacity})"
            ),
            Self::CorruptImage { address, expected } => {
                write!(f, "memory word {address} does not hold {expected}")
            }
            Self::UnknownProcess(pid) => write!(f, "no process found for id {pid}"),
            Self::NotInitialized => write!(f, "simulation stepped before init"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ProgramOpen { source, .. } | Self::FileAccess { source, .. } => Some(source),
            Self::Input(err) => Some(err),
            _ => None,
        }
    }
}
