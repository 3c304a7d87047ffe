//! The instruction interpreter and the resource gate.
//!
//! Instruction lines are stored raw in memory and only parsed here, when the
//! process reaches them.

use log::debug;

use crate::devices::{Devices, Output};
use crate::image::{ImageView, ImageViewMut};
use crate::memory::{Memory, Word};
use crate::resources::{Resource, ResourceTable};
use crate::{Pid, SimError};

/// The most values a single `printFromTo` may emit.
pub const PRINT_RANGE_LIMIT: u32 = 1 << 16;

/// Whether the process has more instructions after the one just executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Continuing,
    Finished,
}

/// The result of executing one instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Execution {
    pub status: Status,
    /// Set when a `semSignal` released a resource. The scheduler is
    /// responsible for waking the processes blocked on it.
    pub released: Option<Resource>,
}

/// The outcome of checking the instruction a process is about to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Open,
    Blocked(Resource),
}

enum Source<'a> {
    Integer(i64),
    Text(&'a str),
    Input,
    ReadFile(&'a str),
}

enum Instruction<'a> {
    Assign { variable: &'a str, source: Source<'a> },
    Print(&'a str),
    PrintFromTo(&'a str, &'a str),
    WriteFile { name: &'a str, content: &'a str },
    ReadFile,
    SemWait(Resource),
    SemSignal(Resource),
}

impl<'a> Instruction<'a> {
    fn parse(pid: Pid, line: &'a str) -> Result<Instruction<'a>, SimError> {
        let mut tokens = line.split_whitespace();
        let opcode = tokens.next().unwrap_or_default();
        let mut argument = || {
            tokens.next().ok_or_else(|| SimError::MissingArgument {
                pid,
                instruction: line.to_string(),
            })
        };

        let instruction = match opcode {
            "assign" => {
                let variable = argument()?;
                let rest = rest_after(line, 2).ok_or_else(|| SimError::MissingArgument {
                    pid,
                    instruction: line.to_string(),
                })?;
                Instruction::Assign {
                    variable,
                    source: Source::parse(pid, line, rest)?,
                }
            }
            "print" => Instruction::Print(argument()?),
            "printFromTo" => {
                let from = argument()?;
                Instruction::PrintFromTo(from, argument()?)
            }
            "writeFile" => {
                let name = argument()?;
                Instruction::WriteFile {
                    name,
                    content: argument()?,
                }
            }
            "readFile" => Instruction::ReadFile,
            "semWait" => Instruction::SemWait(resource(pid, argument()?)?),
            "semSignal" => Instruction::SemSignal(resource(pid, argument()?)?),
            _ => {
                return Err(SimError::UnknownInstruction {
                    pid,
                    line: line.to_string(),
                })
            }
        };
        Ok(instruction)
    }
}

impl<'a> Source<'a> {
    fn parse(pid: Pid, line: &str, rest: &'a str) -> Result<Source<'a>, SimError> {
        if let Some(quoted) = rest.strip_prefix('"') {
            return Ok(Source::Text(quoted.strip_suffix('"').unwrap_or(quoted)));
        }
        if rest == "input" {
            return Ok(Source::Input);
        }
        let mut tokens = rest.split_whitespace();
        if tokens.next() == Some("readFile") {
            return match tokens.next() {
                Some(reference) => Ok(Source::ReadFile(reference)),
                None => Err(SimError::MissingArgument {
                    pid,
                    instruction: line.to_string(),
                }),
            };
        }
        rest.parse()
            .map(Source::Integer)
            .map_err(|_| SimError::InvalidOperand {
                pid,
                operand: rest.to_string(),
            })
    }
}

/// Returns the trimmed remainder of `line` after its first `skip` tokens.
fn rest_after(line: &str, skip: usize) -> Option<&str> {
    let mut rest = line.trim_start();
    for _ in 0..skip {
        let end = rest.find(char::is_whitespace)?;
        rest = rest[end..].trim_start();
    }
    Some(rest.trim_end()).filter(|rest| !rest.is_empty())
}

fn resource(pid: Pid, name: &str) -> Result<Resource, SimError> {
    Resource::from_name(name).ok_or_else(|| SimError::UnknownResource {
        pid,
        name: name.to_string(),
    })
}

/// Returns the resource the process waits on if its next instruction is a
/// `semWait`.
pub fn waits_on(memory: &Memory, base: usize) -> Result<Option<Resource>, SimError> {
    let image = ImageView::new(memory, base);
    let Word::Instruction(line) = image.current_instruction()? else {
        return Ok(None);
    };
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("semWait") {
        return Ok(None);
    }
    let pid = image.pid()?;
    let name = tokens.next().ok_or_else(|| SimError::MissingArgument {
        pid,
        instruction: line.clone(),
    })?;
    resource(pid, name).map(Some)
}

/// Checks whether the process can run its next instruction without blocking.
pub fn gate(memory: &Memory, resources: &ResourceTable, base: usize) -> Result<Gate, SimError> {
    Ok(match waits_on(memory, base)? {
        Some(resource) if !resources.is_free(resource) => Gate::Blocked(resource),
        _ => Gate::Open,
    })
}

pub fn can_execute(memory: &Memory, resources: &ResourceTable, base: usize) -> Result<bool, SimError> {
    Ok(gate(memory, resources, base)? == Gate::Open)
}

/// Executes the instruction at the program counter of the image at `base`
/// and advances the program counter.
///
/// Executing a process that already reached its end marker is a no-op that
/// reports [`Status::Finished`].
pub fn execute_one(
    memory: &mut Memory,
    resources: &mut ResourceTable,
    devices: &mut dyn Devices,
    base: usize,
) -> Result<Execution, SimError> {
    let image = ImageView::new(memory, base);
    let pid = image.pid()?;
    let pc = image.program_counter()?;
    let line = match image.instruction(pc)? {
        Word::Instruction(line) => line.clone(),
        Word::EndOfInstructions => {
            return Ok(Execution {
                status: Status::Finished,
                released: None,
            })
        }
        _ => {
            return Err(SimError::CorruptImage {
                address: base + crate::image::INSTRUCTIONS_OFFSET + pc,
                expected: "an instruction",
            })
        }
    };

    debug!("process {pid} executes `{line}`");
    let mut released = None;
    match Instruction::parse(pid, &line)? {
        Instruction::Assign { variable, source } => {
            // Run out of slots before prompting for input.
            image.slot_for(variable)?;
            let value = match source {
                Source::Integer(value) => value.to_string(),
                Source::Text(text) => text.to_string(),
                Source::Input => devices.read_input(variable).map_err(SimError::Input)?,
                Source::ReadFile(reference) => read_file(&image, devices, pid, reference)?,
            };
            ImageViewMut::new(memory, base).bind(variable, value)?;
        }
        Instruction::Print(variable) => {
            let value = image
                .variable(variable)?
                .ok_or_else(|| SimError::UnresolvedReference {
                    pid,
                    name: variable.to_string(),
                })?;
            let output = match value.parse() {
                Ok(integer) => Output::Integer(integer),
                Err(_) => Output::Text(value.to_string()),
            };
            devices.print(output);
        }
        Instruction::PrintFromTo(from, to) => {
            let from = integer(&image, pid, from)?;
            let to = integer(&image, pid, to)?;
            let len = (i128::from(to) - i128::from(from) + 1).max(0);
            if len > i128::from(PRINT_RANGE_LIMIT) {
                return Err(SimError::RangeTooLong {
                    pid,
                    from,
                    to,
                    limit: PRINT_RANGE_LIMIT,
                });
            }
            devices.print(Output::Sequence((from..=to).collect()));
        }
        Instruction::WriteFile { name, content } => {
            let name = image.variable(name)?.unwrap_or(name).to_string();
            let content = image.variable(content)?.unwrap_or(content).to_string();
            devices
                .write_file(&name, &content)
                .map_err(|source| SimError::FileAccess { name, source })?;
        }
        Instruction::ReadFile => {}
        Instruction::SemWait(resource) => resources.acquire(resource),
        Instruction::SemSignal(resource) => {
            resources.release(resource);
            released = Some(resource);
        }
    }

    let mut image = ImageViewMut::new(memory, base);
    image.set_program_counter(pc + 1)?;
    let status = match image.view().instruction(pc + 1)? {
        Word::EndOfInstructions => Status::Finished,
        _ => Status::Continuing,
    };
    Ok(Execution { status, released })
}

/// Resolves a `readFile` reference: a file of that name, or else a variable
/// holding the file name.
fn read_file(
    image: &ImageView<'_>,
    devices: &mut dyn Devices,
    pid: Pid,
    reference: &str,
) -> Result<String, SimError> {
    let name = if devices.file_exists(reference) {
        reference
    } else {
        match image.variable(reference)? {
            Some(name) if devices.file_exists(name) => name,
            _ => {
                return Err(SimError::UnresolvedReference {
                    pid,
                    name: reference.to_string(),
                })
            }
        }
    };
    devices
        .read_first_line(name)
        .map_err(|source| SimError::FileAccess {
            name: name.to_string(),
            source,
        })
}

fn integer(image: &ImageView<'_>, pid: Pid, token: &str) -> Result<i64, SimError> {
    let value = image.variable(token)?.unwrap_or(token);
    value.parse().map_err(|_| SimError::NotAnInteger {
        pid,
        value: value.to_string(),
    })
}
