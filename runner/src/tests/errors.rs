use std::num::NonZeroUsize;

use function_name::named;
use pretty_assertions::assert_eq;
use processor::Processor;
use scheduler::{Algorithm, MemoryDevices, Program, SimError, Simulation};

use super::simulation;

fn failure(test: &str, source: &str) -> SimError {
    let simulation = simulation(
        test,
        MemoryDevices::new(),
        &[(source, 0, 0)],
        Algorithm::RoundRobin,
        2,
    );
    match Processor::run(simulation, Some(100)) {
        Ok(logs) => panic!("expected an error, ran {} ticks", logs.len()),
        Err(err) => err,
    }
}

#[test]
#[named]
pub fn unknown_instruction() {
    let err = failure(function_name!(), "assign x 1\nloop x");
    assert!(matches!(err, SimError::UnknownInstruction { ref line, .. } if line == "loop x"));
    assert!(err.is_program_text());
}

#[test]
#[named]
pub fn missing_argument() {
    let err = failure(function_name!(), "printFromTo 1");
    assert!(matches!(err, SimError::MissingArgument { .. }));
}

#[test]
#[named]
pub fn fourth_variable() {
    let err = failure(
        function_name!(),
        "assign a 1\nassign b 2\nassign c 3\nassign d 4",
    );
    assert!(matches!(err, SimError::NoFreeVariableSlot { ref variable, .. } if variable == "d"));
    assert!(err.is_capacity());
}

#[test]
#[named]
pub fn unknown_resource() {
    let err = failure(function_name!(), "semWait printer\nsemSignal printer");
    assert!(matches!(err, SimError::UnknownResource { ref name, .. } if name == "printer"));
}

#[test]
#[named]
pub fn undefined_variable() {
    let err = failure(function_name!(), "print nothing");
    assert!(matches!(err, SimError::UnresolvedReference { ref name, .. } if name == "nothing"));
    assert_eq!(
        err.to_string(),
        "process 0: `nothing` is neither a file nor a valid variable"
    );
}

#[test]
#[named]
pub fn missing_program() {
    let mut simulation = Simulation::new(Box::new(MemoryDevices::new()), 256);
    simulation.init(
        vec![Program::new(format!("{}.txt", function_name!()), 0, 0)],
        Algorithm::Fcfs,
        NonZeroUsize::new(1).unwrap(),
    );
    let err = simulation.step().unwrap_err();
    assert!(matches!(err, SimError::ProgramOpen { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

fn small_arena(test: &str, sources: &[&str]) -> SimError {
    let mut devices = MemoryDevices::new();
    let mut programs = Vec::new();
    for (index, source) in sources.iter().enumerate() {
        let name = format!("{test}_{index}.txt");
        devices = devices.with_file(name.clone(), *source);
        programs.push(Program::new(name, 0, 0));
    }
    let mut simulation = Simulation::new(Box::new(devices), 20);
    simulation.init(programs, Algorithm::Mlfq, NonZeroUsize::new(1).unwrap());
    simulation.run().unwrap_err()
}

#[test]
#[named]
pub fn program_too_long() {
    let source = vec!["assign x 1"; 13].join("\n");
    let err = small_arena(function_name!(), &[source.as_str()]);
    assert!(matches!(
        err,
        SimError::TooManyInstructions {
            count: 13,
            limit: 12,
            ..
        }
    ));
    assert!(err.is_capacity());
}

#[test]
#[named]
pub fn arena_overflow() {
    let source = vec!["assign x 1"; 5].join("\n");
    let err = small_arena(function_name!(), &[source.as_str(), source.as_str()]);
    assert!(matches!(
        err,
        SimError::ArenaOverflow {
            required: 28,
            capacity: 20
        }
    ));
}

#[test]
#[named]
pub fn huge_print_range() {
    let err = failure(function_name!(), "printFromTo 0 9000000000000000000");
    assert!(matches!(
        err,
        SimError::RangeTooLong {
            from: 0,
            to: 9_000_000_000_000_000_000,
            ..
        }
    ));
    assert!(err.is_capacity());
}
