use function_name::named;
use pretty_assertions::assert_eq;
use scheduler::{Algorithm, MemoryDevices, Output, ProcessState};

use super::{completion_order, run, simulation, trace};

const TWO_LINES: &str = "assign x 1\nprint x";

#[test]
#[named]
pub fn assign_then_print() {
    let devices = MemoryDevices::new();
    let simulation = simulation(
        function_name!(),
        devices.clone(),
        &[("assign x 5\nprint x", 0, 0)],
        Algorithm::Fcfs,
        1,
    );
    let logs = run(simulation);

    assert_eq!(trace(&logs), vec![Some(0), Some(0)]);
    assert_eq!(devices.output(), vec![Output::Integer(5)]);
}

#[test]
#[named]
pub fn strings_are_not_integers() {
    let devices = MemoryDevices::new();
    let simulation = simulation(
        function_name!(),
        devices.clone(),
        &[("assign y \"hello\"\nprint y", 0, 0)],
        Algorithm::RoundRobin,
        2,
    );
    run(simulation);

    assert_eq!(devices.output(), vec![Output::Text("hello".to_string())]);
}

#[test]
#[named]
pub fn fcfs_lower_priority_value_first() {
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[(TWO_LINES, 1, 0), (TWO_LINES, 0, 0)],
        Algorithm::Fcfs,
        1,
    );
    let logs = run(simulation);

    assert_eq!(trace(&logs), vec![Some(1), Some(1), Some(0), Some(0)]);
    assert_eq!(completion_order(&logs), vec![1, 0]);
}

#[test]
#[named]
pub fn fcfs_completes_in_arrival_order() {
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[(TWO_LINES, 0, 0), (TWO_LINES, 0, 1), (TWO_LINES, 0, 2)],
        Algorithm::Fcfs,
        1,
    );
    let logs = run(simulation);

    assert_eq!(
        trace(&logs),
        vec![Some(0), Some(0), Some(1), Some(1), Some(2), Some(2)]
    );
    assert_eq!(completion_order(&logs), vec![0, 1, 2]);
}

#[test]
#[named]
pub fn idle_until_first_arrival() {
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[("assign x 1", 0, 2)],
        Algorithm::RoundRobin,
        2,
    );
    let logs = run(simulation);

    assert_eq!(trace(&logs), vec![None, None, Some(0)]);
    assert!(logs[1].snapshot.processes.is_empty());
}

#[test]
#[named]
pub fn images_are_packed() {
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[
            ("assign x 1", 0, 0),
            ("assign x 1\nassign y 2\nprint y", 0, 0),
            (TWO_LINES, 0, 1),
        ],
        Algorithm::Mlfq,
        1,
    );
    let logs = run(simulation);
    let processes = &logs[logs.len() - 1].snapshot.processes;

    assert_eq!(processes[0].lower_bound, 0);
    for pair in processes.windows(2) {
        assert_eq!(pair[1].lower_bound, pair[0].upper_bound + 1);
    }
    let bounds: Vec<(usize, usize)> = processes
        .iter()
        .map(|process| (process.lower_bound, process.upper_bound))
        .collect();
    assert_eq!(bounds, vec![(0, 9), (10, 21), (22, 32)]);
}

#[test]
#[named]
pub fn states_follow_the_lifecycle() {
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[(TWO_LINES, 0, 0), (TWO_LINES, 0, 0)],
        Algorithm::Fcfs,
        1,
    );
    let logs = run(simulation);
    let states = |tick: usize| -> Vec<ProcessState> {
        logs[tick]
            .snapshot
            .processes
            .iter()
            .map(|process| process.state)
            .collect()
    };

    assert_eq!(states(0), vec![ProcessState::Running, ProcessState::Ready]);
    assert_eq!(states(1), vec![ProcessState::Terminated, ProcessState::Ready]);
    assert_eq!(states(2), vec![ProcessState::Terminated, ProcessState::Running]);
    assert_eq!(
        states(3),
        vec![ProcessState::Terminated, ProcessState::Terminated]
    );
}

#[test]
#[named]
pub fn logs_render_each_tick() {
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[(TWO_LINES, 0, 0)],
        Algorithm::Fcfs,
        1,
    );
    let logs = run(simulation);
    let formatted = processor::format_logs(&logs);

    assert!(formatted.contains("===== Iteration: 1 =====\nFCFS | tick 1 | 0/1 completed\nRunning: 0\n"));
    assert!(formatted.contains("===== Iteration: 2 =====\nFCFS | tick 2 | 1/1 completed\nRunning: -\n"));
    assert!(formatted.trim_end().ends_with("DONE"));
}
