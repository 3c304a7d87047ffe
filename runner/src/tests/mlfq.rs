use function_name::named;
use pretty_assertions::assert_eq;
use scheduler::{Algorithm, MemoryDevices, ProcessState};

use super::{pids, run, simulation, trace};

fn lines(count: usize) -> String {
    vec!["assign x 1"; count].join("\n")
}

#[test]
#[named]
pub fn demoted_after_each_quantum() {
    let source = lines(4);
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[(source.as_str(), 0, 0)],
        Algorithm::Mlfq,
        1,
    );
    let logs = run(simulation);

    let levels: Vec<i32> = logs
        .iter()
        .map(|log| log.snapshot.processes[0].priority)
        .collect();
    assert_eq!(levels, vec![1, 1, 2, 2]);
}

#[test]
#[named]
pub fn short_process_is_never_demoted() {
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[("assign x 1", 0, 0)],
        Algorithm::Mlfq,
        1,
    );
    let logs = run(simulation);

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].snapshot.processes[0].priority, 0);
    assert_eq!(logs[0].snapshot.processes[0].state, ProcessState::Terminated);
}

#[test]
#[named]
pub fn last_level_is_kept() {
    let source = lines(20);
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[(source.as_str(), 0, 0)],
        Algorithm::Mlfq,
        1,
    );
    let logs = run(simulation);

    let levels: Vec<i32> = logs
        .iter()
        .map(|log| log.snapshot.processes[0].priority)
        .collect();
    // Quanta of 1, 2, 4 and then 8 ticks per turn on the last level.
    let mut expected = vec![1, 1, 2, 2, 2, 2];
    expected.extend([3; 14]);
    assert_eq!(levels, expected);
}

#[test]
#[named]
pub fn arrival_preempts_lower_level() {
    let source = lines(5);
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[(source.as_str(), 0, 0), ("assign x 1", 0, 2)],
        Algorithm::Mlfq,
        1,
    );
    let logs = run(simulation);

    assert_eq!(
        trace(&logs),
        vec![Some(0), Some(0), Some(1), Some(0), Some(0), Some(0)]
    );
    // The preempted process keeps the tick left in its level 1 quantum and
    // is demoted right after using it.
    assert_eq!(logs[2].snapshot.processes[0].state, ProcessState::Ready);
    assert_eq!(logs[2].snapshot.processes[0].priority, 1);
    assert_eq!(logs[3].snapshot.processes[0].priority, 2);
}

#[test]
#[named]
pub fn level_queues_in_snapshot() {
    let source = lines(2);
    let simulation = simulation(
        function_name!(),
        MemoryDevices::new(),
        &[(source.as_str(), 0, 0), (source.as_str(), 0, 0)],
        Algorithm::Mlfq,
        1,
    );
    let logs = run(simulation);
    let snapshot = &logs[0].snapshot;

    assert_eq!(snapshot.running, None);
    assert_eq!(
        snapshot.levels,
        vec![pids(&[1]), pids(&[0]), pids(&[]), pids(&[])]
    );
    assert_eq!(snapshot.ready, pids(&[1, 0]));
    assert_eq!(trace(&logs), vec![Some(0), Some(1), Some(0), Some(1)]);
}
