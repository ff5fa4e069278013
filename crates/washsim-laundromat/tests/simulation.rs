use rand::prelude::*;
use rand_pcg::Pcg64;

use washsim_laundromat::{
    LaundromatSimulation, RunStats, Scenario, StudentSpec, TraceEventKind, TraceRecord,
};

fn scenario(machine_count: u32, students: &[(u64, u64, u64)]) -> Scenario {
    Scenario {
        machine_count,
        students: students
            .iter()
            .map(|&(arrival_time, wash_time, patience)| StudentSpec {
                arrival_time,
                wash_time,
                patience,
            })
            .collect(),
    }
}

fn run(scenario: &Scenario, seed: u64) -> (RunStats, Vec<TraceRecord>) {
    let mut sim = LaundromatSimulation::new(scenario, seed).unwrap();
    let stats = sim.run();
    let journal = sim.journal();
    let records = journal.borrow().records().to_vec();
    (stats, records)
}

fn records_of(records: &[TraceRecord], student_id: u32) -> Vec<(f64, TraceEventKind)> {
    records
        .iter()
        .filter(|r| r.student_id == student_id)
        .map(|r| (r.time, r.kind))
        .collect()
}

#[test]
fn test_impatient_student_walks_out() {
    // one machine; the second student cannot wait at all
    let (stats, records) = run(&scenario(1, &[(0, 5, 10), (1, 1, 0)]), 123);
    assert_eq!(stats.total, 2);
    assert_eq!(stats.washed, 1);
    assert_eq!(stats.abandoned, 1);

    assert_eq!(
        records_of(&records, 1),
        vec![
            (0.0, TraceEventKind::Arrived),
            (0.0, TraceEventKind::StartedWashing),
            (5.0, TraceEventKind::LeftAfterWashing),
        ]
    );
    assert_eq!(
        records_of(&records, 2),
        vec![
            (1.0, TraceEventKind::Arrived),
            (1.0, TraceEventKind::LeftWithoutWashing),
        ]
    );
}

#[test]
fn test_enough_machines_for_everyone() {
    let (stats, records) = run(&scenario(2, &[(0, 3, 5), (0, 3, 5)]), 123);
    assert_eq!(stats.abandoned, 0);
    assert_eq!(stats.washed, 2);
    for student_id in 1..=2 {
        assert_eq!(
            records_of(&records, student_id),
            vec![
                (0.0, TraceEventKind::Arrived),
                (0.0, TraceEventKind::StartedWashing),
                (3.0, TraceEventKind::LeftAfterWashing),
            ]
        );
    }
}

#[test]
fn test_machine_freed_at_exact_deadline_is_granted() {
    // student 2 waits with patience 5; the machine frees up at exactly t=5
    let (stats, records) = run(&scenario(1, &[(0, 5, 0), (0, 1, 5)]), 123);
    assert_eq!(stats.abandoned, 0);
    assert_eq!(
        records_of(&records, 2),
        vec![
            (0.0, TraceEventKind::Arrived),
            (5.0, TraceEventKind::StartedWashing),
            (6.0, TraceEventKind::LeftAfterWashing),
        ]
    );
}

#[test]
fn test_waiters_are_served_in_fifo_order() {
    let (stats, records) = run(&scenario(1, &[(0, 2, 10), (0, 1, 10), (0, 1, 10)]), 123);
    assert_eq!(stats.abandoned, 0);
    let starts: Vec<(f64, u32)> = records
        .iter()
        .filter(|r| r.kind == TraceEventKind::StartedWashing)
        .map(|r| (r.time, r.student_id))
        .collect();
    assert_eq!(starts, vec![(0.0, 1), (2.0, 2), (3.0, 3)]);
}

#[test]
fn test_arrival_order_follows_time_then_id() {
    // listed out of arrival order; ids are assigned in input order
    let (_, records) = run(&scenario(3, &[(5, 1, 0), (0, 1, 0), (5, 1, 0)]), 123);
    let arrivals: Vec<(f64, u32)> = records
        .iter()
        .filter(|r| r.kind == TraceEventKind::Arrived)
        .map(|r| (r.time, r.student_id))
        .collect();
    assert_eq!(arrivals, vec![(0.0, 2), (5.0, 1), (5.0, 3)]);
}

#[test]
fn test_every_student_reaches_exactly_one_outcome() {
    let mut rand = Pcg64::seed_from_u64(7);
    let students: Vec<(u64, u64, u64)> = (0..40)
        .map(|_| {
            (
                rand.gen_range(0..=15),
                rand.gen_range(1..=6),
                rand.gen_range(0..=6),
            )
        })
        .collect();
    let (stats, records) = run(&scenario(3, &students), 123);

    assert_eq!(stats.washed + stats.abandoned, 40);
    let washed_records = records
        .iter()
        .filter(|r| r.kind == TraceEventKind::LeftAfterWashing)
        .count() as u64;
    let abandoned_records = records
        .iter()
        .filter(|r| r.kind == TraceEventKind::LeftWithoutWashing)
        .count() as u64;
    assert_eq!(washed_records, stats.washed);
    assert_eq!(abandoned_records, stats.abandoned);
}

#[test]
fn test_machines_in_use_never_exceed_capacity() {
    let mut rand = Pcg64::seed_from_u64(21);
    let students: Vec<(u64, u64, u64)> = (0..60)
        .map(|_| {
            (
                rand.gen_range(0..=10),
                rand.gen_range(1..=8),
                rand.gen_range(0..=8),
            )
        })
        .collect();
    let capacity = 3;
    let (_, records) = run(&scenario(capacity, &students), 123);

    let mut in_use: i32 = 0;
    let mut max_in_use: i32 = 0;
    for record in &records {
        match record.kind {
            TraceEventKind::StartedWashing => {
                in_use += 1;
                max_in_use = max_in_use.max(in_use);
            }
            TraceEventKind::LeftAfterWashing => in_use -= 1,
            _ => {}
        }
    }
    assert!(max_in_use as u32 <= capacity);
    assert_eq!(in_use, 0);
}

#[test]
fn test_runs_are_deterministic() {
    let mut rand = Pcg64::seed_from_u64(33);
    let students: Vec<(u64, u64, u64)> = (0..25)
        .map(|_| {
            (
                rand.gen_range(0..=12),
                rand.gen_range(1..=5),
                rand.gen_range(0..=5),
            )
        })
        .collect();
    let scenario = scenario(2, &students);

    let mut first = LaundromatSimulation::new(&scenario, 42).unwrap();
    let first_stats = first.run();
    let mut second = LaundromatSimulation::new(&scenario, 42).unwrap();
    let second_stats = second.run();

    assert_eq!(first_stats.abandoned, second_stats.abandoned);
    assert_eq!(
        first.journal().borrow().to_json().unwrap(),
        second.journal().borrow().to_json().unwrap()
    );
}

#[test]
fn test_expansion_is_recommended_at_threshold() {
    // 1 of 2 students walks out, well above the 25% threshold
    let (stats, _) = run(&scenario(1, &[(0, 5, 10), (1, 1, 0)]), 123);
    assert!(stats.needs_more_machines);

    let (stats, _) = run(&scenario(2, &[(0, 3, 5), (0, 3, 5)]), 123);
    assert!(!stats.needs_more_machines);
}

#[test]
fn test_scenario_without_machines_is_rejected() {
    let scenario = scenario(0, &[(0, 1, 1)]);
    assert!(LaundromatSimulation::new(&scenario, 123).is_err());
}
