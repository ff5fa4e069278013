//! Wiring of the laundromat model on top of the simulation engine.

use std::cell::RefCell;
use std::rc::Rc;

use sugars::{rc, refcell};

use washsim_core::Simulation;

use crate::dispatcher::Dispatcher;
use crate::machines::MachinePool;
use crate::report;
use crate::scenario::{Scenario, ScenarioError};
use crate::stats::StatsCollector;
use crate::student::Student;
use crate::trace::TraceJournal;

/// Final counts of a completed run.
#[derive(Clone, Copy, Debug)]
pub struct RunStats {
    /// Total number of students.
    pub total: u32,
    /// Number of students who washed.
    pub washed: u64,
    /// Number of students who walked out without washing.
    pub abandoned: u64,
    /// Whether expanding the machine pool is recommended,
    /// see [`report::needs_more_machines`].
    pub needs_more_machines: bool,
}

/// A configured laundromat simulation.
///
/// Construction validates the scenario and wires the model components;
/// [`run`](Self::run) executes the simulation to completion.
pub struct LaundromatSimulation {
    sim: Simulation,
    stats: Rc<RefCell<StatsCollector>>,
    journal: Rc<RefCell<TraceJournal>>,
    student_count: u32,
}

impl LaundromatSimulation {
    /// Builds a simulation from a validated scenario.
    ///
    /// Rejects malformed scenarios before any simulation state exists.
    pub fn new(scenario: &Scenario, seed: u64) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let mut sim = Simulation::new(seed);

        let journal = rc!(refcell!(TraceJournal::new()));
        let stats = rc!(refcell!(StatsCollector::new(sim.create_context("stats"))));
        let stats_id = sim.add_handler("stats", stats.clone());
        let pool = Rc::new(MachinePool::new(scenario.machine_count, sim.create_context("machines")));

        let students = scenario
            .students
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                let id = idx as u32 + 1;
                let ctx = sim.create_context(format!("student-{}", id));
                Rc::new(Student::new(id, spec, pool.clone(), journal.clone(), stats_id, ctx))
            })
            .collect();

        let dispatcher = Dispatcher::new(students, sim.create_context("dispatcher"));
        sim.spawn(dispatcher.run());

        Ok(Self {
            sim,
            stats,
            journal,
            student_count: scenario.student_count(),
        })
    }

    /// Runs the simulation to completion and returns the final counts.
    ///
    /// The counters are read only after the run loop has drained every event,
    /// timer and task, i.e. after every student task has terminated.
    pub fn run(&mut self) -> RunStats {
        self.sim.step_until_no_events();
        let stats = self.stats.borrow();
        debug_assert_eq!(stats.departed(), self.student_count as u64);
        RunStats {
            total: self.student_count,
            washed: stats.washed(),
            abandoned: stats.abandoned(),
            needs_more_machines: report::needs_more_machines(self.student_count, stats.abandoned()),
        }
    }

    /// Returns the trace journal.
    pub fn journal(&self) -> Rc<RefCell<TraceJournal>> {
        self.journal.clone()
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.sim.time()
    }
}
