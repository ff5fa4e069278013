//! Discrete-event simulation of a student laundry room.
//!
//! Students arrive on a schedule, wait a bounded time for a free washing
//! machine and either wash for a fixed duration or walk out. The model runs
//! on the [`washsim-core`](washsim_core) engine: one asynchronous task per
//! student, a dispatcher task releasing students in arrival order, a machine
//! pool with bounded-wait acquisition and a statistics component counting
//! the outcomes.

pub mod dispatcher;
pub mod events;
pub mod machines;
pub mod report;
pub mod scenario;
pub mod simulation;
pub mod stats;
pub mod student;
pub mod trace;

pub use machines::MachinePool;
pub use scenario::{Scenario, ScenarioError, StudentSpec};
pub use simulation::{LaundromatSimulation, RunStats};
pub use trace::{TraceEventKind, TraceJournal, TraceRecord};
