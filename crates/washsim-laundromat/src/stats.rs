//! Outcome aggregation.

use washsim_core::{cast, log_debug, Event, EventHandler, SimulationContext};

use crate::events::StudentDeparted;

/// Counts terminal student outcomes.
///
/// Receives one [`StudentDeparted`] event per student; event delivery on the
/// single-threaded engine serializes the updates. The counters are
/// monotonically non-decreasing and must be read only after the run loop has
/// drained every event and task, see
/// [`LaundromatSimulation::run`](crate::LaundromatSimulation::run).
pub struct StatsCollector {
    washed: u64,
    abandoned: u64,
    ctx: SimulationContext,
}

impl StatsCollector {
    /// Creates a collector with zeroed counters.
    pub fn new(ctx: SimulationContext) -> Self {
        Self {
            washed: 0,
            abandoned: 0,
            ctx,
        }
    }

    /// Number of students who washed.
    pub fn washed(&self) -> u64 {
        self.washed
    }

    /// Number of students who walked out without washing.
    pub fn abandoned(&self) -> u64 {
        self.abandoned
    }

    /// Total number of departed students.
    pub fn departed(&self) -> u64 {
        self.washed + self.abandoned
    }
}

impl EventHandler for StatsCollector {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            StudentDeparted { student_id, washed } => {
                if washed {
                    self.washed += 1;
                } else {
                    self.abandoned += 1;
                }
                log_debug!(
                    self.ctx,
                    "student {} departed, washed: {}, abandoned: {}",
                    student_id,
                    self.washed,
                    self.abandoned
                );
            }
        })
    }
}
