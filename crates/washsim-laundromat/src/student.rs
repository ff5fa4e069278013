//! Student lifecycle.

use std::cell::RefCell;
use std::rc::Rc;

use washsim_core::{log_debug, Id, SimulationContext};

use crate::events::StudentDeparted;
use crate::machines::MachinePool;
use crate::scenario::StudentSpec;
use crate::trace::{TraceEventKind, TraceJournal};

/// A single student with a fixed timing profile.
///
/// The student's behavior is a straight-line task:
/// arrive, try to take a machine within the patience interval,
/// then either wash and release the machine or walk out.
/// The task terminates in exactly one of the two outcomes and reports it
/// to the statistics collector exactly once.
pub struct Student {
    id: u32,
    arrival_time: f64,
    wash_time: f64,
    patience: f64,
    pool: Rc<MachinePool>,
    journal: Rc<RefCell<TraceJournal>>,
    stats_id: Id,
    ctx: SimulationContext,
}

impl Student {
    /// Creates a student from its spec, keeping handles to the shared model parts.
    pub fn new(
        id: u32,
        spec: &StudentSpec,
        pool: Rc<MachinePool>,
        journal: Rc<RefCell<TraceJournal>>,
        stats_id: Id,
        ctx: SimulationContext,
    ) -> Self {
        Self {
            id,
            arrival_time: spec.arrival_time as f64,
            wash_time: spec.wash_time as f64,
            patience: spec.patience as f64,
            pool,
            journal,
            stats_id,
            ctx,
        }
    }

    /// Returns the student identifier.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the scheduled arrival time.
    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    /// The student task, spawned by the dispatcher at the arrival time.
    pub async fn run(self: Rc<Self>) {
        self.record(TraceEventKind::Arrived);
        log_debug!(self.ctx, "student {} arrives", self.id);

        if self.pool.acquire(self.patience).await {
            self.record(TraceEventKind::StartedWashing);
            log_debug!(self.ctx, "student {} starts washing", self.id);

            self.ctx.sleep(self.wash_time).await;
            self.pool.release();

            self.record(TraceEventKind::LeftAfterWashing);
            log_debug!(self.ctx, "student {} leaves after washing", self.id);
            self.depart(true);
        } else {
            self.record(TraceEventKind::LeftWithoutWashing);
            log_debug!(self.ctx, "student {} leaves without washing", self.id);
            self.depart(false);
        }
    }

    fn record(&self, kind: TraceEventKind) {
        self.journal.borrow_mut().record(self.ctx.time(), self.id, kind);
    }

    fn depart(&self, washed: bool) {
        self.ctx.emit_now(
            StudentDeparted {
                student_id: self.id,
                washed,
            },
            self.stats_id,
        );
    }
}
