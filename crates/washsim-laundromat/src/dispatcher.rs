//! Releasing student tasks in arrival order.

use std::rc::Rc;

use washsim_core::{log_debug, SimulationContext};

use crate::student::Student;

/// Releases one task per student at the student's arrival time.
///
/// Students are sorted by `(arrival_time, id)` and released by a single
/// dispatching task which sleeps for the incremental delay between
/// consecutive arrivals. Releasing never blocks on the released student's
/// progress: each student runs in its own spawned task.
pub struct Dispatcher {
    students: Vec<Rc<Student>>,
    ctx: SimulationContext,
}

impl Dispatcher {
    /// Creates a dispatcher over the full student set.
    pub fn new(students: Vec<Rc<Student>>, ctx: SimulationContext) -> Self {
        Self { students, ctx }
    }

    /// The dispatching task.
    ///
    /// The first arrival at time 0 requires no sleep, and students sharing
    /// an arrival time are released back-to-back in ascending id order.
    pub async fn run(mut self) {
        self.students.sort_by(|a, b| {
            a.arrival_time()
                .total_cmp(&b.arrival_time())
                .then_with(|| a.id().cmp(&b.id()))
        });
        log_debug!(self.ctx, "releasing {} students", self.students.len());

        let mut last_arrival = 0.0;
        for student in self.students {
            let delay = student.arrival_time() - last_arrival;
            if delay > 0.0 {
                self.ctx.sleep(delay).await;
            }
            last_arrival = student.arrival_time();
            self.ctx.spawn(student.run());
        }
    }
}
