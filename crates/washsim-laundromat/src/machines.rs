//! Pool of washing machines with bounded-wait acquisition.

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use washsim_core::async_mode::{AwaitResult, EventKey};
use washsim_core::{log_trace, SimulationContext};

type TicketId = u64;

#[derive(Clone, Serialize)]
struct MachineGranted {
    ticket: TicketId,
}

/// Counting pool of interchangeable washing machines.
///
/// [`acquire`](Self::acquire) either takes a free machine immediately or joins
/// a FIFO queue of tickets and waits for a grant for at most `patience` time
/// units. [`release`](Self::release) hands the machine directly to the first
/// ticket whose owner is still waiting; a handed-over machine bypasses the
/// free count, so it can be neither granted twice nor lost. `release` must be
/// called exactly once per successful `acquire`.
///
/// A pool of capacity 0 is representable: every acquire with finite patience
/// times out. Scenario validation rejects such pools before a simulation
/// starts, see [`Scenario::validate`](crate::Scenario::validate).
pub struct MachinePool {
    capacity: u32,
    free: Cell<u32>,
    waiters: RefCell<VecDeque<TicketId>>,
    active: RefCell<HashSet<TicketId>>,
    ticket_count: Cell<TicketId>,
    ctx: SimulationContext,
}

impl MachinePool {
    /// Creates a pool with the specified number of machines, all free.
    pub fn new(capacity: u32, ctx: SimulationContext) -> Self {
        ctx.register_key_getter_for::<MachineGranted>(|granted| granted.ticket as EventKey);
        Self {
            capacity,
            free: Cell::new(capacity),
            waiters: RefCell::new(VecDeque::new()),
            active: RefCell::new(HashSet::new()),
            ticket_count: Cell::new(0),
            ctx,
        }
    }

    /// Returns the total number of machines in the pool.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Tries to take a machine, waiting for at most `patience` time units.
    ///
    /// Returns whether a machine was taken; on `false` no machine is held.
    /// A machine released at exactly the moment the patience expires is still
    /// granted to the caller: the grant is an event and events beat timers
    /// fired at the same simulation time.
    pub async fn acquire(&self, patience: f64) -> bool {
        if self.free.get() > 0 {
            self.free.set(self.free.get() - 1);
            return true;
        }
        let ticket = self.ticket_count.get();
        self.ticket_count.set(ticket + 1);
        self.waiters.borrow_mut().push_back(ticket);
        self.active.borrow_mut().insert(ticket);
        log_trace!(self.ctx, "ticket {} waits for a machine", ticket);

        let result = self
            .ctx
            .recv_event_by_key_from_self::<MachineGranted>(ticket as EventKey)
            .with_timeout(patience)
            .await;
        match result {
            AwaitResult::Ok(..) => true,
            AwaitResult::Timeout { .. } => {
                // withdraw the ticket so a later release skips it
                self.active.borrow_mut().remove(&ticket);
                log_trace!(self.ctx, "ticket {} expired", ticket);
                false
            }
        }
    }

    /// Returns one machine to the pool.
    ///
    /// The machine is handed to the first ticket in the queue whose owner is
    /// still waiting; expired tickets are discarded along the way. If no one
    /// is waiting, the free count is incremented.
    ///
    /// Panics if all machines are already free, which means a release without
    /// a matching successful acquire.
    pub fn release(&self) {
        let mut waiters = self.waiters.borrow_mut();
        while let Some(ticket) = waiters.pop_front() {
            if self.active.borrow_mut().remove(&ticket) {
                log_trace!(self.ctx, "ticket {} granted a machine", ticket);
                self.ctx.emit_self_now(MachineGranted { ticket });
                return;
            }
        }
        assert!(
            self.free.get() < self.capacity,
            "release does not match a successful acquire"
        );
        self.free.set(self.free.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use washsim_core::Simulation;

    use super::MachinePool;

    #[test]
    fn test_zero_capacity_pool_rejects_everyone() {
        let mut sim = Simulation::new(123);
        let pool = Rc::new(MachinePool::new(0, sim.create_context("machines")));
        let rejected = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let pool = pool.clone();
            let rejected = rejected.clone();
            sim.spawn(async move {
                assert!(!pool.acquire(5.).await);
                rejected.set(rejected.get() + 1);
            });
        }

        sim.step_until_no_events();
        assert_eq!(rejected.get(), 3);
        assert_eq!(sim.time(), 5.);
    }

    #[test]
    fn test_handover_is_fifo() {
        let mut sim = Simulation::new(123);
        let ctx = sim.create_context("washer");
        let pool = Rc::new(MachinePool::new(1, sim.create_context("machines")));
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));

        {
            let pool = pool.clone();
            sim.spawn(async move {
                assert!(pool.acquire(0.).await);
                ctx.sleep(2.).await;
                pool.release();
            });
        }
        for waiter in 1..=3 {
            let pool = pool.clone();
            let order = order.clone();
            let ctx = sim.create_context(format!("waiter-{}", waiter));
            sim.spawn(async move {
                assert!(pool.acquire(10.).await);
                order.borrow_mut().push(waiter);
                ctx.sleep(1.).await;
                pool.release();
            });
        }

        sim.step_until_no_events();
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "release does not match")]
    fn test_release_without_acquire_panics() {
        let mut sim = Simulation::new(123);
        let pool = MachinePool::new(2, sim.create_context("machines"));
        pool.release();
    }
}
