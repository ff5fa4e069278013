use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pub(crate) type TaskId = u64;

pub(crate) type BoxedTaskFuture = Pin<Box<dyn Future<Output = ()>>>;

// An asynchronous activity spawned via Simulation::spawn or SimulationContext::spawn.
// Owned by the executor until the underlying future completes.
pub(crate) struct Task {
    future: BoxedTaskFuture,
}

impl Task {
    pub fn new(future: BoxedTaskFuture) -> Self {
        Self { future }
    }

    pub fn poll(&mut self, async_ctx: &mut Context) -> Poll<()> {
        self.future.as_mut().poll(async_ctx)
    }
}
