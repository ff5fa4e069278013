//! Asynchronous waiting for events.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::{select_biased, FutureExt};

use crate::component::Id;
use crate::event::{Event, EventData, TypedEvent};
use crate::state::SimulationState;

/// Type of key that represents the specific details of awaited event.
pub type EventKey = u64;

/// Represents a result of asynchronous waiting for event with timeout (see [`EventFuture::with_timeout`]).
pub enum AwaitResult<T: EventData> {
    /// Corresponds to successful event receipt.
    Ok(TypedEvent<T>),
    /// Corresponds to timeout expiration.
    Timeout {
        /// Source of the awaited event (None if it was not specified).
        src: Option<Id>,
        /// Key of the awaited event (None if it was not specified).
        event_key: Option<EventKey>,
        /// Timeout value.
        timeout: f64,
    },
}

// Event future --------------------------------------------------------------------------------------------------------

/// Future that represents asynchronous waiting for specific event.
///
/// Created via `recv_event*` methods of [`SimulationContext`](crate::SimulationContext).
/// Dropping an uncompleted future withdraws the underlying event promise,
/// so the same event can be awaited again later.
pub struct EventFuture<T: EventData> {
    /// State with event data.
    state: Rc<RefCell<AwaitEventSharedState<T>>>,
    sim_state: Rc<RefCell<SimulationState>>,
    component_id: Id,
    event_key: Option<EventKey>,
    requested_src: Option<Id>,
}

impl<T: EventData> EventFuture<T> {
    fn new(
        state: Rc<RefCell<AwaitEventSharedState<T>>>,
        sim_state: Rc<RefCell<SimulationState>>,
        component_id: Id,
        requested_src: Option<Id>,
        event_key: Option<EventKey>,
    ) -> Self {
        Self {
            state,
            sim_state,
            component_id,
            event_key,
            requested_src,
        }
    }

    /// Waits for the event with specified timeout and returns [`AwaitResult`].
    ///
    /// If the event is scheduled for exactly the moment the timeout expires, the event wins:
    /// events are delivered before timers fired at the same simulation time,
    /// and the event branch of the internal select is checked first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde::Serialize;
    ///
    /// use washsim_core::async_mode::AwaitResult;
    /// use washsim_core::Simulation;
    ///
    /// #[derive(Clone, Serialize)]
    /// struct Message {
    ///     payload: u32,
    /// }
    ///
    /// let mut sim = Simulation::new(42);
    /// let client_ctx = sim.create_context("client");
    /// let client_id = client_ctx.id();
    /// let root_ctx = sim.create_context("root");
    /// let root_id = root_ctx.id();
    ///
    /// sim.spawn(async move {
    ///     root_ctx.emit(Message { payload: 42 }, client_id, 50.);
    /// });
    ///
    /// sim.spawn(async move {
    ///     let mut res = client_ctx.recv_event_from::<Message>(root_id).with_timeout(10.).await;
    ///     match res {
    ///         AwaitResult::Ok(..) => panic!("expect timeout here"),
    ///         AwaitResult::Timeout { src, .. } => {
    ///             assert_eq!(src, Some(root_id));
    ///         }
    ///     }
    ///
    ///     res = client_ctx.recv_event_from::<Message>(root_id).with_timeout(50.).await;
    ///     match res {
    ///         AwaitResult::Ok(event) => {
    ///             assert_eq!(event.src, root_id);
    ///             assert_eq!(event.data.payload, 42);
    ///         }
    ///         AwaitResult::Timeout { .. } => panic!("expect ok here"),
    ///     }
    /// });
    ///
    /// sim.step_until_no_events();
    /// assert_eq!(sim.time(), 50.);
    /// ```
    pub async fn with_timeout(self, timeout: f64) -> AwaitResult<T> {
        assert!(timeout >= 0., "Timeout must be a non-negative value");

        let timer_future = self
            .sim_state
            .borrow_mut()
            .create_timer(timeout, self.sim_state.clone());

        let src = self.requested_src;
        let event_key = self.event_key;
        select_biased! {
            event = self.fuse() => {
                AwaitResult::Ok(event)
            }
            _ = timer_future.fuse() => {
                AwaitResult::Timeout { src, event_key, timeout }
            }
        }
    }
}

impl<T: EventData> Future for EventFuture<T> {
    type Output = TypedEvent<T>;
    fn poll(self: Pin<&mut Self>, async_ctx: &mut Context) -> Poll<Self::Output> {
        let mut state = self.state.as_ref().borrow_mut();

        if !state.completed {
            state.waker = Some(async_ctx.waker().clone());
            return Poll::Pending;
        }

        if let Some(data) = std::mem::take(&mut state.shared_content) {
            Poll::Ready(data)
        } else {
            panic!("internal error: completed event future has no content")
        }
    }
}

impl<T: EventData> Drop for EventFuture<T> {
    fn drop(&mut self) {
        if !self.state.borrow().completed {
            self.sim_state.borrow_mut().on_incomplete_event_future_drop::<T>(
                self.component_id,
                &self.requested_src,
                self.event_key,
            );
        }
    }
}

// Event promise -------------------------------------------------------------------------------------------------------

pub(crate) struct EventPromise {
    state: Rc<RefCell<dyn EventResultSetter>>,
}

impl EventPromise {
    pub fn contract<T: EventData>(
        sim_state: Rc<RefCell<SimulationState>>,
        dst: Id,
        requested_src: Option<Id>,
        event_key: Option<EventKey>,
    ) -> (Self, EventFuture<T>) {
        let state = Rc::new(RefCell::new(AwaitEventSharedState::<T>::default()));
        let future = EventFuture::new(state.clone(), sim_state, dst, requested_src, event_key);
        (Self { state }, future)
    }

    pub fn complete(&self, event: Event) {
        self.state.borrow_mut().set_completed(event);
    }
}

// State shared between future and promise -----------------------------------------------------------------------------

struct AwaitEventSharedState<T: EventData> {
    pub completed: bool,
    pub waker: Option<Waker>,
    pub shared_content: Option<TypedEvent<T>>,
}

impl<T: EventData> Default for AwaitEventSharedState<T> {
    fn default() -> Self {
        Self {
            completed: false,
            waker: None,
            shared_content: None,
        }
    }
}

trait EventResultSetter {
    fn set_completed(&mut self, event: Event);
}

impl<T: EventData> EventResultSetter for AwaitEventSharedState<T> {
    fn set_completed(&mut self, event: Event) {
        if self.completed {
            panic!("internal error: try to complete already completed state")
        }
        self.completed = true;
        self.shared_content = Some(event.downcast::<T>());
        if let Some(waker) = self.waker.take() {
            waker.wake()
        }
    }
}
