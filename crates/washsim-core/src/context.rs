//! Accessing simulation from components.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::prelude::Distribution;

use crate::async_mode::{EventFuture, EventKey};
use crate::component::Id;
use crate::event::{EventData, EventId};
use crate::state::SimulationState;

/// A facade for accessing the simulation state and producing events from simulation components.
pub struct SimulationContext {
    id: Id,
    name: String,
    sim_state: Rc<RefCell<SimulationState>>,
}

impl SimulationContext {
    pub(crate) fn new(id: Id, name: &str, sim_state: Rc<RefCell<SimulationState>>) -> Self {
        Self {
            id,
            name: name.to_owned(),
            sim_state,
        }
    }

    /// Returns the identifier of component associated with this context.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns the name of component associated with this context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.sim_state.borrow().time()
    }

    /// Returns a random float in the range _[0, 1)_
    /// using the simulation-wide random number generator.
    pub fn rand(&self) -> f64 {
        self.sim_state.borrow_mut().rand()
    }

    /// Returns a random number in the specified range
    /// using the simulation-wide random number generator.
    pub fn gen_range<T, R>(&self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.sim_state.borrow_mut().gen_range(range)
    }

    /// Returns a random value from the specified distribution
    /// using the simulation-wide random number generator.
    pub fn sample_from_distribution<T, Dist: Distribution<T>>(&self, dist: &Dist) -> T {
        self.sim_state.borrow_mut().sample_from_distribution(dist)
    }

    /// Creates new event with specified payload, destination and delay.
    pub fn emit<T>(&self, data: T, dst: Id, delay: f64) -> EventId
    where
        T: EventData,
    {
        self.sim_state.borrow_mut().add_event(data, self.id, dst, delay)
    }

    /// Creates new immediate (zero-delay) event with specified payload and destination.
    pub fn emit_now<T>(&self, data: T, dst: Id) -> EventId
    where
        T: EventData,
    {
        self.sim_state.borrow_mut().add_event(data, self.id, dst, 0.)
    }

    /// Creates new event for itself with specified payload and delay.
    pub fn emit_self<T>(&self, data: T, delay: f64) -> EventId
    where
        T: EventData,
    {
        self.sim_state.borrow_mut().add_event(data, self.id, self.id, delay)
    }

    /// Creates new immediate event for itself with specified payload.
    pub fn emit_self_now<T>(&self, data: T) -> EventId
    where
        T: EventData,
    {
        self.sim_state.borrow_mut().add_event(data, self.id, self.id, 0.)
    }

    /// Lookup component name by its identifier.
    pub fn lookup_name(&self, id: Id) -> String {
        self.sim_state.borrow().lookup_name(id)
    }

    /// Spawns a new asynchronous task.
    ///
    /// The task is admitted by the simulation run loop and begins executing
    /// at the current simulation time.
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) {
        self.sim_state.borrow_mut().spawn(future);
    }

    /// Suspends the calling task for the specified duration of simulation time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use washsim_core::Simulation;
    ///
    /// let mut sim = Simulation::new(123);
    /// let ctx = sim.create_context("comp");
    /// sim.spawn(async move {
    ///     ctx.sleep(1.5).await;
    ///     assert_eq!(ctx.time(), 1.5);
    /// });
    /// sim.step_until_no_events();
    /// assert_eq!(sim.time(), 1.5);
    /// ```
    pub async fn sleep(&self, duration: f64) {
        assert!(duration >= 0., "Duration must be a non-negative value");
        let timer_future = self
            .sim_state
            .borrow_mut()
            .create_timer(duration, self.sim_state.clone());
        timer_future.await;
    }

    /// Returns a future for waiting for an event of type `T` from the specified source.
    ///
    /// Panics if another outstanding future already awaits an event
    /// of the same type for this component.
    pub fn recv_event_from<T>(&self, src: Id) -> EventFuture<T>
    where
        T: EventData,
    {
        self.recv_event_inner::<T>(Some(src), None)
    }

    /// Returns a future for waiting for an event of type `T` with the specified key
    /// from the specified source.
    ///
    /// A key getter for `T` must be registered via
    /// [`register_key_getter_for`](Self::register_key_getter_for),
    /// otherwise the event will not be matched against the future.
    pub fn recv_event_by_key_from<T>(&self, src: Id, key: EventKey) -> EventFuture<T>
    where
        T: EventData,
    {
        self.recv_event_inner::<T>(Some(src), Some(key))
    }

    /// Returns a future for waiting for an event of type `T` with the specified key
    /// emitted by the component to itself.
    pub fn recv_event_by_key_from_self<T>(&self, key: EventKey) -> EventFuture<T>
    where
        T: EventData,
    {
        self.recv_event_inner::<T>(Some(self.id), Some(key))
    }

    fn recv_event_inner<T>(&self, src: Option<Id>, key: Option<EventKey>) -> EventFuture<T>
    where
        T: EventData,
    {
        self.sim_state
            .borrow_mut()
            .create_event_future::<T>(self.id, src, key, self.sim_state.clone())
    }

    /// Registers a function for extracting [`EventKey`] from events of type `T`.
    ///
    /// See also [`Simulation::register_key_getter_for`](crate::Simulation::register_key_getter_for).
    pub fn register_key_getter_for<T>(&self, key_getter: impl Fn(&T) -> EventKey + 'static)
    where
        T: EventData,
    {
        self.sim_state.borrow_mut().register_key_getter_for::<T>(key_getter);
    }
}
