//! Simulation configuration and execution.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use log::Level::Trace;
use log::{log_enabled, trace, warn};
use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::prelude::Distribution;
use serde_json::json;
use serde_type_name::type_name;

use crate::async_mode::executor::Executor;
use crate::async_mode::EventKey;
use crate::component::Id;
use crate::context::SimulationContext;
use crate::event::{Event, EventData};
use crate::handler::EventHandler;
use crate::log::log_undelivered_event;
use crate::state::{Completion, SimulationState};

/// Represents a simulation, provides methods for its configuration and execution.
pub struct Simulation {
    sim_state: Rc<RefCell<SimulationState>>,
    handlers: Vec<Option<Rc<RefCell<dyn EventHandler>>>>,
    executor: Executor,
}

impl Simulation {
    /// Creates a new simulation with specified random seed.
    pub fn new(seed: u64) -> Self {
        Self {
            sim_state: Rc::new(RefCell::new(SimulationState::new(seed))),
            handlers: Vec::new(),
            executor: Executor::new(),
        }
    }

    fn register(&mut self, name: &str) -> Id {
        let id = self.sim_state.borrow_mut().register(name);
        while self.handlers.len() <= id as usize {
            self.handlers.push(None);
        }
        id
    }

    /// Returns the identifier of component by its name.
    ///
    /// Panics if component with such name does not exist.
    pub fn lookup_id(&self, name: &str) -> Id {
        self.sim_state.borrow().lookup_id(name)
    }

    /// Returns the name of component by its identifier.
    ///
    /// Panics if component with such Id does not exist.
    pub fn lookup_name(&self, id: Id) -> String {
        self.sim_state.borrow().lookup_name(id)
    }

    /// Creates a new simulation context with specified name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use washsim_core::Simulation;
    ///
    /// let mut sim = Simulation::new(123);
    /// let comp_ctx = sim.create_context("comp");
    /// assert_eq!(comp_ctx.id(), 0); // component ids are assigned sequentially starting from 0
    /// assert_eq!(comp_ctx.name(), "comp");
    /// ```
    pub fn create_context<S>(&mut self, name: S) -> SimulationContext
    where
        S: AsRef<str>,
    {
        SimulationContext::new(self.register(name.as_ref()), name.as_ref(), self.sim_state.clone())
    }

    /// Registers the event handler implementation for component with specified name,
    /// returns the component Id.
    pub fn add_handler<S>(&mut self, name: S, handler: Rc<RefCell<dyn EventHandler>>) -> Id
    where
        S: AsRef<str>,
    {
        let id = self.register(name.as_ref());
        self.handlers[id as usize] = Some(handler);
        id
    }

    /// Spawns a new asynchronous task.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use washsim_core::Simulation;
    ///
    /// let mut sim = Simulation::new(123);
    /// let ctx = sim.create_context("comp");
    /// sim.spawn(async move {
    ///     ctx.sleep(2.).await;
    /// });
    /// sim.step_until_no_events();
    /// assert_eq!(sim.time(), 2.);
    /// ```
    pub fn spawn(&mut self, future: impl Future<Output = ()> + 'static) {
        self.sim_state.borrow_mut().spawn(future);
    }

    /// Registers a function for extracting [`EventKey`] from events of type `T`.
    ///
    /// Events with a registered key getter are matched against futures created by
    /// `recv_event_by_key*` methods of [`SimulationContext`].
    pub fn register_key_getter_for<T>(&self, key_getter: impl Fn(&T) -> EventKey + 'static)
    where
        T: EventData,
    {
        self.sim_state.borrow_mut().register_key_getter_for::<T>(key_getter);
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.sim_state.borrow().time()
    }

    /// Returns a random float in the range _[0, 1)_
    /// using the simulation-wide random number generator.
    pub fn rand(&mut self) -> f64 {
        self.sim_state.borrow_mut().rand()
    }

    /// Returns a random number in the specified range
    /// using the simulation-wide random number generator.
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.sim_state.borrow_mut().gen_range(range)
    }

    /// Returns a random value from the specified distribution
    /// using the simulation-wide random number generator.
    pub fn sample_from_distribution<T, Dist: Distribution<T>>(&mut self, dist: &Dist) -> T {
        self.sim_state.borrow_mut().sample_from_distribution(dist)
    }

    /// Returns the total number of created events.
    pub fn event_count(&self) -> u64 {
        self.sim_state.borrow().event_count()
    }

    /// Performs a single step through the simulation.
    ///
    /// Runs all tasks ready at the current simulation time, then takes the earliest
    /// pending completion (an event delivery or a timer firing), advances the clock
    /// to it and processes it. An event scheduled for the same time as a timer is
    /// delivered before the timer.
    ///
    /// Returns `true` if any progress was made and `false` otherwise.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde::Serialize;
    /// use washsim_core::Simulation;
    ///
    /// #[derive(Clone, Serialize)]
    /// pub struct SomeEvent {
    /// }
    ///
    /// let mut sim = Simulation::new(123);
    /// let comp_ctx = sim.create_context("comp");
    /// assert_eq!(sim.time(), 0.0);
    /// comp_ctx.emit_self(SomeEvent {}, 1.2);
    /// let mut status = sim.step();
    /// assert!(status);
    /// assert_eq!(sim.time(), 1.2);
    /// status = sim.step();
    /// assert!(!status);
    /// ```
    pub fn step(&mut self) -> bool {
        let polled = self.process_tasks();
        let next = self.sim_state.borrow_mut().next_completion();
        match next {
            Some(Completion::Event(event)) => {
                self.deliver_event(event);
                true
            }
            Some(Completion::Timer(timer)) => {
                timer.complete();
                true
            }
            None => polled,
        }
    }

    /// Performs the specified number of steps through the simulation.
    ///
    /// Returns `true` if there could be more pending events and `false` otherwise.
    pub fn steps(&mut self, step_count: u64) -> bool {
        for _ in 0..step_count {
            if !self.step() {
                return false;
            }
        }
        true
    }

    /// Steps through the simulation until no pending events, timers or ready tasks are left.
    ///
    /// This is the join point of a simulation run: when this method returns, every spawned
    /// task has either completed or is suspended on a wait that can never be completed.
    /// The latter indicates a model bug and is reported with a warning.
    pub fn step_until_no_events(&mut self) {
        while self.step() {}
        let pending = self.executor.pending_task_count();
        if pending > 0 {
            warn!(
                target: "simulation",
                "[{:.3} {}  simulation] {} spawned tasks are still pending after the event queue drained",
                self.time(),
                crate::log::get_colored("WARN", colored::Color::Yellow),
                pending,
            );
        }
    }

    // Admits spawned futures and polls ready tasks until no more progress can be made
    // at the current simulation time.
    fn process_tasks(&mut self) -> bool {
        let mut polled = false;
        loop {
            let spawned = self.sim_state.borrow_mut().take_spawned_tasks();
            for future in spawned {
                self.executor.add_task(future);
            }
            if self.executor.poll_next() {
                polled = true;
            } else {
                break;
            }
        }
        polled
    }

    // Hands the event to an awaiting task if there is a matching event promise,
    // otherwise invokes the destination's event handler.
    fn deliver_event(&mut self, event: Event) {
        if log_enabled!(Trace) {
            let src_name = self.lookup_name(event.src);
            let dst_name = self.lookup_name(event.dst);
            trace!(
                target: &dst_name,
                "[{:.3} {} {}] {}",
                event.time,
                crate::log::get_colored("EVENT", colored::Color::BrightBlack),
                dst_name,
                json!({"type": type_name(&event.data).unwrap(), "data": event.data, "src": src_name})
            );
        }
        let event_key = self.sim_state.borrow().key_for(event.data.as_ref());
        if self.sim_state.borrow().has_event_promise_for(&event, event_key) {
            self.sim_state.borrow_mut().complete_event_promise(event, event_key);
            return;
        }
        match self.handlers.get(event.dst as usize) {
            Some(Some(handler)) => {
                handler.borrow_mut().on(event);
            }
            _ => {
                log_undelivered_event(event);
            }
        }
    }
}
