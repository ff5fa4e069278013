use std::any::TypeId;
use std::cell::RefCell;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::future::Future;
use std::rc::Rc;

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::async_mode::event_future::{EventFuture, EventPromise};
use crate::async_mode::promise_store::EventPromiseStore;
use crate::async_mode::task::BoxedTaskFuture;
use crate::async_mode::timer_future::{TimerFuture, TimerId, TimerPromise};
use crate::async_mode::EventKey;
use crate::component::Id;
use crate::event::{Event, EventData, EventId};
use crate::log::log_incorrect_event;

/// Epsilon to compare floating point values for equality.
pub const EPSILON: f64 = 1e-12;

type KeyGetterFn = Rc<dyn Fn(&dyn EventData) -> EventKey>;

// The next thing the simulation clock advances to:
// either an event delivery or a timer firing.
pub(crate) enum Completion {
    Event(Event),
    Timer(TimerPromise),
}

pub(crate) struct SimulationState {
    clock: f64,
    rand: Pcg64,
    events: BinaryHeap<Event>,
    event_count: u64,

    component_name_to_id: HashMap<String, Id>,
    component_names: Vec<String>,

    event_promises: EventPromiseStore,
    key_getters: HashMap<TypeId, KeyGetterFn>,

    timers: BinaryHeap<TimerPromise>,
    canceled_timers: HashSet<TimerId>,
    timer_count: u64,

    // Futures spawned since the last run loop iteration,
    // admitted to the executor by the run loop.
    spawned_tasks: Vec<BoxedTaskFuture>,
}

impl SimulationState {
    pub fn new(seed: u64) -> Self {
        Self {
            clock: 0.0,
            rand: Pcg64::seed_from_u64(seed),
            events: BinaryHeap::new(),
            event_count: 0,
            component_name_to_id: HashMap::new(),
            component_names: Vec::new(),
            event_promises: EventPromiseStore::new(),
            key_getters: HashMap::new(),
            timers: BinaryHeap::new(),
            canceled_timers: HashSet::new(),
            timer_count: 0,
            spawned_tasks: Vec::new(),
        }
    }

    // Components --------------------------------------------------------------------------------------------------

    pub fn register(&mut self, name: &str) -> Id {
        if let Some(&id) = self.component_name_to_id.get(name) {
            return id;
        }
        let id = self.component_name_to_id.len() as Id;
        self.component_name_to_id.insert(name.to_owned(), id);
        self.component_names.push(name.to_owned());
        id
    }

    pub fn lookup_id(&self, name: &str) -> Id {
        *self.component_name_to_id.get(name).unwrap()
    }

    pub fn lookup_name(&self, id: Id) -> String {
        self.component_names[id as usize].clone()
    }

    // Time and randomness -----------------------------------------------------------------------------------------

    pub fn time(&self) -> f64 {
        self.clock
    }

    pub fn rand(&mut self) -> f64 {
        self.rand.gen_range(0.0..1.0)
    }

    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rand.gen_range(range)
    }

    pub fn sample_from_distribution<T, Dist: Distribution<T>>(&mut self, dist: &Dist) -> T {
        dist.sample(&mut self.rand)
    }

    // Events ------------------------------------------------------------------------------------------------------

    pub fn add_event<T>(&mut self, data: T, src: Id, dst: Id, delay: f64) -> EventId
    where
        T: EventData,
    {
        let event_id = self.event_count;
        let event = Event {
            id: event_id,
            time: self.clock + delay.max(0.),
            src,
            dst,
            data: Box::new(data),
        };
        if delay >= -EPSILON {
            self.events.push(event);
            self.event_count += 1;
            event_id
        } else {
            log_incorrect_event(event, &format!("negative delay {}", delay));
            panic!("Event delay is negative! It is not allowed to add events from the past.");
        }
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    // Returns the next event or fired timer and advances the clock to it.
    // An event scheduled for the same time as a timer is returned first,
    // so a message landing exactly on a waiter's deadline beats the timeout.
    pub fn next_completion(&mut self) -> Option<Completion> {
        self.skip_canceled_timers();
        let event_time = self.events.peek().map(|e| e.time);
        let timer_time = self.timers.peek().map(|t| t.time);
        match (event_time, timer_time) {
            (None, None) => None,
            (Some(_), None) => self.pop_event(),
            (None, Some(_)) => self.pop_timer(),
            (Some(event_time), Some(timer_time)) => {
                if event_time <= timer_time {
                    self.pop_event()
                } else {
                    self.pop_timer()
                }
            }
        }
    }

    fn pop_event(&mut self) -> Option<Completion> {
        let event = self.events.pop().unwrap();
        self.clock = event.time;
        Some(Completion::Event(event))
    }

    fn pop_timer(&mut self) -> Option<Completion> {
        let timer = self.timers.pop().unwrap();
        self.clock = timer.time;
        Some(Completion::Timer(timer))
    }

    fn skip_canceled_timers(&mut self) {
        while let Some(timer) = self.timers.peek() {
            if self.canceled_timers.remove(&timer.id) {
                self.timers.pop();
            } else {
                break;
            }
        }
    }

    // Spawning async tasks ----------------------------------------------------------------------------------------

    pub fn spawn(&mut self, future: impl Future<Output = ()> + 'static) {
        self.spawned_tasks.push(Box::pin(future));
    }

    pub fn take_spawned_tasks(&mut self) -> Vec<BoxedTaskFuture> {
        std::mem::take(&mut self.spawned_tasks)
    }

    // Timers ------------------------------------------------------------------------------------------------------

    pub fn create_timer(&mut self, timeout: f64, sim_state: Rc<RefCell<SimulationState>>) -> TimerFuture {
        let timer_promise = TimerPromise::new(self.timer_count, self.clock + timeout);
        let timer_future = timer_promise.future(sim_state);
        self.timers.push(timer_promise);
        self.timer_count += 1;
        timer_future
    }

    // Called by dropped TimerFuture that was not completed.
    pub fn on_incomplete_timer_future_drop(&mut self, timer_id: TimerId) {
        self.canceled_timers.insert(timer_id);
    }

    // Event futures and promises ----------------------------------------------------------------------------------

    pub fn create_event_future<T: EventData>(
        &mut self,
        dst: Id,
        src: Option<Id>,
        key: Option<EventKey>,
        sim_state: Rc<RefCell<SimulationState>>,
    ) -> EventFuture<T> {
        self.event_promises.ensure_vacant::<T>(dst, key);
        let (promise, future) = EventPromise::contract(sim_state, dst, src, key);
        self.event_promises.insert::<T>(dst, src, key, promise);
        future
    }

    pub fn has_event_promise_for(&self, event: &Event, event_key: Option<EventKey>) -> bool {
        self.event_promises.has_promise_for(event, event_key)
    }

    pub fn complete_event_promise(&mut self, event: Event, event_key: Option<EventKey>) {
        // panics if there is no promise
        let promise = self.event_promises.remove_promise_for(&event, event_key).unwrap();
        promise.complete(event);
    }

    // Called by dropped EventFuture that was not completed.
    pub fn on_incomplete_event_future_drop<T: EventData>(
        &mut self,
        dst: Id,
        src: &Option<Id>,
        event_key: Option<EventKey>,
    ) {
        self.event_promises.remove::<T>(dst, src, event_key);
    }

    // Event key getters -------------------------------------------------------------------------------------------

    pub fn register_key_getter_for<T: EventData>(&mut self, key_getter: impl Fn(&T) -> EventKey + 'static) {
        self.key_getters.insert(
            TypeId::of::<T>(),
            Rc::new(move |raw_data| {
                if let Some(data) = raw_data.downcast_ref::<T>() {
                    key_getter(data)
                } else {
                    panic!(
                        "Key getter for type {} is incorrectly used for type {}",
                        std::any::type_name::<T>(),
                        serde_type_name::type_name(&raw_data).unwrap(),
                    );
                }
            }),
        );
    }

    pub fn key_for(&self, data: &dyn EventData) -> Option<EventKey> {
        self.key_getters.get(&data.type_id()).map(|getter| getter(data))
    }
}
