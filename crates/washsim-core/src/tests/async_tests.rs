use std::cell::RefCell;
use std::rc::Rc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde::Serialize;

use crate::async_mode::AwaitResult;
use crate::{Simulation, SimulationContext};

#[derive(Clone, Serialize)]
struct Message {
    payload: u32,
}

#[derive(Clone, Serialize)]
struct Keyed {
    key: u64,
    payload: u32,
}

#[test]
fn test_sleep() {
    let mut sim = Simulation::new(123);
    let ctx = sim.create_context("comp");

    sim.spawn(async move {
        let sleep_time_step = 5.;
        let concurrent_sleeps = 10;

        let start_time = ctx.time();
        assert_eq!(start_time, 0.);

        ctx.sleep(sleep_time_step).await;

        assert_eq!(ctx.time(), sleep_time_step);

        let mut futures = FuturesUnordered::new();
        for i in 0..=concurrent_sleeps {
            futures.push(ctx.sleep(i as f64 * sleep_time_step));
        }

        let mut expected_next_time = sleep_time_step;
        while futures.next().await.is_some() {
            assert_eq!(ctx.time(), expected_next_time);
            expected_next_time += sleep_time_step;
        }

        assert_eq!(ctx.time(), (concurrent_sleeps + 1) as f64 * sleep_time_step);
    });

    sim.step_until_no_events();
}

#[test]
fn test_recv_event_with_timeout() {
    let mut sim = Simulation::new(42);
    let client_ctx = sim.create_context("client");
    let client_id = client_ctx.id();
    let root_ctx = sim.create_context("root");
    let root_id = root_ctx.id();

    sim.spawn(async move {
        root_ctx.emit(Message { payload: 42 }, client_id, 50.);
    });

    sim.spawn(async move {
        let mut res = client_ctx.recv_event_from::<Message>(root_id).with_timeout(10.).await;
        match res {
            AwaitResult::Ok(..) => panic!("expect timeout here"),
            AwaitResult::Timeout { src, timeout, .. } => {
                assert_eq!(src, Some(root_id));
                assert_eq!(timeout, 10.);
                assert_eq!(client_ctx.time(), 10.);
            }
        }

        res = client_ctx.recv_event_from::<Message>(root_id).with_timeout(100.).await;
        match res {
            AwaitResult::Ok(event) => {
                assert_eq!(event.src, root_id);
                assert_eq!(event.data.payload, 42);
                assert_eq!(client_ctx.time(), 50.);
            }
            AwaitResult::Timeout { .. } => panic!("expect ok here"),
        }
    });

    sim.step_until_no_events();
    assert_eq!(sim.time(), 50.);
}

// An event scheduled for exactly the timeout expiration time must win the race.
#[test]
fn test_event_beats_timeout_at_same_time() {
    let mut sim = Simulation::new(42);
    let client_ctx = sim.create_context("client");
    let client_id = client_ctx.id();
    let root_ctx = sim.create_context("root");
    let root_id = root_ctx.id();

    sim.spawn(async move {
        root_ctx.emit(Message { payload: 7 }, client_id, 5.);
    });

    sim.spawn(async move {
        match client_ctx.recv_event_from::<Message>(root_id).with_timeout(5.).await {
            AwaitResult::Ok(event) => {
                assert_eq!(event.time, 5.);
                assert_eq!(event.data.payload, 7);
            }
            AwaitResult::Timeout { .. } => panic!("event must win the tie"),
        }
        assert_eq!(client_ctx.time(), 5.);
    });

    sim.step_until_no_events();
}

// Dropping a timed-out future must withdraw its promise,
// so the same event can be awaited again.
#[test]
fn test_promise_withdrawn_on_future_drop() {
    let mut sim = Simulation::new(42);
    let client_ctx = sim.create_context("client");
    let client_id = client_ctx.id();
    let root_ctx = sim.create_context("root");
    let root_id = root_ctx.id();

    sim.spawn(async move {
        root_ctx.emit(Message { payload: 3 }, client_id, 10.);
    });

    sim.spawn(async move {
        let res = client_ctx.recv_event_from::<Message>(root_id).with_timeout(1.).await;
        assert!(matches!(res, AwaitResult::Timeout { .. }));

        let event = client_ctx.recv_event_from::<Message>(root_id).await;
        assert_eq!(event.data.payload, 3);
        assert_eq!(client_ctx.time(), 10.);
    });

    sim.step_until_no_events();
}

#[test]
#[should_panic(expected = "already exists")]
fn test_duplicate_promise_panics() {
    let mut sim = Simulation::new(42);
    let client_ctx = sim.create_context("client");
    let root_ctx = sim.create_context("root");
    let root_id = root_ctx.id();

    let _first = client_ctx.recv_event_from::<Message>(root_id);
    let _second = client_ctx.recv_event_from::<Message>(root_id);
}

struct KeyedListeners {
    ctx: SimulationContext,
    finished: RefCell<u32>,
}

impl KeyedListeners {
    fn start(self: Rc<Self>) {
        for key in 1..=2 {
            self.ctx.spawn(self.clone().listen(key));
        }
        // delivered in reverse key order to check routing by key
        self.ctx.emit_self(Keyed { key: 2, payload: 20 }, 1.);
        self.ctx.emit_self(Keyed { key: 1, payload: 10 }, 2.);
    }

    async fn listen(self: Rc<Self>, key: u64) {
        let event = self.ctx.recv_event_by_key_from_self::<Keyed>(key).await;
        assert_eq!(event.data.key, key);
        assert_eq!(event.data.payload, (key * 10) as u32);
        *self.finished.borrow_mut() += 1;
    }
}

#[test]
fn test_recv_event_by_key() {
    let mut sim = Simulation::new(42);
    sim.register_key_getter_for::<Keyed>(|e| e.key);

    let listeners = Rc::new(KeyedListeners {
        ctx: sim.create_context("comp"),
        finished: RefCell::new(0),
    });
    listeners.clone().start();

    sim.step_until_no_events();
    assert_eq!(*listeners.finished.borrow(), 2);
    assert_eq!(sim.time(), 2.);
}

#[test]
fn test_spawned_task_starts_at_spawn_time() {
    let mut sim = Simulation::new(42);
    let outer_ctx = sim.create_context("outer");
    let inner_ctx = sim.create_context("inner");

    let started_at = Rc::new(RefCell::new(-1.));
    let started_at_clone = started_at.clone();

    sim.spawn(async move {
        outer_ctx.sleep(3.).await;
        outer_ctx.spawn(async move {
            *started_at_clone.borrow_mut() = inner_ctx.time();
            inner_ctx.sleep(1.).await;
        });
    });

    sim.step_until_no_events();
    assert_eq!(*started_at.borrow(), 3.);
    assert_eq!(sim.time(), 4.);
}
