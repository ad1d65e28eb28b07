#![cfg(feature = "async_mode")]

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use futures::{join, select, FutureExt};

use simproc::{Simulation, SimulationError};

use common::{init_logger, labels, watch, Journal};

#[test]
fn test_sleep_sequence() {
    init_logger();
    let mut sim = Simulation::new(123);
    let ctx = sim.create_context("sleeper");
    let times = Rc::new(RefCell::new(Vec::new()));

    let recorded = times.clone();
    let sleeper = sim.spawn(async move {
        ctx.sleep(5.).await;
        recorded.borrow_mut().push(ctx.time());
        ctx.sleep(3.).await;
        recorded.borrow_mut().push(ctx.time());
    });

    sim.run().unwrap();
    assert_eq!(*times.borrow(), vec![5., 8.]);
    assert!(sim.is_triggered(sleeper));
    assert_eq!(sim.time(), 8.);
}

#[test]
fn test_wait_for_released_request() {
    init_logger();
    let mut sim = Simulation::new(123);
    let ctx = sim.create_context("client");
    let resource = sim.resource(1);
    let request = resource.request();
    let served_at = Rc::new(RefCell::new(None));

    let served = served_at.clone();
    let waiting = request.clone();
    sim.spawn(async move {
        ctx.wait(&waiting).await;
        *served.borrow_mut() = Some(ctx.time());
    });
    let ctx = sim.create_context("server");
    sim.spawn(async move {
        ctx.sleep(4.).await;
        request.release().unwrap();
    });

    sim.run().unwrap();
    assert_eq!(*served_at.borrow(), Some(4.));
    assert_eq!(resource.pending_count(), 0);
}

#[test]
fn test_join_waits_for_all_events() {
    init_logger();
    let mut sim = Simulation::new(123);
    let ctx = sim.create_context("joiner");

    let joiner = sim.spawn(async move {
        let short = ctx.sleep(3.);
        let long = ctx.sleep(5.);
        join!(long, short);
        assert_eq!(ctx.time(), 5.);
    });

    sim.run().unwrap();
    assert!(sim.is_triggered(joiner));
    assert_eq!(sim.time(), 5.);
}

#[test]
fn test_select_completes_on_first_event() {
    init_logger();
    let mut sim = Simulation::new(123);
    let ctx = sim.create_context("selector");
    let completed_at = Rc::new(RefCell::new(None));

    let completed = completed_at.clone();
    let selector = sim.spawn(async move {
        let mut long = ctx.sleep(10.).fuse();
        let mut short = ctx.sleep(2.).fuse();
        select! {
            _ = long => {},
            _ = short => {},
        }
        *completed.borrow_mut() = Some(ctx.time());
    });

    sim.run().unwrap();
    assert_eq!(*completed_at.borrow(), Some(2.));
    assert!(sim.is_triggered(selector));
    assert_eq!(sim.time(), 10.);
}

#[test]
fn test_waiting_on_triggered_event_completes_immediately() {
    init_logger();
    let mut sim = Simulation::new(123);
    let ctx = sim.create_context("late");
    let early = sim.timeout(1.);

    sim.spawn(async move {
        ctx.sleep(2.).await;
        ctx.wait(early).await;
        assert_eq!(ctx.time(), 2.);
    });

    sim.run().unwrap();
    assert_eq!(sim.time(), 2.);
}

#[test]
fn test_callback_process_joins_async_process() {
    init_logger();
    let mut sim = Simulation::new(123);
    let ctx = sim.create_context("worker");
    let journal = Journal::default();

    let worker = sim.spawn(async move {
        ctx.sleep(6.).await;
    });
    watch(&sim, worker, "joined", &journal);

    sim.run().unwrap();
    assert_eq!(labels(&journal), vec!["joined"]);
    assert_eq!(journal.borrow()[0].1, 6.);
}

#[test]
fn test_foreign_pending_future_is_malformed() {
    init_logger();
    let mut sim = Simulation::new(123);

    let stuck = sim.spawn(futures::future::pending::<()>());

    assert_eq!(
        sim.run(),
        Err(SimulationError::MalformedYield {
            process: stuck.id(),
            yielded: None,
            reason: "future is pending on something other than a simulation event",
        })
    );
}
