#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use simproc::{process, EventId, Process, Simulation, Step};

pub type Journal = Rc<RefCell<Vec<(&'static str, f64)>>>;

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}

/// Spawns a process which waits on the event and records `label` with the time it was resumed.
pub fn watch<E: Into<EventId>>(sim: &Simulation, event: E, label: &'static str, journal: &Journal) -> Process {
    let event = event.into();
    let journal = journal.clone();
    let mut waiting = false;
    sim.process(process::from_fn(move |ctx| {
        if !waiting {
            waiting = true;
            return Ok(Step::Wait(event));
        }
        journal.borrow_mut().push((label, ctx.time()));
        Ok(Step::Done)
    }))
}

pub fn labels(journal: &Journal) -> Vec<&'static str> {
    journal.borrow().iter().map(|(label, _)| *label).collect()
}
