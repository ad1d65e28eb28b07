//! simproc is a discrete-event simulation engine built around cooperative _processes_. A process is a
//! routine that runs in steps and suspends between them while waiting for simulated time to pass or
//! for a shared _resource_ to become available. The engine advances a virtual clock by jumping from
//! one scheduled event to the next, so simulated hours cost no more than simulated milliseconds.
//!
//! ## Contents
//!
//! - [Basic Concepts](crate#basic-concepts)
//! - [Example](crate#example)
//! - [Ordering Guarantees](crate#ordering-guarantees)
//! - [Errors](crate#errors)
//! - [Async Mode](crate#async-mode)
//!
//! ## Basic Concepts
//!
//! **Event.** An event is a point in simulated time with a list of _waiters_, the processes to resume
//! when it fires. Every event fires at most once. Events come in several kinds:
//!
//! - a [`Timeout`] represents pure delay and is scheduled as soon as it is created;
//! - a [`Process`] is driven by a [`Routine`] and fires when the routine terminates, so processes can
//!   wait on each other;
//! - a [`Request`] is a claim on a [`Resource`] and fires only once it is released;
//! - a bare event created via [`SimulationContext::event`] fires when passed to
//!   [`SimulationContext::schedule`].
//!
//! **Process.** A routine is an explicit state machine. The simulation calls
//! [`Routine::resume`] once when the process starts and once every time the event it waits on
//! fires. Each call returns either [`Step::Wait`] with the next event to wait on, [`Step::WaitAny`]
//! with several events of which the first to fire resumes the process, or [`Step::Done`].
//! Closures can be turned into routines with [`process::from_fn`].
//!
//! **Resource.** A resource keeps the requests made to it in a FIFO pending queue. Making a request
//! does not block by itself: the process yields the request to suspend until some code releases
//! it via [`Request::release`] or [`Resource::release`]. The capacity of a resource is recorded but
//! not enforced, requests beyond it are accepted.
//!
//! **Simulation.** [`Simulation`] owns the clock and the event queue. It hands out named
//! [`SimulationContext`] handles which user code keeps to create events, processes and resources.
//! [`Simulation::run`] fires events until the queue is empty, while [`Simulation::step`],
//! [`Simulation::steps`] and [`Simulation::step_until_time`] allow precise stepping. The simulation is
//! created with a random seed used by the simulation-wide random number generator, so stochastic
//! models stay deterministic.
//!
//! ## Example
//!
//! Two customers compete for a single clerk. The clerk process serves the line by releasing the
//! request of the first customer in it, and each customer waits on its own request.
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::collections::VecDeque;
//! use std::rc::Rc;
//! use simproc::{process, Request, Simulation, Step};
//!
//! let mut sim = Simulation::new(123);
//! let clerk = sim.resource(1);
//! let line: Rc<RefCell<VecDeque<Request>>> = Rc::default();
//!
//! for (name, arrival) in [("alice", 1.), ("bob", 2.)] {
//!     let ctx = sim.create_context(name);
//!     let clerk = clerk.clone();
//!     let line = line.clone();
//!     let mut stage = 0;
//!     ctx.process(process::from_fn(move |ctx| {
//!         stage += 1;
//!         match stage {
//!             // walk to the counter
//!             1 => Ok(Step::wait(ctx.timeout(arrival))),
//!             // join the line and wait to be served
//!             2 => {
//!                 let request = clerk.request();
//!                 line.borrow_mut().push_back(request.clone());
//!                 Ok(Step::wait(request))
//!             }
//!             _ => {
//!                 println!("{} served at {}", ctx.name(), ctx.time());
//!                 Ok(Step::Done)
//!             }
//!         }
//!     }));
//! }
//!
//! let mut served = 0;
//! sim.process(process::from_fn(move |ctx| {
//!     if let Some(request) = line.borrow_mut().pop_front() {
//!         request.release()?;
//!         served += 1;
//!     }
//!     if served == 2 {
//!         return Ok(Step::Done);
//!     }
//!     // serving takes 5 time units, checking an empty line takes 1
//!     Ok(Step::wait(ctx.timeout(if served == 0 { 1. } else { 5. })))
//! }));
//!
//! sim.run().unwrap();
//! assert_eq!(sim.time(), 6.);
//! ```
//!
//! ## Ordering Guarantees
//!
//! The simulation is single-threaded and deterministic. Events fire in the order of their time, then
//! their priority (lower first), then the order in which they were scheduled. Timeouts and processes
//! use [`DEFAULT_PRIORITY`], released requests use [`RELEASE_PRIORITY`] and therefore fire before
//! anything else scheduled for the same time. When an event fires, its waiters are resumed in
//! registration order, depth-first: if a resumed process terminates, its own waiters are resumed
//! before the remaining waiters of the original event.
//!
//! There is no cancellation: scheduled events cannot be unscheduled and waiters cannot be
//! deregistered.
//!
//! ## Errors
//!
//! Fallible operations return [`SimulationError`]. Releasing a request which is not pending fails
//! with [`SimulationError::NotFound`] at the call site. A routine yielding something that is not a
//! live event, e.g. an event that has already fired, fails the current step with
//! [`SimulationError::MalformedYield`]. Such errors, as well as errors returned by routines
//! themselves, abort [`Simulation::run`].
//!
//! ## Async Mode
//!
//! With the `async_mode` feature enabled, processes can also be written as futures spawned via
//! [`SimulationContext::spawn`], which wait on events with
//! [`wait`](SimulationContext::wait) and [`sleep`](SimulationContext::sleep). See the
//! `async_mode` module for details.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

#[macro_use]
mod macros;

pub mod context;
pub mod error;
pub mod event;
pub mod log;
pub mod process;
pub mod resource;
pub mod simulation;
mod state;

async_mode_enabled!(
    pub mod async_mode;
);

pub use colored;
pub use context::SimulationContext;
pub use error::{SimulationError, SimulationResult};
pub use event::{EventId, EventKind, EventStatus, Priority, Process, Timeout, DEFAULT_PRIORITY, RELEASE_PRIORITY};
pub use process::{Routine, Step};
pub use resource::{Request, Resource, ResourceId, DEFAULT_CAPACITY};
pub use simulation::Simulation;
pub use state::EPSILON;

async_mode_enabled!(
    pub use async_mode::EventFuture;
);

#[doc(hidden)]
pub use ::log as __log;
