//! Async mode: processes written as futures.
//!
//! With the `async_mode` feature enabled, [`SimulationContext::spawn`](crate::SimulationContext::spawn)
//! turns a future into a process. The future suspends the process by awaiting
//! [`wait`](crate::SimulationContext::wait) or [`sleep`](crate::SimulationContext::sleep), and the
//! process terminates when the future completes:
//!
//! ```rust
//! use simproc::Simulation;
//!
//! let mut sim = Simulation::new(123);
//! let ctx = sim.create_context("worker");
//! let printer = sim.resource(1);
//! let request = printer.request();
//!
//! let worker = sim.spawn({
//!     let ctx = ctx.clone();
//!     let request = request.clone();
//!     async move {
//!         ctx.sleep(5.).await;
//!         ctx.wait(&request).await;
//!         assert_eq!(ctx.time(), 7.);
//!     }
//! });
//! sim.spawn(async move {
//!     ctx.sleep(7.).await;
//!     request.release().unwrap();
//! });
//!
//! sim.run().unwrap();
//! assert!(sim.is_triggered(worker));
//! ```
//!
//! Under the hood the future is polled with a no-op waker each time the process is resumed. Every
//! event awaited during a poll is recorded, and the process waits on all of them at once: the first
//! one to fire resumes it and the future is polled again. Futures combinators therefore work as
//! expected, e.g. `futures::join!` completes when the last of its events fires and `futures::select!`
//! completes when the first one does.

mod future;
mod routine;

pub use future::EventFuture;
pub(crate) use routine::AsyncRoutine;
