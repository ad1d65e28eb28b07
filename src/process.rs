//! Cooperative process routines.
//!
//! A process is driven by a [`Routine`], an explicit state machine advanced one step at a time by
//! the simulation. Each step either suspends the process until some event fires
//! ([`Step::Wait`], [`Step::WaitAny`]) or terminates it ([`Step::Done`]). Terminating triggers the
//! process event, which resumes the processes waiting on it.

use crate::context::SimulationContext;
use crate::error::SimulationResult;
use crate::event::EventId;

/// Outcome of advancing a routine by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Suspend until the given event fires.
    Wait(EventId),
    /// Suspend until the first of the given events fires.
    ///
    /// The process is resumed once, with the other events left to fire without it.
    WaitAny(Vec<EventId>),
    /// The routine has no more steps.
    Done,
}

impl Step {
    /// Suspends until `event` fires.
    pub fn wait<E: Into<EventId>>(event: E) -> Self {
        Step::Wait(event.into())
    }

    /// Suspends until the first of `events` fires.
    pub fn wait_any<I, E>(events: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EventId>,
    {
        Step::WaitAny(events.into_iter().map(Into::into).collect())
    }
}

/// Computation of a process.
pub trait Routine {
    /// Advances the routine by one step.
    ///
    /// Called once when the process is first popped from the queue, and then once each time the
    /// event it waits on fires. An error aborts the current simulation step.
    fn resume(&mut self, ctx: &SimulationContext) -> SimulationResult<Step>;
}

/// Routine backed by a closure, see [`from_fn`].
pub struct FnRoutine<F>(F);

impl<F> Routine for FnRoutine<F>
where
    F: FnMut(&SimulationContext) -> SimulationResult<Step>,
{
    fn resume(&mut self, ctx: &SimulationContext) -> SimulationResult<Step> {
        (self.0)(ctx)
    }
}

/// Creates a routine from a closure called on every step.
///
/// The closure keeps its own progress between calls:
///
/// ```rust
/// use simproc::{process, Simulation, Step};
///
/// let mut sim = Simulation::new(123);
/// let mut stage = 0;
/// sim.process(process::from_fn(move |ctx| {
///     stage += 1;
///     match stage {
///         1 => Ok(Step::wait(ctx.timeout(5.))),
///         2 => Ok(Step::wait(ctx.timeout(3.))),
///         _ => Ok(Step::Done),
///     }
/// }));
/// sim.run().unwrap();
/// assert_eq!(sim.time(), 8.);
/// ```
pub fn from_fn<F>(f: F) -> FnRoutine<F>
where
    F: FnMut(&SimulationContext) -> SimulationResult<Step>,
{
    FnRoutine(f)
}
