//! Simulation configuration and execution.

use std::cell::RefCell;
use std::rc::Rc;

use colored::Colorize;
use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::distributions::Distribution;
use serde_json::json;

use crate::context::SimulationContext;
use crate::error::{SimulationError, SimulationResult};
use crate::event::{EventId, EventKind, EventStatus, Priority, Process, Timeout};
use crate::process::Step;
use crate::resource::Resource;
use crate::state::{QueueEntry, SimulationState, EPSILON};
use crate::{log_debug, log_trace};

async_mode_enabled!(
    use std::future::Future;
);

/// Represents a simulation, provides methods for its configuration and execution.
///
/// The simulation owns the virtual clock and the event queue. Events fire in the order of their
/// time, then priority, then scheduling order. Firing an event resumes the processes waiting on it,
/// depth-first: a resumed process that terminates resumes its own waiters before the next waiter of
/// the original event.
pub struct Simulation {
    sim_state: Rc<RefCell<SimulationState>>,
    ctx: SimulationContext,
}

impl Simulation {
    /// Creates a new simulation with specified random seed.
    pub fn new(seed: u64) -> Self {
        let sim_state = Rc::new(RefCell::new(SimulationState::new(seed)));
        let ctx = SimulationContext::new(Rc::from("simulation"), sim_state.clone());
        Self { sim_state, ctx }
    }

    /// Creates a new simulation context with specified name.
    pub fn create_context<S: AsRef<str>>(&self, name: S) -> SimulationContext {
        SimulationContext::new(Rc::from(name.as_ref()), self.sim_state.clone())
    }

    /// Returns the context named `simulation` used by the shorthand methods below.
    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.sim_state.borrow().time()
    }

    /// Returns the number of events fired so far.
    pub fn event_count(&self) -> u64 {
        self.sim_state.borrow().event_count()
    }

    /// Returns the number of events in the queue.
    pub fn pending_events(&self) -> usize {
        self.sim_state.borrow().pending_events()
    }

    /// Returns a random float in the range _[0, 1)_ using the simulation-wide random number generator.
    pub fn rand(&mut self) -> f64 {
        self.sim_state.borrow_mut().rand()
    }

    /// Returns a random number in the specified range using the simulation-wide random number generator.
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.sim_state.borrow_mut().gen_range(range)
    }

    /// Returns a random value from the specified distribution using the simulation-wide random number
    /// generator.
    pub fn sample_from_distribution<T, Dist: Distribution<T>>(&mut self, dist: &Dist) -> T {
        self.sim_state.borrow_mut().sample_from_distribution(dist)
    }

    /// See [`SimulationContext::event`].
    pub fn event(&self) -> EventId {
        self.ctx.event()
    }

    /// See [`SimulationContext::schedule`].
    pub fn schedule<E: Into<EventId>>(&self, event: E, priority: Priority, delay: f64) -> SimulationResult<()> {
        self.ctx.schedule(event, priority, delay)
    }

    /// See [`SimulationContext::timeout`].
    pub fn timeout(&self, delay: f64) -> Timeout {
        self.ctx.timeout(delay)
    }

    /// See [`SimulationContext::try_timeout`].
    pub fn try_timeout(&self, delay: f64) -> SimulationResult<Timeout> {
        self.ctx.try_timeout(delay)
    }

    /// See [`SimulationContext::process`].
    pub fn process<R: crate::Routine + 'static>(&self, routine: R) -> Process {
        self.ctx.process(routine)
    }

    /// See [`SimulationContext::resource`].
    pub fn resource(&self, capacity: usize) -> Resource {
        self.ctx.resource(capacity)
    }

    /// See [`SimulationContext::is_triggered`].
    pub fn is_triggered<E: Into<EventId>>(&self, event: E) -> bool {
        self.ctx.is_triggered(event)
    }

    /// See [`SimulationContext::status`].
    pub fn status<E: Into<EventId>>(&self, event: E) -> Option<EventStatus> {
        self.ctx.status(event)
    }

    /// See [`SimulationContext::spawn`].
    #[cfg(feature = "async_mode")]
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) -> Process {
        self.ctx.spawn(future)
    }

    /// Fires the next event, advancing the clock to its time and resuming its waiters.
    ///
    /// Returns `false` if there were no pending events.
    pub fn step(&mut self) -> SimulationResult<bool> {
        let entry = self.sim_state.borrow_mut().pop_entry()?;
        let Some(entry) = entry else {
            return Ok(false);
        };
        self.trace_event(&entry);
        self.resume(entry.event)?;
        Ok(true)
    }

    /// Performs the specified number of steps.
    ///
    /// Returns `true` if there could be more pending events and `false` otherwise.
    pub fn steps(&mut self, step_count: u64) -> SimulationResult<bool> {
        for _ in 0..step_count {
            if !self.step()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Steps until there are no pending events.
    ///
    /// Does not return if the simulation keeps scheduling events forever.
    pub fn run(&mut self) -> SimulationResult<()> {
        while self.step()? {}
        Ok(())
    }

    /// Steps until there are no pending events, same as [`run`](Self::run).
    pub fn step_until_no_events(&mut self) -> SimulationResult<()> {
        self.run()
    }

    /// Fires all events scheduled up to the specified time.
    ///
    /// The clock stays at the time of the last fired event. Returns `true` if there are pending
    /// events left and `false` otherwise.
    pub fn step_until_time(&mut self, time: f64) -> SimulationResult<bool> {
        loop {
            let next = self.sim_state.borrow().peek_time();
            match next {
                Some(next) if next <= time + EPSILON => {
                    self.step()?;
                }
                Some(_) => return Ok(true),
                None => return Ok(false),
            }
        }
    }

    /// Fires all events scheduled within the specified duration from now.
    ///
    /// Returns `true` if there are pending events left and `false` otherwise.
    pub fn step_for_duration(&mut self, duration: f64) -> SimulationResult<bool> {
        let end_time = self.time() + duration;
        self.step_until_time(end_time)
    }

    fn trace_event(&self, entry: &QueueEntry) {
        if ::log::log_enabled!(target: "simulation", ::log::Level::Trace) {
            let (kind, waiters) = {
                let state = self.sim_state.borrow();
                (state.kind(entry.event), state.waiter_count(entry.event))
            };
            ::log::trace!(
                target: "simulation",
                "[{:.3} {} simulation] {}",
                entry.time,
                "EVENT".yellow(),
                json!({
                    "time": entry.time,
                    "event": entry.event,
                    "kind": kind,
                    "priority": entry.priority,
                    "waiters": waiters,
                })
            );
        }
    }

    /// Resumes the popped event and, transitively, everything waiting on it.
    fn resume(&self, event: EventId) -> SimulationResult<()> {
        // (event to resume, fired event it was waiting on)
        let mut stack: Vec<(EventId, Option<EventId>)> = vec![(event, None)];
        while let Some((event, cause)) = stack.pop() {
            let kind = self.sim_state.borrow().kind(event);
            let waiters = match kind {
                Some(EventKind::Process) => match self.advance_process(event, cause)? {
                    Some(waiters) => waiters,
                    None => continue,
                },
                Some(_) if cause.is_none() => self.sim_state.borrow_mut().trigger(event, EventStatus::Scheduled)?,
                Some(_) => {
                    return Err(SimulationError::InvariantViolation(format!(
                        "{} is waiting on {:?} but is not a process",
                        event, cause
                    )))
                }
                None => {
                    return Err(SimulationError::InvariantViolation(format!(
                        "{} is not a live event",
                        event
                    )))
                }
            };
            // reversed, so that waiters are resumed in registration order
            stack.extend(waiters.into_iter().rev().map(|waiter| (waiter, Some(event))));
        }
        Ok(())
    }

    /// Runs one step of the process routine.
    ///
    /// Returns the waiters of the process if it has terminated.
    fn advance_process(&self, process: EventId, cause: Option<EventId>) -> SimulationResult<Option<Vec<EventId>>> {
        let (mut routine, owner) = self.sim_state.borrow_mut().start_process(process, cause)?;
        let ctx = SimulationContext::new(owner, self.sim_state.clone());
        let targets = match routine.resume(&ctx)? {
            Step::Done => {
                let waiters = self.sim_state.borrow_mut().finish_process(process)?;
                log_debug!(ctx, "process {} finished", process);
                return Ok(Some(waiters));
            }
            Step::Wait(event) => vec![event],
            Step::WaitAny(events) => events,
        };
        let listed = targets.iter().map(|event| event.to_string()).collect::<Vec<_>>().join(", ");
        self.sim_state.borrow_mut().suspend_process(process, targets, routine)?;
        log_trace!(ctx, "process {} waits on {}", process, listed);
        Ok(None)
    }
}
