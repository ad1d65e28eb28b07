//! Accessing simulation from user code.

use std::cell::RefCell;
use std::rc::Rc;

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::distributions::Distribution;

use crate::error::SimulationResult;
use crate::event::{EventId, EventKind, EventStatus, Priority, Process, Timeout, DEFAULT_PRIORITY};
use crate::log_debug;
use crate::process::Routine;
use crate::resource::Resource;
use crate::state::SimulationState;

async_mode_enabled!(
    use std::future::Future;

    use crate::async_mode::{AsyncRoutine, EventFuture};
);

/// A named handle to the simulation, used by user code to create events, processes and resources.
///
/// Contexts are cheap to clone and can be moved into process routines. Processes spawned via a
/// context are logged under its name, and the routines of such processes receive a context with the
/// same name on every step.
#[derive(Clone)]
pub struct SimulationContext {
    name: Rc<str>,
    sim_state: Rc<RefCell<SimulationState>>,
}

impl SimulationContext {
    pub(crate) fn new(name: Rc<str>, sim_state: Rc<RefCell<SimulationState>>) -> Self {
        Self { name, sim_state }
    }

    pub(crate) fn sim_state(&self) -> &Rc<RefCell<SimulationState>> {
        &self.sim_state
    }

    /// Returns the context name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.sim_state.borrow().time()
    }

    /// Returns a random float in the range _[0, 1)_ using the simulation-wide random number generator.
    pub fn rand(&self) -> f64 {
        self.sim_state.borrow_mut().rand()
    }

    /// Returns a random number in the specified range using the simulation-wide random number generator.
    pub fn gen_range<T, R>(&self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.sim_state.borrow_mut().gen_range(range)
    }

    /// Returns a random value from the specified distribution using the simulation-wide random number
    /// generator.
    pub fn sample_from_distribution<T, Dist: Distribution<T>>(&self, dist: &Dist) -> T {
        self.sim_state.borrow_mut().sample_from_distribution(dist)
    }

    /// Creates a bare event without computation.
    ///
    /// The event is not scheduled. Pass it to [`schedule`](Self::schedule) to make it fire.
    pub fn event(&self) -> EventId {
        self.sim_state.borrow_mut().create_event(EventKind::Event)
    }

    /// Schedules an event to fire `delay` time units from now.
    ///
    /// Among events firing at the same time, lower `priority` fires first, and events with equal
    /// priority fire in scheduling order. Only events which are neither scheduled nor triggered
    /// can be scheduled. Requests are scheduled by releasing them, passing one here fails with
    /// [`InvariantViolation`](crate::SimulationError::InvariantViolation).
    pub fn schedule<E: Into<EventId>>(&self, event: E, priority: Priority, delay: f64) -> SimulationResult<()> {
        self.sim_state.borrow_mut().schedule(event.into(), priority, delay)
    }

    /// Creates a timeout firing after `delay`.
    ///
    /// # Panics
    ///
    /// Panics if `delay` is negative or NaN, use [`try_timeout`](Self::try_timeout) to get an error instead.
    pub fn timeout(&self, delay: f64) -> Timeout {
        match self.try_timeout(delay) {
            Ok(timeout) => timeout,
            Err(_) => panic!("timeout delay must be non-negative, got {}", delay),
        }
    }

    /// Creates a timeout firing after `delay`.
    ///
    /// Fails with [`InvalidDelay`](crate::SimulationError::InvalidDelay) if `delay` is negative or NaN.
    pub fn try_timeout(&self, delay: f64) -> SimulationResult<Timeout> {
        let id = self.sim_state.borrow_mut().timeout(delay)?;
        Ok(Timeout(id))
    }

    /// Spawns a process driven by the routine.
    ///
    /// The process is scheduled at the current time, its routine makes the first step when the
    /// process is popped from the queue.
    pub fn process<R: Routine + 'static>(&self, routine: R) -> Process {
        let id = {
            let mut state = self.sim_state.borrow_mut();
            let id = state.create_event(EventKind::Process);
            state.add_process(id, self.name.clone(), Box::new(routine));
            state.enqueue(id, DEFAULT_PRIORITY, 0.0);
            id
        };
        log_debug!(self, "spawned process {}", id);
        Process(id)
    }

    /// Creates a resource with the given capacity.
    pub fn resource(&self, capacity: usize) -> Resource {
        Resource::with_capacity(self, capacity)
    }

    /// Checks whether the event has fired.
    pub fn is_triggered<E: Into<EventId>>(&self, event: E) -> bool {
        self.sim_state.borrow().is_triggered(event.into())
    }

    /// Returns the status of the event, or `None` for an unknown event.
    pub fn status<E: Into<EventId>>(&self, event: E) -> Option<EventStatus> {
        self.sim_state.borrow().status(event.into())
    }

    /// Spawns a process driven by the future.
    ///
    /// Inside the future, suspend the process with [`wait`](Self::wait) or [`sleep`](Self::sleep).
    /// Awaiting anything else that is not ready aborts the simulation step with
    /// [`MalformedYield`](crate::SimulationError::MalformedYield).
    #[cfg(feature = "async_mode")]
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) -> Process {
        let id = {
            let mut state = self.sim_state.borrow_mut();
            let id = state.create_event(EventKind::Process);
            state.add_process(id, self.name.clone(), Box::new(AsyncRoutine::new(id, future)));
            state.enqueue(id, DEFAULT_PRIORITY, 0.0);
            id
        };
        log_debug!(self, "spawned async process {}", id);
        Process(id)
    }

    /// Returns a future completing once the event has fired.
    ///
    /// Completes immediately for an event which has already fired.
    #[cfg(feature = "async_mode")]
    pub fn wait<E: Into<EventId>>(&self, event: E) -> EventFuture {
        EventFuture::new(event.into(), self.sim_state.clone())
    }

    /// Returns a future completing after `delay`, a shorthand for waiting on a timeout.
    ///
    /// # Panics
    ///
    /// Panics if `delay` is negative or NaN.
    #[cfg(feature = "async_mode")]
    pub fn sleep(&self, delay: f64) -> EventFuture {
        let timeout = self.timeout(delay);
        self.wait(timeout)
    }
}
