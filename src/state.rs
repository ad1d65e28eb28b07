use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::BinaryHeap;
use std::rc::Rc;

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::distributions::Distribution;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rustc_hash::FxHashMap;

use crate::error::{SimulationError, SimulationResult};
use crate::event::{EventId, EventKind, EventStatus, Priority, DEFAULT_PRIORITY, RELEASE_PRIORITY};
use crate::process::Routine;
use crate::resource::ResourceId;

/// Epsilon to compare floating point values for equality.
pub const EPSILON: f64 = 1e-12;

/// Entry of the event queue.
///
/// Ordered by `(time, priority, seq)` and reversed, so that the max-heap `BinaryHeap` pops the
/// earliest entry first.
#[derive(Clone, Debug)]
pub(crate) struct QueueEntry {
    pub time: f64,
    pub priority: Priority,
    pub seq: u64,
    pub event: EventId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.priority.cmp(&self.priority))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct EventRecord {
    kind: EventKind,
    status: EventStatus,
    waiters: Vec<EventId>,
}

struct ProcessSlot {
    owner: Rc<str>,
    // Taken out while the routine runs.
    routine: Option<Box<dyn Routine>>,
    // Events the suspended process is registered on, the first one to fire resumes it.
    waiting_on: Vec<EventId>,
}

struct ResourceState {
    capacity: usize,
    pending: Vec<EventId>,
}

/// State shared by the simulation and all its contexts.
///
/// Records of triggered events are dropped, an identifier below `next_event_id` without a record
/// is therefore a triggered event.
pub(crate) struct SimulationState {
    clock: f64,
    rand: Pcg64,
    queue: BinaryHeap<QueueEntry>,
    events: FxHashMap<EventId, EventRecord>,
    processes: FxHashMap<EventId, ProcessSlot>,
    resources: Vec<ResourceState>,
    next_event_id: EventId,
    queue_seq: u64,
    event_count: u64,
    #[cfg(feature = "async_mode")]
    awaited: Vec<EventId>,
}

impl SimulationState {
    pub fn new(seed: u64) -> Self {
        Self {
            clock: 0.0,
            rand: Pcg64::seed_from_u64(seed),
            queue: BinaryHeap::new(),
            events: FxHashMap::default(),
            processes: FxHashMap::default(),
            resources: Vec::new(),
            next_event_id: EventId::new(0),
            queue_seq: 0,
            event_count: 0,
            #[cfg(feature = "async_mode")]
            awaited: Vec::new(),
        }
    }

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

    // Events --------------------------------------------------------------------------------------

    pub fn create_event(&mut self, kind: EventKind) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = id.next();
        self.events.insert(
            id,
            EventRecord {
                kind,
                status: EventStatus::Created,
                waiters: Vec::new(),
            },
        );
        id
    }

    pub fn kind(&self, event: EventId) -> Option<EventKind> {
        self.events.get(&event).map(|record| record.kind)
    }

    pub fn status(&self, event: EventId) -> Option<EventStatus> {
        match self.events.get(&event) {
            Some(record) => Some(record.status),
            None if event < self.next_event_id => Some(EventStatus::Triggered),
            None => None,
        }
    }

    pub fn is_triggered(&self, event: EventId) -> bool {
        self.status(event) == Some(EventStatus::Triggered)
    }

    pub fn waiter_count(&self, event: EventId) -> usize {
        self.events.get(&event).map_or(0, |record| record.waiters.len())
    }

    /// Removes the record of a fired event and returns its waiters in registration order.
    pub fn trigger(&mut self, event: EventId, expected: EventStatus) -> SimulationResult<Vec<EventId>> {
        match self.events.entry(event) {
            Entry::Occupied(record) if record.get().status == expected => Ok(record.remove().waiters),
            Entry::Occupied(record) => Err(unexpected_status(event, record.get().status, expected)),
            Entry::Vacant(_) => Err(SimulationError::InvariantViolation(format!(
                "{} is not a live event",
                event
            ))),
        }
    }

    // Queue ---------------------------------------------------------------------------------------

    /// Schedules an event created but not yet scheduled.
    ///
    /// Requests are scheduled only by [`release`](Self::release).
    pub fn schedule(&mut self, event: EventId, priority: Priority, delay: f64) -> SimulationResult<()> {
        check_delay(delay)?;
        if let Some(EventKind::Request { resource }) = self.kind(event) {
            return Err(SimulationError::InvariantViolation(format!(
                "request {} can only be scheduled by releasing it in resource {}",
                event, resource
            )));
        }
        self.check_schedulable(event)?;
        self.enqueue(event, priority, delay);
        Ok(())
    }

    /// Creates a timeout and schedules it with the default priority.
    pub fn timeout(&mut self, delay: f64) -> SimulationResult<EventId> {
        check_delay(delay)?;
        let id = self.create_event(EventKind::Timeout);
        self.enqueue(id, DEFAULT_PRIORITY, delay);
        Ok(id)
    }

    fn check_schedulable(&self, event: EventId) -> SimulationResult<()> {
        match self.status(event) {
            Some(EventStatus::Created) => Ok(()),
            Some(status) => Err(SimulationError::InvariantViolation(format!(
                "cannot schedule {} with status {:?}",
                event, status
            ))),
            None => Err(SimulationError::InvariantViolation(format!(
                "cannot schedule unknown event {}",
                event
            ))),
        }
    }

    /// Pushes the event into the queue without checks, the caller guarantees a fresh event and a
    /// valid delay.
    pub fn enqueue(&mut self, event: EventId, priority: Priority, delay: f64) {
        if let Some(record) = self.events.get_mut(&event) {
            record.status = EventStatus::Scheduled;
        }
        self.queue.push(QueueEntry {
            time: self.clock + delay,
            priority,
            seq: self.queue_seq,
            event,
        });
        self.queue_seq += 1;
    }

    /// Pops the earliest entry and advances the clock to its time.
    pub fn pop_entry(&mut self) -> SimulationResult<Option<QueueEntry>> {
        let Some(entry) = self.queue.pop() else {
            return Ok(None);
        };
        if entry.time < self.clock {
            return Err(SimulationError::InvariantViolation(format!(
                "popped {} at time {} while the clock is at {}",
                entry.event, entry.time, self.clock
            )));
        }
        self.clock = entry.time;
        self.event_count += 1;
        Ok(Some(entry))
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.queue.peek().map(|entry| entry.time)
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    // Processes -----------------------------------------------------------------------------------

    pub fn add_process(&mut self, process: EventId, owner: Rc<str>, routine: Box<dyn Routine>) {
        self.processes.insert(
            process,
            ProcessSlot {
                owner,
                routine: Some(routine),
                waiting_on: Vec::new(),
            },
        );
    }

    /// Takes the routine of a process out of its slot and marks the process as running.
    ///
    /// A process popped from the queue must be scheduled, a process woken up by `cause` must be
    /// waiting on it. The process is unregistered from the other events it was waiting on.
    pub fn start_process(
        &mut self,
        process: EventId,
        cause: Option<EventId>,
    ) -> SimulationResult<(Box<dyn Routine>, Rc<str>)> {
        let status = self.events.get(&process).map(|record| record.status).ok_or_else(|| {
            SimulationError::InvariantViolation(format!("{} is not a live process", process))
        })?;
        let slot = self.processes.get_mut(&process).ok_or_else(|| {
            SimulationError::InvariantViolation(format!("{} has no routine", process))
        })?;
        let resumable = match cause {
            None => status == EventStatus::Scheduled,
            Some(event) => matches!(status, EventStatus::Waiting(_)) && slot.waiting_on.contains(&event),
        };
        if !resumable {
            return Err(SimulationError::InvariantViolation(format!(
                "{} with status {:?} cannot be resumed by {:?}",
                process, status, cause
            )));
        }
        let routine = slot.routine.take().ok_or_else(|| {
            SimulationError::InvariantViolation(format!("routine of {} is already running", process))
        })?;
        let owner = slot.owner.clone();
        let waiting_on = std::mem::take(&mut slot.waiting_on);

        for target in waiting_on {
            if Some(target) == cause {
                continue;
            }
            if let Some(record) = self.events.get_mut(&target) {
                record.waiters.retain(|waiter| *waiter != process);
            }
        }
        if let Some(record) = self.events.get_mut(&process) {
            record.status = EventStatus::Running;
        }
        Ok((routine, owner))
    }

    /// Registers the process as a waiter of each target and stores its routine until one of them
    /// fires.
    ///
    /// Nothing is registered if any of the targets is invalid.
    pub fn suspend_process(
        &mut self,
        process: EventId,
        targets: Vec<EventId>,
        routine: Box<dyn Routine>,
    ) -> SimulationResult<()> {
        let mut unique: Vec<EventId> = Vec::with_capacity(targets.len());
        for target in targets {
            if !unique.contains(&target) {
                unique.push(target);
            }
        }
        let Some(&first) = unique.first() else {
            return Err(SimulationError::MalformedYield {
                process,
                yielded: None,
                reason: "no events to wait on",
            });
        };
        for &target in &unique {
            let malformed = |reason| SimulationError::MalformedYield {
                process,
                yielded: Some(target),
                reason,
            };
            if target == process {
                return Err(malformed("process cannot wait on itself"));
            }
            if !self.events.contains_key(&target) {
                if target < self.next_event_id {
                    return Err(malformed("event has already been triggered"));
                }
                return Err(malformed("unknown event"));
            }
        }

        for &target in &unique {
            if let Some(record) = self.events.get_mut(&target) {
                record.waiters.push(process);
            }
        }
        if let Some(record) = self.events.get_mut(&process) {
            record.status = EventStatus::Waiting(first);
        }
        if let Some(slot) = self.processes.get_mut(&process) {
            slot.routine = Some(routine);
            slot.waiting_on = unique;
        }
        Ok(())
    }

    /// Drops the routine of a terminated process and triggers the process event.
    pub fn finish_process(&mut self, process: EventId) -> SimulationResult<Vec<EventId>> {
        self.processes.remove(&process);
        self.trigger(process, EventStatus::Running)
    }

    #[cfg(feature = "async_mode")]
    pub fn await_event(&mut self, event: EventId) {
        if !self.awaited.contains(&event) {
            self.awaited.push(event);
        }
    }

    #[cfg(feature = "async_mode")]
    pub fn take_awaited(&mut self) -> Vec<EventId> {
        std::mem::take(&mut self.awaited)
    }

    // Resources -----------------------------------------------------------------------------------

    pub fn add_resource(&mut self, capacity: usize) -> ResourceId {
        self.resources.push(ResourceState {
            capacity,
            pending: Vec::new(),
        });
        self.resources.len() - 1
    }

    pub fn capacity(&self, resource: ResourceId) -> usize {
        self.resources[resource].capacity
    }

    pub fn pending_requests(&self, resource: ResourceId) -> usize {
        self.resources[resource].pending.len()
    }

    pub fn is_pending(&self, resource: ResourceId, request: EventId) -> bool {
        self.resources[resource].pending.contains(&request)
    }

    /// Creates a request and appends it to the pending queue of the resource.
    pub fn request(&mut self, resource: ResourceId) -> EventId {
        let request = self.create_event(EventKind::Request { resource });
        self.resources[resource].pending.push(request);
        request
    }

    /// Removes a pending request from the resource and schedules it at the current time.
    ///
    /// The resource is left untouched on failure.
    pub fn release(&mut self, resource: ResourceId, request: EventId) -> SimulationResult<()> {
        let pos = self.resources[resource]
            .pending
            .iter()
            .position(|pending_request| *pending_request == request)
            .ok_or(SimulationError::NotFound { request, resource })?;
        self.check_schedulable(request)?;
        self.resources[resource].pending.remove(pos);
        self.enqueue(request, RELEASE_PRIORITY, 0.0);
        Ok(())
    }
}

fn check_delay(delay: f64) -> SimulationResult<()> {
    if delay.is_nan() || delay < 0.0 {
        return Err(SimulationError::InvalidDelay(delay));
    }
    Ok(())
}

fn unexpected_status(event: EventId, actual: EventStatus, expected: EventStatus) -> SimulationError {
    SimulationError::InvariantViolation(format!(
        "{} has status {:?}, expected {:?}",
        event, actual, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(time: f64, priority: Priority, seq: u64) -> QueueEntry {
        QueueEntry {
            time,
            priority,
            seq,
            event: EventId::new(seq),
        }
    }

    fn drain(state: &mut SimulationState) -> Vec<(f64, EventId)> {
        let mut fired = Vec::new();
        while let Some(entry) = state.pop_entry().unwrap() {
            fired.push((entry.time, entry.event));
        }
        fired
    }

    #[test]
    fn test_entry_ordering() {
        // reversed: the earliest entry is the greatest
        assert!(entry(1., 1, 5) > entry(2., 0, 0));
        assert!(entry(1., 0, 5) > entry(1., 1, 0));
        assert!(entry(1., 1, 0) > entry(1., 1, 1));
    }

    #[test]
    fn test_pop_order() {
        let mut state = SimulationState::new(123);
        let late = state.create_event(EventKind::Event);
        let same_time_low = state.create_event(EventKind::Event);
        let same_time_high = state.create_event(EventKind::Event);
        let same_time_low_second = state.create_event(EventKind::Event);
        let early = state.create_event(EventKind::Event);

        state.schedule(late, DEFAULT_PRIORITY, 10.).unwrap();
        state.schedule(same_time_low, DEFAULT_PRIORITY, 5.).unwrap();
        state.schedule(same_time_high, RELEASE_PRIORITY, 5.).unwrap();
        state.schedule(same_time_low_second, DEFAULT_PRIORITY, 5.).unwrap();
        state.schedule(early, DEFAULT_PRIORITY, 1.).unwrap();

        let fired = drain(&mut state);
        assert_eq!(
            fired,
            vec![
                (1., early),
                (5., same_time_high),
                (5., same_time_low),
                (5., same_time_low_second),
                (10., late)
            ]
        );
        assert_eq!(state.time(), 10.);
        assert_eq!(state.event_count(), 5);
    }

    #[test]
    fn test_schedule_rejects_invalid_delay() {
        let mut state = SimulationState::new(123);
        let event = state.create_event(EventKind::Event);
        assert_eq!(
            state.schedule(event, DEFAULT_PRIORITY, -1.),
            Err(SimulationError::InvalidDelay(-1.))
        );
        assert!(matches!(
            state.schedule(event, DEFAULT_PRIORITY, f64::NAN),
            Err(SimulationError::InvalidDelay(_))
        ));
        assert_eq!(state.status(event), Some(EventStatus::Created));
        assert_eq!(state.pending_events(), 0);
    }

    #[test]
    fn test_schedule_twice() {
        let mut state = SimulationState::new(123);
        let event = state.create_event(EventKind::Event);
        state.schedule(event, DEFAULT_PRIORITY, 0.).unwrap();
        assert!(matches!(
            state.schedule(event, DEFAULT_PRIORITY, 0.),
            Err(SimulationError::InvariantViolation(_))
        ));
        assert!(matches!(
            state.schedule(EventId::new(100), DEFAULT_PRIORITY, 0.),
            Err(SimulationError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_trigger_drops_record() {
        let mut state = SimulationState::new(123);
        let event = state.create_event(EventKind::Timeout);
        state.schedule(event, DEFAULT_PRIORITY, 2.).unwrap();
        assert_eq!(state.status(event), Some(EventStatus::Scheduled));

        let entry = state.pop_entry().unwrap().unwrap();
        let waiters = state.trigger(entry.event, EventStatus::Scheduled).unwrap();
        assert!(waiters.is_empty());
        assert!(state.is_triggered(event));
        assert_eq!(state.kind(event), None);
        assert!(state.trigger(event, EventStatus::Scheduled).is_err());
        assert_eq!(state.status(EventId::new(42)), None);
    }

    #[test]
    fn test_release_moves_request_to_queue() {
        let mut state = SimulationState::new(123);
        let resource = state.add_resource(1);
        let first = state.request(resource);
        let second = state.request(resource);
        assert_eq!(state.pending_requests(resource), 2);
        assert_eq!(state.pending_events(), 0);

        state.release(resource, second).unwrap();
        assert!(state.is_pending(resource, first));
        assert!(!state.is_pending(resource, second));
        assert_eq!(state.status(second), Some(EventStatus::Scheduled));
        assert_eq!(
            state.release(resource, second),
            Err(SimulationError::NotFound {
                request: second,
                resource
            })
        );
    }

    #[test]
    fn test_request_is_scheduled_only_by_release() {
        let mut state = SimulationState::new(123);
        let resource = state.add_resource(1);
        let request = state.request(resource);

        assert!(matches!(
            state.schedule(request, DEFAULT_PRIORITY, 1.),
            Err(SimulationError::InvariantViolation(_))
        ));
        assert_eq!(state.status(request), Some(EventStatus::Created));
        assert!(state.is_pending(resource, request));
        assert_eq!(state.pending_events(), 0);

        state.release(resource, request).unwrap();
        assert_eq!(state.status(request), Some(EventStatus::Scheduled));
    }

    #[test]
    fn test_timeout_rejects_invalid_delay() {
        let mut state = SimulationState::new(123);
        assert_eq!(state.timeout(-2.), Err(SimulationError::InvalidDelay(-2.)));
        assert_eq!(state.pending_events(), 0);
        let timeout = state.timeout(2.).unwrap();
        assert_eq!(state.status(timeout), Some(EventStatus::Scheduled));
    }

    #[test]
    fn test_resumed_process_leaves_other_waiter_lists() {
        struct Idle;
        impl Routine for Idle {
            fn resume(&mut self, _ctx: &crate::SimulationContext) -> SimulationResult<crate::Step> {
                Ok(crate::Step::Done)
            }
        }

        let mut state = SimulationState::new(123);
        let first = state.create_event(EventKind::Event);
        let second = state.create_event(EventKind::Event);
        let process = state.create_event(EventKind::Process);
        state.add_process(process, Rc::from("idle"), Box::new(Idle));
        state.enqueue(process, DEFAULT_PRIORITY, 0.);
        let (routine, _) = state.start_process(process, None).unwrap();

        assert!(matches!(
            state.suspend_process(process, vec![first, EventId::new(100)], Box::new(Idle)),
            Err(SimulationError::MalformedYield {
                reason: "unknown event",
                ..
            })
        ));
        assert_eq!(state.waiter_count(first), 0);

        state
            .suspend_process(process, vec![second, first, second], routine)
            .unwrap();
        assert_eq!(state.status(process), Some(EventStatus::Waiting(second)));
        assert_eq!(state.waiter_count(first), 1);
        assert_eq!(state.waiter_count(second), 1);

        state.start_process(process, Some(first)).unwrap();
        assert_eq!(state.waiter_count(second), 0);
        assert_eq!(state.status(process), Some(EventStatus::Running));
    }

    #[test]
    fn test_same_seed_same_numbers() {
        let mut a = SimulationState::new(42);
        let mut b = SimulationState::new(42);
        for _ in 0..10 {
            assert_eq!(a.gen_range(0..1000), b.gen_range(0..1000));
        }
        assert_eq!(a.rand(), b.rand());
    }
}
