//! Task list and state machine driver
//!
//! The manager does not own tasks or states. They are lent to it once at
//! setup and then referred to by handle. The active task list is a slice
//! of task handles owned by the caller, which can be swapped in and out to
//! change the set of running tasks in one step.

use core::cell::Cell;
use core::fmt;

use rtl_core::{Event, RtlError, RtlResult};
use rtl_events::{EventDispatch, EventQueue};

use crate::lifecycle::{ManagedState, ManagedTask};
use crate::{DEFAULT_MAX_STATES, DEFAULT_MAX_TASKS};

/// Handle of a task registered with a [`TaskManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u8);

impl TaskHandle {
    /// Get the raw index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a state registered with a [`TaskManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateHandle(u8);

impl StateHandle {
    /// Get the raw index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

impl fmt::Display for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskHandle {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "task#{=u8}", self.0);
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StateHandle {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "state#{=u8}", self.0);
    }
}

/// Mailbox a state uses to pick the next current state
///
/// States cannot reach the manager while it runs them, so they hold a
/// shared reference to this instead. The manager applies the latest
/// request at the end of [`TaskManager::dispatch`].
#[derive(Debug, Default)]
pub struct StateRequest {
    next: Cell<Option<StateHandle>>,
}

impl StateRequest {
    pub const fn new() -> Self {
        Self { next: Cell::new(None) }
    }

    /// Ask for `state` to become current; a later request replaces it
    pub fn request_state(&self, state: StateHandle) {
        self.next.set(Some(state));
    }

    pub fn pending(&self) -> Option<StateHandle> {
        self.next.get()
    }

    pub fn take(&self) -> Option<StateHandle> {
        self.next.take()
    }
}

/// What happens to tasks when the task list is swapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskListSwitch {
    /// Resume every task of the incoming list
    pub auto_resume: bool,
    /// Suspend every task of the outgoing list first
    pub auto_suspend: bool,
}

impl TaskListSwitch {
    pub const fn new() -> Self {
        Self {
            auto_resume: true,
            auto_suspend: true,
        }
    }

    pub const fn auto_resume(mut self, enabled: bool) -> Self {
        self.auto_resume = enabled;
        self
    }

    pub const fn auto_suspend(mut self, enabled: bool) -> Self {
        self.auto_suspend = enabled;
        self
    }
}

impl Default for TaskListSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the active task list and the current state once per tick
pub struct TaskManager<
    'a,
    const TASKS: usize = DEFAULT_MAX_TASKS,
    const STATES: usize = DEFAULT_MAX_STATES,
> {
    tasks: [Option<&'a mut dyn ManagedTask>; TASKS],
    task_count: usize,
    states: [Option<&'a mut dyn ManagedState>; STATES],
    state_count: usize,
    task_list: &'a [TaskHandle],
    current_state: Option<StateHandle>,
    state_request: Option<&'a StateRequest>,
}

impl<'a, const TASKS: usize, const STATES: usize> TaskManager<'a, TASKS, STATES> {
    /// Create a manager with an empty task list and no current state
    pub fn new() -> Self {
        Self {
            tasks: core::array::from_fn(|_| None),
            task_count: 0,
            states: core::array::from_fn(|_| None),
            state_count: 0,
            task_list: &[],
            current_state: None,
            state_request: None,
        }
    }

    /// Lend a task to the manager
    ///
    /// The task does not run until its handle is part of the task list.
    pub fn register_task(&mut self, task: &'a mut dyn ManagedTask) -> RtlResult<TaskHandle> {
        let index = self.task_count;
        let handle = u8::try_from(index).map_err(|_| RtlError::CapacityExhausted)?;
        let slot = self.tasks.get_mut(index).ok_or(RtlError::CapacityExhausted)?;

        *slot = Some(task);
        self.task_count += 1;
        Ok(TaskHandle(handle))
    }

    /// Lend a state to the manager
    pub fn register_state(&mut self, state: &'a mut dyn ManagedState) -> RtlResult<StateHandle> {
        let index = self.state_count;
        let handle = u8::try_from(index).map_err(|_| RtlError::CapacityExhausted)?;
        let slot = self.states.get_mut(index).ok_or(RtlError::CapacityExhausted)?;

        *slot = Some(state);
        self.state_count += 1;
        Ok(StateHandle(handle))
    }

    /// Make `list` the active task list and return the previous one
    ///
    /// `None` installs an empty list. Depending on `switch` the outgoing
    /// tasks are suspended before the swap and the incoming ones resumed
    /// after it. A task present in both lists is suspended then resumed.
    pub fn set_task_list(
        &mut self,
        list: Option<&'a [TaskHandle]>,
        switch: TaskListSwitch,
    ) -> &'a [TaskHandle] {
        if switch.auto_suspend {
            for &handle in self.task_list {
                if let Some(task) = self.task_mut(handle) {
                    task.suspend();
                }
            }
        }

        let previous = core::mem::replace(&mut self.task_list, list.unwrap_or(&[]));

        if switch.auto_resume {
            for &handle in self.task_list {
                if let Some(task) = self.task_mut(handle) {
                    task.resume();
                }
            }
        }

        log::debug!(
            "task list switched, {} -> {} tasks",
            previous.len(),
            self.task_list.len()
        );
        previous
    }

    pub fn task_list(&self) -> &'a [TaskHandle] {
        self.task_list
    }

    /// Make `state` the current state and return the previous one
    ///
    /// Asking for the state that is already current changes nothing, fires
    /// no hook and returns `None`. Otherwise the outgoing state is suspended
    /// and the incoming one resumed.
    pub fn set_current_state(&mut self, state: Option<StateHandle>) -> Option<StateHandle> {
        if state == self.current_state {
            return None;
        }

        if let Some(current) = self.current_state_mut() {
            current.suspend();
        }

        let previous = core::mem::replace(&mut self.current_state, state);

        if let Some(next) = self.current_state_mut() {
            next.resume();
        }

        log::debug!("current state {:?} -> {:?}", previous, state);
        previous
    }

    pub fn current_state(&self) -> Option<StateHandle> {
        self.current_state
    }

    /// Watch `request` for state changes asked for during a tick
    pub fn set_state_request(&mut self, request: &'a StateRequest) {
        self.state_request = Some(request);
    }

    /// One tick
    ///
    /// Runs every task in the list in order, hands the events queued so far
    /// to the current state, then runs the current state. A state change
    /// requested through the [`StateRequest`] during the tick is applied
    /// last. Returns the number of events taken from the queue.
    pub fn dispatch<const N: usize>(&mut self, queue: &EventQueue<N>) -> usize {
        self.run_tasks();

        let delivered = queue.dispatch(self);

        if let Some(state) = self.current_state_mut() {
            state.run();
        }

        if let Some(next) = self.state_request.and_then(StateRequest::take) {
            if self.state(next).is_some() {
                self.set_current_state(Some(next));
            } else {
                log::warn!("requested unknown {}", next);
            }
        }

        delivered
    }

    /// Run every task of the active list once, in list order
    pub fn run_tasks(&mut self) {
        for &handle in self.task_list {
            if let Some(task) = self.task_mut(handle) {
                task.run();
            }
        }
    }

    /// Check if a task is part of the active task list
    pub fn is_scheduled(&self, task: TaskHandle) -> bool {
        self.task_list.contains(&task)
    }

    pub fn task(&self, handle: TaskHandle) -> Option<&(dyn ManagedTask + 'a)> {
        self.tasks.get(handle.index())?.as_deref()
    }

    pub fn task_mut(&mut self, handle: TaskHandle) -> Option<&mut (dyn ManagedTask + 'a)> {
        self.tasks.get_mut(handle.index())?.as_deref_mut()
    }

    pub fn state(&self, handle: StateHandle) -> Option<&(dyn ManagedState + 'a)> {
        self.states.get(handle.index())?.as_deref()
    }

    pub fn state_mut(&mut self, handle: StateHandle) -> Option<&mut (dyn ManagedState + 'a)> {
        self.states.get_mut(handle.index())?.as_deref_mut()
    }

    pub fn task_count(&self) -> usize {
        self.task_count
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// Log the active task list, one line per task
    pub fn dump_task_list(&self, message: &str) {
        log::debug!("{}", message);
        for (position, &handle) in self.task_list.iter().enumerate() {
            let name = self.task(handle).map_or("?", |task| task.name());
            log::debug!("  {}: {} {}", position + 1, handle, name);
        }
    }

    fn current_state_mut(&mut self) -> Option<&mut (dyn ManagedState + 'a)> {
        let handle = self.current_state?;
        self.state_mut(handle)
    }
}

impl<const TASKS: usize, const STATES: usize> EventDispatch for TaskManager<'_, TASKS, STATES> {
    /// Forward an event to the current state
    ///
    /// With no current state the event is dropped.
    fn dispatch_event(&mut self, event: &Event) {
        match self.current_state_mut() {
            Some(state) => state.on_event(event),
            None => log::trace!("no current state, dropped {}", event.id),
        }
    }
}

impl<const TASKS: usize, const STATES: usize> Default for TaskManager<'_, TASKS, STATES> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{Pollable, StateBase, StateHandler, TaskBase, TaskState};

    #[derive(Default)]
    struct Worker {
        polls: u32,
    }

    impl Pollable for Worker {
        fn poll(&mut self) {
            self.polls += 1;
        }

        fn name(&self) -> Option<&'static str> {
            Some("Worker")
        }
    }

    #[derive(Default)]
    struct Listening {
        events: u32,
    }

    impl Pollable for Listening {}

    impl StateHandler for Listening {
        fn on_event(&mut self, _event: &Event) {
            self.events += 1;
        }
    }

    #[test]
    fn test_null_task_list_is_empty() {
        let mut worker = TaskBase::new(Worker::default());
        let mut manager: TaskManager<'_, 4, 2> = TaskManager::new();
        let handle = manager.register_task(&mut worker).unwrap();
        let list = [handle];

        manager.set_task_list(Some(&list), TaskListSwitch::new());
        assert!(manager.is_scheduled(handle));

        let previous = manager.set_task_list(None, TaskListSwitch::new());
        assert_eq!(previous, &[handle]);
        assert!(manager.task_list().is_empty());
        assert_eq!(
            manager.task(handle).map(|task| task.task_state()),
            Some(TaskState::Suspended)
        );
    }

    #[test]
    fn test_switch_without_auto_suspend() {
        let mut worker = TaskBase::with_state(Worker::default(), TaskState::Running);
        let mut manager: TaskManager<'_, 4, 2> = TaskManager::new();
        let handle = manager.register_task(&mut worker).unwrap();
        let list = [handle];

        manager.set_task_list(Some(&list), TaskListSwitch::new().auto_resume(false));
        manager.set_task_list(None, TaskListSwitch::new().auto_suspend(false));

        assert!(manager.task(handle).is_some_and(|task| task.is_running()));
    }

    #[test]
    fn test_same_state_is_noop() {
        let mut idle = StateBase::new(Listening::default());
        let mut manager: TaskManager<'_, 4, 2> = TaskManager::new();
        let state = manager.register_state(&mut idle).unwrap();

        assert_eq!(manager.set_current_state(Some(state)), None);
        assert_eq!(manager.set_current_state(Some(state)), None);
        assert_eq!(manager.current_state(), Some(state));
        assert_eq!(manager.set_current_state(None), Some(state));
    }

    #[test]
    fn test_event_without_state_is_dropped() {
        let mut manager: TaskManager<'_, 4, 2> = TaskManager::new();
        manager.dispatch_event(&Event::signal(rtl_core::EventId::TIMER_FIRED));
        assert_eq!(manager.current_state(), None);
    }

    #[test]
    fn test_request_applied_after_tick() {
        let queue: EventQueue<4> = EventQueue::new();
        let request = StateRequest::new();
        let mut idle = StateBase::new(Listening::default());
        let mut busy = StateBase::new(Listening::default());
        let mut manager: TaskManager<'_, 4, 2> = TaskManager::new();
        let first = manager.register_state(&mut idle).unwrap();
        let second = manager.register_state(&mut busy).unwrap();
        manager.set_state_request(&request);
        manager.set_current_state(Some(first));

        request.request_state(second);
        assert_eq!(manager.current_state(), Some(first));

        manager.dispatch(&queue);
        assert_eq!(manager.current_state(), Some(second));
        assert_eq!(request.pending(), None);
        assert_eq!(
            manager.state(first).map(|state| state.task_state()),
            Some(TaskState::Suspended)
        );
    }

    #[test]
    fn test_register_capacity() {
        let mut a = TaskBase::new(Worker::default());
        let mut b = TaskBase::new(Worker::default());
        let mut manager: TaskManager<'_, 1, 1> = TaskManager::new();

        assert!(manager.register_task(&mut a).is_ok());
        assert_eq!(manager.register_task(&mut b), Err(RtlError::CapacityExhausted));
    }
}
