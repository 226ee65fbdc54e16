//! Task lifecycle
//!
//! [`TaskBase`] wraps a user task with the four-state lifecycle. The user
//! side only implements [`Pollable`] (and [`StateHandler`] for states); the
//! wrapper decides when `poll` runs and when the transition hook fires.
//!
//! ```text
//!            resume()                     suspend()
//! Resuming ----------> Running  --------------------> Suspended
//!    ^     run()                                          |
//!    +----------------------------------------------------+
//!                          resume()
//! ```

use core::fmt;

use rtl_core::Event;

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Starting, or coming back from suspension; activated on the next run
    Resuming,
    Running,
    /// Only ever passed to the transition hook
    Suspending,
    Suspended,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Resuming => "Resuming",
            TaskState::Running => "Running",
            TaskState::Suspending => "Suspending",
            TaskState::Suspended => "Suspended",
        };
        f.write_str(name)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            TaskState::Resuming => defmt::write!(fmt, "Resuming"),
            TaskState::Running => defmt::write!(fmt, "Running"),
            TaskState::Suspending => defmt::write!(fmt, "Suspending"),
            TaskState::Suspended => defmt::write!(fmt, "Suspended"),
        }
    }
}

/// User side of a lifecycle task
pub trait Pollable {
    /// Do a small slice of work; called on every run while `Running`
    fn poll(&mut self) {}

    /// Told about a transition before it happens
    ///
    /// Only [`TaskState::Resuming`] and [`TaskState::Suspending`] are ever
    /// passed here.
    fn state_changing(&mut self, _next: TaskState) {}

    /// Name used in diagnostic dumps
    ///
    /// `None` leaves it to the wrapper: `"TaskBase"` for a task and
    /// `"StateBase"` for a state.
    fn name(&self) -> Option<&'static str> {
        None
    }
}

/// User side of a state machine state
///
/// Only the current state of a [`TaskManager`](crate::TaskManager) is
/// given events.
pub trait StateHandler: Pollable {
    fn on_event(&mut self, _event: &Event) {}
}

/// A task together with its lifecycle state
#[derive(Debug, Clone)]
pub struct TaskBase<T> {
    state: TaskState,
    task: T,
    fallback_name: &'static str,
}

impl<T> TaskBase<T> {
    /// Wrap `task`, starting in [`TaskState::Resuming`]
    pub const fn new(task: T) -> Self {
        Self::with_state(task, TaskState::Resuming)
    }

    /// Wrap `task` starting in any state
    pub const fn with_state(task: T, state: TaskState) -> Self {
        Self { state, task, fallback_name: "TaskBase" }
    }

    pub const fn state(&self) -> TaskState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TaskState::Running
    }

    pub fn inner(&self) -> &T {
        &self.task
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.task
    }

    pub fn into_inner(self) -> T {
        self.task
    }
}

impl<T: Pollable> TaskBase<T> {
    /// Run the task according to its state
    ///
    /// A `Running` task polls. A `Resuming` task is activated instead of
    /// polled. Both report `true`. A suspended task does nothing and
    /// reports `false`.
    pub fn run(&mut self) -> bool {
        match self.state {
            TaskState::Running => {
                self.task.poll();
                true
            }
            TaskState::Resuming => {
                self.resume();
                true
            }
            TaskState::Suspending | TaskState::Suspended => false,
        }
    }

    /// Stop polling the task; ignored if already suspended
    pub fn suspend(&mut self) {
        if self.state == TaskState::Suspended {
            return;
        }

        log::trace!("{}: suspend", self.name());
        self.task.state_changing(TaskState::Suspending);
        self.state = TaskState::Suspended;
    }

    /// Bring the task (back) to running; ignored if already running
    pub fn resume(&mut self) {
        if self.state == TaskState::Running {
            return;
        }

        log::trace!("{}: resume", self.name());
        self.task.state_changing(TaskState::Resuming);
        self.state = TaskState::Running;
    }

    pub fn name(&self) -> &'static str {
        self.task.name().unwrap_or(self.fallback_name)
    }
}

impl<T: Pollable + Default> Default for TaskBase<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Lifecycle operations the task manager drives
///
/// Object safe, so one manager can hold tasks of different types.
pub trait ManagedTask {
    fn run(&mut self) -> bool;
    fn suspend(&mut self);
    fn resume(&mut self);
    fn task_state(&self) -> TaskState;
    fn name(&self) -> &'static str;

    fn is_running(&self) -> bool {
        self.task_state() == TaskState::Running
    }
}

impl<T: Pollable> ManagedTask for TaskBase<T> {
    fn run(&mut self) -> bool {
        TaskBase::run(self)
    }

    fn suspend(&mut self) {
        TaskBase::suspend(self)
    }

    fn resume(&mut self) {
        TaskBase::resume(self)
    }

    fn task_state(&self) -> TaskState {
        self.state
    }

    fn name(&self) -> &'static str {
        TaskBase::name(self)
    }
}

/// A managed task that can also be the current state
pub trait ManagedState: ManagedTask {
    fn on_event(&mut self, event: &Event);
}

/// A lifecycle task that also takes events while it is the current state
#[derive(Debug, Clone)]
pub struct StateBase<S>(TaskBase<S>);

impl<S> StateBase<S> {
    /// Wrap `state`, starting in [`TaskState::Resuming`]
    pub const fn new(state: S) -> Self {
        Self::with_state(state, TaskState::Resuming)
    }

    pub const fn with_state(state: S, lifecycle: TaskState) -> Self {
        Self(TaskBase { state: lifecycle, task: state, fallback_name: "StateBase" })
    }

    pub const fn state(&self) -> TaskState {
        self.0.state
    }

    pub fn is_running(&self) -> bool {
        self.0.is_running()
    }

    pub fn inner(&self) -> &S {
        &self.0.task
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.0.task
    }

    pub fn into_inner(self) -> S {
        self.0.task
    }
}

impl<S: StateHandler> StateBase<S> {
    pub fn run(&mut self) -> bool {
        self.0.run()
    }

    pub fn suspend(&mut self) {
        self.0.suspend()
    }

    pub fn resume(&mut self) {
        self.0.resume()
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub fn on_event(&mut self, event: &Event) {
        self.0.task.on_event(event);
    }
}

impl<S: StateHandler + Default> Default for StateBase<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: StateHandler> ManagedTask for StateBase<S> {
    fn run(&mut self) -> bool {
        self.0.run()
    }

    fn suspend(&mut self) {
        self.0.suspend()
    }

    fn resume(&mut self) {
        self.0.resume()
    }

    fn task_state(&self) -> TaskState {
        self.0.state
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl<S: StateHandler> ManagedState for StateBase<S> {
    fn on_event(&mut self, event: &Event) {
        StateBase::on_event(self, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        polls: u32,
        resumes: u32,
        suspends: u32,
    }

    impl Pollable for Counter {
        fn poll(&mut self) {
            self.polls += 1;
        }

        fn state_changing(&mut self, next: TaskState) {
            match next {
                TaskState::Resuming => self.resumes += 1,
                TaskState::Suspending => self.suspends += 1,
                _ => {}
            }
        }
    }

    #[test]
    fn test_first_run_activates() {
        let mut task = TaskBase::new(Counter::default());
        assert_eq!(task.state(), TaskState::Resuming);

        assert!(task.run());
        assert!(task.is_running());
        assert_eq!(task.inner().resumes, 1);
        assert_eq!(task.inner().polls, 0);

        assert!(task.run());
        assert_eq!(task.inner().polls, 1);
        assert_eq!(task.inner().resumes, 1);
    }

    #[test]
    fn test_suspend_is_idempotent() {
        let mut task = TaskBase::with_state(Counter::default(), TaskState::Running);

        task.suspend();
        task.suspend();
        assert_eq!(task.state(), TaskState::Suspended);
        assert_eq!(task.inner().suspends, 1);
        assert!(!task.run());
        assert_eq!(task.inner().polls, 0);
    }

    #[test]
    fn test_resume_from_suspended() {
        let mut task = TaskBase::with_state(Counter::default(), TaskState::Suspended);

        task.resume();
        task.resume();
        assert!(task.is_running());
        assert_eq!(task.inner().resumes, 1);
    }

    #[test]
    fn test_suspend_while_resuming() {
        let mut task = TaskBase::new(Counter::default());

        task.suspend();
        assert_eq!(task.state(), TaskState::Suspended);
        assert_eq!(task.inner().suspends, 1);
        assert_eq!(task.inner().resumes, 0);
    }

    impl StateHandler for Counter {}

    struct Named;

    impl Pollable for Named {
        fn name(&self) -> Option<&'static str> {
            Some("Named")
        }
    }

    impl StateHandler for Named {}

    #[test]
    fn test_default_name() {
        let task = TaskBase::new(Counter::default());
        assert_eq!(task.name(), "TaskBase");
        assert_eq!(ManagedTask::name(&task), "TaskBase");
    }

    #[test]
    fn test_state_default_name() {
        let mut state = StateBase::new(Counter::default());
        assert_eq!(state.name(), "StateBase");
        assert_eq!(ManagedTask::name(&state), "StateBase");

        assert!(state.run());
        assert!(state.is_running());
        assert_eq!(state.inner().resumes, 1);
    }

    #[test]
    fn test_overridden_name_wins() {
        assert_eq!(TaskBase::new(Named).name(), "Named");
        assert_eq!(StateBase::new(Named).name(), "Named");
    }
}
