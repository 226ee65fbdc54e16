//! Ordered cooperative task list
//!
//! Tasks are registered once into a fixed slot table and then linked into
//! the dispatch order. The order is a singly linked list threaded through
//! the slots, so reordering never moves a task, and a task is linked at
//! most once: linking an already linked task moves it.

use core::fmt;

use heapless::Vec;
use rtl_core::{NoWatchdog, RtlError, RtlResult, Watchdog};

use crate::DEFAULT_MAX_TASKS;

/// One unit of cooperative work
pub trait Task {
    /// Do a small slice of work
    ///
    /// Returning `true` means something changed and the rest of this pass
    /// must be skipped; the next pass starts again from the head.
    fn execute(&mut self) -> bool;

    /// Name used in diagnostic dumps
    fn name(&self) -> &'static str {
        "Task"
    }
}

/// Closure adapter for [`Task`]
pub struct FnTask<F>(pub F);

impl<F> Task for FnTask<F>
where
    F: FnMut() -> bool,
{
    fn execute(&mut self) -> bool {
        (self.0)()
    }
}

/// Handle of a task registered with a [`TaskScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u8);

impl TaskId {
    /// Get the raw index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{:02}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "T{=u8}", self.0);
    }
}

struct TaskSlot<'a> {
    task: &'a mut dyn Task,
    next: Option<TaskId>,
    linked: bool,
}

/// Iterator over linked tasks in dispatch order
pub struct TaskIter<'s, 'a> {
    slots: &'s [TaskSlot<'a>],
    cursor: Option<TaskId>,
}

impl Iterator for TaskIter<'_, '_> {
    type Item = TaskId;

    fn next(&mut self) -> Option<TaskId> {
        let current = self.cursor?;
        self.cursor = self.slots.get(current.index()).and_then(|slot| slot.next);
        Some(current)
    }
}

/// Cooperative scheduler over an ordered task list
///
/// The watchdog is fed once for every task visited, before the task runs.
pub struct TaskScheduler<'a, const N: usize = DEFAULT_MAX_TASKS, W: Watchdog = NoWatchdog> {
    slots: Vec<TaskSlot<'a>, N>,
    head: Option<TaskId>,
    watchdog: W,
}

impl<'a, const N: usize> TaskScheduler<'a, N, NoWatchdog> {
    /// Create an empty scheduler without a watchdog
    pub const fn new() -> Self {
        Self::with_watchdog(NoWatchdog)
    }
}

impl<'a, const N: usize, W: Watchdog> TaskScheduler<'a, N, W> {
    /// Create an empty scheduler that feeds `watchdog`
    pub const fn with_watchdog(watchdog: W) -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            watchdog,
        }
    }

    /// Take a slot for `task` without linking it into the dispatch order
    pub fn register(&mut self, task: &'a mut dyn Task) -> RtlResult<TaskId> {
        let id = u8::try_from(self.slots.len()).map_err(|_| RtlError::CapacityExhausted)?;
        self.slots
            .push(TaskSlot {
                task,
                next: None,
                linked: false,
            })
            .map_err(|_| RtlError::CapacityExhausted)?;
        Ok(TaskId(id))
    }

    /// Register `task` and append it to the dispatch order
    pub fn schedule(&mut self, task: &'a mut dyn Task) -> RtlResult<TaskId> {
        let id = self.register(task)?;
        self.add(id);
        Ok(id)
    }

    /// Append a task at the tail
    pub fn add(&mut self, id: TaskId) -> bool {
        if !self.is_registered(id) {
            return false;
        }

        self.unlink(id);
        let tail = self.last();
        self.link_after(tail, id);
        log::trace!("scheduler: add {}", id);
        true
    }

    /// Link a task at a 1-based position
    ///
    /// A position of 0 or 1 makes the task the head. A position past the end
    /// of the list appends at the tail.
    pub fn insert_at(&mut self, id: TaskId, priority: usize) -> bool {
        if !self.is_registered(id) {
            return false;
        }

        self.unlink(id);
        let prev = if priority <= 1 {
            None
        } else {
            self.nth(priority - 1).or_else(|| self.last())
        };
        self.link_after(prev, id);
        log::trace!("scheduler: insert {} at {}", id, priority);
        true
    }

    /// Link a task directly in front of `anchor`
    ///
    /// Returns `false`, changing nothing, when `anchor` is not linked.
    pub fn insert_before(&mut self, id: TaskId, anchor: TaskId) -> bool {
        if !self.is_registered(id) || !self.contains(anchor) || id == anchor {
            return false;
        }

        self.unlink(id);
        let prev = self.find_prev(anchor);
        self.link_after(prev, id);
        log::trace!("scheduler: insert {} before {}", id, anchor);
        true
    }

    /// Link a task directly behind `anchor`
    ///
    /// Returns `false`, changing nothing, when `anchor` is not linked.
    pub fn insert_after(&mut self, id: TaskId, anchor: TaskId) -> bool {
        if !self.is_registered(id) || !self.contains(anchor) || id == anchor {
            return false;
        }

        self.unlink(id);
        self.link_after(Some(anchor), id);
        log::trace!("scheduler: insert {} after {}", id, anchor);
        true
    }

    /// Unlink a task from the dispatch order
    ///
    /// The task keeps its slot and can be linked again. Returns `false` when
    /// it was not linked.
    pub fn remove(&mut self, id: TaskId) -> bool {
        let removed = self.unlink(id);
        if removed {
            log::trace!("scheduler: remove {}", id);
        }
        removed
    }

    /// Run one pass over the task list
    ///
    /// Returns `true` if a task cut the pass short.
    pub fn dispatch(&mut self) -> bool {
        let mut cursor = self.head;

        while let Some(id) = cursor {
            let Some(slot) = self.slots.get_mut(id.index()) else {
                break;
            };

            self.watchdog.feed();
            if slot.task.execute() {
                log::trace!("scheduler: {} preempted the pass", id);
                return true;
            }
            cursor = slot.next;
        }

        false
    }

    /// Number of linked tasks
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Check if a task is linked into the dispatch order
    pub fn contains(&self, id: TaskId) -> bool {
        self.slots.get(id.index()).is_some_and(|slot| slot.linked)
    }

    /// Linked tasks in dispatch order
    pub fn iter(&self) -> TaskIter<'_, 'a> {
        TaskIter {
            slots: &self.slots,
            cursor: self.head,
        }
    }

    /// Name of a registered task
    pub fn name(&self, id: TaskId) -> Option<&'static str> {
        self.slots.get(id.index()).map(|slot| slot.task.name())
    }

    /// Number of registered tasks, linked or not
    pub fn registered(&self) -> usize {
        self.slots.len()
    }

    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    pub fn watchdog_mut(&mut self) -> &mut W {
        &mut self.watchdog
    }

    /// Log the dispatch order, one line per task
    pub fn dump(&self, message: &str) {
        log::debug!("{}", message);
        for (position, id) in self.iter().enumerate() {
            log::debug!(
                "  {}: {} {}",
                position + 1,
                id,
                self.name(id).unwrap_or("?")
            );
        }
    }

    fn is_registered(&self, id: TaskId) -> bool {
        id.index() < self.slots.len()
    }

    /// Link `id` behind `prev`, or at the head when `prev` is `None`
    fn link_after(&mut self, prev: Option<TaskId>, id: TaskId) {
        let next = match prev {
            Some(prev) => self.slots[prev.index()].next.replace(id),
            None => self.head.replace(id),
        };

        let slot = &mut self.slots[id.index()];
        slot.next = next;
        slot.linked = true;
    }

    fn unlink(&mut self, id: TaskId) -> bool {
        if !self.contains(id) {
            return false;
        }

        let next = self.slots[id.index()].next;
        if self.head == Some(id) {
            self.head = next;
        } else {
            match self.find_prev(id) {
                Some(prev) => self.slots[prev.index()].next = next,
                None => return false,
            }
        }

        let slot = &mut self.slots[id.index()];
        slot.next = None;
        slot.linked = false;
        true
    }

    fn find_prev(&self, id: TaskId) -> Option<TaskId> {
        self.iter()
            .find(|current| self.slots[current.index()].next == Some(id))
    }

    fn last(&self) -> Option<TaskId> {
        self.iter().last()
    }

    /// Task at a 1-based position
    fn nth(&self, position: usize) -> Option<TaskId> {
        self.iter().nth(position.checked_sub(1)?)
    }
}

impl<const N: usize> Default for TaskScheduler<'_, N, NoWatchdog> {
    fn default() -> Self {
        Self::new()
    }
}
