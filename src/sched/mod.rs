//! Cancellable periodic tasks.
//!
//! Each timer-driven behavior (position flushing, promotion polling, the
//! relay's reconcile poll) runs as a spawned task holding a cancellation
//! receiver. [`TaskHandle::cancel`] is synchronous and idempotent; a
//! [`TaskSet`] groups the trip-scoped tasks so trip teardown cancels them
//! all before returning. In-flight work is not awaited by cancellation;
//! its result is simply discarded.

use std::time::Duration;

use log::trace;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[cfg(test)]
mod test;

/// Handle to a running periodic task. Dropping the handle does NOT stop
/// the task; call [`cancel`](TaskHandle::cancel).
pub struct TaskHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TaskHandle {
    /// Stops the task. Safe to call repeatedly; cancelling an already
    /// finished task is a no-op.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Runs `step` every `interval` until it returns `false` or the handle is
/// cancelled. The first run happens after one full interval, not
/// immediately.
pub fn repeat<F>(interval: Duration, mut step: F) -> TaskHandle
where
    F: FnMut() -> bool + Send + 'static,
{
    let (cancel, mut cancelled) = watch::channel(false);

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancelled.changed() => break,
                _ = tokio::time::sleep(interval) => {
                    if !step() {
                        trace!("periodic task stopped itself");
                        break;
                    }
                }
            }
        }
    });

    TaskHandle { cancel, task }
}

/// [`repeat`], bounded to at most `max_runs` invocations of `step`.
pub fn repeat_limited<F>(interval: Duration, max_runs: u32, mut step: F) -> TaskHandle
where
    F: FnMut() -> bool + Send + 'static,
{
    let mut remaining = max_runs;

    repeat(interval, move || {
        if remaining == 0 {
            return false;
        }

        remaining -= 1;
        step() && remaining > 0
    })
}

/// Trip-scoped task group. All members are cancelled together, before
/// `cancel_all` returns.
#[derive(Default)]
pub struct TaskSet {
    tasks: Vec<TaskHandle>,
}

impl TaskSet {
    pub fn new() -> Self {
        TaskSet::default()
    }

    pub fn push(&mut self, handle: TaskHandle) {
        self.tasks.push(handle);
    }

    /// Cancels every task in the set. Idempotent: an empty set, or one
    /// whose tasks already stopped, is fine.
    pub fn cancel_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.cancel();
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
