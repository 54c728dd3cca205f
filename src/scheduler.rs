//! Timer services used by the timing operators.
//!
//! The engine itself never sleeps. Throttle, delay and the periodic generators
//! hand their callbacks to a [`Scheduler`] and keep the returned
//! [`TaskHandle`] so they can cancel it when they deactivate.

use std::{
  cell::Cell,
  fmt::{Debug, Formatter},
  rc::Rc,
  time::Duration,
};

pub mod test_scheduler;
pub use test_scheduler::TestScheduler;

#[cfg(feature = "tokio-scheduler")]
pub mod tokio_scheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::LocalScheduler;

/// A single-threaded timer service.
///
/// Implementations must never run a task after its handle was cancelled, even
/// when the cancellation happens in the same tick the timer became due.
pub trait Scheduler: Clone + 'static {
  /// Time elapsed on this scheduler's clock.
  fn now(&self) -> Duration;

  /// Runs `task` once, `delay` from now.
  fn schedule_after(&self, delay: Duration, task: impl FnOnce() + 'static) -> TaskHandle;

  /// Runs `task` every `period`, the first time one period from now.
  fn schedule_periodic(&self, period: Duration, task: impl FnMut() + 'static) -> TaskHandle;
}

/// Cancellation handle of a scheduled task.
#[derive(Clone, Default)]
pub struct TaskHandle {
  closed: Rc<Cell<bool>>,
}

impl TaskHandle {
  pub fn new() -> Self { Self::default() }

  #[inline]
  pub fn cancel(&self) { self.closed.set(true); }

  #[inline]
  pub fn is_closed(&self) -> bool { self.closed.get() }
}

impl Debug for TaskHandle {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TaskHandle")
      .field("closed", &self.is_closed())
      .finish()
  }
}
