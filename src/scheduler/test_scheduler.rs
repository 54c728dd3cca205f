//! Virtual-time scheduler for deterministic tests of the timing operators.
//!
//! Time only moves when a test says so. Tasks due at the same instant run in
//! the order they were scheduled.
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc, time::Duration};
//!
//! use rxflow::scheduler::{Scheduler, TestScheduler};
//!
//! TestScheduler::init();
//!
//! let fired = Rc::new(Cell::new(false));
//! let c_fired = fired.clone();
//! TestScheduler.schedule_after(Duration::from_millis(100), move || c_fired.set(true));
//!
//! TestScheduler::advance_by(Duration::from_millis(99));
//! assert!(!fired.get());
//! TestScheduler::advance_by(Duration::from_millis(1));
//! assert!(fired.get());
//! ```
//!
//! State is thread local, so tests running on different threads do not see
//! each other's clock.

use std::{cell::RefCell, cmp::Ordering, collections::BinaryHeap, time::Duration};

use super::{Scheduler, TaskHandle};

// ==================== Internal State ====================

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
  initialized: bool,
}

enum Job {
  Once(Box<dyn FnOnce()>),
  Every(Duration, Box<dyn FnMut()>),
}

struct ScheduledTask {
  scheduled_time: Duration,
  task_id: usize,
  job: Job,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool {
    self.scheduled_time == other.scheduled_time && self.task_id == other.task_id
  }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .scheduled_time
      .cmp(&self.scheduled_time)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

thread_local! {
  static TEST_SCHEDULER_STATE: RefCell<TestSchedulerState>
    = RefCell::new(TestSchedulerState::default());
}

// ==================== TestScheduler ====================

/// A virtual time scheduler.
///
/// Zero sized; every instance on a thread shares the same clock and queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestScheduler;

impl TestScheduler {
  /// Resets the clock to zero and drops every pending task.
  ///
  /// Must be called at the start of each test; the other methods panic until it
  /// has been.
  pub fn init() {
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      state.virtual_time = Duration::ZERO;
      state.task_queue.clear();
      state.next_task_id = 0;
      state.initialized = true;
    });
  }

  fn ensure_initialized() {
    TEST_SCHEDULER_STATE.with(|state| {
      assert!(
        state.borrow().initialized,
        "TestScheduler::init() must be called before using the scheduler"
      );
    });
  }

  /// Current virtual time.
  pub fn now() -> Duration {
    Self::ensure_initialized();
    TEST_SCHEDULER_STATE.with(|state| state.borrow().virtual_time)
  }

  /// Number of tasks that are queued and not cancelled.
  pub fn pending_count() -> usize {
    Self::ensure_initialized();
    TEST_SCHEDULER_STATE.with(|state| {
      state
        .borrow()
        .task_queue
        .iter()
        .filter(|t| !t.handle.is_closed())
        .count()
    })
  }

  pub fn is_empty() -> bool { Self::pending_count() == 0 }

  fn push(state: &mut TestSchedulerState, at: Duration, job: Job, handle: TaskHandle) {
    let task_id = state.next_task_id;
    state.next_task_id += 1;
    state.task_queue.push(ScheduledTask { scheduled_time: at, task_id, job, handle });
  }

  fn execute_tasks_until(target_time: Option<Duration>) {
    loop {
      let task = TEST_SCHEDULER_STATE.with(|state| {
        let mut state = state.borrow_mut();
        let due = state
          .task_queue
          .peek()
          .is_some_and(|peek| target_time.is_none_or(|limit| peek.scheduled_time <= limit));
        if !due {
          return None;
        }
        let scheduled_task = state.task_queue.pop()?;
        state.virtual_time = scheduled_task.scheduled_time;
        Some(scheduled_task)
      });

      let Some(ScheduledTask { scheduled_time, job, handle, .. }) = task else {
        break;
      };
      if handle.is_closed() {
        continue;
      }

      match job {
        Job::Once(f) => {
          f();
          handle.cancel();
        }
        Job::Every(period, mut f) => {
          f();
          if !handle.is_closed() {
            let next = scheduled_time + period;
            TEST_SCHEDULER_STATE.with(|state| {
              Self::push(&mut state.borrow_mut(), next, Job::Every(period, f), handle)
            });
          }
        }
      }
    }
  }

  /// Advances the clock by `duration`, running every task that falls due on
  /// the way, in time order.
  pub fn advance_by(duration: Duration) {
    Self::ensure_initialized();
    let target_time = TEST_SCHEDULER_STATE.with(|state| state.borrow().virtual_time + duration);
    Self::advance_to(target_time);
  }

  /// Advances the clock to `target_time`. Moving backwards is a no-op.
  pub fn advance_to(target_time: Duration) {
    Self::ensure_initialized();
    Self::execute_tasks_until(Some(target_time));
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      if state.virtual_time < target_time {
        state.virtual_time = target_time;
      }
    });
  }

  /// Runs tasks until the queue is empty.
  ///
  /// A periodic task that is never cancelled keeps the queue busy forever; use
  /// [`TestScheduler::advance_by`] for those.
  pub fn flush() {
    Self::ensure_initialized();
    Self::execute_tasks_until(None);
  }
}

impl Scheduler for TestScheduler {
  fn now(&self) -> Duration { TestScheduler::now() }

  fn schedule_after(&self, delay: Duration, task: impl FnOnce() + 'static) -> TaskHandle {
    Self::ensure_initialized();
    let handle = TaskHandle::new();
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      let at = state.virtual_time + delay;
      Self::push(&mut state, at, Job::Once(Box::new(task)), handle.clone());
    });
    handle
  }

  fn schedule_periodic(&self, period: Duration, task: impl FnMut() + 'static) -> TaskHandle {
    Self::ensure_initialized();
    let handle = TaskHandle::new();
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      let at = state.virtual_time + period;
      Self::push(&mut state, at, Job::Every(period, Box::new(task)), handle.clone());
    });
    handle
  }
}
