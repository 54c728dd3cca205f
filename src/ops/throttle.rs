use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
  node::NodeRef,
  ops::Operator,
  scheduler::{Scheduler, TaskHandle},
};

/// Which edges of a burst `throttle` emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleOptions {
  pub leading: bool,
  pub trailing: bool,
}

impl Default for ThrottleOptions {
  fn default() -> Self { Self::all() }
}

impl ThrottleOptions {
  #[inline]
  pub fn leading() -> Self { Self { leading: true, trailing: false } }

  #[inline]
  pub fn trailing() -> Self { Self { leading: false, trailing: true } }

  #[inline]
  pub fn all() -> Self { Self { leading: true, trailing: true } }
}

struct ThrottleState<T> {
  last_call: Option<Duration>,
  trailing_value: Option<T>,
  trailing_task: Option<TaskHandle>,
  end_after_trailing: bool,
}

impl<T> ThrottleState<T> {
  fn cancel_trailing(&mut self) {
    if let Some(task) = self.trailing_task.take() {
      task.cancel();
    }
    self.trailing_value = None;
  }
}

/// Emits at most one value per `wait`.
///
/// A value arriving inside the window replaces any pending trailing value,
/// which is emitted when the window closes. An end arriving while a trailing
/// value is pending waits for it.
pub struct ThrottleOp<T, S> {
  wait: Duration,
  options: ThrottleOptions,
  scheduler: S,
  state: Rc<RefCell<ThrottleState<T>>>,
}

impl<T, S> ThrottleOp<T, S> {
  pub fn new(wait: Duration, options: ThrottleOptions, scheduler: S) -> Self {
    let state = ThrottleState {
      last_call: None,
      trailing_value: None,
      trailing_task: None,
      end_after_trailing: false,
    };
    Self { wait, options, scheduler, state: Rc::new(RefCell::new(state)) }
  }
}

impl<T, S> ThrottleOp<T, S>
where
  T: Clone + 'static,
  S: Scheduler,
{
  fn schedule_trailing<E: Clone + 'static>(
    &self, value: T, after: Duration, out: &NodeRef<T, E>,
  ) {
    self.state.borrow_mut().cancel_trailing();
    let state = self.state.clone();
    let scheduler = self.scheduler.clone();
    let leading = self.options.leading;
    let out = Rc::downgrade(out);
    let task = self.scheduler.schedule_after(after, move || {
      let Some(out) = out.upgrade() else {
        return;
      };
      let (value, end) = {
        let mut state = state.borrow_mut();
        state.trailing_task = None;
        state.last_call = if leading { Some(scheduler.now()) } else { None };
        (state.trailing_value.take(), std::mem::take(&mut state.end_after_trailing))
      };
      if let Some(value) = value {
        out.send_value(value);
      }
      if end {
        out.send_end();
      }
    });
    let mut state = self.state.borrow_mut();
    state.trailing_value = Some(value);
    state.trailing_task = Some(task);
  }
}

impl<T, E, S> Operator<T, E> for ThrottleOp<T, S>
where
  T: Clone + 'static,
  E: Clone + 'static,
  S: Scheduler,
{
  type Out = T;

  fn handle_value(&self, value: T, initial: bool, out: &NodeRef<T, E>) {
    if initial {
      out.send_value(value);
      return;
    }
    let now = self.scheduler.now();
    let remaining = {
      let mut state = self.state.borrow_mut();
      if state.last_call.is_none() && !self.options.leading {
        state.last_call = Some(now);
      }
      match state.last_call {
        Some(last) => self.wait.saturating_sub(now.saturating_sub(last)),
        None => Duration::ZERO,
      }
    };

    if remaining.is_zero() {
      {
        let mut state = self.state.borrow_mut();
        state.cancel_trailing();
        state.last_call = Some(now);
      }
      out.send_value(value);
    } else if self.options.trailing {
      self.schedule_trailing(value, remaining, out);
    }
  }

  fn handle_end(&self, out: &NodeRef<T, E>) {
    let pending = {
      let mut state = self.state.borrow_mut();
      let pending = state.trailing_task.is_some();
      state.end_after_trailing = pending;
      pending
    };
    if !pending {
      out.send_end();
    }
  }

  fn deactivate(&self, out: &NodeRef<T, E>) {
    let end = {
      let mut state = self.state.borrow_mut();
      state.cancel_trailing();
      std::mem::take(&mut state.end_after_trailing)
    };
    if end {
      out.send_end();
    }
  }

  fn free(&self) { self.state.borrow_mut().cancel_trailing(); }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc, time::Duration};

  use crate::prelude::*;

  fn ms(n: u64) -> Duration { Duration::from_millis(n) }

  type Log = Rc<RefCell<Vec<(u64, i32)>>>;

  fn record(stream: &Stream<i32>) -> Log {
    let log: Log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    stream.on_value(move |v| {
      c_log.borrow_mut().push((TestScheduler::now().as_millis() as u64, v));
    });
    log
  }

  fn feed(bus: &Bus<i32>, at: &[(u64, i32)]) {
    for (t, v) in at {
      TestScheduler::advance_to(ms(*t));
      bus.push(*v);
    }
  }

  #[rxflow_macro::test]
  fn leading_and_trailing() {
    TestScheduler::init();
    let bus = Bus::new();
    let log = record(&bus.throttle(ms(100), ThrottleOptions::default(), TestScheduler));

    feed(&bus, &[(0, 0), (30, 30), (60, 60), (150, 150)]);
    TestScheduler::advance_to(ms(300));

    assert_eq!(*log.borrow(), vec![(0, 0), (100, 60), (200, 150)]);
  }

  #[rxflow_macro::test]
  fn leading_only() {
    TestScheduler::init();
    let bus = Bus::new();
    let log = record(&bus.throttle(ms(100), ThrottleOptions::leading(), TestScheduler));

    feed(&bus, &[(0, 0), (30, 30), (60, 60), (150, 150), (210, 210)]);
    TestScheduler::advance_to(ms(400));

    assert_eq!(*log.borrow(), vec![(0, 0), (150, 150)]);
  }

  #[rxflow_macro::test]
  fn trailing_only() {
    TestScheduler::init();
    let bus = Bus::new();
    let log = record(&bus.throttle(ms(100), ThrottleOptions::trailing(), TestScheduler));

    feed(&bus, &[(0, 0), (30, 30), (160, 160)]);
    TestScheduler::advance_to(ms(400));

    assert_eq!(*log.borrow(), vec![(100, 30), (260, 160)]);
  }

  #[rxflow_macro::test]
  fn end_waits_for_the_trailing_value() {
    TestScheduler::init();
    let bus = Bus::new();
    let throttled = bus.throttle(ms(100), ThrottleOptions::default(), TestScheduler);
    let log = record(&throttled);

    feed(&bus, &[(0, 1), (10, 2)]);
    bus.end();
    assert!(!throttled.is_ended());

    TestScheduler::advance_to(ms(100));
    assert_eq!(*log.borrow(), vec![(0, 1), (100, 2)]);
    assert!(throttled.is_ended());
  }

  #[rxflow_macro::test]
  fn deactivation_cancels_the_trailing_timer() {
    TestScheduler::init();
    let bus = Bus::new();
    let throttled = bus.throttle(ms(100), ThrottleOptions::default(), TestScheduler);
    let listener = throttled.on_value(|_| {});

    feed(&bus, &[(0, 1), (10, 2)]);
    assert_eq!(TestScheduler::pending_count(), 1);
    throttled.off(&listener);
    assert!(TestScheduler::is_empty());
    assert!(!bus.is_active());
  }

  #[rxflow_macro::test]
  fn initial_value_is_not_throttled() {
    TestScheduler::init();
    let bus = Bus::<i32>::new();
    let prop = bus
      .to_property_with(1)
      .throttle(ms(100), ThrottleOptions::default(), TestScheduler);
    assert_eq!(prop.value(), Some(1));
    assert!(TestScheduler::is_empty());
  }
}
