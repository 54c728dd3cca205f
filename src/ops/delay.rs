use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
  arena::Arena,
  node::NodeRef,
  ops::Operator,
  scheduler::{Scheduler, TaskHandle},
};

#[derive(Default)]
struct DelayState {
  timers: Arena<TaskHandle>,
  end_pending: bool,
}

impl DelayState {
  fn cancel_all(&mut self) {
    for task in self.timers.drain() {
      task.cancel();
    }
  }
}

/// Shifts every value and the end forward in time by `wait`.
pub struct DelayOp<S> {
  wait: Duration,
  scheduler: S,
  state: Rc<RefCell<DelayState>>,
}

impl<S> DelayOp<S> {
  pub fn new(wait: Duration, scheduler: S) -> Self {
    Self { wait, scheduler, state: Rc::default() }
  }
}

impl<T, E, S> Operator<T, E> for DelayOp<S>
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
    let id = self.state.borrow_mut().timers.reserve_id();
    let state = self.state.clone();
    let out = Rc::downgrade(out);
    let task = self.scheduler.schedule_after(self.wait, move || {
      state.borrow_mut().timers.remove(id);
      if let Some(out) = out.upgrade() {
        out.send_value(value);
      }
    });
    self.state.borrow_mut().timers.insert(id, task);
  }

  fn handle_end(&self, out: &NodeRef<T, E>) {
    // Nothing can be in flight while nobody listens.
    if !out.is_active() {
      out.send_end();
      return;
    }
    let id = {
      let mut state = self.state.borrow_mut();
      state.end_pending = true;
      state.timers.reserve_id()
    };
    let state = self.state.clone();
    let out = Rc::downgrade(out);
    let task = self.scheduler.schedule_after(self.wait, move || {
      {
        let mut state = state.borrow_mut();
        state.timers.remove(id);
        state.end_pending = false;
      }
      if let Some(out) = out.upgrade() {
        out.send_end();
      }
    });
    self.state.borrow_mut().timers.insert(id, task);
  }

  fn deactivate(&self, out: &NodeRef<T, E>) {
    let end = {
      let mut state = self.state.borrow_mut();
      state.cancel_all();
      std::mem::take(&mut state.end_pending)
    };
    if end {
      out.send_end();
    }
  }

  fn free(&self) { self.state.borrow_mut().cancel_all(); }
}
