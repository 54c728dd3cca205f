//! Periodic generators.
//!
//! Every generator here is cold: its periodic task is scheduled when the
//! stream activates and cancelled when it deactivates, so nothing ticks while
//! nobody listens.
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc, time::Duration};
//!
//! use rxflow::{observable::interval::sequentially, prelude::*};
//!
//! TestScheduler::init();
//! let s: Stream<char> = sequentially(Duration::from_millis(10), vec!['a', 'b'], TestScheduler);
//! let seen = Rc::new(RefCell::new(vec![]));
//! let c_seen = seen.clone();
//! s.on_value(move |c| c_seen.borrow_mut().push(c));
//!
//! TestScheduler::advance_by(Duration::from_millis(20));
//! assert_eq!(*seen.borrow(), vec!['a', 'b']);
//! assert!(s.is_ended());
//! ```

use std::{
  cell::RefCell,
  collections::VecDeque,
  rc::{Rc, Weak},
  time::Duration,
};

use crate::{
  node::{Kind, Lifecycle, Node, NodeRef},
  observable::Stream,
  scheduler::{Scheduler, TaskHandle},
};

/// What a generator emits on each tick.
enum Ticker<T> {
  Constant(T),
  Poll(Rc<dyn Fn() -> T>),
  Sequence(VecDeque<T>),
  Cycle { items: Vec<T>, next: usize },
  Once(Option<T>),
}

enum Tick<T> {
  Emit(T),
  Poll(Rc<dyn Fn() -> T>),
  /// Emit, then end.
  Last(T),
  Finish,
  Skip,
}

impl<T: Clone> Ticker<T> {
  fn advance(&mut self) -> Tick<T> {
    match self {
      Ticker::Constant(x) => Tick::Emit(x.clone()),
      Ticker::Poll(f) => Tick::Poll(f.clone()),
      Ticker::Sequence(xs) => match xs.pop_front() {
        Some(x) if xs.is_empty() => Tick::Last(x),
        Some(x) => Tick::Emit(x),
        None => Tick::Finish,
      },
      Ticker::Cycle { items, next } => {
        if items.is_empty() {
          return Tick::Skip;
        }
        let x = items[*next].clone();
        *next = (*next + 1) % items.len();
        Tick::Emit(x)
      }
      Ticker::Once(x) => x.take().map_or(Tick::Finish, Tick::Last),
    }
  }
}

struct PeriodicCore<T, E, S> {
  me: Weak<Node<T, E, Self>>,
  wait: Duration,
  scheduler: S,
  ticker: RefCell<Ticker<T>>,
  task: RefCell<Option<TaskHandle>>,
}

impl<T, E, S> PeriodicCore<T, E, S>
where
  T: Clone + 'static,
  E: Clone + 'static,
  S: Scheduler,
{
  fn build(name: &'static str, wait: Duration, ticker: Ticker<T>, scheduler: S) -> Stream<T, E> {
    let node = Node::new_cyclic(name, Kind::Stream, |me| PeriodicCore {
      me: me.clone(),
      wait,
      scheduler,
      ticker: RefCell::new(ticker),
      task: RefCell::new(None),
    });
    let node: NodeRef<T, E> = node;
    Stream::from_node(node)
  }

  fn tick(node: &Node<T, E, Self>) {
    let tick = node.hooks().ticker.borrow_mut().advance();
    match tick {
      Tick::Emit(x) => node.send_value(x),
      Tick::Poll(f) => node.send_value(f()),
      Tick::Last(x) => {
        node.hooks().cancel();
        node.send_value(x);
        node.send_end();
      }
      Tick::Finish => {
        node.hooks().cancel();
        node.send_end();
      }
      Tick::Skip => {}
    }
  }

  fn cancel(&self) {
    let task = self.task.borrow_mut().take();
    if let Some(task) = task {
      task.cancel();
    }
  }
}

impl<T, E, S> Lifecycle for PeriodicCore<T, E, S>
where
  T: Clone + 'static,
  E: Clone + 'static,
  S: Scheduler,
{
  fn on_activate(&self) {
    // The task owns the node while it runs; listeners alone do not.
    let Some(node) = self.me.upgrade() else {
      return;
    };
    let task = self.scheduler.schedule_periodic(self.wait, move || Self::tick(&node));
    *self.task.borrow_mut() = Some(task);
  }

  fn on_deactivate(&self) { self.cancel() }
}

/// Emits `()` every `wait`.
pub fn ticks<E, S>(wait: Duration, scheduler: S) -> Stream<(), E>
where
  E: Clone + 'static,
  S: Scheduler,
{
  PeriodicCore::build("ticks", wait, Ticker::Constant(()), scheduler)
}

/// Emits `poll()` every `wait`.
pub fn from_poll<T, E, S, F>(wait: Duration, poll: F, scheduler: S) -> Stream<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
  S: Scheduler,
  F: Fn() -> T + 'static,
{
  PeriodicCore::build("from_poll", wait, Ticker::Poll(Rc::new(poll)), scheduler)
}

/// Emits `value` every `wait`.
pub fn interval<T, E, S>(wait: Duration, value: T, scheduler: S) -> Stream<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
  S: Scheduler,
{
  PeriodicCore::build("interval", wait, Ticker::Constant(value), scheduler)
}

/// Emits the items one per `wait` and ends with the last one.
pub fn sequentially<T, E, S>(wait: Duration, items: Vec<T>, scheduler: S) -> Stream<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
  S: Scheduler,
{
  PeriodicCore::build("sequentially", wait, Ticker::Sequence(items.into()), scheduler)
}

/// Cycles through the items forever, one per `wait`.
pub fn repeatedly<T, E, S>(wait: Duration, items: Vec<T>, scheduler: S) -> Stream<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
  S: Scheduler,
{
  PeriodicCore::build("repeatedly", wait, Ticker::Cycle { items, next: 0 }, scheduler)
}

/// Emits `value` once after `wait`, then ends.
pub fn later<T, E, S>(wait: Duration, value: T, scheduler: S) -> Stream<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
  S: Scheduler,
{
  PeriodicCore::build("later", wait, Ticker::Once(Some(value)), scheduler)
}
