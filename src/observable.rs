//! The [`Observable`] trait and the two node flavours built on it.
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use rxflow::prelude::*;
//!
//! let bus = Bus::<i32>::new();
//! let total = bus.filter(|v| v % 2 == 1).scan(0, |acc, v| acc + v);
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let c_seen = seen.clone();
//! total.on_value(move |v| c_seen.borrow_mut().push(v));
//!
//! for v in 1..=5 {
//!   bus.push(v);
//! }
//! assert_eq!(*seen.borrow(), vec![0, 1, 4, 9]);
//! ```

use std::{fmt::Debug, rc::Rc, time::Duration};

use crate::{
  binding::{Binding, Listener},
  log,
  node::{Kind, NodeRef},
  ops::{
    combine, conversion, delay::DelayOp, derive, diff::DiffOp, filter::FilterOp, flat_map,
    map::{MapOp, MapSignalOp},
    merge,
    reduce::ReduceOp,
    sampled_by,
    scan::ScanOp,
    skip::SkipOp,
    skip_duplicates::SkipDuplicatesOp,
    skip_while::SkipWhileOp,
    take::TakeOp,
    take_while::TakeWhileOp,
    throttle::{ThrottleOp, ThrottleOptions},
    Operator,
  },
  scheduler::Scheduler,
  signal::{Channel, Event, Flow, Signal},
};

mod create;
pub mod interval;
mod property;
mod stream;

pub use create::Emitter;
pub use property::Property;
pub use stream::Stream;

/// Anything backed by a node: streams, properties and buses.
///
/// Operators that keep the flavour of their source return [`Self::With`]; a
/// stream maps to a stream, a property to a property.
pub trait Observable<T, E>: Clone + 'static
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  type With<U>: Observable<U, E>
  where
    U: Clone + 'static;

  const KIND: Kind;

  fn node(&self) -> &NodeRef<T, E>;

  #[doc(hidden)]
  fn wrap<U: Clone + 'static>(node: NodeRef<U, E>) -> Self::With<U>;

  // ==========================================================================
  // Subscription
  // ==========================================================================

  fn on(&self, listener: Listener<T, E>) { self.node().subscribe(listener) }

  fn off(&self, listener: &Listener<T, E>) { self.node().unsubscribe(listener) }

  /// Subscribes `f` to values. Keep the returned listener to [`off`] it.
  ///
  /// [`off`]: Observable::off
  fn on_value<R, F>(&self, f: F) -> Listener<T, E>
  where
    R: Into<Flow>,
    F: Fn(T) -> R + 'static,
  {
    let listener = Listener::Value(Binding::new(f));
    self.on(listener.clone());
    listener
  }

  fn on_error<R, F>(&self, f: F) -> Listener<T, E>
  where
    R: Into<Flow>,
    F: Fn(E) -> R + 'static,
  {
    let listener = Listener::Error(Binding::new(f));
    self.on(listener.clone());
    listener
  }

  fn on_both<R, F>(&self, f: F) -> Listener<T, E>
  where
    R: Into<Flow>,
    F: Fn(Event<T, E>) -> R + 'static,
  {
    let listener = Listener::Both(Binding::new(f));
    self.on(listener.clone());
    listener
  }

  /// Runs `f` once the node ends; at once if it already has. Does not activate
  /// the node.
  fn on_end<R, F>(&self, f: F) -> Listener<T, E>
  where
    R: Into<Flow>,
    F: Fn() -> R + 'static,
  {
    let listener = Listener::End(Binding::new(move |_: ()| f()));
    self.on(listener.clone());
    listener
  }

  #[inline]
  fn is_ended(&self) -> bool { !self.node().is_alive() }

  #[inline]
  fn is_active(&self) -> bool { self.node().is_active() }

  // ==========================================================================
  // Unary operators
  // ==========================================================================

  /// Runs a custom [`Operator`] over this node.
  fn with_operator<Op: Operator<T, E>>(&self, name: &'static str, op: Op) -> Self::With<Op::Out> {
    Self::wrap(derive(self.node(), Self::KIND, name, op))
  }

  fn map<U, F>(&self, f: F) -> Self::With<U>
  where
    U: Clone + 'static,
    F: Fn(T) -> U + 'static,
  {
    self.with_operator("map", MapOp(f))
  }

  /// Maps every value to a whole signal: a value, an error, the end, or with
  /// `None` nothing at all.
  fn map_signal<U, F>(&self, f: F) -> Self::With<U>
  where
    U: Clone + 'static,
    F: Fn(T) -> Option<Signal<U, E>> + 'static,
  {
    self.with_operator("map_signal", MapSignalOp(f))
  }

  fn filter<F>(&self, predicate: F) -> Self::With<T>
  where
    F: Fn(&T) -> bool + 'static,
  {
    self.with_operator("filter", FilterOp(predicate))
  }

  /// Emits `f(&prev, &x)` for every value, `prev` starting at `seed`.
  fn diff<U, F>(&self, seed: T, f: F) -> Self::With<U>
  where
    U: Clone + 'static,
    F: Fn(&T, &T) -> U + 'static,
  {
    self.with_operator("diff", DiffOp::new(seed, f))
  }

  fn take_while<F>(&self, predicate: F) -> Self::With<T>
  where
    F: Fn(&T) -> bool + 'static,
  {
    self.with_operator("take_while", TakeWhileOp(predicate))
  }

  /// Emits the first `n` values and ends. `take(0)` is ended from the start.
  fn take(&self, n: usize) -> Self::With<T> { self.with_operator("take", TakeOp::new(n)) }

  fn skip(&self, n: usize) -> Self::With<T> { self.with_operator("skip", SkipOp::new(n)) }

  fn skip_duplicates(&self) -> Self::With<T>
  where
    T: PartialEq,
  {
    self.skip_duplicates_by(|a: &T, b: &T| a == b)
  }

  fn skip_duplicates_by<F>(&self, same: F) -> Self::With<T>
  where
    F: Fn(&T, &T) -> bool + 'static,
  {
    self.with_operator("skip_duplicates", SkipDuplicatesOp::new(same))
  }

  fn skip_while<F>(&self, predicate: F) -> Self::With<T>
  where
    F: Fn(&T) -> bool + 'static,
  {
    self.with_operator("skip_while", SkipWhileOp::new(predicate))
  }

  /// A property of the running fold, starting at `seed`.
  fn scan<U, F>(&self, seed: U, f: F) -> Property<U, E>
  where
    U: Clone + 'static,
    F: Fn(U, T) -> U + 'static,
  {
    Property::from_node(derive(self.node(), Kind::Property, "scan", ScanOp::new(seed, f)))
  }

  /// A property that gets the fold's result when this node ends.
  fn reduce<U, F>(&self, seed: U, f: F) -> Property<U, E>
  where
    U: Clone + 'static,
    F: Fn(U, T) -> U + 'static,
  {
    Property::from_node(derive(self.node(), Kind::Property, "reduce", ReduceOp::new(seed, f)))
  }

  /// A property of this node. A property converts to itself.
  fn to_property(&self) -> Property<T, E> {
    match Self::KIND {
      Kind::Property => Property::from_node(self.node().clone()),
      Kind::Stream => Property::from_node(derive(
        self.node(),
        Kind::Property,
        "to_property",
        conversion::ForwardOp,
      )),
    }
  }

  /// A property of this node holding `initial` until the next value. `initial`
  /// replaces the current value of a source property.
  fn to_property_with(&self, initial: T) -> Property<T, E> {
    let op = conversion::ToPropertyOp::new(initial);
    Property::from_node(derive(self.node(), Kind::Property, "to_property", op))
  }

  /// A stream of this node's future values. A stream converts to itself.
  fn changes(&self) -> Stream<T, E> {
    match Self::KIND {
      Kind::Stream => Stream::from_node(self.node().clone()),
      Kind::Property => {
        Stream::from_node(derive(self.node(), Kind::Stream, "changes", conversion::ForwardOp))
      }
    }
  }

  // ==========================================================================
  // Timing
  // ==========================================================================

  /// Emits at most one value per `wait`.
  fn throttle<S: Scheduler>(
    &self, wait: Duration, options: ThrottleOptions, scheduler: S,
  ) -> Self::With<T> {
    self.with_operator("throttle", ThrottleOp::new(wait, options, scheduler))
  }

  /// Emits every value and the end `wait` later.
  fn delay<S: Scheduler>(&self, wait: Duration, scheduler: S) -> Self::With<T> {
    self.with_operator("delay", DelayOp::new(wait, scheduler))
  }

  // ==========================================================================
  // Composition
  // ==========================================================================

  /// Emits this node's latest value whenever `sampler` emits. The result has
  /// the sampler's flavour and ends with it.
  fn sampled_by<X, S>(&self, sampler: &S) -> S::With<T>
  where
    X: Clone + 'static,
    S: Observable<X, E>,
  {
    self.sampled_by_with(sampler, |x, _| x)
  }

  fn sampled_by_with<X, U, S, F>(&self, sampler: &S, f: F) -> S::With<U>
  where
    X: Clone + 'static,
    U: Clone + 'static,
    S: Observable<X, E>,
    F: Fn(T, X) -> U + 'static,
  {
    S::wrap(sampled_by::sampled_by(self.node(), sampler.node(), S::KIND, f))
  }

  /// Merges the streams `f` returns for each value.
  fn flat_map<U, O, F>(&self, f: F) -> Stream<U, E>
  where
    U: Clone + 'static,
    O: Observable<U, E>,
    F: Fn(T) -> O + 'static,
  {
    Stream::from_node(flat_map::flat_map(self.node(), false, move |x| f(x).node().clone()))
  }

  /// Like [`flat_map`](Observable::flat_map), but only the latest inner stream
  /// stays plugged.
  fn flat_map_latest<U, O, F>(&self, f: F) -> Stream<U, E>
  where
    U: Clone + 'static,
    O: Observable<U, E>,
    F: Fn(T) -> O + 'static,
  {
    Stream::from_node(flat_map::flat_map(self.node(), true, move |x| f(x).node().clone()))
  }

  fn merge<O: Observable<T, E>>(&self, other: &O) -> Stream<T, E> {
    Stream::from_node(merge::merge(vec![self.node().clone(), other.node().clone()]))
  }

  /// Combines this node with `others` into a stream of their latest values.
  fn combine<O: Observable<T, E>>(&self, others: &[O]) -> Stream<Vec<T>, E> {
    self.combine_with(others, |values: &[T]| values.to_vec())
  }

  fn combine_with<O, U, F>(&self, others: &[O], f: F) -> Stream<U, E>
  where
    O: Observable<T, E>,
    U: Clone + 'static,
    F: Fn(&[T]) -> U + 'static,
  {
    let sources = std::iter::once(self.node().clone())
      .chain(others.iter().map(|o| o.node().clone()))
      .collect();
    Stream::from_node(combine::combine(sources, f))
  }

  // ==========================================================================
  // Logging
  // ==========================================================================

  /// Reports every signal through `tracing` under the `rxflow::log` target.
  fn log(&self, name: &'static str) -> &Self
  where
    T: Debug,
    E: Debug,
  {
    log::attach(self.node(), Rc::from(name), log::trace_sink);
    self
  }

  /// Like [`log`](Observable::log), named after the node (`[Stream map]`).
  fn log_default(&self) -> &Self
  where
    T: Debug,
    E: Debug,
  {
    log::attach(self.node(), Rc::from(self.node().to_string()), log::trace_sink);
    self
  }

  /// Hands every signal to `sink` as `(name, channel, payload)`.
  fn log_to<F>(&self, name: &'static str, sink: F) -> &Self
  where
    T: Debug,
    E: Debug,
    F: Fn(&str, Channel, String) + 'static,
  {
    log::attach(self.node(), Rc::from(name), sink);
    self
  }

  fn log_default_to<F>(&self, sink: F) -> &Self
  where
    T: Debug,
    E: Debug,
    F: Fn(&str, Channel, String) + 'static,
  {
    log::attach(self.node(), Rc::from(self.node().to_string()), sink);
    self
  }
}

/// Merges `sources` into one stream that ends once all of them have.
pub fn merge<T, E, O>(sources: impl IntoIterator<Item = O>) -> Stream<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
  O: Observable<T, E>,
{
  let sources = sources.into_iter().map(|o| o.node().clone()).collect();
  Stream::from_node(merge::merge(sources))
}

/// A stream of the latest values of all `sources`, emitted once each has one.
pub fn combine<T, E, O>(sources: impl IntoIterator<Item = O>) -> Stream<Vec<T>, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
  O: Observable<T, E>,
{
  combine_with(sources, |values: &[T]| values.to_vec())
}

pub fn combine_with<T, E, O, U, F>(sources: impl IntoIterator<Item = O>, f: F) -> Stream<U, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
  O: Observable<T, E>,
  U: Clone + 'static,
  F: Fn(&[T]) -> U + 'static,
{
  let sources = sources.into_iter().map(|o| o.node().clone()).collect();
  Stream::from_node(combine::combine(sources, f))
}

/// Combines `sources` and subscribes `f` to the combined values.
pub fn on_values<T, E, O, R, F>(sources: impl IntoIterator<Item = O>, f: F) -> Listener<Vec<T>, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
  O: Observable<T, E>,
  R: Into<Flow>,
  F: Fn(&[T]) -> R + 'static,
{
  combine(sources).on_value(move |values: Vec<T>| f(&values))
}
