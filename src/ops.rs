//! Single-source operators.
//!
//! Every unary operator is an [`Operator`] run by the same [`Adaptor`]. The
//! adaptor wires the derived node to its source in two tiers:
//!
//! - the source's `end` channel is watched from construction until the derived
//!   node dies, whether or not the derived node is ever active;
//! - the source's `both` channel is watched only while the derived node is
//!   active, so an inactive tail leaves the whole chain above it inactive.
//!
//! A property derived from a property that already holds a value gets that value
//! at construction, flagged as `initial`.

use std::{
  cell::RefCell,
  rc::{Rc, Weak},
};

use crate::{
  binding::{Binding, Listener},
  node::{Kind, Lifecycle, Node, NodeRef},
  signal::{Event, Flow},
};

pub mod combine;
pub mod conversion;
pub mod delay;
pub mod diff;
pub mod filter;
pub mod flat_map;
pub mod map;
pub mod merge;
pub mod reduce;
pub mod sampled_by;
pub mod scan;
pub mod skip;
pub mod skip_duplicates;
pub mod skip_while;
pub mod take;
pub mod take_while;
pub mod throttle;

/// Behaviour of a unary operator.
///
/// Handlers receive the output node and decide what, if anything, to send
/// through it. The defaults forward errors and the end unchanged.
pub trait Operator<T, E>: 'static {
  type Out: Clone + 'static;

  /// Runs once, before the initial value is handled.
  fn init(&self, _out: &NodeRef<Self::Out, E>) {}

  /// Runs once, after the initial value was handled.
  fn after_initial(&self, _out: &NodeRef<Self::Out, E>) {}

  fn handle_value(&self, value: T, initial: bool, out: &NodeRef<Self::Out, E>);

  fn handle_error(&self, error: E, out: &NodeRef<Self::Out, E>)
  where
    E: Clone + 'static,
  {
    out.send_error(error)
  }

  fn handle_end(&self, out: &NodeRef<Self::Out, E>)
  where
    E: Clone + 'static,
  {
    out.send_end()
  }

  /// The output node lost its last active listener.
  fn deactivate(&self, _out: &NodeRef<Self::Out, E>) {}

  /// The output node ended; release everything held.
  fn free(&self) {}
}

/// Lifecycle hooks connecting an [`Operator`] to its source.
pub struct Adaptor<T, E, Op: Operator<T, E>> {
  me: Weak<Node<Op::Out, E, Self>>,
  source: RefCell<Option<NodeRef<T, E>>>,
  events: RefCell<Option<Binding<Event<T, E>>>>,
  end: RefCell<Option<Binding<()>>>,
  op: Op,
}

/// Builds a node of `kind` running `op` over `source`.
pub fn derive<T, E, Op>(
  source: &NodeRef<T, E>, kind: Kind, name: &'static str, op: Op,
) -> NodeRef<Op::Out, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
  Op: Operator<T, E>,
{
  let node = Node::new_cyclic(name, kind, |me| Adaptor {
    me: me.clone(),
    source: RefCell::new(Some(source.clone())),
    events: RefCell::new(None),
    end: RefCell::new(None),
    op,
  });
  let out: NodeRef<Op::Out, E> = node.clone();
  let adaptor = node.hooks();

  adaptor.op.init(&out);
  if kind == Kind::Property {
    if let Some(value) = source.value() {
      adaptor.op.handle_value(value, true, &out);
    }
  }
  adaptor.op.after_initial(&out);

  if out.is_alive() {
    let end = Binding::bind_weak(&Rc::downgrade(&node), Adaptor::<T, E, Op>::on_end);
    *adaptor.end.borrow_mut() = Some(end.clone());
    source.subscribe_new(Listener::End(end));
  }
  out
}

impl<T, E, Op> Adaptor<T, E, Op>
where
  T: Clone + 'static,
  E: Clone + 'static,
  Op: Operator<T, E>,
{
  pub fn op(&self) -> &Op { &self.op }

  fn source(&self) -> Option<NodeRef<T, E>> { self.source.borrow().clone() }

  fn on_event(node: &Rc<Node<Op::Out, E, Self>>, event: Event<T, E>) -> Flow {
    let out: NodeRef<Op::Out, E> = node.clone();
    match event {
      Event::Value(v) => node.hooks().op.handle_value(v, false, &out),
      Event::Error(e) => node.hooks().op.handle_error(e, &out),
    }
    Flow::Continue
  }

  fn on_end(node: &Rc<Node<Op::Out, E, Self>>, _: ()) -> Flow {
    node.hooks().end.borrow_mut().take();
    let out: NodeRef<Op::Out, E> = node.clone();
    node.hooks().op.handle_end(&out);
    Flow::Continue
  }
}

impl<T, E, Op> Lifecycle for Adaptor<T, E, Op>
where
  T: Clone + 'static,
  E: Clone + 'static,
  Op: Operator<T, E>,
{
  fn on_activate(&self) {
    let (Some(me), Some(source)) = (self.me.upgrade(), self.source()) else {
      return;
    };
    let events = Binding::bind(&me, Self::on_event);
    *self.events.borrow_mut() = Some(events.clone());
    source.subscribe_new(Listener::Both(events));
  }

  fn on_deactivate(&self) {
    let events = self.events.borrow_mut().take();
    if let (Some(events), Some(source)) = (events, self.source()) {
      source.unsubscribe(&Listener::Both(events));
    }
    if let Some(me) = self.me.upgrade() {
      let out: NodeRef<Op::Out, E> = me;
      self.op.deactivate(&out);
    }
  }

  fn on_clear(&self) {
    let source = self.source.borrow_mut().take();
    let end = self.end.borrow_mut().take();
    if let (Some(source), Some(end)) = (&source, end) {
      source.unsubscribe(&Listener::End(end));
    }
    drop(source);
    self.op.free();
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, convert::Infallible};

  use super::*;
  use crate::node::Idle;

  struct Double {
    inits: Rc<Cell<u32>>,
  }

  impl Operator<i32, Infallible> for Double {
    type Out = i32;

    fn init(&self, _: &NodeRef<i32, Infallible>) { self.inits.set(self.inits.get() + 1); }

    fn handle_value(&self, value: i32, _: bool, out: &NodeRef<i32, Infallible>) {
      out.send_value(value * 2);
    }
  }

  fn double(source: &NodeRef<i32, Infallible>, kind: Kind) -> NodeRef<i32, Infallible> {
    derive(source, kind, "double", Double { inits: Rc::new(Cell::new(0)) })
  }

  #[rxflow_macro::test]
  fn end_wiring_is_independent_of_activation() {
    let source: NodeRef<i32, Infallible> = Node::new("source", Kind::Stream, Idle);
    let derived = double(&source, Kind::Stream);
    assert_eq!(source.subscriber_count(crate::signal::Channel::End), 1);
    assert!(!source.is_active());

    source.send_end();
    assert!(!derived.is_alive());
  }

  #[rxflow_macro::test]
  fn activation_propagates_upstream() {
    let source: NodeRef<i32, Infallible> = Node::new("source", Kind::Stream, Idle);
    let derived = double(&source, Kind::Stream);
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let listener = Listener::Value(Binding::new(move |v: i32| c_seen.borrow_mut().push(v)));

    derived.subscribe(listener.clone());
    assert!(source.is_active());
    source.send_value(2);

    derived.unsubscribe(&listener);
    assert!(!source.is_active());
    source.send_value(3);
    assert_eq!(*seen.borrow(), vec![4]);
  }

  #[rxflow_macro::test]
  fn initial_value_only_for_properties() {
    let source = Node::<i32, Infallible, _>::with_value("source", 5, Idle);
    let source: NodeRef<i32, Infallible> = source;
    assert_eq!(double(&source, Kind::Property).value(), Some(10));
    assert_eq!(double(&source, Kind::Stream).value(), None);
  }

  #[rxflow_macro::test]
  fn derived_from_ended_source_ends_at_construction() {
    let source: NodeRef<i32, Infallible> = Node::new("source", Kind::Stream, Idle);
    source.send_end();
    let inits = Rc::new(Cell::new(0));
    let derived = derive(&source, Kind::Stream, "double", Double { inits: inits.clone() });
    assert_eq!(inits.get(), 1);
    assert!(!derived.is_alive());
  }

  #[rxflow_macro::test]
  fn ending_releases_the_end_listener() {
    let source: NodeRef<i32, Infallible> = Node::new("source", Kind::Stream, Idle);
    let derived = double(&source, Kind::Stream);
    derived.send_end();
    assert_eq!(source.subscriber_count(crate::signal::Channel::End), 0);
  }
}
