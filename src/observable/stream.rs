use std::{convert::Infallible, fmt::Debug};

use crate::{
  node::{Idle, Kind, Node, NodeRef},
  observable::{
    create::{BinderCore, Emitter, OnceCore},
    Observable,
  },
};

/// A node without a current value; subscribers only see what is sent after
/// they arrive.
pub struct Stream<T, E = Infallible>(NodeRef<T, E>);

impl<T, E> Stream<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  /// Wraps a stream node.
  pub fn from_node(node: NodeRef<T, E>) -> Self { Self(node) }

  /// A stream that has already ended.
  pub fn never() -> Self {
    let node: NodeRef<T, E> = Node::new("never", Kind::Stream, Idle);
    node.send_end();
    Self(node)
  }

  /// Emits `value` to whoever activates the stream first, then ends.
  pub fn once(value: T) -> Self { Self(OnceCore::build(value)) }

  /// A stream fed by `binder` while it is active.
  ///
  /// `binder` runs on every activation with an [`Emitter`] for the stream. The
  /// closure it may return runs on the matching deactivation.
  ///
  /// ```rust
  /// use std::{cell::Cell, rc::Rc};
  ///
  /// use rxflow::prelude::*;
  ///
  /// let bound = Rc::new(Cell::new(false));
  /// let c_bound = bound.clone();
  /// let stream = Stream::<i32>::from_binder(move |emitter| {
  ///   c_bound.set(true);
  ///   emitter.value(1);
  ///   let c_bound = c_bound.clone();
  ///   Some(Box::new(move || c_bound.set(false)))
  /// });
  ///
  /// let listener = stream.on_value(|v| assert_eq!(v, 1));
  /// assert!(bound.get());
  /// stream.off(&listener);
  /// assert!(!bound.get());
  /// ```
  pub fn from_binder<F>(binder: F) -> Self
  where
    F: Fn(Emitter<T, E>) -> Option<Box<dyn FnOnce()>> + 'static,
  {
    Self(BinderCore::build(binder))
  }
}

impl<T, E> Observable<T, E> for Stream<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  type With<U> = Stream<U, E> where U: Clone + 'static;

  const KIND: Kind = Kind::Stream;

  #[inline]
  fn node(&self) -> &NodeRef<T, E> { &self.0 }

  fn wrap<U: Clone + 'static>(node: NodeRef<U, E>) -> Stream<U, E> { Stream(node) }
}

impl<T, E> Clone for Stream<T, E> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, E> Debug for Stream<T, E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Stream").field(&format_args!("{}", self.0)).finish()
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn never_is_ended() {
    let never = Stream::<i32>::never();
    let ended = Rc::new(Cell::new(false));
    let c_ended = ended.clone();
    never.on_end(move || c_ended.set(true));
    assert!(ended.get());
    assert!(never.is_ended());
  }

  #[rxflow_macro::test]
  fn once_emits_to_the_first_subscriber() {
    let once = Stream::<&str>::once("hi");
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let ended = Rc::new(Cell::new(false));
    let c_ended = ended.clone();
    once.on_end(move || c_ended.set(true));
    assert!(!ended.get());

    once.on_value(move |v| c_seen.borrow_mut().push(v));
    assert_eq!(*seen.borrow(), vec!["hi"]);
    assert!(ended.get());
  }

  #[rxflow_macro::test]
  fn binder_runs_per_activation() {
    let binds = Rc::new(Cell::new(0));
    let unbinds = Rc::new(Cell::new(0));
    let (c_binds, c_unbinds) = (binds.clone(), unbinds.clone());
    let stream = Stream::<i32, String>::from_binder(move |emitter| {
      c_binds.set(c_binds.get() + 1);
      emitter.error("warming up".to_string());
      let c_unbinds = c_unbinds.clone();
      Some(Box::new(move || c_unbinds.set(c_unbinds.get() + 1)))
    });

    for _ in 0..2 {
      let errors = Rc::new(RefCell::new(vec![]));
      let c_errors = errors.clone();
      let listener = stream.on_error(move |e| c_errors.borrow_mut().push(e));
      assert_eq!(*errors.borrow(), vec!["warming up".to_string()]);
      stream.off(&listener);
    }
    assert_eq!(binds.get(), 2);
    assert_eq!(unbinds.get(), 2);
  }

  #[rxflow_macro::test]
  fn binder_may_end_the_stream() {
    let unbound = Rc::new(Cell::new(false));
    let c_unbound = unbound.clone();
    let stream = Stream::<i32>::from_binder(move |emitter| {
      emitter.value(1).value(2).end();
      let c_unbound = c_unbound.clone();
      Some(Box::new(move || c_unbound.set(true)))
    });
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    stream.on_value(move |v| c_seen.borrow_mut().push(v));

    assert_eq!(*seen.borrow(), vec![1, 2]);
    assert!(stream.is_ended());
    assert!(unbound.get());
  }
}
