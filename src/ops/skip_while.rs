use std::cell::RefCell;

use crate::{node::NodeRef, ops::Operator};

/// Drops values while `predicate` holds. The predicate is discarded after the
/// first value it rejects; everything from there on passes.
pub struct SkipWhileOp<F> {
  predicate: RefCell<Option<F>>,
}

impl<F> SkipWhileOp<F> {
  pub fn new(predicate: F) -> Self { Self { predicate: RefCell::new(Some(predicate)) } }
}

impl<T, E, F> Operator<T, E> for SkipWhileOp<F>
where
  T: Clone + 'static,
  E: Clone + 'static,
  F: Fn(&T) -> bool + 'static,
{
  type Out = T;

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<T, E>) {
    let skip = match &*self.predicate.borrow() {
      Some(predicate) => predicate(&value),
      None => false,
    };
    if skip {
      return;
    }
    self.predicate.borrow_mut().take();
    out.send_value(value);
  }

  fn free(&self) { self.predicate.borrow_mut().take(); }
}
