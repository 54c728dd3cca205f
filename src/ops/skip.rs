use std::cell::Cell;

use crate::{node::NodeRef, ops::Operator};

/// Drops the first `n` values.
pub struct SkipOp {
  remaining: Cell<usize>,
}

impl SkipOp {
  pub fn new(n: usize) -> Self { Self { remaining: Cell::new(n) } }
}

impl<T, E> Operator<T, E> for SkipOp
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  type Out = T;

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<T, E>) {
    match self.remaining.get() {
      0 => out.send_value(value),
      n => self.remaining.set(n - 1),
    }
  }
}
