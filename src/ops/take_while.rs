use crate::{node::NodeRef, ops::Operator};

/// Passes values while `predicate` holds and ends on the first one it rejects.
pub struct TakeWhileOp<F>(pub F);

impl<T, E, F> Operator<T, E> for TakeWhileOp<F>
where
  T: Clone + 'static,
  E: Clone + 'static,
  F: Fn(&T) -> bool + 'static,
{
  type Out = T;

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<T, E>) {
    if (self.0)(&value) {
      out.send_value(value);
    } else {
      out.send_end();
    }
  }
}
