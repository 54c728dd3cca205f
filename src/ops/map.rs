use crate::{
  node::NodeRef,
  ops::Operator,
  signal::Signal,
};

/// Emits `func(x)` for every value.
pub struct MapOp<F>(pub F);

impl<T, E, U, F> Operator<T, E> for MapOp<F>
where
  E: Clone + 'static,
  U: Clone + 'static,
  F: Fn(T) -> U + 'static,
{
  type Out = U;

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<U, E>) { out.send_value((self.0)(value)) }
}

/// Lets the mapper decide which signal to send for each value; `None` sends
/// nothing.
pub struct MapSignalOp<F>(pub F);

impl<T, E, U, F> Operator<T, E> for MapSignalOp<F>
where
  E: Clone + 'static,
  U: Clone + 'static,
  F: Fn(T) -> Option<Signal<U, E>> + 'static,
{
  type Out = U;

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<U, E>) {
    if let Some(signal) = (self.0)(value) {
      out.send(signal);
    }
  }
}
