use std::cell::RefCell;

use crate::{node::NodeRef, ops::Operator};

/// Folds values into a running accumulator and emits every step.
///
/// The seed is emitted at construction, so the resulting property always has
/// a value.
pub struct ScanOp<U, F> {
  seed: RefCell<Option<U>>,
  func: F,
}

impl<U, F> ScanOp<U, F> {
  pub fn new(seed: U, func: F) -> Self { Self { seed: RefCell::new(Some(seed)), func } }
}

impl<T, E, U, F> Operator<T, E> for ScanOp<U, F>
where
  E: Clone + 'static,
  U: Clone + 'static,
  F: Fn(U, T) -> U + 'static,
{
  type Out = U;

  fn init(&self, out: &NodeRef<U, E>) {
    if let Some(seed) = self.seed.borrow_mut().take() {
      out.send_value(seed);
    }
  }

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<U, E>) {
    if let Some(acc) = out.value() {
      out.send_value((self.func)(acc, value));
    }
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn running_total() {
    let bus = Bus::<i32>::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let sum = bus.scan(0, |acc, v| acc + v);
    sum.on_value(move |v| c_seen.borrow_mut().push(v));
    for v in 1..=3 {
      bus.push(v);
    }
    assert_eq!(*seen.borrow(), vec![0, 1, 3, 6]);
    assert_eq!(sum.value(), Some(6));
  }

  #[rxflow_macro::test]
  fn folds_the_initial_value_of_a_property() {
    let prop = Bus::<i32>::new().to_property_with(5);
    assert_eq!(prop.scan(10, |acc, v| acc + v).value(), Some(15));
  }
}
