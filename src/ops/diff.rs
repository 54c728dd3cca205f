use std::cell::RefCell;

use crate::{node::NodeRef, ops::Operator};

/// Emits `func(&prev, &x)` and remembers `x` as the next `prev`.
pub struct DiffOp<T, F> {
  prev: RefCell<T>,
  func: F,
}

impl<T, F> DiffOp<T, F> {
  pub fn new(seed: T, func: F) -> Self { Self { prev: RefCell::new(seed), func } }
}

impl<T, E, U, F> Operator<T, E> for DiffOp<T, F>
where
  T: Clone + 'static,
  E: Clone + 'static,
  U: Clone + 'static,
  F: Fn(&T, &T) -> U + 'static,
{
  type Out = U;

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<U, E>) {
    let prev = self.prev.replace(value.clone());
    out.send_value((self.func)(&prev, &value));
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn differences_from_seed() {
    let bus = Bus::<i32>::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    bus
      .diff(0, |prev, next| next - prev)
      .on_value(move |v| c_seen.borrow_mut().push(v));
    for v in [1, 3, 6, 6] {
      bus.push(v);
    }
    assert_eq!(*seen.borrow(), vec![1, 2, 3, 0]);
  }
}
