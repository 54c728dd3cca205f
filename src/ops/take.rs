use std::cell::Cell;

use crate::{node::NodeRef, ops::Operator};

/// Passes the first `n` values, then ends.
pub struct TakeOp {
  remaining: Cell<usize>,
}

impl TakeOp {
  pub fn new(n: usize) -> Self { Self { remaining: Cell::new(n) } }
}

impl<T, E> Operator<T, E> for TakeOp
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  type Out = T;

  fn init(&self, out: &NodeRef<T, E>) {
    if self.remaining.get() == 0 {
      out.send_end();
    }
  }

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<T, E>) {
    let Some(remaining) = self.remaining.get().checked_sub(1) else {
      return;
    };
    self.remaining.set(remaining);
    out.send_value(value);
    if remaining == 0 {
      out.send_end();
    }
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn takes_then_ends() {
    let bus = Bus::<i32>::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let ended = Rc::new(RefCell::new(false));
    let (c_seen, c_ended) = (seen.clone(), ended.clone());
    let taken = bus.take(3);
    taken.on_value(move |v| c_seen.borrow_mut().push(v));
    taken.on_end(move || *c_ended.borrow_mut() = true);
    for v in 1..=5 {
      bus.push(v);
    }
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    assert!(*ended.borrow());
  }

  #[rxflow_macro::test]
  fn take_zero_ends_immediately() {
    let bus = Bus::<i32>::new();
    let taken = bus.take(0);
    assert!(taken.is_ended());
    assert_eq!(bus.node().subscriber_count(Channel::End), 0);
  }

  #[rxflow_macro::test]
  fn initial_counts_towards_the_limit() {
    let bus = Bus::<i32>::new();
    let prop = bus.to_property_with(1).take(1);
    assert_eq!(prop.value(), Some(1));
    assert!(prop.is_ended());
  }
}
