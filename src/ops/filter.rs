use crate::{node::NodeRef, ops::Operator};

/// Passes the values `predicate` accepts.
pub struct FilterOp<F>(pub F);

impl<T, E, F> Operator<T, E> for FilterOp<F>
where
  T: Clone + 'static,
  E: Clone + 'static,
  F: Fn(&T) -> bool + 'static,
{
  type Out = T;

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<T, E>) {
    if (self.0)(&value) {
      out.send_value(value);
    }
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn keeps_matching_values() {
    let bus = Bus::<i32>::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    bus
      .filter(|v| v % 2 == 0)
      .on_value(move |v| c_seen.borrow_mut().push(v));
    for v in 0..6 {
      bus.push(v);
    }
    assert_eq!(*seen.borrow(), vec![0, 2, 4]);
  }

  #[rxflow_macro::test]
  fn rejected_initial_leaves_property_empty() {
    let prop = Stream::<i32>::never().to_property_with(1).filter(|v| *v > 1);
    assert!(!prop.has_value());
  }
}
