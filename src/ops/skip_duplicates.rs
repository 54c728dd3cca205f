use std::cell::RefCell;

use crate::{node::NodeRef, ops::Operator};

/// Drops a value when `same(&prev, &x)` holds for the previous value.
pub struct SkipDuplicatesOp<T, F> {
  prev: RefCell<Option<T>>,
  same: F,
}

impl<T, F> SkipDuplicatesOp<T, F> {
  pub fn new(same: F) -> Self { Self { prev: RefCell::new(None), same } }
}

impl<T, E, F> Operator<T, E> for SkipDuplicatesOp<T, F>
where
  T: Clone + 'static,
  E: Clone + 'static,
  F: Fn(&T, &T) -> bool + 'static,
{
  type Out = T;

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<T, E>) {
    let prev = self.prev.replace(Some(value.clone()));
    let duplicate = prev.is_some_and(|prev| (self.same)(&prev, &value));
    if !duplicate {
      out.send_value(value);
    }
  }

  fn free(&self) { self.prev.borrow_mut().take(); }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn drops_consecutive_repeats() {
    let bus = Bus::<i32>::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    bus
      .skip_duplicates()
      .on_value(move |v| c_seen.borrow_mut().push(v));
    for v in [1, 1, 2, 2, 1, 3, 3] {
      bus.push(v);
    }
    assert_eq!(*seen.borrow(), vec![1, 2, 1, 3]);
  }

  #[rxflow_macro::test]
  fn custom_comparison_still_tracks_every_value() {
    let bus = Bus::<i32>::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    bus
      .skip_duplicates_by(|a, b| (a - b).abs() <= 1)
      .on_value(move |v| c_seen.borrow_mut().push(v));
    // 2 is dropped against 1, 3 against 2.
    for v in [1, 2, 3, 5] {
      bus.push(v);
    }
    assert_eq!(*seen.borrow(), vec![1, 5]);
  }
}
