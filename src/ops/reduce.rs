use std::cell::RefCell;

use crate::{node::NodeRef, ops::Operator};

/// Folds values silently and emits the result once, when the source ends.
pub struct ReduceOp<U, F> {
  acc: RefCell<Option<U>>,
  func: F,
}

impl<U, F> ReduceOp<U, F> {
  pub fn new(seed: U, func: F) -> Self { Self { acc: RefCell::new(Some(seed)), func } }
}

impl<T, E, U, F> Operator<T, E> for ReduceOp<U, F>
where
  E: Clone + 'static,
  U: Clone + 'static,
  F: Fn(U, T) -> U + 'static,
{
  type Out = U;

  fn handle_value(&self, value: T, _: bool, _: &NodeRef<U, E>) {
    let acc = self.acc.borrow_mut().take();
    if let Some(acc) = acc {
      let next = (self.func)(acc, value);
      *self.acc.borrow_mut() = Some(next);
    }
  }

  fn handle_end(&self, out: &NodeRef<U, E>) {
    let acc = self.acc.borrow_mut().take();
    if let Some(acc) = acc {
      out.send_value(acc);
    }
    out.send_end();
  }

  fn free(&self) { self.acc.borrow_mut().take(); }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn emits_once_on_end() {
    let bus = Bus::<i32>::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let total = bus.reduce(100, |acc, v| acc + v);
    total.on_value(move |v| c_seen.borrow_mut().push(v));
    for v in 1..=4 {
      bus.push(v);
    }
    assert!(seen.borrow().is_empty());
    bus.end();
    assert_eq!(*seen.borrow(), vec![110]);
    assert!(total.is_ended());
  }

  #[rxflow_macro::test]
  fn empty_source_emits_the_seed() {
    let total = Stream::<i32>::never().reduce(7, |acc, v| acc + v);
    assert_eq!(total.value(), Some(7));
    assert!(total.is_ended());
  }
}
