//! Conversions between streams and properties.

use std::cell::RefCell;

use crate::{node::NodeRef, ops::Operator};

/// Forwards everything unchanged. Backs `changes()` on properties and
/// `to_property()` on streams.
pub struct ForwardOp;

impl<T, E> Operator<T, E> for ForwardOp
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  type Out = T;

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<T, E>) { out.send_value(value) }
}

/// Forwards everything and sends `initial` right after construction,
/// replacing any value taken over from a source property.
pub struct ToPropertyOp<T> {
  initial: RefCell<Option<T>>,
}

impl<T> ToPropertyOp<T> {
  pub fn new(initial: T) -> Self { Self { initial: RefCell::new(Some(initial)) } }
}

impl<T, E> Operator<T, E> for ToPropertyOp<T>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  type Out = T;

  fn after_initial(&self, out: &NodeRef<T, E>) {
    if let Some(initial) = self.initial.borrow_mut().take() {
      out.send_value(initial);
    }
  }

  fn handle_value(&self, value: T, _: bool, out: &NodeRef<T, E>) { out.send_value(value) }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn stream_to_property_caches() {
    let bus = Bus::<i32>::new();
    let prop = bus.to_property();
    assert!(!prop.has_value());
    prop.on_value(|_| {});
    bus.push(4);
    assert_eq!(prop.value(), Some(4));
  }

  #[rxflow_macro::test]
  fn initial_overrides_the_source_value() {
    let prop = Bus::<i32>::new().to_property_with(1);
    assert_eq!(prop.to_property_with(2).value(), Some(2));
    assert_eq!(prop.to_property().value(), Some(1));
  }

  #[rxflow_macro::test]
  fn property_to_property_is_identity() {
    let prop = Bus::<i32>::new().to_property_with(1);
    assert!(std::rc::Rc::ptr_eq(prop.node(), prop.to_property().node()));
  }

  #[rxflow_macro::test]
  fn changes_skip_the_current_value() {
    let bus = Bus::<i32>::new();
    let prop = bus.to_property_with(1);
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let changes = prop.changes();
    changes.on_value(move |v| c_seen.borrow_mut().push(v));
    bus.push(2);
    assert_eq!(*seen.borrow(), vec![2]);
    assert!(!changes.node().has_value());
  }

  #[rxflow_macro::test]
  fn stream_changes_is_identity() {
    let bus = Bus::<i32>::new();
    let stream = bus.changes();
    assert!(std::rc::Rc::ptr_eq(bus.node(), stream.node()));
  }
}
