use std::{convert::Infallible, fmt::Debug};

use crate::{
  binding::{Binding, Listener},
  error::{Error, Result},
  node::{Kind, NodeRef},
  observable::Observable,
  signal::{Event, Flow},
};

/// A node that remembers its latest value and hands it to every new value or
/// both subscriber.
pub struct Property<T, E = Infallible>(NodeRef<T, E>);

impl<T, E> Property<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  /// Wraps a property node.
  pub fn from_node(node: NodeRef<T, E>) -> Self { Self(node) }

  #[inline]
  pub fn has_value(&self) -> bool { self.0.has_value() }

  /// The current value, if there is one.
  #[inline]
  pub fn value(&self) -> Option<T> { self.0.value() }

  /// The current value, or [`Error::NoValue`].
  pub fn get_value(&self) -> Result<T> {
    self.0.value().ok_or_else(|| Error::NoValue { node: self.0.to_string() })
  }

  /// Like [`Observable::on_value`] but without the replay of the current
  /// value.
  pub fn on_new_value<R, F>(&self, f: F) -> Listener<T, E>
  where
    R: Into<Flow>,
    F: Fn(T) -> R + 'static,
  {
    let listener = Listener::Value(Binding::new(f));
    self.0.subscribe_new(listener.clone());
    listener
  }

  pub fn on_new_both<R, F>(&self, f: F) -> Listener<T, E>
  where
    R: Into<Flow>,
    F: Fn(Event<T, E>) -> R + 'static,
  {
    let listener = Listener::Both(Binding::new(f));
    self.0.subscribe_new(listener.clone());
    listener
  }
}

impl<T, E> Observable<T, E> for Property<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  type With<U> = Property<U, E> where U: Clone + 'static;

  const KIND: Kind = Kind::Property;

  #[inline]
  fn node(&self) -> &NodeRef<T, E> { &self.0 }

  fn wrap<U: Clone + 'static>(node: NodeRef<U, E>) -> Property<U, E> { Property(node) }
}

impl<T, E> Clone for Property<T, E> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, E> Debug for Property<T, E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Property").field(&format_args!("{}", self.0)).finish()
  }
}
