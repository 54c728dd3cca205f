//! A stream fed by hand.
//!
//! A [`Bus`] is a stream with `push`, `error` and `end`, plus `plug`/`unplug`
//! to forward other nodes into it. It never ends on its own, not even when
//! every plugged source has ended.

use std::{
  convert::Infallible,
  fmt::Debug,
  rc::{Rc, Weak},
};

use crate::{
  error::{Error, Result},
  node::{Kind, Lifecycle, Node, NodeRef},
  observable::{Observable, Stream},
  pluggable::{Pluggable, Plugged},
  signal::Signal,
};

pub struct BusCore<T, E> {
  me: Weak<Node<T, E, Self>>,
  plugged: Plugged<T, E>,
}

impl<T, E> Pluggable<T, E> for BusCore<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  fn plugged(&self) -> &Plugged<T, E> { &self.plugged }
}

impl<T, E> Lifecycle for BusCore<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  fn on_activate(&self) {
    if let Some(me) = self.me.upgrade() {
      Plugged::activate(&me);
    }
  }

  fn on_deactivate(&self) { self.plugged.deactivate() }

  fn on_clear(&self) { self.plugged.clear() }
}

pub struct Bus<T, E = Infallible> {
  core: Rc<Node<T, E, BusCore<T, E>>>,
  node: NodeRef<T, E>,
}

impl<T, E> Bus<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  pub fn new() -> Self {
    let core = Node::new_cyclic("bus", Kind::Stream, |me| BusCore {
      me: me.clone(),
      plugged: Plugged::default(),
    });
    let node: NodeRef<T, E> = core.clone();
    Self { core, node }
  }

  pub fn push(&self, value: T) -> &Self {
    self.node.send_value(value);
    self
  }

  pub fn error(&self, error: E) -> &Self {
    self.node.send_error(error);
    self
  }

  pub fn end(&self) -> &Self {
    self.node.send_end();
    self
  }

  pub fn emit(&self, signal: Signal<T, E>) -> &Self {
    self.node.send(signal);
    self
  }

  /// Pushes `value`, or reports that the bus already ended.
  pub fn try_push(&self, value: T) -> Result<()> {
    self.ensure_alive()?;
    self.node.send_value(value);
    Ok(())
  }

  pub fn try_error(&self, error: E) -> Result<()> {
    self.ensure_alive()?;
    self.node.send_error(error);
    Ok(())
  }

  /// Forwards the values and errors of `source` while both are alive.
  pub fn plug<O: Observable<T, E>>(&self, source: &O) -> &Self {
    Plugged::plug(&self.core, source.node());
    self
  }

  pub fn unplug<O: Observable<T, E>>(&self, source: &O) -> &Self {
    Plugged::unplug_source(&self.core, source.node());
    self
  }

  /// Number of plugged sources that have not ended.
  pub fn plugged_count(&self) -> usize { self.core.hooks().plugged.len() }

  fn ensure_alive(&self) -> Result<()> {
    if self.node.is_alive() {
      Ok(())
    } else {
      Err(Error::Ended { node: self.node.to_string() })
    }
  }
}

impl<T, E> Default for Bus<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  fn default() -> Self { Self::new() }
}

impl<T, E> Observable<T, E> for Bus<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  type With<U> = Stream<U, E> where U: Clone + 'static;

  const KIND: Kind = Kind::Stream;

  #[inline]
  fn node(&self) -> &NodeRef<T, E> { &self.node }

  fn wrap<U: Clone + 'static>(node: NodeRef<U, E>) -> Stream<U, E> { Stream::from_node(node) }
}

impl<T, E> Clone for Bus<T, E> {
  fn clone(&self) -> Self { Self { core: self.core.clone(), node: self.node.clone() } }
}

impl<T, E> Debug for Bus<T, E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Bus").field(&format_args!("{}", self.node)).finish()
  }
}
