use std::{
  cell::Cell,
  rc::{Rc, Weak},
};

use crate::{
  node::{Kind, Lifecycle, Node, NodeRef},
  pluggable::{Pluggable, Plugged},
};

pub struct MergeCore<T, E> {
  me: Weak<Node<T, E, Self>>,
  plugged: Plugged<T, E>,
  building: Cell<bool>,
}

impl<T, E> Pluggable<T, E> for MergeCore<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  fn plugged(&self) -> &Plugged<T, E> { &self.plugged }

  fn after_unplug(node: &Rc<Node<T, E, Self>>) {
    let core = node.hooks();
    if !core.building.get() && core.plugged.is_empty() {
      node.send_end();
    }
  }
}

impl<T, E> Lifecycle for MergeCore<T, E>
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

/// A stream of everything `sources` emit. Ends once every source has ended;
/// with no sources it is ended from the start.
pub fn merge<T, E>(sources: Vec<NodeRef<T, E>>) -> NodeRef<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  let node = Node::new_cyclic("merge", Kind::Stream, |me| MergeCore {
    me: me.clone(),
    plugged: Plugged::default(),
    building: Cell::new(true),
  });
  for source in &sources {
    Plugged::plug(&node, source);
  }
  node.hooks().building.set(false);
  if node.hooks().plugged.is_empty() {
    node.send_end();
  }
  node
}
