//! Dynamic upstream sets shared by bus, merge and the flat-map family.
//!
//! A pluggable node keeps an arena of plugged sources. Each plug watches its
//! source's `end` channel for as long as it is plugged, and its `both` channel
//! only while the owning node is active. A plugged source that ends is
//! unplugged automatically.

use std::{cell::RefCell, rc::Rc};

use crate::{
  arena::Arena,
  binding::{Binding, Listener},
  node::{Lifecycle, Node, NodeRef},
  signal::{Event, Flow},
};

struct Plug<T, E> {
  source: NodeRef<T, E>,
  events: Option<Binding<Event<T, E>>>,
  end: Option<Binding<()>>,
}

/// The plugged sources of one node.
pub struct Plugged<T, E> {
  plugs: RefCell<Arena<Plug<T, E>>>,
}

impl<T, E> Default for Plugged<T, E> {
  fn default() -> Self { Self { plugs: RefCell::new(Arena::new()) } }
}

/// Hooks of a node built on [`Plugged`].
pub trait Pluggable<T, E>: Lifecycle + Sized
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  fn plugged(&self) -> &Plugged<T, E>;

  /// A source left the set, because it ended or was unplugged.
  fn after_unplug(_node: &Rc<Node<T, E, Self>>) {}
}

fn on_plugged_event<T, E, H>(node: &Rc<Node<T, E, H>>, event: Event<T, E>) -> Flow
where
  T: Clone + 'static,
  E: Clone + 'static,
  H: Pluggable<T, E>,
{
  node.send_event(event);
  Flow::Continue
}

fn on_plugged_end<T, E, H>(node: &Rc<Node<T, E, H>>, id: &usize, _: ()) -> Flow
where
  T: Clone + 'static,
  E: Clone + 'static,
  H: Pluggable<T, E>,
{
  Plugged::<T, E>::unplug(node, *id);
  Flow::Continue
}

impl<T, E> Plugged<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  pub fn len(&self) -> usize { self.plugs.borrow().len() }

  pub fn is_empty(&self) -> bool { self.plugs.borrow().is_empty() }

  pub fn ids(&self) -> Vec<usize> { self.plugs.borrow().iter().map(|(id, _)| id).collect() }

  /// Adds `source` to the set of `node`. Returns the plug id, or `None` when
  /// `node` already ended.
  ///
  /// An already ended source is unplugged again before this returns.
  pub fn plug<H: Pluggable<T, E>>(
    node: &Rc<Node<T, E, H>>, source: &NodeRef<T, E>,
  ) -> Option<usize> {
    if !node.is_alive() {
      return None;
    }
    let plugged = node.hooks().plugged();
    let plug = Plug { source: source.clone(), events: None, end: None };
    let id = plugged.plugs.borrow_mut().add(plug);
    if node.is_active() {
      Self::connect(node, id);
    }
    let end = Binding::bind_weak_with(&Rc::downgrade(node), id, on_plugged_end::<T, E, H>);
    match plugged.plugs.borrow_mut().get_mut(id) {
      Some(plug) => plug.end = Some(end.clone()),
      None => return Some(id),
    }
    source.subscribe_new(Listener::End(end));
    Some(id)
  }

  /// Removes the plug `id` from `node`. Unknown ids are ignored.
  pub fn unplug<H: Pluggable<T, E>>(node: &Rc<Node<T, E, H>>, id: usize) {
    if !node.is_alive() {
      return;
    }
    let plug = node.hooks().plugged().plugs.borrow_mut().remove(id);
    let Some(plug) = plug else {
      return;
    };
    Self::disconnect(plug);
    H::after_unplug(node);
  }

  /// Removes the first plug holding `source`.
  pub fn unplug_source<H: Pluggable<T, E>>(node: &Rc<Node<T, E, H>>, source: &NodeRef<T, E>) {
    let id = node
      .hooks()
      .plugged()
      .plugs
      .borrow()
      .iter()
      .find(|(_, plug)| Rc::ptr_eq(&plug.source, source))
      .map(|(id, _)| id);
    if let Some(id) = id {
      Self::unplug(node, id);
    }
  }

  /// Starts listening to every plugged source. Sources replay their current
  /// value, if any.
  pub fn activate<H: Pluggable<T, E>>(node: &Rc<Node<T, E, H>>) {
    for id in node.hooks().plugged().ids() {
      if !node.is_active() {
        break;
      }
      Self::connect(node, id);
    }
  }

  /// Stops listening to the values and errors of every plugged source.
  pub fn deactivate(&self) {
    let wired: Vec<_> = self
      .plugs
      .borrow_mut()
      .iter_mut()
      .filter_map(|(_, plug)| Some((plug.source.clone(), plug.events.take()?)))
      .collect();
    for (source, events) in wired {
      source.unsubscribe(&Listener::Both(events));
    }
  }

  /// Drops every plug.
  pub fn clear(&self) {
    let plugs: Vec<_> = self.plugs.borrow_mut().drain().collect();
    for plug in plugs {
      Self::disconnect(plug);
    }
  }

  fn connect<H: Pluggable<T, E>>(node: &Rc<Node<T, E, H>>, id: usize) {
    let plugged = node.hooks().plugged();
    let events = Binding::bind(node, on_plugged_event::<T, E, H>);
    let source = {
      let mut plugs = plugged.plugs.borrow_mut();
      let Some(plug) = plugs.get_mut(id) else {
        return;
      };
      if plug.events.is_some() {
        return;
      }
      plug.events = Some(events.clone());
      plug.source.clone()
    };
    source.subscribe(Listener::Both(events.clone()));
    // Unplugged while replaying.
    if !plugged.plugs.borrow().contains(id) {
      source.unsubscribe(&Listener::Both(events));
    }
  }

  fn disconnect(plug: Plug<T, E>) {
    if let Some(events) = plug.events {
      plug.source.unsubscribe(&Listener::Both(events));
    }
    if let Some(end) = plug.end {
      plug.source.unsubscribe(&Listener::End(end));
    }
  }
}
