use std::{
  cell::{Cell, RefCell},
  rc::{Rc, Weak},
};

use crate::{
  binding::{Binding, Listener},
  node::{Kind, Lifecycle, Node, NodeRef},
  pluggable::{Pluggable, Plugged},
  signal::{Event, Flow},
};

type Spawn<T, U, E> = Box<dyn Fn(T) -> NodeRef<U, E>>;

pub struct FlatMapCore<T, U, E> {
  me: Weak<Node<U, E, Self>>,
  source: RefCell<Option<NodeRef<T, E>>>,
  events: RefCell<Option<Binding<Event<T, E>>>>,
  end: RefCell<Option<Binding<()>>>,
  source_ended: Cell<bool>,
  spawn: Spawn<T, U, E>,
  latest: bool,
  plugged: Plugged<U, E>,
}

impl<T, U, E> FlatMapCore<T, U, E>
where
  T: Clone + 'static,
  U: Clone + 'static,
  E: Clone + 'static,
{
  fn on_source_event(node: &Rc<Node<U, E, Self>>, event: Event<T, E>) -> Flow {
    match event {
      Event::Value(x) => {
        let core = node.hooks();
        if core.latest {
          // At most one inner stream stays plugged.
          if let Some(&current) = core.plugged.ids().first() {
            Plugged::unplug(node, current);
          }
        }
        let inner = (core.spawn)(x);
        Plugged::plug(node, &inner);
      }
      Event::Error(e) => node.send_error(e),
    }
    Flow::Continue
  }

  fn on_source_end(node: &Rc<Node<U, E, Self>>, _: ()) -> Flow {
    let core = node.hooks();
    core.end.borrow_mut().take();
    core.source_ended.set(true);
    if core.plugged.is_empty() {
      node.send_end();
    }
    Flow::Continue
  }
}

impl<T, U, E> Pluggable<U, E> for FlatMapCore<T, U, E>
where
  T: Clone + 'static,
  U: Clone + 'static,
  E: Clone + 'static,
{
  fn plugged(&self) -> &Plugged<U, E> { &self.plugged }

  fn after_unplug(node: &Rc<Node<U, E, Self>>) {
    let core = node.hooks();
    if core.source_ended.get() && core.plugged.is_empty() {
      node.send_end();
    }
  }
}

impl<T, U, E> Lifecycle for FlatMapCore<T, U, E>
where
  T: Clone + 'static,
  U: Clone + 'static,
  E: Clone + 'static,
{
  fn on_activate(&self) {
    let Some(me) = self.me.upgrade() else {
      return;
    };
    let source = self.source.borrow().clone();
    if let Some(source) = source {
      let events = Binding::bind(&me, Self::on_source_event);
      *self.events.borrow_mut() = Some(events.clone());
      source.subscribe(Listener::Both(events));
    }
    if me.is_active() {
      Plugged::activate(&me);
    }
  }

  fn on_deactivate(&self) {
    let events = self.events.borrow_mut().take();
    let source = self.source.borrow().clone();
    if let (Some(events), Some(source)) = (events, source) {
      source.unsubscribe(&Listener::Both(events));
    }
    self.plugged.deactivate();
  }

  fn on_clear(&self) {
    let source = self.source.borrow_mut().take();
    let end = self.end.borrow_mut().take();
    if let (Some(source), Some(end)) = (source, end) {
      source.unsubscribe(&Listener::End(end));
    }
    self.plugged.clear();
  }
}

/// Plugs `spawn(x)` for every value `x` of `source`. With `latest`, plugging
/// a new inner stream unplugs the previous one.
///
/// The result ends once `source` has ended and no inner stream is left.
pub fn flat_map<T, U, E, F>(source: &NodeRef<T, E>, latest: bool, spawn: F) -> NodeRef<U, E>
where
  T: Clone + 'static,
  U: Clone + 'static,
  E: Clone + 'static,
  F: Fn(T) -> NodeRef<U, E> + 'static,
{
  let name = if latest { "flat_map_latest" } else { "flat_map" };
  let node = Node::new_cyclic(name, Kind::Stream, |me| FlatMapCore {
    me: me.clone(),
    source: RefCell::new(Some(source.clone())),
    events: RefCell::new(None),
    end: RefCell::new(None),
    source_ended: Cell::new(false),
    spawn: Box::new(spawn),
    latest,
    plugged: Plugged::default(),
  });
  let end = Binding::bind_weak(&Rc::downgrade(&node), FlatMapCore::on_source_end);
  *node.hooks().end.borrow_mut() = Some(end.clone());
  source.subscribe_new(Listener::End(end));
  node
}
