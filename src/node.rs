//! The observable substrate: subscriber registry, activation lifecycle and
//! signal dispatch shared by every stream and property.
//!
//! A [`Node`] is created alive and inactive. It turns active when its first
//! value, error or both listener arrives and inactive again when the last one
//! leaves, calling [`Lifecycle::on_activate`] / [`Lifecycle::on_deactivate`] on
//! each edge. The first `End` makes it permanently dead and releases every
//! listener.
//!
//! Listeners are always invoked with no internal borrow held, so a listener may
//! subscribe, unsubscribe or send on any node, including the one dispatching.

use std::{
  cell::RefCell,
  fmt::{Display, Formatter},
  rc::{Rc, Weak},
};

use tracing::trace;

use crate::{
  binding::Listener,
  signal::{Channel, Event, Flow, Signal},
  subscribers::Subscribers,
};

/// The two flavours of node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
  Stream,
  Property,
}

impl Kind {
  pub fn label(self) -> &'static str {
    match self {
      Kind::Stream => "Stream",
      Kind::Property => "Property",
    }
  }
}

/// Hooks a node runs on its lifecycle edges.
pub trait Lifecycle: 'static {
  /// First value, error or both listener arrived.
  fn on_activate(&self) {}

  /// Last value, error or both listener left, or the node ended while active.
  fn on_deactivate(&self) {}

  /// The node ended. Runs once, after `on_deactivate`.
  fn on_clear(&self) {}
}

/// Hooks for nodes driven purely from the outside.
pub struct Idle;

impl Lifecycle for Idle {}

struct State<T, E> {
  alive: bool,
  active: bool,
  subscribers: Subscribers<T, E>,
  cached: Option<T>,
}

/// A node of the dataflow graph.
///
/// `H` carries the behaviour of the node. Typed nodes (`Node<T, E, Adaptor<..>>`)
/// are what operators hold on to; everything else sees the erased
/// [`NodeRef`].
pub struct Node<T, E, H: ?Sized = dyn Lifecycle> {
  name: &'static str,
  kind: Kind,
  state: RefCell<State<T, E>>,
  hooks: H,
}

/// Shared handle to an erased node.
pub type NodeRef<T, E> = Rc<Node<T, E>>;

impl<T, E, H: Lifecycle> Node<T, E, H> {
  pub fn new(name: &'static str, kind: Kind, hooks: H) -> Rc<Self> {
    Rc::new(Self::build(name, kind, None, hooks))
  }

  /// Builds a node whose hooks need a handle back to the node itself.
  pub fn new_cyclic(
    name: &'static str, kind: Kind, hooks: impl FnOnce(&Weak<Self>) -> H,
  ) -> Rc<Self> {
    Rc::new_cyclic(|me| Self::build(name, kind, None, hooks(me)))
  }

  /// A property node starting out with `value` cached.
  pub fn with_value(name: &'static str, value: T, hooks: H) -> Rc<Self> {
    Rc::new(Self::build(name, Kind::Property, Some(value), hooks))
  }

  fn build(name: &'static str, kind: Kind, cached: Option<T>, hooks: H) -> Self {
    let state =
      State { alive: true, active: false, subscribers: Subscribers::default(), cached };
    Self { name, kind, state: RefCell::new(state), hooks }
  }
}

impl<T, E, H: ?Sized> Node<T, E, H> {
  #[inline]
  pub fn name(&self) -> &'static str { self.name }

  #[inline]
  pub fn kind(&self) -> Kind { self.kind }

  #[inline]
  pub fn hooks(&self) -> &H { &self.hooks }

  #[inline]
  pub fn is_alive(&self) -> bool { self.state.borrow().alive }

  #[inline]
  pub fn is_active(&self) -> bool { self.state.borrow().active }

  #[inline]
  pub fn has_value(&self) -> bool { self.state.borrow().cached.is_some() }

  pub fn subscriber_count(&self, channel: Channel) -> usize {
    self.state.borrow().subscribers.count(channel)
  }
}

impl<T: Clone, E, H: ?Sized> Node<T, E, H> {
  /// The cached value of a property. Always `None` for streams.
  pub fn value(&self) -> Option<T> { self.state.borrow().cached.clone() }
}

impl<T, E, H> Node<T, E, H>
where
  T: Clone + 'static,
  E: Clone + 'static,
  H: Lifecycle + ?Sized,
{
  /// Registers a listener.
  ///
  /// A property holding a value hands it to a new value or both listener first.
  /// A listener answering [`Flow::StopListening`] to that replay is not
  /// registered.
  pub fn subscribe(&self, listener: Listener<T, E>) {
    if self.kind == Kind::Property {
      let cached = self.value();
      if let Some(value) = cached {
        let flow = match &listener {
          Listener::Value(b) => b.call(value),
          Listener::Both(b) => b.call(Event::Value(value)),
          _ => Flow::Continue,
        };
        if flow == Flow::StopListening {
          return;
        }
      }
    }
    self.subscribe_new(listener);
  }

  /// Registers a listener without replaying the cached value.
  pub fn subscribe_new(&self, listener: Listener<T, E>) {
    let activated = {
      let mut state = self.state.borrow_mut();
      if state.alive {
        let channel = listener.channel();
        state.subscribers.add(listener);
        if channel.activates() && !state.active {
          state.active = true;
          true
        } else {
          false
        }
      } else {
        drop(state);
        if let Listener::End(b) = listener {
          b.call(());
        }
        return;
      }
    };
    if activated {
      trace!(target: "rxflow", node = %self, "activated");
      self.hooks.on_activate();
    }
  }

  /// Removes the first registered listener equal to `listener`.
  pub fn unsubscribe(&self, listener: &Listener<T, E>) {
    let (removed, deactivated) = {
      let mut state = self.state.borrow_mut();
      if !state.alive {
        return;
      }
      let removed = state.subscribers.remove(listener);
      let deactivated = listener.channel().activates()
        && state.active
        && !state.subscribers.has_active();
      if deactivated {
        state.active = false;
      }
      (removed, deactivated)
    };
    drop(removed);
    if deactivated {
      trace!(target: "rxflow", node = %self, "deactivated");
      self.hooks.on_deactivate();
    }
  }

  pub fn send(&self, signal: Signal<T, E>) {
    match signal {
      Signal::Value(v) => self.send_value(v),
      Signal::Error(e) => self.send_error(e),
      Signal::End => self.send_end(),
    }
  }

  pub fn send_event(&self, event: Event<T, E>) {
    match event {
      Event::Value(v) => self.send_value(v),
      Event::Error(e) => self.send_error(e),
    }
  }

  /// Dispatches a value. A property caches it even while nobody listens.
  pub fn send_value(&self, value: T) {
    let (values, both) = {
      let mut state = self.state.borrow_mut();
      if !state.alive {
        return;
      }
      if self.kind == Kind::Property {
        state.cached = Some(value.clone());
      }
      if !state.active {
        return;
      }
      state.subscribers.value_targets()
    };
    for b in values {
      if b.call(value.clone()) == Flow::StopListening {
        self.unsubscribe(&Listener::Value(b));
      }
    }
    for b in both {
      if b.call(Event::Value(value.clone())) == Flow::StopListening {
        self.unsubscribe(&Listener::Both(b));
      }
    }
  }

  pub fn send_error(&self, error: E) {
    let (errors, both) = {
      let state = self.state.borrow();
      if !state.alive || !state.active {
        return;
      }
      state.subscribers.error_targets()
    };
    for b in errors {
      if b.call(error.clone()) == Flow::StopListening {
        self.unsubscribe(&Listener::Error(b));
      }
    }
    for b in both {
      if b.call(Event::Error(error.clone())) == Flow::StopListening {
        self.unsubscribe(&Listener::Both(b));
      }
    }
  }

  /// Notifies every end listener and tears the node down.
  ///
  /// The node is already dead while its end listeners run: an end listener
  /// added during that dispatch runs at once, anything else sent or
  /// subscribed is ignored.
  pub fn send_end(&self) {
    let ends = {
      let mut state = self.state.borrow_mut();
      if !state.alive {
        return;
      }
      state.alive = false;
      state.subscribers.take_end()
    };
    trace!(target: "rxflow", node = %self, "ended");
    for b in ends {
      b.call(());
    }
    self.teardown();
  }

  /// Marks the node dead and drops all listeners. Idempotent.
  pub fn clear(&self) {
    {
      let mut state = self.state.borrow_mut();
      if !state.alive {
        return;
      }
      state.alive = false;
    }
    self.teardown();
  }

  fn teardown(&self) {
    let (subscribers, was_active) = {
      let mut state = self.state.borrow_mut();
      let was_active = std::mem::replace(&mut state.active, false);
      (std::mem::take(&mut state.subscribers), was_active)
    };
    drop(subscribers);
    if was_active {
      self.hooks.on_deactivate();
    }
    self.hooks.on_clear();
  }
}

impl<T, E, H: ?Sized> Display for Node<T, E, H> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "[{} {}]", self.kind.label(), self.name)
  }
}
