use std::{
  cell::RefCell,
  rc::{Rc, Weak},
};

use crate::{
  node::{Kind, Lifecycle, Node, NodeRef},
  signal::Signal,
};

/// Handle a binder uses to feed its stream.
pub struct Emitter<T, E> {
  node: NodeRef<T, E>,
}

impl<T, E> Emitter<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  pub fn value(&self, value: T) -> &Self {
    self.node.send_value(value);
    self
  }

  pub fn error(&self, error: E) -> &Self {
    self.node.send_error(error);
    self
  }

  pub fn end(&self) { self.node.send_end() }

  pub fn emit(&self, signal: Signal<T, E>) -> &Self {
    self.node.send(signal);
    self
  }

  /// Whether the stream is still listened to; a binder may stop producing
  /// once this turns false.
  pub fn is_active(&self) -> bool { self.node.is_active() }
}

impl<T, E> Clone for Emitter<T, E> {
  fn clone(&self) -> Self { Self { node: self.node.clone() } }
}

// ============================================================================
// once
// ============================================================================

pub(super) struct OnceCore<T, E> {
  me: Weak<Node<T, E, Self>>,
  value: RefCell<Option<T>>,
}

impl<T, E> OnceCore<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  pub(super) fn build(value: T) -> NodeRef<T, E> {
    let node = Node::new_cyclic("once", Kind::Stream, |me| OnceCore {
      me: me.clone(),
      value: RefCell::new(Some(value)),
    });
    node
  }
}

impl<T, E> Lifecycle for OnceCore<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  fn on_activate(&self) {
    let Some(me) = self.me.upgrade() else {
      return;
    };
    let value = self.value.borrow_mut().take();
    if let Some(value) = value {
      me.send_value(value);
    }
    me.send_end();
  }
}

// ============================================================================
// from_binder
// ============================================================================

type Binder<T, E> = Rc<dyn Fn(Emitter<T, E>) -> Option<Box<dyn FnOnce()>>>;

pub(super) struct BinderCore<T, E> {
  me: Weak<Node<T, E, Self>>,
  binder: RefCell<Option<Binder<T, E>>>,
  unbind: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl<T, E> BinderCore<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  pub(super) fn build<F>(binder: F) -> NodeRef<T, E>
  where
    F: Fn(Emitter<T, E>) -> Option<Box<dyn FnOnce()>> + 'static,
  {
    let binder: Binder<T, E> = Rc::new(binder);
    let node = Node::new_cyclic("from_binder", Kind::Stream, |me| BinderCore {
      me: me.clone(),
      binder: RefCell::new(Some(binder)),
      unbind: RefCell::new(None),
    });
    node
  }
}

impl<T, E> Lifecycle for BinderCore<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  fn on_activate(&self) {
    let (Some(me), Some(binder)) = (self.me.upgrade(), self.binder.borrow().clone()) else {
      return;
    };
    let node: NodeRef<T, E> = me.clone();
    let unbind = binder(Emitter { node });
    let Some(unbind) = unbind else {
      return;
    };
    // Deactivated, or ended, before the binder returned.
    if me.is_active() {
      *self.unbind.borrow_mut() = Some(unbind);
    } else {
      unbind();
    }
  }

  fn on_deactivate(&self) {
    let unbind = self.unbind.borrow_mut().take();
    if let Some(unbind) = unbind {
      unbind();
    }
  }

  fn on_clear(&self) { self.binder.borrow_mut().take(); }
}
