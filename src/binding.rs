//! Bindings: callable listeners that double as equality keys.
//!
//! A [`Binding`] pairs a callable with a key made of the function, an optional
//! context object and an optional partial argument. Two bindings are equal iff
//! all three parts are equal, which is what `unsubscribe` matches on. A binding
//! built from a closure is only equal to its own clones.

use std::{
  any::Any,
  fmt::{Debug, Formatter},
  rc::{Rc, Weak},
};

use crate::signal::{Channel, Event, Flow};

// ============================================================================
// Binding key
// ============================================================================

trait ArgsEq {
  fn as_any(&self) -> &dyn Any;
  fn eq_args(&self, other: &dyn ArgsEq) -> bool;
}

impl<P: PartialEq + 'static> ArgsEq for P {
  fn as_any(&self) -> &dyn Any { self }

  fn eq_args(&self, other: &dyn ArgsEq) -> bool {
    other.as_any().downcast_ref::<P>().is_some_and(|other| other == self)
  }
}

#[derive(Clone)]
struct BindingKey {
  func: usize,
  context: usize,
  args: Option<Rc<dyn ArgsEq>>,
}

impl PartialEq for BindingKey {
  fn eq(&self, other: &Self) -> bool {
    self.func == other.func
      && self.context == other.context
      && match (&self.args, &other.args) {
        (None, None) => true,
        (Some(a), Some(b)) => ArgsEq::eq_args(&**a, &**b),
        _ => false,
      }
  }
}

// ============================================================================
// Binding
// ============================================================================

/// A listener callable plus the key used to find it again.
pub struct Binding<A> {
  call: Rc<dyn Fn(A) -> Flow>,
  key: BindingKey,
}

impl<A: 'static> Binding<A> {
  /// Wraps a closure. Only clones of the returned binding compare equal.
  pub fn new<F, R>(f: F) -> Self
  where
    F: Fn(A) -> R + 'static,
    R: Into<Flow>,
  {
    let call: Rc<dyn Fn(A) -> Flow> = Rc::new(move |a| f(a).into());
    let func = Rc::as_ptr(&call) as *const () as usize;
    Self { call, key: BindingKey { func, context: 0, args: None } }
  }

  /// Binds `f` to a context. The binding keeps the context alive.
  pub fn bind<C: 'static>(context: &Rc<C>, f: fn(&Rc<C>, A) -> Flow) -> Self {
    let ctx = context.clone();
    Self {
      call: Rc::new(move |a| f(&ctx, a)),
      key: BindingKey { func: f as usize, context: Rc::as_ptr(context) as usize, args: None },
    }
  }

  /// Binds `f` to a context and a partial argument.
  pub fn bind_with<C, P>(context: &Rc<C>, args: P, f: fn(&Rc<C>, &P, A) -> Flow) -> Self
  where
    C: 'static,
    P: PartialEq + 'static,
  {
    let ctx = context.clone();
    let args = Rc::new(args);
    let bound = args.clone();
    Self {
      call: Rc::new(move |a| f(&ctx, &bound, a)),
      key: BindingKey {
        func: f as usize,
        context: Rc::as_ptr(context) as usize,
        args: Some(args),
      },
    }
  }

  /// Like [`Binding::bind`] but holds the context weakly. Once the context is
  /// gone the binding answers [`Flow::StopListening`].
  pub fn bind_weak<C: 'static>(context: &Weak<C>, f: fn(&Rc<C>, A) -> Flow) -> Self {
    let ctx = context.clone();
    Self {
      call: Rc::new(move |a| match ctx.upgrade() {
        Some(ctx) => f(&ctx, a),
        None => Flow::StopListening,
      }),
      key: BindingKey { func: f as usize, context: Weak::as_ptr(context) as usize, args: None },
    }
  }

  /// Weak counterpart of [`Binding::bind_with`].
  pub fn bind_weak_with<C, P>(context: &Weak<C>, args: P, f: fn(&Rc<C>, &P, A) -> Flow) -> Self
  where
    C: 'static,
    P: PartialEq + 'static,
  {
    let ctx = context.clone();
    let args = Rc::new(args);
    let bound = args.clone();
    Self {
      call: Rc::new(move |a| match ctx.upgrade() {
        Some(ctx) => f(&ctx, &bound, a),
        None => Flow::StopListening,
      }),
      key: BindingKey {
        func: f as usize,
        context: Weak::as_ptr(context) as usize,
        args: Some(args),
      },
    }
  }
}

impl<A> Binding<A> {
  #[inline]
  pub fn call(&self, arg: A) -> Flow { (self.call)(arg) }
}

impl<A> Clone for Binding<A> {
  fn clone(&self) -> Self { Self { call: self.call.clone(), key: self.key.clone() } }
}

impl<A> PartialEq for Binding<A> {
  fn eq(&self, other: &Self) -> bool { self.key == other.key }
}

impl<A> Debug for Binding<A> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Binding")
      .field("func", &format_args!("{:#x}", self.key.func))
      .field("context", &format_args!("{:#x}", self.key.context))
      .field("has_args", &self.key.args.is_some())
      .finish()
  }
}

// ============================================================================
// Listener
// ============================================================================

/// A binding registered on one of the four channels of a node.
pub enum Listener<T, E> {
  Value(Binding<T>),
  Error(Binding<E>),
  Both(Binding<Event<T, E>>),
  End(Binding<()>),
}

impl<T, E> Listener<T, E> {
  pub fn channel(&self) -> Channel {
    match self {
      Listener::Value(_) => Channel::Value,
      Listener::Error(_) => Channel::Error,
      Listener::Both(_) => Channel::Both,
      Listener::End(_) => Channel::End,
    }
  }
}

impl<T, E> Clone for Listener<T, E> {
  fn clone(&self) -> Self {
    match self {
      Listener::Value(b) => Listener::Value(b.clone()),
      Listener::Error(b) => Listener::Error(b.clone()),
      Listener::Both(b) => Listener::Both(b.clone()),
      Listener::End(b) => Listener::End(b.clone()),
    }
  }
}

impl<T, E> PartialEq for Listener<T, E> {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Listener::Value(a), Listener::Value(b)) => a == b,
      (Listener::Error(a), Listener::Error(b)) => a == b,
      (Listener::Both(a), Listener::Both(b)) => a == b,
      (Listener::End(a), Listener::End(b)) => a == b,
      _ => false,
    }
  }
}

impl<T, E> Debug for Listener<T, E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Listener::Value(b) => f.debug_tuple("Value").field(b).finish(),
      Listener::Error(b) => f.debug_tuple("Error").field(b).finish(),
      Listener::Both(b) => f.debug_tuple("Both").field(b).finish(),
      Listener::End(b) => f.debug_tuple("End").field(b).finish(),
    }
  }
}
