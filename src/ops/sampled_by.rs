use std::{
  cell::RefCell,
  rc::{Rc, Weak},
};

use crate::{
  binding::{Binding, Listener},
  node::{Kind, Lifecycle, Node, NodeRef},
  signal::{Event, Flow},
};

type Sample<T, X, U> = Box<dyn Fn(T, X) -> U>;

pub struct SampledByCore<T, X, U, E> {
  me: Weak<Node<U, E, Self>>,
  main: RefCell<Option<NodeRef<T, E>>>,
  sampler: RefCell<Option<NodeRef<X, E>>>,
  last: RefCell<Option<T>>,
  main_events: RefCell<Option<Binding<Event<T, E>>>>,
  sampler_events: RefCell<Option<Binding<Event<X, E>>>>,
  sampler_end: RefCell<Option<Binding<()>>>,
  sample: Sample<T, X, U>,
}

impl<T, X, U, E> SampledByCore<T, X, U, E>
where
  T: Clone + 'static,
  X: Clone + 'static,
  U: Clone + 'static,
  E: Clone + 'static,
{
  fn handle(node: &Node<U, E, Self>, x: X) {
    let core = node.hooks();
    let last = core.last.borrow().clone();
    if let Some(last) = last {
      node.send_value((core.sample)(last, x));
    }
  }

  fn on_main_event(node: &Rc<Node<U, E, Self>>, event: Event<T, E>) -> Flow {
    match event {
      Event::Value(v) => *node.hooks().last.borrow_mut() = Some(v),
      Event::Error(e) => node.send_error(e),
    }
    Flow::Continue
  }

  fn on_sampler_event(node: &Rc<Node<U, E, Self>>, event: Event<X, E>) -> Flow {
    match event {
      Event::Value(x) => Self::handle(node, x),
      Event::Error(e) => node.send_error(e),
    }
    Flow::Continue
  }

  fn on_sampler_end(node: &Rc<Node<U, E, Self>>, _: ()) -> Flow {
    node.hooks().sampler_end.borrow_mut().take();
    node.send_end();
    Flow::Continue
  }
}

impl<T, X, U, E> Lifecycle for SampledByCore<T, X, U, E>
where
  T: Clone + 'static,
  X: Clone + 'static,
  U: Clone + 'static,
  E: Clone + 'static,
{
  fn on_activate(&self) {
    let Some(me) = self.me.upgrade() else {
      return;
    };
    let sampler = self.sampler.borrow().clone();
    if let Some(sampler) = sampler {
      let events = Binding::bind(&me, Self::on_sampler_event);
      *self.sampler_events.borrow_mut() = Some(events.clone());
      sampler.subscribe_new(Listener::Both(events));
    }
    let main = self.main.borrow().clone();
    if let (Some(main), true) = (main, me.is_active()) {
      let events = Binding::bind(&me, Self::on_main_event);
      *self.main_events.borrow_mut() = Some(events.clone());
      main.subscribe(Listener::Both(events));
    }
  }

  fn on_deactivate(&self) {
    let events = self.sampler_events.borrow_mut().take();
    let sampler = self.sampler.borrow().clone();
    if let (Some(events), Some(sampler)) = (events, sampler) {
      sampler.unsubscribe(&Listener::Both(events));
    }
    let events = self.main_events.borrow_mut().take();
    let main = self.main.borrow().clone();
    if let (Some(events), Some(main)) = (events, main) {
      main.unsubscribe(&Listener::Both(events));
    }
  }

  fn on_clear(&self) {
    let sampler = self.sampler.borrow_mut().take();
    let end = self.sampler_end.borrow_mut().take();
    if let (Some(sampler), Some(end)) = (sampler, end) {
      sampler.unsubscribe(&Listener::End(end));
    }
    self.main.borrow_mut().take();
    self.last.borrow_mut().take();
  }
}

/// Emits `sample(last, x)` for every value `x` of `sampler`, `last` being the
/// latest value of `main`. Sampler values arriving before `main` has a value
/// are dropped.
///
/// The result is of `kind` and ends with `sampler`; the end of `main` is not
/// followed.
pub fn sampled_by<T, X, U, E, F>(
  main: &NodeRef<T, E>, sampler: &NodeRef<X, E>, kind: Kind, sample: F,
) -> NodeRef<U, E>
where
  T: Clone + 'static,
  X: Clone + 'static,
  U: Clone + 'static,
  E: Clone + 'static,
  F: Fn(T, X) -> U + 'static,
{
  let node = Node::new_cyclic("sampled_by", kind, |me| SampledByCore {
    me: me.clone(),
    main: RefCell::new(Some(main.clone())),
    sampler: RefCell::new(Some(sampler.clone())),
    last: RefCell::new(main.value()),
    main_events: RefCell::new(None),
    sampler_events: RefCell::new(None),
    sampler_end: RefCell::new(None),
    sample: Box::new(sample),
  });
  if kind == Kind::Property {
    if let Some(x) = sampler.value() {
      SampledByCore::handle(&node, x);
    }
  }
  let end = Binding::bind_weak(&Rc::downgrade(&node), SampledByCore::on_sampler_end);
  *node.hooks().sampler_end.borrow_mut() = Some(end.clone());
  sampler.subscribe_new(Listener::End(end));
  node
}
