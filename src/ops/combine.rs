use std::{
  cell::RefCell,
  rc::{Rc, Weak},
};

use smallvec::SmallVec;

use crate::{
  binding::{Binding, Listener},
  node::{Kind, Lifecycle, Node, NodeRef},
  signal::{Event, Flow},
};

struct Slot<T, E> {
  /// `None` once the source ended.
  source: Option<NodeRef<T, E>>,
  value: Option<T>,
  events: Option<Binding<Event<T, E>>>,
  end: Option<Binding<()>>,
}

pub struct CombineCore<T, U, E> {
  me: Weak<Node<U, E, Self>>,
  slots: RefCell<SmallVec<[Slot<T, E>; 2]>>,
  combinator: Box<dyn Fn(&[T]) -> U>,
}

impl<T, U, E> CombineCore<T, U, E>
where
  T: Clone + 'static,
  U: Clone + 'static,
  E: Clone + 'static,
{
  fn on_event(node: &Rc<Node<U, E, Self>>, index: &usize, event: Event<T, E>) -> Flow {
    match event {
      Event::Value(x) => {
        let core = node.hooks();
        let ready = {
          let mut slots = core.slots.borrow_mut();
          if let Some(slot) = slots.get_mut(*index) {
            slot.value = Some(x);
          }
          slots.iter().map(|slot| slot.value.clone()).collect::<Option<Vec<_>>>()
        };
        if let Some(values) = ready {
          node.send_value((core.combinator)(&values));
        }
      }
      Event::Error(e) => node.send_error(e),
    }
    Flow::Continue
  }

  fn on_end(node: &Rc<Node<U, E, Self>>, index: &usize, _: ()) -> Flow {
    let (slot, all_ended) = {
      let mut slots = node.hooks().slots.borrow_mut();
      let Some(slot) = slots.get_mut(*index) else {
        return Flow::Continue;
      };
      let taken = (slot.source.take(), slot.events.take(), slot.end.take());
      (taken, slots.iter().all(|slot| slot.source.is_none()))
    };
    if let (Some(source), events, end) = slot {
      if let Some(events) = events {
        source.unsubscribe(&Listener::Both(events));
      }
      if let Some(end) = end {
        source.unsubscribe(&Listener::End(end));
      }
    }
    if all_ended {
      node.send_end();
    }
    Flow::Continue
  }

  fn connect(&self, me: &Rc<Node<U, E, Self>>, index: usize) {
    let events = Binding::bind_with(me, index, Self::on_event);
    let source = {
      let mut slots = self.slots.borrow_mut();
      let Some(slot) = slots.get_mut(index) else {
        return;
      };
      let Some(source) = slot.source.clone() else {
        return;
      };
      if slot.events.is_some() {
        return;
      }
      slot.events = Some(events.clone());
      source
    };
    source.subscribe(Listener::Both(events.clone()));
    // The source ended while replaying.
    let gone = self.slots.borrow().get(index).map_or(true, |slot| slot.events.is_none());
    if gone {
      source.unsubscribe(&Listener::Both(events));
    }
  }
}

impl<T, U, E> Lifecycle for CombineCore<T, U, E>
where
  T: Clone + 'static,
  U: Clone + 'static,
  E: Clone + 'static,
{
  fn on_activate(&self) {
    let Some(me) = self.me.upgrade() else {
      return;
    };
    let count = self.slots.borrow().len();
    for index in 0..count {
      if !me.is_active() {
        break;
      }
      self.connect(&me, index);
    }
  }

  fn on_deactivate(&self) {
    let wired: Vec<_> = self
      .slots
      .borrow_mut()
      .iter_mut()
      .filter_map(|slot| Some((slot.source.clone()?, slot.events.take()?)))
      .collect();
    for (source, events) in wired {
      source.unsubscribe(&Listener::Both(events));
    }
  }

  fn on_clear(&self) {
    let slots = std::mem::take(&mut *self.slots.borrow_mut());
    for slot in slots {
      let Some(source) = slot.source else {
        continue;
      };
      if let Some(events) = slot.events {
        source.unsubscribe(&Listener::Both(events));
      }
      if let Some(end) = slot.end {
        source.unsubscribe(&Listener::End(end));
      }
    }
  }
}

/// A stream of `combinator` over the latest value of every source. Emits
/// once each source has a value and again on every later value; ends once
/// every source has ended.
pub fn combine<T, U, E, F>(sources: Vec<NodeRef<T, E>>, combinator: F) -> NodeRef<U, E>
where
  T: Clone + 'static,
  U: Clone + 'static,
  E: Clone + 'static,
  F: Fn(&[T]) -> U + 'static,
{
  let slots: SmallVec<[Slot<T, E>; 2]> = sources
    .iter()
    .map(|source| Slot { source: Some(source.clone()), value: None, events: None, end: None })
    .collect();
  let node = Node::new_cyclic("combine", Kind::Stream, |me| CombineCore {
    me: me.clone(),
    slots: RefCell::new(slots),
    combinator: Box::new(combinator),
  });
  if sources.is_empty() {
    node.send_end();
    return node;
  }

  let weak = Rc::downgrade(&node);
  for (index, source) in sources.iter().enumerate() {
    let end = Binding::bind_weak_with(&weak, index, CombineCore::on_end);
    match node.hooks().slots.borrow_mut().get_mut(index) {
      Some(slot) => slot.end = Some(end.clone()),
      None => break,
    }
    source.subscribe_new(Listener::End(end));
  }
  node
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn waits_for_every_source_then_repeats() {
    let a = Bus::<i32>::new();
    let b = Bus::<i32>::new();
    let combined = a.combine(&[b.clone()]);
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    combined.on_value(move |v| c_seen.borrow_mut().push(v));

    a.push(1);
    assert!(seen.borrow().is_empty());
    b.push(2);
    a.push(3);
    assert_eq!(*seen.borrow(), vec![vec![1, 2], vec![3, 2]]);
  }

  #[rxflow_macro::test]
  fn combinator_and_errors() {
    let a = Bus::<i32, &str>::new();
    let b = Bus::<i32, &str>::new();
    let sum = combine_with([a.clone(), b.clone()], |xs: &[i32]| xs.iter().sum::<i32>());
    let log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    sum.log_to("sum", move |_, ch, payload| c_log.borrow_mut().push(format!("{ch} {payload}")));

    b.error("early");
    a.push(1);
    b.push(10);
    b.push(20);
    assert_eq!(*log.borrow(), vec!["<error> \"early\"", "<value> 11", "<value> 21"]);
  }

  #[rxflow_macro::test]
  fn ended_sources_keep_their_last_value() {
    let a = Bus::<i32>::new();
    let b = Bus::<i32>::new();
    let combined = combine([a.clone(), b.clone()]);
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    combined.on_value(move |v| c_seen.borrow_mut().push(v));

    a.push(1).end();
    b.push(2);
    assert!(!combined.is_ended());
    b.end();
    assert!(combined.is_ended());
    assert_eq!(*seen.borrow(), vec![vec![1, 2]]);
  }

  #[rxflow_macro::test]
  fn properties_take_part_with_their_current_value() {
    let a = Bus::<i32>::new();
    let b = Bus::<i32>::new();
    let combined = combine([a.to_property_with(1), b.to_property_with(5)]);
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    combined.on_value(move |v| c_seen.borrow_mut().push(v));
    a.push(2);
    assert_eq!(*seen.borrow(), vec![vec![1, 5], vec![2, 5]]);
  }

  #[rxflow_macro::test]
  fn on_values_subscribes_directly() {
    let a = Bus::<i32>::new();
    let b = Bus::<i32>::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    on_values([a.clone(), b.clone()], move |xs: &[i32]| c_seen.borrow_mut().push(xs.to_vec()));
    a.push(1);
    b.push(2);
    assert_eq!(*seen.borrow(), vec![vec![1, 2]]);
  }

  #[rxflow_macro::test]
  fn empty_combine_is_ended() {
    assert!(combine(Vec::<Bus<i32>>::new()).is_ended());
  }
}
