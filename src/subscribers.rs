use smallvec::SmallVec;

use crate::{
  binding::{Binding, Listener},
  signal::{Channel, Event},
};

type List<A> = SmallVec<[Binding<A>; 2]>;

/// The four subscriber lists of a node.
///
/// Duplicates are allowed: adding an equal binding twice registers it twice,
/// and each removal takes out only the first equal entry.
pub struct Subscribers<T, E> {
  value: List<T>,
  error: List<E>,
  both: List<Event<T, E>>,
  end: List<()>,
}

impl<T, E> Default for Subscribers<T, E> {
  fn default() -> Self {
    Self { value: SmallVec::new(), error: SmallVec::new(), both: SmallVec::new(), end: SmallVec::new() }
  }
}

fn remove_first<A>(list: &mut List<A>, binding: &Binding<A>) -> Option<Binding<A>> {
  list.iter().position(|b| b == binding).map(|pos| list.remove(pos))
}

impl<T, E> Subscribers<T, E> {
  pub fn add(&mut self, listener: Listener<T, E>) {
    match listener {
      Listener::Value(b) => self.value.push(b),
      Listener::Error(b) => self.error.push(b),
      Listener::Both(b) => self.both.push(b),
      Listener::End(b) => self.end.push(b),
    }
  }

  /// Removes and returns the first entry equal to `listener`.
  pub fn remove(&mut self, listener: &Listener<T, E>) -> Option<Listener<T, E>> {
    match listener {
      Listener::Value(b) => remove_first(&mut self.value, b).map(Listener::Value),
      Listener::Error(b) => remove_first(&mut self.error, b).map(Listener::Error),
      Listener::Both(b) => remove_first(&mut self.both, b).map(Listener::Both),
      Listener::End(b) => remove_first(&mut self.end, b).map(Listener::End),
    }
  }

  /// Whether any listener that keeps the node active is registered.
  #[inline]
  pub fn has_active(&self) -> bool {
    !self.value.is_empty() || !self.error.is_empty() || !self.both.is_empty()
  }

  pub fn count(&self, channel: Channel) -> usize {
    match channel {
      Channel::Value => self.value.len(),
      Channel::Error => self.error.len(),
      Channel::Both => self.both.len(),
      Channel::End => self.end.len(),
    }
  }

  /// Clones the lists a value is dispatched to.
  pub fn value_targets(&self) -> (List<T>, List<Event<T, E>>) {
    (self.value.clone(), self.both.clone())
  }

  /// Clones the lists an error is dispatched to.
  pub fn error_targets(&self) -> (List<E>, List<Event<T, E>>) {
    (self.error.clone(), self.both.clone())
  }

  /// Moves the end listeners out, leaving the list empty.
  pub fn take_end(&mut self) -> List<()> { std::mem::take(&mut self.end) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxflow_macro::test]
  fn remove_takes_only_the_first_duplicate() {
    let mut subs = Subscribers::<i32, ()>::default();
    let b = Binding::new(|_: i32| {});
    subs.add(Listener::Value(b.clone()));
    subs.add(Listener::Value(b.clone()));
    assert_eq!(subs.count(Channel::Value), 2);

    assert!(subs.remove(&Listener::Value(b.clone())).is_some());
    assert_eq!(subs.count(Channel::Value), 1);
    assert!(subs.has_active());

    assert!(subs.remove(&Listener::Value(b.clone())).is_some());
    assert!(subs.remove(&Listener::Value(b)).is_none());
    assert!(!subs.has_active());
  }

  #[rxflow_macro::test]
  fn end_listeners_do_not_count_as_active() {
    let mut subs = Subscribers::<i32, ()>::default();
    subs.add(Listener::End(Binding::new(|_: ()| {})));
    assert!(!subs.has_active());
    assert_eq!(subs.take_end().len(), 1);
    assert_eq!(subs.count(Channel::End), 0);
  }
}
