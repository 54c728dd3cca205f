//! Id-keyed storage for plugged sources and pending timers.

use smallvec::SmallVec;

/// A small container handing out a fresh id for every item it stores.
///
/// Items iterate in insertion order. Ids are never reused, so a stale id held
/// by a binding can not hit an item inserted later.
///
/// ```rust
/// use rxflow::arena::Arena;
///
/// let mut arena = Arena::default();
/// let a = arena.add("a");
///
/// // Reserve when the id is needed before the item exists.
/// let b = arena.reserve_id();
/// arena.insert(b, "b");
/// assert_eq!(arena.len(), 2);
///
/// assert_eq!(arena.remove(a), Some("a"));
/// assert!(!arena.contains(a));
/// ```
pub struct Arena<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for Arena<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> Arena<U> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Stores an item and returns its id.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.reserve_id();
    self.items.push((id, item));
    id
  }

  /// Hands out the next id without storing anything yet.
  #[inline]
  pub fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  /// Stores an item under an id obtained from [`Arena::reserve_id`].
  #[inline]
  pub fn insert(&mut self, id: usize, item: U) { self.items.push((id, item)); }

  pub fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn get(&self, id: usize) -> Option<&U> {
    self
      .items
      .iter()
      .find(|(i, _)| *i == id)
      .map(|(_, item)| item)
  }

  #[inline]
  pub fn get_mut(&mut self, id: usize) -> Option<&mut U> {
    self
      .items
      .iter_mut()
      .find(|(i, _)| *i == id)
      .map(|(_, item)| item)
  }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  #[inline]
  pub fn drain(&mut self) -> impl Iterator<Item = U> + '_ {
    self.items.drain(..).map(|(_, item)| item)
  }

  /// Iterates `(id, item)` pairs in insertion order.
  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = (usize, &U)> {
    self.items.iter().map(|(id, item)| (*id, item))
  }

  #[inline]
  pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut U)> {
    self.items.iter_mut().map(|(id, item)| (*id, item))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxflow_macro::test]
  fn ids_are_not_reused() {
    let mut arena = Arena::new();
    let a = arena.add(1);
    assert_eq!(arena.remove(a), Some(1));
    let b = arena.add(2);
    assert_ne!(a, b);
    assert_eq!(arena.remove(a), None);
    assert_eq!(arena.get(b), Some(&2));
  }

  #[rxflow_macro::test]
  fn reserved_ids_fill_later() {
    let mut arena = Arena::new();
    let id = arena.reserve_id();
    assert!(!arena.contains(id));
    arena.add('x');
    arena.insert(id, 'y');
    let items: Vec<_> = arena.iter().map(|(_, c)| *c).collect();
    assert_eq!(items, vec!['x', 'y']);
    assert!(arena.contains(id));
  }

  #[rxflow_macro::test]
  fn drain_empties() {
    let mut arena = Arena::new();
    arena.add(1);
    arena.add(2);
    assert_eq!(arena.len(), 2);
    assert_eq!(arena.drain().sum::<i32>(), 3);
    assert!(arena.is_empty());
  }
}
