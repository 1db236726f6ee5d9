use std::ops::{Index, IndexMut};

use super::{vec::Idx, Indexable};

/// An arena of entities addressed by typed indices.
///
/// Unlike [`super::vec::IndexVec`], entities can be freed individually.
/// A freed slot is left as a tombstone and its index is never handed out again,
/// so a stale index is reported instead of silently aliasing a newer entity.
///
/// Indices start at a base chosen at construction. Arenas built with disjoint
/// bases reject each other's indices.
#[derive(Debug, Clone)]
pub struct IndexSlots<I: Idx, T: Indexable<I>> {
    slots: Vec<Option<T>>,
    base: usize,
    live: usize,
    _marker: std::marker::PhantomData<fn(&I) -> T>,
}

impl<I: Idx, T: Indexable<I>> IndexSlots<I, T> {
    pub fn new() -> Self {
        Self::with_base(0)
    }

    pub fn with_base(base: usize) -> Self {
        Self {
            slots: Vec::new(),
            base,
            live: 0,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn alloc(&mut self, value: T) -> I {
        self.alloc_with(|_| value)
    }

    /// Allocates an entity that needs to know its own index.
    pub fn alloc_with(&mut self, f: impl FnOnce(I) -> T) -> I {
        let idx = I::new(self.base + self.slots.len());
        self.slots.push(Some(f(idx)));
        self.live += 1;
        idx
    }

    /// Removes the entity and returns it.
    ///
    /// Panics if the slot has already been freed.
    pub fn free(&mut self, index: I) -> T {
        let value = self
            .position(index)
            .and_then(|pos| self.slots[pos].take())
            .unwrap_or_else(|| panic!("{index:?} was freed twice or never allocated"));
        self.live -= 1;
        value
    }

    fn position(&self, index: I) -> Option<usize> {
        index
            .index()
            .checked_sub(self.base)
            .filter(|&pos| pos < self.slots.len())
    }

    /// Whether `index` was handed out by this arena, freed or not.
    pub fn owns(&self, index: I) -> bool {
        self.position(index).is_some()
    }

    pub fn contains(&self, index: I) -> bool {
        self.get(index).is_some()
    }

    pub fn get(&self, index: I) -> Option<&T> {
        self.position(index).and_then(|pos| self.slots[pos].as_ref())
    }

    pub fn get_mut(&mut self, index: I) -> Option<&mut T> {
        self.position(index).and_then(|pos| self.slots[pos].as_mut())
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterates over live entities in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + use<'_, I, T> {
        let base = self.base;
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(pos, slot)| slot.as_ref().map(|value| (I::new(base + pos), value)))
    }

    pub fn indices(&self) -> impl Iterator<Item = I> + use<'_, I, T> {
        self.iter().map(|(idx, _)| idx)
    }
}

impl<I: Idx, T: Indexable<I>> Default for IndexSlots<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Idx, T: Indexable<I>> Index<I> for IndexSlots<I, T> {
    type Output = T;

    fn index(&self, index: I) -> &Self::Output {
        assert!(self.owns(index), "{index:?} belongs to another arena");
        self.get(index)
            .unwrap_or_else(|| panic!("use of freed entity {index:?}"))
    }
}

impl<I: Idx, T: Indexable<I>> IndexMut<I> for IndexSlots<I, T> {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        assert!(self.owns(index), "{index:?} belongs to another arena");
        self.get_mut(index)
            .unwrap_or_else(|| panic!("use of freed entity {index:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::newtype_index! {
        struct Slot;
    }
    impl Indexable<Slot> for &'static str {}

    #[test]
    fn freed_indices_are_not_reused() {
        let mut slots: IndexSlots<Slot, &'static str> = IndexSlots::new();
        let a = slots.alloc("a");
        let b = slots.alloc("b");
        assert_eq!(slots.free(a), "a");
        let c = slots.alloc("c");
        assert_ne!(a, c);
        assert!(!slots.contains(a));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.iter().map(|(_, v)| *v).collect::<Vec<_>>(), ["b", "c"]);
        assert_eq!(slots[b], "b");
    }

    #[test]
    fn indices_start_at_the_base() {
        let mut lhs: IndexSlots<Slot, &'static str> = IndexSlots::new();
        let mut rhs: IndexSlots<Slot, &'static str> = IndexSlots::with_base(1 << 16);
        let a = lhs.alloc("a");
        let b = rhs.alloc("b");
        assert_eq!(rhs.indices().collect::<Vec<_>>(), [b]);
        assert!(lhs.owns(a) && !lhs.owns(b));
        assert!(rhs.owns(b) && !rhs.owns(a));
        assert_eq!(rhs.get(a), None);
        assert_eq!(rhs.free(b), "b");
        assert!(rhs.owns(b));
    }

    #[test]
    #[should_panic(expected = "belongs to another arena")]
    fn foreign_indices_are_fatal() {
        let mut lhs: IndexSlots<Slot, &'static str> = IndexSlots::new();
        let rhs: IndexSlots<Slot, &'static str> = IndexSlots::with_base(1 << 16);
        let a = lhs.alloc("a");
        let _ = rhs[a];
    }

    #[test]
    #[should_panic(expected = "freed twice")]
    fn double_free_is_fatal() {
        let mut slots: IndexSlots<Slot, &'static str> = IndexSlots::new();
        let a = slots.alloc("a");
        slots.free(a);
        slots.free(a);
    }
}
