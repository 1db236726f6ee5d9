pub mod slots;
pub mod vec;

/// A marker trait for types that can be indexed by `Idx`.
pub trait Indexable<Idx> {}

/// Declares a newtype index usable with [`vec::IndexVec`] and [`slots::IndexSlots`].
///
/// ```ignore
/// newtype_index! {
///     /// A node in the graph.
///     pub struct NodeId;
/// }
/// ```
#[macro_export]
macro_rules! newtype_index {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
        $vis struct $name(usize);

        impl $crate::index::vec::Idx for $name {
            fn new(idx: usize) -> Self {
                Self(idx)
            }

            fn index(self) -> usize {
                self.0
            }
        }
    };
}
