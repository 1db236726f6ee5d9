/// A bump arena whose allocations live as long as the arena is borrowed.
///
/// Used for data that is interned once and shared by reference for the whole
/// compilation, e.g. type tags and symbol names.
pub struct TypedArena<T> {
    container: typed_arena::Arena<T>,
}

impl<T> TypedArena<T> {
    pub fn new() -> Self {
        Self {
            container: typed_arena::Arena::new(),
        }
    }

    pub fn alloc(&self, value: T) -> &mut T {
        self.container.alloc(value)
    }

    pub fn len(&self) -> usize {
        self.container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TypedArena<u8> {
    pub fn alloc_str(&self, value: &str) -> &mut str {
        self.container.alloc_str(value)
    }
}

impl<T> Default for TypedArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
