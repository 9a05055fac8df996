//! Slab-style object pool with integer handles.
//!
//! Objects are never dropped while the pool lives: `release` puts the slot
//! back on a free list and the next `get` hands the same slot out again,
//! reset to a clean state. Handles are only meaningful until released.

pub trait Poolable: Default {
    /// Return the object to its freshly-acquired state, keeping allocations.
    fn reset(&mut self);
}

#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PoolHandle(pub usize);

#[derive(Debug, Default)]
pub struct Pool<T: Poolable> {
    objects: Vec<T>,
    in_use: Vec<bool>,
    free: Vec<usize>,
}

impl<T: Poolable> Pool<T> {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            in_use: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Pool with `size` objects ready to hand out.
    pub fn with_capacity(size: usize) -> Self {
        let mut pool = Self::new();
        pool.resize(size);
        pool
    }

    /// Grow the number of pooled objects to at least `size`.
    pub fn resize(&mut self, size: usize) {
        while self.objects.len() < size {
            let idx = self.objects.len();
            self.objects.push(T::default());
            self.in_use.push(false);
            self.free.push(idx);
        }
    }

    pub fn get(&mut self) -> PoolHandle {
        let idx = match self.free.pop() {
            Some(idx) => idx,
            None => {
                self.objects.push(T::default());
                self.in_use.push(false);
                self.objects.len() - 1
            }
        };
        self.objects[idx].reset();
        self.in_use[idx] = true;
        PoolHandle(idx)
    }

    pub fn release(&mut self, h: PoolHandle) {
        debug_assert!(self.in_use[h.0], "pool slot {} released twice", h.0);
        self.in_use[h.0] = false;
        self.free.push(h.0);
    }

    #[inline]
    pub fn get_ref(&self, h: PoolHandle) -> &T {
        debug_assert!(self.in_use[h.0], "pool slot {} used after release", h.0);
        &self.objects[h.0]
    }

    #[inline]
    pub fn get_mut(&mut self, h: PoolHandle) -> &mut T {
        debug_assert!(self.in_use[h.0], "pool slot {} used after release", h.0);
        &mut self.objects[h.0]
    }

    /// Mutable references for a set of distinct handles, in the order given.
    pub fn get_many_mut(&mut self, handles: &[PoolHandle]) -> Vec<&mut T> {
        let mut slots: Vec<Option<&mut T>> = self.objects.iter_mut().map(Some).collect();
        handles
            .iter()
            .filter_map(|h| slots.get_mut(h.0).and_then(Option::take))
            .collect()
    }

    /// Total number of objects owned by the pool, in use or not.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}
