//! Shared, fixed-length buffers with stable identity.
//!
//! A [`SharedBuffer`] is the unit of hazard tracking: jobs declare
//! accesses against its [`BufferId`], and the tracker orders them. The
//! lock inside is never contended when every access goes through a
//! correctly declared job; it exists so the sharing is expressible in
//! safe Rust.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use warren_core::BufferId;

/// Initial contents of a buffer created through the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferInit {
    /// Filled with `T::default()`; reads are allowed immediately.
    Default,
    /// Storage exists but holds no meaningful data yet. The first job
    /// touching it must write; a declared read fails unless the access
    /// allows uninitialized contents.
    Uninitialized,
}

/// An `Arc`-shared, fixed-length array identified by a [`BufferId`].
///
/// Clones share storage and identity. The length never changes; use
/// [`reallocate`](Self::reallocate) to obtain a differently sized buffer,
/// which is a new allocation with a new identity.
pub struct SharedBuffer<T> {
    id: BufferId,
    data: Arc<RwLock<Box<[T]>>>,
}

impl<T> SharedBuffer<T> {
    /// Wrap existing data in a new buffer with a fresh identity.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            id: BufferId::next(),
            data: Arc::new(RwLock::new(data.into_boxed_slice())),
        }
    }

    /// The buffer's identity.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the buffer has zero elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared read access to the contents.
    ///
    /// Call only from a job that declared a read of this buffer, or from
    /// the orchestrating thread after waiting on the last writer.
    pub fn read(&self) -> RwLockReadGuard<'_, Box<[T]>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive write access to the contents.
    ///
    /// Call only from a job that declared a write of this buffer.
    pub fn write(&self) -> RwLockWriteGuard<'_, Box<[T]>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether two handles share storage.
    pub fn same_allocation(&self, other: &SharedBuffer<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl<T: Clone + Default> SharedBuffer<T> {
    /// A buffer of `len` default values.
    pub fn new(len: usize) -> Self {
        Self::from_vec(vec![T::default(); len])
    }

    /// Copy the contents into a new buffer of `len` elements.
    ///
    /// Extra elements are `T::default()`; surplus elements are dropped.
    /// The result has a fresh identity, so hazards recorded against the
    /// old buffer do not carry over.
    pub fn reallocate(&self, len: usize) -> Self {
        let old = self.read();
        let mut data = Vec::with_capacity(len);
        data.extend(old.iter().take(len).cloned());
        data.resize(len, T::default());
        Self::from_vec(data)
    }

    /// Snapshot of the contents.
    pub fn to_vec(&self) -> Vec<T> {
        self.read().to_vec()
    }
}

impl<T> Clone for SharedBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            data: Arc::clone(&self.data),
        }
    }
}

impl<T> fmt::Debug for SharedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("id", &self.id)
            .field("len", &self.len())
            .finish()
    }
}
