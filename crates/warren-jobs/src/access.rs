//! Access descriptors: which buffers a job reads and writes.

use smallvec::SmallVec;
use warren_core::BufferId;

use crate::buffer::SharedBuffer;

/// How a job touches one buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Reads only. Runs after the most recent writer; may overlap other
    /// readers.
    Read,
    /// Overwrites without reading. Runs after the most recent writer and
    /// every reader since.
    Write,
    /// Both. Ordered like a write.
    ReadWrite,
}

impl Access {
    /// Whether the access observes the buffer's contents.
    pub fn reads(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Whether the access modifies the buffer's contents.
    pub fn writes(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }

    fn union(self, other: Access) -> Access {
        match (self.reads() || other.reads(), self.writes() || other.writes()) {
            (true, true) => Self::ReadWrite,
            (false, true) => Self::Write,
            _ => Self::Read,
        }
    }
}

/// One declared buffer access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferAccess {
    /// The buffer touched.
    pub buffer: BufferId,
    /// How it is touched.
    pub access: Access,
    /// The job knowingly reads contents nothing has written yet.
    pub allow_uninitialized: bool,
}

/// The full access declaration of one job.
///
/// Declaring the same buffer twice merges the two entries, so a job that
/// lists a buffer under both `read` and `write` is tracked as
/// [`Access::ReadWrite`].
///
/// ```
/// use warren_jobs::{Access, AccessSet, SharedBuffer};
///
/// let walkable: SharedBuffer<bool> = SharedBuffer::new(16);
/// let penalty: SharedBuffer<u32> = SharedBuffer::new(16);
///
/// let set = AccessSet::new().read(&walkable).read_write(&penalty);
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.get(penalty.id()).unwrap().access, Access::ReadWrite);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessSet {
    entries: SmallVec<[BufferAccess; 4]>,
}

impl AccessSet {
    /// An empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a read.
    pub fn read<T>(self, buffer: &SharedBuffer<T>) -> Self {
        self.with(buffer.id(), Access::Read, false)
    }

    /// Declare a read of contents that may not have been written yet.
    pub fn read_uninitialized<T>(self, buffer: &SharedBuffer<T>) -> Self {
        self.with(buffer.id(), Access::Read, true)
    }

    /// Declare a write.
    pub fn write<T>(self, buffer: &SharedBuffer<T>) -> Self {
        self.with(buffer.id(), Access::Write, false)
    }

    /// Declare a read-modify-write.
    pub fn read_write<T>(self, buffer: &SharedBuffer<T>) -> Self {
        self.with(buffer.id(), Access::ReadWrite, false)
    }

    /// Declare an access by raw id, for buffers owned outside this crate.
    pub fn with(mut self, buffer: BufferId, access: Access, allow_uninitialized: bool) -> Self {
        self.push(BufferAccess {
            buffer,
            access,
            allow_uninitialized,
        });
        self
    }

    /// Add one access, merging with an existing entry for the same buffer.
    pub fn push(&mut self, entry: BufferAccess) {
        match self.entries.iter_mut().find(|e| e.buffer == entry.buffer) {
            Some(existing) => {
                existing.access = existing.access.union(entry.access);
                existing.allow_uninitialized |= entry.allow_uninitialized;
            }
            None => self.entries.push(entry),
        }
    }

    /// The entry for `buffer`, if declared.
    pub fn get(&self, buffer: BufferId) -> Option<&BufferAccess> {
        self.entries.iter().find(|e| e.buffer == buffer)
    }

    /// Iterate over the declared accesses in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BufferAccess> {
        self.entries.iter()
    }

    /// Number of distinct buffers declared.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
