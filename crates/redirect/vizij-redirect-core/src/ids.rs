//! Identifiers and simple allocators for scene nodes, clips and curve entries.

use serde::{Deserialize, Serialize};

/// Stable, revocable identity of a scene node.
///
/// A handle is a weak reference: it never keeps the node alive and may stop
/// denoting anything at any time. Always revalidate through [`NodeHandle::resolve`]
/// (or the tree's `is_alive`) before use.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipId(pub u32);

/// Session-unique identifier of a captured curve entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u32);

/// Monotonic allocator for NodeHandle, ClipId and EntryId.
/// Handles are never reused, so a destroyed node's handle can never alias a new node.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    next_node: u64,
    next_clip: u32,
    next_entry: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_node(&mut self) -> NodeHandle {
        let id = NodeHandle(self.next_node);
        self.next_node = self.next_node.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_clip(&mut self) -> ClipId {
        let id = ClipId(self.next_clip);
        self.next_clip = self.next_clip.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_entry(&mut self) -> EntryId {
        let id = EntryId(self.next_entry);
        self.next_entry = self.next_entry.wrapping_add(1);
        id
    }
}
