//! Dense identifiers for skeleton entities.
//!
//! Ids are assigned in declaration order when a skeleton is built and double as
//! indices into every per-joint / per-bone array.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct JointId(pub u16);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BoneId(pub u16);

impl JointId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Monotonic allocator handing out dense joint and bone ids during skeleton build.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_joint: u16,
    next_bone: u16,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` once the id space is exhausted.
    #[inline]
    pub fn alloc_joint(&mut self) -> Option<JointId> {
        let id = JointId(self.next_joint);
        self.next_joint = self.next_joint.checked_add(1)?;
        Some(id)
    }

    #[inline]
    pub fn alloc_bone(&mut self) -> Option<BoneId> {
        let id = BoneId(self.next_bone);
        self.next_bone = self.next_bone.checked_add(1)?;
        Some(id)
    }
}
