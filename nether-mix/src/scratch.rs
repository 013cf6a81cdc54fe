//! Scratch arena for per-callback temporaries
//!
//! A fixed-capacity bump region of [`F32x4`] lanes. Storage is allocated once
//! up front; pushing never allocates, and exhausting the region panics. A
//! [`ScratchScope`] records the current mark and restores it on drop, so
//! everything pushed inside a scope is released together without disturbing
//! what was pushed before it.

use crate::batch::F32x4;

/// Saved arena position, restored with [`ScratchArena::reset_to`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScratchMark(usize);

/// Fixed-capacity bump allocator for batch lanes
#[derive(Debug)]
pub struct ScratchArena {
    storage: Box<[F32x4]>,
    used: usize,
}

impl ScratchArena {
    /// Create an arena holding up to `lanes` batches
    pub fn with_capacity(lanes: usize) -> Self {
        Self {
            storage: vec![F32x4::zero(); lanes].into_boxed_slice(),
            used: 0,
        }
    }

    /// Capacity in lanes
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Lanes currently pushed
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn mark(&self) -> ScratchMark {
        ScratchMark(self.used)
    }

    /// Release everything pushed since `mark`
    ///
    /// # Panics
    ///
    /// Panics if `mark` is ahead of the current position.
    pub fn reset_to(&mut self, mark: ScratchMark) {
        assert!(
            mark.0 <= self.used,
            "scratch mark {} is ahead of arena position {}",
            mark.0,
            self.used
        );
        self.used = mark.0;
    }

    /// Push `lanes` zeroed batches and return them
    ///
    /// # Panics
    ///
    /// Panics if the arena does not have `lanes` batches left.
    pub fn push_zeroed(&mut self, lanes: usize) -> &mut [F32x4] {
        let start = self.used;
        let end = start + lanes;
        assert!(
            end <= self.storage.len(),
            "scratch arena exhausted: need {} lanes, {} of {} in use",
            lanes,
            self.used,
            self.storage.len()
        );
        self.used = end;

        let region = &mut self.storage[start..end];
        region.fill(F32x4::zero());
        region
    }

    /// Open a scope that releases its pushes when dropped
    pub fn scope(&mut self) -> ScratchScope<'_> {
        let mark = self.mark();
        ScratchScope { arena: self, mark }
    }
}

/// Scoped view of a [`ScratchArena`]; restores the entry mark on drop
#[derive(Debug)]
pub struct ScratchScope<'a> {
    arena: &'a mut ScratchArena,
    mark: ScratchMark,
}

impl ScratchScope<'_> {
    /// Push `lanes` zeroed batches within this scope
    pub fn push_zeroed(&mut self, lanes: usize) -> &mut [F32x4] {
        self.arena.push_zeroed(lanes)
    }

    /// Open a nested scope
    pub fn scope(&mut self) -> ScratchScope<'_> {
        self.arena.scope()
    }
}

impl Drop for ScratchScope<'_> {
    fn drop(&mut self) {
        self.arena.reset_to(self.mark);
    }
}
