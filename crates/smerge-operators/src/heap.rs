//! Binary min-heap of cursor ordinals.
//!
//! The heap stores ordinals only; the caller supplies the row comparison on
//! every operation, so the heap never holds row data. Ties under the
//! comparator are broken by ordinal (lowest first), which makes the merge
//! stable with respect to input order.

use std::cmp::Ordering;

#[derive(Debug, Clone, Default)]
pub struct MergeHeap {
    slots: Vec<usize>,
}

impl MergeHeap {
    /// Bulk heapify in O(N).
    pub fn build<F>(members: Vec<usize>, mut cmp: F) -> Self
    where
        F: FnMut(usize, usize) -> Ordering,
    {
        let mut heap = Self { slots: members };
        for i in (0..heap.slots.len() / 2).rev() {
            heap.sift_down(i, &mut cmp);
        }
        heap
    }

    pub fn peek(&self) -> Option<usize> {
        self.slots.first().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Restore the heap after the top member's key changed. O(log N).
    pub fn sift_top<F>(&mut self, mut cmp: F)
    where
        F: FnMut(usize, usize) -> Ordering,
    {
        if !self.slots.is_empty() {
            self.sift_down(0, &mut cmp);
        }
    }

    /// Remove the top member (e.g. a drained cursor). O(log N).
    pub fn pop<F>(&mut self, mut cmp: F) -> Option<usize>
    where
        F: FnMut(usize, usize) -> Ordering,
    {
        if self.slots.is_empty() {
            return None;
        }
        let top = self.slots.swap_remove(0);
        if !self.slots.is_empty() {
            self.sift_down(0, &mut cmp);
        }
        Some(top)
    }

    /// Members in heap order (not sorted).
    pub fn members(&self) -> &[usize] {
        &self.slots
    }

    fn less<F>(&self, i: usize, j: usize, cmp: &mut F) -> bool
    where
        F: FnMut(usize, usize) -> Ordering,
    {
        let (a, b) = (self.slots[i], self.slots[j]);
        cmp(a, b).then_with(|| a.cmp(&b)).is_lt()
    }

    fn sift_down<F>(&mut self, mut pos: usize, cmp: &mut F)
    where
        F: FnMut(usize, usize) -> Ordering,
    {
        let len = self.slots.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                return;
            }
            let right = left + 1;
            let child = if right < len && self.less(right, left, cmp) {
                right
            } else {
                left
            };
            if !self.less(child, pos, cmp) {
                return;
            }
            self.slots.swap(pos, child);
            pos = child;
        }
    }
}
