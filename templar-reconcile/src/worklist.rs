//! Per-step claim tracking.
//!
//! One step keeps two worklists: the live sub-objects not yet matched to a
//! new binding, and the indices of old bindings not yet paired with a new
//! one. Each entry is claimed at most once.

use crate::model::ObjectId;

/// Entries of one step not yet claimed. For live sub-objects, whatever
/// remains at the end of the step is removed from the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worklist<T = ObjectId> {
    remaining: Vec<T>,
}

impl<T: Copy + PartialEq> Worklist<T> {
    pub fn new(candidates: Vec<T>) -> Self {
        Self { remaining: candidates }
    }

    pub fn remaining(&self) -> &[T] {
        &self.remaining
    }

    /// Take `entry` off the worklist. Returns `false` if it was not on it.
    pub fn claim(&mut self, entry: T) -> bool {
        match self.remaining.iter().position(|e| *e == entry) {
            Some(index) => {
                self.remaining.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn into_remaining(self) -> Vec<T> {
        self.remaining
    }
}

impl Worklist<usize> {
    /// Every index of a slice of length `len`.
    pub fn indices(len: usize) -> Self {
        Self::new((0..len).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_removes_once_and_keeps_order() {
        let mut worklist = Worklist::new(vec![ObjectId(1), ObjectId(2), ObjectId(3)]);
        assert!(worklist.claim(ObjectId(2)));
        assert!(!worklist.claim(ObjectId(2)));
        assert_eq!(worklist.into_remaining(), vec![ObjectId(1), ObjectId(3)]);
    }

    #[test]
    fn index_worklist_covers_the_whole_slice() {
        let mut worklist = Worklist::<usize>::indices(3);
        assert!(worklist.claim(0));
        assert_eq!(worklist.remaining(), &[1, 2]);
    }
}
