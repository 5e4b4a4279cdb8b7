//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like passing a sample ID from a
//! snapshot where a node index into an event tree is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node in its tree's node store.
///
/// Assigned once, in append order, and never reused within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(pub usize);

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node#{}", self.0)
    }
}

/// Position of an iteration in the registry (0-based).
///
/// Reports display it 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IterationIndex(pub usize);

impl IterationIndex {
    /// 1-based number used in report captions.
    #[must_use]
    pub fn display_number(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for IterationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iteration#{}", self.display_number())
    }
}

/// Index of a sampled frame as announced by the profiling source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameIndex(pub u64);

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame#{}", self.0)
    }
}

/// Item ID inside one snapshot's sample hierarchy.
///
/// Only meaningful together with the snapshot that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleId(pub u32);

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sample#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_index_display_is_one_based() {
        assert_eq!(IterationIndex(0).display_number(), 1);
        assert_eq!(IterationIndex(4).to_string(), "Iteration#5");
    }

    #[test]
    fn test_node_index_serializes_transparently() {
        let json = serde_json::to_string(&NodeIndex(7)).unwrap();
        assert_eq!(json, "7");
    }
}
