//! Iteration event model
//!
//! - [`EventNode`]: one timed span
//! - [`EventTree`]: append-only node store for one iteration
//! - [`IterationRegistry`]: ordered list of trees plus the update notification

pub mod node;
pub mod registry;
pub mod tree;

pub use node::EventNode;
pub use registry::{IterationRegistry, UpdateSink};
pub use tree::{EventTree, SpanTarget};
