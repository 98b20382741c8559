//! Ports connecting the gadget to its collaborators.
//!
//! The gadget is driven once per accepted block by the processing pipeline
//! and drives a single dependency: the ordered key-value state store.

pub mod outbound;

pub use outbound::{InMemoryStateStore, IterateOptions, KvPair, StateStore};
