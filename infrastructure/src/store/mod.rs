//! Persistence adapters for jobs, novelty batches and exchange history.

mod memory;

pub use memory::InMemoryStore;
