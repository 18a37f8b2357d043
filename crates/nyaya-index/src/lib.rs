//! Vector index abstraction over per-corpus collections.

#[cfg(feature = "mock")]
pub mod in_memory;
pub mod qdrant;
pub mod vector_store;

#[cfg(feature = "mock")]
pub use in_memory::InMemoryVectorStore;
pub use qdrant::QdrantVectorStore;
pub use vector_store::{ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
