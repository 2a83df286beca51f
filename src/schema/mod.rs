//! Table metadata: column descriptors, declared types, process-wide cache.

pub mod cache;
pub mod types;

pub use cache::SchemaCache;
pub use types::{ColumnDescriptor, DeclaredType, TableSchema};
