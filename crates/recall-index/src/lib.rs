#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod cache;
pub mod indexer;
pub mod memory;
pub mod tenant;

pub use cache::CachedEmbedder;
pub use indexer::{IncrementalIndexer, IndexerConfig};
pub use memory::MemoryVectorIndex;
pub use tenant::TenantScope;
