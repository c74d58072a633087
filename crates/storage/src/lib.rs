//! The block storage interface: `commit`, `last-committed-height`, and ranged `get-blocks`.
//!
//! Owned by block-sync, which is the only writer; the benchmark consensus core and the
//! transaction pool read from it.

mod error;
mod memory;
mod traits;

pub use error::StorageError;
pub use memory::InMemoryBlockStorage;
pub use traits::BlockStorage;
