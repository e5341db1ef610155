//! Append-only record of every search result doorkeep has already seen.
//!
//! Keyed by `ResultKey` (title + link). The conditional write
//! (`insert_if_absent`) is the only mutation and is atomic in every backend,
//! so concurrent runs can never both classify the same result as new.

pub mod codec;
pub mod error;
pub mod memory;
pub mod pg;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryResultStore;
pub use pg::PgResultStore;
pub use store::ResultStore;
