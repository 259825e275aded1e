//! Table storage.
//!
//! [`RowStore`] is the seam the workflows talk to. [`RestStore`] speaks to the hosted
//! backend; [`MemoryStore`] keeps rows in process for development and tests.

pub mod memory;
pub mod rest;
pub mod store;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use store::{Direction, Query, RowStore, StoreError, StoreResult};
