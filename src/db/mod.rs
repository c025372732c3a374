//! Job persistence: store traits, PostgreSQL and in-memory backends

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryJobStore;
pub use postgres::{PgJobReader, PgJobStore};
pub use store::{ChangeEvent, JobReader, JobStore, StoreError};
