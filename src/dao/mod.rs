//! Persistence layer: the session document model, the storage error type,
//! and the whole-document store backends.

pub mod models;
pub mod storage;
pub mod store;

pub use self::models::Document;
pub use self::store::SessionStore;
