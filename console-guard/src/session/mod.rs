//! Principal sessions and their persistence

pub mod kv;
pub mod principal;

pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore};
pub use principal::PrincipalSession;
