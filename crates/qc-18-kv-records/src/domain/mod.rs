//! # Domain Layer
//!
//! Pure domain logic for the KV record subsystem.
//!
//! ## Modules
//!
//! - `entities` - `KvRecord`, `KeyId` and the derived-hash functions
//! - `index` - The primary map and three secondary indices
//! - `value_objects` - Network parameters and configuration
//! - `errors` - Domain error types
//!
//! No locking and no I/O happen here. The store service owns the lock and
//! the storage adapter owns the file.

pub mod entities;
pub mod errors;
pub mod index;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use index::*;
pub use value_objects::*;
