//! A teaching database engine core: a 2Q buffer pool, a disk-backed B+
//! tree index built on it, and a pull-based physical operator pipeline.
//! There is no transaction manager, no write-ahead log, no query
//! optimizer, and no SQL front end — a caller builds and drives the
//! operator tree directly.

pub mod btree;
pub mod buffer;
pub mod error;
pub mod log;
pub mod operators;
pub mod util;

pub use error::{DbError, DbResult};
