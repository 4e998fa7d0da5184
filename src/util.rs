//! Small helpers shared across modules. Kept deliberately tiny; most of
//! the crate's logic lives in `buffer`, `btree`, and `operators`.

pub use crate::log::init_log;
