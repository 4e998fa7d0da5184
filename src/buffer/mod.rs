pub mod file_store;
pub mod manager;
pub mod page_id;

pub use manager::{BufferManager, BufferPoolConfig, PageGuard};
pub use page_id::PageId;
