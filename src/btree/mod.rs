pub mod codec;
pub mod node;
pub mod tree;

pub use codec::{Char16, FixedSize};
pub use tree::{BTree, BTreeConfig};
