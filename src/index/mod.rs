//! Pre-computed retrieval indexes
//!
//! All indexes are built once during initialization and read-only afterward;
//! concurrent queries need no locking.

mod entity;
mod keyword;
mod tree;

pub use entity::{Entity, EntityIndex};
pub use keyword::KeywordIndex;
pub use tree::{DocumentTree, TreeIndex, TreeNode};
