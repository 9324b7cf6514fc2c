pub mod comment;
pub mod field;
pub mod node;

pub use comment::{Anchor, Comment, CommentStatus};
pub use field::{default_fields, FieldDescriptor, OutputRow};
pub use node::{FileNodes, FileTree, Node};
