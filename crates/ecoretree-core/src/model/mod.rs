pub mod ecore;
pub mod node;
pub mod payload;

pub use ecore::{EcoreType, SyntheticTag};
pub use node::{NodeId, TreeNode};
pub use payload::Payload;
