//! Definition resolution for Quill.
//!
//! User-defined variables arrive as a hierarchical tree of named nodes
//! ([`DefinitionTree`]); leaves carry string values that may reference
//! sibling paths through delimited tokens (`{{book.title}}`). This crate
//! flattens the tree into dotted-path keys and resolves nested references
//! to a fixed point ([`interpolate`]), detecting cycles instead of looping.
//!
//! # Example
//!
//! ```
//! use quill_sigils::SigilPair;
//! use quill_vars::{DefinitionTree, interpolate};
//!
//! let mut tree = DefinitionTree::new();
//! tree.insert("book.name", "Atlas");
//! tree.insert("title", "{{book.name}}");
//!
//! let pair = SigilPair::definitions().unwrap();
//! let resolution = interpolate(tree.flatten(), &pair);
//!
//! assert!(!resolution.is_cyclic());
//! assert_eq!(resolution.get("title"), Some("Atlas"));
//! ```

mod interpolate;
mod tree;

pub use interpolate::{MAX_PASSES, Resolution, interpolate};
pub use tree::{DefinitionNode, DefinitionTree};
