//! Hierarchical definition documents prior to flattening.

use std::collections::HashMap;

/// A node in a definition document: either a leaf value or a branch of
/// named children. Children preserve insertion order so flattening (and
/// therefore event reporting) is deterministic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefinitionNode {
    /// Leaf value; may contain delimited references to other paths.
    Value(String),
    /// Named children in insertion order.
    Branch(Vec<(String, DefinitionNode)>),
}

impl DefinitionNode {
    fn branch_mut(&mut self) -> &mut Vec<(String, DefinitionNode)> {
        if let Self::Value(_) = self {
            // A path extends through a former leaf; the leaf value is
            // superseded by the branch.
            *self = Self::Branch(Vec::new());
        }
        match self {
            Self::Branch(children) => children,
            Self::Value(_) => unreachable!(),
        }
    }
}

/// A hierarchical key-value document, keyed by dotted paths.
///
/// Built by an external loader (the format is the loader's concern); the
/// pipeline consumes only the flattened path→value view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefinitionTree {
    children: Vec<(String, DefinitionNode)>,
}

impl DefinitionTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value at a dotted path, creating branches as needed.
    ///
    /// Paths are case-sensitive. Inserting the same path twice replaces
    /// the previous value.
    pub fn insert(&mut self, path: &str, value: impl Into<String>) {
        let mut children = &mut self.children;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let position = children.iter().position(|(name, _)| name == segment);
            let last = segments.peek().is_none();

            let index = match position {
                Some(index) => index,
                None => {
                    children.push((segment.to_owned(), DefinitionNode::Branch(Vec::new())));
                    children.len() - 1
                }
            };

            if last {
                children[index].1 = DefinitionNode::Value(value.into());
                return;
            }

            children = children[index].1.branch_mut();
        }
    }

    /// Whether the tree has no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Flatten into a dotted-path map.
    ///
    /// Branch nodes contribute no entry of their own; only leaves appear.
    #[must_use]
    pub fn flatten(&self) -> HashMap<String, String> {
        let mut flat = HashMap::new();
        flatten_into(&self.children, "", &mut flat);
        flat
    }
}

fn flatten_into(
    children: &[(String, DefinitionNode)],
    prefix: &str,
    flat: &mut HashMap<String, String>,
) {
    for (name, node) in children {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };

        match node {
            DefinitionNode::Value(value) => {
                flat.insert(path, value.clone());
            }
            DefinitionNode::Branch(nested) => flatten_into(nested, &path, flat),
        }
    }
}
