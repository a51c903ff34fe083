//! Loading the YAML definition source into a definition tree.
//!
//! The pipeline consumes only the flattened path→value view; the YAML
//! shape itself is this loader's concern. Mappings nest into dotted
//! paths, sequences contribute index segments, scalars become string
//! values.

use quill_vars::DefinitionTree;
use serde_yaml::Value;

/// Convert a parsed YAML document into a [`DefinitionTree`].
pub(crate) fn definition_tree(value: &Value) -> DefinitionTree {
    let mut tree = DefinitionTree::new();
    collect(value, "", &mut tree);
    tree
}

fn collect(value: &Value, path: &str, tree: &mut DefinitionTree) {
    match value {
        Value::Mapping(mapping) => {
            for (key, nested) in mapping {
                let Some(segment) = scalar_text(key) else {
                    tracing::warn!(path, "skipping non-scalar mapping key");
                    continue;
                };
                let nested_path = join(path, &segment);
                collect(nested, &nested_path, tree);
            }
        }
        Value::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                let nested_path = join(path, &index.to_string());
                collect(item, &nested_path, tree);
            }
        }
        Value::Tagged(tagged) => collect(&tagged.value, path, tree),
        scalar => {
            if path.is_empty() {
                return;
            }
            let text = scalar_text(scalar).unwrap_or_default();
            tree.insert(path, text);
        }
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_owned()
    } else {
        format!("{path}.{segment}")
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
