//! Key operators rewriting bare keys into dialect-addressed forms.

use crate::pair::SigilPair;

/// Maps a definition key into the form a dialect addresses it by.
///
/// Operators compose: a script operator accepts either a bare key or an
/// already-delimited definition token and produces a script token, so both
/// dialects address the same flat key space.
pub trait KeyOperator {
    /// Rewrite `key` into this operator's addressed form.
    fn apply(&self, key: &str) -> String;
}

/// Wraps a bare dotted key in the definition delimiters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefinitionOperator {
    pair: SigilPair,
}

impl DefinitionOperator {
    /// Create an operator for the given definition pair.
    #[must_use]
    pub fn new(pair: SigilPair) -> Self {
        Self { pair }
    }
}

impl KeyOperator for DefinitionOperator {
    fn apply(&self, key: &str) -> String {
        self.pair.entoken(key)
    }
}

/// Rewrites a dotted key into the script dialect's addressing syntax.
///
/// `book.title` becomes `v$book$title`: all keys hang off a single `v`
/// namespace variable and path segments are joined with `$`. The result
/// carries no delimiters; wrap it with the script [`SigilPair`] to form a
/// token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScriptKeyOperator;

impl ScriptKeyOperator {
    const NAMESPACE: &'static str = "v";
    const SEPARATOR: char = '$';
    const PATH_SEPARATOR: char = '.';

    /// Create a new operator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl KeyOperator for ScriptKeyOperator {
    fn apply(&self, key: &str) -> String {
        let mut name = String::with_capacity(Self::NAMESPACE.len() + 1 + key.len());
        name.push_str(Self::NAMESPACE);
        name.push(Self::SEPARATOR);

        for c in key.chars() {
            name.push(if c == Self::PATH_SEPARATOR {
                Self::SEPARATOR
            } else {
                c
            });
        }

        name
    }
}

/// Composes the definition and script dialects.
///
/// Accepts a bare key or a definition token, strips the definition
/// delimiters when present, converts the key via [`ScriptKeyOperator`],
/// and wraps the result in the script delimiters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptOperator {
    definitions: SigilPair,
    scripts: SigilPair,
    keys: ScriptKeyOperator,
}

impl ScriptOperator {
    /// Create an operator bridging the two delimiter pairs.
    #[must_use]
    pub fn new(definitions: SigilPair, scripts: SigilPair) -> Self {
        Self {
            definitions,
            scripts,
            keys: ScriptKeyOperator::new(),
        }
    }

    /// The script delimiter pair this operator wraps keys in.
    #[must_use]
    pub fn scripts(&self) -> &SigilPair {
        &self.scripts
    }
}

impl KeyOperator for ScriptOperator {
    fn apply(&self, key: &str) -> String {
        let bare = self.definitions.detoken(key);
        self.scripts.entoken(&self.keys.apply(bare))
    }
}
