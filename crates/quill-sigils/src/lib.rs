//! Sigil handling for Quill.
//!
//! A *sigil* is the pair of delimiter strings that marks a variable
//! reference in source text, e.g. `{{book.title}}`. Each document dialect
//! addresses the same flat key space under its own token syntax:
//!
//! - Definition dialect: `{{book.title}}`
//! - Embedded-script dialect: `x( v$book$title )`
//!
//! [`SigilPair`] owns one delimiter pair and converts between bare keys and
//! delimited tokens. [`KeyOperator`] implementations rewrite a key into the
//! form a dialect addresses it by; operators compose, so a script operator
//! can accept either a bare key or an already-delimited definition token.
//!
//! # Example
//!
//! ```
//! use quill_sigils::{KeyOperator, ScriptOperator, SigilPair};
//!
//! let defs = SigilPair::definitions().unwrap();
//! assert_eq!(defs.entoken("book.title"), "{{book.title}}");
//! assert_eq!(defs.detoken("{{book.title}}"), "book.title");
//!
//! let op = ScriptOperator::new(defs, SigilPair::scripts().unwrap());
//! assert_eq!(op.apply("{{book.title}}"), "x( v$book$title )");
//! ```

mod operator;
mod pair;

pub use operator::{DefinitionOperator, KeyOperator, ScriptKeyOperator, ScriptOperator};
pub use pair::{DEF_BEGAN, DEF_ENDED, SCRIPT_BEGAN, SCRIPT_ENDED, SigilPair};

/// Sigil construction errors.
#[derive(Debug, thiserror::Error)]
pub enum SigilError {
    /// A delimiter was empty or whitespace-only.
    #[error("sigil delimiter must not be blank")]
    BlankDelimiter,

    /// The delimiter pair could not be compiled into a matcher.
    #[error("invalid sigil delimiter pair: {0}")]
    Matcher(#[from] regex::Error),
}
