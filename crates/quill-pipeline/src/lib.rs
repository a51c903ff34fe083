//! Processor chains for Quill.
//!
//! A document is rendered by pushing its text through an ordered sequence
//! of [`Processor`] stages — definition substitution, embedded-script
//! evaluation, markup rendering, stylesheet transforms, caret marker
//! handling — assembled once per (dialect, export target) by
//! [`ChainBuilder`] and reused across edits.
//!
//! Each stage returns `Ok(Some(text))` to feed the next stage, `Ok(None)`
//! when a terminal sink consumed the content, or `Err` for failures fatal
//! to the current pass (stylesheet transforms). Recoverable conditions —
//! unresolved references, script failures, cycles — never interrupt the
//! chain; they are reported out-of-band as [`StatusEvent`]s.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use quill_config::Dialect;
//! use quill_pipeline::{ChainBuilder, ExportTarget};
//!
//! let definitions: HashMap<String, String> =
//!     [("title".to_owned(), "Atlas".to_owned())].into();
//!
//! let mut chain = ChainBuilder::new(Dialect::Markdown, ExportTarget::Html)
//!     .with_definitions(definitions)
//!     .build()
//!     .unwrap();
//!
//! let html = chain.apply("Dear {{title}},").unwrap().unwrap();
//! assert_eq!(html, "<p>Dear Atlas,</p>");
//! ```

mod builder;
mod caret;
mod definition;
mod events;
mod markup;
mod processor;
mod script;
mod sink;
mod worker;
mod xslt;

pub use builder::{BuildError, ChainBuilder, ExportTarget};
pub use caret::{
    CARET_ANCHOR, CARET_ANCHOR_ID, CARET_MARKER, CaretInsertionProcessor, CaretLocator,
    CaretReplacementProcessor,
};
pub use definition::{DefinitionProcessor, ScriptVariableProcessor};
pub use events::{StatusEvent, StatusSender, expression_preview};
pub use markup::{IdentityProcessor, MarkupProcessor, PreformattedProcessor, escape_html};
pub use processor::{ProcessError, Processor, ProcessorChain};
pub use script::{
    DEFAULT_EVAL_CACHE_CAPACITY, EvalCache, EvalError, EvaluationContext, Evaluator,
    InlineScriptProcessor, WORKING_DIR_KEY,
};
pub use sink::{PreviewSink, SinkProcessor};
pub use worker::{RenderJob, RenderWorker};
pub use xslt::{StylesheetEngine, XsltProcessor};
