//! Chain assembly per (dialect, export target).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use quill_caret::Caret;
use quill_config::{Dialect, SigilSettings};
use quill_sigils::{ScriptOperator, SigilPair};

use crate::caret::{CaretInsertionProcessor, CaretLocator, CaretReplacementProcessor};
use crate::definition::{DefinitionProcessor, ScriptVariableProcessor};
use crate::events::StatusSender;
use crate::markup::{IdentityProcessor, MarkupProcessor, PreformattedProcessor};
use crate::processor::ProcessorChain;
use crate::script::{EvaluationContext, InlineScriptProcessor};
use crate::sink::{PreviewSink, SinkProcessor};
use crate::xslt::{StylesheetEngine, XsltProcessor};

/// Where the chain's output goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportTarget {
    /// Render to HTML and hand the result to the preview sink; the chain
    /// returns `None`.
    #[default]
    Preview,
    /// Render to HTML and return the fragment to the caller.
    Html,
    /// Substitute variables and evaluate scripts but leave markup alone.
    MarkdownPlain,
}

/// A chain could not be assembled from the given parts.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Script-capable dialects need an evaluation context.
    #[error("dialect {0:?} requires an evaluation context")]
    MissingEvaluator(Dialect),

    /// XML dialects need a stylesheet engine.
    #[error("dialect {0:?} requires a stylesheet engine")]
    MissingStylesheetEngine(Dialect),

    /// The preview target needs a sink to deliver output to.
    #[error("preview target requires a sink")]
    MissingSink,
}

/// Assembles a [`ProcessorChain`] for one open document.
///
/// Built once per (dialect, target) and rebuilt only when the document's
/// file type or output target changes; the resulting chain is reused
/// across edits.
pub struct ChainBuilder {
    dialect: Dialect,
    target: ExportTarget,
    definitions: Arc<HashMap<String, String>>,
    sigils: Option<SigilSettings>,
    caret: Caret,
    source: PathBuf,
    evaluation: Option<Arc<Mutex<EvaluationContext>>>,
    stylesheets: Option<Arc<dyn StylesheetEngine>>,
    sink: Option<Box<dyn PreviewSink>>,
    status: StatusSender,
}

impl ChainBuilder {
    /// Start a builder for the given dialect and target.
    #[must_use]
    pub fn new(dialect: Dialect, target: ExportTarget) -> Self {
        Self {
            dialect,
            target,
            definitions: Arc::new(HashMap::new()),
            sigils: None,
            caret: Caret::default(),
            source: PathBuf::new(),
            evaluation: None,
            stylesheets: None,
            sink: None,
            status: StatusSender::disconnected(),
        }
    }

    /// Use the given resolved definition map.
    #[must_use]
    pub fn with_definitions(mut self, definitions: HashMap<String, String>) -> Self {
        self.definitions = Arc::new(definitions);
        self
    }

    /// Use non-default sigil settings.
    #[must_use]
    pub fn with_sigils(mut self, sigils: SigilSettings) -> Self {
        self.sigils = Some(sigils);
        self
    }

    /// Use the given caret snapshot for marker insertion.
    #[must_use]
    pub fn with_caret(mut self, caret: Caret) -> Self {
        self.caret = caret;
        self
    }

    /// Path of the source document; stylesheet references resolve
    /// relative to its directory.
    #[must_use]
    pub fn with_source_path(mut self, source: PathBuf) -> Self {
        self.source = source;
        self
    }

    /// Evaluation context shared by script stages. Required for
    /// script-capable dialects.
    #[must_use]
    pub fn with_evaluation_context(mut self, context: Arc<Mutex<EvaluationContext>>) -> Self {
        self.evaluation = Some(context);
        self
    }

    /// Stylesheet engine applying XML transforms. Required for XML
    /// dialects.
    #[must_use]
    pub fn with_stylesheet_engine(mut self, engine: Arc<dyn StylesheetEngine>) -> Self {
        self.stylesheets = Some(engine);
        self
    }

    /// Terminal consumer of rendered output. Required for the preview
    /// target.
    #[must_use]
    pub fn with_sink(mut self, sink: impl PreviewSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Channel for recoverable-condition events.
    #[must_use]
    pub fn with_status(mut self, status: StatusSender) -> Self {
        self.status = status;
        self
    }

    /// Assemble the chain.
    pub fn build(self) -> Result<ProcessorChain, BuildError> {
        let sigils = match self.sigils {
            Some(sigils) => sigils,
            None => SigilSettings {
                definitions: SigilPair::definitions().expect("default delimiters are valid"),
                scripts: SigilPair::scripts().expect("default delimiters are valid"),
            },
        };

        let mut chain = ProcessorChain::new();
        let preview = self.target == ExportTarget::Preview;
        let markup = self.target != ExportTarget::MarkdownPlain;

        match self.dialect {
            Dialect::Markdown => {
                chain.push(DefinitionProcessor::new(
                    Arc::clone(&self.definitions),
                    sigils.definitions.clone(),
                    self.status.clone(),
                ));
                if preview {
                    chain.push(CaretInsertionProcessor::new(
                        self.caret,
                        CaretLocator::Markdown,
                    ));
                }
            }
            Dialect::RMarkdown => {
                let evaluation = self
                    .evaluation
                    .ok_or(BuildError::MissingEvaluator(self.dialect))?;

                chain.push(script_variables(&self.definitions, &sigils));
                if preview {
                    chain.push(CaretInsertionProcessor::new(
                        self.caret,
                        CaretLocator::ScriptedMarkdown(sigils.scripts.clone()),
                    ));
                }
                chain.push(InlineScriptProcessor::new(
                    evaluation,
                    Arc::clone(&self.definitions),
                    sigils.definitions.clone(),
                    sigils.scripts.clone(),
                    self.status.clone(),
                ));
            }
            Dialect::Xml => {
                let engine = self
                    .stylesheets
                    .ok_or(BuildError::MissingStylesheetEngine(self.dialect))?;

                if preview {
                    chain.push(CaretInsertionProcessor::new(self.caret, CaretLocator::Xml));
                }
                chain.push(XsltProcessor::new(self.source.clone(), engine));
                chain.push(DefinitionProcessor::new(
                    Arc::clone(&self.definitions),
                    sigils.definitions.clone(),
                    self.status.clone(),
                ));
            }
            Dialect::RXml => {
                let evaluation = self
                    .evaluation
                    .ok_or(BuildError::MissingEvaluator(self.dialect))?;
                let engine = self
                    .stylesheets
                    .ok_or(BuildError::MissingStylesheetEngine(self.dialect))?;

                if preview {
                    chain.push(CaretInsertionProcessor::new(self.caret, CaretLocator::Xml));
                }
                chain.push(script_variables(&self.definitions, &sigils));
                chain.push(InlineScriptProcessor::new(
                    evaluation,
                    Arc::clone(&self.definitions),
                    sigils.definitions.clone(),
                    sigils.scripts.clone(),
                    self.status.clone(),
                ));
                chain.push(XsltProcessor::new(self.source.clone(), engine));
            }
            Dialect::Unknown => {
                if markup {
                    chain.push(PreformattedProcessor::new());
                }
            }
        }

        // Common tail: render, re-anchor the caret, deliver.
        if markup && self.dialect != Dialect::Unknown {
            chain.push(MarkupProcessor::new());
        }
        if preview {
            if self.dialect != Dialect::Unknown {
                chain.push(CaretReplacementProcessor::new());
            }
            chain.push(SinkProcessor::new(
                self.sink.ok_or(BuildError::MissingSink)?,
            ));
        }
        if self.target == ExportTarget::MarkdownPlain {
            chain.push(IdentityProcessor::new());
        }

        Ok(chain)
    }
}

fn script_variables(
    definitions: &Arc<HashMap<String, String>>,
    sigils: &SigilSettings,
) -> ScriptVariableProcessor {
    let operator = ScriptOperator::new(sigils.definitions.clone(), sigils.scripts.clone());
    ScriptVariableProcessor::new(definitions, &operator)
}
