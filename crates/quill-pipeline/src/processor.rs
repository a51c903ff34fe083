//! The processor contract and chain execution.

/// Errors fatal to a single processing pass.
///
/// These bubble up to the orchestrating caller, which is expected to
/// report the failure and retain the previous good output; the document
/// stays editable and the next edit retries from scratch.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The XML document carries no `xml-stylesheet` processing
    /// instruction.
    #[error("no xml-stylesheet processing instruction found")]
    MissingStylesheetInstruction,

    /// The `xml-stylesheet` instruction has no `href` pseudo-attribute.
    #[error("xml-stylesheet instruction has no href pseudo-attribute")]
    MissingStylesheetHref,

    /// The stylesheet engine rejected the transform.
    #[error("stylesheet transform failed: {0}")]
    Transform(String),

    /// The document could not be scanned as XML.
    #[error("failed to scan xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A named pipeline stage transforming document text.
///
/// Returning `Ok(None)` signals that a terminal sink already consumed the
/// content and no further stage should run — also used by binary/export
/// paths to signal "do not write a text file".
pub trait Processor: Send {
    /// Stage name for diagnostics.
    fn name(&self) -> &'static str;

    /// Transform the document text.
    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError>;
}

/// An ordered, acyclic sequence of processors, built once per
/// (dialect, export target) combination and reused across edits.
#[derive(Default)]
pub struct ProcessorChain {
    stages: Vec<Box<dyn Processor>>,
}

impl ProcessorChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn push(&mut self, stage: impl Processor + 'static) {
        self.stages.push(Box::new(stage));
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|stage| stage.name())
    }

    /// Run the document text through every stage in order.
    ///
    /// Stops early when a stage reports terminal consumption (`Ok(None)`)
    /// or fails. The chain itself executes synchronously on the calling
    /// thread; callers off-load invocation when a stage blocks (script
    /// evaluation, stylesheet transforms) — see [`RenderWorker`].
    ///
    /// [`RenderWorker`]: crate::RenderWorker
    pub fn apply(&mut self, text: impl Into<String>) -> Result<Option<String>, ProcessError> {
        let mut text = text.into();

        for stage in &mut self.stages {
            tracing::trace!(stage = stage.name(), "applying processor");
            match stage.apply(text)? {
                Some(next) => text = next,
                None => return Ok(None),
            }
        }

        Ok(Some(text))
    }
}
