//! Embedded-script evaluation: engine boundary, bounded result cache,
//! and the inline processor splicing results into the document.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use quill_sigils::SigilPair;

use crate::events::{StatusEvent, StatusSender, expression_preview};
use crate::processor::{ProcessError, Processor};

/// Default capacity of the evaluation cache. Constrains memory while the
/// user types new expressions into the document.
pub const DEFAULT_EVAL_CACHE_CAPACITY: usize = 512;

/// Definition key through which the working directory is exposed to the
/// bootstrap script.
pub const WORKING_DIR_KEY: &str = "application.script.working.directory";

/// A failed parse or evaluation of one expression.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EvalError {
    message: String,
}

impl EvalError {
    /// Create an error with the engine's message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The engine-reported failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The embedded script engine boundary.
///
/// Implemented by the host over whatever interpreter it embeds; the
/// pipeline never assumes a particular language beyond "expression in,
/// string out".
pub trait Evaluator: Send {
    /// Evaluate one expression to its string representation.
    fn eval(&mut self, expression: &str) -> Result<String, EvalError>;
}

/// Bounded expression→result cache with insertion-order eviction.
///
/// Eviction is by insertion, not access: once full, inserting a new
/// expression drops the oldest inserted entry. Re-inserting an existing
/// expression updates the value without renewing its position.
#[derive(Debug)]
pub struct EvalCache {
    capacity: usize,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl EvalCache {
    /// Create a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Look up a cached result.
    #[must_use]
    pub fn get(&self, expression: &str) -> Option<&str> {
        self.entries.get(expression).map(String::as_str)
    }

    /// Insert a result, evicting the oldest inserted entry when full.
    pub fn insert(&mut self, expression: String, value: String) {
        if self.entries.insert(expression.clone(), value).is_some() {
            return;
        }

        self.order.push_back(expression);
        if self.order.len() > self.capacity
            && let Some(eldest) = self.order.pop_front()
        {
            self.entries.remove(&eldest);
        }
    }

    /// Number of cached results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every cached result.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for EvalCache {
    fn default() -> Self {
        Self::new(DEFAULT_EVAL_CACHE_CAPACITY)
    }
}

/// Engine handle, result cache, and environment state for one script-
/// capable document.
///
/// Passed explicitly into the script processor at construction so hosts
/// choose whether documents share a context or own one each; there are no
/// process-wide statics. Changing the bootstrap source or the working
/// directory marks the context dirty; the next evaluation re-runs the
/// bootstrap against the engine. Cached results are kept across
/// reinitialization — only the interpreter environment reloads — and
/// [`clear_cache`](Self::clear_cache) exists for hosts that cannot accept
/// stale results.
pub struct EvaluationContext {
    engine: Box<dyn Evaluator>,
    cache: EvalCache,
    bootstrap: String,
    working_dir: PathBuf,
    dirty: bool,
}

impl EvaluationContext {
    /// Create a context around an engine, with the default cache
    /// capacity.
    #[must_use]
    pub fn new(engine: impl Evaluator + 'static) -> Self {
        Self::with_capacity(engine, DEFAULT_EVAL_CACHE_CAPACITY)
    }

    /// Create a context with an explicit cache capacity.
    #[must_use]
    pub fn with_capacity(engine: impl Evaluator + 'static, capacity: usize) -> Self {
        Self {
            engine: Box::new(engine),
            cache: EvalCache::new(capacity),
            bootstrap: String::new(),
            working_dir: PathBuf::from("."),
            dirty: false,
        }
    }

    /// Set the bootstrap script sourced on the next evaluation.
    pub fn set_bootstrap(&mut self, source: impl Into<String>) {
        self.bootstrap = source.into();
        self.dirty = true;
    }

    /// Set the working directory exposed to the bootstrap script.
    pub fn set_working_dir(&mut self, dir: impl Into<PathBuf>) {
        self.working_dir = dir.into();
        self.dirty = true;
    }

    /// Whether the environment must be reinitialized before the next
    /// evaluation.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The result cache.
    #[must_use]
    pub fn cache(&self) -> &EvalCache {
        &self.cache
    }

    /// Drop all cached results.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Evaluate an expression, consulting the cache first.
    ///
    /// `definitions` supply values substituted into the bootstrap script
    /// when a dirty environment reinitializes.
    pub fn evaluate(
        &mut self,
        expression: &str,
        definitions: &HashMap<String, String>,
        pair: &SigilPair,
    ) -> Result<String, EvalError> {
        if self.dirty {
            self.reinitialize(definitions, pair)?;
        }

        if let Some(hit) = self.cache.get(expression) {
            return Ok(hit.to_owned());
        }

        let value = self.engine.eval(expression)?;
        self.cache.insert(expression.to_owned(), value.clone());
        Ok(value)
    }

    /// Re-run the bootstrap script with definitions substituted.
    fn reinitialize(
        &mut self,
        definitions: &HashMap<String, String>,
        pair: &SigilPair,
    ) -> Result<(), EvalError> {
        // One reload per change, even when the bootstrap itself fails.
        self.dirty = false;

        if self.bootstrap.trim().is_empty() {
            return Ok(());
        }

        tracing::debug!(dir = %self.working_dir.display(), "reinitializing script environment");

        let dir = path_literal(&self.working_dir);
        let mut source = self
            .bootstrap
            .replace(&pair.entoken(WORKING_DIR_KEY), &dir);

        for (key, value) in definitions {
            let token = pair.entoken(key);
            if source.contains(&token) {
                source = source.replace(&token, value);
            }
        }

        self.engine.eval(&source).map(|_| ())
    }
}

/// Render a path the way script engines expect, forward slashes only.
fn path_literal(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Scans for delimited script expressions, evaluates each through the
/// shared [`EvaluationContext`], and splices the string results in place.
///
/// A failed expression keeps its delimited source span in the output and
/// is reported as a parse error; processing continues with the rest of
/// the document.
pub struct InlineScriptProcessor {
    context: Arc<Mutex<EvaluationContext>>,
    definitions: Arc<HashMap<String, String>>,
    definition_pair: SigilPair,
    script_pair: SigilPair,
    status: StatusSender,
}

impl InlineScriptProcessor {
    /// Create a processor evaluating through the given context.
    #[must_use]
    pub fn new(
        context: Arc<Mutex<EvaluationContext>>,
        definitions: Arc<HashMap<String, String>>,
        definition_pair: SigilPair,
        script_pair: SigilPair,
        status: StatusSender,
    ) -> Self {
        Self {
            context,
            definitions,
            definition_pair,
            script_pair,
            status,
        }
    }
}

impl Processor for InlineScriptProcessor {
    fn name(&self) -> &'static str {
        "inline-script"
    }

    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError> {
        let began = self.script_pair.began();
        let ended = self.script_pair.ended();

        if !text.contains(began) {
            return Ok(Some(text));
        }

        let mut context = match self.context.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("evaluation context mutex poisoned");
                poisoned.into_inner()
            }
        };

        let mut out = String::with_capacity(text.len() * 2);
        let mut cursor = 0;

        while let Some(found) = text[cursor..].find(began) {
            let start = cursor + found;
            out.push_str(&text[cursor..start]);

            let body = start + began.len();
            let Some(close) = text[body..].find(ended) else {
                // No closing delimiter; the rest is plain text.
                cursor = start;
                break;
            };

            let end = body + close;
            let expression = &text[body..end];

            match context.evaluate(expression, &self.definitions, &self.definition_pair) {
                Ok(value) => out.push_str(&value),
                Err(error) => {
                    // Preserve the source span unevaluated.
                    out.push_str(&text[start..end + ended.len()]);
                    self.status.send(StatusEvent::ParseError {
                        preview: expression_preview(expression),
                        message: error.message().to_owned(),
                        offset: start,
                    });
                }
            }

            cursor = end + ended.len();
        }

        out.push_str(&text[cursor..]);
        Ok(Some(out))
    }
}
