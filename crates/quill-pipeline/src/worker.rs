//! Off-loading chain invocation from the host's event thread.
//!
//! Caret moves, edits, and scroll events must never block, but a chain
//! containing script evaluation or a stylesheet transform can. The worker
//! owns the chain on a single dedicated thread and consumes jobs from a
//! channel; completion is delivered through each job's callback.
//!
//! There is no cooperative cancellation: a newer edit simply supersedes
//! in-flight results. Each job carries the document revision it rendered,
//! and the callback receives it back, so callers compare against their
//! current revision and discard stale completions. A hung evaluation
//! blocks only this thread.

use std::sync::mpsc::{Sender, channel};
use std::thread::JoinHandle;

use crate::processor::{ProcessError, ProcessorChain};

/// Completion callback: the rendered revision and the chain result.
pub type RenderCallback = Box<dyn FnOnce(u64, Result<Option<String>, ProcessError>) + Send>;

/// One render request.
pub struct RenderJob {
    /// Document revision this job renders; returned to the callback.
    pub revision: u64,
    /// Full document text.
    pub text: String,
    /// Invoked on the worker thread when the chain finishes.
    pub callback: RenderCallback,
}

impl RenderJob {
    /// Create a job.
    #[must_use]
    pub fn new(
        revision: u64,
        text: impl Into<String>,
        callback: impl FnOnce(u64, Result<Option<String>, ProcessError>) + Send + 'static,
    ) -> Self {
        Self {
            revision,
            text: text.into(),
            callback: Box::new(callback),
        }
    }
}

/// Single worker thread owning a [`ProcessorChain`].
///
/// Dropping the worker closes the channel; queued jobs finish and the
/// thread joins.
pub struct RenderWorker {
    sender: Option<Sender<RenderJob>>,
    handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    /// Spawn the worker around a chain.
    #[must_use]
    pub fn spawn(mut chain: ProcessorChain) -> Self {
        let (sender, receiver) = channel::<RenderJob>();

        let handle = std::thread::Builder::new()
            .name("quill-render".to_owned())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    let result = chain.apply(job.text);
                    if let Err(error) = &result {
                        tracing::warn!(revision = job.revision, %error, "render pass failed");
                    }
                    (job.callback)(job.revision, result);
                }
            })
            .expect("failed to spawn render worker thread");

        Self {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    /// Queue a render job. Returns `false` when the worker has shut down.
    pub fn submit(&self, job: RenderJob) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|sender| sender.send(job).is_ok())
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        // Close the channel so the thread drains and exits.
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builder::{ChainBuilder, ExportTarget};
    use quill_config::Dialect;

    fn worker() -> RenderWorker {
        let definitions: HashMap<String, String> =
            [("title".to_owned(), "Atlas".to_owned())].into();
        let chain = ChainBuilder::new(Dialect::Markdown, ExportTarget::Html)
            .with_definitions(definitions)
            .build()
            .unwrap();
        RenderWorker::spawn(chain)
    }

    #[test]
    fn test_job_renders_and_calls_back() {
        let results = Arc::new(Mutex::new(Vec::new()));
        let handle = Arc::clone(&results);

        let worker = worker();
        assert!(worker.submit(RenderJob::new(1, "Dear {{title}},", move |rev, result| {
            handle.lock().unwrap().push((rev, result.unwrap()));
        })));
        drop(worker);

        let results = results.lock().unwrap();
        assert_eq!(
            *results,
            vec![(1, Some("<p>Dear Atlas,</p>".to_owned()))]
        );
    }

    #[test]
    fn test_stale_revisions_are_discarded_by_caller() {
        let latest = Arc::new(Mutex::new(0_u64));
        let applied = Arc::new(Mutex::new(Vec::new()));

        let worker = worker();
        *latest.lock().unwrap() = 2;

        for revision in [1_u64, 2] {
            let latest = Arc::clone(&latest);
            let applied = Arc::clone(&applied);
            worker.submit(RenderJob::new(revision, "text", move |rev, _result| {
                // The caller applies a completion only when it is still
                // the newest revision it has seen.
                if rev == *latest.lock().unwrap() {
                    applied.lock().unwrap().push(rev);
                }
            }));
        }
        drop(worker);

        assert_eq!(*applied.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_jobs_complete_before_shutdown() {
        let count = Arc::new(Mutex::new(0));

        let worker = worker();
        for revision in 0..8 {
            let count = Arc::clone(&count);
            worker.submit(RenderJob::new(revision, "x", move |_, _| {
                *count.lock().unwrap() += 1;
            }));
        }
        drop(worker);

        assert_eq!(*count.lock().unwrap(), 8);
    }

}
