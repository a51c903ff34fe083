//! Terminal sinks consuming rendered output.

use crate::processor::{ProcessError, Processor};

/// Consumer of final chain output: a live preview pane, a file exporter,
/// a network transport. Closures implement it directly.
pub trait PreviewSink: Send {
    /// Accept the rendered document.
    fn accept(&mut self, output: &str);
}

impl<F: FnMut(&str) + Send> PreviewSink for F {
    fn accept(&mut self, output: &str) {
        self(output);
    }
}

impl PreviewSink for Box<dyn PreviewSink> {
    fn accept(&mut self, output: &str) {
        self.as_mut().accept(output);
    }
}

/// Hands the final string to the sink and terminates the chain.
pub struct SinkProcessor {
    sink: Box<dyn PreviewSink>,
}

impl SinkProcessor {
    /// Create a terminal stage around a sink.
    #[must_use]
    pub fn new(sink: impl PreviewSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }
}

impl Processor for SinkProcessor {
    fn name(&self) -> &'static str {
        "sink"
    }

    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError> {
        self.sink.accept(&text);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_sink_receives_output_and_terminates() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let handle = Arc::clone(&received);

        let mut processor = SinkProcessor::new(move |output: &str| {
            handle.lock().unwrap().push(output.to_owned());
        });

        let result = processor.apply("<p>final</p>".to_owned()).unwrap();
        assert_eq!(result, None);
        assert_eq!(*received.lock().unwrap(), vec!["<p>final</p>".to_owned()]);
    }
}
