//! Out-of-band status notifications.
//!
//! Recoverable conditions are absorbed inside the chain and surfaced here
//! instead of interrupting the document. The host consumes them as
//! status-bar text; this crate supplies only the error kind and minimal
//! context, never user-facing formatting.

use std::sync::mpsc::{Receiver, Sender, channel};

use quill_vars::Resolution;

/// Maximum characters of an expression carried in an event.
const PREVIEW_LENGTH: usize = 30;

/// A recoverable condition observed during processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusEvent {
    /// An embedded script expression failed to parse or evaluate; the
    /// source span was preserved unevaluated.
    ParseError {
        /// Truncated expression text.
        preview: String,
        /// Engine-reported failure.
        message: String,
        /// Byte offset of the expression in the document.
        offset: usize,
    },
    /// Interpolation hit the pass bound with references still pending.
    CyclicDefinition {
        /// Offending keys, sorted.
        keys: Vec<String>,
    },
    /// A token referenced a key absent from the resolved map; the token
    /// was passed through verbatim.
    MissingDefinition {
        /// The unresolved key.
        key: String,
    },
}

/// Truncate an expression for inclusion in an event.
#[must_use]
pub fn expression_preview(expression: &str) -> String {
    if expression.len() <= PREVIEW_LENGTH {
        return expression.to_owned();
    }
    let mut end = PREVIEW_LENGTH;
    while !expression.is_char_boundary(end) {
        end -= 1;
    }
    expression[..end].to_owned()
}

/// Cloneable sending half of the status channel.
///
/// A disconnected sender drops events silently (they are still traced),
/// so processors never need to care whether a host is listening.
#[derive(Clone, Default)]
pub struct StatusSender {
    sender: Option<Sender<StatusEvent>>,
}

impl StatusSender {
    /// Create a connected channel.
    #[must_use]
    pub fn channel() -> (Self, Receiver<StatusEvent>) {
        let (sender, receiver) = channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Create a sender with no listener.
    #[must_use]
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Emit an event.
    pub fn send(&self, event: StatusEvent) {
        tracing::debug!(?event, "status event");
        if let Some(sender) = &self.sender {
            // A dropped receiver is indistinguishable from no listener.
            let _ = sender.send(event);
        }
    }

    /// Emit a [`StatusEvent::CyclicDefinition`] when the resolution was
    /// flagged.
    pub fn report_resolution(&self, resolution: &Resolution) {
        if resolution.is_cyclic() {
            self.send(StatusEvent::CyclicDefinition {
                keys: resolution.cyclic.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_preview_keeps_short_expressions() {
        assert_eq!(expression_preview("1+1"), "1+1");
    }

    #[test]
    fn test_preview_truncates_long_expressions() {
        let long = "x".repeat(80);
        assert_eq!(expression_preview(&long).len(), 30);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let long = "é".repeat(40);
        let preview = expression_preview(&long);
        assert!(preview.len() <= 30);
        assert!(long.starts_with(&preview));
    }

    #[test]
    fn test_channel_delivers_events() {
        let (sender, receiver) = StatusSender::channel();
        sender.send(StatusEvent::MissingDefinition {
            key: "title".to_owned(),
        });

        assert_eq!(
            receiver.try_recv().unwrap(),
            StatusEvent::MissingDefinition {
                key: "title".to_owned()
            }
        );
    }

    #[test]
    fn test_disconnected_sender_is_silent() {
        let sender = StatusSender::disconnected();
        sender.send(StatusEvent::CyclicDefinition { keys: Vec::new() });
    }

    #[test]
    fn test_report_resolution_only_when_cyclic() {
        let (sender, receiver) = StatusSender::channel();

        sender.report_resolution(&Resolution::default());
        assert!(receiver.try_recv().is_err());

        let mut flagged = Resolution::default();
        flagged.cyclic.push("a".to_owned());
        sender.report_resolution(&flagged);
        assert!(matches!(
            receiver.try_recv().unwrap(),
            StatusEvent::CyclicDefinition { keys } if keys == vec!["a".to_owned()]
        ));
    }
}
