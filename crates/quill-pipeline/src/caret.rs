//! Caret marker insertion and replacement.
//!
//! The marker is an internal-only sentinel spliced into the *input* text
//! before rendering; after rendering it is swapped for an anchor element
//! with a well-known id the scroll synchronizer can target. End users
//! never see the sentinel.

use quill_caret::{Caret, markdown_offset, scripted_markdown_offset, xml_offset};
use quill_sigils::SigilPair;

use crate::processor::{ProcessError, Processor};

/// The sentinel spliced into source text to track the caret through
/// rendering.
pub const CARET_MARKER: &str = "${QUILLCARET}";

/// Identifier carried by the rendered caret anchor.
pub const CARET_ANCHOR_ID: &str = "caret";

/// The anchor element substituted for the marker in rendered output.
pub const CARET_ANCHOR: &str = "<span id=\"caret\"></span>";

/// In XML the marker travels inside CDATA so the transform engine passes
/// it through as character data.
const CARET_MARKER_CDATA: &str = "<![CDATA[${QUILLCARET}]]>";

/// Which locator finds the marker offset.
#[derive(Clone, Debug)]
pub enum CaretLocator {
    /// Plain Markdown prose.
    Markdown,
    /// Markdown containing script spans delimited by the given pair.
    ScriptedMarkdown(SigilPair),
    /// XML markup.
    Xml,
}

/// Splices the caret marker into the input text at a dialect-safe offset.
///
/// When no safe offset exists (caret out of bounds, empty or unparseable
/// document), the processor is a passthrough for that call; losing the
/// marker for one render is preferable to corrupting the document.
pub struct CaretInsertionProcessor {
    caret: Caret,
    locator: CaretLocator,
}

impl CaretInsertionProcessor {
    /// Create a processor for the caret snapshot and locator.
    #[must_use]
    pub fn new(caret: Caret, locator: CaretLocator) -> Self {
        Self { caret, locator }
    }

    /// Update the caret snapshot for the next render.
    pub fn set_caret(&mut self, caret: Caret) {
        self.caret = caret;
    }
}

impl Processor for CaretInsertionProcessor {
    fn name(&self) -> &'static str {
        "caret-insertion"
    }

    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError> {
        let located = match &self.locator {
            CaretLocator::Markdown => markdown_offset(&text, &self.caret),
            CaretLocator::ScriptedMarkdown(pair) => {
                scripted_markdown_offset(&text, &self.caret, pair)
            }
            CaretLocator::Xml => xml_offset(&text, &self.caret),
        };

        let Some(offset) = located else {
            tracing::debug!(offset = self.caret.text_offset, "no caret marker inserted");
            return Ok(Some(text));
        };

        let marker = match self.locator {
            CaretLocator::Xml => CARET_MARKER_CDATA,
            _ => CARET_MARKER,
        };

        let mut text = text;
        text.insert_str(offset, marker);
        Ok(Some(text))
    }
}

/// Replaces the first marker occurrence in *rendered* output with the
/// caret anchor element.
#[derive(Clone, Copy, Debug, Default)]
pub struct CaretReplacementProcessor;

impl CaretReplacementProcessor {
    /// Create the processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Processor for CaretReplacementProcessor {
    fn name(&self) -> &'static str {
        "caret-replacement"
    }

    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError> {
        let Some(found) = text.find(CARET_MARKER) else {
            return Ok(Some(text));
        };

        let mut out = String::with_capacity(text.len() + CARET_ANCHOR.len());
        out.push_str(&text[..found]);
        out.push_str(CARET_ANCHOR);
        out.push_str(&text[found + CARET_MARKER.len()..]);
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_marker_inserted_at_markdown_offset() {
        let text = "Hello world";
        let mut processor = CaretInsertionProcessor::new(
            Caret::at(6, text.len()),
            CaretLocator::Markdown,
        );

        let out = processor.apply(text.to_owned()).unwrap().unwrap();
        assert_eq!(out, "Hello ${QUILLCARET}world");
    }

    #[test]
    fn test_out_of_bounds_caret_is_passthrough() {
        let text = "short";
        let mut processor = CaretInsertionProcessor::new(
            Caret::at(50, text.len()),
            CaretLocator::Markdown,
        );

        let out = processor.apply(text.to_owned()).unwrap().unwrap();
        assert_eq!(out, "short");
    }

    #[test]
    fn test_xml_marker_wrapped_in_cdata() {
        let text = "<doc><p>Body</p></doc>";
        let mut processor =
            CaretInsertionProcessor::new(Caret::at(9, text.len()), CaretLocator::Xml);

        let out = processor.apply(text.to_owned()).unwrap().unwrap();
        assert_eq!(out, "<doc><p>B<![CDATA[${QUILLCARET}]]>ody</p></doc>");
    }

    #[test]
    fn test_scripted_markdown_relocates_into_safety() {
        let text = "x( 1+1 )";
        let mut processor = CaretInsertionProcessor::new(
            Caret::at(4, text.len()),
            CaretLocator::ScriptedMarkdown(SigilPair::scripts().unwrap()),
        );

        let out = processor.apply(text.to_owned()).unwrap().unwrap();
        assert_eq!(out, "${QUILLCARET}x( 1+1 )");
    }

    #[test]
    fn test_replacement_swaps_first_marker_for_anchor() {
        let mut processor = CaretReplacementProcessor::new();
        let out = processor
            .apply("<p>Hello ${QUILLCARET}world</p>".to_owned())
            .unwrap()
            .unwrap();

        assert_eq!(out, "<p>Hello <span id=\"caret\"></span>world</p>");
    }

    #[test]
    fn test_replacement_without_marker_is_passthrough() {
        let mut processor = CaretReplacementProcessor::new();
        let out = processor.apply("<p>plain</p>".to_owned()).unwrap().unwrap();
        assert_eq!(out, "<p>plain</p>");
    }

    #[test]
    fn test_anchor_carries_well_known_id() {
        assert!(CARET_ANCHOR.contains(CARET_ANCHOR_ID));
    }
}
