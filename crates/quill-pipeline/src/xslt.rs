//! Stylesheet transformation of XML documents.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::processor::{ProcessError, Processor};

/// The XSLT engine boundary.
///
/// The pipeline locates the stylesheet and resolves its path; applying
/// the transform is the host's concern (whatever engine it embeds or
/// shells out to).
pub trait StylesheetEngine: Send + Sync {
    /// Transform `xml` using the stylesheet at `stylesheet`.
    fn transform(&self, xml: &str, stylesheet: &Path) -> Result<String, ProcessError>;
}

/// Transforms an XML document through the stylesheet referenced by its
/// `xml-stylesheet` processing instruction, e.g.:
///
/// ```xml
/// <?xml-stylesheet type="text/xsl" href="manuscript.xsl"?>
/// ```
///
/// The `href` resolves relative to the source document's directory. A
/// missing instruction, missing `href`, or failing transform is fatal to
/// the current pass and propagates to the orchestrator; the document
/// stays editable and the previous good preview is retained by the
/// caller.
pub struct XsltProcessor {
    source: PathBuf,
    engine: Arc<dyn StylesheetEngine>,
}

impl XsltProcessor {
    /// Create a processor for the XML document at `source`.
    #[must_use]
    pub fn new(source: PathBuf, engine: Arc<dyn StylesheetEngine>) -> Self {
        Self { source, engine }
    }
}

impl Processor for XsltProcessor {
    fn name(&self) -> &'static str {
        "xslt"
    }

    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError> {
        if text.is_empty() {
            return Ok(Some(text));
        }

        let href = stylesheet_href(&text)?;
        let stylesheet = self
            .source
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&href);

        tracing::debug!(stylesheet = %stylesheet.display(), "applying stylesheet");
        let transformed = self.engine.transform(&text, &stylesheet)?;
        Ok(Some(transformed))
    }
}

/// Extract the `href` pseudo-attribute of the first `xml-stylesheet`
/// processing instruction.
fn stylesheet_href(xml: &str) -> Result<String, ProcessError> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::PI(pi)) => {
                let target: &[u8] = pi.target().as_ref();
                if target == b"xml-stylesheet" {
                    let content = String::from_utf8_lossy(pi.content());
                    return pseudo_attribute(&content, "href")
                        .ok_or(ProcessError::MissingStylesheetHref);
                }
            }
            Ok(Event::Eof) => return Err(ProcessError::MissingStylesheetInstruction),
            Ok(_) => {}
            Err(error) => return Err(error.into()),
        }
    }
}

/// Parse a pseudo-attribute (`name="value"` or `name='value'`) out of a
/// processing-instruction body.
fn pseudo_attribute(content: &str, name: &str) -> Option<String> {
    let mut search = 0;

    while let Some(found) = content[search..].find(name) {
        let start = search + found;
        search = start + name.len();

        // Must stand alone, not be the tail of another attribute name.
        if start > 0
            && !content[..start]
                .chars()
                .next_back()
                .is_some_and(char::is_whitespace)
        {
            continue;
        }

        let rest = content[search..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();

        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }

        let value = &rest[1..];
        return value.find(quote).map(|end| value[..end].to_owned());
    }

    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Engine substituting the document for a canned result.
    struct FixedEngine(String);

    impl StylesheetEngine for FixedEngine {
        fn transform(&self, _xml: &str, _stylesheet: &Path) -> Result<String, ProcessError> {
            Ok(self.0.clone())
        }
    }

    /// Engine reporting the stylesheet path it was handed.
    struct PathEchoEngine;

    impl StylesheetEngine for PathEchoEngine {
        fn transform(&self, _xml: &str, stylesheet: &Path) -> Result<String, ProcessError> {
            Ok(stylesheet.display().to_string())
        }
    }

    struct FailingEngine;

    impl StylesheetEngine for FailingEngine {
        fn transform(&self, _xml: &str, _stylesheet: &Path) -> Result<String, ProcessError> {
            Err(ProcessError::Transform("compilation failed".to_owned()))
        }
    }

    const XML: &str = "<?xml-stylesheet type=\"text/xsl\" href=\"manuscript.xsl\"?>\n<doc>text</doc>";

    #[test]
    fn test_transform_invoked_with_resolved_path() {
        let mut processor = XsltProcessor::new(
            PathBuf::from("/books/novel/ch01.xml"),
            Arc::new(PathEchoEngine),
        );

        let out = processor.apply(XML.to_owned()).unwrap().unwrap();
        assert_eq!(out, "/books/novel/manuscript.xsl");
    }

    #[test]
    fn test_transform_output_replaces_document() {
        let mut processor = XsltProcessor::new(
            PathBuf::from("doc.xml"),
            Arc::new(FixedEngine("# Chapter".to_owned())),
        );

        let out = processor.apply(XML.to_owned()).unwrap();
        assert_eq!(out, Some("# Chapter".to_owned()));
    }

    #[test]
    fn test_missing_instruction_is_fatal() {
        let mut processor =
            XsltProcessor::new(PathBuf::from("doc.xml"), Arc::new(PathEchoEngine));

        let result = processor.apply("<doc>no instruction</doc>".to_owned());
        assert!(matches!(
            result,
            Err(ProcessError::MissingStylesheetInstruction)
        ));
    }

    #[test]
    fn test_missing_href_is_fatal() {
        let mut processor =
            XsltProcessor::new(PathBuf::from("doc.xml"), Arc::new(PathEchoEngine));

        let result = processor
            .apply("<?xml-stylesheet type=\"text/xsl\"?><doc/>".to_owned());
        assert!(matches!(result, Err(ProcessError::MissingStylesheetHref)));
    }

    #[test]
    fn test_engine_failure_propagates() {
        let mut processor =
            XsltProcessor::new(PathBuf::from("doc.xml"), Arc::new(FailingEngine));

        let result = processor.apply(XML.to_owned());
        assert!(matches!(result, Err(ProcessError::Transform(_))));
    }

    #[test]
    fn test_empty_document_passes_through() {
        let mut processor =
            XsltProcessor::new(PathBuf::from("doc.xml"), Arc::new(PathEchoEngine));

        assert_eq!(processor.apply(String::new()).unwrap(), Some(String::new()));
    }

    #[test]
    fn test_pseudo_attribute_variants() {
        assert_eq!(
            pseudo_attribute("type=\"text/xsl\" href=\"a.xsl\"", "href"),
            Some("a.xsl".to_owned())
        );
        assert_eq!(
            pseudo_attribute("href='single.xsl'", "href"),
            Some("single.xsl".to_owned())
        );
        assert_eq!(
            pseudo_attribute("href = \"spaced.xsl\"", "href"),
            Some("spaced.xsl".to_owned())
        );
        // `xhref` must not satisfy a search for `href`.
        assert_eq!(pseudo_attribute("xhref=\"decoy.xsl\"", "href"), None);
        assert_eq!(pseudo_attribute("type=\"text/xsl\"", "href"), None);
    }
}
