//! Marker-offset location in XML markup.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::Caret;

const CDATA_BEGAN: &str = "<![CDATA[";
const CDATA_ENDED: &str = "]]>";

/// Find a safe marker offset in an XML document.
///
/// Tokenizes the document and targets character-data tokens only: a caret
/// inside a text token keeps its offset, a caret inside markup moves to
/// the start of the nearest following text token. Documents with no
/// suitable token, carets beyond the text, and documents that fail to
/// tokenize all yield `None`.
#[must_use]
pub fn xml_offset(text: &str, caret: &Caret) -> Option<usize> {
    if text.is_empty() || caret.text_offset > text.len() {
        return None;
    }

    let offset = caret.text_offset;
    let mut reader = Reader::from_str(text);
    reader.config_mut().check_end_names = true;

    // Offset range of the last character-data token seen before the caret.
    let mut previous: Option<(usize, usize)> = None;

    loop {
        let event_start = usize::try_from(reader.buffer_position()).ok()?;

        let range = match reader.read_event() {
            Ok(Event::Text(_)) => {
                let end = usize::try_from(reader.buffer_position()).ok()?;
                (event_start, end)
            }
            Ok(Event::CData(_)) => {
                let end = usize::try_from(reader.buffer_position()).ok()?;
                (
                    event_start + CDATA_BEGAN.len(),
                    end.saturating_sub(CDATA_ENDED.len()),
                )
            }
            Ok(Event::Eof) => break,
            Ok(_) => continue,
            Err(_) => return None,
        };

        if range.0 > offset {
            // First text token past the caret: inject at the caret when it
            // sits inside the previous token, else at this token's start.
            return match previous {
                Some((began, ended)) if began <= offset && offset <= ended => Some(offset),
                _ => Some(range.0),
            };
        }

        previous = Some(range);
    }

    // No following token; the caret may still sit inside the final one.
    previous.and_then(|(began, ended)| (began <= offset && offset <= ended).then_some(offset))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const DOC: &str = "<doc><p>Hello world</p><p>Again</p></doc>";

    #[test]
    fn test_caret_inside_text_token_keeps_offset() {
        // Inside "Hello world".
        let caret = Caret::at(10, DOC.len());
        assert_eq!(xml_offset(DOC, &caret), Some(10));
    }

    #[test]
    fn test_caret_inside_markup_moves_to_next_text() {
        // Inside the opening `<doc>` tag; first text token starts at 8.
        let caret = Caret::at(2, DOC.len());
        assert_eq!(xml_offset(DOC, &caret), Some(8));
    }

    #[test]
    fn test_caret_between_elements_moves_to_next_text() {
        // Inside `</p><p>` between the two paragraphs; "Again" starts at 26.
        let caret = Caret::at(21, DOC.len());
        assert_eq!(xml_offset(DOC, &caret), Some(26));
    }

    #[test]
    fn test_caret_inside_final_text_token() {
        // Inside "Again".
        let caret = Caret::at(28, DOC.len());
        assert_eq!(xml_offset(DOC, &caret), Some(28));
    }

    #[test]
    fn test_caret_in_trailing_markup_is_none() {
        // Inside the closing `</doc>`: no following text token.
        let caret = Caret::at(37, DOC.len());
        assert_eq!(xml_offset(DOC, &caret), None);
    }

    #[test]
    fn test_caret_past_text_is_none() {
        assert_eq!(xml_offset(DOC, &Caret::at(DOC.len() + 1, DOC.len())), None);
    }

    #[test]
    fn test_empty_document_is_none() {
        assert_eq!(xml_offset("", &Caret::at(0, 0)), None);
    }

    #[test]
    fn test_malformed_document_is_none() {
        let broken = "<doc><p>Hello</doc>";
        assert_eq!(xml_offset(broken, &Caret::at(9, broken.len())), None);
    }

    #[test]
    fn test_cdata_content_is_character_data() {
        let doc = "<doc><![CDATA[raw text]]></doc>";
        // Inside "raw text".
        let caret = Caret::at(18, doc.len());
        assert_eq!(xml_offset(doc, &caret), Some(18));
    }

    #[test]
    fn test_whitespace_between_tags_is_a_text_token() {
        let doc = "<doc>\n  <p>Body</p>\n</doc>";
        // Caret on the newline after `<doc>`.
        let caret = Caret::at(5, doc.len());
        assert_eq!(xml_offset(doc, &caret), Some(5));
    }
}
