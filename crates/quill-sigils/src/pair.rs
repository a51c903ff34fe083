//! Delimiter pairs wrapping keys into tokens.

use regex::Regex;

use crate::SigilError;

/// Default opening delimiter for definition references.
pub const DEF_BEGAN: &str = "{{";
/// Default closing delimiter for definition references.
pub const DEF_ENDED: &str = "}}";
/// Default opening delimiter for embedded script expressions.
pub const SCRIPT_BEGAN: &str = "x( ";
/// Default closing delimiter for embedded script expressions.
pub const SCRIPT_ENDED: &str = " )";

/// An immutable pair of delimiter strings marking a variable reference.
///
/// Construction validates both delimiters are non-blank and compiles a
/// reusable matcher for finding tokens in text. A token is the delimited
/// form (`{{key}}`); a key is the bare form (`key`).
#[derive(Clone, Debug)]
pub struct SigilPair {
    began: String,
    ended: String,
    matcher: Regex,
}

impl SigilPair {
    /// Create a pair from opening and closing delimiters.
    ///
    /// Fails fast when either delimiter is blank: an empty delimiter would
    /// make every position in a document a token boundary.
    pub fn new(began: impl Into<String>, ended: impl Into<String>) -> Result<Self, SigilError> {
        let began = began.into();
        let ended = ended.into();

        if began.trim().is_empty() || ended.trim().is_empty() {
            return Err(SigilError::BlankDelimiter);
        }

        // Non-greedy so adjacent tokens on one line match separately.
        let pattern = format!("{}(.*?){}", regex::escape(&began), regex::escape(&ended));
        let matcher = Regex::new(&pattern)?;

        Ok(Self {
            began,
            ended,
            matcher,
        })
    }

    /// Pair using the default definition delimiters `{{` / `}}`.
    pub fn definitions() -> Result<Self, SigilError> {
        Self::new(DEF_BEGAN, DEF_ENDED)
    }

    /// Pair using the default script delimiters `x( ` / ` )`.
    pub fn scripts() -> Result<Self, SigilError> {
        Self::new(SCRIPT_BEGAN, SCRIPT_ENDED)
    }

    /// The opening delimiter.
    #[must_use]
    pub fn began(&self) -> &str {
        &self.began
    }

    /// The closing delimiter.
    #[must_use]
    pub fn ended(&self) -> &str {
        &self.ended
    }

    /// Wrap a bare key in this pair's delimiters.
    #[must_use]
    pub fn entoken(&self, key: &str) -> String {
        let mut token = String::with_capacity(self.began.len() + key.len() + self.ended.len());
        token.push_str(&self.began);
        token.push_str(key);
        token.push_str(&self.ended);
        token
    }

    /// Strip this pair's delimiters from a token.
    ///
    /// Returns the input unchanged when it is not wrapped in both
    /// delimiters, so already-bare keys pass through.
    #[must_use]
    pub fn detoken<'a>(&self, token: &'a str) -> &'a str {
        token
            .strip_prefix(self.began.as_str())
            .and_then(|rest| rest.strip_suffix(self.ended.as_str()))
            .unwrap_or(token)
    }

    /// Matcher finding tokens in text; capture group 1 is the bare key.
    #[must_use]
    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }
}

impl PartialEq for SigilPair {
    fn eq(&self, other: &Self) -> bool {
        self.began == other.began && self.ended == other.ended
    }
}

impl Eq for SigilPair {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_entoken_detoken_round_trip() {
        let pairs = [
            SigilPair::definitions().unwrap(),
            SigilPair::scripts().unwrap(),
            SigilPair::new("<%", "%>").unwrap(),
        ];

        for pair in &pairs {
            for key in ["k", "book.title", "a b c", "$weird$"] {
                assert_eq!(pair.detoken(&pair.entoken(key)), key);
            }
        }
    }

    #[test]
    fn test_detoken_identity_without_delimiters() {
        let pair = SigilPair::definitions().unwrap();
        assert_eq!(pair.detoken("book.title"), "book.title");
        assert_eq!(pair.detoken("{{unterminated"), "{{unterminated");
        assert_eq!(pair.detoken("unopened}}"), "unopened}}");
    }

    #[test]
    fn test_blank_delimiters_rejected() {
        assert!(matches!(
            SigilPair::new("", "}}"),
            Err(SigilError::BlankDelimiter)
        ));
        assert!(matches!(
            SigilPair::new("{{", "   "),
            Err(SigilError::BlankDelimiter)
        ));
    }

    #[test]
    fn test_matcher_finds_keys() {
        let pair = SigilPair::definitions().unwrap();
        let text = "Dear {{title}}, published {{book.year}}.";
        let keys: Vec<&str> = pair
            .matcher()
            .captures_iter(text)
            .map(|c| c.get(1).unwrap().as_str())
            .collect();
        assert_eq!(keys, vec!["title", "book.year"]);
    }

    #[test]
    fn test_matcher_is_non_greedy() {
        let pair = SigilPair::definitions().unwrap();
        let text = "{{a}} and {{b}}";
        assert_eq!(pair.matcher().find_iter(text).count(), 2);
    }

    #[test]
    fn test_matcher_escapes_metacharacters() {
        // `x( ` and ` )` contain regex metacharacters.
        let pair = SigilPair::scripts().unwrap();
        let keys: Vec<&str> = pair
            .matcher()
            .captures_iter("before x( 1+1 ) after")
            .map(|c| c.get(1).unwrap().as_str())
            .collect();
        assert_eq!(keys, vec!["1+1"]);
    }
}
