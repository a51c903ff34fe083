//! Variable substitution processors.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use quill_sigils::{KeyOperator, ScriptKeyOperator, ScriptOperator, SigilPair};

use crate::events::{StatusEvent, StatusSender};
use crate::processor::{ProcessError, Processor};

/// Replaces every delimited reference to a known key with its resolved
/// value. Tokens referencing unknown keys pass through unchanged and are
/// reported as missing definitions.
pub struct DefinitionProcessor {
    definitions: Arc<HashMap<String, String>>,
    pair: SigilPair,
    status: StatusSender,
}

impl DefinitionProcessor {
    /// Create a processor over a resolved definition map.
    #[must_use]
    pub fn new(
        definitions: Arc<HashMap<String, String>>,
        pair: SigilPair,
        status: StatusSender,
    ) -> Self {
        Self {
            definitions,
            pair,
            status,
        }
    }
}

impl Processor for DefinitionProcessor {
    fn name(&self) -> &'static str {
        "definitions"
    }

    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError> {
        let mut out = String::with_capacity(text.len());
        let mut tail = 0;
        let mut missing: HashSet<&str> = HashSet::new();

        for captures in self.pair.matcher().captures_iter(&text) {
            let token = captures.get(0).expect("match has a full capture");
            let key = captures.get(1).expect("match has a key capture").as_str();

            match self.definitions.get(key) {
                Some(value) => {
                    out.push_str(&text[tail..token.start()]);
                    out.push_str(value);
                    tail = token.end();
                }
                None => {
                    // Pass through verbatim; report each key once per run.
                    if missing.insert(key) {
                        self.status.send(StatusEvent::MissingDefinition {
                            key: key.to_owned(),
                        });
                    }
                }
            }
        }

        if tail == 0 {
            return Ok(Some(text));
        }

        out.push_str(&text[tail..]);
        Ok(Some(out))
    }
}

/// Rewrites the resolved map into the script dialect before substitution.
///
/// Two substitution tiers, applied in order:
///
/// 1. A script token wrapping exactly one variable reference
///    (`x( v$book$title )`) is the whole expression; it substitutes to
///    the plain value without touching the engine.
/// 2. A bare script-form key inside a larger expression
///    (`x( toupper(v$book$title) )`) substitutes to a quoted script
///    string literal so the remaining expression still evaluates.
///
/// Longer keys substitute before shorter ones, so `v$a$b` is never
/// corrupted by its `v$a` prefix.
pub struct ScriptVariableProcessor {
    token_substitutions: Vec<(String, String)>,
    literal_substitutions: Vec<(String, String)>,
}

impl ScriptVariableProcessor {
    /// Create a processor over a resolved definition map.
    #[must_use]
    pub fn new(definitions: &HashMap<String, String>, operator: &ScriptOperator) -> Self {
        let keys = ScriptKeyOperator::new();

        let mut token_substitutions: Vec<(String, String)> = definitions
            .iter()
            .map(|(key, value)| (operator.apply(key), value.clone()))
            .collect();
        let mut literal_substitutions: Vec<(String, String)> = definitions
            .iter()
            .map(|(key, value)| (keys.apply(key), quote_literal(value)))
            .collect();

        token_substitutions.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        literal_substitutions.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            token_substitutions,
            literal_substitutions,
        }
    }
}

impl Processor for ScriptVariableProcessor {
    fn name(&self) -> &'static str {
        "script-variables"
    }

    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError> {
        let mut text = text;
        for (needle, replacement) in self
            .token_substitutions
            .iter()
            .chain(&self.literal_substitutions)
        {
            if text.contains(needle.as_str()) {
                text = text.replace(needle.as_str(), replacement);
            }
        }
        Ok(Some(text))
    }
}

/// Quote a value as a script string literal.
fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn definitions(entries: &[(&str, &str)]) -> Arc<HashMap<String, String>> {
        Arc::new(
            entries
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        )
    }

    fn definition_processor(entries: &[(&str, &str)]) -> (DefinitionProcessor, std::sync::mpsc::Receiver<StatusEvent>) {
        let (status, receiver) = StatusSender::channel();
        let processor = DefinitionProcessor::new(
            definitions(entries),
            SigilPair::definitions().unwrap(),
            status,
        );
        (processor, receiver)
    }

    #[test]
    fn test_known_tokens_are_replaced() {
        let (mut processor, _events) = definition_processor(&[("title", "Atlas")]);
        let out = processor.apply("Dear {{title}},".to_owned()).unwrap();
        assert_eq!(out, Some("Dear Atlas,".to_owned()));
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let (mut processor, events) = definition_processor(&[("title", "Atlas")]);
        let out = processor
            .apply("{{title}} by {{author}}".to_owned())
            .unwrap();

        assert_eq!(out, Some("Atlas by {{author}}".to_owned()));
        assert_eq!(
            events.try_recv().unwrap(),
            StatusEvent::MissingDefinition {
                key: "author".to_owned()
            }
        );
    }

    #[test]
    fn test_missing_key_reported_once_per_run() {
        let (mut processor, events) = definition_processor(&[]);
        processor
            .apply("{{x}} and {{x}} again".to_owned())
            .unwrap();

        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_text_without_tokens_is_unchanged() {
        let (mut processor, _events) = definition_processor(&[("title", "Atlas")]);
        let out = processor.apply("No references here.".to_owned()).unwrap();
        assert_eq!(out, Some("No references here.".to_owned()));
    }

    fn script_processor(entries: &[(&str, &str)]) -> ScriptVariableProcessor {
        let operator = ScriptOperator::new(
            SigilPair::definitions().unwrap(),
            SigilPair::scripts().unwrap(),
        );
        ScriptVariableProcessor::new(&definitions(entries), &operator)
    }

    #[test]
    fn test_whole_token_substitutes_plain_value() {
        let mut processor = script_processor(&[("book.title", "Atlas")]);
        let out = processor
            .apply("Title: x( v$book$title )".to_owned())
            .unwrap();
        assert_eq!(out, Some("Title: Atlas".to_owned()));
    }

    #[test]
    fn test_key_inside_expression_substitutes_quoted_literal() {
        let mut processor = script_processor(&[("book.title", "Atlas")]);
        let out = processor
            .apply("x( toupper(v$book$title) )".to_owned())
            .unwrap();
        assert_eq!(out, Some("x( toupper('Atlas') )".to_owned()));
    }

    #[test]
    fn test_longer_keys_substitute_first() {
        let mut processor = script_processor(&[("a", "short"), ("a.b", "long")]);
        let out = processor
            .apply("x( v$a$b ) and x( f(v$a$b, v$a) )".to_owned())
            .unwrap();
        assert_eq!(out, Some("long and x( f('long', 'short') )".to_owned()));
    }

    #[test]
    fn test_script_literal_quotes_escaped() {
        assert_eq!(quote_literal("it's"), r"'it\'s'");
        assert_eq!(quote_literal("plain"), "'plain'");
    }
}
