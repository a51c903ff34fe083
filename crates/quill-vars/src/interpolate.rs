//! Iterative substitution of nested definition references.

use std::collections::HashMap;

use quill_sigils::SigilPair;

/// Upper bound on substitution passes before declaring a cycle.
///
/// Reference chains deeper than this are reported as cyclic along with
/// genuine cycles; both leave their partially resolved values in place.
pub const MAX_PASSES: usize = 10;

/// Result of interpolating a definition map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved path→value map. Values flagged in `cyclic` retain their
    /// last partially substituted form.
    pub map: HashMap<String, String>,
    /// Keys whose values still referenced known keys when the pass bound
    /// was exhausted, in sorted order.
    pub cyclic: Vec<String>,
}

impl Resolution {
    /// Whether any key was flagged as part of a reference cycle.
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        !self.cyclic.is_empty()
    }

    /// Look up a resolved value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }
}

/// Resolve nested references in a flat definition map to a fixed point.
///
/// Each pass replaces every token whose bare key exists in the map with
/// that key's current value. Resolution stops early once a pass performs
/// no substitution, and is therefore idempotent: interpolating an
/// already-resolved map changes nothing.
///
/// Tokens referencing unknown keys are left verbatim; they are a concern
/// for the caller, not an error here. If [`MAX_PASSES`] passes still leave
/// resolvable tokens, the affected keys are flagged cyclic rather than
/// looping forever.
#[must_use]
pub fn interpolate(map: HashMap<String, String>, pair: &SigilPair) -> Resolution {
    let mut map = map;
    let keys: Vec<String> = map.keys().cloned().collect();

    for _ in 0..MAX_PASSES {
        let mut substituted = false;

        for key in &keys {
            let next = substitute(&map[key], &map, pair);
            if let Some(next) = next {
                map.insert(key.clone(), next);
                substituted = true;
            }
        }

        if !substituted {
            return Resolution {
                map,
                cyclic: Vec::new(),
            };
        }
    }

    // Pass bound exhausted with substitutions still pending: every key
    // whose value still holds a resolvable token is part of a cycle (or
    // a chain deeper than the bound).
    let mut cyclic: Vec<String> = keys
        .into_iter()
        .filter(|key| has_resolvable_token(&map[key], &map, pair))
        .collect();
    cyclic.sort_unstable();

    tracing::warn!(keys = ?cyclic, "cyclic definition references");

    Resolution { map, cyclic }
}

/// Replace each resolvable token in `value`, or `None` when nothing
/// applied.
fn substitute(value: &str, map: &HashMap<String, String>, pair: &SigilPair) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut tail = 0;

    for captures in pair.matcher().captures_iter(value) {
        let token = captures.get(0).expect("match has a full capture");
        let key = captures.get(1).expect("match has a key capture").as_str();

        if let Some(replacement) = map.get(key) {
            out.push_str(&value[tail..token.start()]);
            out.push_str(replacement);
            tail = token.end();
        }
    }

    if tail == 0 {
        return None;
    }

    out.push_str(&value[tail..]);
    Some(out)
}

fn has_resolvable_token(value: &str, map: &HashMap<String, String>, pair: &SigilPair) -> bool {
    pair.matcher()
        .captures_iter(value)
        .any(|c| map.contains_key(c.get(1).map_or("", |k| k.as_str())))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pair() -> SigilPair {
        SigilPair::definitions().unwrap()
    }

    fn map(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_sibling_reference_resolves() {
        let resolution = interpolate(
            map(&[("title", "{{book.name}}"), ("book.name", "Atlas")]),
            &pair(),
        );

        assert!(!resolution.is_cyclic());
        assert_eq!(resolution.get("title"), Some("Atlas"));
        assert_eq!(resolution.get("book.name"), Some("Atlas"));
    }

    #[test]
    fn test_chained_references_resolve() {
        let resolution = interpolate(
            map(&[("a", "{{b}}!"), ("b", "{{c}}"), ("c", "deep")]),
            &pair(),
        );

        assert!(!resolution.is_cyclic());
        assert_eq!(resolution.get("a"), Some("deep!"));
    }

    #[test]
    fn test_interpolation_is_idempotent() {
        let first = interpolate(
            map(&[("title", "{{book.name}}"), ("book.name", "Atlas")]),
            &pair(),
        );
        let second = interpolate(first.map.clone(), &pair());

        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_reference_passes_through() {
        let resolution = interpolate(map(&[("title", "{{missing}}")]), &pair());

        assert!(!resolution.is_cyclic());
        assert_eq!(resolution.get("title"), Some("{{missing}}"));
    }

    #[test]
    fn test_cycle_terminates_and_flags_both_keys() {
        let resolution = interpolate(map(&[("a", "{{b}}"), ("b", "{{a}}")]), &pair());

        assert!(resolution.is_cyclic());
        assert_eq!(resolution.cyclic, vec!["a".to_owned(), "b".to_owned()]);
        // Partial values remain rather than being dropped.
        assert!(resolution.get("a").is_some());
        assert!(resolution.get("b").is_some());
    }

    #[test]
    fn test_self_reference_is_cyclic() {
        let resolution = interpolate(map(&[("a", "loop {{a}}")]), &pair());

        assert!(resolution.is_cyclic());
        assert_eq!(resolution.cyclic, vec!["a".to_owned()]);
    }

    #[test]
    fn test_multiple_references_in_one_value() {
        let resolution = interpolate(
            map(&[
                ("greeting", "{{salute}} {{name}},"),
                ("salute", "Dear"),
                ("name", "Atlas"),
            ]),
            &pair(),
        );

        assert_eq!(resolution.get("greeting"), Some("Dear Atlas,"));
    }

    #[test]
    fn test_empty_map_resolves_empty() {
        let resolution = interpolate(HashMap::new(), &pair());
        assert!(resolution.map.is_empty());
        assert!(!resolution.is_cyclic());
    }
}
