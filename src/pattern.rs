//! Regular-expression plumbing shared by classification, checking, and
//! synthesis. Compiled patterns are cached process-wide so repeated
//! check/cast passes over the same schema do not recompile.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SchemaError;

/// Record key pattern accepting any key.
pub const ANY_KEY: &str = "^.*$";
/// Record key pattern accepting any array index.
pub const ANY_INDEX: &str = "^(0|[1-9][0-9]*)$";

static CACHE: Lazy<RwLock<HashMap<String, Regex>>> = Lazy::new(|| RwLock::new(HashMap::new()));

pub fn is_valid(pattern: &str) -> bool {
    compile(pattern).is_ok()
}

/// Compile through the cache. A pattern that fails to compile means the
/// surrounding node should never have classified, so surface `InvalidSchema`.
pub fn compile(pattern: &str) -> Result<Regex, SchemaError> {
    if let Some(rx) = CACHE.read().expect("pattern cache poisoned").get(pattern) {
        return Ok(rx.clone());
    }
    let rx = Regex::new(pattern).map_err(|_| SchemaError::InvalidSchema)?;
    CACHE
        .write()
        .expect("pattern cache poisoned")
        .insert(pattern.to_string(), rx.clone());
    Ok(rx)
}

/// If `pattern` is a finite enumerated alternation (`^a|b|c$` shaped, as
/// produced for record keys over literal unions), return the alternatives.
/// The two open patterns and anything containing metacharacters are not
/// enumerable.
pub fn alternation_keys(pattern: &str) -> Option<Vec<String>> {
    if pattern == ANY_KEY || pattern == ANY_INDEX {
        return None;
    }
    let body = pattern.strip_prefix('^')?.strip_suffix('$')?;
    let keys: Vec<&str> = body.split('|').collect();
    if keys
        .iter()
        .any(|k| k.is_empty() || k.chars().any(is_regex_meta))
    {
        return None;
    }
    Some(keys.into_iter().map(str::to_string).collect())
}

fn is_regex_meta(c: char) -> bool {
    matches!(
        c,
        '.' | '+' | '*' | '?' | '^' | '$' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_caches_and_matches() {
        let rx = compile("^[0-9]+$").unwrap();
        assert!(rx.is_match("042"));
        // second hit comes from the cache
        let rx2 = compile("^[0-9]+$").unwrap();
        assert_eq!(rx.as_str(), rx2.as_str());
    }

    #[test]
    fn invalid_pattern_is_invalid_schema() {
        assert_eq!(compile("(unclosed").unwrap_err(), SchemaError::InvalidSchema);
        assert!(!is_valid("(unclosed"));
        assert!(is_valid("^a|b$"));
    }

    #[test]
    fn alternation_enumeration() {
        assert_eq!(
            alternation_keys("^on|off$"),
            Some(vec!["on".to_string(), "off".to_string()])
        );
        assert_eq!(alternation_keys(ANY_KEY), None);
        assert_eq!(alternation_keys(ANY_INDEX), None);
        assert_eq!(alternation_keys("^pre.*$"), None);
        assert_eq!(alternation_keys("no-anchors"), None);
    }
}
