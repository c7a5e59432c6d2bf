use regex::Regex;

use super::Dialect;

/// SQLite: `REGEXP` over NULL-coalesced text, `->>` JSON extraction, `?`
/// placeholders.
///
/// SQLite ships no `REGEXP` implementation; the host registers one, for
/// example backed by [`RegexpFunction`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn regex_target(&self, column: &str) -> String {
        format!("IFNULL({column}, '')")
    }

    fn regex_operator(&self, negated: bool) -> &'static str {
        if negated { "NOT REGEXP" } else { "REGEXP" }
    }

    fn json_target(&self, column: &str) -> String {
        format!("IFNULL({column}, JSON('{{}}'))")
    }

    fn json_extract_operator(&self) -> &'static str {
        "->>"
    }

    /// JSON path: `$.key1.key2`
    fn json_path(&self, keys: &[String]) -> String {
        let mut path = String::from("$");
        for key in keys {
            path.push('.');
            if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                path.push_str(key);
            } else {
                path.push('"');
                path.push_str(&key.replace('"', "\\\""));
                path.push('"');
            }
        }
        path
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

/// Backing for a user-defined `regexp(pattern, value)` SQL function.
///
/// `X REGEXP Y` is evaluated by SQLite as `regexp(Y, X)`. The last compiled
/// pattern is cached since one statement calls the function once per row
/// with the same pattern.
#[derive(Debug, Default)]
pub struct RegexpFunction {
    cached: Option<Regex>,
}

impl RegexpFunction {
    pub fn call(&mut self, pattern: &str, value: &str) -> Result<bool, regex::Error> {
        let regex = match self.cached.take() {
            Some(regex) if regex.as_str() == pattern => regex,
            _ => Regex::new(pattern)?,
        };
        let matched = regex.is_match(value);
        self.cached = Some(regex);
        Ok(matched)
    }
}

/// One-shot form of [`RegexpFunction::call`].
pub fn regexp(pattern: &str, value: &str) -> Result<bool, regex::Error> {
    Ok(Regex::new(pattern)?.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_path() {
        assert_eq!(Sqlite.json_path(&["key1".to_string()]), "$.key1");
        assert_eq!(
            Sqlite.json_path(&["a".to_string(), "b-c".to_string()]),
            "$.a.\"b-c\""
        );
    }

    #[test]
    fn test_regexp_search_semantics() {
        assert!(regexp("run", "my run").unwrap());
        assert!(!regexp("^run", "my run").unwrap());
        assert!(regexp("(", "x").is_err());
    }

    #[test]
    fn test_regexp_function_cache() {
        let mut function = RegexpFunction::default();
        assert!(function.call("^tr", "train").unwrap());
        assert!(!function.call("^tr", "val").unwrap());
        assert!(function.call("al$", "val").unwrap());
    }
}
