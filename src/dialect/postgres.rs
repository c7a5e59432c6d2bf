use super::Dialect;

/// PostgreSQL: `~` regex, `#>>` JSON extraction, `$n` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn regex_target(&self, column: &str) -> String {
        column.to_string()
    }

    fn regex_operator(&self, negated: bool) -> &'static str {
        if negated { "!~" } else { "~" }
    }

    fn json_target(&self, column: &str) -> String {
        column.to_string()
    }

    fn json_extract_operator(&self) -> &'static str {
        "#>>"
    }

    /// Text array literal: `{key1,key2}`
    fn json_path(&self, keys: &[String]) -> String {
        let elements: Vec<String> = keys.iter().map(|key| array_element(key)).collect();
        format!("{{{}}}", elements.join(","))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }
}

fn array_element(key: &str) -> String {
    let needs_quotes = key.is_empty()
        || key.eq_ignore_ascii_case("null")
        || key
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | '{' | '}' | '"' | '\\'));
    if !needs_quotes {
        return key.to_string();
    }
    let escaped = key.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_path() {
        assert_eq!(Postgres.json_path(&["key1".to_string()]), "{key1}");
        assert_eq!(
            Postgres.json_path(&["a".to_string(), "b c".to_string()]),
            "{a,\"b c\"}"
        );
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(Postgres.placeholder(3), "$3");
    }
}
