//! Documentation content for the runql CLI

use std::fmt::Write;

use super::CliError;
use crate::schema::ENTITIES;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Syntax,
    Attributes,
    Operators,
    Dialects,
}

impl DocCategory {
    /// Parse category name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "syntax" => Some(Self::Syntax),
            "attributes" | "attrs" | "fields" => Some(Self::Attributes),
            "operators" | "ops" | "functions" => Some(Self::Operators),
            "dialects" | "dialect" | "sql" => Some(Self::Dialects),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"RUNQL DOCUMENTATION

runql compiles the Python-like search filters typed into an experiment
tracker's search box into parameterized SQL for Postgres or SQLite.

DOCUMENTATION CATEGORIES

  syntax            Literals, attribute paths, subscripts, and precedence
  attributes        Every attribute a filter can reference
  operators         Comparisons, membership, string methods, and regexes
  dialects          How each construct renders on Postgres and SQLite

QUICK REFERENCE

  run.name == 'bert'                       Equality
  'bert' in run.name                       Substring
  run.metrics['loss'].last < 0.1           Latest metric value
  run.tags['team'] in ['nlp', 'cv']        List membership
  re.match('test_', run.name)              Anchored regex

Run 'runql doc <category>' for detailed documentation.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<String, CliError> {
    match DocCategory::from_name(name) {
        Some(DocCategory::Syntax) => Ok(SYNTAX_DOC.to_string()),
        Some(DocCategory::Attributes) => Ok(attributes_doc()),
        Some(DocCategory::Operators) => Ok(OPERATORS_DOC.to_string()),
        Some(DocCategory::Dialects) => Ok(DIALECTS_DOC.to_string()),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

fn attributes_doc() -> String {
    let mut doc = String::from("ATTRIBUTES\n");
    for entity in ENTITIES {
        let _ = write!(
            doc,
            "\n{} (table key '{}')\n",
            entity.name.to_uppercase(),
            entity.table_key
        );
        for attribute in entity.attributes {
            let path = format!("{}.{}", entity.name, attribute.name);
            let _ = writeln!(doc, "  {path:<24}{}", attribute.description);
        }
    }
    doc.push_str(
        "\nUnknown attributes are rejected; there is no fallback lookup.\n\
         Entities missing from the configured table map are unavailable.\n",
    );
    doc
}

const SYNTAX_DOC: &str = r#"SYNTAX

LITERALS
  'text' or "text"      Strings, no escape sequences
  42, -1                Integers
  0.5, -1.0, 1e-3       Floats
  True, False           Booleans (true/false also accepted)
  None                  Null, compares with == and != only
  ['a', 'b']            Lists, right side of 'in' only

ATTRIBUTE PATHS
  entity.field
  entity.field.member
  entity.field[subscript].member

  run.name
  run.tags.team
  run.metrics["loss", {"subset": "train"}].last

SUBSCRIPTS
  ["name"]                          Name only
  ["name", {"key": "value"}]        Name and context, values are strings

  The name always comes first. A context without a name is an error.

PRECEDENCE (tightest first)
  1. attribute access, subscripts, calls
  2. == != < <= > >= in not in is is not   (chains: a < b < c)
  3. not
  4. and
  5. or

  not run.name == 'a'   reads as   not (run.name == 'a')

  Groups and 'not' prefixes nest at most 100 deep.

DEFAULT FILTER
  Unless the query text mentions the configured marker (run.archived by
  default), the default expression (not run.archived) is ANDed on. An
  empty query returns the default filter alone.
"#;

const OPERATORS_DOC: &str = r#"OPERATORS

COMPARISON
  ==  !=  <  <=  >  >=
  is, is not                   Same as == and !=: run.tags.x is None
  The literal may be on either side: 10 < run.duration

MEMBERSHIP
  'sub' in run.name            Substring (LIKE '%sub%')
  'sub' not in run.name        Negated substring
  run.tags.x in ['a', 'b']     List membership (IN)
  run.tags.x not in ['a']      Negated list membership

BOOLEAN ATTRIBUTES
  run.archived                 Same as run.archived == True
  run.active == False
  not run.archived

STRING METHODS
  run.name.startswith('pre')   LIKE 'pre%'
  run.name.endswith('suf')     LIKE '%suf'

REGULAR EXPRESSIONS
  re.match('pat', run.name)    Anchored at the start
  re.search('pat', run.name)   Anywhere in the value

NULL CHECKS
  run.tags.note == None        IS NULL
  run.tags.note != None        IS NOT NULL

LOGICAL
  and, or, not, parentheses
"#;

const DIALECTS_DOC: &str = r#"DIALECTS

  construct        postgres                     sqlite
  placeholder      $1, $2, ...                  ?
  regex            col ~ ?                      IFNULL(col, '') REGEXP ?
  negated regex    col !~ ?                     IFNULL(col, '') NOT REGEXP ?
  JSON key         col#>>? with {a,b}           IFNULL(col, JSON('{}'))->>? with $.a.b

  SQLite has no built-in REGEXP; register a regexp(pattern, value)
  function on each connection.

  Select the dialect with dialect = "postgres" or "sqlite" in the config
  file, or --dialect on the command line.
"#;
