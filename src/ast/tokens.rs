#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number, sign included
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// -1.0
    /// 1e-3
    /// ```
    Float(f64),

    /// Integer, sign included
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -1
    /// ```
    Integer(i64),

    /// String literal in single or double quotes
    ///
    /// No escape sequences: the literal ends at the first matching quote.
    ///
    /// # Examples
    /// ```text
    /// 'run'
    /// "my_metric"
    /// ```
    String(String),

    /// `True` / `False` (lowercase spellings are accepted too)
    Boolean(bool),

    /// `None`
    None,

    // Identifiers
    /// Entity, field or function name
    ///
    /// Dotted paths such as `run.metrics` are a sequence of
    /// `Identifier`, `Dot`, `Identifier`.
    Identifier(String),

    // Keywords
    /// Logical AND
    And,

    /// Logical OR
    Or,

    /// Logical NOT, also the first half of `not in`
    Not,

    /// Substring or list membership
    In,

    /// Identity test, spelled like Python's `is` / `is not`
    ///
    /// # Examples
    /// ```text
    /// run.archived is False
    /// run.tags.team is not None
    /// ```
    Is,

    // Comparison
    /// Equality operator
    EqEq,

    /// Inequality operator
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    // Delimiters
    /// Left bracket for subscripts and lists
    LBracket,

    /// Right bracket
    RBracket,

    /// Left parenthesis for grouping or function calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Left brace for context dicts
    LBrace,

    /// Right brace
    RBrace,

    /// Dot for attribute access and method calls
    Dot,

    /// Comma for separating arguments, subscript and list elements
    Comma,

    /// Colon for dict key-value pairs
    Colon,

    /// End of input
    Eof,
}

impl Token {
    /// Short human-readable form used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Float(n) => n.to_string(),
            Token::Integer(n) => n.to_string(),
            Token::String(s) => format!("{s:?}"),
            Token::Boolean(true) => "True".to_string(),
            Token::Boolean(false) => "False".to_string(),
            Token::None => "None".to_string(),
            Token::Identifier(name) => name.clone(),
            Token::And => "and".to_string(),
            Token::Or => "or".to_string(),
            Token::Not => "not".to_string(),
            Token::In => "in".to_string(),
            Token::Is => "is".to_string(),
            Token::EqEq => "==".to_string(),
            Token::NotEq => "!=".to_string(),
            Token::Lt => "<".to_string(),
            Token::Gt => ">".to_string(),
            Token::LtEq => "<=".to_string(),
            Token::GtEq => ">=".to_string(),
            Token::LBracket => "[".to_string(),
            Token::RBracket => "]".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::LBrace => "{".to_string(),
            Token::RBrace => "}".to_string(),
            Token::Dot => ".".to_string(),
            Token::Comma => ",".to_string(),
            Token::Colon => ":".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}
