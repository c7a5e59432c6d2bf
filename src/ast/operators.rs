/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// Equal (`==` or `is`)
    Equal,
    /// Not equal (`!=` or `is not`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Membership (`in`): substring when the right side is an attribute,
    /// list membership when it is a list
    In,
    /// Negated membership (`not in`)
    NotIn,
}

impl CmpOp {
    /// The operator with its operands swapped: `a < b` is `b > a`.
    ///
    /// Membership has no mirror image and returns `None`.
    pub fn mirrored(self) -> Option<CmpOp> {
        match self {
            CmpOp::Equal | CmpOp::NotEqual => Some(self),
            CmpOp::LessThan => Some(CmpOp::GreaterThan),
            CmpOp::GreaterThan => Some(CmpOp::LessThan),
            CmpOp::LessEqual => Some(CmpOp::GreaterEqual),
            CmpOp::GreaterEqual => Some(CmpOp::LessEqual),
            CmpOp::In | CmpOp::NotIn => None,
        }
    }

    /// The logical complement: `not (a < b)` is `a >= b`.
    pub fn negated(self) -> CmpOp {
        match self {
            CmpOp::Equal => CmpOp::NotEqual,
            CmpOp::NotEqual => CmpOp::Equal,
            CmpOp::LessThan => CmpOp::GreaterEqual,
            CmpOp::GreaterThan => CmpOp::LessEqual,
            CmpOp::LessEqual => CmpOp::GreaterThan,
            CmpOp::GreaterEqual => CmpOp::LessThan,
            CmpOp::In => CmpOp::NotIn,
            CmpOp::NotIn => CmpOp::In,
        }
    }

    /// SQL spelling for the ordering and equality operators.
    pub fn sql(self) -> &'static str {
        match self {
            CmpOp::Equal => "=",
            CmpOp::NotEqual => "<>",
            CmpOp::LessThan => "<",
            CmpOp::GreaterThan => ">",
            CmpOp::LessEqual => "<=",
            CmpOp::GreaterEqual => ">=",
            CmpOp::In => "IN",
            CmpOp::NotIn => "NOT IN",
        }
    }
}

/// Boolean combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    /// Logical AND (`and`)
    And,
    /// Logical OR (`or`)
    Or,
    /// Logical NOT (`not`), always exactly one child
    Not,
}

/// Functions and methods the filter language understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `attr.startswith(s)`; the receiver is the first argument
    StartsWith,
    /// `attr.endswith(s)`; the receiver is the first argument
    EndsWith,
    /// `re.match(pattern, attr)`, anchored at the start
    ReMatch,
    /// `re.search(pattern, attr)`, unanchored
    ReSearch,
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Function::StartsWith => "startswith",
            Function::EndsWith => "endswith",
            Function::ReMatch => "re.match",
            Function::ReSearch => "re.search",
        }
    }
}
