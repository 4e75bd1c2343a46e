//! Version specifiers of a requirement
//!
//! Handles the comparison clauses of a dependency specifier:
//! - Compatible release: `~=1.4`
//! - Exact / exclusion: `==1.2.3`, `==1.2.*`, `!=1.3`
//! - Ordering: `>=1.0`, `>1.0`, `<=2.0`, `<2.0`
//! - Arbitrary equality: `===1.0-local`
//!
//! Specifiers are kept as written and never evaluated.

use std::fmt;

/// Comparison operator of a version specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `~=`
    Compatible,
    /// `===`
    ArbitraryEqual,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
}

impl Operator {
    /// Operators in longest-token-first order for prefix matching
    const ALL: [Operator; 8] = [
        Operator::ArbitraryEqual,
        Operator::Compatible,
        Operator::Equal,
        Operator::NotEqual,
        Operator::LessOrEqual,
        Operator::GreaterOrEqual,
        Operator::Less,
        Operator::Greater,
    ];

    /// Returns the textual token of this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Compatible => "~=",
            Operator::ArbitraryEqual => "===",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::Less => "<",
            Operator::Greater => ">",
        }
    }

    /// Matches an operator at the start of `input`
    pub fn parse_prefix(input: &str) -> Option<Operator> {
        Self::ALL
            .into_iter()
            .find(|op| input.starts_with(op.as_str()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(operator, version)` constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionSpecifier {
    pub operator: Operator,
    pub version: String,
}

impl VersionSpecifier {
    /// Creates a new specifier
    pub fn new(operator: Operator, version: impl Into<String>) -> Self {
        Self {
            operator,
            version: version.into(),
        }
    }

    /// Returns true if this specifier pins a single version
    pub fn is_pinned(&self) -> bool {
        matches!(self.operator, Operator::Equal | Operator::ArbitraryEqual)
            && !self.version.ends_with(".*")
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// Returns true if `c` may appear in a version token
pub fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '*' | '+' | '!' | '_' | '-')
}
