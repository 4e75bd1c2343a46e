//! Environment markers
//!
//! A marker is a small boolean expression over environment variables, e.g.
//! `python_version < "3.10" and extra == "speedups"`. Markers are never
//! evaluated here; the reconciler only asks whether a marker carries an
//! `extra == "<name>"` clause.

use super::name::normalize_name;
use std::collections::BTreeSet;
use std::fmt;

/// Environment variables a marker may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerVariable {
    PythonVersion,
    PythonFullVersion,
    OsName,
    SysPlatform,
    PlatformRelease,
    PlatformSystem,
    PlatformVersion,
    PlatformMachine,
    PlatformPythonImplementation,
    ImplementationName,
    ImplementationVersion,
    Extra,
}

impl MarkerVariable {
    /// Returns the variable name as written in a marker
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerVariable::PythonVersion => "python_version",
            MarkerVariable::PythonFullVersion => "python_full_version",
            MarkerVariable::OsName => "os_name",
            MarkerVariable::SysPlatform => "sys_platform",
            MarkerVariable::PlatformRelease => "platform_release",
            MarkerVariable::PlatformSystem => "platform_system",
            MarkerVariable::PlatformVersion => "platform_version",
            MarkerVariable::PlatformMachine => "platform_machine",
            MarkerVariable::PlatformPythonImplementation => "platform_python_implementation",
            MarkerVariable::ImplementationName => "implementation_name",
            MarkerVariable::ImplementationVersion => "implementation_version",
            MarkerVariable::Extra => "extra",
        }
    }

    /// Looks up a variable by its marker name
    ///
    /// The dotted and `python_implementation` spellings of older
    /// distributions map onto the same variables and render in the
    /// underscore form.
    pub fn from_name(name: &str) -> Option<Self> {
        let var = match name {
            "python_version" => MarkerVariable::PythonVersion,
            "python_full_version" => MarkerVariable::PythonFullVersion,
            "os_name" | "os.name" => MarkerVariable::OsName,
            "sys_platform" | "sys.platform" => MarkerVariable::SysPlatform,
            "platform_release" => MarkerVariable::PlatformRelease,
            "platform_system" => MarkerVariable::PlatformSystem,
            "platform_version" | "platform.version" => MarkerVariable::PlatformVersion,
            "platform_machine" | "platform.machine" => MarkerVariable::PlatformMachine,
            "platform_python_implementation"
            | "platform.python_implementation"
            | "python_implementation" => MarkerVariable::PlatformPythonImplementation,
            "implementation_name" => MarkerVariable::ImplementationName,
            "implementation_version" => MarkerVariable::ImplementationVersion,
            "extra" => MarkerVariable::Extra,
            _ => return None,
        };
        Some(var)
    }
}

/// Operand of a marker comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerValue {
    Variable(MarkerVariable),
    Literal(String),
}

impl fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerValue::Variable(var) => f.write_str(var.as_str()),
            MarkerValue::Literal(s) if s.contains('"') => write!(f, "'{}'", s),
            MarkerValue::Literal(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Comparison operator inside a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerOperator {
    Compatible,
    ArbitraryEqual,
    Equal,
    NotEqual,
    LessOrEqual,
    GreaterOrEqual,
    Less,
    Greater,
    In,
    NotIn,
}

impl MarkerOperator {
    /// Symbolic operators in longest-token-first order
    pub(crate) const SYMBOLIC: [MarkerOperator; 8] = [
        MarkerOperator::ArbitraryEqual,
        MarkerOperator::Compatible,
        MarkerOperator::Equal,
        MarkerOperator::NotEqual,
        MarkerOperator::LessOrEqual,
        MarkerOperator::GreaterOrEqual,
        MarkerOperator::Less,
        MarkerOperator::Greater,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerOperator::Compatible => "~=",
            MarkerOperator::ArbitraryEqual => "===",
            MarkerOperator::Equal => "==",
            MarkerOperator::NotEqual => "!=",
            MarkerOperator::LessOrEqual => "<=",
            MarkerOperator::GreaterOrEqual => ">=",
            MarkerOperator::Less => "<",
            MarkerOperator::Greater => ">",
            MarkerOperator::In => "in",
            MarkerOperator::NotIn => "not in",
        }
    }
}

impl fmt::Display for MarkerOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `lhs op rhs` clause
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerExpression {
    pub lhs: MarkerValue,
    pub operator: MarkerOperator,
    pub rhs: MarkerValue,
}

impl MarkerExpression {
    pub fn new(lhs: MarkerValue, operator: MarkerOperator, rhs: MarkerValue) -> Self {
        Self { lhs, operator, rhs }
    }

    /// Returns the normalized extra name if this is an `extra == "<name>"` clause
    pub fn extra_name(&self) -> Option<String> {
        if self.operator != MarkerOperator::Equal {
            return None;
        }
        match (&self.lhs, &self.rhs) {
            (MarkerValue::Variable(MarkerVariable::Extra), MarkerValue::Literal(name))
            | (MarkerValue::Literal(name), MarkerValue::Variable(MarkerVariable::Extra)) => {
                Some(normalize_name(name))
            }
            _ => None,
        }
    }
}

impl fmt::Display for MarkerExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.operator, self.rhs)
    }
}

/// Boolean marker expression
///
/// `And`/`Or` nodes never directly contain a node of the same kind, so two
/// markers that render identically have identical trees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerTree {
    Expression(MarkerExpression),
    And(Vec<MarkerTree>),
    Or(Vec<MarkerTree>),
}

impl MarkerTree {
    /// Conjunction of `items`, flattening nested conjunctions
    pub fn and(items: Vec<MarkerTree>) -> MarkerTree {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                MarkerTree::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            MarkerTree::And(flat)
        }
    }

    /// Disjunction of `items`, flattening nested disjunctions
    pub fn or(items: Vec<MarkerTree>) -> MarkerTree {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                MarkerTree::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            MarkerTree::Or(flat)
        }
    }

    /// Normalized names of every `extra == "<name>"` clause in the tree
    pub fn extra_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_extras(&mut names);
        names
    }

    fn collect_extras(&self, names: &mut BTreeSet<String>) {
        match self {
            MarkerTree::Expression(expr) => {
                if let Some(name) = expr.extra_name() {
                    names.insert(name);
                }
            }
            MarkerTree::And(items) | MarkerTree::Or(items) => {
                for item in items {
                    item.collect_extras(names);
                }
            }
        }
    }

    /// Returns true if the marker carries any extra clause
    pub fn has_extra_clause(&self) -> bool {
        match self {
            MarkerTree::Expression(expr) => expr.extra_name().is_some(),
            MarkerTree::And(items) | MarkerTree::Or(items) => {
                items.iter().any(MarkerTree::has_extra_clause)
            }
        }
    }

    /// Returns true if an extra clause names one of `extras`
    ///
    /// Other clauses of a compound marker are not evaluated, so a match is
    /// necessary but not sufficient for the dependency to apply.
    pub fn mentions_any_extra<'a>(&self, extras: impl IntoIterator<Item = &'a String>) -> bool {
        let wanted: BTreeSet<String> = extras.into_iter().map(|e| normalize_name(e)).collect();
        self.extra_names().iter().any(|name| wanted.contains(name))
    }
}

impl fmt::Display for MarkerTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerTree::Expression(expr) => write!(f, "{}", expr),
            MarkerTree::And(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" and ")?;
                    }
                    match item {
                        MarkerTree::Or(_) => write!(f, "({})", item)?,
                        _ => write!(f, "{}", item)?,
                    }
                }
                Ok(())
            }
            MarkerTree::Or(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}
