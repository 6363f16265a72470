//! Row filtering for `WHERE` clauses.
//!
//! A condition list is flat: comparisons separated by `AND` / `OR`, with no
//! grouping. Every comparison is evaluated on its own, then the results are
//! folded strictly left to right, so `a OR b AND c` means `(a OR b) AND c`.

use std::fmt;
use std::str::FromStr;

use bitvec::prelude::*;

use crate::table::Row;
use crate::value::Value;

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }

    /// Applies the operator to two ordered values. Floats compare exactly.
    fn apply<T: PartialOrd + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Lt => left < right,
            Self::Gt => left > right,
            Self::Le => left <= right,
            Self::Ge => left >= right,
        }
    }

    /// Text only supports equality; ordering operators never match text.
    fn apply_text(self, left: &str, right: &str) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Lt | Self::Gt | Self::Le | Self::Ge => false,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            ">" => Ok(Self::Gt),
            "<=" => Ok(Self::Le),
            ">=" => Ok(Self::Ge),
            _ => Err(()),
        }
    }
}

/// Logical connective between two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// Parses `AND` / `OR`, ignoring case.
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("AND") {
            Some(Self::And)
        } else if token.eq_ignore_ascii_case("OR") {
            Some(Self::Or)
        } else {
            None
        }
    }

    fn combine(self, left: bool, right: bool) -> bool {
        match self {
            Self::And => left && right,
            Self::Or => left || right,
        }
    }
}

/// `column op literal`. A missing literal never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub literal: Option<String>,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: CompareOp, literal: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            literal: Some(literal.into()),
        }
    }

    /// Evaluates this condition against `row`.
    ///
    /// Returns `false` when the row has no such column or the literal is
    /// missing.
    pub fn evaluate(&self, row: &Row) -> bool {
        match (row.get(&self.column), self.literal.as_deref()) {
            (Some(value), Some(literal)) => compare(value, self.op, literal),
            _ => false,
        }
    }
}

/// One entry of a flat condition list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionEntry {
    Connective(Connective),
    Compare(Condition),
}

/// Compares two stored texts.
///
/// Both sides are compared as integers if both parse as integers, otherwise
/// as floats if both parse as floats (exact equality, no tolerance), and
/// otherwise as text.
pub fn compare(left: &str, op: CompareOp, right: &str) -> bool {
    let (l, r) = (Value::parse(left), Value::parse(right));
    if let (Some(l), Some(r)) = (l.as_int(), r.as_int()) {
        return op.apply(&l, &r);
    }
    match (l.as_float(), r.as_float()) {
        (Some(l), Some(r)) => op.apply(&l, &r),
        _ => op.apply_text(left, right),
    }
}

/// Returns `true` if `row` satisfies `conditions`. An empty list matches
/// every row.
///
/// Consecutive comparisons with no connective between them are joined by
/// the last connective seen, `AND` before any.
pub fn matches(row: &Row, conditions: &[ConditionEntry]) -> bool {
    let mut outcomes: BitVec = BitVec::with_capacity(conditions.len());
    let mut joins = Vec::new();
    let mut pending = Connective::And;

    for entry in conditions {
        match entry {
            ConditionEntry::Connective(connective) => pending = *connective,
            ConditionEntry::Compare(condition) => {
                if !outcomes.is_empty() {
                    joins.push(pending);
                }
                outcomes.push(condition.evaluate(row));
            }
        }
    }

    let Some(first) = outcomes.first().map(|bit| *bit) else {
        return true;
    };
    joins
        .into_iter()
        .zip(outcomes.iter().by_vals().skip(1))
        .fold(first, |acc, (join, outcome)| join.combine(acc, outcome))
}
