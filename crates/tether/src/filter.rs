//! Filter predicates and their compilation to SQL fragments.
//!
//! A [`Filter`] is validated when it is constructed: membership operators
//! only accept list operands, every other operator only accepts scalars.
//! Compilation itself can no longer fail.

use crate::error::Error;
use crate::value::Value;
use std::fmt;

/// The fixed operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    Like,
}

impl Op {
    /// Whether this operator takes a list operand.
    pub fn takes_list(&self) -> bool {
        matches!(self, Op::In | Op::NotIn)
    }

    fn render(&self, value_sql: &str) -> String {
        match self {
            Op::Eq => format!("= {value_sql}"),
            Op::Ne => format!("!= {value_sql}"),
            Op::Gt => format!("> {value_sql}"),
            Op::Ge => format!(">= {value_sql}"),
            Op::Lt => format!("< {value_sql}"),
            Op::Le => format!("<= {value_sql}"),
            Op::In => format!("IN ({value_sql})"),
            Op::NotIn => format!("NOT IN ({value_sql})"),
            Op::Like => format!("LIKE {value_sql}"),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::In => "IN",
            Op::NotIn => "NOT IN",
            Op::Like => "LIKE",
        };
        f.write_str(token)
    }
}

/// A predicate operand: a single scalar, or a list for IN / NOT IN.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Value),
    List(Vec<Value>),
}

impl Operand {
    fn shape(&self) -> &'static str {
        match self {
            Operand::Scalar(_) => "scalar",
            Operand::List(_) => "sequence",
        }
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Scalar(v)
    }
}

impl From<Vec<Value>> for Operand {
    fn from(v: Vec<Value>) -> Self {
        Operand::List(v)
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Scalar(Value::I64(v))
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Scalar(Value::I64(v as i64))
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Scalar(Value::F64(v))
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Operand::Scalar(Value::from(v))
    }
}

impl From<String> for Operand {
    fn from(v: String) -> Self {
        Operand::Scalar(Value::String(v))
    }
}

/// A single field/operator/value condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    field: String,
    op: Op,
    operand: Operand,
}

impl Filter {
    /// Build a predicate, rejecting operator/operand shape mismatches.
    pub fn new(
        field: impl Into<String>,
        op: Op,
        operand: impl Into<Operand>,
    ) -> Result<Self, Error> {
        let operand = operand.into();
        let expected = if op.takes_list() { "sequence" } else { "scalar" };
        if operand.shape() != expected {
            return Err(Error::OperatorArity {
                op,
                expected,
                actual: operand.shape(),
            });
        }
        Ok(Filter {
            field: field.into(),
            op,
            operand,
        })
    }

    /// Equality predicate, the default relation.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Result<Self, Error> {
        Filter::new(field, Op::Eq, Operand::Scalar(value.into()))
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> Op {
        self.op
    }

    /// Compile to a SQL fragment. String values are single-quoted, list
    /// operands comma-joined with per-element quoting, all other scalars
    /// interpolated raw.
    pub fn to_sql(&self) -> String {
        let value_sql = match &self.operand {
            Operand::Scalar(v) => v.sql_literal(),
            Operand::List(vs) => vs
                .iter()
                .map(Value::sql_literal)
                .collect::<Vec<_>>()
                .join(", "),
        };
        format!("{} {}", self.field, self.op.render(&value_sql))
    }
}

/// AND-join a predicate sequence into one WHERE fragment.
///
/// Returns `None` for an empty sequence; there is no OR, grouping or
/// nesting.
pub fn compile_all(filters: &[Filter]) -> Option<String> {
    if filters.is_empty() {
        return None;
    }
    Some(
        filters
            .iter()
            .map(Filter::to_sql)
            .collect::<Vec<_>>()
            .join(" AND "),
    )
}
