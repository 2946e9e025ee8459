use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use super::generic::ColumnSort;
use crate::host::HostType;
use crate::storage::TypeMapping;

/// A node of the SQL expression tree.
///
/// `type_mapping == None` means "not yet resolved, infer from context". The
/// tree handed to SQL printing must be fully mapped; that precondition is
/// documented, not re-validated at the printing boundary.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SqlExpr {
    pub kind: SqlExprKind,
    /// Semantic (host-language) type this node evaluates to.
    pub ty: HostType,
    pub type_mapping: Option<TypeMapping>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, EnumAsInner)]
pub enum SqlExprKind {
    Constant(Literal),

    /// Placeholder for a value bound after compilation.
    Parameter(String),

    Column(ColumnRef),

    Function(SqlFunction),

    /// Raw SQL fragment, emitted verbatim (e.g. a DATEPART keyword or a
    /// full-text search language term). Not escaped further.
    Fragment(String),

    Case {
        /// Operand of a simple CASE; `None` for a searched CASE.
        operand: Option<Box<SqlExpr>>,
        when_clauses: Vec<CaseWhen>,
        else_result: Option<Box<SqlExpr>>,
    },

    Binary {
        op: BinaryOp,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },

    Unary {
        op: UnaryOp,
        expr: Box<SqlExpr>,
    },

    /// CAST/CONVERT to an explicit store type.
    Convert {
        target: TypeMapping,
        expr: Box<SqlExpr>,
    },

    /// Vendor extension: `<operand> AT TIME ZONE <time_zone>`.
    AtTimeZone {
        operand: Box<SqlExpr>,
        time_zone: Box<SqlExpr>,
    },
}

/// A function call, scalar or aggregate.
///
/// `args_propagate_null` has one flag per argument: whether a NULL in that
/// position forces the whole call to NULL. Its length always equals
/// `args.len()`; [crate::sql::SqlExpressionFactory] enforces this at every
/// construction site.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SqlFunction {
    pub name: String,
    pub args: Vec<SqlExpr>,
    /// Non-empty only for ordered aggregates (`WITHIN GROUP (ORDER BY …)`).
    pub orderings: Vec<ColumnSort<SqlExpr>>,
    /// Whether the call can evaluate to SQL NULL at all.
    pub nullable: bool,
    pub args_propagate_null: Vec<bool>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table_alias: Option<String>,
    pub name: String,
    pub nullable: bool,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CaseWhen {
    pub condition: SqlExpr,
    pub result: SqlExpr,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Gt,
    Gte,
    Lt,
    Lte,
    And,
    Or,
    Like,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum UnaryOp {
    Negate,
    Not,
    IsNull,
    IsNotNull,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, EnumAsInner)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Kept textual to avoid binary rounding of exact numerics.
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Guid(String),
}

impl SqlExpr {
    /// Conservative nullability: can this expression evaluate to SQL NULL?
    pub fn nullable(&self) -> bool {
        match &self.kind {
            SqlExprKind::Constant(lit) => matches!(lit, Literal::Null),
            // A parameter's value is unknown until execution.
            SqlExprKind::Parameter(_) => true,
            SqlExprKind::Column(column) => column.nullable,
            SqlExprKind::Function(func) => func.nullable,
            SqlExprKind::Fragment(_) => false,
            SqlExprKind::Case {
                when_clauses,
                else_result,
                ..
            } => {
                when_clauses.iter().any(|case| case.result.nullable())
                    || else_result.as_ref().map_or(true, |e| e.nullable())
            }
            SqlExprKind::Binary { left, right, .. } => left.nullable() || right.nullable(),
            SqlExprKind::Unary { op, expr } => match op {
                UnaryOp::IsNull | UnaryOp::IsNotNull => false,
                _ => expr.nullable(),
            },
            SqlExprKind::Convert { expr, .. } => expr.nullable(),
            SqlExprKind::AtTimeZone { operand, .. } => operand.nullable(),
        }
    }

    /// Is this a constant with the given literal?
    pub fn is_constant(&self, literal: &Literal) -> bool {
        matches!(&self.kind, SqlExprKind::Constant(l) if l == literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(nullable: bool) -> SqlExpr {
        SqlExpr {
            kind: SqlExprKind::Column(ColumnRef {
                table_alias: Some("c".to_string()),
                name: "Name".to_string(),
                nullable,
            }),
            ty: HostType::Text,
            type_mapping: None,
        }
    }

    #[test]
    fn nullability_is_conservative() {
        assert!(!column(false).nullable());
        assert!(column(true).nullable());

        // CASE without ELSE can yield NULL even over non-null branches.
        let case = SqlExpr {
            kind: SqlExprKind::Case {
                operand: None,
                when_clauses: vec![CaseWhen {
                    condition: column(false),
                    result: column(false),
                }],
                else_result: None,
            },
            ty: HostType::Text,
            type_mapping: None,
        };
        assert!(case.nullable());

        let is_null = SqlExpr {
            kind: SqlExprKind::Unary {
                op: UnaryOp::IsNull,
                expr: Box::new(column(true)),
            },
            ty: HostType::Bool,
            type_mapping: None,
        };
        assert!(!is_null.nullable());
    }
}
