//! SQL expression model
//!
//! Strictly typed, immutable tree of SQL constructs. This is the output
//! contract of the translation pipeline: every node carries its semantic
//! result type and — once resolution has run — a storage type mapping.
//!
//! Nodes are built exclusively through [crate::sql::SqlExpressionFactory];
//! translators never assemble a node by hand, so the factory is the single
//! place where type-mapping inference and nullability bookkeeping happen.

mod display;
mod expr;
mod generic;

pub use expr::{
    BinaryOp, CaseWhen, ColumnRef, Literal, SqlExpr, SqlExprKind, SqlFunction, UnaryOp,
};
pub use generic::{ColumnSort, SortDirection};

/// Ordering element of an ordered aggregate (`WITHIN GROUP (ORDER BY …)`).
pub type SortSpec = ColumnSort<SqlExpr>;
