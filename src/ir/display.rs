//! Diagnostic rendering of expression trees.
//!
//! A compact SQL-flavored preview used by log events and snapshot tests.
//! This is *not* the SQL printer — command generation happens downstream of
//! this crate and re-derives everything from the node tree.

use std::fmt::{self, Display, Formatter, Write};

use super::expr::{BinaryOp, Literal, SqlExpr, SqlExprKind, UnaryOp};
use super::generic::SortDirection;
use crate::storage::{Facets, StoreTypeName, TypeMapping};

impl Display for SqlExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_expr(f, self)
    }
}

/// Binding strength of an expression, used to decide parenthesization.
/// Mirrors common SQL precedence; atoms bind tightest.
fn strength(expr: &SqlExpr) -> i32 {
    match &expr.kind {
        SqlExprKind::Binary { op, .. } => match op {
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 11,
            BinaryOp::Add | BinaryOp::Subtract => 10,
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Gt
            | BinaryOp::Gte
            | BinaryOp::Lt
            | BinaryOp::Lte
            | BinaryOp::Like => 6,
            BinaryOp::And => 3,
            BinaryOp::Or => 2,
        },
        SqlExprKind::Unary { op, .. } => match op {
            UnaryOp::Negate => 13,
            UnaryOp::Not => 4,
            UnaryOp::IsNull | UnaryOp::IsNotNull => 5,
        },
        SqlExprKind::AtTimeZone { .. } => 9,
        _ => 100,
    }
}

fn left_associative(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Subtract | BinaryOp::Divide | BinaryOp::Modulo
    )
}

fn write_operand(f: &mut Formatter<'_>, operand: &SqlExpr, required: i32) -> fmt::Result {
    if strength(operand) < required {
        write!(f, "(")?;
        write_expr(f, operand)?;
        write!(f, ")")
    } else {
        write_expr(f, operand)
    }
}

fn write_expr(f: &mut Formatter<'_>, expr: &SqlExpr) -> fmt::Result {
    match &expr.kind {
        SqlExprKind::Constant(literal) => {
            f.write_str(&render_literal(literal, expr.type_mapping.as_ref()))
        }
        SqlExprKind::Parameter(name) => write!(f, "@{name}"),
        SqlExprKind::Column(column) => {
            if let Some(alias) = &column.table_alias {
                write!(f, "[{alias}].")?;
            }
            write!(f, "[{}]", column.name)
        }
        SqlExprKind::Function(func) => {
            write!(f, "{}(", func.name)?;
            for (i, arg) in func.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_expr(f, arg)?;
            }
            f.write_char(')')?;
            if !func.orderings.is_empty() {
                f.write_str(" WITHIN GROUP (ORDER BY ")?;
                for (i, sort) in func.orderings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_expr(f, &sort.column)?;
                    if sort.direction == SortDirection::Desc {
                        f.write_str(" DESC")?;
                    }
                }
                f.write_char(')')?;
            }
            Ok(())
        }
        SqlExprKind::Fragment(sql) => f.write_str(sql),
        SqlExprKind::Case {
            operand,
            when_clauses,
            else_result,
        } => {
            f.write_str("CASE")?;
            if let Some(operand) = operand {
                f.write_char(' ')?;
                write_expr(f, operand)?;
            }
            for when in when_clauses {
                f.write_str(" WHEN ")?;
                write_expr(f, &when.condition)?;
                f.write_str(" THEN ")?;
                write_expr(f, &when.result)?;
            }
            if let Some(else_result) = else_result {
                f.write_str(" ELSE ")?;
                write_expr(f, else_result)?;
            }
            f.write_str(" END")
        }
        SqlExprKind::Binary { op, left, right } => {
            let my_strength = strength(expr);
            write_operand(f, left, my_strength)?;
            write!(f, " {} ", binary_symbol(*op))?;
            // Left-associative operators need parens around an equal-strength
            // right operand: a - (b - c).
            let right_required = if left_associative(*op) {
                my_strength + 1
            } else {
                my_strength
            };
            write_operand(f, right, right_required)
        }
        SqlExprKind::Unary { op, expr: operand } => match op {
            UnaryOp::Negate => {
                f.write_char('-')?;
                write_operand(f, operand, 13)
            }
            UnaryOp::Not => {
                f.write_str("NOT ")?;
                write_operand(f, operand, 5)
            }
            UnaryOp::IsNull => {
                write_operand(f, operand, 10)?;
                f.write_str(" IS NULL")
            }
            UnaryOp::IsNotNull => {
                write_operand(f, operand, 10)?;
                f.write_str(" IS NOT NULL")
            }
        },
        SqlExprKind::Convert { target, expr } => {
            f.write_str("CAST(")?;
            write_expr(f, expr)?;
            write!(f, " AS {})", target.store_type())
        }
        SqlExprKind::AtTimeZone { operand, time_zone } => {
            write_operand(f, operand, 10)?;
            f.write_str(" AT TIME ZONE ")?;
            write_operand(f, time_zone, 10)
        }
    }
}

fn binary_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::Modulo => "%",
        BinaryOp::Equal => "=",
        BinaryOp::NotEqual => "<>",
        BinaryOp::Gt => ">",
        BinaryOp::Gte => ">=",
        BinaryOp::Lt => "<",
        BinaryOp::Lte => "<=",
        BinaryOp::And => "AND",
        BinaryOp::Or => "OR",
        BinaryOp::Like => "LIKE",
    }
}

fn render_literal(literal: &Literal, mapping: Option<&TypeMapping>) -> String {
    match mapping {
        Some(mapping) => mapping.literal(literal),
        // Unresolved constants preview through a unicode text mapping; the
        // printer never sees unmapped nodes.
        None => TypeMapping::new(
            crate::host::HostType::Text,
            StoreTypeName::NVarChar,
            Facets {
                unicode: true,
                ..Facets::default()
            },
        )
        .literal(literal),
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use crate::host::HostType;
    use crate::ir::*;
    use crate::storage::TypeMappingSource;

    fn int(value: i64) -> SqlExpr {
        SqlExpr {
            kind: SqlExprKind::Constant(Literal::Integer(value)),
            ty: HostType::I32,
            type_mapping: TypeMappingSource::new().default_mapping(HostType::I32),
        }
    }

    fn col(name: &str) -> SqlExpr {
        SqlExpr {
            kind: SqlExprKind::Column(ColumnRef {
                table_alias: Some("o".to_string()),
                name: name.to_string(),
                nullable: true,
            }),
            ty: HostType::I32,
            type_mapping: None,
        }
    }

    fn binary(op: BinaryOp, left: SqlExpr, right: SqlExpr) -> SqlExpr {
        SqlExpr {
            ty: left.ty,
            type_mapping: None,
            kind: SqlExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        }
    }

    #[test]
    fn precedence_parenthesization() {
        let sum = binary(BinaryOp::Add, col("A"), int(1));
        let product = binary(BinaryOp::Multiply, sum, int(2));
        assert_snapshot!(product.to_string(), @"([o].[A] + 1) * 2");

        let nested = binary(BinaryOp::Subtract, int(9), binary(BinaryOp::Subtract, int(5), int(3)));
        assert_snapshot!(nested.to_string(), @"9 - (5 - 3)");
    }

    #[test]
    fn is_null_wraps_weaker_operands() {
        let sum = binary(BinaryOp::Add, col("A"), int(1));
        let is_null = SqlExpr {
            ty: HostType::Bool,
            type_mapping: None,
            kind: SqlExprKind::Unary {
                op: UnaryOp::IsNull,
                expr: Box::new(sum),
            },
        };
        assert_snapshot!(is_null.to_string(), @"([o].[A] + 1) IS NULL");
    }

    #[test]
    fn function_with_orderings() {
        let agg = SqlExpr {
            ty: HostType::Text,
            type_mapping: None,
            kind: SqlExprKind::Function(SqlFunction {
                name: "STRING_AGG".to_string(),
                args: vec![col("Name"), int(0)],
                orderings: vec![ColumnSort {
                    direction: SortDirection::Desc,
                    column: col("Id"),
                }],
                nullable: true,
                args_propagate_null: vec![false, true],
            }),
        };
        assert_snapshot!(agg.to_string(), @"STRING_AGG([o].[Name], 0) WITHIN GROUP (ORDER BY [o].[Id] DESC)");
    }
}
