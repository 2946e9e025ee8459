use crate::host::HostType;
use crate::ir::{
    BinaryOp, CaseWhen, ColumnRef, Literal, SortSpec, SqlExpr, SqlExprKind, SqlFunction, UnaryOp,
};
use crate::storage::{StoreTypeName, TypeMapping, TypeMappingSource};

/// The sole construction surface for [SqlExpr] nodes.
///
/// Centralizes type-mapping inference and nullability-argument bookkeeping so
/// translators never hand-build a malformed node. All methods are pure
/// allocation; nothing here logs or performs I/O.
///
/// Type-mapping unification is first-found-wins: given N argument expressions,
/// the first non-`None` mapping in argument order is used — not a widening
/// join.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlExpressionFactory {
    mapping_source: TypeMappingSource,
}

impl SqlExpressionFactory {
    pub fn new(mapping_source: TypeMappingSource) -> Self {
        SqlExpressionFactory { mapping_source }
    }

    pub fn mapping_source(&self) -> &TypeMappingSource {
        &self.mapping_source
    }

    /// First non-`None` type mapping among `args`, in argument order.
    pub fn infer_type_mapping<'a>(
        &self,
        args: impl IntoIterator<Item = &'a SqlExpr>,
    ) -> Option<TypeMapping> {
        args.into_iter().find_map(|arg| arg.type_mapping.clone())
    }

    /// Push `mapping` into a previously-unmapped node. A no-op when the node
    /// already carries a mapping or when `mapping` is `None` — never an
    /// error; translators that require a mapping must branch on the result.
    pub fn apply_type_mapping(&self, expr: SqlExpr, mapping: Option<TypeMapping>) -> SqlExpr {
        if expr.type_mapping.is_some() {
            return expr;
        }
        SqlExpr {
            type_mapping: mapping,
            ..expr
        }
    }

    /// [Self::apply_type_mapping] with the default mapping for the node's
    /// host type.
    pub fn apply_default_type_mapping(&self, expr: SqlExpr) -> SqlExpr {
        let default = self.mapping_source.default_mapping(expr.ty);
        self.apply_type_mapping(expr, default)
    }

    pub fn constant(&self, literal: Literal, ty: HostType) -> SqlExpr {
        SqlExpr {
            kind: SqlExprKind::Constant(literal),
            ty,
            type_mapping: None,
        }
    }

    pub fn typed_constant(&self, literal: Literal, ty: HostType, mapping: TypeMapping) -> SqlExpr {
        SqlExpr {
            kind: SqlExprKind::Constant(literal),
            ty,
            type_mapping: Some(mapping),
        }
    }

    pub fn parameter(&self, name: impl Into<String>, ty: HostType) -> SqlExpr {
        SqlExpr {
            kind: SqlExprKind::Parameter(name.into()),
            ty,
            type_mapping: None,
        }
    }

    pub fn column(&self, column: ColumnRef, ty: HostType, mapping: Option<TypeMapping>) -> SqlExpr {
        SqlExpr {
            kind: SqlExprKind::Column(column),
            ty,
            type_mapping: mapping,
        }
    }

    /// Raw SQL fragment (a keyword argument, a search language clause…).
    /// Fragments carry no host type of their own.
    pub fn fragment(&self, sql: impl Into<String>) -> SqlExpr {
        SqlExpr {
            kind: SqlExprKind::Fragment(sql.into()),
            ty: HostType::Object,
            type_mapping: None,
        }
    }

    /// Scalar function call.
    ///
    /// `args_propagate_null` must have exactly one flag per argument; a
    /// mismatch is a programmer error in the calling translator and aborts
    /// the compilation.
    pub fn function(
        &self,
        name: impl Into<String>,
        args: Vec<SqlExpr>,
        args_propagate_null: Vec<bool>,
        ty: HostType,
        nullable: bool,
        mapping: Option<TypeMapping>,
    ) -> SqlExpr {
        self.build_function(name.into(), args, args_propagate_null, vec![], ty, nullable, mapping)
    }

    /// Function call with no arguments (`GETDATE()`).
    pub fn niladic_function(
        &self,
        name: impl Into<String>,
        ty: HostType,
        nullable: bool,
        mapping: Option<TypeMapping>,
    ) -> SqlExpr {
        self.build_function(name.into(), vec![], vec![], vec![], ty, nullable, mapping)
    }

    /// Ordered aggregate (`WITHIN GROUP (ORDER BY …)`).
    pub fn ordered_aggregate(
        &self,
        name: impl Into<String>,
        args: Vec<SqlExpr>,
        args_propagate_null: Vec<bool>,
        orderings: Vec<SortSpec>,
        ty: HostType,
        nullable: bool,
        mapping: Option<TypeMapping>,
    ) -> SqlExpr {
        self.build_function(name.into(), args, args_propagate_null, orderings, ty, nullable, mapping)
    }

    fn build_function(
        &self,
        name: String,
        args: Vec<SqlExpr>,
        args_propagate_null: Vec<bool>,
        orderings: Vec<SortSpec>,
        ty: HostType,
        nullable: bool,
        mapping: Option<TypeMapping>,
    ) -> SqlExpr {
        if args.len() != args_propagate_null.len() {
            panic!(
                "SqlFunction {name}: {} arguments but {} nullability propagation flags",
                args.len(),
                args_propagate_null.len()
            );
        }
        let type_mapping = mapping
            .or_else(|| self.infer_type_mapping(&args))
            .or_else(|| self.mapping_source.default_mapping(ty));
        SqlExpr {
            kind: SqlExprKind::Function(SqlFunction {
                name,
                args,
                orderings,
                nullable,
                args_propagate_null,
            }),
            ty,
            type_mapping,
        }
    }

    /// Simple CASE (`CASE x WHEN …`) or searched CASE when `operand` is
    /// `None`. The result mapping is unified across all branch results.
    pub fn case(
        &self,
        operand: Option<SqlExpr>,
        when_clauses: Vec<CaseWhen>,
        else_result: Option<SqlExpr>,
    ) -> SqlExpr {
        let ty = when_clauses
            .first()
            .map(|when| when.result.ty)
            .unwrap_or(HostType::Object);
        let inferred = self
            .infer_type_mapping(when_clauses.iter().map(|w| &w.result))
            .or_else(|| else_result.as_ref().and_then(|e| e.type_mapping.clone()));

        let when_clauses = when_clauses
            .into_iter()
            .map(|when| CaseWhen {
                condition: when.condition,
                result: self.apply_type_mapping(when.result, inferred.clone()),
            })
            .collect();
        let else_result =
            else_result.map(|e| Box::new(self.apply_type_mapping(e, inferred.clone())));

        SqlExpr {
            kind: SqlExprKind::Case {
                operand: operand.map(Box::new),
                when_clauses,
                else_result,
            },
            ty,
            type_mapping: inferred,
        }
    }

    pub fn searched_case(
        &self,
        when_clauses: Vec<CaseWhen>,
        else_result: Option<SqlExpr>,
    ) -> SqlExpr {
        self.case(None, when_clauses, else_result)
    }

    /// Arithmetic binary operator; result type follows the left operand.
    pub fn binary(&self, op: BinaryOp, left: SqlExpr, right: SqlExpr) -> SqlExpr {
        let inferred = self.infer_type_mapping([&left, &right]);
        let left = self.apply_type_mapping(left, inferred.clone());
        let right = self.apply_type_mapping(right, inferred.clone());
        let ty = left.ty;
        SqlExpr {
            kind: SqlExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
            type_mapping: inferred,
        }
    }

    /// Comparison or logical operator; always maps to the boolean store type.
    /// Operands are unified against each other first.
    pub fn comparison(&self, op: BinaryOp, left: SqlExpr, right: SqlExpr) -> SqlExpr {
        let inferred = self.infer_type_mapping([&left, &right]);
        let left = self.apply_type_mapping(left, inferred.clone());
        let right = self.apply_type_mapping(right, inferred);
        SqlExpr {
            kind: SqlExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty: HostType::Bool,
            type_mapping: self.mapping_source.default_mapping(HostType::Bool),
        }
    }

    pub fn equal(&self, left: SqlExpr, right: SqlExpr) -> SqlExpr {
        self.comparison(BinaryOp::Equal, left, right)
    }

    pub fn not_equal(&self, left: SqlExpr, right: SqlExpr) -> SqlExpr {
        self.comparison(BinaryOp::NotEqual, left, right)
    }

    pub fn greater_than(&self, left: SqlExpr, right: SqlExpr) -> SqlExpr {
        self.comparison(BinaryOp::Gt, left, right)
    }

    pub fn and(&self, left: SqlExpr, right: SqlExpr) -> SqlExpr {
        self.comparison(BinaryOp::And, left, right)
    }

    pub fn or(&self, left: SqlExpr, right: SqlExpr) -> SqlExpr {
        self.comparison(BinaryOp::Or, left, right)
    }

    pub fn like(&self, match_expr: SqlExpr, pattern: SqlExpr) -> SqlExpr {
        self.comparison(BinaryOp::Like, match_expr, pattern)
    }

    pub fn not(&self, expr: SqlExpr) -> SqlExpr {
        SqlExpr {
            ty: HostType::Bool,
            type_mapping: self.mapping_source.default_mapping(HostType::Bool),
            kind: SqlExprKind::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            },
        }
    }

    pub fn negate(&self, expr: SqlExpr) -> SqlExpr {
        SqlExpr {
            ty: expr.ty,
            type_mapping: expr.type_mapping.clone(),
            kind: SqlExprKind::Unary {
                op: UnaryOp::Negate,
                expr: Box::new(expr),
            },
        }
    }

    pub fn is_null(&self, expr: SqlExpr) -> SqlExpr {
        self.null_predicate(UnaryOp::IsNull, expr)
    }

    pub fn is_not_null(&self, expr: SqlExpr) -> SqlExpr {
        self.null_predicate(UnaryOp::IsNotNull, expr)
    }

    fn null_predicate(&self, op: UnaryOp, expr: SqlExpr) -> SqlExpr {
        SqlExpr {
            ty: HostType::Bool,
            type_mapping: self.mapping_source.default_mapping(HostType::Bool),
            kind: SqlExprKind::Unary {
                op,
                expr: Box::new(expr),
            },
        }
    }

    /// COALESCE. Nullable only when every argument is nullable; no argument
    /// propagates NULL on its own.
    pub fn coalesce(&self, args: Vec<SqlExpr>, ty: HostType) -> SqlExpr {
        let nullable = args.iter().all(|arg| arg.nullable());
        let flags = vec![false; args.len()];
        self.function("COALESCE", args, flags, ty, nullable, None)
    }

    /// CAST to an explicit store type; the node's host type and mapping both
    /// come from the target.
    pub fn convert(&self, expr: SqlExpr, target: TypeMapping) -> SqlExpr {
        SqlExpr {
            ty: target.host_type,
            type_mapping: Some(target.clone()),
            kind: SqlExprKind::Convert {
                target,
                expr: Box::new(expr),
            },
        }
    }

    /// Vendor extension: `<operand> AT TIME ZONE <time_zone>`.
    pub fn at_time_zone(&self, operand: SqlExpr, time_zone: SqlExpr) -> SqlExpr {
        SqlExpr {
            ty: HostType::DateTime,
            type_mapping: Some(TypeMapping::plain(
                HostType::DateTime,
                StoreTypeName::DateTimeOffset,
            )),
            kind: SqlExprKind::AtTimeZone {
                operand: Box::new(operand),
                time_zone: Box::new(time_zone),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> SqlExpressionFactory {
        SqlExpressionFactory::new(TypeMappingSource::new())
    }

    fn unmapped_int(value: i64) -> SqlExpr {
        factory().constant(Literal::Integer(value), HostType::I32)
    }

    fn mapped_text(value: &str, store: &str) -> SqlExpr {
        let mapping = TypeMappingSource::new().find_by_store_type(store).unwrap();
        factory().typed_constant(Literal::Text(value.to_string()), HostType::Text, mapping)
    }

    #[test]
    fn unification_is_first_found() {
        let f = factory();
        let args = vec![
            f.constant(Literal::Text("a".into()), HostType::Text),
            mapped_text("b", "nvarchar(30)"),
            mapped_text("c", "nvarchar(450)"),
        ];
        // The second argument's mapping wins; the third is never consulted.
        let inferred = f.infer_type_mapping(&args).unwrap();
        assert_eq!(inferred.store_type(), "nvarchar(30)");
    }

    #[test]
    fn apply_type_mapping_is_idempotent() {
        let f = factory();
        let mapped = mapped_text("x", "nvarchar(30)");
        let own = mapped.type_mapping.clone();
        let applied = f.apply_type_mapping(mapped.clone(), own);
        assert_eq!(applied, mapped);

        // Applying a *different* mapping to an already-mapped node is also a
        // no-op; mappings only flow into unmapped nodes.
        let other = TypeMappingSource::new().find_by_store_type("nvarchar(450)");
        assert_eq!(f.apply_type_mapping(mapped.clone(), other), mapped);
    }

    #[test]
    fn apply_default_falls_back_silently() {
        let f = factory();
        // `Object` has no default mapping; the node is returned unchanged.
        let object = f.parameter("entity", HostType::Object);
        let applied = f.apply_default_type_mapping(object.clone());
        assert_eq!(applied, object);

        let int = f.apply_default_type_mapping(unmapped_int(1));
        assert_eq!(int.type_mapping.unwrap().store_type(), "int");
    }

    #[test]
    fn comparison_maps_to_bit_and_unifies_operands() {
        let f = factory();
        let left = f.constant(Literal::Text("a".into()), HostType::Text);
        let right = mapped_text("b", "nvarchar(30)");
        let comparison = f.equal(left, right);

        assert_eq!(comparison.ty, HostType::Bool);
        assert_eq!(comparison.type_mapping.unwrap().store_type(), "bit");
        let (_, left, _) = comparison.kind.as_binary().unwrap();
        assert_eq!(left.type_mapping.as_ref().unwrap().store_type(), "nvarchar(30)");
    }

    #[test]
    #[should_panic(expected = "2 arguments but 3 nullability propagation flags")]
    fn propagation_flag_mismatch_is_fatal() {
        let f = factory();
        f.function(
            "CHARINDEX",
            vec![unmapped_int(1), unmapped_int(2)],
            vec![true, true, true],
            HostType::I32,
            true,
            None,
        );
    }

    #[test]
    fn propagation_flag_lengths_always_match() {
        // Cheap linear-congruential generator; covers a spread of argument
        // counts without pulling in a randomness crate.
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let f = factory();
        for _ in 0..64 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let arg_count = (state >> 33) as usize % 9;
            let args: Vec<_> = (0..arg_count).map(|i| unmapped_int(i as i64)).collect();
            let flags = vec![true; arg_count];
            let expr = f.function("F", args, flags, HostType::I32, true, None);
            let func = expr.kind.as_function().unwrap();
            assert_eq!(func.args.len(), func.args_propagate_null.len());
        }
    }

    #[test]
    fn coalesce_nullability() {
        let f = factory();
        let nullable = f.parameter("p", HostType::Text);
        let non_null = f.constant(Literal::Text("".into()), HostType::Text);

        assert!(!f.coalesce(vec![nullable.clone(), non_null], HostType::Text).nullable());
        assert!(f.coalesce(vec![nullable.clone(), nullable], HostType::Text).nullable());
    }
}
