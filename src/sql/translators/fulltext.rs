use crate::host::{HostSurface, HostType, ResolvedCall};
use crate::ir::{Literal, SqlExpr, SqlExprKind};
use crate::sql::{Context, MethodCallTranslator};
use crate::{Error, Result, WithErrorInfo};

/// FREETEXT / CONTAINS predicates.
///
/// Full-text search runs against a full-text index, so the target must
/// structurally be a mapped column. Anything else is a user configuration
/// error and fails fast — a silent mistranslation here would search the wrong
/// thing.
pub struct FullTextSearchTranslator;

impl MethodCallTranslator for FullTextSearchTranslator {
    fn name(&self) -> &'static str {
        "FullTextSearchTranslator"
    }

    fn translate(
        &self,
        _instance: Option<&SqlExpr>,
        call: &ResolvedCall,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if call.surface != HostSurface::DbFunctions {
            return Ok(None);
        }
        let function_name = match call.name.as_str() {
            "free_text" => "FREETEXT",
            "contains" => "CONTAINS",
            _ => return Ok(None),
        };
        let (column, pattern, language) = match args {
            [column, pattern] => (column, pattern, None),
            [column, pattern, language] => (column, pattern, Some(language)),
            _ => return Ok(None),
        };

        if !matches!(column.kind, SqlExprKind::Column(_)) {
            return Err(Error::new_simple(format!(
                "the first argument to '{}' must be a mapped column",
                call.name
            ))
            .push_hint("full-text search cannot run over computed expressions")
            .with_code("E0401"));
        }

        let f = &ctx.factory;
        let mut function_args = vec![column.clone(), pattern.clone()];
        if let Some(language) = language {
            let SqlExprKind::Constant(Literal::Integer(lcid)) = &language.kind else {
                return Err(Error::new_simple(format!(
                    "the language argument to '{}' must be a constant",
                    call.name
                ))
                .with_code("E0401"));
            };
            function_args.push(f.fragment(format!("LANGUAGE {lcid}")));
        }

        let flags = vec![false; function_args.len()];
        Ok(Some(f.function(
            function_name,
            function_args,
            flags,
            HostType::Bool,
            false,
            f.mapping_source().default_mapping(HostType::Bool),
        )))
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::host::HostType;
    use crate::ir::ColumnRef;
    use crate::sql::TargetEngine;

    fn ctx() -> Context {
        Context::new(TargetEngine::default())
    }

    fn title_column(ctx: &Context) -> SqlExpr {
        ctx.factory.column(
            ColumnRef {
                table_alias: Some("p".to_string()),
                name: "Title".to_string(),
                nullable: true,
            },
            HostType::Text,
            ctx.factory.mapping_source().default_mapping(HostType::Text),
        )
    }

    fn text(ctx: &Context, value: &str) -> SqlExpr {
        ctx.factory.typed_constant(
            Literal::Text(value.to_string()),
            HostType::Text,
            ctx.factory
                .mapping_source()
                .default_mapping(HostType::Text)
                .unwrap(),
        )
    }

    #[test]
    fn free_text_over_column() {
        let ctx = ctx();
        let call = ResolvedCall::new(
            HostSurface::DbFunctions,
            "free_text",
            vec![HostType::Text, HostType::Text],
        );
        let expr = FullTextSearchTranslator
            .translate(None, &call, &[title_column(&ctx), text(&ctx, "database")], &ctx)
            .unwrap()
            .unwrap();
        assert_snapshot!(expr.to_string(), @"FREETEXT([p].[Title], N'database')");
        assert_eq!(expr.ty, HostType::Bool);
    }

    #[test]
    fn contains_with_language() {
        let ctx = ctx();
        let call = ResolvedCall::new(
            HostSurface::DbFunctions,
            "contains",
            vec![HostType::Text, HostType::Text, HostType::I32],
        );
        let language = ctx.factory.constant(Literal::Integer(1033), HostType::I32);
        let expr = FullTextSearchTranslator
            .translate(
                None,
                &call,
                &[title_column(&ctx), text(&ctx, "NEAR(database, server)"), language],
                &ctx,
            )
            .unwrap()
            .unwrap();
        assert_snapshot!(expr.to_string(), @"CONTAINS([p].[Title], N'NEAR(database, server)', LANGUAGE 1033)");
    }

    #[test]
    fn computed_target_is_a_configuration_error() {
        let ctx = ctx();
        let call = ResolvedCall::new(
            HostSurface::DbFunctions,
            "free_text",
            vec![HostType::Text, HostType::Text],
        );
        let computed = ctx.factory.function(
            "UPPER",
            vec![title_column(&ctx)],
            vec![true],
            HostType::Text,
            true,
            None,
        );
        let error = FullTextSearchTranslator
            .translate(None, &call, &[computed, text(&ctx, "database")], &ctx)
            .unwrap_err();
        assert_eq!(error.code, Some("E0401"));
        assert!(!error.is_bug());
    }

    #[test]
    fn non_constant_language_is_a_configuration_error() {
        let ctx = ctx();
        let call = ResolvedCall::new(
            HostSurface::DbFunctions,
            "contains",
            vec![HostType::Text, HostType::Text, HostType::I32],
        );
        let language = ctx.factory.parameter("lcid", HostType::I32);
        let error = FullTextSearchTranslator
            .translate(
                None,
                &call,
                &[title_column(&ctx), text(&ctx, "database"), language],
                &ctx,
            )
            .unwrap_err();
        assert_eq!(error.code, Some("E0401"));
    }
}
