use log::debug;

use crate::host::{HostSurface, HostType, ResolvedCall};
use crate::ir::{Literal, SqlExpr, SqlExprKind};
use crate::sql::{Context, MethodCallTranslator};
use crate::{Error, Result, WithErrorInfo};

/// VECTOR_DISTANCE, available on Azure SQL and from compatibility level 170
/// on the on-premises engine.
pub struct VectorTranslator;

const METRICS: &[&str] = &["cosine", "euclidean", "dot"];

impl MethodCallTranslator for VectorTranslator {
    fn name(&self) -> &'static str {
        "VectorTranslator"
    }

    fn translate(
        &self,
        _instance: Option<&SqlExpr>,
        call: &ResolvedCall,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if call.surface != HostSurface::DbFunctions || call.name != "vector_distance" {
            return Ok(None);
        }
        let [metric, left, right] = args else {
            return Ok(None);
        };
        if left.ty != HostType::Vector || right.ty != HostType::Vector {
            return Ok(None);
        }
        if !ctx.target.supports_vector_search() {
            debug!(
                "declining vector_distance: not supported on {} at level {}",
                ctx.target.engine, ctx.target.compatibility_level
            );
            return Ok(None);
        }

        // The distance metric selects the algorithm; it has to be known at
        // translation time.
        let SqlExprKind::Constant(Literal::Text(metric)) = &metric.kind else {
            return Err(Error::new_simple(
                "the distance metric of 'vector_distance' must be a constant",
            )
            .with_code("E0402"));
        };
        if !METRICS.contains(&metric.as_str()) {
            return Err(Error::new_simple(format!(
                "unknown vector distance metric {metric:?}",
            ))
            .push_hint(format!("expected one of: {}", METRICS.join(", ")))
            .with_code("E0402"));
        }

        let f = &ctx.factory;
        Ok(Some(f.function(
            "VECTOR_DISTANCE",
            vec![f.fragment(format!("'{metric}'")), left.clone(), right.clone()],
            vec![false, true, true],
            HostType::F64,
            true,
            f.mapping_source().default_mapping(HostType::F64),
        )))
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use rstest::rstest;

    use super::*;
    use crate::ir::ColumnRef;
    use crate::sql::{EngineType, TargetEngine};

    fn vector_column(ctx: &Context, name: &str) -> SqlExpr {
        ctx.factory.column(
            ColumnRef {
                table_alias: Some("p".to_string()),
                name: name.to_string(),
                nullable: true,
            },
            HostType::Vector,
            ctx.factory.mapping_source().default_mapping(HostType::Vector),
        )
    }

    fn distance(ctx: &Context, metric: &str) -> Result<Option<SqlExpr>> {
        let call = ResolvedCall::new(
            HostSurface::DbFunctions,
            "vector_distance",
            vec![HostType::Text, HostType::Vector, HostType::Vector],
        );
        let metric = ctx.factory.constant(Literal::Text(metric.to_string()), HostType::Text);
        let args = [metric, vector_column(ctx, "Embedding"), vector_column(ctx, "Query")];
        VectorTranslator.translate(None, &call, &args, ctx)
    }

    #[rstest]
    #[case(EngineType::SqlServer, 160, false)]
    #[case(EngineType::SqlServer, 170, true)]
    #[case(EngineType::AzureSql, 160, true)]
    #[case(EngineType::AzureSynapse, 130, false)]
    fn gated_on_engine_and_level(
        #[case] engine: EngineType,
        #[case] level: u16,
        #[case] translates: bool,
    ) {
        let ctx = Context::new(TargetEngine::new(engine, level));
        assert_eq!(distance(&ctx, "cosine").unwrap().is_some(), translates);
    }

    #[test]
    fn renders_vector_distance() {
        let ctx = Context::new(TargetEngine::new(EngineType::AzureSql, 160));
        let expr = distance(&ctx, "cosine").unwrap().unwrap();
        assert_snapshot!(expr.to_string(), @"VECTOR_DISTANCE('cosine', [p].[Embedding], [p].[Query])");
    }

    #[test]
    fn unknown_metric_is_a_configuration_error() {
        let ctx = Context::new(TargetEngine::new(EngineType::AzureSql, 160));
        let error = distance(&ctx, "manhattan").unwrap_err();
        assert_eq!(error.code, Some("E0402"));
    }
}
