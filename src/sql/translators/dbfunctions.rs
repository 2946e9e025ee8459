use crate::host::{HostSurface, HostType, ResolvedCall};
use crate::ir::SqlExpr;
use crate::sql::{Context, MethodCallTranslator};
use crate::Result;

/// Date difference and miscellaneous engine functions on the vendor
/// extension surface.
pub struct DateDiffTranslator;

const DIFF_PARTS: &[(&str, &str)] = &[
    ("date_diff_year", "year"),
    ("date_diff_month", "month"),
    ("date_diff_day", "day"),
    ("date_diff_hour", "hour"),
    ("date_diff_minute", "minute"),
    ("date_diff_second", "second"),
    ("date_diff_millisecond", "millisecond"),
];

impl MethodCallTranslator for DateDiffTranslator {
    fn name(&self) -> &'static str {
        "DateDiffTranslator"
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
        let f = &ctx.factory;

        if let Some((_, part)) = DIFF_PARTS.iter().find(|(host, _)| *host == call.name) {
            let [start, end] = args else {
                return Ok(None);
            };
            if !start.ty.is_temporal() || !end.ty.is_temporal() {
                return Ok(None);
            }
            let inferred = f.infer_type_mapping([start, end]);
            let start = f.apply_type_mapping(start.clone(), inferred.clone());
            let end = f.apply_type_mapping(end.clone(), inferred);
            return Ok(Some(f.function(
                "DATEDIFF",
                vec![f.fragment(*part), start, end],
                vec![false, true, true],
                HostType::I32,
                true,
                f.mapping_source().default_mapping(HostType::I32),
            )));
        }

        Ok(match (call.name.as_str(), args) {
            ("at_time_zone", [operand, time_zone])
                if operand.ty == HostType::DateTime && time_zone.ty == HostType::Text =>
            {
                if !ctx.target.supports_at_time_zone() {
                    return Ok(None);
                }
                Some(f.at_time_zone(operand.clone(), time_zone.clone()))
            }
            ("data_length", [argument]) => Some(f.function(
                "DATALENGTH",
                vec![argument.clone()],
                vec![true],
                HostType::I32,
                true,
                f.mapping_source().default_mapping(HostType::I32),
            )),
            ("is_date", [argument]) if argument.ty == HostType::Text => Some(f.function(
                "ISDATE",
                vec![argument.clone()],
                vec![true],
                HostType::Bool,
                true,
                f.mapping_source().default_mapping(HostType::Bool),
            )),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::ir::ColumnRef;
    use crate::sql::TargetEngine;

    fn ctx() -> Context {
        Context::new(TargetEngine::default())
    }

    fn date_column(ctx: &Context, name: &str) -> SqlExpr {
        ctx.factory.column(
            ColumnRef {
                table_alias: Some("o".to_string()),
                name: name.to_string(),
                nullable: true,
            },
            HostType::DateTime,
            ctx.factory.mapping_source().default_mapping(HostType::DateTime),
        )
    }

    #[test]
    fn date_diff_day() {
        let ctx = ctx();
        let call = ResolvedCall::new(
            HostSurface::DbFunctions,
            "date_diff_day",
            vec![HostType::DateTime, HostType::DateTime],
        );
        let args = [date_column(&ctx, "OrderDate"), date_column(&ctx, "ShippedDate")];
        let expr = DateDiffTranslator.translate(None, &call, &args, &ctx).unwrap().unwrap();
        assert_snapshot!(expr.to_string(), @"DATEDIFF(day, [o].[OrderDate], [o].[ShippedDate])");
        assert_eq!(expr.ty, HostType::I32);
    }

    #[test]
    fn non_temporal_operands_decline() {
        let ctx = ctx();
        let call = ResolvedCall::new(
            HostSurface::DbFunctions,
            "date_diff_day",
            vec![HostType::I32, HostType::DateTime],
        );
        let number = ctx.factory.parameter("n", HostType::I32);
        let args = [number, date_column(&ctx, "OrderDate")];
        assert!(DateDiffTranslator.translate(None, &call, &args, &ctx).unwrap().is_none());
    }

    #[test]
    fn at_time_zone_is_an_extension_node() {
        let ctx = ctx();
        let call = ResolvedCall::new(
            HostSurface::DbFunctions,
            "at_time_zone",
            vec![HostType::DateTime, HostType::Text],
        );
        let zone = ctx.factory.typed_constant(
            crate::ir::Literal::Text("UTC".to_string()),
            HostType::Text,
            ctx.factory
                .mapping_source()
                .default_mapping(HostType::Text)
                .unwrap(),
        );
        let args = [date_column(&ctx, "OrderDate"), zone];
        let expr = DateDiffTranslator.translate(None, &call, &args, &ctx).unwrap().unwrap();
        assert!(expr.kind.is_at_time_zone());
        assert_snapshot!(expr.to_string(), @"[o].[OrderDate] AT TIME ZONE N'UTC'");
    }

    #[test]
    fn is_date_yields_bit() {
        let ctx = ctx();
        let call = ResolvedCall::new(HostSurface::DbFunctions, "is_date", vec![HostType::Text]);
        let text = ctx.factory.parameter("candidate", HostType::Text);
        let expr = DateDiffTranslator.translate(None, &call, &[text], &ctx).unwrap().unwrap();
        assert_snapshot!(expr.to_string(), @"ISDATE(@candidate)");
        assert_eq!(expr.ty, HostType::Bool);
    }
}
