use chrono::{NaiveDate, NaiveTime};
use log::debug;

use crate::host::{HostSurface, HostType, ResolvedCall, ResolvedMember};
use crate::ir::{Literal, SqlExpr, SqlExprKind};
use crate::sql::{Context, MemberTranslator, MethodCallTranslator};
use crate::storage::{StoreTypeName, TypeMapping};
use crate::Result;

/// DATEPART keyword per date/time member. The keyword argument is a raw
/// fragment and never propagates nullability; the operand does.
const DATE_PARTS: &[(&str, &str)] = &[
    ("year", "year"),
    ("month", "month"),
    ("day_of_year", "dayofyear"),
    ("day", "day"),
    ("hour", "hour"),
    ("minute", "minute"),
    ("second", "second"),
    ("millisecond", "millisecond"),
];

/// Duration members use plural names on the host side.
const DURATION_PARTS: &[(&str, &str)] = &[
    ("hours", "hour"),
    ("minutes", "minute"),
    ("seconds", "second"),
    ("milliseconds", "millisecond"),
];

/// DATEADD keyword per arithmetic method.
const ADD_PARTS: &[(&str, &str)] = &[
    ("add_years", "year"),
    ("add_months", "month"),
    ("add_days", "day"),
    ("add_hours", "hour"),
    ("add_minutes", "minute"),
    ("add_seconds", "second"),
    ("add_milliseconds", "millisecond"),
];

const TICKS_PER_DAY: i64 = 864_000_000_000;
const TICKS_PER_MILLISECOND: i64 = 10_000;

pub struct DateTimeMemberTranslator;

impl MemberTranslator for DateTimeMemberTranslator {
    fn name(&self) -> &'static str {
        "DateTimeMemberTranslator"
    }

    fn translate(
        &self,
        instance: Option<&SqlExpr>,
        member: &ResolvedMember,
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        match member.surface {
            HostSurface::DateTime => self.translate_date_time(instance, &member.name, ctx),
            HostSurface::DateOnly => self.translate_date_only(instance, &member.name, ctx),
            HostSurface::TimeOnly => self.translate_time_only(instance, &member.name, ctx),
            HostSurface::Duration => self.translate_duration(instance, &member.name, ctx),
            _ => Ok(None),
        }
    }
}

impl DateTimeMemberTranslator {
    fn translate_date_time(
        &self,
        instance: Option<&SqlExpr>,
        name: &str,
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        // Static members of the surface come through without a receiver.
        if instance.is_none() {
            return Ok(match name {
                "now" => Some(get_date(ctx)),
                "utc_now" => Some(ctx.factory.niladic_function(
                    "GETUTCDATE",
                    HostType::DateTime,
                    false,
                    None,
                )),
                "today" => Some(convert_to(
                    ctx,
                    StoreTypeName::Date,
                    HostType::DateOnly,
                    get_date(ctx),
                )),
                _ => None,
            });
        }
        let operand = instance.unwrap().clone();

        if let Some(part) = lookup(DATE_PARTS, name) {
            return Ok(Some(date_part(ctx, part, operand)));
        }
        Ok(match name {
            "date" => Some(convert_to(ctx, StoreTypeName::Date, HostType::DateOnly, operand)),
            "time_of_day" => {
                Some(convert_to(ctx, StoreTypeName::Time, HostType::TimeOnly, operand))
            }
            "ticks" => Some(date_time_ticks(ctx, operand)),
            _ => None,
        })
    }

    fn translate_date_only(
        &self,
        instance: Option<&SqlExpr>,
        name: &str,
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        let Some(operand) = instance else {
            return Ok(None);
        };
        Ok(matches!(name, "year" | "month" | "day_of_year" | "day")
            .then(|| lookup(DATE_PARTS, name))
            .flatten()
            .map(|part| date_part(ctx, part, operand.clone())))
    }

    fn translate_time_only(
        &self,
        instance: Option<&SqlExpr>,
        name: &str,
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        let Some(operand) = instance else {
            return Ok(None);
        };
        Ok(matches!(name, "hour" | "minute" | "second" | "millisecond")
            .then(|| lookup(DATE_PARTS, name))
            .flatten()
            .map(|part| date_part(ctx, part, operand.clone())))
    }

    fn translate_duration(
        &self,
        instance: Option<&SqlExpr>,
        name: &str,
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        let Some(operand) = instance else {
            return Ok(None);
        };
        if let Some(part) = lookup(DURATION_PARTS, name) {
            return Ok(Some(date_part(ctx, part, operand.clone())));
        }
        Ok((name == "ticks").then(|| duration_ticks(ctx, operand.clone())))
    }
}

pub struct DateTimeMethodTranslator;

impl MethodCallTranslator for DateTimeMethodTranslator {
    fn name(&self) -> &'static str {
        "DateTimeMethodTranslator"
    }

    fn translate(
        &self,
        instance: Option<&SqlExpr>,
        call: &ResolvedCall,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        let supported = match call.surface {
            HostSurface::DateTime => true,
            HostSurface::DateOnly => {
                matches!(call.name.as_str(), "add_years" | "add_months" | "add_days")
            }
            HostSurface::TimeOnly => matches!(call.name.as_str(), "add_hours" | "add_minutes"),
            _ => false,
        };
        if !supported {
            return Ok(None);
        }
        let (Some(instance), [amount]) = (instance, args) else {
            return Ok(None);
        };
        let Some(part) = lookup(ADD_PARTS, &call.name) else {
            return Ok(None);
        };

        // DATEADD takes a 32-bit amount; a floating-point constant outside
        // that range cannot be translated faithfully.
        if let SqlExprKind::Constant(Literal::Float(value)) = &amount.kind {
            if *value >= i32::MAX as f64 || *value <= i32::MIN as f64 {
                debug!("declining {}: constant amount outside the DATEADD range", call.name);
                return Ok(None);
            }
        }

        Ok(Some(ctx.factory.function(
            "DATEADD",
            vec![ctx.factory.fragment(part), amount.clone(), instance.clone()],
            vec![false, true, true],
            instance.ty,
            true,
            instance.type_mapping.clone(),
        )))
    }
}

fn lookup(table: &[(&'static str, &'static str)], name: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(host, _)| *host == name)
        .map(|(_, sql)| *sql)
}

fn date_part(ctx: &Context, part: &'static str, operand: SqlExpr) -> SqlExpr {
    ctx.factory.function(
        "DATEPART",
        vec![ctx.factory.fragment(part), operand],
        vec![false, true],
        HostType::I32,
        true,
        ctx.factory.mapping_source().default_mapping(HostType::I32),
    )
}

fn get_date(ctx: &Context) -> SqlExpr {
    ctx.factory
        .niladic_function("GETDATE", HostType::DateTime, false, None)
}

/// `CONVERT(<store>, x)` — the engine's conversion function, as opposed to a
/// CAST node.
fn convert_to(ctx: &Context, store: StoreTypeName, ty: HostType, operand: SqlExpr) -> SqlExpr {
    let mapping = TypeMapping::plain(ty, store);
    let nullable = operand.nullable();
    ctx.factory.function(
        "CONVERT",
        vec![ctx.factory.fragment(store.to_string()), operand],
        vec![false, true],
        ty,
        nullable,
        Some(mapping),
    )
}

/// Reconstructs the tick count (100ns units since 0001-01-01) from two
/// DATEDIFF extractions with fixed scale factors. The arithmetic is
/// deliberately verbatim; the scale factors are easy to get subtly wrong.
fn date_time_ticks(ctx: &Context, operand: SqlExpr) -> SqlExpr {
    let f = &ctx.factory;
    let int = f.mapping_source().default_mapping(HostType::I32);
    let bigint = f.mapping_source().default_mapping(HostType::I64).unwrap();
    let datetime = f.mapping_source().default_mapping(HostType::DateTime).unwrap();

    let epoch = f.typed_constant(
        Literal::DateTime(
            NaiveDate::from_ymd_opt(1, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        ),
        HostType::DateTime,
        datetime,
    );
    let day_diff = f.function(
        "DATEDIFF",
        vec![f.fragment("day"), epoch, operand.clone()],
        vec![false, true, true],
        HostType::I32,
        true,
        int.clone(),
    );
    let day_ticks = f.binary(
        crate::ir::BinaryOp::Multiply,
        f.convert(day_diff, bigint.clone()),
        f.typed_constant(Literal::Integer(TICKS_PER_DAY), HostType::I64, bigint.clone()),
    );

    let start_of_day = convert_to(
        ctx,
        StoreTypeName::DateTime2,
        HostType::DateTime,
        convert_to(ctx, StoreTypeName::Date, HostType::DateOnly, operand.clone()),
    );
    let millisecond_diff = f.function(
        "DATEDIFF",
        vec![f.fragment("millisecond"), start_of_day, operand],
        vec![false, true, true],
        HostType::I32,
        true,
        int,
    );
    let millisecond_ticks = f.binary(
        crate::ir::BinaryOp::Multiply,
        f.convert(millisecond_diff, bigint.clone()),
        f.typed_constant(Literal::Integer(TICKS_PER_MILLISECOND), HostType::I64, bigint),
    );

    f.binary(crate::ir::BinaryOp::Add, day_ticks, millisecond_ticks)
}

fn duration_ticks(ctx: &Context, operand: SqlExpr) -> SqlExpr {
    let f = &ctx.factory;
    let int = f.mapping_source().default_mapping(HostType::I32);
    let bigint = f.mapping_source().default_mapping(HostType::I64).unwrap();
    let time = f.mapping_source().default_mapping(HostType::TimeOnly).unwrap();

    let midnight = f.typed_constant(
        Literal::Time(NaiveTime::from_hms_opt(0, 0, 0).unwrap()),
        HostType::TimeOnly,
        time,
    );
    let millisecond_diff = f.function(
        "DATEDIFF",
        vec![f.fragment("millisecond"), midnight, operand],
        vec![false, true, true],
        HostType::I32,
        true,
        int,
    );
    f.binary(
        crate::ir::BinaryOp::Multiply,
        f.convert(millisecond_diff, bigint.clone()),
        f.typed_constant(Literal::Integer(TICKS_PER_MILLISECOND), HostType::I64, bigint),
    )
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

    fn date_column(ctx: &Context) -> SqlExpr {
        ctx.factory.column(
            ColumnRef {
                table_alias: Some("o".to_string()),
                name: "OrderDate".to_string(),
                nullable: true,
            },
            HostType::DateTime,
            ctx.factory.mapping_source().default_mapping(HostType::DateTime),
        )
    }

    #[test]
    fn year_member_extracts_date_part() {
        let ctx = ctx();
        let member = ResolvedMember::new(HostSurface::DateTime, "year");
        let expr = DateTimeMemberTranslator
            .translate(Some(&date_column(&ctx)), &member, &ctx)
            .unwrap()
            .unwrap();

        let func = expr.kind.as_function().unwrap();
        assert_eq!(func.name, "DATEPART");
        // The keyword literal never nulls the result; the operand does.
        assert_eq!(func.args_propagate_null, vec![false, true]);
        assert_eq!(expr.ty, HostType::I32);
        assert_snapshot!(expr.to_string(), @"DATEPART(year, [o].[OrderDate])");
    }

    #[test]
    fn statics_need_no_receiver() {
        let ctx = ctx();
        let today = DateTimeMemberTranslator
            .translate(None, &ResolvedMember::new(HostSurface::DateTime, "today"), &ctx)
            .unwrap()
            .unwrap();
        assert_snapshot!(today.to_string(), @"CONVERT(date, GETDATE())");
        assert!(!today.nullable());
    }

    #[test]
    fn date_only_has_no_clock_parts() {
        let ctx = ctx();
        let result = DateTimeMemberTranslator
            .translate(
                Some(&date_column(&ctx)),
                &ResolvedMember::new(HostSurface::DateOnly, "hour"),
                &ctx,
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn ticks_decomposition() {
        let ctx = ctx();
        let expr = DateTimeMemberTranslator
            .translate(Some(&date_column(&ctx)), &ResolvedMember::new(HostSurface::DateTime, "ticks"), &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(expr.ty, HostType::I64);
        assert_snapshot!(expr.to_string(), @"CAST(DATEDIFF(day, '0001-01-01T00:00:00.0000000', [o].[OrderDate]) AS bigint) * 864000000000 + CAST(DATEDIFF(millisecond, CONVERT(datetime2, CONVERT(date, [o].[OrderDate])), [o].[OrderDate]) AS bigint) * 10000");
    }

    #[test]
    fn add_years_becomes_dateadd() {
        let ctx = ctx();
        let call = ResolvedCall::new(HostSurface::DateTime, "add_years", vec![HostType::I32]);
        let amount = ctx.factory.constant(Literal::Integer(2), HostType::I32);
        let expr = DateTimeMethodTranslator
            .translate(Some(&date_column(&ctx)), &call, &[amount], &ctx)
            .unwrap()
            .unwrap();
        assert_snapshot!(expr.to_string(), @"DATEADD(year, 2, [o].[OrderDate])");
        assert_eq!(expr.ty, HostType::DateTime);
    }

    #[test]
    fn out_of_range_float_amount_declines() {
        let ctx = ctx();
        let call = ResolvedCall::new(HostSurface::DateTime, "add_days", vec![HostType::F64]);
        let amount = ctx.factory.constant(Literal::Float(3e10), HostType::F64);
        let result = DateTimeMethodTranslator
            .translate(Some(&date_column(&ctx)), &call, &[amount], &ctx)
            .unwrap();
        assert!(result.is_none());

        let in_range = ctx.factory.constant(Literal::Float(30.0), HostType::F64);
        let expr = DateTimeMethodTranslator
            .translate(Some(&date_column(&ctx)), &call, &[in_range], &ctx)
            .unwrap()
            .unwrap();
        assert_snapshot!(expr.to_string(), @"DATEADD(day, 30.0, [o].[OrderDate])");
    }
}
