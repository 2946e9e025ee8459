use log::debug;

use crate::host::{HostSurface, HostType, ResolvedCall};
use crate::ir::{Literal, SqlExpr};
use crate::sql::{Context, MethodCallTranslator};
use crate::Result;

/// One-to-one scalar math functions.
const ONE_ARG: &[(&str, &str)] = &[
    ("abs", "ABS"),
    ("acos", "ACOS"),
    ("asin", "ASIN"),
    ("atan", "ATAN"),
    ("ceiling", "CEILING"),
    ("cos", "COS"),
    ("exp", "EXP"),
    ("floor", "FLOOR"),
    ("log", "LOG"),
    ("log10", "LOG10"),
    ("sin", "SIN"),
    ("sqrt", "SQRT"),
    ("tan", "TAN"),
];

const TWO_ARG: &[(&str, &str)] = &[("atan2", "ATN2"), ("log", "LOG"), ("pow", "POWER")];

/// Math over the double-precision and single-precision host surfaces.
///
/// The engine's ROUND family operates in double precision only, so
/// single-precision rounding widens the operand to `float` and casts the call
/// back to `real`, keeping the host-facing result type at `f32`.
pub struct MathTranslator;

impl MethodCallTranslator for MathTranslator {
    fn name(&self) -> &'static str {
        "MathTranslator"
    }

    fn translate(
        &self,
        _instance: Option<&SqlExpr>,
        call: &ResolvedCall,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if !matches!(call.surface, HostSurface::Math | HostSurface::MathF) {
            return Ok(None);
        }
        let single_precision = call.surface == HostSurface::MathF;
        let f = &ctx.factory;

        if let ([arg], Some(sql_name)) = (args, lookup(ONE_ARG, &call.name)) {
            return Ok(Some(scalar(ctx, sql_name, vec![arg.clone()], arg.ty)));
        }
        if let ([a, b], Some(sql_name)) = (args, lookup(TWO_ARG, &call.name)) {
            return Ok(Some(scalar(ctx, sql_name, vec![a.clone(), b.clone()], a.ty)));
        }

        Ok(match (call.name.as_str(), args) {
            ("sign", [arg]) => Some(f.function(
                "SIGN",
                vec![arg.clone()],
                vec![true],
                HostType::I32,
                true,
                f.mapping_source().default_mapping(HostType::I32),
            )),
            ("round", [arg]) => Some(round(ctx, arg, None, false, single_precision)),
            ("round", [arg, digits]) if digits.ty == HostType::I32 => {
                Some(round(ctx, arg, Some(digits.clone()), false, single_precision))
            }
            ("truncate", [arg]) => Some(round(ctx, arg, None, true, single_precision)),
            ("min", [a, b]) => least_greatest(ctx, "LEAST", a, b),
            ("max", [a, b]) => least_greatest(ctx, "GREATEST", a, b),
            _ => None,
        })
    }
}

fn lookup(table: &[(&'static str, &'static str)], name: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(host, _)| *host == name)
        .map(|(_, sql)| *sql)
}

fn scalar(ctx: &Context, name: &str, args: Vec<SqlExpr>, ty: HostType) -> SqlExpr {
    let flags = vec![true; args.len()];
    let mapping = ctx.factory.infer_type_mapping(&args);
    ctx.factory.function(name, args, flags, ty, true, mapping)
}

/// ROUND(x, digits[, 1]); the trailing function literal `1` selects
/// truncation.
fn round(
    ctx: &Context,
    arg: &SqlExpr,
    digits: Option<SqlExpr>,
    truncate: bool,
    single_precision: bool,
) -> SqlExpr {
    let f = &ctx.factory;
    let int = f.mapping_source().default_mapping(HostType::I32).unwrap();

    let (operand, result_ty) = if single_precision {
        // Widen to double for the engine, cast back to real below.
        let double = f.mapping_source().default_mapping(HostType::F64).unwrap();
        (f.convert(arg.clone(), double), HostType::F64)
    } else {
        (arg.clone(), arg.ty)
    };

    let mut args = vec![
        operand,
        digits.unwrap_or_else(|| f.typed_constant(Literal::Integer(0), HostType::I32, int)),
    ];
    // Digits and the truncation selector are function literals; NULL cannot
    // flow through them.
    let mut flags = vec![true, false];
    if truncate {
        args.push(f.typed_constant(
            Literal::Integer(1),
            HostType::I32,
            f.mapping_source().default_mapping(HostType::I32).unwrap(),
        ));
        flags.push(false);
    }
    let mapping = ctx.factory.infer_type_mapping(args.first());
    let call = f.function("ROUND", args, flags, result_ty, true, mapping);

    if single_precision {
        let real = f.mapping_source().default_mapping(HostType::F32).unwrap();
        f.convert(call, real)
    } else {
        call
    }
}

fn least_greatest(ctx: &Context, name: &str, a: &SqlExpr, b: &SqlExpr) -> Option<SqlExpr> {
    if !ctx.target.supports_least_greatest() {
        debug!("declining {name}: compatibility level {} is too old", ctx.target.compatibility_level);
        return None;
    }
    Some(scalar(ctx, name, vec![a.clone(), b.clone()], a.ty))
}
