use crate::host::{HostSurface, HostType, ResolvedCall, ResolvedMember};
use crate::ir::{BinaryOp, CaseWhen, Literal, SqlExpr, SqlExprKind};
use crate::sql::{Context, MemberTranslator, MethodCallTranslator};
use crate::storage::TypeMapping;
use crate::Result;

/// String search and manipulation.
///
/// The host convention is 0-based; CHARINDEX and SUBSTRING are 1-based, so
/// offsets are shifted on the way in and back out. CHARINDEX also disagrees
/// with the host about empty needles (it returns 0 where the host returns the
/// search start), which is patched with a constant or a CASE guard.
pub struct StringTranslator;

impl MethodCallTranslator for StringTranslator {
    fn name(&self) -> &'static str {
        "StringTranslator"
    }

    fn translate(
        &self,
        instance: Option<&SqlExpr>,
        call: &ResolvedCall,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if call.surface != HostSurface::Text {
            return Ok(None);
        }

        // Static helpers come through without a receiver.
        if instance.is_none() {
            return Ok(match (call.name.as_str(), args) {
                ("is_null_or_empty", [argument]) => Some(is_null_or_empty(ctx, argument)),
                _ => None,
            });
        }
        let x = instance.unwrap();

        Ok(match (call.name.as_str(), args) {
            ("index_of", [pattern]) => Some(translate_index_of(ctx, x, pattern, None)),
            ("index_of", [pattern, start]) if start.ty == HostType::I32 => {
                Some(translate_index_of(ctx, x, pattern, Some(start)))
            }
            ("replace", [search, replacement]) => {
                let mapping = ctx.factory.infer_type_mapping([x, search, replacement]);
                let args = [x, search, replacement]
                    .map(|e| ctx.factory.apply_type_mapping(e.clone(), mapping.clone()));
                Some(ctx.factory.function(
                    "REPLACE",
                    args.to_vec(),
                    vec![true, true, true],
                    HostType::Text,
                    true,
                    mapping,
                ))
            }
            ("substring", [start]) => {
                // Single-argument overload takes the rest of the string;
                // SUBSTRING clamps, so LEN(x) is length enough.
                let length = char_length(ctx, x.clone());
                Some(substring(ctx, x, start, length))
            }
            ("substring", [start, length]) => Some(substring(ctx, x, start, length.clone())),
            ("to_lower", []) => Some(unary_string_function(ctx, "LOWER", x)),
            ("to_upper", []) => Some(unary_string_function(ctx, "UPPER", x)),
            ("trim_start", []) => Some(unary_string_function(ctx, "LTRIM", x)),
            ("trim_end", []) => Some(unary_string_function(ctx, "RTRIM", x)),
            ("trim", []) => {
                let inner = unary_string_function(ctx, "RTRIM", x);
                Some(ctx.factory.function(
                    "LTRIM",
                    vec![inner],
                    vec![true],
                    HostType::Text,
                    true,
                    x.type_mapping.clone(),
                ))
            }
            _ => None,
        })
    }
}

impl MemberTranslator for StringTranslator {
    fn name(&self) -> &'static str {
        "StringTranslator"
    }

    fn translate(
        &self,
        instance: Option<&SqlExpr>,
        member: &ResolvedMember,
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if member.surface != HostSurface::Text {
            return Ok(None);
        }
        let Some(x) = instance else {
            return Ok(None);
        };
        Ok(match member.name.as_str() {
            // LEN yields bigint over nvarchar(max); normalize to int.
            "len" => {
                let int = int_mapping(ctx);
                Some(ctx.factory.convert(char_length(ctx, x.clone()), int))
            }
            _ => None,
        })
    }
}

fn translate_index_of(
    ctx: &Context,
    instance: &SqlExpr,
    pattern: &SqlExpr,
    start: Option<&SqlExpr>,
) -> SqlExpr {
    let f = &ctx.factory;
    let string_mapping = f.infer_type_mapping([instance, pattern]);
    let instance = f.apply_type_mapping(instance.clone(), string_mapping.clone());
    let pattern = f.apply_type_mapping(pattern.clone(), string_mapping.clone());
    let int = int_mapping(ctx);

    // An empty needle short-circuits to the search origin: CHARINDEX would
    // report "not found" where the host reports a match at the origin.
    if pattern.is_constant(&Literal::Text(String::new())) {
        let origin = match start {
            Some(start) => start.clone(),
            None => f.typed_constant(Literal::Integer(0), HostType::I32, int),
        };
        if !instance.nullable() {
            return origin;
        }
        // NULL source still yields NULL, so guard the constant result.
        return f.searched_case(
            vec![CaseWhen {
                condition: f.is_not_null(instance),
                result: origin,
            }],
            None,
        );
    }

    let mut args = vec![pattern.clone(), instance.clone()];
    let mut flags = vec![true, true];
    if let Some(start) = start {
        args.push(one_based(ctx, start.clone()));
        flags.push(true);
    }
    let char_index = f.function("CHARINDEX", args, flags, HostType::I32, true, Some(int.clone()));
    // CHARINDEX returns bigint over nvarchar(max) inputs; the cast keeps the
    // host-facing type fixed at int.
    let zero_based = f.binary(
        BinaryOp::Subtract,
        f.convert(char_index, int.clone()),
        f.typed_constant(Literal::Integer(1), HostType::I32, int.clone()),
    );

    if is_unknown_pattern(&pattern) {
        // The needle is only known at execution time; patch the empty case
        // with a conditional.
        let empty = f.typed_constant(
            Literal::Text(String::new()),
            HostType::Text,
            string_mapping.unwrap_or_else(|| default_text_mapping(ctx)),
        );
        let origin = match start {
            Some(start) => start.clone(),
            None => f.typed_constant(Literal::Integer(0), HostType::I32, int),
        };
        return f.searched_case(
            vec![CaseWhen {
                condition: f.equal(pattern, empty),
                result: origin,
            }],
            Some(zero_based),
        );
    }

    zero_based
}

/// Patterns that are not compile-time constants need the empty-needle guard.
fn is_unknown_pattern(pattern: &SqlExpr) -> bool {
    !matches!(pattern.kind, SqlExprKind::Constant(_))
}

fn substring(ctx: &Context, instance: &SqlExpr, start: &SqlExpr, length: SqlExpr) -> SqlExpr {
    ctx.factory.function(
        "SUBSTRING",
        vec![instance.clone(), one_based(ctx, start.clone()), length],
        vec![true, true, true],
        HostType::Text,
        true,
        instance.type_mapping.clone(),
    )
}

fn unary_string_function(ctx: &Context, name: &str, instance: &SqlExpr) -> SqlExpr {
    ctx.factory.function(
        name,
        vec![instance.clone()],
        vec![true],
        HostType::Text,
        true,
        instance.type_mapping.clone(),
    )
}

fn char_length(ctx: &Context, instance: SqlExpr) -> SqlExpr {
    ctx.factory.function(
        "LEN",
        vec![instance],
        vec![true],
        HostType::I32,
        true,
        Some(int_mapping(ctx)),
    )
}

fn is_null_or_empty(ctx: &Context, argument: &SqlExpr) -> SqlExpr {
    let f = &ctx.factory;
    let empty = f.typed_constant(
        Literal::Text(String::new()),
        HostType::Text,
        argument
            .type_mapping
            .clone()
            .unwrap_or_else(|| default_text_mapping(ctx)),
    );
    f.or(f.is_null(argument.clone()), f.equal(argument.clone(), empty))
}

/// Host offsets are 0-based, SQL's string functions are 1-based.
fn one_based(ctx: &Context, start: SqlExpr) -> SqlExpr {
    let int = int_mapping(ctx);
    ctx.factory.binary(
        BinaryOp::Add,
        start,
        ctx.factory.typed_constant(Literal::Integer(1), HostType::I32, int),
    )
}

fn int_mapping(ctx: &Context) -> TypeMapping {
    // The int default always resolves; reaching the panic would mean the
    // built-in mapping table lost a primitive.
    ctx.factory
        .mapping_source()
        .default_mapping(HostType::I32)
        .expect("int mapping must exist")
}

fn default_text_mapping(ctx: &Context) -> TypeMapping {
    ctx.factory
        .mapping_source()
        .default_mapping(HostType::Text)
        .expect("text mapping must exist")
}
