use log::debug;

use crate::host::{HostSurface, HostType, ResolvedCall};
use crate::ir::SqlExpr;
use crate::sql::{Context, MethodCallTranslator};
use crate::Result;

/// Explicit-conversion surface: `convert.to_i32(x)` and friends.
///
/// Each supported destination becomes a cast node wrapping the engine's
/// CONVERT function targeting the destination's default store type.
/// Unsupported source types decline; the pipeline may still translate the
/// call structurally (e.g. as a no-op for identity conversions) or reject it
/// later.
pub struct ConvertTranslator;

const TARGETS: &[(&str, HostType, &str)] = &[
    ("to_bool", HostType::Bool, "bit"),
    ("to_u8", HostType::U8, "tinyint"),
    ("to_i16", HostType::I16, "smallint"),
    ("to_i32", HostType::I32, "int"),
    ("to_i64", HostType::I64, "bigint"),
    ("to_f32", HostType::F32, "real"),
    ("to_f64", HostType::F64, "float"),
    ("to_decimal", HostType::Decimal, "decimal(18, 2)"),
    ("to_text", HostType::Text, "nvarchar(max)"),
];

const SUPPORTED_SOURCES: &[HostType] = &[
    HostType::Bool,
    HostType::U8,
    HostType::I16,
    HostType::I32,
    HostType::I64,
    HostType::F32,
    HostType::F64,
    HostType::Decimal,
    HostType::Text,
    HostType::DateTime,
];

impl MethodCallTranslator for ConvertTranslator {
    fn name(&self) -> &'static str {
        "ConvertTranslator"
    }

    fn translate(
        &self,
        _instance: Option<&SqlExpr>,
        call: &ResolvedCall,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if call.surface != HostSurface::Convert {
            return Ok(None);
        }
        let [argument] = args else {
            return Ok(None);
        };
        let Some((_, target_ty, store_type)) =
            TARGETS.iter().find(|(name, _, _)| *name == call.name)
        else {
            return Ok(None);
        };
        if !SUPPORTED_SOURCES.contains(&argument.ty) {
            debug!("declining {}: source type {} has no conversion", call.name, argument.ty);
            return Ok(None);
        }

        let f = &ctx.factory;
        let target = f
            .mapping_source()
            .find_by_store_type(store_type)
            .expect("conversion targets are built-in store types");

        let inner = f.function(
            "CONVERT",
            vec![f.fragment(target.store_type()), argument.clone()],
            vec![false, true],
            *target_ty,
            argument.nullable(),
            Some(target.clone()),
        );
        Ok(Some(f.convert(inner, target)))
    }
}
