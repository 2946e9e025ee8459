use crate::host::{HostSurface, HostType, ResolvedCall, ResolvedMember};
use crate::ir::{BinaryOp, Literal, SqlExpr, SqlExprKind};
use crate::sql::{Context, MemberTranslator, MethodCallTranslator};
use crate::storage::TypeMapping;
use crate::Result;

/// Byte-array operations over `varbinary` columns.
pub struct ByteArrayTranslator;

impl MethodCallTranslator for ByteArrayTranslator {
    fn name(&self) -> &'static str {
        "ByteArrayTranslator"
    }

    fn translate(
        &self,
        instance: Option<&SqlExpr>,
        call: &ResolvedCall,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if call.surface != HostSurface::Bytes {
            return Ok(None);
        }
        let Some(x) = instance else {
            return Ok(None);
        };
        let f = &ctx.factory;

        Ok(match (call.name.as_str(), args) {
            ("contains", [value]) => {
                // CHARINDEX needs the needle as a varbinary literal; only a
                // constant byte can be rendered that way.
                let SqlExprKind::Constant(Literal::Integer(byte)) = &value.kind else {
                    return Ok(None);
                };
                let needle = f.typed_constant(
                    Literal::Bytes(vec![*byte as u8]),
                    HostType::Bytes,
                    binary_mapping(ctx),
                );
                let position = f.function(
                    "CHARINDEX",
                    vec![needle, x.clone()],
                    vec![true, true],
                    HostType::I32,
                    true,
                    f.mapping_source().default_mapping(HostType::I32),
                );
                let zero = f.typed_constant(
                    Literal::Integer(0),
                    HostType::I32,
                    f.mapping_source().default_mapping(HostType::I32).unwrap(),
                );
                Some(f.greater_than(position, zero))
            }
            ("element_at", [index]) if index.ty == HostType::I32 => {
                let one_based = f.binary(
                    BinaryOp::Add,
                    index.clone(),
                    f.typed_constant(
                        Literal::Integer(1),
                        HostType::I32,
                        f.mapping_source().default_mapping(HostType::I32).unwrap(),
                    ),
                );
                Some(single_byte(ctx, x, one_based))
            }
            ("first", []) => {
                let one = f.typed_constant(
                    Literal::Integer(1),
                    HostType::I32,
                    f.mapping_source().default_mapping(HostType::I32).unwrap(),
                );
                Some(single_byte(ctx, x, one))
            }
            _ => None,
        })
    }
}

impl MemberTranslator for ByteArrayTranslator {
    fn name(&self) -> &'static str {
        "ByteArrayTranslator"
    }

    fn translate(
        &self,
        instance: Option<&SqlExpr>,
        member: &ResolvedMember,
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if member.surface != HostSurface::Bytes || member.name != "len" {
            return Ok(None);
        }
        let Some(x) = instance else {
            return Ok(None);
        };
        let f = &ctx.factory;
        let int = f.mapping_source().default_mapping(HostType::I32).unwrap();
        // DATALENGTH yields bigint over varbinary(max); normalize to int.
        let length = f.function(
            "DATALENGTH",
            vec![x.clone()],
            vec![true],
            HostType::I32,
            true,
            Some(int.clone()),
        );
        Ok(Some(f.convert(length, int)))
    }
}

/// `CAST(SUBSTRING(x, <position>, 1) AS tinyint)`.
fn single_byte(ctx: &Context, x: &SqlExpr, position: SqlExpr) -> SqlExpr {
    let f = &ctx.factory;
    let one = f.typed_constant(
        Literal::Integer(1),
        HostType::I32,
        f.mapping_source().default_mapping(HostType::I32).unwrap(),
    );
    let slice = f.function(
        "SUBSTRING",
        vec![x.clone(), position, one],
        vec![true, true, true],
        HostType::Bytes,
        true,
        x.type_mapping.clone(),
    );
    let tinyint = f.mapping_source().default_mapping(HostType::U8).unwrap();
    f.convert(slice, tinyint)
}

fn binary_mapping(ctx: &Context) -> TypeMapping {
    ctx.factory
        .mapping_source()
        .default_mapping(HostType::Bytes)
        .expect("varbinary mapping must exist")
}
