use log::debug;

use crate::host::{HostSurface, HostType, ResolvedCall};
use crate::ir::SqlExpr;
use crate::sql::{Context, MethodCallTranslator};
use crate::Result;

/// JSON path existence tests, available from compatibility level 160.
pub struct JsonTranslator;

impl MethodCallTranslator for JsonTranslator {
    fn name(&self) -> &'static str {
        "JsonTranslator"
    }

    fn translate(
        &self,
        _instance: Option<&SqlExpr>,
        call: &ResolvedCall,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if call.surface != HostSurface::DbFunctions || call.name != "json_path_exists" {
            return Ok(None);
        }
        let [json, path] = args else {
            return Ok(None);
        };
        if !matches!(json.ty, HostType::Json | HostType::Text) || path.ty != HostType::Text {
            return Ok(None);
        }
        if !ctx.target.supports_json_path_exists() {
            debug!(
                "declining json_path_exists: compatibility level {} is too old",
                ctx.target.compatibility_level
            );
            return Ok(None);
        }

        let f = &ctx.factory;
        Ok(Some(f.function(
            "JSON_PATH_EXISTS",
            vec![json.clone(), path.clone()],
            vec![true, true],
            HostType::Bool,
            true,
            f.mapping_source().default_mapping(HostType::Bool),
        )))
    }
}
