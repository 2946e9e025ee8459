//! JSON serialization of the SQL expression model, for tooling and
//! inspection.

use crate::ir::SqlExpr;
use crate::{Error, Result};

pub fn from_expr(expr: &SqlExpr) -> Result<String> {
    serde_json::to_string(expr).map_err(convert_json_err)
}

pub fn to_expr(json: &str) -> Result<SqlExpr> {
    serde_json::from_str(json).map_err(convert_json_err)
}

fn convert_json_err(err: serde_json::Error) -> Error {
    Error::new_simple(err.to_string())
}
