//! The consumed half of the translation contract: descriptors of host-language
//! calls and member accesses, fully resolved by the upstream query-lowering
//! pass before they reach a translator.
//!
//! Translators key their pattern match purely on these identities — a closed
//! set of well-known API surfaces known at build time — never on source text.

use serde::{Deserialize, Serialize};

/// Semantic (host-language) type of a value flowing through the pipeline.
///
/// Every [crate::ir::SqlExpr] carries one of these as its result type,
/// independently of the storage type the value maps to.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum HostType {
    Bool,
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Decimal,
    Text,
    Bytes,
    DateTime,
    DateOnly,
    TimeOnly,
    Duration,
    Guid,
    Json,
    Vector,
    /// An entity or other composite the pipeline cannot map to a scalar.
    Object,
}

impl HostType {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            HostType::U8 | HostType::I16 | HostType::I32 | HostType::I64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(self, HostType::F32 | HostType::F64 | HostType::Decimal)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            HostType::DateTime | HostType::DateOnly | HostType::TimeOnly | HostType::Duration
        )
    }
}

/// Declaring surface of a resolved call or member: one host standard-library
/// type or one vendor-extension entry point.
///
/// This is the closed, build-time analogue of "declaring type identity". A
/// translator registers for one or two of these and declines everything else.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "snake_case")]
pub enum HostSurface {
    DateTime,
    DateOnly,
    TimeOnly,
    Duration,
    Text,
    /// Double-precision math surface.
    Math,
    /// Single-precision math surface; results round-trip through `float` but
    /// keep an `f32` host type.
    MathF,
    Convert,
    /// Grouped-enumerable operators (aggregates).
    Sequence,
    /// The vendor extension surface (full-text, JSON, vectors, DATEDIFF…).
    DbFunctions,
    Bytes,
}

/// A fully resolved method-call site: declaring surface, member name and the
/// ordered parameter type list. Never carries syntax.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ResolvedCall {
    pub surface: HostSurface,
    pub name: String,
    pub params: Vec<HostType>,
}

impl ResolvedCall {
    pub fn new(surface: HostSurface, name: impl Into<String>, params: Vec<HostType>) -> Self {
        ResolvedCall {
            surface,
            name: name.into(),
            params,
        }
    }

    /// The (name, parameter-shape) pair translators match on.
    pub fn key(&self) -> (&str, &[HostType]) {
        (self.name.as_str(), self.params.as_slice())
    }
}

/// A fully resolved member access (property/field, no arguments).
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ResolvedMember {
    pub surface: HostSurface,
    pub name: String,
}

impl ResolvedMember {
    pub fn new(surface: HostSurface, name: impl Into<String>) -> Self {
        ResolvedMember {
            surface,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use insta::assert_debug_snapshot;

    use super::*;

    #[test]
    fn surface_from_str() {
        assert_debug_snapshot!(HostSurface::from_str("db_functions"), @r"
        Ok(
            DbFunctions,
        )
        ");

        assert_debug_snapshot!(HostSurface::from_str("graphics"), @r"
        Err(
            VariantNotFound,
        )
        ");
    }

    #[test]
    fn type_classes() {
        assert!(HostType::U8.is_integer());
        assert!(HostType::Decimal.is_numeric());
        assert!(!HostType::Text.is_numeric());
        assert!(HostType::TimeOnly.is_temporal());
        assert!(!HostType::Guid.is_temporal());
    }
}
