use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::mapping::{Facets, StoreSize, StoreTypeName, TypeMapping};
use crate::host::HostType;

/// Facet requests layered on top of a resolved base mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FacetOverrides {
    pub size: Option<StoreSize>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub unicode: Option<bool>,
    pub fixed_length: Option<bool>,
}

/// Resolves semantic value types to storage type descriptors.
///
/// The lookup tables are built once and never mutated afterwards, so a single
/// source can be shared across concurrent query compilations without locks.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeMappingSource;

/// Longest bounded unicode string the engine stores outside `max`.
const UNICODE_BOUNDED_MAX: u16 = 4000;
/// Longest bounded ANSI string or binary payload outside `max`.
const ANSI_BOUNDED_MAX: u16 = 8000;

impl TypeMappingSource {
    pub fn new() -> Self {
        TypeMappingSource
    }

    /// Resolve a mapping for `host_type`.
    ///
    /// Resolution order: exact store-type-name match when a hint is given
    /// (facet overrides applied on top of the name's base mapping), then the
    /// host-type default table, then the size-bounded string/binary hook.
    /// Returns `None` when nothing fits; absence is the caller's decision to
    /// handle, never an error here.
    pub fn find_mapping(
        &self,
        host_type: HostType,
        store_type: Option<&str>,
        overrides: &FacetOverrides,
    ) -> Option<TypeMapping> {
        if let Some(name) = store_type {
            let mapping = self.find_by_store_type(name)?;
            if !compatible(mapping.host_type, host_type) {
                debug!(
                    "store type {name} maps {}, not {host_type}; leaving unresolved",
                    mapping.host_type
                );
                return None;
            }
            let mapping = TypeMapping {
                host_type,
                ..mapping
            };
            return Some(apply_overrides(mapping, overrides));
        }

        let base = defaults().get(&host_type)?.clone();
        Some(match host_type {
            HostType::Text => sized_string(base, overrides),
            HostType::Bytes => sized_binary(base, overrides),
            _ => apply_overrides(base, overrides),
        })
    }

    /// Reverse lookup from a store type name alone, e.g. `"decimal(10, 4)"`.
    pub fn find_by_store_type(&self, store_type: &str) -> Option<TypeMapping> {
        let (name, first, second) = parse_store_type(store_type)?;

        let mut mapping = base_mapping(name);
        match name {
            StoreTypeName::Decimal => {
                if let Some(Parsed::Number(precision)) = first {
                    mapping.facets.precision = Some(precision.min(u8::MAX as u16) as u8);
                    mapping.facets.scale = second.map(|s| s.min(u8::MAX as u16) as u8);
                }
            }
            StoreTypeName::DateTime2 | StoreTypeName::Time | StoreTypeName::DateTimeOffset => {
                if let Some(Parsed::Number(precision)) = first {
                    mapping.facets.precision = Some(precision.min(u8::MAX as u16) as u8);
                }
            }
            _ => match first {
                Some(Parsed::Max) => mapping.facets.size = Some(StoreSize::Max),
                Some(Parsed::Number(n)) => mapping.facets.size = Some(StoreSize::Bounded(n)),
                None => {}
            },
        }
        Some(mapping)
    }

    /// Default mapping for a host type, without hints or facets.
    pub fn default_mapping(&self, host_type: HostType) -> Option<TypeMapping> {
        defaults().get(&host_type).cloned()
    }
}

fn compatible(mapped: HostType, requested: HostType) -> bool {
    mapped == requested
        // `time` stores both clock times and durations.
        || (mapped == HostType::TimeOnly && requested == HostType::Duration)
}

fn apply_overrides(mut mapping: TypeMapping, overrides: &FacetOverrides) -> TypeMapping {
    if let Some(size) = overrides.size {
        mapping.facets.size = Some(size);
    }
    if let Some(precision) = overrides.precision {
        mapping.facets.precision = Some(precision);
    }
    if let Some(scale) = overrides.scale {
        mapping.facets.scale = Some(scale);
    }
    mapping
}

/// Size-bounded string hook: choose between fixed, bounded and `max` variants
/// based on the requested size crossing the engine's bounded-store threshold.
fn sized_string(base: TypeMapping, overrides: &FacetOverrides) -> TypeMapping {
    let unicode = overrides.unicode.unwrap_or(true);
    let fixed = overrides.fixed_length.unwrap_or(false);
    let threshold = if unicode {
        UNICODE_BOUNDED_MAX
    } else {
        ANSI_BOUNDED_MAX
    };

    let (name, size) = match overrides.size {
        Some(StoreSize::Bounded(n)) if n <= threshold => {
            let name = match (unicode, fixed) {
                (true, true) => StoreTypeName::NChar,
                (true, false) => StoreTypeName::NVarChar,
                (false, true) => StoreTypeName::Char,
                (false, false) => StoreTypeName::VarChar,
            };
            (name, StoreSize::Bounded(n))
        }
        // Requested size crossed the threshold; only the unbounded variable
        // family can hold it.
        _ => {
            let name = if unicode {
                StoreTypeName::NVarChar
            } else {
                StoreTypeName::VarChar
            };
            (name, StoreSize::Max)
        }
    };

    TypeMapping {
        host_type: base.host_type,
        name,
        facets: Facets {
            size: Some(size),
            unicode,
            fixed_length: fixed && matches!(size, StoreSize::Bounded(_)),
            ..Facets::default()
        },
    }
}

fn sized_binary(base: TypeMapping, overrides: &FacetOverrides) -> TypeMapping {
    let fixed = overrides.fixed_length.unwrap_or(false);
    let (name, size) = match overrides.size {
        Some(StoreSize::Bounded(n)) if n <= ANSI_BOUNDED_MAX => {
            let name = if fixed {
                StoreTypeName::Binary
            } else {
                StoreTypeName::VarBinary
            };
            (name, StoreSize::Bounded(n))
        }
        _ => (StoreTypeName::VarBinary, StoreSize::Max),
    };

    TypeMapping {
        host_type: base.host_type,
        name,
        facets: Facets {
            size: Some(size),
            fixed_length: fixed && matches!(size, StoreSize::Bounded(_)),
            ..Facets::default()
        },
    }
}

fn base_mapping(name: StoreTypeName) -> TypeMapping {
    use StoreTypeName::*;
    let (host_type, facets) = match name {
        Bit => (HostType::Bool, Facets::default()),
        TinyInt => (HostType::U8, Facets::default()),
        SmallInt => (HostType::I16, Facets::default()),
        Int => (HostType::I32, Facets::default()),
        BigInt => (HostType::I64, Facets::default()),
        Real => (HostType::F32, Facets::default()),
        Float => (HostType::F64, Facets::default()),
        Decimal => (
            HostType::Decimal,
            Facets {
                precision: Some(18),
                scale: Some(2),
                ..Facets::default()
            },
        ),
        NVarChar => (
            HostType::Text,
            Facets {
                size: Some(StoreSize::Max),
                unicode: true,
                ..Facets::default()
            },
        ),
        VarChar => (
            HostType::Text,
            Facets {
                size: Some(StoreSize::Max),
                ..Facets::default()
            },
        ),
        NChar => (
            HostType::Text,
            Facets {
                unicode: true,
                fixed_length: true,
                ..Facets::default()
            },
        ),
        Char => (
            HostType::Text,
            Facets {
                fixed_length: true,
                ..Facets::default()
            },
        ),
        VarBinary => (
            HostType::Bytes,
            Facets {
                size: Some(StoreSize::Max),
                ..Facets::default()
            },
        ),
        Binary => (
            HostType::Bytes,
            Facets {
                fixed_length: true,
                ..Facets::default()
            },
        ),
        Date => (HostType::DateOnly, Facets::default()),
        Time => (HostType::TimeOnly, Facets::default()),
        DateTime2 => (HostType::DateTime, Facets::default()),
        DateTimeOffset => (HostType::DateTime, Facets::default()),
        UniqueIdentifier => (HostType::Guid, Facets::default()),
        Json => (HostType::Json, Facets::default()),
        Vector => (HostType::Vector, Facets::default()),
    };
    TypeMapping::new(host_type, name, facets)
}

fn defaults() -> &'static HashMap<HostType, TypeMapping> {
    static DEFAULTS: OnceLock<HashMap<HostType, TypeMapping>> = OnceLock::new();
    DEFAULTS.get_or_init(|| {
        use StoreTypeName::*;
        [
            (HostType::Bool, base_mapping(Bit)),
            (HostType::U8, base_mapping(TinyInt)),
            (HostType::I16, base_mapping(SmallInt)),
            (HostType::I32, base_mapping(Int)),
            (HostType::I64, base_mapping(BigInt)),
            (HostType::F32, base_mapping(Real)),
            (HostType::F64, base_mapping(Float)),
            (HostType::Decimal, base_mapping(Decimal)),
            (HostType::Text, base_mapping(NVarChar)),
            (HostType::Bytes, base_mapping(VarBinary)),
            (HostType::DateTime, base_mapping(DateTime2)),
            (HostType::DateOnly, base_mapping(Date)),
            (HostType::TimeOnly, base_mapping(Time)),
            (
                HostType::Duration,
                TypeMapping::plain(HostType::Duration, Time),
            ),
            (HostType::Guid, base_mapping(UniqueIdentifier)),
            (HostType::Json, base_mapping(Json)),
            (HostType::Vector, base_mapping(Vector)),
        ]
        .into_iter()
        .collect()
    })
}

enum Parsed {
    Max,
    Number(u16),
}

/// Split `nvarchar(450)` / `decimal(18, 2)` / `varbinary(max)` into the base
/// name and up to two arguments.
fn parse_store_type(input: &str) -> Option<(StoreTypeName, Option<Parsed>, Option<u16>)> {
    static STORE_TYPE: OnceLock<Regex> = OnceLock::new();
    let re = STORE_TYPE.get_or_init(|| {
        Regex::new(r"(?i)^\s*([a-z][a-z0-9]*)\s*(?:\(\s*(max|\d+)\s*(?:,\s*(\d+)\s*)?\))?\s*$")
            .unwrap()
    });

    let captures = match re.captures(input) {
        Some(captures) => captures,
        None => {
            debug!("unparsable store type name: {input:?}");
            return None;
        }
    };

    let name = match StoreTypeName::from_str(&captures[1].to_lowercase()) {
        Ok(name) => name,
        Err(_) => {
            debug!("unknown store type name: {input:?}");
            return None;
        }
    };

    let first = captures.get(2).map(|m| {
        if m.as_str().eq_ignore_ascii_case("max") {
            Parsed::Max
        } else {
            Parsed::Number(m.as_str().parse().unwrap_or(u16::MAX))
        }
    });
    let second = captures.get(3).and_then(|m| m.as_str().parse().ok());

    Some((name, first, second))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> TypeMappingSource {
        TypeMappingSource::new()
    }

    #[test]
    fn store_type_hint_wins() {
        let mapping = source()
            .find_mapping(HostType::Text, Some("nvarchar(450)"), &FacetOverrides::default())
            .unwrap();
        assert_eq!(mapping.store_type(), "nvarchar(450)");
        assert!(mapping.facets.unicode);

        let mapping = source()
            .find_mapping(HostType::Decimal, Some("decimal(10, 4)"), &FacetOverrides::default())
            .unwrap();
        assert_eq!(mapping.store_type(), "decimal(10, 4)");
    }

    #[test]
    fn mismatched_hint_is_absent_not_fatal() {
        // `int` cannot hold text; the source leaves the node untyped.
        assert_eq!(
            source().find_mapping(HostType::Text, Some("int"), &FacetOverrides::default()),
            None
        );
        assert_eq!(
            source().find_mapping(HostType::Text, Some("no such type"), &FacetOverrides::default()),
            None
        );
    }

    #[test]
    fn defaults_by_host_type() {
        assert_eq!(
            source().default_mapping(HostType::I32).unwrap().store_type(),
            "int"
        );
        assert_eq!(
            source().default_mapping(HostType::Text).unwrap().store_type(),
            "nvarchar(max)"
        );
        assert_eq!(
            source()
                .default_mapping(HostType::Duration)
                .unwrap()
                .store_type(),
            "time"
        );
        assert_eq!(source().default_mapping(HostType::Object), None);
    }

    #[test]
    fn bounded_size_thresholds() {
        let overrides = |n| FacetOverrides {
            size: Some(StoreSize::Bounded(n)),
            ..FacetOverrides::default()
        };

        let bounded = source()
            .find_mapping(HostType::Text, None, &overrides(4000))
            .unwrap();
        assert_eq!(bounded.store_type(), "nvarchar(4000)");

        // One past the unicode threshold falls through to max.
        let unbounded = source()
            .find_mapping(HostType::Text, None, &overrides(4001))
            .unwrap();
        assert_eq!(unbounded.store_type(), "nvarchar(max)");

        let ansi = source()
            .find_mapping(
                HostType::Text,
                None,
                &FacetOverrides {
                    size: Some(StoreSize::Bounded(5000)),
                    unicode: Some(false),
                    ..FacetOverrides::default()
                },
            )
            .unwrap();
        assert_eq!(ansi.store_type(), "varchar(5000)");

        let bytes = source()
            .find_mapping(HostType::Bytes, None, &overrides(8001))
            .unwrap();
        assert_eq!(bytes.store_type(), "varbinary(max)");
    }

    #[test]
    fn fixed_length_families() {
        let fixed = source()
            .find_mapping(
                HostType::Text,
                None,
                &FacetOverrides {
                    size: Some(StoreSize::Bounded(10)),
                    fixed_length: Some(true),
                    ..FacetOverrides::default()
                },
            )
            .unwrap();
        assert_eq!(fixed.store_type(), "nchar(10)");
        assert!(fixed.facets.fixed_length);
    }

    #[test]
    fn reverse_lookup() {
        let mapping = source().find_by_store_type("varbinary(max)").unwrap();
        assert_eq!(mapping.host_type, HostType::Bytes);
        assert_eq!(mapping.store_type(), "varbinary(max)");

        let mapping = source().find_by_store_type("datetime2(3)").unwrap();
        assert_eq!(mapping.host_type, HostType::DateTime);
        assert_eq!(mapping.store_type(), "datetime2(3)");
    }

    #[test]
    fn duration_accepts_time_hint() {
        let mapping = source()
            .find_mapping(HostType::Duration, Some("time"), &FacetOverrides::default())
            .unwrap();
        assert_eq!(mapping.host_type, HostType::Duration);
        assert_eq!(mapping.name, StoreTypeName::Time);
    }
}
