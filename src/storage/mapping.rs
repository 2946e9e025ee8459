use serde::{Deserialize, Serialize};

use crate::host::HostType;
use crate::ir::Literal;

/// One storage type choice: a store type name plus the facets that refine it.
///
/// Two mappings with the same [StoreTypeName] but different facets are
/// distinct values; they share literal-generation logic.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct TypeMapping {
    pub host_type: HostType,
    pub name: StoreTypeName,
    pub facets: Facets,
}

/// Base store type names of the SQL Server family.
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
#[strum(serialize_all = "lowercase")]
pub enum StoreTypeName {
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Real,
    Float,
    Decimal,
    NVarChar,
    VarChar,
    NChar,
    Char,
    VarBinary,
    Binary,
    Date,
    Time,
    DateTime2,
    DateTimeOffset,
    UniqueIdentifier,
    Json,
    Vector,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Facets {
    pub size: Option<StoreSize>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub unicode: bool,
    pub fixed_length: bool,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum StoreSize {
    Bounded(u16),
    Max,
}

impl TypeMapping {
    pub fn new(host_type: HostType, name: StoreTypeName, facets: Facets) -> Self {
        TypeMapping {
            host_type,
            name,
            facets,
        }
    }

    /// Simple mapping with no facets.
    pub fn plain(host_type: HostType, name: StoreTypeName) -> Self {
        TypeMapping::new(host_type, name, Facets::default())
    }

    pub fn with_size(mut self, size: StoreSize) -> Self {
        self.facets.size = Some(size);
        self
    }

    pub fn with_precision_scale(mut self, precision: u8, scale: u8) -> Self {
        self.facets.precision = Some(precision);
        self.facets.scale = Some(scale);
        self
    }

    /// Rendered store type, e.g. `nvarchar(450)`, `decimal(18, 2)`,
    /// `varbinary(max)`.
    pub fn store_type(&self) -> String {
        if let Some(size) = self.facets.size {
            return match size {
                StoreSize::Bounded(n) => format!("{}({n})", self.name),
                StoreSize::Max => format!("{}(max)", self.name),
            };
        }
        match (self.facets.precision, self.facets.scale) {
            (Some(precision), Some(scale)) => format!("{}({precision}, {scale})", self.name),
            (Some(precision), None) => format!("{}({precision})", self.name),
            _ => self.name.to_string(),
        }
    }

    /// Render a host value as a SQL literal in this mapping's store type.
    ///
    /// This is the literal-generation strategy of the mapping; parameters
    /// bypass it entirely and are bound downstream.
    pub fn literal(&self, value: &Literal) -> String {
        match value {
            Literal::Null => "NULL".to_string(),
            Literal::Boolean(b) => format!("CAST({} AS bit)", if *b { 1 } else { 0 }),
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.1}")
                } else {
                    format!("{f}")
                }
            }
            Literal::Decimal(d) => d.clone(),
            Literal::Text(s) => {
                let escaped = s.replace('\'', "''");
                if self.facets.unicode {
                    format!("N'{escaped}'")
                } else {
                    format!("'{escaped}'")
                }
            }
            Literal::Bytes(bytes) => {
                let mut out = String::with_capacity(2 + bytes.len() * 2);
                out.push_str("0x");
                for byte in bytes {
                    out.push_str(&format!("{byte:02X}"));
                }
                out
            }
            Literal::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Literal::Time(t) => format!("'{}'", t.format("%H:%M:%S")),
            Literal::DateTime(dt) => {
                // datetime2 carries a seven-digit fraction.
                let fraction = dt.and_utc().timestamp_subsec_nanos() / 100;
                format!("'{}.{:07}'", dt.format("%Y-%m-%dT%H:%M:%S"), fraction)
            }
            Literal::Guid(g) => format!("'{g}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    #[test]
    fn store_type_rendering() {
        let nvarchar = TypeMapping::new(
            HostType::Text,
            StoreTypeName::NVarChar,
            Facets {
                size: Some(StoreSize::Bounded(450)),
                unicode: true,
                ..Facets::default()
            },
        );
        assert_eq!(nvarchar.store_type(), "nvarchar(450)");

        let unbounded = nvarchar.clone().with_size(StoreSize::Max);
        assert_eq!(unbounded.store_type(), "nvarchar(max)");

        let decimal = TypeMapping::plain(HostType::Decimal, StoreTypeName::Decimal)
            .with_precision_scale(18, 2);
        assert_eq!(decimal.store_type(), "decimal(18, 2)");

        assert_eq!(
            TypeMapping::plain(HostType::I32, StoreTypeName::Int).store_type(),
            "int"
        );
    }

    #[test]
    fn literal_rendering() {
        let unicode = TypeMapping::new(
            HostType::Text,
            StoreTypeName::NVarChar,
            Facets {
                size: Some(StoreSize::Max),
                unicode: true,
                ..Facets::default()
            },
        );
        assert_eq!(
            unicode.literal(&Literal::Text("O'Brien".to_string())),
            "N'O''Brien'"
        );

        let ansi = TypeMapping::plain(HostType::Text, StoreTypeName::VarChar);
        assert_eq!(ansi.literal(&Literal::Text("abc".to_string())), "'abc'");

        let bytes = TypeMapping::plain(HostType::Bytes, StoreTypeName::VarBinary);
        assert_eq!(bytes.literal(&Literal::Bytes(vec![0xDE, 0xAD])), "0xDEAD");

        let bit = TypeMapping::plain(HostType::Bool, StoreTypeName::Bit);
        assert_eq!(bit.literal(&Literal::Boolean(true)), "CAST(1 AS bit)");

        let date = TypeMapping::plain(HostType::DateOnly, StoreTypeName::Date);
        assert_eq!(
            date.literal(&Literal::Date(
                NaiveDate::from_ymd_opt(2015, 3, 12).unwrap()
            )),
            "'2015-03-12'"
        );

        let datetime = TypeMapping::plain(HostType::DateTime, StoreTypeName::DateTime2);
        let value = NaiveDate::from_ymd_opt(2015, 3, 12)
            .unwrap()
            .and_time(NaiveTime::from_hms_milli_opt(13, 36, 37, 371).unwrap());
        assert_eq!(
            datetime.literal(&Literal::DateTime(value)),
            "'2015-03-12T13:36:37.3710000'"
        );

        let float = TypeMapping::plain(HostType::F64, StoreTypeName::Float);
        assert_eq!(float.literal(&Literal::Float(2.0)), "2.0");
        assert_eq!(float.literal(&Literal::Float(2.5)), "2.5");
    }
}
