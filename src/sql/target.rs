//! Capability map for the SQL Server engine family.
//!
//! The general principle is to target the oldest compatibility level that can
//! express a translation, and to *decline* (not fail) translations the active
//! target cannot express — a later, more generic stage owns the user-facing
//! "unsupported on this provider/version" diagnostic.

use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, WithErrorInfo};

/// Engine family the generated SQL targets.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Serialize,
    Default,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum EngineType {
    #[default]
    SqlServer,
    AzureSql,
    AzureSynapse,
}

/// The active translation target: engine family plus compatibility level.
///
/// The cloud families pin their own level — Azure SQL always reports the
/// newest supported level, Synapse a fixed older one — so a caller-supplied
/// level is only honored for on-premises SQL Server.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct TargetEngine {
    pub engine: EngineType,
    pub compatibility_level: u16,
}

const AZURE_SQL_LEVEL: u16 = 160;
const AZURE_SYNAPSE_LEVEL: u16 = 130;
const DEFAULT_LEVEL: u16 = 160;

impl Default for TargetEngine {
    fn default() -> Self {
        TargetEngine {
            engine: EngineType::SqlServer,
            compatibility_level: DEFAULT_LEVEL,
        }
    }
}

impl TargetEngine {
    pub fn new(engine: EngineType, compatibility_level: u16) -> Self {
        let pinned = match engine {
            EngineType::SqlServer => compatibility_level,
            EngineType::AzureSql => AZURE_SQL_LEVEL,
            EngineType::AzureSynapse => AZURE_SYNAPSE_LEVEL,
        };
        if pinned != compatibility_level {
            warn!("compatibility level {compatibility_level} ignored for {engine}; using {pinned}");
        }
        TargetEngine {
            engine,
            compatibility_level: pinned,
        }
    }

    pub fn sql_server(compatibility_level: u16) -> Self {
        TargetEngine::new(EngineType::SqlServer, compatibility_level)
    }

    /// LEAST/GREATEST.
    pub fn supports_least_greatest(&self) -> bool {
        self.compatibility_level >= 160
    }

    /// JSON_PATH_EXISTS.
    pub fn supports_json_path_exists(&self) -> bool {
        self.compatibility_level >= 160
    }

    /// VECTOR_DISTANCE. Available on Azure SQL ahead of the on-premises
    /// engine.
    pub fn supports_vector_search(&self) -> bool {
        self.engine == EngineType::AzureSql || self.compatibility_level >= 170
    }

    /// STRING_AGG.
    pub fn supports_string_agg(&self) -> bool {
        self.compatibility_level >= 140
    }

    /// AT TIME ZONE.
    pub fn supports_at_time_zone(&self) -> bool {
        self.compatibility_level >= 130
    }
}

impl FromStr for TargetEngine {
    type Err = Error;

    /// Parse a compact target string: `sqlserver`, `sqlserver@150`,
    /// `azuresql`, `azuresynapse`.
    fn from_str(s: &str) -> Result<Self> {
        let (engine, level) = match s.split_once('@') {
            Some((engine, level)) => {
                let level = level.parse::<u16>().map_err(|_| {
                    Error::new_simple(format!("invalid compatibility level in target {s:?}"))
                })?;
                (engine, Some(level))
            }
            None => (s, None),
        };

        let engine = EngineType::from_str(engine).map_err(|_| {
            use strum::VariantNames;
            Error::new_simple(format!("unknown target engine {engine:?}"))
                .push_hint(format!("expected one of: {}", EngineType::VARIANTS.join(", ")))
        })?;

        Ok(match level {
            Some(level) => TargetEngine::new(engine, level),
            None => TargetEngine::new(engine, DEFAULT_LEVEL),
        })
    }
}
