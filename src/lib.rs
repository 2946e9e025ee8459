//! # relqc
//!
//! Translation engine for an object-relational mapper: lowers recognized
//! host-language query operators — method calls and member accesses over
//! dates, strings, math, aggregates and vendor extension functions — into a
//! typed SQL expression tree for the SQL Server engine family.
//!
//! For more granular access, refer to this diagram:
//! ```ascii
//!        resolved call/member descriptors          (host)
//!                      │
//!   translate_method   │   translate_member / translate_aggregate
//!                      ▼
//!              TranslatorDispatch                  (sql)
//!        first-match-wins over role lists
//!                      │
//!                      │  SqlExpressionFactory + TypeMappingSource
//!                      ▼
//!                   SqlExpr                        (ir)
//!        fully type-mapped expression tree
//!                      │
//!                      ▼
//!           SQL printing (downstream)
//! ```
//!
//! ## Common use-cases
//!
//! - Translate a member access:
//!
//!   ```
//!   use relqc::host::{HostSurface, HostType, ResolvedMember};
//!   use relqc::ir::ColumnRef;
//!   use relqc::sql::TranslatorDispatch;
//!
//!   let dispatch = TranslatorDispatch::new("sqlserver@160".parse()?);
//!   let ctx = dispatch.context();
//!   let order_date = ctx.factory.column(
//!       ColumnRef {
//!           table_alias: Some("o".to_string()),
//!           name: "OrderDate".to_string(),
//!           nullable: true,
//!       },
//!       HostType::DateTime,
//!       ctx.factory.mapping_source().default_mapping(HostType::DateTime),
//!   );
//!   let member = ResolvedMember::new(HostSurface::DateTime, "year");
//!
//!   let expr = dispatch.translate_member(Some(&order_date), &member)?.unwrap();
//!   assert_eq!(expr.to_string(), "DATEPART(year, [o].[OrderDate])");
//!   # Ok::<(), relqc::Error>(())
//!   ```
//!
//! - A translator that does not recognize a call *declines* (`Ok(None)`);
//!   errors are reserved for configuration mistakes and internal invariant
//!   violations. See [Error] and [Reason] for the taxonomy.

#![forbid(unsafe_code)]

mod error;
pub mod host;
pub mod ir;
pub mod json;
pub mod sql;
pub mod storage;

pub use error::{Error, Errors, MessageKind, Reason, WithErrorInfo};

pub type Result<T, E = Error> = core::result::Result<T, E>;
