use itertools::Itertools;
use log::debug;

use crate::host::{HostSurface, HostType, ResolvedCall};
use crate::ir::{Literal, SqlExpr};
use crate::sql::{AggregateCallTranslator, Context, GroupedSource};
use crate::Result;

/// String concatenation aggregates over a grouped source.
///
/// STRING_AGG disagrees with the host join in two ways: it drops NULL
/// members where the host treats them as empty, and it yields NULL over zero
/// rows where the host yields the empty string. Both are compensated with
/// coalesces.
pub struct StringAggregateTranslator;

impl AggregateCallTranslator for StringAggregateTranslator {
    fn name(&self) -> &'static str {
        "StringAggregateTranslator"
    }

    fn translate(
        &self,
        call: &ResolvedCall,
        source: &GroupedSource,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if call.surface != HostSurface::Sequence || source.element.ty != HostType::Text {
            return Ok(None);
        }
        if !ctx.target.supports_string_agg() {
            debug!("declining {}: STRING_AGG needs compatibility level 140", call.name);
            return Ok(None);
        }
        if source.distinct {
            debug!("declining {}: STRING_AGG cannot aggregate distinct elements", call.name);
            return Ok(None);
        }

        let f = &ctx.factory;
        let separator = match (call.name.as_str(), args) {
            ("join", [separator]) if separator.ty == HostType::Text => separator.clone(),
            // Plain concatenation joins on the empty string.
            ("concat", []) => f.constant(Literal::Text(String::new()), HostType::Text),
            _ => return Ok(None),
        };

        let string_mapping = f
            .infer_type_mapping([&source.element, &separator])
            .or_else(|| f.mapping_source().default_mapping(HostType::Text));
        let element = f.apply_type_mapping(source.element.clone(), string_mapping.clone());
        let separator = f.apply_type_mapping(separator, string_mapping.clone());
        let empty = f.typed_constant(
            Literal::Text(String::new()),
            HostType::Text,
            string_mapping.clone().expect("text default mapping always resolves"),
        );

        // NULL members vanish from STRING_AGG; the host joins them as "".
        let element = if element.nullable() {
            f.coalesce(vec![element, empty.clone()], HostType::Text)
        } else {
            element
        };

        let aggregate = f.ordered_aggregate(
            "STRING_AGG",
            vec![element, separator],
            vec![false, false],
            source.orderings.iter().cloned().collect_vec(),
            HostType::Text,
            true,
            string_mapping,
        );
        // Zero rows leave STRING_AGG at NULL; the host yields "".
        Ok(Some(f.coalesce(vec![aggregate, empty], HostType::Text)))
    }
}

/// Pass-through numeric aggregates (AVG/SUM/MIN/MAX/COUNT) with standard SQL
/// null semantics: NULL members are skipped, not propagated.
pub struct QueryableAggregateTranslator;

const AGGREGATES: &[(&str, &str)] = &[
    ("average", "AVG"),
    ("sum", "SUM"),
    ("min", "MIN"),
    ("max", "MAX"),
];

impl AggregateCallTranslator for QueryableAggregateTranslator {
    fn name(&self) -> &'static str {
        "QueryableAggregateTranslator"
    }

    fn translate(
        &self,
        call: &ResolvedCall,
        source: &GroupedSource,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>> {
        if call.surface != HostSurface::Sequence || !args.is_empty() {
            return Ok(None);
        }
        if source.distinct {
            return Ok(None);
        }
        let f = &ctx.factory;

        if call.name == "count" {
            return Ok(Some(f.function(
                "COUNT",
                vec![source.element.clone()],
                vec![false],
                HostType::I32,
                false,
                f.mapping_source().default_mapping(HostType::I32),
            )));
        }

        let Some((_, sql_name)) = AGGREGATES.iter().find(|(host, _)| *host == call.name) else {
            return Ok(None);
        };
        if !source.element.ty.is_numeric() {
            return Ok(None);
        }
        Ok(Some(f.function(
            *sql_name,
            vec![source.element.clone()],
            vec![false],
            source.element.ty,
            true,
            source.element.type_mapping.clone(),
        )))
    }
}
