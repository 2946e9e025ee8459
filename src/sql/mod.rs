//! SQL translation pipeline
//!
//! Lowers recognized host-API calls and member accesses into
//! [crate::ir::SqlExpr] subtrees for the active [TargetEngine].
//!
//! Translators are pure and stateless; each pattern-matches a narrow API
//! surface and either returns a fully-formed replacement subtree or declines
//! with `Ok(None)` so the dispatcher can try the next one. Only user
//! configuration mistakes and internal invariant violations produce errors.

pub mod factory;
pub mod target;
pub mod translators;

use log::debug;

pub use factory::SqlExpressionFactory;
pub use target::{EngineType, TargetEngine};

use crate::host::{ResolvedCall, ResolvedMember};
use crate::ir::{SortSpec, SqlExpr};
use crate::storage::TypeMappingSource;
use crate::Result;

/// Shared collaborators handed to every translator invocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Context {
    pub factory: SqlExpressionFactory,
    pub target: TargetEngine,
}

impl Context {
    pub fn new(target: TargetEngine) -> Self {
        Context {
            factory: SqlExpressionFactory::new(TypeMappingSource::new()),
            target,
        }
    }
}

/// The grouped-enumerable input of an aggregate translation: the lowered
/// per-group element expression plus ordering, if any.
#[derive(Debug, Clone)]
pub struct GroupedSource {
    pub element: SqlExpr,
    pub orderings: Vec<SortSpec>,
    pub distinct: bool,
}

/// Translator role: method calls (`x.substring(1, 3)`, static calls have no
/// instance).
pub trait MethodCallTranslator {
    /// Diagnostic name, used in log events and internal errors.
    fn name(&self) -> &'static str;

    fn translate(
        &self,
        instance: Option<&SqlExpr>,
        call: &ResolvedCall,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>>;
}

/// Translator role: member accesses (`x.year`).
pub trait MemberTranslator {
    fn name(&self) -> &'static str;

    fn translate(
        &self,
        instance: Option<&SqlExpr>,
        member: &ResolvedMember,
        ctx: &Context,
    ) -> Result<Option<SqlExpr>>;
}

/// Translator role: aggregate calls over a grouped source.
pub trait AggregateCallTranslator {
    fn name(&self) -> &'static str;

    fn translate(
        &self,
        call: &ResolvedCall,
        source: &GroupedSource,
        args: &[SqlExpr],
        ctx: &Context,
    ) -> Result<Option<SqlExpr>>;
}

/// Aggregates all translators behind one interface: one ordered collection
/// per role, tried in registration order, first match wins.
pub struct TranslatorDispatch {
    ctx: Context,
    methods: Vec<Box<dyn MethodCallTranslator>>,
    members: Vec<Box<dyn MemberTranslator>>,
    aggregates: Vec<Box<dyn AggregateCallTranslator>>,
}

impl TranslatorDispatch {
    /// Dispatcher with the stock translator set for `target`.
    pub fn new(target: TargetEngine) -> Self {
        let mut dispatch = Self::empty(target);
        translators::register_standard(&mut dispatch);
        dispatch
    }

    /// Dispatcher with no translators registered.
    pub fn empty(target: TargetEngine) -> Self {
        TranslatorDispatch {
            ctx: Context::new(target),
            methods: vec![],
            members: vec![],
            aggregates: vec![],
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn register_method(&mut self, translator: Box<dyn MethodCallTranslator>) {
        self.methods.push(translator);
    }

    pub fn register_member(&mut self, translator: Box<dyn MemberTranslator>) {
        self.members.push(translator);
    }

    pub fn register_aggregate(&mut self, translator: Box<dyn AggregateCallTranslator>) {
        self.aggregates.push(translator);
    }

    pub fn translate_method(
        &self,
        instance: Option<&SqlExpr>,
        call: &ResolvedCall,
        args: &[SqlExpr],
    ) -> Result<Option<SqlExpr>> {
        for translator in &self.methods {
            if let Some(expr) = translator.translate(instance, call, args, &self.ctx)? {
                debug!("{} translated {}.{}", translator.name(), call.surface, call.name);
                return Ok(Some(expr));
            }
        }
        debug!("no translation for method {}.{}", call.surface, call.name);
        Ok(None)
    }

    pub fn translate_member(
        &self,
        instance: Option<&SqlExpr>,
        member: &ResolvedMember,
    ) -> Result<Option<SqlExpr>> {
        for translator in &self.members {
            if let Some(expr) = translator.translate(instance, member, &self.ctx)? {
                debug!(
                    "{} translated member {}.{}",
                    translator.name(),
                    member.surface,
                    member.name
                );
                return Ok(Some(expr));
            }
        }
        debug!("no translation for member {}.{}", member.surface, member.name);
        Ok(None)
    }

    pub fn translate_aggregate(
        &self,
        call: &ResolvedCall,
        source: &GroupedSource,
        args: &[SqlExpr],
    ) -> Result<Option<SqlExpr>> {
        for translator in &self.aggregates {
            if let Some(expr) = translator.translate(call, source, args, &self.ctx)? {
                debug!("{} translated aggregate {}", translator.name(), call.name);
                return Ok(Some(expr));
            }
        }
        debug!("no translation for aggregate {}.{}", call.surface, call.name);
        Ok(None)
    }
}
