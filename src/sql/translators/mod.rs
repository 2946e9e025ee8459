//! Method/member translators
//!
//! One file per host API domain. Every translator is a stateless unit struct
//! implementing one or more dispatch roles; `Ok(None)` means "not recognized
//! here, try the next one" and is never an error.

mod aggregate;
mod bytes;
mod convert;
mod datetime;
mod dbfunctions;
mod fulltext;
mod json;
mod math;
mod string;
mod vector;

pub use aggregate::{QueryableAggregateTranslator, StringAggregateTranslator};
pub use bytes::ByteArrayTranslator;
pub use convert::ConvertTranslator;
pub use datetime::{DateTimeMemberTranslator, DateTimeMethodTranslator};
pub use dbfunctions::DateDiffTranslator;
pub use fulltext::FullTextSearchTranslator;
pub use json::JsonTranslator;
pub use math::MathTranslator;
pub use string::StringTranslator;
pub use vector::VectorTranslator;

use super::TranslatorDispatch;

/// Register the stock translator set, in dispatch order.
pub fn register_standard(dispatch: &mut TranslatorDispatch) {
    dispatch.register_method(Box::new(DateTimeMethodTranslator));
    dispatch.register_method(Box::new(StringTranslator));
    dispatch.register_method(Box::new(MathTranslator));
    dispatch.register_method(Box::new(ConvertTranslator));
    dispatch.register_method(Box::new(ByteArrayTranslator));
    dispatch.register_method(Box::new(DateDiffTranslator));
    dispatch.register_method(Box::new(FullTextSearchTranslator));
    dispatch.register_method(Box::new(JsonTranslator));
    dispatch.register_method(Box::new(VectorTranslator));

    dispatch.register_member(Box::new(DateTimeMemberTranslator));
    dispatch.register_member(Box::new(StringTranslator));
    dispatch.register_member(Box::new(ByteArrayTranslator));

    dispatch.register_aggregate(Box::new(StringAggregateTranslator));
    dispatch.register_aggregate(Box::new(QueryableAggregateTranslator));
}
