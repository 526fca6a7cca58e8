//! Answer schema, raw answers and validated answers
//!
//! The schema is plain data: an ordered list of fields, each with a value
//! domain, an optional default (for the prompt front-end) and an optional
//! visibility predicate over earlier answers. Validation is pure, so it can
//! be tested without a terminal.

pub mod schema;
pub mod values;

pub use schema::{
    AnswerSchema, FieldSpec, Predicate, ValidationError, ValidationReason, ValueDomain,
};
pub use values::{AnswerValue, Answers, RawAnswers, ValidatedAnswers};
