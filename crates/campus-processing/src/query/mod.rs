//! Declarative query plans and their execution engine.
//!
//! A [`QueryPlan`] is a typed tree of relational operators, validated
//! structurally against table schemas before execution. This replaces
//! string-built query text: an unknown column is a plan-validation error,
//! not a failure deep in execution.

mod engine;
mod plan;
pub mod validate;

pub use engine::QueryEngine;
pub use plan::{
    AggFunc, Aggregate, CmpOp, Derivation, DeriveExpr, Join, Literal, Predicate, QueryPlan,
    SortKey,
};
