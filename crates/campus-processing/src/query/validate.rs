//! Whole-plan static validation.
//!
//! Every plan is checked against the supplied table schemas before any row
//! processing begins: unknown tables, unknown columns, and arithmetic on
//! non-numeric columns are all surfaced eagerly with the table, column, and
//! operator that caused them. The schema is threaded through join, derive,
//! and aggregate steps so having/order clauses are checked against the
//! shape they will actually see.

use crate::error::{PipelineError, Result};
use crate::query::plan::{AggFunc, DeriveExpr, Literal, Predicate, QueryPlan};
use crate::utils::{dtype_name, is_numeric_dtype};
use polars::prelude::*;
use std::collections::HashMap;

/// Column name to dtype mapping for one validation scope.
type Scope = HashMap<String, DataType>;

fn schema_of(df: &DataFrame) -> Scope {
    df.schema()
        .iter()
        .map(|(name, dtype)| (name.to_string(), dtype.clone()))
        .collect()
}

/// Validate a plan against the supplied tables. Returns the schema the
/// result table will have (used by tests and by callers that need the
/// output shape before execution).
pub fn validate(plan: &QueryPlan, tables: &HashMap<String, DataFrame>) -> Result<Scope> {
    let base = tables
        .get(&plan.from)
        .ok_or_else(|| PipelineError::UnknownTable {
            table: plan.from.clone(),
            operator: "from".to_string(),
        })?;
    let mut scope = schema_of(base);
    let mut scope_desc = plan.from.clone();

    for join in &plan.joins {
        let right = tables
            .get(&join.table)
            .ok_or_else(|| PipelineError::UnknownTable {
                table: join.table.clone(),
                operator: "join".to_string(),
            })?;
        let right_schema = schema_of(right);

        for (left_col, right_col) in &join.on {
            if !scope.contains_key(left_col) {
                return Err(PipelineError::UnknownColumn {
                    table: scope_desc.clone(),
                    column: left_col.clone(),
                    operator: "join".to_string(),
                });
            }
            if !right_schema.contains_key(right_col) {
                return Err(PipelineError::UnknownColumn {
                    table: join.table.clone(),
                    column: right_col.clone(),
                    operator: "join".to_string(),
                });
            }
        }

        // The right join keys are coalesced away; other right columns join
        // the scope, suffixed when they collide with an existing name.
        let right_keys: Vec<&String> = join.on.iter().map(|(_, r)| r).collect();
        for (name, dtype) in right_schema {
            if right_keys.iter().any(|k| **k == name) {
                continue;
            }
            if scope.contains_key(&name) {
                scope.insert(format!("{name}_right"), dtype);
            } else {
                scope.insert(name, dtype);
            }
        }
        scope_desc = format!("{scope_desc}+{}", join.table);
    }

    for pred in &plan.filters {
        check_predicate(pred, &scope, &scope_desc, "filter")?;
    }

    for derivation in &plan.derives {
        let dtype = check_expr(&derivation.expr, &scope, &scope_desc, "derive")?;
        scope.insert(derivation.name.clone(), dtype);
    }

    for key in &plan.group_by {
        if !scope.contains_key(key) {
            return Err(PipelineError::UnknownColumn {
                table: scope_desc.clone(),
                column: key.clone(),
                operator: "group".to_string(),
            });
        }
    }

    if !plan.aggregates.is_empty() {
        let mut agg_scope: Scope = plan
            .group_by
            .iter()
            .map(|k| (k.clone(), scope[k].clone()))
            .collect();

        for agg in &plan.aggregates {
            let out_dtype = match (&agg.func, &agg.column) {
                (AggFunc::Count, None) => DataType::UInt32,
                (func, Some(column)) => {
                    let dtype =
                        scope
                            .get(column)
                            .ok_or_else(|| PipelineError::UnknownColumn {
                                table: scope_desc.clone(),
                                column: column.clone(),
                                operator: "aggregate".to_string(),
                            })?;
                    match func {
                        AggFunc::Count => DataType::UInt32,
                        AggFunc::Sum | AggFunc::Mean => {
                            if !is_numeric_dtype(dtype) {
                                return Err(PipelineError::TypeMismatch {
                                    column: column.clone(),
                                    operator: "aggregate".to_string(),
                                    dtype: dtype_name(dtype),
                                });
                            }
                            if matches!(func, AggFunc::Mean) {
                                DataType::Float64
                            } else {
                                dtype.clone()
                            }
                        }
                        // min/max keep the input dtype and work on any
                        // ordered type
                        AggFunc::Min | AggFunc::Max => dtype.clone(),
                    }
                }
                (func, None) => {
                    return Err(PipelineError::UnknownColumn {
                        table: scope_desc.clone(),
                        column: format!("<missing input for {func:?}>"),
                        operator: "aggregate".to_string(),
                    });
                }
            };
            agg_scope.insert(agg.alias.clone(), out_dtype);
        }
        scope = agg_scope;
    }

    for pred in &plan.having {
        check_predicate(pred, &scope, &scope_desc, "having")?;
    }

    for key in &plan.order_by {
        if !scope.contains_key(&key.column) {
            return Err(PipelineError::UnknownColumn {
                table: scope_desc.clone(),
                column: key.column.clone(),
                operator: "order".to_string(),
            });
        }
    }

    Ok(scope)
}

fn check_predicate(pred: &Predicate, scope: &Scope, scope_desc: &str, operator: &str) -> Result<()> {
    let column = pred.column();
    let dtype = scope
        .get(column)
        .ok_or_else(|| PipelineError::UnknownColumn {
            table: scope_desc.to_string(),
            column: column.to_string(),
            operator: operator.to_string(),
        })?;

    // Ordered comparison requires a numeric column; the other predicate
    // forms work on any dtype.
    if matches!(pred, Predicate::Cmp { .. }) && !is_numeric_dtype(dtype) {
        return Err(PipelineError::TypeMismatch {
            column: column.to_string(),
            operator: operator.to_string(),
            dtype: dtype_name(dtype),
        });
    }
    Ok(())
}

fn check_expr(
    expr: &DeriveExpr,
    scope: &Scope,
    scope_desc: &str,
    operator: &str,
) -> Result<DataType> {
    match expr {
        DeriveExpr::Column(c) => scope
            .get(c)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownColumn {
                table: scope_desc.to_string(),
                column: c.clone(),
                operator: operator.to_string(),
            }),
        DeriveExpr::Value(v) => Ok(match v {
            Literal::Str(_) => DataType::String,
            Literal::Int(_) => DataType::Int64,
            Literal::Float(_) => DataType::Float64,
            Literal::Bool(_) => DataType::Boolean,
        }),
        DeriveExpr::Add(a, b)
        | DeriveExpr::Sub(a, b)
        | DeriveExpr::Mul(a, b)
        | DeriveExpr::Div(a, b) => {
            for side in [a, b] {
                let dtype = check_expr(side, scope, scope_desc, operator)?;
                if !is_numeric_dtype(&dtype) {
                    return Err(PipelineError::TypeMismatch {
                        column: side.describe(),
                        operator: operator.to_string(),
                        dtype: dtype_name(&dtype),
                    });
                }
            }
            Ok(DataType::Float64)
        }
        DeriveExpr::Case {
            when,
            then,
            otherwise,
        } => {
            check_predicate(when, scope, scope_desc, operator)?;
            let then_dtype = check_expr(then, scope, scope_desc, operator)?;
            let other_dtype = check_expr(otherwise, scope, scope_desc, operator)?;
            if then_dtype == other_dtype {
                Ok(then_dtype)
            } else if is_numeric_dtype(&then_dtype) && is_numeric_dtype(&other_dtype) {
                Ok(DataType::Float64)
            } else {
                Err(PipelineError::TypeMismatch {
                    column: expr.describe(),
                    operator: operator.to_string(),
                    dtype: format!("{} vs {}", dtype_name(&then_dtype), dtype_name(&other_dtype)),
                })
            }
        }
    }
}
